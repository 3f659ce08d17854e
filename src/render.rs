//! Emission of the resolved configuration.
//!
//! The generator reads a Python settings module, so the primary output is a
//! `conf.py`. JSON and YAML renditions exist for inspection and tooling.

use minijinja::{Environment, Value};
use serde_json::Value as JsonValue;
use std::fmt::Write as _;

use crate::conf::DocsConfig;
use crate::error::Result;

const CONF_PY_TEMPLATE: &str = r#"# Configuration file for the Sphinx documentation builder.
# Generated by sphinx-conf; edit the settings file instead.

# -- Path setup --------------------------------------------------------------
{% if sys_path or plot_backend %}
{%- if sys_path %}
import os
import sys
{%- for path in sys_path %}
sys.path.insert(0, os.path.abspath({{ path | py }}))
{%- endfor %}
{%- endif %}
{%- if plot_backend %}
import matplotlib as mpl
mpl.use({{ plot_backend | py }})
{%- endif %}
{% endif %}
# -- Project information -----------------------------------------------------

project = {{ project | py }}
author = {{ author | py }}
copyright = {{ copyright | py }}

# The full version, including alpha/beta/rc tags
version = {{ version | py }}
release = version

# -- General configuration ---------------------------------------------------

extensions = {{ extensions | py }}
{% if autosummary_generate is not none %}
autosummary_generate = {{ autosummary_generate | py }}
{%- endif %}
{%- if numpydoc_show_class_members is not none %}
numpydoc_show_class_members = {{ numpydoc_show_class_members | py }}
{%- endif %}

templates_path = {{ templates_path | py }}

exclude_patterns = {{ exclude_patterns | py }}

pygments_style = {{ pygments_style | py }}

myst_heading_anchors = {{ myst_heading_anchors | py }}

myst_disable_syntax = {{ myst_disable_syntax | py }}
{%- if extra %}

# -- Additional settings -----------------------------------------------------
{% for name, value in extra | items %}
{{ name }} = {{ value | py }}
{%- endfor %}
{%- endif %}

# -- Options for HTML output -------------------------------------------------

html_theme = {{ html_theme | py }}

html_static_path = {{ html_static_path | py }}
"#;

/// Formats a JSON value as a Python literal.
pub fn py_literal(value: &JsonValue) -> String {
    match value {
        JsonValue::Null => "None".to_string(),
        JsonValue::Bool(true) => "True".to_string(),
        JsonValue::Bool(false) => "False".to_string(),
        JsonValue::Number(n) => n.to_string(),
        JsonValue::String(s) => py_string(s),
        JsonValue::Array(items) => {
            let items: Vec<String> = items.iter().map(py_literal).collect();
            format!("[{}]", items.join(", "))
        }
        JsonValue::Object(map) => {
            let entries: Vec<String> = map
                .iter()
                .map(|(k, v)| format!("{}: {}", py_string(k), py_literal(v)))
                .collect();
            format!("{{{}}}", entries.join(", "))
        }
    }
}

/// Single-quoted Python string literal.
pub fn py_string(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('\'');
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\'' => out.push_str("\\'"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c.is_control() => {
                let _ = write!(out, "\\x{:02x}", c as u32);
            }
            c => out.push(c),
        }
    }
    out.push('\'');
    out
}

fn py_filter(value: Value) -> std::result::Result<String, minijinja::Error> {
    let json = serde_json::to_value(&value).map_err(|e| {
        minijinja::Error::new(minijinja::ErrorKind::InvalidOperation, e.to_string())
    })?;
    Ok(py_literal(&json))
}

/// Renders the configuration as a Python `conf.py` module.
pub fn render_conf_py(config: &DocsConfig) -> Result<String> {
    let mut env = Environment::new();
    env.set_keep_trailing_newline(true);
    env.add_filter("py", py_filter);
    env.add_template("conf.py", CONF_PY_TEMPLATE)?;

    let template = env.get_template("conf.py")?;
    Ok(template.render(Value::from_serialize(config))?)
}

pub fn to_json(config: &DocsConfig) -> Result<String> {
    Ok(serde_json::to_string_pretty(config)?)
}

pub fn to_yaml(config: &DocsConfig) -> Result<String> {
    Ok(serde_yaml::to_string(config)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manifest::Manifest;
    use crate::settings::DocsSettings;
    use serde_json::json;

    fn config() -> DocsConfig {
        let settings = DocsSettings::from_toml_str(
            r#"
[project]
name = "py-smps"
author = "QuantAQ, Inc."
copyright_first_year = 2020

[path_setup]
sys_path = ["../smps/"]
plot_backend = "Agg"

[general]
extensions = ["sphinx.ext.autodoc", "myst_parser"]
exclude_patterns = ["_build", "Thumbs.db"]
autosummary_generate = true
numpydoc_show_class_members = false

[myst]
heading_anchors = 3
disable_syntax = ["myst_block_break"]

[html]
theme = "furo"

[extra]
intersphinx_timeout = 5
"#,
        )
        .unwrap();
        let manifest =
            Manifest::parse("pyproject.toml", "[tool.poetry]\nversion = \"2.0.1\"\n").unwrap();
        DocsConfig::resolve_with_manifest(settings, &manifest, 2026).unwrap()
    }

    #[test]
    fn test_py_literal() {
        assert_eq!(py_literal(&json!(null)), "None");
        assert_eq!(py_literal(&json!(true)), "True");
        assert_eq!(py_literal(&json!(3)), "3");
        assert_eq!(py_literal(&json!(["a", false])), "['a', False]");
        assert_eq!(py_literal(&json!({"k": 1})), "{'k': 1}");
        assert_eq!(py_string("it's a \\ path\n"), "'it\\'s a \\\\ path\\n'");
    }

    #[test]
    fn test_conf_py_contents() {
        let rendered = render_conf_py(&config()).unwrap();

        assert!(rendered.contains("project = 'py-smps'\n"));
        assert!(rendered.contains("copyright = '2020-2026, QuantAQ, Inc.'\n"));
        assert!(rendered.contains("version = '2.0.1'\nrelease = version\n"));
        assert!(rendered.contains("sys.path.insert(0, os.path.abspath('../smps/'))"));
        assert!(rendered.contains("mpl.use('Agg')"));
        assert!(rendered.contains("extensions = ['sphinx.ext.autodoc', 'myst_parser']"));
        assert!(rendered.contains("autosummary_generate = True"));
        assert!(rendered.contains("numpydoc_show_class_members = False"));
        assert!(rendered.contains("exclude_patterns = ['_build', 'Thumbs.db']"));
        assert!(rendered.contains("myst_heading_anchors = 3"));
        assert!(rendered.contains("myst_disable_syntax = ['myst_block_break']"));
        assert!(rendered.contains("intersphinx_timeout = 5"));
        assert!(rendered.contains("html_theme = 'furo'"));
        assert!(rendered.contains("html_static_path = []"));
    }

    #[test]
    fn test_optional_sections_omitted() {
        let settings = DocsSettings::from_toml_str("[project]\nname = \"p\"\nauthor = \"a\"\n").unwrap();
        let manifest =
            Manifest::parse("pyproject.toml", "[tool.poetry]\nversion = \"1\"\n").unwrap();
        let config = DocsConfig::resolve_with_manifest(settings, &manifest, 2026).unwrap();
        let rendered = render_conf_py(&config).unwrap();

        assert!(!rendered.contains("import sys"));
        assert!(!rendered.contains("matplotlib"));
        assert!(!rendered.contains("autosummary_generate"));
        assert!(!rendered.contains("Additional settings"));
        assert!(rendered.contains("html_theme = 'alabaster'"));
    }

    #[test]
    fn test_yaml_and_json_agree_on_release() {
        let config = config();
        let json: serde_json::Value = serde_json::from_str(&to_json(&config).unwrap()).unwrap();
        let yaml: serde_yaml::Value = serde_yaml::from_str(&to_yaml(&config).unwrap()).unwrap();
        assert_eq!(json["release"], "2.0.1");
        assert_eq!(yaml["release"].as_str(), Some("2.0.1"));
        assert_eq!(json["version"], json["release"]);
    }
}
