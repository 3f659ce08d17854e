//! User-authored documentation settings.
//!
//! Settings are layered: a file (TOML, YAML or JSON, picked by extension)
//! overlaid with `SPHINX_CONF__*` environment variables, where `__` separates
//! nesting levels (`SPHINX_CONF__HTML__THEME=furo` sets `html.theme`).

use config::{Config, Environment, File};
use indexmap::{IndexMap, IndexSet};
use log::info;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::manifest::DEFAULT_VERSION_KEY;
use crate::matching::{self, DiscoveredSources};

/// Environment variable prefix for overrides.
pub const ENV_PREFIX: &str = "SPHINX_CONF";

/// Sequence settings; their environment overrides are comma separated.
const LIST_KEYS: &[&str] = &[
    "general.extensions",
    "general.templates_path",
    "general.exclude_patterns",
    "general.source_suffixes",
    "myst.disable_syntax",
    "path_setup.sys_path",
    "html.static_path",
];

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DocsSettings {
    pub project: ProjectSettings,
    pub manifest: ManifestSettings,
    pub path_setup: PathSetup,
    pub general: GeneralSettings,
    pub myst: MystSettings,
    pub html: HtmlSettings,
    /// Further `name = value` settings passed through to conf.py.
    pub extra: IndexMap<String, serde_json::Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ProjectSettings {
    /// Empty means "take it from the manifest".
    pub name: String,
    pub author: String,
    /// Fixed start year of the copyright range.
    pub copyright_first_year: Option<i32>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ManifestSettings {
    /// Relative paths are taken from the settings file's directory.
    pub path: PathBuf,
    pub version_key: String,
}

impl Default for ManifestSettings {
    fn default() -> Self {
        Self {
            path: PathBuf::from("../pyproject.toml"),
            version_key: DEFAULT_VERSION_KEY.to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PathSetup {
    /// Directories prepended to the generator's import path.
    pub sys_path: Vec<PathBuf>,
    /// Plotting backend forced before extensions are imported.
    pub plot_backend: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct GeneralSettings {
    pub extensions: Vec<String>,
    pub templates_path: Vec<String>,
    pub exclude_patterns: IndexSet<String>,
    pub source_suffixes: Vec<String>,
    pub pygments_style: String,
    pub autosummary_generate: Option<bool>,
    pub numpydoc_show_class_members: Option<bool>,
}

impl Default for GeneralSettings {
    fn default() -> Self {
        Self {
            extensions: Vec::new(),
            templates_path: vec!["_templates".to_string()],
            exclude_patterns: IndexSet::new(),
            source_suffixes: vec![".rst".to_string(), ".md".to_string(), ".ipynb".to_string()],
            pygments_style: "sphinx".to_string(),
            autosummary_generate: None,
            numpydoc_show_class_members: None,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct MystSettings {
    /// Deepest heading level that gets an anchor id; 0 disables anchors.
    pub heading_anchors: u8,
    pub disable_syntax: IndexSet<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct HtmlSettings {
    pub theme: String,
    pub static_path: Vec<String>,
}

impl Default for HtmlSettings {
    fn default() -> Self {
        Self {
            theme: "alabaster".to_string(),
            static_path: Vec::new(),
        }
    }
}

impl GeneralSettings {
    /// Sources under `root`, skipping `exclude_patterns`.
    pub fn discover_sources(&self, root: &Path) -> Result<DiscoveredSources> {
        matching::discover_excluding(root, &self.exclude_patterns, &self.source_suffixes)
    }
}

fn env_overrides() -> Environment {
    LIST_KEYS.iter().fold(
        Environment::with_prefix(ENV_PREFIX)
            .separator("__")
            .try_parsing(true)
            .list_separator(","),
        |env, key| env.with_list_parse_key(key),
    )
}

impl DocsSettings {
    /// Load settings from `path` with environment overrides applied on top.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        info!("Loading settings from {}", path.display());

        let settings = Config::builder()
            .add_source(File::from(path).required(true))
            .add_source(env_overrides())
            .build()?
            .try_deserialize::<Self>()?;

        Ok(settings)
    }

    /// Parse settings from a TOML string without environment overrides.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let settings = Config::builder()
            .add_source(File::from_str(content, config::FileFormat::Toml))
            .build()?
            .try_deserialize::<Self>()?;
        Ok(settings)
    }

    /// Manifest path, resolved against `base_dir` when relative.
    pub fn manifest_path(&self, base_dir: &Path) -> PathBuf {
        if self.manifest.path.is_absolute() {
            self.manifest.path.clone()
        } else {
            base_dir.join(&self.manifest.path)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = DocsSettings::default();
        assert_eq!(settings.html.theme, "alabaster");
        assert_eq!(settings.manifest.version_key, "tool.poetry.version");
        assert_eq!(settings.general.templates_path, vec!["_templates"]);
        assert!(settings.general.exclude_patterns.is_empty());
        assert_eq!(settings.myst.heading_anchors, 0);
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let settings = DocsSettings::from_toml_str(
            r#"
[project]
name = "py-smps"
copyright_first_year = 2020

[myst]
heading_anchors = 3
disable_syntax = ["myst_block_break", "math_block", "math_block"]
"#,
        )
        .unwrap();

        assert_eq!(settings.project.name, "py-smps");
        assert_eq!(settings.project.copyright_first_year, Some(2020));
        assert_eq!(settings.myst.heading_anchors, 3);
        assert_eq!(settings.myst.disable_syntax.len(), 2);
        assert_eq!(settings.html.theme, "alabaster");
    }

    #[test]
    fn test_load_yaml_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("sphinx-conf.yaml");
        std::fs::write(
            &path,
            "html:\n  theme: furo\ngeneral:\n  extensions:\n    - myst_parser\n    - numpydoc\n",
        )
        .unwrap();

        let settings = DocsSettings::load(&path).unwrap();
        assert_eq!(settings.html.theme, "furo");
        assert_eq!(settings.general.extensions, vec!["myst_parser", "numpydoc"]);
    }

    #[test]
    fn test_missing_settings_file() {
        let dir = tempfile::TempDir::new().unwrap();
        assert!(DocsSettings::load(dir.path().join("absent.toml")).is_err());
    }

    #[test]
    fn test_manifest_path_resolution() {
        let settings = DocsSettings::default();
        assert_eq!(
            settings.manifest_path(Path::new("/repo/docs")),
            PathBuf::from("/repo/docs/../pyproject.toml")
        );
    }
}
