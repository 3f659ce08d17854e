//! Project manifest (`pyproject.toml`) lookups.
//!
//! The manifest is the single source of the documented version. It is read
//! once per resolution; any failure here is fatal for the build.

use log::debug;
use std::path::{Path, PathBuf};
use toml::{Table, Value};

use crate::error::{ConfError, Result};

/// Default dotted key path of the version entry.
pub const DEFAULT_VERSION_KEY: &str = "tool.poetry.version";

#[derive(Debug, Clone)]
pub struct Manifest {
    path: PathBuf,
    table: Table,
}

impl Manifest {
    /// Read and parse a manifest file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let content = std::fs::read_to_string(&path).map_err(|source| ConfError::ManifestRead {
            path: path.clone(),
            source,
        })?;
        Self::parse(path, &content)
    }

    /// Parse manifest content; `path` is only used in error messages.
    pub fn parse(path: impl Into<PathBuf>, content: &str) -> Result<Self> {
        let path = path.into();
        let table: Table = toml::from_str(content).map_err(|source| ConfError::ManifestParse {
            path: path.clone(),
            source,
        })?;
        debug!("Loaded manifest {}", path.display());
        Ok(Self { path, table })
    }

    /// Look up a value by dotted key path, e.g. `tool.poetry.version`.
    pub fn lookup(&self, key: &str) -> Option<&Value> {
        let mut parts = key.split('.');
        let first = parts.next()?;
        let mut current = self.table.get(first)?;
        for part in parts {
            current = current.as_table()?.get(part)?;
        }
        Some(current)
    }

    /// The project version found at `key`. Empty strings are returned as is.
    pub fn version(&self, key: &str) -> Result<String> {
        match self.lookup(key) {
            Some(Value::String(version)) => Ok(version.clone()),
            Some(_) => Err(ConfError::NotAString {
                path: self.path.clone(),
                key: key.to_string(),
            }),
            None => Err(ConfError::MissingKey {
                path: self.path.clone(),
                key: key.to_string(),
            }),
        }
    }

    /// Project name from the Poetry section or the PEP 621 `[project]` table.
    pub fn project_name(&self) -> Option<String> {
        ["tool.poetry.name", "project.name"]
            .iter()
            .find_map(|key| self.lookup(key).and_then(Value::as_str))
            .map(str::to_string)
    }

    /// First listed author with any `<email>` suffix removed.
    pub fn first_author(&self) -> Option<String> {
        let poetry = self
            .lookup("tool.poetry.authors")
            .and_then(Value::as_array)
            .and_then(|authors| authors.first())
            .and_then(Value::as_str);

        let pep621 = || {
            self.lookup("project.authors")
                .and_then(Value::as_array)
                .and_then(|authors| authors.first())
                .and_then(|author| author.get("name"))
                .and_then(Value::as_str)
        };

        poetry.or_else(pep621).map(strip_email).filter(|a| !a.is_empty())
    }
}

fn strip_email(author: &str) -> String {
    match author.find('<') {
        Some(idx) => author[..idx].trim().to_string(),
        None => author.trim().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const POETRY: &str = r#"
[tool.poetry]
name = "py-smps"
version = "2.1.0a3"
authors = ["David H Hagan <david.hagan@quant-aq.com>"]
"#;

    #[test]
    fn test_version_from_poetry_section() {
        let manifest = Manifest::parse("pyproject.toml", POETRY).unwrap();
        assert_eq!(manifest.version(DEFAULT_VERSION_KEY).unwrap(), "2.1.0a3");
    }

    #[test]
    fn test_missing_version_key() {
        let manifest = Manifest::parse("pyproject.toml", "[tool.poetry]\nname = \"x\"\n").unwrap();
        let err = manifest.version(DEFAULT_VERSION_KEY).unwrap_err();
        assert!(matches!(err, ConfError::MissingKey { ref key, .. } if key == "tool.poetry.version"));
    }

    #[test]
    fn test_non_string_version() {
        let manifest = Manifest::parse("pyproject.toml", "[tool.poetry]\nversion = 3\n").unwrap();
        assert!(matches!(
            manifest.version(DEFAULT_VERSION_KEY),
            Err(ConfError::NotAString { .. })
        ));
    }

    #[test]
    fn test_intermediate_key_not_a_table() {
        let manifest = Manifest::parse("pyproject.toml", "tool = \"flat\"\n").unwrap();
        assert!(matches!(
            manifest.version(DEFAULT_VERSION_KEY),
            Err(ConfError::MissingKey { .. })
        ));
    }

    #[test]
    fn test_malformed_manifest() {
        let err = Manifest::parse("pyproject.toml", "[tool.poetry\nversion = ").unwrap_err();
        assert!(matches!(err, ConfError::ManifestParse { .. }));
    }

    #[test]
    fn test_missing_manifest_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let err = Manifest::load(dir.path().join("pyproject.toml")).unwrap_err();
        assert!(matches!(err, ConfError::ManifestRead { .. }));
    }

    #[test]
    fn test_project_metadata_fallbacks() {
        let manifest = Manifest::parse("pyproject.toml", POETRY).unwrap();
        assert_eq!(manifest.project_name().as_deref(), Some("py-smps"));
        assert_eq!(manifest.first_author().as_deref(), Some("David H Hagan"));

        let pep621 = r#"
[project]
name = "demo"
version = "0.4.0"
authors = [{ name = "Jane Doe", email = "jane@example.com" }]
"#;
        let manifest = Manifest::parse("pyproject.toml", pep621).unwrap();
        assert_eq!(manifest.version("project.version").unwrap(), "0.4.0");
        assert_eq!(manifest.project_name().as_deref(), Some("demo"));
        assert_eq!(manifest.first_author().as_deref(), Some("Jane Doe"));
    }
}
