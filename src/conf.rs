//! The resolved documentation-build configuration.
//!
//! A [`DocsConfig`] is what the external generator reads: settings with the
//! derived values (`copyright`, `version`/`release`) filled in. It is built
//! once per invocation and never written back to the settings.

use indexmap::{IndexMap, IndexSet};
use log::{debug, info, warn};
use serde::ser::SerializeStruct;
use serde::{Serialize, Serializer};
use std::path::{Path, PathBuf};

use crate::copyright::{current_year, derive_copyright};
use crate::error::{ConfError, Result};
use crate::manifest::Manifest;
use crate::matching::{self, DiscoveredSources};
use crate::settings::DocsSettings;

/// Deepest heading level MyST can anchor.
pub const MAX_HEADING_ANCHORS: u8 = 6;

/// Setting names the resolved record emits itself.
const RESERVED_NAMES: &[&str] = &[
    "project",
    "author",
    "copyright",
    "version",
    "release",
    "extensions",
    "templates_path",
    "exclude_patterns",
    "pygments_style",
    "autosummary_generate",
    "numpydoc_show_class_members",
    "myst_heading_anchors",
    "myst_disable_syntax",
    "html_theme",
    "html_static_path",
    "os",
    "sys",
    "mpl",
];

/// Names Python refuses as assignment targets.
const PYTHON_KEYWORDS: &[&str] = &[
    "False", "None", "True", "and", "as", "assert", "async", "await", "break", "class",
    "continue", "def", "del", "elif", "else", "except", "finally", "for", "from", "global",
    "if", "import", "in", "is", "lambda", "nonlocal", "not", "or", "pass", "raise", "return",
    "try", "while", "with", "yield",
];

/// Project version as read from the manifest.
///
/// Serves both `version` and `release`; they are one value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Version(String);

impl Version {
    pub fn new(version: impl Into<String>) -> Self {
        Self(version.into())
    }

    pub fn version(&self) -> &str {
        &self.0
    }

    pub fn release(&self) -> &str {
        &self.0
    }
}

impl Serialize for Version {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("Version", 2)?;
        state.serialize_field("version", &self.0)?;
        state.serialize_field("release", &self.0)?;
        state.end()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ProjectInfo {
    pub project: String,
    pub author: String,
    pub copyright: String,
    #[serde(flatten)]
    pub version: Version,
}

#[derive(Debug, Clone, Serialize)]
pub struct DocsConfig {
    #[serde(flatten)]
    pub info: ProjectInfo,
    pub sys_path: Vec<PathBuf>,
    pub plot_backend: Option<String>,
    pub extensions: Vec<String>,
    pub templates_path: Vec<String>,
    pub exclude_patterns: IndexSet<String>,
    #[serde(skip)]
    pub source_suffixes: Vec<String>,
    pub pygments_style: String,
    pub autosummary_generate: Option<bool>,
    pub numpydoc_show_class_members: Option<bool>,
    pub myst_heading_anchors: u8,
    pub myst_disable_syntax: IndexSet<String>,
    pub html_theme: String,
    pub html_static_path: Vec<String>,
    pub extra: IndexMap<String, serde_json::Value>,
}

impl DocsConfig {
    /// Resolve settings against the current year.
    ///
    /// `base_dir` is the directory relative manifest paths are taken from,
    /// normally the one holding the settings file.
    pub fn resolve(settings: DocsSettings, base_dir: &Path) -> Result<Self> {
        Self::resolve_for_year(settings, base_dir, current_year())
    }

    pub fn resolve_for_year(settings: DocsSettings, base_dir: &Path, year: i32) -> Result<Self> {
        let manifest = Manifest::load(settings.manifest_path(base_dir))?;
        Self::resolve_with_manifest(settings, &manifest, year)
    }

    pub fn resolve_with_manifest(
        settings: DocsSettings,
        manifest: &Manifest,
        year: i32,
    ) -> Result<Self> {
        let version = Version::new(manifest.version(&settings.manifest.version_key)?);

        let project = non_empty(settings.project.name)
            .or_else(|| manifest.project_name())
            .ok_or_else(|| ConfError::InvalidSetting {
                name: "project",
                reason: "not set and not found in the manifest".to_string(),
            })?;
        let author = non_empty(settings.project.author)
            .or_else(|| manifest.first_author())
            .ok_or_else(|| ConfError::InvalidSetting {
                name: "author",
                reason: "not set and not found in the manifest".to_string(),
            })?;

        let copyright = derive_copyright(settings.project.copyright_first_year, year, &author);

        let general = settings.general;
        let config = Self {
            info: ProjectInfo {
                project,
                author,
                copyright,
                version,
            },
            sys_path: settings.path_setup.sys_path,
            plot_backend: settings.path_setup.plot_backend,
            extensions: dedup_extensions(general.extensions),
            templates_path: general.templates_path,
            exclude_patterns: general.exclude_patterns,
            source_suffixes: general.source_suffixes,
            pygments_style: general.pygments_style,
            autosummary_generate: general.autosummary_generate,
            numpydoc_show_class_members: general.numpydoc_show_class_members,
            myst_heading_anchors: settings.myst.heading_anchors,
            myst_disable_syntax: settings.myst.disable_syntax,
            html_theme: settings.html.theme,
            html_static_path: settings.html.static_path,
            extra: settings.extra,
        };
        config.validate()?;

        info!(
            "Resolved {} {} ({})",
            config.info.project,
            config.info.version.version(),
            config.info.copyright
        );
        debug!("Extensions: {:?}", config.extensions);
        debug!("Exclude patterns: {:?}", config.exclude_patterns);

        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.myst_heading_anchors > MAX_HEADING_ANCHORS {
            return Err(ConfError::InvalidSetting {
                name: "myst_heading_anchors",
                reason: format!(
                    "{} exceeds the deepest heading level {}",
                    self.myst_heading_anchors, MAX_HEADING_ANCHORS
                ),
            });
        }
        if self.html_theme.trim().is_empty() {
            return Err(ConfError::InvalidSetting {
                name: "html_theme",
                reason: "must not be empty".to_string(),
            });
        }
        for name in self.extra.keys() {
            if !is_identifier(name) || PYTHON_KEYWORDS.contains(&name.as_str()) {
                return Err(ConfError::InvalidSetting {
                    name: "extra",
                    reason: format!("`{}` is not a valid setting name", name),
                });
            }
            if RESERVED_NAMES.contains(&name.as_str()) {
                return Err(ConfError::InvalidSetting {
                    name: "extra",
                    reason: format!("`{}` has a dedicated setting", name),
                });
            }
        }
        Ok(())
    }

    pub fn version(&self) -> &str {
        self.info.version.version()
    }

    pub fn release(&self) -> &str {
        self.info.version.release()
    }

    /// Sources under `root` after applying `exclude_patterns`.
    pub fn discover_sources(&self, root: &Path) -> Result<DiscoveredSources> {
        matching::discover_excluding(root, &self.exclude_patterns, &self.source_suffixes)
    }
}

fn non_empty(value: String) -> Option<String> {
    if value.trim().is_empty() {
        None
    } else {
        Some(value)
    }
}

/// Keeps the first occurrence of each extension; load order matters to the
/// generator.
fn dedup_extensions(extensions: Vec<String>) -> Vec<String> {
    let mut seen = IndexSet::new();
    for extension in extensions {
        if !seen.insert(extension.clone()) {
            warn!("Extension '{}' listed more than once, ignoring repeat", extension);
        }
    }
    seen.into_iter().collect()
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c == '_' || c.is_ascii_alphabetic() => {}
        _ => return false,
    }
    chars.all(|c| c == '_' || c.is_ascii_alphanumeric())
}
