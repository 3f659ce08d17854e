//! Sphinx Conf
//!
//! Resolves a Sphinx documentation-build configuration from typed settings and
//! the project's `pyproject.toml`, discovers documentation sources, and emits
//! the record the documentation generator reads.

pub mod conf;
pub mod copyright;
pub mod error;
pub mod manifest;
pub mod matching;
pub mod render;
pub mod settings;

pub use conf::{DocsConfig, ProjectInfo, Version};
pub use copyright::{current_year, derive_copyright};
pub use error::{ConfError, Result};
pub use manifest::Manifest;
pub use matching::{discover_sources, pattern_match, translate_pattern, DiscoveredSources};
pub use render::{render_conf_py, to_json, to_yaml};
pub use settings::DocsSettings;
