//! Glob matching and documentation source discovery.
//!
//! Patterns follow Sphinx's `exclude_patterns` semantics and are always
//! matched against paths relative to the source root, with `/` separators:
//! - `**` matches any files and zero or more directories
//! - `*` matches everything except a directory separator
//! - `?` matches any single character except a directory separator
//! - `[seq]` / `[!seq]` match a character in / not in `seq`

use indexmap::IndexSet;
use lazy_static::lazy_static;
use log::{debug, trace};
use parking_lot::Mutex;
use regex::Regex;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::error::{ConfError, Result};

lazy_static! {
    /// Compiled patterns, keyed by the glob text.
    static ref PATTERN_CACHE: Mutex<HashMap<String, Regex>> = Mutex::new(HashMap::new());
}

/// Translates a glob pattern into an anchored regular expression.
pub fn translate_pattern(pattern: &str) -> String {
    let chars: Vec<char> = pattern.chars().collect();
    let mut out = String::from("^");
    let mut i = 0;

    while i < chars.len() {
        match chars[i] {
            '*' if chars.get(i + 1) == Some(&'*') => {
                if chars.get(i + 2) == Some(&'/') {
                    out.push_str("(?:[^/]+/)*");
                    i += 3;
                } else {
                    out.push_str(".*");
                    i += 2;
                }
            }
            '*' => {
                out.push_str("[^/]*");
                i += 1;
            }
            '?' => {
                out.push_str("[^/]");
                i += 1;
            }
            '[' => match class_end(&chars, i) {
                Some(end) => {
                    out.push('[');
                    let mut k = i + 1;
                    if matches!(chars[k], '!' | '^') {
                        out.push('^');
                        k += 1;
                    }
                    push_class_body(&mut out, &chars[k..end]);
                    out.push(']');
                    i = end + 1;
                }
                None => {
                    out.push_str("\\[");
                    i += 1;
                }
            },
            c => {
                if matches!(c, '\\' | '.' | '^' | '$' | '+' | '{' | '}' | '|' | '(' | ')') {
                    out.push('\\');
                }
                out.push(c);
                i += 1;
            }
        }
    }

    out.push('$');
    out
}

/// Writes a class body with every member taken literally, except `-`
/// between two members which stays a range.
fn push_class_body(out: &mut String, body: &[char]) {
    for (k, &c) in body.iter().enumerate() {
        match c {
            '-' => {
                let is_range = k > 0
                    && k + 1 < body.len()
                    && body[k - 1] != '-'
                    && body[k + 1] != '-';
                if !is_range {
                    out.push('\\');
                }
                out.push('-');
            }
            '\\' | '[' | ']' | '&' | '~' | '^' => {
                out.push('\\');
                out.push(c);
            }
            c => out.push(c),
        }
    }
}

/// Index of the `]` closing the class opened at `start`, if any.
fn class_end(chars: &[char], start: usize) -> Option<usize> {
    let mut j = start + 1;
    if j < chars.len() && matches!(chars[j], '!' | '^') {
        j += 1;
    }
    // A leading `]` is a literal member of the class.
    if j < chars.len() && chars[j] == ']' {
        j += 1;
    }
    (j..chars.len()).find(|&k| chars[k] == ']')
}

/// Compiles a glob into a regex, reusing earlier compilations.
pub fn compile_pattern(pattern: &str) -> Result<Regex> {
    let mut cache = PATTERN_CACHE.lock();
    if let Some(regex) = cache.get(pattern) {
        return Ok(regex.clone());
    }

    let regex = Regex::new(&translate_pattern(pattern)).map_err(|source| ConfError::Pattern {
        pattern: pattern.to_string(),
        source,
    })?;
    cache.insert(pattern.to_string(), regex.clone());
    Ok(regex)
}

/// Tests if a relative path matches a glob pattern.
pub fn pattern_match(name: &str, pattern: &str) -> Result<bool> {
    Ok(compile_pattern(pattern)?.is_match(name))
}

/// Normalizes a path to forward slashes for matching.
pub fn normalize_path(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}

/// A compiled set of exclude patterns.
#[derive(Debug, Clone)]
pub struct PatternSet {
    patterns: Vec<Regex>,
}

impl PatternSet {
    pub fn new<S: AsRef<str>>(patterns: &[S]) -> Result<Self> {
        let patterns = patterns
            .iter()
            .map(|p| compile_pattern(p.as_ref()))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { patterns })
    }

    pub fn matches(&self, relative: &str) -> bool {
        self.patterns.iter().any(|regex| regex.is_match(relative))
    }
}

/// Result of scanning a source root.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DiscoveredSources {
    /// Source files to document, relative to the root.
    pub sources: Vec<PathBuf>,
    /// Files and pruned directories skipped by an exclude pattern.
    pub excluded: Vec<PathBuf>,
}

/// Walks `root` and sorts every entry into sources or exclusions.
///
/// A directory whose relative path matches an exclude pattern is pruned as a
/// whole and reported once. Files count as sources when they match an
/// include pattern (all files when `include` is empty) and end in one of
/// `suffixes` (any suffix when `suffixes` is empty). Both lists are sorted.
pub fn discover_sources<S: AsRef<str>>(
    root: impl AsRef<Path>,
    include: &[S],
    exclude: &[S],
    suffixes: &[S],
) -> Result<DiscoveredSources> {
    let root = root.as_ref();
    let include = if include.is_empty() {
        PatternSet::new(&["**"])?
    } else {
        PatternSet::new(include)?
    };
    let exclude = PatternSet::new(exclude)?;

    let mut found = DiscoveredSources::default();
    let mut walker = WalkDir::new(root).min_depth(1).into_iter();

    while let Some(entry) = walker.next() {
        let entry = entry.map_err(|source| ConfError::Walk {
            path: root.to_path_buf(),
            source,
        })?;
        let relative = match entry.path().strip_prefix(root) {
            Ok(relative) => relative.to_path_buf(),
            Err(_) => continue,
        };
        let normalized = normalize_path(&relative);

        if entry.file_type().is_dir() {
            if exclude.matches(&normalized) {
                trace!("Pruning excluded directory {}", normalized);
                walker.skip_current_dir();
                found.excluded.push(relative);
            }
            continue;
        }

        if exclude.matches(&normalized) {
            found.excluded.push(relative);
        } else if include.matches(&normalized) && has_suffix(&normalized, suffixes) {
            found.sources.push(relative);
        }
    }

    found.sources.sort();
    found.excluded.sort();
    debug!(
        "Discovered {} sources under {} ({} excluded)",
        found.sources.len(),
        root.display(),
        found.excluded.len()
    );
    Ok(found)
}

/// Discovery over every file, filtered by exclude patterns and source
/// suffixes.
pub fn discover_excluding(
    root: &Path,
    exclude: &IndexSet<String>,
    suffixes: &[String],
) -> Result<DiscoveredSources> {
    let exclude: Vec<String> = exclude.iter().cloned().collect();
    discover_sources(root, &[] as &[String], &exclude, suffixes)
}

fn has_suffix<S: AsRef<str>>(name: &str, suffixes: &[S]) -> bool {
    suffixes.is_empty() || suffixes.iter().any(|s| name.ends_with(s.as_ref()))
}
