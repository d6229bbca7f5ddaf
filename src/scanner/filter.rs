//! Extension allow-list filtering.
//!
//! [`ExtensionFilter`] narrows the enumerated candidates to regular files
//! whose extension appears in a case-insensitive allow-list. Entries are
//! normalized once at construction: `"JPG"`, `".jpg"` and `" .Jpg "` all
//! become `".jpg"`.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use crate::config::ConfigError;

/// Case-insensitive extension allow-list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtensionFilter {
    allowed: BTreeSet<String>,
}

impl ExtensionFilter {
    /// Build a filter from raw allow-list entries.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::EmptyExtensions`] if no entries are given and
    /// [`ConfigError::InvalidExtension`] if an entry cannot name a file
    /// extension (empty, or containing a dot, separator or whitespace after
    /// the leading dot).
    pub fn new<I, S>(extensions: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let allowed = extensions
            .into_iter()
            .map(|raw| normalize_extension(raw.as_ref()))
            .collect::<Result<BTreeSet<_>, _>>()?;

        if allowed.is_empty() {
            return Err(ConfigError::EmptyExtensions);
        }

        log::debug!("Extension filter: {:?}", allowed);
        Ok(Self { allowed })
    }

    /// Normalized allow-list entries, sorted.
    pub fn extensions(&self) -> impl Iterator<Item = &str> {
        self.allowed.iter().map(String::as_str)
    }

    /// Whether the path's extension is allowed. Does not touch the filesystem.
    #[must_use]
    pub fn matches(&self, path: &Path) -> bool {
        match path.extension() {
            Some(ext) => {
                let ext = format!(".{}", ext.to_string_lossy().to_lowercase());
                self.allowed.contains(&ext)
            }
            None => false,
        }
    }

    /// Whether the path is an existing regular file with an allowed extension.
    ///
    /// Follows symlinks, so a broken link is rejected. A file that vanished
    /// since enumeration is rejected without error.
    #[must_use]
    pub fn accepts(&self, path: &Path) -> bool {
        if !self.matches(path) {
            log::trace!("Extension not allowed: {}", path.display());
            return false;
        }
        match std::fs::metadata(path) {
            Ok(meta) if meta.is_file() => true,
            Ok(_) => false,
            Err(e) => {
                log::debug!("Dropping {} from candidates: {}", path.display(), e);
                false
            }
        }
    }

    /// Lazily filter a sequence of enumerated paths.
    pub fn filter<'a, I>(&'a self, paths: I) -> impl Iterator<Item = PathBuf> + 'a
    where
        I: IntoIterator<Item = PathBuf>,
        I::IntoIter: 'a,
    {
        paths.into_iter().filter(move |p| self.accepts(p))
    }
}

/// Normalize one allow-list entry to lower-case with a leading dot.
fn normalize_extension(raw: &str) -> Result<String, ConfigError> {
    let trimmed = raw.trim();
    let bare = trimmed.strip_prefix('.').unwrap_or(trimmed);

    let valid = !bare.is_empty()
        && !bare
            .chars()
            .any(|c| c == '.' || c == '/' || c == '\\' || c.is_whitespace());
    if !valid {
        return Err(ConfigError::InvalidExtension(raw.to_string()));
    }

    Ok(format!(".{}", bare.to_lowercase()))
}
