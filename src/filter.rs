//! Extension filter
//!
//! Decides whether a changed path is worth a rebuild.

use std::collections::BTreeSet;
use std::path::Path;

/// Matches the extension of a changed path against the relevant set.
#[derive(Debug, Clone)]
pub struct ExtensionFilter {
    extensions: BTreeSet<String>,
}

impl ExtensionFilter {
    pub fn new(extensions: BTreeSet<String>) -> Self {
        Self { extensions }
    }

    /// Whether a change to `path` is relevant.
    ///
    /// The comparison is on the raw extension string, case-sensitive.
    pub fn is_relevant(&self, path: &Path) -> bool {
        self.extensions.contains(extension_of(path).as_str())
    }
}

/// Characters after the last `.` of the final path segment, or `""` if the
/// segment has no dot.
///
/// Unlike [`Path::extension`], a leading dot counts: `.bashrc` has the
/// extension `bashrc`, and `notes.` has the empty extension.
pub fn extension_of(path: &Path) -> String {
    let Some(name) = path.file_name() else {
        return String::new();
    };

    let name = name.to_string_lossy();
    match name.rsplit_once('.') {
        Some((_, ext)) => ext.to_string(),
        None => String::new(),
    }
}
