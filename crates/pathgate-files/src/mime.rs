//! Extension → content type table for downloads.

use std::collections::HashMap;

use crate::constants::DEFAULT_CONTENT_TYPE;

/// Built-in extension table. Keys have no leading `.`.
const DEFAULT_TYPES: &[(&str, &str)] = &[
    ("7z", "application/x-7z-compressed"),
    ("bz2", "application/x-bzip2"),
    ("css", "text/css"),
    ("csv", "text/csv"),
    ("gif", "image/gif"),
    ("gz", "application/x-gzip"),
    ("htm", "text/html"),
    ("html", "text/html"),
    ("ico", "image/x-icon"),
    ("jar", "application/java-archive"),
    ("jpeg", "image/jpeg"),
    ("jpg", "image/jpeg"),
    ("js", "application/javascript"),
    ("json", "application/json"),
    ("md", "text/markdown"),
    ("mp3", "audio/mpeg"),
    ("mp4", "video/mp4"),
    ("pdf", "application/pdf"),
    ("png", "image/png"),
    ("sh", "application/x-sh"),
    ("svg", "image/svg+xml"),
    ("tar", "application/x-tar"),
    ("tgz", "application/x-compressed"),
    ("tif", "image/tiff"),
    ("tiff", "image/tiff"),
    ("toml", "application/toml"),
    ("txt", "text/plain"),
    ("wasm", "application/wasm"),
    ("webp", "image/webp"),
    ("xml", "application/xml"),
    ("yaml", "application/yaml"),
    ("yml", "application/yaml"),
    ("zip", "application/zip"),
];

/// Extension → content type lookup.
#[derive(Debug, Clone)]
pub struct MimeTypes {
    types: HashMap<String, String>,
}

impl Default for MimeTypes {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl MimeTypes {
    /// Table pre-populated with common extensions.
    pub fn with_defaults() -> Self {
        let types = DEFAULT_TYPES
            .iter()
            .map(|(ext, ty)| (ext.to_string(), ty.to_string()))
            .collect();
        Self { types }
    }

    /// Add or replace an entry. A leading `.` on `extension` is ignored.
    pub fn insert(&mut self, extension: &str, content_type: impl Into<String>) {
        let extension = extension.trim_start_matches('.');
        self.types.insert(extension.to_string(), content_type.into());
    }

    /// Look up the content type registered for `extension` (no leading `.`).
    pub fn lookup(&self, extension: &str) -> Option<&str> {
        self.types.get(extension).map(String::as_str)
    }

    /// Content type for a filename, from the text after its final `.`.
    ///
    /// Falls back to `application/octet-stream` when there is no extension
    /// or it is not in the table.
    pub fn content_type_for(&self, filename: &str) -> &str {
        filename
            .rsplit_once('.')
            .and_then(|(_, ext)| self.lookup(ext))
            .unwrap_or(DEFAULT_CONTENT_TYPE)
    }
}

impl<K: AsRef<str>, V: Into<String>> Extend<(K, V)> for MimeTypes {
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (ext, ty) in iter {
            self.insert(ext.as_ref(), ty);
        }
    }
}
