//! Content kind dispatch.

use std::fmt;
use std::path::Path;

/// Which renderer a document goes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContentKind {
    Markdown,
    Latex,
    Plain,
}

impl ContentKind {
    /// Classify a file-type token; matching ignores case and unknown tokens are plain text.
    pub fn from_file_type(file_type: &str) -> Self {
        match file_type.trim().to_ascii_lowercase().as_str() {
            "md" | "markdown" => ContentKind::Markdown,
            "tex" | "latex" => ContentKind::Latex,
            _ => ContentKind::Plain,
        }
    }

    /// Classify a path by its extension.
    pub fn from_path(path: impl AsRef<Path>) -> Self {
        path.as_ref()
            .extension()
            .and_then(|ext| ext.to_str())
            .map_or(ContentKind::Plain, Self::from_file_type)
    }

    /// Canonical file-type token.
    pub fn as_str(self) -> &'static str {
        match self {
            ContentKind::Markdown => "md",
            ContentKind::Latex => "tex",
            ContentKind::Plain => "txt",
        }
    }
}

impl fmt::Display for ContentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
