//! Renderer configuration, loadable from TOML.
//!
//! ```text
//! locale = "zh"
//! math_backend = "katex"
//! standalone = false
//!
//! [macros]
//! E = "\\mathbb{E}"
//! norm = "\\left\\lVert #1 \\right\\rVert"
//!
//! [[environments]]
//! name = "conjecture"
//! class = "theorem"
//! prefix = "Conjecture"
//!
//! [markdown]
//! quotes = ["«", "»"]
//! ```

use crate::error::{ConfigError, Result};
use crate::math::MathBackend;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// Language used for environment prefixes and the abstract heading.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    #[default]
    En,
    Zh,
}

impl Locale {
    /// Display prefix for a labeled-block environment, if the name is a built-in one.
    pub fn environment_prefix(self, name: &str) -> Option<&'static str> {
        let prefix = match (self, name) {
            (Locale::En, "theorem") => "Theorem",
            (Locale::En, "lemma") => "Lemma",
            (Locale::En, "proposition") => "Proposition",
            (Locale::En, "corollary") => "Corollary",
            (Locale::En, "definition") => "Definition",
            (Locale::En, "proof") => "Proof",
            (Locale::En, "example") => "Example",
            (Locale::En, "remark") => "Remark",
            (Locale::Zh, "theorem") => "定理",
            (Locale::Zh, "lemma") => "引理",
            (Locale::Zh, "proposition") => "命题",
            (Locale::Zh, "corollary") => "推论",
            (Locale::Zh, "definition") => "定义",
            (Locale::Zh, "proof") => "证明",
            (Locale::Zh, "example") => "例",
            (Locale::Zh, "remark") => "注",
            _ => return None,
        };
        Some(prefix)
    }

    /// Heading of the `abstract` block.
    pub fn abstract_title(self) -> &'static str {
        match self {
            Locale::En => "Abstract",
            Locale::Zh => "摘要",
        }
    }
}

/// A labeled-block environment added on top of the built-in registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomEnvironment {
    /// Environment name as written in `\begin{NAME}`.
    pub name: String,
    /// CSS class of the container (defaults to the name).
    #[serde(default)]
    pub class: Option<String>,
    /// Bold label printed before the content.
    pub prefix: String,
}

/// Options for the markdown path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MarkdownConfig {
    /// Render soft line breaks as `<br />`.
    pub breaks: bool,
    /// Turn bare URLs into links.
    pub linkify: bool,
    /// Typographic quotes and dashes.
    pub typographer: bool,
    /// Opening and closing double quote used by the typographer.
    pub quotes: (String, String),
    /// Highlight fenced code blocks.
    pub highlight: bool,
    /// Replace `:shortcode:` with emoji.
    pub emoji: bool,
}

impl Default for MarkdownConfig {
    fn default() -> Self {
        Self {
            breaks: true,
            linkify: true,
            typographer: true,
            quotes: ("\"".to_string(), "\"".to_string()),
            highlight: true,
            emoji: true,
        }
    }
}

/// Top-level renderer configuration.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Language of environment prefixes.
    pub locale: Locale,
    /// Math engine used for every math region.
    pub math_backend: MathBackend,
    /// Extra math macros, merged over the built-in table (`#1`, `#2` for arguments).
    pub macros: BTreeMap<String, String>,
    /// Extra labeled-block environments.
    pub environments: Vec<CustomEnvironment>,
    /// Produce a complete HTML page instead of a fragment.
    pub standalone: bool,
    /// Page title for standalone output.
    pub title: Option<String>,
    /// Markdown path options.
    pub markdown: MarkdownConfig,
}

impl RenderConfig {
    /// Parse a configuration from TOML text.
    pub fn from_toml_str(input: &str) -> Result<Self> {
        let config: RenderConfig =
            toml::from_str(input).map_err(|e| ConfigError::Toml(e.to_string()))?;
        Ok(config)
    }

    /// Read and parse a TOML configuration file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_empty_config_is_default() {
        let config = RenderConfig::from_toml_str("").unwrap();
        assert_eq!(config, RenderConfig::default());
    }

    #[test]
    fn test_full_config() {
        let input = r#"
locale = "zh"
math_backend = "mathjax"
standalone = true
title = "Notes"

[macros]
E = "\\mathbb{E}"

[[environments]]
name = "conjecture"
prefix = "Conjecture"

[markdown]
breaks = false
quotes = ["«", "»"]
"#;
        let config = RenderConfig::from_toml_str(input).unwrap();
        assert_eq!(config.locale, Locale::Zh);
        assert_eq!(config.math_backend, MathBackend::MathJax);
        assert!(config.standalone);
        assert_eq!(config.macros.get("E").map(String::as_str), Some("\\mathbb{E}"));
        assert_eq!(config.environments[0].name, "conjecture");
        assert_eq!(config.environments[0].class, None);
        assert!(!config.markdown.breaks);
        assert!(config.markdown.linkify);
        assert_eq!(config.markdown.quotes, ("«".to_string(), "»".to_string()));
    }

    #[test]
    fn test_invalid_toml() {
        let err = RenderConfig::from_toml_str("locale = ").unwrap_err();
        assert!(err.to_string().contains("Invalid TOML"));
    }

    #[test]
    fn test_unknown_locale_rejected() {
        assert!(RenderConfig::from_toml_str("locale = \"fr\"").is_err());
    }

    #[test]
    fn test_locale_prefixes() {
        assert_eq!(Locale::En.environment_prefix("lemma"), Some("Lemma"));
        assert_eq!(Locale::Zh.environment_prefix("theorem"), Some("定理"));
        assert_eq!(Locale::En.environment_prefix("itemize"), None);
        assert_eq!(Locale::Zh.abstract_title(), "摘要");
    }
}
