//! Block-level environment registry and processor.

use super::scan::{environment_pattern, optional_argument};
use super::stash::Stash;
use crate::config::{CustomEnvironment, Locale};
use crate::error::{ConfigError, Result};
use crate::html::escape_html;
use log::debug;
use regex::{Captures, Regex};

/// How an environment is rendered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnvironmentKind {
    /// Container with a bold prefix label (theorem, proof, ...).
    LabeledBlock { class: String },
    /// `\item`-separated list.
    List { tag: ListTag },
    /// Blockquote.
    QuotedBlock,
    /// Preformatted text, never interpreted further.
    LiteralBlock,
}

/// HTML list element of a list environment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListTag {
    Unordered,
    Ordered,
}

impl ListTag {
    fn as_str(self) -> &'static str {
        match self {
            ListTag::Unordered => "ul",
            ListTag::Ordered => "ol",
        }
    }
}

/// One registry entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvironmentDescriptor {
    pub name: String,
    pub kind: EnvironmentKind,
    pub display_prefix: Option<String>,
}

impl EnvironmentDescriptor {
    fn labeled(name: &str, class: &str, locale: Locale) -> Self {
        Self {
            name: name.to_string(),
            kind: EnvironmentKind::LabeledBlock {
                class: class.to_string(),
            },
            display_prefix: locale.environment_prefix(name).map(str::to_string),
        }
    }

    fn plain(name: &str, kind: EnvironmentKind) -> Self {
        Self {
            name: name.to_string(),
            kind,
            display_prefix: None,
        }
    }
}

/// The built-in registry, in processing order.
pub fn default_registry(locale: Locale) -> Vec<EnvironmentDescriptor> {
    vec![
        EnvironmentDescriptor::labeled("theorem", "theorem", locale),
        EnvironmentDescriptor::labeled("lemma", "theorem", locale),
        EnvironmentDescriptor::labeled("proposition", "theorem", locale),
        EnvironmentDescriptor::labeled("corollary", "theorem", locale),
        EnvironmentDescriptor::labeled("definition", "definition", locale),
        EnvironmentDescriptor::labeled("proof", "proof", locale),
        EnvironmentDescriptor::labeled("example", "example", locale),
        EnvironmentDescriptor::labeled("remark", "remark", locale),
        EnvironmentDescriptor::plain("itemize", EnvironmentKind::List { tag: ListTag::Unordered }),
        EnvironmentDescriptor::plain("enumerate", EnvironmentKind::List { tag: ListTag::Ordered }),
        EnvironmentDescriptor::plain("quote", EnvironmentKind::QuotedBlock),
        EnvironmentDescriptor::plain("verbatim", EnvironmentKind::LiteralBlock),
    ]
}

/// Names owned by other passes; a custom environment may not shadow them.
const RESERVED: &[&str] = &["algorithm", "document", "abstract"];

impl TryFrom<&CustomEnvironment> for EnvironmentDescriptor {
    type Error = ConfigError;

    fn try_from(custom: &CustomEnvironment) -> std::result::Result<Self, ConfigError> {
        let valid = !custom.name.is_empty()
            && custom
                .name
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '*' || c == '-' || c == '_');
        if !valid {
            return Err(ConfigError::InvalidEnvironment {
                name: custom.name.clone(),
                message: "names may only contain letters, digits, '*', '-' and '_'".to_string(),
            });
        }
        if RESERVED.contains(&custom.name.as_str())
            || super::math::MATH_ENVIRONMENTS.contains(&custom.name.as_str())
        {
            return Err(ConfigError::InvalidEnvironment {
                name: custom.name.clone(),
                message: "name is handled by another pass".to_string(),
            });
        }

        Ok(Self {
            name: custom.name.clone(),
            kind: EnvironmentKind::LabeledBlock {
                class: custom.class.clone().unwrap_or_else(|| custom.name.clone()),
            },
            display_prefix: Some(custom.prefix.clone()),
        })
    }
}

/// Rewrites every registered environment, one registry entry at a time.
#[derive(Debug)]
pub struct EnvironmentProcessor {
    entries: Vec<(EnvironmentDescriptor, Regex)>,
}

impl EnvironmentProcessor {
    /// Compile the registry.
    pub fn new(registry: Vec<EnvironmentDescriptor>) -> Result<Self> {
        let entries = registry
            .into_iter()
            .map(|descriptor| {
                let pattern = environment_pattern(&descriptor.name).map_err(|e| {
                    ConfigError::InvalidEnvironment {
                        name: descriptor.name.clone(),
                        message: e.to_string(),
                    }
                })?;
                Ok((descriptor, pattern))
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self { entries })
    }

    /// Built-in registry plus custom environments (custom ones are processed last).
    pub fn with_custom(locale: Locale, custom: &[CustomEnvironment]) -> Result<Self> {
        let mut registry = default_registry(locale);
        for env in custom {
            let descriptor = EnvironmentDescriptor::try_from(env)?;
            registry.retain(|existing| existing.name != descriptor.name);
            registry.push(descriptor);
        }
        Self::new(registry)
    }

    /// The registry in processing order.
    pub fn descriptors(&self) -> impl Iterator<Item = &EnvironmentDescriptor> {
        self.entries.iter().map(|(descriptor, _)| descriptor)
    }

    /// Replace every recognized environment span; unknown names are left alone.
    pub fn process(&self, text: &str, stash: &mut Stash) -> String {
        let mut content = text.to_string();

        for (descriptor, pattern) in &self.entries {
            if !content.contains(&format!("\\begin{{{}}}", descriptor.name)) {
                continue;
            }
            debug!("rewriting environment {}", descriptor.name);
            content = pattern
                .replace_all(&content, |caps: &Captures| {
                    let inner = caps.get(1).map_or("", |m| m.as_str());
                    render_environment(descriptor, inner, stash)
                })
                .into_owned();
        }

        content
    }
}

fn render_environment(descriptor: &EnvironmentDescriptor, inner: &str, stash: &mut Stash) -> String {
    match &descriptor.kind {
        EnvironmentKind::LabeledBlock { class } => {
            let prefix = descriptor.display_prefix.as_deref().unwrap_or(&descriptor.name);
            // \begin{theorem}[Fermat] carries an optional title.
            let (title, body) = match optional_argument(inner) {
                Ok((rest, title)) => (Some(title.trim()), rest),
                Err(_) => (None, inner),
            };
            let label = match title {
                Some(title) => format!("{} ({})", prefix, title),
                None => prefix.to_string(),
            };
            format!(
                r#"<div class="{}"><strong>{}:</strong> {}</div>"#,
                class,
                label,
                body.trim()
            )
        }
        EnvironmentKind::List { tag } => {
            let items: String = inner
                .split("\\item")
                .map(str::trim)
                .filter(|item| !item.is_empty())
                .map(|item| format!("<li>{}</li>", item))
                .collect();
            format!("<{0}>{1}</{0}>", tag.as_str(), items)
        }
        EnvironmentKind::QuotedBlock => format!("<blockquote>{}</blockquote>", inner.trim()),
        EnvironmentKind::LiteralBlock => {
            stash.park(format!("<pre><code>{}</code></pre>", escape_html(inner.trim())))
        }
    }
}
