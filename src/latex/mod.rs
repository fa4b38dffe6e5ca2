//! LaTeX-dialect to HTML pipeline.
//!
//! The body goes through a fixed sequence of rewriting passes:
//!
//! 1. `algorithm` spans are parked untouched for the final pass
//! 2. block environments (theorem-like, lists, quotes, verbatim)
//! 3. inline commands, outside math regions
//! 4. math environments, sectioning and `abstract`
//! 5. inline math
//! 6. display math
//! 7. algorithm conversion
//!
//! Rendered fragments are parked in a [`Stash`](stash::Stash) so no later
//! pass can rewrite them, and restored at the end.

mod algorithm;
mod commands;
mod environments;
mod math;
pub(crate) mod scan;
mod splitter;
mod stash;

pub use self::algorithm::convert_algorithm;
pub use self::commands::CommandTable;
pub use self::environments::{
    default_registry, EnvironmentDescriptor, EnvironmentKind, EnvironmentProcessor, ListTag,
};
pub use self::math::{MathEnvironmentProcessor, MATH_ENVIRONMENTS};
pub use self::splitter::{split_document, Preamble, SplitDocument};

use self::math::{render_display_math, render_inline_math};
use self::scan::environment_pattern;
use self::stash::{strip_reserved, Stash};
use crate::config::RenderConfig;
use crate::error::Result;
use crate::math::MathEngine;
use log::debug;
use regex::{Captures, NoExpand, Regex};
use std::sync::LazyLock;

static ALGORITHM: LazyLock<Regex> = LazyLock::new(|| environment_pattern("algorithm").unwrap());
static MAKETITLE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\\maketitle\b").unwrap());

/// Renders LaTeX-dialect documents. Immutable once built.
#[derive(Debug)]
pub struct LatexRenderer {
    environments: EnvironmentProcessor,
    math_environments: MathEnvironmentProcessor,
    protected: Vec<Regex>,
    engine: MathEngine,
}

impl LatexRenderer {
    pub fn new(config: &RenderConfig) -> Result<Self> {
        let math_environments = MathEnvironmentProcessor::new(config.locale);
        Ok(Self {
            environments: EnvironmentProcessor::with_custom(config.locale, &config.environments)?,
            protected: math_environments.patterns(),
            math_environments,
            engine: MathEngine::new(config.math_backend, &config.macros)?,
        })
    }

    /// Head content the math backend needs in a standalone page.
    pub fn head_content(&self) -> Option<String> {
        self.engine.head_content()
    }

    /// Render a document to `<div class="latex-content"><p>...</p></div>`.
    pub fn render(&self, content: &str) -> String {
        format!(r#"<div class="latex-content"><p>{}</p></div>"#, self.render_body(content))
    }

    fn render_body(&self, content: &str) -> String {
        let content = strip_reserved(content);
        let document = split_document(&content);
        let mut stash = Stash::default();

        let body = ALGORITHM.replace_all(document.body, |caps: &Captures| {
            stash.park_algorithm(caps[0].to_string())
        });
        let body = if MAKETITLE.is_match(&body) {
            let block = stash.park(document.preamble.title_block());
            MAKETITLE.replace_all(&body, NoExpand(&block)).into_owned()
        } else {
            body.into_owned()
        };

        debug!("environment pass");
        let body = self.environments.process(&body, &mut stash);
        debug!("command pass");
        let body = CommandTable::inline().apply_outside_math(&body, &self.protected);
        debug!("math environment pass");
        let body = self.math_environments.process(&body, &self.engine, &mut stash);
        debug!("inline math pass");
        let body = render_inline_math(&body, &self.engine, &mut stash);
        debug!("display math pass");
        let body = render_display_math(&body, &self.engine, &mut stash);

        debug!("algorithm pass");
        let mut number = 0;
        stash.convert_algorithms(|source| {
            number += 1;
            convert_algorithm(source, number)
        });

        stash.restore(&body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Locale;
    use pretty_assertions::assert_eq;

    fn renderer() -> LatexRenderer {
        LatexRenderer::new(&RenderConfig::default()).unwrap()
    }

    fn render(content: &str) -> String {
        renderer().render(content)
    }

    #[test]
    fn test_wrapper() {
        assert_eq!(
            render("Hello"),
            r#"<div class="latex-content"><p>Hello</p></div>"#
        );
    }

    #[test]
    fn test_body_only() {
        assert_eq!(
            render("\\documentclass{article}\n\\begin{document}Body\\end{document}"),
            r#"<div class="latex-content"><p>Body</p></div>"#
        );
    }

    #[test]
    fn test_maketitle() {
        let out = render("\\title{Notes}\\author{Ada}\\begin{document}\\maketitle\nText\\end{document}");
        assert!(out.contains(r#"<div class="title-block"><h1 class="title">Notes</h1><div class="author">Ada</div></div>"#));
        assert!(!out.contains("\\maketitle"));
    }

    #[test]
    fn test_theorem_with_math_and_commands() {
        let out = render("\\begin{theorem}\\textbf{Key}: $x \\in \\R$.\\end{theorem}");
        assert_eq!(
            out,
            r#"<div class="latex-content"><p><div class="theorem"><strong>Theorem:</strong> <strong>Key</strong>: <span class="math inline">\(x \in \mathbb{R}\)</span>.</div></p></div>"#
        );
    }

    #[test]
    fn test_commands_do_not_touch_math() {
        let out = render("a~b $x~y$");
        assert!(out.contains("a&nbsp;b"));
        assert!(out.contains(r"\(x~y\)"));
    }

    #[test]
    fn test_verbatim_is_not_interpreted() {
        let out = render("\\begin{verbatim}$x$ \\textbf{y} <b>\\end{verbatim}");
        assert!(out.contains("<pre><code>$x$ \\textbf{y} &lt;b&gt;</code></pre>"));
    }

    #[test]
    fn test_unbalanced_theorem_untouched() {
        let out = render("\\begin{theorem} open $x$");
        assert!(out.contains("\\begin{theorem} open "));
        assert!(out.contains("math inline"));
    }

    #[test]
    fn test_algorithm_math_handled_once() {
        let out = render(
            "\\begin{algorithm}\\caption{Sort}\n\\For{$i$ \\KwTo $n$}{\nx\\;\n}\n\\end{algorithm}",
        );
        assert!(out.contains(r#"<div class="algorithm-title">Sort</div>"#));
        assert!(out.contains(
            r#"<div class="algorithm-for">for <span class="math">i</span> to <span class="math">n</span></div>"#
        ));
        assert!(!out.contains("math inline"));
    }

    #[test]
    fn test_algorithm_numbering_is_per_render() {
        let renderer = renderer();
        let doc = "\\begin{algorithm}a\\end{algorithm}\\begin{algorithm}b\\end{algorithm}";
        for _ in 0..2 {
            let out = renderer.render(doc);
            assert!(out.contains(r#"id="algorithm-1" data-number="1""#));
            assert!(out.contains(r#"id="algorithm-2" data-number="2""#));
        }
    }

    #[test]
    fn test_equation_inside_theorem() {
        let out = render("\\begin{lemma}\\begin{equation}a=b\\end{equation}\\end{lemma}");
        assert!(out.contains(r#"<div class="theorem"><strong>Lemma:</strong> <div class="math display">\[a=b\]</div></div>"#));
    }

    #[test]
    fn test_chinese_locale() {
        let config = RenderConfig {
            locale: Locale::Zh,
            ..Default::default()
        };
        let out = LatexRenderer::new(&config).unwrap().render("\\begin{proof}QED\\end{proof}");
        assert!(out.contains("<strong>证明:</strong> QED"));
    }

    #[test]
    fn test_forged_placeholder_is_dropped() {
        let out = render("\\begin{verbatim}secret\\end{verbatim} user text \u{E000}0\u{E001}");
        assert_eq!(out.matches("secret").count(), 1);
        assert!(out.contains("user text 0"));
    }

    #[test]
    fn test_invalid_custom_environment_fails_construction() {
        let config = RenderConfig::from_toml_str("[[environments]]\nname = \"algorithm\"\nprefix = \"A\"").unwrap();
        assert!(LatexRenderer::new(&config).is_err());
    }
}
