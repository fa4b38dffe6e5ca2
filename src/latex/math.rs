//! Math passes: amsmath-style environments, then inline and display delimiters.

use super::commands::CommandTable;
use super::scan::{environment_pattern, math_segments, Segment};
use super::stash::Stash;
use crate::config::Locale;
use crate::html::{error_block, error_span};
use crate::math::{MathEngine, MathMode};
use log::{debug, warn};
use regex::{Captures, Regex};
use std::sync::LazyLock;

/// Environments rendered whole by the math engine, in processing order.
pub const MATH_ENVIRONMENTS: &[&str] = &[
    "equation",
    "equation*",
    "align",
    "align*",
    "matrix",
    "pmatrix",
    "cases",
    "gather",
    "split",
    "multline",
    "array",
    "tabular",
    "subequations",
];

static ABSTRACT: LazyLock<Regex> = LazyLock::new(|| environment_pattern("abstract").unwrap());
static PATTERNS: LazyLock<Vec<(&'static str, Regex)>> = LazyLock::new(|| {
    MATH_ENVIRONMENTS
        .iter()
        .map(|&name| (name, environment_pattern(name).unwrap()))
        .collect()
});

/// Display-mode form the engine accepts for a top-level environment.
fn display_form(name: &str, inner: &str) -> String {
    let wrapper = match name {
        "align" | "align*" | "split" => "aligned",
        "gather" | "multline" => "gathered",
        "matrix" | "pmatrix" | "cases" => name,
        "array" | "tabular" => "array",
        _ => return inner.to_string(),
    };
    format!("\\begin{{{0}}}{1}\\end{{{0}}}", wrapper, inner)
}

/// Renders math environments, sectioning commands and the `abstract` block.
#[derive(Debug)]
pub struct MathEnvironmentProcessor {
    patterns: Vec<(&'static str, Regex)>,
    locale: Locale,
}

impl MathEnvironmentProcessor {
    pub fn new(locale: Locale) -> Self {
        Self {
            patterns: PATTERNS.clone(),
            locale,
        }
    }

    /// Span patterns of every math environment, for passes that must skip them.
    pub fn patterns(&self) -> Vec<Regex> {
        self.patterns.iter().map(|(_, re)| re.clone()).collect()
    }

    pub fn process(&self, text: &str, engine: &MathEngine, stash: &mut Stash) -> String {
        let mut content = text.to_string();

        for (name, pattern) in &self.patterns {
            if !content.contains(&format!("\\begin{{{}}}", name)) {
                continue;
            }
            debug!("rendering math environment {}", name);
            content = pattern
                .replace_all(&content, |caps: &Captures| {
                    let source = &caps[0];
                    let inner = caps.get(1).map_or("", |m| m.as_str()).trim();
                    render_environment(name, source, inner, engine, stash)
                })
                .into_owned();
        }

        content = CommandTable::sections().apply(&content);

        let title = self.locale.abstract_title();
        ABSTRACT
            .replace_all(&content, |caps: &Captures| {
                let inner = caps.get(1).map_or("", |m| m.as_str()).trim();
                format!(r#"<div class="abstract"><h3>{}</h3>{}</div>"#, title, inner)
            })
            .into_owned()
    }
}

fn render_environment(
    name: &str,
    source: &str,
    inner: &str,
    engine: &MathEngine,
    stash: &mut Stash,
) -> String {
    // Numbered sub-equations were rendered by earlier entries; keep them as a group.
    if name == "subequations" && Stash::contains_placeholder(inner) {
        return stash.park(format!(r#"<div class="subequations">{}</div>"#, inner));
    }

    match engine.render(&display_form(name, inner), MathMode::Display) {
        Ok(html) => stash.park(html),
        Err(e) => {
            warn!("math environment {} failed: {}", name, e);
            stash.park(error_block("math-error", source))
        }
    }
}

/// Render `$...$` and `\(...\)`; display regions are left in place.
pub fn render_inline_math(text: &str, engine: &MathEngine, stash: &mut Stash) -> String {
    render_delimited(text, MathMode::Inline, engine, stash)
}

/// Render `$$...$$` and `\[...\]`.
pub fn render_display_math(text: &str, engine: &MathEngine, stash: &mut Stash) -> String {
    render_delimited(text, MathMode::Display, engine, stash)
}

fn render_delimited(text: &str, mode: MathMode, engine: &MathEngine, stash: &mut Stash) -> String {
    let mut output = String::with_capacity(text.len());

    for segment in math_segments(text) {
        match segment {
            Segment::Math { source, tex, delimiter } if delimiter.mode() == mode => {
                let html = match engine.render(tex.trim(), mode) {
                    Ok(html) => html,
                    Err(e) => {
                        warn!("math region {:?} failed: {}", source, e);
                        match mode {
                            MathMode::Inline => error_span("math-error", source),
                            MathMode::Display => error_block("math-error", source),
                        }
                    }
                };
                output.push_str(&stash.park(html));
            }
            Segment::Math { source, .. } => output.push_str(source),
            Segment::Text(text) => output.push_str(text),
        }
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn environments(text: &str) -> String {
        let engine = MathEngine::default();
        let mut stash = Stash::default();
        let out = MathEnvironmentProcessor::new(Locale::En).process(text, &engine, &mut stash);
        stash.restore(&out)
    }

    fn inline_then_display(text: &str) -> String {
        let engine = MathEngine::default();
        let mut stash = Stash::default();
        let out = render_inline_math(text, &engine, &mut stash);
        let out = render_display_math(&out, &engine, &mut stash);
        stash.restore(&out)
    }

    #[test]
    fn test_equation() {
        assert_eq!(
            environments("\\begin{equation}\n E = mc^2 \n\\end{equation}"),
            r#"<div class="math display">\[E = mc^2\]</div>"#
        );
    }

    #[test]
    fn test_align_is_wrapped() {
        assert_eq!(
            environments("\\begin{align*}a &= b \\\\ c &= d\\end{align*}"),
            r#"<div class="math display">\[\begin{aligned}a &amp;= b \\ c &amp;= d\end{aligned}\]</div>"#
        );
    }

    #[test]
    fn test_environment_failure_keeps_source() {
        let source = "\\begin{equation}\\frac{1}{2\\end{equation}";
        assert_eq!(
            environments(source),
            format!(r#"<div class="math-error">{}</div>"#, source)
        );
    }

    #[test]
    fn test_macros_expanded() {
        assert!(environments("\\begin{equation}x \\in \\R\\end{equation}").contains("\\mathbb{R}"));
    }

    #[test]
    fn test_subequations_group() {
        let out = environments(
            "\\begin{subequations}\\begin{equation}a\\end{equation}\\begin{equation}b\\end{equation}\\end{subequations}",
        );
        assert!(out.starts_with(r#"<div class="subequations"><div class="math display">"#));
        assert_eq!(out.matches("math display").count(), 2);
    }

    #[test]
    fn test_sections_and_abstract() {
        assert_eq!(environments("\\section{Intro}"), "<h2>Intro</h2>");
        assert_eq!(
            environments("\\begin{abstract}\n Short.\n\\end{abstract}"),
            r#"<div class="abstract"><h3>Abstract</h3>Short.</div>"#
        );
    }

    #[test]
    fn test_abstract_localized() {
        let engine = MathEngine::default();
        let mut stash = Stash::default();
        let out = MathEnvironmentProcessor::new(Locale::Zh).process(
            "\\begin{abstract}x\\end{abstract}",
            &engine,
            &mut stash,
        );
        assert_eq!(out, r#"<div class="abstract"><h3>摘要</h3>x</div>"#);
    }

    #[test]
    fn test_inline_math() {
        assert_eq!(
            inline_then_display("Let $x^2$ and \\(y\\)."),
            r#"Let <span class="math inline">\(x^2\)</span> and <span class="math inline">\(y\)</span>."#
        );
    }

    #[test]
    fn test_inline_error_keeps_source() {
        assert_eq!(
            inline_then_display("bad $x^{2$ here"),
            r#"bad <span class="math-error">$x^{2$</span> here"#
        );
    }

    #[test]
    fn test_display_math_is_block() {
        let out = inline_then_display("$$\\int_0^1 x\\,dx$$");
        assert_eq!(out, r#"<div class="math display">\[\int_0^1 x\,dx\]</div>"#);
    }

    #[test]
    fn test_display_error_is_block() {
        assert_eq!(
            inline_then_display("\\[\\left( x\\]"),
            r#"<div class="math-error">\[\left( x\]</div>"#
        );
    }

    #[test]
    fn test_inline_pass_leaves_display() {
        let engine = MathEngine::default();
        let mut stash = Stash::default();
        let out = render_inline_math("$$a$$ and $b$", &engine, &mut stash);
        assert!(out.starts_with("$$a$$ and "));
        assert!(!out.contains("$b$"));
    }
}
