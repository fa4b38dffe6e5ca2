//! Client-side typesetting: regions are emitted as delimited LaTeX for KaTeX
//! or MathJax to pick up in the browser.

use super::{MathMode, MathRenderer};
use crate::error::{RenderError, Result};
use crate::html::escape_html;
use crate::latex::scan::{braced_argument, optional_argument};

/// Browser library that typesets passthrough regions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientEngine {
    KaTeX,
    MathJax,
}

/// Emits `\(...\)` and `\[...\]` regions after a structural check, so spans the
/// client engine would reject surface as errors here instead.
#[derive(Debug, Clone, Copy)]
pub struct ClientRenderer {
    engine: ClientEngine,
}

impl ClientRenderer {
    pub fn new(engine: ClientEngine) -> Self {
        Self { engine }
    }

    fn region(&self, latex: &str, mode: MathMode) -> Result<String> {
        validate(latex)?;
        let latex = escape_html(latex);
        Ok(match mode {
            MathMode::Inline => format!(r#"<span class="math inline">\({}\)</span>"#, latex),
            MathMode::Display => format!(r#"<div class="math display">\[{}\]</div>"#, latex),
        })
    }
}

impl MathRenderer for ClientRenderer {
    fn render_inline(&self, latex: &str) -> Result<String> {
        self.region(latex, MathMode::Inline)
    }

    fn render_display(&self, latex: &str) -> Result<String> {
        self.region(latex, MathMode::Display)
    }

    fn head_content(&self) -> Option<String> {
        let head = match self.engine {
            ClientEngine::KaTeX => KATEX_HEAD,
            ClientEngine::MathJax => MATHJAX_HEAD,
        };
        Some(head.to_string())
    }
}

/// KaTeX run in-process with the `katex` feature.
///
/// Parse errors come from the engine itself and surface as render errors.
#[cfg(feature = "katex")]
#[derive(Debug, Clone, Copy, Default)]
pub struct ServerRenderer;

#[cfg(feature = "katex")]
impl ServerRenderer {
    fn region(&self, latex: &str, mode: MathMode) -> Result<String> {
        let opts = ::katex::Opts::builder()
            .display_mode(mode == MathMode::Display)
            .output_type(::katex::OutputType::Html)
            .throw_on_error(true)
            .trust(true)
            .build()
            .map_err(|e| RenderError::Math(e.to_string()))?;
        let html = ::katex::render_with_opts(latex, &opts)
            .map_err(|e| RenderError::Math(e.to_string()))?;
        Ok(match mode {
            MathMode::Inline => format!(r#"<span class="math inline">{}</span>"#, html),
            MathMode::Display => format!(r#"<div class="math display">{}</div>"#, html),
        })
    }
}

#[cfg(feature = "katex")]
impl MathRenderer for ServerRenderer {
    fn render_inline(&self, latex: &str) -> Result<String> {
        self.region(latex, MathMode::Inline)
    }

    fn render_display(&self, latex: &str) -> Result<String> {
        self.region(latex, MathMode::Display)
    }

    fn head_content(&self) -> Option<String> {
        Some(KATEX_CSS.to_string())
    }
}

/// Reject sources the client engine cannot typeset: unbalanced groups,
/// `\left`/`\right` and `\begin`/`\end` mismatches, and commands or scripts
/// missing a required argument.
///
/// Only the passthrough output relies on this; server-side KaTeX reports its
/// own parse errors.
pub(super) fn validate(latex: &str) -> Result<()> {
    let mut depth = 0i32;
    let mut envs: Vec<&str> = Vec::new();
    let mut delimiters = 0i32;
    let mut rest = latex;

    while let Some(c) = rest.chars().next() {
        match c {
            '\\' => {
                let after = &rest[1..];
                let word_len = after
                    .find(|ch: char| !ch.is_ascii_alphabetic())
                    .unwrap_or(after.len());
                if word_len == 0 {
                    // Control symbol such as \{ or \\: skip it whole.
                    let skip = after.chars().next().map_or(0, char::len_utf8);
                    rest = &after[skip..];
                    continue;
                }
                let word = &after[..word_len];
                rest = &after[word_len..];
                match word {
                    "left" => delimiters += 1,
                    "right" => {
                        delimiters -= 1;
                        if delimiters < 0 {
                            return Err(RenderError::Math("\\right without \\left".into()).into());
                        }
                    }
                    "begin" | "end" => {
                        let name = env_name(rest).ok_or_else(|| {
                            RenderError::Math(format!("\\{} without environment name", word))
                        })?;
                        if word == "begin" {
                            envs.push(name);
                        } else if envs.pop() != Some(name) {
                            return Err(RenderError::Math(format!("unexpected \\end{{{}}}", name)).into());
                        }
                    }
                    other => {
                        let required = arity(other);
                        let mut probe = rest;
                        if other == "sqrt" {
                            probe = optional_argument(probe).map_or(probe, |(after, _)| after);
                        }
                        for _ in 0..required {
                            probe = skip_argument(probe).ok_or_else(|| {
                                RenderError::Math(format!("\\{} expects {} argument(s)", other, required))
                            })?;
                        }
                    }
                }
            }
            '^' | '_' => {
                rest = &rest[1..];
                if skip_argument(rest).is_none() {
                    return Err(RenderError::Math(format!("'{}' without an operand", c)).into());
                }
            }
            '{' => {
                depth += 1;
                rest = &rest[1..];
            }
            '}' => {
                depth -= 1;
                if depth < 0 {
                    return Err(RenderError::Math("unmatched '}'".into()).into());
                }
                rest = &rest[1..];
            }
            other => rest = &rest[other.len_utf8()..],
        }
    }

    if depth != 0 {
        return Err(RenderError::Math("unmatched '{'".into()).into());
    }
    if delimiters != 0 {
        return Err(RenderError::Math("\\left without \\right".into()).into());
    }
    if let Some(open) = envs.pop() {
        return Err(RenderError::Math(format!("unclosed environment {}", open)).into());
    }
    Ok(())
}

/// Required arguments of common commands; unknown commands take none.
fn arity(command: &str) -> usize {
    match command {
        "frac" | "dfrac" | "tfrac" | "cfrac" | "binom" | "dbinom" | "tbinom" | "overset"
        | "underset" | "stackrel" => 2,
        "sqrt" | "text" | "textbf" | "textit" | "textrm" | "mathbb" | "mathbf" | "mathrm"
        | "mathit" | "mathcal" | "mathfrak" | "mathsf" | "mathtt" | "boldsymbol"
        | "operatorname" | "hat" | "bar" | "vec" | "tilde" | "dot" | "ddot" | "overline"
        | "underline" | "widehat" | "widetilde" | "overbrace" | "underbrace" => 1,
        _ => 0,
    }
}

/// Skip one argument: a brace group, a control sequence or a single character.
fn skip_argument(input: &str) -> Option<&str> {
    let input = input.trim_start();
    if input.starts_with('{') {
        return braced_argument(input).ok().map(|(rest, _)| rest);
    }
    if let Some(after) = input.strip_prefix('\\') {
        let word = after
            .find(|c: char| !c.is_ascii_alphabetic())
            .unwrap_or(after.len());
        let len = if word == 0 {
            after.chars().next()?.len_utf8()
        } else {
            word
        };
        return Some(&after[len..]);
    }
    match input.chars().next()? {
        '}' | '&' | '^' | '_' | '$' => None,
        c => Some(&input[c.len_utf8()..]),
    }
}

fn env_name(input: &str) -> Option<&str> {
    let inner = input.trim_start().strip_prefix('{')?;
    let end = inner.find('}')?;
    Some(&inner[..end])
}

#[cfg(feature = "katex")]
const KATEX_CSS: &str = r#"<link rel="stylesheet" href="https://cdn.jsdelivr.net/npm/katex@0.16.9/dist/katex.min.css" crossorigin="anonymous">"#;

const KATEX_HEAD: &str = r#"<link rel="stylesheet" href="https://cdn.jsdelivr.net/npm/katex@0.16.9/dist/katex.min.css" crossorigin="anonymous">
<script defer src="https://cdn.jsdelivr.net/npm/katex@0.16.9/dist/katex.min.js" crossorigin="anonymous"></script>
<script defer src="https://cdn.jsdelivr.net/npm/katex@0.16.9/dist/contrib/auto-render.min.js" crossorigin="anonymous"
    onload="renderMathInElement(document.body, {
        delimiters: [
            {left: '\\[', right: '\\]', display: true},
            {left: '\\(', right: '\\)', display: false}
        ],
        throwOnError: false,
        trust: true,
        strict: false
    });"></script>"#;

const MATHJAX_HEAD: &str = r#"<script>
MathJax = {
    tex: {
        inlineMath: [['\\(', '\\)']],
        displayMath: [['\\[', '\\]']]
    }
};
</script>
<script id="MathJax-script" async src="https://cdn.jsdelivr.net/npm/mathjax@3/es5/tex-mml-chtml.js"></script>"#;

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_regions_are_escaped_and_delimited() {
        let katex = ClientRenderer::new(ClientEngine::KaTeX);
        assert_eq!(
            katex.render_inline("a < b").unwrap(),
            r#"<span class="math inline">\(a &lt; b\)</span>"#
        );
        assert_eq!(
            katex.render_display("\\int_0^1 x dx").unwrap(),
            r#"<div class="math display">\[\int_0^1 x dx\]</div>"#
        );
    }

    #[test]
    fn test_rejects_unbalanced_braces() {
        let renderer = ClientRenderer::new(ClientEngine::MathJax);
        assert!(renderer.render_inline("\\frac{a}{b").is_err());
        assert!(renderer.render_inline("a}").is_err());
    }

    #[test]
    fn test_escaped_braces_are_balanced() {
        assert!(validate("\\{ x \\mid x > 0 \\}").is_ok());
        assert!(validate("a \\\\ b").is_ok());
    }

    #[test]
    fn test_left_right_and_environments() {
        assert!(validate("\\left( x \\right)").is_ok());
        assert!(validate("\\left( x").is_err());
        assert!(validate("\\begin{aligned} a &= b \\end{aligned}").is_ok());
        assert!(validate("\\begin{aligned} a &= b \\end{cases}").is_err());
        assert!(validate("\\begin{matrix} 1").is_err());
    }

    #[test]
    fn test_missing_arguments() {
        assert!(validate("\\frac{1}").is_err());
        assert!(validate("x^").is_err());
        assert!(validate("\\sqrt").is_err());
        assert!(validate("{x_}").is_err());
        assert!(validate("\\frac{1}{2} + \\sqrt[3]{x} + x^\\prime + a_1^2").is_ok());
        assert!(validate("\\frac12 + \\mathbb R").is_ok());
    }

    #[cfg(feature = "katex")]
    #[test]
    fn test_server_side_errors_come_from_the_engine() {
        let katex = ServerRenderer;
        assert!(katex.render_inline("\\frac{1}").is_err());
        assert!(katex.render_inline("x^").is_err());
        let html = katex.render_display("\\frac{1}{2}").unwrap();
        assert!(html.starts_with(r#"<div class="math display">"#));
        assert!(html.contains("katex"));
    }

    #[test]
    fn test_head_content() {
        let head = |engine| ClientRenderer::new(engine).head_content().unwrap();
        assert!(head(ClientEngine::KaTeX).contains("katex"));
        assert!(head(ClientEngine::MathJax).contains("MathJax"));
    }
}
