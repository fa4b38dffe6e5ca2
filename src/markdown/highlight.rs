//! Fenced code highlighting with class-based spans.

use crate::error::{RenderError, Result};
use std::sync::LazyLock;
use syntect::html::{ClassStyle, ClassedHTMLGenerator};
use syntect::parsing::{SyntaxReference, SyntaxSet};
use syntect::util::LinesWithEndings;

static SYNTAX_SET: LazyLock<SyntaxSet> = LazyLock::new(SyntaxSet::load_defaults_newlines);

/// Common fence labels syntect does not know by token.
fn language_alias(language: &str) -> &str {
    match language {
        "py" | "python3" => "Python",
        "js" | "javascript" | "jsx" => "JavaScript",
        "ts" | "typescript" => "JavaScript",
        "sh" | "shell" | "zsh" => "Bourne Again Shell (bash)",
        "rs" => "Rust",
        "c++" | "cc" => "C++",
        "tex" | "latex" => "LaTeX",
        "yml" => "YAML",
        "md" => "Markdown",
        other => other,
    }
}

fn find_syntax(language: &str) -> Option<&'static SyntaxReference> {
    let lower = language.to_ascii_lowercase();
    let canonical = language_alias(&lower);
    SYNTAX_SET
        .find_syntax_by_name(canonical)
        .or_else(|| SYNTAX_SET.find_syntax_by_token(canonical))
        .or_else(|| SYNTAX_SET.find_syntax_by_extension(canonical))
        .or_else(|| SYNTAX_SET.find_syntax_by_token(language))
}

/// Highlight `code` as `language`, returning the inner HTML of the code element.
pub fn highlight(code: &str, language: &str) -> Result<String> {
    let syntax = find_syntax(language)
        .ok_or_else(|| RenderError::Highlight(format!("unknown language `{}`", language)))?;

    let mut generator =
        ClassedHTMLGenerator::new_with_class_style(syntax, &SYNTAX_SET, ClassStyle::Spaced);
    for line in LinesWithEndings::from(code) {
        generator
            .parse_html_for_line_which_includes_newline(line)
            .map_err(|e| RenderError::Highlight(e.to_string()))?;
    }
    Ok(generator.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_language() {
        let html = highlight("fn main() {}\n", "rust").unwrap();
        assert!(html.contains("<span class="));
        assert!(html.contains("main"));
    }

    #[test]
    fn test_alias() {
        assert!(highlight("x = 1\n", "py").is_ok());
    }

    #[test]
    fn test_unknown_language() {
        assert!(highlight("x", "no-such-language").is_err());
    }

    #[test]
    fn test_markup_is_escaped() {
        let html = highlight("a < b\n", "rust").unwrap();
        assert!(html.contains("&lt;"));
    }
}
