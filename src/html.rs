//! Small HTML helpers shared by the renderers.

use crate::config::RenderConfig;

/// Escape the characters that would otherwise be read as markup.
pub fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

/// Inline error marker holding the offending source verbatim.
pub fn error_span(class: &str, source: &str) -> String {
    format!(r#"<span class="{}">{}</span>"#, class, source)
}

/// Block-level error marker holding the offending source verbatim.
pub fn error_block(class: &str, source: &str) -> String {
    format!(r#"<div class="{}">{}</div>"#, class, source)
}

/// Wrap a rendered fragment in a complete HTML page.
pub fn standalone_page(fragment: &str, config: &RenderConfig, math_head: Option<&str>) -> String {
    let title = config.title.as_deref().unwrap_or("Preview");
    let mut output = String::with_capacity(fragment.len() + 2048);

    output.push_str("<!DOCTYPE html>\n<html>\n<head>\n");
    output.push_str("<meta charset=\"UTF-8\">\n");
    output.push_str("<meta name=\"viewport\" content=\"width=device-width, initial-scale=1.0\">\n");
    output.push_str(&format!("<title>{}</title>\n", escape_html(title)));
    if let Some(head) = math_head {
        output.push_str(head);
        output.push('\n');
    }
    output.push_str(DEFAULT_STYLES);
    output.push_str("</head>\n<body>\n");
    output.push_str(fragment);
    output.push_str("\n</body>\n</html>");

    output
}

const DEFAULT_STYLES: &str = r#"<style>
body { max-width: 860px; margin: 0 auto; padding: 2em; font-family: Georgia, serif; line-height: 1.6; }
.theorem, .definition, .example, .remark { margin: 1.2em 0; padding: 0.8em 1em; background: #f8f8f8; border-left: 3px solid #333; }
.proof { margin: 1em 0; padding: 0.5em 1em; font-style: italic; }
.abstract { margin: 1.5em 2em; font-size: 0.95em; }
.title-block { text-align: center; margin-bottom: 2em; }
.math-error, .algorithm-error { color: #c00; font-family: monospace; white-space: pre-wrap; }
.algorithm { margin: 1.5em 0; border-top: 2px solid #333; border-bottom: 2px solid #333; padding: 0.5em 0; }
.algorithm-title { font-weight: bold; border-bottom: 1px solid #333; padding-bottom: 0.3em; }
.algorithm-block { padding-left: 1.5em; border-left: 1px solid #ccc; }
.algorithm-for, .algorithm-while, .algorithm-if, .algorithm-else, .algorithm-return { font-weight: bold; }
.algorithm-comment { color: #666; font-style: italic; }
.table-container { overflow-x: auto; }
.citation, .reference { color: #0066cc; }
</style>
"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_html() {
        assert_eq!(escape_html(r#"a < b & "c""#), "a &lt; b &amp; &quot;c&quot;");
    }

    #[test]
    fn test_error_markers_keep_source() {
        assert_eq!(error_span("math-error", "$x^$"), r#"<span class="math-error">$x^$</span>"#);
        assert!(error_block("algorithm-error", "\\begin{algorithm}").starts_with("<div"));
    }

    #[test]
    fn test_standalone_page() {
        let config = RenderConfig {
            title: Some("Notes".to_string()),
            ..Default::default()
        };
        let page = standalone_page("<p>x</p>", &config, Some("<script></script>"));
        assert!(page.starts_with("<!DOCTYPE html>"));
        assert!(page.contains("<title>Notes</title>"));
        assert!(page.contains("<script></script>"));
        assert!(page.contains("<p>x</p>"));
    }
}
