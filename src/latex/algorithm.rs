//! algorithm2e pseudocode to HTML.

use super::commands::CommandTable;
use super::scan::{braced_argument, command_pattern, find_command_argument};
use crate::error::{RenderError, Result};
use crate::html::{error_block, escape_html};
use log::warn;
use regex::{Captures, Regex};
use std::sync::LazyLock;

const BEGIN: &str = "\\begin{algorithm}";
const END: &str = "\\end{algorithm}";

static CAPTION: LazyLock<Regex> =
    LazyLock::new(|| command_pattern(r"\\caption(?:\[[^\]]*\])?\{ARG\}"));
static LABEL: LazyLock<Regex> =
    LazyLock::new(|| command_pattern(r"\\label(?:\[[^\]]*\])?\{ARG\}"));
static PLACEMENT: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\s*\[[a-zA-Z!]*\]").unwrap());
static SETUP: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\\(?:SetAlgoLined|SetAlgoNoLine|DontPrintSemicolon|LinesNumbered)\b").unwrap()
});
static DECLARATION: LazyLock<Regex> =
    LazyLock::new(|| command_pattern(r"\\(KwIn|KwOut|KwData|KwResult)\{ARG\}"));
static COMMENT: LazyLock<Regex> = LazyLock::new(|| command_pattern(r"\\tcp\*?\{ARG\}"));
static CLOSE_THEN_ELSE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^([ \t]*)\}[ \t]*(\\(?:Else|ElseIf|uElse|uElseIf)\b)").unwrap()
});
static CLOSE_THEN_OPEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^([ \t]*)\}[ \t]*\{[ \t]*$").unwrap());
static MATH: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\$([^$\n]+)\$").unwrap());
static LEFT_ARROW: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\\(?:leftarrow|gets)\b").unwrap());
static RIGHT_ARROW: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\\rightarrow\b").unwrap());
static TAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]*>").unwrap());
static ASSIGNMENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_]+\s*←\s*\S").unwrap());

/// Convert one `\begin{algorithm}...\end{algorithm}` span.
///
/// Any failure degrades to an `algorithm-error` block holding `source`.
pub fn convert_algorithm(source: &str, number: usize) -> String {
    match try_convert(source, number) {
        Ok(html) => html,
        Err(e) => {
            warn!("algorithm {} failed: {}", number, e);
            error_block("algorithm-error", source)
        }
    }
}

fn try_convert(source: &str, number: usize) -> Result<String> {
    let body = source
        .strip_prefix(BEGIN)
        .and_then(|rest| rest.strip_suffix(END))
        .ok_or_else(|| RenderError::Algorithm("not an algorithm environment".into()))?;
    if body.contains(BEGIN) {
        return Err(RenderError::Algorithm("nested algorithm environment".into()).into());
    }

    // (1) caption and label
    let commands = CommandTable::inline();
    let caption = find_command_argument(body, "caption")
        .map(|c| math_spans(&commands.apply_outside_math(c.trim(), &[])));
    let label = find_command_argument(body, "label").map(|l| l.trim().to_string());

    // (2) strip metadata and setup
    let body = CAPTION.replace_all(body, "");
    let body = LABEL.replace_all(&body, "");
    let body = PLACEMENT.replace(&body, "");
    let body = SETUP.replace_all(&body, "");

    // (3) declarations
    let body = DECLARATION.replace_all(&body, |caps: &Captures| {
        let (class, label) = match &caps[1] {
            "KwIn" => ("input", "Input"),
            "KwData" => ("input", "Data"),
            "KwOut" => ("output", "Output"),
            _ => ("output", "Result"),
        };
        format!(r#"<div class="algorithm-{}">{}: {}</div>"#, class, label, caps[2].trim())
    });

    // (4) comments
    let body = COMMENT.replace_all(&body, r#"<span class="algorithm-comment">// ${1}</span>"#);

    // (5) control structure
    let body = CLOSE_THEN_ELSE.replace_all(&body, "${1}}\n${1}${2}");
    let body = CLOSE_THEN_OPEN.replace_all(&body, "${1}}\n${1}\\Else{");
    let body = structure(&body);
    let body = commands.apply_outside_math(&body, &[]);

    // (6) math, (7) arrows, (8) escaped braces
    let body = math_spans(&body);
    let body = LEFT_ARROW.replace_all(&body, "←");
    let body = RIGHT_ARROW.replace_all(&body, "→");
    let body = body.replace("\\{", "{").replace("\\}", "}");

    // (9) assignments, (10) cleanup, (11) statements
    let lines: Vec<String> = body
        .lines()
        .map(|line| line.replace("\\;", ""))
        .map(|line| line.trim().to_string())
        .filter(|line| !line.is_empty())
        .map(|line| {
            if is_tagged(&line) {
                line
            } else if ASSIGNMENT.is_match(TAG.replace_all(&line, "").trim()) {
                format!(r#"<div class="algorithm-assign">{}</div>"#, line)
            } else {
                format!(r#"<div class="algorithm-state">{}</div>"#, line)
            }
        })
        .collect();

    let id = match &label {
        Some(label) => escape_html(label),
        None => format!("algorithm-{}", number),
    };
    let title = caption
        .map(|caption| format!(r#"<div class="algorithm-title">{}</div>"#, caption))
        .unwrap_or_default();

    Ok(format!(
        r#"<div class="algorithm" id="{}" data-number="{}">{}<div class="algorithm-body">{}</div></div>"#,
        id,
        number,
        title,
        lines.join("\n")
    ))
}

fn is_tagged(line: &str) -> bool {
    line.starts_with("<div") || line.starts_with("</div")
}

fn math_spans(text: &str) -> String {
    MATH.replace_all(text, |caps: &Captures| {
        format!(r#"<span class="math">{}</span>"#, escape_html(&caps[1]))
    })
    .into_owned()
}

/// Rewrite control commands to divs and their brace groups to block divs.
fn structure(body: &str) -> String {
    let mut lines = Vec::new();
    let mut depth = 0usize;

    for raw in body.lines() {
        let line = raw.trim();

        if let Some((html, rest)) = control(line) {
            let rest = rest.trim();
            match rest.strip_prefix('{') {
                Some(after) => match braced_argument(rest) {
                    // `\If{c}{stmt}` on one line
                    Ok((trailing, inner)) => {
                        lines.push(html);
                        lines.push(r#"<div class="algorithm-block">"#.to_string());
                        lines.push(inner.trim().to_string());
                        lines.push("</div>".to_string());
                        lines.push(trailing.trim().to_string());
                    }
                    Err(_) => {
                        lines.push(html);
                        lines.push(r#"<div class="algorithm-block">"#.to_string());
                        lines.push(after.trim().to_string());
                        depth += 1;
                    }
                },
                None => lines.push(format!("{}{}", html, rest)),
            }
            continue;
        }

        let (text, closers) = trailing_closers(line);
        lines.push(text.to_string());
        for _ in 0..closers.min(depth) {
            lines.push("</div>".to_string());
        }
        depth -= closers.min(depth);
    }

    lines.extend(std::iter::repeat("</div>".to_string()).take(depth));
    lines.join("\n")
}

/// A control command at the start of `line`: its div and the unparsed remainder.
fn control(line: &str) -> Option<(String, &str)> {
    let after = line.strip_prefix('\\')?;
    let name_len = after
        .find(|c: char| !c.is_ascii_alphabetic())
        .unwrap_or(after.len());
    let (name, rest) = after.split_at(name_len);

    let (kind, text, rest) = match name {
        "Else" | "uElse" | "lElse" => ("else", "else".to_string(), rest),
        "Return" | "KwRet" => match braced_argument(rest) {
            Ok((rest, value)) => ("return", format!("return {}", value.trim()), rest),
            Err(_) => ("return", "return".to_string(), rest),
        },
        _ => {
            let (rest, arg) = braced_argument(rest).ok()?;
            let arg = arg.trim();
            match name {
                "For" => match arg.split_once("\\KwTo") {
                    Some((from, to)) => ("for", format!("for {} to {}", from.trim(), to.trim()), rest),
                    None => ("for", format!("for {}", arg), rest),
                },
                "ForEach" | "ForAll" => ("for", format!("for {}", arg), rest),
                "While" => ("while", format!("while {}", arg), rest),
                "If" | "eIf" | "uIf" | "lIf" => ("if", format!("if {}", arg), rest),
                "ElseIf" | "uElseIf" | "lElseIf" => ("if", format!("else if {}", arg), rest),
                _ => return None,
            }
        }
    };

    Some((format!(r#"<div class="algorithm-{}">{}</div>"#, kind, text), rest))
}

/// Split unmatched closing braces off the end of a statement line.
fn trailing_closers(line: &str) -> (&str, usize) {
    let mut balance = 0i32;
    let mut chars = line.chars();
    while let Some(c) = chars.next() {
        match c {
            '\\' => {
                chars.next();
            }
            '{' => balance += 1,
            '}' => balance -= 1,
            _ => {}
        }
    }

    let mut text = line;
    let mut closers = 0;
    while balance < 0 && text.ends_with('}') && !text.ends_with("\\}") {
        text = text[..text.len() - 1].trim_end();
        balance += 1;
        closers += 1;
    }
    (text, closers)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const SORT: &str = r"\begin{algorithm}[htbp]
\SetAlgoLined
\caption{Sort}
\label{alg:sort}
\KwIn{array $A$}
\KwOut{sorted $A$}
\For{$i \gets 1$ \KwTo $n$}{
  $x \gets A[i]$\;
  \tcp{insert x}
  \If{$x < A[i-1]$}{
    swap\;
  }
}
\Return{$A$}\;
\end{algorithm}";

    #[test]
    fn test_sort_algorithm() {
        let html = convert_algorithm(SORT, 1);
        assert!(html.starts_with(r#"<div class="algorithm" id="alg:sort" data-number="1">"#));
        assert!(html.contains(r#"<div class="algorithm-title">Sort</div>"#));
        assert!(html.contains(
            r#"<div class="algorithm-input">Input: array <span class="math">A</span></div>"#
        ));
        assert!(html.contains(r#"<div class="algorithm-output">Output: sorted"#));
        assert!(html.contains(
            r#"<div class="algorithm-for">for <span class="math">i ← 1</span> to <span class="math">n</span></div>"#
        ));
        assert!(html.contains(
            r#"<div class="algorithm-assign"><span class="math">x ← A[i]</span></div>"#
        ));
        assert!(html.contains(r#"<span class="algorithm-comment">// insert x</span>"#));
        assert!(html.contains(r#"<div class="algorithm-if">if <span class="math">x &lt; A[i-1]</span></div>"#));
        assert!(html.contains(r#"<div class="algorithm-state">swap</div>"#));
        assert!(html.contains(r#"<div class="algorithm-return">return <span class="math">A</span></div>"#));
        assert!(!html.contains("\\caption"));
        assert!(!html.contains("SetAlgoLined"));
        assert!(!html.contains("[htbp]"));
        assert_eq!(html.matches("<div").count(), html.matches("</div>").count());
    }

    #[test]
    fn test_plain_for_bounds() {
        let html = convert_algorithm(
            "\\begin{algorithm}\\caption{Sort}\n\\For{i \\KwTo n}{\nstep\\;\n}\n\\end{algorithm}",
            3,
        );
        assert!(html.contains(r#"<div class="algorithm-title">Sort</div>"#));
        assert!(html.contains(r#"<div class="algorithm-for">for i to n</div>"#));
        assert!(html.contains(r#"id="algorithm-3" data-number="3""#));
    }

    #[test]
    fn test_if_else_blocks() {
        let html = convert_algorithm(
            "\\begin{algorithm}\n\\eIf{ok}{\na\\;\n}{\nb\\;\n}\n\\end{algorithm}",
            1,
        );
        let body: Vec<&str> = html.lines().collect();
        assert!(body.contains(&r#"<div class="algorithm-else">else</div>"#));
        assert!(html.contains(r#"<div class="algorithm-if">if ok</div>"#));
        assert_eq!(html.matches(r#"<div class="algorithm-block">"#).count(), 2);
        assert_eq!(html.matches("<div").count(), html.matches("</div>").count());
    }

    #[test]
    fn test_else_if_and_closing_on_same_line() {
        let html = convert_algorithm(
            "\\begin{algorithm}\n\\If{a}{\nx\\;\n} \\ElseIf{b}{\ny\\;\n} \\Else{\nz\\;}\n\\end{algorithm}",
            1,
        );
        assert!(html.contains(r#"<div class="algorithm-if">else if b</div>"#));
        assert!(html.contains(r#"<div class="algorithm-else">else</div>"#));
        assert!(html.contains(r#"<div class="algorithm-state">z</div>"#));
        assert_eq!(html.matches("<div").count(), html.matches("</div>").count());
    }

    #[test]
    fn test_missing_closers_are_appended() {
        let html = convert_algorithm("\\begin{algorithm}\n\\While{true}{\nspin\\;\n\\end{algorithm}", 1);
        assert!(html.contains(r#"<div class="algorithm-while">while true</div>"#));
        assert_eq!(html.matches("<div").count(), html.matches("</div>").count());
    }

    #[test]
    fn test_one_line_if() {
        let html = convert_algorithm("\\begin{algorithm}\n\\lIf{x}{stop}\n\\end{algorithm}", 1);
        assert!(html.contains(
            "<div class=\"algorithm-if\">if x</div>\n<div class=\"algorithm-block\">\n<div class=\"algorithm-state\">stop</div>\n</div>"
        ));
    }

    #[test]
    fn test_escaped_braces_and_arrows() {
        let html = convert_algorithm("\\begin{algorithm}\nS \\gets \\{1\\} \\rightarrow T\n\\end{algorithm}", 1);
        assert!(html.contains(r#"<div class="algorithm-assign">S ← {1} → T</div>"#));
    }

    #[test]
    fn test_data_and_result() {
        let html = convert_algorithm("\\begin{algorithm}\n\\KwData{G}\n\\KwResult{T}\n\\end{algorithm}", 1);
        assert!(html.contains(r#"<div class="algorithm-input">Data: G</div>"#));
        assert!(html.contains(r#"<div class="algorithm-output">Result: T</div>"#));
    }

    #[test]
    fn test_nested_algorithm_is_an_error() {
        let source = "\\begin{algorithm}a\\begin{algorithm}b\\end{algorithm}";
        assert_eq!(
            convert_algorithm(source, 1),
            format!(r#"<div class="algorithm-error">{}</div>"#, source)
        );
    }

    #[test]
    fn test_inline_commands_in_pseudocode() {
        let html = convert_algorithm(
            "\\begin{algorithm}\n\\caption{\\textbf{Sort} $n$}\n\\textbf{swap} a~b \\cite{knuth}\\;\n$a~b$\\;\n\\end{algorithm}",
            1,
        );
        assert!(html.contains(
            r#"<div class="algorithm-title"><strong>Sort</strong> <span class="math">n</span></div>"#
        ));
        assert!(html.contains(
            r#"<div class="algorithm-state"><strong>swap</strong> a&nbsp;b [<span class="citation">knuth</span>]</div>"#
        ));
        assert!(html.contains(r#"<div class="algorithm-state"><span class="math">a~b</span></div>"#));
    }

    #[test]
    fn test_short_caption_is_stripped() {
        let html = convert_algorithm(
            "\\begin{algorithm}\n\\caption[Short]{Long title}\n\\label{alg:x}\nx\\;\n\\end{algorithm}",
            1,
        );
        assert!(html.contains(r#"<div class="algorithm-title">Long title</div>"#));
        assert!(!html.contains("Short"));
        assert!(!html.contains("\\caption"));
        assert!(html.contains(r#"<div class="algorithm-state">x</div>"#));
    }

    #[test]
    fn test_no_caption() {
        let html = convert_algorithm("\\begin{algorithm}\nx\n\\end{algorithm}", 2);
        assert!(!html.contains("algorithm-title"));
        assert!(html.contains(r#"<div class="algorithm-state">x</div>"#));
    }
}
