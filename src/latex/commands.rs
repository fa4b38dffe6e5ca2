//! Inline command rewriting.
//!
//! Every rule is a pattern and a `${n}` replacement template. Rules run in
//! table order and each sees the output of the rules before it.

use super::scan::{command_pattern, protected_segments, Segment};
use regex::{Captures, Regex};
use std::borrow::Cow;
use std::sync::LazyLock;

const MASK_OPEN: char = '\u{E002}';
const MASK_CLOSE: char = '\u{E003}';

static MASK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(&format!("{MASK_OPEN}([0-9]+){MASK_CLOSE}")).unwrap());

/// Table passes before nested commands are left as they are.
const MAX_PASSES: usize = 4;

/// A single rewrite.
#[derive(Debug)]
pub struct CommandRule {
    pattern: Regex,
    replacement: &'static str,
}

impl CommandRule {
    fn new(pattern: &str, replacement: &'static str) -> Self {
        Self {
            pattern: command_pattern(pattern),
            replacement,
        }
    }

    fn apply<'t>(&self, text: &'t str) -> Cow<'t, str> {
        self.pattern.replace_all(text, self.replacement)
    }
}

static INLINE_RULES: LazyLock<Vec<CommandRule>> = LazyLock::new(|| {
    vec![
        CommandRule::new(r"\\textbf\{ARG\}", "<strong>${1}</strong>"),
        CommandRule::new(r"\\textit\{ARG\}", "<em>${1}</em>"),
        CommandRule::new(r"\\underline\{ARG\}", "<u>${1}</u>"),
        CommandRule::new(r"\\texttt\{ARG\}", "<code>${1}</code>"),
        CommandRule::new(r"\\cite\{([^{}]*)\}", r#"[<span class="citation">${1}</span>]"#),
        CommandRule::new(r"\\ref\{([^{}]*)\}", r#"<span class="reference">${1}</span>"#),
        CommandRule::new(r"\\label\{([^{}]*)\}", r#"<span class="label" id="${1}"></span>"#),
        CommandRule::new(r"~", "&nbsp;"),
        CommandRule::new(r"\\quad\b", "&nbsp;&nbsp;"),
        CommandRule::new(r"\\qquad\b", "&nbsp;&nbsp;&nbsp;&nbsp;"),
        CommandRule::new(r"\\\\", "<br>"),
        CommandRule::new(r"\\LaTeX\b", "LaTeX"),
        CommandRule::new(r"\\TeX\b", "TeX"),
        CommandRule::new(
            r"\\textcolor\{([^{}]*)\}\{ARG\}",
            r#"<span style="color: ${1}">${2}</span>"#,
        ),
        CommandRule::new(r"\\url\{([^{}]*)\}", r#"<a href="${1}">${1}</a>"#),
        CommandRule::new(r"\\href\{([^{}]*)\}\{ARG\}", r#"<a href="${1}">${2}</a>"#),
    ]
});

static SECTION_RULES: LazyLock<Vec<CommandRule>> = LazyLock::new(|| {
    vec![
        CommandRule::new(r"\\section\*?\{ARG\}", "<h2>${1}</h2>"),
        CommandRule::new(r"\\subsection\*?\{ARG\}", "<h3>${1}</h3>"),
        CommandRule::new(r"\\subsubsection\*?\{ARG\}", "<h4>${1}</h4>"),
    ]
});

/// An ordered rule list.
#[derive(Debug, Clone, Copy)]
pub struct CommandTable {
    rules: &'static [CommandRule],
}

impl CommandTable {
    /// Formatting, reference, spacing and link commands.
    pub fn inline() -> Self {
        Self {
            rules: INLINE_RULES.as_slice(),
        }
    }

    /// `\section`, `\subsection` and `\subsubsection`.
    pub fn sections() -> Self {
        Self {
            rules: SECTION_RULES.as_slice(),
        }
    }

    /// Run the table until nothing changes, so nested commands resolve inside out.
    pub fn apply(&self, text: &str) -> String {
        let mut current = text.to_string();
        for _ in 0..MAX_PASSES {
            let next = self.apply_once(&current);
            if next == current {
                break;
            }
            current = next;
        }
        current
    }

    fn apply_once(&self, text: &str) -> String {
        self.rules
            .iter()
            .fold(text.to_string(), |acc, rule| rule.apply(&acc).into_owned())
    }

    /// Apply the table with math regions masked.
    ///
    /// Each region is swapped for an opaque token first, so a command whose
    /// argument holds math (`\textbf{all $x$}`) still matches while the math
    /// itself is never rewritten.
    pub fn apply_outside_math(&self, text: &str, math_environments: &[Regex]) -> String {
        let mut regions = Vec::new();
        let masked: String = protected_segments(text, math_environments)
            .into_iter()
            .map(|segment| match segment {
                Segment::Text(text) => Cow::Borrowed(text),
                Segment::Math { source, .. } => {
                    regions.push(source);
                    Cow::Owned(format!("{MASK_OPEN}{}{MASK_CLOSE}", regions.len() - 1))
                }
            })
            .collect();

        if regions.is_empty() {
            return self.apply(&masked);
        }
        MASK.replace_all(&self.apply(&masked), |caps: &Captures| {
            caps[1]
                .parse::<usize>()
                .ok()
                .and_then(|i| regions.get(i))
                .map_or_else(|| caps[0].to_string(), |source| source.to_string())
        })
        .into_owned()
    }
}
