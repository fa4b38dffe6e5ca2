//! Per-render storage for fragments that later passes must not rewrite.
//!
//! A parked fragment is replaced in the text by a placeholder built from
//! private-use characters, which no pass pattern can match.

use std::borrow::Cow;

const OPEN: char = '\u{E000}';
const CLOSE: char = '\u{E001}';

/// Private-use characters the pipeline claims for its own markers.
pub const RESERVED: std::ops::RangeInclusive<char> = '\u{E000}'..='\u{E00F}';

/// Drop reserved characters from document input, so a source can never
/// forge a placeholder.
pub fn strip_reserved(text: &str) -> Cow<'_, str> {
    if text.chars().any(|c| RESERVED.contains(&c)) {
        Cow::Owned(text.chars().filter(|c| !RESERVED.contains(c)).collect())
    } else {
        Cow::Borrowed(text)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Fragment {
    /// Finished HTML.
    Html(String),
    /// Raw `algorithm` environment source awaiting conversion.
    Algorithm(String),
}

/// Fragments parked during one render call.
#[derive(Debug, Default)]
pub struct Stash {
    fragments: Vec<Fragment>,
}

impl Stash {
    /// Park finished HTML and return its placeholder.
    pub fn park(&mut self, html: String) -> String {
        self.push(Fragment::Html(html))
    }

    /// Park a raw algorithm source and return its placeholder.
    pub fn park_algorithm(&mut self, source: String) -> String {
        self.push(Fragment::Algorithm(source))
    }

    fn push(&mut self, fragment: Fragment) -> String {
        let index = self.fragments.len();
        self.fragments.push(fragment);
        format!("{OPEN}{index}{CLOSE}")
    }

    /// Whether `text` contains a placeholder.
    pub fn contains_placeholder(text: &str) -> bool {
        text.contains(OPEN)
    }

    /// Replace every parked algorithm source with the HTML `convert` returns, in
    /// document order.
    pub fn convert_algorithms(&mut self, mut convert: impl FnMut(&str) -> String) {
        for fragment in &mut self.fragments {
            if let Fragment::Algorithm(source) = fragment {
                *fragment = Fragment::Html(convert(source));
            }
        }
    }

    /// Substitute every placeholder in `text`, including placeholders nested in
    /// parked fragments.
    pub fn restore(&self, text: &str) -> String {
        self.restore_below(text, self.fragments.len())
    }

    /// A fragment can only reference fragments parked before it, so `limit`
    /// strictly decreases on recursion.
    fn restore_below(&self, text: &str, limit: usize) -> String {
        if !text.contains(OPEN) {
            return text.to_string();
        }

        let mut output = String::with_capacity(text.len());
        let mut rest = text;

        while let Some(start) = rest.find(OPEN) {
            output.push_str(&rest[..start]);
            let after = &rest[start + OPEN.len_utf8()..];

            let parsed = after.find(CLOSE).and_then(|end| {
                let index = after[..end].parse::<usize>().ok()?;
                Some((index, end))
            });

            match parsed {
                Some((index, end)) if index < limit => {
                    let body = match &self.fragments[index] {
                        Fragment::Html(html) | Fragment::Algorithm(html) => html,
                    };
                    output.push_str(&self.restore_below(body, index));
                    rest = &after[end + CLOSE.len_utf8()..];
                }
                _ => {
                    output.push(OPEN);
                    rest = after;
                }
            }
        }

        output.push_str(rest);
        output
    }
}
