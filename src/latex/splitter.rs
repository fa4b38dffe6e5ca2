//! Preamble/body split and document metadata.

use super::commands::CommandTable;
use super::scan::find_command_argument;
use nom::{
    bytes::complete::{tag, take_until},
    sequence::terminated,
    IResult,
};

const BEGIN_DOCUMENT: &str = "\\begin{document}";
const END_DOCUMENT: &str = "\\end{document}";

/// Metadata declared in the preamble.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Preamble {
    pub title: Option<String>,
    pub author: Option<String>,
    pub date: Option<String>,
}

impl Preamble {
    /// Collect `\title`, `\author` and `\date`.
    pub fn parse(input: &str) -> Self {
        let field = |name: &str| {
            find_command_argument(input, name)
                .map(str::trim)
                .filter(|value| !value.is_empty())
                .map(str::to_string)
        };
        Self {
            title: field("title"),
            author: field("author"),
            date: field("date"),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.author.is_none() && self.date.is_none()
    }

    /// HTML for `\maketitle`, or nothing when no metadata was declared.
    pub fn title_block(&self) -> String {
        if self.is_empty() {
            return String::new();
        }

        let commands = CommandTable::inline();
        let mut html = String::from(r#"<div class="title-block">"#);
        if let Some(title) = &self.title {
            html.push_str(&format!(r#"<h1 class="title">{}</h1>"#, commands.apply(title)));
        }
        if let Some(author) = &self.author {
            let author = author
                .split("\\and")
                .map(str::trim)
                .collect::<Vec<_>>()
                .join(", ");
            html.push_str(&format!(r#"<div class="author">{}</div>"#, commands.apply(&author)));
        }
        if let Some(date) = &self.date {
            html.push_str(&format!(r#"<div class="date">{}</div>"#, commands.apply(date)));
        }
        html.push_str("</div>");
        html
    }
}

/// A document cut into preamble metadata and the body to render.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SplitDocument<'a> {
    pub preamble: Preamble,
    pub body: &'a str,
}

fn preamble_text(input: &str) -> IResult<&str, &str> {
    terminated(take_until(BEGIN_DOCUMENT), tag(BEGIN_DOCUMENT))(input)
}

/// Split at the first `\begin{document}`; without one the whole input is the body.
///
/// `\end{document}` and everything after it are dropped.
pub fn split_document(input: &str) -> SplitDocument<'_> {
    let (preamble, body) = match preamble_text(input) {
        Ok((body, preamble)) => (Preamble::parse(preamble), body),
        Err(_) => (Preamble::default(), input),
    };

    let body = match body.find(END_DOCUMENT) {
        Some(end) => &body[..end],
        None => body,
    };

    SplitDocument { preamble, body }
}
