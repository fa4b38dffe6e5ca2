//! Scanners shared by the LaTeX passes: environment spans, brace arguments and
//! the math delimiter tokenizer.

use crate::math::MathMode;
use nom::{
    branch::alt,
    bytes::complete::{is_not, tag, take, take_till1, take_until},
    character::complete::{char, multispace0},
    combinator::{opt, recognize, verify},
    multi::many0,
    sequence::{delimited, preceded},
    IResult,
};
use regex::Regex;

/// Pattern matching the narrowest `\begin{NAME}...\end{NAME}` span; group 1 is the body.
///
/// Nested environments of the same name pair the first begin with the nearest end.
pub fn environment_pattern(name: &str) -> Result<Regex, regex::Error> {
    let name = regex::escape(name);
    Regex::new(&format!(r"(?s)\\begin\{{{name}\}}(.*?)\\end\{{{name}\}}"))
}

/// Regex group for a brace argument body allowing escapes and one level of nested braces.
const ARG_GROUP: &str = r"((?:[^{}\\]|\\.|\{(?:[^{}\\]|\\.)*\})*)";

/// Compile a fixed command pattern in which each `ARG` captures a brace argument body.
pub fn command_pattern(pattern: &str) -> Regex {
    Regex::new(&pattern.replace("ARG", ARG_GROUP)).unwrap()
}

/// Content with balanced braces, escapes included.
fn balanced(input: &str) -> IResult<&str, &str> {
    recognize(many0(alt((
        is_not("{}\\"),
        recognize(preceded(char('\\'), take(1usize))),
        recognize(delimited(char('{'), balanced, char('}'))),
    ))))(input)
}

/// A `{...}` argument with nested braces; returns the inner text.
pub fn braced_argument(input: &str) -> IResult<&str, &str> {
    preceded(multispace0, delimited(char('{'), balanced, char('}')))(input)
}

/// A `[...]` optional argument; returns the inner text.
pub fn optional_argument(input: &str) -> IResult<&str, &str> {
    preceded(multispace0, delimited(char('['), is_not("]"), char(']')))(input)
}

/// `\name[opt]{arg}` at the start of `input`; returns the braced argument.
pub fn command_argument<'a>(input: &'a str, name: &str) -> IResult<&'a str, &'a str> {
    let (input, _) = char('\\')(input)?;
    let (input, _) = tag(name)(input)?;
    let (input, _) = opt(optional_argument)(input)?;
    braced_argument(input)
}

/// First `\name{...}` argument anywhere in `input`.
pub fn find_command_argument<'a>(input: &'a str, name: &str) -> Option<&'a str> {
    let needle = format!("\\{}", name);
    let mut offset = 0;
    while let Some(pos) = input[offset..].find(&needle) {
        let start = offset + pos;
        let after = &input[start + needle.len()..];
        if !after.starts_with(|c: char| c.is_ascii_alphabetic()) {
            if let Ok((_, arg)) = command_argument(&input[start..], name) {
                return Some(arg);
            }
        }
        offset = start + needle.len();
    }
    None
}

/// Delimiter that introduced a math region.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delimiter {
    /// `$...$`
    Dollar,
    /// `\(...\)`
    Paren,
    /// `$$...$$`
    DoubleDollar,
    /// `\[...\]`
    Bracket,
    /// A named math environment.
    Environment,
}

impl Delimiter {
    /// Typesetting mode implied by the delimiter.
    pub fn mode(self) -> MathMode {
        match self {
            Delimiter::Dollar | Delimiter::Paren => MathMode::Inline,
            Delimiter::DoubleDollar | Delimiter::Bracket | Delimiter::Environment => {
                MathMode::Display
            }
        }
    }
}

/// A piece of text as seen by the math tokenizer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment<'a> {
    Text(&'a str),
    Math {
        /// The whole region including delimiters.
        source: &'a str,
        /// The region without delimiters.
        tex: &'a str,
        delimiter: Delimiter,
    },
}

fn double_dollar(input: &str) -> IResult<&str, &str> {
    delimited(tag("$$"), verify(take_until("$$"), |s: &str| !s.is_empty()), tag("$$"))(input)
}

fn single_dollar(input: &str) -> IResult<&str, &str> {
    delimited(char('$'), take_till1(|c| c == '$'), char('$'))(input)
}

fn bracket(input: &str) -> IResult<&str, &str> {
    delimited(tag("\\["), verify(take_until("\\]"), |s: &str| !s.is_empty()), tag("\\]"))(input)
}

fn paren(input: &str) -> IResult<&str, &str> {
    delimited(tag("\\("), verify(take_until("\\)"), |s: &str| !s.contains('\n')), tag("\\)"))(input)
}

/// Split `input` into text and math regions, scanning left to right.
///
/// `$$` and `\[` take precedence over `$` and `\(`, so adjacent display
/// delimiters are never read as two inline spans. `\$` and `\\` are escapes.
pub fn math_segments(input: &str) -> Vec<Segment<'_>> {
    let mut segments = Vec::new();
    let mut text_start = 0;
    let mut i = 0;

    while i < input.len() {
        let rest = &input[i..];
        let found = if rest.starts_with('$') {
            if rest.starts_with("$$") {
                double_dollar(rest).map(|r| (r, Delimiter::DoubleDollar)).ok()
            } else {
                single_dollar(rest).map(|r| (r, Delimiter::Dollar)).ok()
            }
        } else if rest.starts_with('\\') {
            bracket(rest)
                .map(|r| (r, Delimiter::Bracket))
                .or_else(|_| paren(rest).map(|r| (r, Delimiter::Paren)))
                .ok()
        } else {
            None
        };

        match found {
            Some(((after, tex), delimiter)) => {
                if text_start < i {
                    segments.push(Segment::Text(&input[text_start..i]));
                }
                let end = input.len() - after.len();
                segments.push(Segment::Math {
                    source: &input[i..end],
                    tex,
                    delimiter,
                });
                i = end;
                text_start = end;
            }
            None if rest.starts_with('\\') => {
                // Skip the escaped character too, so `\$` never opens math.
                let escaped = rest[1..].chars().next().map_or(0, char::len_utf8);
                i += 1 + escaped;
            }
            None => {
                i += rest.chars().next().map_or(1, char::len_utf8);
            }
        }
    }

    if text_start < input.len() {
        segments.push(Segment::Text(&input[text_start..]));
    }

    segments
}

/// Split `input` into text and math, treating whole math environment spans as math.
pub fn protected_segments<'a>(input: &'a str, environments: &[Regex]) -> Vec<Segment<'a>> {
    let mut ranges: Vec<(usize, usize)> = environments
        .iter()
        .flat_map(|pattern| pattern.find_iter(input).map(|m| (m.start(), m.end())))
        .collect();
    ranges.sort_unstable();

    let mut segments = Vec::new();
    let mut cursor = 0;
    for (start, end) in ranges {
        if start < cursor {
            continue;
        }
        segments.extend(math_segments(&input[cursor..start]));
        segments.push(Segment::Math {
            source: &input[start..end],
            tex: &input[start..end],
            delimiter: Delimiter::Environment,
        });
        cursor = end;
    }
    segments.extend(math_segments(&input[cursor..]));

    segments
}
