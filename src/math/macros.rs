//! Fixed macro table applied to math source before it reaches a backend.

use crate::error::{ConfigError, RenderError, Result};
use crate::latex::scan::braced_argument;
use nom::multi::count;
use std::collections::BTreeMap;

/// Expansion rounds before a definition is treated as circular.
const MAX_ROUNDS: usize = 10;

/// A macro definition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Macro {
    /// Number of `{...}` arguments the macro consumes.
    pub arg_count: usize,
    /// Replacement text; `#1`..`#9` stand for the arguments.
    pub template: String,
}

impl Macro {
    /// Build a macro, inferring the argument count from the template.
    pub fn new(template: impl Into<String>) -> Self {
        let template = template.into();
        let arg_count = template
            .split('#')
            .skip(1)
            .filter_map(|tail| tail.chars().next()?.to_digit(10))
            .max()
            .unwrap_or(0) as usize;
        Self { arg_count, template }
    }

    /// Expand against the text following the macro name.
    ///
    /// Returns the expansion and the unconsumed input, or `None` when the
    /// arguments are missing or unbalanced.
    fn apply<'a>(&self, input: &'a str) -> Option<(String, &'a str)> {
        let (rest, args) = count(braced_argument, self.arg_count)(input).ok()?;
        let mut out = String::with_capacity(self.template.len());
        let mut chars = self.template.chars().peekable();
        while let Some(c) = chars.next() {
            let index = match (c, chars.peek().and_then(|d| d.to_digit(10))) {
                ('#', Some(n)) if n >= 1 => n as usize - 1,
                _ => {
                    out.push(c);
                    continue;
                }
            };
            chars.next();
            out.push_str(args.get(index).copied().unwrap_or_default());
        }
        Some((out, rest))
    }
}

/// Name to definition map, keyed without the leading backslash.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MacroTable {
    macros: BTreeMap<String, Macro>,
}

impl MacroTable {
    /// The table every math region is expanded with.
    pub fn builtin() -> Self {
        let mut table = Self::default();
        for (name, template) in [
            ("usepackage", "\\text{#1}"),
            ("hyphenation", "\\text{#1}"),
            ("textcolor", "\\color{#1}{#2}"),
            ("colorbox", "\\bbox[background:#1]{#2}"),
            ("newline", "\\\\"),
            ("newpage", "\\text{\\pagebreak}"),
            ("item", "•"),
            ("R", "\\mathbb{R}"),
            ("N", "\\mathbb{N}"),
            ("Z", "\\mathbb{Z}"),
            ("Q", "\\mathbb{Q}"),
            ("C", "\\mathbb{C}"),
        ] {
            table.macros.insert(name.to_string(), Macro::new(template));
        }
        table
    }

    /// Add or override definitions.
    pub fn extended(mut self, extra: &BTreeMap<String, String>) -> Result<Self> {
        for (name, template) in extra {
            let name = name.trim_start_matches('\\');
            if name.is_empty() || !name.chars().all(|c| c.is_ascii_alphabetic()) {
                return Err(ConfigError::InvalidMacro {
                    name: name.to_string(),
                    message: "macro names must be ASCII letters".to_string(),
                }
                .into());
            }
            self.macros.insert(name.to_string(), Macro::new(template.as_str()));
        }
        Ok(self)
    }

    /// Look up a definition.
    pub fn get(&self, name: &str) -> Option<&Macro> {
        self.macros.get(name)
    }

    /// Expand every known macro in `content`, repeating until nothing changes.
    pub fn expand(&self, content: &str) -> Result<String> {
        let mut current = content.to_string();
        for _ in 0..MAX_ROUNDS {
            match self.expand_once(&current) {
                Some(next) => current = next,
                None => return Ok(current),
            }
        }
        Err(RenderError::Macro(format!("expansion did not terminate for `{}`", content)).into())
    }

    /// One left-to-right pass; `None` when no macro fired.
    ///
    /// Control words are read whole, so `\R` never matches inside
    /// `\Rightarrow`, and control symbols such as `\\` are copied as a unit.
    fn expand_once(&self, content: &str) -> Option<String> {
        let mut out = String::with_capacity(content.len());
        let mut rest = content;
        let mut changed = false;

        while let Some(pos) = rest.find('\\') {
            out.push_str(&rest[..pos]);
            let after = &rest[pos + 1..];
            let word_len = after
                .find(|c: char| !c.is_ascii_alphabetic())
                .unwrap_or(after.len());

            if word_len == 0 {
                let symbol = after.chars().next().map_or(0, char::len_utf8);
                out.push('\\');
                out.push_str(&after[..symbol]);
                rest = &after[symbol..];
                continue;
            }

            let (name, tail) = after.split_at(word_len);
            match self.macros.get(name).and_then(|m| m.apply(tail)) {
                Some((expansion, remaining)) => {
                    out.push_str(&expansion);
                    rest = remaining;
                    changed = true;
                }
                None => {
                    out.push('\\');
                    out.push_str(name);
                    rest = tail;
                }
            }
        }
        out.push_str(rest);

        changed.then_some(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_expand_simple_macro() {
        let table = MacroTable::builtin();
        assert_eq!(table.expand("x \\in \\R").unwrap(), "x \\in \\mathbb{R}");
    }

    #[test]
    fn test_word_boundary() {
        let table = MacroTable::builtin();
        assert_eq!(table.expand("a \\Rightarrow b").unwrap(), "a \\Rightarrow b");
        assert_eq!(table.expand("\\R^n").unwrap(), "\\mathbb{R}^n");
        assert_eq!(table.expand("\\itemsep").unwrap(), "\\itemsep");
    }

    #[test]
    fn test_escaped_backslash_is_not_a_macro() {
        let table = MacroTable::builtin();
        assert_eq!(table.expand("a \\\\N").unwrap(), "a \\\\N");
        assert_eq!(table.expand("\\\\\\N").unwrap(), "\\\\\\mathbb{N}");
    }

    #[test]
    fn test_expand_macro_with_args() {
        let table = MacroTable::builtin();
        assert_eq!(
            table.expand("\\textcolor{red}{x+y}").unwrap(),
            "\\color{red}{x+y}"
        );
        assert_eq!(
            table.expand("\\colorbox{yellow}{z}").unwrap(),
            "\\bbox[background:yellow]{z}"
        );
    }

    #[test]
    fn test_missing_args_keep_original() {
        let table = MacroTable::builtin();
        assert_eq!(table.expand("\\textcolor{red}").unwrap(), "\\textcolor{red}");
    }

    #[test]
    fn test_item_and_newline() {
        let table = MacroTable::builtin();
        assert_eq!(table.expand("\\item a \\newline b").unwrap(), "• a \\\\ b");
    }

    #[test]
    fn test_extended_overrides() {
        let mut extra = BTreeMap::new();
        extra.insert("R".to_string(), "\\mathbf{R}".to_string());
        extra.insert("\\vec".to_string(), "\\mathbf{#1}".to_string());
        let table = MacroTable::builtin().extended(&extra).unwrap();
        assert_eq!(table.get("vec").unwrap().arg_count, 1);
        assert_eq!(table.expand("\\vec{x} \\in \\R").unwrap(), "\\mathbf{x} \\in \\mathbf{R}");
    }

    #[test]
    fn test_invalid_macro_name() {
        let mut extra = BTreeMap::new();
        extra.insert("bad name".to_string(), "x".to_string());
        assert!(MacroTable::builtin().extended(&extra).is_err());
    }

    #[test]
    fn test_circular_macro_errors() {
        let mut extra = BTreeMap::new();
        extra.insert("loop".to_string(), "x\\loop".to_string());
        let table = MacroTable::default().extended(&extra).unwrap();
        assert!(table.expand("\\loop").is_err());
    }

    #[test]
    fn test_apply_consumes_arguments() {
        let frac = Macro::new("\\frac{#1}{#2}");
        let (out, rest) = frac.apply(" {x}{y+1} + z").unwrap();
        assert_eq!(out, "\\frac{x}{y+1}");
        assert_eq!(rest, " + z");
        assert!(frac.apply("{x").is_none());
    }

    #[test]
    fn test_nested_braces_in_arguments() {
        let table = MacroTable::builtin();
        assert_eq!(
            table.expand("\\textcolor{blue}{\\frac{1}{2}}").unwrap(),
            "\\color{blue}{\\frac{1}{2}}"
        );
    }

    #[test]
    fn test_argument_count() {
        assert_eq!(Macro::new("\\mathbb{R}").arg_count, 0);
        assert_eq!(Macro::new("\\mathbf{#1}").arg_count, 1);
        assert_eq!(Macro::new("\\frac{#1}{#2}").arg_count, 2);
    }
}
