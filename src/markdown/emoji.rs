//! `:shortcode:` replacement.

use regex::{Captures, Regex};
use std::borrow::Cow;
use std::sync::LazyLock;

static SHORTCODE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r":([a-z0-9_+\-]+):").unwrap());

/// Look up a GitHub-style shortcode without the colons.
pub fn lookup(name: &str) -> Option<&'static str> {
    emojis::get_by_shortcode(name).map(|emoji| emoji.as_str())
}

/// Replace known shortcodes; unknown ones are left as written.
pub fn replace_shortcodes(text: &str) -> Cow<'_, str> {
    if !text.contains(':') {
        return Cow::Borrowed(text);
    }
    SHORTCODE.replace_all(text, |caps: &Captures| match lookup(&caps[1]) {
        Some(emoji) => emoji.to_string(),
        None => caps[0].to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_lookup() {
        assert_eq!(lookup("rocket"), Some("🚀"));
        assert_eq!(lookup("thumbsup"), lookup("+1"));
        assert_eq!(lookup("heart_eyes"), Some("😍"));
        assert_eq!(lookup("not_an_emoji"), None);
    }

    #[test]
    fn test_replace() {
        assert_eq!(replace_shortcodes("ship it :rocket: :+1:"), "ship it 🚀 👍");
    }

    #[test]
    fn test_unknown_kept() {
        assert_eq!(replace_shortcodes("time 10:30:00 :nope:"), "time 10:30:00 :nope:");
    }
}
