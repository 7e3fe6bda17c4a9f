//! Fence info string parsing.
//!
//! An info string is the text after the opening fence:
//!
//! ```text
//! typescript exec="yes" html="1" source="tabbed-left" tabs="Code|Output"
//! ```
//!
//! The first token is the language, the rest are `key="value"`,
//! `key='value'`, `key=value` or bare `key` options.

use std::collections::BTreeMap;

use crate::exec::SourceLocation;
use crate::{Error, Result};

/// Options parsed from a fenced code block's info string.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FenceOptions {
    /// Language tag (first token)
    pub language: String,
    /// Execute the block
    pub exec: bool,
    /// Inject output as raw HTML instead of Markdown
    pub html: bool,
    /// Where to show the source, if at all
    pub source: Option<SourceLocation>,
    /// Wrap output in a code block of this language
    pub result: Option<String>,
    /// Source / result tab titles
    pub tabs: Option<(String, String)>,
    /// Session name (not supported by every runner)
    pub session: Option<String>,
    /// Block identifier
    pub id: Option<String>,
    /// Exit code the program is expected to return
    pub returncode: i32,
    /// Working directory, relative to the project root
    pub workdir: Option<String>,
    /// Terminal width exposed to the program as `COLUMNS`
    pub width: Option<u16>,
    /// Options no built-in formatter understands
    pub extra: BTreeMap<String, String>,
}

impl FenceOptions {
    /// Options for a block that only has a language.
    pub fn plain(language: &str) -> Self {
        Self {
            language: language.to_string(),
            ..Default::default()
        }
    }

    /// Parse an info string. `line` is only used for error messages.
    ///
    /// Values of `source`, `tabs`, `returncode` and `width` are only checked
    /// when the block executes. On other blocks a value that does not parse
    /// is kept verbatim in `extra`.
    pub fn parse(info: &str, line: usize) -> Result<Self> {
        let mut tokens = tokenize(info).into_iter();
        let mut options = Self::plain(&tokens.next().unwrap_or_default());

        let pairs: Vec<(String, String)> = tokens
            .map(|token| match token.split_once('=') {
                Some((key, value)) => (key.to_string(), unquote(value)),
                None => (token, String::new()),
            })
            .collect();
        options.exec = pairs
            .iter()
            .rev()
            .find(|(key, _)| key == "exec")
            .is_some_and(|(_, value)| is_truthy(value));

        for (key, value) in pairs {
            let applied = match key.as_str() {
                "exec" => true,
                "html" => {
                    options.html = is_truthy(&value);
                    true
                }
                "source" => value
                    .parse::<SourceLocation>()
                    .map(|location| options.source = Some(location))
                    .is_ok(),
                "result" => {
                    options.result = non_empty(value.clone());
                    true
                }
                "tabs" => parse_tabs(&value)
                    .map(|tabs| options.tabs = Some(tabs))
                    .is_some(),
                "session" => {
                    options.session = non_empty(value.clone());
                    true
                }
                "id" => {
                    options.id = non_empty(value.clone());
                    true
                }
                "returncode" => value
                    .parse()
                    .map(|code| options.returncode = code)
                    .is_ok(),
                "workdir" => {
                    options.workdir = non_empty(value.clone());
                    true
                }
                "width" => value
                    .parse()
                    .map(|width| options.width = Some(width))
                    .is_ok(),
                _ => false,
            };

            if applied {
                continue;
            }
            if options.exec && is_checked(&key) {
                return Err(Error::InvalidOption { key, value, line });
            }
            options.extra.insert(key, value);
        }

        Ok(options)
    }
}

/// Options whose values must parse on executed blocks.
fn is_checked(key: &str) -> bool {
    matches!(key, "source" | "tabs" | "returncode" | "width")
}

/// `Source|Result`: exactly two titles.
fn parse_tabs(value: &str) -> Option<(String, String)> {
    let (source, result) = value.split_once('|')?;
    if result.contains('|') {
        return None;
    }
    Some((source.to_string(), result.to_string()))
}

/// Whether an option value means "yes".
///
/// Only `""`, `0`, `no`, `off` and `false` (case-insensitive) are false.
pub fn is_truthy(value: &str) -> bool {
    !matches!(
        value.to_ascii_lowercase().as_str(),
        "" | "0" | "no" | "off" | "false"
    )
}

fn non_empty(value: String) -> Option<String> {
    if value.is_empty() { None } else { Some(value) }
}

/// Strip a single layer of matching quotes.
fn unquote(value: &str) -> String {
    for quote in ['"', '\''] {
        if let Some(inner) = value
            .strip_prefix(quote)
            .and_then(|v| v.strip_suffix(quote))
        {
            return inner.to_string();
        }
    }
    value.to_string()
}

/// Split on whitespace outside quotes. Quotes are kept so `unquote` can tell
/// `key="a b"` from `key=a`. An unterminated quote runs to the end.
fn tokenize(info: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut quote: Option<char> = None;

    for c in info.chars() {
        match quote {
            Some(q) => {
                current.push(c);
                if c == q {
                    quote = None;
                }
            }
            None if c == '"' || c == '\'' => {
                current.push(c);
                quote = Some(c);
            }
            None if c.is_whitespace() => {
                if !current.is_empty() {
                    tokens.push(std::mem::take(&mut current));
                }
            }
            None => current.push(c),
        }
    }
    if !current.is_empty() {
        tokens.push(current);
    }

    tokens
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_language_only() {
        let options = FenceOptions::parse("typescript", 1).unwrap();
        assert_eq!(options, FenceOptions::plain("typescript"));
        assert!(!options.exec);
        assert_eq!(options.returncode, 0);
    }

    #[test]
    fn test_empty_info() {
        let options = FenceOptions::parse("", 1).unwrap();
        assert_eq!(options.language, "");
    }

    #[test]
    fn test_exec_and_html() {
        let options = FenceOptions::parse(r#"typescript exec="yes" html="1""#, 1).unwrap();
        assert!(options.exec);
        assert!(options.html);

        let options = FenceOptions::parse("typescript exec=off html=no", 1).unwrap();
        assert!(!options.exec);
        assert!(!options.html);
    }

    #[test]
    fn test_bare_flag_is_false() {
        let options = FenceOptions::parse("typescript exec", 1).unwrap();
        assert!(!options.exec);
    }

    #[test]
    fn test_truthiness() {
        for yes in ["1", "yes", "on", "true", "TRUE", "anything"] {
            assert!(is_truthy(yes), "{yes}");
        }
        for no in ["", "0", "no", "off", "false", "False", "NO"] {
            assert!(!is_truthy(no), "{no}");
        }
    }

    #[test]
    fn test_quoted_values_keep_spaces() {
        let options =
            FenceOptions::parse(r#"ts exec="1" tabs="My code|What it prints" title='a b'"#, 1)
                .unwrap();
        assert_eq!(
            options.tabs,
            Some(("My code".to_string(), "What it prints".to_string()))
        );
        assert_eq!(options.extra.get("title").map(String::as_str), Some("a b"));
    }

    #[test]
    fn test_source_and_result() {
        let options =
            FenceOptions::parse(r#"typescript exec="1" source="material-block" result="text""#, 1)
                .unwrap();
        assert_eq!(options.source, Some(SourceLocation::MaterialBlock));
        assert_eq!(options.result.as_deref(), Some("text"));
    }

    #[test]
    fn test_execution_settings() {
        let options = FenceOptions::parse(
            r#"typescript exec="1" session="s" id="first" returncode="2" workdir="sub" width="120""#,
            1,
        )
        .unwrap();
        assert_eq!(options.session.as_deref(), Some("s"));
        assert_eq!(options.id.as_deref(), Some("first"));
        assert_eq!(options.returncode, 2);
        assert_eq!(options.workdir.as_deref(), Some("sub"));
        assert_eq!(options.width, Some(120));
    }

    #[test]
    fn test_invalid_values() {
        let err = FenceOptions::parse(r#"ts exec="1" returncode="x""#, 7).unwrap_err();
        assert!(matches!(
            err,
            Error::InvalidOption { ref key, line: 7, .. } if key == "returncode"
        ));

        assert!(FenceOptions::parse("ts exec=1 source=sideways", 1).is_err());
        assert!(FenceOptions::parse("ts exec=1 tabs=OnlyOne", 1).is_err());
        assert!(FenceOptions::parse("ts exec=1 tabs=A|B|C", 1).is_err());
        assert!(FenceOptions::parse("ts width=-3 exec=1", 1).is_err());
    }

    #[test]
    fn test_values_on_plain_blocks_are_not_checked() {
        let options = FenceOptions::parse(r#"python source="app.py" width=100%"#, 1).unwrap();
        assert_eq!(options.source, None);
        assert_eq!(options.width, None);
        assert_eq!(options.extra.get("source").map(String::as_str), Some("app.py"));
        assert_eq!(options.extra.get("width").map(String::as_str), Some("100%"));

        let options = FenceOptions::parse(r#"ts exec="no" tabs="A|B|C""#, 1).unwrap();
        assert_eq!(options.tabs, None);
        assert_eq!(options.extra.get("tabs").map(String::as_str), Some("A|B|C"));
    }

    #[test]
    fn test_last_exec_wins() {
        assert!(!FenceOptions::parse("ts exec=1 exec=0", 1).unwrap().exec);
        assert!(FenceOptions::parse("ts exec=0 exec=yes", 1).unwrap().exec);
    }

    #[test]
    fn test_unterminated_quote_runs_to_end() {
        let options = FenceOptions::parse(r#"text note="it's fine"#, 1).unwrap();
        assert_eq!(
            options.extra.get("note").map(String::as_str),
            Some("\"it's fine")
        );
    }
}
