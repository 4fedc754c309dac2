use anyhow::Context;
use regex::Regex;

/// A single include or exclude expression
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Pattern {
    /// Shell glob, matched against the whole path
    Glob(String),
    /// Raw regular expression, anchored at the start of the path only
    Regex(String),
}

impl Pattern {
    fn compile(&self) -> anyhow::Result<Regex> {
        match self {
            Pattern::Glob(glob) => Regex::new(&glob_to_regex(glob))
                .with_context(|| format!("invalid glob pattern {glob:?}")),
            Pattern::Regex(raw) => Regex::new(&format!("^(?:{raw})"))
                .with_context(|| format!("invalid regular expression {raw:?}")),
        }
    }
}

/// Decides which enumerated paths make it into the tree
///
/// A path is accepted when the include list is empty or one include matches, and
/// no exclude matches. Excludes veto includes.
#[derive(Debug, Clone, Default)]
pub struct PathFilter {
    includes: Vec<Regex>,
    excludes: Vec<Regex>,
}

impl PathFilter {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn new(includes: &[Pattern], excludes: &[Pattern]) -> anyhow::Result<Self> {
        Ok(Self {
            includes: includes
                .iter()
                .map(Pattern::compile)
                .collect::<anyhow::Result<_>>()?,
            excludes: excludes
                .iter()
                .map(Pattern::compile)
                .collect::<anyhow::Result<_>>()?,
        })
    }

    pub fn accepts(&self, path: &str) -> bool {
        let included =
            self.includes.is_empty() || self.includes.iter().any(|re| re.is_match(path));

        included && !self.excludes.iter().any(|re| re.is_match(path))
    }
}

/// Translate a shell glob into a fully anchored regular expression
///
/// Follows `fnmatch` semantics: `*` and `?` also match `/`, `[...]` is a character
/// class and `[!...]` its negation. An unterminated `[` is a literal.
pub fn glob_to_regex(glob: &str) -> String {
    let chars: Vec<char> = glob.chars().collect();
    let mut regex = String::from("^(?s:");
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        i += 1;

        match c {
            '*' => {
                // consecutive stars are equivalent to one
                while i < chars.len() && chars[i] == '*' {
                    i += 1;
                }
                regex.push_str(".*");
            }
            '?' => regex.push('.'),
            '[' => {
                let mut j = i;
                if j < chars.len() && chars[j] == '!' {
                    j += 1;
                }
                if j < chars.len() && chars[j] == ']' {
                    j += 1;
                }
                while j < chars.len() && chars[j] != ']' {
                    j += 1;
                }

                if j >= chars.len() {
                    regex.push_str(r"\[");
                    continue;
                }

                let class = &chars[i..j];
                i = j + 1;

                regex.push('[');
                let mut members = class.iter().peekable();
                match members.peek() {
                    Some('!') => {
                        regex.push('^');
                        members.next();
                    }
                    Some('^') => {
                        regex.push_str(r"\^");
                        members.next();
                    }
                    _ => {}
                }
                for member in members {
                    match member {
                        '\\' | '[' | ']' | '&' | '~' => {
                            regex.push('\\');
                            regex.push(*member);
                        }
                        _ => regex.push(*member),
                    }
                }
                regex.push(']');
            }
            _ => regex.push_str(&regex::escape(&c.to_string())),
        }
    }

    regex.push_str(r")\z");
    regex
}
