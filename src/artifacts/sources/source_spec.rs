//! Command line description of one source
//!
//! ## Grammar
//!
//! `scheme:location[:arg...][:key=value...]`
//!
//! - `:` separates fields, `\` makes the next character literal
//! - a field with one unescaped `=` is a keyword field, repeated keys accumulate
//! - keys must be identifiers (`[a-zA-Z_][a-zA-Z0-9_]*`)

use crate::errors::ImportError;
use regex::Regex;

const VALID_KEY_REGEX: &str = r"^[a-zA-Z_][a-zA-Z0-9_]*$";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceSpec {
    raw: String,
    scheme: String,
    args: Vec<String>,
    kwargs: Vec<(String, String)>,
}

impl SourceSpec {
    pub fn try_parse(raw: &str) -> Result<Self, ImportError> {
        let invalid = |reason: String| ImportError::InvalidSourceSpec {
            spec: raw.to_string(),
            reason,
        };

        let valid_key = Regex::new(VALID_KEY_REGEX).map_err(|err| invalid(err.to_string()))?;

        let mut args = Vec::new();
        let mut kwargs = Vec::new();
        let mut current = String::new();
        let mut key: Option<String> = None;
        let mut chars = raw.chars();

        loop {
            let c = chars.next();
            match c {
                Some('\\') => match chars.next() {
                    Some(escaped) => current.push(escaped),
                    None => return Err(invalid("trailing \\".to_string())),
                },
                Some('=') => {
                    if key.is_some() {
                        return Err(invalid(
                            "a field cannot contain more than one unescaped '='".to_string(),
                        ));
                    }
                    key = Some(std::mem::take(&mut current));
                }
                Some(':') | None => {
                    let value = std::mem::take(&mut current);
                    match key.take() {
                        Some(key) if !valid_key.is_match(&key) => {
                            return Err(invalid(format!("bad key name {key:?}")));
                        }
                        Some(key) => kwargs.push((key, value)),
                        None => args.push(value),
                    }

                    if c.is_none() {
                        break;
                    }
                }
                Some(c) => current.push(c),
            }
        }

        // the first field always exists, since the loop flushes at the end of input
        let scheme = args.remove(0);

        Ok(Self {
            raw: raw.to_string(),
            scheme,
            args,
            kwargs,
        })
    }

    pub fn raw(&self) -> &str {
        &self.raw
    }

    pub fn scheme(&self) -> &str {
        &self.scheme
    }

    /// Positional fields after the scheme; the first one is the location
    pub fn args(&self) -> &[String] {
        &self.args
    }

    pub fn kwargs(&self) -> &[(String, String)] {
        &self.kwargs
    }

    /// All values given for `key`, in order
    pub fn values(&self, key: &str) -> impl Iterator<Item = &str> + '_ {
        let key = key.to_string();
        self.kwargs
            .iter()
            .filter(move |(k, _)| *k == key)
            .map(|(_, v)| v.as_str())
    }
}

impl std::str::FromStr for SourceSpec {
    type Err = ImportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::try_parse(s)
    }
}

impl std::fmt::Display for SourceSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn kv(key: &str, value: &str) -> (String, String) {
        (key.to_string(), value.to_string())
    }

    #[test]
    fn splits_scheme_location_and_keywords() {
        let spec = SourceSpec::try_parse("file:src:include=*.rs:exclude=target/*").unwrap();

        assert_eq!(spec.scheme(), "file");
        assert_eq!(spec.args(), &["src".to_string()]);
        assert_eq!(
            spec.kwargs(),
            &[kv("include", "*.rs"), kv("exclude", "target/*")]
        );
        assert_eq!(spec.raw(), "file:src:include=*.rs:exclude=target/*");
    }

    #[test]
    fn repeated_keys_accumulate() {
        let spec = SourceSpec::try_parse("zip:a.zip:include=*.md:include=*.txt").unwrap();

        assert_eq!(spec.values("include").collect::<Vec<_>>(), vec!["*.md", "*.txt"]);
        assert_eq!(spec.values("exclude").count(), 0);
    }

    #[rstest]
    #[case(r"file:C\:/data", "C:/data")]
    #[case(r"file:a\=b", "a=b")]
    #[case(r"file:back\\slash", r"back\slash")]
    fn escaped_separators_are_literal(#[case] raw: &str, #[case] location: &str) {
        let spec = SourceSpec::try_parse(raw).unwrap();

        assert_eq!(spec.args(), &[location.to_string()]);
        assert!(spec.kwargs().is_empty());
    }

    #[test]
    fn escaped_equals_inside_a_value() {
        let spec = SourceSpec::try_parse(r"file:x:rinclude=a\=b").unwrap();

        assert_eq!(spec.kwargs(), &[kv("rinclude", "a=b")]);
    }

    #[test]
    fn empty_fields_are_kept() {
        let spec = SourceSpec::try_parse("file::include=").unwrap();

        assert_eq!(spec.args(), &[String::new()]);
        assert_eq!(spec.kwargs(), &[kv("include", "")]);
    }

    #[rstest]
    #[case(r"file:path\", "trailing")]
    #[case("file:path:a=b=c", "more than one")]
    #[case("file:path:1st=x", "bad key name")]
    #[case("file:path:=x", "bad key name")]
    #[case("file:path:with-dash=x", "bad key name")]
    fn malformed_specs_are_rejected(#[case] raw: &str, #[case] reason: &str) {
        let err = SourceSpec::try_parse(raw).unwrap_err();

        assert!(matches!(err, ImportError::InvalidSourceSpec { .. }));
        assert!(err.to_string().contains(reason), "{err}");
    }

    #[test]
    fn a_bare_word_is_only_a_scheme() {
        let spec: SourceSpec = "tar".parse().unwrap();

        assert_eq!(spec.scheme(), "tar");
        assert!(spec.args().is_empty());
    }
}
