use regex::Regex;

const IDENTITY_REGEX: &str = r"^\s*([^<>]*?)\s*<([^<>]*)>\s*$";

/// Whose identity is being resolved; the defaults differ per role
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdentityRole {
    Author,
    Committer,
}

impl IdentityRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            IdentityRole::Author => "author",
            IdentityRole::Committer => "committer",
        }
    }

    /// Environment variables git consults for this role
    pub fn env_vars(&self) -> (&'static str, &'static str) {
        match self {
            IdentityRole::Author => ("GIT_AUTHOR_NAME", "GIT_AUTHOR_EMAIL"),
            IdentityRole::Committer => ("GIT_COMMITTER_NAME", "GIT_COMMITTER_EMAIL"),
        }
    }
}

/// A person as recorded in a commit: `Name <email>`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    name: String,
    email: String,
}

impl Identity {
    pub fn try_new(name: impl Into<String>, email: impl Into<String>) -> anyhow::Result<Self> {
        let name = name.into().trim().to_string();
        let email = email.into().trim().to_string();

        if name.is_empty() {
            anyhow::bail!("identity name must not be empty");
        }
        for (field, value) in [("name", &name), ("email", &email)] {
            if value.contains(['<', '>', '\n', '\0']) {
                anyhow::bail!("identity {field} {value:?} contains forbidden characters");
            }
        }

        Ok(Self { name, email })
    }

    /// Parse `Name <email>`
    pub fn try_parse(value: &str) -> anyhow::Result<Self> {
        let regex = Regex::new(IDENTITY_REGEX)?;
        let captures = regex
            .captures(value)
            .ok_or_else(|| anyhow::anyhow!("invalid identity {value:?}, expected 'Name <email>'"))?;

        Self::try_new(&captures[1], &captures[2])
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn email(&self) -> &str {
        &self.email
    }
}

impl std::str::FromStr for Identity {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::try_parse(s)
    }
}

impl std::fmt::Display for Identity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} <{}>", self.name, self.email)
    }
}

/// Source of the identity used when none is given explicitly
pub trait ResolveIdentity {
    fn resolve_identity(&self, role: IdentityRole) -> anyhow::Result<Identity>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[rstest]
    #[case("Jane Doe <jane@example.com>", "Jane Doe", "jane@example.com")]
    #[case("  Jane   <jane@example.com>  ", "Jane", "jane@example.com")]
    #[case("bot <>", "bot", "")]
    fn parses_name_and_email(#[case] raw: &str, #[case] name: &str, #[case] email: &str) {
        let identity = Identity::try_parse(raw).unwrap();

        assert_eq!(identity.name(), name);
        assert_eq!(identity.email(), email);
    }

    #[rstest]
    #[case("Jane Doe")]
    #[case("<jane@example.com>")]
    #[case("Jane <a> <b>")]
    #[case("Jane <jane@example.com> trailing")]
    fn rejects_malformed_identities(#[case] raw: &str) {
        assert!(Identity::try_parse(raw).is_err());
    }

    #[test]
    fn displays_in_git_form() {
        let identity = Identity::try_new("Jane", "jane@example.com").unwrap();

        assert_eq!(identity.to_string(), "Jane <jane@example.com>");
    }

    #[test]
    fn newlines_are_forbidden() {
        assert!(Identity::try_new("Jane\nDoe", "jane@example.com").is_err());
    }
}
