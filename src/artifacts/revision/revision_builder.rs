//! Construction of the revision that records a snapshot
//!
//! Building is pure: the builder only validates its inputs and assembles a
//! [`Commit`] value. Storing it and moving the branch happen afterwards, as one
//! "write object, then swap ref" step.

use crate::artifacts::objects::commit::{Author, Commit};
use crate::artifacts::objects::encoding::TextEncoding;
use crate::artifacts::objects::object_id::ObjectId;
use crate::artifacts::revision::identity::{Identity, IdentityRole, ResolveIdentity};
use chrono::{DateTime, FixedOffset};
use derive_new::new;

/// Message used when none is given
pub const DEFAULT_MESSAGE: &str = "Automatic commit using bitar.";

/// Caller supplied metadata of a revision
#[derive(Debug, Clone, new)]
pub struct RevisionMetadata {
    author: Option<Identity>,
    author_time: DateTime<FixedOffset>,
    committer: Option<Identity>,
    commit_time: DateTime<FixedOffset>,
    message: String,
    encoding: TextEncoding,
}

impl RevisionMetadata {
    pub fn encoding(&self) -> TextEncoding {
        self.encoding
    }
}

#[derive(new)]
pub struct RevisionBuilder<'r, R: ResolveIdentity + ?Sized> {
    resolver: &'r R,
}

impl<R: ResolveIdentity + ?Sized> RevisionBuilder<'_, R> {
    /// Assemble the revision for `root`, chained onto `parent` when there is one
    pub fn build(
        &self,
        root: ObjectId,
        parent: Option<ObjectId>,
        metadata: &RevisionMetadata,
    ) -> anyhow::Result<Commit> {
        let encoding = metadata.encoding;

        let author = self.person(IdentityRole::Author, metadata.author.as_ref())?;
        let committer = self.person(IdentityRole::Committer, metadata.committer.as_ref())?;

        for (role, identity) in [
            (IdentityRole::Author, &author),
            (IdentityRole::Committer, &committer),
        ] {
            encoding.encode(&format!("{} {identity}", role.as_str()), &identity.to_string())?;
        }
        encoding.encode("commit message", &metadata.message)?;

        Ok(Commit::new(
            parent,
            root,
            Author::new(
                author.name().to_string(),
                author.email().to_string(),
                metadata.author_time,
            ),
            Author::new(
                committer.name().to_string(),
                committer.email().to_string(),
                metadata.commit_time,
            ),
            metadata.message.clone(),
            encoding,
        ))
    }

    fn person(&self, role: IdentityRole, explicit: Option<&Identity>) -> anyhow::Result<Identity> {
        match explicit {
            Some(identity) => Ok(identity.clone()),
            None => self.resolver.resolve_identity(role),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::artifacts::objects::object::Object;
    use crate::errors::ImportError;
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;

    struct FixedResolver;

    impl ResolveIdentity for FixedResolver {
        fn resolve_identity(&self, role: IdentityRole) -> anyhow::Result<Identity> {
            Identity::try_new(format!("Default {}", role.as_str()), "default@example.com")
        }
    }

    struct NoResolver;

    impl ResolveIdentity for NoResolver {
        fn resolve_identity(&self, role: IdentityRole) -> anyhow::Result<Identity> {
            anyhow::bail!("no {} configured", role.as_str())
        }
    }

    fn time() -> DateTime<FixedOffset> {
        FixedOffset::east_opt(3600)
            .unwrap()
            .timestamp_opt(1_700_000_000, 0)
            .unwrap()
    }

    fn root() -> ObjectId {
        ObjectId::try_parse("4b825dc642cb6eb9a060e54bf8d69288fbee4904".to_string()).unwrap()
    }

    fn metadata(author: Option<&str>, message: &str, encoding: TextEncoding) -> RevisionMetadata {
        RevisionMetadata::new(
            author.map(|author| Identity::try_parse(author).unwrap()),
            time(),
            None,
            time(),
            message.to_string(),
            encoding,
        )
    }

    #[test]
    fn missing_identities_come_from_the_resolver() {
        let builder = RevisionBuilder::new(&FixedResolver);

        let commit = builder
            .build(root(), None, &metadata(None, "import", TextEncoding::utf8()))
            .unwrap();

        assert_eq!(commit.author().display_name(), "Default author <default@example.com>");
        assert_eq!(
            commit.committer().display_name(),
            "Default committer <default@example.com>"
        );
        assert_eq!(commit.parent(), None);
    }

    #[test]
    fn explicit_identities_skip_the_resolver() {
        let builder = RevisionBuilder::new(&NoResolver);
        let mut metadata = metadata(Some("Jane <jane@example.com>"), "import", TextEncoding::utf8());
        metadata.committer = Some(Identity::try_parse("Bot <bot@example.com>").unwrap());

        let commit = builder.build(root(), None, &metadata).unwrap();

        assert_eq!(commit.author().display(), "Jane <jane@example.com> 1700000000 +0100");
        assert_eq!(commit.committer().name(), "Bot");
    }

    #[test]
    fn resolver_failures_are_reported() {
        let builder = RevisionBuilder::new(&NoResolver);

        let err = builder
            .build(root(), None, &metadata(None, "import", TextEncoding::utf8()))
            .unwrap_err();

        assert!(err.to_string().contains("no author configured"));
    }

    #[test]
    fn the_parent_is_the_previous_head() {
        let builder = RevisionBuilder::new(&FixedResolver);
        let parent =
            ObjectId::try_parse("104162197f760657d9c1f87a03c34993597c9513".to_string()).unwrap();

        let commit = builder
            .build(
                root(),
                Some(parent.clone()),
                &metadata(None, "second", TextEncoding::utf8()),
            )
            .unwrap();

        assert_eq!(commit.parent(), Some(&parent));
        assert_eq!(commit.tree_oid(), &root());
    }

    #[test]
    fn building_is_deterministic() {
        let builder = RevisionBuilder::new(&FixedResolver);
        let metadata = metadata(None, "same", TextEncoding::utf8());

        let first = builder.build(root(), None, &metadata).unwrap();
        let second = builder.build(root(), None, &metadata).unwrap();

        assert_eq!(first.object_id().unwrap(), second.object_id().unwrap());
    }

    #[test]
    fn text_must_be_representable_in_the_encoding() {
        let builder = RevisionBuilder::new(&FixedResolver);
        let latin1 = TextEncoding::try_parse("latin1").unwrap();

        let err = builder
            .build(root(), None, &metadata(None, "snowman \u{2603}", latin1))
            .unwrap_err();

        assert!(matches!(
            err.downcast_ref::<ImportError>(),
            Some(ImportError::Unrepresentable { .. })
        ));
        assert!(
            builder
                .build(root(), None, &metadata(Some("Jos\u{e9} <j@example.com>"), "caf\u{e9}", latin1))
                .is_ok()
        );
    }
}
