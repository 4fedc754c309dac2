//! Producers of files for the snapshot
//!
//! A [`Source`] enumerates relative paths from one physical origin and fetches the
//! mode and content of each path on demand. Sources are created from a
//! [`SourceSpec`] through the scheme registry; one spec may expand into several
//! sources (e.g. a wildcard matching several directories).
//!
//! Everything that can be checked without touching the filesystem is checked when
//! the [`SourcePlan`] is built, so a malformed argument fails before anything is
//! written.

pub mod filesystem;
pub mod source_spec;
pub mod tar_archive;
pub mod zip_archive;

use crate::artifacts::filter::path_filter::{PathFilter, Pattern};
use crate::artifacts::objects::entry_mode::FileMode;
use crate::errors::ImportError;
use bytes::Bytes;
use derive_new::new;
use source_spec::SourceSpec;

/// A fetched file: how to record it and its raw bytes
#[derive(Debug, Clone, PartialEq, Eq, new)]
pub struct SourceEntry {
    mode: FileMode,
    #[new(into)]
    content: Bytes,
}

impl SourceEntry {
    pub fn mode(&self) -> FileMode {
        self.mode
    }

    pub fn content(&self) -> &Bytes {
        &self.content
    }

    pub fn into_content(self) -> Bytes {
        self.content
    }
}

pub trait Source: std::fmt::Debug {
    /// Human readable name of the origin, used in progress and error messages
    fn origin(&self) -> &str;

    /// Relative paths (`/`-separated) of every file this source provides
    fn enumerate(&self) -> Box<dyn Iterator<Item = anyhow::Result<String>> + '_>;

    /// Mode and content of a path returned by [`Source::enumerate`]
    fn fetch(&self, path: &str) -> anyhow::Result<SourceEntry>;
}

pub type SourceFactory = fn(&str) -> anyhow::Result<Vec<Box<dyn Source>>>;

static SOURCE_FACTORIES: phf::Map<&'static str, SourceFactory> = phf::phf_map! {
    "file" => filesystem::open_all as SourceFactory,
    "tar" => tar_archive::open as SourceFactory,
    "zip" => zip_archive::open as SourceFactory,
};

const FILTER_KEYS: [&str; 4] = ["include", "exclude", "rinclude", "rexclude"];

/// Sorted names of the registered schemes
pub fn valid_schemes() -> Vec<&'static str> {
    let mut schemes = SOURCE_FACTORIES.keys().copied().collect::<Vec<_>>();
    schemes.sort_unstable();
    schemes
}

/// A validated source spec, ready to be opened
pub struct SourcePlan {
    spec: SourceSpec,
    location: String,
    factory: SourceFactory,
    filter: PathFilter,
}

impl std::fmt::Debug for SourcePlan {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SourcePlan")
            .field("spec", &self.spec)
            .field("location", &self.location)
            .field("filter", &self.filter)
            .finish()
    }
}

impl SourcePlan {
    pub fn try_new(spec: SourceSpec) -> anyhow::Result<Self> {
        let factory = *SOURCE_FACTORIES.get(spec.scheme()).ok_or_else(|| {
            ImportError::UnknownScheme {
                spec: spec.raw().to_string(),
                scheme: spec.scheme().to_string(),
                valid: valid_schemes().join(", "),
            }
        })?;

        let invalid = |reason: String| ImportError::InvalidSourceSpec {
            spec: spec.raw().to_string(),
            reason,
        };

        let location = match spec.args() {
            [] => return Err(invalid("missing location".to_string()).into()),
            [location] => location.clone(),
            [_, extra @ ..] => {
                return Err(invalid(format!("unexpected arguments {extra:?}")).into());
            }
        };
        if location.is_empty() {
            return Err(invalid("empty location".to_string()).into());
        }

        if let Some((key, _)) = spec
            .kwargs()
            .iter()
            .find(|(key, _)| !FILTER_KEYS.contains(&key.as_str()))
        {
            return Err(invalid(format!(
                "unknown key {key:?}, valid keys are {}",
                FILTER_KEYS.join(", ")
            ))
            .into());
        }

        let patterns = |glob_key: &str, regex_key: &str| {
            spec.values(glob_key)
                .map(|glob| Pattern::Glob(glob.to_string()))
                .chain(
                    spec.values(regex_key)
                        .map(|regex| Pattern::Regex(regex.to_string())),
                )
                .collect::<Vec<_>>()
        };
        let filter = PathFilter::new(
            &patterns("include", "rinclude"),
            &patterns("exclude", "rexclude"),
        )
        .map_err(|err| invalid(format!("{err:#}")))?;

        Ok(Self {
            spec,
            location,
            factory,
            filter,
        })
    }

    pub fn spec(&self) -> &SourceSpec {
        &self.spec
    }

    pub fn filter(&self) -> &PathFilter {
        &self.filter
    }

    /// Open every source the location expands to
    pub fn open(&self) -> anyhow::Result<Vec<Box<dyn Source>>> {
        (self.factory)(&self.location)
    }
}

/// Expand a leading `~` to the current user's home directory
pub(crate) fn expand_home(location: &str) -> anyhow::Result<std::path::PathBuf> {
    let rest = match location.strip_prefix('~') {
        Some(rest) if rest.is_empty() || rest.starts_with('/') => rest.trim_start_matches('/'),
        _ => return Ok(location.into()),
    };

    let dirs = directories::BaseDirs::new()
        .ok_or_else(|| anyhow::anyhow!("cannot expand {location}: no home directory"))?;

    Ok(dirs.home_dir().join(rest))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn plan(raw: &str) -> anyhow::Result<SourcePlan> {
        SourcePlan::try_new(SourceSpec::try_parse(raw)?)
    }

    #[test]
    fn schemes_are_listed_in_order() {
        assert_eq!(valid_schemes(), vec!["file", "tar", "zip"]);
    }

    #[test]
    fn a_plan_carries_location_and_filter() {
        let plan = plan("file:src:include=*.rs:rexclude=target/").unwrap();

        assert_eq!(plan.location, "src");
        assert!(plan.filter().accepts("main.rs"));
        assert!(!plan.filter().accepts("target/main.rs"));
        assert!(!plan.filter().accepts("Cargo.toml"));
    }

    #[test]
    fn unknown_schemes_list_the_valid_ones() {
        let err = plan("svn:repo").unwrap_err();

        match err.downcast_ref::<ImportError>() {
            Some(ImportError::UnknownScheme { scheme, valid, .. }) => {
                assert_eq!(scheme, "svn");
                assert_eq!(valid, "file, tar, zip");
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[rstest]
    #[case("file")]
    #[case("file:")]
    #[case("zip:a.zip:extra")]
    #[case("tar:a.tar:compression=gz")]
    #[case("file:src:rinclude=(unclosed")]
    fn invalid_plans_fail_before_io(#[case] raw: &str) {
        let err = plan(raw).unwrap_err();

        assert!(
            matches!(
                err.downcast_ref::<ImportError>(),
                Some(ImportError::InvalidSourceSpec { .. })
            ),
            "{err:#}"
        );
    }

    #[test]
    fn paths_without_tilde_are_untouched() {
        assert_eq!(
            expand_home("data/~x").unwrap(),
            std::path::PathBuf::from("data/~x")
        );
        assert_eq!(
            expand_home("~user/x").unwrap(),
            std::path::PathBuf::from("~user/x")
        );
    }
}
