use crate::areas::config::GitConfig;
use crate::areas::database::Database;
use crate::areas::refs::Refs;
use crate::artifacts::revision::identity::{Identity, IdentityRole, ResolveIdentity};
use anyhow::Context;
use std::cell::{RefCell, RefMut};
use std::path::{Path, PathBuf};

const GIT_DIR: &str = ".git";

/// An existing git repository, working directory or bare
pub struct Repository {
    git_dir: Box<Path>,
    writer: RefCell<Box<dyn std::io::Write>>,
    database: Database,
    refs: Refs,
    config: GitConfig,
}

impl Repository {
    /// Open the repository at `path`
    ///
    /// `path` is either a working directory containing `.git/` or the git directory
    /// of a bare repository.
    pub fn open(path: &Path, writer: Box<dyn std::io::Write>) -> anyhow::Result<Self> {
        let path = path
            .canonicalize()
            .with_context(|| format!("cannot open repository {}", path.display()))?;
        let git_dir = Self::discover_git_dir(&path)?;

        let database = Database::new(git_dir.join("objects").into_boxed_path());
        let refs = Refs::new(git_dir.clone().into_boxed_path());
        let config = GitConfig::for_git_dir(&git_dir);

        Ok(Repository {
            git_dir: git_dir.into_boxed_path(),
            writer: RefCell::new(writer),
            database,
            refs,
            config,
        })
    }

    fn discover_git_dir(path: &Path) -> anyhow::Result<PathBuf> {
        let is_git_dir = |dir: &Path| {
            dir.join("objects").is_dir() && dir.join("refs").is_dir() && dir.join("HEAD").is_file()
        };

        let dot_git = path.join(GIT_DIR);
        if is_git_dir(&dot_git) {
            Ok(dot_git)
        } else if is_git_dir(path) {
            Ok(path.to_path_buf())
        } else {
            anyhow::bail!("not a git repository: {}", path.display())
        }
    }

    pub fn git_dir(&self) -> &Path {
        &self.git_dir
    }

    pub fn writer(&'_ self) -> RefMut<'_, Box<dyn std::io::Write>> {
        self.writer.borrow_mut()
    }

    pub fn database(&self) -> &Database {
        &self.database
    }

    pub fn refs(&self) -> &Refs {
        &self.refs
    }
}

impl ResolveIdentity for Repository {
    /// `GIT_<ROLE>_NAME`/`GIT_<ROLE>_EMAIL`, then `user.name`/`user.email`
    fn resolve_identity(&self, role: IdentityRole) -> anyhow::Result<Identity> {
        let (name_var, email_var) = role.env_vars();
        let lookup = |var: &str, key: &str| {
            std::env::var(var)
                .ok()
                .filter(|value| !value.trim().is_empty())
                .or_else(|| self.config.get(key))
        };

        let name = lookup(name_var, "user.name");
        let email = lookup(email_var, "user.email");

        match (name, email) {
            (Some(name), Some(email)) => Identity::try_new(name, email),
            _ => anyhow::bail!(
                "cannot determine the {} identity: set user.name and user.email in the git \
                config, set {name_var} and {email_var}, or pass --{}",
                role.as_str(),
                role.as_str()
            ),
        }
    }
}
