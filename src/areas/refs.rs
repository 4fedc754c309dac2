//! Git references (branches and HEAD)
//!
//! References are human-readable names pointing to commits:
//! - Direct: containing a commit SHA-1
//! - Symbolic: pointing to another reference (e.g., HEAD -> refs/heads/master)
//!
//! Branch values are read from the loose ref file first and from `packed-refs`
//! second. Updates use git's lockfile protocol: `<ref>.lock` is created exclusively,
//! the current value is compared against the expected one while the lock is held,
//! and the lock file is renamed over the ref to publish the new value.

use crate::artifacts::branch::branch_name::{BranchName, SymRefName};
use crate::artifacts::branch::ref_update::RefUpdate;
use crate::artifacts::objects::object_id::ObjectId;
use anyhow::Context;
use derive_new::new;
use std::ffi::OsString;
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

#[derive(Debug, new)]
pub struct Refs {
    /// Path to the git directory
    path: Box<Path>,
}

/// Regex pattern for parsing symbolic references
const SYMREF_REGEX: &str = r"^ref: (.+)$";

/// Name of the HEAD reference
pub const HEAD_REF_NAME: &str = "HEAD";

const PACKED_REFS_FILE: &str = "packed-refs";

/// Internal representation of a reference value
#[derive(Debug, Clone)]
enum SymRefOrOid {
    /// Symbolic reference pointing to another ref
    SymRef { sym_ref_name: SymRefName },
    /// Direct object ID
    Oid(ObjectId),
}

impl SymRefOrOid {
    fn read_symref_or_oid(path: &Path) -> anyhow::Result<Option<SymRefOrOid>> {
        if !path.is_file() {
            return Ok(None);
        }

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read ref file at {:?}", path))?;
        let content = content.trim();

        if content.is_empty() {
            return Ok(None);
        }

        let symref_match = regex::Regex::new(SYMREF_REGEX)?.captures(content);
        if let Some(symref_match) = symref_match {
            Ok(Some(SymRefOrOid::SymRef {
                sym_ref_name: SymRefName::new(symref_match[1].to_string()),
            }))
        } else {
            Ok(Some(SymRefOrOid::Oid(ObjectId::try_parse(
                content.to_string(),
            )?)))
        }
    }
}

/// Exclusive `<ref>.lock` file; removed on drop unless committed
#[derive(Debug)]
struct RefLock {
    lock_path: PathBuf,
    ref_path: PathBuf,
    file: Option<File>,
}

impl RefLock {
    /// Returns `None` when another writer already holds the lock
    fn acquire(ref_path: &Path) -> anyhow::Result<Option<Self>> {
        let parent = ref_path
            .parent()
            .with_context(|| format!("invalid ref path {:?}", ref_path))?;
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create ref directory {:?}", parent))?;

        let mut lock_path = OsString::from(ref_path.as_os_str());
        lock_path.push(".lock");
        let lock_path = PathBuf::from(lock_path);

        match std::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&lock_path)
        {
            Ok(file) => Ok(Some(RefLock {
                lock_path,
                ref_path: ref_path.to_path_buf(),
                file: Some(file),
            })),
            Err(err) if err.kind() == std::io::ErrorKind::AlreadyExists => Ok(None),
            Err(err) => {
                Err(err).with_context(|| format!("failed to create lock file {:?}", lock_path))
            }
        }
    }

    fn commit(mut self, oid: &ObjectId) -> anyhow::Result<()> {
        let mut file = self.file.take().context("ref lock already committed")?;
        let written = writeln!(file, "{oid}").and_then(|_| file.sync_all());
        drop(file);

        let published =
            written.and_then(|_| std::fs::rename(&self.lock_path, &self.ref_path));
        if published.is_err() {
            let _ = std::fs::remove_file(&self.lock_path);
        }

        published.with_context(|| {
            format!(
                "failed to move {:?} into place at {:?}",
                self.lock_path, self.ref_path
            )
        })
    }
}

impl Drop for RefLock {
    fn drop(&mut self) {
        // still holding the handle means the update was abandoned
        if self.file.take().is_some() {
            let _ = std::fs::remove_file(&self.lock_path);
        }
    }
}

impl Refs {
    /// Get the current symbolic reference
    ///
    /// Follows symbolic references recursively to find the final direct reference.
    /// For example, if HEAD points to refs/heads/main, returns refs/heads/main.
    ///
    /// # Arguments
    ///
    /// * `source` - Starting reference (defaults to HEAD if None)
    pub fn current_ref(&self, source: Option<SymRefName>) -> anyhow::Result<SymRefName> {
        let source = source.unwrap_or_else(|| SymRefName::new(HEAD_REF_NAME.to_string()));

        let ref_content =
            SymRefOrOid::read_symref_or_oid(self.path.join(source.as_ref_path()).as_path())?;

        match ref_content {
            Some(SymRefOrOid::SymRef { sym_ref_name }) => Ok(self.current_ref(Some(sym_ref_name))?),
            Some(_) | None => Ok(source),
        }
    }

    /// Branch HEAD points at, or `None` for a detached HEAD
    pub fn current_branch(&self) -> anyhow::Result<Option<BranchName>> {
        let current_ref = self.current_ref(None)?;

        if current_ref.is_detached_head() {
            return Ok(None);
        }

        BranchName::try_parse_sym_ref_name(&current_ref).map(Some)
    }

    /// Current head of a branch, `None` if the branch does not exist
    pub fn read_branch(&self, branch_name: &BranchName) -> anyhow::Result<Option<ObjectId>> {
        let sym_ref_name = branch_name.to_sym_ref_name();

        match SymRefOrOid::read_symref_or_oid(&self.branch_path(branch_name))? {
            Some(SymRefOrOid::Oid(oid)) => Ok(Some(oid)),
            Some(SymRefOrOid::SymRef { sym_ref_name }) => anyhow::bail!(
                "branch {} is a symbolic ref to {}, refusing to update it",
                branch_name,
                sym_ref_name
            ),
            None => self.read_packed_ref(&sym_ref_name),
        }
    }

    /// Point a new branch at `oid`, unless the branch appeared in the meantime
    pub fn create_branch_if_absent(
        &self,
        branch_name: &BranchName,
        oid: &ObjectId,
    ) -> anyhow::Result<RefUpdate> {
        let Some(lock) = RefLock::acquire(&self.branch_path(branch_name))? else {
            return Ok(RefUpdate::Conflict {
                expected: None,
                actual: self.read_branch(branch_name)?,
            });
        };

        let actual = self.read_branch(branch_name)?;
        if actual.is_some() {
            return Ok(RefUpdate::Conflict {
                expected: None,
                actual,
            });
        }

        lock.commit(oid)?;
        Ok(RefUpdate::Created(oid.clone()))
    }

    /// Move a branch from `expected` to `new`, unless another writer moved it first
    pub fn swap_branch(
        &self,
        branch_name: &BranchName,
        expected: &ObjectId,
        new: &ObjectId,
    ) -> anyhow::Result<RefUpdate> {
        let Some(lock) = RefLock::acquire(&self.branch_path(branch_name))? else {
            return Ok(RefUpdate::Conflict {
                expected: Some(expected.clone()),
                actual: self.read_branch(branch_name)?,
            });
        };

        let actual = self.read_branch(branch_name)?;
        if actual.as_ref() != Some(expected) {
            return Ok(RefUpdate::Conflict {
                expected: Some(expected.clone()),
                actual,
            });
        }

        lock.commit(new)?;
        Ok(RefUpdate::Advanced {
            from: expected.clone(),
            to: new.clone(),
        })
    }

    /// Create or advance a branch depending on the head observed earlier
    pub fn update_branch(
        &self,
        branch_name: &BranchName,
        old_head: Option<&ObjectId>,
        new: &ObjectId,
    ) -> anyhow::Result<RefUpdate> {
        match old_head {
            Some(old_head) => self.swap_branch(branch_name, old_head, new),
            None => self.create_branch_if_absent(branch_name, new),
        }
    }

    fn read_packed_ref(&self, sym_ref_name: &SymRefName) -> anyhow::Result<Option<ObjectId>> {
        let packed_refs_path = self.path.join(PACKED_REFS_FILE);
        if !packed_refs_path.is_file() {
            return Ok(None);
        }

        let content = std::fs::read_to_string(&packed_refs_path)
            .with_context(|| format!("failed to read {:?}", packed_refs_path))?;

        content
            .lines()
            // comments carry the header, `^` lines the peeled value of the tag above
            .filter(|line| !line.starts_with('#') && !line.starts_with('^'))
            .filter_map(|line| line.split_once(' '))
            .find(|(_, name)| name.trim() == sym_ref_name.as_ref_path())
            .map(|(oid, _)| ObjectId::try_parse(oid.to_string()))
            .transpose()
    }

    fn branch_path(&self, branch_name: &BranchName) -> PathBuf {
        self.path.join(branch_name.to_sym_ref_name().as_ref_path())
    }
}
