use crate::areas::repository::Repository;
use crate::artifacts::branch::branch_name::BranchName;
use crate::artifacts::filter::path_filter::PathFilter;
use crate::artifacts::objects::blob::Blob;
use crate::artifacts::objects::object_id::ObjectId;
use crate::artifacts::revision::revision_builder::{RevisionBuilder, RevisionMetadata};
use crate::artifacts::snapshot::tree_assembler::{Leaf, TreeAssembler};
use crate::artifacts::snapshot::tree_path::TreePath;
use crate::artifacts::sources::source_spec::SourceSpec;
use crate::artifacts::sources::{Source, SourcePlan};
use derive_new::new;
use std::io::Write;
use tracing::{debug, info};

#[derive(Debug, Clone, new)]
pub struct ImportOptions {
    sources: Vec<SourceSpec>,
    /// Defaults to the branch HEAD points at
    branch: Option<BranchName>,
    metadata: RevisionMetadata,
}

impl Repository {
    /// Snapshot every source into one tree and commit it onto the branch
    ///
    /// The branch is read once before any source is opened and moved with a
    /// compare-and-swap at the end; if another writer moved it in between, the run
    /// fails with [`crate::errors::ImportError::RefConflict`] and the branch keeps
    /// the other writer's value. Objects written before the failure stay in the
    /// database, unreferenced.
    pub fn import(&self, options: ImportOptions) -> anyhow::Result<ObjectId> {
        let plans = options
            .sources
            .into_iter()
            .map(SourcePlan::try_new)
            .collect::<anyhow::Result<Vec<_>>>()?;

        let branch = match options.branch {
            Some(branch) => branch,
            None => self.refs().current_branch()?.ok_or_else(|| {
                anyhow::anyhow!("HEAD is detached, pass --branch to choose the branch to commit to")
            })?,
        };
        let old_head = self.refs().read_branch(&branch)?;
        match &old_head {
            Some(old_head) => debug!("branch {branch} is at {old_head}"),
            None => debug!("branch {branch} does not exist yet"),
        }

        let mut assembler = TreeAssembler::new();
        for plan in &plans {
            info!("{}", plan.spec());

            for source in plan.open()? {
                self.import_source(source.as_ref(), plan.filter(), &mut assembler)?;
            }
        }

        let root = assembler.finalize(self.database(), options.metadata.encoding())?;
        let commit = RevisionBuilder::new(self).build(root, old_head.clone(), &options.metadata)?;
        let commit_id = self.database().store(&commit)?;

        let new_head = self
            .refs()
            .update_branch(&branch, old_head.as_ref(), &commit_id)?
            .into_result(&branch)?;
        info!(
            "committed {} entries to {branch} as {}",
            assembler.leaf_count(),
            new_head.to_short_oid()
        );

        writeln!(self.writer(), "{new_head}")?;

        Ok(new_head)
    }

    fn import_source(
        &self,
        source: &dyn Source,
        filter: &PathFilter,
        assembler: &mut TreeAssembler,
    ) -> anyhow::Result<()> {
        for path in source.enumerate() {
            let path = path?;
            let tree_path = TreePath::try_parse(&path, source.origin())?;
            let normalized = tree_path.to_string();

            if !filter.accepts(&normalized) {
                debug!("skipping {normalized}");
                continue;
            }

            let entry = source.fetch(&path)?;
            let mode = entry.mode();
            let blob_oid = self.database().store(&Blob::new(entry.into_content()))?;
            assembler.insert(&tree_path, Leaf::new(mode, blob_oid))?;

            info!("{normalized}");
        }

        Ok(())
    }
}
