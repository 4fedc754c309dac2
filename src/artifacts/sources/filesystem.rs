use crate::artifacts::objects::entry_mode::FileMode;
use crate::artifacts::sources::{Source, SourceEntry, expand_home};
use crate::errors::ImportError;
use anyhow::Context;
use is_executable::IsExecutable;
use std::fs::FileType;
use std::os::unix::fs::FileTypeExt;
use std::path::{Path, PathBuf};
use tracing::warn;
use walkdir::WalkDir;

/// A file or a directory tree on the local filesystem
///
/// Directories are walked without following symbolic links; links are recorded as
/// symlink entries holding their target. Paths are relative to the root directory,
/// a single file root yields its base name.
#[derive(Debug)]
pub struct FilesystemSource {
    root: PathBuf,
    origin: String,
    is_dir: bool,
}

impl FilesystemSource {
    pub fn open(root: PathBuf) -> anyhow::Result<Self> {
        let metadata = std::fs::symlink_metadata(&root)
            .with_context(|| format!("cannot read {}", root.display()))?;
        // a root that links to a directory is walked like the directory itself
        let is_dir = metadata.is_dir() || (metadata.is_symlink() && root.is_dir());

        Ok(Self {
            origin: root.display().to_string(),
            root,
            is_dir,
        })
    }

    fn full_path(&self, path: &str) -> PathBuf {
        if self.is_dir {
            self.root.join(path)
        } else {
            self.root.clone()
        }
    }

    fn relative_path(&self, path: &Path) -> anyhow::Result<String> {
        let relative = path.strip_prefix(&self.root).with_context(|| {
            format!("{} is outside of {}", path.display(), self.root.display())
        })?;

        let components = relative
            .components()
            .map(|component| {
                component.as_os_str().to_str().ok_or_else(|| ImportError::InvalidPath {
                    origin: self.origin.clone(),
                    path: relative.display().to_string(),
                    reason: "file name is not valid UTF-8".to_string(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(components.join("/"))
    }

    fn unsupported(&self, path: &Path, file_type: FileType) -> ImportError {
        ImportError::UnsupportedEntry {
            origin: self.origin.clone(),
            path: path.display().to_string(),
            kind: describe(file_type).to_string(),
        }
    }
}

impl Source for FilesystemSource {
    fn origin(&self) -> &str {
        &self.origin
    }

    fn enumerate(&self) -> Box<dyn Iterator<Item = anyhow::Result<String>> + '_> {
        if !self.is_dir {
            let name: anyhow::Result<String> = self
                .root
                .file_name()
                .and_then(|name| name.to_str())
                .map(str::to_string)
                .ok_or_else(|| {
                    ImportError::InvalidPath {
                        origin: self.origin.clone(),
                        path: self.root.display().to_string(),
                        reason: "file name is missing or not valid UTF-8".to_string(),
                    }
                    .into()
                });
            return Box::new(std::iter::once(name));
        }

        let entries = WalkDir::new(&self.root)
            .follow_links(false)
            .min_depth(1)
            .sort_by_file_name()
            .into_iter()
            .filter_map(move |entry| {
                let entry = match entry {
                    Ok(entry) => entry,
                    Err(err) => {
                        return Some(Err(anyhow::Error::new(err)
                            .context(format!("cannot walk {}", self.root.display()))));
                    }
                };

                let file_type = entry.file_type();
                if file_type.is_dir() {
                    None
                } else if file_type.is_file() || file_type.is_symlink() {
                    Some(self.relative_path(entry.path()))
                } else {
                    Some(Err(self.unsupported(entry.path(), file_type).into()))
                }
            });

        Box::new(entries)
    }

    fn fetch(&self, path: &str) -> anyhow::Result<SourceEntry> {
        let full_path = self.full_path(path);
        let metadata = std::fs::symlink_metadata(&full_path)
            .with_context(|| format!("cannot read {}", full_path.display()))?;
        let file_type = metadata.file_type();

        if file_type.is_symlink() {
            let target = std::fs::read_link(&full_path)
                .with_context(|| format!("cannot read link {}", full_path.display()))?;

            Ok(SourceEntry::new(
                FileMode::Symlink,
                target.into_os_string().into_encoded_bytes(),
            ))
        } else if file_type.is_file() {
            let content = std::fs::read(&full_path)
                .with_context(|| format!("cannot read {}", full_path.display()))?;
            let mode = match full_path.is_executable() {
                true => FileMode::Executable,
                false => FileMode::Regular,
            };

            Ok(SourceEntry::new(mode, content))
        } else {
            Err(self.unsupported(&full_path, file_type).into())
        }
    }
}

fn describe(file_type: FileType) -> &'static str {
    if file_type.is_fifo() {
        "fifo"
    } else if file_type.is_socket() {
        "socket"
    } else if file_type.is_block_device() {
        "block device"
    } else if file_type.is_char_device() {
        "character device"
    } else {
        "file type"
    }
}

/// Factory for `file:` specs
///
/// Expands `~` and wildcards. A wildcard without matches opens nothing; a literal
/// path must exist.
pub fn open_all(location: &str) -> anyhow::Result<Vec<Box<dyn Source>>> {
    let expanded = expand_home(location)?;

    if !location.contains(['*', '?', '[']) {
        if std::fs::symlink_metadata(&expanded).is_err() {
            anyhow::bail!("no such file or directory: {}", expanded.display());
        }
        return Ok(vec![Box::new(FilesystemSource::open(expanded)?)]);
    }

    let pattern = expanded
        .to_str()
        .with_context(|| format!("pattern {location:?} is not valid UTF-8"))?;
    let sources = glob::glob(pattern)
        .with_context(|| format!("invalid wildcard pattern {location:?}"))?
        .map(|path| {
            let path = path.with_context(|| format!("cannot expand {location:?}"))?;
            Ok(Box::new(FilesystemSource::open(path)?) as Box<dyn Source>)
        })
        .collect::<anyhow::Result<Vec<_>>>()?;

    if sources.is_empty() {
        warn!("{location} does not match any file");
    }

    Ok(sources)
}
