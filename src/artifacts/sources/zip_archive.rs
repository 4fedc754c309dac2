use crate::artifacts::objects::entry_mode::FileMode;
use crate::artifacts::sources::{Source, SourceEntry, expand_home};
use anyhow::Context;
use std::cell::RefCell;
use std::fs::File;
use std::io::Read;
use zip::ZipArchive;

/// A zip archive; every member is recorded as a regular file
pub struct ZipSource {
    origin: String,
    archive: RefCell<ZipArchive<File>>,
    names: Vec<String>,
}

impl std::fmt::Debug for ZipSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ZipSource")
            .field("origin", &self.origin)
            .field("names", &self.names)
            .finish()
    }
}

impl ZipSource {
    pub fn open(path: &std::path::Path) -> anyhow::Result<Self> {
        let origin = path.display().to_string();
        let file = File::open(path).with_context(|| format!("cannot open {origin}"))?;
        let archive =
            ZipArchive::new(file).with_context(|| format!("{origin} is not a zip archive"))?;

        // directory members only describe structure the tree derives from file paths
        let names = archive
            .file_names()
            .filter(|name| !name.ends_with('/'))
            .map(str::to_string)
            .collect::<Vec<_>>();

        Ok(Self {
            origin,
            archive: RefCell::new(archive),
            names,
        })
    }
}

impl Source for ZipSource {
    fn origin(&self) -> &str {
        &self.origin
    }

    fn enumerate(&self) -> Box<dyn Iterator<Item = anyhow::Result<String>> + '_> {
        Box::new(self.names.iter().cloned().map(Ok))
    }

    fn fetch(&self, path: &str) -> anyhow::Result<SourceEntry> {
        let mut archive = self.archive.borrow_mut();
        let mut member = archive
            .by_name(path)
            .with_context(|| format!("cannot find {path} in {}", self.origin))?;

        let mut content = Vec::new();
        member
            .read_to_end(&mut content)
            .with_context(|| format!("cannot read {path} from {}", self.origin))?;

        Ok(SourceEntry::new(FileMode::Regular, content))
    }
}

/// Factory for `zip:` specs
pub fn open(location: &str) -> anyhow::Result<Vec<Box<dyn Source>>> {
    let path = expand_home(location)?;

    Ok(vec![Box::new(ZipSource::open(&path)?)])
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_fs::TempDir;
    use assert_fs::prelude::*;
    use pretty_assertions::assert_eq;
    use std::io::Write;
    use zip::ZipWriter;
    use zip::write::SimpleFileOptions;

    fn sample(dir: &TempDir) -> std::path::PathBuf {
        let path = dir.child("sample.zip").to_path_buf();
        let mut writer = ZipWriter::new(File::create(&path).unwrap());
        let options = SimpleFileOptions::default();

        writer.add_directory("docs/", options).unwrap();
        writer.start_file("docs/guide.md", options).unwrap();
        writer.write_all(b"# Guide\n").unwrap();
        writer
            .start_file("run.sh", options.unix_permissions(0o755))
            .unwrap();
        writer.write_all(b"#!/bin/sh\n").unwrap();
        writer.finish().unwrap();

        path
    }

    #[test]
    fn lists_file_members_only() {
        let dir = TempDir::new().unwrap();
        let source = ZipSource::open(&sample(&dir)).unwrap();

        let names = source.enumerate().collect::<anyhow::Result<Vec<_>>>().unwrap();

        assert_eq!(names, vec!["docs/guide.md", "run.sh"]);
    }

    #[test]
    fn members_are_regular_files() {
        let dir = TempDir::new().unwrap();
        let source = ZipSource::open(&sample(&dir)).unwrap();

        let guide = source.fetch("docs/guide.md").unwrap();
        assert_eq!(guide.mode(), FileMode::Regular);
        assert_eq!(guide.content().as_ref(), b"# Guide\n");

        // permission bits stored in the archive are not carried over
        assert_eq!(source.fetch("run.sh").unwrap().mode(), FileMode::Regular);
    }

    #[test]
    fn other_files_are_not_archives() {
        let dir = TempDir::new().unwrap();
        dir.child("plain.txt").write_str("not a zip").unwrap();

        let err = ZipSource::open(dir.child("plain.txt").path()).unwrap_err();

        assert!(err.to_string().contains("is not a zip archive"));
    }
}
