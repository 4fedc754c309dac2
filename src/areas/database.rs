//! Loose object database (`objects/` of a git directory)
//!
//! Objects are content-addressed, so storing is idempotent: an object that already
//! exists on disk is never rewritten. A new object is written to a temporary file in
//! its fan-out directory and renamed into place, so readers never observe a partial
//! object.

use crate::artifacts::objects::blob::Blob;
use crate::artifacts::objects::commit::Commit;
use crate::artifacts::objects::object::{Object, Unpackable};
use crate::artifacts::objects::object_id::ObjectId;
use crate::artifacts::objects::object_type::{ObjectHeader, ObjectType};
use crate::artifacts::objects::tree::Tree;
use anyhow::Context;
use bytes::{Buf, Bytes};
use fake::rand;
use flate2::Compression;
use flate2::read::ZlibDecoder;
use flate2::write::ZlibEncoder;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

#[derive(Debug)]
pub struct Database {
    path: Box<Path>,
}

impl Database {
    pub fn new(path: Box<Path>) -> Self {
        Database { path }
    }

    pub fn objects_path(&self) -> &Path {
        &self.path
    }

    /// Write an object unless it is already present and return its ID
    pub fn store(&self, object: &impl Object) -> anyhow::Result<ObjectId> {
        let encoded = object.serialize()?;
        let object_id = ObjectId::hash(&encoded);
        let object_path = self.object_path(&object_id);

        if object_path.exists() {
            return Ok(object_id);
        }

        let fan_out_dir = object_path
            .parent()
            .with_context(|| format!("invalid object path {}", object_path.display()))?;
        std::fs::create_dir_all(fan_out_dir).with_context(|| {
            format!("cannot create object directory {}", fan_out_dir.display())
        })?;

        let temp_path = fan_out_dir.join(format!("tmp_obj_{:08x}", rand::random::<u32>()));
        Self::write_compressed(&temp_path, &encoded)?;

        if let Err(err) = std::fs::rename(&temp_path, &object_path) {
            let _ = std::fs::remove_file(&temp_path);
            return Err(err)
                .with_context(|| format!("cannot move object into {}", object_path.display()));
        }

        Ok(object_id)
    }

    pub fn parse_object_as_blob(&self, object_id: &ObjectId) -> anyhow::Result<Option<Blob>> {
        self.parse_object_as(object_id, ObjectType::Blob)
    }

    pub fn parse_object_as_tree(&self, object_id: &ObjectId) -> anyhow::Result<Option<Tree>> {
        self.parse_object_as(object_id, ObjectType::Tree)
    }

    pub fn parse_object_as_commit(&self, object_id: &ObjectId) -> anyhow::Result<Option<Commit>> {
        self.parse_object_as(object_id, ObjectType::Commit)
    }

    /// `None` when the object exists but has another type
    fn parse_object_as<T: Unpackable>(
        &self,
        object_id: &ObjectId,
        expected: ObjectType,
    ) -> anyhow::Result<Option<T>> {
        let (header, body) = self.read_object(object_id)?;
        if header.object_type != expected {
            return Ok(None);
        }

        T::deserialize(body.reader())
            .with_context(|| format!("cannot parse {expected} {object_id}"))
            .map(Some)
    }

    fn read_object(&self, object_id: &ObjectId) -> anyhow::Result<(ObjectHeader, Bytes)> {
        let object_path = self.object_path(object_id);
        let compressed = std::fs::read(&object_path)
            .with_context(|| format!("cannot read object {object_id}"))?;

        let mut content = Vec::new();
        ZlibDecoder::new(compressed.as_slice())
            .read_to_end(&mut content)
            .with_context(|| format!("object {object_id} is corrupt"))?;

        let mut reader = content.as_slice();
        let header = ObjectHeader::read_from(&mut reader)?;
        if header.size != reader.len() {
            anyhow::bail!(
                "object {object_id} declares {} bytes but holds {}",
                header.size,
                reader.len()
            );
        }

        Ok((header, Bytes::copy_from_slice(reader)))
    }

    fn write_compressed(path: &Path, content: &[u8]) -> anyhow::Result<()> {
        let file = std::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(path)
            .with_context(|| format!("cannot create object file {}", path.display()))?;

        let mut encoder = ZlibEncoder::new(file, Compression::default());
        encoder
            .write_all(content)
            .and_then(|_| encoder.finish())
            .map(drop)
            .with_context(|| format!("cannot write object file {}", path.display()))
    }

    fn object_path(&self, object_id: &ObjectId) -> PathBuf {
        self.path.join(object_id.to_path())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_fs::TempDir;
    use pretty_assertions::assert_eq;

    #[test]
    fn stored_blob_can_be_read_back() {
        let dir = TempDir::new().unwrap();
        let database = Database::new(dir.path().into());

        let oid = database.store(&Blob::new(b"hello\n".to_vec())).unwrap();

        assert_eq!(oid.as_ref(), "ce013625030ba8dba906f756967f9e9ca394464a");
        assert!(dir.path().join("ce").join("013625030ba8dba906f756967f9e9ca394464a").is_file());
        assert_eq!(
            database.parse_object_as_blob(&oid).unwrap().unwrap().content().as_ref(),
            b"hello\n"
        );
    }

    #[test]
    fn storing_the_same_object_twice_is_a_no_op() {
        let dir = TempDir::new().unwrap();
        let database = Database::new(dir.path().into());
        let blob = Blob::new(b"same".to_vec());

        let first = database.store(&blob).unwrap();
        let object_path = dir.path().join(first.to_path());
        let written = std::fs::metadata(&object_path).unwrap().modified().unwrap();

        let second = database.store(&blob).unwrap();

        assert_eq!(first, second);
        assert_eq!(
            std::fs::metadata(&object_path).unwrap().modified().unwrap(),
            written
        );
        assert_eq!(std::fs::read_dir(object_path.parent().unwrap()).unwrap().count(), 1);
    }

    #[test]
    fn typed_parsing_rejects_other_object_kinds() {
        let dir = TempDir::new().unwrap();
        let database = Database::new(dir.path().into());

        let oid = database.store(&Blob::new(b"not a tree".to_vec())).unwrap();

        assert!(database.parse_object_as_tree(&oid).unwrap().is_none());
        assert!(database.parse_object_as_commit(&oid).unwrap().is_none());
    }

    #[test]
    fn objects_with_a_wrong_size_are_corrupt() {
        let dir = TempDir::new().unwrap();
        let database = Database::new(dir.path().into());
        let oid = ObjectId::hash(b"blob 9\0short");
        std::fs::create_dir_all(dir.path().join(oid.to_path()).parent().unwrap()).unwrap();
        Database::write_compressed(&dir.path().join(oid.to_path()), b"blob 9\0short").unwrap();

        let err = database.parse_object_as_blob(&oid).unwrap_err();

        assert!(err.to_string().contains("declares 9 bytes but holds 5"), "{err}");
    }
}
