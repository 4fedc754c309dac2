//! Git object identifier
//!
//! The lowercase hex SHA-1 of an encoded object (header included). Identical content
//! always yields the identical ID, which is what lets the object database deduplicate
//! blobs and subtrees. Trees embed the 20 raw bytes instead of the hex text.

use crate::artifacts::objects::OBJECT_ID_LENGTH;
use sha1::{Digest, Sha1};
use std::path::PathBuf;

/// Number of raw bytes in a SHA-1 digest
pub const RAW_OBJECT_ID_LENGTH: usize = OBJECT_ID_LENGTH / 2;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, PartialOrd, Ord)]
pub struct ObjectId(String);

impl ObjectId {
    /// Accepts 40 hex digits in either case; the ID is kept lowercase
    pub fn try_parse(id: String) -> anyhow::Result<Self> {
        if id.len() != OBJECT_ID_LENGTH || !id.bytes().all(|b| b.is_ascii_hexdigit()) {
            anyhow::bail!("invalid object id {id:?}, expected {OBJECT_ID_LENGTH} hex digits");
        }

        Ok(Self(id.to_ascii_lowercase()))
    }

    pub fn hash(encoded: &[u8]) -> Self {
        Self::from_raw(&Sha1::digest(encoded).into())
    }

    pub fn from_raw(raw: &[u8; RAW_OBJECT_ID_LENGTH]) -> Self {
        Self(raw.iter().map(|byte| format!("{byte:02x}")).collect())
    }

    pub fn to_raw(&self) -> [u8; RAW_OBJECT_ID_LENGTH] {
        let mut raw = [0; RAW_OBJECT_ID_LENGTH];
        for (byte, pair) in raw.iter_mut().zip(self.0.as_bytes().chunks_exact(2)) {
            // validated as hex digits on construction
            *byte = (hex_value(pair[0]) << 4) | hex_value(pair[1]);
        }
        raw
    }

    /// `ab/cdef...`, the loose object location below `objects/`
    pub fn to_path(&self) -> PathBuf {
        let (dir, file) = self.0.split_at(2);
        PathBuf::from(dir).join(file)
    }

    pub fn to_short_oid(&self) -> String {
        self.0[..7].to_string()
    }
}

fn hex_value(digit: u8) -> u8 {
    match digit {
        b'0'..=b'9' => digit - b'0',
        b'a'..=b'f' => digit - b'a' + 10,
        _ => 0,
    }
}

impl AsRef<str> for ObjectId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ObjectId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
