use crate::artifacts::objects::entry_mode::FileMode;
use crate::artifacts::sources::{Source, SourceEntry, expand_home};
use crate::errors::ImportError;
use anyhow::Context;
use bzip2::read::MultiBzDecoder;
use flate2::read::MultiGzDecoder;
use std::cell::RefCell;
use std::collections::HashMap;
use std::fs::File;
use std::io::{Cursor, Read, Seek, SeekFrom};
use tar::EntryType;
use xz2::read::XzDecoder;

const GZIP_MAGIC: &[u8] = &[0x1f, 0x8b];
const BZIP2_MAGIC: &[u8] = b"BZh";
const XZ_MAGIC: &[u8] = &[0xfd, b'7', b'z', b'X', b'Z', 0x00];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Compression {
    None,
    Gzip,
    Bzip2,
    Xz,
}

impl Compression {
    fn detect(magic: &[u8]) -> Self {
        if magic.starts_with(GZIP_MAGIC) {
            Compression::Gzip
        } else if magic.starts_with(BZIP2_MAGIC) {
            Compression::Bzip2
        } else if magic.starts_with(XZ_MAGIC) {
            Compression::Xz
        } else {
            Compression::None
        }
    }

    /// Decompress every concatenated stream of `file`
    fn decompress(self, file: File) -> std::io::Result<Vec<u8>> {
        let mut decoder: Box<dyn Read> = match self {
            Compression::None => Box::new(file),
            Compression::Gzip => Box::new(MultiGzDecoder::new(file)),
            Compression::Bzip2 => Box::new(MultiBzDecoder::new(file)),
            Compression::Xz => Box::new(XzDecoder::new_multi_decoder(file)),
        };

        let mut content = Vec::new();
        decoder.read_to_end(&mut content)?;
        Ok(content)
    }
}

trait ArchiveReader: Read + Seek {}

impl<T: Read + Seek> ArchiveReader for T {}

#[derive(Debug, Clone)]
enum MemberKind {
    File,
    HardLink(String),
    Symlink(Vec<u8>),
    Unsupported(String),
}

#[derive(Debug, Clone)]
struct Member {
    name: String,
    kind: MemberKind,
    mode: u32,
    position: u64,
    size: u64,
}

/// A plain, gzip, bzip2 or xz compressed tar archive
///
/// Members are indexed once when the archive is opened; fetching seeks straight to
/// the member data. Hard links resolve to the content of their target member.
pub struct TarSource {
    origin: String,
    reader: RefCell<Box<dyn ArchiveReader>>,
    members: Vec<Member>,
    by_name: HashMap<String, usize>,
}

impl std::fmt::Debug for TarSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TarSource")
            .field("origin", &self.origin)
            .field("members", &self.members)
            .finish()
    }
}

impl TarSource {
    pub fn open(path: &std::path::Path) -> anyhow::Result<Self> {
        let origin = path.display().to_string();
        let mut file = File::open(path).with_context(|| format!("cannot open {origin}"))?;

        let mut magic = Vec::with_capacity(XZ_MAGIC.len());
        (&mut file)
            .take(XZ_MAGIC.len() as u64)
            .read_to_end(&mut magic)
            .with_context(|| format!("cannot read {origin}"))?;
        file.rewind()?;

        let mut reader: Box<dyn ArchiveReader> = match Compression::detect(&magic) {
            Compression::None => Box::new(file),
            compression => {
                let content = compression
                    .decompress(file)
                    .with_context(|| format!("cannot decompress {origin}"))?;
                Box::new(Cursor::new(content))
            }
        };

        let members = Self::scan(&mut reader).with_context(|| format!("cannot read {origin}"))?;
        let by_name = members
            .iter()
            .enumerate()
            .map(|(index, member)| (member_key(&member.name).to_string(), index))
            .collect();

        Ok(Self {
            origin,
            reader: RefCell::new(reader),
            members,
            by_name,
        })
    }

    fn scan(reader: &mut Box<dyn ArchiveReader>) -> anyhow::Result<Vec<Member>> {
        let mut archive = tar::Archive::new(reader);
        let mut members = Vec::new();

        for entry in archive.entries_with_seek()? {
            let entry = entry?;
            let header = entry.header();
            let entry_type = header.entry_type();

            let link_name = || {
                entry
                    .link_name_bytes()
                    .map(|name| name.into_owned())
                    .unwrap_or_default()
            };
            let name = String::from_utf8(entry.path_bytes().into_owned())
                .context("member name is not valid UTF-8")?;

            let kind = match entry_type {
                EntryType::Directory | EntryType::XGlobalHeader => continue,
                // old-style archives mark directories as regular members ending in `/`
                EntryType::Regular | EntryType::Continuous if name.ends_with('/') => continue,
                EntryType::Regular | EntryType::Continuous => MemberKind::File,
                EntryType::Link => {
                    MemberKind::HardLink(String::from_utf8_lossy(&link_name()).into_owned())
                }
                EntryType::Symlink => MemberKind::Symlink(link_name()),
                EntryType::Fifo => MemberKind::Unsupported("fifo".to_string()),
                EntryType::Char => MemberKind::Unsupported("character device".to_string()),
                EntryType::Block => MemberKind::Unsupported("block device".to_string()),
                other => MemberKind::Unsupported(format!("member type {other:?}")),
            };
            let mode = header
                .mode()
                .with_context(|| format!("invalid mode field for member {name}"))?;

            members.push(Member {
                name,
                kind,
                mode,
                position: entry.raw_file_position(),
                size: entry.size(),
            });
        }

        Ok(members)
    }

    fn member(&self, name: &str) -> anyhow::Result<&Member> {
        self.by_name
            .get(member_key(name))
            .map(|&index| &self.members[index])
            .with_context(|| format!("{name} is not a member of {}", self.origin))
    }

    fn read_data(&self, member: &Member) -> anyhow::Result<Vec<u8>> {
        let mut reader = self.reader.borrow_mut();
        reader.seek(SeekFrom::Start(member.position))?;

        let mut content = Vec::new();
        (&mut **reader)
            .take(member.size)
            .read_to_end(&mut content)
            .with_context(|| format!("cannot read {} from {}", member.name, self.origin))?;

        Ok(content)
    }
}

/// Lookup key of a member name, tolerant to a leading `./`
fn member_key(name: &str) -> &str {
    name.trim_start_matches("./")
}

impl Source for TarSource {
    fn origin(&self) -> &str {
        &self.origin
    }

    fn enumerate(&self) -> Box<dyn Iterator<Item = anyhow::Result<String>> + '_> {
        Box::new(self.members.iter().map(|member| match &member.kind {
            MemberKind::Unsupported(kind) => Err(ImportError::UnsupportedEntry {
                origin: self.origin.clone(),
                path: member.name.clone(),
                kind: kind.clone(),
            }
            .into()),
            _ => Ok(member.name.clone()),
        }))
    }

    fn fetch(&self, path: &str) -> anyhow::Result<SourceEntry> {
        let member = self.member(path)?;
        let mode = FileMode::from_permission_bits(member.mode);

        match &member.kind {
            MemberKind::File => Ok(SourceEntry::new(mode, self.read_data(member)?)),
            MemberKind::HardLink(target) => {
                let target_member = self.member(target)?;
                if !matches!(target_member.kind, MemberKind::File) {
                    anyhow::bail!(
                        "hard link {} in {} points to {target}, which is not a regular file",
                        member.name,
                        self.origin
                    );
                }
                Ok(SourceEntry::new(mode, self.read_data(target_member)?))
            }
            MemberKind::Symlink(target) => Ok(SourceEntry::new(FileMode::Symlink, target.clone())),
            MemberKind::Unsupported(kind) => Err(ImportError::UnsupportedEntry {
                origin: self.origin.clone(),
                path: member.name.clone(),
                kind: kind.clone(),
            }
            .into()),
        }
    }
}

/// Factory for `tar:` specs
pub fn open(location: &str) -> anyhow::Result<Vec<Box<dyn Source>>> {
    let path = expand_home(location)?;

    Ok(vec![Box::new(TarSource::open(&path)?)])
}
