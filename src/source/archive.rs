//! File-backed named array archive.
//!
//! Layout (all integers little-endian):
//!
//! ```text
//! magic "GSHHS_ARRAYS" | version u8 | entry count u64
//! per entry: name len u32 | name | kind u8 | element count u64 | data offset u64
//! array data blocks
//! ```
//!
//! Reads seek straight to the requested slice, so opening a database only
//! costs the directory.

use super::{ArrayData, ArrayKind, ArraySource};
use crate::error::{GshhsError, Result};
use bytes::{Buf, BufMut, BytesMut};
use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use std::fs::{File, OpenOptions};
use std::io::{BufReader, BufWriter, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

const ARCHIVE_MAGIC: &[u8] = b"GSHHS_ARRAYS";
const ARCHIVE_VERSION: u8 = 1;
const MAX_NAME_LEN: usize = 1024;

/// Directory entry for one array.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArchiveVariable {
    pub kind: ArrayKind,
    pub len: usize,
    offset: u64,
}

/// Read-only handle to an archive on disk.
pub struct ArchiveFile {
    path: PathBuf,
    directory: FxHashMap<String, ArchiveVariable>,
    file: Mutex<File>,
}

impl ArchiveFile {
    /// Opens an archive and reads its directory.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let target = path.display().to_string();

        let file = File::open(&path).map_err(|e| GshhsError::open(&target, e))?;
        let mut reader = BufReader::new(file.try_clone()?);
        let directory = read_directory(&mut reader).map_err(|e| match e {
            GshhsError::Io(io) if io.kind() == std::io::ErrorKind::UnexpectedEof => {
                GshhsError::InvalidFormat(format!("{} has a truncated directory", target))
            }
            other => other,
        })?;

        log::debug!("Opened archive {} with {} arrays", target, directory.len());

        Ok(Self {
            path,
            directory,
            file: Mutex::new(file),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.directory.keys().map(String::as_str)
    }
}

impl ArraySource for ArchiveFile {
    type Variable = ArchiveVariable;

    fn select(&self, name: &str) -> Result<ArchiveVariable> {
        self.directory.get(name).copied().ok_or_else(|| {
            GshhsError::open(
                name,
                format!("no such variable in {}", self.path.display()),
            )
        })
    }

    fn extent(&self, var: &ArchiveVariable) -> usize {
        var.len
    }

    fn read_slice(&self, var: &ArchiveVariable, start: usize, count: usize) -> Result<ArrayData> {
        if start.checked_add(count).is_none_or(|end| end > var.len) {
            return Err(GshhsError::InvalidInput(format!(
                "slice {}..{} out of bounds for array of {}",
                start,
                start.saturating_add(count),
                var.len
            )));
        }

        let width = var.kind.width();
        let position = byte_end(var.offset, start, width).ok_or_else(|| {
            GshhsError::InvalidFormat(format!("slice at {} overflows the archive", start))
        })?;
        let mut raw = vec![0u8; count * width];
        {
            let mut file = self.file.lock();
            file.seek(SeekFrom::Start(position))
                .and_then(|_| file.read_exact(&mut raw))
                .map_err(|e| {
                    GshhsError::backend(format!("read {} bytes at {}", raw.len(), position), e)
                })?;
        }

        let mut cursor = raw.as_slice();
        Ok(match var.kind {
            ArrayKind::Short => {
                let mut values = Vec::with_capacity(count);
                while cursor.has_remaining() {
                    values.push(cursor.get_i16_le());
                }
                ArrayData::Short(values)
            }
            ArrayKind::Int => {
                let mut values = Vec::with_capacity(count);
                while cursor.has_remaining() {
                    values.push(cursor.get_i32_le());
                }
                ArrayData::Int(values)
            }
        })
    }
}

fn read_directory<R: Read>(reader: &mut R) -> Result<FxHashMap<String, ArchiveVariable>> {
    let mut magic = vec![0u8; ARCHIVE_MAGIC.len()];
    reader.read_exact(&mut magic)?;
    if magic != ARCHIVE_MAGIC {
        return Err(GshhsError::InvalidFormat("bad archive magic".into()));
    }

    let version = read_u8(reader)?;
    if version != ARCHIVE_VERSION {
        return Err(GshhsError::InvalidFormat(format!(
            "unsupported archive version {}",
            version
        )));
    }

    let entry_count = read_u64(reader)?;
    let mut directory = FxHashMap::default();
    for _ in 0..entry_count {
        let name_len = read_u32(reader)? as usize;
        if name_len > MAX_NAME_LEN {
            return Err(GshhsError::InvalidFormat(format!(
                "array name of {} bytes exceeds {}",
                name_len, MAX_NAME_LEN
            )));
        }
        let mut name_buf = vec![0u8; name_len];
        reader.read_exact(&mut name_buf)?;
        let name = String::from_utf8(name_buf)
            .map_err(|_| GshhsError::InvalidFormat("array name is not UTF-8".into()))?;

        let tag = read_u8(reader)?;
        let kind = ArrayKind::from_tag(tag).ok_or_else(|| {
            GshhsError::InvalidFormat(format!("array {} has unknown type tag {}", name, tag))
        })?;
        let len = read_u64(reader)?;
        let offset = read_u64(reader)?;
        let len = usize::try_from(len)
            .ok()
            .filter(|&len| byte_end(offset, len, kind.width()).is_some())
            .ok_or_else(|| {
                GshhsError::InvalidFormat(format!(
                    "array {} of {} values at {} overflows the archive",
                    name, len, offset
                ))
            })?;

        directory.insert(name, ArchiveVariable { kind, len, offset });
    }

    Ok(directory)
}

/// Builds an archive from in-memory arrays.
#[derive(Debug, Default)]
pub struct ArchiveWriter {
    arrays: Vec<(String, ArrayData)>,
}

impl ArchiveWriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an array, replacing any earlier array of the same name.
    pub fn array(mut self, name: &str, data: impl Into<ArrayData>) -> Self {
        self.arrays.retain(|(existing, _)| existing != name);
        self.arrays.push((name.to_string(), data.into()));
        self
    }

    /// Writes the archive atomically: a temporary sibling file is renamed into place.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let temp_path = temp_path(path);

        let file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(&temp_path)?;
        let mut writer = BufWriter::new(file);

        let header_len = ARCHIVE_MAGIC.len()
            + 1
            + 8
            + self
                .arrays
                .iter()
                .map(|(name, _)| 4 + name.len() + 1 + 8 + 8)
                .sum::<usize>();

        let mut header = BytesMut::with_capacity(header_len);
        header.put_slice(ARCHIVE_MAGIC);
        header.put_u8(ARCHIVE_VERSION);
        header.put_u64_le(self.arrays.len() as u64);

        let mut offset = header_len as u64;
        for (name, data) in &self.arrays {
            header.put_u32_le(name.len() as u32);
            header.put_slice(name.as_bytes());
            header.put_u8(data.kind().tag());
            header.put_u64_le(data.len() as u64);
            header.put_u64_le(offset);
            offset += (data.len() * data.kind().width()) as u64;
        }
        writer.write_all(&header)?;

        for (_, data) in &self.arrays {
            let mut block = BytesMut::with_capacity(data.len() * data.kind().width());
            match data {
                ArrayData::Short(values) => values.iter().for_each(|&v| block.put_i16_le(v)),
                ArrayData::Int(values) => values.iter().for_each(|&v| block.put_i32_le(v)),
            }
            writer.write_all(&block)?;
        }

        writer.flush()?;
        let file = writer.into_inner().map_err(|e| e.into_error())?;
        file.sync_all()?;
        drop(file);

        std::fs::rename(&temp_path, path)?;
        Ok(())
    }
}

/// Byte position `offset + index * width`, or `None` on overflow.
fn byte_end(offset: u64, index: usize, width: usize) -> Option<u64> {
    let bytes = u64::try_from(index.checked_mul(width)?).ok()?;
    offset.checked_add(bytes)
}

fn temp_path(path: &Path) -> PathBuf {
    let mut temp = path.to_path_buf();
    if let Some(name) = temp.file_name() {
        let mut new_name = name.to_string_lossy().into_owned();
        new_name.push_str(".tmp");
        temp.set_file_name(new_name);
    }
    temp
}

fn read_u8<R: Read>(reader: &mut R) -> Result<u8> {
    let mut buf = [0u8; 1];
    reader.read_exact(&mut buf)?;
    Ok(buf[0])
}

fn read_u32<R: Read>(reader: &mut R) -> Result<u32> {
    let mut buf = [0u8; 4];
    reader.read_exact(&mut buf)?;
    Ok(u32::from_le_bytes(buf))
}

fn read_u64<R: Read>(reader: &mut R) -> Result<u64> {
    let mut buf = [0u8; 8];
    reader.read_exact(&mut buf)?;
    Ok(u64::from_le_bytes(buf))
}
