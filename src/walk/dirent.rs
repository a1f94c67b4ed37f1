//! Raw directory record parsing
//!
//! The kernel fills the enumeration buffer with packed, variable-length
//! records whose layout differs per platform:
//!
//! - Linux `linux_dirent64`: `d_ino` (8) + `d_off` (8) + `d_reclen` (2) +
//!   `d_type` (1) + null-terminated `d_name`.
//! - macOS `dirent` (from `man dirent`): `d_ino` (8) + `d_seekoff` (8) +
//!   `d_reclen` (2) + `d_namlen` (2) + `d_type` (1) + `d_name[1024]`.
//!
//! Every fixed field is read through a bounds-checked helper against the
//! number of valid bytes in the buffer, and the name bytes are copied out
//! immediately: the caller reuses the buffer on the next enumeration call,
//! so no parsed value may reference it.

use crate::error::RecordFault;

/// Header bytes before the name field on Linux
#[cfg(target_os = "linux")]
pub const RECORD_HEADER_LEN: usize = 19;

/// Header bytes before the name field on macOS
#[cfg(target_os = "macos")]
pub const RECORD_HEADER_LEN: usize = 21;

/// Maximum width of the macOS name field, per `man dirent`
#[cfg(target_os = "macos")]
const NAME_FIELD_MAX: usize = 1024;

/// Kind of a directory entry, from the kernel's `d_type` code
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryType {
    /// Regular file
    File,
    /// Directory (the only type that triggers recursion)
    Directory,
    /// Symbolic link (never followed)
    Symlink,
    /// Anything else, including DT_UNKNOWN
    Other,
}

impl EntryType {
    pub fn from_dtype(code: u8) -> Self {
        match code {
            libc::DT_REG => EntryType::File,
            libc::DT_DIR => EntryType::Directory,
            libc::DT_LNK => EntryType::Symlink,
            _ => EntryType::Other,
        }
    }
}

/// One parsed, validated directory entry
///
/// Fully self-contained: `name` and `path` own their bytes, nothing borrows
/// from the enumeration buffer.
#[derive(Debug, Clone)]
pub struct Entry {
    /// Inode number from the record; never 0 (deleted-but-present records
    /// are dropped by the parser)
    pub inode: u64,

    /// Entry kind as reported by the kernel
    pub file_type: EntryType,

    /// Base name bytes, exactly as the kernel returned them
    pub name: Vec<u8>,

    /// Full path, `parent + "/" + name`, built once at parse time
    pub path: String,
}

/// Outcome of parsing one record offset
#[derive(Debug)]
pub enum Parsed {
    /// A validated entry plus the offset of the next record
    Entry { entry: Entry, next: usize },

    /// A well-formed record that must not be forwarded (inode 0, "." or
    /// ".."), plus the offset of the next record
    Skip { next: usize },

    /// No complete record remains in the valid region
    End,
}

/// Join a parent path and a raw name into a full path.
///
/// Simple string concatenation by design; the only normalization is not
/// doubling the separator when the parent already ends in one.
pub fn join_path(parent: &str, name: &[u8]) -> String {
    let name = String::from_utf8_lossy(name);
    if parent.ends_with('/') {
        format!("{parent}{name}")
    } else {
        format!("{parent}/{name}")
    }
}

fn is_reserved_name(name: &[u8]) -> bool {
    name == b"." || name == b".."
}

fn read_u64(buf: &[u8], offset: usize) -> Option<u64> {
    buf.get(offset..offset + 8).map(|b| {
        let mut raw = [0u8; 8];
        raw.copy_from_slice(b);
        u64::from_ne_bytes(raw)
    })
}

fn read_u16(buf: &[u8], offset: usize) -> Option<u16> {
    buf.get(offset..offset + 2).map(|b| {
        let mut raw = [0u8; 2];
        raw.copy_from_slice(b);
        u16::from_ne_bytes(raw)
    })
}

/// Parse one record at `offset` within the first `valid` bytes of `buf`.
///
/// Field layout (Linux `linux_dirent64`):
///
/// | offset | width | field    |
/// |--------|-------|----------|
/// | 0      | 8     | d_ino    |
/// | 8      | 8     | d_off    |
/// | 16     | 2     | d_reclen |
/// | 18     | 1     | d_type   |
/// | 19     | ..    | d_name (null-terminated, padded to d_reclen) |
///
/// A name field with no terminator is accepted at its full width.
#[cfg(target_os = "linux")]
pub fn parse_record(
    buf: &[u8],
    offset: usize,
    valid: usize,
    parent_path: &str,
) -> Result<Parsed, RecordFault> {
    debug_assert!(valid <= buf.len());

    // The kernel never splits a record across calls; trailing bytes that
    // cannot hold a header mean the valid region is exhausted.
    if offset + RECORD_HEADER_LEN > valid {
        return Ok(Parsed::End);
    }

    let reclen = read_u16(buf, offset + 16).ok_or(RecordFault {
        offset,
        reason: "record header out of bounds",
    })? as usize;

    if reclen == 0 {
        return Err(RecordFault {
            offset,
            reason: "zero record length",
        });
    }
    if reclen < RECORD_HEADER_LEN {
        return Err(RecordFault {
            offset,
            reason: "record length smaller than header",
        });
    }
    if offset + reclen > valid {
        return Err(RecordFault {
            offset,
            reason: "record length exceeds valid bytes",
        });
    }

    let next = offset + reclen;

    let inode = read_u64(buf, offset).ok_or(RecordFault {
        offset,
        reason: "inode field out of bounds",
    })?;
    // Deleted but not yet purged from the directory; must never be forwarded
    if inode == 0 {
        return Ok(Parsed::Skip { next });
    }

    let dtype = buf[offset + 18];

    // Name runs from the end of the header to the first NUL, capped at the
    // record boundary.
    let name_field = &buf[offset + RECORD_HEADER_LEN..next];
    let name_len = name_field
        .iter()
        .position(|&b| b == 0)
        .unwrap_or(name_field.len());
    let name = &name_field[..name_len];

    if name.is_empty() || is_reserved_name(name) {
        return Ok(Parsed::Skip { next });
    }

    Ok(Parsed::Entry {
        entry: Entry {
            inode,
            file_type: EntryType::from_dtype(dtype),
            name: name.to_vec(),
            path: join_path(parent_path, name),
        },
        next,
    })
}

/// Parse one record at `offset` within the first `valid` bytes of `buf`.
///
/// Field layout (macOS `dirent`):
///
/// | offset | width | field     |
/// |--------|-------|-----------|
/// | 0      | 8     | d_ino     |
/// | 8      | 8     | d_seekoff |
/// | 16     | 2     | d_reclen  |
/// | 18     | 2     | d_namlen  |
/// | 20     | 1     | d_type    |
/// | 21     | ..    | d_name (length-prefixed, up to 1024 bytes) |
///
/// The declared name length is trusted only when the whole name lies inside
/// the valid region.
#[cfg(target_os = "macos")]
pub fn parse_record(
    buf: &[u8],
    offset: usize,
    valid: usize,
    parent_path: &str,
) -> Result<Parsed, RecordFault> {
    debug_assert!(valid <= buf.len());

    if offset + RECORD_HEADER_LEN > valid {
        return Ok(Parsed::End);
    }

    let reclen = read_u16(buf, offset + 16).ok_or(RecordFault {
        offset,
        reason: "record header out of bounds",
    })? as usize;

    if reclen == 0 {
        return Err(RecordFault {
            offset,
            reason: "zero record length",
        });
    }
    if reclen < RECORD_HEADER_LEN {
        return Err(RecordFault {
            offset,
            reason: "record length smaller than header",
        });
    }
    if offset + reclen > valid {
        return Err(RecordFault {
            offset,
            reason: "record length exceeds valid bytes",
        });
    }

    let next = offset + reclen;

    let inode = read_u64(buf, offset).ok_or(RecordFault {
        offset,
        reason: "inode field out of bounds",
    })?;
    if inode == 0 {
        return Ok(Parsed::Skip { next });
    }

    let namlen = read_u16(buf, offset + 18).ok_or(RecordFault {
        offset,
        reason: "name length field out of bounds",
    })? as usize;
    if namlen > NAME_FIELD_MAX {
        return Err(RecordFault {
            offset,
            reason: "name length exceeds field width",
        });
    }
    if offset + RECORD_HEADER_LEN + namlen > valid {
        return Err(RecordFault {
            offset,
            reason: "name extends past valid bytes",
        });
    }

    let dtype = buf[offset + 20];
    let name = &buf[offset + RECORD_HEADER_LEN..offset + RECORD_HEADER_LEN + namlen];

    if name.is_empty() || is_reserved_name(name) {
        return Ok(Parsed::Skip { next });
    }

    Ok(Parsed::Entry {
        entry: Entry {
            inode,
            file_type: EntryType::from_dtype(dtype),
            name: name.to_vec(),
            path: join_path(parent_path, name),
        },
        next,
    })
}
