//! Top-level archive helpers: listing per-paper entries and ordering archive
//! files by release date.
//!
//! Top-level archives are plain (uncompressed) tar files, so their entry
//! headers can be walked with seeks instead of reading every payload. Each
//! listed [`Member`] remembers where its data starts, letting callers read a
//! single entry later without re-walking the archive.

use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::Path;

use arxiv_manifest::release::ReleaseMonth;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::CorpusError;

static ARCHIVE_NAME: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^arXiv_src_(\d{2}\d{2})_(\d{3})\.tar$").expect("invalid archive name pattern")
});

// ---------------------------------------------------------------------------
// Archive filename ordering
// ---------------------------------------------------------------------------

/// Chronological key parsed from an `arXiv_src_YYMM_NNN.tar` filename.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ArchiveKey {
    /// Four-digit release year, or 0 for unparsable names.
    pub year: i32,
    /// Release month, or 0 for unparsable names.
    pub month: u32,
    /// Sequence number within the month, or 0 for unparsable names.
    pub sequence: u32,
}

impl ArchiveKey {
    /// Key assigned to filenames that do not follow the naming convention.
    /// Sorts before every real archive.
    pub const SENTINEL: ArchiveKey = ArchiveKey {
        year: 0,
        month: 0,
        sequence: 0,
    };
}

/// Parse the chronological key from an archive filename.
///
/// Names that do not match `arXiv_src_YYMM_NNN.tar` (or carry an impossible
/// month) map to [`ArchiveKey::SENTINEL`] instead of failing.
pub fn archive_sort_key(filename: &str, pivot: u32) -> ArchiveKey {
    let Some(caps) = ARCHIVE_NAME.captures(filename) else {
        return ArchiveKey::SENTINEL;
    };
    let Ok(release) = ReleaseMonth::from_yymm(&caps[1], pivot) else {
        return ArchiveKey::SENTINEL;
    };
    let Ok(sequence) = caps[2].parse() else {
        return ArchiveKey::SENTINEL;
    };
    ArchiveKey {
        year: release.year,
        month: release.month,
        sequence,
    }
}

/// Sort archive filenames chronologically, falling back to the name itself
/// for equal keys. Reverses the final order if `reverse` is set.
pub fn sort_archive_names(names: &mut [String], pivot: u32, reverse: bool) {
    names.sort_by_cached_key(|name| (archive_sort_key(name, pivot), name.clone()));
    if reverse {
        names.reverse();
    }
}

// ---------------------------------------------------------------------------
// Member listing
// ---------------------------------------------------------------------------

/// One entry of a top-level archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Member {
    /// Entry path as stored in the tar header.
    pub name: String,
    /// Byte offset of the entry data within the archive file.
    pub data_offset: u64,
    /// Size of the entry data in bytes.
    pub size: u64,
}

/// Open a top-level archive, mapping a missing file to
/// [`CorpusError::NotFound`].
pub fn open_archive(path: &Path) -> Result<File, CorpusError> {
    File::open(path).map_err(|e| CorpusError::io(path, e))
}

/// List the entries of an open archive whose names satisfy `keep`, sorted
/// lexicographically by name. Returns the file handle for follow-up reads.
pub fn list_members(
    file: File,
    path: &Path,
    keep: impl Fn(&str) -> bool,
) -> Result<(File, Vec<Member>), CorpusError> {
    let mut archive = tar::Archive::new(file);
    let mut members = Vec::new();

    {
        let entries = archive
            .entries_with_seek()
            .map_err(|e| CorpusError::io(path, e))?;
        for entry in entries {
            let entry = entry.map_err(|e| CorpusError::io(path, e))?;
            let name = String::from_utf8_lossy(&entry.path_bytes()).into_owned();
            if !keep(&name) {
                continue;
            }
            members.push(Member {
                name,
                data_offset: entry.raw_file_position(),
                size: entry.size(),
            });
        }
    }

    members.sort_by(|a, b| a.name.cmp(&b.name));
    Ok((archive.into_inner(), members))
}

/// Upper bound on the up-front buffer reservation in [`read_member`].
const MAX_RESERVE: u64 = 1 << 20;

/// Read the data of one listed member.
pub fn read_member(file: &mut File, member: &Member) -> std::io::Result<Vec<u8>> {
    file.seek(SeekFrom::Start(member.data_offset))?;
    // Header sizes are untrusted; the buffer grows past this as data arrives.
    let reserve = member.size.min(MAX_RESERVE) as usize;
    let mut data = Vec::with_capacity(reserve);
    file.by_ref().take(member.size).read_to_end(&mut data)?;
    if (data.len() as u64) < member.size {
        return Err(std::io::Error::new(
            std::io::ErrorKind::UnexpectedEof,
            format!("entry '{}' truncated", member.name),
        ));
    }
    Ok(data)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
