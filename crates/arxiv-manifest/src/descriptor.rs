//! Parsed metadata for one top-level source archive.

use serde::{Deserialize, Serialize};

use crate::release::ReleaseMonth;

// ---------------------------------------------------------------------------
// ArchiveDescriptor
// ---------------------------------------------------------------------------

/// One `file` entry of the manifest.
///
/// Each descriptor names a top-level archive holding a contiguous run of
/// `item_count` papers. Descriptors are ordered chronologically by
/// [`sort_key`](Self::sort_key).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArchiveDescriptor {
    /// Path of the archive, relative to the corpus root (e.g.
    /// `"src/arXiv_src_9107_001.tar"`).
    pub filename: String,
    /// Number of papers contained in the archive.
    pub item_count: u64,
    /// Disambiguates archives released in the same month.
    pub sequence_number: u32,
    /// The raw four-digit `YYMM` code as it appeared in the manifest.
    pub yymm: String,
    /// Four-digit release year derived from `yymm`.
    pub year: i32,
    /// Release month derived from `yymm`, 1..=12.
    pub month: u32,
    /// Identifier of the first paper in the archive, if listed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_item: Option<String>,
    /// Identifier of the last paper in the archive, if listed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_item: Option<String>,
    /// Archive size in bytes, if listed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
    /// MD5 checksum of the archive, if listed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub md5sum: Option<String>,
}

impl ArchiveDescriptor {
    /// Build a descriptor from the four required manifest fields.
    pub fn new(
        filename: impl Into<String>,
        item_count: u64,
        sequence_number: u32,
        yymm: impl Into<String>,
        release: ReleaseMonth,
    ) -> Self {
        Self {
            filename: filename.into(),
            item_count,
            sequence_number,
            yymm: yymm.into(),
            year: release.year,
            month: release.month,
            first_item: None,
            last_item: None,
            size: None,
            md5sum: None,
        }
    }

    /// The release month of this archive.
    pub fn release(&self) -> ReleaseMonth {
        ReleaseMonth {
            year: self.year,
            month: self.month,
        }
    }

    /// Chronological sort key: `(year, month, sequence_number)`.
    pub fn sort_key(&self) -> (i32, u32, u32) {
        (self.year, self.month, self.sequence_number)
    }
}

/// Sort descriptors chronologically in place.
///
/// The filename breaks ties between entries sharing a sort key, so the result
/// does not depend on the order the entries arrived in.
pub fn sort_chronologically(descriptors: &mut [ArchiveDescriptor]) {
    descriptors.sort_by(|a, b| {
        a.sort_key()
            .cmp(&b.sort_key())
            .then_with(|| a.filename.cmp(&b.filename))
    });
}
