//! Cumulative-count index over the sorted archive descriptors.
//!
//! [`ManifestIndex`] owns the chronologically sorted descriptor list and the
//! prefix sums of their item counts. A global paper index `i` belongs to the
//! first archive whose cumulative range `[before, before + item_count)`
//! contains `i`; its offset inside that archive is `i - before`.
//!
//! # Derived state
//!
//! The prefix sums and the total count are derived data. They are computed in
//! the same step that installs a descriptor list -- at construction and on
//! every [`reload`](ManifestIndex::reload) -- so a stale total can never be
//! observed after the manifest changes.
//!
//! # Example
//!
//! ```
//! use arxiv_manifest::index::{normalize_index, ManifestIndex};
//!
//! let xml = r#"<arXiv_src>
//!   <file><filename>a.tar</filename><num_items>3</num_items><seq_num>1</seq_num><yymm>2301</yymm></file>
//!   <file><filename>b.tar</filename><num_items>2</num_items><seq_num>1</seq_num><yymm>2302</yymm></file>
//! </arXiv_src>"#;
//! let index = ManifestIndex::from_xml(xml).unwrap();
//!
//! // Python-style negative indexing resolves against the total count.
//! let last = normalize_index(-1, index.total_count()).unwrap();
//! let location = index.locate(last).unwrap();
//! assert_eq!(location.descriptor.filename, "b.tar");
//! assert_eq!(location.offset, 1);
//! ```

use std::ops::Range;
use std::path::Path;

use crate::descriptor::{sort_chronologically, ArchiveDescriptor};
use crate::parse::{parse_manifest, parse_manifest_with_pivot};
use crate::ManifestError;

// ---------------------------------------------------------------------------
// Location
// ---------------------------------------------------------------------------

/// The archive owning a global index, and the offset inside it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Location<'a> {
    /// The descriptor of the owning archive.
    pub descriptor: &'a ArchiveDescriptor,
    /// Position of the descriptor in chronological order.
    pub position: usize,
    /// Offset of the item within the archive.
    pub offset: u64,
}

// ---------------------------------------------------------------------------
// ManifestIndex
// ---------------------------------------------------------------------------

/// Immutable, chronologically ordered index over a manifest.
///
/// The index is `Send + Sync`: it never changes after construction except
/// through [`reload`](Self::reload), which requires exclusive access.
#[derive(Debug, Clone)]
pub struct ManifestIndex {
    /// Descriptors sorted by `(year, month, sequence_number)`.
    descriptors: Vec<ArchiveDescriptor>,
    /// `ends[i]` is the cumulative item count through descriptor `i`.
    ends: Vec<u64>,
    /// Sum of all item counts.
    total: u64,
    /// BLAKE3 hex digest of the manifest text this index was built from.
    digest: String,
}

impl ManifestIndex {
    /// Parse manifest XML with the year pivot for the current calendar year.
    pub fn from_xml(xml: &str) -> Result<Self, ManifestError> {
        let descriptors = parse_manifest(xml)?;
        Self::build(descriptors, digest_of(xml))
    }

    /// Parse manifest XML with an explicit two-digit year pivot.
    pub fn from_xml_with_pivot(xml: &str, pivot: u32) -> Result<Self, ManifestError> {
        let descriptors = parse_manifest_with_pivot(xml, pivot)?;
        Self::build(descriptors, digest_of(xml))
    }

    /// Build an index from already-parsed descriptors.
    ///
    /// The descriptors are sorted chronologically; their input order does not
    /// matter. The digest covers the JSON form of the sorted list. Fails with
    /// [`ManifestError::CountOverflow`] if the item counts do not fit a `u64`.
    pub fn from_descriptors(
        mut descriptors: Vec<ArchiveDescriptor>,
    ) -> Result<Self, ManifestError> {
        sort_chronologically(&mut descriptors);
        let digest = serde_json::to_vec(&descriptors)
            .map(|bytes| blake3::hash(&bytes).to_hex().to_string())
            .unwrap_or_default();
        Self::build(descriptors, digest)
    }

    /// Read and parse a manifest file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ManifestError> {
        let path = path.as_ref();
        let xml = std::fs::read_to_string(path).map_err(|source| ManifestError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let index = Self::from_xml(&xml)?;
        tracing::info!(
            path = %path.display(),
            archives = index.len(),
            total = index.total,
            "loaded manifest"
        );
        Ok(index)
    }

    /// Replace the descriptor list with a freshly parsed manifest.
    ///
    /// Prefix sums and the total count are recomputed as part of the swap. On
    /// a parse failure the current state is left untouched. Returns `true` if
    /// the manifest text differs from the one currently loaded.
    pub fn reload(&mut self, xml: &str) -> Result<bool, ManifestError> {
        let fresh = Self::from_xml(xml)?;
        let changed = fresh.digest != self.digest;
        if changed {
            tracing::info!(
                archives = fresh.len(),
                total = fresh.total,
                previous_total = self.total,
                "manifest reloaded"
            );
        } else {
            tracing::debug!("manifest reload: content unchanged");
        }
        *self = fresh;
        Ok(changed)
    }

    fn build(
        descriptors: Vec<ArchiveDescriptor>,
        digest: String,
    ) -> Result<Self, ManifestError> {
        let mut ends = Vec::with_capacity(descriptors.len());
        let mut total = 0u64;
        for d in &descriptors {
            total = total
                .checked_add(d.item_count)
                .ok_or_else(|| ManifestError::CountOverflow {
                    archive: d.filename.clone(),
                })?;
            ends.push(total);
        }
        Ok(Self {
            descriptors,
            ends,
            total,
            digest,
        })
    }

    /// Total number of items across every archive.
    pub fn total_count(&self) -> u64 {
        self.total
    }

    /// Number of archives in the manifest.
    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    /// Returns `true` if the manifest lists no archives.
    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }

    /// The descriptors in chronological order.
    pub fn descriptors(&self) -> &[ArchiveDescriptor] {
        &self.descriptors
    }

    /// BLAKE3 hex digest identifying the manifest content.
    pub fn digest(&self) -> &str {
        &self.digest
    }

    /// Iterate descriptors with the global index range each one owns.
    pub fn ranges(&self) -> impl Iterator<Item = (&ArchiveDescriptor, Range<u64>)> {
        self.descriptors
            .iter()
            .zip(&self.ends)
            .map(|(d, &end)| (d, end - d.item_count..end))
    }

    /// Find the archive owning `index` and the offset within it.
    ///
    /// Fails with [`ManifestError::OutOfRange`] if `index >= total_count()`.
    pub fn locate(&self, index: u64) -> Result<Location<'_>, ManifestError> {
        if index >= self.total {
            return Err(ManifestError::OutOfRange {
                index: i64::try_from(index).unwrap_or(i64::MAX),
                total: self.total,
            });
        }

        // First archive whose cumulative end lies past `index`. Zero-count
        // archives share their predecessor's end and are never selected.
        let position = self.ends.partition_point(|&end| end <= index);
        let descriptor = &self.descriptors[position];
        let before = self.ends[position] - descriptor.item_count;

        let location = Location {
            descriptor,
            position,
            offset: index - before,
        };
        tracing::trace!(
            index,
            archive = %descriptor.filename,
            offset = location.offset,
            "located item"
        );
        Ok(location)
    }
}

/// Resolve a possibly negative index against a collection of `len` items.
///
/// Negative indices count from the end (`-1` is the last item). Fails with
/// [`ManifestError::OutOfRange`] if the resolved index is negative or not
/// below `len`.
pub fn normalize_index(index: i64, len: u64) -> Result<u64, ManifestError> {
    let out_of_range = || ManifestError::OutOfRange { index, total: len };

    if index < 0 {
        let back = index.unsigned_abs();
        if back > len {
            return Err(out_of_range());
        }
        Ok(len - back)
    } else {
        let index = index as u64;
        if index >= len {
            return Err(out_of_range());
        }
        Ok(index)
    }
}

fn digest_of(xml: &str) -> String {
    blake3::hash(xml.as_bytes()).to_hex().to_string()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    const TWO_ARCHIVES: &str = r#"<arXiv_src>
      <file><filename>a.tar</filename><num_items>3</num_items><seq_num>1</seq_num><yymm>2301</yymm></file>
      <file><filename>b.tar</filename><num_items>2</num_items><seq_num>1</seq_num><yymm>2302</yymm></file>
    </arXiv_src>"#;

    fn two_archives() -> ManifestIndex {
        ManifestIndex::from_xml_with_pivot(TWO_ARCHIVES, 23).unwrap()
    }

    // -- 1. Totals ---------------------------------------------------------

    #[test]
    fn total_count_sums_item_counts() {
        let index = two_archives();
        assert_eq!(index.total_count(), 5);
        assert_eq!(index.len(), 2);
        assert!(!index.is_empty());
    }

    #[test]
    fn empty_manifest_has_zero_total() {
        let index = ManifestIndex::from_xml_with_pivot("<arXiv_src/>", 23).unwrap();
        assert_eq!(index.total_count(), 0);
        assert!(index.is_empty());
        assert!(matches!(
            index.locate(0),
            Err(ManifestError::OutOfRange { index: 0, total: 0 })
        ));
    }

    // -- 2. locate ---------------------------------------------------------

    #[test]
    fn locate_maps_into_first_archive() {
        let index = two_archives();
        for i in 0..3 {
            let loc = index.locate(i).unwrap();
            assert_eq!(loc.descriptor.filename, "a.tar");
            assert_eq!(loc.position, 0);
            assert_eq!(loc.offset, i);
        }
    }

    #[test]
    fn locate_maps_into_second_archive() {
        let index = two_archives();
        for i in 3..5 {
            let loc = index.locate(i).unwrap();
            assert_eq!(loc.descriptor.filename, "b.tar");
            assert_eq!(loc.position, 1);
            assert_eq!(loc.offset, i - 3);
        }
    }

    #[test]
    fn locate_past_end_fails() {
        let index = two_archives();
        let err = index.locate(5).unwrap_err();
        assert!(matches!(err, ManifestError::OutOfRange { index: 5, total: 5 }));
    }

    #[test]
    fn zero_count_archives_own_no_range() {
        let xml = r#"<arXiv_src>
          <file><filename>a.tar</filename><num_items>1</num_items><seq_num>1</seq_num><yymm>2301</yymm></file>
          <file><filename>empty.tar</filename><num_items>0</num_items><seq_num>2</seq_num><yymm>2301</yymm></file>
          <file><filename>c.tar</filename><num_items>1</num_items><seq_num>1</seq_num><yymm>2302</yymm></file>
        </arXiv_src>"#;
        let index = ManifestIndex::from_xml_with_pivot(xml, 23).unwrap();
        assert_eq!(index.locate(0).unwrap().descriptor.filename, "a.tar");
        let loc = index.locate(1).unwrap();
        assert_eq!(loc.descriptor.filename, "c.tar");
        assert_eq!(loc.position, 2);
        assert_eq!(loc.offset, 0);
    }

    #[test]
    fn ranges_cover_total_without_gaps() {
        let index = two_archives();
        let ranges: Vec<(String, Range<u64>)> = index
            .ranges()
            .map(|(d, r)| (d.filename.clone(), r))
            .collect();
        assert_eq!(
            ranges,
            vec![("a.tar".to_owned(), 0..3), ("b.tar".to_owned(), 3..5)]
        );
    }

    // -- 3. Negative index normalization -----------------------------------

    #[test]
    fn normalize_passes_through_in_range() {
        assert_eq!(normalize_index(0, 5).unwrap(), 0);
        assert_eq!(normalize_index(4, 5).unwrap(), 4);
    }

    #[test]
    fn normalize_wraps_negative_indices() {
        assert_eq!(normalize_index(-1, 5).unwrap(), 4);
        assert_eq!(normalize_index(-5, 5).unwrap(), 0);
    }

    #[test]
    fn normalize_rejects_out_of_range() {
        assert!(matches!(
            normalize_index(5, 5),
            Err(ManifestError::OutOfRange { index: 5, total: 5 })
        ));
        assert!(matches!(
            normalize_index(-6, 5),
            Err(ManifestError::OutOfRange { index: -6, total: 5 })
        ));
        assert!(normalize_index(i64::MIN, 5).is_err());
        assert!(normalize_index(-1, 0).is_err());
    }

    // -- 4. Reload ---------------------------------------------------------

    #[test]
    fn reload_recomputes_total() {
        let mut index = two_archives();
        assert_eq!(index.total_count(), 5);

        let bigger = r#"<arXiv_src>
          <file><filename>a.tar</filename><num_items>10</num_items><seq_num>1</seq_num><yymm>2301</yymm></file>
        </arXiv_src>"#;
        assert!(index.reload(bigger).unwrap());
        assert_eq!(index.total_count(), 10);
        assert_eq!(index.len(), 1);
        assert_eq!(index.locate(9).unwrap().offset, 9);
    }

    #[test]
    fn reload_with_identical_text_reports_unchanged() {
        let mut index = ManifestIndex::from_xml(TWO_ARCHIVES).unwrap();
        let digest = index.digest().to_owned();
        assert!(!index.reload(TWO_ARCHIVES).unwrap());
        assert_eq!(index.digest(), digest);
    }

    #[test]
    fn failed_reload_keeps_previous_state() {
        let mut index = two_archives();
        let digest = index.digest().to_owned();
        assert!(index.reload("<arXiv_src><file>").is_err());
        assert_eq!(index.total_count(), 5);
        assert_eq!(index.digest(), digest);
    }

    // -- 5. from_descriptors -----------------------------------------------

    #[test]
    fn from_descriptors_sorts_input() {
        let parsed = two_archives();
        let reversed: Vec<ArchiveDescriptor> = parsed.descriptors().iter().rev().cloned().collect();
        let index = ManifestIndex::from_descriptors(reversed).unwrap();
        assert_eq!(index.descriptors(), parsed.descriptors());
        assert_eq!(index.total_count(), 5);
    }

    // -- 6. Count overflow -------------------------------------------------

    #[test]
    fn overflowing_item_counts_are_rejected() {
        let xml = r#"<arXiv_src>
          <file><filename>a.tar</filename><num_items>18446744073709551615</num_items><seq_num>1</seq_num><yymm>2301</yymm></file>
          <file><filename>b.tar</filename><num_items>2</num_items><seq_num>1</seq_num><yymm>2302</yymm></file>
        </arXiv_src>"#;
        let err = ManifestIndex::from_xml_with_pivot(xml, 23).unwrap_err();
        assert!(
            matches!(err, ManifestError::CountOverflow { ref archive } if archive == "b.tar"),
            "{err:?}"
        );
    }

    #[test]
    fn maximal_single_count_is_accepted() {
        let xml = r#"<arXiv_src>
          <file><filename>a.tar</filename><num_items>18446744073709551615</num_items><seq_num>1</seq_num><yymm>2301</yymm></file>
        </arXiv_src>"#;
        let index = ManifestIndex::from_xml_with_pivot(xml, 23).unwrap();
        assert_eq!(index.total_count(), u64::MAX);
        assert_eq!(index.locate(u64::MAX - 1).unwrap().offset, u64::MAX - 1);
    }

    #[test]
    fn overflowing_reload_keeps_previous_state() {
        let mut index = two_archives();
        let huge = r#"<arXiv_src>
          <file><filename>a.tar</filename><num_items>18446744073709551615</num_items><seq_num>1</seq_num><yymm>2301</yymm></file>
          <file><filename>b.tar</filename><num_items>1</num_items><seq_num>2</seq_num><yymm>2301</yymm></file>
        </arXiv_src>"#;
        assert!(index.reload(huge).is_err());
        assert_eq!(index.total_count(), 5);
    }
}
