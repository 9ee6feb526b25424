//! The capability contract a host data pipeline wraps.
//!
//! Anything that can report its length and fetch an item by (possibly
//! negative) index can be adapted into a framework's map-style dataset.
//! Batching, shuffling and splitting stay on the host side.

use crate::CorpusError;

/// A finite, randomly addressable collection of items.
pub trait IndexedDataset {
    /// The item produced for an index.
    type Item;

    /// Number of items.
    fn len(&self) -> u64;

    /// Returns `true` if the dataset holds no items.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Fetch the item at `index`. Negative indices count from the end.
    fn item_at(&self, index: i64) -> Result<Self::Item, CorpusError>;
}
