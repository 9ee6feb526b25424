//! Release-month derivation for arXiv archive codes.
//!
//! arXiv names every source archive after the month it was released in, as a
//! four-digit `YYMM` code. The two-digit year is ambiguous: the archive starts
//! in 1991, so `91`..`99` belong to the 1900s while `00` onwards belong to the
//! 2000s. The split point (the *pivot*) is derived from the current calendar
//! year every time a manifest is parsed, so codes for the running year always
//! resolve to the 2000s:
//!
//! - fragment `<= pivot` -> `2000 + fragment`
//! - fragment `>  pivot` -> `1900 + fragment`
//!
//! where `pivot = current_year - 2000`.
//!
//! # Example
//!
//! ```
//! use arxiv_manifest::release::ReleaseMonth;
//!
//! let release = ReleaseMonth::from_yymm("9911", 25).unwrap();
//! assert_eq!((release.year, release.month), (1999, 11));
//!
//! let release = ReleaseMonth::from_yymm("2305", 25).unwrap();
//! assert_eq!((release.year, release.month), (2023, 5));
//! ```

use chrono::Datelike;
use serde::{Deserialize, Serialize};

use crate::ManifestError;

/// The two-digit year pivot for the current calendar year.
///
/// Recomputed on every call; callers parsing a manifest fetch it once per
/// parse so a single manifest is never split across two pivots.
pub fn current_pivot() -> u32 {
    let year = chrono::Utc::now().year();
    (year - 2000).clamp(0, 99) as u32
}

/// Expand a two-digit year fragment into a four-digit year around `pivot`.
pub fn expand_year(fragment: u32, pivot: u32) -> i32 {
    if fragment <= pivot {
        2000 + fragment as i32
    } else {
        1900 + fragment as i32
    }
}

// ---------------------------------------------------------------------------
// ReleaseMonth
// ---------------------------------------------------------------------------

/// A calendar month in which an archive was released.
///
/// Ordering is chronological: year first, then month.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ReleaseMonth {
    /// Four-digit year.
    pub year: i32,
    /// Month of the year, 1..=12.
    pub month: u32,
}

impl ReleaseMonth {
    /// Parse a four-digit `YYMM` code using an explicit year pivot.
    ///
    /// Fails with [`ManifestError::InvalidYearMonth`] if the code is not
    /// exactly four ASCII digits or the month is outside 1..=12.
    pub fn from_yymm(yymm: &str, pivot: u32) -> Result<Self, ManifestError> {
        let invalid = || ManifestError::InvalidYearMonth {
            value: yymm.to_owned(),
        };

        if yymm.len() != 4 || !yymm.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid());
        }

        let fragment: u32 = yymm[..2].parse().map_err(|_| invalid())?;
        let month: u32 = yymm[2..].parse().map_err(|_| invalid())?;
        if !(1..=12).contains(&month) {
            return Err(invalid());
        }

        Ok(Self {
            year: expand_year(fragment, pivot),
            month,
        })
    }

    /// Parse a `YYMM` code against the pivot for the current calendar year.
    pub fn from_yymm_now(yymm: &str) -> Result<Self, ManifestError> {
        Self::from_yymm(yymm, current_pivot())
    }
}

impl std::fmt::Display for ReleaseMonth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
