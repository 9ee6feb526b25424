//! Bulk extraction of `main.tex` sources from nested archives.
//!
//! The arXiv bulk mirror nests every paper twice: a top-level
//! `arXiv_src_YYMM_NNN.tar` holds one gzip-compressed tarball per paper, and
//! each of those holds the paper's source files. [`ArchiveTextExtractor`]
//! walks this hierarchy in release order and yields the text of every member
//! named exactly `main.tex`.
//!
//! # Laziness
//!
//! [`TexRecords`] is a forward-only iterator. Top-level archives are opened
//! one at a time, only when the previous one is exhausted, and each is closed
//! before the next is opened. Per-paper tarballs are read into memory one at
//! a time. Keys start at 0 and increase by one per emitted record.
//!
//! # Failure policy
//!
//! A per-paper tarball that is not valid gzip or tar, or whose `main.tex` is
//! not UTF-8, is logged as a [`CorpusError::CorruptEntry`] and skipped; the
//! iteration carries on with the next entry. A top-level archive that cannot
//! be opened or listed is logged and skipped as a whole. Nothing is retried.
//!
//! # Distributing work
//!
//! [`ArchiveTextExtractor::archive_plan`] exposes the ordered archive list.
//! Callers wanting parallelism can split the plan and build one
//! [`TexRecords`] per slice with [`ArchiveTextExtractor::records_for`]; keys
//! are then local to each slice.

use std::collections::VecDeque;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use arxiv_manifest::release::current_pivot;
use flate2::read::GzDecoder;
use serde::{Deserialize, Serialize};

use crate::archive::{list_members, open_archive, read_member, sort_archive_names, Member};
use crate::config::CorpusConfig;
use crate::CorpusError;

// ---------------------------------------------------------------------------
// TexRecord
// ---------------------------------------------------------------------------

/// One extracted LaTeX source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TexRecord {
    /// The member name with its final three characters removed.
    pub id: String,
    /// The member content decoded as UTF-8.
    pub content: String,
    /// The per-paper entry of the top-level archive the member came from.
    pub source: String,
}

/// Counters describing an extraction pass so far.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractionStats {
    /// Top-level archives opened and listed.
    pub archives_opened: usize,
    /// Top-level archives that could not be opened or listed.
    pub archives_skipped: usize,
    /// Per-paper entries inspected.
    pub entries_scanned: usize,
    /// Per-paper entries skipped as corrupt.
    pub entries_skipped: usize,
    /// Records emitted.
    pub records: u64,
}

// ---------------------------------------------------------------------------
// ArchiveTextExtractor
// ---------------------------------------------------------------------------

/// Entry point for `main.tex` extraction.
#[derive(Debug, Clone)]
pub struct ArchiveTextExtractor {
    archive_extension: String,
    source_suffix: String,
    target_member: String,
}

impl ArchiveTextExtractor {
    /// Extractor using the suffixes and target member from `config`.
    pub fn new(config: &CorpusConfig) -> Self {
        Self {
            archive_extension: config.archive_extension.clone(),
            source_suffix: config.source_suffix.clone(),
            target_member: config.target_member.clone(),
        }
    }

    /// Top-level archives under `root` in release order.
    ///
    /// Hidden files and files without the archive extension are ignored.
    /// Names outside the `arXiv_src_YYMM_NNN.tar` convention sort first.
    pub fn archive_plan(&self, root: &Path, reverse: bool) -> Result<Vec<PathBuf>, CorpusError> {
        let dir = std::fs::read_dir(root).map_err(|e| CorpusError::io(root, e))?;

        let mut names = Vec::new();
        for entry in dir {
            let entry = entry.map_err(|e| CorpusError::io(root, e))?;
            let Some(name) = entry.file_name().to_str().map(str::to_owned) else {
                continue;
            };
            if name.starts_with('.') || !name.ends_with(self.archive_extension.as_str()) {
                continue;
            }
            if entry.path().is_file() {
                names.push(name);
            }
        }

        sort_archive_names(&mut names, current_pivot(), reverse);
        Ok(names.into_iter().map(|name| root.join(name)).collect())
    }

    /// Lazily extract every `main.tex` under `root`.
    pub fn extract(&self, root: &Path, reverse: bool) -> Result<TexRecords, CorpusError> {
        let plan = self.archive_plan(root, reverse)?;
        tracing::info!(
            root = %root.display(),
            archives = plan.len(),
            reverse,
            "starting extraction"
        );
        Ok(self.records_for(plan))
    }

    /// Lazily extract from an explicit list of top-level archives, in the
    /// order given.
    pub fn records_for(&self, archives: Vec<PathBuf>) -> TexRecords {
        TexRecords {
            pending: archives.into(),
            current: None,
            ready: VecDeque::new(),
            next_key: 0,
            source_suffix: self.source_suffix.clone(),
            target_member: self.target_member.clone(),
            stats: ExtractionStats::default(),
        }
    }
}

// ---------------------------------------------------------------------------
// TexRecords
// ---------------------------------------------------------------------------

/// The top-level archive currently being drained.
struct OpenArchive {
    path: PathBuf,
    file: File,
    members: std::vec::IntoIter<Member>,
}

/// Lazy, finite iterator of `(key, record)` pairs.
pub struct TexRecords {
    pending: VecDeque<PathBuf>,
    current: Option<OpenArchive>,
    ready: VecDeque<TexRecord>,
    next_key: u64,
    source_suffix: String,
    target_member: String,
    stats: ExtractionStats,
}

impl TexRecords {
    /// Counters for the records and entries seen so far.
    pub fn stats(&self) -> &ExtractionStats {
        &self.stats
    }

    fn open_next(&mut self, path: PathBuf) {
        let suffix = self.source_suffix.as_str();
        let listed = open_archive(&path)
            .and_then(|file| list_members(file, &path, |name| name.ends_with(suffix)));

        match listed {
            Ok((file, members)) => {
                tracing::debug!(archive = %path.display(), entries = members.len(), "opened archive");
                self.stats.archives_opened += 1;
                self.current = Some(OpenArchive {
                    path,
                    file,
                    members: members.into_iter(),
                });
            }
            Err(e) => {
                tracing::warn!(error = %e, archive = %path.display(), "skipping unreadable archive");
                self.stats.archives_skipped += 1;
            }
        }
    }
}

impl Iterator for TexRecords {
    type Item = (u64, TexRecord);

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(record) = self.ready.pop_front() {
                let key = self.next_key;
                self.next_key += 1;
                self.stats.records += 1;
                return Some((key, record));
            }

            if let Some(open) = self.current.as_mut() {
                match open.members.next() {
                    Some(member) => {
                        self.stats.entries_scanned += 1;
                        match scan_entry(&mut open.file, &member, &self.target_member) {
                            Ok(records) => self.ready.extend(records),
                            Err(reason) => {
                                let err = CorpusError::CorruptEntry {
                                    archive: open.path.clone(),
                                    entry: member.name,
                                    reason,
                                };
                                tracing::warn!(error = %err, "skipping corrupt entry");
                                self.stats.entries_skipped += 1;
                            }
                        }
                    }
                    None => {
                        // Closes the archive file before the next one opens.
                        self.current = None;
                    }
                }
                continue;
            }

            let path = self.pending.pop_front()?;
            self.open_next(path);
        }
    }
}

// ---------------------------------------------------------------------------
// Nested archive scanning
// ---------------------------------------------------------------------------

/// Read one per-paper entry and collect its `target` members.
fn scan_entry(file: &mut File, member: &Member, target: &str) -> Result<Vec<TexRecord>, String> {
    let data = read_member(file, member).map_err(|e| format!("cannot read entry data: {e}"))?;
    scan_nested(&data, target, &member.name)
}

/// Treat `data` as a gzip-compressed tar stream and collect every regular
/// file member named exactly `target`.
///
/// The whole stream is walked before anything is returned. Any failure
/// discards the entry, including records already decoded from it.
pub fn scan_nested(data: &[u8], target: &str, source: &str) -> Result<Vec<TexRecord>, String> {
    let mut found = Vec::new();
    let mut archive = tar::Archive::new(GzDecoder::new(data));

    for entry in archive.entries().map_err(|e| e.to_string())? {
        let mut entry = entry.map_err(|e| e.to_string())?;

        let is_target = entry.header().entry_type().is_file()
            && entry.path_bytes().as_ref() == target.as_bytes();
        if !is_target {
            continue;
        }

        let mut bytes = Vec::new();
        entry
            .read_to_end(&mut bytes)
            .map_err(|e| format!("cannot read {target}: {e}"))?;
        let content =
            String::from_utf8(bytes).map_err(|e| format!("{target} is not valid UTF-8: {e}"))?;
        found.push(TexRecord {
            id: strip_extension(target).to_owned(),
            content,
            source: source.to_owned(),
        });
    }

    Ok(found)
}

/// Drop the final three characters of a member name.
fn strip_extension(name: &str) -> &str {
    match name.char_indices().rev().nth(2) {
        Some((i, _)) => &name[..i],
        None => "",
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
