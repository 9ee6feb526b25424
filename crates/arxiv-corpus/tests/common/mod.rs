//! Fixture builders for corpus integration tests.
//!
//! Fixtures are written into a temporary directory laid out like the arXiv
//! bulk mirror: a manifest under `src/` and uncompressed top-level tar files
//! whose entries are gzip-compressed per-paper tarballs.

#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use flate2::write::GzEncoder;
use flate2::Compression;

/// One manifest `file` entry: `(filename, num_items, seq_num, yymm)`.
pub type ManifestEntry<'a> = (&'a str, u64, u32, &'a str);

/// Render and write a manifest to `root/src/arXiv_src_manifest.xml`.
pub fn write_manifest(root: &Path, entries: &[ManifestEntry<'_>]) -> PathBuf {
    let mut xml = String::from("<?xml version='1.0' encoding='UTF-8'?>\n<arXiv_src>\n");
    for (filename, items, seq, yymm) in entries {
        xml.push_str(&format!(
            "  <file>\n    <filename>{filename}</filename>\n    <num_items>{items}</num_items>\n    \
             <seq_num>{seq}</seq_num>\n    <yymm>{yymm}</yymm>\n  </file>\n"
        ));
    }
    xml.push_str("</arXiv_src>\n");

    let path = root.join("src").join("arXiv_src_manifest.xml");
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(&path, xml).unwrap();
    path
}

/// Build a gzip-compressed tarball holding `files`.
pub fn gz_tar(files: &[(&str, &[u8])]) -> Vec<u8> {
    let mut builder = tar::Builder::new(GzEncoder::new(Vec::new(), Compression::default()));
    for (name, data) in files {
        append(&mut builder, name, data);
    }
    builder.into_inner().unwrap().finish().unwrap()
}

/// Write an uncompressed top-level tar at `path` holding `entries`.
pub fn write_archive(path: &Path, entries: &[(&str, Vec<u8>)]) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    let file = fs::File::create(path).unwrap();
    let mut builder = tar::Builder::new(file);
    for (name, data) in entries {
        append(&mut builder, name, data);
    }
    builder.into_inner().unwrap();
}

/// A per-paper entry holding a `main.tex` with `content`.
pub fn paper_with_main(content: &str) -> Vec<u8> {
    gz_tar(&[
        ("main.tex", content.as_bytes()),
        ("refs.bib", "@article{x, title={y}}".as_bytes()),
    ])
}

/// A per-paper entry holding no `main.tex`.
pub fn paper_without_main() -> Vec<u8> {
    gz_tar(&[("paper.tex", "\\documentclass{article}".as_bytes())])
}

fn append<W: std::io::Write>(builder: &mut tar::Builder<W>, name: &str, data: &[u8]) {
    let mut header = tar::Header::new_gnu();
    header.set_size(data.len() as u64);
    header.set_mode(0o644);
    header.set_cksum();
    builder.append_data(&mut header, name, data).unwrap();
}
