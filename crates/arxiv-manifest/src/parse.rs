//! Manifest XML parsing.
//!
//! The arXiv manifest (`src/arXiv_src_manifest.xml`) is a flat list of `file`
//! elements under a single root:
//!
//! ```xml
//! <arXiv_src>
//!   <file>
//!     <content_md5sum>cacbfede21d5dfef26f367ec99384546</content_md5sum>
//!     <filename>src/arXiv_src_0001_001.tar</filename>
//!     <first_item>astro-ph0001001</first_item>
//!     <last_item>quant-ph0001119</last_item>
//!     <md5sum>949ae880fbaf4649a02a74e1dd5a0d48</md5sum>
//!     <num_items>2364</num_items>
//!     <seq_num>1</seq_num>
//!     <size>225605507</size>
//!     <timestamp>2010-12-23 00:13:59</timestamp>
//!     <yymm>0001</yymm>
//!   </file>
//! </arXiv_src>
//! ```
//!
//! `filename`, `num_items`, `seq_num` and `yymm` are required. `first_item`,
//! `last_item`, `size` and `md5sum` are picked up when present; every other
//! child element is ignored.

use quick_xml::events::Event;
use quick_xml::reader::Reader;

use crate::descriptor::{sort_chronologically, ArchiveDescriptor};
use crate::release::{current_pivot, ReleaseMonth};
use crate::ManifestError;

/// Parse manifest text into descriptors sorted chronologically, using the
/// year pivot for the current calendar year.
pub fn parse_manifest(xml: &str) -> Result<Vec<ArchiveDescriptor>, ManifestError> {
    parse_manifest_with_pivot(xml, current_pivot())
}

/// Parse manifest text into descriptors sorted chronologically, using an
/// explicit two-digit year pivot.
pub fn parse_manifest_with_pivot(
    xml: &str,
    pivot: u32,
) -> Result<Vec<ArchiveDescriptor>, ManifestError> {
    let raw = read_entries(xml)?;

    let mut descriptors = raw
        .into_iter()
        .enumerate()
        .map(|(entry, fields)| fields.into_descriptor(entry, pivot))
        .collect::<Result<Vec<_>, _>>()?;

    sort_chronologically(&mut descriptors);
    Ok(descriptors)
}

// ---------------------------------------------------------------------------
// Raw entry collection
// ---------------------------------------------------------------------------

/// Child field text collected from one `file` element.
#[derive(Debug, Default)]
struct RawEntry {
    filename: Option<String>,
    num_items: Option<String>,
    seq_num: Option<String>,
    yymm: Option<String>,
    first_item: Option<String>,
    last_item: Option<String>,
    size: Option<String>,
    md5sum: Option<String>,
}

impl RawEntry {
    fn slot(&mut self, field: &[u8]) -> Option<&mut Option<String>> {
        match field {
            b"filename" => Some(&mut self.filename),
            b"num_items" => Some(&mut self.num_items),
            b"seq_num" => Some(&mut self.seq_num),
            b"yymm" => Some(&mut self.yymm),
            b"first_item" => Some(&mut self.first_item),
            b"last_item" => Some(&mut self.last_item),
            b"size" => Some(&mut self.size),
            b"md5sum" => Some(&mut self.md5sum),
            _ => None,
        }
    }

    fn into_descriptor(self, entry: usize, pivot: u32) -> Result<ArchiveDescriptor, ManifestError> {
        let filename = required(self.filename, entry, "filename")?;
        if filename.is_empty() {
            return Err(ManifestError::MissingField {
                entry,
                field: "filename",
            });
        }

        let item_count: u64 = parse_number(
            required(self.num_items, entry, "num_items")?,
            entry,
            "num_items",
        )?;
        let sequence_number: u32 =
            parse_number(required(self.seq_num, entry, "seq_num")?, entry, "seq_num")?;
        let yymm = required(self.yymm, entry, "yymm")?;
        let release = ReleaseMonth::from_yymm(&yymm, pivot)?;

        let mut descriptor =
            ArchiveDescriptor::new(filename, item_count, sequence_number, yymm, release);
        descriptor.first_item = self.first_item.filter(|s| !s.is_empty());
        descriptor.last_item = self.last_item.filter(|s| !s.is_empty());
        descriptor.md5sum = self.md5sum.filter(|s| !s.is_empty());
        descriptor.size = match self.size {
            Some(raw) if !raw.is_empty() => Some(parse_number(raw, entry, "size")?),
            _ => None,
        };
        Ok(descriptor)
    }
}

fn required(
    value: Option<String>,
    entry: usize,
    field: &'static str,
) -> Result<String, ManifestError> {
    value.ok_or(ManifestError::MissingField { entry, field })
}

fn parse_number<T: std::str::FromStr>(
    raw: String,
    entry: usize,
    field: &'static str,
) -> Result<T, ManifestError> {
    raw.parse().map_err(|_| ManifestError::InvalidNumber {
        entry,
        field,
        value: raw,
    })
}

/// Walk the XML event stream and collect the child fields of every `file`
/// element directly under the root.
fn read_entries(xml: &str) -> Result<Vec<RawEntry>, ManifestError> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut entries = Vec::new();
    let mut current: Option<RawEntry> = None;
    let mut field: Option<Vec<u8>> = None;
    let mut text = String::new();
    let mut depth = 0usize;
    let mut saw_root = false;

    loop {
        match reader.read_event()? {
            Event::Start(e) => {
                depth += 1;
                match depth {
                    1 => saw_root = true,
                    2 if e.name().as_ref() == b"file" => current = Some(RawEntry::default()),
                    3 if current.is_some() => {
                        field = Some(e.name().as_ref().to_vec());
                        text.clear();
                    }
                    _ => {}
                }
            }
            Event::Empty(e) => match depth {
                0 => saw_root = true,
                1 if e.name().as_ref() == b"file" => entries.push(RawEntry::default()),
                2 => {
                    if let Some(entry) = current.as_mut() {
                        if let Some(slot) = entry.slot(e.name().as_ref()) {
                            *slot = Some(String::new());
                        }
                    }
                }
                _ => {}
            },
            Event::Text(e) => {
                if depth == 3 && field.is_some() {
                    text.push_str(&e.unescape()?);
                }
            }
            Event::CData(e) => {
                if depth == 3 && field.is_some() {
                    text.push_str(&String::from_utf8_lossy(&e.into_inner()));
                }
            }
            Event::End(_) => {
                match depth {
                    3 => {
                        if let (Some(entry), Some(name)) = (current.as_mut(), field.take()) {
                            if let Some(slot) = entry.slot(&name) {
                                *slot = Some(text.trim().to_owned());
                            }
                        }
                    }
                    2 => {
                        if let Some(entry) = current.take() {
                            entries.push(entry);
                        }
                    }
                    _ => {}
                }
                depth = depth.saturating_sub(1);
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if depth != 0 {
        return Err(ManifestError::Xml(format!(
            "unexpected end of document with {depth} unclosed element(s)"
        )));
    }
    if !saw_root {
        return Err(ManifestError::Xml("document has no root element".to_owned()));
    }

    tracing::debug!(entries = entries.len(), "read manifest entries");
    Ok(entries)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn file(name: &str, items: &str, seq: &str, yymm: &str) -> String {
        format!(
            "<file><filename>{name}</filename><num_items>{items}</num_items>\
             <seq_num>{seq}</seq_num><yymm>{yymm}</yymm></file>"
        )
    }

    fn manifest(files: &[String]) -> String {
        format!(
            "<?xml version='1.0' encoding='UTF-8'?>\n<arXiv_src>{}</arXiv_src>",
            files.concat()
        )
    }

    // -- 1. Required fields -----------------------------------------------

    #[test]
    fn parses_required_fields() {
        let xml = manifest(&[file("src/arXiv_src_2301_001.tar", "3", "1", "2301")]);
        let list = parse_manifest_with_pivot(&xml, 23).unwrap();

        assert_eq!(list.len(), 1);
        let d = &list[0];
        assert_eq!(d.filename, "src/arXiv_src_2301_001.tar");
        assert_eq!(d.item_count, 3);
        assert_eq!(d.sequence_number, 1);
        assert_eq!(d.yymm, "2301");
        assert_eq!((d.year, d.month), (2023, 1));
    }

    // -- 2. Optional fields and unknown children ---------------------------

    #[test]
    fn picks_up_optional_fields_and_ignores_unknown() {
        let xml = r#"<arXiv_src>
          <file>
            <content_md5sum>abc</content_md5sum>
            <filename>src/arXiv_src_0001_001.tar</filename>
            <first_item>astro-ph0001001</first_item>
            <last_item>quant-ph0001119</last_item>
            <md5sum>949ae880</md5sum>
            <num_items>2364</num_items>
            <seq_num>1</seq_num>
            <size>225605507</size>
            <timestamp>2010-12-23 00:13:59</timestamp>
            <yymm>0001</yymm>
          </file>
        </arXiv_src>"#;

        let list = parse_manifest_with_pivot(xml, 23).unwrap();
        let d = &list[0];
        assert_eq!(d.item_count, 2364);
        assert_eq!(d.year, 2000);
        assert_eq!(d.first_item.as_deref(), Some("astro-ph0001001"));
        assert_eq!(d.last_item.as_deref(), Some("quant-ph0001119"));
        assert_eq!(d.md5sum.as_deref(), Some("949ae880"));
        assert_eq!(d.size, Some(225_605_507));
    }

    // -- 3. Sorting --------------------------------------------------------

    #[test]
    fn result_is_sorted_chronologically() {
        let xml = manifest(&[
            file("c.tar", "1", "1", "0001"),
            file("b.tar", "1", "2", "9912"),
            file("d.tar", "1", "1", "2305"),
            file("a.tar", "1", "1", "9912"),
        ]);
        let list = parse_manifest_with_pivot(&xml, 23).unwrap();
        let names: Vec<&str> = list.iter().map(|d| d.filename.as_str()).collect();
        assert_eq!(names, vec!["a.tar", "b.tar", "c.tar", "d.tar"]);
    }

    #[test]
    fn nested_file_elements_are_not_entries() {
        let xml = "<arXiv_src><meta><file><filename>x</filename></file></meta></arXiv_src>";
        assert!(parse_manifest_with_pivot(xml, 23).unwrap().is_empty());
    }

    #[test]
    fn empty_root_yields_no_descriptors() {
        assert!(parse_manifest_with_pivot("<arXiv_src/>", 23).unwrap().is_empty());
        assert!(parse_manifest_with_pivot("<arXiv_src></arXiv_src>", 23)
            .unwrap()
            .is_empty());
    }

    // -- 4. Failures -------------------------------------------------------

    #[test]
    fn missing_field_is_reported_with_entry_position() {
        let xml = manifest(&[
            file("a.tar", "1", "1", "2301"),
            "<file><filename>b.tar</filename><num_items>2</num_items><yymm>2302</yymm></file>"
                .to_owned(),
        ]);
        let err = parse_manifest_with_pivot(&xml, 23).unwrap_err();
        assert!(
            matches!(err, ManifestError::MissingField { entry: 1, field: "seq_num" }),
            "got {err:?}"
        );
    }

    #[test]
    fn empty_file_element_is_missing_filename() {
        let err = parse_manifest_with_pivot("<arXiv_src><file/></arXiv_src>", 23).unwrap_err();
        assert!(matches!(err, ManifestError::MissingField { entry: 0, field: "filename" }));
    }

    #[test]
    fn non_numeric_count_rejected() {
        let xml = manifest(&[file("a.tar", "many", "1", "2301")]);
        let err = parse_manifest_with_pivot(&xml, 23).unwrap_err();
        assert!(matches!(
            err,
            ManifestError::InvalidNumber { field: "num_items", .. }
        ));
    }

    #[test]
    fn negative_count_rejected() {
        let xml = manifest(&[file("a.tar", "-3", "1", "2301")]);
        let err = parse_manifest_with_pivot(&xml, 23).unwrap_err();
        assert!(matches!(
            err,
            ManifestError::InvalidNumber { field: "num_items", .. }
        ));
    }

    #[test]
    fn bad_yymm_rejected() {
        let xml = manifest(&[file("a.tar", "1", "1", "23x1")]);
        let err = parse_manifest_with_pivot(&xml, 23).unwrap_err();
        assert!(matches!(err, ManifestError::InvalidYearMonth { .. }));
    }

    #[test]
    fn mismatched_tags_rejected() {
        let err = parse_manifest_with_pivot("<arXiv_src><file></arXiv_src>", 23).unwrap_err();
        assert!(matches!(err, ManifestError::Xml(_)), "got {err:?}");
    }

    #[test]
    fn truncated_document_rejected() {
        let err = parse_manifest_with_pivot("<arXiv_src><file>", 23).unwrap_err();
        assert!(matches!(err, ManifestError::Xml(_)), "got {err:?}");
    }

    #[test]
    fn document_without_root_rejected() {
        let err = parse_manifest_with_pivot("", 23).unwrap_err();
        assert!(matches!(err, ManifestError::Xml(_)));
    }

    #[test]
    fn escaped_text_is_unescaped() {
        let xml = manifest(&[file("a&amp;b.tar", "1", "1", "2301")]);
        let list = parse_manifest_with_pivot(&xml, 23).unwrap();
        assert_eq!(list[0].filename, "a&b.tar");
    }
}
