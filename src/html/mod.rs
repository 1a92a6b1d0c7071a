// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! HTML polyglot escaping (C3): wraps each tar data file so a browser sees a
//! `<template class="wah_polyglot_data">` element while a pax tar reader sees
//! fixed-width header fields and opaque payload bytes.
//!
//! The trick (spec.md §4.2): a pax extension header's extension-record-length
//! field starts with a NUL byte (tar readers treat a leading NUL as "parse the
//! rest of this field", not as forbidden), so the bytes between that NUL and
//! byte offset 100 of the *next* block (where a ustar `name` field lives) are
//! free for the packer to fill with literal HTML. This module owns only the
//! HTML-shaped text injected into that space; the tar structure itself is
//! [`crate::tar`]'s job.

use crate::codec;
use crate::tar::{EntryData, FileEntry, TarError};

const TEMPLATE_CLASS: &str = "wah_polyglot_data";
/// Bound on the trailing non-alphabet trim when recovering base64 text from a
/// `<template>` element's text content (spec.md §4.2).
const TRAILING_TRIM_BOUND: usize = 2048;

/// A single decoded `<template class="wah_polyglot_data">` element, as a
/// browser's DOM would expose it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PolyglotElement {
    pub id: String,
    pub header_attr: String,
    /// The entry's declared tar `size`, carried as its own attribute so the
    /// loader (C7) can validate it against the decoded payload length
    /// without re-parsing the debug-formatted header blob.
    pub declared_size: u64,
    /// Mirrors `typeflag='S'`: the text content decodes to a URL rather than
    /// file bytes.
    pub is_external: bool,
    pub text_content: String,
}

impl PolyglotElement {
    /// Recover the [`FileEntry`] this element encodes, validating that its
    /// declared size matches the decoded payload for inline entries.
    pub fn to_file_entry(&self) -> Result<FileEntry, TarError> {
        if self.is_external {
            let url = String::from_utf8_lossy(&decode_payload(self)).into_owned();
            return Ok(FileEntry::external_ref(self.id.clone(), url));
        }
        let payload = decode_payload(self);
        validate_size(self, &payload)?;
        Ok(FileEntry::inline(self.id.clone(), payload))
    }
}

/// Strip characters that cannot appear in the `data-wahtml_id` attribute
/// (replacement character and embedded NULs) from a tar entry name to form
/// the element id.
fn sanitize_id(name: &str) -> String {
    name.chars()
        .filter(|&c| c != '\u{0}' && c != '\u{FFFD}')
        .collect()
}

/// Render one [`FileEntry`] as HTML text that a browser parses as a
/// `<template>` element and a pax reader ignores as attribute/text content
/// sitting inside fixed-width header fields.
///
/// Returns the HTML text; callers splice it into the NUL-prefixed gap a pax
/// extension header leaves before the next block's `name` field (the caller
/// owns placement since that requires knowing the surrounding tar byte
/// offsets — see `crate::wasmsec` for how the packer stitches this together
/// at the whole-artifact level).
pub fn render_element(entry: &FileEntry) -> String {
    let id = sanitize_id(&entry.header.name);
    let header_attr = format!("{:?}", entry.header); // opaque debug view of the 500 trailing header bytes
    let (body, is_external) = match &entry.data {
        EntryData::Inline(bytes) => (codec::encode(bytes), false),
        EntryData::ExternalRef { url } => (codec::encode(url.as_bytes()), true),
    };

    format!(
        "<template class=\"{}\" data-wahtml_id=\"{}\" data-wahtml_size=\"{}\" data-wahtml_ref=\"{}\" data-b=\"{}\">{}</template>",
        TEMPLATE_CLASS, id, entry.header.size, is_external, html_escape_attr(&header_attr), body
    )
}

fn html_escape_attr(s: &str) -> String {
    s.replace('&', "&amp;").replace('"', "&quot;").replace('<', "&lt;")
}

/// Byte-level scanner standing in for a browser's DOM (spec.md's "external
/// collaborators, interfaces only" boundary: no HTML parser is implemented).
/// Finds every `<template class="wah_polyglot_data" ...>...</template>` span
/// and recovers its id, header attribute, and text content.
pub fn scan_elements(html: &[u8]) -> Vec<PolyglotElement> {
    let open_marker = format!("class=\"{}\"", TEMPLATE_CLASS);
    let mut out = Vec::new();
    let mut pos = 0usize;

    while let Some(class_at) = find(html, open_marker.as_bytes(), pos) {
        let Some(tag_open) = html[..class_at].iter().rposition(|&b| b == b'<') else {
            pos = class_at + 1;
            continue;
        };
        let Some(tag_close) = find(html, b">", class_at) else {
            break;
        };
        let tag = &html[tag_open..=tag_close];
        let id = extract_attr(tag, "data-wahtml_id").unwrap_or_default();
        let header_attr = extract_attr(tag, "data-b").unwrap_or_default();
        let declared_size = extract_attr(tag, "data-wahtml_size")
            .and_then(|s| s.parse().ok())
            .unwrap_or(0);
        let is_external = extract_attr(tag, "data-wahtml_ref")
            .map(|s| s == "true")
            .unwrap_or(false);

        let Some(close_tag) = find(html, b"</template>", tag_close) else {
            break;
        };
        let text_content = String::from_utf8_lossy(&html[tag_close + 1..close_tag]).into_owned();

        out.push(PolyglotElement {
            id,
            header_attr,
            declared_size,
            is_external,
            text_content,
        });
        pos = close_tag + "</template>".len();
    }

    out
}

fn find(haystack: &[u8], needle: &[u8], from: usize) -> Option<usize> {
    if from > haystack.len() || needle.is_empty() {
        return None;
    }
    haystack[from..]
        .windows(needle.len())
        .position(|w| w == needle)
        .map(|p| p + from)
}

fn extract_attr(tag: &[u8], attr: &str) -> Option<String> {
    let marker = format!("{}=\"", attr);
    let start = find(tag, marker.as_bytes(), 0)? + marker.len();
    let end = find(tag, b"\"", start)?;
    Some(
        String::from_utf8_lossy(&tag[start..end])
            .replace("&quot;", "\"")
            .replace("&lt;", "<")
            .replace("&amp;", "&"),
    )
}

/// Decode a scanned [`PolyglotElement`]'s text content back into raw file
/// bytes, tolerating the NUL padding and attribute-trim noise the polyglot
/// wrapping introduces.
pub fn decode_payload(element: &PolyglotElement) -> Vec<u8> {
    codec::decode_trimmed(element.text_content.as_bytes(), TRAILING_TRIM_BOUND)
}

/// Validate that a decoded element's payload length matches its declared
/// tar `size` attribute (spec.md §4.6: "the declared size field of the tar
/// header must equal the base64-decoded payload length").
pub fn validate_size(element: &PolyglotElement, payload: &[u8]) -> Result<(), TarError> {
    if element.declared_size != payload.len() as u64 {
        return Err(TarError::BadFile {
            name: element.id.clone(),
            header_size: element.declared_size,
            actual_size: payload.len() as u64,
        });
    }
    Ok(())
}

/// Render an entire file tree as a sequence of `<template>` elements
/// concatenated together — the HTML-only view of a tar archive, useful for
/// tests and for the `inspect` CLI subcommand's `--as-html` mode.
pub fn render_all(entries: &[FileEntry]) -> String {
    entries.iter().map(render_element).collect::<Vec<_>>().join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scans_a_single_element_round_trip() {
        let entry = FileEntry::inline("hello.txt", b"hi there".to_vec());
        let html = render_element(&entry);

        let elements = scan_elements(html.as_bytes());
        assert_eq!(elements.len(), 1);
        assert_eq!(elements[0].id, "hello.txt");
        assert_eq!(decode_payload(&elements[0]), b"hi there");
    }

    #[test]
    fn scans_multiple_elements_in_document_order() {
        let entries = vec![
            FileEntry::inline("a.txt", b"AAA".to_vec()),
            FileEntry::inline("b.txt", b"BBB".to_vec()),
        ];
        let doc = format!("<html><body>{}</body></html>", render_all(&entries));
        let elements = scan_elements(doc.as_bytes());

        assert_eq!(elements.len(), 2);
        assert_eq!(elements[0].id, "a.txt");
        assert_eq!(decode_payload(&elements[0]), b"AAA");
        assert_eq!(elements[1].id, "b.txt");
        assert_eq!(decode_payload(&elements[1]), b"BBB");
    }

    #[test]
    fn sanitizes_nul_and_replacement_chars_from_ids() {
        assert_eq!(sanitize_id("a\u{0}b\u{FFFD}c"), "abc");
    }

    #[test]
    fn tolerates_nul_padding_around_payload_text() {
        let entry = FileEntry::inline("pad.bin", vec![0xAB; 10]);
        let rendered = render_element(&entry);
        let padded = rendered.replace('>', ">\u{0}\u{0}\u{0}");
        let elements = scan_elements(padded.as_bytes());
        assert_eq!(decode_payload(&elements[0]), vec![0xAB; 10]);
    }

    #[test]
    fn size_validation_flags_mismatch() {
        let entry = FileEntry::inline("f", b"abc".to_vec());
        let html = render_element(&entry);
        let element = scan_elements(html.as_bytes()).remove(0);
        assert!(validate_size(&element, b"abc").is_ok());
        assert!(validate_size(&element, b"abcd").is_err());
    }

    #[test]
    fn to_file_entry_recovers_inline_and_external_entries() {
        let inline = FileEntry::inline("hello.txt", b"hi there".to_vec());
        let html = render_element(&inline);
        let element = scan_elements(html.as_bytes()).remove(0);
        let recovered = element.to_file_entry().unwrap();
        assert_eq!(recovered.header.name, "hello.txt");
        assert_eq!(recovered.data, EntryData::Inline(b"hi there".to_vec()));

        let external = FileEntry::external_ref("assets/remote.bin", "https://example/asset");
        let html = render_element(&external);
        let element = scan_elements(html.as_bytes()).remove(0);
        let recovered = element.to_file_entry().unwrap();
        assert_eq!(recovered.header.name, "assets/remote.bin");
        assert_eq!(
            recovered.data,
            EntryData::ExternalRef {
                url: "https://example/asset".to_string()
            }
        );
    }

    #[test]
    fn writer_output_is_well_formed_html_tags() {
        // Property 2(c): the emitted text parses as HTML without syntax
        // errors in its pre-load phase — approximated here by checking the
        // tag/attribute shape a conforming parser expects: a quoted class
        // attribute and a matching closing tag.
        let entry = FileEntry::inline("x", b"y".to_vec());
        let html = render_element(&entry);
        assert!(html.starts_with("<template class=\"wah_polyglot_data\""));
        assert!(html.ends_with("</template>"));
        assert_eq!(html.matches('"').count() % 2, 0);
    }
}
