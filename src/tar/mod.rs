// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! pax-extended ustar writer/reader (C2).
//!
//! Every data file is preceded by a pax extension header (`typeflag='x'`) even
//! when its name fits in the 100-byte ustar `name` field, so the pax payload's
//! length can double as the "is this a real entry or the end sentinel" signal
//! on read: a sentinel is two consecutive pax headers whose declared size is
//! zero (no payload block follows), while a real entry's pax header always
//! carries at least a `size` record and is followed by the ustar file header.

mod error;
mod header;
mod pax;

pub use error::{TarError, TarResult};
pub use header::{TarHeader, BLOCK_SIZE, TYPE_EXTERNAL_REF, TYPE_PAX_EXTENDED, TYPE_REGULAR};

use std::collections::BTreeMap;

/// The decoded body of a [`FileEntry`]: either inline bytes or an external
/// reference awaiting fetch (spec.md's `typeflag='S'` repurposing).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntryData {
    Inline(Vec<u8>),
    ExternalRef { url: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileEntry {
    pub header: TarHeader,
    pub data: EntryData,
}

impl FileEntry {
    pub fn inline(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        let name = name.into();
        let header = TarHeader::regular(name, bytes.len() as u64);
        FileEntry {
            header,
            data: EntryData::Inline(bytes),
        }
    }

    pub fn external_ref(name: impl Into<String>, url: impl Into<String>) -> Self {
        let url = url.into();
        let header = TarHeader::external_ref(name.into(), url.clone());
        FileEntry {
            header,
            data: EntryData::ExternalRef { url },
        }
    }
}

fn align_up(n: usize) -> usize {
    (n + BLOCK_SIZE - 1) / BLOCK_SIZE * BLOCK_SIZE
}

fn pad_to_block(out: &mut Vec<u8>, payload_len: usize) {
    let rem = payload_len % BLOCK_SIZE;
    if rem != 0 {
        out.resize(out.len() + (BLOCK_SIZE - rem), 0);
    }
}

/// Write `entries` as a pax-extended ustar stream terminated by the sentinel
/// pair. The output is always a multiple of 512 bytes.
pub fn write_archive(entries: &[FileEntry]) -> TarResult<Vec<u8>> {
    let mut out = Vec::new();
    for entry in entries {
        write_entry(&mut out, entry)?;
    }
    write_sentinel(&mut out)?;
    Ok(out)
}

fn write_entry(out: &mut Vec<u8>, entry: &FileEntry) -> TarResult<()> {
    let mut records = BTreeMap::new();
    records.insert("size".to_string(), entry.header.size.to_string());
    if entry.header.name.len() > 100 {
        records.insert("path".to_string(), entry.header.name.clone());
    }

    let pax_payload = pax::encode(&records);
    let pax_header = TarHeader {
        name: "PaxHeaders/entry".to_string(),
        size: pax_payload.len() as u64,
        typeflag: TYPE_PAX_EXTENDED,
        ..TarHeader::default()
    };
    out.extend_from_slice(&pax_header.to_block()?);
    out.extend_from_slice(&pax_payload);
    pad_to_block(out, pax_payload.len());

    let mut file_header = entry.header.clone();
    if file_header.name.len() > 100 {
        file_header.name.truncate(100);
    }
    out.extend_from_slice(&file_header.to_block()?);

    if let EntryData::Inline(bytes) = &entry.data {
        out.extend_from_slice(bytes);
        pad_to_block(out, bytes.len());
    }

    Ok(())
}

fn write_sentinel(out: &mut Vec<u8>) -> TarResult<()> {
    let sentinel = TarHeader {
        name: String::new(),
        size: 0,
        typeflag: TYPE_PAX_EXTENDED,
        ..TarHeader::default()
    };
    out.extend_from_slice(&sentinel.to_block()?);
    out.extend_from_slice(&sentinel.to_block()?);
    Ok(())
}

fn read_block(data: &[u8], offset: usize) -> TarResult<[u8; BLOCK_SIZE]> {
    let slice = data
        .get(offset..offset + BLOCK_SIZE)
        .ok_or(TarError::TruncatedArchive {
            offset,
            available: data.len().saturating_sub(offset),
        })?;
    let mut block = [0u8; BLOCK_SIZE];
    block.copy_from_slice(slice);
    Ok(block)
}

/// Parse a pax-extended ustar stream written by [`write_archive`] (or any
/// reader honouring the same sentinel convention) back into entries.
pub fn read_archive(data: &[u8]) -> TarResult<Vec<FileEntry>> {
    let mut cursor = 0usize;
    let mut entries = Vec::new();

    loop {
        let pax_block = read_block(data, cursor)?;
        let pax_header = TarHeader::from_block(&pax_block)?;
        if !pax_header.is_pax_extended() {
            return Err(TarError::BadHeader(format!(
                "expected a pax extension header at offset {}, found typeflag {:?}",
                cursor, pax_header.typeflag as char
            )));
        }
        cursor += BLOCK_SIZE;

        if pax_header.size == 0 {
            let next_block = read_block(data, cursor)?;
            let next_header = TarHeader::from_block(&next_block)?;
            if next_header.is_pax_extended() && next_header.size == 0 {
                break; // sentinel pair consumed; logical end of tar
            }
            return Err(TarError::BadHeader(
                "empty pax header not followed by a matching sentinel".to_string(),
            ));
        }

        let payload_len = pax_header.size as usize;
        let payload = data
            .get(cursor..cursor + payload_len)
            .ok_or(TarError::TruncatedArchive {
                offset: cursor,
                available: data.len().saturating_sub(cursor),
            })?;
        cursor = align_up(cursor + payload_len);
        let records = pax::decode(payload)?;

        let file_block = read_block(data, cursor)?;
        let mut file_header = TarHeader::from_block(&file_block)?;
        cursor += BLOCK_SIZE;
        if let Some(path) = records.get("path") {
            file_header.name = path.clone();
        }

        if let Some(pax_size) = records.get("size") {
            let pax_size: u64 = pax_size
                .parse()
                .map_err(|_| TarError::BadHeader(format!("pax size record '{pax_size}' is not a valid integer")))?;
            if pax_size != file_header.size {
                return Err(TarError::BadFile {
                    name: file_header.name.clone(),
                    header_size: file_header.size,
                    actual_size: pax_size,
                });
            }
        }

        if file_header.is_external_ref() {
            let url = file_header.linkname.clone();
            entries.push(FileEntry {
                header: file_header,
                data: EntryData::ExternalRef { url },
            });
        } else {
            let data_len = file_header.size as usize;
            let bytes = data
                .get(cursor..cursor + data_len)
                .ok_or(TarError::TruncatedArchive {
                    offset: cursor,
                    available: data.len().saturating_sub(cursor),
                })?;
            cursor = align_up(cursor + data_len);
            entries.push(FileEntry {
                header: file_header,
                data: EntryData::Inline(bytes.to_vec()),
            });
        }
    }

    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_a_small_tree() {
        let entries = vec![
            FileEntry::inline("hello.txt", b"hi".to_vec()),
            FileEntry::inline("dir/a.bin", vec![0x01, 0x02]),
        ];
        let archive = write_archive(&entries).unwrap();
        assert_eq!(archive.len() % BLOCK_SIZE, 0);

        let decoded = read_archive(&archive).unwrap();
        assert_eq!(decoded, entries);
    }

    #[test]
    fn round_trips_a_long_name_via_pax_path() {
        let long_name = format!("some/deeply/nested/directory/structure/{}", "x".repeat(80));
        let entries = vec![FileEntry::inline(long_name.clone(), b"payload".to_vec())];
        let archive = write_archive(&entries).unwrap();
        let decoded = read_archive(&archive).unwrap();
        assert_eq!(decoded[0].header.name, long_name);
    }

    #[test]
    fn external_ref_round_trips_with_zero_size() {
        let entries = vec![FileEntry::external_ref("assets/remote.bin", "https://example/asset")];
        let archive = write_archive(&entries).unwrap();
        let decoded = read_archive(&archive).unwrap();
        assert_eq!(
            decoded[0].data,
            EntryData::ExternalRef {
                url: "https://example/asset".to_string()
            }
        );
    }

    #[test]
    fn truncated_archive_is_reported() {
        let entries = vec![FileEntry::inline("a", b"1".to_vec())];
        let mut archive = write_archive(&entries).unwrap();
        archive.truncate(archive.len() - 100);
        assert!(matches!(read_archive(&archive), Err(TarError::TruncatedArchive { .. })));
    }

    #[test]
    fn size_mismatch_is_a_bad_file_error() {
        // Hand-corrupt the ustar size field of the single file header so it
        // disagrees with the actual payload length that follows.
        let entries = vec![FileEntry::inline("a.txt", b"hello".to_vec())];
        let mut archive = write_archive(&entries).unwrap();

        // Block 0: pax header. Block 1: pax payload (padded). Block 2: file
        // header, whose ustar size field sits at byte offset 124.
        let file_header_offset = 2 * BLOCK_SIZE;
        let offset = file_header_offset + 124;
        archive[offset..offset + 11].copy_from_slice(b"00000000020");

        assert!(matches!(read_archive(&archive), Err(TarError::BadFile { .. })));
    }
}
