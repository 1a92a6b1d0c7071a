// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! WebAssembly custom-section writer/reader (C4).
//!
//! New custom sections are prepended right after the 8-byte module header
//! (magic + version), and every other section of the original module is
//! re-emitted unchanged and in order. A conforming wasm runtime skips
//! unknown custom sections, so the augmented module validates and executes
//! identically to the original (spec.md §4.4's load-bearing invariant).
//!
//! Walking the original module mirrors the teacher's `wasm_encoding`
//! (`backends/wasm/detector.rs`): a `wasmparser::Parser::parse_all` pass
//! over `Payload` values. Re-emission uses `wasm_encoder::RawSection` the
//! way `firefly-zero`'s `wasm::strip_custom` rebuilds a module section by
//! section.

mod error;

pub use error::{WasmSecError, WasmSecResult};

use wasmparser::{Parser, Payload};

/// Stage-0 must fit inside the byte window a browser's content sniffer reads
/// before committing to a MIME type (spec.md §4.4).
pub const STAGE0_WINDOW: usize = 1024;

pub const SECTION_STAGE0: &str = "wah_polyglot_stage0";
pub const SECTION_STAGE1_HTML: &str = "wah_polyglot_stage1_html";
pub const SECTION_STAGE1: &str = "wah_polyglot_stage1";
pub const SECTION_STAGE2: &str = "wah_polyglot_stage2";
pub const SECTION_WASI_CONFIG: &str = "wah_wasi_config";
pub const SECTION_WASM_BINDGEN: &str = "wah_polyglot_wasm_bindgen";

/// Section names this module itself rejects on a second occurrence.
/// `wah_polyglot_stage2` and `wah_wasi_config` are deliberately absent: §6.3
/// gives those two their own dedicated errors (`DuplicateStage2`,
/// `DuplicateConfig`, raised downstream by `loader::stage1`/`loader::kernel`
/// once they've counted every matching section), so this generic check must
/// let a second occurrence of either through rather than pre-empting them
/// with the generic `DuplicateSection`.
const SINGLE_OCCURRENCE: &[&str] = &[SECTION_STAGE0, SECTION_STAGE1_HTML, SECTION_STAGE1, SECTION_WASM_BINDGEN];

const WASM_HEADER: [u8; 8] = [0x00, 0x61, 0x73, 0x6d, 0x01, 0x00, 0x00, 0x00];

/// A named custom section pending insertion.
pub struct NewSection<'a> {
    pub name: &'a str,
    pub data: &'a [u8],
}

/// Prepend `sections` to `module` right after the header, preserving every
/// existing section of `module` unchanged and in order.
///
/// Enforces the stage-0 size window when `sections` includes one named
/// [`SECTION_STAGE0`].
pub fn write_custom_sections(module: &[u8], sections: &[NewSection<'_>]) -> WasmSecResult<Vec<u8>> {
    for section in sections {
        if section.name == SECTION_STAGE0 && section.data.len() > STAGE0_WINDOW {
            return Err(WasmSecError::Stage0TooLarge(section.name.to_string(), STAGE0_WINDOW));
        }
    }

    let mut out = Vec::with_capacity(module.len() + sections.iter().map(|s| s.data.len() + s.name.len() + 8).sum::<usize>());
    out.extend_from_slice(&WASM_HEADER);
    for section in sections {
        append_custom_section(&mut out, section.name, section.data);
    }

    for payload in Parser::new(0).parse_all(module) {
        let payload = payload?;
        if let Payload::Version { .. } = payload {
            continue; // header already written above
        }
        if let Some((id, range)) = payload.as_section() {
            wasm_encoder::RawSection {
                id,
                data: &module[range],
            }
            .append_to(&mut out);
        }
    }

    Ok(out)
}

fn append_custom_section(out: &mut Vec<u8>, name: &str, data: &[u8]) {
    wasm_encoder::CustomSection {
        name: name.into(),
        data: data.into(),
    }
    .append_to(out);
}

/// A custom section extracted from a module, in encounter order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FoundSection {
    pub name: String,
    pub data: Vec<u8>,
}

/// Walk every `Payload::CustomSection` in `module`, in order, detecting
/// duplicates of any name in [`SINGLE_OCCURRENCE`]. `wah_polyglot_stage2` and
/// `wah_wasi_config` are left for their own dedicated downstream checks (see
/// [`SINGLE_OCCURRENCE`]'s doc comment) and may repeat here without error.
pub fn read_custom_sections(module: &[u8]) -> WasmSecResult<Vec<FoundSection>> {
    let mut found = Vec::new();
    let mut seen = std::collections::HashSet::new();

    for payload in Parser::new(0).parse_all(module) {
        let payload = payload?;
        if let Payload::CustomSection(reader) = payload {
            let name = reader.name().to_string();
            if SINGLE_OCCURRENCE.contains(&name.as_str()) && !seen.insert(name.clone()) {
                return Err(WasmSecError::DuplicateSection(name));
            }
            found.push(FoundSection {
                name,
                data: reader.data().to_vec(),
            });
        }
    }

    Ok(found)
}

/// Look up the single occurrence of a named custom section, if present.
pub fn find_section<'a>(sections: &'a [FoundSection], name: &str) -> Option<&'a FoundSection> {
    sections.iter().find(|s| s.name == name)
}
