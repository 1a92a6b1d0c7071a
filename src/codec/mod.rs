// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Byte-exact base64 codec used to inline tar payloads inside the HTML polyglot layer.
//!
//! Unlike a general-purpose base64 library, the decoder here must tolerate the
//! surrounding noise the polyglot trick produces: NUL padding runs, stray whitespace,
//! and attribute-trimming artifacts. See [`base64`] for the table and the lenient
//! decode contract.

mod base64;

pub use base64::{decode, decode_trimmed, encode};
