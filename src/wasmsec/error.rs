// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use thiserror::Error;

/// Errors from inserting or extracting custom sections in a WebAssembly module.
#[derive(Error, Debug)]
pub enum WasmSecError {
    #[error("malformed wasm module: {0}")]
    Parse(#[from] wasmparser::BinaryReaderError),

    #[error("section '{0}' stage-0 payload exceeds the {1}-byte sniffer window")]
    Stage0TooLarge(String, usize),

    #[error("duplicate custom section '{0}'")]
    DuplicateSection(String),
}

pub type WasmSecResult<T> = Result<T, WasmSecError>;
