// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use thiserror::Error;

/// Errors from the ustar+pax reader/writer.
#[derive(Error, Debug)]
pub enum TarError {
    /// An octal numeric field (size, mode, uid, gid, mtime, checksum) contained a
    /// non-octal byte.
    #[error("bad header: {0}")]
    BadHeader(String),

    /// A header was expected at a 512-byte aligned offset but fewer than 512 bytes
    /// remained in the stream.
    #[error("truncated archive: expected a 512-byte header at offset {offset}, found {available} bytes")]
    TruncatedArchive { offset: usize, available: usize },

    /// A decoded file entry's payload length did not match its header `size` field.
    #[error("size mismatch for '{name}': header says {header_size}, payload is {actual_size} bytes")]
    BadFile {
        name: String,
        header_size: u64,
        actual_size: u64,
    },

    /// An entry name exceeded 100 bytes and no pax `path` attribute was supplied.
    #[error("name '{0}' exceeds 100 bytes and has no pax path attribute")]
    NameTooLong(String),
}

pub type TarResult<T> = Result<T, TarError>;
