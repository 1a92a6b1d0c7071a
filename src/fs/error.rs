// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use thiserror::Error;

/// Errors from the in-memory root filesystem arena.
#[derive(Error, Debug)]
pub enum FsError {
    #[error("no such path '{0}'")]
    NotFound(String),

    #[error("'{0}' is a directory, not a regular file")]
    IsADirectory(String),

    #[error("'{0}' is a regular file, not a directory")]
    NotADirectory(String),

    #[error("stale file handle: generation {expected} expected, found {found}")]
    StaleHandle { expected: u64, found: u64 },
}

pub type FsResult<T> = Result<T, FsError>;
