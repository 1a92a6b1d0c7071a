// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use thiserror::Error;

/// Errors from the stage-0/1/2 loader/runtime protocol (C7/C8).
#[derive(Error, Debug)]
pub enum LoaderError {
    #[error(transparent)]
    Tar(#[from] crate::tar::TarError),

    #[error(transparent)]
    WasmSec(#[from] crate::wasmsec::WasmSecError),

    #[error(transparent)]
    Bytecode(#[from] crate::bytecode::BytecodeError),

    #[error(transparent)]
    Fs(#[from] crate::fs::FsError),

    #[error("compiling '{0}' failed: {1}")]
    Compile(String, String),

    #[error("no stage-2 section present")]
    MissingStage2,

    #[error("more than one stage-2 section present")]
    DuplicateStage2,

    #[error("more than one wah_wasi_config section present")]
    DuplicateConfig,

    #[error("fetch for external reference '{0}' failed: {1}")]
    FetchFailed(String, String),
}

pub type LoaderResult<T> = Result<T, LoaderError>;
