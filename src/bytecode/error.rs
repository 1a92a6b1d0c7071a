// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use thiserror::Error;

/// Errors from assembling or evaluating a config bytecode program.
#[derive(Error, Debug)]
pub enum BytecodeError {
    #[error("unknown opcode {0} at word offset {1}")]
    UnknownOpcode(u32, usize),

    #[error("instruction at word offset {0} expects {1} operand words but the stream ends first")]
    Truncated(usize, u8),

    #[error("operand index {0} is out of range for an ops table of length {1}")]
    IndexOutOfRange(usize, usize),

    #[error("expected a {expected} value at ops[{index}], found {found}")]
    TypeMismatch {
        expected: &'static str,
        found: &'static str,
        index: usize,
    },

    #[error("string operand is not valid UTF-8")]
    Utf8(#[from] std::str::Utf8Error),

    #[error("json operand failed to parse: {0}")]
    Json(#[from] serde_json::Error),

    #[error("directory has no entry named '{0}'")]
    NoSuchEntry(String),

    #[error("no handler registered for '{0}'")]
    MissingHandler(String),
}

pub type BytecodeResult<T> = Result<T, BytecodeError>;
