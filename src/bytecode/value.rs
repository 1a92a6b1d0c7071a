// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Runtime values the evaluator pushes onto the `ops` table.
//!
//! The original dynamic-language evaluator treats `array` (opcode 5) as a
//! zero-copy view into the backing data buffer; here `Bytes` owns a `Vec<u8>`
//! copy instead, since an unannotated borrow over the evaluator's lifetime
//! would tie every config program to the lifetime of its source buffer for no
//! benefit this crate needs — see DESIGN.md's C5/C6 entry.

use std::collections::BTreeMap;

use super::error::{BytecodeError, BytecodeResult};

#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// `ops[0]`: the configuration object under construction.
    Config(ConfigObject),
    /// `ops[1..15]`: the builtin operations, addressable but opaque here.
    Builtin(u8),
    /// `ops[16..254]`: reserved, unused slots.
    Reserved,
    /// `ops[255]`: the fixed `undefined` sentinel.
    Undefined,
    /// Result of `noop`.
    Unit,
    Int(i64),
    Str(String),
    Json(serde_json::Value),
    Bytes(Vec<u8>),
    File(Vec<u8>),
    Directory(BTreeMap<String, usize>),
    PreopenDirectory { path: String, dir_index: usize },
    OpenFile { file_index: usize, cursor: usize },
    Sections(Vec<crate::wasmsec::FoundSection>),
    Handler(String),
}

impl Value {
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Config(_) => "Config",
            Value::Builtin(_) => "Builtin",
            Value::Reserved => "Reserved",
            Value::Undefined => "Undefined",
            Value::Unit => "Unit",
            Value::Int(_) => "Int",
            Value::Str(_) => "Str",
            Value::Json(_) => "Json",
            Value::Bytes(_) => "Bytes",
            Value::File(_) => "File",
            Value::Directory(_) => "Directory",
            Value::PreopenDirectory { .. } => "PreopenDirectory",
            Value::OpenFile { .. } => "OpenFile",
            Value::Sections(_) => "Sections",
            Value::Handler(_) => "Handler",
        }
    }

    pub fn as_int(&self, index: usize) -> BytecodeResult<i64> {
        match self {
            Value::Int(n) => Ok(*n),
            other => Err(BytecodeError::TypeMismatch {
                expected: "Int",
                found: other.type_name(),
                index,
            }),
        }
    }

    pub fn as_str(&self, index: usize) -> BytecodeResult<&str> {
        match self {
            Value::Str(s) => Ok(s.as_str()),
            other => Err(BytecodeError::TypeMismatch {
                expected: "Str",
                found: other.type_name(),
                index,
            }),
        }
    }

    pub fn as_bytes(&self, index: usize) -> BytecodeResult<&[u8]> {
        match self {
            Value::Bytes(b) => Ok(b.as_slice()),
            Value::File(b) => Ok(b.as_slice()),
            other => Err(BytecodeError::TypeMismatch {
                expected: "Bytes",
                found: other.type_name(),
                index,
            }),
        }
    }
}

/// The WASI-facing configuration object under construction: `ops[0]`.
///
/// `args`/`env`/`root_preopen` are the well-known fields `loader::kernel`
/// reads back out; `fields` holds whatever else a config program's `set`
/// instructions write directly onto `ops[0]` (§8 scenario S6's
/// `configuration.seed = 42`), keyed by the same string key `set` takes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConfigObject {
    pub args: Vec<String>,
    pub env: Vec<String>,
    pub root_preopen: Option<usize>,
    pub fields: BTreeMap<String, Value>,
}
