// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! The config bytecode opcode table (spec.md §4.5). Each variant's doc comment
//! carries its fixed operand count.

use super::error::BytecodeError;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[repr(u32)]
pub enum Opcode {
    /// Advance `iptr` by `args[0]` words beyond the normal instruction step.
    Skip = 1,
    /// Push a UTF-8 string decoded from `data[args[0]..args[0]+args[1]]`.
    String = 2,
    /// Push a JSON value parsed from `data[args[0]..args[0]+args[1]]`.
    Json = 3,
    /// Push the integer `args[0]`.
    Const = 4,
    /// Push a byte slice view over `data[args[0]..args[0]+args[1]]`.
    Array = 5,
    /// Push `ops[args[0]][ops[args[1]]]`.
    Get = 6,
    /// `ops[args[0]][ops[args[1]]] = ops[args[2]]`; push the assigned value.
    Set = 7,
    /// Push a File wrapping the bytes at `ops[args[0]]`.
    File = 8,
    /// Push a Directory mapping names to entries, seeded from `ops[args[0]]`.
    Directory = 9,
    /// Push a preopen rooted at path `ops[args[0]]`, bound to directory `ops[args[1]]`.
    PreopenDirectory = 10,
    /// `ops[args[0]].open(args[1] /* flags */, ops[args[2]] /* path */, args[3] /* oflags */)`.
    PathOpen = 11,
    /// Push an OpenFile wrapping the File at `ops[args[0]]`.
    OpenFile = 12,
    /// Push the named custom sections of the module, named by `ops[args[0]]`.
    Section = 13,
    /// Push an empty object. Takes no operand words.
    Noop = 14,
    /// Push a `HandlerRef` naming the host-side handler registered for `ops[args[0]]`.
    Function = 15,
}

impl Opcode {
    pub fn argc(self) -> u8 {
        match self {
            Opcode::Skip => 1,
            Opcode::String => 2,
            Opcode::Json => 2,
            Opcode::Const => 1,
            Opcode::Array => 2,
            Opcode::Get => 2,
            Opcode::Set => 3,
            Opcode::File => 1,
            Opcode::Directory => 1,
            Opcode::PreopenDirectory => 2,
            Opcode::PathOpen => 4,
            Opcode::OpenFile => 1,
            Opcode::Section => 1,
            Opcode::Noop => 0,
            Opcode::Function => 1,
        }
    }

    pub fn from_word(word: u32, offset: usize) -> Result<Self, BytecodeError> {
        match word {
            1 => Ok(Opcode::Skip),
            2 => Ok(Opcode::String),
            3 => Ok(Opcode::Json),
            4 => Ok(Opcode::Const),
            5 => Ok(Opcode::Array),
            6 => Ok(Opcode::Get),
            7 => Ok(Opcode::Set),
            8 => Ok(Opcode::File),
            9 => Ok(Opcode::Directory),
            10 => Ok(Opcode::PreopenDirectory),
            11 => Ok(Opcode::PathOpen),
            12 => Ok(Opcode::OpenFile),
            13 => Ok(Opcode::Section),
            14 => Ok(Opcode::Noop),
            15 => Ok(Opcode::Function),
            other => Err(BytecodeError::UnknownOpcode(other, offset)),
        }
    }
}
