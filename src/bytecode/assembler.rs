// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Config bytecode assembler (C5): the write side of §4.5's opcode table.
//!
//! Structured as a small append-only instruction builder over a typed
//! target, the same shape as the teacher's `ProcessorMap`/`DependencyGraph`
//! builders (`config/processor_map.rs`, `config/dependency_graph.rs`) —
//! public methods append one unit of state and return a handle (here, the
//! `ops` index the evaluator will assign the pushed value) rather than
//! exposing the backing word stream directly.

use super::op::Opcode;

pub const OPS_RESERVED: usize = 256;

/// A finished program: the 32-bit word stream plus the data buffer that
/// `string`/`json`/`array` operands slice into.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Program {
    pub words: Vec<u32>,
    pub data: Vec<u8>,
}

pub struct Assembler {
    words: Vec<u32>,
    data: Vec<u8>,
    next_index: usize,
}

impl Assembler {
    pub fn new() -> Self {
        Assembler {
            words: Vec::new(),
            data: Vec::new(),
            next_index: OPS_RESERVED,
        }
    }

    fn emit(&mut self, op: Opcode, args: &[u32]) -> usize {
        debug_assert_eq!(args.len(), op.argc() as usize);
        self.words.push(op as u32);
        self.words.push(op.argc() as u32);
        self.words.extend_from_slice(args);
        let index = self.next_index;
        self.next_index += 1;
        index
    }

    fn push_data(&mut self, bytes: &[u8]) -> (u32, u32) {
        let ptr = self.data.len() as u32;
        self.data.extend_from_slice(bytes);
        (ptr, bytes.len() as u32)
    }

    /// Advance `iptr` by `n` words beyond this instruction's own step.
    pub fn skip(&mut self, n: u32) -> usize {
        self.emit(Opcode::Skip, &[n])
    }

    pub fn string(&mut self, value: &str) -> usize {
        let (ptr, len) = self.push_data(value.as_bytes());
        self.emit(Opcode::String, &[ptr, len])
    }

    pub fn json(&mut self, value: &serde_json::Value) -> usize {
        let text = value.to_string();
        let (ptr, len) = self.push_data(text.as_bytes());
        self.emit(Opcode::Json, &[ptr, len])
    }

    pub fn const_int(&mut self, value: i64) -> usize {
        self.emit(Opcode::Const, &[value as u32])
    }

    pub fn array(&mut self, bytes: &[u8]) -> usize {
        let (ptr, len) = self.push_data(bytes);
        self.emit(Opcode::Array, &[ptr, len])
    }

    pub fn get(&mut self, from: usize, idx: usize) -> usize {
        self.emit(Opcode::Get, &[from as u32, idx as u32])
    }

    pub fn set(&mut self, into: usize, idx: usize, what: usize) -> usize {
        self.emit(Opcode::Set, &[into as u32, idx as u32, what as u32])
    }

    pub fn file(&mut self, what: usize) -> usize {
        self.emit(Opcode::File, &[what as u32])
    }

    pub fn directory(&mut self, what: usize) -> usize {
        self.emit(Opcode::Directory, &[what as u32])
    }

    pub fn preopen_directory(&mut self, where_: usize, what: usize) -> usize {
        self.emit(Opcode::PreopenDirectory, &[where_ as u32, what as u32])
    }

    pub fn path_open(&mut self, dir: usize, flags: u32, path: usize, oflags: u32) -> usize {
        self.emit(Opcode::PathOpen, &[dir as u32, flags, path as u32, oflags])
    }

    pub fn open_file(&mut self, what: usize) -> usize {
        self.emit(Opcode::OpenFile, &[what as u32])
    }

    pub fn section(&mut self, what: usize) -> usize {
        self.emit(Opcode::Section, &[what as u32])
    }

    pub fn noop(&mut self) -> usize {
        self.emit(Opcode::Noop, &[])
    }

    pub fn function(&mut self, what: usize) -> usize {
        self.emit(Opcode::Function, &[what as u32])
    }

    pub fn finish(self) -> Program {
        Program {
            words: self.words,
            data: self.data,
        }
    }
}

impl Default for Assembler {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn indices_start_after_the_reserved_slots() {
        let mut asm = Assembler::new();
        let first = asm.const_int(7);
        assert_eq!(first, OPS_RESERVED);
        let second = asm.const_int(8);
        assert_eq!(second, OPS_RESERVED + 1);
    }

    #[test]
    fn string_and_array_share_one_data_buffer() {
        let mut asm = Assembler::new();
        asm.string("hello");
        asm.array(&[1, 2, 3]);
        let program = asm.finish();
        assert_eq!(&program.data[0..5], b"hello");
        assert_eq!(&program.data[5..8], &[1, 2, 3]);
    }

    #[test]
    fn emitted_words_encode_opcode_then_argc_then_args() {
        let mut asm = Assembler::new();
        asm.const_int(42);
        let program = asm.finish();
        assert_eq!(program.words, vec![Opcode::Const as u32, 1, 42]);
    }
}
