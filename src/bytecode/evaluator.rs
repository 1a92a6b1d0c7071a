// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Config bytecode evaluator (C6): the read side of §4.5's opcode table.
//!
//! Sequential, no control flow beyond `skip` — mirrors the teacher's
//! `engine/work_queue.rs` index-driven loop (a `VecDeque` cursor stepping
//! forward with no backtracking) more than it mirrors a general VM.

use std::collections::BTreeMap;

use super::assembler::{Program, OPS_RESERVED};
use super::error::{BytecodeError, BytecodeResult};
use super::op::Opcode;
use super::value::{ConfigObject, Value};
use crate::wasmsec::FoundSection;

/// Evaluates a [`Program`] against an optional set of extracted module
/// sections (needed by opcode 13, `section`) and a handler registry (needed
/// by opcode 15, `function`).
pub struct Evaluator<'a> {
    program: &'a Program,
    sections: &'a [FoundSection],
    ops: Vec<Value>,
    instructions_executed: usize,
}

/// Result of running a program to its end or to its first failing instruction.
#[derive(Debug)]
pub enum EvaluatorOutcome {
    Completed(Vec<Value>),
    Failed { ops: Vec<Value>, error: BytecodeError },
}

impl EvaluatorOutcome {
    /// Convenience for callers that only care about success.
    pub fn into_result(self) -> BytecodeResult<Vec<Value>> {
        match self {
            EvaluatorOutcome::Completed(ops) => Ok(ops),
            EvaluatorOutcome::Failed { error, .. } => Err(error),
        }
    }
}

impl<'a> Evaluator<'a> {
    pub fn new(program: &'a Program, sections: &'a [FoundSection]) -> Self {
        let mut ops = Vec::with_capacity(OPS_RESERVED);
        ops.push(Value::Config(ConfigObject::default())); // ops[0]
        for n in 1..15 {
            ops.push(Value::Builtin(n));
        }
        for _ in 15..255 {
            ops.push(Value::Reserved);
        }
        ops.push(Value::Undefined); // ops[255]

        Evaluator {
            program,
            sections,
            ops,
            instructions_executed: 0,
        }
    }

    fn get(&self, index: usize) -> BytecodeResult<&Value> {
        self.ops
            .get(index)
            .ok_or(BytecodeError::IndexOutOfRange(index, self.ops.len()))
    }

    fn data_slice(&self, ptr: u32, len: u32) -> BytecodeResult<&[u8]> {
        let (ptr, len) = (ptr as usize, len as usize);
        self.program
            .data
            .get(ptr..ptr + len)
            .ok_or(BytecodeError::IndexOutOfRange(ptr + len, self.program.data.len()))
    }

    /// Run every instruction in the program to completion. A failing
    /// instruction aborts the program immediately; the partial `ops` table
    /// accumulated so far is still returned alongside the error (spec.md
    /// §7: the fallback shell needs to inspect how far construction got).
    pub fn run(mut self) -> EvaluatorOutcome {
        let mut iptr = 0usize;

        loop {
            let words = &self.program.words;
            if iptr >= words.len() {
                break;
            }
            let opcode_word = words[iptr];
            let offset = iptr;
            let op = match Opcode::from_word(opcode_word, offset) {
                Ok(op) => op,
                Err(error) => return EvaluatorOutcome::Failed { ops: self.ops, error },
            };
            let argc = op.argc() as usize;
            let args = match words.get(iptr + 2..iptr + 2 + argc) {
                Some(args) => args.to_vec(),
                None => {
                    let error = BytecodeError::Truncated(offset, op.argc());
                    return EvaluatorOutcome::Failed { ops: self.ops, error };
                }
            };

            let pushed = match self.execute(op, &args) {
                Ok(value) => value,
                Err(error) => return EvaluatorOutcome::Failed { ops: self.ops, error },
            };
            self.ops.push(pushed);
            self.instructions_executed += 1;

            let mut step = 2 + argc;
            if op == Opcode::Skip {
                step += args[0] as usize;
            }
            iptr += step;
        }

        debug_assert_eq!(self.instructions_executed, self.ops.len() - OPS_RESERVED);
        EvaluatorOutcome::Completed(self.ops)
    }

    fn execute(&mut self, op: Opcode, args: &[u32]) -> BytecodeResult<Value> {
        match op {
            Opcode::Skip => Ok(Value::Unit),
            Opcode::String => {
                let bytes = self.data_slice(args[0], args[1])?;
                Ok(Value::Str(std::str::from_utf8(bytes)?.to_string()))
            }
            Opcode::Json => {
                let bytes = self.data_slice(args[0], args[1])?;
                let value: serde_json::Value = serde_json::from_slice(bytes)?;
                Ok(Value::Json(value))
            }
            Opcode::Const => Ok(Value::Int(args[0] as i64)),
            Opcode::Array => {
                let bytes = self.data_slice(args[0], args[1])?;
                Ok(Value::Bytes(bytes.to_vec()))
            }
            Opcode::Get => {
                let from = args[0] as usize;
                let idx = args[1] as usize;
                let key = self.get(idx)?.clone();
                self.index_into(from, &key)
            }
            Opcode::Set => {
                let into = args[0] as usize;
                let idx = args[1] as usize;
                let what = args[2] as usize;
                let key = self.get(idx)?.as_str(idx).map(str::to_string)?;
                let value = self.get(what)?.clone();
                match self.ops_mut(into)? {
                    Value::Directory(dir) => {
                        dir.insert(key, what);
                    }
                    Value::Config(config) => {
                        config.fields.insert(key, value.clone());
                    }
                    other => {
                        return Err(BytecodeError::TypeMismatch {
                            expected: "Directory or Config",
                            found: other.type_name(),
                            index: into,
                        })
                    }
                }
                Ok(value)
            }
            Opcode::File => {
                let bytes = self.get(args[0] as usize)?.as_bytes(args[0] as usize)?.to_vec();
                Ok(Value::File(bytes))
            }
            Opcode::Directory => {
                // Seeded empty; entries are populated by subsequent `set` instructions
                // against the index this instruction returns.
                let _ = self.get(args[0] as usize)?;
                Ok(Value::Directory(BTreeMap::new()))
            }
            Opcode::PreopenDirectory => {
                let path_index = args[0] as usize;
                let dir_index = args[1] as usize;
                let path = self.get(path_index)?.as_str(path_index)?.to_string();
                Ok(Value::PreopenDirectory { path, dir_index })
            }
            Opcode::PathOpen => {
                let dir_index = args[0] as usize;
                let path_index = args[2] as usize;
                let name = self.get(path_index)?.as_str(path_index)?.to_string();
                let dir = self.get(dir_index)?;
                let entries = match dir {
                    Value::Directory(map) => map,
                    other => {
                        return Err(BytecodeError::TypeMismatch {
                            expected: "Directory",
                            found: other.type_name(),
                            index: dir_index,
                        })
                    }
                };
                let file_index = *entries.get(&name).ok_or(BytecodeError::NoSuchEntry(name))?;
                Ok(Value::OpenFile { file_index, cursor: 0 })
            }
            Opcode::OpenFile => {
                let file_index = args[0] as usize;
                let _ = self.get(file_index)?.as_bytes(file_index)?;
                Ok(Value::OpenFile { file_index, cursor: 0 })
            }
            Opcode::Section => {
                let name_index = args[0] as usize;
                let name = self.get(name_index)?.as_str(name_index)?;
                let matching: Vec<FoundSection> = self
                    .sections
                    .iter()
                    .filter(|s| s.name == name)
                    .cloned()
                    .collect();
                Ok(Value::Sections(matching))
            }
            Opcode::Noop => Ok(Value::Unit),
            Opcode::Function => {
                let src_index = args[0] as usize;
                let source = self.get(src_index)?.as_str(src_index)?.to_string();
                Ok(Value::Handler(source))
            }
        }
    }

    fn ops_mut(&mut self, index: usize) -> BytecodeResult<&mut Value> {
        let len = self.ops.len();
        self.ops.get_mut(index).ok_or(BytecodeError::IndexOutOfRange(index, len))
    }

    fn index_into(&self, from: usize, key: &Value) -> BytecodeResult<Value> {
        match self.get(from)? {
            Value::Directory(map) => {
                let name = match key {
                    Value::Str(s) => s.clone(),
                    other => {
                        return Err(BytecodeError::TypeMismatch {
                            expected: "Str",
                            found: other.type_name(),
                            index: from,
                        })
                    }
                };
                let entry_index = *map.get(&name).ok_or(BytecodeError::NoSuchEntry(name))?;
                Ok(self.get(entry_index)?.clone())
            }
            Value::Json(serde_json::Value::Object(map)) => {
                let name = key.as_str(from)?;
                map.get(name)
                    .cloned()
                    .map(Value::Json)
                    .ok_or_else(|| BytecodeError::NoSuchEntry(name.to_string()))
            }
            Value::Bytes(bytes) => {
                let idx = key.as_int(from)? as usize;
                bytes
                    .get(idx)
                    .map(|b| Value::Int(*b as i64))
                    .ok_or(BytecodeError::IndexOutOfRange(idx, bytes.len()))
            }
            other => Err(BytecodeError::TypeMismatch {
                expected: "Directory, Json object, or Bytes",
                found: other.type_name(),
                index: from,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bytecode::assembler::Assembler;

    #[test]
    fn const_and_string_push_in_order_past_the_reserved_slots() {
        let mut asm = Assembler::new();
        asm.const_int(42);
        asm.string("hello");
        let program = asm.finish();

        let sections = Vec::new();
        let ops = Evaluator::new(&program, &sections).run().into_result().unwrap();

        assert_eq!(ops[OPS_RESERVED], Value::Int(42));
        assert_eq!(ops[OPS_RESERVED + 1], Value::Str("hello".to_string()));
    }

    #[test]
    fn builds_a_file_directory_and_preopen() {
        let mut asm = Assembler::new();
        let bytes = asm.array(b"hello world");
        let file = asm.file(bytes);
        let name = asm.string("greeting.txt");
        let dir = asm.directory(file);
        asm.set(dir, name, file);
        let path = asm.string("/");
        let preopen = asm.preopen_directory(path, dir);
        let _ = asm.path_open(dir, 0, name, 0);
        let program = asm.finish();

        let sections = Vec::new();
        let ops = Evaluator::new(&program, &sections).run().into_result().unwrap();

        match &ops[preopen] {
            Value::PreopenDirectory { path, dir_index } => {
                assert_eq!(path, "/");
                assert_eq!(*dir_index, dir);
            }
            other => panic!("expected PreopenDirectory, got {:?}", other),
        }
        match &ops[dir] {
            Value::Directory(entries) => assert_eq!(entries.get("greeting.txt"), Some(&file)),
            other => panic!("expected Directory, got {:?}", other),
        }
    }

    #[test]
    fn instruction_count_matches_the_ops_table_growth() {
        let mut asm = Assembler::new();
        asm.const_int(1);
        asm.const_int(2);
        asm.noop();
        let program = asm.finish();

        let sections = Vec::new();
        let ops = Evaluator::new(&program, &sections).run().into_result().unwrap();
        assert_eq!(ops.len() - OPS_RESERVED, 3);
    }

    #[test]
    fn skip_advances_past_trailing_words_without_executing_them() {
        // Hand-build the word stream: a skip(2) instruction followed by two
        // junk words (which an unknown-opcode check would reject if the
        // evaluator tried to interpret them), then a const.
        let program = Program {
            words: vec![
                Opcode::Skip as u32, 1, 2, // skip 2 extra words
                0xDEAD, 0xBEEF, // skipped over, never interpreted
                Opcode::Const as u32, 1, 99,
            ],
            data: Vec::new(),
        };

        let sections = Vec::new();
        let ops = Evaluator::new(&program, &sections).run().into_result().unwrap();
        // Only the skip and the final const execute.
        assert_eq!(ops.len() - OPS_RESERVED, 2);
        assert_eq!(ops[OPS_RESERVED + 1], Value::Int(99));
    }

    #[test]
    fn unknown_opcode_is_reported_with_its_word_offset() {
        let program = Program {
            words: vec![99, 0],
            data: Vec::new(),
        };
        let sections = Vec::new();
        match Evaluator::new(&program, &sections).run() {
            EvaluatorOutcome::Failed { error, ops } => {
                assert!(matches!(error, BytecodeError::UnknownOpcode(99, 0)));
                assert_eq!(ops.len(), OPS_RESERVED); // nothing executed yet
            }
            EvaluatorOutcome::Completed(_) => panic!("expected failure"),
        }
    }

    #[test]
    fn failure_surfaces_the_ops_table_built_before_it() {
        let mut asm = Assembler::new();
        asm.const_int(1);
        asm.const_int(2);
        let mut program = asm.finish();
        program.words.extend_from_slice(&[99, 0]); // unknown opcode after two good ones

        let sections = Vec::new();
        match Evaluator::new(&program, &sections).run() {
            EvaluatorOutcome::Failed { ops, error } => {
                assert_eq!(ops.len() - OPS_RESERVED, 2);
                assert_eq!(ops[OPS_RESERVED], Value::Int(1));
                assert_eq!(ops[OPS_RESERVED + 1], Value::Int(2));
                assert!(matches!(error, BytecodeError::UnknownOpcode(99, _)));
            }
            EvaluatorOutcome::Completed(_) => panic!("expected failure"),
        }
    }

    #[test]
    fn set_into_ops_zero_assigns_a_field_on_the_configuration_object() {
        // spec scenario S6: `[4,1,42, 7,3,0,<idx_for_"seed">,<last>]` sets
        // `configuration.seed = 42`; after evaluation `ops[0].seed === 42`.
        let mut asm = Assembler::new();
        let value = asm.const_int(42);
        let key = asm.string("seed");
        asm.set(0, key, value);
        let program = asm.finish();

        let sections = Vec::new();
        let ops = Evaluator::new(&program, &sections).run().into_result().unwrap();

        match &ops[0] {
            Value::Config(config) => assert_eq!(config.fields.get("seed"), Some(&Value::Int(42))),
            other => panic!("expected Config, got {:?}", other),
        }
    }

    #[test]
    fn section_lookup_filters_by_name() {
        let mut asm = Assembler::new();
        let name = asm.string("wah_wasi_config");
        asm.section(name);
        let program = asm.finish();

        let sections = vec![
            FoundSection {
                name: "wah_wasi_config".to_string(),
                data: vec![1, 2, 3],
            },
            FoundSection {
                name: "wah_polyglot_stage0".to_string(),
                data: vec![4],
            },
        ];

        let ops = Evaluator::new(&program, &sections).run().into_result().unwrap();

        match &ops[OPS_RESERVED + 1] {
            Value::Sections(found) => {
                assert_eq!(found.len(), 1);
                assert_eq!(found[0].data, vec![1, 2, 3]);
            }
            other => panic!("expected Sections, got {:?}", other),
        }
    }
}
