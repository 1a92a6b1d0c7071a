// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Config bytecode assembler and evaluator (C5/C6): the static-assignment
//! program a packed module's `wah_wasi_config` custom section carries, and
//! the replay that turns it back into a WASI configuration.

mod assembler;
mod error;
mod evaluator;
mod op;
mod value;

pub use assembler::{Assembler, Program, OPS_RESERVED};
pub use error::{BytecodeError, BytecodeResult};
pub use evaluator::{Evaluator, EvaluatorOutcome};
pub use op::Opcode;
pub use value::{ConfigObject, Value};
