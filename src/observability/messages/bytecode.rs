// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Message types for the config bytecode assembler/evaluator (C5/C6).

use super::StructuredLog;
use std::fmt::{Display, Formatter};
use tracing::Span;

pub struct ProgramEvaluated {
    pub instructions_executed: usize,
}

impl Display for ProgramEvaluated {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Evaluated config program: {} instructions", self.instructions_executed)
    }
}

impl StructuredLog for ProgramEvaluated {
    fn log(&self) {
        tracing::info!(instructions_executed = self.instructions_executed, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::span!(tracing::Level::INFO, "span_name", name = name, instructions_executed = self.instructions_executed)
    }
}

pub struct ProgramEvaluationFailed<'a> {
    pub word_offset: usize,
    pub error: &'a dyn std::error::Error,
}

impl Display for ProgramEvaluationFailed<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Config program failed at word offset {}: {}", self.word_offset, self.error)
    }
}

impl StructuredLog for ProgramEvaluationFailed<'_> {
    fn log(&self) {
        tracing::error!(word_offset = self.word_offset, error = %self.error, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::span!(tracing::Level::ERROR, "span_name", name = name, word_offset = self.word_offset)
    }
}
