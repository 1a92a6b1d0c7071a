// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Message types for the kernel/firmware bridge (C9).

use super::StructuredLog;
use std::fmt::{Display, Formatter};
use tracing::Span;

pub struct ElementDescriptorAllocated {
    pub ed: u64,
}

impl Display for ElementDescriptorAllocated {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Allocated element descriptor {}", self.ed)
    }
}

impl StructuredLog for ElementDescriptorAllocated {
    fn log(&self) {
        tracing::info!(ed = self.ed, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::span!(tracing::Level::INFO, "span_name", name = name, ed = self.ed)
    }
}

pub struct ProcessSettled {
    pub fid: u64,
    pub exit_code: Option<i32>,
}

impl Display for ProcessSettled {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        match self.exit_code {
            Some(code) => write!(f, "Process {} exited with code {}", self.fid, code),
            None => write!(f, "Process {} crashed", self.fid),
        }
    }
}

impl StructuredLog for ProcessSettled {
    fn log(&self) {
        tracing::info!(fid = self.fid, exit_code = self.exit_code, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::span!(tracing::Level::INFO, "span_name", name = name, fid = self.fid)
    }
}

pub struct MalformedMessageRejected<'a> {
    pub detail: &'a str,
}

impl Display for MalformedMessageRejected<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Rejected malformed bridge message: {}", self.detail)
    }
}

impl StructuredLog for MalformedMessageRejected<'_> {
    fn log(&self) {
        tracing::warn!(detail = self.detail, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::span!(tracing::Level::WARN, "span_name", name = name, detail = self.detail)
    }
}
