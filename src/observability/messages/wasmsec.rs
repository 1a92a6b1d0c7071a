// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Message types for WASM custom-section surgery (C4).

use super::StructuredLog;
use std::fmt::{Display, Formatter};
use tracing::Span;

pub struct SectionsWritten<'a> {
    pub names: &'a [&'a str],
}

impl Display for SectionsWritten<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Wrote custom sections: {}", self.names.join(", "))
    }
}

impl StructuredLog for SectionsWritten<'_> {
    fn log(&self) {
        tracing::info!(section_count = self.names.len(), "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::span!(tracing::Level::INFO, "span_name", name = name, section_count = self.names.len())
    }
}

pub struct DuplicateSectionRejected<'a> {
    pub name: &'a str,
}

impl Display for DuplicateSectionRejected<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Rejected duplicate custom section '{}'", self.name)
    }
}

impl StructuredLog for DuplicateSectionRejected<'_> {
    fn log(&self) {
        tracing::warn!(section_name = self.name, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::span!(tracing::Level::WARN, "span_name", name = name, section_name = self.name)
    }
}
