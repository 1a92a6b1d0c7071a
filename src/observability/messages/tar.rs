// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Message types for the tar+pax writer/reader (C2).

use super::StructuredLog;
use std::fmt::{Display, Formatter};
use tracing::Span;

pub struct ArchiveWritten {
    pub entry_count: usize,
    pub size_bytes: usize,
}

impl Display for ArchiveWritten {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Wrote tar archive: {} entries ({} bytes)", self.entry_count, self.size_bytes)
    }
}

impl StructuredLog for ArchiveWritten {
    fn log(&self) {
        tracing::info!(entry_count = self.entry_count, size_bytes = self.size_bytes, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::span!(tracing::Level::INFO, "span_name", name = name, entry_count = self.entry_count)
    }
}

pub struct ArchiveReadFailed<'a> {
    pub offset: usize,
    pub error: &'a dyn std::error::Error,
}

impl Display for ArchiveReadFailed<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Failed to read tar archive at offset {}: {}", self.offset, self.error)
    }
}

impl StructuredLog for ArchiveReadFailed<'_> {
    fn log(&self) {
        tracing::error!(offset = self.offset, error = %self.error, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::span!(tracing::Level::ERROR, "span_name", name = name, offset = self.offset)
    }
}
