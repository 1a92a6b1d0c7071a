// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Message types for the stage-0/1/2 loader and runtime protocol (C7/C8).

use super::StructuredLog;
use std::fmt::{Display, Formatter};
use tracing::Span;

pub struct BootModuleCompiled<'a> {
    pub module_path: &'a str,
    pub size_bytes: usize,
}

impl Display for BootModuleCompiled<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Compiled boot module '{}' ({} bytes)", self.module_path, self.size_bytes)
    }
}

impl StructuredLog for BootModuleCompiled<'_> {
    fn log(&self) {
        tracing::info!(module_path = self.module_path, size_bytes = self.size_bytes, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::span!(tracing::Level::INFO, "span_name", name = name, module_path = self.module_path)
    }
}

pub struct ExternalReferenceFetched<'a> {
    pub url: &'a str,
    pub size_bytes: usize,
}

impl Display for ExternalReferenceFetched<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Fetched external reference '{}' ({} bytes)", self.url, self.size_bytes)
    }
}

impl StructuredLog for ExternalReferenceFetched<'_> {
    fn log(&self) {
        tracing::info!(url = self.url, size_bytes = self.size_bytes, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::span!(tracing::Level::INFO, "span_name", name = name, url = self.url)
    }
}

pub struct KernelCrashed<'a> {
    pub error: &'a dyn std::error::Error,
}

impl Display for KernelCrashed<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Kernel fell back to the rescue shell: {}", self.error)
    }
}

impl StructuredLog for KernelCrashed<'_> {
    fn log(&self) {
        tracing::error!(error = %self.error, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::span!(tracing::Level::ERROR, "span_name", name = name, error = %self.error)
    }
}
