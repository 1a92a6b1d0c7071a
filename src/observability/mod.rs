// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Observability module for structured logging and distributed tracing.
//!
//! This module provides centralized message types for all diagnostic and operational
//! logging throughout this crate. Message types follow a struct-based pattern
//! with `Display` trait implementation to:
//!
//! * Eliminate magic strings scattered throughout the codebase
//! * Enable future internationalization without code changes
//! * Maintain Single Responsibility Principle (SRP)
//! * Provide consistent, structured logging output
//!
//! # Architecture
//!
//! Messages are organized by subsystem:
//! * `messages::tar` - tar+pax writer/reader events
//! * `messages::wasmsec` - WASM custom-section surgery events
//! * `messages::bytecode` - config bytecode assembler/evaluator events
//! * `messages::loader` - stage-0/1/2 loader and runtime protocol events
//! * `messages::bridge` - kernel/firmware bridge events
//!
//! # Usage
//!
//! ```rust
//! use wahpack::observability::messages::loader::ExternalReferenceFetched;
//!
//! let msg = ExternalReferenceFetched {
//!     url: "https://example/a",
//!     size_bytes: 128,
//! };
//!
//! tracing::info!("{}", msg);
//! ```

pub mod messages;
