// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Centralized message types for structured logging and distributed tracing.
//!
//! This module contains all message types used throughout this crate for
//! diagnostic and operational logging. Each message type implements:
//!
//! * `Display` - Human-readable output (supports future i18n)
//! * `StructuredLog` - Machine-readable fields + OpenTelemetry span creation
//!
//! # Organization
//!
//! Messages are organized by subsystem to maintain Single Responsibility Principle:
//!
//! * `tar` - tar+pax writer/reader events
//! * `wasmsec` - WASM custom-section surgery events
//! * `bytecode` - config bytecode assembler/evaluator events
//! * `loader` - stage-0/1/2 loader and runtime protocol events
//! * `bridge` - kernel/firmware bridge events
//!
//! # Usage Patterns
//!
//! ## Basic Logging (Human-Readable)
//! ```rust
//! use wahpack::observability::messages::loader::BootModuleCompiled;
//!
//! let msg = BootModuleCompiled {
//!     module_path: "boot/wah-init.wasm",
//!     size_bytes: 4096,
//! };
//!
//! tracing::info!("{}", msg);
//! ```
//!
//! ## Structured Logging (Machine-Readable)
//! ```rust
//! use wahpack::observability::messages::{StructuredLog, loader::BootModuleCompiled};
//!
//! let msg = BootModuleCompiled {
//!     module_path: "boot/wah-init.wasm",
//!     size_bytes: 4096,
//! };
//!
//! // Emits both human-readable message AND structured fields
//! msg.log();
//! ```
//!
//! ## Distributed Tracing (OpenTelemetry)
//! ```rust
//! use wahpack::observability::messages::{StructuredLog, loader::BootModuleCompiled};
//!
//! let msg = BootModuleCompiled {
//!     module_path: "boot/wah-init.wasm",
//!     size_bytes: 4096,
//! };
//!
//! // Create span with message fields as attributes
//! let span = msg.span("stage0_boot");
//! let _guard = span.enter();
//!
//! // ... work happens here with span context ...
//! ```

pub mod bridge;
pub mod bytecode;
pub mod loader;
pub mod tar;
pub mod wasmsec;

use tracing::Span;

/// Trait for messages that support structured logging and distributed tracing.
///
/// This trait provides two key capabilities:
///
/// 1. **Structured Logging** - Emit log events with machine-readable fields
///    for querying, metrics extraction, and alerting
/// 2. **Distributed Tracing** - Create OpenTelemetry spans with attributes
///    for end-to-end request tracing and performance analysis
///
/// # Benefits
///
/// ## Structured Fields
/// - **Queryable**: Filter logs by field values without string parsing
/// - **Metrics**: Automatically extract metrics from log fields
/// - **Alerting**: Create alerts based on field values (e.g., `processor_count > 10`)
/// - **i18n-Ready**: Fields are language-independent, only messages change
///
/// ## Distributed Tracing
/// - **Request Flow**: See entire DAG execution as a trace with nested spans
/// - **Performance**: Automatic timing capture for each span
/// - **Context Propagation**: Spans automatically propagate trace context
/// - **Filtering**: Query traces by span attributes (strategy, processor_id, etc.)
///
/// # Example: Structured Logging
/// ```rust
/// use wahpack::observability::messages::{StructuredLog, loader::BootModuleCompiled};
///
/// let msg = BootModuleCompiled {
///     module_path: "boot/wah-init.wasm",
///     size_bytes: 4096,
/// };
///
/// // Emits: INFO message + fields {module_path, size_bytes}
/// msg.log();
/// ```
///
/// # Example: Distributed Tracing
/// ```rust
/// use wahpack::observability::messages::{StructuredLog, loader::BootModuleCompiled};
///
/// let msg = BootModuleCompiled {
///     module_path: "boot/wah-init.wasm",
///     size_bytes: 4096,
/// };
///
/// // Create span with attributes
/// let span = msg.span("stage0_boot");
/// let _guard = span.enter();
///
/// // All logs/spans created here will be children of this span
/// // Span automatically closed when _guard is dropped
/// ```
///
/// # JSON Output Example
/// With a JSON formatter (e.g., `tracing-subscriber` with JSON layer):
/// ```json
/// {
///   "timestamp": "2026-07-28T17:28:00Z",
///   "level": "INFO",
///   "message": "Compiled boot module 'boot/wah-init.wasm' (4096 bytes)",
///   "fields": {
///     "module_path": "boot/wah-init.wasm",
///     "size_bytes": 4096
///   },
///   "span": {
///     "name": "stage0_boot",
///     "trace_id": "abc123..."
///   }
/// }
/// ```
pub trait StructuredLog {
    /// Emit a log event with structured fields.
    ///
    /// This logs both:
    /// - Human-readable message (via `Display` trait)
    /// - Machine-readable fields for querying and metrics
    ///
    /// The appropriate log level (info, warn, error) is determined by the
    /// message type's semantic meaning.
    ///
    /// # Example
    /// ```rust
    /// use wahpack::observability::messages::{StructuredLog, loader::BootModuleCompiled};
    ///
    /// BootModuleCompiled {
    ///     module_path: "boot/wah-init.wasm",
    ///     size_bytes: 4096,
    /// }.log();
    /// ```
    fn log(&self);

    /// Create an OpenTelemetry span with this message's fields as attributes.
    ///
    /// The span includes all message fields as attributes, enabling:
    /// - Filtering traces by attribute values
    /// - Automatic metrics extraction from span attributes
    /// - Context propagation across service boundaries
    ///
    /// # Arguments
    /// * `name` - The span name (e.g., "dag_execution", "processor_execution")
    ///
    /// # Returns
    /// A `tracing::Span` that can be entered to create trace context.
    /// The span is automatically closed when dropped.
    ///
    /// # Example
    /// ```rust
    /// use wahpack::observability::messages::{StructuredLog, loader::BootModuleCompiled};
    ///
    /// let msg = BootModuleCompiled {
    ///     module_path: "boot/wah-init.wasm",
    ///     size_bytes: 4096,
    /// };
    ///
    /// let span = msg.span("stage0_boot");
    /// let _guard = span.enter();
    /// // Work happens here with span context
    /// // Span automatically closed when _guard drops
    /// ```
    fn span(&self, name: &str) -> Span;
}
