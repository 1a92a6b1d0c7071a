// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! The stage-0/1/2 loader and runtime protocol (C7/C8): three steps that
//! take a polyglot artifact's bytes to a running sandbox, mirroring the
//! teacher's staged `detect -> create_executor -> execute` flow in
//! `backends/wasm/factory.rs`.

mod error;
mod kernel;
mod stage0;
mod stage1;

pub use error::{LoaderError, LoaderResult};
pub use kernel::{Kernel, KernelError, KernelResult, RescueReport, EXIT_SENTINEL};
pub use stage0::{BootContext, Loader};
pub use stage1::{Fetcher, Stage1, Stage1Context};
