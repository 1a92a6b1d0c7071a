// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use thiserror::Error;

/// Errors from the kernel/firmware bridge (C9).
#[derive(Error, Debug)]
pub enum BridgeError {
    #[error("message did not decode to exactly one known variant: {0}")]
    MalformedMessage(String),

    #[error("element descriptor counter saturated its 2^52 bound")]
    OutOfDescriptors,

    #[error("no pending operation for element descriptor {0}")]
    UnknownDescriptor(u64),

    #[error("the firmware channel closed before a response arrived")]
    ChannelClosed,
}

pub type BridgeResult<T> = Result<T, BridgeError>;
