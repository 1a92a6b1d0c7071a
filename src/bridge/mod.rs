// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Kernel/firmware bridge (C9): the ordered message channel connecting the
//! sandbox to its host page, grounded on the teacher's reactive executor
//! (`engine/reactive.rs`) use of per-node `mpsc` channel pairs for
//! notification rather than shared mutable state.

mod descriptor;
mod error;
mod firmware;
mod message;
mod process;

pub use descriptor::{ElementDescriptorAllocator, MAX_DESCRIPTOR};
pub use error::{BridgeError, BridgeResult};
pub use firmware::{FakeFirmware, Firmware};
pub use message::{FirmwareMessage, KernelMessage, Selector};
pub use process::{ExitStatus, Process};

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

/// One of `{file, pipe, null}`, enforced as exactly one kind by construction
/// rather than by a map with an "exactly one key" runtime check (spec.md
/// §4.8).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum IoBinding {
    File { path: String },
    Pipe { path: String },
    Null,
}

impl IoBinding {
    /// A fresh anonymous pipe, named the way a real filesystem would need
    /// to name one to avoid collisions between concurrently spawned procs.
    pub fn anonymous_pipe() -> Self {
        IoBinding::Pipe {
            path: format!("io-{}", uuid::Uuid::new_v4()),
        }
    }
}

/// A fresh ordered channel pair connecting one kernel to one firmware,
/// modeling `engine/reactive.rs`'s `mpsc::unbounded_channel` per-node
/// pattern at the scale of a single bridge rather than one pair per DAG
/// node. Returns `(kernel side, firmware side)`.
pub fn channel_pair() -> (
    (mpsc::UnboundedSender<KernelMessage>, mpsc::UnboundedReceiver<FirmwareMessage>),
    (mpsc::UnboundedReceiver<KernelMessage>, mpsc::UnboundedSender<FirmwareMessage>),
) {
    let (to_firmware_tx, to_firmware_rx) = mpsc::unbounded_channel();
    let (from_firmware_tx, from_firmware_rx) = mpsc::unbounded_channel();
    ((to_firmware_tx, from_firmware_rx), (to_firmware_rx, from_firmware_tx))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn anonymous_pipes_get_a_unique_io_prefixed_name() {
        let a = IoBinding::anonymous_pipe();
        let b = IoBinding::anonymous_pipe();
        assert_ne!(a, b);
        match a {
            IoBinding::Pipe { path } => assert!(path.starts_with("io-")),
            other => panic!("expected Pipe, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn channel_pair_carries_messages_kernel_to_firmware_and_back() {
        let ((kernel_tx, mut kernel_rx), (mut firmware_rx, firmware_tx)) = channel_pair();

        kernel_tx
            .send(KernelMessage::RunLevel { level: 1 })
            .unwrap();
        let received = firmware_rx.recv().await.unwrap();
        assert_eq!(received, KernelMessage::RunLevel { level: 1 });

        firmware_tx
            .send(FirmwareMessage::Completed { ed: 1, result: None })
            .unwrap();
        let response = kernel_rx.recv().await.unwrap();
        assert_eq!(response, FirmwareMessage::Completed { ed: 1, result: None });
    }
}
