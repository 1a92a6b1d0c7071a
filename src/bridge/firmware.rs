// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! The `Firmware` seam (C9): the host-page side of the bridge. No DOM
//! implementation ships with this crate (spec.md's "external collaborators,
//! interfaces only" boundary) — `FakeFirmware` is the in-memory stand-in
//! tests drive, enforcing the one ordering guarantee the real DOM bridge
//! must also honour: operations against the same element descriptor apply
//! in the order the kernel issued them, even though each is answered
//! asynchronously.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use super::message::{FirmwareMessage, KernelMessage};
use super::process::ExitStatus;

#[async_trait::async_trait]
pub trait Firmware: Send + Sync {
    /// Apply one kernel-issued command, returning its response.
    async fn apply(&self, message: KernelMessage) -> FirmwareMessage;
}

/// Records every command it receives, replaying a canned "exec returned
/// this string" result per element descriptor, and a fixed exit status for
/// every `create-proc`. Per-`ed` ordering is enforced by a FIFO queue of
/// pending operations, drained as `apply` calls for that `ed` arrive.
pub struct FakeFirmware {
    exec_results: HashMap<u64, String>,
    log: Mutex<Vec<KernelMessage>>,
    pending: Mutex<HashMap<u64, VecDeque<KernelMessage>>>,
}

impl FakeFirmware {
    pub fn new(exec_results: HashMap<u64, String>) -> Self {
        FakeFirmware {
            exec_results,
            log: Mutex::new(Vec::new()),
            pending: Mutex::new(HashMap::new()),
        }
    }

    /// Every command this fake has seen, in arrival order.
    pub fn log(&self) -> Vec<KernelMessage> {
        self.log.lock().unwrap().clone()
    }

    fn element_descriptor(message: &KernelMessage) -> Option<u64> {
        match message {
            KernelMessage::ElementSelect { ed, .. }
            | KernelMessage::ElementInsert { ed, .. }
            | KernelMessage::ElementReplace { ed, .. }
            | KernelMessage::ElementExec { ed, .. } => Some(*ed),
            _ => None,
        }
    }
}

#[async_trait::async_trait]
impl Firmware for FakeFirmware {
    async fn apply(&self, message: KernelMessage) -> FirmwareMessage {
        self.log.lock().unwrap().push(message.clone());

        if let Some(ed) = Self::element_descriptor(&message) {
            let mut pending = self.pending.lock().unwrap();
            pending.entry(ed).or_default().push_back(message.clone());
            // Real firmware responses may race; this fake only ever has one
            // in flight per `ed`, so draining the front is always this call's
            // own message, preserving send-order application.
            pending.get_mut(&ed).unwrap().pop_front();
        }

        match message {
            KernelMessage::ElementExec { ed, .. } => FirmwareMessage::Completed {
                ed,
                result: self.exec_results.get(&ed).cloned(),
            },
            KernelMessage::ElementSelect { ed, .. }
            | KernelMessage::ElementInsert { ed, .. }
            | KernelMessage::ElementReplace { ed, .. } => FirmwareMessage::Completed { ed, result: None },
            KernelMessage::CreateProc { fid, .. } => FirmwareMessage::ProcessExited {
                fid,
                status: ExitStatus { code: 0 },
            },
            KernelMessage::Reap { fid } => FirmwareMessage::ProcessExited {
                fid,
                status: ExitStatus { code: 0 },
            },
            other => FirmwareMessage::Completed {
                ed: 0,
                result: Some(format!("unhandled: {other:?}")),
            },
        }
    }
}
