// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Kernel/firmware wire messages (C9). Each side of the bridge speaks one
//! enum rather than a freeform map, so "a message with zero or more than one
//! key" cannot be represented at all on the happy path; [`BridgeError::MalformedMessage`]
//! only arises when decoding untyped bytes from a real process boundary
//! (spec.md §4.8).

use serde::{Deserialize, Serialize};

use super::process::ExitStatus;
use crate::bridge::IoBinding;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Selector {
    ById { id: String },
    ByClassName { class_name: String, #[serde(default)] multi: bool },
    ByTagName { tag_name: String, #[serde(default)] multi: bool },
}

/// Kernel -> firmware. Every variant is the single-key equivalent of the
/// distilled schema's `element-select`/`element-insert`/etc. commands.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum KernelMessage {
    ElementSelect { ed: u64, selector: Selector },
    ElementInsert { ed: u64, html: String },
    ElementReplace { ed: u64, html: String },
    ElementExec { ed: u64, script: String },
    CreateProc {
        fid: u64,
        argv: Vec<String>,
        env: Vec<String>,
        stdin: IoBinding,
        stdout: IoBinding,
        stderr: IoBinding,
    },
    Reap { fid: u64 },
    Module { name: String, bytes: Vec<u8> },
    RunLevel { level: u32 },
    Error { message: String },
}

/// Firmware -> kernel. `completed` is the only response variant the
/// distilled schema defines; it answers whichever `ed`/`fid`-bearing command
/// the firmware just finished applying.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FirmwareMessage {
    Completed { ed: u64, result: Option<String> },
    ProcessExited { fid: u64, status: ExitStatus },
}

impl KernelMessage {
    /// Decode a message from an untyped JSON byte buffer crossing a real
    /// process boundary. A buffer that doesn't match exactly one variant
    /// is `MalformedMessage` rather than a silently-accepted partial value.
    pub fn decode(bytes: &[u8]) -> super::error::BridgeResult<Self> {
        serde_json::from_slice(bytes).map_err(|e| super::error::BridgeError::MalformedMessage(e.to_string()))
    }

    pub fn encode(&self) -> Vec<u8> {
        serde_json::to_vec(self).expect("KernelMessage always serializes")
    }
}

impl FirmwareMessage {
    pub fn decode(bytes: &[u8]) -> super::error::BridgeResult<Self> {
        serde_json::from_slice(bytes).map_err(|e| super::error::BridgeError::MalformedMessage(e.to_string()))
    }

    pub fn encode(&self) -> Vec<u8> {
        serde_json::to_vec(self).expect("FirmwareMessage always serializes")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_element_select_through_json() {
        let msg = KernelMessage::ElementSelect {
            ed: 7,
            selector: Selector::ByClassName {
                class_name: "wah-output".to_string(),
                multi: true,
            },
        };
        let decoded = KernelMessage::decode(&msg.encode()).unwrap();
        assert_eq!(decoded, msg);
    }

    #[test]
    fn malformed_bytes_are_reported_not_panicked_on() {
        let err = KernelMessage::decode(b"{not json").unwrap_err();
        assert!(matches!(err, super::super::error::BridgeError::MalformedMessage(_)));
    }
}
