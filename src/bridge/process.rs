// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Guest process state machine (C9): a `create-proc` command yields a
//! [`Process`] that starts `Pending` and settles exactly once, either by
//! exiting with a status or crashing with an error, mirroring the kernel's
//! own `_start`/exit-sentinel handling (`loader::kernel`) one level up the
//! stack for firmware-spawned child processes.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExitStatus {
    pub code: i32,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Process {
    Pending,
    Exited(ExitStatus),
    Crashed(String),
}

impl Process {
    pub fn is_settled(&self) -> bool {
        !matches!(self, Process::Pending)
    }

    /// Apply the `completed`/crash signal that ends this process's lifetime.
    /// Settling an already-settled process is a no-op: the firmware's FIFO
    /// ordering guarantees at most one terminal signal reaches here.
    pub fn settle(&mut self, status: Result<ExitStatus, String>) {
        if self.is_settled() {
            return;
        }
        *self = match status {
            Ok(status) => Process::Exited(status),
            Err(message) => Process::Crashed(message),
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_pending_and_settles_to_exited() {
        let mut process = Process::Pending;
        process.settle(Ok(ExitStatus { code: 0 }));
        assert_eq!(process, Process::Exited(ExitStatus { code: 0 }));
    }

    #[test]
    fn a_settled_process_ignores_further_signals() {
        let mut process = Process::Pending;
        process.settle(Err("boom".to_string()));
        process.settle(Ok(ExitStatus { code: 0 }));
        assert_eq!(process, Process::Crashed("boom".to_string()));
    }
}
