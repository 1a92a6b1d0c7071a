// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Stage-2 sandbox ("kernel", C8 second half): runs the config evaluator,
//! wires a WASI Preview 1 context from its output, and invokes the inner
//! `boot/init` binary via wasmtime's `_start`.
//!
//! The in-memory arena is materialised into a real [`tempfile::TempDir`]
//! before instantiation — wasmtime-wasi's preopen API takes a host path, not
//! an arena handle, so every file the config program resolved under its
//! root preopen is written out once here.

use std::path::Path;

use wasmtime::{Engine, Linker, Module};
use wasmtime_wasi::p1::{add_to_linker_async, WasiP1Ctx};
use wasmtime_wasi::{DirPerms, FilePerms, WasiCtxBuilder};

use super::error::{LoaderError, LoaderResult};
use super::stage1::Stage1Context;
use crate::bytecode::{Assembler, ConfigObject, Evaluator, EvaluatorOutcome, Value};
use crate::fs::{Arena, Node, NodeRef};
use crate::wasmsec::{self, SECTION_WASI_CONFIG};

/// Signals the inner `_start` invocation completed normally (spec.md §6.4's
/// exit sentinel). Any other trap is a [`KernelError::UserProgramCrash`].
pub const EXIT_SENTINEL: &str = "exit with exit code 0";

const BOOT_INIT_PATH: &str = "boot/init";
const MANIFEST_PATH: &str = "init.mjs";

/// Diagnostic handed back on any stage-2 failure: everything the fallback
/// shell needs to show the user without re-deriving it from the error chain.
#[derive(Debug)]
pub struct RescueReport {
    pub file_names: Vec<String>,
    pub partial_ops: Option<Vec<Value>>,
    pub error: KernelError,
}

#[derive(Debug, thiserror::Error)]
pub enum KernelError {
    #[error("more than one wah_wasi_config section present")]
    DuplicateConfig,

    #[error("boot/init not found in the root filesystem")]
    NoBootExecutable,

    #[error("init.mjs not found in the root filesystem")]
    NoInitModule,

    #[error("the guest program crashed: {0}")]
    UserProgramCrash(String),

    #[error(transparent)]
    Loader(#[from] LoaderError),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Wasmtime(#[from] anyhow::Error),
}

pub type KernelResult<T> = Result<T, KernelError>;

/// Holds the root preopen directory alive for the lifetime of the instance;
/// dropping it removes the materialised tree from disk.
pub struct Kernel {
    _workspace: tempfile::TempDir,
    pub stage2_diagnostic: Vec<u8>,
}

struct GuestCtx {
    wasi: WasiP1Ctx,
}

impl Kernel {
    /// Run stage-2 to completion: evaluate the config program (if any),
    /// materialise the root filesystem, instantiate `boot/init`, and invoke
    /// `_start`. `init.mjs`, if present, is only recorded in the manifest
    /// list this crate does not execute it.
    pub async fn run(ctx: Stage1Context) -> Result<Kernel, RescueReport> {
        let file_names: Vec<String> = ctx.boot.file_entries.iter().map(|e| e.header.name.clone()).collect();

        match Self::run_inner(ctx).await {
            Ok(kernel) => Ok(kernel),
            Err(error) => Err(RescueReport {
                file_names,
                partial_ops: error.partial_ops(),
                error: error.into_kernel_error(),
            }),
        }
    }

    async fn run_inner(ctx: Stage1Context) -> Result<Kernel, StageFailure> {
        // `stage2_wasm` carries the stage identifier spec.md §4.7 hands off to
        // stage-2; like `BootContext::stage1_diagnostic` it is a provenance
        // blob rather than a second module this crate instantiates, since the
        // compiled `boot/init` binary (below) is the only code stage-2 runs.
        let Stage1Context { boot, stage2_wasm } = ctx;

        let config = evaluate_config(&boot.sections).map_err(StageFailure::from)?;

        boot.arena
            .resolve(crate::fs::ROOT, MANIFEST_PATH)
            .map_err(|_| StageFailure::Plain(KernelError::NoInitModule))?;

        let init_handle = boot
            .arena
            .resolve(crate::fs::ROOT, BOOT_INIT_PATH)
            .map_err(|_| StageFailure::Plain(KernelError::NoBootExecutable))?;
        let init_bytes = boot.arena.read_file(init_handle).map_err(LoaderError::from)?.to_vec();

        let workspace = tempfile::tempdir().map_err(KernelError::from)?;
        materialize(&boot.arena, crate::fs::ROOT, workspace.path()).map_err(KernelError::from)?;

        let module = Module::new(&boot.engine, &init_bytes)
            .map_err(|e| StageFailure::Plain(KernelError::Loader(LoaderError::Compile(BOOT_INIT_PATH.to_string(), e.to_string()))))?;

        invoke_start(&boot.engine, &module, workspace.path(), &config)
            .await
            .map_err(StageFailure::from)?;

        Ok(Kernel {
            _workspace: workspace,
            stage2_diagnostic: stage2_wasm,
        })
    }
}

/// Errors from `run_inner` carry along whatever partial `ops` table the
/// config evaluator had built, so a failed evaluation still surfaces its
/// progress to the caller's [`RescueReport`].
enum StageFailure {
    Plain(KernelError),
    Evaluation { ops: Vec<Value>, error: KernelError },
}

impl StageFailure {
    fn partial_ops(&self) -> Option<Vec<Value>> {
        match self {
            StageFailure::Plain(_) => None,
            StageFailure::Evaluation { ops, .. } => Some(ops.clone()),
        }
    }

    fn into_kernel_error(self) -> KernelError {
        match self {
            StageFailure::Plain(e) => e,
            StageFailure::Evaluation { error, .. } => error,
        }
    }
}

impl From<KernelError> for StageFailure {
    fn from(e: KernelError) -> Self {
        StageFailure::Plain(e)
    }
}

impl From<LoaderError> for StageFailure {
    fn from(e: LoaderError) -> Self {
        StageFailure::Plain(KernelError::Loader(e))
    }
}

impl From<anyhow::Error> for StageFailure {
    fn from(e: anyhow::Error) -> Self {
        StageFailure::Plain(KernelError::Wasmtime(e))
    }
}

/// Evaluate the single `wah_wasi_config` section (if present) and derive a
/// `ConfigObject` from its `ops` table. Absent is an empty configuration;
/// more than one is `DuplicateConfig`.
fn evaluate_config(sections: &[wasmsec::FoundSection]) -> Result<ConfigObject, StageFailure> {
    let matches: Vec<&wasmsec::FoundSection> = sections.iter().filter(|s| s.name == SECTION_WASI_CONFIG).collect();
    match matches.len() {
        0 => Ok(ConfigObject::default()),
        1 => {
            let program = decode_program(matches[0].data.as_slice());
            match Evaluator::new(&program, sections).run() {
                EvaluatorOutcome::Completed(ops) => Ok(config_from_ops(&ops)),
                EvaluatorOutcome::Failed { ops, error } => Err(StageFailure::Evaluation {
                    ops,
                    error: KernelError::Loader(LoaderError::Bytecode(error)),
                }),
            }
        }
        _ => Err(StageFailure::Plain(KernelError::DuplicateConfig)),
    }
}

/// The `wah_wasi_config` section carries an assembled [`crate::bytecode::Program`]
/// rather than raw bytecode words directly; this crate stores it length-prefixed
/// word-stream-then-data, the shape [`Assembler::finish`] produces serialized by
/// the packer (C11).
fn decode_program(data: &[u8]) -> crate::bytecode::Program {
    if data.len() < 4 {
        return Assembler::new().finish();
    }
    let word_count = u32::from_le_bytes([data[0], data[1], data[2], data[3]]) as usize;
    let mut words = Vec::with_capacity(word_count);
    let mut pos = 4;
    for _ in 0..word_count {
        if pos + 4 > data.len() {
            break;
        }
        words.push(u32::from_le_bytes([data[pos], data[pos + 1], data[pos + 2], data[pos + 3]]));
        pos += 4;
    }
    let rest = data.get(pos..).unwrap_or(&[]).to_vec();
    crate::bytecode::Program { words, data: rest }
}

/// A config program builds its `ConfigObject` by constructing a `Directory`
/// with the well-known keys `args`/`env`/`preopen`, the same `directory` +
/// `set` shape the assembler test `builds_a_file_directory_and_preopen`
/// exercises. The last such directory the program builds wins, matching a
/// program emitting exactly one.
fn config_from_ops(ops: &[Value]) -> ConfigObject {
    let mut config = ConfigObject::default();
    for value in ops.iter().skip(crate::bytecode::OPS_RESERVED) {
        let entries = match value {
            Value::Directory(entries) => entries,
            _ => continue,
        };
        if let Some(&idx) = entries.get("args") {
            config.args = string_list(ops.get(idx));
        }
        if let Some(&idx) = entries.get("env") {
            config.env = string_list(ops.get(idx));
        }
        if let Some(&idx) = entries.get("preopen") {
            if let Some(Value::PreopenDirectory { dir_index, .. }) = ops.get(idx) {
                config.root_preopen = Some(*dir_index);
            }
        }
    }
    config
}

fn string_list(value: Option<&Value>) -> Vec<String> {
    match value {
        Some(Value::Json(serde_json::Value::Array(items))) => {
            items.iter().filter_map(|v| v.as_str().map(str::to_string)).collect()
        }
        _ => Vec::new(),
    }
}

fn materialize(arena: &Arena, handle: NodeRef, dest: &Path) -> std::io::Result<()> {
    match arena.node(handle).expect("handle is valid while materializing") {
        Node::File(bytes) => std::fs::write(dest, bytes),
        Node::Directory(entries) => {
            std::fs::create_dir_all(dest)?;
            for name in entries.keys() {
                let child = arena.resolve(handle, name).expect("entry name resolves from its own directory");
                materialize(arena, child, &dest.join(name))?;
            }
            Ok(())
        }
    }
}

async fn invoke_start(engine: &Engine, module: &Module, root: &Path, config: &ConfigObject) -> anyhow::Result<()> {
    let mut linker = Linker::<GuestCtx>::new(engine);
    add_to_linker_async(&mut linker, |ctx: &mut GuestCtx| &mut ctx.wasi)?;

    let mut builder = WasiCtxBuilder::new();
    builder.args(&config.args).inherit_stdio();
    for entry in &config.env {
        if let Some((key, value)) = entry.split_once('=') {
            builder.env(key, value);
        }
    }
    builder.preopened_dir(root, "/", DirPerms::all(), FilePerms::all())?;

    let ctx = GuestCtx { wasi: builder.build_p1() };
    let mut store = wasmtime::Store::new(engine, ctx);

    let instance = linker.instantiate_async(&mut store, module).await?;
    let start = instance.get_typed_func::<(), ()>(&mut store, "_start")?;

    match start.call_async(&mut store, ()).await {
        Ok(()) => Ok(()),
        Err(trap) => {
            let message = trap.to_string();
            if message.contains(EXIT_SENTINEL) {
                Ok(())
            } else {
                Err(anyhow::anyhow!(KernelError::UserProgramCrash(message)))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bytecode::Value;
    use std::collections::BTreeMap;

    #[test]
    fn config_from_ops_reads_the_well_known_keys() {
        let mut ops: Vec<Value> = (0..crate::bytecode::OPS_RESERVED).map(|_| Value::Reserved).collect();
        let args_idx = ops.len();
        ops.push(Value::Json(serde_json::json!(["wah-init", "--quiet"])));
        let preopen_dir_idx = ops.len();
        ops.push(Value::Directory(BTreeMap::new()));
        let preopen_idx = ops.len();
        ops.push(Value::PreopenDirectory {
            path: "/".to_string(),
            dir_index: preopen_dir_idx,
        });

        let mut root = BTreeMap::new();
        root.insert("args".to_string(), args_idx);
        root.insert("preopen".to_string(), preopen_idx);
        ops.push(Value::Directory(root));

        let config = config_from_ops(&ops);
        assert_eq!(config.args, vec!["wah-init".to_string(), "--quiet".to_string()]);
        assert_eq!(config.root_preopen, Some(preopen_dir_idx));
    }

    #[test]
    fn decode_program_round_trips_a_small_word_stream() {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&2u32.to_le_bytes());
        bytes.extend_from_slice(&11u32.to_le_bytes());
        bytes.extend_from_slice(&0u32.to_le_bytes());
        bytes.extend_from_slice(b"trailing data");

        let program = decode_program(&bytes);
        assert_eq!(program.words, vec![11, 0]);
        assert_eq!(program.data, b"trailing data".to_vec());
    }

    #[test]
    fn absent_or_truncated_config_bytes_decode_to_an_empty_program() {
        let program = decode_program(&[0, 1]);
        assert!(program.words.is_empty());
    }
}
