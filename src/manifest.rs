// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Packer manifest (C11): a TOML description of a polyglot artifact's file
//! tree, boot module, and WASI config, the input `wahpack pack` turns into
//! artifact bytes. Mirrors the teacher's `config/loader.rs` split between a
//! plain `#[serde(default)]`-annotated struct and a `load`/`load_and_build`
//! pair that does the validating work the struct itself can't express.

use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

use crate::bytecode::{Assembler, Program};
use crate::tar::FileEntry;

#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("failed to read manifest '{0}': {1}")]
    Read(PathBuf, std::io::Error),

    #[error("failed to parse manifest: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("failed to read file '{0}' referenced by manifest entry '{1}': {2}")]
    ReadEntry(PathBuf, String, std::io::Error),

    #[error("manifest entry '{0}' must set exactly one of `source` or `url`")]
    AmbiguousEntry(String),
}

pub type ManifestResult<T> = Result<T, ManifestError>;

#[derive(Debug, Deserialize)]
pub struct Manifest {
    pub boot: BootSection,
    #[serde(default)]
    pub files: Vec<FileSpec>,
    #[serde(default)]
    pub config: Option<ConfigSpec>,
}

#[derive(Debug, Deserialize)]
pub struct BootSection {
    /// Path (relative to the manifest's directory) to the compiled
    /// `boot/wah-init.wasm` module.
    pub module: String,
}

#[derive(Debug, Deserialize)]
pub struct FileSpec {
    /// The tar entry name this file will have inside the artifact.
    pub path: String,
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
pub struct ConfigSpec {
    #[serde(default)]
    pub args: Vec<String>,
    #[serde(default)]
    pub env: Vec<String>,
    #[serde(default)]
    pub root_preopen: Option<String>,
}

/// Load and parse a manifest from `path`. Does not yet resolve any file it
/// references — see [`build_file_entries`].
pub fn load(path: &Path) -> ManifestResult<Manifest> {
    let text = std::fs::read_to_string(path).map_err(|e| ManifestError::Read(path.to_path_buf(), e))?;
    Ok(toml::from_str(&text)?)
}

/// Resolve every manifest entry (and the boot module itself) against files on
/// disk, relative to `base_dir`, producing the flat [`FileEntry`] list the
/// packer hands to `tar::write_archive`/`html::render_all`.
pub fn build_file_entries(manifest: &Manifest, base_dir: &Path) -> ManifestResult<Vec<FileEntry>> {
    let mut entries = Vec::with_capacity(manifest.files.len() + 1);

    let boot_bytes = read_relative(base_dir, &manifest.boot.module, "boot/wah-init.wasm")?;
    entries.push(FileEntry::inline("boot/wah-init.wasm", boot_bytes));

    for spec in &manifest.files {
        let entry = match (&spec.source, &spec.url) {
            (Some(source), None) => FileEntry::inline(spec.path.clone(), read_relative(base_dir, source, &spec.path)?),
            (None, Some(url)) => FileEntry::external_ref(spec.path.clone(), url.clone()),
            _ => return Err(ManifestError::AmbiguousEntry(spec.path.clone())),
        };
        entries.push(entry);
    }

    Ok(entries)
}

fn read_relative(base_dir: &Path, relative: &str, entry_name: &str) -> ManifestResult<Vec<u8>> {
    let full = base_dir.join(relative);
    std::fs::read(&full).map_err(|e| ManifestError::ReadEntry(full, entry_name.to_string(), e))
}

/// Build a `wah_wasi_config` config bytecode program from `spec`, following
/// the `args`/`env`/`preopen` directory shape `loader::kernel::config_from_ops`
/// reads back on the evaluator side (DESIGN.md Open Question 6).
pub fn build_config_program(spec: &ConfigSpec) -> Program {
    let mut asm = Assembler::new();
    let args = asm.json(&serde_json::json!(spec.args));
    let env = asm.json(&serde_json::json!(spec.env));
    let root = asm.directory(0);

    let args_key = asm.string("args");
    asm.set(root, args_key, args);
    let env_key = asm.string("env");
    asm.set(root, env_key, env);

    if let Some(path) = &spec.root_preopen {
        let preopen_target = asm.directory(0);
        let path_value = asm.string(path);
        let preopen = asm.preopen_directory(path_value, preopen_target);
        let preopen_key = asm.string("preopen");
        asm.set(root, preopen_key, preopen);
    }

    asm.finish()
}

/// Serialize a [`Program`] to the length-prefixed word-stream-then-data shape
/// `loader::kernel::decode_program` expects inside a `wah_wasi_config` section.
pub fn encode_program(program: &Program) -> Vec<u8> {
    let mut out = Vec::with_capacity(4 + program.words.len() * 4 + program.data.len());
    out.extend_from_slice(&(program.words.len() as u32).to_le_bytes());
    for word in &program.words {
        out.extend_from_slice(&word.to_le_bytes());
    }
    out.extend_from_slice(&program.data);
    out
}
