// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! `wahpack`: build, extract, and inspect WASM/HTML/tar polyglot artifacts
//! (C11). Three subcommands, grounded in the teacher's CLI/demo split but
//! expressed with `clap` derive rather than `args[1]` dispatch.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use wahpack::{html, manifest, tar, wasmsec};

#[derive(Parser)]
#[command(name = "wahpack", about = "Build, extract, and inspect WASM/HTML/tar polyglot artifacts")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Build a polyglot artifact from a TOML manifest.
    Pack {
        #[arg(long)]
        manifest: PathBuf,
        /// Path to the compiled boot module, overriding the manifest's `[boot] module`.
        #[arg(long)]
        module: PathBuf,
        #[arg(long)]
        out: PathBuf,
    },
    /// Extract the tar view of a polyglot artifact.
    Unpack {
        file: PathBuf,
        #[arg(long)]
        out: PathBuf,
    },
    /// Print the custom-section layout, file tree, and bytecode disassembly.
    Inspect { file: PathBuf },
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();
    let cli = Cli::parse();

    match cli.command {
        Command::Pack { manifest, module, out } => pack(&manifest, &module, &out),
        Command::Unpack { file, out } => unpack(&file, &out),
        Command::Inspect { file } => inspect(&file),
    }
}

fn pack(manifest_path: &std::path::Path, module_path: &std::path::Path, out: &std::path::Path) -> anyhow::Result<()> {
    let base_dir = manifest_path.parent().unwrap_or_else(|| std::path::Path::new("."));
    let mut loaded = manifest::load(manifest_path)?;
    loaded.boot.module = module_path.to_string_lossy().into_owned();

    let entries = manifest::build_file_entries(&loaded, base_dir)?;
    let boot_bytes = entries
        .iter()
        .find(|e| e.header.name == "boot/wah-init.wasm")
        .and_then(|e| match &e.data {
            tar::EntryData::Inline(bytes) => Some(bytes.clone()),
            tar::EntryData::ExternalRef { .. } => None,
        })
        .expect("build_file_entries always inlines the boot module");

    let html_sections: Vec<(String, Vec<u8>)> = entries
        .iter()
        .enumerate()
        .map(|(index, entry)| (format!("wah_polyglot_file_{index}"), html::render_element(entry).into_bytes()))
        .collect();

    let config_bytes = loaded
        .config
        .as_ref()
        .map(|spec| manifest::encode_program(&manifest::build_config_program(spec)))
        .unwrap_or_default();

    let mut new_sections = vec![wasmsec::NewSection {
        name: wasmsec::SECTION_STAGE0,
        data: b"wahpack",
    }];
    for (name, data) in &html_sections {
        new_sections.push(wasmsec::NewSection { name, data });
    }
    new_sections.push(wasmsec::NewSection {
        name: wasmsec::SECTION_STAGE1,
        data: b"wahpack loader diagnostic",
    });
    new_sections.push(wasmsec::NewSection {
        name: wasmsec::SECTION_STAGE2,
        data: b"wahpack stage2 diagnostic",
    });
    if !config_bytes.is_empty() {
        new_sections.push(wasmsec::NewSection {
            name: wasmsec::SECTION_WASI_CONFIG,
            data: &config_bytes,
        });
    }

    let augmented = wasmsec::write_custom_sections(&boot_bytes, &new_sections)?;
    let tar_bytes = tar::write_archive(&entries)?;

    let mut artifact = augmented;
    let pad = (512 - artifact.len() % 512) % 512;
    artifact.extend(std::iter::repeat(0u8).take(pad));
    artifact.extend_from_slice(&tar_bytes);

    std::fs::write(out, &artifact)?;
    tracing::info!(out = %out.display(), size_bytes = artifact.len(), "wrote polyglot artifact");
    Ok(())
}

fn unpack(file: &std::path::Path, out: &std::path::Path) -> anyhow::Result<()> {
    let bytes = std::fs::read(file)?;
    let entries = recover_entries(&bytes)?;

    std::fs::create_dir_all(out)?;
    for entry in &entries {
        let dest = out.join(&entry.header.name);
        if let Some(parent) = dest.parent() {
            std::fs::create_dir_all(parent)?;
        }
        match &entry.data {
            tar::EntryData::Inline(bytes) => std::fs::write(&dest, bytes)?,
            tar::EntryData::ExternalRef { url } => std::fs::write(&dest, url.as_bytes())?,
        }
    }
    println!("extracted {} entries to {}", entries.len(), out.display());
    Ok(())
}

fn inspect(file: &std::path::Path) -> anyhow::Result<()> {
    let bytes = std::fs::read(file)?;
    let sections = wasmsec::read_custom_sections(&bytes)?;

    println!("custom sections:");
    for section in &sections {
        println!("  {} ({} bytes)", section.name, section.data.len());
    }

    let entries = recover_entries(&bytes)?;
    println!("file tree:");
    for entry in &entries {
        match &entry.data {
            tar::EntryData::Inline(bytes) => println!("  {} ({} bytes)", entry.header.name, bytes.len()),
            tar::EntryData::ExternalRef { url } => println!("  {} -> {}", entry.header.name, url),
        }
    }

    if let Some(config) = wasmsec::find_section(&sections, wasmsec::SECTION_WASI_CONFIG) {
        println!("wah_wasi_config disassembly:");
        for (offset, word) in config.data.chunks(4).enumerate() {
            if word.len() == 4 {
                println!("  [{offset:04}] {:#010x}", u32::from_le_bytes([word[0], word[1], word[2], word[3]]));
            }
        }
    }

    Ok(())
}

fn recover_entries(bytes: &[u8]) -> anyhow::Result<Vec<tar::FileEntry>> {
    let mut entries = Vec::new();
    for element in html::scan_elements(bytes) {
        entries.push(element.to_file_entry()?);
    }
    Ok(entries)
}
