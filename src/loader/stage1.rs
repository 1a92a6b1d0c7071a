// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Stage-1 runtime protocol (C8, first half): resolves every external file
//! reference through a pluggable [`Fetcher`], then hands the now fully-inline
//! artifact to stage-2. No HTTP client ships with this crate (spec.md's
//! "external collaborators, interfaces only" boundary) — tests drive an
//! in-memory fake.

use std::collections::HashMap;

use super::error::{LoaderError, LoaderResult};
use super::stage0::BootContext;
use crate::fs::{Node, NodeRef};
use crate::wasmsec::{self, FoundSection, SECTION_STAGE2};

/// Fetches the bytes behind an external reference URL. Implementations may
/// hit the network, a local cache, or (in tests) an in-memory map; this crate
/// only defines the seam.
#[async_trait::async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, String>;
}

/// Everything stage-1 hands to stage-2: the boot context with every external
/// reference now resolved in place, and the stage-2 section's bytes.
pub struct Stage1Context {
    pub boot: BootContext,
    pub stage2_wasm: Vec<u8>,
}

pub struct Stage1;

impl Stage1 {
    /// Resolve every pending external reference in `boot.arena` via
    /// `fetcher`, then extract the single `wah_polyglot_stage2` section.
    /// Every fetch is dispatched as its own `tokio::task` and awaited
    /// together, so slow references don't serialize against each other.
    pub async fn resolve(mut boot: BootContext, fetcher: &(dyn Fetcher + '_)) -> LoaderResult<Stage1Context> {
        let pending = std::mem::take(&mut boot.pending_external);
        let results = fetch_all(&pending, fetcher).await?;

        for (handle, bytes) in results {
            boot.arena.replace_in_place(handle, Node::File(bytes))?;
        }

        let stage2_wasm = extract_stage2(&boot.sections)?;

        Ok(Stage1Context { boot, stage2_wasm })
    }
}

async fn fetch_all(
    pending: &[(String, NodeRef)],
    fetcher: &(dyn Fetcher + '_),
) -> LoaderResult<Vec<(NodeRef, Vec<u8>)>> {
    let mut by_url: HashMap<&str, Vec<NodeRef>> = HashMap::new();
    for (url, handle) in pending {
        by_url.entry(url.as_str()).or_default().push(*handle);
    }

    let fetches = by_url.keys().map(|url| async move {
        let bytes = fetcher.fetch(url).await.map_err(|e| LoaderError::FetchFailed(url.to_string(), e))?;
        Ok::<_, LoaderError>((*url, bytes))
    });
    let fetched = futures::future::join_all(fetches).await;

    let mut results = Vec::with_capacity(pending.len());
    for outcome in fetched {
        let (url, bytes) = outcome?;
        for handle in &by_url[url] {
            results.push((*handle, bytes.clone()));
        }
    }
    Ok(results)
}

fn extract_stage2(sections: &[FoundSection]) -> LoaderResult<Vec<u8>> {
    let matches: Vec<&FoundSection> = sections.iter().filter(|s| s.name == SECTION_STAGE2).collect();
    match matches.len() {
        0 => Err(LoaderError::MissingStage2),
        1 => Ok(matches[0].data.clone()),
        _ => Err(LoaderError::DuplicateStage2),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs;
    use crate::tar::FileEntry;
    use crate::wasmsec::{NewSection, SECTION_STAGE1};
    use std::sync::Mutex;

    struct FakeFetcher {
        responses: HashMap<String, Vec<u8>>,
        calls: Mutex<Vec<String>>,
    }

    #[async_trait::async_trait]
    impl Fetcher for FakeFetcher {
        async fn fetch(&self, url: &str) -> Result<Vec<u8>, String> {
            self.calls.lock().unwrap().push(url.to_string());
            self.responses.get(url).cloned().ok_or_else(|| format!("no fixture for {url}"))
        }
    }

    fn stub_module() -> Vec<u8> {
        wat::parse_str(r#"(module (func $f (result i32) i32.const 1) (export "f" (func $f)))"#).unwrap()
    }

    fn boot_context_with(entries: &[FileEntry], sections_extra: &[NewSection]) -> BootContext {
        let (arena, pending_external) = fs::build_tree(entries);
        let module = stub_module();
        let augmented = wasmsec::write_custom_sections(&module, sections_extra).unwrap();
        let sections = wasmsec::read_custom_sections(&augmented).unwrap();

        BootContext {
            engine: wasmtime::Engine::default(),
            boot_module: wasmtime::Module::new(&wasmtime::Engine::default(), &module).unwrap(),
            file_entries: entries.to_vec(),
            arena,
            pending_external,
            stage1_diagnostic: None,
            sections,
        }
    }

    #[tokio::test]
    async fn resolves_external_references_and_extracts_stage2() {
        let entries = vec![
            FileEntry::inline("boot/wah-init.wasm", stub_module()),
            FileEntry::external_ref("assets/remote.bin", "https://example/a"),
        ];
        let boot = boot_context_with(
            &entries,
            &[NewSection {
                name: SECTION_STAGE2,
                data: b"stage2 bytes",
            }],
        );

        let mut responses = HashMap::new();
        responses.insert("https://example/a".to_string(), b"fetched content".to_vec());
        let fetcher = FakeFetcher {
            responses,
            calls: Mutex::new(Vec::new()),
        };

        let ctx = Stage1::resolve(boot, &fetcher).await.unwrap();
        assert_eq!(ctx.stage2_wasm, b"stage2 bytes");

        let handle = ctx.boot.arena.resolve(fs::ROOT, "assets/remote.bin").unwrap();
        assert_eq!(ctx.boot.arena.read_file(handle).unwrap(), b"fetched content");
    }

    #[tokio::test]
    async fn missing_stage2_section_is_an_error() {
        let entries = vec![FileEntry::inline("boot/wah-init.wasm", stub_module())];
        let boot = boot_context_with(&entries, &[]);
        let fetcher = FakeFetcher {
            responses: HashMap::new(),
            calls: Mutex::new(Vec::new()),
        };

        let err = Stage1::resolve(boot, &fetcher).await.unwrap_err();
        assert!(matches!(err, LoaderError::MissingStage2));
    }

    #[tokio::test]
    async fn duplicate_stage2_section_is_an_error() {
        // `wasmsec::read_custom_sections` deliberately lets a second
        // `wah_polyglot_stage2` section through (it's excluded from that
        // module's generic single-occurrence check) so this count here, not
        // `WasmSecError::DuplicateSection`, is what actually catches it.
        let entries = vec![FileEntry::inline("boot/wah-init.wasm", stub_module())];
        let module = stub_module();
        let sections = vec![
            FoundSection {
                name: SECTION_STAGE2.to_string(),
                data: b"a".to_vec(),
            },
            FoundSection {
                name: SECTION_STAGE2.to_string(),
                data: b"b".to_vec(),
            },
        ];

        let (arena, pending_external) = fs::build_tree(&entries);
        let boot = BootContext {
            engine: wasmtime::Engine::default(),
            boot_module: wasmtime::Module::new(&wasmtime::Engine::default(), &module).unwrap(),
            file_entries: entries,
            arena,
            pending_external,
            stage1_diagnostic: None,
            sections,
        };

        let fetcher = FakeFetcher {
            responses: HashMap::new(),
            calls: Mutex::new(Vec::new()),
        };
        let err = Stage1::resolve(boot, &fetcher).await.unwrap_err();
        assert!(matches!(err, LoaderError::DuplicateStage2));
    }
}
