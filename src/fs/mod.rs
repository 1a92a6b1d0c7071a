// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! In-memory root filesystem: builds an [`arena::Arena`] tree from decoded
//! tar entries (C2), the shape the loader (C7/C8) hands to the sandbox.

mod arena;
mod error;

pub use arena::{Arena, Node, NodeRef, ROOT};
pub use error::{FsError, FsResult};

use crate::tar::{EntryData, FileEntry};

/// Build a root filesystem from a flat list of [`FileEntry`] values, creating
/// intermediate directories for every path component. External references
/// (`typeflag='S'`) are inserted as empty placeholder files pending the
/// stage-1 fetcher (C8), which later calls [`Arena::replace_in_place`] on the
/// returned handle once the reference resolves.
pub fn build_tree(entries: &[FileEntry]) -> (Arena, Vec<(String, NodeRef)>) {
    let mut arena = Arena::new();
    let mut pending_external = Vec::new();

    for entry in entries {
        let node = match &entry.data {
            EntryData::Inline(bytes) => Node::File(bytes.clone()),
            EntryData::ExternalRef { .. } => Node::File(Vec::new()),
        };
        let handle = insert_at_path(&mut arena, &entry.header.name, node);
        if let EntryData::ExternalRef { url } = &entry.data {
            pending_external.push((url.clone(), handle));
        }
    }

    (arena, pending_external)
}

fn insert_at_path(arena: &mut Arena, path: &str, node: Node) -> NodeRef {
    let components: Vec<&str> = path.split('/').filter(|c| !c.is_empty()).collect();
    let mut current = ROOT;

    for component in &components[..components.len().saturating_sub(1)] {
        current = match arena.resolve(current, component) {
            Ok(existing) => existing,
            Err(_) => {
                let dir = arena.insert_directory();
                arena.link(current, *component, dir).expect("current was just resolved as a directory");
                dir
            }
        };
    }

    let leaf_name = components.last().copied().unwrap_or("");
    let handle = match node {
        Node::File(bytes) => arena.insert_file(bytes),
        Node::Directory(_) => arena.insert_directory(),
    };
    arena
        .link(current, leaf_name, handle)
        .expect("parent directory was just created or resolved");
    handle
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_nested_directories_from_flat_paths() {
        let entries = vec![
            FileEntry::inline("boot/wah-init.wasm", b"\0asm".to_vec()),
            FileEntry::inline("boot/init", b"entry".to_vec()),
            FileEntry::inline("init.mjs", b"// manifest".to_vec()),
        ];
        let (arena, pending) = build_tree(&entries);
        assert!(pending.is_empty());

        let wasm = arena.resolve(ROOT, "boot/wah-init.wasm").unwrap();
        assert_eq!(arena.read_file(wasm).unwrap(), b"\0asm");
        let init = arena.resolve(ROOT, "boot/init").unwrap();
        assert_eq!(arena.read_file(init).unwrap(), b"entry");
        let manifest = arena.resolve(ROOT, "init.mjs").unwrap();
        assert_eq!(arena.read_file(manifest).unwrap(), b"// manifest");
    }

    #[test]
    fn external_refs_become_empty_placeholders_pending_fetch() {
        let entries = vec![FileEntry::external_ref("assets/remote.bin", "https://example/a")];
        let (arena, pending) = build_tree(&entries);

        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].0, "https://example/a");
        let placeholder = arena.resolve(ROOT, "assets/remote.bin").unwrap();
        assert_eq!(arena.read_file(placeholder).unwrap(), b"");
    }
}
