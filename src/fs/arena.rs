// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Arena-backed root filesystem: a `Vec<Slot>` of nodes addressed by index,
//! with a generation counter per slot so a stale [`NodeRef`] (one issued
//! before its node was replaced) is rejected rather than silently aliasing
//! new content. Chosen over an `Rc<RefCell<_>>` pointer graph because the
//! tree this crate builds is reconstructed wholesale from a tar stream and
//! can contain directories that reference each other only by name, never by
//! pointer — an arena sidesteps needing `Weak` back-references entirely.

use std::collections::BTreeMap;

use super::error::{FsError, FsResult};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    File(Vec<u8>),
    Directory(BTreeMap<String, usize>),
}

struct Slot {
    generation: u64,
    node: Node,
}

/// A handle into the arena, valid only as long as its generation matches the
/// slot's current generation.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct NodeRef {
    pub index: usize,
    pub generation: u64,
}

pub struct Arena {
    slots: Vec<Slot>,
}

pub const ROOT: NodeRef = NodeRef { index: 0, generation: 0 };

impl Arena {
    /// A fresh arena with an empty directory at the root.
    pub fn new() -> Self {
        Arena {
            slots: vec![Slot {
                generation: 0,
                node: Node::Directory(BTreeMap::new()),
            }],
        }
    }

    fn push(&mut self, node: Node) -> NodeRef {
        let index = self.slots.len();
        self.slots.push(Slot { generation: 0, node });
        NodeRef { index, generation: 0 }
    }

    pub fn insert_file(&mut self, bytes: Vec<u8>) -> NodeRef {
        self.push(Node::File(bytes))
    }

    pub fn insert_directory(&mut self) -> NodeRef {
        self.push(Node::Directory(BTreeMap::new()))
    }

    fn slot(&self, handle: NodeRef) -> FsResult<&Slot> {
        let slot = self
            .slots
            .get(handle.index)
            .ok_or(FsError::NotFound(format!("index {}", handle.index)))?;
        if slot.generation != handle.generation {
            return Err(FsError::StaleHandle {
                expected: handle.generation,
                found: slot.generation,
            });
        }
        Ok(slot)
    }

    fn slot_mut(&mut self, handle: NodeRef) -> FsResult<&mut Slot> {
        let generation = handle.generation;
        let slot = self
            .slots
            .get_mut(handle.index)
            .ok_or(FsError::NotFound(format!("index {}", handle.index)))?;
        if slot.generation != generation {
            return Err(FsError::StaleHandle {
                expected: generation,
                found: slot.generation,
            });
        }
        Ok(slot)
    }

    pub fn node(&self, handle: NodeRef) -> FsResult<&Node> {
        Ok(&self.slot(handle)?.node)
    }

    /// Replace a node's content without freeing its slot or invalidating
    /// handles already issued against it (spec.md's "replaced in-place but
    /// never freed" invariant). Used by the stage-1 fetcher to swap an
    /// external-reference placeholder for its fetched bytes.
    pub fn replace_in_place(&mut self, handle: NodeRef, node: Node) -> FsResult<()> {
        self.slot_mut(handle)?.node = node;
        Ok(())
    }

    /// Insert `name -> child` into the directory at `dir`.
    pub fn link(&mut self, dir: NodeRef, name: impl Into<String>, child: NodeRef) -> FsResult<()> {
        let dir_name = format!("directory {}", dir.index);
        let slot = self.slot_mut(dir)?;
        match &mut slot.node {
            Node::Directory(entries) => {
                entries.insert(name.into(), child.index);
                Ok(())
            }
            Node::File(_) => Err(FsError::NotADirectory(dir_name)),
        }
    }

    /// Resolve a '/'-separated path (no leading slash) from `root`.
    pub fn resolve(&self, root: NodeRef, path: &str) -> FsResult<NodeRef> {
        self.slot(root)?; // validate the starting handle before walking
        let mut current = root;
        for component in path.split('/').filter(|c| !c.is_empty()) {
            match &self.slots[current.index].node {
                Node::Directory(entries) => {
                    let index = *entries
                        .get(component)
                        .ok_or_else(|| FsError::NotFound(path.to_string()))?;
                    current = NodeRef {
                        index,
                        generation: self.slots[index].generation,
                    };
                }
                Node::File(_) => return Err(FsError::NotADirectory(path.to_string())),
            }
        }
        Ok(current)
    }

    pub fn read_file(&self, handle: NodeRef) -> FsResult<&[u8]> {
        match self.node(handle)? {
            Node::File(bytes) => Ok(bytes),
            Node::Directory(_) => Err(FsError::IsADirectory(format!("index {}", handle.index))),
        }
    }
}

impl Default for Arena {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn links_and_resolves_a_nested_path() {
        let mut arena = Arena::new();
        let dir = arena.insert_directory();
        let file = arena.insert_file(b"payload".to_vec());
        arena.link(ROOT, "sub", dir).unwrap();
        arena.link(dir, "leaf.txt", file).unwrap();

        let resolved = arena.resolve(ROOT, "sub/leaf.txt").unwrap();
        assert_eq!(arena.read_file(resolved).unwrap(), b"payload");
    }

    #[test]
    fn missing_path_is_not_found() {
        let arena = Arena::new();
        assert!(matches!(arena.resolve(ROOT, "missing"), Err(FsError::NotFound(_))));
    }

    #[test]
    fn replace_in_place_keeps_the_handle_valid() {
        let mut arena = Arena::new();
        let file = arena.insert_file(b"old".to_vec());
        arena.replace_in_place(file, Node::File(b"new".to_vec())).unwrap();
        assert_eq!(arena.read_file(file).unwrap(), b"new");
    }

    #[test]
    fn reading_a_directory_as_a_file_is_an_error() {
        let mut arena = Arena::new();
        let dir = arena.insert_directory();
        assert!(matches!(arena.read_file(dir), Err(FsError::IsADirectory(_))));
    }
}
