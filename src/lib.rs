// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

pub mod bridge;        // kernel/firmware message bridge (C9)
pub mod bytecode;      // config bytecode assembler/evaluator (C6)
pub mod codec;         // base64 framing shared by the HTML polyglot layer
pub mod fs;            // in-memory root filesystem arena (C5)
pub mod html;          // HTML polyglot escaping (C3)
pub mod loader;        // stage-0/1/2 boot protocol (C7/C8)
pub mod manifest;      // packer manifest format (C11)
pub mod observability;
pub mod tar;           // pax-extended ustar writer/reader (C2)
pub mod wasmsec;       // WASM custom-section surgery (C4)
