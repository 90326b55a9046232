//! Synthetic container builder for integration tests.

#![allow(dead_code)]

use ggpack::{encipher, Method};
use std::collections::HashMap;

pub enum Node {
    Null,
    Hash(Vec<(String, Node)>),
    Array(Vec<Node>),
    /// Array written without its trailing tag.
    OpenArray(Vec<Node>),
    Str(String),
    /// Integer literal text, written as-is.
    Int(String),
    /// Double literal text, written as-is.
    Dbl(String),
}

pub fn hash(entries: Vec<(&str, Node)>) -> Node {
    Node::Hash(entries.into_iter().map(|(k, v)| (k.to_string(), v)).collect())
}

pub fn string(s: &str) -> Node {
    Node::Str(s.to_string())
}

pub fn int(i: i64) -> Node {
    Node::Int(i.to_string())
}

#[derive(Default)]
struct Pool {
    strings: Vec<String>,
    index:   HashMap<String, u32>,
}

impl Pool {
    fn intern(&mut self, s: &str) -> u32 {
        if let Some(&i) = self.index.get(s) {
            return i;
        }
        let i = self.strings.len() as u32;
        self.strings.push(s.to_string());
        self.index.insert(s.to_string(), i);
        i
    }
}

fn encode(node: &Node, pool: &mut Pool, out: &mut Vec<u8>) {
    match node {
        Node::Null => out.push(1),
        Node::Hash(entries) => {
            out.push(2);
            out.extend_from_slice(&(entries.len() as u32).to_le_bytes());
            for (k, v) in entries {
                out.extend_from_slice(&pool.intern(k).to_le_bytes());
                encode(v, pool, out);
            }
            out.push(2);
        }
        Node::Array(items) | Node::OpenArray(items) => {
            out.push(3);
            out.extend_from_slice(&(items.len() as u32).to_le_bytes());
            for v in items {
                encode(v, pool, out);
            }
            if matches!(node, Node::Array(_)) {
                out.push(3);
            }
        }
        Node::Str(s) => {
            out.push(4);
            out.extend_from_slice(&pool.intern(s).to_le_bytes());
        }
        Node::Int(s) => {
            out.push(5);
            out.extend_from_slice(&pool.intern(s).to_le_bytes());
        }
        Node::Dbl(s) => {
            out.push(6);
            out.extend_from_slice(&pool.intern(s).to_le_bytes());
        }
    }
}

/// Plain (deciphered) directory block for `root`.
///
/// Layout: signature, reserved word, table position, value tree, string
/// pool, marker 7, offsets, sentinel.
pub fn directory_block(root: &Node) -> Vec<u8> {
    let mut pool = Pool::default();
    let mut tree = Vec::new();
    encode(root, &mut pool, &mut tree);

    let mut block = Vec::new();
    block.extend_from_slice(&0x0403_0201u32.to_le_bytes());
    block.extend_from_slice(&[0u8; 4]);
    block.extend_from_slice(&[0u8; 4]); // table position, patched below
    block.extend_from_slice(&tree);

    let mut offsets = Vec::new();
    for s in &pool.strings {
        offsets.push(block.len() as u32);
        block.extend_from_slice(s.as_bytes());
        block.push(0);
    }

    let table_pos = block.len() as u32;
    block[8..12].copy_from_slice(&table_pos.to_le_bytes());
    block.push(7);
    for o in offsets {
        block.extend_from_slice(&o.to_le_bytes());
    }
    block.extend_from_slice(&0xFFFF_FFFFu32.to_le_bytes());
    block
}

/// Full container: header, obfuscated payloads, obfuscated directory.
///
/// The root hash gets a `"files"` array describing `payloads`, plus `extra`.
pub fn container(payloads: &[(&str, &[u8])], extra: Vec<(&str, Node)>, method: Method) -> Vec<u8> {
    let mut out = vec![0u8; 8];
    let mut records = Vec::new();
    for (name, data) in payloads {
        let offset = out.len();
        let mut buf = data.to_vec();
        encipher(&mut buf, method);
        out.extend_from_slice(&buf);
        records.push(hash(vec![
            ("filename", string(name)),
            ("offset", int(offset as i64)),
            ("size", int(data.len() as i64)),
        ]));
    }

    let mut entries = vec![("files", Node::Array(records))];
    entries.extend(extra);
    with_directory(out, &hash(entries), method)
}

/// Container holding only a directory for `root` at offset 8.
pub fn directory_only(root: &Node, method: Method) -> Vec<u8> {
    with_directory(vec![0u8; 8], root, method)
}

/// Container at offset 8 around an already built plain directory block.
pub fn from_block(block: Vec<u8>, method: Method) -> Vec<u8> {
    wrap_block(vec![0u8; 8], block, method)
}

fn with_directory(out: Vec<u8>, root: &Node, method: Method) -> Vec<u8> {
    wrap_block(out, directory_block(root), method)
}

fn wrap_block(mut out: Vec<u8>, mut dir: Vec<u8>, method: Method) -> Vec<u8> {
    encipher(&mut dir, method);
    let dir_offset = out.len() as u32;
    out[0..4].copy_from_slice(&dir_offset.to_le_bytes());
    out[4..8].copy_from_slice(&(dir.len() as u32).to_le_bytes());
    out.extend_from_slice(&dir);
    out
}
