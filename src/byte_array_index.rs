// Copyright 2020 The Jujutsu Authors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
// https://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Content-addressed byte-array interning.
//!
//! Every commit's content passes through a [`ByteArrayIndex`] so that
//! byte-equal blobs shared by many snapshots are stored once. The trait has
//! three implementations with identical observable behavior but different
//! memory/time trade-offs: [`HashWrapperByteArrayIndex`], the default;
//! [`ValueTreeByteArrayIndex`], a trie keyed by cheap running hashes; and
//! [`PassThroughByteArrayIndex`], a no-op used by tests that want to assert on
//! distinct allocations.

use std::collections::HashMap;
use std::rc::Rc;

/// A value-addressed interner: [`addOrLookup`](ByteArrayIndex::add_or_lookup)
/// returns the canonical, shared instance for any byte-equal input.
pub trait ByteArrayIndex {
    /// Returns the previously interned array if `bytes` is byte-equal to one
    /// already indexed, otherwise indexes and returns `bytes` itself.
    fn add_or_lookup(&mut self, bytes: Rc<[u8]>) -> Rc<[u8]>;

    /// Drops all indexed arrays.
    fn clear(&mut self);
}

/// Interns by wrapping each array with its structural hash and looking it up
/// in a single [`HashMap`] keyed by value.
///
/// This is the default: simple, and fast for the common case where most
/// lookups miss (new content) or immediately hit an identical recent commit.
#[derive(Default)]
pub struct HashWrapperByteArrayIndex {
    by_value: HashMap<Rc<[u8]>, Rc<[u8]>>,
    empty: Option<Rc<[u8]>>,
}

impl HashWrapperByteArrayIndex {
    /// Creates an empty index.
    pub fn new() -> Self {
        Self::default()
    }
}

impl ByteArrayIndex for HashWrapperByteArrayIndex {
    fn add_or_lookup(&mut self, bytes: Rc<[u8]>) -> Rc<[u8]> {
        if bytes.is_empty() {
            return self.empty.get_or_insert_with(|| Rc::from(&[][..])).clone();
        }
        if let Some(existing) = self.by_value.get(&bytes) {
            return existing.clone();
        }
        self.by_value.insert(bytes.clone(), bytes.clone());
        bytes
    }

    fn clear(&mut self) {
        self.by_value.clear();
        self.empty = None;
    }
}

/// Interns via a two-level bucketed trie.
///
/// Outer bucketing is by `(xor, sum)` of all bytes, both wrapping `i32`
/// accumulators computed over the byte sequence viewed as *signed* bytes
/// (`i8 as i32`, sign-extending): this is deliberate, not a bug, it matches
/// the source algorithm's `Bits.byteNToInt` helpers, which shift the signed
/// byte value rather than masking it to `u8` first. "Fixing" this to an
/// unsigned interpretation would change which bucket a value lands in without
/// changing correctness (every bucketing is still internally consistent), so
/// there's no externally observable difference, but we keep the same
/// algorithm the spec describes rather than inventing a new one.
///
/// Inside a bucket, a trie descends over the byte sequence 1-4 bytes at a
/// time (widest stride first), storing up to four "shortcut" slots per node
/// (one per stride length) before falling back to a lazily allocated sparse
/// map for further distinct values of the same stride.
#[derive(Default)]
pub struct ValueTreeByteArrayIndex {
    buckets: HashMap<(i32, i32), TrieNode>,
    empty: Option<Rc<[u8]>>,
}

impl ValueTreeByteArrayIndex {
    /// Creates an empty index.
    pub fn new() -> Self {
        Self::default()
    }
}

#[derive(Default)]
struct TrieNode {
    shortcuts: [Option<(i32, Box<Step>)>; 4],
    overflow: [HashMap<i32, Box<Step>>; 4],
}

enum Step {
    Leaf(Rc<[u8]>),
    Node(TrieNode),
}

impl ValueTreeByteArrayIndex {
    fn bucket_key(bytes: &[u8]) -> (i32, i32) {
        let mut xor: i32 = 0;
        let mut sum: i32 = 0;
        for &b in bytes {
            let signed = b as i8 as i32;
            xor ^= signed;
            sum = sum.wrapping_add(signed);
        }
        (xor, sum)
    }

    fn stride_len(remaining: usize) -> usize {
        if remaining >= 4 { 4 } else { remaining }
    }

    fn stride_value(bytes: &[u8]) -> i32 {
        let mut value: i32 = 0;
        for &b in bytes {
            value = (value << 8) | (b as i8 as i32);
        }
        value
    }
}

impl ByteArrayIndex for ValueTreeByteArrayIndex {
    fn add_or_lookup(&mut self, bytes: Rc<[u8]>) -> Rc<[u8]> {
        if bytes.is_empty() {
            return self.empty.get_or_insert_with(|| Rc::from(&[][..])).clone();
        }
        let key = Self::bucket_key(&bytes);
        let root = self.buckets.entry(key).or_default();
        insert_or_lookup(root, &bytes, 0, bytes.clone())
    }

    fn clear(&mut self) {
        self.buckets.clear();
        self.empty = None;
    }
}

fn insert_or_lookup(node: &mut TrieNode, bytes: &[u8], offset: usize, whole: Rc<[u8]>) -> Rc<[u8]> {
    let remaining = &bytes[offset..];
    if remaining.is_empty() {
        // Shouldn't happen: every stride consumes at least one byte, and the
        // loop below stops exactly when the input is exhausted by storing a
        // leaf at the slot for the last stride. Kept for robustness only.
        return whole;
    }
    let stride_idx = ValueTreeByteArrayIndex::stride_len(remaining.len()) - 1;
    let stride_bytes = &remaining[..stride_idx + 1];
    let value = ValueTreeByteArrayIndex::stride_value(stride_bytes);
    let next_offset = offset + stride_idx + 1;
    let is_terminal = next_offset == bytes.len();

    let matches_shortcut = matches!(&node.shortcuts[stride_idx], Some((v, _)) if *v == value);
    let step: &mut Step = if matches_shortcut {
        &mut node.shortcuts[stride_idx].as_mut().unwrap().1
    } else if node.shortcuts[stride_idx].is_none() {
        let fresh = new_step(is_terminal, &whole);
        node.shortcuts[stride_idx] = Some((value, fresh));
        &mut node.shortcuts[stride_idx].as_mut().unwrap().1
    } else {
        node.overflow[stride_idx]
            .entry(value)
            .or_insert_with(|| new_step(is_terminal, &whole))
    };
    descend(step, bytes, next_offset, is_terminal, whole)
}

fn new_step(is_terminal: bool, whole: &Rc<[u8]>) -> Box<Step> {
    Box::new(if is_terminal {
        Step::Leaf(whole.clone())
    } else {
        Step::Node(TrieNode::default())
    })
}

fn descend(
    step: &mut Step,
    bytes: &[u8],
    next_offset: usize,
    is_terminal: bool,
    whole: Rc<[u8]>,
) -> Rc<[u8]> {
    match step {
        Step::Leaf(arr) => arr.clone(),
        Step::Node(node) => {
            if is_terminal {
                // A strictly-shorter earlier insertion already claimed this
                // slot as a `Node`; that cannot happen for well-formed input
                // since stride consumption always reaches exactly
                // `bytes.len()` at the same depth for byte-equal arrays, but
                // guard it rather than panic.
                *step = Step::Leaf(whole.clone());
                whole
            } else {
                insert_or_lookup(node, bytes, next_offset, whole)
            }
        }
    }
}

/// A no-op interner: always returns its input unchanged and never shares
/// allocations. Used by tests that want to assert the index was *not*
/// consulted, or to measure a baseline without deduplication.
#[derive(Default)]
pub struct PassThroughByteArrayIndex;

impl PassThroughByteArrayIndex {
    /// Creates a pass-through index.
    pub fn new() -> Self {
        Self
    }
}

impl ByteArrayIndex for PassThroughByteArrayIndex {
    fn add_or_lookup(&mut self, bytes: Rc<[u8]>) -> Rc<[u8]> {
        bytes
    }

    fn clear(&mut self) {}
}
