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

//! The path -> content mapping that is the input to a commit and the output
//! of a checkout.
//!
//! The source this kernel is distilled from has a deep inheritance hierarchy
//! of near-duplicate `HashMapArea`/`LinkedHashMapArea`/`TreeMapArea`/
//! `SingleContentArea` classes, further duplicated across bytes/string/
//! encoded-string flavors. Here that collapses into one [`ContentArea`]
//! parameterized only by its [`AreaKind`] (which backing container, and
//! therefore which iteration order, it uses).

use indexmap::IndexMap;
use std::collections::BTreeMap;

use crate::content::Charset;
use crate::content::Content;
use crate::repo_path::RepoPath;

/// Which backing container a [`ContentArea`] uses, and therefore the
/// iteration order it exposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AreaKind {
    /// Unordered (hash-backed); iteration order is unspecified.
    Hash,
    /// Insertion-ordered (linked-hash-backed).
    Linked,
    /// Sorted by canonical path string (tree-backed).
    ///
    /// Note: the source's `UTF8StringTreeMapArea` extends a hash-backed base
    /// despite its name; we follow the name ("tree map") and always sort,
    /// treating that inheritance as a defect in the source rather than a
    /// behavior to reproduce (§9 open question 3).
    Tree,
    /// At most one `(path, content)` entry.
    Single,
}

#[derive(Clone)]
enum Storage<C> {
    Map(IndexMap<RepoPath, C>),
    Tree(BTreeMap<RepoPath, C>),
    Single(Option<(RepoPath, C)>),
}

/// A path -> content mapping with a declared iteration order.
///
/// `put` canonicalizes its path argument and replaces any existing entry;
/// `remove` is idempotent. See [`AreaKind`] for the four backing flavors.
#[derive(Clone)]
pub struct ContentArea<C = Content> {
    kind: AreaKind,
    storage: Storage<C>,
}

impl<C> ContentArea<C> {
    /// An unordered (hash-backed) area.
    pub fn hash() -> Self {
        Self {
            kind: AreaKind::Hash,
            storage: Storage::Map(IndexMap::new()),
        }
    }

    /// An insertion-ordered area.
    pub fn linked() -> Self {
        Self {
            kind: AreaKind::Linked,
            storage: Storage::Map(IndexMap::new()),
        }
    }

    /// A path-sorted area.
    pub fn tree() -> Self {
        Self {
            kind: AreaKind::Tree,
            storage: Storage::Tree(BTreeMap::new()),
        }
    }

    /// An area holding at most one entry.
    pub fn single() -> Self {
        Self {
            kind: AreaKind::Single,
            storage: Storage::Single(None),
        }
    }

    /// Which backing flavor this area uses.
    pub fn kind(&self) -> AreaKind {
        self.kind
    }

    /// Inserts or replaces the content at `path`. `path` is canonicalized
    /// first. For a [`AreaKind::Single`] area, this overwrites both the path
    /// and the content of the one slot.
    pub fn put(&mut self, path: impl Into<RepoPath>, content: C) {
        let path = path.into().to_absolute_path();
        match &mut self.storage {
            Storage::Map(map) => {
                map.insert(path, content);
            }
            Storage::Tree(map) => {
                map.insert(path, content);
            }
            Storage::Single(slot) => {
                *slot = Some((path, content));
            }
        }
    }

    /// Returns the content at `path`, if any.
    pub fn get(&self, path: impl Into<RepoPath>) -> Option<&C> {
        let path = path.into().to_absolute_path();
        match &self.storage {
            Storage::Map(map) => map.get(&path),
            Storage::Tree(map) => map.get(&path),
            Storage::Single(slot) => slot.as_ref().filter(|(p, _)| *p == path).map(|(_, c)| c),
        }
    }

    /// Removes the entry at `path`, if present. A no-op if absent.
    pub fn remove(&mut self, path: impl Into<RepoPath>) {
        let path = path.into().to_absolute_path();
        match &mut self.storage {
            Storage::Map(map) => {
                map.shift_remove(&path);
            }
            Storage::Tree(map) => {
                map.remove(&path);
            }
            Storage::Single(slot) => {
                if slot.as_ref().is_some_and(|(p, _)| *p == path) {
                    *slot = None;
                }
            }
        }
    }

    /// Removes every entry.
    pub fn clear(&mut self) {
        match &mut self.storage {
            Storage::Map(map) => map.clear(),
            Storage::Tree(map) => map.clear(),
            Storage::Single(slot) => *slot = None,
        }
    }

    /// The number of entries.
    pub fn size(&self) -> usize {
        match &self.storage {
            Storage::Map(map) => map.len(),
            Storage::Tree(map) => map.len(),
            Storage::Single(slot) => usize::from(slot.is_some()),
        }
    }

    /// Whether `path` has content.
    pub fn has_content(&self, path: impl Into<RepoPath>) -> bool {
        self.get(path).is_some()
    }

    /// Whether the area has any entries at all.
    pub fn has_any_content(&self) -> bool {
        self.size() > 0
    }

    /// Iterates `(path, content)` pairs in this area's declared order.
    pub fn iter(&self) -> impl Iterator<Item = (&RepoPath, &C)> {
        let boxed: Box<dyn Iterator<Item = (&RepoPath, &C)>> = match &self.storage {
            Storage::Map(map) => Box::new(map.iter()),
            Storage::Tree(map) => Box::new(map.iter()),
            Storage::Single(slot) => Box::new(slot.iter().map(|(p, c)| (p, c))),
        };
        boxed
    }

    /// Atomically clears this area and re-fills it from `entries`, in order.
    pub fn replace_all_content(&mut self, entries: impl IntoIterator<Item = (RepoPath, C)>) {
        self.clear();
        for (path, content) in entries {
            self.put(path, content);
        }
    }
}

/// Builds empty [`ContentArea`]s of a fixed flavor. Supplied by the host to
/// [`checkout`](crate::commit_engine::checkout) and to
/// [`crate::handler::RepoHandler::create_area`] so the engines never decide
/// on their own which backing container a caller wants.
pub trait AreaFactory<C = Content> {
    /// Builds a new, empty area.
    fn create(&self) -> ContentArea<C>;
}

/// An [`AreaFactory`] that always builds areas of a fixed [`AreaKind`].
#[derive(Debug, Clone, Copy)]
pub struct KindAreaFactory(pub AreaKind);

impl<C> AreaFactory<C> for KindAreaFactory {
    fn create(&self) -> ContentArea<C> {
        match self.0 {
            AreaKind::Hash => ContentArea::hash(),
            AreaKind::Linked => ContentArea::linked(),
            AreaKind::Tree => ContentArea::tree(),
            AreaKind::Single => ContentArea::single(),
        }
    }
}

impl ContentArea<Content> {
    /// Inserts raw bytes as [`Content::bytes`] at `path`.
    pub fn put_bytes(&mut self, path: impl Into<RepoPath>, bytes: impl Into<std::rc::Rc<[u8]>>) {
        self.put(path, Content::bytes(bytes));
    }

    /// Inserts a UTF-8 string as [`Content::string`] at `path`.
    pub fn put_string(&mut self, path: impl Into<RepoPath>, value: impl AsRef<str>) {
        self.put(path, Content::string(value));
    }

    /// Inserts a string tagged with a non-default [`Charset`] at `path`.
    pub fn put_encoded_string(
        &mut self,
        path: impl Into<RepoPath>,
        value: impl AsRef<str>,
        charset: Charset,
    ) {
        self.put(path, Content::encoded_string(value, charset));
    }

    /// Renders a deterministic diagnostic dump: one `"{path} : {repr}"` line
    /// per entry, in this area's iteration order, joined by `\n`.
    pub fn as_list_string(&self) -> String {
        use itertools::Itertools as _;

        self.iter()
            .map(|(path, content)| format!("{path} : {}", content.repr()))
            .join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn put_canonicalizes_relative_paths() {
        let mut area = ContentArea::hash();
        area.put_string("a", "x");
        assert!(area.has_content("/a"));
    }

    #[test]
    fn put_replaces_existing_entry() {
        let mut area = ContentArea::hash();
        area.put_string("/a", "x");
        area.put_string("/a", "y");
        assert_eq!(area.size(), 1);
        assert_eq!(area.get("/a").unwrap().repr(), "'y'");
    }

    #[test]
    fn remove_is_idempotent() {
        let mut area = ContentArea::hash();
        area.remove("/a");
        area.put_string("/a", "x");
        area.remove("/a");
        area.remove("/a");
        assert!(!area.has_content("/a"));
    }

    #[test]
    fn linked_area_iterates_in_insertion_order() {
        let mut area = ContentArea::linked();
        area.put_string("/c", "1");
        area.put_string("/a", "2");
        area.put_string("/b", "3");
        let paths: Vec<_> = area.iter().map(|(p, _)| p.as_str().to_owned()).collect();
        assert_eq!(paths, vec!["/c", "/a", "/b"]);
    }

    #[test]
    fn tree_area_iterates_sorted_by_path() {
        let mut area = ContentArea::tree();
        area.put_string("/c", "1");
        area.put_string("/a", "2");
        area.put_string("/b", "3");
        let paths: Vec<_> = area.iter().map(|(p, _)| p.as_str().to_owned()).collect();
        assert_eq!(paths, vec!["/a", "/b", "/c"]);
    }

    #[test]
    fn single_area_put_overwrites_path_and_content() {
        let mut area = ContentArea::single();
        area.put_string("/a", "x");
        area.put_string("/b", "y");
        assert_eq!(area.size(), 1);
        assert!(!area.has_content("/a"));
        assert_eq!(area.get("/b").unwrap().repr(), "'y'");
    }

    #[test]
    fn as_list_string_format() {
        let mut area = ContentArea::tree();
        area.put_string("/a", "A1");
        area.put_bytes("/b", vec![1, 2]);
        assert_eq!(area.as_list_string(), "/a : 'A1'\n/b : [1, 2]");
    }

    #[test]
    fn replace_all_content_clears_then_refills() {
        let mut area = ContentArea::tree();
        area.put_string("/old", "x");
        area.replace_all_content([
            (RepoPath::at("/a"), Content::string("1")),
            (RepoPath::at("/b"), Content::string("2")),
        ]);
        assert!(!area.has_content("/old"));
        assert_eq!(area.size(), 2);
    }

    #[test]
    fn clear_empties_every_flavor() {
        for mut area in [
            ContentArea::hash(),
            ContentArea::linked(),
            ContentArea::tree(),
            ContentArea::single(),
        ] {
            area.put_string("/a", "x");
            area.clear();
            assert!(!area.has_any_content());
        }
    }
}
