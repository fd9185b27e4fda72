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

//! A pure, stateless comparison of two content areas.
//!
//! Grounded in the teacher's own pure compare functions over immutable trees
//! (`tree_merge.rs`'s `Merge<T>` building blocks, which never hold state
//! between calls); here reduced to one free function and a flat result map,
//! since there is no tree structure to recurse into.

use std::collections::BTreeMap;

use crate::content::Content;
use crate::content_area::ContentArea;
use crate::repo_path::RepoPath;

/// How a path's content differs between a "from" area and a "to" area.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComparisonState {
    /// Present in both areas with byte-identical content.
    Unchanged,
    /// Present in both areas with different content.
    Changed,
    /// Present only in the "to" area.
    Added,
    /// Present only in the "from" area.
    Deleted,
}

impl ComparisonState {
    fn name(self) -> &'static str {
        match self {
            Self::Unchanged => "Unchanged",
            Self::Changed => "Changed",
            Self::Added => "Added",
            Self::Deleted => "Deleted",
        }
    }
}

impl std::fmt::Display for ComparisonState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// A path -> [`ComparisonState`] classification covering every path present
/// in either input area.
#[derive(Debug, Clone, Default)]
pub struct Comparison(BTreeMap<RepoPath, ComparisonState>);

impl Comparison {
    /// The classification for `path`, if it appeared in either input area.
    pub fn get(&self, path: &RepoPath) -> Option<ComparisonState> {
        self.0.get(path).copied()
    }

    /// Iterates `(path, state)` pairs in ascending path order.
    pub fn iter(&self) -> impl Iterator<Item = (&RepoPath, ComparisonState)> {
        self.0.iter().map(|(p, s)| (p, *s))
    }

    /// The number of classified paths.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether no paths were classified (both input areas were empty).
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Renders a deterministic `"{path} : {state}"` dump, one line per path,
    /// sorted by path regardless of the input areas' own iteration order.
    pub fn as_list_string(&self) -> String {
        use itertools::Itertools as _;

        self.0.iter().map(|(path, state)| format!("{path} : {state}")).join("\n")
    }
}

/// Classifies every path in `from` or `to` by whether its content is
/// unchanged, changed, added, or deleted between the two areas.
pub fn compute(from: &ContentArea<Content>, to: &ContentArea<Content>) -> Comparison {
    let mut result = BTreeMap::new();
    for (path, from_content) in from.iter() {
        let state = match to.get(path.clone()) {
            None => ComparisonState::Deleted,
            Some(to_content) if to_content == from_content => ComparisonState::Unchanged,
            Some(_) => ComparisonState::Changed,
        };
        result.insert(path.clone(), state);
    }
    for (path, _) in to.iter() {
        result.entry(path.clone()).or_insert(ComparisonState::Added);
    }
    Comparison(result)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn area(entries: &[(&str, &str)]) -> ContentArea<Content> {
        let mut area = ContentArea::hash();
        for (path, value) in entries {
            area.put_string(*path, *value);
        }
        area
    }

    #[test]
    fn classifies_the_four_states() {
        let a = area(&[("/", "Root"), ("/a", "A1"), ("/b", "B1"), ("/c", "c1")]);
        let b = area(&[("/", "New Root"), ("/a", "A2"), ("/b", "B1")]);
        let comparison = compute(&a, &b);
        assert_eq!(comparison.get(&RepoPath::at("/")), Some(ComparisonState::Changed));
        assert_eq!(comparison.get(&RepoPath::at("/a")), Some(ComparisonState::Changed));
        assert_eq!(comparison.get(&RepoPath::at("/b")), Some(ComparisonState::Unchanged));
        assert_eq!(comparison.get(&RepoPath::at("/c")), Some(ComparisonState::Deleted));
        assert_eq!(comparison.len(), 3 + 1);
    }

    #[test]
    fn covers_exactly_the_union_of_paths() {
        let a = area(&[("/only-a", "x")]);
        let b = area(&[("/only-b", "y")]);
        let comparison = compute(&a, &b);
        assert_eq!(comparison.len(), 2);
        assert_eq!(comparison.get(&RepoPath::at("/only-a")), Some(ComparisonState::Deleted));
        assert_eq!(comparison.get(&RepoPath::at("/only-b")), Some(ComparisonState::Added));
    }

    #[test]
    fn as_list_string_is_sorted_by_path() {
        let a = area(&[("/z", "1"), ("/a", "2")]);
        let b = area(&[]);
        let comparison = compute(&a, &b);
        assert_eq!(comparison.as_list_string(), "/a : Deleted\n/z : Deleted");
    }
}
