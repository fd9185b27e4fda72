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

//! A sparse view of [`crate::compare`]'s output, omitting `Unchanged` paths.
//! Used by the merge engine to characterize what changed on each side since a
//! common ancestor.

use std::collections::BTreeMap;

use crate::compare::ComparisonState;
use crate::content::Content;
use crate::content_area::ContentArea;
use crate::repo_path::RepoPath;

/// How a path changed between a "from" area and a "to" area, excluding the
/// unchanged case (see [`compute`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DifferenceState {
    /// Present only in the "to" area.
    Added,
    /// Present in both areas with different content.
    Changed,
    /// Present only in the "from" area.
    Deleted,
}

impl DifferenceState {
    fn from_comparison(state: ComparisonState) -> Option<Self> {
        match state {
            ComparisonState::Added => Some(Self::Added),
            ComparisonState::Changed => Some(Self::Changed),
            ComparisonState::Deleted => Some(Self::Deleted),
            ComparisonState::Unchanged => None,
        }
    }
}

/// A path -> [`DifferenceState`] map covering only paths whose content
/// changed, was added, or was deleted.
#[derive(Debug, Clone, Default)]
pub struct Difference(BTreeMap<RepoPath, DifferenceState>);

impl Difference {
    /// The change at `path`, if any.
    pub fn get(&self, path: &RepoPath) -> Option<DifferenceState> {
        self.0.get(path).copied()
    }

    /// Iterates `(path, state)` pairs in ascending path order.
    pub fn iter(&self) -> impl Iterator<Item = (&RepoPath, DifferenceState)> {
        self.0.iter().map(|(p, s)| (p, *s))
    }

    /// The number of changed paths.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether no paths changed.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Identical to [`crate::compare::compute`], except `Unchanged` paths are
/// omitted from the result.
pub fn compute(from: &ContentArea<Content>, to: &ContentArea<Content>) -> Difference {
    let comparison = crate::compare::compute(from, to);
    let mut result = BTreeMap::new();
    for (path, state) in comparison.iter() {
        if let Some(state) = DifferenceState::from_comparison(state) {
            result.insert(path.clone(), state);
        }
    }
    Difference(result)
}
