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

//! The repository: branch tips, tags, and the dangling-tip set.
//!
//! Modeled on `jj-lib`'s [`View`](https://github.com/jj-vcs/jj): a
//! `BTreeMap`-of-names-to-refs plus a `HashSet` of heads, but collapsed to
//! one flat type with no subclassing, per the kernel's design notes.

use std::collections::HashMap;
use std::collections::HashSet;
use std::collections::VecDeque;
use std::rc::Rc;

use indexmap::IndexMap;

use crate::commit::Commit;
use crate::commit::CommitId;

/// A branch name. Branch and tag namespaces are independent: the same string
/// may simultaneously name a branch and a tag, pointing at different commits.
pub type BranchName = String;

/// A tag name. See [`BranchName`] for the namespace independence note.
pub type TagName = String;

/// Owns the commit graph: named branch tips, named tags, and the set of
/// dangling tips (commits with no branch, tag, or child pointing at them).
#[derive(Default)]
pub struct Repository {
    branch_tips: IndexMap<BranchName, Rc<Commit>>,
    tags: IndexMap<TagName, Rc<Commit>>,
    dangling: IndexMap<CommitId, Rc<Commit>>,
    child_counts: HashMap<CommitId, usize>,
}

impl Repository {
    /// An empty repository: no branches, no tags, no commits.
    pub fn new() -> Self {
        Self::default()
    }

    /// The tip commit of branch `name`, if the branch exists.
    pub fn branch_tip(&self, name: &str) -> Option<&Rc<Commit>> {
        self.branch_tips.get(name)
    }

    /// The commit tagged `name`, if the tag exists.
    pub fn tag(&self, name: &str) -> Option<&Rc<Commit>> {
        self.tags.get(name)
    }

    /// All branch names, in creation order.
    pub fn branch_names(&self) -> impl Iterator<Item = &BranchName> {
        self.branch_tips.keys()
    }

    /// All tag names, in creation order.
    pub fn tag_names(&self) -> impl Iterator<Item = &TagName> {
        self.tags.keys()
    }

    /// The commits of branch `name`, as a single-element list (empty if the
    /// branch is missing). Used by the search evaluator's `BranchCommits`.
    pub fn commits_of_branch(&self, name: &str) -> Vec<Rc<Commit>> {
        self.branch_tip(name).cloned().into_iter().collect()
    }

    /// The commits tagged `name`, as a single-element list (empty if the tag
    /// is missing). Used by the search evaluator's `TagCommits`.
    pub fn commits_of_tag(&self, name: &str) -> Vec<Rc<Commit>> {
        self.tag(name).cloned().into_iter().collect()
    }

    /// Whether `id` is currently a dangling tip.
    pub fn is_dangling(&self, id: &CommitId) -> bool {
        self.dangling.contains_key(id)
    }

    /// The current dangling tips, in the order they became dangling.
    pub fn dangling_commits(&self) -> impl Iterator<Item = &Rc<Commit>> {
        self.dangling.values()
    }

    /// Every commit reachable from a branch tip, a tag, or a dangling tip,
    /// i.e. the entire graph. Used by the search evaluator's `AllRepoCommits`.
    pub fn all_commits(&self) -> Vec<Rc<Commit>> {
        let mut seen: HashSet<CommitId> = HashSet::new();
        let mut order = Vec::new();
        let mut queue: VecDeque<Rc<Commit>> = self
            .branch_tips
            .values()
            .chain(self.tags.values())
            .chain(self.dangling.values())
            .cloned()
            .collect();
        while let Some(commit) = queue.pop_front() {
            if !seen.insert(commit.id().clone()) {
                continue;
            }
            for parent in commit.parents() {
                queue.push_back(parent.clone());
            }
            order.push(commit);
        }
        order
    }

    /// Records a newly constructed commit in the graph: its parents are no
    /// longer tips (they gain a child and leave `danglingCommits` if they
    /// were there), and the new commit itself starts out dangling. A
    /// subsequent [`Repository::set_branch_tip`] or [`Repository::set_tag`]
    /// call removes it from `danglingCommits` again.
    pub fn record_commit(&mut self, commit: Rc<Commit>) {
        for parent in commit.parents() {
            *self.child_counts.entry(parent.id().clone()).or_insert(0) += 1;
            self.dangling.shift_remove(parent.id());
        }
        self.dangling.insert(commit.id().clone(), commit);
    }

    /// Points branch `name` at `commit`, creating the branch if it didn't
    /// exist. If `commit` was dangling, it stops being so. If `name` already
    /// pointed at a different commit and that commit is now pointed at by
    /// nothing else and has no children, it re-enters `danglingCommits`.
    pub fn set_branch_tip(&mut self, name: impl Into<BranchName>, commit: Rc<Commit>) {
        self.dangling.shift_remove(commit.id());
        let previous = self.branch_tips.insert(name.into(), commit);
        if let Some(previous) = previous {
            self.reconsider_dangling(&previous);
        }
    }

    /// Removes branch `name`. If its tip commit is now pointed at by nothing
    /// else and has no children, it re-enters `danglingCommits`.
    pub fn remove_branch(&mut self, name: &str) -> Option<Rc<Commit>> {
        let removed = self.branch_tips.shift_remove(name);
        if let Some(commit) = &removed {
            self.reconsider_dangling(commit);
        }
        removed
    }

    /// Tags `commit` as `name`, replacing any previous commit that name
    /// pointed at. If the previously tagged commit is now pointed at by
    /// nothing else and has no children, it re-enters `danglingCommits`.
    pub fn tag_commit(&mut self, name: impl Into<TagName>, commit: Rc<Commit>) {
        self.dangling.shift_remove(commit.id());
        let name = name.into();
        let previous = self.tags.insert(name, commit);
        if let Some(previous) = previous {
            self.reconsider_dangling(&previous);
        }
    }

    /// Removes tag `name`. If its commit is now pointed at by nothing else
    /// and has no children, it re-enters `danglingCommits`.
    pub fn remove_tag(&mut self, name: &str) -> Option<Rc<Commit>> {
        let removed = self.tags.shift_remove(name);
        if let Some(commit) = &removed {
            self.reconsider_dangling(commit);
        }
        removed
    }

    fn reconsider_dangling(&mut self, commit: &Rc<Commit>) {
        let still_referenced = self.branch_tips.values().any(|c| c.id() == commit.id())
            || self.tags.values().any(|c| c.id() == commit.id());
        let has_children = self.child_counts.get(commit.id()).copied().unwrap_or(0) > 0;
        if !still_referenced && !has_children {
            self.dangling.insert(commit.id().clone(), commit.clone());
        }
    }
}
