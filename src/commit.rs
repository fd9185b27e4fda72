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

//! Immutable commits and their identifiers.

use std::fmt;
use std::hash::Hash;
use std::rc::Rc;

use blake2::Blake2s256;
use blake2::Digest;

use crate::clock::Timestamp;
use crate::content::ContentKind;
use crate::repo_path::RepoPath;

/// A content-derived commit identifier, computed once at construction and
/// never recomputed. Commits compare, hash, and order by this id, the way
/// `jj-lib`'s `Commit` compares by its `CommitId` rather than by structural
/// equality of its fields.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CommitId(Rc<[u8]>);

impl fmt::Debug for CommitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("CommitId").field(&self.hex()).finish()
    }
}

impl fmt::Display for CommitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.hex())
    }
}

impl CommitId {
    fn hex(&self) -> String {
        self.0.iter().map(|b| format!("{b:02x}")).collect()
    }
}

/// One path's worth of content as recorded inside a commit's snapshot: the
/// interned byte array plus the content kind needed to reconstruct a
/// `Content` on checkout.
#[derive(Clone)]
pub struct SnapshotEntry {
    pub bytes: Rc<[u8]>,
    pub kind: ContentKind,
}

/// An immutable DAG node: a point-in-time content snapshot plus parent edges.
///
/// Commits are never mutated after construction and are shared by reference
/// (branch tips, tags, children, the dangling-tip set all hold the same
/// `Rc<Commit>`), mirroring how `jj-lib::commit::Commit` shares its
/// `Arc<backend::Commit>` body.
pub struct Commit {
    id: CommitId,
    timestamp: Timestamp,
    message: String,
    snapshot: Vec<(RepoPath, SnapshotEntry)>,
    first_parent: Option<Rc<Commit>>,
    other_parents: Vec<Rc<Commit>>,
}

impl Commit {
    pub(crate) fn new(
        timestamp: Timestamp,
        message: String,
        snapshot: Vec<(RepoPath, SnapshotEntry)>,
        first_parent: Option<Rc<Commit>>,
        other_parents: Vec<Rc<Commit>>,
    ) -> Rc<Self> {
        let id = compute_id(&timestamp, &message, &snapshot, &first_parent, &other_parents);
        Rc::new(Self {
            id,
            timestamp,
            message,
            snapshot,
            first_parent,
            other_parents,
        })
    }

    /// This commit's content-derived id.
    pub fn id(&self) -> &CommitId {
        &self.id
    }

    /// The timestamp supplied by the clock at commit time.
    pub fn timestamp(&self) -> Timestamp {
        self.timestamp
    }

    /// The free-form commit message.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// The commit's first parent, if any. A root commit has none.
    pub fn first_parent(&self) -> Option<&Rc<Commit>> {
        self.first_parent.as_ref()
    }

    /// Additional parents beyond the first (e.g. the merged-from branch tip
    /// of a merge commit).
    pub fn other_parents(&self) -> &[Rc<Commit>] {
        &self.other_parents
    }

    /// All parents, first parent first.
    pub fn parents(&self) -> impl Iterator<Item = &Rc<Commit>> {
        self.first_parent.iter().chain(self.other_parents.iter())
    }

    /// Whether this is a root commit (no parents).
    pub fn is_root(&self) -> bool {
        self.first_parent.is_none() && self.other_parents.is_empty()
    }

    /// The content recorded at `path` by this commit, if any.
    pub fn content_at(&self, path: &RepoPath) -> Option<&SnapshotEntry> {
        self.snapshot
            .iter()
            .find(|(p, _)| p == path)
            .map(|(_, entry)| entry)
    }

    /// Iterates the commit's snapshot in the order it was recorded.
    pub fn snapshot(&self) -> impl Iterator<Item = (&RepoPath, &SnapshotEntry)> {
        self.snapshot.iter().map(|(p, e)| (p, e))
    }
}

impl fmt::Debug for Commit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Commit")
            .field("id", &self.id)
            .field("message", &self.message)
            .finish_non_exhaustive()
    }
}

impl PartialEq for Commit {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Commit {}

impl Hash for Commit {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

fn compute_id(
    timestamp: &Timestamp,
    message: &str,
    snapshot: &[(RepoPath, SnapshotEntry)],
    first_parent: &Option<Rc<Commit>>,
    other_parents: &[Rc<Commit>],
) -> CommitId {
    let mut hasher = Blake2s256::new();
    hasher.update(timestamp.to_string().as_bytes());
    hasher.update(b"\0");
    hasher.update(message.as_bytes());
    hasher.update(b"\0");
    if let Some(parent) = first_parent {
        hasher.update(parent.id().0.as_ref());
    }
    hasher.update(b"\0");
    for parent in other_parents {
        hasher.update(parent.id().0.as_ref());
        hasher.update(b",");
    }
    hasher.update(b"\0");
    for (path, entry) in snapshot {
        hasher.update(path.as_str().as_bytes());
        hasher.update(b"=");
        hasher.update(&entry.bytes);
        hasher.update(b";");
    }
    CommitId(Rc::from(hasher.finalize().as_slice()))
}

/// Sorting key wrapping a commit by its timestamp, for use in `TipOf`-style
/// "most recent" selection. Ties break by first-seen order in the caller's
/// iteration, not by this key, so this type only provides the `<`/`>`
/// comparison, never a total order proof of identity.
pub(crate) struct ByTimestamp<'a>(pub &'a Rc<Commit>);

impl PartialEq for ByTimestamp<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.0.timestamp() == other.0.timestamp()
    }
}
impl Eq for ByTimestamp<'_> {}
impl PartialOrd for ByTimestamp<'_> {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}
impl Ord for ByTimestamp<'_> {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.0.timestamp().cmp(&other.0.timestamp())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::Clock;
    use crate::clock::FixedClock;

    fn ts(seconds: i64) -> Timestamp {
        let clock = FixedClock::new([Timestamp::new(
            chrono::DateTime::from_timestamp(seconds, 0).unwrap(),
        )]);
        clock.now()
    }

    #[test]
    fn root_commit_has_no_parents() {
        let c = Commit::new(ts(1), "root".to_owned(), vec![], None, vec![]);
        assert!(c.is_root());
        assert_eq!(c.parents().count(), 0);
    }

    #[test]
    fn equal_fields_produce_equal_ids() {
        let a = Commit::new(ts(1), "m".to_owned(), vec![], None, vec![]);
        let b = Commit::new(ts(1), "m".to_owned(), vec![], None, vec![]);
        assert_eq!(a.id(), b.id());
        assert_eq!(a, b);
    }

    #[test]
    fn different_messages_produce_different_ids() {
        let a = Commit::new(ts(1), "m1".to_owned(), vec![], None, vec![]);
        let b = Commit::new(ts(1), "m2".to_owned(), vec![], None, vec![]);
        assert_ne!(a.id(), b.id());
    }

    #[test]
    fn child_records_first_parent() {
        let c1 = Commit::new(ts(1), "c1".to_owned(), vec![], None, vec![]);
        let c2 = Commit::new(ts(2), "c2".to_owned(), vec![], Some(c1.clone()), vec![]);
        assert_eq!(c2.first_parent().unwrap().id(), c1.id());
        assert!(!c2.is_root());
    }
}
