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

//! Turns a [`ContentArea`] into a [`Commit`] and back.
//!
//! Grounded in `jj-lib`'s `transaction.rs`/`commit_builder.rs` split between
//! "build the commit object" and "update the view", except collapsed to a
//! handful of free functions operating on an explicit `&mut Repository`
//! rather than a transaction object, since this kernel has no on-disk
//! operation log to stage against.

use std::rc::Rc;

use thiserror::Error;
use tracing::instrument;

use crate::byte_array_index::ByteArrayIndex;
use crate::clock::Clock;
use crate::commit::Commit;
use crate::commit::SnapshotEntry;
use crate::content::Content;
use crate::content::ContentFactory;
use crate::content_area::AreaFactory;
use crate::content_area::ContentArea;
use crate::repo_path::RepoPath;
use crate::repository::BranchName;
use crate::repository::Repository;
use crate::repository::TagName;

/// Currently has no failure mode; kept as a typed result so call sites don't
/// need to change if one is added later, the way `jj-lib` keeps
/// `BackendResult` on paths that rarely fail.
#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum CommitError {}

/// Records `area`'s current contents as a new immutable [`Commit`], interning
/// every entry's bytes through `index` first. The new commit is recorded in
/// `repo` (see [`Repository::record_commit`]) but is not pointed at by any
/// branch; it starts out dangling.
#[instrument(skip(area, message, repo, index, clock, first_parent, other_parents))]
pub fn commit(
    area: &ContentArea,
    message: impl Into<String>,
    repo: &mut Repository,
    index: &mut dyn ByteArrayIndex,
    clock: &dyn Clock,
    first_parent: Option<Rc<Commit>>,
    other_parents: Vec<Rc<Commit>>,
) -> Result<Rc<Commit>, CommitError> {
    let snapshot: Vec<(RepoPath, SnapshotEntry)> = area
        .iter()
        .map(|(path, content)| {
            let bytes = index.add_or_lookup(content.byte_array_handle());
            (
                path.clone(),
                SnapshotEntry {
                    bytes,
                    kind: content.kind(),
                },
            )
        })
        .collect();
    let commit = Commit::new(clock.now(), message.into(), snapshot, first_parent, other_parents);
    repo.record_commit(commit.clone());
    tracing::debug!(commit_id = %commit.id(), "created commit");
    Ok(commit)
}

/// Like [`commit`], but also makes `branch_name`'s tip the new commit's first
/// parent (if the branch already existed) and repoints the branch at the new
/// commit afterwards.
#[instrument(skip(area, message, branch_name, repo, index, clock, extra_parents))]
pub fn commit_to_branch(
    area: &ContentArea,
    message: impl Into<String>,
    branch_name: impl Into<BranchName>,
    repo: &mut Repository,
    index: &mut dyn ByteArrayIndex,
    clock: &dyn Clock,
    extra_parents: Vec<Rc<Commit>>,
) -> Result<Rc<Commit>, CommitError> {
    let branch_name = branch_name.into();
    let first_parent = repo.branch_tip(&branch_name).cloned();
    let new_commit = commit(area, message, repo, index, clock, first_parent, extra_parents)?;
    repo.set_branch_tip(branch_name, new_commit.clone());
    Ok(new_commit)
}

/// Reconstructs an area from a commit's snapshot: a fresh area built via
/// `area_factory`, populated by re-wrapping each snapshot entry's interned
/// bytes through `content_factory`. The returned area shares no mutable state
/// with `commit` or with any other checkout of it.
pub fn checkout(
    commit: &Commit,
    area_factory: &dyn AreaFactory,
    content_factory: &dyn ContentFactory,
) -> ContentArea {
    let mut area = area_factory.create();
    for (path, entry) in commit.snapshot() {
        let content: Content = content_factory.make(entry.bytes.clone(), entry.kind);
        area.put(path.clone(), content);
    }
    area
}

/// Makes `name` point at `commit`, creating the branch if absent.
pub fn create_branch_at_commit(repo: &mut Repository, name: impl Into<BranchName>, commit: Rc<Commit>) {
    repo.set_branch_tip(name, commit);
}

/// Tags `commit` as `name`, replacing any commit previously tagged `name`.
pub fn tag_commit(repo: &mut Repository, name: impl Into<TagName>, commit: Rc<Commit>) {
    repo.tag_commit(name, commit);
}

/// The commit tagged `name`, if the tag exists.
pub fn get_commit_for_tag<'a>(repo: &'a Repository, name: &str) -> Option<&'a Rc<Commit>> {
    repo.tag(name)
}

/// Removes tag `name`. A no-op if it didn't exist.
pub fn remove_tag(repo: &mut Repository, name: &str) {
    repo.remove_tag(name);
}

/// Removes branch `name`. A no-op if it didn't exist. Its tip re-enters
/// `dangling_commits` if nothing else references it.
pub fn remove_branch(repo: &mut Repository, name: &str) {
    repo.remove_branch(name);
}

/// The tip commit of branch `name`, if it exists.
pub fn get_latest_commit_for_branch<'a>(repo: &'a Repository, name: &str) -> Option<&'a Rc<Commit>> {
    repo.branch_tip(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::byte_array_index::HashWrapperByteArrayIndex;
    use crate::clock::FixedClock;
    use crate::clock::Timestamp;
    use crate::content::DefaultContentFactory;
    use crate::content_area::KindAreaFactory;

    fn ts(seconds: i64) -> Timestamp {
        Timestamp::new(chrono::DateTime::from_timestamp(seconds, 0).unwrap())
    }

    #[test]
    fn commit_starts_dangling_and_clears_parent() {
        let mut repo = Repository::new();
        let mut index = HashWrapperByteArrayIndex::new();
        let clock = FixedClock::new([ts(1), ts(2)]);

        let mut area = ContentArea::hash();
        area.put_string("/", "Hello World");
        let c1 = commit(&area, "Commit 1", &mut repo, &mut index, &clock, None, vec![]).unwrap();
        assert!(repo.is_dangling(c1.id()));

        area.put_string("/A", "A");
        let c2 = commit(
            &area,
            "Commit 2",
            &mut repo,
            &mut index,
            &clock,
            Some(c1.clone()),
            vec![],
        )
        .unwrap();
        assert_eq!(c2.first_parent().unwrap().id(), c1.id());
        assert!(!repo.is_dangling(c1.id()));
        assert!(repo.is_dangling(c2.id()));
    }

    #[test]
    fn commit_to_branch_chains_on_previous_tip() {
        let mut repo = Repository::new();
        let mut index = HashWrapperByteArrayIndex::new();
        let clock = FixedClock::new([ts(1), ts(2)]);

        let mut area = ContentArea::hash();
        area.put_string("/", "v1");
        let c1 = commit_to_branch(&area, "c1", "master", &mut repo, &mut index, &clock, vec![]).unwrap();

        area.put_string("/", "v2");
        let c2 = commit_to_branch(&area, "c2", "master", &mut repo, &mut index, &clock, vec![]).unwrap();

        assert_eq!(c2.first_parent().unwrap().id(), c1.id());
        assert_eq!(repo.branch_tip("master").unwrap().id(), c2.id());
        assert!(!repo.is_dangling(c2.id()));
    }

    #[test]
    fn checkout_is_right_inverse_of_commit() {
        let mut repo = Repository::new();
        let mut index = HashWrapperByteArrayIndex::new();
        let clock = FixedClock::new([ts(1)]);

        let mut area = ContentArea::hash();
        area.put_string("/a", "A1");
        area.put_bytes("/b", vec![1, 2, 3]);
        let c = commit(&area, "msg", &mut repo, &mut index, &clock, None, vec![]).unwrap();

        let factory = KindAreaFactory(crate::content_area::AreaKind::Hash);
        let rebuilt = checkout(&c, &factory, &DefaultContentFactory);
        assert_eq!(rebuilt.size(), area.size());
        assert_eq!(rebuilt.get("/a").unwrap().repr(), "'A1'");
        assert_eq!(rebuilt.get("/b").unwrap().as_byte_array(), &[1, 2, 3]);
    }

    #[test]
    fn tag_bookkeeping_round_trips() {
        let mut repo = Repository::new();
        let mut index = HashWrapperByteArrayIndex::new();
        let clock = FixedClock::new([ts(1)]);
        let area = ContentArea::hash();
        let c1 = commit(&area, "c1", &mut repo, &mut index, &clock, None, vec![]).unwrap();

        tag_commit(&mut repo, "Tag 1", c1.clone());
        assert_eq!(get_commit_for_tag(&repo, "Tag 1").unwrap().id(), c1.id());
        remove_tag(&mut repo, "Tag 1");
        assert!(get_commit_for_tag(&repo, "Tag 1").is_none());
    }
}
