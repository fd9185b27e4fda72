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

//! Three-way and two-way merges of content areas, with a pluggable conflict
//! resolution strategy.
//!
//! The per-path decision table is grounded in the teacher's own small
//! strategy-trait style (`rewrite.rs`'s rebase options, `tree_merge.rs`'s
//! `Merge<T>` resolution helpers): two stateless free functions drive the
//! table, a `ConflictPolicy` trait supplies the few cells that need a
//! tie-break.

use std::collections::HashSet;
use std::collections::VecDeque;
use std::rc::Rc;

use tracing::instrument;

use crate::byte_array_index::ByteArrayIndex;
use crate::clock::Clock;
use crate::commit::Commit;
use crate::commit::CommitId;
use crate::compare::ComparisonState;
use crate::content::Content;
use crate::content::ContentFactory;
use crate::content_area::AreaFactory;
use crate::content_area::ContentArea;
use crate::diff::Difference;
use crate::diff::DifferenceState;
use crate::error::MergeError;
use crate::repository::Repository;

/// Resolves a single path whose content was touched on both sides of a
/// merge. `LastWins` and `DiffFromCommonAncestor` are the two named
/// implementors; a host may supply its own.
pub trait ConflictPolicy {
    /// Both sides changed the path relative to the ancestor.
    fn resolve_both_changed(
        &self,
        source: &Content,
        source_commit: &Commit,
        dest: &Content,
        dest_commit: &Commit,
    ) -> Option<Content>;

    /// The source changed the path; the destination deleted it.
    fn resolve_source_changed_dest_deleted(
        &self,
        source: &Content,
        source_commit: &Commit,
        dest_commit: &Commit,
    ) -> Option<Content>;

    /// The source deleted the path; the destination changed it.
    fn resolve_source_deleted_dest_changed(
        &self,
        dest: &Content,
        source_commit: &Commit,
        dest_commit: &Commit,
    ) -> Option<Content>;
}

/// The default policy: the content from whichever commit is strictly later
/// wins; ties (and the destination-deleted / source-deleted edge cases) go
/// to the destination.
#[derive(Debug, Default, Clone, Copy)]
pub struct LastWins;

impl ConflictPolicy for LastWins {
    fn resolve_both_changed(
        &self,
        source: &Content,
        source_commit: &Commit,
        dest: &Content,
        dest_commit: &Commit,
    ) -> Option<Content> {
        if source_commit.timestamp().is_after(&dest_commit.timestamp()) {
            Some(source.clone())
        } else {
            Some(dest.clone())
        }
    }

    fn resolve_source_changed_dest_deleted(
        &self,
        source: &Content,
        source_commit: &Commit,
        dest_commit: &Commit,
    ) -> Option<Content> {
        if source_commit.timestamp().is_after(&dest_commit.timestamp()) {
            Some(source.clone())
        } else {
            None
        }
    }

    fn resolve_source_deleted_dest_changed(
        &self,
        dest: &Content,
        source_commit: &Commit,
        dest_commit: &Commit,
    ) -> Option<Content> {
        if !source_commit.timestamp().is_after(&dest_commit.timestamp()) {
            Some(dest.clone())
        } else {
            None
        }
    }
}

/// No conflict handling: overlays the destination area with the source's
/// diff from the common ancestor applied on top. A path changed on both
/// sides simply takes the source's value; a path the source deleted is
/// removed even if the destination also touched it.
#[derive(Debug, Default, Clone, Copy)]
pub struct DiffFromCommonAncestor;

impl ConflictPolicy for DiffFromCommonAncestor {
    fn resolve_both_changed(
        &self,
        source: &Content,
        _source_commit: &Commit,
        _dest: &Content,
        _dest_commit: &Commit,
    ) -> Option<Content> {
        Some(source.clone())
    }

    fn resolve_source_changed_dest_deleted(
        &self,
        source: &Content,
        _source_commit: &Commit,
        _dest_commit: &Commit,
    ) -> Option<Content> {
        Some(source.clone())
    }

    fn resolve_source_deleted_dest_changed(
        &self,
        _dest: &Content,
        _source_commit: &Commit,
        _dest_commit: &Commit,
    ) -> Option<Content> {
        None
    }
}

/// Merges `source_area` and `dest_area` into `out`, using their common
/// ancestor's diffs to tell which side changed each path. `out` is cleared
/// first.
#[allow(clippy::too_many_arguments)]
pub fn merge_into_area_with_three_way_diff(
    out: &mut ContentArea,
    source_commit: &Commit,
    dest_commit: &Commit,
    source_area: &ContentArea,
    dest_area: &ContentArea,
    compare_src_dst: &crate::compare::Comparison,
    diff_anc_src: &Difference,
    diff_anc_dst: &Difference,
    content_factory: &dyn ContentFactory,
    index: &mut dyn ByteArrayIndex,
    policy: &dyn ConflictPolicy,
) {
    out.clear();
    for (path, state) in compare_src_dst.iter() {
        let resolved = match state {
            ComparisonState::Added | ComparisonState::Unchanged => source_area.get(path.clone()).cloned(),
            ComparisonState::Deleted => None,
            ComparisonState::Changed => {
                resolve_changed_path(path, source_area, dest_area, diff_anc_src, diff_anc_dst, source_commit, dest_commit, policy)
            }
        };
        write_resolved(out, path.clone(), resolved, content_factory, index);
    }
}

#[allow(clippy::too_many_arguments)]
fn resolve_changed_path(
    path: &crate::repo_path::RepoPath,
    source_area: &ContentArea,
    dest_area: &ContentArea,
    diff_anc_src: &Difference,
    diff_anc_dst: &Difference,
    source_commit: &Commit,
    dest_commit: &Commit,
    policy: &dyn ConflictPolicy,
) -> Option<Content> {
    let anc_src = diff_anc_src.get(path);
    let anc_dst = diff_anc_dst.get(path);
    use DifferenceState::{Added, Changed, Deleted};
    match (anc_src, anc_dst) {
        (None, None) => None,
        (None, Some(Added | Changed)) => dest_area.get(path.clone()).cloned(),
        (None, Some(Deleted)) => None,
        (Some(Added | Changed), None) => source_area.get(path.clone()).cloned(),
        (Some(Added | Changed), Some(Added | Changed)) => {
            match (source_area.get(path.clone()), dest_area.get(path.clone())) {
                (Some(s), Some(d)) => policy.resolve_both_changed(s, source_commit, d, dest_commit),
                _ => None,
            }
        }
        (Some(Added | Changed), Some(Deleted)) => source_area
            .get(path.clone())
            .and_then(|s| policy.resolve_source_changed_dest_deleted(s, source_commit, dest_commit)),
        (Some(Deleted), None) => None,
        (Some(Deleted), Some(Added | Changed)) => dest_area
            .get(path.clone())
            .and_then(|d| policy.resolve_source_deleted_dest_changed(d, source_commit, dest_commit)),
        (Some(Deleted), Some(Deleted)) => None,
    }
}

/// Merges two commits with no common ancestor: added paths come from the
/// source, deleted/unchanged paths keep the destination, and changed paths
/// go through `policy`'s both-changed resolution.
pub fn merge_into_area_with_two_way_diff(
    out: &mut ContentArea,
    source_commit: &Commit,
    dest_commit: &Commit,
    source_area: &ContentArea,
    dest_area: &ContentArea,
    compare: &crate::compare::Comparison,
    content_factory: &dyn ContentFactory,
    index: &mut dyn ByteArrayIndex,
    policy: &dyn ConflictPolicy,
) {
    out.clear();
    for (path, state) in compare.iter() {
        let resolved = match state {
            ComparisonState::Added => source_area.get(path.clone()).cloned(),
            ComparisonState::Deleted | ComparisonState::Unchanged => dest_area.get(path.clone()).cloned(),
            ComparisonState::Changed => match (source_area.get(path.clone()), dest_area.get(path.clone())) {
                (Some(s), Some(d)) => policy.resolve_both_changed(s, source_commit, d, dest_commit),
                _ => None,
            },
        };
        write_resolved(out, path.clone(), resolved, content_factory, index);
    }
}

fn write_resolved(
    out: &mut ContentArea,
    path: crate::repo_path::RepoPath,
    resolved: Option<Content>,
    content_factory: &dyn ContentFactory,
    index: &mut dyn ByteArrayIndex,
) {
    if let Some(content) = resolved {
        let interned = index.add_or_lookup(content.byte_array_handle());
        out.put(path, content_factory.make(interned, content.kind()));
    }
}

/// Finds a common ancestor of `a` and `b` by breadth-first search over
/// `a`'s ancestry, then a BFS over `b`'s ancestry that stops at the first
/// commit already seen from `a`'s side. Returns `None` if the graphs are
/// disconnected.
pub fn find_common_ancestor(a: &Rc<Commit>, b: &Rc<Commit>) -> Option<Rc<Commit>> {
    let mut seen: HashSet<CommitId> = HashSet::new();
    let mut queue = VecDeque::from([a.clone()]);
    while let Some(commit) = queue.pop_front() {
        if seen.insert(commit.id().clone()) {
            queue.extend(commit.parents().cloned());
        }
    }

    let mut visited: HashSet<CommitId> = HashSet::new();
    let mut queue = VecDeque::from([b.clone()]);
    while let Some(commit) = queue.pop_front() {
        if seen.contains(commit.id()) {
            return Some(commit);
        }
        if visited.insert(commit.id().clone()) {
            queue.extend(commit.parents().cloned());
        }
    }
    None
}

/// Merges branch `source_name` into branch `dest_name`: finds (or fails to
/// find) a common ancestor, runs the appropriate merge, commits the result
/// with `firstParent = dest tip, otherParents = [source tip]`, and repoints
/// `dest_name` at the new commit.
#[allow(clippy::too_many_arguments)]
#[instrument(skip(repo, message, area_factory, content_factory, index, clock, policy))]
pub fn merge_into_branch_from_another_branch(
    repo: &mut Repository,
    dest_name: &str,
    source_name: &str,
    message: impl Into<String>,
    area_factory: &dyn AreaFactory,
    content_factory: &dyn ContentFactory,
    index: &mut dyn ByteArrayIndex,
    clock: &dyn Clock,
    policy: &dyn ConflictPolicy,
) -> Result<Rc<Commit>, MergeError> {
    let dest_tip = repo
        .branch_tip(dest_name)
        .cloned()
        .ok_or_else(|| MergeError::UnknownBranch { name: dest_name.to_owned() })?;
    let source_tip = repo
        .branch_tip(source_name)
        .cloned()
        .ok_or_else(|| MergeError::UnknownBranch { name: source_name.to_owned() })?;

    let dest_area = crate::commit_engine::checkout(&dest_tip, area_factory, content_factory);
    let source_area = crate::commit_engine::checkout(&source_tip, area_factory, content_factory);
    let mut merged = area_factory.create();

    match find_common_ancestor(&source_tip, &dest_tip) {
        Some(ancestor) => {
            let ancestor_area = crate::commit_engine::checkout(&ancestor, area_factory, content_factory);
            let compare_src_dst = crate::compare::compute(&dest_area, &source_area);
            let diff_anc_src = crate::diff::compute(&ancestor_area, &source_area);
            let diff_anc_dst = crate::diff::compute(&ancestor_area, &dest_area);
            merge_into_area_with_three_way_diff(
                &mut merged,
                &source_tip,
                &dest_tip,
                &source_area,
                &dest_area,
                &compare_src_dst,
                &diff_anc_src,
                &diff_anc_dst,
                content_factory,
                index,
                policy,
            );
        }
        None => {
            let compare = crate::compare::compute(&dest_area, &source_area);
            merge_into_area_with_two_way_diff(
                &mut merged,
                &source_tip,
                &dest_tip,
                &source_area,
                &dest_area,
                &compare,
                content_factory,
                index,
                policy,
            );
        }
    }

    let commit = crate::commit_engine::commit(
        &merged,
        message,
        repo,
        index,
        clock,
        Some(dest_tip.clone()),
        vec![source_tip.clone()],
    )
    .unwrap();
    repo.set_branch_tip(dest_name.to_owned(), commit.clone());
    Ok(commit)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::byte_array_index::HashWrapperByteArrayIndex;
    use crate::clock::FixedClock;
    use crate::clock::Timestamp;
    use crate::content::DefaultContentFactory;
    use crate::content_area::AreaKind;
    use crate::content_area::KindAreaFactory;

    fn ts(seconds: i64) -> Timestamp {
        Timestamp::new(chrono::DateTime::from_timestamp(seconds, 0).unwrap())
    }

    #[test]
    fn three_way_last_wins_picks_the_later_side() {
        let mut repo = Repository::new();
        let mut index = HashWrapperByteArrayIndex::new();
        let area_factory = KindAreaFactory(AreaKind::Hash);
        let content_factory = DefaultContentFactory;

        let clock = FixedClock::new([ts(1)]);
        let mut area = ContentArea::hash();
        area.put_string("/", "Root");
        area.put_string("/a", "A1");
        area.put_string("/b", "B1");
        area.put_string("/c", "c1");
        let ancestor =
            crate::commit_engine::commit(&area, "ancestor", &mut repo, &mut index, &clock, None, vec![]).unwrap();
        repo.set_branch_tip("master", ancestor.clone());
        repo.set_branch_tip("feature", ancestor.clone());

        let clock = FixedClock::new([ts(2)]);
        let mut master_area = area.clone();
        master_area.put_string("/a", "A3");
        let master_tip = crate::commit_engine::commit_to_branch(
            &master_area,
            "master change",
            "master",
            &mut repo,
            &mut index,
            &clock,
            vec![],
        )
        .unwrap();

        let clock = FixedClock::new([ts(3)]);
        let mut feature_area = area.clone();
        feature_area.put_string("/", "New Root");
        feature_area.put_string("/a", "A2");
        feature_area.remove("/c");
        let feature_tip = crate::commit_engine::commit_to_branch(
            &feature_area,
            "feature change",
            "feature",
            &mut repo,
            &mut index,
            &clock,
            vec![],
        )
        .unwrap();

        let clock = FixedClock::new([ts(4)]);
        let merged = merge_into_branch_from_another_branch(
            &mut repo,
            "master",
            "feature",
            "Merging Feature into Master",
            &area_factory,
            &content_factory,
            &mut index,
            &clock,
            &LastWins,
        )
        .unwrap();

        assert_eq!(merged.first_parent().unwrap().id(), master_tip.id());
        assert_eq!(merged.other_parents().len(), 1);
        assert_eq!(merged.other_parents()[0].id(), feature_tip.id());
        let checked_out = crate::commit_engine::checkout(&merged, &area_factory, &content_factory);
        assert_eq!(checked_out.get("/").unwrap().repr(), "'New Root'");
        // feature's commit (ts 3) is after master's (ts 2), so feature wins on /a.
        assert_eq!(checked_out.get("/a").unwrap().repr(), "'A2'");
        assert_eq!(checked_out.get("/b").unwrap().repr(), "'B1'");
        assert!(!checked_out.has_content("/c"));
    }

    #[test]
    fn two_way_merge_has_no_common_ancestor() {
        let mut repo = Repository::new();
        let mut index = HashWrapperByteArrayIndex::new();
        let area_factory = KindAreaFactory(AreaKind::Hash);
        let content_factory = DefaultContentFactory;

        let clock = FixedClock::new([ts(1)]);
        let mut master_area = ContentArea::hash();
        master_area.put_string("/", "master root");
        master_area.put_string("/only-master", "m");
        crate::commit_engine::commit_to_branch(
            &master_area,
            "cm",
            "master",
            &mut repo,
            &mut index,
            &clock,
            vec![],
        )
        .unwrap();

        let clock = FixedClock::new([ts(2)]);
        let mut disconnected_area = ContentArea::hash();
        disconnected_area.put_string("/", "disconnected root");
        disconnected_area.put_string("/only-disconnected", "d");
        crate::commit_engine::commit_to_branch(
            &disconnected_area,
            "cd",
            "disconnected",
            &mut repo,
            &mut index,
            &clock,
            vec![],
        )
        .unwrap();

        let clock = FixedClock::new([ts(3)]);
        let merged = merge_into_branch_from_another_branch(
            &mut repo,
            "master",
            "disconnected",
            "merge disconnected",
            &area_factory,
            &content_factory,
            &mut index,
            &clock,
            &LastWins,
        )
        .unwrap();

        let checked_out = crate::commit_engine::checkout(&merged, &area_factory, &content_factory);
        assert_eq!(checked_out.get("/").unwrap().repr(), "'disconnected root'");
        assert_eq!(checked_out.get("/only-master").unwrap().repr(), "'m'");
        assert_eq!(checked_out.get("/only-disconnected").unwrap().repr(), "'d'");
    }

    #[test]
    fn merge_with_unknown_branch_fails() {
        let mut repo = Repository::new();
        let mut index = HashWrapperByteArrayIndex::new();
        let area_factory = KindAreaFactory(AreaKind::Hash);
        let content_factory = DefaultContentFactory;
        let clock = FixedClock::new([ts(1)]);

        let err = merge_into_branch_from_another_branch(
            &mut repo,
            "master",
            "does-not-exist",
            "msg",
            &area_factory,
            &content_factory,
            &mut index,
            &clock,
            &LastWins,
        )
        .unwrap_err();
        assert_eq!(err, MergeError::UnknownBranch { name: "master".to_owned() });
    }
}
