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

//! [`RepoHandler`]: the single entry point a host actually talks to.
//!
//! Binds a [`Repository`] together with its [`ByteArrayIndex`], [`Clock`],
//! area/content factories, and a [`ConflictPolicy`], and forwards every call
//! to the stateless engine functions in [`crate::commit_engine`],
//! [`crate::compare`], [`crate::diff`], [`crate::merge`], and
//! [`crate::search`]. Grounded in the teacher's own thin `Transaction`/`Repo`
//! facade style (`repo.rs`), which likewise holds the mutable state and
//! delegates the actual work to free-standing backend calls.

use std::rc::Rc;

use crate::byte_array_index::ByteArrayIndex;
use crate::clock::Clock;
use crate::commit::Commit;
use crate::commit_engine::CommitError;
use crate::compare::Comparison;
use crate::content::Content;
use crate::content::ContentFactory;
use crate::content::DefaultContentFactory;
use crate::content_area::AreaFactory;
use crate::content_area::ContentArea;
use crate::content_area::KindAreaFactory;
use crate::diff::Difference;
use crate::error::MergeError;
use crate::error::SearchError;
use crate::merge::ConflictPolicy;
use crate::merge::LastWins;
use crate::repository::BranchName;
use crate::repository::Repository;
use crate::repository::TagName;
use crate::search::BoolExpr;
use crate::search::CommitExpr;
use crate::search::CommitListExpr;

/// Binds a [`Repository`] with its collaborators and exposes the kernel's
/// whole surface as plain methods.
pub struct RepoHandler<I, F = KindAreaFactory, C = DefaultContentFactory, P = LastWins>
where
    I: ByteArrayIndex,
    F: AreaFactory<Content>,
    C: ContentFactory,
    P: ConflictPolicy,
{
    repo: Repository,
    index: I,
    clock: Box<dyn Clock>,
    area_factory: F,
    content_factory: C,
    conflict_policy: P,
}

impl<I> RepoHandler<I, KindAreaFactory, DefaultContentFactory, LastWins>
where
    I: ByteArrayIndex,
{
    /// A handler over a fresh, empty repository, using hash-flavored areas,
    /// the default content factory, and last-writer-wins conflict
    /// resolution.
    pub fn new(index: I, clock: Box<dyn Clock>, area_kind: crate::content_area::AreaKind) -> Self {
        Self {
            repo: Repository::new(),
            index,
            clock,
            area_factory: KindAreaFactory(area_kind),
            content_factory: DefaultContentFactory,
            conflict_policy: LastWins,
        }
    }
}

impl<I, F, C, P> RepoHandler<I, F, C, P>
where
    I: ByteArrayIndex,
    F: AreaFactory<Content>,
    C: ContentFactory,
    P: ConflictPolicy,
{
    /// Builds a handler from fully explicit collaborators.
    pub fn with_collaborators(
        repo: Repository,
        index: I,
        clock: Box<dyn Clock>,
        area_factory: F,
        content_factory: C,
        conflict_policy: P,
    ) -> Self {
        Self {
            repo,
            index,
            clock,
            area_factory,
            content_factory,
            conflict_policy,
        }
    }

    /// A read-only view of the underlying repository, e.g. for search.
    pub fn repository(&self) -> &Repository {
        &self.repo
    }

    /// Builds a fresh, empty area via this handler's area factory.
    pub fn create_area(&self) -> ContentArea {
        self.area_factory.create()
    }

    /// Records `area` as a new dangling commit.
    pub fn commit(
        &mut self,
        area: &ContentArea,
        message: impl Into<String>,
        first_parent: Option<Rc<Commit>>,
        other_parents: Vec<Rc<Commit>>,
    ) -> Result<Rc<Commit>, CommitError> {
        crate::commit_engine::commit(
            area,
            message,
            &mut self.repo,
            &mut self.index,
            self.clock.as_ref(),
            first_parent,
            other_parents,
        )
    }

    /// Records `area` as a new commit and repoints `branch_name` at it.
    pub fn commit_to_branch(
        &mut self,
        area: &ContentArea,
        message: impl Into<String>,
        branch_name: impl Into<BranchName>,
        extra_parents: Vec<Rc<Commit>>,
    ) -> Result<Rc<Commit>, CommitError> {
        crate::commit_engine::commit_to_branch(
            area,
            message,
            branch_name,
            &mut self.repo,
            &mut self.index,
            self.clock.as_ref(),
            extra_parents,
        )
    }

    /// Reconstructs the area recorded by `commit`.
    pub fn checkout(&self, commit: &Commit) -> ContentArea {
        crate::commit_engine::checkout(commit, &self.area_factory, &self.content_factory)
    }

    /// Makes `name` point at `commit`.
    pub fn create_branch_at_commit(&mut self, name: impl Into<BranchName>, commit: Rc<Commit>) {
        crate::commit_engine::create_branch_at_commit(&mut self.repo, name, commit);
    }

    /// The tip commit of branch `name`, if it exists.
    pub fn get_latest_commit_for_branch(&self, name: &str) -> Option<&Rc<Commit>> {
        crate::commit_engine::get_latest_commit_for_branch(&self.repo, name)
    }

    /// Every branch name.
    pub fn get_branch_names(&self) -> impl Iterator<Item = &BranchName> {
        self.repo.branch_names()
    }

    /// Removes branch `name`.
    pub fn remove_branch(&mut self, name: &str) {
        crate::commit_engine::remove_branch(&mut self.repo, name);
    }

    /// Tags `commit` as `name`.
    pub fn tag_commit(&mut self, name: impl Into<TagName>, commit: Rc<Commit>) {
        crate::commit_engine::tag_commit(&mut self.repo, name, commit);
    }

    /// The commit tagged `name`, if it exists.
    pub fn get_commit_for_tag(&self, name: &str) -> Option<&Rc<Commit>> {
        crate::commit_engine::get_commit_for_tag(&self.repo, name)
    }

    /// Removes tag `name`.
    pub fn remove_tag(&mut self, name: &str) {
        crate::commit_engine::remove_tag(&mut self.repo, name);
    }

    /// Every tag name.
    pub fn get_tag_names(&self) -> impl Iterator<Item = &TagName> {
        self.repo.tag_names()
    }

    /// Classifies every path of `from`/`to` as unchanged, changed, added, or
    /// deleted.
    pub fn compute_comparison_between(&self, from: &ContentArea, to: &ContentArea) -> Comparison {
        crate::compare::compute(from, to)
    }

    /// Like [`Self::compute_comparison_between`], omitting unchanged paths.
    pub fn compute_difference_between(&self, from: &ContentArea, to: &ContentArea) -> Difference {
        crate::diff::compute(from, to)
    }

    /// Merges `source_name` into `destination_name`, committing the result.
    pub fn merge_into_branch_from_another_branch(
        &mut self,
        destination_name: &str,
        source_name: &str,
        message: impl Into<String>,
    ) -> Result<Rc<Commit>, MergeError> {
        crate::merge::merge_into_branch_from_another_branch(
            &mut self.repo,
            destination_name,
            source_name,
            message,
            &self.area_factory,
            &self.content_factory,
            &mut self.index,
            self.clock.as_ref(),
            &self.conflict_policy,
        )
    }

    /// Evaluates a list-of-commit search expression.
    pub fn search_commits(&self, expr: &CommitListExpr) -> Vec<Rc<Commit>> {
        crate::search::evaluate_commit_list(expr, &self.repo)
    }

    /// Evaluates a single-commit search expression.
    pub fn search_commit(&self, expr: &CommitExpr) -> Result<Rc<Commit>, SearchError> {
        crate::search::evaluate_commit(expr, &self.repo)
    }

    /// Evaluates a boolean search expression.
    pub fn search_bool(&self, expr: &BoolExpr) -> Result<bool, SearchError> {
        crate::search::evaluate_bool(expr, &self.repo)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::byte_array_index::HashWrapperByteArrayIndex;
    use crate::clock::FixedClock;
    use crate::clock::Timestamp;
    use crate::content_area::AreaKind;

    fn ts(seconds: i64) -> Timestamp {
        Timestamp::new(chrono::DateTime::from_timestamp(seconds, 0).unwrap())
    }

    fn handler_with_clock(instants: impl IntoIterator<Item = Timestamp>) -> RepoHandler<HashWrapperByteArrayIndex> {
        RepoHandler::new(
            HashWrapperByteArrayIndex::new(),
            Box::new(FixedClock::new(instants)),
            AreaKind::Hash,
        )
    }

    #[test]
    fn end_to_end_hello_world_scenario() {
        let mut handler = handler_with_clock([ts(1), ts(2)]);
        let mut area = handler.create_area();
        area.put_string("/", "Hello World");
        let c1 = handler.commit(&area, "Commit 1", None, vec![]).unwrap();
        assert!(handler.repository().is_dangling(c1.id()));

        area.put_string("/A", "A");
        let c2 = handler.commit(&area, "Commit 2", Some(c1.clone()), vec![]).unwrap();
        assert_eq!(c2.first_parent().unwrap().id(), c1.id());
        assert!(!handler.repository().is_dangling(c1.id()));
        assert!(handler.repository().is_dangling(c2.id()));
    }

    #[test]
    fn end_to_end_branch_and_tag_bookkeeping() {
        let mut handler = handler_with_clock([ts(1), ts(2)]);
        let mut area = handler.create_area();
        area.put_string("/", "v1");
        let c1 = handler.commit_to_branch(&area, "c1", "master", vec![]).unwrap();
        handler.tag_commit("Tag 1", c1.clone());
        assert_eq!(handler.get_commit_for_tag("Tag 1").unwrap().id(), c1.id());

        area.put_string("/", "v2");
        let c2 = handler.commit_to_branch(&area, "c2", "master", vec![]).unwrap();
        handler.tag_commit("Tag 1", c2.clone());
        assert_eq!(handler.get_tag_names().count(), 1);
        assert_eq!(handler.get_commit_for_tag("Tag 1").unwrap().id(), c2.id());

        handler.remove_tag("Tag 1");
        assert_eq!(handler.get_tag_names().count(), 0);
    }

    #[test]
    fn checkout_round_trips_through_the_handler() {
        let mut handler = handler_with_clock([ts(1)]);
        let mut area = handler.create_area();
        area.put_string("/a", "A1");
        let commit = handler.commit(&area, "msg", None, vec![]).unwrap();
        let checked_out = handler.checkout(&commit);
        assert_eq!(checked_out.get("/a").unwrap().repr(), "'A1'");
    }
}
