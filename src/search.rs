// Copyright 2021 The Jujutsu Authors
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

//! A small, statically-typed search expression tree over commits.
//!
//! Grounded in the teacher's `revset.rs`: a `Rc`-linked recursive expression
//! enum, built by free constructors, walked by a separate evaluator rather
//! than interpreting itself. Unlike `revset.rs`'s single `RevsetExpression`
//! enum carrying every result shape, the result categories here (boolean,
//! single commit, commit list) are split into three small enums, since Rust
//! gives each its own evaluator with no dynamic type tag needed: the
//! teacher's own `RevsetEvaluationError` has no "wrong type" variant to port.

use std::rc::Rc;

use crate::commit::ByTimestamp;
use crate::commit::Commit;
use crate::error::SearchError;
use crate::repository::Repository;

/// A search expression yielding a list of commits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommitListExpr {
    /// Every commit in the repository.
    AllRepoCommits,
    /// The tip of branch `name`, as a singleton list, or empty if missing.
    BranchCommits(String),
    /// The commit tagged `name`, as a singleton list, or empty if missing.
    TagCommits(String),
}

/// A search expression yielding a single commit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommitExpr {
    /// A fixed commit, supplied by the caller rather than looked up in the
    /// repository. Lets `Equal`/`NotEqual`/`HasParent` compare against a
    /// commit the caller already holds, the way `revset.rs`'s own `Commit`
    /// leaf lets a fixed id appear anywhere a revset is expected.
    Constant(Rc<Commit>),
    /// The most recently timestamped commit in a list, tie-broken by
    /// first-seen order in the list's own iteration.
    TipOf(Rc<CommitListExpr>),
}

/// A search expression yielding a boolean.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BoolExpr {
    /// A fixed boolean value.
    Constant(bool),
    /// Whether two commit expressions evaluate to the same commit.
    Equal(Rc<CommitExpr>, Rc<CommitExpr>),
    /// Whether two commit expressions evaluate to different commits.
    NotEqual(Rc<CommitExpr>, Rc<CommitExpr>),
    /// Logical negation.
    Not(Rc<BoolExpr>),
    /// Logical and, short-circuiting: the right side is not evaluated if the
    /// left side is `false`.
    And(Rc<BoolExpr>, Rc<BoolExpr>),
    /// Logical or, short-circuiting: the right side is not evaluated if the
    /// left side is `true`.
    Or(Rc<BoolExpr>, Rc<BoolExpr>),
    /// Whether the right commit is an immediate parent of the left commit.
    /// Not transitive: ancestry beyond one generation is out of scope.
    HasParent(Rc<CommitExpr>, Rc<CommitExpr>),
}

/// Evaluates `expr` against `repo`, returning the commits it denotes.
pub fn evaluate_commit_list(expr: &CommitListExpr, repo: &Repository) -> Vec<Rc<Commit>> {
    match expr {
        CommitListExpr::AllRepoCommits => repo.all_commits(),
        CommitListExpr::BranchCommits(name) => repo.commits_of_branch(name),
        CommitListExpr::TagCommits(name) => repo.commits_of_tag(name),
    }
}

/// Evaluates `expr` against `repo`, returning the single commit it denotes.
pub fn evaluate_commit(expr: &CommitExpr, repo: &Repository) -> Result<Rc<Commit>, SearchError> {
    match expr {
        CommitExpr::Constant(commit) => Ok(commit.clone()),
        CommitExpr::TipOf(list) => {
            let commits = evaluate_commit_list(list, repo);
            tip_of(&commits).ok_or(SearchError::EmptyTipOf)
        }
    }
}

fn tip_of(commits: &[Rc<Commit>]) -> Option<Rc<Commit>> {
    commits
        .iter()
        .fold(None, |best, candidate| match best {
            None => Some(candidate),
            Some(best) if ByTimestamp(candidate) > ByTimestamp(best) => Some(candidate),
            Some(best) => Some(best),
        })
        .cloned()
}

/// Evaluates `expr` against `repo`, short-circuiting `And`/`Or` as documented
/// on [`BoolExpr`].
pub fn evaluate_bool(expr: &BoolExpr, repo: &Repository) -> Result<bool, SearchError> {
    match expr {
        BoolExpr::Constant(value) => Ok(*value),
        BoolExpr::Equal(l, r) => Ok(evaluate_commit(l, repo)?.id() == evaluate_commit(r, repo)?.id()),
        BoolExpr::NotEqual(l, r) => Ok(evaluate_commit(l, repo)?.id() != evaluate_commit(r, repo)?.id()),
        BoolExpr::Not(op) => Ok(!evaluate_bool(op, repo)?),
        BoolExpr::And(l, r) => Ok(evaluate_bool(l, repo)? && evaluate_bool(r, repo)?),
        BoolExpr::Or(l, r) => Ok(evaluate_bool(l, repo)? || evaluate_bool(r, repo)?),
        BoolExpr::HasParent(l, r) => {
            let parent = evaluate_commit(l, repo)?;
            let child = evaluate_commit(r, repo)?;
            Ok(parent.parents().any(|p| p.id() == child.id()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::byte_array_index::HashWrapperByteArrayIndex;
    use crate::clock::FixedClock;
    use crate::clock::Timestamp;
    use crate::content_area::ContentArea;

    fn ts(seconds: i64) -> Timestamp {
        Timestamp::new(chrono::DateTime::from_timestamp(seconds, 0).unwrap())
    }

    fn setup() -> Repository {
        let mut repo = Repository::new();
        let mut index = HashWrapperByteArrayIndex::new();
        let area = ContentArea::hash();

        let clock = FixedClock::new([ts(1)]);
        crate::commit_engine::commit_to_branch(&area, "cm", "master", &mut repo, &mut index, &clock, vec![]).unwrap();

        let clock = FixedClock::new([ts(2)]);
        crate::commit_engine::commit_to_branch(&area, "cf1", "feature", &mut repo, &mut index, &clock, vec![]).unwrap();
        let clock = FixedClock::new([ts(3)]);
        crate::commit_engine::commit_to_branch(&area, "cf2", "feature", &mut repo, &mut index, &clock, vec![]).unwrap();

        repo
    }

    #[test]
    fn tip_of_branch_commits_is_the_latest() {
        let repo = setup();
        let tip = evaluate_commit(
            &CommitExpr::TipOf(Rc::new(CommitListExpr::BranchCommits("feature".to_owned()))),
            &repo,
        )
        .unwrap();
        assert_eq!(tip.message(), "cf2");
    }

    #[test]
    fn feature_tip_is_the_most_recent_commit_repo_wide() {
        let repo = setup();
        let expr = BoolExpr::Equal(
            Rc::new(CommitExpr::TipOf(Rc::new(CommitListExpr::BranchCommits("feature".to_owned())))),
            Rc::new(CommitExpr::TipOf(Rc::new(CommitListExpr::AllRepoCommits))),
        );
        assert!(evaluate_bool(&expr, &repo).unwrap());
    }

    #[test]
    fn constant_commit_compares_equal_to_itself_via_tip_of() {
        let repo = setup();
        let feature_tip = evaluate_commit(
            &CommitExpr::TipOf(Rc::new(CommitListExpr::BranchCommits("feature".to_owned()))),
            &repo,
        )
        .unwrap();
        let expr = BoolExpr::Equal(
            Rc::new(CommitExpr::Constant(feature_tip)),
            Rc::new(CommitExpr::TipOf(Rc::new(CommitListExpr::AllRepoCommits))),
        );
        assert!(evaluate_bool(&expr, &repo).unwrap());

        let master_tip = evaluate_commit(
            &CommitExpr::TipOf(Rc::new(CommitListExpr::BranchCommits("master".to_owned()))),
            &repo,
        )
        .unwrap();
        let expr = BoolExpr::NotEqual(
            Rc::new(CommitExpr::Constant(master_tip)),
            Rc::new(CommitExpr::TipOf(Rc::new(CommitListExpr::AllRepoCommits))),
        );
        assert!(evaluate_bool(&expr, &repo).unwrap());
    }

    #[test]
    fn and_or_short_circuit_to_the_correct_value() {
        let repo = setup();
        let expr = BoolExpr::And(
            Rc::new(BoolExpr::Constant(true)),
            Rc::new(BoolExpr::Or(Rc::new(BoolExpr::Constant(false)), Rc::new(BoolExpr::Constant(true)))),
        );
        assert!(evaluate_bool(&expr, &repo).unwrap());
    }

    #[test]
    fn tip_of_missing_branch_fails() {
        let repo = setup();
        let err = evaluate_commit(
            &CommitExpr::TipOf(Rc::new(CommitListExpr::BranchCommits("absent".to_owned()))),
            &repo,
        )
        .unwrap_err();
        assert_eq!(err, SearchError::EmptyTipOf);
    }

    #[test]
    fn has_parent_checks_immediate_ancestry_only() {
        let repo = setup();
        let feature_tip = CommitExpr::TipOf(Rc::new(CommitListExpr::BranchCommits("feature".to_owned())));
        let master_tip = CommitExpr::TipOf(Rc::new(CommitListExpr::BranchCommits("master".to_owned())));
        let expr = BoolExpr::HasParent(Rc::new(feature_tip), Rc::new(master_tip));
        // cf2's immediate parent is cf1, not cm, so this is false despite cm
        // being a transitive ancestor.
        assert!(!evaluate_bool(&expr, &repo).unwrap());
    }
}
