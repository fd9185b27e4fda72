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

//! Error types for the kernel's fallible surfaces.

use thiserror::Error;

use crate::repository::BranchName;

/// Returned by [`crate::merge::merge_into_branch_from_another_branch`] and the
/// equivalent [`crate::handler::RepoHandler`] method.
#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum MergeError {
    /// One of the two named branches has no tip commit.
    #[error("unknown branch `{name}`")]
    UnknownBranch {
        /// The branch name that could not be resolved to a tip commit.
        name: BranchName,
    },
}

/// Returned by the search expression evaluator.
#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum SearchError {
    /// `TipOf` was evaluated over an empty commit list.
    #[error("cannot take the tip of an empty commit list")]
    EmptyTipOf,
}
