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

//! An in-process, purely in-memory version-control kernel: content-addressed
//! snapshots, an immutable commit DAG, pluggable compare/diff/merge engines,
//! and a small typed search language over branches, tags, and commits.
//!
//! There is no wire protocol, no CLI, and no on-disk format; everything here
//! is an API contract for an embedding host. [`handler::RepoHandler`] is the
//! façade most callers want; the modules it delegates to are all usable on
//! their own.

pub mod byte_array_index;
pub mod clock;
pub mod commit;
pub mod commit_engine;
pub mod compare;
pub mod content;
pub mod content_area;
pub mod diff;
pub mod error;
pub mod handler;
pub mod merge;
pub mod repo_path;
pub mod repository;
pub mod search;

pub use byte_array_index::ByteArrayIndex;
pub use clock::Clock;
pub use clock::Timestamp;
pub use commit::Commit;
pub use commit::CommitId;
pub use content::Content;
pub use content_area::ContentArea;
pub use error::MergeError;
pub use error::SearchError;
pub use handler::RepoHandler;
pub use repo_path::RepoPath;
pub use repository::Repository;
