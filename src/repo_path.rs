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

//! Canonical absolute repo paths.
//!
//! A [`RepoPath`] is an opaque hierarchical name, not a filesystem path: it is
//! never resolved against a working directory, never normalizes `.`/`..`, and
//! is compared and hashed purely on its canonical string form.

use std::borrow::Borrow;
use std::fmt;

/// A canonical absolute repo path, e.g. `/a/b`.
///
/// Invariants: starts with `/`; has no trailing `/` unless it is the root
/// path `/`; segments are separated by a single `/`.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RepoPath(String);

impl RepoPath {
    /// The root path, `/`.
    pub fn root() -> Self {
        Self("/".to_owned())
    }

    /// Wraps `value` as a canonical absolute path, prefixing `/` if it is
    /// missing and stripping a trailing `/` (other than the root's).
    pub fn at(value: impl AsRef<str>) -> Self {
        Self(normalize(value.as_ref()))
    }

    /// Idempotent: `RepoPath::at(s).to_absolute_path() == RepoPath::at(s)`.
    pub fn to_absolute_path(&self) -> Self {
        self.clone()
    }

    /// Appends `segment` as a new path component.
    ///
    /// `RepoPath::root().resolve("a") == RepoPath::at("/a")`, and
    /// `RepoPath::at("/a").resolve("b") == RepoPath::at("/a/b")`.
    pub fn resolve(&self, segment: impl AsRef<str>) -> Self {
        let segment = segment.as_ref().trim_matches('/');
        if self.0 == "/" {
            Self(format!("/{segment}"))
        } else {
            Self(format!("{}/{segment}", self.0))
        }
    }

    /// Returns the parent path, or `None` for the root.
    pub fn parent(&self) -> Option<Self> {
        if self.0 == "/" {
            return None;
        }
        match self.0.rfind('/') {
            Some(0) => Some(Self::root()),
            Some(i) => Some(Self(self.0[..i].to_owned())),
            None => None,
        }
    }

    /// Returns the canonical string representation, e.g. `/a/b`.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

fn normalize(value: &str) -> String {
    let with_leading_slash = if value.starts_with('/') {
        value.to_owned()
    } else {
        format!("/{value}")
    };
    if with_leading_slash.len() > 1 && with_leading_slash.ends_with('/') {
        with_leading_slash.trim_end_matches('/').to_owned()
    } else {
        with_leading_slash
    }
}

impl fmt::Debug for RepoPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RepoPath({:?})", self.0)
    }
}

impl fmt::Display for RepoPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for RepoPath {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&str> for RepoPath {
    fn from(value: &str) -> Self {
        Self::at(value)
    }
}

impl From<String> for RepoPath {
    fn from(value: String) -> Self {
        Self::at(value)
    }
}
