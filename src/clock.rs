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

//! The injected clock: the only source of commit timestamps.
//!
//! The clock itself is an external collaborator (see [`Clock`]); the kernel
//! only relies on [`Timestamp::is_after`] being consistent with the order in
//! which commits were created, as required by the merge engine's
//! last-writer-wins conflict policy.

use std::fmt;

use chrono::DateTime;
use chrono::Utc;

/// A point in time, as produced by a [`Clock`].
///
/// Ordering is wall-clock order; no monotonicity is guaranteed or required.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Timestamp(DateTime<Utc>);

impl Timestamp {
    /// Wraps a UTC instant as a `Timestamp`.
    pub fn new(instant: DateTime<Utc>) -> Self {
        Self(instant)
    }

    /// Returns whether `self` is strictly later than `other`.
    pub fn is_after(&self, other: &Self) -> bool {
        self.0 > other.0
    }

    /// The underlying UTC instant.
    pub fn as_datetime(&self) -> DateTime<Utc> {
        self.0
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.to_rfc3339())
    }
}

/// A non-blocking source of [`Timestamp`]s, injected into every commit
/// operation.
///
/// This is an external collaborator: the kernel never constructs a clock
/// itself, it only calls [`Clock::now`].
pub trait Clock {
    /// Returns the current time. Must never block.
    fn now(&self) -> Timestamp;
}

/// A clock that returns a fixed, caller-controlled sequence of timestamps.
///
/// Used by tests (and any host that wants deterministic commit ordering
/// without a wall-clock dependency) to pin down `Timestamp::is_after`
/// comparisons across a scripted sequence of commits.
#[derive(Debug, Default)]
pub struct FixedClock {
    instants: std::cell::RefCell<std::collections::VecDeque<Timestamp>>,
    last: std::cell::Cell<Option<Timestamp>>,
}

impl FixedClock {
    /// Creates a clock that will return each of `instants` in order, one per
    /// call to [`Clock::now`], and then repeat the last instant forever.
    pub fn new(instants: impl IntoIterator<Item = Timestamp>) -> Self {
        Self {
            instants: std::cell::RefCell::new(instants.into_iter().collect()),
            last: std::cell::Cell::new(None),
        }
    }
}

impl Clock for FixedClock {
    fn now(&self) -> Timestamp {
        let mut queue = self.instants.borrow_mut();
        let next = queue.pop_front().or_else(|| self.last.get());
        let next = next.expect("FixedClock::now called with no instants configured");
        self.last.set(Some(next));
        next
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ts(seconds: i64) -> Timestamp {
        Timestamp::new(DateTime::from_timestamp(seconds, 0).unwrap())
    }

    #[test]
    fn is_after_compares_wall_clock_order() {
        assert!(ts(2).is_after(&ts(1)));
        assert!(!ts(1).is_after(&ts(2)));
        assert!(!ts(1).is_after(&ts(1)));
    }

    #[test]
    fn fixed_clock_replays_then_repeats_last() {
        let clock = FixedClock::new([ts(1), ts(2)]);
        assert_eq!(clock.now(), ts(1));
        assert_eq!(clock.now(), ts(2));
        assert_eq!(clock.now(), ts(2));
    }
}
