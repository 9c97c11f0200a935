//! Keyed, cancellable timers.
//!
//! Scheduling a key that is already pending replaces it, which is all the
//! debouncing the panel needs. [`ManualScheduler`] runs on a virtual clock
//! for tests; the browser binding lives next to the canvas component.

use std::collections::BTreeMap;
use std::time::Duration;

/// Every deferred action of the panel.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TimerKey {
	/// Drop the active node after the pointer left it.
	HoverRelease,
	/// First overlay projection after construction.
	InitialProjection,
	/// Move isolated nodes next to the settled graph.
	PlaceIsolated,
	/// Re-fit the view after isolated nodes moved.
	RefitIsolated,
	/// Fit-to-view after the container stopped resizing.
	ResizeFit,
}

impl TimerKey {
	/// Stable numeric code, used to pass the key through `setTimeout`.
	pub fn code(self) -> u32 {
		match self {
			TimerKey::HoverRelease => 0,
			TimerKey::InitialProjection => 1,
			TimerKey::PlaceIsolated => 2,
			TimerKey::RefitIsolated => 3,
			TimerKey::ResizeFit => 4,
		}
	}

	pub fn from_code(code: u32) -> Option<Self> {
		Some(match code {
			0 => TimerKey::HoverRelease,
			1 => TimerKey::InitialProjection,
			2 => TimerKey::PlaceIsolated,
			3 => TimerKey::RefitIsolated,
			4 => TimerKey::ResizeFit,
			_ => return None,
		})
	}
}

/// Timer backend used by the session.
pub trait Scheduler {
	/// Fire `key` after `after`, replacing a pending timer with the same key.
	fn schedule(&mut self, key: TimerKey, after: Duration);
	/// Drop a pending timer; no-op if none is pending.
	fn cancel(&mut self, key: TimerKey);
}

/// Virtual-clock scheduler. Time only moves through [`advance`](Self::advance).
#[derive(Debug, Default)]
pub struct ManualScheduler {
	now: Duration,
	pending: BTreeMap<TimerKey, Duration>,
	scheduled: usize,
}

impl ManualScheduler {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn now(&self) -> Duration {
		self.now
	}

	pub fn is_pending(&self, key: TimerKey) -> bool {
		self.pending.contains_key(&key)
	}

	/// How many times `schedule` was called in total.
	pub fn scheduled_count(&self) -> usize {
		self.scheduled
	}

	/// Move the clock forward and return the keys that came due, earliest
	/// first. Due keys are no longer pending.
	pub fn advance(&mut self, by: Duration) -> Vec<TimerKey> {
		self.now += by;
		let now = self.now;
		let mut due: Vec<(Duration, TimerKey)> = self
			.pending
			.iter()
			.filter(|(_, at)| **at <= now)
			.map(|(key, at)| (*at, *key))
			.collect();
		due.sort();
		for (_, key) in &due {
			self.pending.remove(key);
		}
		due.into_iter().map(|(_, key)| key).collect()
	}
}

impl Scheduler for ManualScheduler {
	fn schedule(&mut self, key: TimerKey, after: Duration) {
		self.scheduled += 1;
		self.pending.insert(key, self.now + after);
	}

	fn cancel(&mut self, key: TimerKey) {
		self.pending.remove(&key);
	}
}
