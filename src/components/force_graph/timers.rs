use std::collections::HashMap;
use std::rc::Rc;
use std::time::Duration;

use log::warn;
use wasm_bindgen::prelude::*;

use crate::session::timers::{Scheduler, TimerKey};

/// Receives the numeric [`TimerKey`] code of every fired timer.
pub type TimerCallback = Closure<dyn FnMut(u32)>;

/// `setTimeout`-backed scheduler. All timers share one callback; the key
/// travels as the timeout argument.
pub struct BrowserScheduler {
	callback: Rc<TimerCallback>,
	handles: HashMap<TimerKey, i32>,
}

impl BrowserScheduler {
	pub fn new(callback: Rc<TimerCallback>) -> Self {
		Self {
			callback,
			handles: HashMap::new(),
		}
	}
}

impl Scheduler for BrowserScheduler {
	fn schedule(&mut self, key: TimerKey, after: Duration) {
		self.cancel(key);
		let Some(window) = web_sys::window() else {
			return;
		};
		let timeout = i32::try_from(after.as_millis()).unwrap_or(i32::MAX);
		let callback: &JsValue = (*self.callback).as_ref();
		match window.set_timeout_with_callback_and_timeout_and_arguments_1(
			callback.unchecked_ref(),
			timeout,
			&JsValue::from(key.code()),
		) {
			Ok(handle) => {
				self.handles.insert(key, handle);
			}
			Err(e) => warn!("failed to schedule {key:?}: {e:?}"),
		}
	}

	fn cancel(&mut self, key: TimerKey) {
		if let (Some(handle), Some(window)) = (self.handles.remove(&key), web_sys::window()) {
			window.clear_timeout_with_handle(handle);
		}
	}
}

impl Drop for BrowserScheduler {
	fn drop(&mut self) {
		let Some(window) = web_sys::window() else {
			return;
		};
		for (_, handle) in self.handles.drain() {
			window.clear_timeout_with_handle(handle);
		}
	}
}
