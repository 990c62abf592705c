//! Frame-batched deferred callbacks.

use crate::{host::FrameCallback, runtime::Runtime};
use core::{
	cell::RefCell,
	fmt::{self, Debug, Formatter},
	mem,
};
use tracing::{trace, trace_span};

/// FIFO queue flushed once per host frame.
///
/// A frame is requested only when the queue goes from empty to non-empty.
/// The queue is taken before any callback runs, so work scheduled during a flush lands in the next frame.
#[derive(Default)]
pub struct Batch {
	queue: RefCell<Vec<FrameCallback>>,
}

impl Batch {
	pub(crate) fn push(&self, rt: &Runtime, callback: FrameCallback) {
		let len = {
			let mut queue = self.queue.borrow_mut();
			queue.push(callback);
			queue.len()
		};
		if len == 1 {
			trace!("Requesting frame.");
			let weak = rt.downgrade();
			rt.host().request_frame(Box::new(move || {
				if let Some(rt) = weak.upgrade() {
					rt.apply_batch()
				}
			}))
		}
	}

	pub(crate) fn flush(&self) {
		let queue = mem::take(&mut *self.queue.borrow_mut());
		let span = trace_span!("Flushing batch", len = queue.len());
		let _enter = span.enter();
		for callback in queue {
			callback()
		}
	}

	#[must_use]
	pub fn len(&self) -> usize {
		self.queue.borrow().len()
	}

	#[must_use]
	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}
}

impl Debug for Batch {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		f.debug_struct("Batch").field("len", &self.queue.try_borrow().map(|queue| queue.len()).ok()).finish()
	}
}
