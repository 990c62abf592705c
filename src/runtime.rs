//! The process-scoped state every render and patch call is handed.

use crate::{
	batch::Batch,
	event::EventManager,
	hook::Hook,
	host::Host,
	mount::MountRegistry,
	node::Node,
};
use core::{
	cell::RefCell,
	fmt::{self, Debug, Formatter},
};
use std::rc::{Rc, Weak};
use tracing::{instrument, trace};

/// Owns the [`Host`] together with the listener registry, update batch, mounted roots and diagnostic hook.
///
/// Cloning is cheap and yields a handle to the same state.
/// Component instances and host callbacks only keep a [`WeakRuntime`], so dropping the last [`Runtime`] releases everything.
#[derive(Clone)]
pub struct Runtime(Rc<Shared>);

struct Shared {
	host: Rc<dyn Host>,
	events: RefCell<EventManager>,
	batch: Batch,
	mounts: RefCell<MountRegistry>,
	hook: Hook,
}

impl Runtime {
	#[must_use]
	pub fn new(host: Rc<dyn Host>) -> Self {
		Self(Rc::new(Shared {
			host,
			events: RefCell::new(EventManager::new()),
			batch: Batch::default(),
			mounts: RefCell::new(MountRegistry::default()),
			hook: Hook::default(),
		}))
	}

	#[must_use]
	pub fn host(&self) -> &dyn Host {
		&*self.0.host
	}

	#[must_use]
	pub fn events(&self) -> &RefCell<EventManager> {
		&self.0.events
	}

	#[must_use]
	pub fn hook(&self) -> &Hook {
		&self.0.hook
	}

	pub(crate) fn mounts(&self) -> &RefCell<MountRegistry> {
		&self.0.mounts
	}

	#[must_use]
	pub fn downgrade(&self) -> WeakRuntime {
		WeakRuntime(Rc::downgrade(&self.0))
	}

	#[must_use]
	pub fn ptr_eq(&self, other: &Self) -> bool {
		Rc::ptr_eq(&self.0, &other.0)
	}

	/// Queues `callback` for the next frame.
	pub fn schedule(&self, callback: impl FnOnce() + 'static) {
		self.0.batch.push(self, Box::new(callback))
	}

	/// Runs every queued callback now instead of on the next frame.
	pub fn apply_batch(&self) {
		if self.0.batch.is_empty() {
			return trace!("Nothing batched.");
		}
		self.0.batch.flush()
	}

	/// Number of callbacks waiting for the next frame.
	#[must_use]
	pub fn pending(&self) -> usize {
		self.0.batch.len()
	}

	/// Synchronously reconciles `old` (which must have been rendered) into `new`.
	///
	/// If `old` is a mounted root's tree, that root holds `new` afterwards,
	/// so later [`mount`](`Runtime::mount`) and [`unmount`](`Runtime::unmount`) calls start from `new`.
	/// Pending mount requests for the root are unaffected and still patch from whatever tree it holds when they run.
	#[instrument(skip(self, old, new))]
	pub fn patch(&self, old: &Node, new: &Node) {
		trace!("Patching root.");
		old.patch(self, new, None);
		if self.mounts().borrow_mut().retarget(old, new) {
			trace!("Patched a mounted root.");
		}
	}
}

impl Debug for Runtime {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		f.debug_struct("Runtime")
			.field("events", &self.0.events)
			.field("batch", &self.0.batch)
			.field("hook", &self.0.hook)
			.finish_non_exhaustive()
	}
}

/// A [`Runtime`] handle that doesn't keep it alive.
#[derive(Clone, Default)]
pub struct WeakRuntime(Weak<Shared>);

impl WeakRuntime {
	/// A handle that never upgrades.
	#[must_use]
	pub fn new() -> Self {
		Self::default()
	}

	#[must_use]
	pub fn upgrade(&self) -> Option<Runtime> {
		self.0.upgrade().map(Runtime)
	}
}

impl Debug for WeakRuntime {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		write!(f, "WeakRuntime({})", if self.0.strong_count() > 0 { "live" } else { "dead" })
	}
}
