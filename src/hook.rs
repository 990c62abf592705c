//! Emit-only notifications about mounts, unmounts and component re-renders.
//!
//! Listeners observe; nothing they do feeds back into reconciliation.

use crate::node::Node;
use core::{
	cell::{Cell, RefCell},
	fmt::{self, Debug, Formatter},
};
use std::rc::Rc;
use tracing::trace;

#[derive(Debug, Clone)]
pub enum HookEvent {
	Mount(Node),
	Unmount(Node),
	/// A component instance re-rendered itself through [`ComponentCx::update`](`crate::component::ComponentCx::update`).
	Replace { prev: Node, next: Node },
}

impl HookEvent {
	#[must_use]
	pub fn name(&self) -> &'static str {
		match self {
			HookEvent::Mount(_) => "mount",
			HookEvent::Unmount(_) => "unmount",
			HookEvent::Replace { .. } => "replace",
		}
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

type Listener = Rc<dyn Fn(&HookEvent)>;

#[derive(Default)]
pub struct Hook {
	listeners: RefCell<Vec<(ListenerId, Listener)>>,
	next_id: Cell<u64>,
}

impl Hook {
	pub fn on(&self, listener: impl Fn(&HookEvent) + 'static) -> ListenerId {
		let id = ListenerId(self.next_id.get());
		self.next_id.set(id.0 + 1);
		self.listeners.borrow_mut().push((id, Rc::new(listener)));
		id
	}

	/// Returns whether `id` was still subscribed.
	pub fn off(&self, id: ListenerId) -> bool {
		let mut listeners = self.listeners.borrow_mut();
		let len = listeners.len();
		listeners.retain(|(listener_id, _)| *listener_id != id);
		listeners.len() != len
	}

	pub fn emit(&self, event: &HookEvent) {
		// Listeners may subscribe or unsubscribe while being notified.
		let listeners: Vec<Listener> = self.listeners.borrow().iter().map(|(_, listener)| Rc::clone(listener)).collect();
		trace!(event = event.name(), listeners = listeners.len(), "Emitting hook event.");
		for listener in listeners {
			listener(event)
		}
	}
}

impl Debug for Hook {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		f.debug_struct("Hook").field("listeners", &self.listeners.try_borrow().map(|listeners| listeners.len()).ok()).finish()
	}
}
