//! Synthetic events and listener delegation.
//!
//! Bubbling event types are delegated: a single native listener on the document serves every node,
//! and dispatch walks from the event target up through its ancestors to find handlers.
//! Non-bubbling types get one native listener per node instead.

use crate::{
	attrs::Handler,
	host::{DomNode, ListenTarget, NativeEvent},
	rc_hash_map::{CountSaturatedError, RcHashMap},
	runtime::Runtime,
};
use hashbrown::HashMap;
use std::rc::Rc;
use tracing::{error, trace, trace_span};

/// Attribute name → native event type.
const ATTRS_TO_EVENTS: &[(&str, &str)] = &[
	("onMouseOver", "mouseover"),
	("onMouseMove", "mousemove"),
	("onMouseOut", "mouseout"),
	("onMouseDown", "mousedown"),
	("onMouseUp", "mouseup"),
	("onMouseEnter", "mouseenter"),
	("onMouseLeave", "mouseleave"),
	("onClick", "click"),
	("onDblClick", "dblclick"),
	("onKeyDown", "keydown"),
	("onKeyPress", "keypress"),
	("onKeyUp", "keyup"),
	("onChange", "change"),
	("onInput", "input"),
	("onSubmit", "submit"),
	("onFocus", "focus"),
	("onBlur", "blur"),
	("onScroll", "scroll"),
	("onLoad", "load"),
	("onError", "error"),
	("onContextMenu", "contextmenu"),
	("onDragStart", "dragstart"),
	("onDrag", "drag"),
	("onDragEnter", "dragenter"),
	("onDragOver", "dragover"),
	("onDragLeave", "dragleave"),
	("onDragEnd", "dragend"),
	("onDrop", "drop"),
	("onWheel", "wheel"),
	("onCopy", "copy"),
	("onCut", "cut"),
	("onPaste", "paste"),
];

const NON_BUBBLING: &[&str] = &["mouseenter", "mouseleave", "scroll", "load", "error"];

/// The event type for an `on*` attribute, if it is one.
#[must_use]
pub fn event_for_attr(name: &str) -> Option<&'static str> {
	ATTRS_TO_EVENTS.iter().find(|(attr, _)| *attr == name).map(|&(_, kind)| kind)
}

/// Looks like an event attribute (`on` followed by an uppercase letter) but isn't a known one.
#[must_use]
pub fn is_unknown_event_attr(name: &str) -> bool {
	name.strip_prefix("on").map_or(false, |rest| rest.starts_with(|c: char| c.is_ascii_uppercase())) && event_for_attr(name).is_none()
}

#[must_use]
pub fn bubbles(kind: &str) -> bool {
	!NON_BUBBLING.contains(&kind)
}

/// The type the delegated listener listens to natively. `focus` and `blur` don't bubble, their `*in`/`*out` twins do.
fn native_kind(kind: &'static str) -> &'static str {
	match kind {
		"focus" => "focusin",
		"blur" => "focusout",
		kind => kind,
	}
}

/// Handed to handlers in place of the native event.
#[derive(Debug)]
pub struct SyntheticEvent {
	kind: &'static str,
	native: NativeEvent,
	propagation_stopped: bool,
	default_prevented: bool,
}

impl SyntheticEvent {
	#[must_use]
	pub fn new(kind: &'static str, native: NativeEvent) -> Self {
		Self {
			kind,
			native,
			propagation_stopped: false,
			default_prevented: false,
		}
	}

	#[must_use]
	pub fn kind(&self) -> &'static str {
		self.kind
	}

	#[must_use]
	pub fn target(&self) -> DomNode {
		self.native.target
	}

	#[must_use]
	pub fn native(&self) -> &NativeEvent {
		&self.native
	}

	pub fn stop_propagation(&mut self) {
		self.propagation_stopped = true;
		if let Some(raw) = &self.native.raw {
			raw.stop_propagation()
		}
	}

	#[must_use]
	pub fn is_propagation_stopped(&self) -> bool {
		self.propagation_stopped
	}

	pub fn prevent_default(&mut self) {
		self.default_prevented = true;
		if let Some(raw) = &self.native.raw {
			raw.prevent_default()
		}
	}

	#[must_use]
	pub fn is_default_prevented(&self) -> bool {
		self.default_prevented
	}
}

/// Per-runtime listener registry.
#[derive(Debug, Default)]
pub struct EventManager {
	/// Bubbling types, counted per registered (node, type) pair. Presence means the document listener is installed.
	delegated: RcHashMap<&'static str, u32, ()>,
	handlers: HashMap<DomNode, HashMap<&'static str, Handler>>,
}

impl EventManager {
	#[must_use]
	pub fn new() -> Self {
		Self::default()
	}

	/// Number of nodes currently holding a handler for the bubbling `kind`.
	#[must_use]
	pub fn delegated_count(&self, kind: &str) -> u32 {
		self.delegated.count(kind)
	}

	#[must_use]
	pub fn is_delegated_listener_installed(&self, kind: &str) -> bool {
		self.delegated.get(kind).is_some()
	}

	#[must_use]
	pub fn has_handlers(&self, node: DomNode) -> bool {
		self.handlers.contains_key(&node)
	}
}

/// Registers `handler` for `kind` on `node`, replacing a previous handler for the same pair.
pub fn add_listener(rt: &Runtime, node: DomNode, kind: &'static str, handler: Handler) {
	let span = trace_span!("Adding listener", %node, kind);
	let _enter = span.enter();

	let mut events = rt.events().borrow_mut();
	let is_new = !events.handlers.get(&node).map_or(false, |handlers| handlers.contains_key(kind));
	if is_new {
		if bubbles(kind) {
			let installed = events.delegated.increment_or_insert_with(kind, || {
				trace!("Installing delegated document listener.");
				let weak = rt.downgrade();
				rt.host().listen(
					ListenTarget::Document,
					native_kind(kind),
					Rc::new(move |native: &NativeEvent| {
						if let Some(rt) = weak.upgrade() {
							dispatch_delegated(&rt, kind, native)
						}
					}),
				);
			});
			if let Err(CountSaturatedError) = installed {
				error!("Too many listeners for {:?}. Ignoring registration.", kind);
				return;
			}
		} else {
			let weak = rt.downgrade();
			rt.host().listen(
				ListenTarget::Node(node),
				kind,
				Rc::new(move |native: &NativeEvent| {
					if let Some(rt) = weak.upgrade() {
						dispatch_direct(&rt, node, kind, native)
					}
				}),
			);
		}
	}
	events.handlers.entry(node).or_default().insert(kind, handler);
}

pub fn remove_listener(rt: &Runtime, node: DomNode, kind: &'static str) {
	let mut events = rt.events().borrow_mut();
	let removed = events.handlers.get_mut(&node).and_then(|handlers| handlers.remove(kind));
	if removed.is_some() {
		release(rt, &mut events, node, kind);
	}
}

/// Drops every handler of `node`. Called when the node is unmounted.
pub fn remove_listeners(rt: &Runtime, node: DomNode) {
	let mut events = rt.events().borrow_mut();
	if let Some(handlers) = events.handlers.remove(&node) {
		trace!("Removing {} listener(s) from {}.", handlers.len(), node);
		for (kind, _) in handlers {
			release(rt, &mut events, node, kind);
		}
	}
}

fn release(rt: &Runtime, events: &mut EventManager, node: DomNode, kind: &'static str) {
	if bubbles(kind) {
		// The document listener stays installed; it finds nothing to call once the count is zero.
		if let Err(CountSaturatedError) = events.delegated.weak_decrement(kind) {
			error!("Listener count for {:?} dropped below zero.", kind)
		}
	} else {
		rt.host().unlisten(ListenTarget::Node(node), kind)
	}
}

fn dispatch_delegated(rt: &Runtime, kind: &'static str, native: &NativeEvent) {
	let span = trace_span!("Delegated dispatch", kind, target = %native.target);
	let _enter = span.enter();

	let to_invoke = {
		let events = rt.events().borrow();
		let host = rt.host();
		let document = host.document();
		let mut remaining = events.delegated.count(kind);
		let mut to_invoke = Vec::new();
		let mut target = Some(native.target);
		while remaining > 0 {
			let node = match target {
				Some(node) if node != document => node,
				_ => break,
			};
			if let Some(handler) = events.handlers.get(&node).and_then(|handlers| handlers.get(kind)) {
				to_invoke.push(handler.clone());
				remaining -= 1;
			}
			target = host.parent(node);
		}
		to_invoke
	};

	if to_invoke.is_empty() {
		return trace!("No handlers on the target's ancestry.");
	}

	let mut event = SyntheticEvent::new(kind, native.clone());
	for handler in to_invoke {
		handler.call(&mut event);
		if event.is_propagation_stopped() {
			trace!("Propagation stopped.");
			break;
		}
	}
}

fn dispatch_direct(rt: &Runtime, node: DomNode, kind: &'static str, native: &NativeEvent) {
	let handler = rt.events().borrow().handlers.get(&node).and_then(|handlers| handlers.get(kind)).cloned();
	match handler {
		Some(handler) => handler.call(&mut SyntheticEvent::new(kind, native.clone())),
		None => trace!("Direct listener without handler on {} for {:?}.", node, kind),
	}
}
