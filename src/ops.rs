//! Mutation primitives the reconciler is built from.
//!
//! Each op pairs the live-DOM change with the node lifecycle calls that belong to it
//! (rendering before insertion, mounting after it, unmounting before removal).
//! Host failures are logged and otherwise ignored.

use crate::{
	attr_config,
	attrs::AttrValue,
	diagnostic::{self, Misuse},
	event,
	host::{DomNode, HostError},
	node::Node,
	runtime::Runtime,
};
use tracing::{error, trace, trace_span, warn};

fn log_failure(op: &'static str, result: Result<(), HostError>) {
	if let Err(error) = result {
		error!("{} failed: {}", op, error)
	}
}

fn parent_dom(parent: &Node) -> Option<DomNode> {
	let dom = parent.dom_node();
	if dom.is_none() {
		warn!("Parent isn't rendered. Skipping child operation.");
	}
	dom
}

/// Renders `child` at the end of `parent` and mounts it.
pub fn append_child(rt: &Runtime, parent: &Node, child: &Node) {
	let span = trace_span!("Appending child");
	let _enter = span.enter();

	if let Some(parent_dom) = parent_dom(parent) {
		let child_dom = child.render_to_dom(rt, Some(parent));
		log_failure("append_child", rt.host().append_child(parent_dom, child_dom));
		child.mount(rt);
	}
}

/// Renders `child` before the (rendered) sibling `before` and mounts it.
pub fn insert_child(rt: &Runtime, parent: &Node, child: &Node, before: &Node) {
	let span = trace_span!("Inserting child");
	let _enter = span.enter();

	if let Some(parent_dom) = parent_dom(parent) {
		let child_dom = child.render_to_dom(rt, Some(parent));
		log_failure("insert_child", rt.host().insert_before(parent_dom, child_dom, before.dom_node()));
		child.mount(rt);
	}
}

/// Unmounts `child` and then removes its DOM.
pub fn remove_child(rt: &Runtime, parent: &Node, child: &Node) {
	let span = trace_span!("Removing child");
	let _enter = span.enter();

	let child_dom = child.dom_node();
	child.unmount(rt);
	match (parent_dom(parent), child_dom) {
		(Some(parent_dom), Some(child_dom)) => {
			log_failure("remove_child", rt.host().remove_child(parent_dom, child_dom));
			rt.host().release(child_dom)
		}
		(_, None) => warn!("Removed child wasn't rendered."),
		(None, _) => (),
	}
}

/// Moves the rendered `child` next to its sibling `to`: right after it if `after`, otherwise right before it.
///
/// If the move blurred the focused element, focus is given back to it.
pub fn move_child(rt: &Runtime, parent: &Node, child: &Node, to: &Node, after: bool) {
	let span = trace_span!("Moving child", after);
	let _enter = span.enter();

	let (parent_dom, child_dom, to_dom) = match (parent_dom(parent), child.dom_node(), to.dom_node()) {
		(Some(parent_dom), Some(child_dom), Some(to_dom)) => (parent_dom, child_dom, to_dom),
		_ => return warn!("Can't move a node that isn't rendered."),
	};

	let host = rt.host();
	let active = host.active_element();

	let result = if after {
		match host.next_sibling(to_dom) {
			Some(next) => host.insert_before(parent_dom, child_dom, Some(next)),
			None => host.append_child(parent_dom, child_dom),
		}
	} else {
		host.insert_before(parent_dom, child_dom, Some(to_dom))
	};
	log_failure("move_child", result);

	if let Some(active) = active {
		if host.active_element() != Some(active) {
			trace!("Restoring focus to {}.", active);
			host.focus(active)
		}
	}
}

/// Unmounts all `children` of `parent`, then empties it.
pub fn remove_children(rt: &Runtime, parent: &Node, children: &[Node]) {
	let span = trace_span!("Removing children", count = children.len());
	let _enter = span.enter();

	let child_doms: Vec<DomNode> = children.iter().filter_map(Node::dom_node).collect();
	for child in children {
		child.unmount(rt)
	}
	if let Some(parent_dom) = parent_dom(parent) {
		rt.host().set_text_content(parent_dom, "");
		for child_dom in child_doms {
			rt.host().release(child_dom)
		}
	}
}

/// Swaps `old` for a freshly rendered `new` in place.
///
/// `old` is unmounted before `new` is rendered, and `new` is mounted last.
pub fn replace(rt: &Runtime, parent: Option<&Node>, old: &Node, new: &Node) {
	let span = trace_span!("Replacing node");
	let _enter = span.enter();

	let old_dom = old.dom_node();
	old.unmount(rt);
	let new_dom = new.render_to_dom(rt, parent);

	let host = rt.host();
	match old_dom.and_then(|old_dom| host.parent(old_dom).map(|parent_dom| (parent_dom, old_dom))) {
		Some((parent_dom, old_dom)) => log_failure("replace", host.replace_child(parent_dom, new_dom, old_dom)),
		None => warn!("Replaced node isn't attached. The replacement stays detached."),
	}
	if let Some(old_dom) = old_dom {
		host.release(old_dom)
	}
	new.mount(rt)
}

/// Sets one attribute, routing `on*` handlers to the event registry.
pub fn update_attr(rt: &Runtime, node: DomNode, name: &str, value: &AttrValue) {
	if let Some(kind) = event::event_for_attr(name) {
		match value {
			AttrValue::Handler(handler) => event::add_listener(rt, node, kind, handler.clone()),
			_ => warn!("Event attribute {:?} isn't a handler. Ignoring it.", name),
		}
	} else if event::is_unknown_event_attr(name) {
		diagnostic::report(&Misuse::UnknownEventAttr(name.to_owned()))
	} else {
		if cfg!(feature = "dangerous-logging") {
			trace!(name, value = ?value, "Setting attribute.");
		} else {
			trace!(name, "Setting attribute.");
		}
		log_failure("update_attr", attr_config::lookup(name).set(rt.host(), node, name, value))
	}
}

pub fn remove_attr(rt: &Runtime, node: DomNode, name: &str) {
	if let Some(kind) = event::event_for_attr(name) {
		event::remove_listener(rt, node, kind)
	} else if event::is_unknown_event_attr(name) {
		diagnostic::report(&Misuse::UnknownEventAttr(name.to_owned()))
	} else {
		trace!(name, "Removing attribute.");
		log_failure("remove_attr", attr_config::lookup(name).remove(rt.host(), node, name))
	}
}

/// Sets the text of `node`.
///
/// Escaped text is written into the first child's value (or as text content if there is no child),
/// raw text replaces the inner HTML.
pub fn update_text(rt: &Runtime, node: DomNode, text: &str, escape: bool) {
	let host = rt.host();
	if escape {
		match host.first_child(node) {
			Some(first) => log_failure("update_text", host.set_node_value(first, text)),
			None => host.set_text_content(node, text),
		}
	} else {
		log_failure("update_text", host.set_inner_html(node, text))
	}
}

pub fn remove_text(rt: &Runtime, node: DomNode) {
	rt.host().set_text_content(node, "")
}
