//! Reconciliation: patch dispatch between node variants, children lists and attributes.

use crate::{
	attrs::{AttrValue, Attrs, Key},
	node::{Children, Node, TagNode},
	ops,
	runtime::Runtime,
};
use hashbrown::HashMap;
use std::rc::Rc;
use tracing::{level_filters::STATIC_MAX_LEVEL, trace, trace_span, warn, Level};

impl Node {
	/// Reconciles `self` (rendered) into `next`, which holds the DOM reference afterwards.
	///
	/// Patching a node with itself does nothing.
	pub fn patch(&self, rt: &Runtime, next: &Node, parent: Option<&Node>) {
		if self.ptr_eq(next) {
			return;
		}
		next.inherit_ns_from(parent);

		match (self, next) {
			(Node::Tag(old), Node::Tag(new)) => patch_tag(rt, self, old, next, new, parent),
			(Node::Tag(_), Node::Component(new)) => {
				let span = trace_span!("Patching tag into component", name = new.def().name());
				let _enter = span.enter();
				let instance = new.instance(Some(rt));
				self.patch(rt, &instance.root(), parent);
				instance.mount();
			}
			(Node::Tag(_), Node::Function(new)) => self.patch(rt, &new.root(), parent),
			(Node::Component(old), Node::Component(new)) => {
				let instance = old.instance(Some(rt));
				if old.def() == new.def() {
					instance.patch(rt, new.get_attrs(), new.get_children(), new.get_ctx(), parent);
					new.adopt_instance(instance);
				} else {
					let span = trace_span!("Switching component", from = old.def().name(), to = new.def().name());
					let _enter = span.enter();
					instance.unmount();
					let new_instance = new.instance(Some(rt));
					instance.root().patch(rt, &new_instance.root(), parent);
					new_instance.mount();
				}
			}
			(Node::Component(old), _) => {
				let instance = old.instance(Some(rt));
				instance.unmount();
				instance.root().patch(rt, next, parent);
			}
			(Node::Function(old), Node::Function(new)) => old.root().patch(rt, &new.root(), parent),
			(Node::Function(old), _) => old.root().patch(rt, next, parent),
		}
	}
}

fn patch_tag(rt: &Runtime, old_node: &Node, old: &TagNode, new_node: &Node, new: &TagNode, parent: Option<&Node>) {
	let span = trace_span!("Patching tag", tag = old.tag());
	let _enter = span.enter();

	if old.tag() != new.tag() || old_node.ns() != new_node.ns() {
		trace!(to = new.tag(), "Tag or namespace changed.");
		return ops::replace(rt, parent, old_node, new_node);
	}

	if let Some(dom) = old.dom_node() {
		new.set_dom(Some(dom))
	}

	patch_children(rt, old, new_node, new);
	patch_attrs(rt, old, new);
}

fn patch_children(rt: &Runtime, old: &TagNode, parent: &Node, new: &TagNode) {
	let (children_a, children_b) = (old.get_children(), new.get_children());
	match (children_a, children_b) {
		(Children::None, Children::None) => return,
		(Children::Nodes(a), Children::Nodes(b)) if Rc::ptr_eq(a, b) => return,
		(Children::Text(a), Children::Text(b)) if a == b && old.escapes_children() == new.escapes_children() => return,
		_ => (),
	}

	let dom = match parent.dom_node() {
		Some(dom) => dom,
		None => return warn!("Patched tag isn't rendered. Skipping its children."),
	};

	if let Children::Text(text) = children_b {
		if let Children::Nodes(a) = children_a {
			if !a.is_empty() {
				ops::remove_children(rt, parent, a)
			}
		}
		return ops::update_text(rt, dom, text, new.escapes_children());
	}

	let b = match children_b {
		Children::Nodes(b) if !b.is_empty() => b,
		_ => {
			match children_a {
				Children::Text(_) => ops::remove_text(rt, dom),
				Children::Nodes(a) if !a.is_empty() => ops::remove_children(rt, parent, a),
				_ => (),
			}
			return;
		}
	};

	let a = match children_a {
		Children::Nodes(a) if !a.is_empty() => a,
		Children::Text(_) => {
			ops::remove_text(rt, dom);
			return append_all(rt, parent, b);
		}
		_ => return append_all(rt, parent, b),
	};

	if a.len() == 1 && b.len() == 1 {
		return a[0].patch(rt, &b[0], Some(parent));
	}

	if a.iter().chain(b.iter()).all(|child| child.key().is_none()) {
		patch_unkeyed(rt, parent, a, b)
	} else {
		patch_keyed(rt, parent, a, b)
	}
}

fn append_all(rt: &Runtime, parent: &Node, children: &[Node]) {
	for child in children {
		ops::append_child(rt, parent, child)
	}
}

/// Index `i` against index `i`, then trailing removals or appends.
fn patch_unkeyed(rt: &Runtime, parent: &Node, a: &[Node], b: &[Node]) {
	let span = trace_span!("Patching unkeyed children", a = a.len(), b = b.len());
	let _enter = span.enter();

	let common = a.len().min(b.len());
	for (child_a, child_b) in a.iter().zip(b) {
		child_a.patch(rt, child_b, Some(parent))
	}
	for child in &a[common..] {
		ops::remove_child(rt, parent, child)
	}
	append_all(rt, parent, &b[common..]);
}

/// Dual-ended scan over the unconsumed windows `a[start_a..end_a]` and `b[start_b..end_b]`.
#[allow(clippy::too_many_lines)]
fn patch_keyed(rt: &Runtime, parent: &Node, a: &[Node], b: &[Node]) {
	let span = trace_span!("Patching keyed children", a = a.len(), b = b.len());
	let _enter = span.enter();

	let (mut start_a, mut end_a) = (0, a.len());
	let (mut start_b, mut end_b) = (0, b.len());
	let mut skip = vec![false; a.len()];
	let mut key_index: Option<HashMap<&Key, usize>> = None;

	while start_a < end_a && start_b < end_b {
		let (left_a, right_a) = (&a[start_a], &a[end_a - 1]);
		let (left_b, right_b) = (&b[start_b], &b[end_b - 1]);

		if skip[start_a] {
			start_a += 1;
		} else if skip[end_a - 1] {
			end_a -= 1;
		} else if left_a.key() == left_b.key() {
			left_a.patch(rt, left_b, Some(parent));
			start_a += 1;
			start_b += 1;
		} else if right_a.key() == right_b.key() {
			right_a.patch(rt, right_b, Some(parent));
			end_a -= 1;
			end_b -= 1;
		} else if left_a.key().is_some() && left_a.key() == right_b.key() {
			ops::move_child(rt, parent, left_a, right_a, true);
			left_a.patch(rt, right_b, Some(parent));
			start_a += 1;
			end_b -= 1;
		} else if right_a.key().is_some() && right_a.key() == left_b.key() {
			ops::move_child(rt, parent, right_a, left_a, false);
			right_a.patch(rt, left_b, Some(parent));
			end_a -= 1;
			start_b += 1;
		} else if left_a.key().is_some() && left_b.key().is_none() {
			ops::insert_child(rt, parent, left_b, left_a);
			start_b += 1;
		} else if left_a.key().is_none() && left_b.key().is_some() {
			ops::remove_child(rt, parent, left_a);
			start_a += 1;
		} else {
			let index = key_index.get_or_insert_with(|| {
				trace!(start_a, end_a, "Building key index.");
				a[start_a..end_a]
					.iter()
					.enumerate()
					.filter_map(|(offset, child)| child.key().map(|key| (key, start_a + offset)))
					.collect()
			});
			match left_b.key().and_then(|key| index.get(key)).copied() {
				Some(found) => {
					skip[found] = true;
					ops::move_child(rt, parent, &a[found], left_a, false);
					a[found].patch(rt, left_b, Some(parent));
				}
				None => ops::insert_child(rt, parent, left_b, left_a),
			}
			start_b += 1;
		}
	}

	for (child, skipped) in a[start_a..end_a].iter().zip(&skip[start_a..end_a]) {
		if !skipped {
			ops::remove_child(rt, parent, child)
		}
	}

	for child in &b[start_b..end_b] {
		match b.get(end_b) {
			Some(before) => ops::insert_child(rt, parent, child, before),
			None => ops::append_child(rt, parent, child),
		}
	}
}

fn patch_attrs(rt: &Runtime, old: &TagNode, new: &TagNode) {
	let (attrs_a, attrs_b) = (old.get_attrs(), new.get_attrs());
	match (attrs_a, attrs_b) {
		(None, None) => return,
		(Some(a), Some(b)) if Rc::ptr_eq(a, b) => return,
		_ => (),
	}

	let dom = match new.dom_node() {
		Some(dom) => dom,
		None => return warn!("Patched tag isn't rendered. Skipping its attributes."),
	};

	if let Some(attrs_b) = attrs_b {
		for (name, value_b) in attrs_b.iter() {
			match attrs_a.and_then(|attrs_a| attrs_a.get_set(name)) {
				None => {
					if !value_b.is_null() {
						ops::update_attr(rt, dom, name, value_b)
					}
				}
				Some(_) if value_b.is_null() => ops::remove_attr(rt, dom, name),
				Some(value_a) => match (value_a, value_b) {
					(AttrValue::List(list_a), AttrValue::List(list_b)) => {
						if !Rc::ptr_eq(list_a, list_b)
							&& (list_a.len() != list_b.len() || list_a.iter().zip(list_b.iter()).any(|(item_a, item_b)| !item_a.loosely_equals(item_b)))
						{
							ops::update_attr(rt, dom, name, value_b)
						}
					}
					(AttrValue::Map(map_a), AttrValue::Map(map_b)) => patch_attr_map(rt, dom, name, map_a, map_b),
					(AttrValue::List(_), AttrValue::Map(_)) | (AttrValue::Map(_), AttrValue::List(_)) => ops::update_attr(rt, dom, name, value_b),
					(value_a, value_b) => {
						if !value_a.same(value_b) {
							ops::update_attr(rt, dom, name, value_b)
						}
					}
				},
			}
		}
	}

	if let Some(attrs_a) = attrs_a {
		for (name, _) in attrs_a.iter().filter(|(_, value_a)| !value_a.is_null()) {
			if !attrs_b.map_or(false, |attrs_b| attrs_b.contains(name)) {
				ops::remove_attr(rt, dom, name)
			}
		}
	}
}

/// Applies only the changed entries, with removed entries set to null.
fn patch_attr_map(rt: &Runtime, dom: crate::host::DomNode, name: &str, map_a: &Rc<Attrs>, map_b: &Rc<Attrs>) {
	if Rc::ptr_eq(map_a, map_b) {
		return;
	}

	let mut delta = Attrs::new();
	for (key, value_b) in map_b.iter() {
		if !map_a.get(key).unwrap_or(&AttrValue::Null).loosely_equals(value_b) {
			delta.insert(key, value_b.clone())
		}
	}
	for (key, _) in map_a.iter().filter(|(_, value_a)| !value_a.is_null()) {
		if !map_b.contains(key) {
			delta.insert(key, AttrValue::Null)
		}
	}

	if !delta.is_empty() {
		if STATIC_MAX_LEVEL >= Level::TRACE {
			trace!(name, changed = delta.len(), "Applying attribute delta.");
		}
		ops::update_attr(rt, dom, name, &AttrValue::Map(Rc::new(delta)))
	}
}
