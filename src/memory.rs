//! An in-process [`Host`]: a small document with a mutation log, `html5ever` markup parsing and simulated event dispatch.
//!
//! Frames only run when [`MemoryDom::tick`] is called.

use crate::{
	attrs::AttrValue,
	escape::{escape_attr, escape_html},
	event,
	host::{DomNode, EventSink, FrameCallback, Host, HostError, ListenTarget, NativeEvent, RawEvent},
	node::is_void,
};
use core::{
	cell::{Cell, RefCell},
	fmt::{self, Debug, Formatter},
	mem,
};
use hashbrown::{HashMap, HashSet};
use html5ever::{tendril::TendrilSink, LocalName, Namespace, ParseOpts, QualName};
use markup5ever_rcdom::{Handle, NodeData, RcDom};
use std::rc::Rc;
use tracing::{trace, trace_span};

/// One observable change to a [`MemoryDom`], in the order it happened.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mutation {
	CreateElement { node: DomNode, tag: String },
	CreateText { node: DomNode, text: String },
	/// An append if `before` is [`None`]. Moves show up as inserts of attached nodes.
	Insert { parent: DomNode, child: DomNode, before: Option<DomNode> },
	Remove { parent: DomNode, child: DomNode },
	Replace { parent: DomNode, new: DomNode, old: DomNode },
	SetTextContent { node: DomNode, text: String },
	SetNodeValue { node: DomNode, text: String },
	SetInnerHtml { node: DomNode, markup: String },
	SetAttribute { node: DomNode, name: String, value: String },
	RemoveAttribute { node: DomNode, name: String },
	SetProperty { node: DomNode, name: String, value: String },
	ResetProperty { node: DomNode, name: String },
	SetStyle { node: DomNode, changes: Vec<(String, Option<String>)> },
	ClearStyle { node: DomNode },
}

impl Mutation {
	/// Whether this creates or removes a node (as opposed to moving or updating one).
	#[must_use]
	pub fn is_structural(&self) -> bool {
		matches!(self, Mutation::CreateElement { .. } | Mutation::CreateText { .. } | Mutation::Remove { .. } | Mutation::Replace { .. })
	}
}

#[derive(Debug)]
struct Element {
	ns: Option<String>,
	tag: String,
	attrs: Vec<(String, String)>,
	props: HashMap<String, AttrValue>,
}

impl Element {
	fn new(ns: Option<String>, tag: &str) -> Self {
		Self {
			ns,
			tag: tag.to_owned(),
			attrs: Vec::new(),
			props: HashMap::new(),
		}
	}

	fn attribute(&self, name: &str) -> Option<&str> {
		self.attrs.iter().find(|(n, _)| n.eq_ignore_ascii_case(name)).map(|(_, v)| v.as_str())
	}

	fn set_attribute(&mut self, name: &str, value: &str) {
		match self.attrs.iter_mut().find(|(n, _)| n.eq_ignore_ascii_case(name)) {
			Some((_, slot)) => value.clone_into(slot),
			None => self.attrs.push((name.to_owned(), value.to_owned())),
		}
	}

	fn remove_attribute(&mut self, name: &str) {
		self.attrs.retain(|(n, _)| !n.eq_ignore_ascii_case(name))
	}

	fn lower_tag(&self) -> String {
		self.tag.to_ascii_lowercase()
	}
}

#[derive(Debug)]
enum Data {
	Document,
	Element(Element),
	Text(String),
}

#[derive(Debug)]
struct Entry {
	data: Data,
	parent: Option<DomNode>,
	children: Vec<DomNode>,
}

impl Entry {
	fn new(data: Data) -> Self {
		Self {
			data,
			parent: None,
			children: Vec::new(),
		}
	}
}

#[derive(Debug, Default)]
struct Arena {
	nodes: HashMap<DomNode, Entry>,
}

impl Arena {
	fn get(&self, node: DomNode) -> Result<&Entry, HostError> {
		self.nodes.get(&node).ok_or(HostError::UnknownNode(node))
	}

	fn get_mut(&mut self, node: DomNode) -> Result<&mut Entry, HostError> {
		self.nodes.get_mut(&node).ok_or(HostError::UnknownNode(node))
	}

	fn element(&self, node: DomNode) -> Option<&Element> {
		match &self.nodes.get(&node)?.data {
			Data::Element(element) => Some(element),
			_ => None,
		}
	}

	fn element_mut(&mut self, node: DomNode) -> Result<&mut Element, HostError> {
		match &mut self.get_mut(node)?.data {
			Data::Element(element) => Ok(element),
			_ => Err(HostError::Platform(format!("{} is not an element", node))),
		}
	}

	fn container(&self, node: DomNode) -> Result<(), HostError> {
		match self.get(node)?.data {
			Data::Document | Data::Element(_) => Ok(()),
			Data::Text(_) => Err(HostError::NotAContainer(node)),
		}
	}

	/// `node` itself or one of its descendants.
	fn is_within(&self, node: DomNode, subtree: DomNode) -> bool {
		let mut current = Some(node);
		while let Some(node) = current {
			if node == subtree {
				return true;
			}
			current = self.nodes.get(&node).and_then(|entry| entry.parent);
		}
		false
	}

	fn detach(&mut self, child: DomNode) {
		let parent = self.nodes.get_mut(&child).and_then(|entry| entry.parent.take());
		if let Some(parent) = parent.and_then(|parent| self.nodes.get_mut(&parent)) {
			parent.children.retain(|&c| c != child)
		}
	}

	fn insert(&mut self, parent: DomNode, child: DomNode, index: usize) -> Result<(), HostError> {
		self.get_mut(child)?.parent = Some(parent);
		let children = &mut self.get_mut(parent)?.children;
		children.insert(index.min(children.len()), child);
		Ok(())
	}

	fn add(&mut self, data: Data) -> DomNode {
		let node = DomNode::allocate();
		self.nodes.insert(node, Entry::new(data));
		node
	}

	fn text_content(&self, node: DomNode) -> String {
		match self.nodes.get(&node) {
			Some(Entry { data: Data::Text(text), .. }) => text.clone(),
			Some(entry) => entry.children.iter().map(|&child| self.text_content(child)).collect(),
			None => String::new(),
		}
	}

	fn descendants(&self, node: DomNode) -> Vec<DomNode> {
		let mut found = Vec::new();
		let mut pending: Vec<DomNode> = self.nodes.get(&node).map(|entry| entry.children.iter().rev().copied().collect()).unwrap_or_default();
		while let Some(node) = pending.pop() {
			found.push(node);
			if let Some(entry) = self.nodes.get(&node) {
				pending.extend(entry.children.iter().rev().copied())
			}
		}
		found
	}

	fn write_html(&self, out: &mut String, node: DomNode, parent_ns: Option<&str>) {
		let entry = match self.nodes.get(&node) {
			Some(entry) => entry,
			None => return,
		};
		match &entry.data {
			Data::Document => {
				for &child in &entry.children {
					self.write_html(out, child, None)
				}
			}
			Data::Text(text) => out.push_str(&escape_html(text)),
			Data::Element(element) => {
				out.push('<');
				out.push_str(&element.tag);
				if let Some(ns) = element.ns.as_deref().filter(|&ns| Some(ns) != parent_ns) {
					out.push_str(" xmlns=\"");
					out.push_str(&escape_attr(ns));
					out.push('"');
				}
				for (name, value) in &element.attrs {
					out.push(' ');
					out.push_str(name);
					if !value.is_empty() {
						out.push_str("=\"");
						out.push_str(&escape_attr(value));
						out.push('"');
					}
				}
				if is_void(&element.lower_tag()) {
					out.push_str("/>");
					return;
				}
				out.push('>');
				for &child in &entry.children {
					self.write_html(out, child, element.ns.as_deref())
				}
				out.push_str("</");
				out.push_str(&element.tag);
				out.push('>');
			}
		}
	}

	fn materialize(&mut self, parsed: &[Handle], parent: DomNode) -> Result<(), HostError> {
		for handle in parsed {
			let node = match &handle.data {
				NodeData::Text { contents } => {
					let text = contents.borrow();
					self.add(Data::Text(String::from(&**text)))
				}
				NodeData::Element { name, attrs, .. } => {
					let ns = Some(&*name.ns).filter(|&ns| ns != HTML_NS).map(str::to_owned);
					let mut element = Element::new(ns, &name.local);
					element.attrs = attrs
						.borrow()
						.iter()
						.filter(|attr| &*attr.name.ns != XMLNS_NS && &*attr.name.local != "xmlns")
						.map(|attr| (parsed_attribute_name(&attr.name), String::from(&*attr.value)))
						.collect();
					let node = self.add(Data::Element(element));
					let children = handle.children.borrow().clone();
					self.materialize(&children, node)?;
					node
				}
				// Comments, doctypes and processing instructions aren't kept.
				_ => continue,
			};
			let index = self.get(parent)?.children.len();
			self.insert(parent, node, index)?;
		}
		Ok(())
	}
}

fn parse_style(style: &str) -> Vec<(String, String)> {
	style
		.split(';')
		.filter_map(|declaration| {
			let (property, value) = declaration.split_once(':')?;
			Some((property.trim().to_owned(), value.trim().to_owned()))
		})
		.filter(|(property, _)| !property.is_empty())
		.collect()
}

const HTML_NS: &str = "http://www.w3.org/1999/xhtml";
const XMLNS_NS: &str = "http://www.w3.org/2000/xmlns/";

/// Parses `markup` the way a browser parses the `innerHTML` of a `tag` element in `ns`.
fn parse_fragment(markup: &str, ns: Option<&str>, tag: &str) -> Vec<Handle> {
	let context = QualName::new(None, Namespace::from(ns.unwrap_or(HTML_NS)), LocalName::from(tag));
	let parsed = html5ever::parse_fragment(RcDom::default(), ParseOpts::default(), context, Vec::new()).one(markup);
	if !parsed.errors.is_empty() {
		trace!(errors = parsed.errors.len(), "Recovered from malformed markup.");
	}
	// Fragments are parsed into a synthetic `<html>` root.
	let root = parsed.document.children.borrow().first().cloned();
	root.map(|root| root.children.borrow().clone()).unwrap_or_default()
}

fn parsed_attribute_name(name: &QualName) -> String {
	match &name.prefix {
		Some(prefix) => format!("{}:{}", prefix, name.local),
		None => name.local.to_string(),
	}
}

#[derive(Debug, Default)]
struct MemoryEvent {
	propagation_stopped: Cell<bool>,
	default_prevented: Cell<bool>,
}

impl RawEvent for MemoryEvent {
	fn stop_propagation(&self) {
		self.propagation_stopped.set(true)
	}

	fn prevent_default(&self) {
		self.default_prevented.set(true)
	}
}

/// What happened to an event sent through [`MemoryDom::dispatch_event`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dispatched {
	pub propagation_stopped: bool,
	pub default_prevented: bool,
}

/// A document held in memory.
///
/// It starts out as a document node with a `body` element.
pub struct MemoryDom {
	arena: RefCell<Arena>,
	document: DomNode,
	body: DomNode,
	listeners: RefCell<HashMap<(ListenTarget, String), EventSink>>,
	frames: RefCell<Vec<FrameCallback>>,
	log: RefCell<Vec<Mutation>>,
	active: Cell<Option<DomNode>>,
	released: RefCell<HashSet<DomNode>>,
}

impl Default for MemoryDom {
	fn default() -> Self {
		Self::new()
	}
}

impl MemoryDom {
	#[must_use]
	pub fn new() -> Self {
		let mut arena = Arena::default();
		let document = arena.add(Data::Document);
		let body = arena.add(Data::Element(Element::new(None, "body")));
		if let Some(entry) = arena.nodes.get_mut(&document) {
			entry.children.push(body)
		}
		if let Some(entry) = arena.nodes.get_mut(&body) {
			entry.parent = Some(document)
		}
		Self {
			arena: RefCell::new(arena),
			document,
			body,
			listeners: RefCell::default(),
			frames: RefCell::default(),
			log: RefCell::default(),
			active: Cell::new(None),
			released: RefCell::default(),
		}
	}

	#[must_use]
	pub fn body(&self) -> DomNode {
		self.body
	}

	fn record(&self, mutation: Mutation) {
		self.log.borrow_mut().push(mutation)
	}

	/// Takes the mutations recorded so far.
	pub fn take_log(&self) -> Vec<Mutation> {
		mem::take(&mut *self.log.borrow_mut())
	}

	pub fn clear_log(&self) {
		self.log.borrow_mut().clear()
	}

	/// Runs the frame callbacks requested so far. Callbacks requested meanwhile wait for the next tick.
	pub fn tick(&self) -> usize {
		let frames = mem::take(&mut *self.frames.borrow_mut());
		let count = frames.len();
		let span = trace_span!("Memory DOM frame", callbacks = count);
		let _enter = span.enter();
		for frame in frames {
			frame()
		}
		count
	}

	#[must_use]
	pub fn pending_frames(&self) -> usize {
		self.frames.borrow().len()
	}

	#[must_use]
	pub fn outer_html(&self, node: DomNode) -> String {
		let mut out = String::new();
		let arena = self.arena.borrow();
		let parent_ns = arena.nodes.get(&node).and_then(|entry| entry.parent).and_then(|parent| arena.element(parent)).and_then(|parent| parent.ns.clone());
		arena.write_html(&mut out, node, parent_ns.as_deref());
		out
	}

	#[must_use]
	pub fn inner_html(&self, node: DomNode) -> String {
		let mut out = String::new();
		let arena = self.arena.borrow();
		if let Ok(entry) = arena.get(node) {
			let ns = arena.element(node).and_then(|element| element.ns.as_deref());
			for &child in &entry.children {
				arena.write_html(&mut out, child, ns)
			}
		}
		out
	}

	#[must_use]
	pub fn text_content(&self, node: DomNode) -> String {
		self.arena.borrow().text_content(node)
	}

	#[must_use]
	pub fn attribute(&self, node: DomNode, name: &str) -> Option<String> {
		self.arena.borrow().element(node).and_then(|element| element.attribute(name)).map(str::to_owned)
	}

	/// A single style declaration.
	#[must_use]
	pub fn style(&self, node: DomNode, property: &str) -> Option<String> {
		self.attribute(node, "style").and_then(|style| parse_style(&style).into_iter().find(|(p, _)| p == property).map(|(_, value)| value))
	}

	#[must_use]
	pub fn contains(&self, node: DomNode) -> bool {
		self.arena.borrow().is_within(node, self.document)
	}

	/// Whether `node` was handed back through [`Host::release`].
	///
	/// Released nodes stay inspectable here.
	#[must_use]
	pub fn is_released(&self, node: DomNode) -> bool {
		self.released.borrow().contains(&node)
	}

	/// Number of installed native listeners.
	#[must_use]
	pub fn listener_count(&self) -> usize {
		self.listeners.borrow().len()
	}

	#[must_use]
	pub fn is_listening(&self, target: ListenTarget, kind: &str) -> bool {
		self.listeners.borrow().contains_key(&(target, kind.to_owned()))
	}

	/// Fires `kind` at `target`, bubbling through its ancestors to the document if the type bubbles.
	pub fn dispatch_event(&self, target: DomNode, kind: &str) -> Dispatched {
		let span = trace_span!("Dispatching", kind, %target);
		let _enter = span.enter();

		let bubbles = event::bubbles(kind);
		let path: Vec<ListenTarget> = if bubbles {
			let arena = self.arena.borrow();
			let mut path = Vec::new();
			let mut current = Some(target);
			while let Some(node) = current {
				path.push(if node == self.document { ListenTarget::Document } else { ListenTarget::Node(node) });
				current = arena.nodes.get(&node).and_then(|entry| entry.parent);
			}
			path
		} else {
			vec![ListenTarget::Node(target)]
		};

		let raw = Rc::new(MemoryEvent::default());
		let shared: Rc<dyn RawEvent> = raw.clone();
		let native = NativeEvent {
			kind: kind.to_owned(),
			target,
			raw: Some(shared),
		};
		for listen_target in path {
			if raw.propagation_stopped.get() {
				break;
			}
			let sink = self.listeners.borrow().get(&(listen_target, kind.to_owned())).cloned();
			if let Some(sink) = sink {
				sink(&native)
			}
		}

		Dispatched {
			propagation_stopped: raw.propagation_stopped.get(),
			default_prevented: raw.default_prevented.get(),
		}
	}

	/// Blurs the focused element if it's inside `subtree`.
	fn blur_within(&self, arena: &Arena, subtree: DomNode) {
		if let Some(active) = self.active.get() {
			if arena.is_within(active, subtree) {
				trace!(%active, "Detaching the focused element blurs it.");
				self.active.set(None)
			}
		}
	}

	fn select_value(arena: &Arena, select: DomNode) -> String {
		let options: Vec<DomNode> = arena.descendants(select).into_iter().filter(|&node| arena.element(node).map_or(false, |element| element.lower_tag() == "option")).collect();
		let selected = options.iter().copied().find(|&option| Self::is_option_selected(arena, option)).or_else(|| options.first().copied());
		selected.map(|option| Self::option_value(arena, option)).unwrap_or_default()
	}

	fn is_option_selected(arena: &Arena, option: DomNode) -> bool {
		arena.element(option).map_or(false, |element| match element.props.get("selected") {
			Some(selected) => selected.is_truthy(),
			None => element.attribute("selected").is_some(),
		})
	}

	fn option_value(arena: &Arena, option: DomNode) -> String {
		match arena.element(option) {
			Some(element) => match element.props.get("value") {
				Some(value) => value.to_attr_string(),
				None => element.attribute("value").map_or_else(|| arena.text_content(option), str::to_owned),
			},
			None => String::new(),
		}
	}
}

impl Host for MemoryDom {
	fn document(&self) -> DomNode {
		self.document
	}

	fn create_element(&self, namespace: Option<&str>, tag: &str) -> DomNode {
		let node = self.arena.borrow_mut().add(Data::Element(Element::new(namespace.map(str::to_owned), tag)));
		self.record(Mutation::CreateElement { node, tag: tag.to_owned() });
		node
	}

	fn create_text(&self, text: &str) -> DomNode {
		let node = self.arena.borrow_mut().add(Data::Text(text.to_owned()));
		self.record(Mutation::CreateText { node, text: text.to_owned() });
		node
	}

	fn tag_name(&self, node: DomNode) -> Option<String> {
		self.arena.borrow().element(node).map(Element::lower_tag)
	}

	fn parent(&self, node: DomNode) -> Option<DomNode> {
		self.arena.borrow().nodes.get(&node).and_then(|entry| entry.parent)
	}

	fn first_child(&self, node: DomNode) -> Option<DomNode> {
		self.arena.borrow().nodes.get(&node).and_then(|entry| entry.children.first().copied())
	}

	fn first_element_child(&self, node: DomNode) -> Option<DomNode> {
		let arena = self.arena.borrow();
		arena.nodes.get(&node).and_then(|entry| entry.children.iter().copied().find(|&child| arena.element(child).is_some()))
	}

	fn next_sibling(&self, node: DomNode) -> Option<DomNode> {
		let arena = self.arena.borrow();
		let siblings = &arena.nodes.get(&arena.nodes.get(&node)?.parent?)?.children;
		let index = siblings.iter().position(|&sibling| sibling == node)?;
		siblings.get(index + 1).copied()
	}

	fn child_nodes(&self, node: DomNode) -> Vec<DomNode> {
		self.arena.borrow().nodes.get(&node).map(|entry| entry.children.clone()).unwrap_or_default()
	}

	fn append_child(&self, parent: DomNode, child: DomNode) -> Result<(), HostError> {
		self.insert_before(parent, child, None)
	}

	fn insert_before(&self, parent: DomNode, child: DomNode, before: Option<DomNode>) -> Result<(), HostError> {
		if before == Some(child) {
			return Ok(());
		}
		{
			let mut arena = self.arena.borrow_mut();
			arena.container(parent)?;
			let attached = arena.get(child)?.parent.is_some();
			if arena.is_within(parent, child) {
				return Err(HostError::Cycle { parent, child });
			}
			if let Some(before) = before {
				if arena.get(before)?.parent != Some(parent) {
					return Err(HostError::NotAChild { parent, child: before });
				}
			}
			if attached {
				self.blur_within(&arena, child);
			}
			arena.detach(child);
			let index = match before {
				Some(before) => arena.get(parent)?.children.iter().position(|&c| c == before).unwrap_or(usize::MAX),
				None => usize::MAX,
			};
			arena.insert(parent, child, index)?;
		}
		self.record(Mutation::Insert { parent, child, before });
		Ok(())
	}

	fn remove_child(&self, parent: DomNode, child: DomNode) -> Result<(), HostError> {
		{
			let mut arena = self.arena.borrow_mut();
			if arena.get(child)?.parent != Some(parent) {
				return Err(HostError::NotAChild { parent, child });
			}
			self.blur_within(&arena, child);
			arena.detach(child);
		}
		self.record(Mutation::Remove { parent, child });
		Ok(())
	}

	fn replace_child(&self, parent: DomNode, new: DomNode, old: DomNode) -> Result<(), HostError> {
		{
			let mut arena = self.arena.borrow_mut();
			if arena.get(old)?.parent != Some(parent) {
				return Err(HostError::NotAChild { parent, child: old });
			}
			if arena.is_within(parent, new) {
				return Err(HostError::Cycle { parent, child: new });
			}
			self.blur_within(&arena, old);
			arena.detach(new);
			let index = arena.get(parent)?.children.iter().position(|&c| c == old).unwrap_or(usize::MAX);
			arena.detach(old);
			arena.insert(parent, new, index)?;
		}
		self.record(Mutation::Replace { parent, new, old });
		Ok(())
	}

	fn set_text_content(&self, node: DomNode, text: &str) {
		{
			let mut arena = self.arena.borrow_mut();
			let children = match arena.nodes.get_mut(&node) {
				Some(Entry { data: Data::Text(data), .. }) => {
					text.clone_into(data);
					Vec::new()
				}
				Some(entry) => mem::take(&mut entry.children),
				None => return,
			};
			for child in children {
				self.blur_within(&arena, child);
				if let Some(entry) = arena.nodes.get_mut(&child) {
					entry.parent = None
				}
			}
			if !text.is_empty() && arena.element(node).is_some() {
				let text_node = arena.add(Data::Text(text.to_owned()));
				let _ = arena.insert(node, text_node, 0);
			}
		}
		self.record(Mutation::SetTextContent { node, text: text.to_owned() });
	}

	fn set_node_value(&self, node: DomNode, text: &str) -> Result<(), HostError> {
		{
			let mut arena = self.arena.borrow_mut();
			match &mut arena.get_mut(node)?.data {
				Data::Text(data) => text.clone_into(data),
				// Like the DOM, `nodeValue` of elements ignores writes.
				_ => return Ok(()),
			}
		}
		self.record(Mutation::SetNodeValue { node, text: text.to_owned() });
		Ok(())
	}

	fn set_inner_html(&self, node: DomNode, markup: &str) -> Result<(), HostError> {
		{
			let mut arena = self.arena.borrow_mut();
			arena.container(node)?;
			let (ns, tag) = arena.element(node).map_or((None, "body".to_owned()), |element| (element.ns.clone(), element.tag.clone()));
			let parsed = parse_fragment(markup, ns.as_deref(), &tag);
			let children = arena.get_mut(node).map(|entry| mem::take(&mut entry.children))?;
			for child in children {
				self.blur_within(&arena, child);
				if let Some(entry) = arena.nodes.get_mut(&child) {
					entry.parent = None
				}
			}
			arena.materialize(&parsed, node)?;
		}
		self.record(Mutation::SetInnerHtml { node, markup: markup.to_owned() });
		Ok(())
	}

	fn set_attribute(&self, node: DomNode, name: &str, value: &str) -> Result<(), HostError> {
		self.arena.borrow_mut().element_mut(node)?.set_attribute(name, value);
		self.record(Mutation::SetAttribute {
			node,
			name: name.to_owned(),
			value: value.to_owned(),
		});
		Ok(())
	}

	fn remove_attribute(&self, node: DomNode, name: &str) -> Result<(), HostError> {
		self.arena.borrow_mut().element_mut(node)?.remove_attribute(name);
		self.record(Mutation::RemoveAttribute { node, name: name.to_owned() });
		Ok(())
	}

	fn property(&self, node: DomNode, name: &str) -> Option<AttrValue> {
		let arena = self.arena.borrow();
		let element = arena.element(node)?;
		if let Some(value) = element.props.get(name) {
			return Some(value.clone());
		}
		let tag = element.lower_tag();
		match name {
			"value" => match tag.as_str() {
				"select" => Some(Self::select_value(&arena, node).into()),
				"option" => Some(Self::option_value(&arena, node).into()),
				"textarea" => Some(arena.text_content(node).into()),
				_ => Some(element.attribute("value").unwrap_or_default().into()),
			},
			"checked" | "selected" | "multiple" | "disabled" | "readOnly" => Some(element.attribute(name).is_some().into()),
			_ => element.attribute(name).map(Into::into),
		}
	}

	fn set_property(&self, node: DomNode, name: &str, value: &AttrValue) -> Result<(), HostError> {
		self.arena.borrow_mut().element_mut(node)?.props.insert(name.to_owned(), value.clone());
		self.record(Mutation::SetProperty {
			node,
			name: name.to_owned(),
			value: value.to_attr_string(),
		});
		Ok(())
	}

	fn reset_property(&self, node: DomNode, name: &str) -> Result<(), HostError> {
		self.arena.borrow_mut().element_mut(node)?.props.remove(name);
		self.record(Mutation::ResetProperty { node, name: name.to_owned() });
		Ok(())
	}

	fn set_style(&self, node: DomNode, declarations: &[(String, Option<String>)]) -> Result<(), HostError> {
		{
			let mut arena = self.arena.borrow_mut();
			let element = arena.element_mut(node)?;
			let mut style = element.attribute("style").map(parse_style).unwrap_or_default();
			for (property, value) in declarations {
				match value {
					Some(value) => match style.iter_mut().find(|(p, _)| p == property) {
						Some((_, slot)) => value.clone_into(slot),
						None => style.push((property.clone(), value.clone())),
					},
					None => style.retain(|(p, _)| p != property),
				}
			}
			if style.is_empty() {
				element.remove_attribute("style")
			} else {
				let serialized: String = style.iter().map(|(property, value)| format!("{}:{};", property, value)).collect();
				element.set_attribute("style", &serialized)
			}
		}
		self.record(Mutation::SetStyle {
			node,
			changes: declarations.to_vec(),
		});
		Ok(())
	}

	fn clear_style(&self, node: DomNode) -> Result<(), HostError> {
		self.arena.borrow_mut().element_mut(node)?.remove_attribute("style");
		self.record(Mutation::ClearStyle { node });
		Ok(())
	}

	fn active_element(&self) -> Option<DomNode> {
		self.active.get()
	}

	fn focus(&self, node: DomNode) {
		if self.arena.borrow().element(node).is_some() {
			self.active.set(Some(node))
		}
	}

	fn listen(&self, target: ListenTarget, kind: &str, sink: EventSink) {
		self.listeners.borrow_mut().insert((target, kind.to_owned()), sink);
	}

	fn unlisten(&self, target: ListenTarget, kind: &str) {
		self.listeners.borrow_mut().remove(&(target, kind.to_owned()));
	}

	fn release(&self, node: DomNode) {
		let arena = self.arena.borrow();
		let mut released = self.released.borrow_mut();
		let mut stack = vec![node];
		while let Some(node) = stack.pop() {
			if let Some(entry) = arena.nodes.get(&node) {
				stack.extend(entry.children.iter().copied())
			}
			released.insert(node);
		}
	}

	fn request_frame(&self, callback: FrameCallback) {
		self.frames.borrow_mut().push(callback)
	}
}

impl Debug for MemoryDom {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		f.debug_struct("MemoryDom")
			.field("document", &self.document)
			.field("nodes", &self.arena.try_borrow().map(|arena| arena.nodes.len()).ok())
			.field("listeners", &self.listeners.try_borrow().map(|listeners| listeners.len()).ok())
			.field("pending_frames", &self.frames.try_borrow().map(|frames| frames.len()).ok())
			.field("active", &self.active.get())
			.finish()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn parses_and_serializes() {
		let dom = MemoryDom::new();
		let markup = r#"<ul class="a &amp; b"><li>one &lt;1&gt;</li><li hidden>two<br/></li></ul>"#;
		dom.set_inner_html(dom.body(), markup).unwrap();
		assert_eq!(dom.inner_html(dom.body()), markup);
		assert_eq!(dom.text_content(dom.body()), "one <1>two");
	}

	#[test]
	fn recovers_like_a_browser() {
		let dom = MemoryDom::new();
		dom.set_inner_html(dom.body(), "<p>one<div>two</div>").unwrap();
		assert_eq!(dom.inner_html(dom.body()), "<p>one</p><div>two</div>");

		dom.set_inner_html(dom.body(), "<p>").unwrap();
		assert_eq!(dom.inner_html(dom.body()), "<p></p>");

		dom.set_inner_html(dom.body(), "<style>a<b{}</style>").unwrap();
		let style = dom.first_child(dom.body()).unwrap();
		assert_eq!(dom.child_nodes(style).len(), 1);
		assert_eq!(dom.text_content(style), "a<b{}");
	}

	#[test]
	fn lone_angle_brackets_are_text() {
		let dom = MemoryDom::new();
		dom.set_inner_html(dom.body(), "1 < 2").unwrap();
		assert_eq!(dom.text_content(dom.body()), "1 < 2");
	}

	#[test]
	fn foreign_content_keeps_its_namespace() {
		let dom = MemoryDom::new();
		let markup = r#"<svg xmlns="http://www.w3.org/2000/svg"><circle r="1"></circle></svg>"#;
		dom.set_inner_html(dom.body(), markup).unwrap();
		assert_eq!(dom.inner_html(dom.body()), markup);
	}

	#[test]
	fn moves_blur_and_structure() {
		let dom = MemoryDom::new();
		let list = dom.create_element(None, "ul");
		dom.append_child(dom.body(), list).unwrap();
		let a = dom.create_element(None, "li");
		let b = dom.create_element(None, "li");
		dom.append_child(list, a).unwrap();
		dom.append_child(list, b).unwrap();
		dom.focus(a);

		dom.insert_before(list, b, Some(a)).unwrap();
		assert_eq!(dom.child_nodes(list), vec![b, a]);
		assert_eq!(dom.active_element(), Some(a));

		dom.append_child(list, a).unwrap();
		assert_eq!(dom.active_element(), None);
		assert_eq!(dom.insert_before(a, list, None), Err(HostError::Cycle { parent: a, child: list }));
	}

	#[test]
	fn style_declarations() {
		let dom = MemoryDom::new();
		let div = dom.create_element(None, "div");
		dom.set_style(div, &[("color".to_owned(), Some("red".to_owned())), ("width".to_owned(), Some("1px".to_owned()))]).unwrap();
		dom.set_style(div, &[("color".to_owned(), None)]).unwrap();
		assert_eq!(dom.attribute(div, "style").as_deref(), Some("width:1px;"));
		assert_eq!(dom.style(div, "width").as_deref(), Some("1px"));
	}
}
