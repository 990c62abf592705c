//! The browser [`Host`], backed by [`web_sys`].
//!
//! Each JS node that crosses the host boundary is tagged with its [`DomNode`] token through an expando property,
//! so event targets and parent lookups map back to the same token.

use crate::{
	attrs::AttrValue,
	host::{DomNode, EventSink, FrameCallback, Host, HostError, ListenTarget, NativeEvent, RawEvent},
};
use core::{
	cell::RefCell,
	fmt::{self, Debug, Formatter},
	time::Duration,
};
use hashbrown::HashMap;
use js_sys::{Function, Object, Reflect};
use std::rc::Rc;
use tracing::{trace, warn};
use wasm_bindgen::{closure::Closure, JsCast, JsValue, UnwrapThrowExt};
use web_sys::{CssStyleDeclaration, Document, Element, HtmlElement, Node, Window};

const TOKEN_PROPERTY: &str = "__arborDomNode";

struct WebEvent(web_sys::Event);

impl RawEvent for WebEvent {
	fn stop_propagation(&self) {
		self.0.stop_propagation()
	}

	fn prevent_default(&self) {
		self.0.prevent_default()
	}
}

struct Shared {
	nodes: RefCell<HashMap<DomNode, Node>>,
}

impl Shared {
	fn token(&self, node: &Node) -> DomNode {
		#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
		let existing = Reflect::get(node, &TOKEN_PROPERTY.into())
			.ok()
			.and_then(|token| token.as_f64())
			.and_then(|token| DomNode::from_raw(token as u64))
			.filter(|token| self.nodes.borrow().contains_key(token));
		existing.unwrap_or_else(|| {
			let token = DomNode::allocate();
			#[allow(clippy::cast_precision_loss)]
			let stored = Reflect::set(node, &TOKEN_PROPERTY.into(), &JsValue::from_f64(token.get() as f64));
			if stored.is_err() {
				warn!(%token, "Couldn't tag DOM node with its token.");
			}
			self.nodes.borrow_mut().insert(token, node.clone());
			token
		})
	}

	fn node(&self, token: DomNode) -> Result<Node, HostError> {
		self.nodes.borrow().get(&token).cloned().ok_or(HostError::UnknownNode(token))
	}

	/// Drops the entries of `root` and its descendants and removes their expandos.
	fn release(&self, root: Node) {
		let mut stack = vec![root];
		let mut nodes = self.nodes.borrow_mut();
		while let Some(node) = stack.pop() {
			let children = node.child_nodes();
			stack.extend((0..children.length()).filter_map(|i| children.item(i)));

			#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
			let token = Reflect::get(&node, &TOKEN_PROPERTY.into())
				.ok()
				.and_then(|token| token.as_f64())
				.and_then(|token| DomNode::from_raw(token as u64));
			if let Some(token) = token {
				nodes.remove(&token);
				if Reflect::delete_property(node.unchecked_ref::<Object>(), &TOKEN_PROPERTY.into()).is_err() {
					trace!(%token, "Couldn't remove token expando.");
				}
			}
		}
	}
}

/// Renders into the current page's document.
pub struct WebDom {
	window: Window,
	document: Document,
	shared: Rc<Shared>,
	listeners: RefCell<HashMap<(ListenTarget, String), Closure<dyn Fn(web_sys::Event)>>>,
	frame_fallback: Duration,
}

impl WebDom {
	/// # Panics
	///
	/// Outside a browser window.
	#[must_use]
	pub fn new() -> Self {
		let window = web_sys::window().expect_throw("Expected a browser window.");
		let document = window.document().expect_throw("Expected a document.");
		Self {
			window,
			document,
			shared: Rc::new(Shared { nodes: RefCell::default() }),
			listeners: RefCell::default(),
			frame_fallback: Duration::from_micros(1_000_000 / 60),
		}
	}

	/// Sets the delay used when `requestAnimationFrame` is unavailable.
	#[must_use]
	pub fn with_frame_fallback(mut self, delay: Duration) -> Self {
		self.frame_fallback = delay;
		self
	}

	/// The token for an existing JS node, allocating one if necessary.
	pub fn token(&self, node: &Node) -> DomNode {
		self.shared.token(node)
	}

	/// The JS node behind `token`.
	#[must_use]
	pub fn js_node(&self, token: DomNode) -> Option<Node> {
		self.shared.node(token).ok()
	}

	fn element(&self, token: DomNode) -> Result<Element, HostError> {
		self.shared.node(token)?.dyn_into::<Element>().map_err(|_| HostError::Platform(format!("{} is not an element", token)))
	}

	fn optional_token(&self, node: Option<Node>) -> Option<DomNode> {
		node.map(|node| self.token(&node))
	}
}

impl Default for WebDom {
	fn default() -> Self {
		Self::new()
	}
}

fn platform(error: JsValue) -> HostError {
	HostError::Platform(error.as_string().unwrap_or_else(|| format!("{:?}", error)))
}

fn to_js(value: &AttrValue) -> JsValue {
	match value {
		AttrValue::Null => JsValue::NULL,
		AttrValue::Bool(b) => JsValue::from_bool(*b),
		AttrValue::Number(n) => JsValue::from_f64(*n),
		AttrValue::Str(s) => JsValue::from_str(s),
		other => JsValue::from_str(&other.to_attr_string()),
	}
}

fn from_js(value: &JsValue) -> Option<AttrValue> {
	if let Some(b) = value.as_bool() {
		Some(AttrValue::Bool(b))
	} else if let Some(n) = value.as_f64() {
		Some(AttrValue::Number(n))
	} else if let Some(s) = value.as_string() {
		Some(s.into())
	} else if value.is_null() {
		Some(AttrValue::Null)
	} else {
		None
	}
}

impl Host for WebDom {
	fn document(&self) -> DomNode {
		self.token(&self.document)
	}

	fn create_element(&self, namespace: Option<&str>, tag: &str) -> DomNode {
		let element = match namespace {
			Some(namespace) => self.document.create_element_ns(Some(namespace), tag),
			None => self.document.create_element(tag),
		}
		.unwrap_throw();
		self.token(&element)
	}

	fn create_text(&self, text: &str) -> DomNode {
		self.token(&self.document.create_text_node(text))
	}

	fn tag_name(&self, node: DomNode) -> Option<String> {
		self.element(node).ok().map(|element| element.tag_name().to_ascii_lowercase())
	}

	fn parent(&self, node: DomNode) -> Option<DomNode> {
		self.optional_token(self.shared.node(node).ok()?.parent_node())
	}

	fn first_child(&self, node: DomNode) -> Option<DomNode> {
		self.optional_token(self.shared.node(node).ok()?.first_child())
	}

	fn first_element_child(&self, node: DomNode) -> Option<DomNode> {
		let node = self.shared.node(node).ok()?;
		let child = match node.dyn_ref::<Element>() {
			Some(element) => element.first_element_child(),
			None => node.dyn_ref::<Document>()?.first_element_child(),
		};
		child.map(|child| self.token(&child))
	}

	fn next_sibling(&self, node: DomNode) -> Option<DomNode> {
		self.optional_token(self.shared.node(node).ok()?.next_sibling())
	}

	fn child_nodes(&self, node: DomNode) -> Vec<DomNode> {
		let children = match self.shared.node(node) {
			Ok(node) => node.child_nodes(),
			Err(_) => return Vec::new(),
		};
		(0..children.length()).filter_map(|i| children.item(i)).map(|child| self.token(&child)).collect()
	}

	fn append_child(&self, parent: DomNode, child: DomNode) -> Result<(), HostError> {
		self.shared.node(parent)?.append_child(&self.shared.node(child)?).map(drop).map_err(platform)
	}

	fn insert_before(&self, parent: DomNode, child: DomNode, before: Option<DomNode>) -> Result<(), HostError> {
		if before == Some(child) {
			return Ok(());
		}
		let before = before.map(|before| self.shared.node(before)).transpose()?;
		self.shared.node(parent)?.insert_before(&self.shared.node(child)?, before.as_ref()).map(drop).map_err(platform)
	}

	fn remove_child(&self, parent: DomNode, child: DomNode) -> Result<(), HostError> {
		self.shared.node(parent)?.remove_child(&self.shared.node(child)?).map(drop).map_err(platform)
	}

	fn replace_child(&self, parent: DomNode, new: DomNode, old: DomNode) -> Result<(), HostError> {
		self.shared.node(parent)?.replace_child(&self.shared.node(new)?, &self.shared.node(old)?).map(drop).map_err(platform)
	}

	fn set_text_content(&self, node: DomNode, text: &str) {
		if let Ok(node) = self.shared.node(node) {
			node.set_text_content(if text.is_empty() { None } else { Some(text) })
		}
	}

	fn set_node_value(&self, node: DomNode, text: &str) -> Result<(), HostError> {
		self.shared.node(node)?.set_node_value(Some(text));
		Ok(())
	}

	fn set_inner_html(&self, node: DomNode, markup: &str) -> Result<(), HostError> {
		self.element(node).map_err(|_| HostError::NotAContainer(node))?.set_inner_html(markup);
		Ok(())
	}

	fn set_attribute(&self, node: DomNode, name: &str, value: &str) -> Result<(), HostError> {
		self.element(node)?.set_attribute(name, value).map_err(platform)
	}

	fn remove_attribute(&self, node: DomNode, name: &str) -> Result<(), HostError> {
		self.element(node)?.remove_attribute(name).map_err(platform)
	}

	fn property(&self, node: DomNode, name: &str) -> Option<AttrValue> {
		let node = self.shared.node(node).ok()?;
		from_js(&Reflect::get(&node, &name.into()).ok()?)
	}

	fn set_property(&self, node: DomNode, name: &str, value: &AttrValue) -> Result<(), HostError> {
		let node = self.shared.node(node)?;
		Reflect::set(&node, &name.into(), &to_js(value)).map(drop).map_err(platform)
	}

	fn reset_property(&self, node: DomNode, name: &str) -> Result<(), HostError> {
		let element = self.element(node)?;
		let pristine = match element.namespace_uri() {
			Some(namespace) => self.document.create_element_ns(Some(&namespace), &element.local_name()),
			None => self.document.create_element(&element.local_name()),
		}
		.map_err(platform)?;
		let value = Reflect::get(&pristine, &name.into()).map_err(platform)?;
		Reflect::set(&element, &name.into(), &value).map(drop).map_err(platform)
	}

	fn set_style(&self, node: DomNode, declarations: &[(String, Option<String>)]) -> Result<(), HostError> {
		let element = self.element(node)?;
		let style: CssStyleDeclaration = Reflect::get(&element, &"style".into())
			.map_err(platform)?
			.dyn_into()
			.map_err(|_| HostError::Platform(format!("{} has no inline style", node)))?;
		for (property, value) in declarations {
			let applied = match value {
				Some(value) => style.set_property(property, value),
				None => style.remove_property(property).map(drop),
			};
			applied.map_err(platform)?;
		}
		Ok(())
	}

	fn clear_style(&self, node: DomNode) -> Result<(), HostError> {
		self.remove_attribute(node, "style")
	}

	fn active_element(&self) -> Option<DomNode> {
		self.document.active_element().map(|element| self.token(&element))
	}

	fn focus(&self, node: DomNode) {
		if let Some(element) = self.shared.node(node).ok().and_then(|node| node.dyn_into::<HtmlElement>().ok()) {
			if let Err(error) = element.focus() {
				warn!("Couldn't restore focus: {:?}", error)
			}
		}
	}

	fn listen(&self, target: ListenTarget, kind: &str, sink: EventSink) {
		self.unlisten(target, kind);
		let event_target: Node = match target {
			ListenTarget::Document => self.document.clone().unchecked_into(),
			ListenTarget::Node(node) => match self.shared.node(node) {
				Ok(node) => node,
				Err(error) => return warn!("Can't listen for {:?}: {}", kind, error),
			},
		};

		let shared = Rc::downgrade(&self.shared);
		let closure = Closure::wrap(Box::new(move |event: web_sys::Event| {
			let shared = match shared.upgrade() {
				Some(shared) => shared,
				None => return,
			};
			let target = match event.target().and_then(|target| target.dyn_into::<Node>().ok()) {
				Some(target) => shared.token(&target),
				None => return trace!("Ignoring event without node target."),
			};
			sink(&NativeEvent {
				kind: event.type_(),
				target,
				raw: Some(Rc::new(WebEvent(event))),
			})
		}) as Box<dyn Fn(web_sys::Event)>);

		event_target.add_event_listener_with_callback(kind, closure.as_ref().unchecked_ref()).unwrap_throw();
		self.listeners.borrow_mut().insert((target, kind.to_owned()), closure);
	}

	fn unlisten(&self, target: ListenTarget, kind: &str) {
		let closure = match self.listeners.borrow_mut().remove(&(target, kind.to_owned())) {
			Some(closure) => closure,
			None => return,
		};
		let event_target: Option<Node> = match target {
			ListenTarget::Document => Some(self.document.clone().unchecked_into()),
			ListenTarget::Node(node) => self.shared.node(node).ok(),
		};
		if let Some(event_target) = event_target {
			event_target.remove_event_listener_with_callback(kind, closure.as_ref().unchecked_ref()).unwrap_throw()
		}
	}

	fn release(&self, node: DomNode) {
		match self.shared.node(node) {
			Ok(node) => self.shared.release(node),
			Err(error) => trace!("Nothing to release: {}", error),
		}
	}

	fn request_frame(&self, callback: FrameCallback) {
		let callback: Function = Closure::once_into_js(move || callback()).unchecked_into();
		if self.window.request_animation_frame(&callback).is_err() {
			trace!("requestAnimationFrame failed, falling back to a timeout.");
			#[allow(clippy::cast_possible_truncation)]
			let delay = self.frame_fallback.as_millis().min(i32::MAX as u128) as i32;
			self.window.set_timeout_with_callback_and_timeout_and_arguments_0(&callback, delay).unwrap_throw();
		}
	}
}

impl Debug for WebDom {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		f.debug_struct("WebDom")
			.field("nodes", &self.shared.nodes.try_borrow().map(|nodes| nodes.len()).ok())
			.field("listeners", &self.listeners.try_borrow().map(|listeners| listeners.len()).ok())
			.field("frame_fallback", &self.frame_fallback)
			.finish_non_exhaustive()
	}
}
