//! The live-DOM surface the reconciler writes to.
//!
//! Everything above this module talks about DOM nodes only through [`DomNode`] tokens,
//! so the same trees can be rendered into a browser ([`crate::web`], `wasm32` only)
//! or into the in-process [`MemoryDom`](`crate::memory::MemoryDom`).

use crate::attrs::AttrValue;
use core::{
	fmt::{self, Debug, Display, Formatter},
	num::NonZeroU64,
	sync::atomic::{AtomicU64, Ordering},
};
use std::rc::Rc;
use thiserror::Error;

/// Identity token of a live DOM node.
///
/// Tokens are drawn from one process-wide counter, so two tokens compare equal iff they refer to the same node,
/// regardless of which [`Host`] handed them out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DomNode(NonZeroU64);

static NEXT_DOM_NODE: AtomicU64 = AtomicU64::new(1);

impl DomNode {
	/// Allocates a fresh token. Only [`Host`] implementations should need this.
	#[must_use]
	pub fn allocate() -> Self {
		let id = NEXT_DOM_NODE.fetch_add(1, Ordering::Relaxed);
		Self(NonZeroU64::new(id).unwrap_or(NonZeroU64::MIN))
	}

	/// Reconstructs a token from [`get`](`DomNode::get`).
	#[must_use]
	pub fn from_raw(raw: u64) -> Option<Self> {
		NonZeroU64::new(raw).map(Self)
	}

	#[must_use]
	pub fn get(self) -> u64 {
		self.0.get()
	}
}

impl Display for DomNode {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		write!(f, "#{}", self.0)
	}
}

/// Where a native listener is attached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ListenTarget {
	Document,
	Node(DomNode),
}

/// Controls forwarded from a [`SyntheticEvent`](`crate::event::SyntheticEvent`) to the platform event.
pub trait RawEvent {
	fn stop_propagation(&self);
	fn prevent_default(&self);
}

/// An event as delivered by the host to a native listener.
#[derive(Clone)]
pub struct NativeEvent {
	pub kind: String,
	pub target: DomNode,
	pub raw: Option<Rc<dyn RawEvent>>,
}

impl Debug for NativeEvent {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		f.debug_struct("NativeEvent")
			.field("kind", &self.kind)
			.field("target", &self.target)
			.field("raw", &self.raw.is_some())
			.finish()
	}
}

/// Callback a host invokes for each native event it receives on a listened target.
pub type EventSink = Rc<dyn Fn(&NativeEvent)>;

/// A callback to run on the next frame.
pub type FrameCallback = Box<dyn FnOnce()>;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum HostError {
	#[error("unknown DOM node {0}")]
	UnknownNode(DomNode),
	#[error("{child} is not a child of {parent}")]
	NotAChild { parent: DomNode, child: DomNode },
	#[error("inserting {child} into {parent} would create a cycle")]
	Cycle { parent: DomNode, child: DomNode },
	#[error("{0} can't have children")]
	NotAContainer(DomNode),
	#[error("platform error: {0}")]
	Platform(String),
}

/// Primitive operations on a live DOM.
///
/// Creation and queries are infallible; structural and attribute mutations report failures,
/// which callers log and step over.
pub trait Host {
	/// The root of the document. Delegated listeners are attached here and ancestor walks stop before it.
	fn document(&self) -> DomNode;

	fn create_element(&self, namespace: Option<&str>, tag: &str) -> DomNode;
	fn create_text(&self, text: &str) -> DomNode;

	/// Lowercase tag name, or [`None`] for non-elements.
	fn tag_name(&self, node: DomNode) -> Option<String>;
	fn parent(&self, node: DomNode) -> Option<DomNode>;
	fn first_child(&self, node: DomNode) -> Option<DomNode>;
	fn first_element_child(&self, node: DomNode) -> Option<DomNode>;
	fn next_sibling(&self, node: DomNode) -> Option<DomNode>;
	fn child_nodes(&self, node: DomNode) -> Vec<DomNode>;

	fn append_child(&self, parent: DomNode, child: DomNode) -> Result<(), HostError>;
	/// Inserts (or moves) `child` before `before`, or at the end if `before` is [`None`].
	fn insert_before(&self, parent: DomNode, child: DomNode, before: Option<DomNode>) -> Result<(), HostError>;
	fn remove_child(&self, parent: DomNode, child: DomNode) -> Result<(), HostError>;
	fn replace_child(&self, parent: DomNode, new: DomNode, old: DomNode) -> Result<(), HostError>;

	/// Replaces all children with a single text node (or nothing, for `""`).
	fn set_text_content(&self, node: DomNode, text: &str);
	/// Sets the data of a text node.
	fn set_node_value(&self, node: DomNode, text: &str) -> Result<(), HostError>;
	/// Replaces all children with parsed `markup`.
	fn set_inner_html(&self, node: DomNode, markup: &str) -> Result<(), HostError>;

	fn set_attribute(&self, node: DomNode, name: &str, value: &str) -> Result<(), HostError>;
	fn remove_attribute(&self, node: DomNode, name: &str) -> Result<(), HostError>;
	fn property(&self, node: DomNode, name: &str) -> Option<AttrValue>;
	fn set_property(&self, node: DomNode, name: &str, value: &AttrValue) -> Result<(), HostError>;
	/// Resets a property to the value a freshly created element of the same kind would have.
	fn reset_property(&self, node: DomNode, name: &str) -> Result<(), HostError>;
	/// Applies style declarations; [`None`] clears a declaration.
	fn set_style(&self, node: DomNode, declarations: &[(String, Option<String>)]) -> Result<(), HostError>;
	fn clear_style(&self, node: DomNode) -> Result<(), HostError>;

	fn active_element(&self) -> Option<DomNode>;
	fn focus(&self, node: DomNode);

	/// Installs a native listener. At most one listener per (target, kind) is kept; a second call replaces the sink.
	fn listen(&self, target: ListenTarget, kind: &str, sink: EventSink);
	fn unlisten(&self, target: ListenTarget, kind: &str);

	/// Forgets `node` and its descendants. Called once their DOM has been removed for good.
	///
	/// The tokens must not be used afterwards.
	fn release(&self, node: DomNode);

	/// Runs `callback` on the next animation frame (or the host's fallback tick).
	fn request_frame(&self, callback: FrameCallback);
}
