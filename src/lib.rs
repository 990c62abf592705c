#![doc(html_root_url = "https://docs.rs/arbor-dom/0.0.1")]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

//! A virtual DOM with keyed reconciliation, stateful and function components, delegated events and frame-batched updates.
//!
//! Trees are built from [`Node`]s, rendered through a [`Runtime`] into a [`Host`] and later patched into their successors.
//! [`MemoryDom`] is an in-process host; [`web::WebDom`] (on `wasm32` only) renders into the browser document.

#[cfg(doctest)]
pub mod readme {
	doc_comment::doctest!("../README.md");
}

pub mod attr_config;
pub mod attrs;
mod batch;
pub mod component;
pub mod controls;
pub mod diagnostic;
mod diff;
pub mod escape;
pub mod event;
pub mod hook;
pub mod host;
pub mod memory;
mod mount;
pub mod node;
pub mod ops;
mod rc_hash_map;
pub mod runtime;

#[cfg(target_arch = "wasm32")]
pub mod web;

pub use attrs::{AttrValue, Attrs, Context, Handler, Key};
pub use component::{Component, ComponentCx, ComponentDef, ComponentHandle};
pub use event::SyntheticEvent;
pub use hook::{HookEvent, ListenerId};
pub use host::{DomNode, Host, HostError};
pub use memory::MemoryDom;
pub use node::{create, Builder, Children, ComponentNode, FunctionComponentNode, Node, NodeType, TagNode};
pub use runtime::{Runtime, WeakRuntime};

/// Serializes `node` to HTML without touching any DOM.
///
/// Event handlers are left out. The result can be adopted by [`Runtime::mount`] later on.
#[must_use]
pub fn render_to_string(node: &Node) -> String {
	node.render_to_string()
}
