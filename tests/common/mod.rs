#![allow(dead_code)]

use arbor_dom::{AttrValue, Component, ComponentCx, ComponentDef, ComponentHandle, MemoryDom, Node, Runtime, TagNode};
use std::{
	cell::{Cell, RefCell},
	rc::Rc,
	sync::Once,
};
use tracing_subscriber::EnvFilter;

static INIT: Once = Once::new();

pub fn setup() -> (Rc<MemoryDom>, Runtime) {
	INIT.call_once(|| tracing_subscriber::fmt().with_env_filter(EnvFilter::from_default_env()).with_test_writer().init());
	let dom = Rc::new(MemoryDom::new());
	let rt = Runtime::new(dom.clone());
	(dom, rt)
}

pub fn li(key: i32) -> Node {
	TagNode::new("li").key(key).children(key.to_string()).into()
}

pub fn keyed_list(keys: &[i32]) -> Node {
	TagNode::new("ul").children(keys.iter().copied().map(li).collect::<Vec<_>>()).into()
}

/// What a [`Labelled`] instance went through.
#[derive(Default)]
pub struct Lifecycle {
	pub renders: Cell<u32>,
	pub mounts: Cell<u32>,
	pub unmounts: Cell<u32>,
	pub handle: RefCell<Option<ComponentHandle>>,
}

impl Lifecycle {
	pub fn handle(&self) -> ComponentHandle {
		self.handle.borrow().clone().expect("mounted at least once")
	}
}

/// Renders its `label` attr into a `<span>`.
pub struct Labelled {
	lifecycle: Rc<Lifecycle>,
	declines_updates: bool,
}

impl Component for Labelled {
	fn on_mount(&mut self, cx: &ComponentCx<'_>) {
		self.lifecycle.mounts.set(self.lifecycle.mounts.get() + 1);
		*self.lifecycle.handle.borrow_mut() = Some(cx.handle());
	}

	fn on_unmount(&mut self, _cx: &ComponentCx<'_>) {
		self.lifecycle.unmounts.set(self.lifecycle.unmounts.get() + 1);
	}

	fn should_update(&mut self, _cx: &ComponentCx<'_>, _next: &Rc<arbor_dom::Attrs>, _prev: &Rc<arbor_dom::Attrs>) -> bool {
		!self.declines_updates
	}

	fn on_render(&mut self, cx: &ComponentCx<'_>) -> Option<Node> {
		self.lifecycle.renders.set(self.lifecycle.renders.get() + 1);
		let label = cx.attrs().get("label").map(AttrValue::to_attr_string).unwrap_or_default();
		Some(TagNode::new("span").children(label).into())
	}
}

pub fn labelled(lifecycle: &Rc<Lifecycle>, declines_updates: bool) -> ComponentDef {
	let lifecycle = Rc::clone(lifecycle);
	ComponentDef::new("Labelled", move || {
		Box::new(Labelled {
			lifecycle: Rc::clone(&lifecycle),
			declines_updates,
		})
	})
}
