mod common;

use arbor_dom::{
	memory::Mutation, AttrValue, Attrs, Children, Component, ComponentCx, ComponentDef, ComponentNode, Context, FunctionComponentNode, HookEvent, Node, TagNode,
};
use common::{labelled, setup, Lifecycle};
use std::{cell::RefCell, rc::Rc};

fn label(def: &ComponentDef, text: &str) -> Node {
	ComponentNode::new(def.clone()).attrs(Attrs::new().with("label", text)).into()
}

#[test]
fn declined_updates_keep_the_dom() {
	let (dom, rt) = setup();
	let lifecycle = Rc::new(Lifecycle::default());
	let def = labelled(&lifecycle, true);

	let first = label(&def, "a");
	rt.mount_sync(dom.body(), first.clone());
	assert_eq!(lifecycle.renders.get(), 1);
	assert_eq!(lifecycle.mounts.get(), 1);
	dom.clear_log();

	let mut current = first;
	for text in ["b", "c", "d"] {
		let next = label(&def, text);
		rt.patch(&current, &next);
		current = next;
	}
	assert_eq!(lifecycle.renders.get(), 1);
	assert_eq!(dom.take_log(), Vec::<Mutation>::new());
	assert_eq!(dom.inner_html(dom.body()), "<span>a</span>");
	assert_eq!(lifecycle.handle().attrs().unwrap().get("label").and_then(AttrValue::as_str), Some("d"));
}

#[test]
fn new_attrs_rerender() {
	let (dom, rt) = setup();
	let lifecycle = Rc::new(Lifecycle::default());
	let def = labelled(&lifecycle, false);

	let first = label(&def, "a");
	rt.mount_sync(dom.body(), first.clone());
	let second = label(&def, "b");
	rt.patch(&first, &second);
	assert_eq!(lifecycle.renders.get(), 2);
	assert_eq!(lifecycle.mounts.get(), 1);
	assert_eq!(dom.inner_html(dom.body()), "<span>b</span>");
	assert_eq!(second.dom_node(), first.dom_node());
}

#[test]
fn updates_in_one_frame_render_once() {
	let (dom, rt) = setup();
	let lifecycle = Rc::new(Lifecycle::default());
	rt.mount_sync(dom.body(), label(&labelled(&lifecycle, false), "a"));

	let order = Rc::new(RefCell::new(Vec::new()));
	let handle = lifecycle.handle();
	handle.update({
		let order = Rc::clone(&order);
		move || order.borrow_mut().push(1)
	});
	handle.update({
		let order = Rc::clone(&order);
		move || order.borrow_mut().push(2)
	});
	assert_eq!(lifecycle.renders.get(), 1);
	assert_eq!(dom.pending_frames(), 1);
	assert_eq!(rt.pending(), 2);

	assert_eq!(dom.tick(), 1);
	assert_eq!(lifecycle.renders.get(), 2);
	assert_eq!(*order.borrow(), vec![1, 2]);
	assert_eq!(rt.pending(), 0);
}

#[test]
fn patches_during_a_pending_update_render_once_with_the_latest_attrs() {
	let (dom, rt) = setup();
	let lifecycle = Rc::new(Lifecycle::default());
	let def = labelled(&lifecycle, false);
	let first = label(&def, "a");
	rt.mount_sync(dom.body(), first.clone());
	let handle = lifecycle.handle();

	let order = Rc::new(RefCell::new(Vec::new()));
	handle.update({
		let order = Rc::clone(&order);
		move || order.borrow_mut().push(1)
	});
	rt.patch(&first, &label(&def, "z"));
	handle.update({
		let order = Rc::clone(&order);
		move || order.borrow_mut().push(2)
	});
	assert_eq!(lifecycle.renders.get(), 1);
	assert_eq!(dom.inner_html(dom.body()), "<span>a</span>");

	assert_eq!(dom.tick(), 1);
	assert_eq!(lifecycle.renders.get(), 2);
	assert_eq!(dom.inner_html(dom.body()), "<span>z</span>");
	assert_eq!(*order.borrow(), vec![1, 2]);
	assert_eq!(rt.pending(), 0);
}

#[test]
fn applied_batches_leave_an_empty_frame() {
	let (dom, rt) = setup();
	let lifecycle = Rc::new(Lifecycle::default());
	rt.mount_sync(dom.body(), label(&labelled(&lifecycle, false), "a"));

	lifecycle.handle().update(|| ());
	rt.apply_batch();
	assert_eq!(lifecycle.renders.get(), 2);
	assert_eq!(rt.pending(), 0);

	assert_eq!(dom.tick(), 1);
	assert_eq!(lifecycle.renders.get(), 2);
}

#[test]
fn updates_of_unmounted_instances_are_dropped() {
	let (dom, rt) = setup();
	let lifecycle = Rc::new(Lifecycle::default());
	rt.mount_sync(dom.body(), label(&labelled(&lifecycle, false), "a"));

	let ran = Rc::new(RefCell::new(false));
	lifecycle.handle().update({
		let ran = Rc::clone(&ran);
		move || *ran.borrow_mut() = true
	});
	rt.unmount_sync(dom.body());
	assert_eq!(lifecycle.unmounts.get(), 1);
	assert!(!lifecycle.handle().is_mounted());

	dom.tick();
	assert_eq!(lifecycle.renders.get(), 1);
	assert!(!*ran.borrow());
	assert_eq!(dom.inner_html(dom.body()), "");
}

#[test]
fn switching_definitions_remounts() {
	let (dom, rt) = setup();
	let (lifecycle_a, lifecycle_b) = (Rc::new(Lifecycle::default()), Rc::new(Lifecycle::default()));

	let first = label(&labelled(&lifecycle_a, false), "a");
	rt.mount_sync(dom.body(), first.clone());
	rt.patch(&first, &label(&labelled(&lifecycle_b, false), "b"));

	assert_eq!((lifecycle_a.mounts.get(), lifecycle_a.unmounts.get()), (1, 1));
	assert_eq!((lifecycle_b.mounts.get(), lifecycle_b.unmounts.get()), (1, 0));
	assert_eq!(dom.inner_html(dom.body()), "<span>b</span>");
}

#[derive(Default)]
struct Themed;

impl Component for Themed {
	fn on_render(&mut self, cx: &ComponentCx<'_>) -> Option<Node> {
		let reader = FunctionComponentNode::new(|_: &Attrs, _: &Children, ctx: &Context| {
			let theme = ctx.get("theme").map(AttrValue::to_attr_string).unwrap_or_default();
			Some(TagNode::new("span").children(theme).into())
		});
		Some(TagNode::new("div").children(reader).attrs(Attrs::new().with("className", cx.attrs().get("className").cloned())).into())
	}

	fn on_child_context_request(&mut self, _cx: &ComponentCx<'_>) -> Context {
		Context::new(Attrs::new().with("theme", "dark"))
	}

	fn default_attrs() -> Attrs {
		Attrs::new().with("className", "themed")
	}
}

#[test]
fn context_and_default_attrs() {
	let node: Node = ComponentNode::new(ComponentDef::of::<Themed>()).into();
	assert_eq!(arbor_dom::render_to_string(&node), r#"<div class="themed"><span>dark</span></div>"#);
	assert!(ComponentDef::of::<Themed>() == ComponentDef::of::<Themed>());
}

#[test]
fn empty_renders_become_placeholders() {
	let (dom, rt) = setup();
	let node: Node = FunctionComponentNode::new(|_: &Attrs, _: &Children, _: &Context| None).into();
	rt.mount_sync(dom.body(), node);
	assert_eq!(dom.inner_html(dom.body()), "<noscript></noscript>");
}

#[test]
fn updates_notify_the_hook() {
	let (dom, rt) = setup();
	let lifecycle = Rc::new(Lifecycle::default());
	let seen = Rc::new(RefCell::new(Vec::new()));
	let id = rt.hook().on({
		let seen = Rc::clone(&seen);
		move |event: &HookEvent| seen.borrow_mut().push(event.name())
	});

	rt.mount_sync(dom.body(), label(&labelled(&lifecycle, false), "a"));
	lifecycle.handle().update(|| ());
	dom.tick();
	rt.unmount_sync(dom.body());
	assert_eq!(*seen.borrow(), vec!["mount", "replace", "unmount"]);

	assert!(rt.hook().off(id));
	assert!(!rt.hook().off(id));
}
