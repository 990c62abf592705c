mod common;

use arbor_dom::{Attrs, Handler, Host, Node, TagNode};
use common::setup;
use std::{cell::RefCell, rc::Rc};

fn text(tag: &str, content: &str) -> Node {
	TagNode::new(tag).children(content).into()
}

#[test]
fn later_mounts_supersede_pending_ones() {
	let (dom, rt) = setup();
	let called = Rc::new(RefCell::new(Vec::new()));
	for (name, tag) in [("first", "p"), ("second", "h1")] {
		let called = Rc::clone(&called);
		rt.mount(dom.body(), text(tag, name), move || called.borrow_mut().push(name));
	}
	assert_eq!(dom.inner_html(dom.body()), "");
	assert_eq!(dom.pending_frames(), 1);

	dom.tick();
	assert_eq!(dom.inner_html(dom.body()), "<h1>second</h1>");
	assert_eq!(*called.borrow(), vec!["second"]);
	assert_eq!(rt.mounted_roots().len(), 1);
}

#[test]
fn remounting_patches_in_place() {
	let (dom, rt) = setup();
	let first = text("p", "one");
	rt.mount_sync(dom.body(), first.clone());
	let p = first.dom_node().unwrap();

	let second = text("p", "two");
	rt.mount_sync(dom.body(), second.clone());
	assert_eq!(second.dom_node(), Some(p));
	assert_eq!(dom.inner_html(dom.body()), "<p>two</p>");
	assert_eq!(rt.mounted_roots().len(), 1);
}

#[test]
fn patched_roots_stay_registered() {
	let (dom, rt) = setup();
	let first = text("p", "one");
	rt.mount_sync(dom.body(), first.clone());

	let second = text("h1", "two");
	rt.patch(&first, &second);
	let h1 = second.dom_node().unwrap();
	assert_eq!(dom.inner_html(dom.body()), "<h1>two</h1>");
	assert!(rt.mounted_roots()[0].ptr_eq(&second));

	let third = text("h1", "three");
	rt.mount_sync(dom.body(), third.clone());
	assert_eq!(third.dom_node(), Some(h1));
	assert_eq!(dom.inner_html(dom.body()), "<h1>three</h1>");

	rt.unmount_sync(dom.body());
	assert_eq!(dom.inner_html(dom.body()), "");
	assert!(dom.is_released(h1));
}

#[test]
fn unmounting_cancels_pending_mounts() {
	let (dom, rt) = setup();
	let mounted = Rc::new(RefCell::new(false));
	rt.mount(dom.body(), text("p", "never"), {
		let mounted = Rc::clone(&mounted);
		move || *mounted.borrow_mut() = true
	});

	let unmounted = Rc::new(RefCell::new(false));
	rt.unmount(dom.body(), {
		let unmounted = Rc::clone(&unmounted);
		move || *unmounted.borrow_mut() = true
	});
	assert!(*unmounted.borrow());

	dom.tick();
	assert!(!*mounted.borrow());
	assert_eq!(dom.inner_html(dom.body()), "");
	assert!(rt.mounted_roots().is_empty());
}

#[test]
fn unmounting_removes_the_tree() {
	let (dom, rt) = setup();
	let tree = text("p", "gone");
	rt.mount_sync(dom.body(), tree.clone());
	let p = tree.dom_node().unwrap();
	rt.unmount(dom.body(), || ());
	assert_eq!(dom.inner_html(dom.body()), "<p>gone</p>");
	assert!(!dom.is_released(p));

	dom.tick();
	assert_eq!(dom.inner_html(dom.body()), "");
	assert!(rt.mounted_roots().is_empty());
	assert!(dom.is_released(p));
	assert!(!dom.is_released(dom.body()));
}

#[test]
fn server_markup_is_adopted() {
	let (dom, rt) = setup();
	let clicks = Rc::new(RefCell::new(0));
	let page = || -> Node {
		let clicks = Rc::clone(&clicks);
		TagNode::new("div")
			.attrs(Attrs::new().with("className", "app"))
			.children(TagNode::new("button").attrs(Attrs::new().with("onClick", Handler::new(move |_| *clicks.borrow_mut() += 1))).children("Go"))
			.into()
	};

	let markup = arbor_dom::render_to_string(&page());
	assert_eq!(markup, r#"<div class="app"><button>Go</button></div>"#);
	dom.set_inner_html(dom.body(), &markup).unwrap();
	let div = dom.first_child(dom.body()).unwrap();
	dom.clear_log();

	let tree = page();
	rt.mount_sync(dom.body(), tree.clone());
	assert!(dom.take_log().iter().all(|mutation| !mutation.is_structural()));
	assert_eq!(tree.dom_node(), Some(div));
	assert_eq!(dom.inner_html(dom.body()), markup);
	assert_eq!(arbor_dom::render_to_string(&tree), markup);

	dom.dispatch_event(dom.first_child(div).unwrap(), "click");
	assert_eq!(*clicks.borrow(), 1);
}

#[test]
fn roots_are_independent() {
	let (dom, rt) = setup();
	let left = dom.create_element(None, "section");
	let right = dom.create_element(None, "section");
	dom.append_child(dom.body(), left).unwrap();
	dom.append_child(dom.body(), right).unwrap();

	rt.mount_sync(left, text("p", "left"));
	rt.mount_sync(right, text("p", "right"));
	assert_eq!(rt.mounted_roots().len(), 2);

	rt.unmount_sync(left);
	assert_eq!(dom.inner_html(dom.body()), "<section></section><section><p>right</p></section>");
	assert_eq!(rt.mounted_roots().len(), 1);
}
