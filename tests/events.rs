mod common;

use arbor_dom::{controls, create, host::ListenTarget, AttrValue, Attrs, Builder, ComponentNode, Handler, Host, Node, NodeType, SyntheticEvent, TagNode};
use common::{keyed_list, setup};
use std::{cell::RefCell, rc::Rc};

type Log = Rc<RefCell<Vec<&'static str>>>;

fn recorder(log: &Log, name: &'static str, stops: bool) -> Handler {
	let log = Rc::clone(log);
	Handler::new(move |event: &mut SyntheticEvent| {
		log.borrow_mut().push(name);
		if stops {
			event.stop_propagation()
		}
	})
}

fn nested(log: &Log, inner_stops: bool) -> Node {
	TagNode::new("div")
		.attrs(Attrs::new().with("onClick", recorder(log, "outer", false)))
		.children(TagNode::new("button").attrs(Attrs::new().with("onClick", recorder(log, "inner", inner_stops))))
		.into()
}

#[test]
fn delegated_handlers_run_innermost_first() {
	let (dom, rt) = setup();
	let log = Log::default();
	let tree = nested(&log, false);
	rt.mount_sync(dom.body(), tree.clone());

	let button = dom.first_child(tree.dom_node().unwrap()).unwrap();
	let dispatched = dom.dispatch_event(button, "click");
	assert_eq!(*log.borrow(), vec!["inner", "outer"]);
	assert!(!dispatched.propagation_stopped);
	assert!(dom.is_listening(ListenTarget::Document, "click"));
	assert_eq!(rt.events().borrow().delegated_count("click"), 2);
}

#[test]
fn stopped_propagation_skips_ancestors() {
	let (dom, rt) = setup();
	let log = Log::default();
	let tree = nested(&log, true);
	rt.mount_sync(dom.body(), tree.clone());

	let button = dom.first_child(tree.dom_node().unwrap()).unwrap();
	let dispatched = dom.dispatch_event(button, "click");
	assert_eq!(*log.borrow(), vec!["inner"]);
	assert!(dispatched.propagation_stopped);
}

#[test]
fn removed_handlers_stop_firing() {
	let (dom, rt) = setup();
	let log = Log::default();
	let first: Node = TagNode::new("button").attrs(Attrs::new().with("onClick", recorder(&log, "click", false))).into();
	rt.mount_sync(dom.body(), first.clone());
	let button = first.dom_node().unwrap();

	rt.patch(&first, &TagNode::new("button").into());
	dom.dispatch_event(button, "click");
	assert!(log.borrow().is_empty());
	assert_eq!(rt.events().borrow().delegated_count("click"), 0);
	assert!(!rt.events().borrow().has_handlers(button));
	assert!(rt.events().borrow().is_delegated_listener_installed("click"));
}

#[test]
fn non_bubbling_events_listen_on_the_node() {
	let (dom, rt) = setup();
	let log = Log::default();
	let tree: Node = TagNode::new("div")
		.attrs(Attrs::new().with("onMouseEnter", recorder(&log, "enter", false)))
		.children(TagNode::new("span"))
		.into();
	rt.mount_sync(dom.body(), tree.clone());
	let div = tree.dom_node().unwrap();
	assert!(dom.is_listening(ListenTarget::Node(div), "mouseenter"));
	assert!(!dom.is_listening(ListenTarget::Document, "mouseenter"));

	dom.dispatch_event(dom.first_child(div).unwrap(), "mouseenter");
	assert!(log.borrow().is_empty());
	dom.dispatch_event(div, "mouseenter");
	assert_eq!(*log.borrow(), vec!["enter"]);

	rt.unmount_sync(dom.body());
	assert!(!dom.is_listening(ListenTarget::Node(div), "mouseenter"));
}

#[test]
fn focus_and_blur_delegate_through_focusin_and_focusout() {
	let (dom, rt) = setup();
	let log = Log::default();
	let tree: Node = TagNode::new("form")
		.attrs(Attrs::new().with("onFocus", recorder(&log, "form focus", false)))
		.children(TagNode::new("button").attrs(Attrs::new().with("onFocus", recorder(&log, "focus", false)).with("onBlur", recorder(&log, "blur", false))))
		.into();
	rt.mount_sync(dom.body(), tree.clone());
	let button = dom.first_child(tree.dom_node().unwrap()).unwrap();
	assert!(dom.is_listening(ListenTarget::Document, "focusin"));
	assert!(dom.is_listening(ListenTarget::Document, "focusout"));
	assert!(!dom.is_listening(ListenTarget::Document, "focus"));
	assert_eq!(rt.events().borrow().delegated_count("focus"), 2);

	dom.dispatch_event(button, "focus");
	assert!(log.borrow().is_empty());

	dom.dispatch_event(button, "focusin");
	assert_eq!(*log.borrow(), vec!["focus", "form focus"]);
	dom.dispatch_event(button, "focusout");
	assert_eq!(*log.borrow(), vec!["focus", "form focus", "blur"]);
}

#[test]
fn focus_survives_keyed_moves() {
	let (dom, rt) = setup();
	let first = keyed_list(&[1, 2, 3]);
	rt.mount_sync(dom.body(), first.clone());
	let third = dom.child_nodes(first.dom_node().unwrap())[2];
	dom.focus(third);

	rt.patch(&first, &keyed_list(&[3, 1, 2]));
	assert_eq!(dom.active_element(), Some(third));
}

#[test]
fn controlled_inputs_snap_back() {
	let (dom, rt) = setup();
	let log = Log::default();
	let tree: Node = ComponentNode::new(controls::input())
		.attrs(Attrs::new().with("type", "text").with("value", "a").with("onInput", recorder(&log, "input", false)))
		.into();
	rt.mount_sync(dom.body(), tree.clone());
	let input = tree.dom_node().unwrap();
	assert_eq!(dom.property(input, "value").as_ref().and_then(AttrValue::as_str), Some("a"));

	// Typing changes the live value without a matching attr.
	dom.set_property(input, "value", &"ab".into()).unwrap();
	dom.dispatch_event(input, "input");
	assert_eq!(*log.borrow(), vec!["input"]);
	assert_eq!(dom.property(input, "value").as_ref().and_then(AttrValue::as_str), Some("a"));
}

#[test]
fn controlled_checkboxes_snap_back() {
	let (dom, rt) = setup();
	let tree: Node = ComponentNode::new(controls::input()).attrs(Attrs::new().with("type", "checkbox").with("checked", false)).into();
	rt.mount_sync(dom.body(), tree.clone());
	let checkbox = tree.dom_node().unwrap();

	dom.set_property(checkbox, "checked", &true.into()).unwrap();
	dom.dispatch_event(checkbox, "click");
	assert_eq!(dom.property(checkbox, "checked").and_then(|checked| checked.as_bool()), Some(false));
}

#[test]
fn select_value_selects_options() {
	let (dom, rt) = setup();
	let option = |value: &str| -> Node { TagNode::new("option").attrs(Attrs::new().with("value", value)).children(value.to_uppercase()).into() };
	let tree: Node = ComponentNode::new(controls::select())
		.attrs(Attrs::new().with("value", "b"))
		.children(vec![option("a"), option("b")])
		.into();
	rt.mount_sync(dom.body(), tree.clone());

	let select = tree.dom_node().unwrap();
	let options = dom.child_nodes(select);
	let selected = |option| dom.property(option, "selected").map_or(false, |selected| selected.is_truthy());
	assert!(!selected(options[0]));
	assert!(selected(options[1]));
	assert_eq!(dom.property(select, "value").as_ref().and_then(AttrValue::as_str), Some("b"));
}

#[test]
fn create_maps_form_controls_to_their_wrappers() {
	assert!(matches!(create(NodeType::Tag("select")), Builder::Component(node) if node.def() == &controls::select()));
	assert!(matches!(create(NodeType::Tag("input")), Builder::Component(node) if node.def() == &controls::input()));
	assert!(matches!(create(NodeType::Tag("textarea")), Builder::Component(node) if node.def() == &controls::textarea()));
	assert!(matches!(create(NodeType::Tag("label")), Builder::Tag(node) if node.tag() == "label"));
	assert!(matches!(create(NodeType::Tag("not a tag")), Builder::Tag(node) if node.tag() == "noscript"));
	assert!(matches!(create(NodeType::Component(controls::select())), Builder::Component(_)));
}

#[test]
fn created_nodes_take_their_configuration() {
	let (dom, rt) = setup();
	let log = Log::default();
	let tree: Node = create(NodeType::Tag("form"))
		.attrs(Attrs::new().with("className", "signup"))
		.children(vec![
			Node::from(create(NodeType::Tag("input")).key("name").attrs(Attrs::new().with("type", "text").with("value", "a").with("onInput", recorder(&log, "input", false)))),
			Node::from(create(NodeType::Tag("textarea")).key("bio").attrs(Attrs::new().with("value", "hello"))),
			Node::from(create(NodeType::Tag("p")).html("<b>raw</b>")),
		])
		.into();
	rt.mount_sync(dom.body(), tree.clone());

	let form = tree.dom_node().unwrap();
	let [input, textarea, p] = <[_; 3]>::try_from(dom.child_nodes(form)).unwrap();
	assert_eq!(dom.attribute(form, "class").as_deref(), Some("signup"));
	assert_eq!(dom.tag_name(input).as_deref(), Some("input"));
	assert_eq!(dom.tag_name(textarea).as_deref(), Some("textarea"));
	assert_eq!(dom.inner_html(p), "<b>raw</b>");
	assert_eq!(dom.property(textarea, "value").as_ref().and_then(AttrValue::as_str), Some("hello"));

	dom.set_property(input, "value", &"ab".into()).unwrap();
	dom.dispatch_event(input, "input");
	assert_eq!(*log.borrow(), vec!["input"]);
	assert_eq!(dom.property(input, "value").as_ref().and_then(AttrValue::as_str), Some("a"));
}
