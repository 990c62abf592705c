mod common;

use arbor_dom::{memory::Mutation, Attrs, Host, Node, TagNode};
use common::{keyed_list, setup};
use proptest::prelude::*;

fn page() -> Node {
	TagNode::new("div")
		.attrs(Attrs::new().with("className", "page").with("style", Attrs::new().with("color", "red")))
		.children(vec![TagNode::new("h1").children("Title").into(), keyed_list(&[1, 2, 3])])
		.into()
}

#[test]
fn equal_trees_patch_to_nothing() {
	let (dom, rt) = setup();
	let first = page();
	rt.mount_sync(dom.body(), first.clone());
	dom.clear_log();

	let next = page();
	rt.patch(&first, &next);
	assert_eq!(dom.take_log(), Vec::<Mutation>::new());
	assert_eq!(next.dom_node(), first.dom_node());
}

#[test]
fn keyed_rotation_is_a_single_move() {
	let (dom, rt) = setup();
	let first = keyed_list(&[1, 2, 3]);
	rt.mount_sync(dom.body(), first.clone());
	let ul = first.dom_node().unwrap();
	let items = dom.child_nodes(ul);
	dom.clear_log();

	rt.patch(&first, &keyed_list(&[3, 1, 2]));
	assert_eq!(
		dom.take_log(),
		vec![Mutation::Insert {
			parent: ul,
			child: items[2],
			before: Some(items[0]),
		}]
	);
	assert_eq!(dom.child_nodes(ul), vec![items[2], items[0], items[1]]);
}

#[test]
fn keyed_insertions_and_removals() {
	let (dom, rt) = setup();
	let first = keyed_list(&[1, 2, 3, 4]);
	rt.mount_sync(dom.body(), first.clone());
	let ul = first.dom_node().unwrap();
	let items = dom.child_nodes(ul);

	rt.patch(&first, &keyed_list(&[5, 3, 1]));
	assert_eq!(dom.inner_html(ul), "<li>5</li><li>3</li><li>1</li>");
	let now = dom.child_nodes(ul);
	assert_eq!(&now[1..], &[items[2], items[0]]);
	assert!(!dom.contains(items[1]));
	assert!(!dom.contains(items[3]));
	assert!(dom.is_released(items[1]));
	assert!(dom.is_released(dom.first_child(items[3]).unwrap()));
	assert!(!dom.is_released(items[0]));
	assert!(!dom.is_released(ul));
}

#[test]
fn unkeyed_truncation_removes_the_tail() {
	let (dom, rt) = setup();
	let list = |items: &[&str]| -> Node { TagNode::new("ol").children(items.iter().map(|&item| TagNode::new("li").children(item).into()).collect::<Vec<Node>>()).into() };
	let first = list(&["a", "b", "c", "d"]);
	rt.mount_sync(dom.body(), first.clone());
	let ol = first.dom_node().unwrap();
	let items = dom.child_nodes(ol);
	dom.clear_log();

	rt.patch(&first, &list(&["a", "b"]));
	assert_eq!(
		dom.take_log(),
		vec![
			Mutation::Remove { parent: ol, child: items[2] },
			Mutation::Remove { parent: ol, child: items[3] },
		]
	);
}

#[test]
fn style_maps_apply_only_their_delta() {
	let (dom, rt) = setup();
	let styled = |style: Attrs| -> Node { TagNode::new("div").attrs(Attrs::new().with("style", style)).into() };
	let first = styled(Attrs::new().with("color", "red").with("size", "1"));
	rt.mount_sync(dom.body(), first.clone());
	let div = first.dom_node().unwrap();
	dom.clear_log();

	rt.patch(&first, &styled(Attrs::new().with("color", "blue")));
	assert_eq!(
		dom.take_log(),
		vec![Mutation::SetStyle {
			node: div,
			changes: vec![("color".to_owned(), Some("blue".to_owned())), ("size".to_owned(), None)],
		}]
	);
	assert_eq!(dom.attribute(div, "style").as_deref(), Some("color:blue;"));
}

#[test]
fn removed_attributes_are_removed() {
	let (dom, rt) = setup();
	let first: Node = TagNode::new("a").attrs(Attrs::new().with("href", "/").with("tabIndex", 1)).into();
	rt.mount_sync(dom.body(), first.clone());
	let a = first.dom_node().unwrap();
	assert_eq!(dom.attribute(a, "tabindex").as_deref(), Some("1"));

	rt.patch(&first, &TagNode::new("a").attrs(Attrs::new().with("href", "/home")).into());
	assert_eq!(dom.outer_html(a), r#"<a href="/home"></a>"#);
}

#[test]
fn changed_tags_are_replaced() {
	let (dom, rt) = setup();
	let first: Node = TagNode::new("div").children(TagNode::new("span")).into();
	rt.mount_sync(dom.body(), first.clone());
	let div = first.dom_node().unwrap();
	let span = dom.child_nodes(div)[0];
	dom.clear_log();

	let p: Node = TagNode::new("p").into();
	rt.patch(&first, &TagNode::new("div").children(p.clone()).into());
	let p_dom = p.dom_node().unwrap();
	assert_eq!(
		dom.take_log(),
		vec![
			Mutation::CreateElement { node: p_dom, tag: "p".to_owned() },
			Mutation::Replace { parent: div, new: p_dom, old: span },
		]
	);
	assert!(dom.is_released(span));
	assert!(!dom.is_released(p_dom));
}

#[test]
fn text_and_children_swap() {
	let (dom, rt) = setup();
	let first: Node = TagNode::new("div").children("hi").into();
	rt.mount_sync(dom.body(), first.clone());
	let div = first.dom_node().unwrap();

	let second: Node = TagNode::new("div").children(vec![TagNode::new("b").into(), TagNode::new("i").into()]).into();
	rt.patch(&first, &second);
	assert_eq!(dom.inner_html(div), "<b></b><i></i>");

	let swapped = dom.child_nodes(div);
	let third: Node = TagNode::new("div").children("bye").into();
	rt.patch(&second, &third);
	assert_eq!(dom.inner_html(div), "bye");
	assert!(swapped.iter().all(|&child| dom.is_released(child)));

	let fourth: Node = TagNode::new("div").html("<em>raw</em>").into();
	rt.patch(&third, &fourth);
	assert_eq!(dom.inner_html(div), "<em>raw</em>");
}

#[test]
fn svg_children_inherit_the_namespace() {
	let (dom, rt) = setup();
	let svg: Node = TagNode::new("svg").ns("http://www.w3.org/2000/svg").children(TagNode::new("circle")).into();
	rt.mount_sync(dom.body(), svg);
	assert_eq!(dom.inner_html(dom.body()), r#"<svg xmlns="http://www.w3.org/2000/svg"><circle></circle></svg>"#);
}

proptest! {
	#[test]
	fn keyed_permutations_only_move(order in Just((0..9).collect::<Vec<i32>>()).prop_shuffle()) {
		let (dom, rt) = setup();
		let first = keyed_list(&(0..9).collect::<Vec<i32>>());
		rt.mount_sync(dom.body(), first.clone());
		let ul = first.dom_node().unwrap();
		dom.clear_log();

		rt.patch(&first, &keyed_list(&order));
		let expected: String = order.iter().map(ToString::to_string).collect();
		prop_assert_eq!(dom.text_content(ul), expected);
		prop_assert!(dom.take_log().iter().all(|mutation| !mutation.is_structural()));
	}
}
