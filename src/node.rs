//! Node descriptors and their render/adopt/mount/unmount capabilities.
//!
//! Patching lives in [`crate::diff`].

use crate::{
	attr_config::{self, lookup},
	attrs::{AttrValue, Attrs, Context, Key},
	component::{ComponentDef, Instance},
	controls,
	diagnostic::{self, Misuse},
	escape::escape_html,
	event,
	host::DomNode,
	ops,
	runtime::Runtime,
};
use core::{
	cell::{Cell, RefCell},
	fmt::{self, Debug, Formatter},
};
use hashbrown::HashSet;
use std::rc::Rc;
use tracing::{trace, trace_span, warn};

/// Elements serialized without a closing tag.
const VOID_TAGS: &[&str] = &[
	"area", "base", "br", "col", "command", "embed", "hr", "img", "input", "keygen", "link", "menuitem", "meta", "param", "source", "track", "wbr",
];

/// A virtual DOM node.
///
/// Clones share the same descriptor. Descriptors are immutable once built, apart from the caches reconciliation keeps on them,
/// so a tree should only ever be rendered once and later patched into its successor.
#[derive(Clone)]
pub enum Node {
	Tag(Rc<TagNode>),
	Component(Rc<ComponentNode>),
	Function(Rc<FunctionComponentNode>),
}

/// Children of a tag, or the children payload of a component.
#[derive(Debug, Clone)]
pub enum Children {
	None,
	Text(Rc<str>),
	Nodes(Rc<[Node]>),
}

impl Default for Children {
	fn default() -> Self {
		Children::None
	}
}

impl Children {
	#[must_use]
	pub fn is_none(&self) -> bool {
		matches!(self, Children::None)
	}

	#[must_use]
	pub fn as_text(&self) -> Option<&str> {
		match self {
			Children::Text(text) => Some(text),
			_ => None,
		}
	}

	#[must_use]
	pub fn nodes(&self) -> &[Node] {
		match self {
			Children::Nodes(nodes) => nodes,
			_ => &[],
		}
	}
}

impl From<&str> for Children {
	fn from(text: &str) -> Self {
		if text.is_empty() {
			Children::None
		} else {
			Children::Text(text.into())
		}
	}
}
impl From<String> for Children {
	fn from(text: String) -> Self {
		text.as_str().into()
	}
}
impl From<Rc<str>> for Children {
	fn from(text: Rc<str>) -> Self {
		if text.is_empty() {
			Children::None
		} else {
			Children::Text(text)
		}
	}
}
impl From<Vec<Node>> for Children {
	fn from(nodes: Vec<Node>) -> Self {
		Children::Nodes(nodes.into())
	}
}
impl From<Node> for Children {
	fn from(node: Node) -> Self {
		Children::Nodes(Rc::new([node]))
	}
}
impl From<TagNode> for Children {
	fn from(node: TagNode) -> Self {
		Node::from(node).into()
	}
}
impl From<ComponentNode> for Children {
	fn from(node: ComponentNode) -> Self {
		Node::from(node).into()
	}
}
impl From<FunctionComponentNode> for Children {
	fn from(node: FunctionComponentNode) -> Self {
		Node::from(node).into()
	}
}

fn check_keys(children: &[Node]) {
	let mut keys = HashSet::new();
	for key in children.iter().filter_map(Node::key) {
		if !keys.insert(key) {
			diagnostic::report(&Misuse::DuplicateKey(key.clone()))
		}
	}
}

/// Whether `tag` is serialized without a closing tag.
#[must_use]
pub fn is_void(tag: &str) -> bool {
	VOID_TAGS.contains(&tag)
}

fn placeholder() -> Node {
	TagNode::new("noscript").into()
}

/// A plain element.
pub struct TagNode {
	tag: Rc<str>,
	key: Option<Key>,
	ns: RefCell<Option<Rc<str>>>,
	attrs: Option<Rc<Attrs>>,
	children: Children,
	escape: bool,
	children_set: bool,
	ctx: RefCell<Context>,
	dom: Cell<Option<DomNode>>,
}

impl TagNode {
	#[must_use]
	pub fn new(tag: &str) -> Self {
		Self {
			tag: tag.into(),
			key: None,
			ns: RefCell::new(None),
			attrs: None,
			children: Children::None,
			escape: true,
			children_set: false,
			ctx: RefCell::default(),
			dom: Cell::new(None),
		}
	}

	#[must_use]
	pub fn key(mut self, key: impl Into<Key>) -> Self {
		self.key = Some(key.into());
		self
	}

	#[must_use]
	pub fn ns(self, ns: &str) -> Self {
		*self.ns.borrow_mut() = Some(ns.into());
		self
	}

	#[must_use]
	pub fn attrs(mut self, attrs: impl Into<Rc<Attrs>>) -> Self {
		self.attrs = Some(attrs.into());
		self
	}

	/// Sets child nodes, or text that is escaped when rendered.
	#[must_use]
	pub fn children(mut self, children: impl Into<Children>) -> Self {
		self.set_children(children.into(), true);
		self
	}

	/// Sets raw inner markup.
	#[must_use]
	pub fn html(mut self, markup: &str) -> Self {
		self.set_children(markup.into(), false);
		self
	}

	fn set_children(&mut self, children: Children, escape: bool) {
		if self.children_set {
			diagnostic::report(&Misuse::ChildrenSetTwice(self.tag.to_string()))
		}
		if cfg!(debug_assertions) {
			check_keys(children.nodes())
		}
		self.children = children;
		self.escape = escape;
		self.children_set = true;
	}

	/// Sets the context, handing it down to child nodes too.
	#[must_use]
	pub fn ctx(self, ctx: Context) -> Self {
		self.set_ctx(&ctx);
		self
	}

	fn set_ctx(&self, ctx: &Context) {
		if ctx.is_empty() {
			return;
		}
		*self.ctx.borrow_mut() = ctx.clone();
		for child in self.children.nodes() {
			child.set_ctx(ctx)
		}
	}

	#[must_use]
	pub fn tag(&self) -> &str {
		&self.tag
	}

	#[must_use]
	pub fn get_attrs(&self) -> Option<&Rc<Attrs>> {
		self.attrs.as_ref()
	}

	#[must_use]
	pub fn get_children(&self) -> &Children {
		&self.children
	}

	#[must_use]
	pub fn escapes_children(&self) -> bool {
		self.escape
	}

	#[must_use]
	pub fn dom_node(&self) -> Option<DomNode> {
		self.dom.get()
	}

	pub(crate) fn set_dom(&self, dom: Option<DomNode>) {
		self.dom.set(dom)
	}

	fn render_to_dom(&self, rt: &Runtime, this: &Node) -> DomNode {
		let host = rt.host();
		let dom = host.create_element(self.ns.borrow().as_deref(), &self.tag);
		self.dom.set(Some(dom));

		match &self.children {
			Children::None => (),
			Children::Text(text) => {
				if self.escape {
					host.set_text_content(dom, text)
				} else if let Err(error) = host.set_inner_html(dom, text) {
					warn!("Couldn't set inner HTML: {}", error)
				}
			}
			Children::Nodes(children) => {
				for child in children.iter() {
					let child_dom = child.render_to_dom(rt, Some(this));
					if let Err(error) = host.append_child(dom, child_dom) {
						warn!("Couldn't append child: {}", error)
					}
				}
			}
		}

		// After the children, so that `<select>` finds its options.
		if let Some(attrs) = &self.attrs {
			for (name, value) in attrs.iter().filter(|(_, value)| !value.is_null()) {
				ops::update_attr(rt, dom, name, value)
			}
		}

		dom
	}

	fn write_markup(&self, out: &mut String, selection: Option<&AttrValue>) {
		let tag = &*self.tag;
		out.push('<');
		out.push_str(tag);
		if let Some(ns) = &*self.ns.borrow() {
			out.push_str(" xmlns=\"");
			out.push_str(&crate::escape::escape_attr(ns));
			out.push('"');
		}

		let mut text = self.children.as_text().map(|text| (text.to_owned(), self.escape));
		let mut child_selection = selection.cloned();
		if let Some(attrs) = &self.attrs {
			for (name, value) in attrs.iter().filter(|(_, value)| !value.is_null()) {
				if event::event_for_attr(name).is_some() || event::is_unknown_event_attr(name) || matches!(value, AttrValue::Handler(_)) {
					continue;
				}
				if name == "value" {
					match tag {
						"textarea" => {
							text = Some((value.to_attr_string(), true));
							continue;
						}
						"select" => {
							child_selection = Some(value.clone());
							continue;
						}
						"option" => {
							if selection.map_or(false, |selection| attr_config::is_selected(selection, value)) {
								out.push(' ');
								out.push_str(&lookup("selected").to_markup("selected", &AttrValue::Bool(true)));
							}
						}
						_ => (),
					}
				}
				let markup = lookup(name).to_markup(name, value);
				if !markup.is_empty() {
					out.push(' ');
					out.push_str(&markup);
				}
			}
		}

		if is_void(tag) {
			out.push_str("/>");
			return;
		}
		out.push('>');
		match (text, &self.children) {
			(Some((text, escape)), _) => {
				if escape {
					out.push_str(&escape_html(&text))
				} else {
					out.push_str(&text)
				}
			}
			(None, Children::Nodes(children)) => {
				for child in children.iter() {
					child.write_markup(out, child_selection.as_ref())
				}
			}
			(None, _) => (),
		}
		out.push_str("</");
		out.push_str(tag);
		out.push('>');
	}

	fn adopt_dom(&self, rt: &Runtime, this: &Node, dom: DomNode) {
		self.dom.set(Some(dom));

		if let Some(attrs) = &self.attrs {
			for (name, value) in attrs.iter() {
				if let (Some(kind), AttrValue::Handler(handler)) = (event::event_for_attr(name), value) {
					event::add_listener(rt, dom, kind, handler.clone())
				}
			}
		}

		let children = self.children.nodes();
		if !children.is_empty() {
			let dom_children = rt.host().child_nodes(dom);
			if dom_children.len() < children.len() {
				warn!("Adopted <{}> has {} child node(s), expected {}.", self.tag, dom_children.len(), children.len());
			}
			for (child, child_dom) in children.iter().zip(dom_children) {
				child.adopt_dom(rt, child_dom, Some(this))
			}
		}
	}
}

impl Debug for TagNode {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		let mut debug = f.debug_struct("TagNode");
		debug.field("tag", &self.tag).field("key", &self.key).field("ns", &self.ns.borrow()).field("dom", &self.dom.get());
		if cfg!(feature = "dangerous-logging") {
			debug.field("attrs", &self.attrs).field("children", &self.children);
		} else {
			debug.field("children", &self.children.nodes().len());
		}
		debug.finish()
	}
}

/// A stateful component, instantiated from its [`ComponentDef`] on first render.
pub struct ComponentNode {
	def: ComponentDef,
	key: Option<Key>,
	ns: RefCell<Option<Rc<str>>>,
	attrs: Option<Rc<Attrs>>,
	children: Children,
	ctx: RefCell<Context>,
	instance: RefCell<Option<Rc<Instance>>>,
}

impl ComponentNode {
	#[must_use]
	pub fn new(def: ComponentDef) -> Self {
		Self {
			def,
			key: None,
			ns: RefCell::new(None),
			attrs: None,
			children: Children::None,
			ctx: RefCell::default(),
			instance: RefCell::new(None),
		}
	}

	#[must_use]
	pub fn key(mut self, key: impl Into<Key>) -> Self {
		self.key = Some(key.into());
		self
	}

	#[must_use]
	pub fn ns(self, ns: &str) -> Self {
		*self.ns.borrow_mut() = Some(ns.into());
		self
	}

	#[must_use]
	pub fn attrs(mut self, attrs: impl Into<Rc<Attrs>>) -> Self {
		self.attrs = Some(attrs.into());
		self
	}

	/// Sets the children payload, which is handed to the component as-is.
	#[must_use]
	pub fn children(mut self, children: impl Into<Children>) -> Self {
		self.children = children.into();
		self
	}

	#[must_use]
	pub fn ctx(self, ctx: Context) -> Self {
		*self.ctx.borrow_mut() = ctx;
		self
	}

	#[must_use]
	pub fn def(&self) -> &ComponentDef {
		&self.def
	}

	pub(crate) fn get_attrs(&self) -> Option<Rc<Attrs>> {
		self.attrs.clone()
	}

	pub(crate) fn get_children(&self) -> Children {
		self.children.clone()
	}

	pub(crate) fn get_ctx(&self) -> Context {
		self.ctx.borrow().clone()
	}

	/// The instance, created on first access. `rt` (if any) is what the instance schedules its updates on.
	pub(crate) fn instance(&self, rt: Option<&Runtime>) -> Rc<Instance> {
		let existing = self.instance.borrow().clone();
		match existing {
			Some(instance) => {
				if let Some(rt) = rt {
					instance.attach(rt)
				}
				instance
			}
			None => {
				let instance = Instance::new(
					self.def.clone(),
					self.attrs.clone(),
					self.children.clone(),
					self.ctx.borrow().clone(),
					self.ns.borrow().clone(),
					rt,
				);
				*self.instance.borrow_mut() = Some(Rc::clone(&instance));
				instance
			}
		}
	}

	pub(crate) fn adopt_instance(&self, instance: Rc<Instance>) {
		*self.instance.borrow_mut() = Some(instance)
	}

	pub(crate) fn take_instance(&self) -> Option<Rc<Instance>> {
		self.instance.borrow_mut().take()
	}

	#[must_use]
	pub fn dom_node(&self) -> Option<DomNode> {
		let instance = self.instance.borrow().clone();
		instance.and_then(|instance| instance.root().dom_node())
	}
}

impl Debug for ComponentNode {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		f.debug_struct("ComponentNode")
			.field("def", &self.def)
			.field("key", &self.key)
			.field("ns", &self.ns.borrow())
			.field("instantiated", &self.instance.try_borrow().map(|instance| instance.is_some()).ok())
			.finish()
	}
}

/// Renders a stateless component.
pub type RenderFn = Rc<dyn Fn(&Attrs, &Children, &Context) -> Option<Node>>;

/// A stateless component: its render function is called once per node, on first use.
pub struct FunctionComponentNode {
	render: RenderFn,
	key: Option<Key>,
	ns: RefCell<Option<Rc<str>>>,
	attrs: Rc<Attrs>,
	children: Children,
	ctx: RefCell<Context>,
	root: RefCell<Option<Node>>,
}

impl FunctionComponentNode {
	pub fn new(render: impl Fn(&Attrs, &Children, &Context) -> Option<Node> + 'static) -> Self {
		Self::from_render_fn(Rc::new(render))
	}

	#[must_use]
	pub fn from_render_fn(render: RenderFn) -> Self {
		Self {
			render,
			key: None,
			ns: RefCell::new(None),
			attrs: Rc::default(),
			children: Children::None,
			ctx: RefCell::default(),
			root: RefCell::new(None),
		}
	}

	#[must_use]
	pub fn key(mut self, key: impl Into<Key>) -> Self {
		self.key = Some(key.into());
		self
	}

	#[must_use]
	pub fn ns(self, ns: &str) -> Self {
		*self.ns.borrow_mut() = Some(ns.into());
		self
	}

	#[must_use]
	pub fn attrs(mut self, attrs: impl Into<Rc<Attrs>>) -> Self {
		self.attrs = attrs.into();
		self
	}

	#[must_use]
	pub fn children(mut self, children: impl Into<Children>) -> Self {
		self.children = children.into();
		self
	}

	#[must_use]
	pub fn ctx(self, ctx: Context) -> Self {
		*self.ctx.borrow_mut() = ctx;
		self
	}

	/// The rendered root, produced on first access.
	pub(crate) fn root(&self) -> Node {
		if let Some(root) = &*self.root.borrow() {
			return root.clone();
		}

		let ctx = self.ctx.borrow().clone();
		let root = (self.render)(&self.attrs, &self.children, &ctx).unwrap_or_else(|| {
			diagnostic::report(&Misuse::EmptyRender("a function component"));
			placeholder()
		});
		root.set_ctx(&ctx);
		*self.root.borrow_mut() = Some(root.clone());
		root
	}

	#[must_use]
	pub fn dom_node(&self) -> Option<DomNode> {
		self.root.borrow().as_ref().and_then(Node::dom_node)
	}
}

impl Debug for FunctionComponentNode {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		f.debug_struct("FunctionComponentNode")
			.field("render", &format_args!("{:p}", Rc::as_ptr(&self.render)))
			.field("key", &self.key)
			.field("ns", &self.ns.borrow())
			.field("rendered", &self.root.try_borrow().map(|root| root.is_some()).ok())
			.finish()
	}
}

impl From<TagNode> for Node {
	fn from(node: TagNode) -> Self {
		Node::Tag(Rc::new(node))
	}
}
impl From<ComponentNode> for Node {
	fn from(node: ComponentNode) -> Self {
		Node::Component(Rc::new(node))
	}
}
impl From<FunctionComponentNode> for Node {
	fn from(node: FunctionComponentNode) -> Self {
		Node::Function(Rc::new(node))
	}
}

/// What [`create`] builds a node from.
#[derive(Clone)]
pub enum NodeType<'a> {
	Tag(&'a str),
	Component(ComponentDef),
	Function(RenderFn),
}

/// Builds a node for `node_type`, to be configured further before it's converted into a [`Node`].
///
/// `input`, `textarea` and `select` become their controlled wrappers from [`crate::controls`].
/// Tag names that can't name an element are reported and replaced with an empty `noscript`.
#[must_use]
pub fn create(node_type: NodeType<'_>) -> Builder {
	match node_type {
		NodeType::Tag(tag) => match tag {
			"input" => ComponentNode::new(controls::input()).into(),
			"textarea" => ComponentNode::new(controls::textarea()).into(),
			"select" => ComponentNode::new(controls::select()).into(),
			tag if tag.is_empty() || !tag.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == ':' || c == '_') => {
				diagnostic::report(&Misuse::UnsupportedNodeType(tag.to_owned()));
				TagNode::new("noscript").into()
			}
			tag => TagNode::new(tag).into(),
		},
		NodeType::Component(def) => ComponentNode::new(def).into(),
		NodeType::Function(render) => FunctionComponentNode::from_render_fn(render).into(),
	}
}

/// Any of the node builders, as returned by [`create`].
#[derive(Debug)]
pub enum Builder {
	Tag(TagNode),
	Component(ComponentNode),
	Function(FunctionComponentNode),
}

macro_rules! forward {
	($self:ident.$method:ident($($arg:expr),*)) => {
		match $self {
			Builder::Tag(node) => Builder::Tag(node.$method($($arg),*)),
			Builder::Component(node) => Builder::Component(node.$method($($arg),*)),
			Builder::Function(node) => Builder::Function(node.$method($($arg),*)),
		}
	};
}

impl Builder {
	#[must_use]
	pub fn key(self, key: impl Into<Key>) -> Self {
		let key = key.into();
		forward!(self.key(key))
	}

	#[must_use]
	pub fn ns(self, ns: &str) -> Self {
		forward!(self.ns(ns))
	}

	#[must_use]
	pub fn attrs(self, attrs: impl Into<Rc<Attrs>>) -> Self {
		let attrs = attrs.into();
		forward!(self.attrs(attrs))
	}

	#[must_use]
	pub fn children(self, children: impl Into<Children>) -> Self {
		let children = children.into();
		forward!(self.children(children))
	}

	/// Raw inner markup. Components receive it as a text children payload.
	#[must_use]
	pub fn html(self, markup: &str) -> Self {
		match self {
			Builder::Tag(node) => Builder::Tag(node.html(markup)),
			builder => builder.children(markup),
		}
	}

	#[must_use]
	pub fn ctx(self, ctx: Context) -> Self {
		forward!(self.ctx(ctx))
	}
}

impl From<TagNode> for Builder {
	fn from(node: TagNode) -> Self {
		Builder::Tag(node)
	}
}
impl From<ComponentNode> for Builder {
	fn from(node: ComponentNode) -> Self {
		Builder::Component(node)
	}
}
impl From<FunctionComponentNode> for Builder {
	fn from(node: FunctionComponentNode) -> Self {
		Builder::Function(node)
	}
}

impl From<Builder> for Node {
	fn from(builder: Builder) -> Self {
		match builder {
			Builder::Tag(node) => node.into(),
			Builder::Component(node) => node.into(),
			Builder::Function(node) => node.into(),
		}
	}
}
impl From<Builder> for Children {
	fn from(builder: Builder) -> Self {
		Node::from(builder).into()
	}
}

impl Node {
	/// Reference identity.
	#[must_use]
	pub fn ptr_eq(&self, other: &Self) -> bool {
		match (self, other) {
			(Node::Tag(a), Node::Tag(b)) => Rc::ptr_eq(a, b),
			(Node::Component(a), Node::Component(b)) => Rc::ptr_eq(a, b),
			(Node::Function(a), Node::Function(b)) => Rc::ptr_eq(a, b),
			_ => false,
		}
	}

	#[must_use]
	pub fn key(&self) -> Option<&Key> {
		match self {
			Node::Tag(node) => node.key.as_ref(),
			Node::Component(node) => node.key.as_ref(),
			Node::Function(node) => node.key.as_ref(),
		}
	}

	fn ns_cell(&self) -> &RefCell<Option<Rc<str>>> {
		match self {
			Node::Tag(node) => &node.ns,
			Node::Component(node) => &node.ns,
			Node::Function(node) => &node.ns,
		}
	}

	#[must_use]
	pub fn ns(&self) -> Option<Rc<str>> {
		self.ns_cell().borrow().clone()
	}

	/// Takes over `ns` unless a namespace is already set.
	pub(crate) fn inherit_ns(&self, ns: Option<Rc<str>>) {
		if let Some(ns) = ns {
			let mut own = self.ns_cell().borrow_mut();
			if own.is_none() {
				*own = Some(ns)
			}
		}
	}

	pub(crate) fn inherit_ns_from(&self, parent: Option<&Node>) {
		if let Some(parent) = parent {
			self.inherit_ns(parent.ns())
		}
	}

	pub(crate) fn set_ctx(&self, ctx: &Context) {
		match self {
			Node::Tag(node) => node.set_ctx(ctx),
			Node::Component(node) => {
				if !ctx.is_empty() {
					*node.ctx.borrow_mut() = ctx.clone()
				}
			}
			Node::Function(node) => {
				if !ctx.is_empty() {
					*node.ctx.borrow_mut() = ctx.clone()
				}
			}
		}
	}

	/// The live DOM node this node currently renders to, if any.
	#[must_use]
	pub fn dom_node(&self) -> Option<DomNode> {
		match self {
			Node::Tag(node) => node.dom_node(),
			Node::Component(node) => node.dom_node(),
			Node::Function(node) => node.dom_node(),
		}
	}

	/// Creates the DOM for this subtree and returns its root. Attaches attributes and listeners, but doesn't mount.
	pub fn render_to_dom(&self, rt: &Runtime, parent: Option<&Node>) -> DomNode {
		self.inherit_ns_from(parent);
		match self {
			Node::Tag(node) => {
				let span = trace_span!("Rendering tag", tag = &*node.tag);
				let _enter = span.enter();
				node.render_to_dom(rt, self)
			}
			Node::Component(node) => node.instance(Some(rt)).root().render_to_dom(rt, Some(self)),
			Node::Function(node) => node.root().render_to_dom(rt, Some(self)),
		}
	}

	/// Markup equivalent to what [`render_to_dom`](`Node::render_to_dom`) creates.
	#[must_use]
	pub fn render_to_string(&self) -> String {
		let mut out = String::new();
		self.write_markup(&mut out, None);
		out
	}

	fn write_markup(&self, out: &mut String, selection: Option<&AttrValue>) {
		match self {
			Node::Tag(node) => node.write_markup(out, selection),
			Node::Component(node) => node.instance(None).root().write_markup(out, selection),
			Node::Function(node) => node.root().write_markup(out, selection),
		}
	}

	/// Binds this subtree to existing DOM (for example from [`render_to_string`](`Node::render_to_string`) markup) without recreating it.
	pub fn adopt_dom(&self, rt: &Runtime, dom: DomNode, parent: Option<&Node>) {
		self.inherit_ns_from(parent);
		match self {
			Node::Tag(node) => node.adopt_dom(rt, self, dom),
			Node::Component(node) => node.instance(Some(rt)).root().adopt_dom(rt, dom, Some(self)),
			Node::Function(node) => node.root().adopt_dom(rt, dom, Some(self)),
		}
	}

	/// Post-order: descendants first, then this node's component (if any).
	pub fn mount(&self, rt: &Runtime) {
		match self {
			Node::Tag(node) => {
				for child in node.children.nodes() {
					child.mount(rt)
				}
			}
			Node::Component(node) => {
				let instance = node.instance(Some(rt));
				instance.root().mount(rt);
				instance.mount();
			}
			Node::Function(node) => node.root().mount(rt),
		}
	}

	/// Unmounts descendants, then releases this node's listeners and DOM reference.
	///
	/// The node must not be reused afterwards.
	pub fn unmount(&self, rt: &Runtime) {
		match self {
			Node::Tag(node) => {
				for child in node.children.nodes() {
					child.unmount(rt)
				}
				if let Some(dom) = node.dom.take() {
					event::remove_listeners(rt, dom)
				}
			}
			Node::Component(node) => {
				if let Some(instance) = node.take_instance() {
					instance.root().unmount(rt);
					instance.unmount();
				}
			}
			Node::Function(node) => {
				let root = node.root.borrow_mut().take();
				if let Some(root) = root {
					root.unmount(rt)
				}
			}
		}
		trace!("Unmounted.");
	}
}

impl Debug for Node {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		match self {
			Node::Tag(node) => Debug::fmt(node, f),
			Node::Component(node) => Debug::fmt(node, f),
			Node::Function(node) => Debug::fmt(node, f),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn markup() {
		let node: Node = TagNode::new("div")
			.attrs(Attrs::new().with("className", "list").with("hidden", AttrValue::Null).with("onClick", crate::attrs::Handler::new(|_| ())))
			.children(vec![
				TagNode::new("span").children("a < b").into(),
				TagNode::new("br").into(),
				TagNode::new("i").html("<b>raw</b>").into(),
			])
			.into();
		assert_eq!(node.render_to_string(), r#"<div class="list"><span>a &lt; b</span><br/><i><b>raw</b></i></div>"#);
	}

	#[test]
	fn form_markup() {
		let textarea: Node = TagNode::new("textarea").attrs(Attrs::new().with("value", "<hi>")).into();
		assert_eq!(textarea.render_to_string(), "<textarea>&lt;hi&gt;</textarea>");

		let select: Node = TagNode::new("select")
			.attrs(Attrs::new().with("value", "b"))
			.children(vec![
				TagNode::new("option").attrs(Attrs::new().with("value", "a")).children("A").into(),
				TagNode::new("option").attrs(Attrs::new().with("value", "b")).children("B").into(),
			])
			.into();
		assert_eq!(
			select.render_to_string(),
			r#"<select><option value="a">A</option><option selected value="b">B</option></select>"#
		);
	}

	#[test]
	fn xmlns_where_set() {
		let svg: Node = TagNode::new("svg").ns("http://www.w3.org/2000/svg").children(TagNode::new("circle")).into();
		assert_eq!(svg.render_to_string(), r#"<svg xmlns="http://www.w3.org/2000/svg"><circle></circle></svg>"#);
	}

	#[test]
	fn empty_text_is_no_children() {
		let node = TagNode::new("p").children("");
		assert!(node.get_children().is_none());
	}

	#[test]
	fn function_components_render_once() {
		use std::cell::Cell;
		let calls = Rc::new(Cell::new(0));
		let node: Node = FunctionComponentNode::new({
			let calls = Rc::clone(&calls);
			move |attrs, _, _| {
				calls.set(calls.get() + 1);
				Some(TagNode::new("b").children(attrs.get("text").map(AttrValue::to_attr_string).unwrap_or_default()).into())
			}
		})
		.attrs(Attrs::new().with("text", "hi"))
		.into();
		assert_eq!(node.render_to_string(), "<b>hi</b>");
		assert_eq!(node.render_to_string(), "<b>hi</b>");
		assert_eq!(calls.get(), 1);
	}
}
