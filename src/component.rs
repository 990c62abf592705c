//! Stateful components: the hook trait, definitions and per-node instances.

use crate::{
	attrs::{Attrs, Context},
	diagnostic::{self, Misuse},
	hook::HookEvent,
	host::DomNode,
	node::{Children, Node, TagNode},
	runtime::{Runtime, WeakRuntime},
};
use core::{
	any::{type_name, TypeId},
	cell::RefCell,
	fmt::{self, Debug, Formatter},
	mem,
};
use hashbrown::HashMap;
use std::rc::{Rc, Weak};
use tracing::{trace, trace_span};

/// Lifecycle hooks of a stateful component. Everything except [`on_render`](`Component::on_render`) has a no-op default.
///
/// Hooks receive a [`ComponentCx`] for the instance they run on.
/// An instance never re-enters its own hooks: a hook call made while another hook of the same instance is running is skipped and reported.
#[allow(unused_variables)]
pub trait Component: 'static {
	/// Runs once, before the first render.
	fn on_init(&mut self, cx: &ComponentCx<'_>) {}

	/// Runs once, after the rendered DOM is attached.
	fn on_mount(&mut self, cx: &ComponentCx<'_>) {}

	fn on_unmount(&mut self, cx: &ComponentCx<'_>) {}

	/// New attrs arrived while mounted. [`ComponentCx::attrs`] already returns `next`.
	fn on_attrs_receive(&mut self, cx: &ComponentCx<'_>, next: &Rc<Attrs>, prev: &Rc<Attrs>) {}

	/// Whether to re-render for `next`.
	fn should_update(&mut self, cx: &ComponentCx<'_>, next: &Rc<Attrs>, prev: &Rc<Attrs>) -> bool {
		true
	}

	/// Runs after a re-render while mounted.
	fn on_update(&mut self, cx: &ComponentCx<'_>, next: &Rc<Attrs>, prev: &Rc<Attrs>) {}

	/// The root node. [`None`] renders an empty `noscript` placeholder.
	fn on_render(&mut self, cx: &ComponentCx<'_>) -> Option<Node>;

	/// Context entries added for the rendered subtree.
	fn on_child_context_request(&mut self, cx: &ComponentCx<'_>) -> Context {
		Context::empty()
	}

	/// Attrs that [`ComponentDef::of`] uses as this component's defaults.
	fn default_attrs() -> Attrs
	where
		Self: Sized,
	{
		Attrs::new()
	}
}

type Factory = Box<dyn Fn() -> Box<dyn Component>>;

struct DefInner {
	name: &'static str,
	factory: Factory,
	default_attrs: RefCell<Rc<Attrs>>,
}

/// A component definition. Two definitions are the same iff they are clones of one another.
#[derive(Clone)]
pub struct ComponentDef(Rc<DefInner>);

thread_local! {
	static DEFS_BY_TYPE: RefCell<HashMap<TypeId, ComponentDef>> = RefCell::new(HashMap::new());
}

impl ComponentDef {
	pub fn new(name: &'static str, factory: impl Fn() -> Box<dyn Component> + 'static) -> Self {
		Self(Rc::new(DefInner {
			name,
			factory: Box::new(factory),
			default_attrs: RefCell::default(),
		}))
	}

	/// The definition for `C`. Repeated calls return the same definition.
	#[must_use]
	pub fn of<C: Component + Default>() -> Self {
		DEFS_BY_TYPE.with(|defs| {
			defs.borrow_mut()
				.entry(TypeId::of::<C>())
				.or_insert_with(|| Self::new(type_name::<C>(), || Box::new(C::default())).with_default_attrs(C::default_attrs()))
				.clone()
		})
	}

	/// Replaces the attrs that instances fall back to for anything not passed explicitly.
	#[must_use]
	pub fn with_default_attrs(self, attrs: Attrs) -> Self {
		*self.0.default_attrs.borrow_mut() = Rc::new(attrs);
		self
	}

	#[must_use]
	pub fn name(&self) -> &'static str {
		self.0.name
	}

	#[must_use]
	pub fn ptr_eq(&self, other: &Self) -> bool {
		Rc::ptr_eq(&self.0, &other.0)
	}

	/// `attrs` over the defaults. Returns `current` itself if `attrs` is that same map.
	fn build_attrs(&self, attrs: Option<Rc<Attrs>>, current: Option<&Rc<Attrs>>) -> Rc<Attrs> {
		if let (Some(attrs), Some(current)) = (&attrs, current) {
			if Rc::ptr_eq(attrs, current) {
				return Rc::clone(attrs);
			}
		}

		let defaults = Rc::clone(&self.0.default_attrs.borrow());
		match attrs {
			None => defaults,
			Some(attrs) if defaults.is_empty() => attrs,
			Some(attrs) => Rc::new(defaults.merged(&attrs)),
		}
	}
}

impl PartialEq for ComponentDef {
	fn eq(&self, other: &Self) -> bool {
		self.ptr_eq(other)
	}
}
impl Eq for ComponentDef {}

impl Debug for ComponentDef {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		write!(f, "ComponentDef({})", self.0.name)
	}
}

struct State {
	attrs: Rc<Attrs>,
	children: Children,
	ctx: Context,
	ns: Option<Rc<str>>,
	mounted: bool,
	updating: bool,
	dom_refs: HashMap<Rc<str>, Node>,
	root: Node,
}

/// The live state behind a [`ComponentNode`](`crate::node::ComponentNode`).
pub struct Instance {
	def: ComponentDef,
	component: RefCell<Box<dyn Component>>,
	state: RefCell<State>,
	runtime: RefCell<WeakRuntime>,
}

impl Instance {
	pub(crate) fn new(def: ComponentDef, attrs: Option<Rc<Attrs>>, children: Children, ctx: Context, ns: Option<Rc<str>>, rt: Option<&Runtime>) -> Rc<Self> {
		let span = trace_span!("Instantiating component", name = def.name());
		let _enter = span.enter();

		let attrs = def.build_attrs(attrs, None);
		let component = RefCell::new((def.0.factory)());
		let instance = Rc::new(Self {
			def,
			component,
			state: RefCell::new(State {
				attrs,
				children,
				ctx,
				ns,
				mounted: false,
				updating: false,
				dom_refs: HashMap::new(),
				root: TagNode::new("noscript").into(),
			}),
			runtime: RefCell::new(rt.map_or_else(WeakRuntime::new, Runtime::downgrade)),
		});

		instance.with_component("on_init", (), |component, cx| component.on_init(cx));
		let root = instance.render();
		instance.state.borrow_mut().root = root;
		instance
	}

	/// Runs `hook` on the component, unless one of its hooks is already running.
	fn with_component<R>(self: &Rc<Self>, hook: &'static str, skipped: R, f: impl FnOnce(&mut dyn Component, &ComponentCx<'_>) -> R) -> R {
		match self.component.try_borrow_mut() {
			Ok(mut component) => f(&mut **component, &ComponentCx { instance: self }),
			Err(_) => {
				trace!(hook, "Skipping re-entered hook.");
				diagnostic::report(&Misuse::HookReentered(self.def.name()));
				skipped
			}
		}
	}

	pub(crate) fn attach(&self, rt: &Runtime) {
		let mut runtime = self.runtime.borrow_mut();
		if runtime.upgrade().is_none() {
			*runtime = rt.downgrade()
		}
	}

	fn runtime(&self) -> Option<Runtime> {
		self.runtime.borrow().upgrade()
	}

	#[must_use]
	pub fn def(&self) -> &ComponentDef {
		&self.def
	}

	#[must_use]
	pub fn root(&self) -> Node {
		self.state.borrow().root.clone()
	}

	#[must_use]
	pub fn attrs(&self) -> Rc<Attrs> {
		Rc::clone(&self.state.borrow().attrs)
	}

	#[must_use]
	pub fn is_mounted(&self) -> bool {
		self.state.borrow().mounted
	}

	#[must_use]
	pub fn is_updating(&self) -> bool {
		self.state.borrow().updating
	}

	fn render(self: &Rc<Self>) -> Node {
		self.state.borrow_mut().dom_refs.clear();

		let root = self.with_component("on_render", None, |component, cx| component.on_render(cx)).unwrap_or_else(|| {
			diagnostic::report(&Misuse::EmptyRender("Component::on_render"));
			TagNode::new("noscript").into()
		});

		let child_ctx = self.with_component("on_child_context_request", Context::empty(), |component, cx| component.on_child_context_request(cx));
		let (ctx, ns) = {
			let state = self.state.borrow();
			(state.ctx.merged(&child_ctx), state.ns.clone())
		};
		root.set_ctx(&ctx);
		root.inherit_ns(ns);
		root
	}

	pub(crate) fn mount(self: &Rc<Self>) {
		let first = !mem::replace(&mut self.state.borrow_mut().mounted, true);
		if first {
			self.with_component("on_mount", (), |component, cx| component.on_mount(cx))
		}
	}

	pub(crate) fn unmount(self: &Rc<Self>) {
		let was_mounted = {
			let mut state = self.state.borrow_mut();
			state.dom_refs.clear();
			mem::replace(&mut state.mounted, false)
		};
		if was_mounted {
			self.with_component("on_unmount", (), |component, cx| component.on_unmount(cx))
		}
	}

	/// Receives new attrs, children and context from a patch of the owning node.
	pub(crate) fn patch(self: &Rc<Self>, rt: &Runtime, attrs: Option<Rc<Attrs>>, children: Children, ctx: Context, parent: Option<&Node>) {
		let span = trace_span!("Patching component", name = self.def.name());
		let _enter = span.enter();

		let (next, prev) = {
			let state = self.state.borrow();
			(self.def.build_attrs(attrs, Some(&state.attrs)), Rc::clone(&state.attrs))
		};

		if !Rc::ptr_eq(&next, &prev) {
			let mounted = {
				let mut state = self.state.borrow_mut();
				state.attrs = Rc::clone(&next);
				state.mounted
			};
			if mounted {
				let was_updating = mem::replace(&mut self.state.borrow_mut().updating, true);
				self.with_component("on_attrs_receive", (), |component, cx| component.on_attrs_receive(cx, &next, &prev));
				self.state.borrow_mut().updating = was_updating;
			}
		}

		{
			let mut state = self.state.borrow_mut();
			state.children = children;
			state.ctx = ctx;
			if state.updating {
				return trace!("Update in flight. Stored attrs only.");
			}
		}

		if self.with_component("should_update", false, |component, cx| component.should_update(cx, &next, &prev)) {
			let prev_root = self.root();
			let root = self.render();
			self.state.borrow_mut().root = root.clone();
			prev_root.patch(rt, &root, parent);
			if self.is_mounted() {
				self.with_component("on_update", (), |component, cx| component.on_update(cx, &next, &prev))
			}
		} else {
			trace!("should_update declined.");
		}
	}

	/// Re-renders on the next frame, then runs `callback`.
	///
	/// While an update is pending, further calls only queue their callback behind it.
	pub(crate) fn update(self: &Rc<Self>, callback: Option<Box<dyn FnOnce()>>) {
		let rt = match self.runtime() {
			Some(rt) => rt,
			None => return trace!("Not attached to a runtime. Dropping update."),
		};

		if mem::replace(&mut self.state.borrow_mut().updating, true) {
			if let Some(callback) = callback {
				rt.schedule(callback)
			}
			return;
		}

		let weak = Rc::downgrade(self);
		rt.schedule(move || {
			let instance = match weak.upgrade() {
				Some(instance) => instance,
				None => return trace!("Instance dropped before its update."),
			};
			if !instance.is_mounted() {
				return trace!("Instance unmounted before its update.");
			}
			let rt = match instance.runtime() {
				Some(rt) => rt,
				None => return,
			};

			let (attrs, children, ctx, prev_root) = {
				let mut state = instance.state.borrow_mut();
				state.updating = false;
				(Rc::clone(&state.attrs), state.children.clone(), state.ctx.clone(), state.root.clone())
			};
			instance.patch(&rt, Some(attrs), children, ctx, None);

			if let Some(callback) = callback {
				callback()
			}
			rt.hook().emit(&HookEvent::Replace { prev: prev_root, next: instance.root() });
		})
	}
}

impl Debug for Instance {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		let mut debug = f.debug_struct("Instance");
		debug.field("def", &self.def);
		if let Ok(state) = self.state.try_borrow() {
			debug.field("mounted", &state.mounted).field("updating", &state.updating);
		}
		debug.finish_non_exhaustive()
	}
}

/// What a hook can see of and do with its instance.
pub struct ComponentCx<'a> {
	instance: &'a Rc<Instance>,
}

impl ComponentCx<'_> {
	/// Current attrs, defaults included.
	#[must_use]
	pub fn attrs(&self) -> Rc<Attrs> {
		self.instance.attrs()
	}

	#[must_use]
	pub fn children(&self) -> Children {
		self.instance.state.borrow().children.clone()
	}

	#[must_use]
	pub fn context(&self) -> Context {
		self.instance.state.borrow().ctx.clone()
	}

	#[must_use]
	pub fn is_mounted(&self) -> bool {
		self.instance.is_mounted()
	}

	/// Schedules a re-render with the latest attrs, children and context, then `callback`.
	pub fn update(&self, callback: impl FnOnce() + 'static) {
		self.instance.update(Some(Box::new(callback)))
	}

	/// Names `node` so that [`dom_ref`](`ComponentCx::dom_ref`) can find its DOM after rendering. Returns `node`.
	pub fn set_dom_ref(&self, name: &str, node: impl Into<Node>) -> Node {
		let node = node.into();
		self.instance.state.borrow_mut().dom_refs.insert(name.into(), node.clone());
		node
	}

	#[must_use]
	pub fn dom_ref(&self, name: &str) -> Option<DomNode> {
		dom_ref(self.instance, name)
	}

	#[must_use]
	pub fn runtime(&self) -> Option<Runtime> {
		self.instance.runtime()
	}

	/// A handle that can outlive this hook call, for example inside event handlers.
	#[must_use]
	pub fn handle(&self) -> ComponentHandle {
		ComponentHandle(Rc::downgrade(self.instance))
	}
}

fn dom_ref(instance: &Instance, name: &str) -> Option<DomNode> {
	let node = instance.state.borrow().dom_refs.get(name).cloned();
	node.and_then(|node| node.dom_node())
}

/// A weak [`ComponentCx`] stand-in. Every accessor degrades gracefully once the instance is gone.
#[derive(Debug, Clone)]
pub struct ComponentHandle(Weak<Instance>);

impl ComponentHandle {
	#[must_use]
	pub fn attrs(&self) -> Option<Rc<Attrs>> {
		self.0.upgrade().map(|instance| instance.attrs())
	}

	#[must_use]
	pub fn is_mounted(&self) -> bool {
		self.0.upgrade().map_or(false, |instance| instance.is_mounted())
	}

	#[must_use]
	pub fn dom_ref(&self, name: &str) -> Option<DomNode> {
		self.0.upgrade().and_then(|instance| dom_ref(&instance, name))
	}

	#[must_use]
	pub fn runtime(&self) -> Option<Runtime> {
		self.0.upgrade().and_then(|instance| instance.runtime())
	}

	pub fn update(&self, callback: impl FnOnce() + 'static) {
		if let Some(instance) = self.0.upgrade() {
			instance.update(Some(Box::new(callback)))
		}
	}
}
