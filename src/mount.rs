//! Mounting trees into DOM roots.
//!
//! Every request for a root takes a fresh generation from one registry-wide counter.
//! Deferred work captures its generation and only runs if the root's entry still carries it,
//! so a later request supersedes any earlier one that hasn't been flushed yet.

use crate::{hook::HookEvent, host::DomNode, node::Node, runtime::Runtime};
use hashbrown::HashMap;
use tracing::{error, instrument, trace};

type Callback = Box<dyn FnOnce()>;

#[derive(Debug)]
struct Mounted {
	tree: Option<Node>,
	generation: u64,
}

#[derive(Debug, Default)]
pub(crate) struct MountRegistry {
	roots: HashMap<DomNode, Mounted>,
	generations: u64,
}

impl MountRegistry {
	fn next_generation(&mut self) -> u64 {
		self.generations += 1;
		self.generations
	}

	fn is_current(&self, root: DomNode, generation: u64) -> bool {
		self.roots.get(&root).map_or(false, |mounted| mounted.generation == generation)
	}

	/// Points the root currently holding `old` at `new`. Returns whether there was one.
	pub(crate) fn retarget(&mut self, old: &Node, new: &Node) -> bool {
		match self.roots.values_mut().find(|mounted| mounted.tree.as_ref().map_or(false, |tree| tree.ptr_eq(old))) {
			Some(mounted) => {
				mounted.tree = Some(new.clone());
				true
			}
			None => false,
		}
	}
}

enum MountPlan {
	Patch(u64),
	Fresh(u64),
}

impl Runtime {
	/// Mounts `tree` into `root` on the next frame, then calls `callback`.
	///
	/// If `root` already holds a mounted tree, that tree is patched into `tree` instead.
	/// If `root` has an element child and nothing is mounted yet, that DOM is adopted right away.
	pub fn mount(&self, root: DomNode, tree: impl Into<Node>, callback: impl FnOnce() + 'static) {
		self.mount_with(root, tree.into(), Some(Box::new(callback)), false)
	}

	/// Like [`mount`](`Runtime::mount`), but applied immediately.
	pub fn mount_sync(&self, root: DomNode, tree: impl Into<Node>) {
		self.mount_with(root, tree.into(), None, true)
	}

	/// Unmounts and removes the tree in `root` on the next frame, then calls `callback`.
	pub fn unmount(&self, root: DomNode, callback: impl FnOnce() + 'static) {
		self.unmount_with(root, Some(Box::new(callback)), false)
	}

	pub fn unmount_sync(&self, root: DomNode) {
		self.unmount_with(root, None, true)
	}

	/// Trees currently mounted, in root order.
	#[must_use]
	pub fn mounted_roots(&self) -> Vec<Node> {
		let mounts = self.mounts().borrow();
		let mut roots: Vec<_> = mounts.roots.iter().filter_map(|(root, mounted)| mounted.tree.clone().map(|tree| (*root, tree))).collect();
		roots.sort_by_key(|(root, _)| *root);
		roots.into_iter().map(|(_, tree)| tree).collect()
	}

	#[instrument(skip(self, tree, callback))]
	fn mount_with(&self, root: DomNode, tree: Node, callback: Option<Callback>, sync: bool) {
		let plan = {
			let mut mounts = self.mounts().borrow_mut();
			let generation = mounts.next_generation();
			match mounts.roots.get_mut(&root).filter(|mounted| mounted.tree.is_some()) {
				Some(mounted) => {
					mounted.generation = generation;
					MountPlan::Patch(generation)
				}
				None => {
					mounts.roots.insert(root, Mounted { tree: None, generation });
					MountPlan::Fresh(generation)
				}
			}
		};

		match plan {
			MountPlan::Patch(generation) => {
				let weak = self.downgrade();
				let patch = move || {
					if let Some(rt) = weak.upgrade() {
						rt.patch_mounted(root, generation, tree, callback)
					}
				};
				if sync {
					patch()
				} else {
					self.schedule(patch)
				}
			}
			MountPlan::Fresh(generation) => {
				if let Some(existing) = self.host().first_element_child(root) {
					trace!(%existing, "Adopting existing DOM.");
					self.set_tree(root, &tree);
					tree.adopt_dom(self, existing, None);
					tree.mount(self);
					if let Some(callback) = callback {
						callback()
					}
					self.hook().emit(&HookEvent::Mount(tree));
				} else {
					let weak = self.downgrade();
					let render = move || {
						if let Some(rt) = weak.upgrade() {
							rt.render_mounted(root, generation, tree, callback)
						}
					};
					if sync {
						render()
					} else {
						self.schedule(render)
					}
				}
			}
		}
	}

	fn set_tree(&self, root: DomNode, tree: &Node) {
		if let Some(mounted) = self.mounts().borrow_mut().roots.get_mut(&root) {
			mounted.tree = Some(tree.clone())
		}
	}

	fn patch_mounted(&self, root: DomNode, generation: u64, tree: Node, callback: Option<Callback>) {
		let current = {
			let mounts = self.mounts().borrow();
			match mounts.roots.get(&root) {
				Some(mounted) if mounted.generation == generation => mounted.tree.clone(),
				_ => None,
			}
		};
		let current = match current {
			Some(current) => current,
			None => return trace!(%root, generation, "Dropping superseded patch."),
		};

		current.patch(self, &tree, None);
		self.set_tree(root, &tree);
		if let Some(callback) = callback {
			callback()
		}
	}

	fn render_mounted(&self, root: DomNode, generation: u64, tree: Node, callback: Option<Callback>) {
		if !self.mounts().borrow().is_current(root, generation) {
			return trace!(%root, generation, "Dropping superseded mount.");
		}

		self.set_tree(root, &tree);
		let dom = tree.render_to_dom(self, None);
		if let Err(error) = self.host().append_child(root, dom) {
			error!("Couldn't attach mounted tree: {}", error)
		}
		tree.mount(self);
		if let Some(callback) = callback {
			callback()
		}
		self.hook().emit(&HookEvent::Mount(tree));
	}

	#[instrument(skip(self, callback))]
	fn unmount_with(&self, root: DomNode, callback: Option<Callback>, sync: bool) {
		let state = {
			let mut mounts = self.mounts().borrow_mut();
			let generation = mounts.next_generation();
			mounts.roots.get_mut(&root).map(|mounted| {
				mounted.generation = generation;
				(generation, mounted.tree.is_some())
			})
		};

		match state {
			Some((generation, true)) => {
				let weak = self.downgrade();
				let unmount = move || {
					if let Some(rt) = weak.upgrade() {
						rt.unmount_mounted(root, generation, callback)
					}
				};
				if sync {
					unmount()
				} else {
					self.schedule(unmount)
				}
			}
			// Nothing rendered yet. The generation bump above already cancelled any pending render.
			Some((_, false)) | None => {
				if !sync {
					if let Some(callback) = callback {
						callback()
					}
				}
			}
		}
	}

	fn unmount_mounted(&self, root: DomNode, generation: u64, callback: Option<Callback>) {
		let mounted = {
			let mut mounts = self.mounts().borrow_mut();
			if mounts.is_current(root, generation) {
				mounts.roots.remove(&root)
			} else {
				None
			}
		};
		let mounted = match mounted {
			Some(mounted) => mounted,
			None => return trace!(%root, generation, "Dropping superseded unmount."),
		};

		if let Some(tree) = &mounted.tree {
			let dom = tree.dom_node();
			tree.unmount(self);
			if let Some(dom) = dom {
				if let Err(error) = self.host().remove_child(root, dom) {
					error!("Couldn't detach unmounted tree: {}", error)
				}
				self.host().release(dom)
			}
		}
		if let Some(callback) = callback {
			callback()
		}
		if let Some(tree) = mounted.tree {
			self.hook().emit(&HookEvent::Unmount(tree))
		}
	}
}
