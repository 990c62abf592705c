//! Controlled form elements.
//!
//! [`node::create`](`crate::node::create`) maps `input`, `textarea` and `select` onto these wrappers.
//! After user input they run the user's handlers, flush pending updates and then force the live control back to the
//! `value` (or `checked`) attribute, so the rendered attribute stays the single source of truth.

use crate::{
	attr_config,
	attrs::{AttrValue, Attrs, Handler},
	component::{Component, ComponentCx, ComponentDef, ComponentHandle},
	node::{Node, TagNode},
};
use tracing::{error, trace};

#[must_use]
pub fn input() -> ComponentDef {
	ComponentDef::of::<Input>()
}

#[must_use]
pub fn textarea() -> ComponentDef {
	ComponentDef::of::<Textarea>()
}

#[must_use]
pub fn select() -> ComponentDef {
	ComponentDef::of::<Select>()
}

const CONTROL: &str = "control";

/// Calls the user's `forward` handlers, flushes the batch and resyncs the control's `prop`.
fn resync_handler(handle: ComponentHandle, forward: &'static [&'static str], prop: &'static str) -> Handler {
	Handler::new(move |event| {
		let attrs = match handle.attrs() {
			Some(attrs) => attrs,
			None => return,
		};
		for name in forward {
			if let Some(AttrValue::Handler(handler)) = attrs.get(name) {
				handler.call(event)
			}
		}

		let rt = match handle.runtime() {
			Some(rt) => rt,
			None => return,
		};
		rt.apply_batch();

		if !handle.is_mounted() {
			return;
		}
		// Attrs may have changed during the flush.
		let attrs = match handle.attrs() {
			Some(attrs) => attrs,
			None => return,
		};
		if let (Some(value), Some(control)) = (attrs.get_set(prop), handle.dom_ref(CONTROL)) {
			let host = rt.host();
			if host.property(control, prop).map_or(true, |current| !current.loosely_equals(value)) {
				trace!(prop, "Resyncing control.");
				if let Err(error) = attr_config::lookup(prop).set(host, control, prop, value) {
					error!("Couldn't resync control: {}", error)
				}
			}
		}
	})
}

fn control_attrs(attrs: &Attrs, overrides: &[(&str, AttrValue)]) -> Attrs {
	let mut control = attrs.clone();
	for (name, value) in overrides {
		control.insert(name, value.clone())
	}
	control
}

#[derive(Default)]
pub struct Input {
	on_input: Option<Handler>,
	on_click: Option<Handler>,
}

impl Component for Input {
	fn on_init(&mut self, cx: &ComponentCx<'_>) {
		self.on_input = Some(resync_handler(cx.handle(), &["onInput", "onChange"], "value"));
		self.on_click = Some(resync_handler(cx.handle(), &["onClick", "onChange"], "checked"));
	}

	fn on_render(&mut self, cx: &ComponentCx<'_>) -> Option<Node> {
		let attrs = cx.attrs();
		let control = match attrs.get("type").and_then(AttrValue::as_str) {
			Some("file") => (*attrs).clone(),
			Some("checkbox" | "radio") => control_attrs(&attrs, &[("onChange", AttrValue::Null), ("onClick", self.on_click.clone().into())]),
			_ => control_attrs(&attrs, &[("onChange", AttrValue::Null), ("onInput", self.on_input.clone().into())]),
		};
		Some(cx.set_dom_ref(CONTROL, TagNode::new("input").attrs(control)))
	}
}

#[derive(Default)]
pub struct Textarea {
	on_input: Option<Handler>,
}

impl Component for Textarea {
	fn on_init(&mut self, cx: &ComponentCx<'_>) {
		self.on_input = Some(resync_handler(cx.handle(), &["onInput", "onChange"], "value"));
	}

	fn on_render(&mut self, cx: &ComponentCx<'_>) -> Option<Node> {
		let control = control_attrs(&cx.attrs(), &[("onInput", self.on_input.clone().into()), ("onChange", AttrValue::Null)]);
		Some(cx.set_dom_ref(CONTROL, TagNode::new("textarea").attrs(control)))
	}
}

#[derive(Default)]
pub struct Select {
	on_change: Option<Handler>,
}

impl Component for Select {
	fn on_init(&mut self, cx: &ComponentCx<'_>) {
		self.on_change = Some(resync_handler(cx.handle(), &["onChange"], "value"));
	}

	fn on_render(&mut self, cx: &ComponentCx<'_>) -> Option<Node> {
		let control = control_attrs(&cx.attrs(), &[("onChange", self.on_change.clone().into())]);
		Some(cx.set_dom_ref(CONTROL, TagNode::new("select").attrs(control).children(cx.children())))
	}
}
