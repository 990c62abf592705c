//! How each attribute name is applied to a live node and written into markup.

use crate::{
	attrs::AttrValue,
	diagnostic::{self, Misuse},
	escape::{dasherize, escape_attr},
	host::{DomNode, Host, HostError},
};

/// React-style attribute names and their markup spelling.
const ATTR_NAMES: &[(&str, &str)] = &[
	("acceptCharset", "accept-charset"),
	("className", "class"),
	("htmlFor", "for"),
	("httpEquiv", "http-equiv"),
	("autoCapitalize", "autocapitalize"),
	("autoComplete", "autocomplete"),
	("autoCorrect", "autocorrect"),
	("autoFocus", "autofocus"),
	("autoPlay", "autoplay"),
	("encType", "encoding"),
	("hrefLang", "hreflang"),
	("radioGroup", "radiogroup"),
	("spellCheck", "spellcheck"),
	("srcDoc", "srcdoc"),
	("srcSet", "srcset"),
	("tabIndex", "tabindex"),
];

/// Attribute name as it appears in the DOM and in markup.
#[must_use]
pub fn dom_name(name: &str) -> &str {
	ATTR_NAMES.iter().find(|(from, _)| *from == name).map_or(name, |&(_, to)| to)
}

/// Set/remove/stringify behavior for one attribute name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttrConfig {
	/// Plain `setAttribute`.
	Attribute,
	/// Present iff truthy.
	BooleanAttribute,
	/// A DOM property, serialized as an attribute.
	Property,
	/// A boolean DOM property, serialized as a bare attribute name when true.
	BooleanProperty,
	/// A map of style declarations.
	Style,
	/// `value`, which on `<select>` selects the matching options.
	Value,
}

#[must_use]
pub fn lookup(name: &str) -> AttrConfig {
	match name {
		"checked" | "multiple" | "readOnly" | "selected" => AttrConfig::BooleanProperty,
		"controls" | "loop" | "muted" => AttrConfig::Property,
		"disabled" | "ismap" | "open" => AttrConfig::BooleanAttribute,
		"style" => AttrConfig::Style,
		"value" => AttrConfig::Value,
		_ => AttrConfig::Attribute,
	}
}

impl AttrConfig {
	pub fn set(self, host: &dyn Host, node: DomNode, name: &str, value: &AttrValue) -> Result<(), HostError> {
		match self {
			AttrConfig::Attribute => set_attribute(host, node, name, value),
			AttrConfig::BooleanAttribute => {
				if value.is_truthy() {
					set_attribute(host, node, name, value)
				} else {
					host.remove_attribute(node, dom_name(name))
				}
			}
			AttrConfig::Property | AttrConfig::BooleanProperty => host.set_property(node, name, value),
			AttrConfig::Style => match value {
				AttrValue::Map(declarations) => {
					let declarations: Vec<_> = declarations
						.iter()
						.map(|(property, value)| (dasherize(property), if value.is_null() { None } else { Some(value.to_attr_string()) }))
						.collect();
					host.set_style(node, &declarations)
				}
				_ => {
					diagnostic::report(&Misuse::InvalidStyle(format!("{:?}", value)));
					Ok(())
				}
			},
			AttrConfig::Value => {
				if host.tag_name(node).as_deref() == Some("select") {
					set_select_value(host, node, Some(value))
				} else if host.property(node, name).map_or(true, |current| !current.same(value)) {
					host.set_property(node, name, value)
				} else {
					Ok(())
				}
			}
		}
	}

	pub fn remove(self, host: &dyn Host, node: DomNode, name: &str) -> Result<(), HostError> {
		match self {
			AttrConfig::Attribute | AttrConfig::BooleanAttribute => host.remove_attribute(node, dom_name(name)),
			AttrConfig::Property | AttrConfig::BooleanProperty => host.reset_property(node, name),
			AttrConfig::Style => host.clear_style(node),
			AttrConfig::Value => {
				if host.tag_name(node).as_deref() == Some("select") {
					set_select_value(host, node, None)
				} else {
					host.reset_property(node, name)
				}
			}
		}
	}

	/// Markup for `name=value`, or an empty string if nothing is written.
	#[must_use]
	pub fn to_markup(self, name: &str, value: &AttrValue) -> String {
		match self {
			AttrConfig::Attribute | AttrConfig::Property | AttrConfig::Value => attr_to_markup(name, value),
			AttrConfig::BooleanAttribute | AttrConfig::BooleanProperty => {
				if value.is_truthy() {
					dom_name(name).to_owned()
				} else {
					String::new()
				}
			}
			AttrConfig::Style => match value {
				AttrValue::Map(declarations) => {
					let styles: String = declarations
						.iter()
						.filter(|(_, value)| !value.is_null())
						.map(|(property, value)| format!("{}:{};", dasherize(property), value.to_attr_string()))
						.collect();
					if styles.is_empty() {
						styles
					} else {
						format!("{}=\"{}\"", name, escape_attr(&styles))
					}
				}
				value => attr_to_markup(name, value),
			},
		}
	}
}

fn set_attribute(host: &dyn Host, node: DomNode, name: &str, value: &AttrValue) -> Result<(), HostError> {
	if name == "type" && host.tag_name(node).as_deref() == Some("input") {
		// Changing an input's type may reset its value.
		let current = host.property(node, "value");
		host.set_attribute(node, name, &value.to_attr_string())?;
		match current {
			Some(current) => host.set_property(node, "value", &current),
			None => Ok(()),
		}
	} else {
		host.set_attribute(node, dom_name(name), &value.to_attr_string())
	}
}

fn attr_to_markup(name: &str, value: &AttrValue) -> String {
	format!("{}=\"{}\"", dom_name(name), escape_attr(&value.to_attr_string()))
}

/// Whether an `<option>` with `option_value` is selected by the `<select>` value `selection`.
#[must_use]
pub fn is_selected(selection: &AttrValue, option_value: &AttrValue) -> bool {
	match selection {
		AttrValue::List(values) => values.iter().any(|value| value.loosely_equals(option_value)),
		AttrValue::Null => false,
		selection => selection.loosely_equals(option_value),
	}
}

fn set_select_value(host: &dyn Host, select: DomNode, selection: Option<&AttrValue>) -> Result<(), HostError> {
	let mut pending = host.child_nodes(select);
	pending.reverse();
	while let Some(node) = pending.pop() {
		match host.tag_name(node).as_deref() {
			Some("option") => {
				let selected = match (selection, host.property(node, "value")) {
					(Some(selection), Some(option_value)) => is_selected(selection, &option_value),
					_ => false,
				};
				host.set_property(node, "selected", &AttrValue::Bool(selected))?;
			}
			Some("optgroup") => {
				let mut children = host.child_nodes(node);
				children.reverse();
				pending.extend(children);
			}
			_ => (),
		}
	}
	Ok(())
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::{attrs::Attrs, memory::MemoryDom};

	#[test]
	fn markup() {
		assert_eq!(lookup("className").to_markup("className", &"a \"b\"".into()), "class=\"a &quot;b&quot;\"");
		assert_eq!(lookup("disabled").to_markup("disabled", &true.into()), "disabled");
		assert_eq!(lookup("disabled").to_markup("disabled", &false.into()), "");
		assert_eq!(lookup("checked").to_markup("checked", &true.into()), "checked");
		let style = Attrs::new().with("fontSize", "12px").with("color", AttrValue::Null).with("display", "none");
		assert_eq!(lookup("style").to_markup("style", &style.into()), "style=\"font-size:12px;display:none;\"");
		assert_eq!(lookup("style").to_markup("style", &Attrs::new().into()), "");
	}

	#[test]
	fn non_map_styles_leave_the_node_alone() {
		let dom = MemoryDom::new();
		let div = dom.create_element(None, "div");
		lookup("style").set(&dom, div, "style", &Attrs::new().with("color", "red").into()).unwrap();
		dom.clear_log();

		lookup("style").set(&dom, div, "style", &"color: blue".into()).unwrap();
		assert!(dom.take_log().is_empty());
		assert_eq!(dom.attribute(div, "style").as_deref(), Some("color:red;"));
		assert_eq!(
			Misuse::InvalidStyle("Str(\"x\")".to_owned()).to_string(),
			"style must be a map of declarations, got Str(\"x\"); the style was left unchanged"
		);
	}

	#[test]
	fn selection() {
		assert!(is_selected(&"2".into(), &2.into()));
		assert!(is_selected(&vec![AttrValue::from("a"), "b".into()].into(), &"b".into()));
		assert!(!is_selected(&AttrValue::Null, &"".into()));
	}
}
