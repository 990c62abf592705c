//! Attribute values, attribute maps, keys and contexts.

use crate::event::SyntheticEvent;
use core::fmt::{self, Debug, Display, Formatter};
use indexmap::IndexMap;
use std::{borrow::Cow, rc::Rc};

/// An event handler stored as an attribute value (`onClick` etc.).
///
/// Handlers compare by identity.
#[derive(Clone)]
pub struct Handler(Rc<dyn Fn(&mut SyntheticEvent)>);

impl Handler {
	pub fn new(f: impl Fn(&mut SyntheticEvent) + 'static) -> Self {
		Self(Rc::new(f))
	}

	pub fn call(&self, event: &mut SyntheticEvent) {
		(self.0)(event)
	}

	#[must_use]
	pub fn ptr_eq(&self, other: &Self) -> bool {
		Rc::ptr_eq(&self.0, &other.0)
	}
}

impl Debug for Handler {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		write!(f, "Handler({:p})", Rc::as_ptr(&self.0))
	}
}

#[derive(Debug, Clone)]
pub enum AttrValue {
	Null,
	Bool(bool),
	Number(f64),
	Str(Rc<str>),
	List(Rc<[AttrValue]>),
	Map(Rc<Attrs>),
	Handler(Handler),
}

impl AttrValue {
	#[must_use]
	pub fn is_null(&self) -> bool {
		matches!(self, AttrValue::Null)
	}

	#[must_use]
	pub fn as_str(&self) -> Option<&str> {
		match self {
			AttrValue::Str(s) => Some(s),
			_ => None,
		}
	}

	#[must_use]
	pub fn as_bool(&self) -> Option<bool> {
		match *self {
			AttrValue::Bool(b) => Some(b),
			_ => None,
		}
	}

	/// Whether the value counts as "set" for boolean attributes.
	#[must_use]
	pub fn is_truthy(&self) -> bool {
		match self {
			AttrValue::Null => false,
			AttrValue::Bool(b) => *b,
			AttrValue::Number(n) => *n != 0.0 && !n.is_nan(),
			AttrValue::Str(s) => !s.is_empty(),
			AttrValue::List(_) | AttrValue::Map(_) | AttrValue::Handler(_) => true,
		}
	}

	/// String form used for DOM attributes and markup.
	#[must_use]
	pub fn to_attr_string(&self) -> String {
		match self {
			AttrValue::Null => String::new(),
			AttrValue::Bool(b) => b.to_string(),
			AttrValue::Number(n) => format_number(*n),
			AttrValue::Str(s) => s.to_string(),
			AttrValue::List(items) => items.iter().map(AttrValue::to_attr_string).collect::<Vec<_>>().join(","),
			AttrValue::Map(_) => "[object Object]".to_owned(),
			AttrValue::Handler(_) => String::new(),
		}
	}

	/// Strict comparison: same kind and value, containers and handlers by identity.
	#[must_use]
	pub fn same(&self, other: &Self) -> bool {
		match (self, other) {
			(AttrValue::Null, AttrValue::Null) => true,
			(AttrValue::Bool(a), AttrValue::Bool(b)) => a == b,
			#[allow(clippy::float_cmp)]
			(AttrValue::Number(a), AttrValue::Number(b)) => a == b,
			(AttrValue::Str(a), AttrValue::Str(b)) => a == b,
			(AttrValue::List(a), AttrValue::List(b)) => Rc::ptr_eq(a, b),
			(AttrValue::Map(a), AttrValue::Map(b)) => Rc::ptr_eq(a, b),
			(AttrValue::Handler(a), AttrValue::Handler(b)) => a.ptr_eq(b),
			_ => false,
		}
	}

	/// Loose comparison as used for list elements and nested map entries:
	/// numbers, numeric strings and booleans compare by numeric value.
	#[must_use]
	pub fn loosely_equals(&self, other: &Self) -> bool {
		if self.same(other) {
			return true;
		}
		match (self.as_number(), other.as_number()) {
			#[allow(clippy::float_cmp)]
			(Some(a), Some(b)) => a == b && !matches!((self, other), (AttrValue::Str(_), AttrValue::Str(_))),
			_ => false,
		}
	}

	fn as_number(&self) -> Option<f64> {
		match self {
			AttrValue::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
			AttrValue::Number(n) => Some(*n),
			AttrValue::Str(s) => s.trim().parse().ok(),
			_ => None,
		}
	}
}

#[allow(clippy::cast_possible_truncation)]
fn format_number(n: f64) -> String {
	if n.fract() == 0.0 && n.is_finite() && n.abs() < 1e15 {
		(n as i64).to_string()
	} else {
		n.to_string()
	}
}

impl From<&str> for AttrValue {
	fn from(value: &str) -> Self {
		AttrValue::Str(value.into())
	}
}
impl From<String> for AttrValue {
	fn from(value: String) -> Self {
		AttrValue::Str(value.into())
	}
}
impl From<Rc<str>> for AttrValue {
	fn from(value: Rc<str>) -> Self {
		AttrValue::Str(value)
	}
}
impl From<bool> for AttrValue {
	fn from(value: bool) -> Self {
		AttrValue::Bool(value)
	}
}
impl From<f64> for AttrValue {
	fn from(value: f64) -> Self {
		AttrValue::Number(value)
	}
}
impl From<i32> for AttrValue {
	fn from(value: i32) -> Self {
		AttrValue::Number(value.into())
	}
}
impl From<u32> for AttrValue {
	fn from(value: u32) -> Self {
		AttrValue::Number(value.into())
	}
}
impl From<Attrs> for AttrValue {
	fn from(value: Attrs) -> Self {
		AttrValue::Map(Rc::new(value))
	}
}
impl From<Vec<AttrValue>> for AttrValue {
	fn from(value: Vec<AttrValue>) -> Self {
		AttrValue::List(value.into())
	}
}
impl From<Handler> for AttrValue {
	fn from(value: Handler) -> Self {
		AttrValue::Handler(value)
	}
}
impl<T: Into<AttrValue>> From<Option<T>> for AttrValue {
	fn from(value: Option<T>) -> Self {
		value.map_or(AttrValue::Null, Into::into)
	}
}

/// An insertion-ordered attribute map.
#[derive(Debug, Clone, Default)]
pub struct Attrs(IndexMap<Cow<'static, str>, AttrValue>);

impl Attrs {
	#[must_use]
	pub fn new() -> Self {
		Self(IndexMap::new())
	}

	/// Builder-style [`insert`](`Attrs::insert`).
	#[must_use]
	pub fn with(mut self, name: &str, value: impl Into<AttrValue>) -> Self {
		self.insert(name, value);
		self
	}

	/// Sets `name`, keeping its original position if it was present.
	pub fn insert(&mut self, name: &str, value: impl Into<AttrValue>) {
		let value = value.into();
		match self.0.get_mut(name) {
			Some(slot) => *slot = value,
			None => {
				self.0.insert(Cow::Owned(name.to_owned()), value);
			}
		}
	}

	#[must_use]
	pub fn get(&self, name: &str) -> Option<&AttrValue> {
		self.0.get(name)
	}

	/// Like [`get`](`Attrs::get`), but treats [`AttrValue::Null`] as absent.
	#[must_use]
	pub fn get_set(&self, name: &str) -> Option<&AttrValue> {
		self.get(name).filter(|v| !v.is_null())
	}

	#[must_use]
	pub fn contains(&self, name: &str) -> bool {
		self.get(name).is_some()
	}

	pub fn iter(&self) -> impl Iterator<Item = (&str, &AttrValue)> {
		self.0.iter().map(|(name, value)| (&**name, value))
	}

	#[must_use]
	pub fn len(&self) -> usize {
		self.0.len()
	}

	#[must_use]
	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}

	/// `self` overlaid with `over`.
	#[must_use]
	pub fn merged(&self, over: &Attrs) -> Attrs {
		let mut merged = self.clone();
		for (name, value) in over.iter() {
			merged.insert(name, value.clone());
		}
		merged
	}
}

/// Identity of a sibling for list reconciliation.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Key {
	Int(i64),
	Str(Rc<str>),
}

impl Display for Key {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		match self {
			Key::Int(i) => Display::fmt(i, f),
			Key::Str(s) => Display::fmt(s, f),
		}
	}
}

impl From<&str> for Key {
	fn from(value: &str) -> Self {
		Key::Str(value.into())
	}
}
impl From<String> for Key {
	fn from(value: String) -> Self {
		Key::Str(value.into())
	}
}
impl From<i64> for Key {
	fn from(value: i64) -> Self {
		Key::Int(value)
	}
}
impl From<i32> for Key {
	fn from(value: i32) -> Self {
		Key::Int(value.into())
	}
}
impl From<u32> for Key {
	fn from(value: u32) -> Self {
		Key::Int(value.into())
	}
}
impl From<usize> for Key {
	#[allow(clippy::cast_possible_wrap)]
	fn from(value: usize) -> Self {
		Key::Int(value as i64)
	}
}

/// Immutable key/value data handed down the tree.
#[derive(Debug, Clone, Default)]
pub struct Context(Option<Rc<Attrs>>);

impl Context {
	#[must_use]
	pub fn empty() -> Self {
		Self(None)
	}

	#[must_use]
	pub fn new(values: Attrs) -> Self {
		if values.is_empty() {
			Self(None)
		} else {
			Self(Some(Rc::new(values)))
		}
	}

	#[must_use]
	pub fn is_empty(&self) -> bool {
		self.0.is_none()
	}

	#[must_use]
	pub fn get(&self, name: &str) -> Option<&AttrValue> {
		self.0.as_ref().and_then(|values| values.get(name))
	}

	/// `self` extended by `child`, sharing whichever side is empty.
	#[must_use]
	pub fn merged(&self, child: &Context) -> Context {
		match (&self.0, &child.0) {
			(_, None) => self.clone(),
			(None, Some(_)) => child.clone(),
			(Some(parent), Some(child)) => Self(Some(Rc::new(parent.merged(child)))),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn merging_keeps_first_positions() {
		let defaults = Attrs::new().with("className", "base").with("title", "t");
		let merged = defaults.merged(&Attrs::new().with("id", "x").with("className", "own"));
		let names: Vec<_> = merged.iter().map(|(name, _)| name).collect();
		assert_eq!(names, ["className", "title", "id"]);
		assert_eq!(merged.get("className").and_then(AttrValue::as_str), Some("own"));
		assert_eq!(defaults.get("className").and_then(AttrValue::as_str), Some("base"));
	}

	#[test]
	fn loose_equality() {
		assert!(AttrValue::from("1").loosely_equals(&1.into()));
		assert!(AttrValue::from(true).loosely_equals(&1.into()));
		assert!(AttrValue::Null.loosely_equals(&AttrValue::Null));
		assert!(!AttrValue::from("a").loosely_equals(&"b".into()));
	}
}
