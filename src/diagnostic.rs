//! Misuse reporting.
//!
//! Nothing here aborts an update: each report is logged and the caller continues with a best-effort default.

use crate::attrs::Key;
use thiserror::Error;
use tracing::{error, warn};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Misuse {
	#[error("unsupported node type {0:?}, rendering an empty placeholder instead")]
	UnsupportedNodeType(String),
	#[error("children or html were set more than once on <{0}>; the last assignment wins")]
	ChildrenSetTwice(String),
	#[error("children's keys must be unique across siblings; found duplicate key {0:?}")]
	DuplicateKey(Key),
	#[error("style must be a map of declarations, got {0}; the style was left unchanged")]
	InvalidStyle(String),
	#[error("unsupported event listener attribute {0:?}")]
	UnknownEventAttr(String),
	#[error("{0} must return a single node; rendering an empty placeholder instead")]
	EmptyRender(&'static str),
	#[error("component {0:?} was re-entered from one of its own hooks; the nested hook call was skipped")]
	HookReentered(&'static str),
}

/// Logs `misuse` at `error!` level in builds with debug assertions, and at `warn!` otherwise.
pub fn report(misuse: &Misuse) {
	if cfg!(debug_assertions) {
		error!("{}", misuse)
	} else {
		warn!("{}", misuse)
	}
}
