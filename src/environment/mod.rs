//! Runtime environments: chained name-to-value maps with an enclosing link.
//!
//! Inner environments point outward, never the reverse, so the chain is
//! acyclic; closures keep their defining environment alive through shared
//! ownership. A separate declared set distinguishes a name that was declared
//! but never assigned (reads yield `null`) from one that was never declared
//! (a runtime error at the read site).

use std::collections::{HashMap, HashSet};

use crate::{interpreter::value::Value, utils::RcCell};

pub(crate) type EnvPtr = RcCell<Environment>;

#[derive(Debug, Default)]
pub(crate) struct Environment {
	values:    HashMap<String, Value>,
	declared:  HashSet<String>,
	enclosing: Option<EnvPtr>,
}

impl Environment {
	pub fn new() -> Self { Self::default() }

	pub fn with_enclosing(enclosing: EnvPtr) -> Self {
		Self { enclosing: Some(enclosing), ..Self::default() }
	}

	/// Record the name without binding a value, so a later assignment in
	/// this scope works.
	pub fn declare(&mut self, name: &str) { self.declared.insert(name.to_string()); }

	/// Current scope only; shadowing an outer name is legal.
	pub fn is_declared_here(&self, name: &str) -> bool { self.declared.contains(name) }

	pub fn define(&mut self, name: &str, value: Value) { self.values.insert(name.to_string(), value); }

	/// Assign to the nearest scope that knows the name, declared or defined.
	/// Returns false when no scope does.
	#[must_use]
	pub fn assign(&mut self, name: &str, value: Value) -> bool {
		if self.values.contains_key(name) || self.declared.contains(name) {
			self.values.insert(name.to_string(), value);
			return true;
		}
		if let Some(enclosing) = &self.enclosing {
			return enclosing.borrow_mut().assign(name, value);
		}
		false
	}

	/// Look a name up through the chain. A declared-but-unassigned name
	/// reads as `null`.
	pub fn get(&self, name: &str) -> Option<Value> {
		if let Some(value) = self.values.get(name) {
			return Some(value.clone());
		}
		if self.declared.contains(name) {
			return Some(Value::Null);
		}
		self.enclosing.as_ref().and_then(|enclosing| enclosing.borrow().get(name))
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn define_and_get() {
		let mut env = Environment::new();
		assert_eq!(env.get("x"), None);
		env.declare("x");
		env.define("x", Value::Int(1));
		assert_eq!(env.get("x"), Some(Value::Int(1)));
	}

	#[test]
	fn declared_but_unassigned_reads_as_null() {
		let mut env = Environment::new();
		env.declare("x");
		assert_eq!(env.get("x"), Some(Value::Null));
	}

	#[test]
	fn assign_reaches_enclosing_scopes() {
		let outer = RcCell::new(Environment::new());
		outer.borrow_mut().declare("x");
		outer.borrow_mut().define("x", Value::Int(1));

		let mut inner = Environment::with_enclosing(outer.clone());
		assert!(inner.assign("x", Value::Int(2)));
		assert_eq!(outer.borrow().get("x"), Some(Value::Int(2)));
		assert!(!inner.assign("missing", Value::Int(3)));
	}

	#[test]
	fn assignment_after_bare_declaration_stays_local() {
		let outer = RcCell::new(Environment::new());
		let mut inner = Environment::with_enclosing(outer.clone());
		inner.declare("y");
		assert!(inner.assign("y", Value::Int(5)));
		assert_eq!(inner.get("y"), Some(Value::Int(5)));
		assert_eq!(outer.borrow().get("y"), None);
	}

	#[test]
	fn shadowing_leaves_outer_binding_alone() {
		let outer = RcCell::new(Environment::new());
		outer.borrow_mut().declare("x");
		outer.borrow_mut().define("x", Value::Int(1));

		let mut inner = Environment::with_enclosing(outer.clone());
		inner.declare("x");
		inner.define("x", Value::Int(2));
		assert_eq!(inner.get("x"), Some(Value::Int(2)));
		assert_eq!(outer.borrow().get("x"), Some(Value::Int(1)));
	}
}
