use std::fmt::Display;

use Value::*;

use crate::{interpreter::callable::CallableValue, scanner::TokenType};

/// A runtime value. Widens the literal sum with `null`-producing operations
/// and callables.
#[derive(Debug, Clone)]
pub(crate) enum Value {
	Null,
	Bool(bool),
	Int(i64),
	Double(f64),
	Str(String),
	Char(char),
	Callable(CallableValue),
}

/// How a binary application failed; the interpreter attaches the line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum BinaryOpError {
	DivisionByZero,
	RemainderByZero,
	Unsupported,
}

impl Value {
	/// Name of the value's runtime type, for error messages.
	pub fn type_name(&self) -> &'static str {
		match self {
			Null => "null",
			Bool(_) => "bool",
			Int(_) => "int",
			Double(_) => "double",
			Str(_) => "string",
			Char(_) => "char",
			Callable(_) => "function",
		}
	}

	/// Apply a non-short-circuiting binary operator. Operands must already
	/// be of matching types; the checker guarantees it and the interpreter
	/// re-checks here.
	pub fn binary_op(&self, op: &TokenType, right: &Self) -> Result<Value, BinaryOpError> {
		use TokenType::*;

		match op {
			Plus => self.add(right),
			Minus => self.subtract(right),
			Star => self.multiply(right),
			Slash => self.divide(right),
			Percent => self.remainder(right),
			LessLess => self.shift_left(right),
			GreaterGreater => self.shift_right(right),
			Ampersand => self.bit_and(right),
			Pipe => self.bit_or(right),
			Caret => self.bit_xor(right),
			Greater => self.greater(right).map(Bool),
			GreaterEqual => self.greater_equal(right).map(Bool),
			Less => self.less(right).map(Bool),
			LessEqual => self.less_equal(right).map(Bool),
			EqualEqual => self.equals(right).map(Bool),
			BangEqual => self.equals(right).map(|b| Bool(!b)),
			_ => Err(BinaryOpError::Unsupported),
		}
	}

	/// Integer arithmetic is two's-complement and wraps; `+` also
	/// concatenates strings.
	fn add(&self, other: &Self) -> Result<Value, BinaryOpError> {
		match (self, other) {
			(Int(l), Int(r)) => Ok(Int(l.wrapping_add(*r))),
			(Double(l), Double(r)) => Ok(Double(l + r)),
			(Str(l), Str(r)) => Ok(Str(format!("{l}{r}"))),
			_ => Err(BinaryOpError::Unsupported),
		}
	}

	fn subtract(&self, other: &Self) -> Result<Value, BinaryOpError> {
		match (self, other) {
			(Int(l), Int(r)) => Ok(Int(l.wrapping_sub(*r))),
			(Double(l), Double(r)) => Ok(Double(l - r)),
			_ => Err(BinaryOpError::Unsupported),
		}
	}

	fn multiply(&self, other: &Self) -> Result<Value, BinaryOpError> {
		match (self, other) {
			(Int(l), Int(r)) => Ok(Int(l.wrapping_mul(*r))),
			(Double(l), Double(r)) => Ok(Double(l * r)),
			_ => Err(BinaryOpError::Unsupported),
		}
	}

	/// Integer division by zero is an error; double division follows
	/// IEEE-754 and may produce infinities or NaN.
	fn divide(&self, other: &Self) -> Result<Value, BinaryOpError> {
		match (self, other) {
			(Int(_), Int(0)) => Err(BinaryOpError::DivisionByZero),
			(Int(l), Int(r)) => Ok(Int(l.wrapping_div(*r))),
			(Double(l), Double(r)) => Ok(Double(l / r)),
			_ => Err(BinaryOpError::Unsupported),
		}
	}

	fn remainder(&self, other: &Self) -> Result<Value, BinaryOpError> {
		match (self, other) {
			(Int(_), Int(0)) => Err(BinaryOpError::RemainderByZero),
			(Int(l), Int(r)) => Ok(Int(l.wrapping_rem(*r))),
			_ => Err(BinaryOpError::Unsupported),
		}
	}

	fn shift_left(&self, other: &Self) -> Result<Value, BinaryOpError> {
		match (self, other) {
			(Int(l), Int(r)) => Ok(Int(l.wrapping_shl(*r as u32))),
			_ => Err(BinaryOpError::Unsupported),
		}
	}

	fn shift_right(&self, other: &Self) -> Result<Value, BinaryOpError> {
		match (self, other) {
			(Int(l), Int(r)) => Ok(Int(l.wrapping_shr(*r as u32))),
			_ => Err(BinaryOpError::Unsupported),
		}
	}

	fn bit_and(&self, other: &Self) -> Result<Value, BinaryOpError> {
		match (self, other) {
			(Int(l), Int(r)) => Ok(Int(l & r)),
			_ => Err(BinaryOpError::Unsupported),
		}
	}

	fn bit_or(&self, other: &Self) -> Result<Value, BinaryOpError> {
		match (self, other) {
			(Int(l), Int(r)) => Ok(Int(l | r)),
			_ => Err(BinaryOpError::Unsupported),
		}
	}

	fn bit_xor(&self, other: &Self) -> Result<Value, BinaryOpError> {
		match (self, other) {
			(Int(l), Int(r)) => Ok(Int(l ^ r)),
			_ => Err(BinaryOpError::Unsupported),
		}
	}

	/// Ordering covers numbers plus strings and characters, which compare
	/// lexicographically over codepoints.
	fn greater(&self, other: &Self) -> Result<bool, BinaryOpError> {
		match (self, other) {
			(Int(l), Int(r)) => Ok(l > r),
			(Double(l), Double(r)) => Ok(l > r),
			(Str(l), Str(r)) => Ok(l > r),
			(Char(l), Char(r)) => Ok(l > r),
			_ => Err(BinaryOpError::Unsupported),
		}
	}

	fn greater_equal(&self, other: &Self) -> Result<bool, BinaryOpError> {
		match (self, other) {
			(Int(l), Int(r)) => Ok(l >= r),
			(Double(l), Double(r)) => Ok(l >= r),
			(Str(l), Str(r)) => Ok(l >= r),
			(Char(l), Char(r)) => Ok(l >= r),
			_ => Err(BinaryOpError::Unsupported),
		}
	}

	fn less(&self, other: &Self) -> Result<bool, BinaryOpError> {
		match (self, other) {
			(Int(l), Int(r)) => Ok(l < r),
			(Double(l), Double(r)) => Ok(l < r),
			(Str(l), Str(r)) => Ok(l < r),
			(Char(l), Char(r)) => Ok(l < r),
			_ => Err(BinaryOpError::Unsupported),
		}
	}

	fn less_equal(&self, other: &Self) -> Result<bool, BinaryOpError> {
		match (self, other) {
			(Int(l), Int(r)) => Ok(l <= r),
			(Double(l), Double(r)) => Ok(l <= r),
			(Str(l), Str(r)) => Ok(l <= r),
			(Char(l), Char(r)) => Ok(l <= r),
			_ => Err(BinaryOpError::Unsupported),
		}
	}

	fn equals(&self, other: &Self) -> Result<bool, BinaryOpError> {
		match (self, other) {
			(Null, Null) => Ok(true),
			(Bool(l), Bool(r)) => Ok(l == r),
			(Int(l), Int(r)) => Ok(l == r),
			(Double(l), Double(r)) => Ok(l == r),
			(Str(l), Str(r)) => Ok(l == r),
			(Char(l), Char(r)) => Ok(l == r),
			_ => Err(BinaryOpError::Unsupported),
		}
	}
}

/// Fixed-point with up to six fractional digits, trailing zeros stripped,
/// and a `0` restored after a bare decimal point so `2.0` stays `2.0`.
pub(crate) fn format_double(value: f64) -> String {
	let mut s = format!("{value:.6}");
	while s.ends_with('0') {
		s.pop();
	}
	if s.ends_with('.') {
		s.push('0');
	}
	s
}

impl Display for Value {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			Null => write!(f, "null"),
			Bool(b) => write!(f, "{b}"),
			Int(i) => write!(f, "{i}"),
			Double(d) => write!(f, "{}", format_double(*d)),
			Str(s) => write!(f, "{s}"),
			Char(c) => write!(f, "{c}"),
			Callable(callable) => write!(f, "{callable}"),
		}
	}
}

// Structural equality for tests; function values never compare equal.
impl PartialEq for Value {
	fn eq(&self, other: &Self) -> bool {
		match (self, other) {
			(Null, Null) => true,
			(Bool(l), Bool(r)) => l == r,
			(Int(l), Int(r)) => l == r,
			(Double(l), Double(r)) => l == r,
			(Str(l), Str(r)) => l == r,
			(Char(l), Char(r)) => l == r,
			_ => false,
		}
	}
}
