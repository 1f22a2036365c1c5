use std::{fmt::{Debug, Display}, rc::Rc, time::{SystemTime, UNIX_EPOCH}};

use crate::{environment::EnvPtr, error::interpreter::{RuntimeError, RuntimeErrorType}, interpreter::value::Value, statement::FunctionDecl};

/// A host-implemented function body. Receives the call-site line for error
/// reporting.
pub(crate) type NativeFn = fn(usize, &[Value]) -> Result<Value, RuntimeError>;

/// How many arguments a callable accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Arity {
	Fixed(usize),
	/// Only the native `print`.
	Unlimited,
}

/// A callable runtime value: a host native or a user-defined function with
/// its captured closure environment.
#[derive(Debug, Clone)]
pub(crate) struct CallableValue {
	pub name: String,
	pub kind: CallableKind,
}

#[derive(Clone)]
pub(crate) enum CallableKind {
	Native { arity: Arity, function: NativeFn },
	Function { declaration: Rc<FunctionDecl>, closure: EnvPtr },
}

impl CallableValue {
	pub fn native(name: &str, arity: Arity, function: NativeFn) -> Self {
		Self { name: name.to_string(), kind: CallableKind::Native { arity, function } }
	}

	pub fn function(declaration: Rc<FunctionDecl>, closure: EnvPtr) -> Self {
		let name = declaration.name.lexeme.clone();
		Self { name, kind: CallableKind::Function { declaration, closure } }
	}

	pub fn arity(&self) -> Arity {
		match &self.kind {
			CallableKind::Native { arity, .. } => *arity,
			CallableKind::Function { declaration, .. } => Arity::Fixed(declaration.arity()),
		}
	}
}

impl Debug for CallableKind {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			Self::Native { arity, .. } => f.debug_struct("Native").field("arity", arity).finish(),
			Self::Function { declaration, .. } => {
				f.debug_struct("Function").field("declaration", &declaration.name.lexeme).finish()
			}
		}
	}
}

impl Display for CallableValue {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self.kind {
			CallableKind::Native { .. } => write!(f, "<native fn {}>", self.name),
			CallableKind::Function { .. } => write!(f, "<fn {}>", self.name),
		}
	}
}

/// Native function definitions.
pub(crate) mod native {
	use super::*;

	/// Prints the arguments separated by single spaces, newline-terminated.
	pub fn print(_line: usize, arguments: &[Value]) -> Result<Value, RuntimeError> {
		let rendered: Vec<String> = arguments.iter().map(Value::to_string).collect();
		println!("{}", rendered.join(" "));
		Ok(Value::Null)
	}

	/// Seconds since the host epoch, with millisecond resolution.
	pub fn clock(_line: usize, _arguments: &[Value]) -> Result<Value, RuntimeError> {
		let now = SystemTime::now().duration_since(UNIX_EPOCH).expect("Time went backwards");
		Ok(Value::Double(now.as_millis() as f64 / 1000.0))
	}

	/// Blocks the evaluation thread for a non-negative number of seconds.
	pub fn sleep(line: usize, arguments: &[Value]) -> Result<Value, RuntimeError> {
		let seconds = match arguments.first() {
			Some(Value::Double(seconds)) => *seconds,
			_ => return Err(RuntimeError::new(line, RuntimeErrorType::SleepExpectsDouble)),
		};
		if seconds < 0.0 {
			return Err(RuntimeError::new(line, RuntimeErrorType::NegativeSleepDuration));
		}
		let duration = std::time::Duration::try_from_secs_f64(seconds)
			.map_err(|_| RuntimeError::new(line, RuntimeErrorType::NegativeSleepDuration))?;
		std::thread::sleep(duration);
		Ok(Value::Null)
	}

	/// All natives, for pre-populating the global environment.
	pub fn all() -> Vec<(&'static str, CallableValue)> {
		vec![
			("print", CallableValue::native("print", Arity::Unlimited, print)),
			("clock", CallableValue::native("clock", Arity::Fixed(0), clock)),
			("sleep", CallableValue::native("sleep", Arity::Fixed(1), sleep)),
		]
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn clock_reads_the_host_epoch() {
		let Value::Double(now) = native::clock(1, &[]).unwrap() else { panic!("clock returns double") };
		assert!(now > 0.0);
	}

	#[test]
	fn sleep_rejects_bad_durations() {
		assert!(native::sleep(1, &[Value::Double(-0.5)]).is_err());
		assert!(native::sleep(1, &[Value::Int(1)]).is_err());
		assert!(native::sleep(1, &[]).is_err());
		assert_eq!(native::sleep(1, &[Value::Double(0.0)]).unwrap(), Value::Null);
	}

	#[test]
	fn arity_of_natives() {
		let natives = native::all();
		assert_eq!(natives[0].1.arity(), Arity::Unlimited);
		assert_eq!(natives[1].1.arity(), Arity::Fixed(0));
		assert_eq!(natives[2].1.arity(), Arity::Fixed(1));
	}

	#[test]
	fn display_forms() {
		let clock = CallableValue::native("clock", Arity::Fixed(0), native::clock);
		assert_eq!(clock.to_string(), "<native fn clock>");
	}
}
