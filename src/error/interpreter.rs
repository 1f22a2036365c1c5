//! Errors and unwinding signals raised during evaluation.
//!
//! `break`, `continue` and `return` ride the error channel so they cross
//! statement boundaries without being caught by intermediate constructs.
//! Loops consume `Break` and `Continue`; function calls consume `Return`.
//! The checker guarantees a signal never escapes its intended construct, so
//! one reaching the top level is an internal compiler error.

use crate::interpreter::value::Value;

#[derive(thiserror::Error, Debug)]
pub enum InterpreterError {
	/// Internal compiler error, should never happen.
	#[error("{0}")]
	InternalError(#[from] anyhow::Error),
	#[error(transparent)]
	Runtime(#[from] RuntimeError),
	#[error("'break' signal escaped its loop")]
	Break,
	#[error("'continue' signal escaped its loop")]
	Continue,
	#[error("'return' signal escaped its function")]
	Return(Value),
}

/// A failure during execution. Not recovered; execution stops.
#[derive(thiserror::Error, Debug)]
#[error("[line {line}] Runtime Error: {type}")]
pub struct RuntimeError {
	line:   usize,
	r#type: RuntimeErrorType,
}

impl RuntimeError {
	pub fn new(line: usize, r#type: RuntimeErrorType) -> Self { Self { line, r#type } }
}

#[derive(Debug)]
pub enum RuntimeErrorType {
	UndefinedVariable(String),
	AssignUndefined(String),
	AlreadyDeclared(String),
	NotCallable(String),
	ArityMismatch { name: String, expected: usize, got: usize },
	ConditionNotBool(&'static str),
	TernaryConditionNotBool,
	LogicalOperandNotBool(&'static str),
	UnsupportedUnary { operator: String, operand: String },
	UnsupportedOperands { operator: String, left: String, right: String },
	DivisionByZero,
	RemainderByZero,
	SleepExpectsDouble,
	NegativeSleepDuration,
}

impl std::fmt::Display for RuntimeErrorType {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		use RuntimeErrorType::*;
		match self {
			UndefinedVariable(name) => {
				write!(f, "Variable '{name}' has not been declared or initialized.")
			}
			AssignUndefined(name) => write!(f, "Cannot assign to undefined variable '{name}'."),
			AlreadyDeclared(name) => write!(f, "Variable '{name}' is already declared in this scope."),
			NotCallable(value) => write!(f, "Attempted to call a non-callable value '{value}'."),
			ArityMismatch { name, expected, got } => {
				write!(f, "Function '{name}' expected {expected} argument(s), but got {got}.")
			}
			ConditionNotBool(construct) => {
				write!(f, "Condition of {construct} must evaluate to a boolean value.")
			}
			TernaryConditionNotBool => write!(f, "Ternary condition must be a boolean."),
			LogicalOperandNotBool(operator) => {
				write!(f, "Operands of '{operator}' must be boolean values.")
			}
			UnsupportedUnary { operator, operand } => {
				write!(f, "Unsupported operand for '{operator}': '{operand}'.")
			}
			UnsupportedOperands { operator, left, right } => {
				write!(f, "Unsupported operands for '{left}' {operator} '{right}'.")
			}
			DivisionByZero => write!(f, "Integer division by zero."),
			RemainderByZero => write!(f, "Integer remainder by zero."),
			SleepExpectsDouble => write!(f, "sleep() expects a double (number of seconds)."),
			NegativeSleepDuration => write!(f, "sleep() duration must be non-negative."),
		}
	}
}
