//! Errors raised while walking the AST for static checks.
//!
//! Logic errors are structural violations the grammar cannot express; type
//! errors are violations of the operator and subtyping rules. Both unwind to
//! the nearest top-level statement boundary where the checker records them
//! and moves on to the next statement.

#[derive(thiserror::Error, Debug)]
pub enum CheckError {
	/// Internal compiler error, should never happen.
	#[error("{0}")]
	InternalError(#[from] anyhow::Error),
	#[error(transparent)]
	Logic(#[from] LogicError),
	#[error(transparent)]
	Type(#[from] TypeError),
}

#[derive(thiserror::Error, Debug)]
#[error("[line {line}] Logic Error: {type}")]
pub struct LogicError {
	line:   usize,
	r#type: LogicErrorType,
}

impl LogicError {
	pub fn new(line: usize, r#type: LogicErrorType) -> Self { Self { line, r#type } }
}

#[derive(Debug)]
pub enum LogicErrorType {
	/// Read of a name that was never assigned (or never declared).
	UninitializedVariable(String),
	AssignUndeclared(String),
	AlreadyDeclared(String),
	DuplicateParameter(String),
	BreakOutsideLoop,
	ContinueOutsideLoop,
	ReturnOutsideFunction,
}

impl std::fmt::Display for LogicErrorType {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		use LogicErrorType::*;
		match self {
			UninitializedVariable(name) => write!(f, "Uninitialized variable '{name}'."),
			AssignUndeclared(name) => write!(f, "Cannot assign to undeclared variable '{name}'."),
			AlreadyDeclared(name) => write!(f, "'{name}' is already declared in this scope."),
			DuplicateParameter(name) => write!(f, "Duplicate parameter name '{name}'."),
			BreakOutsideLoop => write!(f, "'break' can only be used inside a loop."),
			ContinueOutsideLoop => write!(f, "'continue' can only be used inside a loop."),
			ReturnOutsideFunction => write!(f, "'return' can only be used inside a function."),
		}
	}
}

#[derive(thiserror::Error, Debug)]
#[error("[line {line}] Type Error: {type}")]
pub struct TypeError {
	line:   usize,
	r#type: TypeErrorType,
}

impl TypeError {
	pub fn new(line: usize, r#type: TypeErrorType) -> Self { Self { line, r#type } }
}

#[derive(Debug)]
pub enum TypeErrorType {
	UnaryOperand { operator: &'static str, expected: &'static str, actual: String },
	BinaryOperands { operator: String, left: String, right: String },
	TernaryCondition(String),
	ConditionNotBool { construct: &'static str, actual: String },
	AssignMismatch { name: String, declared: String, actual: String },
	NotCallable(String),
	ArityMismatch { expected: usize, got: usize },
	ArgumentMismatch { index: usize, expected: String, actual: String },
	ReturnMismatch { expected: String, actual: String },
}

impl std::fmt::Display for TypeErrorType {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		use TypeErrorType::*;
		match self {
			UnaryOperand { operator, expected, actual } => {
				write!(f, "Unary '{operator}' is only supported for {expected}, but got '{actual}'.")
			}
			BinaryOperands { operator, left, right } => {
				write!(f, "Unsupported operands for types '{left}' {operator} '{right}'.")
			}
			TernaryCondition(actual) => {
				write!(f, "Ternary condition must be of type 'bool', but got '{actual}'.")
			}
			ConditionNotBool { construct, actual } => {
				write!(f, "Condition of {construct} must be of type 'bool', but got '{actual}'.")
			}
			AssignMismatch { name, declared, actual } => write!(
				f,
				"Cannot assign value of type '{actual}' to variable '{name}' of declared type '{declared}'."
			),
			NotCallable(actual) => {
				write!(f, "Attempted to call a non-function value of type '{actual}'.")
			}
			ArityMismatch { expected, got } => {
				write!(f, "Function expects {expected} argument(s) but got {got}.")
			}
			ArgumentMismatch { index, expected, actual } => {
				write!(f, "Argument {index} expects type '{expected}', but got '{actual}'.")
			}
			ReturnMismatch { expected, actual } => {
				write!(f, "Return type '{actual}' does not match function return type '{expected}'.")
			}
		}
	}
}
