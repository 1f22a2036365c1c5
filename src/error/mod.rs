pub mod checker;
pub mod interpreter;
pub mod parser;
pub mod scanner;

use checker::{LogicError, TypeError};
use interpreter::RuntimeError;
use parser::ParseError;
use scanner::ScanError;

/// Top-level error returned by the driver, mapped to an exit code in `main`.
#[derive(thiserror::Error, Debug)]
pub enum StiltError {
	/// Broken pipeline invariant, should never happen.
	#[error("Internal Compiler Error: {0}")]
	InternalError(#[from] anyhow::Error),
	#[error("Unable to open file")]
	UnableToOpenFile,
	/// The scanner, parser or checker recorded diagnostics.
	#[error("halted after {0} error(s)")]
	CompileErrors(usize),
	#[error("halted by a runtime error")]
	RuntimeHalt,
}

impl StiltError {
	pub fn exit_code(&self) -> i32 {
		match self {
			StiltError::InternalError(_) => 70,
			StiltError::UnableToOpenFile => 66,
			StiltError::CompileErrors(_) => 65,
			StiltError::RuntimeHalt => 70,
		}
	}
}

/// Diagnostic sink shared by every pipeline stage.
///
/// Reports stream to stderr as they are recorded; the formatted messages are
/// also retained so tests can assert on them. Kept explicitly threaded
/// through stage constructors rather than as a process global, so each test
/// builds a fresh sink.
#[derive(Debug, Default)]
pub struct Diagnostics {
	errors:         usize,
	runtime_errors: usize,
	messages:       Vec<String>,
}

impl Diagnostics {
	pub fn new() -> Self { Self::default() }

	pub fn scan_error(&mut self, error: &ScanError) {
		self.errors += 1;
		self.record(error.to_string());
	}

	pub fn parse_error(&mut self, error: &ParseError) {
		self.errors += 1;
		self.record(error.to_string());
	}

	pub fn logic_error(&mut self, error: &LogicError) {
		self.errors += 1;
		self.record(error.to_string());
	}

	pub fn type_error(&mut self, error: &TypeError) {
		self.errors += 1;
		self.record(error.to_string());
	}

	pub fn runtime_error(&mut self, error: &RuntimeError) {
		self.runtime_errors += 1;
		self.record(error.to_string());
	}

	/// Broken invariants are reported verbatim, without a line.
	pub fn internal_error(&mut self, error: &anyhow::Error) {
		self.errors += 1;
		self.record(format!("Internal Compiler Error: {error}"));
	}

	pub fn had_error(&self) -> bool { self.errors > 0 }

	pub fn had_runtime_error(&self) -> bool { self.runtime_errors > 0 }

	pub fn error_count(&self) -> usize { self.errors }

	pub fn messages(&self) -> &[String] { &self.messages }

	/// Clears all recorded state; called once per REPL line.
	pub fn reset(&mut self) { *self = Self::default(); }

	fn record(&mut self, message: String) {
		eprintln!("{message}");
		self.messages.push(message);
	}
}
