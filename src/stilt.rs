//! The driver: owns the diagnostic sink, the checker and the interpreter,
//! and feeds sources through the pipeline.
//!
//! Stages run strictly in sequence; any stage that records diagnostics
//! aborts further processing of that source. The checker and interpreter
//! persist across [`Stilt::run`] calls, so a REPL session keeps both its
//! value bindings and their static types from line to line.

use std::{fs::read_to_string, io::Write, path::Path};

use crate::{StiltError, checker::Checker, error::Diagnostics, interpreter::Interpreter, parser::Parser, scanner::Scanner, utils::RcCell};

pub struct Stilt {
	diagnostics: RcCell<Diagnostics>,
	checker:     Checker,
	interpreter: Interpreter,
}

impl Default for Stilt {
	fn default() -> Self { Self::new() }
}

impl Stilt {
	pub fn new() -> Self {
		let diagnostics = RcCell::new(Diagnostics::new());
		let checker = Checker::new(diagnostics.clone());
		let interpreter = Interpreter::new(diagnostics.clone());
		Self { diagnostics, checker, interpreter }
	}

	/// Run a whole file through the pipeline once.
	pub fn run_file(&mut self, path: &Path) -> crate::Result<()> {
		let source = read_to_string(path).map_err(|_| StiltError::UnableToOpenFile)?;
		self.run(&source)
	}

	/// Read-eval-print loop on standard input. Diagnostics never terminate
	/// the loop; end-of-input does.
	pub fn run_prompt(&mut self) {
		let mut input = String::new();
		let stdin = std::io::stdin();
		loop {
			input.clear();
			print!("> ");
			if let Err(e) = std::io::stdout().flush() {
				eprintln!("Failed flush: {e}");
			}
			match stdin.read_line(&mut input) {
				Ok(0) => {
					println!("\nExited stilt repl");
					break;
				}
				Ok(_) => {}
				Err(e) => {
					eprintln!("Failed read line: {e}");
					continue;
				}
			}
			if let Err(e @ StiltError::InternalError(_)) = self.run(input.trim()) {
				eprintln!("{e}");
			}
		}
	}

	/// Lex, parse, check and interpret one source. Each stage only runs if
	/// the previous ones left the sink clean.
	pub fn run(&mut self, source: &str) -> crate::Result<()> {
		self.diagnostics.borrow_mut().reset();

		let tokens = Scanner::new(source, self.diagnostics.clone()).scan_tokens()?;
		self.halt_on_errors()?;

		let statements = Parser::new(tokens, self.diagnostics.clone()).parse()?;
		self.halt_on_errors()?;

		self.checker.check(&statements);
		self.halt_on_errors()?;

		self.interpreter.interpret(&statements);
		if self.diagnostics.borrow().had_runtime_error() {
			return Err(StiltError::RuntimeHalt);
		}
		// Internal errors surfaced during interpretation land here.
		self.halt_on_errors()
	}

	fn halt_on_errors(&self) -> crate::Result<()> {
		let diagnostics = self.diagnostics.borrow();
		if diagnostics.had_error() {
			return Err(StiltError::CompileErrors(diagnostics.error_count()));
		}
		Ok(())
	}
}
