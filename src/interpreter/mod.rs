//! Tree-walking evaluation over the checked AST.
//!
//! Evaluation is depth-first and left-to-right; only `&&` and `||` skip
//! their right operand. Each block, function call and for-statement installs
//! a fresh environment through [`Interpreter::with_environment`], which
//! restores the previous scope on every exit path. That guard is what keeps
//! a REPL line that aborted halfway from leaking its inner bindings into the
//! session's global scope.
//!
//! The interpreter trusts the checker for typing but re-checks the handful
//! of conditions whose violation would otherwise corrupt evaluation:
//! condition and ternary booleans, callee shapes, arity, operand pairs.

pub(crate) mod callable;
pub(crate) mod captures;
pub(crate) mod value;

use callable::{Arity, CallableKind, CallableValue, native};
use value::{BinaryOpError, Value};

use crate::{environment::{EnvPtr, Environment}, error::{Diagnostics, interpreter::{InterpreterError, RuntimeError, RuntimeErrorType}}, parser::expression::{Expression, LiteralValue}, scanner::{Token, TokenType}, statement::Statement, utils::RcCell};

pub(crate) struct Interpreter {
	diagnostics: RcCell<Diagnostics>,
	/// The currently active innermost environment.
	env:         EnvPtr,
}

impl Interpreter {
	/// A fresh interpreter whose global scope holds the three natives.
	pub fn new(diagnostics: RcCell<Diagnostics>) -> Self {
		let mut globals = Environment::new();
		for (name, callable) in native::all() {
			globals.declare(name);
			globals.define(name, Value::Callable(callable));
		}
		Self { diagnostics, env: RcCell::new(globals) }
	}

	/// Execute the statement list until it is exhausted or a runtime error
	/// stops it. The error is recorded in the sink; later statements do not
	/// run.
	pub fn interpret(&mut self, statements: &[Statement]) {
		for statement in statements {
			match self.execute(statement) {
				Ok(()) => {}
				Err(InterpreterError::Runtime(error)) => {
					self.diagnostics.borrow_mut().runtime_error(&error);
					return;
				}
				Err(InterpreterError::InternalError(error)) => {
					self.diagnostics.borrow_mut().internal_error(&error);
					return;
				}
				Err(signal) => {
					// Break/continue/return outside their construct; the
					// checker rejects these, so reaching here is a bug.
					let error = anyhow::anyhow!("control-flow signal escaped to the top level: {signal}");
					self.diagnostics.borrow_mut().internal_error(&error);
					return;
				}
			}
		}
	}

	fn execute(&mut self, statement: &Statement) -> Result<(), InterpreterError> {
		match statement {
			Statement::Expression(expression) => {
				self.evaluate(expression)?;
			}
			Statement::VarDecl { name, initializer, .. } => {
				if self.env.borrow().is_declared_here(&name.lexeme) {
					return Err(RuntimeError::new(
						name.line,
						RuntimeErrorType::AlreadyDeclared(name.lexeme.clone()),
					)
					.into());
				}
				// Declared before the initializer runs, so a plain
				// `int x; x = 1;` works and `int x = x;` reads null.
				self.env.borrow_mut().declare(&name.lexeme);
				if let Some(initializer) = initializer {
					let value = self.evaluate(initializer)?;
					self.env.borrow_mut().define(&name.lexeme, value);
				}
			}
			Statement::If { condition, then_branch, else_branch } => {
				let value = self.evaluate(condition)?;
				if self.require_bool(value, condition.line(), "if statement")? {
					self.execute(then_branch)?
				} else if let Some(else_branch) = else_branch {
					self.execute(else_branch)?
				}
			}
			Statement::While { condition, body } => loop {
				let value = self.evaluate(condition)?;
				if !self.require_bool(value, condition.line(), "while loop")? {
					break;
				}
				match self.execute(body) {
					Ok(()) | Err(InterpreterError::Continue) => {}
					Err(InterpreterError::Break) => break,
					Err(error) => return Err(error),
				}
			},
			Statement::For { initializer, condition, increment, body } => {
				// One scope wraps all four clauses, matching the checker.
				let env = RcCell::new(Environment::with_enclosing(self.env.clone()));
				self.with_environment(env, |interpreter| {
					if let Some(initializer) = initializer {
						interpreter.execute(initializer)?;
					}
					loop {
						if let Some(condition) = condition {
							let value = interpreter.evaluate(condition)?;
							if !interpreter.require_bool(value, condition.line(), "for loop")? {
								break;
							}
						}
						match interpreter.execute(body) {
							// Continue transfers control to the increment.
							Ok(()) | Err(InterpreterError::Continue) => {}
							Err(InterpreterError::Break) => break,
							Err(error) => return Err(error),
						}
						if let Some(increment) = increment {
							interpreter.evaluate(increment)?;
						}
					}
					Ok(())
				})?
			}
			Statement::Break { .. } => return Err(InterpreterError::Break),
			Statement::Continue { .. } => return Err(InterpreterError::Continue),
			Statement::Block(statements) => {
				let env = RcCell::new(Environment::with_enclosing(self.env.clone()));
				self.execute_block(statements, env)?
			}
			Statement::FunctionDecl(declaration) => {
				// The closure copies the current values of the body's free
				// variables; names not resolvable yet are simply skipped.
				let closure = RcCell::new(Environment::new());
				for name in captures::free_variables(declaration) {
					let captured = self.env.borrow().get(&name);
					if let Some(value) = captured {
						closure.borrow_mut().declare(&name);
						closure.borrow_mut().define(&name, value);
					}
				}
				let function = Value::Callable(CallableValue::function(declaration.clone(), closure.clone()));
				// The function sees itself, so direct recursion resolves.
				closure.borrow_mut().declare(&declaration.name.lexeme);
				closure.borrow_mut().define(&declaration.name.lexeme, function.clone());
				self.env.borrow_mut().declare(&declaration.name.lexeme);
				self.env.borrow_mut().define(&declaration.name.lexeme, function);
			}
			Statement::Return { value, .. } => {
				let value = match value {
					Some(expression) => self.evaluate(expression)?,
					None => Value::Null,
				};
				return Err(InterpreterError::Return(value));
			}
		}
		Ok(())
	}

	fn evaluate(&mut self, expression: &Expression) -> Result<Value, InterpreterError> {
		match expression {
			Expression::Literal { value, .. } => Ok(match value {
				LiteralValue::Null => Value::Null,
				LiteralValue::Bool(b) => Value::Bool(*b),
				LiteralValue::Int(i) => Value::Int(*i),
				LiteralValue::Double(d) => Value::Double(*d),
				LiteralValue::Str(s) => Value::Str(s.clone()),
				LiteralValue::Char(c) => Value::Char(*c),
			}),
			Expression::Grouping(inner) => self.evaluate(inner),
			Expression::Unary { operator, right } => {
				let right = self.evaluate(right)?;
				self.apply_unary(operator, right)
			}
			Expression::Binary { left, operator, right } => {
				let left = self.evaluate(left)?;
				let right = self.evaluate(right)?;
				left.binary_op(&operator.r#type, &right).map_err(|error| {
					let r#type = match error {
						BinaryOpError::DivisionByZero => RuntimeErrorType::DivisionByZero,
						BinaryOpError::RemainderByZero => RuntimeErrorType::RemainderByZero,
						BinaryOpError::Unsupported => RuntimeErrorType::UnsupportedOperands {
							operator: operator.lexeme.clone(),
							left:     left.to_string(),
							right:    right.to_string(),
						},
					};
					RuntimeError::new(operator.line, r#type).into()
				})
			}
			Expression::Logical { left, operator, right } => self.evaluate_logical(left, operator, right),
			Expression::Ternary { condition, then_branch, else_branch, line } => {
				let condition = self.evaluate(condition)?;
				let Value::Bool(condition) = condition else {
					return Err(RuntimeError::new(*line, RuntimeErrorType::TernaryConditionNotBool).into());
				};
				if condition { self.evaluate(then_branch) } else { self.evaluate(else_branch) }
			}
			Expression::Variable(token) => self.env.borrow().get(&token.lexeme).ok_or_else(|| {
				RuntimeError::new(token.line, RuntimeErrorType::UndefinedVariable(token.lexeme.clone()))
					.into()
			}),
			Expression::Assign { target, value } => {
				let value = self.evaluate(value)?;
				if !self.env.borrow_mut().assign(&target.lexeme, value.clone()) {
					return Err(RuntimeError::new(
						target.line,
						RuntimeErrorType::AssignUndefined(target.lexeme.clone()),
					)
					.into());
				}
				Ok(value)
			}
			Expression::Call { callee, line, arguments } => {
				let callee = self.evaluate(callee)?;
				let mut values = Vec::with_capacity(arguments.len());
				for argument in arguments {
					values.push(self.evaluate(argument)?);
				}
				self.call(callee, *line, values)
			}
		}
	}

	fn apply_unary(&self, operator: &Token, right: Value) -> Result<Value, InterpreterError> {
		match (&operator.r#type, &right) {
			(TokenType::Bang, Value::Bool(b)) => Ok(Value::Bool(!b)),
			(TokenType::Tilde, Value::Int(i)) => Ok(Value::Int(!i)),
			(TokenType::Minus, Value::Int(i)) => Ok(Value::Int(i.wrapping_neg())),
			(TokenType::Minus, Value::Double(d)) => Ok(Value::Double(-d)),
			_ => Err(RuntimeError::new(operator.line, RuntimeErrorType::UnsupportedUnary {
				operator: operator.lexeme.clone(),
				operand:  right.type_name().to_string(),
			})
			.into()),
		}
	}

	/// `&&` and `||` evaluate the right operand only when the left one has
	/// not already decided the result.
	fn evaluate_logical(
		&mut self,
		left: &Expression,
		operator: &Token,
		right: &Expression,
	) -> Result<Value, InterpreterError> {
		let symbol = match operator.r#type {
			TokenType::AmpersandAmpersand => "&&",
			TokenType::PipePipe => "||",
			_ => return Err(anyhow::anyhow!("unexpected logical operator '{}'", operator.lexeme).into()),
		};
		let operand_error =
			|| RuntimeError::new(operator.line, RuntimeErrorType::LogicalOperandNotBool(symbol));

		let Value::Bool(left) = self.evaluate(left)? else {
			return Err(operand_error().into());
		};
		let decided = match operator.r#type {
			TokenType::AmpersandAmpersand => !left,
			_ => left,
		};
		if decided {
			return Ok(Value::Bool(left));
		}
		let Value::Bool(right) = self.evaluate(right)? else {
			return Err(operand_error().into());
		};
		Ok(Value::Bool(right))
	}

	fn call(&mut self, callee: Value, line: usize, arguments: Vec<Value>) -> Result<Value, InterpreterError> {
		let callable = match callee {
			Value::Callable(callable) => callable,
			other => {
				return Err(
					RuntimeError::new(line, RuntimeErrorType::NotCallable(other.to_string())).into()
				);
			}
		};

		if let Arity::Fixed(expected) = callable.arity() {
			if arguments.len() != expected {
				return Err(RuntimeError::new(line, RuntimeErrorType::ArityMismatch {
					name: callable.name.clone(),
					expected,
					got: arguments.len(),
				})
				.into());
			}
		}

		match &callable.kind {
			CallableKind::Native { function, .. } => Ok(function(line, &arguments)?),
			CallableKind::Function { declaration, closure } => {
				// Parameters bind in a fresh scope chained to the closure,
				// never in the closure itself, so calls cannot pollute it.
				let mut env = Environment::with_enclosing(closure.clone());
				for (parameter, argument) in declaration.param_names.iter().zip(arguments) {
					env.declare(&parameter.lexeme);
					env.define(&parameter.lexeme, argument);
				}
				match self.execute_block(&declaration.body, RcCell::new(env)) {
					Ok(()) => Ok(Value::Null),
					Err(InterpreterError::Return(value)) => Ok(value),
					Err(error) => Err(error),
				}
			}
		}
	}

	fn execute_block(&mut self, statements: &[Statement], env: EnvPtr) -> Result<(), InterpreterError> {
		self.with_environment(env, |interpreter| {
			statements.iter().try_for_each(|statement| interpreter.execute(statement))
		})
	}

	/// Scoped acquisition of an environment: the previous scope is restored
	/// on every exit path, including the error path. All scope-installing
	/// constructs go through here.
	fn with_environment<T>(
		&mut self,
		env: EnvPtr,
		run: impl FnOnce(&mut Self) -> Result<T, InterpreterError>,
	) -> Result<T, InterpreterError> {
		let previous = std::mem::replace(&mut self.env, env);
		let result = run(self);
		self.env = previous;
		result
	}

	fn require_bool(
		&self,
		value: Value,
		line: usize,
		construct: &'static str,
	) -> Result<bool, InterpreterError> {
		match value {
			Value::Bool(b) => Ok(b),
			_ => Err(RuntimeError::new(line, RuntimeErrorType::ConditionNotBool(construct)).into()),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::{checker::Checker, parser::Parser, scanner::Scanner};

	/// Run the whole pipeline; the source must pass parsing and checking.
	fn run(source: &str) -> (Interpreter, RcCell<Diagnostics>) {
		let diagnostics = RcCell::new(Diagnostics::new());
		let tokens = Scanner::new(source, diagnostics.clone()).scan_tokens().unwrap();
		let statements = Parser::new(tokens, diagnostics.clone()).parse().unwrap();
		Checker::new(diagnostics.clone()).check(&statements);
		assert!(!diagnostics.borrow().had_error(), "static errors: {:?}", diagnostics.borrow().messages());
		let mut interpreter = Interpreter::new(diagnostics.clone());
		interpreter.interpret(&statements);
		(interpreter, diagnostics)
	}

	fn global(interpreter: &Interpreter, name: &str) -> Value {
		interpreter.env.borrow().get(name).unwrap_or_else(|| panic!("no global named {name}"))
	}

	fn run_value(source: &str, name: &str) -> Value {
		let (interpreter, diagnostics) = run(source);
		assert!(
			!diagnostics.borrow().had_runtime_error(),
			"runtime errors: {:?}",
			diagnostics.borrow().messages()
		);
		global(&interpreter, name)
	}

	#[test]
	fn arithmetic_precedence() {
		assert_eq!(run_value("int x = 1 + 2 * 3;", "x"), Value::Int(7));
		assert_eq!(run_value("int x = (1 + 2) * 3;", "x"), Value::Int(9));
		assert_eq!(run_value("int x = ~0 & 12 | 1 ^ 2;", "x"), Value::Int(15));
	}

	#[test]
	fn while_loop_sums() {
		let source = "int n = 10; int s = 0; while (n > 0) { s = s + n; n = n - 1; }";
		assert_eq!(run_value(source, "s"), Value::Int(55));
	}

	#[test]
	fn for_loop_doubles() {
		let source = "double f = 2.0; for (int i = 0; i < 3; i = i + 1) { f = f * 2.0; }";
		assert_eq!(run_value(source, "f"), Value::Double(16.0));
	}

	#[test]
	fn continue_transfers_to_the_increment() {
		let source = "int s = 0; for (int i = 0; i < 5; i = i + 1) { if (i % 2 == 0) continue; s = s + i; }";
		assert_eq!(run_value(source, "s"), Value::Int(4));
	}

	#[test]
	fn break_leaves_the_loop() {
		let source = "int i = 0; while (true) { i = i + 1; if (i == 3) break; }";
		assert_eq!(run_value(source, "i"), Value::Int(3));
	}

	#[test]
	fn function_calls_bind_parameters() {
		let source = "int add(int a, int b) { return a + b; } int r = add(2, 3);";
		assert_eq!(run_value(source, "r"), Value::Int(5));
	}

	#[test]
	fn recursion_through_the_closure() {
		let source = "int fib(int n) { if (n < 2) { return n; } return fib(n - 1) + fib(n - 2); } int r = fib(10);";
		assert_eq!(run_value(source, "r"), Value::Int(55));
	}

	#[test]
	fn closures_capture_values_at_declaration() {
		let source = "int x = 10; int f() { return x; } x = 99; int y = f();";
		assert_eq!(run_value(source, "y"), Value::Int(10));
	}

	#[test]
	fn nested_function_reads_outer_local() {
		let source = "int outer() { int a = 7; int inner() { return a; } return inner(); } int r = outer();";
		assert_eq!(run_value(source, "r"), Value::Int(7));
	}

	#[test]
	fn function_without_return_produces_null() {
		let source = "void f() { 1 + 1; } int x = 0; f();";
		let (interpreter, diagnostics) = run(source);
		assert!(!diagnostics.borrow().had_runtime_error());
		assert_eq!(global(&interpreter, "x"), Value::Int(0));
	}

	#[test]
	fn shadowing_restores_the_outer_binding() {
		let source = "int x = 1; { int x = 2; x = 3; }";
		assert_eq!(run_value(source, "x"), Value::Int(1));
	}

	#[test]
	fn short_circuit_skips_the_right_operand() {
		assert_eq!(run_value("bool t = true || 1 / 0 == 0;", "t"), Value::Bool(true));
		assert_eq!(run_value("bool f = false && 1 / 0 == 0;", "f"), Value::Bool(false));
	}

	#[test]
	fn division_by_zero_stops_execution() {
		let (interpreter, diagnostics) = run("int a = 1; int b = 10 / 0; a = 2;");
		let diagnostics = diagnostics.borrow();
		assert!(diagnostics.had_runtime_error());
		assert!(diagnostics.messages().iter().any(|m| m.contains("Integer division by zero")));
		// The statement after the error never ran.
		assert_eq!(global(&interpreter, "a"), Value::Int(1));
	}

	#[test]
	fn remainder_by_zero_is_an_error() {
		let (_, diagnostics) = run("int x = 10 % 0;");
		assert!(diagnostics.borrow().had_runtime_error());
	}

	#[test]
	fn double_division_by_zero_follows_ieee() {
		let (interpreter, diagnostics) = run("double d = 1.0 / 0.0;");
		assert!(!diagnostics.borrow().had_runtime_error());
		assert_eq!(global(&interpreter, "d"), Value::Double(f64::INFINITY));
	}

	#[test]
	fn aborted_block_does_not_leak_bindings() {
		let (interpreter, diagnostics) = run("int a = 1; { int a = 2; int b = 1 / 0; }");
		assert!(diagnostics.borrow().had_runtime_error());
		assert_eq!(global(&interpreter, "a"), Value::Int(1));
		assert!(interpreter.env.borrow().get("b").is_none());
	}

	#[test]
	fn negative_sleep_is_a_runtime_error() {
		let (_, diagnostics) = run("sleep(-1.0);");
		let diagnostics = diagnostics.borrow();
		assert!(diagnostics.had_runtime_error());
		assert!(diagnostics.messages().iter().any(|m| m.contains("non-negative")));
	}

	#[test]
	fn string_and_char_values() {
		assert_eq!(run_value("string s = \"hi\" + \" \" + \"there\";", "s"), Value::Str("hi there".into()));
		assert_eq!(run_value("bool b = 'a' < 'b';", "b"), Value::Bool(true));
	}

	#[test]
	fn clock_is_monotonic_enough() {
		let source = "double before = clock(); double after = clock(); bool ok = before <= after;";
		assert_eq!(run_value(source, "ok"), Value::Bool(true));
	}
}
