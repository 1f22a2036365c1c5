//! Static checking: a scoped type environment, subtyping, and flow-sensitive
//! structure checks, walked over the AST before anything executes.
//!
//! Every expression yields a [`Type`]; statements yield nothing. Violations
//! unwind as [`CheckError`]s and are caught at the top-level statement
//! boundary, so one broken statement does not silence its siblings. The AST
//! itself is never modified.
//!
//! Each name tracks two types: the `declared` type, fixed at its
//! declaration, and the `assigned` type, updated by every assignment. Reads
//! see the assigned type (which may be narrower); assignments are judged
//! against the declared type.

pub(crate) mod types;

use types::{FunctionType, Primitive, Type, from_type_expr};

use crate::{error::{Diagnostics, checker::{CheckError, LogicError, LogicErrorType, TypeError, TypeErrorType}}, parser::{expression::{Expression, LiteralValue}, type_expr::TypeExpr}, scanner::{Token, TokenType}, statement::{FunctionDecl, Statement}, utils::RcCell};

use std::collections::{HashMap, HashSet};

pub(crate) type TypeEnvPtr = RcCell<TypeEnvironment>;

/// The static analog of the runtime environment.
#[derive(Debug, Default)]
pub(crate) struct TypeEnvironment {
	/// Set once, at the declaration.
	declared:  HashMap<String, Type>,
	/// Updated by every assignment; absent until the first one.
	assigned:  HashMap<String, Type>,
	enclosing: Option<TypeEnvPtr>,
}

impl TypeEnvironment {
	/// The global scope, pre-populated with the native function signatures.
	pub fn globals() -> Self {
		let mut env = Self::default();
		let printable = Type::Union(vec![
			Type::primitive(Primitive::Int),
			Type::primitive(Primitive::Double),
			Type::primitive(Primitive::Str),
			Type::primitive(Primitive::Bool),
			Type::primitive(Primitive::Char),
			Type::primitive(Primitive::Null),
		]);
		env.declare_and_assign("print", Type::variadic_function(Type::primitive(Primitive::Void), printable));
		env.declare_and_assign("clock", Type::function(Type::primitive(Primitive::Double), vec![]));
		env.declare_and_assign(
			"sleep",
			Type::function(Type::primitive(Primitive::Void), vec![Type::primitive(Primitive::Double)]),
		);
		env
	}

	pub fn with_enclosing(enclosing: TypeEnvPtr) -> Self {
		Self { enclosing: Some(enclosing), ..Self::default() }
	}

	pub fn declare(&mut self, name: &str, r#type: Type) { self.declared.insert(name.to_string(), r#type); }

	pub fn assign(&mut self, name: &str, r#type: Type) { self.assigned.insert(name.to_string(), r#type); }

	pub fn declare_and_assign(&mut self, name: &str, r#type: Type) {
		self.declare(name, r#type.clone());
		self.assign(name, r#type);
	}

	/// Only the current scope; redeclaration is legal across scopes
	/// (shadowing) but not within one.
	pub fn is_declared_here(&self, name: &str) -> bool { self.declared.contains_key(name) }

	pub fn declared_type(&self, name: &str) -> Option<Type> {
		if let Some(t) = self.declared.get(name) {
			return Some(t.clone());
		}
		self.enclosing.as_ref().and_then(|enclosing| enclosing.borrow().declared_type(name))
	}

	pub fn assigned_type(&self, name: &str) -> Option<Type> {
		if let Some(t) = self.assigned.get(name) {
			return Some(t.clone());
		}
		self.enclosing.as_ref().and_then(|enclosing| enclosing.borrow().assigned_type(name))
	}
}

pub(crate) struct Checker {
	diagnostics:    RcCell<Diagnostics>,
	env:            TypeEnvPtr,
	/// How many loops enclose the current statement; break/continue need
	/// at least one.
	loop_depth:     usize,
	/// Declared return type of the enclosing function, if any.
	current_return: Option<Type>,
}

impl Checker {
	pub fn new(diagnostics: RcCell<Diagnostics>) -> Self {
		Self {
			diagnostics,
			env: RcCell::new(TypeEnvironment::globals()),
			loop_depth: 0,
			current_return: None,
		}
	}

	/// Check every top-level statement, recording violations in the sink.
	pub fn check(&mut self, statements: &[Statement]) {
		for statement in statements {
			if let Err(error) = self.check_stat(statement) {
				match error {
					CheckError::Logic(e) => self.diagnostics.borrow_mut().logic_error(&e),
					CheckError::Type(e) => self.diagnostics.borrow_mut().type_error(&e),
					CheckError::InternalError(e) => self.diagnostics.borrow_mut().internal_error(&e),
				}
			}
		}
	}

	fn check_stat(&mut self, statement: &Statement) -> Result<(), CheckError> {
		match statement {
			Statement::Expression(expression) => {
				self.check_expr(expression)?;
			}
			Statement::VarDecl { r#type, name, initializer } => {
				self.check_var_decl(r#type, name, initializer)?
			}
			Statement::If { condition, then_branch, else_branch } => {
				self.check_condition(condition, "if statement")?;
				self.check_stat(then_branch)?;
				if let Some(else_branch) = else_branch {
					self.check_stat(else_branch)?;
				}
			}
			Statement::While { condition, body } => {
				self.check_condition(condition, "while loop")?;
				self.loop_depth += 1;
				let result = self.check_stat(body);
				self.loop_depth -= 1;
				result?
			}
			Statement::For { initializer, condition, increment, body } => {
				// The init clause gets its own scope so a counter declared
				// there is local to the loop.
				let env = RcCell::new(TypeEnvironment::with_enclosing(self.env.clone()));
				self.with_environment(env, |checker| {
					if let Some(initializer) = initializer {
						checker.check_stat(initializer)?;
					}
					if let Some(condition) = condition {
						checker.check_condition(condition, "for loop")?;
					}
					if let Some(increment) = increment {
						checker.check_expr(increment)?;
					}
					checker.loop_depth += 1;
					let result = checker.check_stat(body);
					checker.loop_depth -= 1;
					result
				})?
			}
			Statement::Break { line } => {
				if self.loop_depth == 0 {
					return Err(LogicError::new(*line, LogicErrorType::BreakOutsideLoop).into());
				}
			}
			Statement::Continue { line } => {
				if self.loop_depth == 0 {
					return Err(LogicError::new(*line, LogicErrorType::ContinueOutsideLoop).into());
				}
			}
			Statement::Block(statements) => {
				let env = RcCell::new(TypeEnvironment::with_enclosing(self.env.clone()));
				self.with_environment(env, |checker| {
					statements.iter().try_for_each(|statement| checker.check_stat(statement))
				})?
			}
			Statement::FunctionDecl(declaration) => self.check_function_decl(declaration)?,
			Statement::Return { line, value } => self.check_return(*line, value)?,
		}
		Ok(())
	}

	fn check_var_decl(
		&mut self,
		r#type: &TypeExpr,
		name: &Token,
		initializer: &Option<Expression>,
	) -> Result<(), CheckError> {
		if self.env.borrow().is_declared_here(&name.lexeme) {
			return Err(
				LogicError::new(name.line, LogicErrorType::AlreadyDeclared(name.lexeme.clone())).into(),
			);
		}

		let declared = from_type_expr(r#type);
		self.env.borrow_mut().declare(&name.lexeme, declared.clone());

		if let Some(initializer) = initializer {
			let value = self.check_expr(initializer)?;
			if !value.subtype_of(&declared) {
				return Err(TypeError::new(name.line, TypeErrorType::AssignMismatch {
					name:     name.lexeme.clone(),
					declared: declared.to_string(),
					actual:   value.to_string(),
				})
				.into());
			}
			self.env.borrow_mut().assign(&name.lexeme, value);
		}
		Ok(())
	}

	fn check_function_decl(&mut self, declaration: &FunctionDecl) -> Result<(), CheckError> {
		let name = &declaration.name;
		if self.env.borrow().is_declared_here(&name.lexeme) {
			return Err(
				LogicError::new(name.line, LogicErrorType::AlreadyDeclared(name.lexeme.clone())).into(),
			);
		}

		// Parameters must be distinct; a repeat would silently shadow the
		// earlier binding in the function scope and at every call.
		let mut seen = HashSet::new();
		for param in &declaration.param_names {
			if !seen.insert(param.lexeme.as_str()) {
				return Err(LogicError::new(
					param.line,
					LogicErrorType::DuplicateParameter(param.lexeme.clone()),
				)
				.into());
			}
		}

		let signature = from_type_expr(&declaration.signature);
		let Type::Function(FunctionType { ret, params, .. }) = &signature else {
			return Err(anyhow::anyhow!("function declaration without a function signature").into());
		};
		let return_type = (**ret).clone();

		let fn_scope = RcCell::new(TypeEnvironment::with_enclosing(self.env.clone()));
		for (param, param_type) in declaration.param_names.iter().zip(params) {
			fn_scope.borrow_mut().declare_and_assign(&param.lexeme, param_type.clone());
		}

		// Declared before the body is checked so recursion resolves.
		self.env.borrow_mut().declare_and_assign(&name.lexeme, signature.clone());

		let previous_return = self.current_return.replace(return_type);
		// A loop outside the function does not license break/continue inside.
		let previous_depth = std::mem::take(&mut self.loop_depth);
		let result = self.with_environment(fn_scope, |checker| {
			declaration.body.iter().try_for_each(|statement| checker.check_stat(statement))
		});
		self.loop_depth = previous_depth;
		self.current_return = previous_return;
		result
	}

	fn check_return(&mut self, line: usize, value: &Option<Expression>) -> Result<(), CheckError> {
		let Some(expected) = self.current_return.clone() else {
			return Err(LogicError::new(line, LogicErrorType::ReturnOutsideFunction).into());
		};

		let actual = match value {
			Some(expression) => self.check_expr(expression)?,
			None => Type::primitive(Primitive::Null),
		};
		if !actual.subtype_of(&expected) {
			return Err(TypeError::new(line, TypeErrorType::ReturnMismatch {
				expected: expected.to_string(),
				actual:   actual.to_string(),
			})
			.into());
		}
		Ok(())
	}

	fn check_expr(&mut self, expression: &Expression) -> Result<Type, CheckError> {
		match expression {
			Expression::Literal { value, .. } => Ok(Type::primitive(match value {
				LiteralValue::Null => Primitive::Null,
				LiteralValue::Bool(_) => Primitive::Bool,
				LiteralValue::Int(_) => Primitive::Int,
				LiteralValue::Double(_) => Primitive::Double,
				LiteralValue::Str(_) => Primitive::Str,
				LiteralValue::Char(_) => Primitive::Char,
			})),
			Expression::Grouping(inner) => self.check_expr(inner),
			Expression::Unary { operator, right } => self.check_unary(operator, right),
			Expression::Binary { left, operator, right } => self.check_binary(left, operator, right),
			Expression::Logical { left, operator, right } => self.check_logical(left, operator, right),
			Expression::Ternary { condition, then_branch, else_branch, line } => {
				let condition_type = self.check_expr(condition)?;
				if !matches!(condition_type, Type::Primitive(Primitive::Bool)) {
					return Err(TypeError::new(
						*line,
						TypeErrorType::TernaryCondition(condition_type.to_string()),
					)
					.into());
				}
				let then_type = self.check_expr(then_branch)?;
				let else_type = self.check_expr(else_branch)?;
				Ok(Type::Union(vec![then_type, else_type]))
			}
			Expression::Variable(token) => {
				self.env.borrow().assigned_type(&token.lexeme).ok_or_else(|| {
					LogicError::new(
						token.line,
						LogicErrorType::UninitializedVariable(token.lexeme.clone()),
					)
					.into()
				})
			}
			Expression::Assign { target, value } => {
				let Some(declared) = self.env.borrow().declared_type(&target.lexeme) else {
					return Err(LogicError::new(
						target.line,
						LogicErrorType::AssignUndeclared(target.lexeme.clone()),
					)
					.into());
				};
				let actual = self.check_expr(value)?;
				if !actual.subtype_of(&declared) {
					return Err(TypeError::new(target.line, TypeErrorType::AssignMismatch {
						name:     target.lexeme.clone(),
						declared: declared.to_string(),
						actual:   actual.to_string(),
					})
					.into());
				}
				self.env.borrow_mut().assign(&target.lexeme, actual.clone());
				Ok(actual)
			}
			Expression::Call { callee, line, arguments } => self.check_call(callee, *line, arguments),
		}
	}

	fn check_unary(&mut self, operator: &Token, right: &Expression) -> Result<Type, CheckError> {
		let right_type = self.check_expr(right)?;
		let ok = match operator.r#type {
			TokenType::Bang => matches!(right_type, Type::Primitive(Primitive::Bool)),
			TokenType::Tilde => matches!(right_type, Type::Primitive(Primitive::Int)),
			TokenType::Minus => {
				matches!(right_type, Type::Primitive(Primitive::Int | Primitive::Double))
			}
			_ => return Err(anyhow::anyhow!("unexpected unary operator '{}'", operator.lexeme).into()),
		};
		if !ok {
			let expected = match operator.r#type {
				TokenType::Bang => "'bool'",
				TokenType::Tilde => "'int'",
				_ => "'int' or 'double'",
			};
			return Err(TypeError::new(operator.line, TypeErrorType::UnaryOperand {
				operator: match operator.r#type {
					TokenType::Bang => "!",
					TokenType::Tilde => "~",
					_ => "-",
				},
				expected,
				actual: right_type.to_string(),
			})
			.into());
		}
		Ok(right_type)
	}

	/// The operand pair uniquely determines the result type; anything not in
	/// the table is a type error.
	fn check_binary(
		&mut self,
		left: &Expression,
		operator: &Token,
		right: &Expression,
	) -> Result<Type, CheckError> {
		use Primitive::*;

		let left_type = self.check_expr(left)?;
		let right_type = self.check_expr(right)?;

		let mismatch = || {
			CheckError::from(TypeError::new(operator.line, TypeErrorType::BinaryOperands {
				operator: operator.lexeme.clone(),
				left:     left_type.to_string(),
				right:    right_type.to_string(),
			}))
		};

		let (Type::Primitive(l), Type::Primitive(r)) = (&left_type, &right_type) else {
			return Err(mismatch());
		};
		if *l != *r {
			return Err(mismatch());
		}

		let result = match operator.r#type {
			TokenType::Plus => match l {
				Int => Int,
				Double => Double,
				Str => Str,
				_ => return Err(mismatch()),
			},
			TokenType::Minus | TokenType::Star | TokenType::Slash => match l {
				Int => Int,
				Double => Double,
				_ => return Err(mismatch()),
			},
			TokenType::Percent
			| TokenType::LessLess
			| TokenType::GreaterGreater
			| TokenType::Ampersand
			| TokenType::Pipe
			| TokenType::Caret => match l {
				Int => Int,
				_ => return Err(mismatch()),
			},
			TokenType::Less | TokenType::LessEqual | TokenType::Greater | TokenType::GreaterEqual => {
				match l {
					Int | Double | Str | Char => Bool,
					_ => return Err(mismatch()),
				}
			}
			TokenType::EqualEqual | TokenType::BangEqual => match l {
				Int | Double | Str | Char | Bool | Null => Bool,
				_ => return Err(mismatch()),
			},
			_ => {
				return Err(anyhow::anyhow!("unexpected binary operator '{}'", operator.lexeme).into());
			}
		};
		Ok(Type::primitive(result))
	}

	fn check_logical(
		&mut self,
		left: &Expression,
		operator: &Token,
		right: &Expression,
	) -> Result<Type, CheckError> {
		let left_type = self.check_expr(left)?;
		let right_type = self.check_expr(right)?;
		let both_bool = matches!(left_type, Type::Primitive(Primitive::Bool))
			&& matches!(right_type, Type::Primitive(Primitive::Bool));
		if !both_bool {
			return Err(TypeError::new(operator.line, TypeErrorType::BinaryOperands {
				operator: operator.lexeme.clone(),
				left:     left_type.to_string(),
				right:    right_type.to_string(),
			})
			.into());
		}
		Ok(Type::primitive(Primitive::Bool))
	}

	fn check_call(
		&mut self,
		callee: &Expression,
		line: usize,
		arguments: &[Expression],
	) -> Result<Type, CheckError> {
		let callee_type = self.check_expr(callee)?;
		let Type::Function(function) = &callee_type else {
			return Err(
				TypeError::new(line, TypeErrorType::NotCallable(callee_type.to_string())).into()
			);
		};

		if function.variadic {
			// Every argument must fit the single declared parameter; the
			// count is unconstrained.
			let Some(expected) = function.params.first() else {
				return Err(anyhow::anyhow!("variadic function without a parameter type").into());
			};
			for (i, argument) in arguments.iter().enumerate() {
				let actual = self.check_expr(argument)?;
				if !actual.subtype_of(expected) {
					return Err(TypeError::new(argument.line(), TypeErrorType::ArgumentMismatch {
						index:    i + 1,
						expected: expected.to_string(),
						actual:   actual.to_string(),
					})
					.into());
				}
			}
		} else {
			if arguments.len() != function.params.len() {
				return Err(TypeError::new(line, TypeErrorType::ArityMismatch {
					expected: function.params.len(),
					got:      arguments.len(),
				})
				.into());
			}
			for (i, (argument, expected)) in arguments.iter().zip(&function.params).enumerate() {
				let actual = self.check_expr(argument)?;
				if !actual.subtype_of(expected) {
					return Err(TypeError::new(argument.line(), TypeErrorType::ArgumentMismatch {
						index:    i + 1,
						expected: expected.to_string(),
						actual:   actual.to_string(),
					})
					.into());
				}
			}
		}

		Ok((*function.ret).clone())
	}

	fn check_condition(&mut self, condition: &Expression, construct: &'static str) -> Result<(), CheckError> {
		let condition_type = self.check_expr(condition)?;
		if !matches!(condition_type, Type::Primitive(Primitive::Bool)) {
			return Err(TypeError::new(condition.line(), TypeErrorType::ConditionNotBool {
				construct,
				actual: condition_type.to_string(),
			})
			.into());
		}
		Ok(())
	}

	/// Scoped acquisition of a type environment: the previous scope is
	/// restored on every exit path, including the error path.
	fn with_environment<T>(
		&mut self,
		env: TypeEnvPtr,
		run: impl FnOnce(&mut Self) -> Result<T, CheckError>,
	) -> Result<T, CheckError> {
		let previous = std::mem::replace(&mut self.env, env);
		let result = run(self);
		self.env = previous;
		result
	}
}
