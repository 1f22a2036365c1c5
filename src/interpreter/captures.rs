//! Free-variable analysis for closure capture.
//!
//! The capture set of a function is a conservative overapproximation: every
//! identifier referenced anywhere in the body, minus the parameters, minus
//! every name declared anywhere in the body, minus the function's own name
//! (which is bound into the closure separately so recursion resolves).

use std::collections::HashSet;

use crate::{parser::expression::Expression, statement::{FunctionDecl, Statement}};

/// Names the function body reads from its defining environment, in first
/// reference order.
pub(crate) fn free_variables(declaration: &FunctionDecl) -> Vec<String> {
	let mut references = Vec::new();
	let mut seen = HashSet::new();
	let mut bound: HashSet<String> = declaration.param_names.iter().map(|p| p.lexeme.clone()).collect();
	bound.insert(declaration.name.lexeme.clone());

	for statement in &declaration.body {
		collect_stat(statement, &mut references, &mut seen, &mut bound);
	}

	references.retain(|name| !bound.contains(name));
	references
}

fn collect_stat(
	statement: &Statement,
	references: &mut Vec<String>,
	seen: &mut HashSet<String>,
	bound: &mut HashSet<String>,
) {
	match statement {
		Statement::Expression(expression) => collect_expr(expression, references, seen),
		Statement::VarDecl { name, initializer, .. } => {
			if let Some(initializer) = initializer {
				collect_expr(initializer, references, seen);
			}
			bound.insert(name.lexeme.clone());
		}
		Statement::If { condition, then_branch, else_branch } => {
			collect_expr(condition, references, seen);
			collect_stat(then_branch, references, seen, bound);
			if let Some(else_branch) = else_branch {
				collect_stat(else_branch, references, seen, bound);
			}
		}
		Statement::While { condition, body } => {
			collect_expr(condition, references, seen);
			collect_stat(body, references, seen, bound);
		}
		Statement::For { initializer, condition, increment, body } => {
			if let Some(initializer) = initializer {
				collect_stat(initializer, references, seen, bound);
			}
			if let Some(condition) = condition {
				collect_expr(condition, references, seen);
			}
			if let Some(increment) = increment {
				collect_expr(increment, references, seen);
			}
			collect_stat(body, references, seen, bound);
		}
		Statement::Break { .. } | Statement::Continue { .. } => {}
		Statement::Block(statements) => {
			for statement in statements {
				collect_stat(statement, references, seen, bound);
			}
		}
		Statement::FunctionDecl(inner) => {
			bound.insert(inner.name.lexeme.clone());
			// The nested function's own free variables are reads the outer
			// body performs at declaration time.
			for name in free_variables(inner) {
				if seen.insert(name.clone()) {
					references.push(name);
				}
			}
		}
		Statement::Return { value, .. } => {
			if let Some(value) = value {
				collect_expr(value, references, seen);
			}
		}
	}
}

fn collect_expr(expression: &Expression, references: &mut Vec<String>, seen: &mut HashSet<String>) {
	match expression {
		Expression::Literal { .. } => {}
		Expression::Unary { right, .. } => collect_expr(right, references, seen),
		Expression::Binary { left, right, .. } | Expression::Logical { left, right, .. } => {
			collect_expr(left, references, seen);
			collect_expr(right, references, seen);
		}
		Expression::Ternary { condition, then_branch, else_branch, .. } => {
			collect_expr(condition, references, seen);
			collect_expr(then_branch, references, seen);
			collect_expr(else_branch, references, seen);
		}
		Expression::Grouping(inner) => collect_expr(inner, references, seen),
		Expression::Variable(token) => {
			if seen.insert(token.lexeme.clone()) {
				references.push(token.lexeme.clone());
			}
		}
		Expression::Assign { target, value } => {
			if seen.insert(target.lexeme.clone()) {
				references.push(target.lexeme.clone());
			}
			collect_expr(value, references, seen);
		}
		Expression::Call { callee, arguments, .. } => {
			collect_expr(callee, references, seen);
			for argument in arguments {
				collect_expr(argument, references, seen);
			}
		}
	}
}
