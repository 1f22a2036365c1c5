//! The semantic type lattice and its subtyping relation.
//!
//! Subtyping is reflexive, `null` may flow into any non-function primitive,
//! function types are contravariant in their parameters, and a union is the
//! supertype of anything every branch of which fits one of its options.

use std::rc::Rc;

use crate::parser::type_expr::{TypeExpr, TypeName};

/// A static type.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Type {
	Primitive(Primitive),
	Function(FunctionType),
	/// Internal only: the result of a ternary expression and the parameter
	/// of the variadic native `print`. Not writable in source.
	Union(Vec<Type>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Primitive {
	Null,
	Bool,
	Int,
	Double,
	Str,
	Char,
	Void,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct FunctionType {
	pub ret:      Rc<Type>,
	pub params:   Vec<Type>,
	/// Set only for the native `print`: the single parameter type applies to
	/// every argument and the count is unconstrained.
	pub variadic: bool,
}

impl Type {
	pub fn primitive(primitive: Primitive) -> Self { Type::Primitive(primitive) }

	pub fn function(ret: Type, params: Vec<Type>) -> Self {
		Type::Function(FunctionType { ret: Rc::new(ret), params, variadic: false })
	}

	pub fn variadic_function(ret: Type, param: Type) -> Self {
		Type::Function(FunctionType { ret: Rc::new(ret), params: vec![param], variadic: true })
	}

	/// Whether a `self` value may flow into a spot expecting `other`.
	pub fn subtype_of(&self, other: &Type) -> bool {
		match (self, other) {
			// null flows into any non-function primitive.
			(Type::Primitive(left), Type::Primitive(right)) => {
				left == right || *left == Primitive::Null
			}
			(Type::Function(left), Type::Function(right)) => left.subtype_of(right),
			(Type::Union(options), Type::Union(_)) => {
				options.iter().all(|option| option.subtype_of(other))
			}
			// A non-union fits a union when it fits one of its options.
			(_, Type::Union(options)) => options.iter().any(|option| self.subtype_of(option)),
			_ => false,
		}
	}
}

impl FunctionType {
	/// Contravariant in parameters, covariant in the return type.
	fn subtype_of(&self, other: &FunctionType) -> bool {
		self.ret.subtype_of(&other.ret)
			&& self.variadic == other.variadic
			&& self.params.len() == other.params.len()
			&& other.params.iter().zip(&self.params).all(|(sup, sub)| sup.subtype_of(sub))
	}
}

/// Convert a syntax-level annotation into its semantic type.
pub(crate) fn from_type_expr(expr: &TypeExpr) -> Type {
	match expr {
		TypeExpr::Primitive(name) => Type::Primitive(match name {
			TypeName::Bool => Primitive::Bool,
			TypeName::Int => Primitive::Int,
			TypeName::Double => Primitive::Double,
			TypeName::Char => Primitive::Char,
			TypeName::Str => Primitive::Str,
			TypeName::Void => Primitive::Void,
		}),
		TypeExpr::Function { ret, params } => {
			Type::function(from_type_expr(ret), params.iter().map(from_type_expr).collect())
		}
	}
}

impl std::fmt::Display for Type {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			Type::Primitive(primitive) => write!(f, "{primitive}"),
			Type::Function(function) => {
				write!(f, "{}(", function.ret)?;
				for (i, param) in function.params.iter().enumerate() {
					if i != 0 {
						write!(f, ", ")?;
					}
					write!(f, "{param}")?;
				}
				write!(f, ")")
			}
			Type::Union(options) => {
				for (i, option) in options.iter().enumerate() {
					if i != 0 {
						write!(f, " | ")?;
					}
					write!(f, "{option}")?;
				}
				Ok(())
			}
		}
	}
}

impl std::fmt::Display for Primitive {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		let name = match self {
			Primitive::Null => "null",
			Primitive::Bool => "bool",
			Primitive::Int => "int",
			Primitive::Double => "double",
			Primitive::Str => "string",
			Primitive::Char => "char",
			Primitive::Void => "void",
		};
		write!(f, "{name}")
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn all_primitives() -> Vec<Type> {
		use Primitive::*;
		[Null, Bool, Int, Double, Str, Char, Void].into_iter().map(Type::Primitive).collect()
	}

	fn samples() -> Vec<Type> {
		let mut types = all_primitives();
		types.push(Type::function(Type::Primitive(Primitive::Int), vec![Type::Primitive(
			Primitive::Double,
		)]));
		types.push(Type::function(Type::Primitive(Primitive::Void), vec![]));
		types.push(Type::Union(vec![
			Type::Primitive(Primitive::Int),
			Type::Primitive(Primitive::Str),
		]));
		types
	}

	#[test]
	fn subtyping_is_reflexive() {
		for t in samples() {
			assert!(t.subtype_of(&t), "{t} should be a subtype of itself");
		}
	}

	#[test]
	fn null_flows_into_non_function_primitives() {
		let null = Type::Primitive(Primitive::Null);
		for t in all_primitives() {
			assert!(null.subtype_of(&t), "null should flow into {t}");
		}
		let function = Type::function(Type::Primitive(Primitive::Int), vec![]);
		assert!(!null.subtype_of(&function));
		assert!(!function.subtype_of(&null));
	}

	#[test]
	fn distinct_primitives_do_not_mix() {
		let int = Type::Primitive(Primitive::Int);
		let double = Type::Primitive(Primitive::Double);
		assert!(!int.subtype_of(&double));
		assert!(!double.subtype_of(&int));
	}

	#[test]
	fn function_parameters_are_contravariant() {
		// null <: int, so int-accepting is a subtype of null-accepting.
		let int = Type::Primitive(Primitive::Int);
		let null = Type::Primitive(Primitive::Null);
		let takes_int = Type::function(Type::Primitive(Primitive::Void), vec![int.clone()]);
		let takes_null = Type::function(Type::Primitive(Primitive::Void), vec![null.clone()]);
		assert!(takes_int.subtype_of(&takes_null));
		assert!(!takes_null.subtype_of(&takes_int));

		// Covariant return.
		let returns_null = Type::function(null, vec![]);
		let returns_int = Type::function(int, vec![]);
		assert!(returns_null.subtype_of(&returns_int));
		assert!(!returns_int.subtype_of(&returns_null));
	}

	#[test]
	fn arity_must_match() {
		let void = || Type::Primitive(Primitive::Void);
		let int = || Type::Primitive(Primitive::Int);
		let one = Type::function(void(), vec![int()]);
		let two = Type::function(void(), vec![int(), int()]);
		assert!(!one.subtype_of(&two));
		assert!(!two.subtype_of(&one));
	}

	#[test]
	fn union_membership() {
		let int = Type::Primitive(Primitive::Int);
		let string = Type::Primitive(Primitive::Str);
		let char_ = Type::Primitive(Primitive::Char);
		let union = Type::Union(vec![int.clone(), string.clone()]);

		assert!(int.subtype_of(&union));
		assert!(string.subtype_of(&union));
		assert!(!char_.subtype_of(&union));
		// A union fits another union when every option finds a home.
		let narrow = Type::Union(vec![int.clone(), int.clone()]);
		assert!(narrow.subtype_of(&union));
		assert!(!union.subtype_of(&narrow));
		// A union never fits a bare primitive.
		assert!(!narrow.subtype_of(&int));
	}

	#[test]
	fn display() {
		assert_eq!(Type::Primitive(Primitive::Int).to_string(), "int");
		let print_like = Type::variadic_function(
			Type::Primitive(Primitive::Void),
			Type::Union(vec![Type::Primitive(Primitive::Int), Type::Primitive(Primitive::Null)]),
		);
		assert_eq!(print_like.to_string(), "void(int | null)");
		let signature =
			Type::function(Type::Primitive(Primitive::Int), vec![Type::Primitive(Primitive::Double)]);
		assert_eq!(signature.to_string(), "int(double)");
	}
}
