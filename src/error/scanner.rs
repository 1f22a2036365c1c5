#[derive(thiserror::Error, Debug)]
pub enum ScannerError {
	/// Internal compiler error, should never happen.
	#[error("{0}")]
	InternalError(#[from] anyhow::Error),
	#[error(transparent)]
	ScanError(#[from] ScanError),
}

/// A malformed piece of input, reported at the line it starts on.
#[derive(thiserror::Error, Debug)]
#[error("[line {line}] Error: {type}")]
pub struct ScanError {
	line:   usize,
	r#type: ScanErrorType,
}

impl ScanError {
	pub fn new(line: usize, r#type: ScanErrorType) -> Self { Self { line, r#type } }
}

#[derive(Debug)]
pub enum ScanErrorType {
	UnexpectedCharacter(char),
	UnterminatedString,
	UnterminatedCharacter,
	UnknownEscape(char),
	EmptyCharacter,
	MultiCharacter,
	IntegerOutOfRange,
}

impl std::fmt::Display for ScanErrorType {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		use ScanErrorType::*;
		match self {
			UnexpectedCharacter(c) => write!(f, "Unexpected character '{c}'."),
			UnterminatedString => write!(f, "Unterminated string."),
			UnterminatedCharacter => write!(f, "Unterminated character literal."),
			UnknownEscape(c) => write!(f, "Unknown escape character: \\{c}."),
			EmptyCharacter => write!(f, "Empty character literal."),
			MultiCharacter => write!(f, "Character literal must be a single character."),
			IntegerOutOfRange => write!(f, "Integer literal out of range."),
		}
	}
}
