//! Lexical analysis: turns source text into a stream of classified tokens.
//!
//! The scanner walks the characters once, maximal-munch style. Whitespace
//! and `//` comments only advance the cursor (and the line counter); every
//! other lexeme becomes a [`Token`] that remembers its exact source slice.
//! Literal lexemes are converted here, so the parser receives living values:
//! `'\n'` arrives as a character, `"hi"` with the quotes already stripped,
//! `42` as a 64-bit integer and `4.2` as a double.
//!
//! Malformed input (an unterminated string, an unknown escape, a stray `@`)
//! is reported to the diagnostic sink and scanning resumes at the next
//! character, so one bad lexeme never hides the rest of the file. The
//! emitted stream always ends with exactly one end-of-file token.

mod token;

use std::{iter::Peekable, str::CharIndices};

use TokenType::*;
use anyhow::Context;
pub(crate) use token::*;

use crate::{error::{Diagnostics, scanner::{ScanError, ScanErrorType, ScannerError}}, utils::RcCell};

/// A scanner for source code.
pub(crate) struct Scanner<'a> {
	/// User input source code
	source:      &'a str,
	/// User input source code iterator
	source_iter: Peekable<CharIndices<'a>>,
	/// Points at the beginning of the current lexeme
	start:       usize,
	/// Points at the character currently being considered
	cursor:      usize,
	/// Tracks what source line `cursor` is on so we can produce tokens that
	/// know their location.
	line:        usize,
	/// Shared diagnostic sink
	diagnostics: RcCell<Diagnostics>,
}

impl<'a> Scanner<'a> {
	pub fn new(source: &'a str, diagnostics: RcCell<Diagnostics>) -> Self {
		let source_iter = source.char_indices().peekable();

		Self { source, source_iter, start: 0, cursor: 0, line: 1, diagnostics }
	}

	/// Scan all tokens from the source code.
	///
	/// Always produces a complete, end-of-file-terminated stream; malformed
	/// lexemes are recorded in the sink and skipped.
	pub fn scan_tokens(mut self) -> anyhow::Result<Vec<Token>> {
		let mut tokens = Vec::new();
		while let Some(&(index, _)) = self.source_iter.peek() {
			// We are at the beginning of the next lexeme.
			self.start = index;
			self.cursor = self.start;
			match self.scan_token(&mut tokens) {
				Err(ScannerError::ScanError(e)) => self.diagnostics.borrow_mut().scan_error(&e),
				Err(ScannerError::InternalError(e)) => return Err(e),
				Ok(_) => {}
			}
		}
		tokens.push(Token::new(Eof, "", self.line));
		Ok(tokens)
	}

	/// Scan a single token from the source code.
	fn scan_token(&mut self, tokens: &mut Vec<Token>) -> Result<(), ScannerError> {
		let next_char = self.advance().context("Unexpected EOF")?;
		#[rustfmt::skip]
		let r#type = match next_char {
			'(' => LeftParen,
			')' => RightParen,
			'{' => LeftBrace,
			'}' => RightBrace,
			',' => Comma,
			'.' => Dot,
			'-' => Minus,
			'+' => Plus,
			';' => Semicolon,
			':' => Colon,
			'*' => Star,
			'%' => Percent,
			'~' => Tilde,
			'^' => Caret,
			'?' => Question,
			'!' => if self.match_next('=') { BangEqual } else { Bang },
			'=' => if self.match_next('=') { EqualEqual } else { Equal },
			'<' => if self.match_next('=') { LessEqual } else if self.match_next('<') { LessLess } else { Less },
			'>' => if self.match_next('=') { GreaterEqual } else if self.match_next('>') { GreaterGreater } else { Greater },
			'&' => if self.match_next('&') { AmpersandAmpersand } else { Ampersand },
			'|' => if self.match_next('|') { PipePipe } else { Pipe },
			'/' => if self.match_next('/') {
				while self.peek().is_some_and(|c| c != '\n') { self.advance(); }
				Comment
			} else { Slash },
			' ' | '\r' | '\t' => EmptyChar,
			'\n' => { self.line += 1; NewLine }
			'"' => self.string()?,
			'\'' => self.character()?,
			c if c.is_ascii_digit() => self.number()?,
			c if c.is_ascii_alphabetic() || c == '_' => self.identifier(),
			_ => return Err(ScanError::new(self.line, ScanErrorType::UnexpectedCharacter(next_char)).into()),
		};

		if !r#type.is_ignored() {
			let lexeme = &self.source[self.start..self.cursor];
			tokens.push(Token::new(r#type, lexeme, self.line));
		}

		Ok(())
	}

	/// Match the next character if it is the expected one.
	fn match_next(&mut self, expected: char) -> bool {
		matches!(self.peek(), Some(c) if c == expected && { self.advance(); true })
	}

	/// Advance to the next character.
	fn advance(&mut self) -> Option<char> {
		let (i, c) = self.source_iter.next()?;
		self.cursor = i + c.len_utf8();
		Some(c)
	}

	/// Peek the current character.
	fn peek(&mut self) -> Option<char> { self.source_iter.peek().map(|&(_, c)| c) }

	/// Peek the second character ahead.
	fn peek_second(&mut self) -> Option<char> {
		let mut it = self.source_iter.clone();
		it.next()?;
		it.peek().map(|&(_, c)| c)
	}

	/// Scan a string literal. Newlines are allowed inside; escapes are kept
	/// as written.
	fn string(&mut self) -> Result<TokenType, ScannerError> {
		while let Some(c) = self.peek() {
			if c == '"' {
				break;
			}
			if c == '\n' {
				self.line += 1
			}
			self.advance();
		}

		self.peek().ok_or_else(|| ScanError::new(self.line, ScanErrorType::UnterminatedString))?;
		self.advance(); // The closing "
		let value = self.source[self.start + 1..self.cursor - 1].to_string();
		Ok(Str(value))
	}

	/// Scan a character literal: exactly one codepoint, or one escape from
	/// the fixed table, between single quotes.
	fn character(&mut self) -> Result<TokenType, ScannerError> {
		let mut c = match self.advance() {
			None => return Err(ScanError::new(self.line, ScanErrorType::UnterminatedCharacter).into()),
			Some('\'') => return Err(ScanError::new(self.line, ScanErrorType::EmptyCharacter).into()),
			Some(c) => c,
		};

		if c == '\\' {
			let esc = self
				.advance()
				.ok_or_else(|| ScanError::new(self.line, ScanErrorType::UnterminatedCharacter))?;
			c = match esc {
				'n' => '\n',
				't' => '\t',
				'r' => '\r',
				'b' => '\u{0008}',
				'f' => '\u{000C}',
				'v' => '\u{000B}',
				'0' => '\0',
				'\'' => '\'',
				'"' => '"',
				'\\' => '\\',
				_ => return Err(ScanError::new(self.line, ScanErrorType::UnknownEscape(esc)).into()),
			};
		}

		match self.peek() {
			None => Err(ScanError::new(self.line, ScanErrorType::UnterminatedCharacter).into()),
			Some('\'') => {
				self.advance(); // The closing '
				Ok(Character(c))
			}
			Some(_) => Err(ScanError::new(self.line, ScanErrorType::MultiCharacter).into()),
		}
	}

	/// Scan an integer or double literal. A dot only starts a fractional
	/// part when a digit follows it.
	fn number(&mut self) -> Result<TokenType, ScannerError> {
		while self.peek().is_some_and(|c| c.is_ascii_digit()) {
			self.advance();
		}

		if self.peek() == Some('.') && self.peek_second().is_some_and(|c| c.is_ascii_digit()) {
			self.advance(); // consume '.'
			while self.peek().is_some_and(|c| c.is_ascii_digit()) {
				self.advance();
			}
			let s = &self.source[self.start..self.cursor];
			return Ok(Double(s.parse().context("Failed to parse double literal")?));
		}

		let s = &self.source[self.start..self.cursor];
		match s.parse() {
			Ok(value) => Ok(Integer(value)),
			Err(_) => Err(ScanError::new(self.line, ScanErrorType::IntegerOutOfRange).into()),
		}
	}

	/// Scan an identifier or keyword.
	fn identifier(&mut self) -> TokenType {
		while self.peek().is_some_and(|c| c.is_ascii_alphanumeric() || c == '_') {
			self.advance();
		}
		let text = &self.source[self.start..self.cursor];
		TokenType::keyword_or_identifier(text)
	}
}
