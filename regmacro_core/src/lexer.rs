use logos::Logos;

use crate::trivia::Trivia;
use crate::trivia::TriviaKind;
use crate::trivia::directive_keyword;

/// Raw tokens produced by logos when hunting for comments and directives.
///
/// Only the openers are tokenized. The bodies of comments and directives are
/// consumed by hand in [`TriviaWalker`] so that no pattern has to repeat up
/// to the end of a line. Literals are tokenized so that comment openers
/// inside them are not mistaken for trivia.
#[derive(Logos, Debug, PartialEq)]
#[logos(skip r#"[^/#"'@]+"#)]
enum RawToken {
	#[token("//")]
	LineCommentOpen,
	#[token("/*")]
	BlockCommentOpen,
	#[token("#")]
	Hash,
	#[regex(r#""([^"\\\n]|\\.)*""#)]
	StringLiteral,
	#[regex(r#"@"([^"]|"")*""#)]
	VerbatimStringLiteral,
	#[regex(r"'([^'\\\n]|\\.)'")]
	CharLiteral,
}

/// Walks the logos token stream and collects comment and region directive
/// spans.
struct TriviaWalker<'a> {
	content: &'a str,
	lexer: logos::Lexer<'a, RawToken>,
	trivia: Vec<Trivia>,
}

impl<'a> TriviaWalker<'a> {
	fn new(content: &'a str) -> Self {
		Self {
			content,
			lexer: RawToken::lexer(content),
			trivia: Vec::new(),
		}
	}

	fn process(mut self) -> Vec<Trivia> {
		while let Some(result) = self.lexer.next() {
			// Unrecognized bytes (a lone `/`, `'` or `@`, an unterminated
			// string) are not trivia.
			let Ok(raw) = result else {
				continue;
			};

			match raw {
				RawToken::LineCommentOpen => self.line_comment(),
				RawToken::BlockCommentOpen => self.block_comment(),
				RawToken::Hash => self.directive(),
				RawToken::StringLiteral
				| RawToken::VerbatimStringLiteral
				| RawToken::CharLiteral => {}
			}
		}

		self.trivia
	}

	fn line_comment(&mut self) {
		let start = self.lexer.span().start;
		let remainder = self.lexer.remainder();
		let len = remainder.find('\n').unwrap_or(remainder.len());
		self.lexer.bump(len);
		let end = trim_carriage_return(self.content, start, self.lexer.span().end);
		self.trivia
			.push(Trivia::new(TriviaKind::LineComment, start..end));
	}

	fn block_comment(&mut self) {
		let start = self.lexer.span().start;
		let remainder = self.lexer.remainder();

		// An unterminated block comment swallows the rest of the text.
		let Some(close) = memstr(remainder.as_bytes(), b"*/") else {
			self.lexer.bump(remainder.len());
			return;
		};

		self.lexer.bump(close + 2);
		self.trivia.push(Trivia::new(
			TriviaKind::BlockComment,
			start..self.lexer.span().end,
		));
	}

	fn directive(&mut self) {
		let start = self.lexer.span().start;
		let line_start = self.content[..start].rfind('\n').map_or(0, |idx| idx + 1);

		// Directives must be the first thing on their line.
		if !self.content[line_start..start].trim().is_empty() {
			return;
		}

		let remainder = self.lexer.remainder();
		let len = remainder.find('\n').unwrap_or(remainder.len());
		let end = trim_carriage_return(self.content, start, self.lexer.span().end + len);
		let line = &self.content[start..end];

		let kind = match directive_keyword(line) {
			Some(("region", _)) => TriviaKind::RegionDirective,
			Some(("endregion", _)) => TriviaKind::EndRegionDirective,
			_ => return,
		};

		self.lexer.bump(len);
		self.trivia.push(Trivia::new(kind, start..end));
	}
}

fn trim_carriage_return(content: &str, start: usize, end: usize) -> usize {
	if end > start && content.as_bytes()[end - 1] == b'\r' {
		end - 1
	} else {
		end
	}
}

/// Extract line comments, block comments and `#region` / `#endregion`
/// directives from C-family source text.
///
/// This is the fallback used when no host syntax layer supplies trivia. It
/// understands just enough of the surrounding language to skip string and
/// char literals, so it keeps working on text that would not parse.
pub fn extract_trivia(content: &str) -> Vec<Trivia> {
	TriviaWalker::new(content).process()
}

pub fn memstr(haystack: &[u8], needle: &[u8]) -> Option<usize> {
	haystack
		.windows(needle.len())
		.position(|window| window == needle)
}
