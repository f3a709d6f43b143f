use std::fmt::Display;
use std::ops::Range;

use serde::Deserialize;
use serde::Serialize;

use crate::Position;
use crate::SourceText;
use crate::scanner::CandidateKind;
use crate::scanner::END_KEYWORD;
use crate::scanner::MarkerCandidate;
use crate::scanner::START_KEYWORD;
use crate::trivia::TriviaKind;

/// Whether a marker opens or closes a macro block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MarkerKeyword {
	/// `Macro`
	MacroStart,
	/// `EndMacro`, or `#endregion` for region markers.
	MacroEnd,
}

/// The textual form a marker was written in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MarkerSyntax {
	/// `#region Macro ...` / `#endregion`
	Region,
	/// `// Macro ...` / `// EndMacro`
	LineComment,
	/// `/* Macro ... */` / `/* EndMacro */`
	BlockComment,
}

impl MarkerSyntax {
	/// Line and block comments share one nesting stack, regions have their
	/// own.
	pub fn is_region(self) -> bool {
		matches!(self, Self::Region)
	}
}

impl From<TriviaKind> for MarkerSyntax {
	fn from(kind: TriviaKind) -> Self {
		match kind {
			TriviaKind::LineComment => Self::LineComment,
			TriviaKind::BlockComment => Self::BlockComment,
			TriviaKind::RegionDirective | TriviaKind::EndRegionDirective => Self::Region,
		}
	}
}

/// A location tag written after a marker: `#<line>` or `#<file>#<line>`.
///
/// It records the line the marker was on the last time the tag was written,
/// so drift after edits can be detected.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LocationTag {
	/// `None` means "this file".
	pub file_path: Option<String>,
	pub line_identifier: usize,
}

impl LocationTag {
	pub fn new(line_identifier: usize) -> Self {
		Self {
			file_path: None,
			line_identifier,
		}
	}

	pub fn with_file(file_path: impl Into<String>, line_identifier: usize) -> Self {
		Self {
			file_path: Some(file_path.into()),
			line_identifier,
		}
	}

	/// Parse a single whitespace free token. Returns `None` for anything that
	/// is not exactly `#<digits>` or `#<path>#<digits>`.
	pub fn parse(token: &str) -> Option<Self> {
		let rest = token.strip_prefix('#')?;

		if let Some(line) = parse_digits(rest) {
			return Some(Self::new(line));
		}

		let (file_path, digits) = rest.rsplit_once('#')?;
		if file_path.is_empty() {
			return None;
		}

		Some(Self::with_file(file_path, parse_digits(digits)?))
	}

	/// Whether this tag still describes a marker currently on `line` of
	/// `current_file`.
	pub fn agrees_with(&self, line: usize, current_file: Option<&str>) -> bool {
		if self.line_identifier != line {
			return false;
		}

		match (&self.file_path, current_file) {
			(None, _) => true,
			(Some(path), Some(current)) => same_file(path, current),
			(Some(_), None) => false,
		}
	}
}

impl Display for LocationTag {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match &self.file_path {
			Some(path) => write!(f, "#{path}#{}", self.line_identifier),
			None => write!(f, "#{}", self.line_identifier),
		}
	}
}

fn parse_digits(text: &str) -> Option<usize> {
	if text.is_empty() || !text.bytes().all(|byte| byte.is_ascii_digit()) {
		return None;
	}

	text.parse().ok()
}

/// Paths are compared with normalized separators. A relative tag path matches
/// any current path that ends with it on a component boundary.
fn same_file(tag_path: &str, current: &str) -> bool {
	let tag_path = tag_path.replace('\\', "/");
	let current = current.replace('\\', "/");

	current == tag_path
		|| current
			.strip_suffix(tag_path.as_str())
			.is_some_and(|prefix| prefix.ends_with('/'))
}

/// A classified macro marker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarkerTag {
	pub keyword: MarkerKeyword,
	pub syntax: MarkerSyntax,
	pub location_tag: Option<LocationTag>,
	/// The raw macro invocation text. Only start markers carry a body.
	pub body: Option<String>,
	/// Position of the whole comment or directive.
	pub position: Position,
	/// Byte range of the written location tag, if there is one.
	pub location_range: Option<Range<usize>>,
	/// Byte offset at which a missing location tag is inserted.
	pub insert_offset: usize,
	/// Trailing text looked like a location tag but failed the digits
	/// grammar. It has been folded into the body.
	pub malformed_location_tag: bool,
}

impl MarkerTag {
	/// The 1-indexed line this marker starts on.
	pub fn line(&self) -> usize {
		self.position.start.line
	}

	pub fn is_start(&self) -> bool {
		matches!(self.keyword, MarkerKeyword::MacroStart)
	}

	/// A copy of this marker carrying `location_tag`. Offsets still refer to
	/// the text the marker was scanned from.
	#[must_use]
	pub fn with_location_tag(&self, location_tag: Option<LocationTag>) -> Self {
		Self {
			location_tag,
			..self.clone()
		}
	}
}

/// Classify a marker candidate. Returns `None` for `#region` directives that
/// are not macro markers. Classification never fails: trailing text that is
/// not a location tag becomes part of the body.
pub fn classify(candidate: &MarkerCandidate, source: &SourceText) -> Option<MarkerTag> {
	let content = candidate.content.clone();
	let text = source.slice(content.clone())?;

	let (keyword, keyword_len) = match candidate.kind {
		CandidateKind::PlainRegionStart => return None,
		CandidateKind::RegionStart | CandidateKind::CommentStart => {
			(MarkerKeyword::MacroStart, START_KEYWORD.len())
		}
		CandidateKind::CommentEnd => (MarkerKeyword::MacroEnd, END_KEYWORD.len()),
		CandidateKind::RegionEnd => (MarkerKeyword::MacroEnd, 0),
	};

	let rest_offset = content.start + keyword_len;
	let rest = &text[keyword_len..];
	let trailing = split_trailing_token(rest, rest_offset);

	let (location_tag, location_range, body_text, malformed_location_tag) = match trailing {
		Some((head, token, range)) => {
			match LocationTag::parse(token) {
				Some(tag) => (Some(tag), Some(range), head, false),
				None => (None, None, rest, token.starts_with('#')),
			}
		}
		None => (None, None, rest, false),
	};

	let syntax = MarkerSyntax::from(candidate.trivia);
	let body = match keyword {
		MarkerKeyword::MacroStart => Some(body_text.trim()).filter(|body| !body.is_empty()),
		MarkerKeyword::MacroEnd => None,
	};
	let body = body.map(|body| {
		match syntax {
			MarkerSyntax::BlockComment => strip_comment_gutter(body),
			MarkerSyntax::Region | MarkerSyntax::LineComment => body.to_string(),
		}
	});

	Some(MarkerTag {
		keyword,
		syntax,
		location_tag,
		body,
		position: candidate.position,
		location_range,
		insert_offset: content.end,
		malformed_location_tag,
	})
}

/// Split `text` into everything before its last whitespace separated token
/// and that token, with the token's absolute byte range.
fn split_trailing_token(text: &str, offset: usize) -> Option<(&str, &str, Range<usize>)> {
	let trimmed = text.trim_end();
	if trimmed.trim_start().is_empty() {
		return None;
	}

	let token_start = trimmed
		.char_indices()
		.rev()
		.find(|(_, ch)| ch.is_whitespace())
		.map_or(0, |(idx, ch)| idx + ch.len_utf8());

	Some((
		&trimmed[..token_start],
		&trimmed[token_start..],
		offset + token_start..offset + trimmed.len(),
	))
}

/// Drop the ` * ` gutter from the continuation lines of a multi-line block
/// comment body.
fn strip_comment_gutter(body: &str) -> String {
	let mut lines = body.lines();
	let mut cleaned = lines.next().unwrap_or_default().to_string();

	for line in lines {
		let line = line.trim_start();
		let line = line
			.strip_prefix('*')
			.map_or(line, |rest| rest.strip_prefix(' ').unwrap_or(rest));
		cleaned.push('\n');
		cleaned.push_str(line);
	}

	cleaned
}
