use std::ops::Range;

use crate::LocationTag;
use crate::Position;
use crate::SourceText;
use crate::trivia::Trivia;
use crate::trivia::TriviaKind;
use crate::trivia::directive_keyword;

/// Keyword opening a macro block.
pub(crate) const START_KEYWORD: &str = "Macro";
/// Keyword closing a comment delimited macro block.
pub(crate) const END_KEYWORD: &str = "EndMacro";

/// What kind of marker a trivia span looks like.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CandidateKind {
	/// `#region Macro ...`
	RegionStart,
	/// `#region` with any other tag. It never becomes a block but its
	/// `#endregion` has to be matched.
	PlainRegionStart,
	/// `#endregion ...`
	RegionEnd,
	/// A comment whose trimmed content begins with `Macro`.
	CommentStart,
	/// A comment whose trimmed content is `EndMacro`, optionally followed by a
	/// location tag.
	CommentEnd,
}

/// A trivia span that may be a macro marker, along with the range of the tag
/// text the classifier should look at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarkerCandidate {
	pub kind: CandidateKind,
	pub trivia: TriviaKind,
	/// Position of the whole comment or directive.
	pub position: Position,
	/// Byte range of the trimmed tag text. For starts this begins at the
	/// `Macro` keyword, for comment ends at `EndMacro`, and for region ends
	/// it is whatever follows `#endregion` (possibly empty).
	pub content: Range<usize>,
}

/// A lazy scan over trivia spans yielding macro marker candidates in source
/// order. Cloning the scanner restarts it from the same place.
#[derive(Debug, Clone)]
pub struct MarkerScanner<'a> {
	source: &'a SourceText,
	trivia: std::slice::Iter<'a, Trivia>,
}

impl<'a> MarkerScanner<'a> {
	pub fn new(source: &'a SourceText, trivia: &'a [Trivia]) -> Self {
		Self {
			source,
			trivia: trivia.iter(),
		}
	}

	/// Skip every trivia span that starts before `offset`.
	#[must_use]
	pub fn starting_at(self, offset: usize) -> Self {
		let remaining = self.trivia.as_slice();
		let skip = remaining.partition_point(|item| item.range.start < offset);

		Self {
			source: self.source,
			trivia: remaining[skip..].iter(),
		}
	}

	fn candidate(&self, item: &Trivia) -> Option<MarkerCandidate> {
		let text = self.source.slice(item.range.clone())?;
		let base = item.range.start;

		let (kind, content) = match item.kind {
			TriviaKind::LineComment => {
				let inner = text.trim_start_matches('/');
				comment_candidate(base + (text.len() - inner.len()), inner)?
			}
			TriviaKind::BlockComment => {
				let inner = text.strip_prefix("/*")?.strip_suffix("*/")?;
				let leading = inner.len() - inner.trim_start_matches('*').len();
				let stripped = inner[leading..].trim_end_matches('*');
				comment_candidate(base + 2 + leading, stripped)?
			}
			TriviaKind::RegionDirective => {
				let (_, keyword_end) = directive_keyword(text)?;
				let content = trimmed_range(&text[keyword_end..], base + keyword_end);
				let tag = &self.source.as_str()[content.clone()];
				let kind = if starts_with_keyword(tag, START_KEYWORD, true) {
					CandidateKind::RegionStart
				} else {
					CandidateKind::PlainRegionStart
				};
				(kind, content)
			}
			TriviaKind::EndRegionDirective => {
				let (_, keyword_end) = directive_keyword(text)?;
				let content = trimmed_range(&text[keyword_end..], base + keyword_end);
				(CandidateKind::RegionEnd, content)
			}
		};

		Some(MarkerCandidate {
			kind,
			trivia: item.kind,
			position: self.source.position_of(item.range.clone()),
			content,
		})
	}
}

impl Iterator for MarkerScanner<'_> {
	type Item = MarkerCandidate;

	fn next(&mut self) -> Option<Self::Item> {
		loop {
			let item = self.trivia.next()?;
			if let Some(candidate) = self.candidate(item) {
				return Some(candidate);
			}
		}
	}
}

/// Scan `trivia` for macro marker candidates.
pub fn scan_markers<'a>(source: &'a SourceText, trivia: &'a [Trivia]) -> MarkerScanner<'a> {
	MarkerScanner::new(source, trivia)
}

/// Classify the inner text of a comment. `inner_offset` is the absolute byte
/// offset of `inner`.
fn comment_candidate(inner_offset: usize, inner: &str) -> Option<(CandidateKind, Range<usize>)> {
	let content = trimmed_range(inner, inner_offset);
	let trimmed = inner.trim();

	if starts_with_keyword(trimmed, START_KEYWORD, false) {
		Some((CandidateKind::CommentStart, content))
	} else if starts_with_keyword(trimmed, END_KEYWORD, false)
		&& is_end_suffix(&trimmed[END_KEYWORD.len()..])
	{
		Some((CandidateKind::CommentEnd, content))
	} else {
		None
	}
}

/// A comment end is `EndMacro` alone or followed by a single location tag.
/// Anything else is an ordinary comment.
fn is_end_suffix(rest: &str) -> bool {
	let rest = rest.trim();
	rest.is_empty() || (!rest.contains(char::is_whitespace) && LocationTag::parse(rest).is_some())
}

/// Whether `text` begins with `keyword` as a whole word.
pub(crate) fn starts_with_keyword(text: &str, keyword: &str, ignore_case: bool) -> bool {
	let Some(head) = text.get(..keyword.len()) else {
		return false;
	};

	let matches = if ignore_case {
		head.eq_ignore_ascii_case(keyword)
	} else {
		head == keyword
	};

	matches && text[keyword.len()..].chars().next().is_none_or(char::is_whitespace)
}

/// The absolute range of `text` with surrounding whitespace removed. An all
/// whitespace `text` yields an empty range at its start.
fn trimmed_range(text: &str, offset: usize) -> Range<usize> {
	if text.trim().is_empty() {
		return offset..offset;
	}

	let leading = text.len() - text.trim_start().len();
	let start = offset + leading;
	start..start + text.trim().len()
}
