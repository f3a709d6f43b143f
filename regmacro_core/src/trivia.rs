use std::ops::Range;

use serde::Deserialize;
use serde::Serialize;

use crate::MacroError;
use crate::MacroResult;

/// The kind of a comment or directive span supplied by a host syntax layer
/// (or by [`extract_trivia`](crate::extract_trivia)).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TriviaKind {
	/// `// ...` up to, but excluding, the newline.
	LineComment,
	/// `/* ... */` including both delimiters.
	BlockComment,
	/// `#region ...` up to, but excluding, the newline.
	RegionDirective,
	/// `#endregion ...` up to, but excluding, the newline.
	EndRegionDirective,
}

/// A comment or region directive span in a text buffer.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Trivia {
	pub kind: TriviaKind,
	/// Byte range of the whole comment or directive.
	pub range: Range<usize>,
}

impl Trivia {
	pub fn new(kind: TriviaKind, range: Range<usize>) -> Self {
		Self { kind, range }
	}
}

/// Check that host supplied trivia can be scanned against `content`.
///
/// Every span must lie on char boundaries inside the buffer, spans must be
/// sorted and must not overlap, and each span must carry the delimiters of its
/// kind.
pub fn validate_trivia(content: &str, trivia: &[Trivia]) -> MacroResult<()> {
	let mut previous_end = 0;

	for (index, item) in trivia.iter().enumerate() {
		let malformed = |reason: &str| {
			MacroError::MalformedTrivia {
				index,
				reason: reason.to_string(),
			}
		};

		if item.range.start > item.range.end {
			return Err(malformed("span start is after span end"));
		}

		let Some(text) = content.get(item.range.clone()) else {
			return Err(malformed("span is out of bounds or not on a char boundary"));
		};

		if item.range.start < previous_end {
			return Err(malformed("span overlaps or precedes the previous span"));
		}
		previous_end = item.range.end;

		let well_formed = match item.kind {
			TriviaKind::LineComment => text.starts_with("//") && !text.contains('\n'),
			TriviaKind::BlockComment => {
				text.len() >= 4 && text.starts_with("/*") && text.ends_with("*/")
			}
			TriviaKind::RegionDirective => {
				directive_keyword(text).is_some_and(|(keyword, _)| keyword == "region")
			}
			TriviaKind::EndRegionDirective => {
				directive_keyword(text).is_some_and(|(keyword, _)| keyword == "endregion")
			}
		};

		if !well_formed {
			return Err(malformed(&format!("span does not look like a {:?}", item.kind)));
		}
	}

	Ok(())
}

/// Split a directive line into its keyword (`region` / `endregion`) and the
/// byte offset (relative to `text`) at which the keyword ends.
pub(crate) fn directive_keyword(text: &str) -> Option<(&str, usize)> {
	if text.contains('\n') {
		return None;
	}

	let leading = text.len() - text.trim_start().len();
	let after_hash = text[leading..].strip_prefix('#')?;
	let hash_end = leading + 1;
	let keyword_start = hash_end + (after_hash.len() - after_hash.trim_start_matches([' ', '\t']).len());
	let rest = &text[keyword_start..];

	for keyword in ["endregion", "region"] {
		let Some(after) = rest.strip_prefix(keyword) else {
			continue;
		};

		if after.is_empty() || after.starts_with(char::is_whitespace) {
			return Some((keyword, keyword_start + keyword.len()));
		}
	}

	None
}
