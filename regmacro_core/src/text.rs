use std::ops::Range;
use std::sync::Arc;

use crate::Point;
use crate::Position;

/// An immutable snapshot of a text buffer with 1-based line/column addressing.
///
/// Line starts are computed once on construction so that every offset to
/// point conversion is a binary search instead of a rescan of the content.
/// Cloning is cheap, the content is shared.
#[derive(Debug, Clone)]
pub struct SourceText {
	content: Arc<str>,
	/// Byte offsets of the start of each line. `line_starts[0]` is always 0.
	line_starts: Arc<[usize]>,
}

impl SourceText {
	pub fn new(content: impl Into<Arc<str>>) -> Self {
		let content: Arc<str> = content.into();
		let mut line_starts = vec![0];
		for (i, byte) in content.bytes().enumerate() {
			if byte == b'\n' {
				line_starts.push(i + 1);
			}
		}

		Self {
			content,
			line_starts: line_starts.into(),
		}
	}

	pub fn as_str(&self) -> &str {
		&self.content
	}

	pub fn len(&self) -> usize {
		self.content.len()
	}

	pub fn is_empty(&self) -> bool {
		self.content.is_empty()
	}

	pub fn line_count(&self) -> usize {
		self.line_starts.len()
	}

	/// Convert a byte offset into a 1-indexed point. Offsets past the end are
	/// clamped to the end of the buffer.
	pub fn point_at(&self, offset: usize) -> Point {
		let offset = offset.min(self.content.len());
		let line_idx = match self.line_starts.binary_search(&offset) {
			Ok(exact) => exact,
			Err(insert) => insert.saturating_sub(1),
		};

		Point {
			line: line_idx + 1,
			column: offset - self.line_starts[line_idx] + 1,
			offset,
		}
	}

	pub fn position_of(&self, range: Range<usize>) -> Position {
		Position {
			start: self.point_at(range.start),
			end: self.point_at(range.end),
		}
	}

	/// Convert a 1-indexed line and column into a byte offset, or `None` when
	/// the location is outside the buffer.
	pub fn offset_of(&self, line: usize, column: usize) -> Option<usize> {
		let line_start = *self.line_starts.get(line.checked_sub(1)?)?;
		let offset = line_start + column.checked_sub(1)?;
		let line_end = self.line_end(line)?;
		(offset <= line_end).then_some(offset)
	}

	/// The text of a 1-indexed line without its trailing newline.
	pub fn line(&self, line: usize) -> Option<&str> {
		let start = *self.line_starts.get(line.checked_sub(1)?)?;
		let end = self.line_end(line)?;
		let text = &self.content[start..end];
		Some(text.strip_suffix('\r').unwrap_or(text))
	}

	/// Byte offset of the start of the line containing `offset`.
	pub fn line_start_of(&self, offset: usize) -> usize {
		let point = self.point_at(offset);
		self.line_starts[point.line - 1]
	}

	pub fn slice(&self, range: Range<usize>) -> Option<&str> {
		self.content.get(range)
	}

	fn line_end(&self, line: usize) -> Option<usize> {
		if line == 0 || line > self.line_starts.len() {
			return None;
		}

		Some(
			self.line_starts
				.get(line)
				.map_or(self.content.len(), |next| next - 1),
		)
	}
}

impl From<&str> for SourceText {
	fn from(value: &str) -> Self {
		Self::new(value)
	}
}

impl From<String> for SourceText {
	fn from(value: String) -> Self {
		Self::new(value)
	}
}
