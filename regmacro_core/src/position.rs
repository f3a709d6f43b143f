use std::fmt::Display;

use serde::Deserialize;
use serde::Serialize;

/// A single location in a text buffer.
///
/// `line` and `column` are 1-indexed, `column` counts bytes from the start of
/// the line. `offset` is the 0-indexed byte offset from the start of the
/// buffer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Point {
	pub line: usize,
	pub column: usize,
	pub offset: usize,
}

impl Point {
	pub fn new(line: usize, column: usize, offset: usize) -> Self {
		Self {
			line,
			column,
			offset,
		}
	}

	/// Move this point forward over `text`, tracking newlines.
	pub fn advance_str(&mut self, text: &str) {
		for byte in text.bytes() {
			self.offset += 1;
			if byte == b'\n' {
				self.line += 1;
				self.column = 1;
			} else {
				self.column += 1;
			}
		}
	}
}

impl Display for Point {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		write!(f, "{}:{}", self.line, self.column)
	}
}

/// A half-open span `[start, end)` in a text buffer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Position {
	pub start: Point,
	pub end: Point,
}

impl Position {
	pub fn new(
		start_line: usize,
		start_column: usize,
		start_offset: usize,
		end_line: usize,
		end_column: usize,
		end_offset: usize,
	) -> Self {
		Self {
			start: Point::new(start_line, start_column, start_offset),
			end: Point::new(end_line, end_column, end_offset),
		}
	}

	/// The byte range covered by this position.
	pub fn range(&self) -> std::ops::Range<usize> {
		self.start.offset..self.end.offset
	}

	/// Whether `other` lies entirely within this position.
	pub fn contains(&self, other: &Position) -> bool {
		self.start.offset <= other.start.offset && other.end.offset <= self.end.offset
	}
}

impl Display for Position {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		write!(f, "{}-{}", self.start, self.end)
	}
}
