use std::ops::Range;
use std::sync::Arc;

use serde::Deserialize;
use serde::Serialize;

use crate::MarkerTag;

/// A structural problem attached to a block or reported for a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[non_exhaustive]
pub enum ErrorKind {
	/// A start marker with no matching end by the end of the document.
	Unterminated,
	/// An end marker with no open start. Only reported at document level, no
	/// block is produced.
	UnmatchedEnd,
	/// Trailing tag-like text failed the location tag grammar. Only reported
	/// when strict location tags are requested.
	MalformedLocationTag,
	/// The block was still open when an enclosing block of the other marker
	/// syntax was closed.
	OutOfOrder,
}

impl std::fmt::Display for ErrorKind {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			Self::Unterminated => write!(f, "unterminated"),
			Self::UnmatchedEnd => write!(f, "unmatched end"),
			Self::MalformedLocationTag => write!(f, "malformed location tag"),
			Self::OutOfOrder => write!(f, "out of order"),
		}
	}
}

/// A frozen macro block.
///
/// Blocks are immutable and cheap to clone: a clone shares the same node. Any
/// change produces a new block that shares every unchanged child with the
/// original, see [`RegionBlock::ptr_eq`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RegionBlock(Arc<RegionBlockData>);

#[derive(Debug, PartialEq, Serialize, Deserialize)]
struct RegionBlockData {
	start: Option<MarkerTag>,
	end: Option<MarkerTag>,
	children: Arc<[RegionBlock]>,
	error: Option<ErrorKind>,
}

impl RegionBlock {
	pub(crate) fn new(
		start: Option<MarkerTag>,
		end: Option<MarkerTag>,
		children: Arc<[RegionBlock]>,
		error: Option<ErrorKind>,
	) -> Self {
		Self(Arc::new(RegionBlockData {
			start,
			end,
			children,
			error,
		}))
	}

	/// The start marker. Only the synthetic root built from an empty builder
	/// has none.
	pub fn start(&self) -> Option<&MarkerTag> {
		self.0.start.as_ref()
	}

	pub fn end(&self) -> Option<&MarkerTag> {
		self.0.end.as_ref()
	}

	pub fn children(&self) -> &[RegionBlock] {
		&self.0.children
	}

	pub(crate) fn shared_children(&self) -> &Arc<[RegionBlock]> {
		&self.0.children
	}

	pub fn error(&self) -> Option<ErrorKind> {
		self.0.error
	}

	/// The macro invocation text of the start marker.
	pub fn body(&self) -> Option<&str> {
		self.start()?.body.as_deref()
	}

	/// The 1-indexed line of the start marker.
	pub fn line(&self) -> Option<usize> {
		self.start().map(MarkerTag::line)
	}

	/// Byte range of the text between the start and end markers.
	pub fn content_range(&self) -> Option<Range<usize>> {
		let start = self.start()?.position.end.offset;
		let end = self.end()?.position.start.offset;
		(start <= end).then_some(start..end)
	}

	/// Whether both handles point at the same frozen node.
	pub fn ptr_eq(&self, other: &Self) -> bool {
		Arc::ptr_eq(&self.0, &other.0)
	}

	/// Pre-order walk over this block and all of its descendants.
	pub fn descendants(&self) -> Descendants<'_> {
		Descendants {
			stack: vec![self],
		}
	}
}

impl PartialEq for RegionBlock {
	fn eq(&self, other: &Self) -> bool {
		self.ptr_eq(other) || self.0 == other.0
	}
}

impl Eq for RegionBlock {}

/// Pre-order iterator over blocks, yielding parents before their children
/// and siblings in source order.
#[derive(Debug, Clone)]
pub struct Descendants<'a> {
	stack: Vec<&'a RegionBlock>,
}

impl<'a> Descendants<'a> {
	/// Walk a forest of top-level blocks.
	pub fn of(blocks: &'a [RegionBlock]) -> Self {
		Self {
			stack: blocks.iter().rev().collect(),
		}
	}
}

impl<'a> Iterator for Descendants<'a> {
	type Item = &'a RegionBlock;

	fn next(&mut self) -> Option<Self::Item> {
		let block = self.stack.pop()?;
		self.stack.extend(block.children().iter().rev());
		Some(block)
	}
}
