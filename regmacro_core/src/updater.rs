use std::ops::Range;
use std::sync::Arc;

use crate::DocumentRegionTree;
use crate::LocationTag;
use crate::MarkerTag;
use crate::RegionBlock;
use crate::RegionBlockBuilder;
use crate::SourceText;
use crate::config::RegmacroConfig;

/// Options for [`update_location_tags`].
#[derive(Debug, Clone)]
pub struct UpdateOptions {
	/// Write a location tag on start markers that have none.
	pub add_missing_location_tag: bool,
}

impl Default for UpdateOptions {
	fn default() -> Self {
		Self {
			add_missing_location_tag: true,
		}
	}
}

impl UpdateOptions {
	pub fn from_config(config: Option<&RegmacroConfig>) -> Self {
		Self {
			add_missing_location_tag: config.is_none_or(|c| c.location_tag.add_missing),
		}
	}
}

/// Result of [`update_location_tags`].
#[derive(Debug, Clone)]
pub struct LocationTagUpdate {
	/// Whether any tag changed. When `false`, `tree` is the input tree.
	pub modified: bool,
	pub tree: Arc<[RegionBlock]>,
}

/// Rewrite the location tags of every block so that they agree with the
/// line of the block's start marker.
///
/// Blocks that need no change are returned as the very same nodes, only the
/// path from a changed block up to the top level is rebuilt. Running this on
/// its own output is a no-op.
pub fn update_location_tags(tree: &Arc<[RegionBlock]>, options: &UpdateOptions) -> LocationTagUpdate {
	match update_blocks(tree, options) {
		Some(tree) => {
			LocationTagUpdate {
				modified: true,
				tree,
			}
		}
		None => {
			LocationTagUpdate {
				modified: false,
				tree: tree.clone(),
			}
		}
	}
}

/// `None` when no block in `blocks` changed.
fn update_blocks(blocks: &Arc<[RegionBlock]>, options: &UpdateOptions) -> Option<Arc<[RegionBlock]>> {
	let updated: Vec<Option<RegionBlock>> = blocks
		.iter()
		.map(|block| update_block(block, options))
		.collect();

	if updated.iter().all(Option::is_none) {
		return None;
	}

	Some(
		blocks
			.iter()
			.zip(updated)
			.map(|(original, updated)| updated.unwrap_or_else(|| original.clone()))
			.collect(),
	)
}

fn update_block(block: &RegionBlock, options: &UpdateOptions) -> Option<RegionBlock> {
	let (start, end) = match block.start() {
		Some(start) => retag(start, block.end(), options),
		None => (None, None),
	};
	let children = update_blocks(block.shared_children(), options);

	if start.is_none() && end.is_none() && children.is_none() {
		return None;
	}

	Some(RegionBlock::new(
		start.or_else(|| block.start().cloned()),
		end.or_else(|| block.end().cloned()),
		children.unwrap_or_else(|| block.shared_children().clone()),
		block.error(),
	))
}

/// The tag the start marker should carry after an update.
fn resolved_start_tag(start: &MarkerTag, options: &UpdateOptions) -> Option<LocationTag> {
	let line = start.line();

	match &start.location_tag {
		Some(tag) if tag.line_identifier != line => {
			Some(LocationTag {
				file_path: tag.file_path.clone(),
				line_identifier: line,
			})
		}
		Some(tag) => Some(tag.clone()),
		None if options.add_missing_location_tag => Some(LocationTag::new(line)),
		None => None,
	}
}

/// Compute replacement start and end markers, `None` for each marker that is
/// already correct.
///
/// End markers never carry their own line, they always mirror the start's
/// tag. An untagged start still gives its end a `#<line>` tag.
fn retag(
	start: &MarkerTag,
	end: Option<&MarkerTag>,
	options: &UpdateOptions,
) -> (Option<MarkerTag>, Option<MarkerTag>) {
	let start_tag = resolved_start_tag(start, options);

	let end = end.and_then(|end| {
		let end_tag = start_tag
			.clone()
			.unwrap_or_else(|| LocationTag::new(start.line()));
		(end.location_tag.as_ref() != Some(&end_tag)).then(|| end.with_location_tag(Some(end_tag)))
	});
	let start = (start_tag != start.location_tag).then(|| start.with_location_tag(start_tag));

	if let Some(start) = &start {
		tracing::debug!(line = start.line(), tag = ?start.location_tag, "rewrote location tag");
	}

	(start, end)
}

impl RegionBlockBuilder {
	/// Apply the location tag update to this builder and its descendants in
	/// place, before freezing. Returns whether anything changed.
	pub fn update_location_tags(&self, options: &UpdateOptions) -> bool {
		let mut modified = false;

		if let Some(start) = self.start() {
			let end = self.end();
			let (new_start, new_end) = retag(&start, end.as_ref(), options);

			if let Some(new_start) = new_start {
				self.set_start(new_start);
				modified = true;
			}
			if let Some(new_end) = new_end {
				self.set_end(Some(new_end));
				modified = true;
			}
		}

		for child in self.children() {
			modified |= child.update_location_tags(options);
		}

		modified
	}
}

/// A replacement of `range` in a text buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextEdit {
	pub range: Range<usize>,
	pub replacement: String,
}

/// Text edits that turn the markers of `before` into the markers of `after`.
///
/// Both trees must have the same shape, as produced by
/// [`update_location_tags`]. Only location tag text is touched.
pub fn location_tag_edits(before: &[RegionBlock], after: &[RegionBlock]) -> Vec<TextEdit> {
	let mut edits = Vec::new();
	collect_edits(before, after, &mut edits);
	edits
}

fn collect_edits(before: &[RegionBlock], after: &[RegionBlock], edits: &mut Vec<TextEdit>) {
	for (old, new) in before.iter().zip(after) {
		if old.ptr_eq(new) {
			continue;
		}

		let markers = [(old.start(), new.start()), (old.end(), new.end())];
		for (old_marker, new_marker) in markers {
			if let (Some(old_marker), Some(new_marker)) = (old_marker, new_marker) {
				edits.extend(marker_edit(old_marker, new_marker));
			}
		}

		collect_edits(old.children(), new.children(), edits);
	}
}

fn marker_edit(before: &MarkerTag, after: &MarkerTag) -> Option<TextEdit> {
	if before.location_tag == after.location_tag {
		return None;
	}

	match (&before.location_range, &after.location_tag) {
		(Some(range), Some(tag)) => {
			Some(TextEdit {
				range: range.clone(),
				replacement: tag.to_string(),
			})
		}
		(Some(range), None) => {
			Some(TextEdit {
				range: range.clone(),
				replacement: String::new(),
			})
		}
		(None, Some(tag)) => {
			Some(TextEdit {
				range: before.insert_offset..before.insert_offset,
				replacement: format!(" {tag}"),
			})
		}
		(None, None) => None,
	}
}

/// Apply non-overlapping edits to `content`. Edits are applied from the end
/// of the text backwards so earlier replacements don't shift later ones.
pub fn apply_text_edits(content: &str, edits: &[TextEdit]) -> String {
	let mut sorted: Vec<&TextEdit> = edits.iter().collect();
	sorted.sort_by(|a, b| b.range.start.cmp(&a.range.start));

	let mut result = content.to_string();
	for edit in sorted {
		let Range { start, end } = edit.range;
		if start <= end && end <= result.len() {
			let mut buf = String::with_capacity(result.len() - (end - start) + edit.replacement.len());
			buf.push_str(&result[..start]);
			buf.push_str(&edit.replacement);
			buf.push_str(&result[end..]);
			result = buf;
		}
	}

	result
}

/// Result of updating the location tags of one document.
#[derive(Debug, Clone)]
pub struct DocumentUpdate {
	pub modified: bool,
	/// The updated tree. Marker offsets still refer to the original text,
	/// re-parse `content` for offsets into the rewritten text.
	pub document: DocumentRegionTree,
	pub edits: Vec<TextEdit>,
	/// The rewritten text, `None` when nothing changed.
	pub content: Option<String>,
}

/// Update the location tags of `document` and rewrite `source` to match.
pub fn compute_location_tag_update(
	document: &DocumentRegionTree,
	source: &SourceText,
	options: &UpdateOptions,
) -> DocumentUpdate {
	let update = update_location_tags(&document.tree, options);
	let edits = if update.modified {
		location_tag_edits(&document.tree, &update.tree)
	} else {
		Vec::new()
	};
	let content = (!edits.is_empty()).then(|| apply_text_edits(source.as_str(), &edits));

	DocumentUpdate {
		modified: update.modified,
		document: DocumentRegionTree {
			file_path: document.file_path.clone(),
			tree: update.tree,
			diagnostics: document.diagnostics.clone(),
		},
		edits,
		content,
	}
}
