use std::sync::Arc;
use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering;

use derive_more::Deref;
use serde::Deserialize;
use serde::Serialize;

use crate::Descendants;
use crate::ErrorKind;
use crate::MacroResult;
use crate::MarkerKeyword;
use crate::MarkerSyntax;
use crate::MarkerTag;
use crate::Position;
use crate::RegionBlock;
use crate::RegionBlockBuilder;
use crate::SourceText;
use crate::config::RegmacroConfig;
use crate::lexer::extract_trivia;
use crate::marker::classify;
use crate::scanner::CandidateKind;
use crate::scanner::scan_markers;
use crate::trivia::Trivia;
use crate::trivia::validate_trivia;

/// Options controlling how markers are parsed.
#[derive(Debug, Clone, Default)]
pub struct ParseOptions {
	/// Report tag-like trailing text that fails the location tag grammar as
	/// [`ErrorKind::MalformedLocationTag`] instead of silently folding it
	/// into the body.
	pub strict_location_tags: bool,
}

impl ParseOptions {
	pub fn from_config(config: Option<&RegmacroConfig>) -> Self {
		Self {
			strict_location_tags: config.is_some_and(|c| c.parse.strict_location_tags),
		}
	}
}

/// A problem found while parsing. These never stop parsing, they describe
/// markers that could not be paired cleanly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParseDiagnostic {
	pub kind: ErrorKind,
	pub syntax: MarkerSyntax,
	/// Position of the marker the problem was found on.
	pub position: Position,
}

impl ParseDiagnostic {
	/// 1-indexed line number.
	pub fn line(&self) -> usize {
		self.position.start.line
	}

	/// 1-indexed column number.
	pub fn column(&self) -> usize {
		self.position.start.column
	}

	/// Human-readable message for this diagnostic.
	pub fn message(&self) -> String {
		match self.kind {
			ErrorKind::Unterminated => "macro block is never closed".to_string(),
			ErrorKind::UnmatchedEnd => "end marker has no matching start marker".to_string(),
			ErrorKind::MalformedLocationTag => {
				"trailing location tag is not `#<line>` or `#<file>#<line>`".to_string()
			}
			ErrorKind::OutOfOrder => {
				"macro block is still open when its enclosing block is closed".to_string()
			}
		}
	}
}

/// The parsed macro blocks of one document.
///
/// This is replaced wholesale on every parse or location tag update, it is
/// never mutated in place.
#[derive(Debug, Clone, PartialEq, Eq, Deref, Serialize, Deserialize)]
pub struct DocumentRegionTree {
	pub file_path: String,
	/// Top-level blocks in source order.
	#[deref]
	pub tree: Arc<[RegionBlock]>,
	/// Problems found while pairing markers, in the order they were found.
	pub diagnostics: Vec<ParseDiagnostic>,
}

impl DocumentRegionTree {
	/// Pre-order walk over every block in the document.
	pub fn blocks(&self) -> Descendants<'_> {
		Descendants::of(&self.tree)
	}

	/// Blocks whose start marker carries a location tag that no longer agrees
	/// with the line the marker is on.
	pub fn stale_blocks(&self) -> impl Iterator<Item = &RegionBlock> {
		self.blocks().filter(|block| {
			block.start().is_some_and(|start| {
				start
					.location_tag
					.as_ref()
					.is_some_and(|tag| !tag.agrees_with(start.line(), Some(&self.file_path)))
			})
		})
	}

	pub fn has_errors(&self) -> bool {
		!self.diagnostics.is_empty()
	}
}

/// Parse a document using the built-in trivia lexer.
pub fn parse_document(
	file_path: impl Into<String>,
	source: &SourceText,
	options: &ParseOptions,
) -> MacroResult<DocumentRegionTree> {
	let trivia = extract_trivia(source.as_str());
	build_document(file_path.into(), source, &trivia, options)
}

/// Parse a document using comment and region directive spans supplied by a
/// host syntax layer. Malformed trivia fails this document only.
pub fn parse_document_with_trivia(
	file_path: impl Into<String>,
	source: &SourceText,
	trivia: &[Trivia],
	options: &ParseOptions,
) -> MacroResult<DocumentRegionTree> {
	validate_trivia(source.as_str(), trivia)?;
	build_document(file_path.into(), source, trivia, options)
}

#[tracing::instrument(level = "debug", skip_all, fields(file_path = %file_path))]
fn build_document(
	file_path: String,
	source: &SourceText,
	trivia: &[Trivia],
	options: &ParseOptions,
) -> MacroResult<DocumentRegionTree> {
	let mut stack = BlockStack::new(options);

	for candidate in scan_markers(source, trivia) {
		if candidate.kind == CandidateKind::PlainRegionStart {
			stack.open_plain_region();
			continue;
		}

		let Some(marker) = classify(&candidate, source) else {
			continue;
		};

		tracing::trace!(
			keyword = ?marker.keyword,
			syntax = ?marker.syntax,
			line = marker.line(),
			"marker"
		);

		match marker.keyword {
			MarkerKeyword::MacroStart => stack.open(marker)?,
			MarkerKeyword::MacroEnd => stack.close(marker),
		}
	}

	let (tree, diagnostics) = stack.finish();

	Ok(DocumentRegionTree {
		file_path,
		tree,
		diagnostics,
	})
}

/// An entry on the open block list. Plain `#region`s have no builder, they
/// only hold their place so that their `#endregion` pairs with them.
struct OpenBlock {
	region: bool,
	builder: Option<RegionBlockBuilder>,
	position: Position,
}

/// Tracks open blocks in the order they were opened.
///
/// Region markers and comment markers pair independently: an end marker
/// closes the innermost open block of its own syntax, which is the view of a
/// per-syntax stack over the shared list. New blocks become children of the
/// innermost open block of either syntax.
struct BlockStack {
	root: RegionBlockBuilder,
	open: Vec<OpenBlock>,
	diagnostics: Vec<ParseDiagnostic>,
	strict_location_tags: bool,
}

impl BlockStack {
	fn new(options: &ParseOptions) -> Self {
		Self {
			root: RegionBlockBuilder::empty(),
			open: Vec::new(),
			diagnostics: Vec::new(),
			strict_location_tags: options.strict_location_tags,
		}
	}

	fn innermost(&self) -> RegionBlockBuilder {
		self.open
			.iter()
			.rev()
			.find_map(|entry| entry.builder.clone())
			.unwrap_or_else(|| self.root.clone())
	}

	fn open_plain_region(&mut self) {
		self.open.push(OpenBlock {
			region: true,
			builder: None,
			position: Position::default(),
		});
	}

	fn open(&mut self, marker: MarkerTag) -> MacroResult<()> {
		let parent = self.innermost();
		let builder = RegionBlockBuilder::empty();
		self.check_location_tag(&builder, &marker);

		let region = marker.syntax.is_region();
		let position = marker.position;
		builder.set_start(marker);
		parent.add_child(&builder)?;

		self.open.push(OpenBlock {
			region,
			builder: Some(builder),
			position,
		});

		Ok(())
	}

	fn close(&mut self, marker: MarkerTag) {
		let region = marker.syntax.is_region();
		let Some(idx) = self.open.iter().rposition(|entry| entry.region == region) else {
			tracing::debug!(line = marker.line(), "end marker without a matching start");
			self.report(ErrorKind::UnmatchedEnd, marker.syntax, marker.position);
			return;
		};

		let entry = self.open.remove(idx);

		// Blocks opened after the closed one are of the other syntax and would
		// outlive their enclosing block. They are finished here without an
		// end, so every child still ends inside its parent. Plain regions
		// enclose nothing and stay open.
		if entry.builder.is_some() {
			let (straddling, plain): (Vec<OpenBlock>, Vec<OpenBlock>) = self
				.open
				.drain(idx..)
				.partition(|open| open.builder.is_some());
			self.open.extend(plain);

			for open in straddling {
				let Some(builder) = open.builder else {
					continue;
				};

				tracing::debug!(line = open.position.start.line, "block closed out of order");
				builder.set_end(None);
				builder.set_error(Some(ErrorKind::OutOfOrder));
				self.report(ErrorKind::OutOfOrder, marker_syntax_of(&builder), open.position);
			}
		}

		if let Some(builder) = entry.builder {
			self.check_location_tag(&builder, &marker);
			builder.set_end(Some(marker));
		}
	}

	fn check_location_tag(&mut self, builder: &RegionBlockBuilder, marker: &MarkerTag) {
		if !self.strict_location_tags || !marker.malformed_location_tag {
			return;
		}

		if builder.error().is_none() {
			builder.set_error(Some(ErrorKind::MalformedLocationTag));
		}
		self.report(ErrorKind::MalformedLocationTag, marker.syntax, marker.position);
	}

	fn report(&mut self, kind: ErrorKind, syntax: MarkerSyntax, position: Position) {
		self.diagnostics.push(ParseDiagnostic {
			kind,
			syntax,
			position,
		});
	}

	fn finish(mut self) -> (Arc<[RegionBlock]>, Vec<ParseDiagnostic>) {
		let pending = std::mem::take(&mut self.open);

		for entry in pending {
			let Some(builder) = entry.builder else {
				continue;
			};

			tracing::debug!(line = entry.position.start.line, "unterminated macro block");
			builder.set_end(None);
			builder.set_error(Some(ErrorKind::Unterminated));
			let syntax = marker_syntax_of(&builder);
			self.report(ErrorKind::Unterminated, syntax, entry.position);
		}

		let root = self.root.build();
		(root.shared_children().clone(), self.diagnostics)
	}
}

fn marker_syntax_of(builder: &RegionBlockBuilder) -> MarkerSyntax {
	builder
		.start()
		.map_or(MarkerSyntax::BlockComment, |start| start.syntax)
}

/// A document handed to [`parse_documents`].
#[derive(Debug, Clone)]
pub struct DocumentInput {
	pub file_path: String,
	pub source: SourceText,
	/// Host supplied trivia. When `None` the built-in lexer is used.
	pub trivia: Option<Vec<Trivia>>,
}

impl DocumentInput {
	pub fn new(file_path: impl Into<String>, source: impl Into<SourceText>) -> Self {
		Self {
			file_path: file_path.into(),
			source: source.into(),
			trivia: None,
		}
	}

	#[must_use]
	pub fn with_trivia(mut self, trivia: Vec<Trivia>) -> Self {
		self.trivia = Some(trivia);
		self
	}
}

/// The outcome of parsing one document in a batch.
#[derive(Debug)]
pub struct DocumentParse {
	pub file_path: String,
	pub result: MacroResult<DocumentRegionTree>,
}

/// Parse several documents independently.
///
/// A fatal failure only affects its own document. `cancelled` is checked
/// between documents, never during one, and documents after a cancellation
/// are left out of the result.
pub fn parse_documents<I>(
	documents: I,
	options: &ParseOptions,
	cancelled: &AtomicBool,
) -> Vec<DocumentParse>
where
	I: IntoIterator<Item = DocumentInput>,
{
	let mut results = Vec::new();

	for document in documents {
		if cancelled.load(Ordering::Relaxed) {
			tracing::debug!("document batch cancelled");
			break;
		}

		let result = match &document.trivia {
			Some(trivia) => {
				parse_document_with_trivia(
					document.file_path.clone(),
					&document.source,
					trivia,
					options,
				)
			}
			None => parse_document(document.file_path.clone(), &document.source, options),
		};

		if let Err(error) = &result {
			tracing::debug!(file_path = %document.file_path, %error, "document failed to parse");
		}

		results.push(DocumentParse {
			file_path: document.file_path,
			result,
		});
	}

	results
}
