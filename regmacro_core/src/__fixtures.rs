use std::fmt::Write;
use std::ops::Range;

use crate::*;

pub fn hello_world_region() -> &'static str {
	"#region Macro {{ Print \"Hello, World!\" 10 }}\n<code>\n#endregion\n"
}

/// A region block wrapping a block comment block wrapping a line comment
/// block.
pub fn mixed_nesting() -> &'static str {
	r#"#region Macro Outer
/* Macro Inner */
// Macro Line
// EndMacro
/* EndMacro */
#endregion
"#
}

/// The start marker sits on line 12 but its tag still says 9.
pub fn drifted_tag() -> String {
	let mut text = String::new();
	for line in 1..=11 {
		let _ = writeln!(text, "int a{line} = {line};");
	}
	text.push_str("#region Macro Print 1 #9\nbody\n#endregion #9\n");
	text
}

/// A four line header followed by `repetitions` units of two sibling marker
/// pairs (one comment pair, one region pair), each pair spanning eight lines.
pub fn repeated_sibling_pairs(repetitions: usize) -> String {
	let mut text = String::from("using System;\n\nnamespace Demo\n{\n");

	for repetition in 0..repetitions {
		let comment = repetition * 2;
		let region = comment + 1;
		let _ = writeln!(text, "    /* Macro Print \"Item {comment}\" */");
		let _ = writeln!(text, "    public void M{comment}() {{}}");
		text.push_str("    /* EndMacro */\n");
		for _ in 0..5 {
			text.push_str("    // filler\n");
		}
		let _ = writeln!(text, "    #region Macro Print \"Item {region}\"");
		let _ = writeln!(text, "    public void M{region}() {{}}");
		text.push_str("    #endregion\n");
		for _ in 0..5 {
			text.push_str("    // filler\n");
		}
	}

	text.push_str("}\n");
	text
}

pub fn parse_str(text: &str) -> MacroResult<DocumentRegionTree> {
	parse_document("Program.cs", &SourceText::new(text), &ParseOptions::default())
}

/// Classify the first marker candidate found in `text`.
pub fn classify_first(text: &str) -> Option<MarkerTag> {
	let source = SourceText::new(text);
	let trivia = extract_trivia(text);
	let candidate = scan_markers(&source, &trivia).next()?;
	classify(&candidate, &source)
}

pub fn start_marker(line: usize, body: &str) -> MarkerTag {
	MarkerTag {
		keyword: MarkerKeyword::MacroStart,
		syntax: MarkerSyntax::BlockComment,
		location_tag: None,
		body: Some(body.to_string()),
		position: Position::new(line, 1, 0, line, 1, 0),
		location_range: None,
		insert_offset: 0,
		malformed_location_tag: false,
	}
}

pub fn end_marker(line: usize) -> MarkerTag {
	MarkerTag {
		keyword: MarkerKeyword::MacroEnd,
		body: None,
		..start_marker(line, "")
	}
}

/// Check that every child lies between its parent's markers and that
/// siblings are ordered by their start.
pub fn assert_nested(blocks: &[RegionBlock]) {
	for pair in blocks.windows(2) {
		let (Some(first), Some(second)) = (pair[0].start(), pair[1].start()) else {
			continue;
		};
		assert!(first.position.start.offset < second.position.start.offset);
	}

	for block in blocks {
		let (Some(start), Some(end)) = (block.start(), block.end()) else {
			continue;
		};

		for child in block.children() {
			let child_start = child.start().map(|marker| marker.position).unwrap_or_default();
			assert!(start.position.end.offset <= child_start.start.offset);
			if let Some(child_end) = child.end() {
				assert!(child_end.position.end.offset <= end.position.start.offset);
			}
		}

		assert_nested(block.children());
	}
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FakeDeclaration {
	pub range: Range<usize>,
	pub kind: DeclarationKind,
	pub name: Option<&'static str>,
	pub type_name: Option<&'static str>,
}

/// A host syntax model that knows a flat list of declarations.
pub struct FakeSyntax {
	pub declarations: Vec<FakeDeclaration>,
}

impl DeclarationLookup for FakeSyntax {
	type Error = String;
	type Node = FakeDeclaration;

	fn declaration_at(&self, offset: usize) -> Result<Option<Self::Node>, Self::Error> {
		Ok(self
			.declarations
			.iter()
			.filter(|declaration| declaration.range.contains(&offset))
			.min_by_key(|declaration| declaration.range.len())
			.cloned())
	}

	fn kind(&self, node: &Self::Node) -> DeclarationKind {
		node.kind
	}

	fn identifier(&self, node: &Self::Node) -> Option<String> {
		node.name.map(String::from)
	}

	fn type_name(&self, node: &Self::Node) -> Option<String> {
		node.type_name.map(String::from)
	}
}

/// A host whose syntax model is unavailable.
pub struct BrokenSyntax;

impl DeclarationLookup for BrokenSyntax {
	type Error = String;
	type Node = ();

	fn declaration_at(&self, _offset: usize) -> Result<Option<Self::Node>, Self::Error> {
		Err("syntax tree unavailable".to_string())
	}

	fn kind(&self, _node: &Self::Node) -> DeclarationKind {
		DeclarationKind::Unknown
	}

	fn identifier(&self, _node: &Self::Node) -> Option<String> {
		None
	}

	fn type_name(&self, _node: &Self::Node) -> Option<String> {
		None
	}
}
