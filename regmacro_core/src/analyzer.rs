use std::fmt::Display;

use crate::Descendants;
use crate::RegionBlock;

/// The kind of declaration a host lookup resolved to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum DeclarationKind {
	Namespace,
	Class,
	Struct,
	Interface,
	Enum,
	Record,
	Delegate,
	Method,
	Constructor,
	Property,
	Field,
	Event,
	/// Anything the analyzer does not know how to describe.
	Unknown,
}

/// Host capability for finding the declaration a macro block decorates.
pub trait DeclarationLookup {
	/// The host's declaration handle.
	type Node: Clone;
	type Error: Display;

	/// The smallest declaration enclosing `offset`, if there is one. Markers
	/// are leading trivia, so hosts should map an offset inside trivia to the
	/// declaration the trivia is attached to.
	fn declaration_at(&self, offset: usize) -> Result<Option<Self::Node>, Self::Error>;

	fn kind(&self, node: &Self::Node) -> DeclarationKind;

	fn identifier(&self, node: &Self::Node) -> Option<String>;

	/// The declared type, for declarations that have one (fields,
	/// properties, method return types).
	fn type_name(&self, node: &Self::Node) -> Option<String>;
}

/// Presentation details of the declaration a block decorates. Every field is
/// empty when the lookup found nothing it could describe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegionBlockInformation<N> {
	pub node: Option<N>,
	pub identifier: Option<String>,
	pub type_name: Option<String>,
}

impl<N> RegionBlockInformation<N> {
	pub fn empty() -> Self {
		Self {
			node: None,
			identifier: None,
			type_name: None,
		}
	}

	pub fn is_empty(&self) -> bool {
		self.node.is_none() && self.identifier.is_none() && self.type_name.is_none()
	}
}

impl<N> Default for RegionBlockInformation<N> {
	fn default() -> Self {
		Self::empty()
	}
}

/// Describe the declaration `block` decorates. Lookup failures and
/// unrecognized declarations yield [`RegionBlockInformation::empty`].
pub fn analyze_block<L>(block: &RegionBlock, lookup: &L) -> RegionBlockInformation<L::Node>
where
	L: DeclarationLookup,
{
	let Some(start) = block.start() else {
		return RegionBlockInformation::empty();
	};

	let node = match lookup.declaration_at(start.position.start.offset) {
		Ok(Some(node)) => node,
		Ok(None) => return RegionBlockInformation::empty(),
		Err(error) => {
			tracing::debug!(line = start.line(), %error, "declaration lookup failed");
			return RegionBlockInformation::empty();
		}
	};

	if lookup.kind(&node) == DeclarationKind::Unknown {
		return RegionBlockInformation::empty();
	}

	RegionBlockInformation {
		identifier: lookup.identifier(&node),
		type_name: lookup.type_name(&node),
		node: Some(node),
	}
}

/// Analyze every block of a tree in pre-order.
pub fn analyze_tree<'a, L>(
	blocks: &'a [RegionBlock],
	lookup: &L,
) -> Vec<(&'a RegionBlock, RegionBlockInformation<L::Node>)>
where
	L: DeclarationLookup,
{
	Descendants::of(blocks)
		.map(|block| (block, analyze_block(block, lookup)))
		.collect()
}
