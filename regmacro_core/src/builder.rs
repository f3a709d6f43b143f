use std::cell::RefCell;
use std::rc::Rc;
use std::rc::Weak;
use std::sync::Arc;

use crate::ErrorKind;
use crate::MacroError;
use crate::MacroResult;
use crate::MarkerTag;
use crate::RegionBlock;

#[derive(Debug, Default)]
struct BuilderNode {
	start: Option<MarkerTag>,
	end: Option<MarkerTag>,
	children: Vec<RegionBlockBuilder>,
	error: Option<ErrorKind>,
	parent: Weak<RefCell<BuilderNode>>,
}

/// Mutable staging node for a [`RegionBlock`].
///
/// A builder is a shared handle. Adding a child stores the handle rather than
/// a copy, so changes made to the child after it was added still show up
/// when the parent is frozen with [`build`](Self::build). Builders are
/// single-thread owned (`!Send`) until they are frozen.
#[derive(Debug, Clone, Default)]
pub struct RegionBlockBuilder(Rc<RefCell<BuilderNode>>);

impl RegionBlockBuilder {
	pub fn empty() -> Self {
		Self::default()
	}

	pub fn start(&self) -> Option<MarkerTag> {
		self.0.borrow().start.clone()
	}

	pub fn end(&self) -> Option<MarkerTag> {
		self.0.borrow().end.clone()
	}

	pub fn error(&self) -> Option<ErrorKind> {
		self.0.borrow().error
	}

	/// Handles to the current children, in insertion order.
	pub fn children(&self) -> Vec<RegionBlockBuilder> {
		self.0.borrow().children.clone()
	}

	pub fn child_count(&self) -> usize {
		self.0.borrow().children.len()
	}

	pub fn parent(&self) -> Option<RegionBlockBuilder> {
		self.0.borrow().parent.upgrade().map(Self)
	}

	pub fn set_start(&self, start: MarkerTag) {
		self.0.borrow_mut().start = Some(start);
	}

	pub fn set_end(&self, end: Option<MarkerTag>) {
		self.0.borrow_mut().end = end;
	}

	pub fn set_error(&self, error: Option<ErrorKind>) {
		self.0.borrow_mut().error = error;
	}

	#[must_use]
	pub fn with_start(self, start: MarkerTag) -> Self {
		self.set_start(start);
		self
	}

	#[must_use]
	pub fn with_end(self, end: MarkerTag) -> Self {
		self.set_end(Some(end));
		self
	}

	#[must_use]
	pub fn with_error(self, error: ErrorKind) -> Self {
		self.set_error(Some(error));
		self
	}

	/// Append `child` to this builder.
	///
	/// A builder has exactly one parent, and may not be added below itself.
	pub fn add_child(&self, child: &RegionBlockBuilder) -> MacroResult<()> {
		if child.parent().is_some() {
			return Err(MacroError::BuilderAlreadyAttached);
		}

		let mut ancestor = Some(self.clone());
		while let Some(current) = ancestor {
			if current.ptr_eq(child) {
				return Err(MacroError::BuilderCycle);
			}
			ancestor = current.parent();
		}

		child.0.borrow_mut().parent = Rc::downgrade(&self.0);
		self.0.borrow_mut().children.push(child.clone());

		Ok(())
	}

	pub fn with_add_child(self, child: &RegionBlockBuilder) -> MacroResult<Self> {
		self.add_child(child)?;
		Ok(self)
	}

	/// Freeze the current state of this builder and all of its descendants.
	///
	/// Every call takes a fresh snapshot, later mutations of the builder are
	/// never visible through a block returned earlier.
	pub fn build(&self) -> RegionBlock {
		let node = self.0.borrow();
		let children: Arc<[RegionBlock]> = node.children.iter().map(Self::build).collect();

		RegionBlock::new(node.start.clone(), node.end.clone(), children, node.error)
	}

	pub fn ptr_eq(&self, other: &Self) -> bool {
		Rc::ptr_eq(&self.0, &other.0)
	}
}
