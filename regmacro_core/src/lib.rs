//! `regmacro_core` finds macro markers embedded in source text, pairs them
//! into an immutable tree of blocks, and keeps the location tags written on
//! those markers in step with the lines they sit on.
//!
//! Two marker syntaxes are recognized in the same document:
//!
//! ```text
//! #region Macro {{ Print "Hello, World!" 10 }} #12
//! ...
//! #endregion #12
//!
//! /* Macro Print "Hello" #20 */
//! ...
//! /* EndMacro #20 */
//! ```
//!
//! ## Processing Pipeline
//!
//! ```text
//! Source text
//!   -> Trivia (host supplied, or the built-in lexer)
//!   -> Scanner (comment / region spans that look like markers)
//!   -> Classifier (keyword, body, location tag)
//!   -> Builder (one nesting stack per marker syntax)
//!   -> Frozen RegionBlock tree (DocumentRegionTree)
//!   -> Location tag updater / analyzer / diagnostics
//! ```
//!
//! ## Quick Start
//!
//! ```rust
//! use regmacro_core::*;
//!
//! let source = SourceText::new("#region Macro Print 1\nbody\n#endregion\n");
//! let document = parse_document("Program.cs", &source, &ParseOptions::default()).unwrap();
//! assert_eq!(document.len(), 1);
//!
//! let update = compute_location_tag_update(&document, &source, &UpdateOptions::default());
//! assert_eq!(
//! 	update.content.as_deref(),
//! 	Some("#region Macro Print 1 #1\nbody\n#endregion #1\n")
//! );
//! ```

pub use analyzer::*;
pub use block::*;
pub use builder::*;
pub use config::*;
pub use diagnostics::*;
pub use error::*;
pub use lexer::extract_trivia;
pub use marker::*;
pub use parser::*;
pub use position::*;
pub use scanner::*;
pub use text::*;
pub use trivia::*;
pub use updater::*;

mod analyzer;
mod block;
mod builder;
pub mod config;
mod diagnostics;
#[allow(unused_assignments)]
mod error;
pub(crate) mod lexer;
mod marker;
mod parser;
mod position;
mod scanner;
mod text;
mod trivia;
mod updater;

#[cfg(test)]
mod __fixtures;
