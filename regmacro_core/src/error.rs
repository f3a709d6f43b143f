use miette::Diagnostic;
use thiserror::Error;

#[derive(Debug, Diagnostic, Error)]
#[non_exhaustive]
pub enum MacroError {
	#[error(transparent)]
	#[diagnostic(code(regmacro::io_error))]
	Io(#[from] std::io::Error),

	#[error("failed to parse config file: {0}")]
	#[diagnostic(
		code(regmacro::config_parse),
		help(
			"check that regmacro.toml is valid TOML with [location_tag], [parse] and/or \
			 [diagnostics] sections"
		)
	)]
	ConfigParse(String),

	#[error("malformed trivia at index {index}: {reason}")]
	#[diagnostic(
		code(regmacro::malformed_trivia),
		help("trivia spans must be in bounds, sorted, non-overlapping and match their kind")
	)]
	MalformedTrivia { index: usize, reason: String },

	#[error("builder cannot be added as a child of its own descendant")]
	#[diagnostic(code(regmacro::builder_cycle))]
	BuilderCycle,

	#[error("builder is already a child of another builder")]
	#[diagnostic(
		code(regmacro::builder_already_attached),
		help("create a fresh builder for each child, a builder has exactly one parent")
	)]
	BuilderAlreadyAttached,
}

pub type MacroResult<T> = Result<T, MacroError>;
