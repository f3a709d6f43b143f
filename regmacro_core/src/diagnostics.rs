use miette::LabeledSpan;
use miette::MietteDiagnostic;
use miette::NamedSource;
use serde::Deserialize;
use serde::Serialize;

use crate::DocumentRegionTree;
use crate::Position;
use crate::SourceText;
use crate::config::RegmacroConfig;

/// Stable identifier of the diagnostic reported for every macro block.
pub const MACRO_BLOCK_DIAGNOSTIC_ID: &str = "RM0001";
const MACRO_BLOCK_DIAGNOSTIC_CODE: &str = "regmacro::macro_block";

/// Severity of the per-block diagnostic.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
	Error,
	Warning,
	#[default]
	Info,
	/// Diagnostics are not reported at all.
	Hidden,
}

impl Severity {
	pub fn to_miette(self) -> Option<miette::Severity> {
		match self {
			Self::Error => Some(miette::Severity::Error),
			Self::Warning => Some(miette::Severity::Warning),
			Self::Info => Some(miette::Severity::Advice),
			Self::Hidden => None,
		}
	}
}

/// Options for [`collect_macro_diagnostics`].
#[derive(Debug, Clone, Default)]
pub struct DiagnosticOptions {
	pub severity: Severity,
}

impl DiagnosticOptions {
	pub fn from_config(config: Option<&RegmacroConfig>) -> Self {
		Self {
			severity: config.map(|c| c.diagnostics.severity).unwrap_or_default(),
		}
	}
}

/// A diagnostic pointing at the start marker of a macro block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MacroDiagnostic {
	pub id: &'static str,
	pub severity: Severity,
	pub file_path: String,
	/// Position of the start marker.
	pub position: Position,
	pub body: Option<String>,
}

impl MacroDiagnostic {
	pub fn line(&self) -> usize {
		self.position.start.line
	}

	pub fn column(&self) -> usize {
		self.position.start.column
	}

	pub fn message(&self) -> String {
		format!("Macro: {}", self.body.as_deref().unwrap_or_default())
	}

	/// Render this diagnostic as a `miette::Report` labelled against
	/// `source`.
	pub fn to_report(&self, source: &SourceText) -> miette::Report {
		let mut diagnostic = MietteDiagnostic::new(self.message())
			.with_code(MACRO_BLOCK_DIAGNOSTIC_CODE)
			.with_label(LabeledSpan::at(self.position.range(), self.id));

		if let Some(severity) = self.severity.to_miette() {
			diagnostic = diagnostic.with_severity(severity);
		}

		miette::Report::new(diagnostic).with_source_code(NamedSource::new(
			self.file_path.clone(),
			source.as_str().to_string(),
		))
	}
}

/// One diagnostic per start marker in `document`, in source order. Nothing is
/// reported when the severity is [`Severity::Hidden`].
pub fn collect_macro_diagnostics(
	document: &DocumentRegionTree,
	options: &DiagnosticOptions,
) -> Vec<MacroDiagnostic> {
	if options.severity == Severity::Hidden {
		return Vec::new();
	}

	document
		.blocks()
		.filter_map(|block| block.start())
		.map(|start| {
			MacroDiagnostic {
				id: MACRO_BLOCK_DIAGNOSTIC_ID,
				severity: options.severity,
				file_path: document.file_path.clone(),
				position: start.position,
				body: start.body.clone(),
			}
		})
		.collect()
}
