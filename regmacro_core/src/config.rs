use std::path::Path;
use std::path::PathBuf;

use serde::Deserialize;

use crate::MacroError;
use crate::MacroResult;
use crate::diagnostics::Severity;

/// Supported config file locations in discovery order (highest precedence
/// first).
pub const CONFIG_FILE_CANDIDATES: [&str; 3] = [
	"regmacro.toml",
	".regmacro.toml",
	".config/regmacro.toml",
];

/// Configuration loaded from a `regmacro.toml` file.
///
/// ```toml
/// [location_tag]
/// add_missing = true
///
/// [parse]
/// strict_location_tags = false
///
/// [diagnostics]
/// severity = "warning"
/// ```
#[derive(Debug, Default, Deserialize)]
pub struct RegmacroConfig {
	/// How location tags are rewritten.
	#[serde(default)]
	pub location_tag: LocationTagConfig,
	/// How markers are parsed.
	#[serde(default)]
	pub parse: ParseConfig,
	/// How macro blocks are reported.
	#[serde(default)]
	pub diagnostics: DiagnosticsConfig,
}

#[derive(Debug, Deserialize)]
pub struct LocationTagConfig {
	/// Write a `#<line>` tag on start markers that have none. Defaults to
	/// `true`.
	#[serde(default = "default_add_missing")]
	pub add_missing: bool,
}

impl Default for LocationTagConfig {
	fn default() -> Self {
		Self {
			add_missing: default_add_missing(),
		}
	}
}

fn default_add_missing() -> bool {
	true
}

#[derive(Debug, Default, Deserialize)]
pub struct ParseConfig {
	/// Report trailing `#...` text that is not a valid location tag instead of
	/// treating it as part of the macro body.
	#[serde(default)]
	pub strict_location_tags: bool,
}

#[derive(Debug, Default, Deserialize)]
pub struct DiagnosticsConfig {
	/// One of `error`, `warning`, `info` (default) or `hidden`.
	#[serde(default)]
	pub severity: Severity,
}

impl RegmacroConfig {
	/// Resolve the config path from known discovery candidates.
	#[must_use]
	pub fn resolve_path(root: &Path) -> Option<PathBuf> {
		CONFIG_FILE_CANDIDATES
			.iter()
			.map(|candidate| root.join(candidate))
			.find(|path| path.is_file())
	}

	/// Load the config from the first discovered config file at `root`.
	/// Returns `None` if no config file exists.
	pub fn load(root: &Path) -> MacroResult<Option<RegmacroConfig>> {
		let Some(config_path) = Self::resolve_path(root) else {
			return Ok(None);
		};

		let content = std::fs::read_to_string(&config_path)?;
		let config = Self::from_toml(&content)?;

		Ok(Some(config))
	}

	pub fn from_toml(content: &str) -> MacroResult<RegmacroConfig> {
		toml::from_str(content).map_err(|e| MacroError::ConfigParse(e.to_string()))
	}
}
