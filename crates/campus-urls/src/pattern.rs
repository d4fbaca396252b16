//! Path pattern matching for URL routing.
//!
//! Patterns use angle-bracket parameters:
//!
//! - `/marketplace/` matches exactly
//! - `/auth/confirm/<token>` captures one path segment
//! - `/lost-and-found/item/<int:id>` captures one segment of ASCII digits
//! - `/media/<path:rest>` captures the rest of the path, slashes included

use std::collections::HashMap;

/// Maximum allowed length for a URL pattern string in bytes.
const MAX_PATTERN_LENGTH: usize = 1024;

/// Maximum allowed size for a compiled pattern regex (in bytes).
const MAX_REGEX_SIZE: usize = 1 << 20;

/// A compiled path pattern.
#[derive(Debug, Clone)]
pub struct PathPattern {
	pattern: String,
	regex: regex::Regex,
	param_names: Vec<String>,
}

impl PathPattern {
	/// Compile `pattern`.
	///
	/// # Examples
	///
	/// ```
	/// use campus_urls::PathPattern;
	///
	/// let pattern = PathPattern::new("/marketplace/buy/<int:id>").unwrap();
	/// let params = pattern.matches("/marketplace/buy/12").unwrap();
	/// assert_eq!(params["id"], "12");
	/// assert!(pattern.matches("/marketplace/buy/abc").is_none());
	/// ```
	pub fn new(pattern: &str) -> Result<Self, String> {
		if pattern.len() > MAX_PATTERN_LENGTH {
			return Err(format!(
				"Pattern length {} exceeds maximum allowed length of {} bytes",
				pattern.len(),
				MAX_PATTERN_LENGTH
			));
		}

		let (regex_str, param_names) = Self::compile_pattern(pattern)?;

		let regex = regex::RegexBuilder::new(&regex_str)
			.size_limit(MAX_REGEX_SIZE)
			.build()
			.map_err(|e| format!("Failed to compile pattern regex: {}", e))?;

		Ok(Self {
			pattern: pattern.to_string(),
			regex,
			param_names,
		})
	}

	fn compile_pattern(pattern: &str) -> Result<(String, Vec<String>), String> {
		let mut regex_str = String::from("^");
		let mut param_names = Vec::new();
		let mut rest = pattern;

		while let Some(start) = rest.find('<') {
			regex_str.push_str(&regex::escape(&rest[..start]));
			let after = &rest[start + 1..];
			let end = after
				.find('>')
				.ok_or_else(|| format!("Unclosed parameter in pattern '{}'", pattern))?;
			let spec = &after[..end];

			let (converter, name) = match spec.split_once(':') {
				Some((converter, name)) => (converter, name),
				None => ("str", spec),
			};
			if name.is_empty() || !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
				return Err(format!("Invalid parameter name '{}' in '{}'", name, pattern));
			}
			if param_names.iter().any(|n| n == name) {
				return Err(format!("Duplicate parameter '{}' in '{}'", name, pattern));
			}

			let group = match converter {
				"str" => "[^/]+",
				"int" => "[0-9]+",
				"path" => ".+",
				other => return Err(format!("Unknown converter '{}' in '{}'", other, pattern)),
			};
			regex_str.push_str(&format!("(?P<{}>{})", name, group));
			param_names.push(name.to_string());

			rest = &after[end + 1..];
		}

		regex_str.push_str(&regex::escape(rest));
		regex_str.push('$');
		Ok((regex_str, param_names))
	}

	pub fn pattern(&self) -> &str {
		&self.pattern
	}

	pub fn param_names(&self) -> &[String] {
		&self.param_names
	}

	/// Match `path`, returning the captured parameters.
	pub fn matches(&self, path: &str) -> Option<HashMap<String, String>> {
		let caps = self.regex.captures(path)?;
		Some(
			self.param_names
				.iter()
				.filter_map(|name| caps.name(name).map(|m| (name.clone(), m.as_str().to_string())))
				.collect(),
		)
	}

	pub fn is_match(&self, path: &str) -> bool {
		self.regex.is_match(path)
	}

	/// Substitute `params` into the pattern. Fails if one is missing.
	pub fn reverse(&self, params: &[(&str, &str)]) -> Option<String> {
		let mut out = String::new();
		let mut rest = self.pattern.as_str();
		while let Some(start) = rest.find('<') {
			out.push_str(&rest[..start]);
			let after = &rest[start + 1..];
			let end = after.find('>')?;
			let spec = &after[..end];
			let name = spec.split_once(':').map(|(_, n)| n).unwrap_or(spec);
			let (_, value) = params.iter().find(|(k, _)| *k == name)?;
			out.push_str(value);
			rest = &after[end + 1..];
		}
		out.push_str(rest);
		Some(out)
	}
}
