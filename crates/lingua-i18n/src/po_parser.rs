//! Gettext .po file parser
//!
//! This module parses gettext .po files into [`MessageCatalog`] structures.
//! Translated URL patterns live in ordinary .po files next to the rest of an
//! application's messages, so catalogs can be reloaded from disk at runtime.

use crate::MessageCatalog;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// Errors that can occur during .po file parsing
#[derive(Debug, thiserror::Error)]
pub enum PoParseError {
	#[error("IO error: {0}")]
	IoError(#[from] std::io::Error),
	#[error("Parse error at line {line}: {message}")]
	ParseError { line: usize, message: String },
}

/// Entry in a .po file
#[derive(Debug, Clone, Default)]
struct PoEntry {
	msgctxt: Option<String>,
	msgid: String,
	msgid_plural: Option<String>,
	msgstr: Vec<String>,
}

impl PoEntry {
	fn is_empty(&self) -> bool {
		self.msgid.is_empty()
	}

	/// A msgid or msgstr has been seen, so a new keyword starts the next entry
	fn is_started(&self) -> bool {
		!self.msgid.is_empty() || !self.msgstr.is_empty()
	}
}

/// Which string a continuation line extends
#[derive(Debug, Clone, Copy)]
enum Field {
	Msgctxt,
	Msgid,
	MsgidPlural,
	Msgstr(usize),
}

/// Parse a .po file from a reader
///
/// # Examples
///
/// ```
/// use lingua_i18n::po_parser::parse_po_file;
///
/// let po = "msgid \"^about-us/$\"\nmsgstr \"^a-propos-de-nous/$\"\n";
/// let catalog = parse_po_file(po.as_bytes(), "fr").unwrap();
/// assert_eq!(catalog.get("^about-us/$"), Some("^a-propos-de-nous/$"));
/// ```
pub fn parse_po_file<R: std::io::Read>(
	reader: R,
	locale: &str,
) -> Result<MessageCatalog, PoParseError> {
	let buf_reader = BufReader::new(reader);
	let mut catalog = MessageCatalog::new(locale);
	let mut current_entry = PoEntry::default();
	let mut current_field: Option<Field> = None;

	for (index, line) in buf_reader.lines().enumerate() {
		let line = line?;
		let trimmed = line.trim();
		let line_no = index + 1;

		// Skip empty lines and comments
		if trimmed.is_empty() || trimmed.starts_with('#') {
			continue;
		}

		if let Some(value) = parse_keyword(trimmed, "msgctxt") {
			if current_entry.is_started() {
				add_entry_to_catalog(&mut catalog, &current_entry);
				current_entry = PoEntry::default();
			}
			current_entry.msgctxt = Some(unescape_string(&value));
			current_field = Some(Field::Msgctxt);
		} else if let Some(value) = parse_keyword(trimmed, "msgid_plural") {
			current_entry.msgid_plural = Some(unescape_string(&value));
			current_field = Some(Field::MsgidPlural);
		} else if let Some(value) = parse_keyword(trimmed, "msgid") {
			if current_entry.is_started() {
				add_entry_to_catalog(&mut catalog, &current_entry);
				current_entry = PoEntry::default();
			}
			current_entry.msgid = unescape_string(&value);
			current_field = Some(Field::Msgid);
		} else if let Some((index, value)) = parse_indexed_msgstr(trimmed) {
			while current_entry.msgstr.len() <= index {
				current_entry.msgstr.push(String::new());
			}
			current_entry.msgstr[index] = unescape_string(&value);
			current_field = Some(Field::Msgstr(index));
		} else if let Some(value) = parse_keyword(trimmed, "msgstr") {
			current_entry.msgstr = vec![unescape_string(&value)];
			current_field = Some(Field::Msgstr(0));
		} else if trimmed.len() >= 2 && trimmed.starts_with('"') && trimmed.ends_with('"') {
			let value = unescape_string(&trimmed[1..trimmed.len() - 1]);
			match current_field {
				Some(Field::Msgctxt) => {
					if let Some(ctx) = current_entry.msgctxt.as_mut() {
						ctx.push_str(&value);
					}
				}
				Some(Field::Msgid) => current_entry.msgid.push_str(&value),
				Some(Field::MsgidPlural) => {
					if let Some(plural) = current_entry.msgid_plural.as_mut() {
						plural.push_str(&value);
					}
				}
				Some(Field::Msgstr(i)) => {
					if let Some(existing) = current_entry.msgstr.get_mut(i) {
						existing.push_str(&value);
					}
				}
				None => {
					return Err(PoParseError::ParseError {
						line: line_no,
						message: "continuation string without a preceding keyword".to_string(),
					});
				}
			}
		} else {
			return Err(PoParseError::ParseError {
				line: line_no,
				message: format!("unrecognised line: {}", trimmed),
			});
		}
	}

	// Add the last entry
	if !current_entry.is_empty() {
		add_entry_to_catalog(&mut catalog, &current_entry);
	}

	Ok(catalog)
}

/// Load a .po file from disk
pub fn load_po_file(path: impl AsRef<Path>, locale: &str) -> Result<MessageCatalog, PoParseError> {
	let file = std::fs::File::open(path.as_ref())?;
	let catalog = parse_po_file(file, locale)?;
	tracing::debug!(
		locale,
		path = %path.as_ref().display(),
		entries = catalog.len(),
		"loaded message catalog"
	);
	Ok(catalog)
}

/// Parse a keyword and its value from a line
fn parse_keyword(line: &str, keyword: &str) -> Option<String> {
	let rest = line.strip_prefix(keyword)?;
	// "msgid" must not swallow "msgid_plural"
	if !rest.starts_with(char::is_whitespace) {
		return None;
	}

	let rest = rest.trim();
	if rest.len() < 2 || !rest.starts_with('"') || !rest.ends_with('"') {
		return None;
	}

	Some(rest[1..rest.len() - 1].to_string())
}

/// Parse indexed msgstr (e.g., `msgstr[0]`, `msgstr[1]`)
fn parse_indexed_msgstr(line: &str) -> Option<(usize, String)> {
	let rest = line.strip_prefix("msgstr[")?;
	let close_bracket = rest.find(']')?;
	let index: usize = rest[..close_bracket].parse().ok()?;

	let rest = rest[close_bracket + 1..].trim();
	if rest.len() < 2 || !rest.starts_with('"') || !rest.ends_with('"') {
		return None;
	}

	Some((index, rest[1..rest.len() - 1].to_string()))
}

/// Unescape a string (handle \n, \t, \", \\)
fn unescape_string(s: &str) -> String {
	let mut result = String::with_capacity(s.len());
	let mut chars = s.chars();

	while let Some(ch) = chars.next() {
		if ch == '\\' {
			match chars.next() {
				Some('n') => result.push('\n'),
				Some('t') => result.push('\t'),
				Some('r') => result.push('\r'),
				Some('"') => result.push('"'),
				Some('\\') => result.push('\\'),
				Some(other) => {
					result.push('\\');
					result.push(other);
				}
				None => result.push('\\'),
			}
		} else {
			result.push(ch);
		}
	}

	result
}

/// Add a parsed entry to the catalog
fn add_entry_to_catalog(catalog: &mut MessageCatalog, entry: &PoEntry) {
	// Header entry (empty msgid) carries metadata only
	if entry.msgid.is_empty() {
		return;
	}

	if entry.msgid_plural.is_some() {
		tracing::debug!(msgid = %entry.msgid, "skipping plural entry");
		return;
	}

	// Untranslated entries fall back to the message id at lookup time
	let Some(translation) = entry.msgstr.first().filter(|s| !s.is_empty()) else {
		return;
	};

	match &entry.msgctxt {
		Some(context) => catalog.add_context(context, &entry.msgid, translation),
		None => catalog.add_translation(&entry.msgid, translation),
	}
}
