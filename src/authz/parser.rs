//! Authz file parser
//!
//! Turns line-oriented INI-style text into named sections of ordered
//! `key=value` entries.

use crate::error::{AuthzError, AuthzResult};
use std::io::BufRead;

/// Ordered `key=value` entries of one section
///
/// Re-assigning an existing key replaces its value but keeps its position.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Section {
    entries: Vec<(String, String)>,
}

impl Section {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((key, value)),
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// All sections of a parsed source, in order of first appearance
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Sections {
    sections: Vec<(String, Section)>,
}

impl Sections {
    /// Open `name`, discarding any entries it already had
    fn open(&mut self, name: &str) -> usize {
        match self.sections.iter().position(|(n, _)| n == name) {
            Some(idx) => {
                self.sections[idx].1 = Section::new();
                idx
            }
            None => {
                self.sections.push((name.to_string(), Section::new()));
                self.sections.len() - 1
            }
        }
    }

    pub fn get(&self, name: &str) -> Option<&Section> {
        self.sections
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, s)| s)
    }

    /// Remove and return a section by name
    pub fn take(&mut self, name: &str) -> Option<Section> {
        let idx = self.sections.iter().position(|(n, _)| n == name)?;
        Some(self.sections.remove(idx).1)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.sections.iter().map(|(n, _)| n.as_str())
    }

    pub fn len(&self) -> usize {
        self.sections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }
}

impl IntoIterator for Sections {
    type Item = (String, Section);
    type IntoIter = std::vec::IntoIter<(String, Section)>;

    fn into_iter(self) -> Self::IntoIter {
        self.sections.into_iter()
    }
}

/// Parse an authz source from any buffered reader
pub fn parse<R: BufRead>(reader: R) -> AuthzResult<Sections> {
    let mut sections = Sections::default();
    let mut current: Option<usize> = None;

    for (idx, line) in reader.lines().enumerate() {
        let line = line?;
        let line_no = idx + 1;
        let cmd = strip_comment(&line);
        let cmd = cmd.trim();
        if cmd.is_empty() {
            continue;
        }

        if let Some(name) = cmd.strip_prefix('[').and_then(|s| s.strip_suffix(']')) {
            current = Some(sections.open(name));
            continue;
        }

        let Some(section) = current else {
            return Err(AuthzError::syntax(line_no, cmd));
        };
        let Some((key, value)) = cmd.split_once('=') else {
            return Err(AuthzError::syntax(line_no, cmd));
        };
        let key = key.trim();
        if key.is_empty() {
            return Err(AuthzError::syntax(line_no, cmd));
        }
        sections.sections[section].1.insert(key, value.trim());
    }

    Ok(sections)
}

/// Parse an authz source held in memory
pub fn parse_str(source: &str) -> AuthzResult<Sections> {
    parse(source.as_bytes())
}

/// Drop everything from the first unescaped `#`; `\#` yields a literal `#`
fn strip_comment(line: &str) -> String {
    let mut out = String::with_capacity(line.len());
    let mut chars = line.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '\\' if chars.peek() == Some(&'#') => {
                out.push('#');
                chars.next();
            }
            '#' => break,
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sections_and_entries() {
        let sections = parse_str("[groups]\ng1 = a, b\n\n[/trunk]\n* = r\n").unwrap();
        assert_eq!(sections.len(), 2);
        assert_eq!(sections.get("groups").unwrap().get("g1"), Some("a, b"));
        assert_eq!(sections.get("/trunk").unwrap().get("*"), Some("r"));
    }

    #[test]
    fn test_comments_and_blank_lines() {
        let source = "# header comment\n[/]\n   \n* = r # everyone reads\n#user = rw\n";
        let sections = parse_str(source).unwrap();
        let root = sections.get("/").unwrap();
        assert_eq!(root.len(), 1);
        assert_eq!(root.get("*"), Some("r"));
    }

    #[test]
    fn test_escaped_hash() {
        let sections = parse_str("[/]\nuser\\#1 = r\n").unwrap();
        assert_eq!(sections.get("/").unwrap().get("user#1"), Some("r"));
    }

    #[test]
    fn test_empty_value_allowed() {
        let sections = parse_str("[/secret]\nharry =\n").unwrap();
        assert_eq!(sections.get("/secret").unwrap().get("harry"), Some(""));
    }

    #[test]
    fn test_value_split_on_first_equals() {
        let sections = parse_str("[aliases]\nodd = a=b\n").unwrap();
        assert_eq!(sections.get("aliases").unwrap().get("odd"), Some("a=b"));
    }

    #[test]
    fn test_reopened_section_is_reset() {
        let sections = parse_str("[/]\na = r\n[/x]\nb = r\n[/]\nc = rw\n").unwrap();
        let names: Vec<_> = sections.names().collect();
        assert_eq!(names, vec!["/", "/x"]);
        let root = sections.get("/").unwrap();
        assert_eq!(root.get("a"), None);
        assert_eq!(root.get("c"), Some("rw"));
    }

    #[test]
    fn test_duplicate_key_keeps_position() {
        let sections = parse_str("[/]\na = r\nb = r\na = rw\n").unwrap();
        let entries: Vec<_> = sections.get("/").unwrap().iter().collect();
        assert_eq!(entries, vec![("a", "rw"), ("b", "r")]);
    }

    #[test]
    fn test_entry_before_section() {
        let err = parse_str("a=b\n[section]\nc=d").unwrap_err();
        assert!(matches!(err, AuthzError::Syntax { line: 1, .. }));
    }

    #[test]
    fn test_missing_equals() {
        let err = parse_str("[section]\nc").unwrap_err();
        assert!(matches!(err, AuthzError::Syntax { line: 2, .. }));
        assert!(err.to_string().contains("Syntax error"));
    }

    #[test]
    fn test_empty_key() {
        let err = parse_str("[section]\n  = d").unwrap_err();
        assert!(err.is_syntax());
    }

    #[test]
    fn test_take_removes_section() {
        let mut sections = parse_str("[aliases]\na = b\n[/]\n* = r\n").unwrap();
        assert!(sections.take("aliases").is_some());
        assert!(sections.take("aliases").is_none());
        assert_eq!(sections.len(), 1);
    }
}
