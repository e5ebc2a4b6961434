//! Parser for the vendor IDE's `.ioc` project configuration.
//!
//! One `key=value` per line, keys grouped by their first dot-delimited
//! segment (`Mcu.*`, `ProjectManager.*`, `RCC.*`). Every key is kept, in file
//! order, whether or not anything downstream reads it.

use std::collections::{BTreeSet, HashMap};

#[derive(Debug, Clone, Default)]
pub struct IocFile {
    entries: Vec<(String, String)>,
    index: HashMap<String, usize>,
}

impl IocFile {
    /// Blank lines and `#` comments are skipped, as are lines without `=`.
    /// A repeated key keeps its first position but takes the last value.
    pub fn parse(text: &str) -> Self {
        let mut file = IocFile::default();
        for (line_no, line) in text.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let Some(eq) = separator(line) else {
                tracing::debug!("ioc line {}: no '=' in {:?}", line_no + 1, line);
                continue;
            };
            let key = unescape(line[..eq].trim());
            let value = unescape(line[eq + 1..].trim());
            if key.is_empty() {
                continue;
            }
            match file.index.get(&key) {
                Some(&pos) => file.entries[pos].1 = value,
                None => {
                    file.index.insert(key.clone(), file.entries.len());
                    file.entries.push((key, value));
                }
            }
        }
        file
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.index
            .get(key)
            .map(|&pos| self.entries[pos].1.as_str())
            .filter(|v| !v.is_empty())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Entries of one namespace, in file order, with the namespace removed
    /// from the key.
    pub fn namespace<'a>(&'a self, ns: &'a str) -> impl Iterator<Item = (&'a str, &'a str)> + 'a {
        self.entries().filter_map(move |(key, value)| {
            let (head, rest) = key.split_once('.')?;
            (head == ns).then_some((rest, value))
        })
    }

    pub fn has_namespace(&self, ns: &str) -> bool {
        self.namespace(ns).next().is_some()
    }

    pub fn namespaces(&self) -> BTreeSet<&str> {
        self.entries
            .iter()
            .map(|(k, _)| k.split_once('.').map_or(k.as_str(), |(head, _)| head))
            .collect()
    }
}

/// Byte offset of the first `=` not escaped by a backslash.
fn separator(line: &str) -> Option<usize> {
    let mut escaped = false;
    for (i, c) in line.char_indices() {
        match c {
            '\\' if !escaped => escaped = true,
            '=' if !escaped => return Some(i),
            _ => escaped = false,
        }
    }
    None
}

/// `\:` → `:`, `\=` → `=`, `\ ` → ` `; a backslash escapes the next char.
fn unescape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            if let Some(next) = chars.next() {
                out.push(next);
            }
        } else {
            out.push(c);
        }
    }
    out
}
