//! Extension tokenizer.
//!
//! A pair starts at a `key=` anchor, where the key is a run of word bytes
//! (`[A-Za-z0-9_]`). Its value runs until whitespace followed by the next
//! `key=` anchor, or to the end of the blob, so values may hold unescaped
//! spaces. A backslash always takes the byte after it along, which is how
//! `\=` stays inside a value. Text before the first anchor is dropped; a
//! bare word between two pairs stays part of the preceding value.

use std::collections::BTreeMap;

use super::escape::unescape;
use super::is_cef_space;

/// Parse an extension blob into unescaped key/value pairs.
/// Later duplicates overwrite earlier ones.
pub fn tokenize_extensions(blob: &str) -> BTreeMap<String, String> {
    let mut extensions = BTreeMap::new();

    for (key, raw_value) in ExtensionPairs::new(blob) {
        let value = unescape(raw_value.trim_matches(is_cef_space));
        extensions.insert(key.to_string(), value);
    }

    extensions
}

/// Iterator over raw `(key, value)` spans, values still escaped and untrimmed.
pub struct ExtensionPairs<'a> {
    blob: &'a str,
    pos: usize,
}

impl<'a> ExtensionPairs<'a> {
    pub fn new(blob: &'a str) -> Self {
        Self { blob, pos: 0 }
    }
}

impl<'a> Iterator for ExtensionPairs<'a> {
    type Item = (&'a str, &'a str);

    fn next(&mut self) -> Option<Self::Item> {
        let bytes = self.blob.as_bytes();
        let (key_start, key_end) = find_anchor(bytes, self.pos)?;

        // key_end is the '='
        let value_start = key_end + 1;
        let value_end = value_end(bytes, value_start);
        self.pos = value_end;

        Some((
            &self.blob[key_start..key_end],
            &self.blob[value_start..value_end],
        ))
    }
}

fn is_word(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_'
}

fn is_space(b: u8) -> bool {
    is_cef_space(b as char)
}

fn word_end(bytes: &[u8], start: usize) -> usize {
    bytes[start..]
        .iter()
        .position(|&b| !is_word(b))
        .map_or(bytes.len(), |offset| start + offset)
}

/// Next `key=` at or after `from`, as (key start, index of '=').
fn find_anchor(bytes: &[u8], from: usize) -> Option<(usize, usize)> {
    let mut i = from;

    while i < bytes.len() {
        if !is_word(bytes[i]) {
            i += 1;
            continue;
        }

        let end = word_end(bytes, i);
        if bytes.get(end) == Some(&b'=') {
            return Some((i, end));
        }
        i = end;
    }

    None
}

/// Whitespace run, then a word run, then '='
fn starts_next_pair(bytes: &[u8], at: usize) -> bool {
    let word_start = bytes[at..]
        .iter()
        .position(|&b| !is_space(b))
        .map_or(bytes.len(), |offset| at + offset);

    if word_start == at || word_start == bytes.len() {
        return false;
    }

    let end = word_end(bytes, word_start);
    end > word_start && bytes.get(end) == Some(&b'=')
}

fn value_end(bytes: &[u8], start: usize) -> usize {
    let mut i = start;

    while i < bytes.len() {
        if bytes[i] == b'\\' && i + 1 < bytes.len() {
            i += 2;
            continue;
        }
        if starts_next_pair(bytes, i) {
            break;
        }
        i += 1;
    }

    i
}
