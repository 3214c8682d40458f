/*
 *  Copyright (C) 2025 Michael Bachmann
 *
 *  This program is free software: you can redistribute it and/or modify
 *  it under the terms of the GNU Affero General Public License as published by
 *  the Free Software Foundation, either version 3 of the License, or
 *  (at your option) any later version.
 *
 *  This program is distributed in the hope that it will be useful,
 *  but WITHOUT ANY WARRANTY; without even the implied warranty of
 *  MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 *  GNU Affero General Public License for more details.
 *
 *  You should have received a copy of the GNU Affero General Public License
 *  along with this program.  If not, see <https://www.gnu.org/licenses/>.
 */

//! An ordered, case-insensitive header list, preserving duplicates and
//! insertion order the way the wire format does.

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Headers(Vec<(String, String)>);

impl Headers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.0.push((name.into(), value.into()));
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn content_length(&self) -> Option<usize> {
        self.get("Content-Length").and_then(|v| v.trim().parse().ok())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_is_case_insensitive() {
        let mut headers = Headers::new();
        headers.push("Content-Length", "42");
        assert_eq!(headers.get("content-length"), Some("42"));
        assert_eq!(headers.content_length(), Some(42));
    }

    #[test]
    fn missing_header_is_none() {
        let headers = Headers::new();
        assert_eq!(headers.get("CSeq"), None);
        assert_eq!(headers.content_length(), None);
    }

    #[test]
    fn duplicate_headers_preserve_insertion_order() {
        let mut headers = Headers::new();
        headers.push("X-Test", "a");
        headers.push("X-Test", "b");
        let values: Vec<&str> = headers.iter().map(|(_, v)| v).collect();
        assert_eq!(values, vec!["a", "b"]);
    }
}
