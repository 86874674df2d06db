//! A small BibTeX reader.
//!
//! Grammar handled: `@type{key, name = {value} | "value" | bare, ...}` with
//! nested braces, `#` concatenation, and `(`…`)` delimiters. `@comment`,
//! `@preamble` and `@string` blocks are skipped, as is an `@word` that opens no
//! entry. Each entry is returned as its own `Result` so one malformed entry
//! does not hide the rest.

#[derive(Debug, Clone, PartialEq)]
pub struct BibEntry {
    /// Entry type, lowercased (`article`, `inproceedings`, …).
    pub kind: String,
    pub key: String,
    /// Field names lowercased, in source order.
    pub fields: Vec<(String, String)>,
}

impl BibEntry {
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
            .filter(|v| !v.trim().is_empty())
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum BibError {
    #[error("entry at byte {0}: missing citation key")]
    MissingKey(usize),
    #[error("entry {key}: field near byte {at} is malformed")]
    BadField { key: String, at: usize },
    #[error("entry {key}: reached end of input before the entry closed")]
    Unterminated { key: String },
}

pub fn parse(input: &str) -> Vec<Result<BibEntry, BibError>> {
    let mut out = Vec::new();
    let mut pos = 0;

    while let Some(off) = input[pos..].find('@') {
        let start = pos + off;
        let mut cur = Cursor {
            src: input,
            pos: start + 1,
        };
        let kind = cur.ident().to_ascii_lowercase();
        if kind.is_empty() {
            pos = start + 1;
            continue;
        }

        if matches!(kind.as_str(), "comment" | "preamble" | "string") {
            cur.skip_ws();
            pos = match cur.peek() {
                Some(open @ (b'{' | b'(')) => cur.skip_group(open).unwrap_or(input.len()),
                _ => cur.pos,
            };
            continue;
        }

        cur.skip_ws();
        let close = match cur.peek() {
            Some(b'{') => b'}',
            Some(b'(') => b')',
            // Free text such as an email address outside any entry.
            _ => {
                pos = cur.pos;
                continue;
            }
        };

        let result = cur.entry(start, kind, close);
        pos = match &result {
            Ok(_) => cur.pos,
            // Resume scanning right after the '@' of the broken entry.
            Err(_) => start + 1,
        };
        out.push(result);
    }
    out
}

struct Cursor<'a> {
    src: &'a str,
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn bytes(&self) -> &'a [u8] {
        self.src.as_bytes()
    }

    fn peek(&self) -> Option<u8> {
        self.bytes().get(self.pos).copied()
    }

    fn skip_ws(&mut self) {
        while matches!(self.peek(), Some(b) if b.is_ascii_whitespace()) {
            self.pos += 1;
        }
    }

    fn ident(&mut self) -> &'a str {
        let start = self.pos;
        while matches!(self.peek(), Some(b) if b.is_ascii_alphanumeric() || b"_-:.".contains(&b)) {
            self.pos += 1;
        }
        &self.src[start..self.pos]
    }

    /// Skip a balanced group starting at the current opening delimiter.
    /// Returns the position after the closing delimiter.
    fn skip_group(&mut self, open: u8) -> Option<usize> {
        let close = if open == b'(' { b')' } else { b'}' };
        let mut depth = 0usize;
        while let Some(b) = self.peek() {
            self.pos += 1;
            if b == open {
                depth += 1;
            } else if b == close {
                depth -= 1;
                if depth == 0 {
                    return Some(self.pos);
                }
            }
        }
        None
    }

    /// Parse one entry; the cursor sits on its opening delimiter.
    fn entry(&mut self, start: usize, kind: String, close: u8) -> Result<BibEntry, BibError> {
        self.pos += 1;
        self.skip_ws();

        let key_start = self.pos;
        while matches!(self.peek(), Some(b) if b != b',' && b != close && !b.is_ascii_whitespace())
        {
            self.pos += 1;
        }
        let key = self.src[key_start..self.pos].to_string();
        self.skip_ws();
        if key.is_empty() || !matches!(self.peek(), Some(b) if b == b',' || b == close) {
            return Err(BibError::MissingKey(start));
        }

        let mut fields = Vec::new();
        loop {
            self.skip_ws();
            match self.peek() {
                None => return Err(BibError::Unterminated { key }),
                Some(b',') => {
                    self.pos += 1;
                    continue;
                }
                Some(b) if b == close => {
                    self.pos += 1;
                    return Ok(BibEntry { kind, key, fields });
                }
                Some(_) => {}
            }

            let at = self.pos;
            let name = self.ident().to_ascii_lowercase();
            self.skip_ws();
            if name.is_empty() || self.peek() != Some(b'=') {
                return Err(BibError::BadField { key, at });
            }
            self.pos += 1;

            let mut value = String::new();
            loop {
                self.skip_ws();
                match self.value(close) {
                    Some(part) => value.push_str(&part),
                    None if self.peek().is_none() => {
                        return Err(BibError::Unterminated { key })
                    }
                    None => return Err(BibError::BadField { key, at }),
                }
                self.skip_ws();
                if self.peek() == Some(b'#') {
                    self.pos += 1;
                } else {
                    break;
                }
            }
            fields.push((name, clean_value(&value)));
        }
    }

    /// One value token: `{...}`, `"..."` or a bare word/number.
    fn value(&mut self, close: u8) -> Option<String> {
        match self.peek()? {
            b'{' => {
                let start = self.pos + 1;
                let end = self.skip_group(b'{')?;
                Some(self.src[start..end - 1].to_string())
            }
            b'"' => {
                self.pos += 1;
                let start = self.pos;
                let mut depth = 0usize;
                loop {
                    match self.peek()? {
                        b'{' => depth += 1,
                        b'}' => depth = depth.saturating_sub(1),
                        b'"' if depth == 0 && self.bytes()[self.pos - 1] != b'\\' => break,
                        _ => {}
                    }
                    self.pos += 1;
                }
                let s = self.src[start..self.pos].to_string();
                self.pos += 1;
                Some(s)
            }
            _ => {
                let start = self.pos;
                while matches!(self.peek(), Some(b) if b != b',' && b != close && b != b'#' && !b.is_ascii_whitespace())
                {
                    self.pos += 1;
                }
                if self.pos == start {
                    None
                } else {
                    Some(self.src[start..self.pos].to_string())
                }
            }
        }
    }
}

/// Drop grouping braces and collapse whitespace.
fn clean_value(raw: &str) -> String {
    let unbraced: String = raw.chars().filter(|c| *c != '{' && *c != '}').collect();
    crate::utils::collapse_whitespace(&unbraced)
}

/// `Last, First and Other, Name` → `["First Last", "Name Other"]`.
pub fn split_authors(raw: &str) -> Vec<String> {
    raw.split(" and ")
        .map(str::trim)
        .filter(|a| !a.is_empty())
        .map(|a| match a.split_once(',') {
            Some((last, first)) if !first.trim().is_empty() => {
                format!("{} {}", first.trim(), last.trim())
            }
            _ => a.trim_end_matches(',').to_string(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_braced_quoted_and_bare_values() {
        let src = r#"
            @Article{korol2023,
              title   = {Spin {Waves} in   thin films},
              author  = "Korol, Ada and Smith, Bob",
              year    = 2023,
              journal = {Phys. Rev. B}
            }
        "#;
        let entries = parse(src);
        assert_eq!(entries.len(), 1);
        let e = entries[0].as_ref().unwrap();
        assert_eq!(e.kind, "article");
        assert_eq!(e.key, "korol2023");
        assert_eq!(e.field("title"), Some("Spin Waves in thin films"));
        assert_eq!(e.field("year"), Some("2023"));
        assert_eq!(e.field("journal"), Some("Phys. Rev. B"));
        assert_eq!(
            split_authors(e.field("author").unwrap()),
            vec!["Ada Korol", "Bob Smith"]
        );
    }

    #[test]
    fn concatenation_and_paren_delimiters() {
        let src = r#"@misc(k2, note = "a" # {b}, year = 2020)"#;
        let e = parse(src).remove(0).unwrap();
        assert_eq!(e.field("note"), Some("ab"));
        assert_eq!(e.field("year"), Some("2020"));
    }

    #[test]
    fn comments_and_strings_are_skipped() {
        let src = "@comment{ignore me @article{fake, } }\n@string{x = {y}}\n@book{b1, title={B}}";
        let entries = parse(src);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].as_ref().unwrap().key, "b1");
    }

    #[test]
    fn broken_entry_does_not_hide_the_next_one() {
        let src = "@article{bad, title {oops}}\n@article{good, title={Fine}}";
        let entries = parse(src);
        assert!(matches!(entries[0], Err(BibError::BadField { .. })));
        let good = entries.iter().filter_map(|r| r.as_ref().ok()).next().unwrap();
        assert_eq!(good.key, "good");
    }

    #[test]
    fn unterminated_entry_reports_its_key() {
        let entries = parse("@article{open, title={T}");
        assert_eq!(
            entries,
            vec![Err(BibError::Unterminated { key: "open".into() })]
        );
    }

    #[test]
    fn stray_at_signs_are_comment_text() {
        let src = "% maintained by ada@umontreal.example\nWrite to bob@lab .\n@article{k1, title={T}}";
        let entries = parse(src);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].as_ref().unwrap().key, "k1");
    }

    #[test]
    fn missing_key_is_an_error() {
        let entries = parse("@article{title = {x}}");
        assert!(matches!(entries[0], Err(BibError::MissingKey(_))));
    }
}
