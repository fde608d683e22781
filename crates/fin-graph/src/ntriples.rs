//! N-Triples term syntax.
//!
//! Terms are written the same way inside SPARQL-Update data blocks, so the
//! lexing helpers here are shared with [`crate::sparql`].

use crate::{Error, Graph, Result, Term, Triple};

// ============================================================================
// Formatting
// ============================================================================

/// Escape an IRI for use between angle brackets.
pub fn escape_iri(iri: &str) -> String {
    let mut out = String::with_capacity(iri.len());
    for c in iri.chars() {
        match c {
            '<' | '>' | '"' | '{' | '}' | '|' | '^' | '`' | '\\' => {
                out.push_str(&format!("\\u{:04X}", c as u32))
            }
            c if c <= ' ' => out.push_str(&format!("\\u{:04X}", c as u32)),
            c => out.push(c),
        }
    }
    out
}

/// Escape a literal's lexical form for use between double quotes.
pub fn escape_literal(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    for c in value.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c => out.push(c),
        }
    }
    out
}

/// Render one term.
pub fn format_term(term: &Term) -> String {
    match term {
        Term::Iri(iri) => format!("<{}>", escape_iri(iri)),
        Term::Blank(label) => format!("_:{label}"),
        Term::Literal {
            value,
            datatype,
            language,
        } => {
            let mut out = format!("\"{}\"", escape_literal(value));
            if let Some(lang) = language {
                out.push('@');
                out.push_str(lang);
            } else if let Some(dt) = datatype {
                out.push_str("^^<");
                out.push_str(&escape_iri(dt));
                out.push('>');
            }
            out
        }
    }
}

/// Render a whole graph, one triple per line.
pub fn serialize(graph: &Graph) -> String {
    graph.iter().map(|t| format!("{t}\n")).collect()
}

// ============================================================================
// Lexing
// ============================================================================

/// Byte cursor over term syntax.
pub(crate) struct Cursor<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> Cursor<'a> {
    pub(crate) fn new(input: &'a str) -> Self {
        Self { input, pos: 0 }
    }

    pub(crate) fn pos(&self) -> usize {
        self.pos
    }

    fn rest(&self) -> &'a str {
        &self.input[self.pos..]
    }

    pub(crate) fn error(&self, message: impl Into<String>) -> Error {
        Error::syntax(self.pos, message)
    }

    pub(crate) fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    /// Skip whitespace and `#` comments.
    pub(crate) fn skip_ws(&mut self) {
        loop {
            match self.peek() {
                Some(c) if c.is_whitespace() => {
                    self.bump();
                }
                Some('#') => {
                    while let Some(c) = self.bump() {
                        if c == '\n' {
                            break;
                        }
                    }
                }
                _ => break,
            }
        }
    }

    pub(crate) fn at_end(&mut self) -> bool {
        self.skip_ws();
        self.pos >= self.input.len()
    }

    /// Consume `c` if it is next.
    pub(crate) fn eat(&mut self, c: char) -> bool {
        self.skip_ws();
        if self.peek() == Some(c) {
            self.bump();
            true
        } else {
            false
        }
    }

    pub(crate) fn expect(&mut self, c: char) -> Result<()> {
        if self.eat(c) {
            Ok(())
        } else {
            Err(self.error(format!("expected '{c}'")))
        }
    }

    /// Consume a case-insensitive keyword followed by a non-name character.
    pub(crate) fn eat_keyword(&mut self, keyword: &str) -> bool {
        self.skip_ws();
        let rest = self.rest();
        if !rest
            .get(..keyword.len())
            .is_some_and(|head| head.eq_ignore_ascii_case(keyword))
        {
            return false;
        }
        let boundary = rest[keyword.len()..]
            .chars()
            .next()
            .is_none_or(|c| !(is_name_char(c) || c == ':'));
        if boundary {
            self.pos += keyword.len();
        }
        boundary
    }

    fn read_escape(&mut self) -> Result<char> {
        match self.bump() {
            Some('t') => Ok('\t'),
            Some('n') => Ok('\n'),
            Some('r') => Ok('\r'),
            Some('b') => Ok('\u{8}'),
            Some('f') => Ok('\u{c}'),
            Some('"') => Ok('"'),
            Some('\'') => Ok('\''),
            Some('\\') => Ok('\\'),
            Some('u') => self.read_hex(4),
            Some('U') => self.read_hex(8),
            _ => Err(self.error("invalid escape sequence")),
        }
    }

    fn read_hex(&mut self, digits: usize) -> Result<char> {
        let rest = self.rest();
        let hex = rest
            .get(..digits)
            .ok_or_else(|| self.error("truncated unicode escape"))?;
        let code = u32::from_str_radix(hex, 16).map_err(|_| self.error("invalid unicode escape"))?;
        self.pos += digits;
        char::from_u32(code).ok_or_else(|| self.error("invalid code point"))
    }

    /// `<...>` with the opening bracket next.
    pub(crate) fn read_iriref(&mut self) -> Result<String> {
        self.expect('<')?;
        let mut out = String::new();
        loop {
            match self.bump() {
                Some('>') => return Ok(out),
                Some('\\') => out.push(self.read_escape()?),
                Some(c) => out.push(c),
                None => return Err(self.error("unterminated IRI")),
            }
        }
    }

    /// `_:label` with the underscore next.
    pub(crate) fn read_blank(&mut self) -> Result<String> {
        self.skip_ws();
        if !self.rest().starts_with("_:") {
            return Err(self.error("expected blank node"));
        }
        self.pos += 2;
        let label = self.read_name();
        if label.is_empty() {
            return Err(self.error("empty blank node label"));
        }
        Ok(label.to_string())
    }

    /// A run of name characters (prefixed names, keywords, labels).
    pub(crate) fn read_name(&mut self) -> &'a str {
        self.skip_ws();
        let rest = self.rest();
        let mut len = rest
            .char_indices()
            .find(|(_, c)| !(is_name_char(*c) || *c == ':'))
            .map(|(i, _)| i)
            .unwrap_or(rest.len());
        // A trailing '.' terminates the statement rather than the name.
        while len > 0 && rest[..len].ends_with('.') {
            len -= 1;
        }
        self.pos += len;
        &rest[..len]
    }

    /// A quoted literal plus optional `@lang` or `^^datatype`.
    ///
    /// `resolve` expands prefixed-name datatypes; N-Triples passes a
    /// resolver that rejects them.
    pub(crate) fn read_literal<F>(&mut self, resolve: F) -> Result<Term>
    where
        F: Fn(&str, usize) -> Result<String>,
    {
        self.skip_ws();
        let quote = match self.bump() {
            Some(q @ ('"' | '\'')) => q,
            _ => return Err(self.error("expected literal")),
        };
        let mut value = String::new();
        loop {
            match self.bump() {
                Some(c) if c == quote => break,
                Some('\\') => value.push(self.read_escape()?),
                Some(c) => value.push(c),
                None => return Err(self.error("unterminated literal")),
            }
        }

        match self.peek() {
            Some('@') => {
                self.bump();
                let lang = self.read_name();
                if lang.is_empty() {
                    return Err(self.error("empty language tag"));
                }
                Ok(Term::lang_literal(value, lang))
            }
            Some('^') => {
                if !self.rest().starts_with("^^") {
                    return Err(self.error("expected '^^'"));
                }
                self.pos += 2;
                let datatype = if self.peek() == Some('<') {
                    self.read_iriref()?
                } else {
                    let at = self.pos;
                    let name = self.read_name();
                    resolve(name, at)?
                };
                Ok(Term::typed_literal(value, datatype))
            }
            _ => Ok(Term::literal(value)),
        }
    }
}

fn is_name_char(c: char) -> bool {
    c.is_alphanumeric() || matches!(c, '_' | '-' | '.')
}

// ============================================================================
// Parsing
// ============================================================================

fn no_prefixes(name: &str, offset: usize) -> Result<String> {
    Err(Error::syntax(
        offset,
        format!("prefixed name '{name}' is not allowed in N-Triples"),
    ))
}

fn read_term(cursor: &mut Cursor<'_>) -> Result<Term> {
    cursor.skip_ws();
    match cursor.peek() {
        Some('<') => Ok(Term::Iri(cursor.read_iriref()?)),
        Some('_') => Ok(Term::Blank(cursor.read_blank()?)),
        Some('"') => cursor.read_literal(no_prefixes),
        _ => Err(cursor.error("expected term")),
    }
}

/// Parse a single term, e.g. `"alice"` or `<http://h/x>`.
pub fn parse_term(input: &str) -> Result<Term> {
    let mut cursor = Cursor::new(input);
    let term = read_term(&mut cursor)?;
    if !cursor.at_end() {
        return Err(cursor.error("trailing input after term"));
    }
    Ok(term)
}

/// Parse an N-Triples document.
pub fn parse(input: &str) -> Result<Graph> {
    let mut cursor = Cursor::new(input);
    let mut graph = Graph::new();
    while !cursor.at_end() {
        let subject = read_term(&mut cursor)?;
        if subject.is_literal() {
            return Err(cursor.error("literal in subject position"));
        }
        cursor.skip_ws();
        let predicate = cursor.read_iriref()?;
        let object = read_term(&mut cursor)?;
        cursor.expect('.')?;
        graph.insert_triple(Triple::new(subject, predicate, object));
    }
    Ok(graph)
}

// ============================================================================
// Tests
// ============================================================================
