//! SPARQL-Update patch scripts.
//!
//! Only the data forms are produced and accepted: `DELETE DATA`,
//! `INSERT DATA`, and `DELETE { .. } / INSERT { .. } WHERE { }` with an
//! empty pattern, which is what repository servers expect for partial
//! updates of a single resource. `<>` denotes the resource being patched.

use std::collections::HashMap;

use crate::ntriples::{Cursor, format_term};
use crate::{Error, Graph, GraphPatch, Result, Term, Triple, resolve_iri, vocab};

// ============================================================================
// Rendering
// ============================================================================

fn render_term(term: &Term, document: Option<&str>) -> String {
    match (term, document) {
        (Term::Iri(iri), Some(doc)) if iri == doc => "<>".to_string(),
        _ => format_term(term),
    }
}

fn render_block(keyword: &str, graph: &Graph, document: Option<&str>) -> String {
    let mut out = format!("{keyword} DATA {{\n");
    for triple in graph {
        out.push_str(&format!(
            "  {} {} {} .\n",
            render_term(&triple.subject, document),
            format_term(&Term::Iri(triple.predicate.clone())),
            render_term(&triple.object, document),
        ));
    }
    out.push('}');
    out
}

/// Render a patch as a SPARQL-Update script.
///
/// Occurrences of `document` are written as `<>`. Blank nodes cannot be
/// deleted with `DELETE DATA`, so such patches are rejected.
pub fn to_update(patch: &GraphPatch, document: Option<&str>) -> Result<String> {
    if patch
        .deletes
        .iter()
        .any(|t| matches!(t.subject, Term::Blank(_)) || matches!(t.object, Term::Blank(_)))
    {
        return Err(Error::UnsupportedPatch(
            "blank nodes cannot be deleted by a data update".to_string(),
        ));
    }

    let mut operations = Vec::new();
    if !patch.deletes.is_empty() {
        operations.push(render_block("DELETE", &patch.deletes, document));
    }
    if !patch.inserts.is_empty() {
        operations.push(render_block("INSERT", &patch.inserts, document));
    }
    Ok(operations.join(" ;\n"))
}

// ============================================================================
// Parsing
// ============================================================================

struct UpdateParser<'a> {
    cursor: Cursor<'a>,
    base: String,
    prefixes: HashMap<String, String>,
}

impl UpdateParser<'_> {
    fn expand_pname(&self, name: &str, offset: usize) -> Result<String> {
        let (prefix, local) = name
            .split_once(':')
            .ok_or_else(|| Error::syntax(offset, format!("expected prefixed name, got '{name}'")))?;
        self.prefixes
            .get(prefix)
            .map(String::as_str)
            .or_else(|| vocab::namespace(prefix))
            .map(|ns| format!("{ns}{local}"))
            .ok_or_else(|| Error::syntax(offset, format!("undeclared prefix '{prefix}:'")))
    }

    fn iri(&mut self) -> Result<String> {
        self.cursor.skip_ws();
        if self.cursor.peek() == Some('<') {
            let raw = self.cursor.read_iriref()?;
            return Ok(resolve_iri(&self.base, &raw));
        }
        let at = self.cursor.pos();
        let name = self.cursor.read_name();
        if name.is_empty() {
            return Err(self.cursor.error("expected IRI"));
        }
        self.expand_pname(name, at)
    }

    fn term(&mut self) -> Result<Term> {
        self.cursor.skip_ws();
        match self.cursor.peek() {
            Some('<') => Ok(Term::Iri(self.iri()?)),
            Some('"' | '\'') => {
                let prefixes = &self.prefixes;
                self.cursor.read_literal(|name, offset| {
                    let (prefix, local) = name
                        .split_once(':')
                        .ok_or_else(|| Error::syntax(offset, "expected datatype"))?;
                    prefixes
                        .get(prefix)
                        .map(String::as_str)
                        .or_else(|| vocab::namespace(prefix))
                        .map(|ns| format!("{ns}{local}"))
                        .ok_or_else(|| Error::syntax(offset, format!("undeclared prefix '{prefix}:'")))
                })
            }
            Some('?' | '$') => Err(self.cursor.error("variables are not supported in patches")),
            Some('_') => Ok(Term::Blank(self.cursor.read_blank()?)),
            Some(c) if c.is_ascii_digit() || c == '-' => {
                let number = self.cursor.read_name();
                let datatype = if number.contains(['.', 'e', 'E']) {
                    vocab::xsd::DOUBLE
                } else {
                    vocab::xsd::INTEGER
                };
                Ok(Term::typed_literal(number, datatype))
            }
            _ => {
                let at = self.cursor.pos();
                let name = self.cursor.read_name();
                match name {
                    "true" | "false" => Ok(Term::typed_literal(name, vocab::xsd::BOOLEAN)),
                    "" => Err(self.cursor.error("expected term")),
                    _ => Ok(Term::Iri(self.expand_pname(name, at)?)),
                }
            }
        }
    }

    fn predicate(&mut self) -> Result<String> {
        if self.cursor.eat_keyword("a") {
            return Ok(vocab::rdf::TYPE.to_string());
        }
        self.iri()
    }

    /// Triples up to and including the closing brace.
    fn block(&mut self) -> Result<Graph> {
        self.cursor.expect('{')?;
        let mut graph = Graph::new();
        loop {
            if self.cursor.eat('}') {
                return Ok(graph);
            }
            let subject = self.term()?;
            if subject.is_literal() {
                return Err(self.cursor.error("literal in subject position"));
            }
            loop {
                let predicate = self.predicate()?;
                loop {
                    let object = self.term()?;
                    graph.insert_triple(Triple::new(subject.clone(), predicate.clone(), object));
                    if !self.cursor.eat(',') {
                        break;
                    }
                }
                if !self.cursor.eat(';') {
                    break;
                }
                self.cursor.skip_ws();
                if matches!(self.cursor.peek(), Some('.' | '}')) {
                    break;
                }
            }
            if !self.cursor.eat('.') {
                self.cursor.skip_ws();
                if self.cursor.peek() != Some('}') {
                    return Err(self.cursor.error("expected '.' or '}'"));
                }
            }
        }
    }

    fn empty_where(&mut self) -> Result<()> {
        if !self.cursor.eat_keyword("WHERE") {
            return Err(self.cursor.error("expected WHERE"));
        }
        self.cursor.expect('{')?;
        if !self.cursor.eat('}') {
            return Err(self.cursor.error("only an empty WHERE pattern is supported"));
        }
        Ok(())
    }

    fn parse(mut self) -> Result<GraphPatch> {
        let mut patch = GraphPatch::default();
        while !self.cursor.at_end() {
            if self.cursor.eat_keyword("PREFIX") {
                let at = self.cursor.pos();
                let name = self.cursor.read_name();
                let prefix = name
                    .strip_suffix(':')
                    .ok_or_else(|| Error::syntax(at, "expected prefix name ending in ':'"))?
                    .to_string();
                self.cursor.skip_ws();
                let namespace = self.cursor.read_iriref()?;
                self.prefixes.insert(prefix, namespace);
                continue;
            }
            if self.cursor.eat_keyword("BASE") {
                self.cursor.skip_ws();
                let raw = self.cursor.read_iriref()?;
                self.base = resolve_iri(&self.base, &raw);
                continue;
            }

            if self.cursor.eat_keyword("DELETE") {
                let data = self.cursor.eat_keyword("DATA");
                patch.deletes.extend(self.block()?);
                if !data {
                    if self.cursor.eat_keyword("INSERT") {
                        patch.inserts.extend(self.block()?);
                    }
                    self.empty_where()?;
                }
            } else if self.cursor.eat_keyword("INSERT") {
                let data = self.cursor.eat_keyword("DATA");
                patch.inserts.extend(self.block()?);
                if !data {
                    self.empty_where()?;
                }
            } else {
                return Err(self.cursor.error("expected PREFIX, DELETE or INSERT"));
            }
            self.cursor.eat(';');
        }
        Ok(patch)
    }
}

/// Parse a SPARQL-Update script into a patch. `<>` and other relative IRIs
/// resolve against `base`, the IRI of the resource being patched.
pub fn parse_update(text: &str, base: &str) -> Result<GraphPatch> {
    UpdateParser {
        cursor: Cursor::new(text),
        base: base.to_string(),
        prefixes: HashMap::new(),
    }
    .parse()
}

// ============================================================================
// Tests
// ============================================================================
