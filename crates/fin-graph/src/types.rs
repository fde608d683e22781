//! Core graph types.
//!
//! A [`Graph`] is a set of `(subject, predicate, object)` triples. Objects
//! are sum-typed ([`Term`]): a reference (IRI or blank node) or a literal
//! with an optional datatype or language tag. No predicate is hard-modelled;
//! [`Node`] offers generic lookups plus a few typed accessors for the
//! predicates the ACL engine reads.

use std::collections::BTreeSet;
use std::fmt;

use crate::vocab;

// ============================================================================
// Term
// ============================================================================

/// An RDF term.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Term {
    /// An IRI reference. The empty IRI denotes the enclosing document.
    Iri(String),
    /// A blank node label, without the `_:` prefix.
    Blank(String),
    /// A literal. `xsd:string` is never stored as an explicit datatype.
    Literal {
        /// Lexical form
        value: String,
        /// Datatype IRI, if not a plain string
        datatype: Option<String>,
        /// Language tag, lowercased
        language: Option<String>,
    },
}

impl Term {
    /// An IRI term.
    pub fn iri(iri: impl Into<String>) -> Self {
        Term::Iri(iri.into())
    }

    /// A blank node term.
    pub fn blank(label: impl Into<String>) -> Self {
        Term::Blank(label.into())
    }

    /// A plain string literal.
    pub fn literal(value: impl Into<String>) -> Self {
        Term::Literal {
            value: value.into(),
            datatype: None,
            language: None,
        }
    }

    /// A typed literal. `xsd:string` collapses to a plain literal.
    pub fn typed_literal(value: impl Into<String>, datatype: impl Into<String>) -> Self {
        let datatype = datatype.into();
        Term::Literal {
            value: value.into(),
            datatype: (datatype != vocab::xsd::STRING).then_some(datatype),
            language: None,
        }
    }

    /// A language-tagged literal.
    pub fn lang_literal(value: impl Into<String>, language: impl Into<String>) -> Self {
        Term::Literal {
            value: value.into(),
            datatype: None,
            language: Some(language.into().to_lowercase()),
        }
    }

    /// The IRI, if this is an IRI term.
    pub fn as_iri(&self) -> Option<&str> {
        match self {
            Term::Iri(iri) => Some(iri),
            _ => None,
        }
    }

    /// The lexical form, if this is a literal.
    pub fn as_literal(&self) -> Option<&str> {
        match self {
            Term::Literal { value, .. } => Some(value),
            _ => None,
        }
    }

    /// IRI, blank label or lexical form, whichever applies.
    pub fn value(&self) -> &str {
        match self {
            Term::Iri(s) | Term::Blank(s) => s,
            Term::Literal { value, .. } => value,
        }
    }

    /// Whether this is an IRI or blank node.
    pub fn is_reference(&self) -> bool {
        matches!(self, Term::Iri(_) | Term::Blank(_))
    }

    /// Whether this is a literal.
    pub fn is_literal(&self) -> bool {
        matches!(self, Term::Literal { .. })
    }
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&crate::ntriples::format_term(self))
    }
}

// ============================================================================
// Triple
// ============================================================================

/// One statement.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Triple {
    /// Subject (IRI or blank node)
    pub subject: Term,
    /// Predicate IRI
    pub predicate: String,
    /// Object
    pub object: Term,
}

impl Triple {
    /// Create a triple.
    pub fn new(subject: Term, predicate: impl Into<String>, object: Term) -> Self {
        Self {
            subject,
            predicate: predicate.into(),
            object,
        }
    }
}

impl fmt::Display for Triple {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} <{}> {} .",
            self.subject,
            crate::ntriples::escape_iri(&self.predicate),
            self.object
        )
    }
}

// ============================================================================
// Graph
// ============================================================================

/// A set of triples, ordered by subject then predicate then object.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Graph {
    triples: BTreeSet<Triple>,
}

impl Graph {
    /// An empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of triples.
    pub fn len(&self) -> usize {
        self.triples.len()
    }

    /// Whether the graph has no triples.
    pub fn is_empty(&self) -> bool {
        self.triples.is_empty()
    }

    /// Add a statement. Returns `false` if it was already present.
    pub fn insert(&mut self, subject: Term, predicate: impl Into<String>, object: Term) -> bool {
        self.triples.insert(Triple::new(subject, predicate, object))
    }

    /// Add a triple. Returns `false` if it was already present.
    pub fn insert_triple(&mut self, triple: Triple) -> bool {
        self.triples.insert(triple)
    }

    /// Remove a triple. Returns `false` if it was absent.
    pub fn remove(&mut self, triple: &Triple) -> bool {
        self.triples.remove(triple)
    }

    /// Whether the triple is present.
    pub fn contains(&self, triple: &Triple) -> bool {
        self.triples.contains(triple)
    }

    /// Iterate in order.
    pub fn iter(&self) -> impl Iterator<Item = &Triple> {
        self.triples.iter()
    }

    /// Distinct subjects.
    pub fn subjects(&self) -> BTreeSet<&Term> {
        self.triples.iter().map(|t| &t.subject).collect()
    }

    /// Triples about `subject`.
    pub fn about<'a>(&'a self, subject: &'a Term) -> impl Iterator<Item = &'a Triple> + 'a {
        let lower = Triple::new(subject.clone(), String::new(), Term::Iri(String::new()));
        self.triples
            .range(lower..)
            .take_while(move |t| &t.subject == subject)
    }

    /// Objects of `(subject, predicate, ?)`.
    pub fn objects<'a>(
        &'a self,
        subject: &'a Term,
        predicate: &'a str,
    ) -> impl Iterator<Item = &'a Term> + 'a {
        self.about(subject)
            .filter(move |t| t.predicate == predicate)
            .map(|t| &t.object)
    }

    /// View of the node with the given IRI.
    pub fn node(&self, iri: &str) -> Node<'_> {
        Node {
            graph: self,
            subject: Term::iri(iri),
        }
    }

    /// View of every subject in the graph.
    pub fn nodes(&self) -> impl Iterator<Item = Node<'_>> {
        self.subjects().into_iter().map(move |subject| Node {
            graph: self,
            subject: subject.clone(),
        })
    }

    /// Nodes typed with `class`.
    pub fn nodes_of_type<'a>(&'a self, class: &'a str) -> impl Iterator<Item = Node<'a>> + 'a {
        self.nodes().filter(move |n| n.has_type(class))
    }

    /// Replace every occurrence of IRI `from` (subject or object) with `to`.
    pub fn rename_iri(&mut self, from: &str, to: &str) {
        if from == to {
            return;
        }
        let rename = |term: Term| match term {
            Term::Iri(iri) if iri == from => Term::Iri(to.to_string()),
            other => other,
        };
        self.triples = std::mem::take(&mut self.triples)
            .into_iter()
            .map(|t| Triple {
                subject: rename(t.subject),
                predicate: t.predicate,
                object: rename(t.object),
            })
            .collect();
    }

    /// Drop every triple with the given subject and predicate.
    pub fn remove_property(&mut self, subject: &Term, predicate: &str) -> usize {
        let before = self.triples.len();
        self.triples
            .retain(|t| !(&t.subject == subject && t.predicate == predicate));
        before - self.triples.len()
    }

    /// Triples in `self` but not in `other`.
    pub fn difference(&self, other: &Graph) -> Graph {
        self.triples.difference(&other.triples).cloned().collect()
    }
}

impl FromIterator<Triple> for Graph {
    fn from_iter<I: IntoIterator<Item = Triple>>(iter: I) -> Self {
        Self {
            triples: iter.into_iter().collect(),
        }
    }
}

impl Extend<Triple> for Graph {
    fn extend<I: IntoIterator<Item = Triple>>(&mut self, iter: I) {
        self.triples.extend(iter);
    }
}

impl IntoIterator for Graph {
    type Item = Triple;
    type IntoIter = std::collections::btree_set::IntoIter<Triple>;

    fn into_iter(self) -> Self::IntoIter {
        self.triples.into_iter()
    }
}

impl<'a> IntoIterator for &'a Graph {
    type Item = &'a Triple;
    type IntoIter = std::collections::btree_set::Iter<'a, Triple>;

    fn into_iter(self) -> Self::IntoIter {
        self.triples.iter()
    }
}

// ============================================================================
// Node view
// ============================================================================

/// Read-only view of one subject's properties.
#[derive(Clone, Debug)]
pub struct Node<'a> {
    graph: &'a Graph,
    subject: Term,
}

impl<'a> Node<'a> {
    /// The subject term.
    pub fn id(&self) -> &Term {
        &self.subject
    }

    /// The subject IRI, if it is one.
    pub fn iri(&self) -> Option<&str> {
        self.subject.as_iri()
    }

    /// Whether the node has any triples at all.
    pub fn exists(&self) -> bool {
        self.graph.about(&self.subject).next().is_some()
    }

    /// Objects of `predicate`.
    pub fn objects(&self, predicate: &str) -> Vec<&'a Term> {
        let lower = Triple::new(
            self.subject.clone(),
            predicate.to_string(),
            Term::Iri(String::new()),
        );
        self.graph
            .triples
            .range(lower..)
            .take_while(|t| t.subject == self.subject && t.predicate == predicate)
            .map(|t| &t.object)
            .collect()
    }

    /// IRI objects of `predicate`.
    pub fn iris(&self, predicate: &str) -> Vec<&'a str> {
        self.objects(predicate)
            .into_iter()
            .filter_map(Term::as_iri)
            .collect()
    }

    /// IRI or literal values of `predicate`.
    pub fn values(&self, predicate: &str) -> Vec<&'a str> {
        self.objects(predicate)
            .into_iter()
            .filter(|t| !matches!(t, Term::Blank(_)))
            .map(Term::value)
            .collect()
    }

    /// First value of `predicate`.
    pub fn value(&self, predicate: &str) -> Option<&'a str> {
        self.values(predicate).into_iter().next()
    }

    /// `rdf:type` IRIs.
    pub fn types(&self) -> Vec<&'a str> {
        self.iris(vocab::rdf::TYPE)
    }

    /// Whether the node carries `rdf:type class`.
    pub fn has_type(&self, class: &str) -> bool {
        self.types().contains(&class)
    }

    // ------------------------------------------------------------------------
    // Typed accessors
    // ------------------------------------------------------------------------

    /// `acl:accessTo` targets.
    pub fn access_to(&self) -> Vec<&'a str> {
        self.iris(vocab::acl::ACCESS_TO)
    }

    /// `acl:agent` values; agents may be IRIs or literals.
    pub fn agents(&self) -> Vec<&'a Term> {
        self.objects(vocab::acl::AGENT)
    }

    /// `acl:agentClass` IRIs.
    pub fn agent_classes(&self) -> Vec<&'a str> {
        self.iris(vocab::acl::AGENT_CLASS)
    }

    /// `acl:mode` IRIs.
    pub fn modes(&self) -> Vec<&'a str> {
        self.iris(vocab::acl::MODE)
    }

    /// `foaf:member` values.
    pub fn members(&self) -> Vec<&'a Term> {
        self.objects(vocab::foaf::MEMBER)
    }

    /// `ldp:contains` children.
    pub fn contains(&self) -> Vec<&'a str> {
        self.iris(vocab::ldp::CONTAINS)
    }

    /// `acl:accessControl` links.
    pub fn access_controls(&self) -> Vec<&'a str> {
        self.iris(vocab::acl::ACCESS_CONTROL)
    }

    /// First `rdfs:label`.
    pub fn label(&self) -> Option<&'a str> {
        self.objects(vocab::rdfs::LABEL)
            .into_iter()
            .find_map(Term::as_literal)
    }
}

// ============================================================================
// IRI resolution
// ============================================================================

fn has_scheme(reference: &str) -> bool {
    match reference.find(':') {
        Some(idx) if idx > 0 => {
            let scheme = &reference[..idx];
            scheme.starts_with(|c: char| c.is_ascii_alphabetic())
                && scheme
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
        }
        _ => false,
    }
}

/// Resolve a possibly relative IRI reference against `base`.
///
/// Handles the forms that appear in repository payloads: the empty reference
/// (the document itself), fragments, absolute paths and path-relative names.
/// Dot segments are not collapsed.
pub fn resolve_iri(base: &str, reference: &str) -> String {
    if has_scheme(reference) {
        return reference.to_string();
    }
    let base_doc = base.split('#').next().unwrap_or(base);
    if reference.is_empty() {
        return base_doc.to_string();
    }
    if reference.starts_with('#') {
        return format!("{base_doc}{reference}");
    }

    let (scheme, rest) = match base_doc.find("://") {
        Some(idx) => (&base_doc[..idx], &base_doc[idx + 3..]),
        None => return reference.to_string(),
    };
    if let Some(network) = reference.strip_prefix("//") {
        return format!("{scheme}://{network}");
    }
    let (authority, path) = match rest.find('/') {
        Some(idx) => (&rest[..idx], &rest[idx..]),
        None => (rest, "/"),
    };
    if reference.starts_with('/') {
        return format!("{scheme}://{authority}{reference}");
    }
    let directory = match path.rfind('/') {
        Some(idx) => &path[..=idx],
        None => "/",
    };
    let reference = reference.strip_prefix("./").unwrap_or(reference);
    format!("{scheme}://{authority}{directory}{reference}")
}

// ============================================================================
// Tests
// ============================================================================
