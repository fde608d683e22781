//! JSON-LD codec.
//!
//! The repository answers GETs with expanded JSON-LD: an array of node
//! objects keyed by full predicate IRIs. Payloads written by hand (admin
//! templates, CLI input) are often compacted with a small `@context`, so the
//! parser also understands prefix and term definitions, `@graph`, nested node
//! objects and native JSON values. Serialization always produces the
//! expanded form, one node object per subject.

use std::collections::HashMap;

use serde_json::{Map, Value};

use crate::{Error, Graph, Result, Term, Triple, resolve_iri, vocab};

// ============================================================================
// Context
// ============================================================================

#[derive(Default)]
struct Context {
    terms: HashMap<String, String>,
    coerce_id: HashMap<String, bool>,
}

impl Context {
    fn from_value(value: Option<&Value>) -> Result<Self> {
        let mut ctx = Context::default();
        let entries = match value {
            None | Some(Value::Null) => return Ok(ctx),
            Some(Value::Object(map)) => map,
            Some(Value::Array(items)) => {
                for item in items {
                    let sub = Context::from_value(Some(item))?;
                    ctx.terms.extend(sub.terms);
                    ctx.coerce_id.extend(sub.coerce_id);
                }
                return Ok(ctx);
            }
            Some(Value::String(url)) => {
                log::warn!("Ignoring remote JSON-LD context {url}");
                return Ok(ctx);
            }
            Some(_) => return Err(Error::jsonld("@context must be an object")),
        };

        for (term, definition) in entries {
            match definition {
                Value::String(iri) => {
                    ctx.terms.insert(term.clone(), iri.clone());
                }
                Value::Object(def) => {
                    if let Some(Value::String(iri)) = def.get("@id") {
                        ctx.terms.insert(term.clone(), iri.clone());
                    }
                    if def.get("@type").and_then(Value::as_str) == Some("@id") {
                        ctx.coerce_id.insert(term.clone(), true);
                    }
                }
                _ => log::debug!("Skipping unsupported context entry '{term}'"),
            }
        }
        Ok(ctx)
    }

    /// Expand a term, prefixed name or absolute IRI. Relative references are
    /// returned unchanged.
    fn expand(&self, value: &str) -> String {
        if let Some(iri) = self.terms.get(value) {
            return self.expand_once(iri);
        }
        self.expand_once(value)
    }

    fn expand_once(&self, value: &str) -> String {
        if let Some((prefix, local)) = value.split_once(':')
            && !local.starts_with("//")
            && prefix != "_"
        {
            if let Some(ns) = self.terms.get(prefix) {
                return format!("{ns}{local}");
            }
            if let Some(ns) = vocab::namespace(prefix) {
                return format!("{ns}{local}");
            }
        }
        value.to_string()
    }

    fn is_id_coerced(&self, key: &str) -> bool {
        self.coerce_id.get(key).copied().unwrap_or(false)
    }
}

// ============================================================================
// Parsing
// ============================================================================

struct Parser<'a> {
    ctx: Context,
    base: Option<&'a str>,
    graph: Graph,
    next_blank: usize,
}

impl Parser<'_> {
    fn fresh_blank(&mut self) -> Term {
        self.next_blank += 1;
        Term::blank(format!("b{}", self.next_blank))
    }

    fn reference(&self, raw: &str) -> Term {
        if let Some(label) = raw.strip_prefix("_:") {
            return Term::blank(label);
        }
        let expanded = self.ctx.expand(raw);
        match self.base {
            Some(base) => Term::Iri(resolve_iri(base, &expanded)),
            None => Term::Iri(expanded),
        }
    }

    fn node(&mut self, object: &Map<String, Value>) -> Result<Term> {
        let subject = match object.get("@id") {
            Some(Value::String(id)) => self.reference(id),
            Some(_) => return Err(Error::jsonld("@id must be a string")),
            None => self.fresh_blank(),
        };

        for (key, value) in object {
            match key.as_str() {
                "@id" | "@context" => {}
                "@type" => {
                    for class in as_array(value) {
                        let class = class
                            .as_str()
                            .ok_or_else(|| Error::jsonld("@type entries must be strings"))?;
                        let class = self.reference(class);
                        self.graph
                            .insert(subject.clone(), vocab::rdf::TYPE, class);
                    }
                }
                "@graph" => {
                    for item in as_array(value) {
                        if let Value::Object(inner) = item {
                            self.node(inner)?;
                        }
                    }
                }
                k if k.starts_with('@') => log::debug!("Skipping JSON-LD keyword {k}"),
                k => {
                    let predicate = self.ctx.expand(k);
                    let coerce = self.ctx.is_id_coerced(k);
                    for item in as_array(value) {
                        if let Some(object) = self.value(item, coerce)? {
                            self.graph.insert_triple(Triple::new(
                                subject.clone(),
                                predicate.clone(),
                                object,
                            ));
                        }
                    }
                }
            }
        }
        Ok(subject)
    }

    fn value(&mut self, item: &Value, coerce_id: bool) -> Result<Option<Term>> {
        let term = match item {
            Value::Null => return Ok(None),
            Value::String(s) if coerce_id => self.reference(s),
            Value::String(s) => Term::literal(s.clone()),
            Value::Bool(b) => Term::typed_literal(b.to_string(), vocab::xsd::BOOLEAN),
            Value::Number(n) if n.is_f64() => Term::typed_literal(n.to_string(), vocab::xsd::DOUBLE),
            Value::Number(n) => Term::typed_literal(n.to_string(), vocab::xsd::INTEGER),
            Value::Array(_) => return Err(Error::jsonld("nested arrays are not supported")),
            Value::Object(obj) => {
                if let Some(raw) = obj.get("@value") {
                    value_object(raw, obj, &self.ctx)?
                } else if obj.contains_key("@list") || obj.contains_key("@set") {
                    return Err(Error::jsonld("@list and @set values are not supported"));
                } else if obj.len() == 1
                    && let Some(Value::String(id)) = obj.get("@id")
                {
                    self.reference(id)
                } else {
                    self.node(obj)?
                }
            }
        };
        Ok(Some(term))
    }
}

fn value_object(raw: &Value, obj: &Map<String, Value>, ctx: &Context) -> Result<Term> {
    let lexical = match raw {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        _ => return Err(Error::jsonld("@value must be a scalar")),
    };
    if let Some(Value::String(lang)) = obj.get("@language") {
        return Ok(Term::lang_literal(lexical, lang.clone()));
    }
    match obj.get("@type") {
        Some(Value::String(dt)) => Ok(Term::typed_literal(lexical, ctx.expand(dt))),
        Some(_) => Err(Error::jsonld("value @type must be a string")),
        None => Ok(match raw {
            Value::Number(n) if n.is_f64() => Term::typed_literal(lexical, vocab::xsd::DOUBLE),
            Value::Number(_) => Term::typed_literal(lexical, vocab::xsd::INTEGER),
            Value::Bool(_) => Term::typed_literal(lexical, vocab::xsd::BOOLEAN),
            _ => Term::literal(lexical),
        }),
    }
}

fn as_array(value: &Value) -> Vec<&Value> {
    match value {
        Value::Array(items) => items.iter().collect(),
        other => vec![other],
    }
}

/// Parse a JSON-LD value into a graph.
///
/// When `base` is given, relative `@id`s (including `""`, the document
/// itself) are resolved against it; otherwise they are kept verbatim.
pub fn from_value(value: &Value, base: Option<&str>) -> Result<Graph> {
    let context = match value {
        Value::Object(obj) => obj.get("@context"),
        _ => None,
    };
    let mut parser = Parser {
        ctx: Context::from_value(context)?,
        base,
        graph: Graph::new(),
        next_blank: 0,
    };

    match value {
        Value::Array(items) => {
            for item in items {
                match item {
                    Value::Object(obj) => {
                        parser.node(obj)?;
                    }
                    _ => return Err(Error::jsonld("top-level array must hold node objects")),
                }
            }
        }
        Value::Object(obj) if obj.contains_key("@graph") && !obj.contains_key("@id") => {
            for item in as_array(&obj["@graph"]) {
                if let Value::Object(inner) = item {
                    parser.node(inner)?;
                }
            }
        }
        Value::Object(obj) => {
            parser.node(obj)?;
        }
        _ => return Err(Error::jsonld("expected a node object or an array of them")),
    }

    log::trace!("Parsed {} triples from JSON-LD", parser.graph.len());
    Ok(parser.graph)
}

/// Parse JSON-LD text into a graph. See [`from_value`].
pub fn parse(text: &str, base: Option<&str>) -> Result<Graph> {
    if text.trim().is_empty() {
        return Ok(Graph::new());
    }
    let value: Value = serde_json::from_str(text)?;
    from_value(&value, base)
}

// ============================================================================
// Serialization
// ============================================================================

fn term_to_value(term: &Term) -> Value {
    let mut obj = Map::new();
    match term {
        Term::Iri(iri) => {
            obj.insert("@id".into(), Value::String(iri.clone()));
        }
        Term::Blank(label) => {
            obj.insert("@id".into(), Value::String(format!("_:{label}")));
        }
        Term::Literal {
            value,
            datatype,
            language,
        } => {
            obj.insert("@value".into(), Value::String(value.clone()));
            if let Some(lang) = language {
                obj.insert("@language".into(), Value::String(lang.clone()));
            } else if let Some(dt) = datatype {
                obj.insert("@type".into(), Value::String(dt.clone()));
            }
        }
    }
    Value::Object(obj)
}

/// Render a graph as expanded JSON-LD.
pub fn to_value(graph: &Graph) -> Value {
    let mut nodes = Vec::new();
    for subject in graph.subjects() {
        let mut obj = Map::new();
        let id = match subject {
            Term::Blank(label) => format!("_:{label}"),
            other => other.value().to_string(),
        };
        obj.insert("@id".into(), Value::String(id));
        let mut types = Vec::new();
        for triple in graph.about(subject) {
            if triple.predicate == vocab::rdf::TYPE
                && let Term::Iri(class) = &triple.object
            {
                types.push(Value::String(class.clone()));
                continue;
            }
            let entry = obj
                .entry(triple.predicate.clone())
                .or_insert_with(|| Value::Array(Vec::new()));
            if let Value::Array(values) = entry {
                values.push(term_to_value(&triple.object));
            }
        }
        if !types.is_empty() {
            obj.insert("@type".into(), Value::Array(types));
        }
        nodes.push(Value::Object(obj));
    }
    Value::Array(nodes)
}

/// Render a graph as expanded JSON-LD text.
pub fn serialize(graph: &Graph) -> Result<String> {
    Ok(serde_json::to_string_pretty(&to_value(graph))?)
}

// ============================================================================
// Tests
// ============================================================================
