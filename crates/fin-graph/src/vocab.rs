//! Vocabulary IRIs read and written by the client.

/// RDF core.
pub mod rdf {
    /// `rdf:type`
    pub const TYPE: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#type";
}

/// RDF Schema.
pub mod rdfs {
    /// `rdfs:label`
    pub const LABEL: &str = "http://www.w3.org/2000/01/rdf-schema#label";
}

/// XML Schema datatypes.
pub mod xsd {
    /// `xsd:string`
    pub const STRING: &str = "http://www.w3.org/2001/XMLSchema#string";
    /// `xsd:integer`
    pub const INTEGER: &str = "http://www.w3.org/2001/XMLSchema#integer";
    /// `xsd:double`
    pub const DOUBLE: &str = "http://www.w3.org/2001/XMLSchema#double";
    /// `xsd:boolean`
    pub const BOOLEAN: &str = "http://www.w3.org/2001/XMLSchema#boolean";
}

/// W3C Web Access Control.
pub mod acl {
    /// Namespace
    pub const NS: &str = "http://www.w3.org/ns/auth/acl#";
    /// `acl:Authorization`
    pub const AUTHORIZATION: &str = "http://www.w3.org/ns/auth/acl#Authorization";
    /// `acl:accessTo`
    pub const ACCESS_TO: &str = "http://www.w3.org/ns/auth/acl#accessTo";
    /// `acl:agent`
    pub const AGENT: &str = "http://www.w3.org/ns/auth/acl#agent";
    /// `acl:agentClass`
    pub const AGENT_CLASS: &str = "http://www.w3.org/ns/auth/acl#agentClass";
    /// `acl:mode`
    pub const MODE: &str = "http://www.w3.org/ns/auth/acl#mode";
    /// `acl:Read`
    pub const READ: &str = "http://www.w3.org/ns/auth/acl#Read";
    /// `acl:Write`
    pub const WRITE: &str = "http://www.w3.org/ns/auth/acl#Write";
    /// `acl:accessControl`
    pub const ACCESS_CONTROL: &str = "http://www.w3.org/ns/auth/acl#accessControl";
}

/// Linked Data Platform.
pub mod ldp {
    /// Namespace
    pub const NS: &str = "http://www.w3.org/ns/ldp#";
    /// `ldp:contains`
    pub const CONTAINS: &str = "http://www.w3.org/ns/ldp#contains";
    /// `ldp:Container`
    pub const CONTAINER: &str = "http://www.w3.org/ns/ldp#Container";
    /// `ldp:BasicContainer`
    pub const BASIC_CONTAINER: &str = "http://www.w3.org/ns/ldp#BasicContainer";
    /// `ldp:RDFSource`
    pub const RDF_SOURCE: &str = "http://www.w3.org/ns/ldp#RDFSource";
}

/// Friend of a Friend.
pub mod foaf {
    /// Namespace
    pub const NS: &str = "http://xmlns.com/foaf/0.1/";
    /// `foaf:Agent`, the class of every requester
    pub const AGENT: &str = "http://xmlns.com/foaf/0.1/Agent";
    /// `foaf:Group`
    pub const GROUP: &str = "http://xmlns.com/foaf/0.1/Group";
    /// `foaf:member`
    pub const MEMBER: &str = "http://xmlns.com/foaf/0.1/member";
}

/// Well-known prefixes, recognized in JSON-LD contexts and SPARQL scripts
/// without a declaration.
pub const PREFIXES: &[(&str, &str)] = &[
    ("rdf", "http://www.w3.org/1999/02/22-rdf-syntax-ns#"),
    ("rdfs", "http://www.w3.org/2000/01/rdf-schema#"),
    ("xsd", "http://www.w3.org/2001/XMLSchema#"),
    ("acl", acl::NS),
    ("ldp", ldp::NS),
    ("foaf", foaf::NS),
];

/// Look up a well-known prefix.
pub fn namespace(prefix: &str) -> Option<&'static str> {
    PREFIXES
        .iter()
        .find(|(p, _)| *p == prefix)
        .map(|(_, ns)| *ns)
}
