//! `Link` header parsing (RFC 8288).
//!
//! Repositories advertise ACL containers with `<url>; rel="acl"` entries.
//! One response may carry several `Link` headers, each holding a
//! comma-separated list of links; commas inside `<..>` or quoted parameter
//! values do not split entries.

/// One parsed link.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Link {
    /// Target URL as written between angle brackets.
    pub target: String,
    /// Relation types, lowercased.
    pub rels: Vec<String>,
    /// Other parameters, names lowercased, values unquoted.
    pub params: Vec<(String, String)>,
}

impl Link {
    /// Whether the link carries relation type `rel`.
    pub fn has_rel(&self, rel: &str) -> bool {
        self.rels.iter().any(|r| r.eq_ignore_ascii_case(rel))
    }

    /// Value of another parameter.
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// Split on `sep` outside `<..>` and double quotes.
fn split_outside(value: &str, sep: char) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut in_angle = false;
    let mut in_quote = false;
    let mut escaped = false;
    let mut start = 0;
    for (i, c) in value.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match c {
            '\\' if in_quote => escaped = true,
            '"' if !in_angle => in_quote = !in_quote,
            '<' if !in_quote => in_angle = true,
            '>' if !in_quote => in_angle = false,
            c if c == sep && !in_angle && !in_quote => {
                parts.push(&value[start..i]);
                start = i + c.len_utf8();
            }
            _ => {}
        }
    }
    parts.push(&value[start..]);
    parts
}

fn unquote(value: &str) -> String {
    let value = value.trim();
    match value
        .strip_prefix('"')
        .and_then(|v| v.strip_suffix('"'))
    {
        Some(inner) => inner.replace("\\\"", "\"").replace("\\\\", "\\"),
        None => value.to_string(),
    }
}

fn parse_one(entry: &str) -> Option<Link> {
    let entry = entry.trim();
    let rest = entry.strip_prefix('<')?;
    let end = rest.find('>')?;
    let target = rest[..end].trim().to_string();

    let mut rels = Vec::new();
    let mut params = Vec::new();
    for param in split_outside(&rest[end + 1..], ';') {
        let param = param.trim();
        if param.is_empty() {
            continue;
        }
        let (name, value) = match param.split_once('=') {
            Some((name, value)) => (name.trim().to_ascii_lowercase(), unquote(value)),
            None => (param.to_ascii_lowercase(), String::new()),
        };
        if name == "rel" {
            rels.extend(value.split_whitespace().map(str::to_ascii_lowercase));
        } else {
            params.push((name, value));
        }
    }
    Some(Link {
        target,
        rels,
        params,
    })
}

/// Parse one `Link` header value. Malformed entries are skipped.
pub fn parse_link_header(value: &str) -> Vec<Link> {
    split_outside(value, ',')
        .into_iter()
        .filter_map(|entry| {
            let link = parse_one(entry);
            if link.is_none() && !entry.trim().is_empty() {
                tracing::debug!(entry = entry.trim(), "Skipping malformed Link entry");
            }
            link
        })
        .collect()
}

/// Targets with relation `rel` across several header values, in order.
pub fn targets_with_rel<'a, I>(values: I, rel: &str) -> Vec<String>
where
    I: IntoIterator<Item = &'a str>,
{
    values
        .into_iter()
        .flat_map(parse_link_header)
        .filter(|link| link.has_rel(rel))
        .map(|link| link.target)
        .collect()
}

// ============================================================================
// Tests
// ============================================================================
