//! Parameterized query construction
//!
//! Templates name their parameters with `@name`. Every parameter is bound
//! through a typed setter that escapes or validates the value first:
//!
//! - [`ParameterizedQuery::uri`] accepts absolute IRIs only
//! - [`ParameterizedQuery::literal`] and friends escape literal text
//! - [`ParameterizedQuery::graphs`] expands a graph set into `FROM` clauses
//! - [`ParameterizedQuery::plain`] inserts trusted query text verbatim
//!
//! The first failed binding is kept and returned by [`ParameterizedQuery::build`],
//! so no query text is ever produced from an invalid identifier.
//!
//! ```rust
//! use registry_graph::sparql::ParameterizedQuery;
//!
//! let query = ParameterizedQuery::select("SELECT ?label @from WHERE { @subject rdfs:label ?label }")
//!     .graphs("from", ["https://pid.bayer.com/kos/19050/metadata/1.0"])
//!     .uri("subject", "https://pid.bayer.com/kos/19050/PID_Concept")
//!     .build()
//!     .unwrap();
//!
//! assert!(query.as_str().contains("FROM <https://pid.bayer.com/kos/19050/metadata/1.0>"));
//! ```

use super::injection_prevention::{
    IriValidator, Result, SafeLiteralBuilder, SparqlSanitizer, SparqlSecurityError,
};
use crate::vocab;
use ahash::AHashMap;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryKind {
    Select,
    Construct,
}

/// Executable query text, ready for a [`crate::store::TripleStore`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SparqlQuery {
    kind: QueryKind,
    text: String,
}

impl SparqlQuery {
    pub fn kind(&self) -> QueryKind {
        self.kind
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn len(&self) -> usize {
        self.text.len()
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}

impl fmt::Display for SparqlQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

/// Query template plus its typed parameter bindings
#[derive(Debug, Clone)]
pub struct ParameterizedQuery {
    kind: QueryKind,
    template: String,
    bindings: AHashMap<String, String>,
    with_prefixes: bool,
    error: Option<SparqlSecurityError>,
}

impl ParameterizedQuery {
    pub fn select(template: impl Into<String>) -> Self {
        Self::new(QueryKind::Select, template.into())
    }

    pub fn construct(template: impl Into<String>) -> Self {
        Self::new(QueryKind::Construct, template.into())
    }

    fn new(kind: QueryKind, template: String) -> Self {
        Self {
            kind,
            template,
            bindings: AHashMap::new(),
            with_prefixes: true,
            error: None,
        }
    }

    /// Skip the standard PREFIX block
    pub fn without_prefixes(mut self) -> Self {
        self.with_prefixes = false;
        self
    }

    /// Bind an absolute IRI as `<iri>`.
    pub fn uri(self, name: &str, iri: &str) -> Self {
        let rendered = SparqlSanitizer::escape_iri(iri);
        self.bind_result(name, rendered)
    }

    /// Bind a plain string literal.
    pub fn literal(self, name: &str, value: &str) -> Self {
        let rendered = SafeLiteralBuilder::string(value).build();
        self.bind_result(name, rendered)
    }

    /// Bind a language-tagged literal.
    pub fn lang_literal(self, name: &str, value: &str, language: &str) -> Self {
        let rendered = SafeLiteralBuilder::string(value).language(language).build();
        self.bind_result(name, rendered)
    }

    /// Bind a literal with an explicit datatype IRI.
    pub fn typed_literal(self, name: &str, value: &str, datatype: &str) -> Self {
        let rendered = SafeLiteralBuilder::string(value)
            .with_datatype(datatype)
            .build();
        self.bind_result(name, rendered)
    }

    /// Bind a boolean literal.
    pub fn boolean(self, name: &str, value: bool) -> Self {
        let rendered = SafeLiteralBuilder::boolean(value).build();
        self.bind_result(name, rendered)
    }

    /// Insert trusted query text verbatim. Never pass user input here.
    pub fn plain(mut self, name: &str, fragment: &str) -> Self {
        self.bindings.insert(name.to_string(), fragment.to_string());
        self
    }

    /// Expand a graph set into one `FROM <graph>` line per graph.
    ///
    /// An empty set expands to nothing, so the query runs against the
    /// store's default graph.
    pub fn graphs<I, G>(self, name: &str, graphs: I) -> Self
    where
        I: IntoIterator<Item = G>,
        G: AsRef<str>,
    {
        let rendered = from_clauses(graphs);
        self.bind_result(name, rendered)
    }

    /// Bind a set of IRIs as a `VALUES ?var { ... }` block.
    pub fn values<I, G>(self, name: &str, var: &str, iris: I) -> Self
    where
        I: IntoIterator<Item = G>,
        G: AsRef<str>,
    {
        let rendered = iris
            .into_iter()
            .map(|iri| SparqlSanitizer::escape_iri(iri.as_ref()))
            .collect::<Result<Vec<_>>>()
            .map(|iris| format!("VALUES ?{} {{ {} }}", var, iris.join(" ")));
        self.bind_result(name, rendered)
    }

    fn bind_result(mut self, name: &str, rendered: Result<String>) -> Self {
        match rendered {
            Ok(text) => {
                self.bindings.insert(name.to_string(), text);
            }
            Err(err) => {
                if self.error.is_none() {
                    self.error = Some(err);
                }
            }
        }
        self
    }

    /// Substitute every placeholder and produce the executable query.
    pub fn build(self) -> Result<SparqlQuery> {
        if let Some(err) = self.error {
            return Err(err);
        }

        let mut text = if self.with_prefixes {
            vocab::prefix_block()
        } else {
            String::new()
        };
        text.push_str(&substitute(&self.template, &self.bindings)?);

        Ok(SparqlQuery {
            kind: self.kind,
            text,
        })
    }
}

/// Render `FROM <g>` lines for a graph set, validating every graph IRI.
pub fn from_clauses<I, G>(graphs: I) -> Result<String>
where
    I: IntoIterator<Item = G>,
    G: AsRef<str>,
{
    let mut clauses = Vec::new();
    for graph in graphs {
        clauses.push(format!("FROM {}", SparqlSanitizer::escape_iri(graph.as_ref())?));
    }
    Ok(clauses.join("\n"))
}

fn is_name_char(ch: char) -> bool {
    ch.is_ascii_alphanumeric() || ch == '_'
}

/// Replace `@name` placeholders.
///
/// `@` directly after a quote or a word character belongs to a language tag
/// or an IRI and is left untouched.
fn substitute(template: &str, bindings: &AHashMap<String, String>) -> Result<String> {
    let mut out = String::with_capacity(template.len() + 128);
    let mut chars = template.char_indices().peekable();
    let mut previous: Option<char> = None;

    while let Some((idx, ch)) = chars.next() {
        let is_placeholder = ch == '@'
            && !matches!(previous, Some(p) if p == '"' || p == '\'' || is_name_char(p) || p == '<' || p == '/')
            && matches!(chars.peek(), Some((_, next)) if next.is_ascii_alphabetic() || *next == '_');

        if !is_placeholder {
            out.push(ch);
            previous = Some(ch);
            continue;
        }

        let start = idx + 1;
        let mut end = start;
        while let Some((pos, next)) = chars.peek().copied() {
            if !is_name_char(next) {
                break;
            }
            end = pos + next.len_utf8();
            chars.next();
        }

        let name = &template[start..end];
        let value = bindings
            .get(name)
            .ok_or_else(|| SparqlSecurityError::UnboundParameter(name.to_string()))?;
        out.push_str(value);
        previous = name.chars().last();
    }

    Ok(out)
}

/// Require every input to be an absolute IRI before any query work starts.
pub fn require_absolute_all<'a>(iris: impl IntoIterator<Item = &'a str>) -> Result<()> {
    for iri in iris {
        IriValidator::require_absolute(iri)?;
    }
    Ok(())
}
