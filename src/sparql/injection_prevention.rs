//! SPARQL Injection Prevention
//!
//! Every value that ends up inside a query string passes through this module:
//!
//! - **IriValidator**: absolute IRI validation for URI parameters
//! - **SparqlSanitizer**: escaping of string literals and IRIs
//! - **SafeLiteralBuilder**: typed and language-tagged literal construction
//!
//! Validation happens before any store access, so a malformed entity type or
//! identifier never costs a round-trip.
//!
//! # Example
//!
//! ```rust
//! use registry_graph::sparql::injection_prevention::{IriValidator, SafeLiteralBuilder};
//!
//! assert!(IriValidator::require_absolute("https://pid.bayer.com/kos/19050/PID_Concept").is_ok());
//! assert!(IriValidator::require_absolute("INVALID_Uri").is_err());
//!
//! let label = SafeLiteralBuilder::string("Bonjour").language("fr").build().unwrap();
//! assert_eq!(label, "\"Bonjour\"@fr");
//! ```

use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;

// ============================================================================
// Error Types
// ============================================================================

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SparqlSecurityError {
    #[error("Invalid IRI: {0}")]
    InvalidIri(String),

    #[error("Invalid URI scheme in: {0}")]
    InvalidScheme(String),

    #[error("Relative URI where an absolute URI is required: {0}")]
    RelativeUri(String),

    #[error("Invalid language tag: {0}")]
    InvalidLanguageTag(String),

    #[error("Invalid literal: {0}")]
    InvalidLiteral(String),

    #[error("Query parameter @{0} is not bound")]
    UnboundParameter(String),
}

pub type Result<T> = std::result::Result<T, SparqlSecurityError>;

static SCHEME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z][A-Za-z0-9+.\-]*:").expect("scheme pattern"));
static HIERARCHICAL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z][A-Za-z0-9+.\-]*://[^/?#\s]+").expect("authority pattern"));
static LANGUAGE_TAG: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z]{1,8}(-[A-Za-z0-9]{1,8})*$").expect("language pattern"));

/// Characters that may never appear inside an IRIREF
const FORBIDDEN_IRI_CHARS: &[char] = &['<', '>', '"', '{', '}', '|', '\\', '^', '`'];

// ============================================================================
// IriValidator
// ============================================================================

/// Validates IRIs before they are bound into a query.
pub struct IriValidator;

impl IriValidator {
    /// Validate an IRI's character set.
    pub fn validate(iri: &str) -> Result<()> {
        if iri.is_empty() {
            return Err(SparqlSecurityError::InvalidIri(iri.to_string()));
        }

        if iri
            .chars()
            .any(|ch| ch.is_whitespace() || ch.is_control() || FORBIDDEN_IRI_CHARS.contains(&ch))
        {
            return Err(SparqlSecurityError::InvalidIri(iri.to_string()));
        }

        Ok(())
    }

    /// Check if IRI is absolute (has scheme and something after it).
    pub fn is_absolute(iri: &str) -> bool {
        Self::require_absolute(iri).is_ok()
    }

    /// Validate IRI is absolute and well formed.
    ///
    /// `http`/`https` IRIs must also carry an authority.
    pub fn require_absolute(iri: &str) -> Result<()> {
        Self::validate(iri)?;

        let Some(scheme) = SCHEME.find(iri) else {
            return Err(SparqlSecurityError::RelativeUri(iri.to_string()));
        };

        if scheme.end() == iri.len() {
            return Err(SparqlSecurityError::RelativeUri(iri.to_string()));
        }

        let scheme_name = iri[..scheme.end() - 1].to_ascii_lowercase();
        if matches!(scheme_name.as_str(), "http" | "https") && !HIERARCHICAL.is_match(iri) {
            return Err(SparqlSecurityError::InvalidScheme(iri.to_string()));
        }

        Ok(())
    }
}

// ============================================================================
// SparqlSanitizer
// ============================================================================

/// Escaping for values embedded in query text.
pub struct SparqlSanitizer;

impl SparqlSanitizer {
    /// Escape a string for use between double quotes.
    pub fn escape_string(input: &str) -> String {
        let mut escaped = String::with_capacity(input.len() + 8);
        for ch in input.chars() {
            match ch {
                '\\' => escaped.push_str("\\\\"),
                '"' => escaped.push_str("\\\""),
                '\'' => escaped.push_str("\\'"),
                '\n' => escaped.push_str("\\n"),
                '\r' => escaped.push_str("\\r"),
                '\t' => escaped.push_str("\\t"),
                _ => escaped.push(ch),
            }
        }
        escaped
    }

    /// Render an absolute IRI as `<iri>`.
    pub fn escape_iri(input: &str) -> Result<String> {
        IriValidator::require_absolute(input)?;
        Ok(format!("<{}>", input))
    }
}

// ============================================================================
// SafeLiteralBuilder
// ============================================================================

/// Builder for SPARQL literals.
#[derive(Debug, Clone, PartialEq)]
pub struct SafeLiteralBuilder {
    value: String,
    datatype: Option<String>,
    language: Option<String>,
}

impl SafeLiteralBuilder {
    /// Create a plain string literal.
    pub fn string(value: &str) -> Self {
        Self {
            value: value.to_string(),
            datatype: None,
            language: None,
        }
    }

    /// Create an `xsd:integer` literal.
    pub fn integer(value: i64) -> Self {
        Self::string(&value.to_string())
            .with_datatype("http://www.w3.org/2001/XMLSchema#integer")
    }

    /// Create an `xsd:boolean` literal.
    pub fn boolean(value: bool) -> Self {
        Self::string(&value.to_string())
            .with_datatype("http://www.w3.org/2001/XMLSchema#boolean")
    }

    /// Set a custom datatype.
    pub fn with_datatype(mut self, datatype: &str) -> Self {
        self.datatype = Some(datatype.to_string());
        self
    }

    /// Set a language tag. Takes precedence over a datatype.
    pub fn language(mut self, lang: &str) -> Self {
        self.language = Some(lang.to_string());
        self
    }

    /// Build the literal as query text.
    pub fn build(self) -> Result<String> {
        let mut result = format!("\"{}\"", SparqlSanitizer::escape_string(&self.value));

        if let Some(lang) = self.language {
            if !LANGUAGE_TAG.is_match(&lang) {
                return Err(SparqlSecurityError::InvalidLanguageTag(lang));
            }
            result.push('@');
            result.push_str(&lang);
        } else if let Some(datatype) = self.datatype {
            result.push_str("^^");
            result.push_str(&SparqlSanitizer::escape_iri(&datatype)?);
        }

        Ok(result)
    }
}

// ============================================================================
// Tests
// ============================================================================
