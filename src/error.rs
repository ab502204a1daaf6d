use thiserror::Error;

/// Errors raised while registering patterns and handlers.
///
/// These are configuration errors: they surface at startup, before any
/// request is served, and are never retried.
#[derive(Debug, Error)]
pub enum RouteError {
    /// The pattern contains `//`.
    #[error("pattern contains multiple slashes: {0}")]
    MultipleSlashes(String),

    #[error("pattern must begin with '/': {0}")]
    MissingLeadingSlash(String),

    /// Malformed segment: bad parameter name, empty regexp or suffix, or a
    /// segment starting with `*`, `(` or `)`.
    #[error("invalid pattern: \"{0}\"")]
    InvalidPattern(String),

    #[error("invalid regexp in \"{segments}\": {source}")]
    InvalidRegex {
        segments: String,
        #[source]
        source: regex::Error,
    },

    #[error("can't define pattern after wildcard: \"{0}\"")]
    AfterWildcard(String),

    /// A second, differently-named wildcard at the same level.
    #[error("can't define \"{0}\" after \"{1}\"")]
    ConflictingWildcard(String, String),

    /// A dynamic segment of the same shape already exists with another name.
    #[error("invalid pattern name \"{name}\", as prev defined \"{previous}\"")]
    ConflictingName { name: String, previous: String },

    #[error("\"{method}\" already defined on \"{pattern}\"")]
    DuplicateHandler { method: String, pattern: String },

    #[error("invalid method: \"{0}\"")]
    InvalidMethod(String),
}
