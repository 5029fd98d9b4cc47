//! Tokens issued by the asset upload protocol.
//!
//! Both are opaque strings. Neither is ever printed: `Debug` redacts them.

use std::fmt;

/// Session-scoped bearer credential for upload-batch calls.
///
/// Owned by an `UploadSession`; dropped with it when the uploader returns.
#[derive(Clone, PartialEq, Eq)]
pub struct AuthorizationToken(String);

impl AuthorizationToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for AuthorizationToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AuthorizationToken([REDACTED])")
    }
}

/// Proof that the service received every asset of a session.
#[derive(Clone, PartialEq, Eq)]
pub struct CompletionToken(String);

impl CompletionToken {
    /// Wrap a token from an upload-batch response; empty strings are not tokens.
    pub fn from_response(token: Option<String>) -> Option<Self> {
        token.filter(|t| !t.is_empty()).map(Self)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Debug for CompletionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("CompletionToken([REDACTED])")
    }
}
