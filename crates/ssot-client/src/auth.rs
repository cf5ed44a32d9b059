//! API token authentication.

use reqwest::RequestBuilder;

/// Inventory API token, sent as `Authorization: Token <token>`.
///
/// The [`Debug`] impl redacts the secret so the token never ends up in log
/// output.
#[derive(Clone, PartialEq, Eq)]
pub struct ApiToken(String);

impl ApiToken {
    #[must_use]
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }

    /// Header value for the `Authorization` header.
    #[must_use]
    pub fn header_value(&self) -> String {
        format!("Token {}", self.0)
    }

    /// Attach the token to a request.
    #[must_use]
    pub fn apply(&self, builder: RequestBuilder) -> RequestBuilder {
        builder.header(reqwest::header::AUTHORIZATION, self.header_value())
    }
}

impl std::fmt::Debug for ApiToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("ApiToken").field(&"[REDACTED]").finish()
    }
}
