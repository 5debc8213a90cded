use secrecy::SecretString;

// -------------------------------------------------------------------------------------------------
// Auth
// -------------------------------------------------------------------------------------------------
/// Supported forms of authentication
pub enum Auth {
    /// No authentication; enough for reading public repositories, not for writing
    Unauthenticated,

    /// Authenticate with a bearer token: a personal access token, fine-grained token, or app
    /// installation token with `contents: write` permission
    Token(SecretString),
}

impl std::fmt::Debug for Auth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Auth::Unauthenticated => f.write_str("Unauthenticated"),
            Auth::Token(_) => f.write_str("Token(<redacted>)"),
        }
    }
}
