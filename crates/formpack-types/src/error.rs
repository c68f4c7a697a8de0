/// Errors that can occur while dereferencing an ephemeral (`blob:`) URI.
///
/// These never abort an encode. The encoder logs them and falls back to
/// the raw file descriptor, so a single bad attachment cannot block the
/// rest of a form. They are still typed so resolvers and tests can tell
/// the cases apart.
///
/// ```text
/// ┌──────────────────────────────────────────────────────────┐
/// │ ResolveError (this crate)                                │
/// │   ├── NotFound           URI was never minted or revoked │
/// │   ├── UnsupportedScheme  resolver cannot handle the URI  │
/// │   ├── Fetch              transport/read failure          │
/// │   └── NoRuntime          no async runtime to resolve on  │
/// └──────────────────────────────────────────────────────────┘
/// ```
#[derive(Debug, thiserror::Error)]
pub enum ResolveError {
  /// The resolver has no resource under this URI.
  #[error("no blob registered under {uri}")]
  NotFound { uri: String },

  /// The URI does not use a scheme this resolver understands.
  #[error("unsupported URI scheme for blob resolution: {uri}")]
  UnsupportedScheme { uri: String },

  /// The resource exists but reading it failed.
  #[error("failed to fetch {uri}: {reason}")]
  Fetch { uri: String, reason: String },

  /// Resolution was requested outside of any async runtime.
  #[error("no async runtime available to resolve {uri}")]
  NoRuntime { uri: String },
}

impl ResolveError {
  /// The URI the failed resolution was about.
  #[must_use]
  pub fn uri(&self) -> &str {
    match self {
      Self::NotFound { uri }
      | Self::UnsupportedScheme { uri }
      | Self::Fetch { uri, .. }
      | Self::NoRuntime { uri } => uri,
    }
  }
}
