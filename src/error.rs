use thiserror::Error as ThisError;

/// Top-level error type for the crate.
///
/// Every failure mode — credential handling, transport, vendor business
/// errors, request validation, local persistence — collapses into this
/// one enum so the route layer has a single contract to map from.
#[derive(Debug, ThisError)]
pub enum Error {
    // ── Authentication ──────────────────────────────────────────────
    /// The vendor rejected the credentials (wrong password, revoked
    /// refresh token, expired grant). Re-login is required.
    #[error("authentication failed: {message}")]
    Auth { message: String },

    // ── Transport ───────────────────────────────────────────────────
    /// HTTP transport error (connection refused, timeout, non-2xx).
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    // ── Vendor ──────────────────────────────────────────────────────
    /// Business error the vendor reports inside an HTTP 200 body
    /// (`errcode` != 0).
    #[error("vendor error {code}: {message}")]
    Vendor { code: i64, message: String },

    // ── Validation ──────────────────────────────────────────────────
    /// The caller's request was malformed; nothing was sent upstream.
    #[error("invalid request: {message}")]
    Validation { message: String },

    // ── Local state ─────────────────────────────────────────────────
    /// Reading or writing the credential store failed.
    #[error("credential storage error: {0}")]
    Storage(#[from] std::io::Error),

    /// A response body did not match the expected shape.
    #[error("deserialization error: {message}")]
    Deserialization { message: String },
}

impl Error {
    pub fn auth(message: impl Into<String>) -> Self {
        Self::Auth {
            message: message.into(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Returns `true` if this is a transient failure worth retrying.
    ///
    /// Only transport-level faults qualify; auth rejections and vendor
    /// business errors are deterministic and retrying cannot help.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Transport(e) => e.is_timeout() || e.is_connect() || e.is_status(),
            _ => false,
        }
    }

    /// Stable machine-readable label for the error family, used in
    /// response bodies and metric labels.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Auth { .. } => "auth",
            Self::Transport(_) => "transport",
            Self::Vendor { .. } => "vendor",
            Self::Validation { .. } => "validation",
            Self::Storage(_) => "storage",
            Self::Deserialization { .. } => "deserialization",
        }
    }

    /// Extract the vendor `errcode`, if this error carries one.
    pub fn vendor_code(&self) -> Option<i64> {
        match self {
            Self::Vendor { code, .. } => Some(*code),
            _ => None,
        }
    }
}
