use serde::{Deserialize, Serialize};

/// One authenticated session with the vendor cloud.
///
/// Replaced wholesale on refresh, never mutated field-by-field. The
/// lifecycle manager is the only writer; everything else gets clones.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenSet {
    pub access_token: String,
    pub refresh_token: String,
    /// Vendor-assigned account identifier.
    pub uid: i64,
    /// UNIX timestamp, safety margin already applied.
    pub expires_at: i64,
}

impl TokenSet {
    /// Build a TokenSet from a grant response.
    ///
    /// `expires_at = issued_at + expires_in − safety_margin`, so consumers
    /// never observe a token that expires mid-flight.
    pub fn from_grant(
        access_token: String,
        refresh_token: String,
        uid: i64,
        issued_at: i64,
        expires_in: u64,
        safety_margin_seconds: u64,
    ) -> Self {
        let expires_at = issued_at + expires_in as i64 - safety_margin_seconds as i64;
        Self {
            access_token,
            refresh_token,
            uid,
            expires_at,
        }
    }

    pub fn is_valid_at(&self, now: i64) -> bool {
        now < self.expires_at
    }
}
