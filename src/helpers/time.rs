use chrono::Utc;

pub const SAFETY_MARGIN_SECONDS_DEFAULT: u64 = 300;

/// Safety margin applied when computing a token's expiry, so callers
/// never observe a token that expires mid-flight.
pub fn token_safety_margin_seconds(safety_margin_seconds_settings: Option<u64>) -> u64 {
    safety_margin_seconds_settings.unwrap_or(SAFETY_MARGIN_SECONDS_DEFAULT)
}

pub fn now_i64() -> i64 {
    Utc::now().timestamp()
}

/// Epoch millis, the timestamp format the vendor expects in its `date`
/// common parameter.
pub fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}
