//! Time helpers
//!
//! All persisted timestamps are milliseconds since the Unix epoch.

/// Current time in epoch milliseconds
pub fn time_now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}
