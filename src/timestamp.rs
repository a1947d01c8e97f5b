use chrono::{Local, LocalResult, TimeZone};

/// Seconds between the Unix epoch (1970) and Apple's reference date (2001).
pub const APPLE_EPOCH_OFFSET: i64 = 978_307_200;

/// The store records message dates in nanoseconds since the Apple epoch.
const NANOS_PER_SECOND: i64 = 1_000_000_000;

/// Convert a device-native timestamp to whole Unix seconds. Pure integer
/// arithmetic; sub-second precision is dropped, never rounded across a
/// second boundary.
pub fn to_unix_seconds(device_timestamp: i64) -> i64 {
    device_timestamp / NANOS_PER_SECOND + APPLE_EPOCH_OFFSET
}

/// Format Unix seconds as the fixed local date-time string used in document
/// timestamp cells.
pub fn format_local(unix_seconds: i64) -> String {
    match Local.timestamp_opt(unix_seconds, 0) {
        LocalResult::Single(dt) | LocalResult::Ambiguous(dt, _) => {
            dt.format("%m/%d/%Y %H:%M:%S").to_string()
        }
        // Out-of-range input; fall back to the raw number rather than fail the row.
        LocalResult::None => unix_seconds.to_string(),
    }
}
