use std::time::{SystemTime, UNIX_EPOCH};

/// Current wall-clock time in unix milliseconds.
///
/// Deadlines are expressed on this clock because clients stamp their
/// answers with it.
pub fn unix_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
