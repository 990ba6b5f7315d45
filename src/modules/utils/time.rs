use chrono::{DateTime, Local, TimeZone, Utc};
use std::time::{SystemTime, UNIX_EPOCH};

/// Function to format timestamp as readable date
pub fn format_timestamp(timestamp: u64) -> String {
    DateTime::from_timestamp(timestamp as i64, 0)
        .unwrap_or_default()
        .format("%Y-%m-%d %H:%M:%S")
        .to_string()
}

/// Get current Unix timestamp
pub fn get_current_timestamp() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

/// Format duration in seconds to human readable string
pub fn format_duration(seconds: u64) -> String {
    if seconds < 60 {
        format!("{} seconds", seconds)
    } else if seconds < 3600 {
        format!("{} minutes", seconds / 60)
    } else if seconds < 86400 {
        format!("{} hours", seconds / 3600)
    } else {
        format!("{} days", seconds / 86400)
    }
}

/// Convert UTC timestamp to local time string
pub fn utc_to_local(timestamp: u64) -> String {
    match Utc.timestamp_opt(timestamp as i64, 0).single() {
        Some(utc_time) => {
            let local_time: DateTime<Local> = DateTime::from(utc_time);
            local_time.format("%Y-%m-%d %H:%M:%S %Z").to_string()
        }
        None => format_timestamp(timestamp),
    }
}
