use env_logger::{Builder, Env, WriteStyle};
use log::{error, info, warn};
use std::fs::OpenOptions;
use std::path::Path;

/// Initialize the logging system writing to `log_file`.
/// `RUST_LOG` takes precedence over `default_level`.
pub fn initialize_logging(log_file: &Path, default_level: &str) -> Result<(), Box<dyn std::error::Error>> {
    // Create or append to log file with proper permissions
    let file = OpenOptions::new().create(true).append(true).open(log_file)?;

    Builder::from_env(Env::default().default_filter_or(default_level))
        .format_timestamp_secs()
        .format_module_path(true)
        .write_style(WriteStyle::Never)
        .target(env_logger::Target::Pipe(Box::new(file)))
        .try_init()?;

    info!("Logging system initialized");
    Ok(())
}

/// Helper function to format sensitive data for logging
pub fn format_sensitive(text: &str) -> String {
    let chars: Vec<char> = text.chars().collect();
    if chars.len() <= 4 {
        return "*".repeat(chars.len());
    }
    let head: String = chars[..2].iter().collect();
    let tail: String = chars[chars.len() - 2..].iter().collect();
    format!("{}***{}", head, tail)
}

/// Add structured logging for authentication events
pub fn log_auth_event(event_type: &str, user: &str, success: bool, details: Option<&str>) {
    let timestamp = chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string();
    if success {
        info!(
            "Auth event: type={}, user={}, success=true, timestamp={}, details={:?}",
            event_type,
            format_sensitive(user),
            timestamp,
            details
        );
    } else {
        warn!(
            "Auth event: type={}, user={}, success=false, timestamp={}, details={:?}",
            event_type,
            format_sensitive(user),
            timestamp,
            details
        );
    }
}

/// Add structured logging for data operations
pub fn log_data_operation(
    operation: &str,
    user: &str,
    resource: &str,
    success: bool,
    details: Option<&str>,
) {
    let timestamp = chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string();
    if success {
        info!(
            "Data operation: op={}, user={}, resource={}, success=true, timestamp={}, details={:?}",
            operation,
            format_sensitive(user),
            resource,
            timestamp,
            details
        );
    } else {
        error!(
            "Data operation: op={}, user={}, resource={}, success=false, timestamp={}, details={:?}",
            operation,
            format_sensitive(user),
            resource,
            timestamp,
            details
        );
    }
}
