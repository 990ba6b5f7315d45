use lazy_static::lazy_static;
use regex::Regex;
use std::io::{self, Write};

lazy_static! {
    // Non-empty local part, one '@', and a domain containing a dot
    static ref EMAIL_SHAPE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
}

/// Helper function to read a line from stdin
pub fn read_line() -> io::Result<String> {
    let mut input = String::new();
    io::stdin().read_line(&mut input)?;
    Ok(input.trim().to_string())
}

/// Print a prompt and read the answer
pub fn prompt(label: &str) -> io::Result<String> {
    print!("{}: ", label);
    io::stdout().flush()?;
    read_line()
}

/// Helper function to validate email format
pub fn is_valid_email(email: &str) -> bool {
    EMAIL_SHAPE.is_match(email)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_email_validation() {
        // Valid emails
        assert!(is_valid_email("user@example.com"));
        assert!(is_valid_email("user.name@example.co.uk"));
        assert!(is_valid_email("user+tag@example.com"));
        assert!(is_valid_email("a@b.c"));

        // Invalid emails
        assert!(!is_valid_email("user@example")); // Missing TLD
        assert!(!is_valid_email("user example.com")); // Contains space
        assert!(!is_valid_email("user")); // No @ symbol
        assert!(!is_valid_email("")); // Empty string
        assert!(!is_valid_email("user@@example.com")); // Multiple @ symbols
        assert!(!is_valid_email("@example.com")); // Empty local part
        assert!(!is_valid_email("user@example.")); // Empty after the dot
    }
}
