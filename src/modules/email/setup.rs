use super::smtp::{Mailer, SmtpMailer};
use super::SecureEmailManager;
use crate::modules::auth::password::read_password;
use crate::modules::utils::io::{is_valid_email, prompt};

/// Interactively collect SMTP settings and store them in the keyring
pub fn setup_email_credentials() -> Result<(), String> {
    println!("\n=== Email Configuration Setup ===");

    // Get and validate SMTP server
    let host = loop {
        let input = prompt("SMTP server address (e.g., smtp.gmail.com)")
            .map_err(|e| format!("Failed to read input: {}", e))?;

        if input.is_empty() || !input.contains('.') || input.contains(' ') {
            println!("Invalid SMTP server format. Please enter a valid domain.");
            continue;
        }
        break input;
    };

    // Get and validate SMTP port
    let port = loop {
        let input = prompt("SMTP port (default: 587)").map_err(|e| format!("Failed to read input: {}", e))?;
        if input.is_empty() {
            break 587;
        }
        match input.parse::<u16>() {
            Ok(p) if p > 0 => break p,
            _ => println!("Invalid port number. Please enter a number between 1 and 65535."),
        }
    };

    // Get and validate email address
    let username = loop {
        let input = prompt("Sender email address").map_err(|e| format!("Failed to read input: {}", e))?;
        if !is_valid_email(&input) {
            println!("Invalid email format. Please enter a valid email address.");
            continue;
        }
        break input;
    };

    let password = loop {
        println!("Enter email password or app-specific password:");
        let pass = read_password().map_err(|e| format!("Failed to read password: {}", e))?;
        if pass.trim().is_empty() {
            println!("Password cannot be empty. Please try again.");
            continue;
        }
        break pass;
    };

    let email_manager = SecureEmailManager::new()?;
    email_manager.store_credentials(&username, &password, &host, port)?;

    log::info!("SMTP credentials updated for host {}", host);
    println!("\nEmail configuration saved securely.");
    println!("Run 'email test <address>' to verify your configuration.");
    Ok(())
}

/// Send a test message using the stored credentials
pub fn test_email_configuration(to: &str, sender_name: &str) -> Result<(), String> {
    let creds = SecureEmailManager::new()?.get_credentials()?;

    println!("Testing email configuration with the following settings:");
    println!("SMTP Server: {}", creds.host);
    println!("SMTP Port: {}", creds.port);
    println!("Username: {}", creds.username);

    let mailer = SmtpMailer::new(creds, sender_name);
    mailer.send(
        to,
        &format!("{} - Email Configuration Test", sender_name),
        "This is a test email to verify your SMTP configuration.",
    )?;

    println!("Test email sent successfully to: {}", to);
    Ok(())
}
