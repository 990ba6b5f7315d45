use lettre::message::header::ContentType;
use lettre::transport::smtp::authentication::Credentials;
use lettre::transport::smtp::client::{Tls, TlsParameters};
use lettre::transport::smtp::PoolConfig;
use lettre::{Message, SmtpTransport, Transport};
use serde::{Deserialize, Serialize};

/// Outgoing mail collaborator. Implementations must not retry on their own;
/// a failed send is reported to the caller.
pub trait Mailer {
    fn send(&self, to: &str, subject: &str, body: &str) -> Result<(), String>;
}

/// Structure to hold SMTP credentials with metadata
#[derive(Serialize, Deserialize, Clone)]
pub struct SmtpCredentials {
    // The email address/username for SMTP authentication
    pub username: String,
    // The password or app-specific password for SMTP
    pub password: String,
    // SMTP server hostname (e.g., smtp.gmail.com)
    pub host: String,
    // SMTP server port (typically 587 for STARTTLS)
    pub port: u16,
    // When these credentials were last updated
    pub last_updated: u64,
}

/// Sends plain-text mail through an authenticated SMTP relay
pub struct SmtpMailer {
    credentials: SmtpCredentials,
    sender_name: String,
}

impl SmtpMailer {
    pub fn new(credentials: SmtpCredentials, sender_name: &str) -> Self {
        Self {
            credentials,
            sender_name: sender_name.to_string(),
        }
    }

    fn build_message(&self, to: &str, subject: &str, body: &str) -> Result<Message, String> {
        Message::builder()
            .from(
                format!("{} <{}>", self.sender_name, self.credentials.username)
                    .parse()
                    .map_err(|e| format!("Invalid from address: {}", e))?,
            )
            .to(to.parse().map_err(|e| format!("Invalid to address: {}", e))?)
            .subject(subject)
            .header(ContentType::TEXT_PLAIN)
            .body(body.to_string())
            .map_err(|e| format!("Failed to create email: {}", e))
    }
}

impl Mailer for SmtpMailer {
    fn send(&self, to: &str, subject: &str, body: &str) -> Result<(), String> {
        let email = self.build_message(to, subject, body)?;
        let creds = &self.credentials;

        let tls_parameters = TlsParameters::builder(creds.host.clone())
            .build()
            .map_err(|e| format!("Failed to build TLS parameters: {}", e))?;

        let mailer = SmtpTransport::relay(&creds.host)
            .map_err(|e| format!("Failed to create SMTP transport: {}", e))?
            .credentials(Credentials::new(creds.username.clone(), creds.password.clone()))
            .port(creds.port)
            .tls(Tls::Required(tls_parameters))
            .pool_config(PoolConfig::new().max_size(1))
            .timeout(Some(std::time::Duration::from_secs(10)))
            .build();

        match mailer.send(&email) {
            Ok(_) => {
                log::info!("Email sent to {}", crate::modules::utils::logging::format_sensitive(to));
                Ok(())
            }
            Err(e) => Err(format!("Failed to send email: {}", e)),
        }
    }
}
