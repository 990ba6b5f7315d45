pub mod manager;
mod setup;
mod smtp;
mod templates;

pub use manager::SecureEmailManager;
pub use setup::{setup_email_credentials, test_email_configuration};
pub use smtp::{Mailer, SmtpCredentials, SmtpMailer};
pub use templates::{reset_code_message, reset_link_message, ResetMessage};

#[cfg(test)]
pub(crate) use smtp::tests::MockMailer;
