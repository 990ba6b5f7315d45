use super::smtp::Mailer;
use crate::modules::utils::time::format_duration;

/// A fully rendered message ready for the mailer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResetMessage {
    pub to: String,
    pub subject: String,
    pub body: String,
}

impl ResetMessage {
    pub fn send(&self, mailer: &dyn Mailer) -> Result<(), String> {
        mailer.send(&self.to, &self.subject, &self.body)
    }
}

/// Message carrying a one-time reset code
pub fn reset_code_message(to: &str, code: &str, ttl_secs: u64, app_name: &str) -> ResetMessage {
    let body = format!(
        "Hello,\n\n\
        A password reset was requested for your {app} account.\n\n\
        Your verification code is:\n\
        \n\
        {code}\n\
        \n\
        Enter it within {ttl}.\n\n\
        If you did not request this reset, you can ignore this email; \
        your password has not been changed.\n\n\
        The {app} Team",
        app = app_name,
        code = code,
        ttl = format_duration(ttl_secs),
    );

    ResetMessage {
        to: to.to_string(),
        subject: format!("{} - Password reset code", app_name),
        body,
    }
}

/// Message carrying a signed reset link
pub fn reset_link_message(to: &str, link: &str, max_age_secs: u64, app_name: &str) -> ResetMessage {
    let body = format!(
        "Hello,\n\n\
        A password reset was requested for your {app} account.\n\n\
        Open the following link to choose a new password:\n\
        \n\
        {link}\n\
        \n\
        This link will expire in {ttl}.\n\n\
        If you did not request this reset, you can ignore this email; \
        your password has not been changed.\n\n\
        The {app} Team",
        app = app_name,
        link = link,
        ttl = format_duration(max_age_secs),
    );

    ResetMessage {
        to: to.to_string(),
        subject: format!("{} - Reset your password", app_name),
        body,
    }
}
