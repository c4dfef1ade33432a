//! Outgoing mail. Messages are written to the log, not delivered.

use tracing::info;

#[derive(Debug, Clone)]
pub struct Mailer {
    frontend_url: String,
}

impl Mailer {
    pub fn new(frontend_url: &str) -> Self {
        Self {
            frontend_url: frontend_url.trim_end_matches('/').to_owned(),
        }
    }

    pub fn reset_link(&self, token: &str) -> String {
        format!("{}/reset-password?token={}", self.frontend_url, urlencoding::encode(token))
    }

    pub fn send_password_reset(&self, to: &str, token: &str) {
        info!(
            to,
            link = %self.reset_link(token),
            "Password reset email"
        );
    }

    pub fn send_verification_code(&self, to: &str, code: &str) {
        info!(to, code, "Email verification code");
    }

    pub fn send_contact_notification(&self, from_name: &str, from_email: &str, request_type: &str) {
        info!(
            from_name,
            from_email,
            request_type,
            "Contact form notification"
        );
    }

    pub fn send_contact_request_notice(&self, scout_email: &str, player_name: &str) {
        info!(scout_email, player_name, "Contact request received");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reset_link_encodes_token() {
        let mailer = Mailer::new("https://app.example.com/");

        assert_eq!(
            mailer.reset_link("a+b"),
            "https://app.example.com/reset-password?token=a%2Bb"
        );
    }
}
