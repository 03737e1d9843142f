use super::OutboundEmail;
use crate::config::MailConfig;

fn link(config: &MailConfig, path: &str, token: &str) -> String {
    let base = config.public_server_url.trim_end_matches('/');
    format!("{base}/{path}?token={token}")
}

pub fn verification(config: &MailConfig, to: &str, token: &str) -> OutboundEmail {
    let url = link(config, "verify-email", token);
    OutboundEmail {
        from: config.from_email.clone(),
        to: to.to_string(),
        subject: "Please Verify Your Email".to_string(),
        html: format!(
            "<b>Thank you for creating an account. Please follow the link to verify your email.</b>\n\
             <a href=\"{url}\">Verify Email</a>"
        ),
    }
}

pub fn password_reset(config: &MailConfig, to: &str, token: &str) -> OutboundEmail {
    let url = link(config, "reset-password", token);
    OutboundEmail {
        from: config.from_email.clone(),
        to: to.to_string(),
        subject: "Forgot Password?".to_string(),
        html: format!(
            "<b>Please follow the link to reset your password.</b>\n\
             <a href=\"{url}\">Reset Password</a>"
        ),
    }
}
