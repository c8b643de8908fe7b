//! Email delivery abstractions

pub mod console;
pub mod smtp;

pub use console::ConsoleEmailSender;
pub use smtp::{SmtpConfig, SmtpEmailSender};

/// Trait for sending account emails
pub trait EmailSender: Send + Sync {
    /// Send the link confirming a new account
    fn send_registration_link(&self, email: &str, link: &str) -> Result<(), String>;

    /// Send the link that resets a forgotten password
    fn send_reset_link(&self, email: &str, link: &str) -> Result<(), String>;

    /// Send the password generated by a completed reset
    fn send_new_password(&self, email: &str, password: &str) -> Result<(), String>;
}

/// Allow using Box<dyn EmailSender> as an EmailSender
impl EmailSender for Box<dyn EmailSender> {
    fn send_registration_link(&self, email: &str, link: &str) -> Result<(), String> {
        (**self).send_registration_link(email, link)
    }

    fn send_reset_link(&self, email: &str, link: &str) -> Result<(), String> {
        (**self).send_reset_link(email, link)
    }

    fn send_new_password(&self, email: &str, password: &str) -> Result<(), String> {
        (**self).send_new_password(email, password)
    }
}
