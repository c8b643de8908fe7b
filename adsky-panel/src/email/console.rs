//! Console-based email sender for development

use super::EmailSender;

/// Email sender that prints to the console (for development)
pub struct ConsoleEmailSender;

impl ConsoleEmailSender {
    pub fn new() -> Self {
        Self
    }

    fn print(&self, heading: &str, email: &str, label: &str, value: &str) {
        println!();
        println!("========================================");
        println!("  {} FOR: {}", heading, email);
        println!("  {}: {}", label, value);
        println!("========================================");
        println!();
    }
}

impl Default for ConsoleEmailSender {
    fn default() -> Self {
        Self::new()
    }
}

impl EmailSender for ConsoleEmailSender {
    fn send_registration_link(&self, email: &str, link: &str) -> Result<(), String> {
        self.print("REGISTRATION LINK", email, "LINK", link);
        tracing::info!(email = %email, "Registration link printed to console");
        Ok(())
    }

    fn send_reset_link(&self, email: &str, link: &str) -> Result<(), String> {
        self.print("PASSWORD RESET LINK", email, "LINK", link);
        tracing::info!(email = %email, "Password reset link printed to console");
        Ok(())
    }

    fn send_new_password(&self, email: &str, password: &str) -> Result<(), String> {
        self.print("NEW PASSWORD", email, "PASSWORD", password);
        tracing::info!(email = %email, "New password printed to console");
        Ok(())
    }
}
