use std::future::Future;
use std::sync::OnceLock;

use regex::Regex;
use thiserror::Error;

pub const SUBMIT_LABEL: &str = "Send Message";
pub const SENDING_LABEL: &str = "Sending...";
pub const SUCCESS_NOTICE: &str = "Thank you for your message! We'll get back to you soon.";

const EMAIL_PATTERN: &str = r"^[^\s@]+@[^\s@]+\.[^\s@]+$";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ContactError {
    #[error("Please fill in all fields.")]
    MissingFields,
    #[error("Please enter a valid email address.")]
    InvalidEmail,
}

impl ContactError {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::MissingFields => "missing_fields",
            Self::InvalidEmail => "invalid_email",
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ContactForm {
    pub name: String,
    pub email: String,
    pub message: String,
}

impl ContactForm {
    pub fn validate(&self) -> Result<(), ContactError> {
        if self.name.is_empty() || self.email.is_empty() || self.message.is_empty() {
            return Err(ContactError::MissingFields);
        }

        if !email_regex().is_match(&self.email) {
            return Err(ContactError::InvalidEmail);
        }

        Ok(())
    }
}

fn email_regex() -> &'static Regex {
    static EMAIL: OnceLock<Regex> = OnceLock::new();
    EMAIL.get_or_init(|| Regex::new(EMAIL_PATTERN).expect("email pattern is valid"))
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SubmitState {
    #[default]
    Idle,
    Sending,
}

impl SubmitState {
    pub fn button_label(self) -> &'static str {
        match self {
            Self::Idle => SUBMIT_LABEL,
            Self::Sending => SENDING_LABEL,
        }
    }

    pub fn disabled(self) -> bool {
        matches!(self, Self::Sending)
    }
}

/// Validates, then waits on `delay` in place of a network round trip.
/// Validation failures return before `delay` is polled.
pub async fn submit<D>(form: &ContactForm, delay: D) -> Result<&'static str, ContactError>
where
    D: Future<Output = ()>,
{
    form.validate()?;
    delay.await;
    Ok(SUCCESS_NOTICE)
}
