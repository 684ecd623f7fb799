use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::{error::SubmissionError, protocol::ContactRequest};

static EMAIL_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern is a valid regex")
});

/// `local@domain.tld` shape check. Deliberately loose: no RFC 5322 parsing.
pub fn is_valid_email(candidate: &str) -> bool {
    EMAIL_PATTERN.is_match(candidate)
}

/// A contact form submission whose required fields are present and whose
/// email passed the syntax check. Lives for one request only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactSubmission {
    pub name: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    pub message: String,
}

impl ContactSubmission {
    /// Trims every field and validates in order: presence of name, email and
    /// message first, then email syntax.
    pub fn parse(
        name: &str,
        email: &str,
        phone: Option<&str>,
        message: &str,
    ) -> Result<Self, SubmissionError> {
        let name = name.trim();
        let email = email.trim();
        let message = message.trim();

        if name.is_empty() || email.is_empty() || message.is_empty() {
            return Err(SubmissionError::MissingRequiredField);
        }
        if !is_valid_email(email) {
            return Err(SubmissionError::InvalidEmail);
        }

        let phone = phone
            .map(str::trim)
            .filter(|phone| !phone.is_empty())
            .map(str::to_string);

        Ok(Self {
            name: name.to_string(),
            email: email.to_string(),
            phone,
            message: message.to_string(),
        })
    }

    pub fn to_request(&self) -> ContactRequest {
        ContactRequest {
            name: Some(self.name.clone()),
            email: Some(self.email.clone()),
            phone: Some(self.phone.clone().unwrap_or_default()),
            message: Some(self.message.clone()),
        }
    }
}

/// The relay's view of a request: fields are trimmed for the presence check,
/// but the email must match the syntax check exactly as received.
impl TryFrom<&ContactRequest> for ContactSubmission {
    type Error = SubmissionError;

    fn try_from(request: &ContactRequest) -> Result<Self, Self::Error> {
        let email = request.email.as_deref().unwrap_or_default();
        let submission = Self::parse(
            request.name.as_deref().unwrap_or_default(),
            email,
            request.phone.as_deref(),
            request.message.as_deref().unwrap_or_default(),
        )?;
        if !is_valid_email(email) {
            return Err(SubmissionError::InvalidEmail);
        }
        Ok(submission)
    }
}
