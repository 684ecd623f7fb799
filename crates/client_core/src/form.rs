use shared::{domain::ContactSubmission, error::SubmissionError};

pub const SENDING_LABEL: &str = "ENVIANDO...";
pub const DEFAULT_SUBMIT_LABEL: &str = "ENVIAR";

/// Raw field values as typed by the user, untrimmed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContactForm {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub message: String,
}

impl ContactForm {
    pub fn validate(&self) -> Result<ContactSubmission, SubmissionError> {
        ContactSubmission::parse(&self.name, &self.email, Some(&self.phone), &self.message)
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmitControl {
    label: String,
    idle_label: String,
    enabled: bool,
}

impl Default for SubmitControl {
    fn default() -> Self {
        Self::new(DEFAULT_SUBMIT_LABEL)
    }
}

impl SubmitControl {
    pub fn new(label: impl Into<String>) -> Self {
        let label = label.into();
        Self {
            idle_label: label.clone(),
            label,
            enabled: true,
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub(crate) fn begin_sending(&mut self) {
        self.enabled = false;
        self.label = SENDING_LABEL.to_string();
    }

    pub(crate) fn restore(&mut self) {
        self.enabled = true;
        self.label = self.idle_label.clone();
    }
}
