use thiserror::Error;

pub const MISSING_FIELDS_MESSAGE: &str = "Por favor, preencha todos os campos obrigatórios.";
pub const INVALID_EMAIL_MESSAGE: &str = "Por favor, forneça um email válido.";
pub const PAYLOAD_TOO_LARGE_MESSAGE: &str = "Mensagem muito grande. Reduza o texto e tente novamente.";
pub const RELAY_SUCCESS_MESSAGE: &str =
    "Mensagem enviada com sucesso! Entrarei em contato em breve.";
pub const RELAY_FAILURE_MESSAGE: &str =
    "Erro ao enviar mensagem. Por favor, tente novamente mais tarde.";

/// Reasons a contact submission is rejected before any mail is sent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SubmissionError {
    #[error("one or more required fields are missing")]
    MissingRequiredField,
    #[error("email address is malformed")]
    InvalidEmail,
}

impl SubmissionError {
    /// Text shown to the person filling in the form.
    pub fn user_message(&self) -> &'static str {
        match self {
            SubmissionError::MissingRequiredField => MISSING_FIELDS_MESSAGE,
            SubmissionError::InvalidEmail => INVALID_EMAIL_MESSAGE,
        }
    }
}
