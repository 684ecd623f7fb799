use std::time::Instant;

use shared::{domain::ContactSubmission, error::SubmissionError};
use tracing::{info, warn};

use crate::{
    client::{ClientError, RelayClient},
    feedback::{BannerKind, FeedbackSlot},
    form::{ContactForm, SubmitControl},
};

pub const DEFAULT_SUCCESS_MESSAGE: &str = "Mensagem enviada com sucesso!";
pub const DEFAULT_FAILURE_MESSAGE: &str = "Erro ao enviar mensagem.";
pub const SERVER_OFFLINE_MESSAGE: &str =
    "⚠️ Servidor offline. Verifique se o backend está em execução e tente novamente.";
const CONNECTION_PREFIX: &str = "Erro ao conectar com o servidor. ";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// Local validation failed; nothing was sent.
    Rejected(SubmissionError),
    Sent,
    Failed,
}

/// Maps transport error text to the banner shown to the user.
pub fn classify_transport_failure(message: &str) -> String {
    let lower = message.to_ascii_lowercase();
    if lower.contains("backend unreachable")
        || lower.contains("connection refused")
        || lower.contains("failed to connect")
        || lower.contains("tcp connect error")
        || lower.contains("dns error")
    {
        SERVER_OFFLINE_MESSAGE.to_string()
    } else if lower.contains("timed out") || lower.contains("network") {
        format!("{CONNECTION_PREFIX}Verifique sua conexão com a internet.")
    } else {
        format!("{CONNECTION_PREFIX}{message}")
    }
}

/// Drives one contact form: validation, the submit control, the request, and
/// the feedback banner.
pub struct FormController {
    client: RelayClient,
    pub form: ContactForm,
    pub submit: SubmitControl,
    pub feedback: FeedbackSlot,
    probe_before_submit: bool,
}

impl FormController {
    pub fn new(client: RelayClient) -> Self {
        Self {
            client,
            form: ContactForm::default(),
            submit: SubmitControl::default(),
            feedback: FeedbackSlot::default(),
            probe_before_submit: true,
        }
    }

    /// Skip the `GET /` reachability check before posting.
    pub fn without_probe(mut self) -> Self {
        self.probe_before_submit = false;
        self
    }

    pub async fn submit(&mut self) -> SubmitOutcome {
        let submission = match self.form.validate() {
            Ok(submission) => submission,
            Err(err) => {
                self.feedback
                    .show(BannerKind::Error, err.user_message(), Instant::now());
                return SubmitOutcome::Rejected(err);
            }
        };

        self.submit.begin_sending();
        let outcome = self.dispatch(&submission).await;
        self.submit.restore();
        outcome
    }

    async fn dispatch(&mut self, submission: &ContactSubmission) -> SubmitOutcome {
        if self.probe_before_submit && !self.client.probe().await {
            let err = ClientError::BackendUnreachable(self.client.server_url().clone());
            return self.transport_failed(&err);
        }

        let reply = match self.client.submit(submission).await {
            Ok(reply) => reply,
            Err(err) => return self.transport_failed(&err),
        };

        if reply.is_success() {
            let text = reply.server_message().unwrap_or(DEFAULT_SUCCESS_MESSAGE);
            info!(status = reply.status, "contact form delivered");
            self.feedback.show(BannerKind::Success, text, Instant::now());
            self.form.clear();
            SubmitOutcome::Sent
        } else {
            let text = reply.server_message().unwrap_or(DEFAULT_FAILURE_MESSAGE);
            warn!(status = reply.status, %text, "relay refused contact form");
            self.feedback.show(BannerKind::Error, text, Instant::now());
            SubmitOutcome::Failed
        }
    }

    fn transport_failed(&mut self, err: &ClientError) -> SubmitOutcome {
        warn!(error = %err, "contact form request failed");
        self.feedback.show(
            BannerKind::Error,
            classify_transport_failure(&err.to_string()),
            Instant::now(),
        );
        SubmitOutcome::Failed
    }
}
