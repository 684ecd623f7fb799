use std::sync::Arc;

use shared::{
    domain::ContactSubmission,
    error::SubmissionError,
    protocol::{ContactRequest, RelayResponse},
};
use tracing::{error, info, warn};

pub mod mail;
pub mod templates;

use mail::{MailError, MailTransport};
use templates::{render_acknowledgment, render_notification};

/// Who the relay sends as, who it notifies, and how it signs.
#[derive(Debug, Clone)]
pub struct RelayIdentity {
    pub sender: String,
    pub operator: String,
    pub site_name: String,
    pub signature_name: String,
}

#[derive(Clone)]
pub struct ApiContext {
    pub mailer: Arc<dyn MailTransport>,
    pub identity: RelayIdentity,
}

/// How far the two sends of one submission got. The notification always goes
/// first; the acknowledgment is only attempted once it succeeded.
#[derive(Debug)]
pub enum DispatchOutcome {
    BothSent,
    OnlyNotified { error: MailError },
    NeitherSent { error: MailError },
}

impl DispatchOutcome {
    pub fn is_complete(&self) -> bool {
        matches!(self, DispatchOutcome::BothSent)
    }

    pub fn operator_notified(&self) -> bool {
        !matches!(self, DispatchOutcome::NeitherSent { .. })
    }

    pub fn label(&self) -> &'static str {
        match self {
            DispatchOutcome::BothSent => "both_sent",
            DispatchOutcome::OnlyNotified { .. } => "only_notified",
            DispatchOutcome::NeitherSent { .. } => "neither_sent",
        }
    }
}

#[derive(Debug)]
pub enum RelayResult {
    Rejected(SubmissionError),
    Dispatched(DispatchOutcome),
}

impl RelayResult {
    /// Wire body for the client. Partial delivery is reported exactly like
    /// total failure.
    pub fn response(&self) -> RelayResponse {
        match self {
            RelayResult::Rejected(err) => RelayResponse::failed(err.user_message()),
            RelayResult::Dispatched(outcome) if outcome.is_complete() => {
                RelayResponse::delivered()
            }
            RelayResult::Dispatched(_) => RelayResponse::undelivered(),
        }
    }
}

/// Validates a raw request and, when it passes, relays it.
pub async fn relay_contact(ctx: &ApiContext, request: &ContactRequest) -> RelayResult {
    match ContactSubmission::try_from(request) {
        Ok(submission) => RelayResult::Dispatched(relay_submission(ctx, &submission).await),
        Err(err) => RelayResult::Rejected(err),
    }
}

/// Sends the operator notification, then the submitter acknowledgment, over
/// the same transport. Nothing is retried or rolled back.
pub async fn relay_submission(ctx: &ApiContext, submission: &ContactSubmission) -> DispatchOutcome {
    let notification = render_notification(submission, &ctx.identity);
    let acknowledgment = render_acknowledgment(submission, &ctx.identity);

    let outcome = match ctx.mailer.send(&notification).await {
        Err(error) => DispatchOutcome::NeitherSent { error },
        Ok(()) => match ctx.mailer.send(&acknowledgment).await {
            Err(error) => DispatchOutcome::OnlyNotified { error },
            Ok(()) => DispatchOutcome::BothSent,
        },
    };

    let label = outcome.label();
    match &outcome {
        DispatchOutcome::NeitherSent { error } => error!(
            submitter = %submission.email,
            %error,
            outcome = label,
            "failed to send operator notification"
        ),
        DispatchOutcome::OnlyNotified { error } => warn!(
            submitter = %submission.email,
            %error,
            outcome = label,
            "operator notified but acknowledgment failed; follow up manually"
        ),
        DispatchOutcome::BothSent => {
            info!(submitter = %submission.email, outcome = label, "contact submission relayed")
        }
    }
    outcome
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
