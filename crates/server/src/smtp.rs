use async_trait::async_trait;
use lettre::{
    message::{header::ContentType, Mailbox},
    transport::smtp::authentication::Credentials,
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};
use server_api::mail::{MailError, MailTransport, OutboundMail};
use tracing::warn;

use crate::config::{MailAccount, Settings, SmtpSecurity};

/// Pooled SMTP connection to the configured relay, authenticated as the
/// site's mail account.
pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
}

impl SmtpMailer {
    pub fn new(settings: &Settings, account: &MailAccount) -> Result<Self, MailError> {
        let host = settings.smtp_host.as_str();
        let builder = match settings.smtp_security {
            SmtpSecurity::Tls => AsyncSmtpTransport::<Tokio1Executor>::relay(host)
                .map_err(|e| MailError::Transport(e.to_string()))?,
            SmtpSecurity::StartTls => AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(host)
                .map_err(|e| MailError::Transport(e.to_string()))?,
            SmtpSecurity::None => AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(host),
        };

        let builder = builder.port(settings.smtp_port());
        let builder = match settings.smtp_security {
            SmtpSecurity::None => builder,
            _ => builder.credentials(Credentials::new(
                account.user.clone(),
                account.password.clone(),
            )),
        };

        Ok(Self {
            transport: builder.build(),
        })
    }
}

#[async_trait]
impl MailTransport for SmtpMailer {
    async fn send(&self, mail: &OutboundMail) -> Result<(), MailError> {
        let message = build_message(mail)?;
        self.transport
            .send(message)
            .await
            .map(|_| ())
            .map_err(|e| MailError::Transport(e.to_string()))
    }

    async fn verify(&self) -> Result<(), MailError> {
        match self.transport.test_connection().await {
            Ok(true) => Ok(()),
            Ok(false) => Err(MailError::Transport(
                "SMTP server rejected the connection test".into(),
            )),
            Err(e) => Err(MailError::Transport(e.to_string())),
        }
    }
}

fn parse_mailbox(address: &str) -> Result<Mailbox, MailError> {
    address
        .parse::<Mailbox>()
        .map_err(|e| MailError::InvalidAddress(format!("{address}: {e}")))
}

pub(crate) fn build_message(mail: &OutboundMail) -> Result<Message, MailError> {
    let mut builder = Message::builder()
        .from(parse_mailbox(&mail.from)?)
        .to(parse_mailbox(&mail.to)?)
        .subject(mail.subject.as_str())
        .header(ContentType::TEXT_HTML);

    // A reply address the form accepted but SMTP cannot encode must not cost
    // the operator the notification itself.
    if let Some(reply_to) = &mail.reply_to {
        match parse_mailbox(reply_to) {
            Ok(mailbox) => builder = builder.reply_to(mailbox),
            Err(error) => warn!(%error, "dropping unparseable Reply-To"),
        }
    }

    builder
        .body(mail.html.clone())
        .map_err(|e| MailError::Build(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mail(reply_to: Option<&str>) -> OutboundMail {
        OutboundMail {
            from: "owner@site.dev".into(),
            to: "owner@site.dev".into(),
            reply_to: reply_to.map(str::to_string),
            subject: "Nova mensagem".into(),
            html: "<p>Oi</p>".into(),
        }
    }

    #[test]
    fn builds_html_message_with_reply_to() {
        let message = build_message(&mail(Some("ana@x.com"))).expect("message");
        let raw = String::from_utf8(message.formatted()).expect("utf8");
        assert!(raw.contains("Reply-To: ana@x.com"));
        assert!(raw.contains("Content-Type: text/html"));
        assert!(raw.contains("<p>Oi</p>"));
    }

    #[test]
    fn unparseable_reply_to_is_dropped_not_fatal() {
        let message = build_message(&mail(Some("ana@x..com"))).expect("message");
        let raw = String::from_utf8(message.formatted()).expect("utf8");
        assert!(!raw.contains("Reply-To"));
    }

    #[test]
    fn invalid_recipient_is_an_address_error() {
        let mut bad = mail(None);
        bad.to = "not an address".into();
        assert!(matches!(
            build_message(&bad),
            Err(MailError::InvalidAddress(_))
        ));
    }

    #[tokio::test]
    async fn plaintext_transport_builds_without_network() {
        let settings = Settings {
            smtp_host: "localhost".into(),
            smtp_security: SmtpSecurity::None,
            ..Settings::default()
        };
        let account = MailAccount {
            user: "owner@site.dev".into(),
            password: "secret".into(),
        };
        assert!(SmtpMailer::new(&settings, &account).is_ok());
    }
}
