use shared::domain::ContactSubmission;

use crate::{mail::OutboundMail, RelayIdentity};

pub const NOTIFICATION_TEMPLATE: &str = include_str!("notification.html");
pub const ACKNOWLEDGMENT_TEMPLATE: &str = include_str!("acknowledgment.html");

/// Email to the site operator carrying every submitted field. Replies go
/// straight to the submitter.
pub fn render_notification(
    submission: &ContactSubmission,
    identity: &RelayIdentity,
) -> OutboundMail {
    let phone_section = submission
        .phone
        .as_deref()
        .map(|phone| {
            format!(
                "            <div class=\"info-box\">\n                <p><span class=\"label\">Telefone:</span> {}</p>\n            </div>\n",
                escape_html(phone)
            )
        })
        .unwrap_or_default();

    let html = fill(
        NOTIFICATION_TEMPLATE,
        &[
            ("NAME", escape_html(&submission.name)),
            ("EMAIL", escape_html(&submission.email)),
            ("PHONE_SECTION", phone_section),
            ("MESSAGE_HTML", message_html(&submission.message)),
            ("SITE_NAME", escape_html(&identity.site_name)),
        ],
    );

    OutboundMail {
        from: identity.sender.clone(),
        to: identity.operator.clone(),
        reply_to: Some(submission.email.clone()),
        subject: format!(
            "📧 Nova mensagem de {} - Site {}",
            submission.name, identity.site_name
        ),
        html,
    }
}

/// Confirmation to the submitter echoing their message.
pub fn render_acknowledgment(
    submission: &ContactSubmission,
    identity: &RelayIdentity,
) -> OutboundMail {
    let html = fill(
        ACKNOWLEDGMENT_TEMPLATE,
        &[
            ("NAME", escape_html(&submission.name)),
            ("MESSAGE_HTML", message_html(&submission.message)),
            ("SIGNATURE_NAME", escape_html(&identity.signature_name)),
            ("SITE_NAME", escape_html(&identity.site_name)),
        ],
    );

    OutboundMail {
        from: identity.sender.clone(),
        to: submission.email.clone(),
        reply_to: None,
        subject: format!("✅ Mensagem recebida - {}", identity.site_name),
        html,
    }
}

fn message_html(message: &str) -> String {
    escape_html(message).replace("\r\n", "\n").replace('\n', "<br>")
}

fn escape_html(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for ch in raw.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(ch),
        }
    }
    escaped
}

/// Single pass over the template so substituted values are never rescanned
/// for placeholders. Unknown placeholders are left as-is.
fn fill(template: &str, values: &[(&str, String)]) -> String {
    let mut out = String::with_capacity(template.len() + 512);
    let mut rest = template;

    while let Some(start) = rest.find("{{") {
        out.push_str(&rest[..start]);
        let after_open = &rest[start + 2..];
        let Some(end) = after_open.find("}}") else {
            out.push_str(&rest[start..]);
            return out;
        };

        let key = &after_open[..end];
        match values.iter().find(|(name, _)| *name == key) {
            Some((_, value)) => out.push_str(value),
            None => out.push_str(&rest[start..start + 2 + end + 2]),
        }
        rest = &after_open[end + 2..];
    }

    out.push_str(rest);
    out
}
