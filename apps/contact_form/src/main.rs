use std::time::{Duration, Instant};

use anyhow::{bail, Result};
use clap::Parser;
use client_core::{BannerKind, BannerPhase, ContactForm, FormController, RelayClient, SubmitOutcome};

/// Fill in and submit the portfolio contact form from the terminal.
#[derive(Parser, Debug)]
struct Args {
    #[arg(long, default_value = "http://localhost:3000")]
    server_url: String,
    #[arg(long)]
    name: String,
    #[arg(long)]
    email: String,
    #[arg(long, default_value = "")]
    phone: String,
    #[arg(long)]
    message: String,
    /// Post without checking `GET /` first.
    #[arg(long)]
    skip_probe: bool,
    /// Keep running until the feedback banner has faded out.
    #[arg(long)]
    watch_banner: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();
    let args = Args::parse();

    let mut controller = FormController::new(RelayClient::new(&args.server_url)?);
    if args.skip_probe {
        controller = controller.without_probe();
    }
    controller.form = ContactForm {
        name: args.name,
        email: args.email,
        phone: args.phone,
        message: args.message,
    };

    let outcome = controller.submit().await;

    if let Some(banner) = controller.feedback.current() {
        let marker = match banner.kind {
            BannerKind::Success => "ok",
            BannerKind::Error => "error",
        };
        println!("[{marker}] ({}) {}", banner.kind.icon(), banner.text);
    }

    if args.watch_banner {
        let mut last = Some(BannerPhase::Visible);
        while let Some(phase) = controller.feedback.tick(Instant::now()) {
            if last != Some(phase) {
                println!("banner: {phase:?}");
                last = Some(phase);
            }
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
        println!("banner: {:?}", BannerPhase::Dismissed);
    }

    match outcome {
        SubmitOutcome::Sent => Ok(()),
        SubmitOutcome::Rejected(err) => bail!("form rejected: {err}"),
        SubmitOutcome::Failed => bail!("submission failed"),
    }
}
