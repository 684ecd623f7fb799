pub mod client;
pub mod controller;
pub mod feedback;
pub mod form;

pub use client::{ClientError, RelayClient, RelayReply};
pub use controller::{classify_transport_failure, FormController, SubmitOutcome};
pub use feedback::{Banner, BannerKind, BannerPhase, FeedbackSlot};
pub use form::{ContactForm, SubmitControl};

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
