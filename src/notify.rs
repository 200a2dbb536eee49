//! Onboarding notifications and their webhook delivery log.
//!
//! [`OnboardingNotification`] is the payload; [`WebhookNotifier`] posts it, retries in-call
//! with linear backoff, records every delivery in a [`DeliveryStore`](crate::store::DeliveryStore),
//! and replays failed deliveries byte-for-byte on request.

pub mod model;
pub mod notifier;

pub use model::*;
pub use notifier::*;
