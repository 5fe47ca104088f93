//! Subscription domain module.
//!
//! Per-tenant subscription lifecycle and the usage ledger embedded in it.
//!
//! # Module Structure
//!
//! - `aggregate` - Subscription aggregate entity
//! - `status` - SubscriptionStatus state machine
//! - `usage` - UsageLedger counters and ResourceKind
//! - `question_draft` - Client-side questions-per-exam guard
//! - `errors` - QuotaError taxonomy

mod aggregate;
mod errors;
mod question_draft;
mod status;
mod usage;

pub use aggregate::{PaymentDetails, ProcessorReference, Subscription};
pub use errors::QuotaError;
pub use question_draft::QuestionDraft;
pub use status::SubscriptionStatus;
pub use usage::{ResourceKind, UsageLedger};
