//! Subscription lifecycle handlers.

mod cancel_subscription;
mod change_plan;
mod create_subscription;
mod sweep_subscriptions;

pub use cancel_subscription::{
    CancelSubscriptionCommand, CancelSubscriptionHandler, CancelSubscriptionResult,
};
pub use change_plan::{ChangePlanCommand, ChangePlanHandler, ChangePlanResult};
pub use create_subscription::{
    CreateSubscriptionCommand, CreateSubscriptionHandler, CreateSubscriptionResult,
};
pub use sweep_subscriptions::{
    LifecyclePolicy, SweepAction, SweepFailure, SweepReport, SweepSubscriptionsCommand,
    SweepSubscriptionsHandler,
};
