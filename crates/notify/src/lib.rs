//! Alert delivery for host health events.
//!
//! This crate provides:
//! - `Notifier` trait for pluggable alert channels
//! - Console, desktop, email, and webhook notifier implementations
//! - Minijinja templates for alert subject and body
//! - Concurrent, time-bounded `Dispatcher` over all channels
//! - `AlertManager` gating alerts by a per-key cooldown

pub mod alerts;
pub mod console;
pub mod desktop;
pub mod dispatcher;
pub mod email;
pub mod templating;
pub mod traits;
pub mod webhook;

pub use alerts::{alert_key, channels_from_config, AlertManager, AlertOutcome};
pub use dispatcher::Dispatcher;
pub use templating::{AlertContext, MessageTemplates};
pub use traits::{DispatchResult, Notification, Notifier, NotifyError};
