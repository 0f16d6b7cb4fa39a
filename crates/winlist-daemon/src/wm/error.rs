//! Error types for window manager access

use std::process::ExitStatus;

use thiserror::Error;

/// Errors from the persistent event subscription
#[derive(Debug, Error)]
pub enum WmError {
    /// Failed to spawn the subscription process
    #[error("Failed to spawn bspc subscribe: {0}")]
    SubscriptionSpawn(#[source] std::io::Error),

    /// The subscription process exposed no stdout pipe
    #[error("Event subscription has no stdout pipe")]
    SubscriptionPipe,

    /// Reading from the subscription pipe failed
    #[error("Failed to read from event subscription: {0}")]
    SubscriptionRead(#[source] std::io::Error),

    /// The subscription process ended; carries its exit status
    #[error("Event subscription exited: {status}")]
    SubscriptionExited { status: ExitStatus },
}
