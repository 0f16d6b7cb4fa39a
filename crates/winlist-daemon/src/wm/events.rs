//! bspwm event subscription
//!
//! A single `bspc subscribe` child process lives for the whole daemon
//! run and emits one newline-terminated record per state change. The
//! records themselves are opaque to the daemon; any event is simply a
//! cue to recompute the window list.
//!
//! EOF on the pipe means the subscription died (bspwm restarted, or the
//! socket went away). That is fatal: the caller gets
//! `WmError::SubscriptionExited` carrying the child's exit status.

use std::process::Stdio;

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::{Child, ChildStdout, Command};
use tracing::debug;

use super::error::WmError;

/// Long-lived subscription to bspwm's event feed
#[derive(Debug)]
pub struct EventSubscription {
    child: Child,
    reader: BufReader<ChildStdout>,
}

impl EventSubscription {
    /// Spawn `bspc subscribe` for the given event categories
    pub fn spawn(events: &[String]) -> Result<Self, WmError> {
        let mut child = Command::new("bspc")
            .arg("subscribe")
            .args(events)
            .stdout(Stdio::piped())
            .spawn()
            .map_err(WmError::SubscriptionSpawn)?;

        let stdout = child.stdout.take().ok_or(WmError::SubscriptionPipe)?;
        debug!(?events, "subscribed to bspwm events");

        Ok(Self {
            child,
            reader: BufReader::new(stdout),
        })
    }

    /// Block until the next event record arrives.
    ///
    /// Returns the raw event line (trailing newline stripped). On EOF the
    /// child is reaped and `SubscriptionExited` is returned with its exit
    /// status.
    pub async fn next(&mut self) -> Result<String, WmError> {
        let mut line = String::new();
        let bytes_read = self
            .reader
            .read_line(&mut line)
            .await
            .map_err(WmError::SubscriptionRead)?;

        if bytes_read == 0 {
            let status = self
                .child
                .wait()
                .await
                .map_err(WmError::SubscriptionRead)?;
            return Err(WmError::SubscriptionExited { status });
        }

        Ok(line.trim_end().to_string())
    }
}
