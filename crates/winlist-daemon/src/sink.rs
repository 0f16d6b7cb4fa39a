//! Output delivery
//!
//! A rendered payload goes either to stdout (pid 0, the plain
//! `exec`-module deployment) or to the bar instance's cache file
//! followed by a wake-up line on polybar's IPC FIFO. The cache file is
//! truncated and rewritten on every cycle; readers always see a single
//! line.
//!
//! The wake-up is best effort. Polybar only creates
//! `/tmp/polybar_mqueue.<pid>` when IPC is enabled; a missing FIFO, or
//! something that is not a FIFO at that path, means the bar is using a
//! polling reader instead and the notification is silently skipped.

use std::io::Write;
use std::os::unix::fs::FileTypeExt;
use std::path::PathBuf;

use tracing::debug;

/// 1-based index of the module's tail hook in its polybar config
const HOOK_TAIL_ID: u32 = 1;

/// polybar's IPC FIFO for a given bar pid
fn hook_path(pid: i32) -> PathBuf {
    PathBuf::from(format!("/tmp/polybar_mqueue.{}", pid))
}

/// Destination for rendered payloads
#[derive(Debug, Clone)]
pub enum OutputSink {
    /// One line per render cycle to stdout
    Stdout,
    /// Truncate-and-rewrite a per-instance cache file, then wake the bar
    Instance {
        cache_path: PathBuf,
        hook_path: PathBuf,
        module_name: String,
    },
}

impl OutputSink {
    pub fn stdout() -> Self {
        Self::Stdout
    }

    pub fn instance(pid: i32, cache_path: PathBuf, module_name: String) -> Self {
        Self::Instance {
            cache_path,
            hook_path: hook_path(pid),
            module_name,
        }
    }

    /// Deliver one rendered payload
    pub async fn deliver(&self, payload: &str) -> std::io::Result<()> {
        match self {
            Self::Stdout => {
                println!("{}", payload);
                Ok(())
            }
            Self::Instance { cache_path, .. } => {
                tokio::fs::write(cache_path, format!("{}\n", payload)).await?;
                self.notify();
                Ok(())
            }
        }
    }

    /// Wake the bar so it re-reads the cache file now instead of at its
    /// next poll. No-op in stdout mode and whenever the FIFO is absent
    /// or not actually a FIFO.
    pub fn notify(&self) {
        let Self::Instance {
            hook_path,
            module_name,
            ..
        } = self
        else {
            return;
        };

        let is_fifo = std::fs::metadata(hook_path)
            .map(|meta| meta.file_type().is_fifo())
            .unwrap_or(false);
        if !is_fifo {
            return;
        }

        let line = format!("hook:module/{}{}\n", module_name, HOOK_TAIL_ID);
        let written = std::fs::OpenOptions::new()
            .append(true)
            .open(hook_path)
            .and_then(|mut fifo| fifo.write_all(line.as_bytes()));
        if let Err(e) = written {
            // FIFO vanished between the check and the open
            debug!(error = %e, "polybar hook notify skipped");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn instance_with_hook(cache: PathBuf, hook: PathBuf) -> OutputSink {
        OutputSink::Instance {
            cache_path: cache,
            hook_path: hook,
            module_name: "window-list".to_string(),
        }
    }

    #[tokio::test]
    async fn test_deliver_writes_single_line() {
        let dir = tempfile::tempdir().unwrap();
        let cache = dir.path().join("window-list.1234");
        let sink = instance_with_hook(cache.clone(), dir.path().join("no-such-fifo"));

        sink.deliver("payload").await.unwrap();

        assert_eq!(std::fs::read_to_string(&cache).unwrap(), "payload\n");
    }

    #[tokio::test]
    async fn test_deliver_truncates_previous_payload() {
        let dir = tempfile::tempdir().unwrap();
        let cache = dir.path().join("window-list.1234");
        let sink = instance_with_hook(cache.clone(), dir.path().join("no-such-fifo"));

        sink.deliver("a much longer first payload").await.unwrap();
        sink.deliver("short").await.unwrap();

        assert_eq!(std::fs::read_to_string(&cache).unwrap(), "short\n");
    }

    #[tokio::test]
    async fn test_notify_skips_regular_file_at_hook_path() {
        let dir = tempfile::tempdir().unwrap();
        let cache = dir.path().join("window-list.1234");
        let hook = dir.path().join("polybar_mqueue.1234");
        std::fs::write(&hook, "pre-existing").unwrap();

        let sink = instance_with_hook(cache, hook.clone());
        sink.notify();

        // not a FIFO: nothing may be appended
        assert_eq!(std::fs::read_to_string(&hook).unwrap(), "pre-existing");
    }

    #[test]
    fn test_notify_missing_hook_is_a_noop() {
        let dir = tempfile::tempdir().unwrap();
        let sink = instance_with_hook(
            dir.path().join("cache"),
            dir.path().join("polybar_mqueue.9"),
        );
        sink.notify();
    }

    #[test]
    fn test_stdout_mode_never_notifies() {
        OutputSink::stdout().notify();
    }
}
