//! Main loop and instance lifecycle
//!
//! One iteration per window manager event: render and deliver once, arm
//! the background refresh timer, block until the next event (or a
//! termination signal), stop the timer, repeat. The timer is always
//! stopped and joined before the loop renders again, so the cache file
//! never has two writers at once.
//!
//! Signal handling is deliberately minimal: delete the per-instance
//! cache file and leave. No further queries or output happen on the way
//! out. Any other error escaping the loop triggers one final wake-up
//! notification first, so the bar re-reads its last valid state instead
//! of hanging on a dead feed.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use nix::sys::signal::kill;
use nix::unistd::Pid;
use tokio::signal::unix::{signal, SignalKind};
use tracing::{debug, info, warn};
use winlist_config::Config;

use crate::refresh::{RefreshTimer, RefreshTiming};
use crate::render::Renderer;
use crate::sink::OutputSink;
use crate::snapshot::SnapshotBuilder;
use crate::wm::{BspcQuery, EventSubscription, InfoQuery, NodeQuery, WmctrlQuery};

/// One snapshot-render-deliver pass, shared by the main loop and the
/// refresh timer
pub struct RenderPipeline<N, I> {
    snapshot: SnapshotBuilder<N, I>,
    renderer: Renderer,
    sink: OutputSink,
}

impl<N: NodeQuery + 'static, I: InfoQuery + 'static> RenderPipeline<N, I> {
    pub fn new(snapshot: SnapshotBuilder<N, I>, renderer: Renderer, sink: OutputSink) -> Self {
        Self {
            snapshot,
            renderer,
            sink,
        }
    }

    pub fn sink(&self) -> &OutputSink {
        &self.sink
    }

    pub async fn run_once(&self) -> std::io::Result<()> {
        let snapshot = self.snapshot.snapshot().await;
        let payload = self.renderer.payload(&snapshot);
        self.sink.deliver(&payload).await
    }

    /// Variant for the background timer: a failed delivery is worth a
    /// warning, not a dead task; the main loop will surface persistent
    /// failures on its next synchronous render.
    async fn run_once_logged(&self) {
        if let Err(e) = self.run_once().await {
            warn!(error = %e, "background refresh delivery failed");
        }
    }
}

/// The per-instance cache file and its cleanup
#[derive(Debug)]
pub struct InstanceFile {
    path: PathBuf,
}

impl InstanceFile {
    /// Create (or truncate) the cache file, creating its parent
    /// directory first. A pre-existing directory or file is not an
    /// error.
    pub fn create(path: PathBuf) -> std::io::Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::File::create(&path)?;
        Ok(Self { path })
    }

    /// Remove the cache file. Idempotent: the signal path and normal
    /// teardown may both run this, in any order.
    pub fn cleanup(&self) {
        match std::fs::remove_file(&self.path) {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "failed to remove cache file");
            }
        }
    }
}

impl Drop for InstanceFile {
    fn drop(&mut self) {
        self.cleanup();
    }
}

/// Check that `pid` is alive and actually names a polybar process
fn is_live_polybar(pid: i32) -> bool {
    // signal 0: existence/permission probe without sending anything
    if kill(Pid::from_raw(pid), None).is_err() {
        return false;
    }
    match std::fs::read_to_string(format!("/proc/{}/comm", pid)) {
        Ok(comm) => comm.trim_end() == "polybar",
        Err(_) => false,
    }
}

/// Owns the daemon's lifecycle: output target selection, cache file
/// creation, the event subscription and the render loop
#[derive(Debug)]
pub struct Controller {
    config: Config,
    pid: i32,
    cache_base: Option<PathBuf>,
}

impl Controller {
    /// `pid` 0 selects stdout mode; a negative pid is a configuration
    /// error. `cache_base` overrides the configured cache location (the
    /// pid is still appended).
    pub fn new(config: Config, pid: i32, cache_base: Option<PathBuf>) -> Result<Self> {
        if pid < 0 {
            bail!("bar process id must not be negative, got {}", pid);
        }
        Ok(Self {
            config,
            pid,
            cache_base,
        })
    }

    fn cache_path(&self) -> PathBuf {
        match &self.cache_base {
            Some(base) => PathBuf::from(format!("{}.{}", base.display(), self.pid)),
            None => self.config.cache_path(self.pid),
        }
    }

    /// Run until a termination signal arrives or the event subscription
    /// dies
    pub async fn run(self) -> Result<()> {
        let (sink, instance) = if self.pid == 0 {
            (OutputSink::stdout(), None)
        } else {
            // A live-but-foreign pid still gets a cache file; the bar
            // may run the module under a wrapper process
            if !is_live_polybar(self.pid) {
                warn!(
                    pid = self.pid,
                    "target pid is not a live polybar process, writing its cache anyway"
                );
            }
            let path = self.cache_path();
            let instance = InstanceFile::create(path.clone())
                .with_context(|| format!("creating cache file {}", path.display()))?;
            let sink = OutputSink::instance(
                self.pid,
                path,
                self.config.global.module_name.clone(),
            );
            (sink, Some(instance))
        };

        let nodes = BspcQuery;
        let report = nodes.report().await;
        debug!(?report, "monitor status at startup");

        let events = EventSubscription::spawn(&self.config.subscribe.events)?;

        let pipeline = Arc::new(RenderPipeline::new(
            SnapshotBuilder::new(nodes, WmctrlQuery),
            Renderer::new(&self.config),
            sink,
        ));
        let timing = RefreshTiming::from(&self.config.refresh);

        let result = run_loop(&pipeline, events, timing).await;

        if result.is_err() {
            // Final best-effort wake-up so the bar re-reads the last
            // valid cache line
            pipeline.sink().notify();
        }
        if let Some(instance) = &instance {
            instance.cleanup();
        }
        result
    }
}

async fn run_loop<N, I>(
    pipeline: &Arc<RenderPipeline<N, I>>,
    mut events: EventSubscription,
    timing: RefreshTiming,
) -> Result<()>
where
    N: NodeQuery + 'static,
    I: InfoQuery + 'static,
{
    let mut sigint = signal(SignalKind::interrupt())?;
    let mut sigquit = signal(SignalKind::quit())?;
    let mut sigterm = signal(SignalKind::terminate())?;

    loop {
        // Synchronous first render: the bar is never blank while the
        // timer's start delay runs down
        pipeline
            .run_once()
            .await
            .context("delivering rendered output")?;

        let timer = RefreshTimer::start(timing, {
            let pipeline = Arc::clone(pipeline);
            move || {
                let pipeline = Arc::clone(&pipeline);
                async move { pipeline.run_once_logged().await }
            }
        });

        let waited = tokio::select! {
            event = events.next() => Some(event),
            _ = sigint.recv() => None,
            _ = sigquit.recv() => None,
            _ = sigterm.recv() => None,
        };

        match waited {
            Some(Ok(event)) => {
                debug!(event = %event, "bspwm event");
                timer.stop();
                timer.join().await;
            }
            Some(Err(e)) => {
                timer.stop();
                timer.join().await;
                return Err(e).context("event subscription failed");
            }
            None => {
                // Signal: flag the timer down and leave without waiting
                // for it; the process exits right after cleanup
                info!("termination signal received, shutting down");
                timer.stop();
                return Ok(());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_negative_pid_is_rejected() {
        let err = Controller::new(Config::default(), -1, None).unwrap_err();
        assert!(err.to_string().contains("negative"));
    }

    #[test]
    fn test_cache_path_from_config() {
        let controller = Controller::new(Config::default(), 4242, None).unwrap();
        let path = controller.cache_path();
        assert!(path.ends_with("window-list.4242"));
    }

    #[test]
    fn test_cache_path_override_appends_pid() {
        let controller = Controller::new(
            Config::default(),
            7,
            Some(PathBuf::from("/tmp/winlist-test/custom")),
        )
        .unwrap();
        assert_eq!(
            controller.cache_path(),
            PathBuf::from("/tmp/winlist-test/custom.7")
        );
    }

    #[test]
    fn test_instance_file_create_and_cleanup_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cache").join("window-list.1");

        let instance = InstanceFile::create(path.clone()).unwrap();
        assert!(path.is_file());

        instance.cleanup();
        assert!(!path.exists());
        // second (and Drop's third) run must stay silent
        instance.cleanup();
    }

    #[test]
    fn test_instance_file_create_truncates_existing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("window-list.1");
        std::fs::write(&path, "stale contents").unwrap();

        let _instance = InstanceFile::create(path.clone()).unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "");
    }
}
