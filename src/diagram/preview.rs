//! Debounced diagram preview.
//!
//! Each preview owns one source. Every edit bumps a generation counter and
//! replaces the pending debounce timer; only a timer that elapses untouched
//! starts a render. A finished render is applied only while its generation
//! is still current and the preview has not been torn down.
//!
//! ```text
//! Idle -> edit -> PendingRender -> 250ms -> Rendering -> Rendered | Errored
//!                       ^                                    |
//!                       +--------------- edit ---------------+
//! ```

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, trace};

use super::lint::DiagramLinter;
use super::render::Renderer;
use crate::error::RenderError;

/// Quiet period after the last edit before a render starts.
pub const DEBOUNCE: Duration = Duration::from_millis(250);

/// Where a preview is in its render cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    PendingRender,
    Rendering,
    Rendered,
    Errored,
}

/// What a preview currently displays.
///
/// `svg` and `error` are never both set. They survive an edit until the next
/// render replaces them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreviewSnapshot {
    pub phase: Phase,
    pub svg: Option<String>,
    pub error: Option<String>,
    pub generation: u64,
}

impl Default for PreviewSnapshot {
    fn default() -> Self {
        Self {
            phase: Phase::Idle,
            svg: None,
            error: None,
            generation: 0,
        }
    }
}

struct Shared {
    generation: AtomicU64,
    alive: AtomicBool,
    state: watch::Sender<PreviewSnapshot>,
}

impl Shared {
    fn is_current(&self, generation: u64) -> bool {
        self.alive.load(Ordering::SeqCst) && self.generation.load(Ordering::SeqCst) == generation
    }

    /// Move to `Rendering` unless an edit or teardown got there first.
    ///
    /// The check runs under the state lock, so an edit cannot slip between
    /// the check and the write.
    fn start_render(&self, generation: u64) -> bool {
        self.state.send_if_modified(|s| {
            if !self.is_current(generation) {
                return false;
            }
            s.phase = Phase::Rendering;
            true
        })
    }

    fn apply(&self, generation: u64, result: Result<String, RenderError>) {
        let applied = self.state.send_if_modified(|s| {
            if !self.is_current(generation) {
                return false;
            }
            match result {
                Ok(svg) => {
                    s.phase = Phase::Rendered;
                    s.svg = Some(svg);
                    s.error = None;
                }
                Err(e) => {
                    s.phase = Phase::Errored;
                    s.svg = None;
                    s.error = Some(e.message());
                }
            }
            true
        });
        if !applied {
            debug!(generation = generation, "Discarding stale render result");
        }
    }
}

/// One independently debounced preview.
pub struct DiagramPreview {
    renderer: Arc<dyn Renderer>,
    linter: DiagramLinter,
    debounce: Duration,
    shared: Arc<Shared>,
    timer: Mutex<Option<JoinHandle<()>>>,
}

impl DiagramPreview {
    pub fn new(renderer: Arc<dyn Renderer>) -> Self {
        Self::with_debounce(renderer, DEBOUNCE)
    }

    pub fn with_debounce(renderer: Arc<dyn Renderer>, debounce: Duration) -> Self {
        let (state, _rx) = watch::channel(PreviewSnapshot::default());
        Self {
            renderer,
            linter: DiagramLinter::new(),
            debounce,
            shared: Arc::new(Shared {
                generation: AtomicU64::new(0),
                alive: AtomicBool::new(true),
                state,
            }),
            timer: Mutex::new(None),
        }
    }

    /// Record an edit and (re)start the debounce timer.
    ///
    /// Must be called from within a tokio runtime.
    pub fn edit(&self, source: impl Into<String>) {
        if !self.is_alive() {
            return;
        }

        let source = source.into();
        let generation = self.shared.generation.fetch_add(1, Ordering::SeqCst) + 1;

        let mut timer = self.timer.lock().unwrap_or_else(|p| p.into_inner());
        if let Some(pending) = timer.take() {
            pending.abort();
        }

        self.shared.state.send_modify(|s| {
            s.phase = Phase::PendingRender;
            s.generation = generation;
        });
        trace!(generation = generation, "Diagram edit scheduled");

        let shared = Arc::clone(&self.shared);
        let renderer = Arc::clone(&self.renderer);
        let linter = self.linter.clone();
        let debounce = self.debounce;

        *timer = Some(tokio::spawn(async move {
            tokio::time::sleep(debounce).await;
            if !shared.start_render(generation) {
                return;
            }

            // Detached from the timer: a later edit cancels timers, not renders.
            tokio::spawn(async move {
                let result = match linter.lint(&source) {
                    Ok(()) => renderer.render(&source).await,
                    Err(e) => Err(e),
                };
                shared.apply(generation, result);
            });
        }));
    }

    /// Stop accepting edits and drop any result still in flight.
    pub fn teardown(&self) {
        self.shared.alive.store(false, Ordering::SeqCst);
        let mut timer = self.timer.lock().unwrap_or_else(|p| p.into_inner());
        if let Some(pending) = timer.take() {
            pending.abort();
        }
    }

    pub fn is_alive(&self) -> bool {
        self.shared.alive.load(Ordering::SeqCst)
    }

    pub fn snapshot(&self) -> PreviewSnapshot {
        self.shared.state.borrow().clone()
    }

    /// Watch display changes.
    pub fn subscribe(&self) -> watch::Receiver<PreviewSnapshot> {
        self.shared.state.subscribe()
    }
}

impl Drop for DiagramPreview {
    fn drop(&mut self) {
        self.teardown();
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use async_trait::async_trait;

    /// Renders `<svg>{source}</svg>` after an optional delay, recording calls.
    pub(crate) struct RecordingRenderer {
        pub(crate) calls: Mutex<Vec<String>>,
        delay: Duration,
    }

    impl RecordingRenderer {
        pub(crate) fn new() -> Arc<Self> {
            Self::slow(Duration::ZERO)
        }

        pub(crate) fn slow(delay: Duration) -> Arc<Self> {
            Arc::new(Self {
                calls: Mutex::new(Vec::new()),
                delay,
            })
        }

        pub(crate) fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Renderer for RecordingRenderer {
        async fn render(&self, source: &str) -> Result<String, RenderError> {
            self.calls.lock().unwrap().push(source.to_string());
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            if source.contains("-->!") {
                return Err(RenderError::Syntax("Parse error on line 2".into()));
            }
            Ok(format!("<svg>{source}</svg>"))
        }
    }

    async fn settle(preview: &DiagramPreview) -> PreviewSnapshot {
        let mut rx = preview.subscribe();
        rx.wait_for(|s| matches!(s.phase, Phase::Rendered | Phase::Errored))
            .await
            .unwrap()
            .clone()
    }

    #[tokio::test(start_paused = true)]
    async fn rapid_edits_render_once_with_last_text() {
        let renderer = RecordingRenderer::new();
        let preview = DiagramPreview::new(renderer.clone());

        for i in 0..5 {
            preview.edit(format!("graph TD\nA-->B{i}"));
            tokio::time::advance(Duration::from_millis(100)).await;
        }
        assert_eq!(preview.snapshot().phase, Phase::PendingRender);

        let snap = settle(&preview).await;
        assert_eq!(snap.phase, Phase::Rendered);
        assert_eq!(snap.svg.as_deref(), Some("<svg>graph TD\nA-->B4</svg>"));
        assert_eq!(renderer.calls(), vec!["graph TD\nA-->B4".to_string()]);

        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(renderer.calls().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn nothing_renders_before_debounce_elapses() {
        let renderer = RecordingRenderer::new();
        let preview = DiagramPreview::new(renderer.clone());

        preview.edit("graph TD");
        tokio::time::sleep(Duration::from_millis(200)).await;
        assert!(renderer.calls().is_empty());
        assert_eq!(preview.snapshot().phase, Phase::PendingRender);

        tokio::time::sleep(Duration::from_millis(100)).await;
        settle(&preview).await;
        assert_eq!(renderer.calls().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn render_error_clears_markup_and_success_clears_error() {
        let renderer = RecordingRenderer::new();
        let preview = DiagramPreview::new(renderer.clone());

        preview.edit("graph TD\nA-->B");
        let ok = settle(&preview).await;
        assert!(ok.svg.is_some());
        assert!(ok.error.is_none());

        preview.edit("graph TD\nA-->!B");
        let pending = preview.snapshot();
        assert_eq!(pending.phase, Phase::PendingRender);
        assert!(pending.svg.is_some(), "old markup stays until the next render");

        let failed = settle(&preview).await;
        assert_eq!(failed.phase, Phase::Errored);
        assert!(failed.svg.is_none());
        assert_eq!(failed.error.as_deref(), Some("Parse error on line 2"));

        preview.edit("graph TD\nA-->C");
        let fixed = settle(&preview).await;
        assert_eq!(fixed.phase, Phase::Rendered);
        assert!(fixed.error.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn lint_failure_skips_renderer() {
        let renderer = RecordingRenderer::new();
        let preview = DiagramPreview::new(renderer.clone());

        preview.edit("not a diagram");
        let snap = settle(&preview).await;
        assert_eq!(snap.phase, Phase::Errored);
        assert!(snap.error.unwrap().contains("expected a diagram type"));
        assert!(renderer.calls().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn in_flight_result_superseded_by_newer_edit_is_dropped() {
        let renderer = RecordingRenderer::slow(Duration::from_secs(1));
        let preview = DiagramPreview::new(renderer.clone());

        preview.edit("graph TD\nA-->Old");
        tokio::time::sleep(Duration::from_millis(300)).await;
        assert_eq!(preview.snapshot().phase, Phase::Rendering);

        preview.edit("graph TD\nA-->New");
        // Old render finishes at ~1250ms, new one at ~1550ms.
        tokio::time::sleep(Duration::from_millis(1100)).await;
        let mid = preview.snapshot();
        assert_eq!(mid.phase, Phase::Rendering);
        assert!(mid.svg.is_none());

        let snap = settle(&preview).await;
        assert_eq!(snap.svg.as_deref(), Some("<svg>graph TD\nA-->New</svg>"));
        assert_eq!(renderer.calls().len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn teardown_suppresses_late_result() {
        let renderer = RecordingRenderer::slow(Duration::from_secs(1));
        let preview = DiagramPreview::new(renderer.clone());

        preview.edit("graph TD\nA-->B");
        tokio::time::sleep(Duration::from_millis(300)).await;
        assert_eq!(preview.snapshot().phase, Phase::Rendering);

        preview.teardown();
        tokio::time::sleep(Duration::from_secs(2)).await;

        let snap = preview.snapshot();
        assert_eq!(snap.phase, Phase::Rendering);
        assert!(snap.svg.is_none());
        assert_eq!(renderer.calls().len(), 1);

        preview.edit("graph TD\nA-->C");
        assert_eq!(preview.snapshot().generation, snap.generation);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn settled_state_always_matches_latest_edit() {
        let renderer = RecordingRenderer::new();
        let preview = DiagramPreview::with_debounce(renderer, Duration::from_millis(1));

        for i in 0..200 {
            preview.edit(format!("graph TD\nA-->N{i}"));
            if i % 7 == 0 {
                tokio::time::sleep(Duration::from_millis(1)).await;
            }
        }

        let snap = tokio::time::timeout(Duration::from_secs(5), settle(&preview))
            .await
            .unwrap();
        assert_eq!(snap.generation, 200);
        assert_eq!(snap.phase, Phase::Rendered);
        assert_eq!(snap.svg.as_deref(), Some("<svg>graph TD\nA-->N199</svg>"));
    }

    #[tokio::test(start_paused = true)]
    async fn independent_previews_do_not_interfere() {
        let renderer = RecordingRenderer::new();
        let a = DiagramPreview::new(renderer.clone());
        let b = DiagramPreview::new(renderer.clone());

        a.edit("graph TD\nA-->A");
        b.edit("graph TD\nB-->!B");

        let sa = settle(&a).await;
        let sb = settle(&b).await;
        assert_eq!(sa.phase, Phase::Rendered);
        assert_eq!(sb.phase, Phase::Errored);
        assert_eq!(renderer.calls().len(), 2);
    }
}
