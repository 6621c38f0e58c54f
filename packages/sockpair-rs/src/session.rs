//! The photo being analysed and what became of the analysis.
use std::sync::{Arc, Mutex, MutexGuard};

use log::{debug, error, info};
use sockpair_vision::{AnalysisEngine, AnalysisResult, ImageData};

use crate::coordinates::Dimensions;
use crate::overlay::{OverlayRenderer, OverlayScene};

pub const NO_IMAGE_MESSAGE: &str = "No image selected";

/// Snapshot of the session. `result` and `error` are never both set.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionState {
    pub image: Option<ImageData>,
    pub result: Option<AnalysisResult>,
    pub loading: bool,
    pub error: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnalyzeOutcome {
    Completed,
    Failed,
    /// A request is already in flight for this image.
    Busy,
    NoImage,
    /// The image was cleared or replaced while the request was pending; its
    /// answer was dropped.
    Superseded,
}

#[derive(Default)]
struct Inner {
    state: SessionState,
    // Bumped whenever the image changes so late answers can be recognised.
    generation: u64,
}

fn lock(inner: &Mutex<Inner>) -> MutexGuard<'_, Inner> {
    inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Clears `loading` when an `analyze` future is dropped before the engine
/// answers, unless the image changed in the meantime.
struct PendingRequest<'a> {
    inner: &'a Mutex<Inner>,
    generation: u64,
    settled: bool,
}

impl Drop for PendingRequest<'_> {
    fn drop(&mut self) {
        if self.settled {
            return;
        }
        let mut inner = lock(self.inner);
        if inner.generation == self.generation {
            debug!("analysis request abandoned before it answered");
            inner.state.loading = false;
        }
    }
}

pub struct AnalysisSession<E: AnalysisEngine> {
    engine: Arc<E>,
    inner: Mutex<Inner>,
}

impl<E: AnalysisEngine> AnalysisSession<E> {
    pub fn new(engine: Arc<E>) -> Self {
        Self {
            engine,
            inner: Mutex::new(Inner::default()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        lock(&self.inner)
    }

    pub fn state(&self) -> SessionState {
        self.lock().state.clone()
    }

    /// Shows a new photo, discarding any previous result or error.
    pub fn set_image(&self, image: ImageData) {
        let mut inner = self.lock();
        inner.generation += 1;
        inner.state = SessionState {
            image: Some(image),
            result: None,
            loading: false,
            error: None,
        };
    }

    pub fn clear_all(&self) {
        let mut inner = self.lock();
        inner.generation += 1;
        inner.state = SessionState::default();
    }

    pub async fn analyze(&self) -> AnalyzeOutcome {
        let (image, generation) = {
            let mut inner = self.lock();
            let Some(image) = inner.state.image.clone() else {
                inner.state.error = Some(NO_IMAGE_MESSAGE.to_string());
                return AnalyzeOutcome::NoImage;
            };
            if inner.state.loading {
                return AnalyzeOutcome::Busy;
            }
            inner.state.loading = true;
            inner.state.error = None;
            (image, inner.generation)
        };
        info!("analyzing {} image", image.mime());
        let mut pending = PendingRequest {
            inner: &self.inner,
            generation,
            settled: false,
        };

        let answer = self.engine.analyze(&image).await;
        pending.settled = true;

        let mut inner = self.lock();
        if inner.generation != generation {
            debug!("dropping analysis answer for a replaced image");
            return AnalyzeOutcome::Superseded;
        }
        inner.state.loading = false;
        match answer {
            Ok(result) => {
                info!("analysis found {} pair(s)", result.pairs.len());
                inner.state.result = Some(result);
                inner.state.error = None;
                AnalyzeOutcome::Completed
            }
            Err(e) => {
                error!("analysis failed: {}", e);
                inner.state.result = None;
                inner.state.error = Some(e.to_string());
                AnalyzeOutcome::Failed
            }
        }
    }

    /// Overlay for the current result, empty when there is none.
    pub fn overlay(&self, dims: Dimensions) -> OverlayScene {
        let inner = self.lock();
        let pairs = inner
            .state
            .result
            .as_ref()
            .map(|r| r.pairs.as_slice())
            .unwrap_or(&[]);
        OverlayRenderer::render(pairs, dims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use sockpair_vision::{AnalysisError, Confidence, NormalizedBox, SockPair};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::sync::Notify;

    fn sample_result() -> AnalysisResult {
        AnalysisResult {
            pairs: vec![SockPair {
                title: "Black dress".into(),
                confidence: Confidence::High,
                reasons: vec!["black".into()],
                tradeoffs: vec![],
                box1: NormalizedBox::new(0.0, 0.0, 400.0, 400.0),
                box2: NormalizedBox::new(600.0, 600.0, 1000.0, 1000.0),
                highlight_color: "#FF5733".into(),
            }],
            notes: vec![],
        }
    }

    struct ScriptedEngine {
        answer: Result<AnalysisResult, AnalysisError>,
        calls: AtomicUsize,
        gate: Option<Notify>,
    }

    impl ScriptedEngine {
        fn new(answer: Result<AnalysisResult, AnalysisError>) -> Self {
            Self {
                answer,
                calls: AtomicUsize::new(0),
                gate: None,
            }
        }

        fn gated(answer: Result<AnalysisResult, AnalysisError>) -> Self {
            Self {
                gate: Some(Notify::new()),
                ..Self::new(answer)
            }
        }
    }

    #[async_trait]
    impl AnalysisEngine for ScriptedEngine {
        async fn analyze(&self, _image: &ImageData) -> Result<AnalysisResult, AnalysisError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if let Some(gate) = &self.gate {
                gate.notified().await;
            }
            self.answer.clone()
        }
    }

    fn photo() -> ImageData {
        ImageData::from_bytes("image/jpeg", &[0xFF, 0xD8, 0xFF])
    }

    #[tokio::test]
    async fn test_success_records_result_only() {
        let session = AnalysisSession::new(Arc::new(ScriptedEngine::new(Ok(sample_result()))));
        session.set_image(photo());
        assert_eq!(session.analyze().await, AnalyzeOutcome::Completed);
        let state = session.state();
        assert!(state.result.is_some());
        assert!(state.error.is_none());
        assert!(!state.loading);
        assert_eq!(session.overlay(Dimensions::new(100.0, 100.0)).rect_count(), 2);
    }

    #[tokio::test]
    async fn test_failure_keeps_image_and_records_error_only() {
        let engine = ScriptedEngine::new(Err(AnalysisError::Service("quota exceeded".into())));
        let session = AnalysisSession::new(Arc::new(engine));
        session.set_image(photo());
        assert_eq!(session.analyze().await, AnalyzeOutcome::Failed);
        let state = session.state();
        assert_eq!(state.image, Some(photo()));
        assert_eq!(state.error.as_deref(), Some("quota exceeded"));
        assert!(state.result.is_none());
        assert!(session.overlay(Dimensions::new(100.0, 100.0)).is_empty());
    }

    #[tokio::test]
    async fn test_no_image() {
        let session = AnalysisSession::new(Arc::new(ScriptedEngine::new(Ok(sample_result()))));
        assert_eq!(session.analyze().await, AnalyzeOutcome::NoImage);
        assert_eq!(session.state().error.as_deref(), Some(NO_IMAGE_MESSAGE));
    }

    #[tokio::test]
    async fn test_single_request_in_flight() {
        let engine = Arc::new(ScriptedEngine::gated(Ok(sample_result())));
        let session = Arc::new(AnalysisSession::new(engine.clone()));
        session.set_image(photo());

        let first = tokio::spawn({
            let session = session.clone();
            async move { session.analyze().await }
        });
        while !session.state().loading {
            tokio::task::yield_now().await;
        }
        assert_eq!(session.analyze().await, AnalyzeOutcome::Busy);

        engine.gate.as_ref().unwrap().notify_one();
        assert_eq!(first.await.unwrap(), AnalyzeOutcome::Completed);
        assert_eq!(engine.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_answer_for_cleared_image_is_ignored() {
        let engine = Arc::new(ScriptedEngine::gated(Ok(sample_result())));
        let session = Arc::new(AnalysisSession::new(engine.clone()));
        session.set_image(photo());

        let pending = tokio::spawn({
            let session = session.clone();
            async move { session.analyze().await }
        });
        while !session.state().loading {
            tokio::task::yield_now().await;
        }
        session.clear_all();
        engine.gate.as_ref().unwrap().notify_one();

        assert_eq!(pending.await.unwrap(), AnalyzeOutcome::Superseded);
        assert_eq!(session.state(), SessionState::default());
    }

    #[tokio::test]
    async fn test_abandoned_request_allows_retry() {
        let engine = Arc::new(ScriptedEngine::gated(Ok(sample_result())));
        let session = AnalysisSession::new(engine.clone());
        session.set_image(photo());

        let timed_out =
            tokio::time::timeout(std::time::Duration::from_millis(20), session.analyze()).await;
        assert!(timed_out.is_err());
        let state = session.state();
        assert!(!state.loading);
        assert_eq!(state.image, Some(photo()));

        engine.gate.as_ref().unwrap().notify_one();
        assert_eq!(session.analyze().await, AnalyzeOutcome::Completed);
        assert_eq!(engine.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_new_image_discards_previous_result() {
        let session = AnalysisSession::new(Arc::new(ScriptedEngine::new(Ok(sample_result()))));
        session.set_image(photo());
        session.analyze().await;
        session.set_image(ImageData::from_bytes("image/png", b"png"));
        let state = session.state();
        assert!(state.result.is_none());
        assert!(state.error.is_none());
    }
}
