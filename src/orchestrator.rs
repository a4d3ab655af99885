use crate::{
    composer,
    config::{FanoutPolicy, OrchestratorConfig},
    error::{FitroomError, Result},
    models::{Batch, PoseTemplate, Scenario, SynthesisRequest, SynthesisResult, POSES},
};
use async_trait::async_trait;
use futures::future::join_all;
use uuid::Uuid;

/// The injected seam to the external synthesis service. The Gemini client
/// implements this; tests substitute scripted fakes.
#[async_trait]
pub trait SynthesisService: Send + Sync {
    async fn synthesize(&self, request: &SynthesisRequest) -> Result<SynthesisResult>;
}

#[async_trait]
impl<'a, T: SynthesisService + ?Sized> SynthesisService for &'a T {
    async fn synthesize(&self, request: &SynthesisRequest) -> Result<SynthesisResult> {
        (**self).synthesize(request).await
    }
}

const FANOUT_MESSAGES: [&str; 4] = [
    "Ajustando los últimos detalles de tu look...",
    "¡Casi listo! Estamos preparando el espejo virtual.",
    "Creando la pose perfecta para ti...",
    "Aplicando la magia de la IA...",
];

/// Emitted at each orchestration stage transition. One-way notification,
/// not a cancellation point.
#[derive(Debug, Clone)]
pub enum ProgressEvent {
    ComposingInputs,
    DeterminingCall { pose: String },
    FanOutDispatch { pose: String, index: usize },
    Merging,
}

impl ProgressEvent {
    /// Human-readable status line for the stage.
    pub fn message(&self) -> String {
        match self {
            ProgressEvent::ComposingInputs => "Preparando el probador virtual...".to_string(),
            ProgressEvent::DeterminingCall { .. } => {
                "Espera mientras te probamos la ropa...".to_string()
            }
            ProgressEvent::FanOutDispatch { index, .. } => {
                FANOUT_MESSAGES[index % FANOUT_MESSAGES.len()].to_string()
            }
            ProgressEvent::Merging => "Compilando tus nuevos looks...".to_string(),
        }
    }
}

pub trait ProgressObserver: Send + Sync {
    fn on_progress(&self, event: &ProgressEvent);
}

impl<F> ProgressObserver for F
where
    F: Fn(&ProgressEvent) + Send + Sync,
{
    fn on_progress(&self, event: &ProgressEvent) {
        self(event)
    }
}

/// Observer for callers that do not track progress.
pub struct NoProgress;

impl ProgressObserver for NoProgress {
    fn on_progress(&self, _event: &ProgressEvent) {}
}

/// Drives the external service to produce one pose variant per template for
/// a subject/garment/scenario combination, enforcing that the suggested
/// size stays identical across the whole batch.
///
/// Sequencing: the first pose template is the determining call, issued
/// without a forced size; the remaining templates fan out concurrently,
/// each pinned to the size the determining call produced. Fan-out never
/// starts before that size is known, and results are re-assembled in
/// pose-template order regardless of completion order.
pub struct BatchOrchestrator<S: SynthesisService> {
    service: S,
    config: OrchestratorConfig,
    poses: Vec<PoseTemplate>,
}

impl<S: SynthesisService> BatchOrchestrator<S> {
    pub fn new(service: S) -> Self {
        Self::with_config(service, OrchestratorConfig::default())
    }

    pub fn with_config(service: S, config: OrchestratorConfig) -> Self {
        Self {
            service,
            config,
            poses: POSES.clone(),
        }
    }

    /// Overrides the pose-template table. Order still defines the
    /// determining call.
    pub fn with_poses(mut self, poses: Vec<PoseTemplate>) -> Self {
        self.poses = poses;
        self
    }

    pub async fn generate_batch(
        &self,
        subject_bytes: &[u8],
        garment_bytes: &[u8],
        scenario: &Scenario,
        observer: &dyn ProgressObserver,
    ) -> Result<Batch> {
        let first_pose = self.poses.first().ok_or_else(|| {
            FitroomError::RequestError("no pose templates configured".to_string())
        })?;

        observer.on_progress(&ProgressEvent::ComposingInputs);
        let subject = composer::normalize_subject(subject_bytes)?;
        let garment = composer::normalize_garment(garment_bytes)?;

        // Determining call: first pose, no forced size.
        observer.on_progress(&ProgressEvent::DeterminingCall {
            pose: first_pose.name.clone(),
        });
        let determining = self
            .service
            .synthesize(&SynthesisRequest {
                subject: subject.clone(),
                garment: garment.clone(),
                pose: first_pose.clone(),
                scenario: scenario.clone(),
                forced_size: None,
            })
            .await?;

        if determining.image.is_none() {
            // Nothing to build on: no reference image and no determined
            // size. The batch aborts before any fan-out call is issued.
            return Err(FitroomError::NoImageReturned(
                "the determining call produced no image; retry with a clearer subject photo"
                    .to_string(),
            ));
        }

        let determined_size = determining.suggested_size.clone();
        if determined_size.is_none() {
            log::warn!(
                "The determining call suggested no size; consistency enforcement is a no-op for this batch"
            );
        }

        // Fan-out: remaining poses concurrently, each pinned to the
        // determined size so the service echoes it instead of recomputing.
        let mut pending = Vec::new();
        for (index, pose) in self.poses.iter().enumerate().skip(1) {
            observer.on_progress(&ProgressEvent::FanOutDispatch {
                pose: pose.name.clone(),
                index: index - 1,
            });
            let request = SynthesisRequest {
                subject: subject.clone(),
                garment: garment.clone(),
                pose: pose.clone(),
                scenario: scenario.clone(),
                forced_size: determined_size.clone(),
            };
            pending.push(async move { self.service.synthesize(&request).await });
        }

        let settled = join_all(pending).await;

        observer.on_progress(&ProgressEvent::Merging);
        let mut merged = vec![determining];
        for outcome in settled {
            match outcome {
                Ok(result) if result.image.is_some() => merged.push(result),
                Ok(_) => match self.config.fanout_policy {
                    FanoutPolicy::AbortOnFailure => {
                        return Err(FitroomError::NoImageReturned(
                            "a fan-out call produced no image".to_string(),
                        ))
                    }
                    FanoutPolicy::KeepPartial => {
                        log::warn!("Dropping a fan-out variant that produced no image")
                    }
                },
                Err(e) => match self.config.fanout_policy {
                    FanoutPolicy::AbortOnFailure => return Err(e),
                    FanoutPolicy::KeepPartial => {
                        log::warn!("Dropping a failed fan-out variant: {}", e)
                    }
                },
            }
        }

        // Enforce the consistency invariant: every surviving result carries
        // the determined size, discarding any per-call drift.
        let results: Vec<SynthesisResult> = merged
            .into_iter()
            .filter(|result| result.image.is_some())
            .map(|mut result| {
                result.suggested_size = determined_size.clone();
                result
            })
            .collect();

        log::info!(
            "Batch complete: {} variants, suggested size {}",
            results.len(),
            determined_size.as_deref().unwrap_or("undetermined")
        );

        Ok(Batch {
            id: Uuid::new_v4(),
            scenario_id: scenario.id.clone(),
            suggested_size: determined_size,
            results,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{EncodedImage, SCENARIOS};
    use image::{DynamicImage, ImageBuffer, Rgb};
    use std::collections::VecDeque;
    use std::io::Cursor;
    use std::sync::Mutex;

    struct FakeService {
        responses: Mutex<VecDeque<Result<SynthesisResult>>>,
        forced_sizes: Mutex<Vec<Option<String>>>,
    }

    impl FakeService {
        fn scripted(responses: Vec<Result<SynthesisResult>>) -> Self {
            Self {
                responses: Mutex::new(responses.into()),
                forced_sizes: Mutex::new(Vec::new()),
            }
        }

        fn calls(&self) -> Vec<Option<String>> {
            self.forced_sizes.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl SynthesisService for FakeService {
        async fn synthesize(&self, request: &SynthesisRequest) -> Result<SynthesisResult> {
            self.forced_sizes
                .lock()
                .unwrap()
                .push(request.forced_size.clone());
            self.responses
                .lock()
                .unwrap()
                .pop_front()
                .expect("fake service ran out of scripted responses")
        }
    }

    fn variant(size: Option<&str>) -> Result<SynthesisResult> {
        Ok(SynthesisResult {
            image: Some(EncodedImage::new("image/png", "ZmFrZQ==")),
            suggested_size: size.map(String::from),
        })
    }

    fn imageless(size: Option<&str>) -> Result<SynthesisResult> {
        Ok(SynthesisResult {
            image: None,
            suggested_size: size.map(String::from),
        })
    }

    fn photo_bytes() -> Vec<u8> {
        let img = ImageBuffer::from_pixel(40, 60, Rgb::<u8>([200, 180, 160]));
        let mut buffer = Cursor::new(Vec::new());
        DynamicImage::ImageRgb8(img)
            .write_to(&mut buffer, image::ImageFormat::Png)
            .unwrap();
        buffer.into_inner()
    }

    #[tokio::test]
    async fn batch_enforces_size_consistency() {
        let service = FakeService::scripted(vec![
            variant(Some("M")),
            variant(Some("L")), // drift the service may introduce
            variant(Some("S")),
        ]);
        let orchestrator = BatchOrchestrator::new(&service);

        let batch = orchestrator
            .generate_batch(&photo_bytes(), &photo_bytes(), &SCENARIOS[1], &NoProgress)
            .await
            .unwrap();

        assert_eq!(batch.results.len(), 3);
        assert_eq!(batch.suggested_size.as_deref(), Some("M"));
        for result in &batch.results {
            assert_eq!(result.suggested_size.as_deref(), Some("M"));
        }
        // The determining call runs unforced; the fan-out pins the size.
        assert_eq!(
            service.calls(),
            vec![None, Some("M".to_string()), Some("M".to_string())]
        );
    }

    #[tokio::test]
    async fn determining_failure_aborts_before_any_fanout() {
        let service = FakeService::scripted(vec![imageless(Some("M"))]);
        let orchestrator = BatchOrchestrator::new(&service);

        let err = orchestrator
            .generate_batch(&photo_bytes(), &photo_bytes(), &SCENARIOS[0], &NoProgress)
            .await
            .unwrap_err();

        assert!(matches!(err, FitroomError::NoImageReturned(_)));
        assert_eq!(service.calls().len(), 1);
    }

    #[tokio::test]
    async fn missing_size_degrades_softly() {
        let service = FakeService::scripted(vec![
            variant(None),
            variant(Some("L")),
            variant(None),
        ]);
        let orchestrator = BatchOrchestrator::new(&service);

        let batch = orchestrator
            .generate_batch(&photo_bytes(), &photo_bytes(), &SCENARIOS[2], &NoProgress)
            .await
            .unwrap();

        assert_eq!(batch.results.len(), 3);
        assert!(batch.suggested_size.is_none());
        assert!(batch.results.iter().all(|r| r.suggested_size.is_none()));
        assert_eq!(service.calls(), vec![None, None, None]);
    }

    #[tokio::test]
    async fn fanout_failure_fails_the_whole_batch_by_default() {
        let service = FakeService::scripted(vec![
            variant(Some("M")),
            Err(FitroomError::ServiceError("quota exceeded".to_string())),
            variant(Some("M")),
        ]);
        let orchestrator = BatchOrchestrator::new(&service);

        let err = orchestrator
            .generate_batch(&photo_bytes(), &photo_bytes(), &SCENARIOS[1], &NoProgress)
            .await
            .unwrap_err();

        assert!(matches!(err, FitroomError::ServiceError(_)));
    }

    #[tokio::test]
    async fn imageless_fanout_result_also_fails_the_batch_by_default() {
        let service = FakeService::scripted(vec![
            variant(Some("M")),
            imageless(Some("M")),
            variant(Some("M")),
        ]);
        let orchestrator = BatchOrchestrator::new(&service);

        let err = orchestrator
            .generate_batch(&photo_bytes(), &photo_bytes(), &SCENARIOS[1], &NoProgress)
            .await
            .unwrap_err();

        assert!(matches!(err, FitroomError::NoImageReturned(_)));
    }

    #[tokio::test]
    async fn keep_partial_policy_salvages_the_survivors() {
        let service = FakeService::scripted(vec![
            variant(Some("M")),
            Err(FitroomError::ServiceError("transient".to_string())),
            variant(Some("XL")),
        ]);
        let orchestrator = BatchOrchestrator::with_config(
            &service,
            OrchestratorConfig::new().with_fanout_policy(FanoutPolicy::KeepPartial),
        );

        let batch = orchestrator
            .generate_batch(&photo_bytes(), &photo_bytes(), &SCENARIOS[1], &NoProgress)
            .await
            .unwrap();

        assert_eq!(batch.results.len(), 2);
        assert!(batch
            .results
            .iter()
            .all(|r| r.suggested_size.as_deref() == Some("M")));
    }

    #[tokio::test]
    async fn undecodable_subject_fails_before_any_call() {
        let service = FakeService::scripted(vec![]);
        let orchestrator = BatchOrchestrator::new(&service);

        let err = orchestrator
            .generate_batch(b"not an image", &photo_bytes(), &SCENARIOS[0], &NoProgress)
            .await
            .unwrap_err();

        assert!(matches!(err, FitroomError::ImageDecodeError(_)));
        assert!(service.calls().is_empty());
    }

    #[tokio::test]
    async fn progress_events_follow_the_stage_order() {
        let service = FakeService::scripted(vec![
            variant(Some("S")),
            variant(Some("S")),
            variant(Some("S")),
        ]);
        let orchestrator = BatchOrchestrator::new(&service);

        let events = Mutex::new(Vec::new());
        let observer = |event: &ProgressEvent| {
            events.lock().unwrap().push(format!("{:?}", event));
        };

        orchestrator
            .generate_batch(&photo_bytes(), &photo_bytes(), &SCENARIOS[1], &observer)
            .await
            .unwrap();

        let seen = events.lock().unwrap();
        assert!(seen[0].starts_with("ComposingInputs"));
        assert!(seen[1].starts_with("DeterminingCall"));
        assert!(seen[2].starts_with("FanOutDispatch"));
        assert!(seen.last().unwrap().starts_with("Merging"));
        assert_eq!(seen.len(), 5);
    }
}
