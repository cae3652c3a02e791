use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, error, info};

use super::state::{reduce, Action, Effect, Phase, WorkflowState};
use crate::config::{default_credential_from_env, DataPaths};
use crate::error::{AppError, AppResult};
use crate::gallery::{GalleryStore, GenerationRecord};
use crate::image_generator::{ImageDownloader, InferenceClient};
use crate::persistence::credentials::CredentialStore;
use crate::persistence::db::SqliteStore;
use crate::persistence::{KeyValueStore, MemoryStore};

/// Everything the controller needs from the outside world at startup.
#[derive(Clone)]
pub struct AppContext {
    pub store: Arc<dyn KeyValueStore>,
    pub default_credential: Option<String>,
}

impl AppContext {
    pub fn new(store: Arc<dyn KeyValueStore>, default_credential: Option<String>) -> Self {
        Self {
            store,
            default_credential,
        }
    }

    pub fn open(paths: &DataPaths) -> AppResult<Self> {
        let store = SqliteStore::open(&paths.db_file())?;
        Ok(Self::new(Arc::new(store), default_credential_from_env()))
    }

    pub fn in_memory(default_credential: Option<String>) -> Self {
        Self::new(Arc::new(MemoryStore::new()), default_credential)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    Generated(GenerationRecord),
    /// Another generation was already in flight.
    Ignored,
}

pub struct GenerationController<C> {
    client: C,
    downloader: ImageDownloader,
    gallery: Mutex<GalleryStore>,
    credentials: Mutex<CredentialStore>,
    state: Mutex<WorkflowState>,
}

fn lock<'a, T>(mutex: &'a Mutex<T>, what: &str) -> AppResult<MutexGuard<'a, T>> {
    mutex
        .lock()
        .map_err(|e| AppError::Other(format!("{} lock poisoned: {}", what, e)))
}

/// Returns the workflow to `Idle` if a submit future is dropped mid-flight.
struct InFlight<'a> {
    state: &'a Mutex<WorkflowState>,
    armed: bool,
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        if let Ok(mut state) = self.state.lock() {
            state.phase = Phase::Idle;
            state.pending_prompt = None;
        }
    }
}

impl<C: InferenceClient> GenerationController<C> {
    /// Loads the gallery and credential from the context's store.
    pub fn initialize(ctx: &AppContext, client: C) -> Self {
        let gallery = GalleryStore::load(ctx.store.clone());
        let credentials = CredentialStore::load(ctx.store.clone(), ctx.default_credential.clone());
        info!("Controller ready with {} gallery records", gallery.len());

        Self {
            client,
            downloader: ImageDownloader::default(),
            gallery: Mutex::new(gallery),
            credentials: Mutex::new(credentials),
            state: Mutex::new(WorkflowState::default()),
        }
    }

    pub fn with_downloader(mut self, downloader: ImageDownloader) -> Self {
        self.downloader = downloader;
        self
    }

    pub async fn submit(&self, prompt: &str) -> AppResult<SubmitOutcome> {
        let credential = lock(&self.credentials, "credential")?.get().to_string();

        let (prompt, credential) = {
            let mut state = lock(&self.state, "workflow")?;
            let transition = reduce(
                &state,
                Action::Submit {
                    prompt: prompt.to_string(),
                    credential,
                },
            );
            *state = transition.state;

            match transition.effects.into_iter().next() {
                Some(Effect::Invoke { prompt, credential }) => (prompt, credential),
                Some(Effect::Reject(rejection)) => return Err(rejection.into()),
                Some(other) => {
                    return Err(AppError::Other(format!("Unexpected effect on submit: {:?}", other)))
                }
                None => {
                    debug!("Generation already in flight, ignoring submit");
                    return Ok(SubmitOutcome::Ignored);
                }
            }
        };

        let mut in_flight = InFlight {
            state: &self.state,
            armed: true,
        };

        let action = match self.client.generate(&prompt, &credential).await {
            Ok(image_url) => Action::GenerationSucceeded { image_url },
            Err(AppError::GenerationFailed(cause)) => Action::GenerationFailed { cause },
            Err(other) => Action::GenerationFailed {
                cause: other.to_string(),
            },
        };

        in_flight.armed = false;
        self.complete(action)
    }

    fn complete(&self, action: Action) -> AppResult<SubmitOutcome> {
        let mut state = lock(&self.state, "workflow")?;
        let transition = reduce(&state, action);

        match transition.effects.into_iter().next() {
            Some(Effect::Persist(record)) => {
                let appended = lock(&self.gallery, "gallery")?
                    .append(record.clone())
                    .map(|records| records.len());
                match appended {
                    Ok(len) => {
                        *state = transition.state;
                        info!("Saved generation #{} to gallery", len - 1);
                        Ok(SubmitOutcome::Generated(record))
                    }
                    Err(e) => {
                        error!("Failed to save generation: {}", e);
                        state.phase = Phase::Idle;
                        state.pending_prompt = None;
                        Err(e)
                    }
                }
            }
            Some(Effect::Reject(rejection)) => {
                *state = transition.state;
                Err(rejection.into())
            }
            _ => {
                *state = transition.state;
                Ok(SubmitOutcome::Ignored)
            }
        }
    }

    pub fn delete_record(&self, position: i64) -> AppResult<Vec<GenerationRecord>> {
        let mut gallery = lock(&self.gallery, "gallery")?;
        let records = gallery.remove_at(position)?.to_vec();
        info!("Deleted gallery record {}", position);
        Ok(records)
    }

    /// Saves the record's image to `dest`. Gallery state is not touched.
    pub async fn download_record(&self, position: i64, dest: &Path) -> AppResult<PathBuf> {
        let url = self.record(position)?.url;
        self.downloader.save(&url, dest).await
    }

    pub fn record(&self, position: i64) -> AppResult<GenerationRecord> {
        Ok(lock(&self.gallery, "gallery")?.get(position)?.clone())
    }

    pub fn gallery(&self) -> AppResult<Vec<GenerationRecord>> {
        Ok(lock(&self.gallery, "gallery")?.records().to_vec())
    }

    pub fn credential(&self) -> AppResult<String> {
        Ok(lock(&self.credentials, "credential")?.get().to_string())
    }

    pub fn masked_credential(&self) -> AppResult<String> {
        Ok(lock(&self.credentials, "credential")?.masked())
    }

    pub fn set_credential(&self, value: &str) -> AppResult<()> {
        lock(&self.credentials, "credential")?.set(value)
    }

    pub fn state(&self) -> AppResult<WorkflowState> {
        Ok(lock(&self.state, "workflow")?.clone())
    }

    pub fn last_image(&self) -> AppResult<Option<String>> {
        Ok(self.state()?.last_image)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gallery::store::GALLERY_KEY;
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;
    use tokio::sync::Notify;

    #[derive(Default)]
    struct FakeClient {
        responses: Mutex<VecDeque<Result<String, String>>>,
        calls: AtomicUsize,
        seen: Mutex<Vec<(String, String)>>,
        gate: Option<Arc<Notify>>,
    }

    impl FakeClient {
        fn scripted(responses: Vec<Result<&str, &str>>) -> Self {
            Self {
                responses: Mutex::new(
                    responses
                        .into_iter()
                        .map(|r| r.map(str::to_string).map_err(str::to_string))
                        .collect(),
                ),
                ..Self::default()
            }
        }

        fn gated(responses: Vec<Result<&str, &str>>, gate: Arc<Notify>) -> Self {
            Self {
                gate: Some(gate),
                ..Self::scripted(responses)
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl InferenceClient for FakeClient {
        async fn generate(&self, prompt: &str, credential: &str) -> AppResult<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.seen
                .lock()
                .unwrap()
                .push((prompt.to_string(), credential.to_string()));
            if let Some(gate) = &self.gate {
                gate.notified().await;
            }
            self.responses
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err("no scripted response".to_string()))
                .map_err(AppError::GenerationFailed)
        }
    }

    fn controller(client: FakeClient) -> GenerationController<FakeClient> {
        GenerationController::initialize(&AppContext::in_memory(Some("r8_key".into())), client)
    }

    #[tokio::test]
    async fn test_concrete_scenario() {
        let c = controller(FakeClient::scripted(vec![Ok("img://1"), Ok("img://2")]));

        let out = c.submit("a red fox").await.unwrap();
        assert_eq!(out, SubmitOutcome::Generated(GenerationRecord::new("a red fox", "img://1")));
        assert_eq!(c.gallery().unwrap(), vec![GenerationRecord::new("a red fox", "img://1")]);

        assert!(matches!(c.submit("").await, Err(AppError::EmptyPrompt)));
        assert_eq!(c.gallery().unwrap().len(), 1);

        c.submit("a blue owl").await.unwrap();
        assert_eq!(
            c.gallery().unwrap(),
            vec![
                GenerationRecord::new("a red fox", "img://1"),
                GenerationRecord::new("a blue owl", "img://2"),
            ]
        );

        assert_eq!(
            c.delete_record(0).unwrap(),
            vec![GenerationRecord::new("a blue owl", "img://2")]
        );

        assert!(matches!(
            c.delete_record(5),
            Err(AppError::InvalidPosition { position: 5, len: 1 })
        ));
        assert_eq!(c.gallery().unwrap(), vec![GenerationRecord::new("a blue owl", "img://2")]);
        assert_eq!(c.last_image().unwrap().as_deref(), Some("img://2"));
    }

    #[tokio::test]
    async fn test_blank_prompt_never_calls_client() {
        let c = controller(FakeClient::scripted(vec![Ok("img://1")]));
        for prompt in ["", " ", "\t\n"] {
            assert!(matches!(c.submit(prompt).await, Err(AppError::EmptyPrompt)));
        }
        assert_eq!(c.client.calls(), 0);
        assert!(c.gallery().unwrap().is_empty());
        assert_eq!(c.state().unwrap(), WorkflowState::default());
    }

    #[tokio::test]
    async fn test_missing_credential_never_calls_client() {
        let ctx = AppContext::in_memory(None);
        let c = GenerationController::initialize(&ctx, FakeClient::scripted(vec![Ok("img://1")]));

        assert!(matches!(c.submit("a red fox").await, Err(AppError::MissingCredential)));
        assert_eq!(c.client.calls(), 0);

        c.set_credential("r8_new").unwrap();
        c.submit("a red fox").await.unwrap();
        assert_eq!(
            c.client.seen.lock().unwrap()[0],
            ("a red fox".to_string(), "r8_new".to_string())
        );
    }

    #[tokio::test]
    async fn test_failure_leaves_gallery_and_image_untouched() {
        let c = controller(FakeClient::scripted(vec![
            Ok("img://1"),
            Err("provider exploded"),
            Ok("img://2"),
        ]));
        c.submit("first").await.unwrap();

        let err = c.submit("second").await.unwrap_err();
        assert!(matches!(err, AppError::GenerationFailed(ref cause) if cause == "provider exploded"));
        assert_eq!(c.gallery().unwrap().len(), 1);
        assert_eq!(c.last_image().unwrap().as_deref(), Some("img://1"));
        assert_eq!(c.state().unwrap().phase, Phase::Idle);

        // Retrying the same prompt replays nothing from the failed attempt
        c.submit("second").await.unwrap();
        assert_eq!(
            c.gallery().unwrap(),
            vec![
                GenerationRecord::new("first", "img://1"),
                GenerationRecord::new("second", "img://2"),
            ]
        );
    }

    #[tokio::test]
    async fn test_second_submit_while_in_flight_is_ignored() {
        let gate = Arc::new(Notify::new());
        let c = controller(FakeClient::gated(vec![Ok("img://1")], gate.clone()));

        let first = c.submit("a red fox");
        tokio::pin!(first);
        assert!(tokio::time::timeout(Duration::from_millis(20), &mut first)
            .await
            .is_err());
        assert_eq!(c.state().unwrap().phase, Phase::Submitting);

        assert_eq!(c.submit("a blue owl").await.unwrap(), SubmitOutcome::Ignored);
        assert_eq!(c.client.calls(), 1);

        gate.notify_one();
        assert_eq!(
            first.await.unwrap(),
            SubmitOutcome::Generated(GenerationRecord::new("a red fox", "img://1"))
        );
        assert_eq!(c.gallery().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_dropped_submit_returns_to_idle() {
        let gate = Arc::new(Notify::new());
        let c = controller(FakeClient::gated(vec![Ok("img://1")], gate));

        {
            let first = c.submit("a red fox");
            tokio::pin!(first);
            let _ = tokio::time::timeout(Duration::from_millis(20), &mut first).await;
            assert_eq!(c.state().unwrap().phase, Phase::Submitting);
        }

        assert_eq!(c.state().unwrap().phase, Phase::Idle);
        assert!(c.gallery().unwrap().is_empty());
    }

    struct ReadOnlyStore(MemoryStore);

    impl KeyValueStore for ReadOnlyStore {
        fn get(&self, key: &str) -> AppResult<Option<String>> {
            self.0.get(key)
        }
        fn set(&self, _key: &str, _value: &str) -> AppResult<()> {
            Err(AppError::Other("read-only".into()))
        }
    }

    #[tokio::test]
    async fn test_persist_failure_keeps_last_image() {
        let ctx = AppContext::new(Arc::new(ReadOnlyStore(MemoryStore::new())), Some("k".into()));
        let c = GenerationController::initialize(&ctx, FakeClient::scripted(vec![Ok("img://1")]));

        assert!(matches!(c.submit("a red fox").await, Err(AppError::Other(_))));
        assert!(c.gallery().unwrap().is_empty());
        assert_eq!(c.state().unwrap(), WorkflowState::default());
    }

    #[tokio::test]
    async fn test_initialize_loads_existing_gallery() {
        let ctx = AppContext::in_memory(Some("k".into()));
        ctx.store
            .set(GALLERY_KEY, r#"[{"prompt":"old","url":"img://0"}]"#)
            .unwrap();

        let c = GenerationController::initialize(&ctx, FakeClient::scripted(vec![Ok("img://1")]));
        c.submit("new").await.unwrap();

        let reloaded = GenerationController::initialize(&ctx, FakeClient::default());
        assert_eq!(
            reloaded.gallery().unwrap(),
            vec![
                GenerationRecord::new("old", "img://0"),
                GenerationRecord::new("new", "img://1"),
            ]
        );
    }

    #[tokio::test]
    async fn test_download_record_saves_image() {
        use base64::{engine::general_purpose, Engine};

        let data_url = format!(
            "data:image/webp;base64,{}",
            general_purpose::STANDARD.encode(b"webp-bytes")
        );
        let c = controller(FakeClient::scripted(vec![Ok(data_url.as_str())]))
            .with_downloader(ImageDownloader::new(reqwest::Client::new()));
        c.submit("a red fox").await.unwrap();

        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("generated_image.webp");
        let saved = c.download_record(0, &dest).await.unwrap();

        assert_eq!(std::fs::read(saved).unwrap(), b"webp-bytes");
        assert_eq!(c.gallery().unwrap().len(), 1);
        assert!(matches!(
            c.download_record(3, &dest).await,
            Err(AppError::InvalidPosition { .. })
        ));
    }
}
