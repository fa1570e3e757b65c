use chrono::{DateTime, Utc};
use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, PoisonError, RwLock};
use tokio::sync::watch;
use tokio::time::Instant;

use super::api::{ApiFailure, CreateOutcome, HttpPromptsApi, PromptsApi};
use super::errors::{self, StoreOperation, LOCAL_INVALID_PATCH, LOCAL_PROMPT_NOT_FOUND};
use crate::core::config::StoreConfig;
use crate::features::prompts::models::{NewPrompt, Prompt, PromptPatch};
use crate::features::prompts::transform;

#[derive(Debug, Clone, Copy)]
struct FetchStamp {
    at: Instant,
    wall: DateTime<Utc>,
}

impl FetchStamp {
    fn now() -> Self {
        Self {
            at: Instant::now(),
            wall: Utc::now(),
        }
    }
}

#[derive(Debug, Default)]
struct StoreState {
    prompts: Vec<Prompt>,
    error: Option<String>,
    last_fetch: Option<FetchStamp>,
    selected_prompt_id: Option<String>,
    superseded_updates: u64,
}

/// Consistent copy of the store state at one point in time
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StoreSnapshot {
    pub prompts: Vec<Prompt>,
    pub loading: bool,
    pub error: Option<String>,
    pub last_fetch_at: Option<DateTime<Utc>>,
    pub selected_prompt_id: Option<String>,
    pub superseded_updates: u64,
}

/// Shared, cached view of the prompts collection.
///
/// Writes are applied under a short lock that is never held across an
/// await, so an optimistic change is visible to every reader as soon as the
/// operation that made it reaches its network call. Public operations never
/// return errors; failures land in [`StoreSnapshot::error`] and the call
/// returns `None`.
///
/// Dropping an in-flight operation cancels it: `loading` is released and a
/// pending optimistic update is rolled back.
pub struct PromptsStore {
    api: Arc<dyn PromptsApi>,
    config: StoreConfig,
    state: RwLock<StoreState>,
    in_flight: AtomicUsize,
    revision: watch::Sender<u64>,
}

impl PromptsStore {
    pub fn new(api: Arc<dyn PromptsApi>, config: StoreConfig) -> Self {
        let (revision, _) = watch::channel(0);
        Self {
            api,
            config,
            state: RwLock::new(StoreState::default()),
            in_flight: AtomicUsize::new(0),
            revision,
        }
    }

    /// Store over HTTP, configured from `PROMPTS_*` environment variables
    pub fn from_env() -> Result<Self, String> {
        let config = StoreConfig::from_env()?;
        let api = HttpPromptsApi::new(&config)
            .map_err(|e| format!("Failed to build prompts HTTP client: {}", e))?;
        Ok(Self::new(Arc::new(api), config))
    }

    /// Load the collection unless a fresh, non-empty copy is already held
    pub async fn fetch(&self) {
        if self.cache_is_fresh() {
            tracing::debug!("Serving prompts from cache");
            return;
        }

        let _in_flight = InFlight::begin(self);
        self.write(|s| s.error = None);

        match self.call(self.api.list()).await {
            Ok(prompts) => {
                let prompts = unique_by_id(prompts);
                tracing::debug!("Fetched {} prompts", prompts.len());
                self.write(|s| {
                    s.prompts = prompts;
                    s.last_fetch = Some(FetchStamp::now());
                });
            }
            Err(failure) => self.record_failure(StoreOperation::Fetch, &failure),
        }
    }

    /// Create a prompt and add it to the collection.
    ///
    /// Returns `None` on failure, and also when the service created the
    /// prompt but could not return it; the next fetch reloads in that case.
    pub async fn create(&self, prompt: NewPrompt) -> Option<Prompt> {
        let _in_flight = InFlight::begin(self);
        self.write(|s| s.error = None);

        match self.call(self.api.create(&prompt)).await {
            Ok(CreateOutcome::Created(created)) => Some(self.insert_created(created)),
            Ok(CreateOutcome::IdentityUncertain(created)) => {
                tracing::warn!(
                    "Created prompt '{}' shares its name with another prompt; using {}",
                    created.name,
                    created.id
                );
                Some(self.insert_created(created))
            }
            Ok(CreateOutcome::WithoutDetails) => {
                tracing::info!("Prompt '{}' created without details", prompt.name);
                self.invalidate_cache();
                None
            }
            Err(failure) => {
                self.record_failure(StoreOperation::Create, &failure);
                None
            }
        }
    }

    /// Apply `patch` to a held prompt, optimistically.
    ///
    /// The merged prompt replaces the local entry before the request is
    /// sent. It is replaced by the service's copy on success and by the
    /// pre-update copy on failure or cancellation. Overlapping updates of one
    /// prompt resolve last-wins; each one that finds somebody else's value in
    /// place is counted in `superseded_updates`.
    ///
    /// A patch that breaks a field rule is refused before anything is
    /// written or sent, so a held prompt never carries an invalid value.
    pub async fn update(&self, id: &str, patch: PromptPatch) -> Option<Prompt> {
        let violations = transform::validate(&patch);
        if !violations.is_empty() {
            tracing::warn!(
                "Update of prompt {} refused: {} invalid field(s)",
                id,
                violations.len()
            );
            self.write(|s| s.error = Some(LOCAL_INVALID_PATCH.to_string()));
            return None;
        }

        let _in_flight = InFlight::begin(self);

        let started = self.write(|s| match s.prompts.iter_mut().find(|p| p.id == id) {
            Some(slot) => {
                let original = slot.clone();
                *slot = original.merged(&patch);
                s.error = None;
                Some((original, slot.clone()))
            }
            None => {
                s.error = Some(LOCAL_PROMPT_NOT_FOUND.to_string());
                None
            }
        });

        let Some((original, optimistic)) = started else {
            tracing::warn!("Update of unknown prompt {} ignored", id);
            return None;
        };

        let pending = PendingUpdate {
            store: self,
            id,
            optimistic,
            original: Some(original),
        };

        match self.call(self.api.update(id, &patch)).await {
            Ok(prompt) => {
                pending.resolve(prompt.clone());
                self.invalidate_cache();
                Some(prompt)
            }
            Err(failure) => {
                drop(pending);
                self.record_failure(StoreOperation::Update, &failure);
                None
            }
        }
    }

    /// Drop the cache and fetch again
    pub async fn refresh(&self) {
        self.invalidate_cache();
        self.fetch().await;
    }

    pub fn get_by_id(&self, id: &str) -> Option<Prompt> {
        self.read(|s| s.prompts.iter().find(|p| p.id == id).cloned())
    }

    pub fn prompts(&self) -> Vec<Prompt> {
        self.read(|s| s.prompts.clone())
    }

    pub fn is_loading(&self) -> bool {
        self.in_flight.load(Ordering::SeqCst) > 0
    }

    pub fn error(&self) -> Option<String> {
        self.read(|s| s.error.clone())
    }

    pub fn clear_error(&self) {
        self.write(|s| s.error = None);
    }

    pub fn selected_prompt_id(&self) -> Option<String> {
        self.read(|s| s.selected_prompt_id.clone())
    }

    pub fn set_selected_prompt(&self, id: impl Into<String>) {
        let id = id.into();
        self.write(|s| s.selected_prompt_id = Some(id));
    }

    pub fn snapshot(&self) -> StoreSnapshot {
        let loading = self.is_loading();
        self.read(|s| StoreSnapshot {
            prompts: s.prompts.clone(),
            loading,
            error: s.error.clone(),
            last_fetch_at: s.last_fetch.map(|stamp| stamp.wall),
            selected_prompt_id: s.selected_prompt_id.clone(),
            superseded_updates: s.superseded_updates,
        })
    }

    /// Receiver of a revision number bumped on every state change
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.revision.subscribe()
    }

    /// Back to the initial state. In-flight operations still finish.
    pub fn reset(&self) {
        self.write(|s| *s = StoreState::default());
    }

    fn cache_is_fresh(&self) -> bool {
        self.read(|s| {
            !s.prompts.is_empty()
                && s
                    .last_fetch
                    .is_some_and(|stamp| stamp.at.elapsed() < self.config.cache_ttl)
        })
    }

    fn invalidate_cache(&self) {
        self.write(|s| s.last_fetch = None);
    }

    fn insert_created(&self, prompt: Prompt) -> Prompt {
        self.write(|s| {
            upsert(&mut s.prompts, prompt.clone());
            s.last_fetch = None;
        });
        prompt
    }

    /// Final write of an update, whether its result or its rollback
    fn settle(&self, id: &str, optimistic: &Prompt, value: Prompt) {
        self.write(|s| {
            let Some(slot) = s.prompts.iter_mut().find(|p| p.id == id) else {
                tracing::warn!("Prompt {} left the store while an update was in flight", id);
                s.superseded_updates += 1;
                return;
            };

            if *slot != *optimistic {
                tracing::warn!(
                    "Prompt {} changed while an update was in flight; last result wins",
                    id
                );
                s.superseded_updates += 1;
            }
            *slot = value;
        });
    }

    async fn call<T>(
        &self,
        request: impl Future<Output = Result<T, ApiFailure>>,
    ) -> Result<T, ApiFailure> {
        tokio::time::timeout(self.config.request_timeout, request)
            .await
            .unwrap_or(Err(ApiFailure::Timeout))
    }

    fn record_failure(&self, operation: StoreOperation, failure: &ApiFailure) {
        tracing::warn!(
            operation = %operation,
            kind = failure.kind(),
            "Prompts store operation failed: {}",
            failure
        );
        let message = errors::user_message(failure, operation);
        self.write(|s| s.error = Some(message));
    }

    fn read<R>(&self, f: impl FnOnce(&StoreState) -> R) -> R {
        let state = self.state.read().unwrap_or_else(PoisonError::into_inner);
        f(&*state)
    }

    fn write<R>(&self, f: impl FnOnce(&mut StoreState) -> R) -> R {
        let result = {
            let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
            f(&mut *state)
        };
        self.bump();
        result
    }

    fn bump(&self) {
        self.revision.send_modify(|r| *r = r.wrapping_add(1));
    }
}

/// Holds `loading` up for as long as it lives
struct InFlight<'a> {
    store: &'a PromptsStore,
}

impl<'a> InFlight<'a> {
    fn begin(store: &'a PromptsStore) -> Self {
        store.in_flight.fetch_add(1, Ordering::SeqCst);
        store.bump();
        Self { store }
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.store.in_flight.fetch_sub(1, Ordering::SeqCst);
        self.store.bump();
    }
}

/// Rolls the optimistic write back unless resolved first
struct PendingUpdate<'a> {
    store: &'a PromptsStore,
    id: &'a str,
    optimistic: Prompt,
    original: Option<Prompt>,
}

impl PendingUpdate<'_> {
    fn resolve(mut self, authoritative: Prompt) {
        self.original = None;
        self.store.settle(self.id, &self.optimistic, authoritative);
    }
}

impl Drop for PendingUpdate<'_> {
    fn drop(&mut self) {
        if let Some(original) = self.original.take() {
            tracing::debug!("Rolling back optimistic update of prompt {}", self.id);
            self.store.settle(self.id, &self.optimistic, original);
        }
    }
}

fn upsert(prompts: &mut Vec<Prompt>, prompt: Prompt) {
    match prompts.iter_mut().find(|p| p.id == prompt.id) {
        Some(slot) => *slot = prompt,
        None => prompts.push(prompt),
    }
}

fn unique_by_id(prompts: Vec<Prompt>) -> Vec<Prompt> {
    let mut unique = Vec::with_capacity(prompts.len());
    for prompt in prompts {
        upsert(&mut unique, prompt);
    }
    unique
}
