use crate::state::form::FieldId;
use crate::state::messages::{NetworkRequest, NetworkResponse};
use futures_util::future::join_all;
use liga_api::client::{ApiError, LigaApi};
use liga_api::EntityKind;
use log::{debug, error, warn};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::sync::mpsc;

const SPINNER_CHARS: [char; 10] = ['⠋', '⠙', '⠹', '⠸', '⠼', '⠴', '⠦', '⠧', '⠇', '⠏'];
pub const ERROR_CHAR: char = '!';

#[derive(Debug, Copy, Clone)]
pub struct LoadingState {
    pub is_loading: bool,
    pub spinner_char: char,
}

impl Default for LoadingState {
    fn default() -> Self {
        Self { is_loading: false, spinner_char: ' ' }
    }
}

/// Which response a failed request turns into.
enum Failure {
    List(EntityKind),
    Candidates(u64),
    Submit(u64),
}

impl Failure {
    fn into_response(self, err: ApiError) -> NetworkResponse {
        let message = err.to_string();
        match self {
            Failure::List(kind) => NetworkResponse::ListFailed { kind, message },
            Failure::Candidates(ticket) => NetworkResponse::CandidatesFailed { ticket },
            Failure::Submit(ticket) => NetworkResponse::SubmitFailed { ticket, message },
        }
    }
}

pub struct NetworkWorker {
    client: LigaApi,
    requests: mpsc::Receiver<NetworkRequest>,
    responses: mpsc::Sender<NetworkResponse>,
    is_loading: Arc<AtomicBool>,
}

impl NetworkWorker {
    pub fn new(
        client: LigaApi,
        requests: mpsc::Receiver<NetworkRequest>,
        responses: mpsc::Sender<NetworkResponse>,
    ) -> Self {
        Self {
            client,
            requests,
            responses,
            is_loading: Arc::new(AtomicBool::new(false)),
        }
    }

    pub async fn run(mut self) {
        while let Some(request) = self.requests.recv().await {
            self.start_loading_animation().await;

            let (failure, result) = match request {
                NetworkRequest::LoadList { kind } => {
                    (Failure::List(kind), self.handle_load_list(kind).await)
                }
                NetworkRequest::LoadCandidates { ticket, kind, url } => (
                    Failure::Candidates(ticket),
                    self.handle_load_candidates(ticket, kind, &url).await,
                ),
                NetworkRequest::ResolveForm { ticket, refs } => {
                    (Failure::Submit(ticket), Ok(self.handle_resolve_form(ticket, refs).await))
                }
                NetworkRequest::Create { ticket, kind, payload } => {
                    debug!("creating {}", kind.path());
                    let result = self
                        .client
                        .create(kind, &payload)
                        .await
                        .map(|record| NetworkResponse::Created { ticket, kind, record });
                    (Failure::Submit(ticket), result)
                }
                NetworkRequest::Update { ticket, kind, code, payload } => {
                    debug!("updating {} {code}", kind.path());
                    let result = self
                        .client
                        .update(kind, &code, &payload)
                        .await
                        .map(|record| NetworkResponse::Updated { ticket, kind, record });
                    (Failure::Submit(ticket), result)
                }
                NetworkRequest::DeleteBatch { kind, codes } => {
                    (Failure::List(kind), Ok(self.handle_delete_batch(kind, codes).await))
                }
            };

            debug!("network request complete");
            let is_ok = match &result {
                Ok(NetworkResponse::BatchDeleted { failed, .. }) => failed.is_empty(),
                other => other.is_ok(),
            };
            self.stop_loading_animation(is_ok).await;

            let response = result.unwrap_or_else(|err| {
                error!("{err}");
                failure.into_response(err)
            });

            if let Err(e) = self.responses.send(response).await {
                error!("Failed to send network response: {e}");
                break;
            }
        }
    }

    async fn handle_load_list(&self, kind: EntityKind) -> Result<NetworkResponse, ApiError> {
        debug!("loading {}", kind.plural());
        let records = self.client.list(kind).await?;
        Ok(NetworkResponse::ListLoaded { kind, records })
    }

    async fn handle_load_candidates(
        &self,
        ticket: u64,
        kind: EntityKind,
        url: &str,
    ) -> Result<NetworkResponse, ApiError> {
        debug!("loading selector candidates from {url}");
        let records = self.client.fetch_url(kind, url).await?;
        Ok(NetworkResponse::CandidatesLoaded { ticket, records })
    }

    /// One `find` per foreign key, all in flight at once. A failed lookup
    /// leaves that field empty instead of failing the whole form.
    async fn handle_resolve_form(
        &self,
        ticket: u64,
        refs: Vec<(FieldId, EntityKind, String)>,
    ) -> NetworkResponse {
        let lookups = refs.into_iter().map(|(id, kind, code)| async move {
            match self.client.find(kind, &code).await {
                Ok(record) => (id, Some(record)),
                Err(e) => {
                    warn!("could not resolve {} {code}: {e}", kind.path());
                    (id, None)
                }
            }
        });
        let resolved = join_all(lookups).await;
        NetworkResponse::FormResolved { ticket, resolved }
    }

    async fn handle_delete_batch(&self, kind: EntityKind, codes: Vec<String>) -> NetworkResponse {
        let outcome = self.client.delete_many(kind, codes).await;
        NetworkResponse::BatchDeleted {
            kind,
            deleted: outcome.deleted,
            failed: outcome
                .failed
                .into_iter()
                .map(|(code, err)| (code, err.to_string()))
                .collect(),
        }
    }

    async fn start_loading_animation(&self) {
        self.is_loading.store(true, Ordering::Relaxed);

        let mut loading_state =
            LoadingState { is_loading: true, spinner_char: SPINNER_CHARS[0] };
        let _ = self
            .responses
            .send(NetworkResponse::LoadingStateChanged { loading_state })
            .await;

        let responses = self.responses.clone();
        let is_loading = self.is_loading.clone();

        tokio::spawn(async move {
            let mut spinner_index = 1;
            let mut interval = tokio::time::interval(Duration::from_millis(33));
            loop {
                interval.tick().await;
                if !is_loading.load(Ordering::Relaxed) {
                    break;
                }
                loading_state.spinner_char = SPINNER_CHARS[spinner_index];
                spinner_index = (spinner_index + 1) % SPINNER_CHARS.len();
                let _ = responses
                    .send(NetworkResponse::LoadingStateChanged { loading_state })
                    .await;
            }
        });
    }

    async fn stop_loading_animation(&self, is_ok: bool) {
        self.is_loading.store(false, Ordering::Relaxed);
        tokio::time::sleep(Duration::from_millis(15)).await;

        let spinner_char = if is_ok { ' ' } else { ERROR_CHAR };
        let _ = self
            .responses
            .send(NetworkResponse::LoadingStateChanged {
                loading_state: LoadingState { is_loading: false, spinner_char },
            })
            .await;
    }
}
