use crate::payload::Payload;
use crate::{EntityKind, Record, Resource, with_resource};
use futures_util::future::join_all;
use log::{debug, warn};
use reqwest::{Client, Method, StatusCode};
use serde::de::DeserializeOwned;
use std::fmt;
use std::time::Duration;

pub type ApiResult<T> = Result<T, ApiError>;

pub const DEFAULT_BASE_URL: &str = "http://localhost:3000";

/// League API client. Every call is a discrete request/response; nothing is cached.
#[derive(Debug, Clone)]
pub struct LigaApi {
    client: Client,
    base_url: String,
    timeout: Duration,
}

impl Default for LigaApi {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_URL)
    }
}

#[derive(Debug)]
pub enum ApiError {
    Network(reqwest::Error, String),
    Api(reqwest::Error, String),
    Parsing(reqwest::Error, String),
    NotFound(String),
    Other(String),
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::Network(e, url) => write!(f, "Network error for {url}: {e}"),
            ApiError::Api(e, url) => write!(f, "API error for {url}: {e}"),
            ApiError::Parsing(e, url) => write!(f, "Parse error for {url}: {e}"),
            ApiError::NotFound(msg) => write!(f, "Not found: {msg}"),
            ApiError::Other(msg) => write!(f, "Error: {msg}"),
        }
    }
}

impl std::error::Error for ApiError {}

/// Per-item result of a batch delete. Successes are never rolled back.
#[derive(Debug, Default)]
pub struct BatchOutcome {
    pub deleted: Vec<String>,
    pub failed: Vec<(String, ApiError)>,
}

impl LigaApi {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: Client::builder()
                .user_agent("liga/0.1 (terminal league manager)")
                .build()
                .unwrap_or_default(),
            base_url: base_url.into().trim_end_matches('/').to_owned(),
            timeout: Duration::from_secs(10),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    // -----------------------------------------------------------------------
    // URL builders
    // -----------------------------------------------------------------------

    pub fn list_url(&self, kind: EntityKind) -> String {
        format!("{}/{}", self.base_url, kind.path())
    }

    /// Composite codes (`game/statistic/player`) expand into path segments as-is.
    pub fn record_url(&self, kind: EntityKind, code: &str) -> String {
        format!("{}/{}/{code}", self.base_url, kind.path())
    }

    /// Players belonging to either of two teams.
    pub fn players_in_teams_url(&self, team_a: &str, team_b: &str) -> String {
        format!(
            "{}/jugador/buscar?equiposId={team_a}&equiposId={team_b}",
            self.base_url
        )
    }

    /// Statistics a player has not yet recorded in a game.
    pub fn missing_statistics_url(&self, jugador: &str, juego: &str) -> String {
        format!(
            "{}/estadistica/jugador/{jugador}/juego/{juego}/faltantes",
            self.base_url
        )
    }

    // -----------------------------------------------------------------------
    // Reads
    // -----------------------------------------------------------------------

    pub async fn list(&self, kind: EntityKind) -> ApiResult<Vec<Record>> {
        let url = self.list_url(kind);
        self.fetch_url(kind, &url).await
    }

    /// GET a caller-built URL that answers with an array of `kind` records.
    pub async fn fetch_url(&self, kind: EntityKind, url: &str) -> ApiResult<Vec<Record>> {
        with_resource!(kind, T => self.get_records::<T>(url).await)
    }

    pub async fn find(&self, kind: EntityKind, code: &str) -> ApiResult<Record> {
        let url = self.record_url(kind, code);
        with_resource!(kind, T => self.send::<T>(Method::GET, &url, None).await.map(T::into_record))
    }

    // -----------------------------------------------------------------------
    // Writes
    // -----------------------------------------------------------------------

    pub async fn create(&self, kind: EntityKind, payload: &Payload) -> ApiResult<Record> {
        let url = self.list_url(kind);
        with_resource!(kind, T => self
            .send::<T>(Method::POST, &url, Some(payload))
            .await
            .map(T::into_record))
    }

    pub async fn update(&self, kind: EntityKind, code: &str, payload: &Payload) -> ApiResult<Record> {
        let url = self.record_url(kind, code);
        with_resource!(kind, T => self
            .send::<T>(Method::PATCH, &url, Some(payload))
            .await
            .map(T::into_record))
    }

    pub async fn delete(&self, kind: EntityKind, code: &str) -> ApiResult<()> {
        let url = self.record_url(kind, code);
        let response = self
            .client
            .delete(&url)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| ApiError::Network(e, url.clone()))?;
        response
            .error_for_status()
            .map(|_| ())
            .map_err(|e| classify_status(e, url))
    }

    /// Issue one DELETE per code concurrently and collect each outcome independently.
    pub async fn delete_many(&self, kind: EntityKind, codes: Vec<String>) -> BatchOutcome {
        let results = join_all(codes.iter().map(|code| self.delete(kind, code))).await;

        let mut outcome = BatchOutcome::default();
        for (code, result) in codes.into_iter().zip(results) {
            match result {
                Ok(()) => {
                    debug!("deleted {kind} {code}");
                    outcome.deleted.push(code);
                }
                Err(e) => {
                    warn!("failed to delete {kind} {code}: {e}");
                    outcome.failed.push((code, e));
                }
            }
        }
        outcome
    }

    async fn get_records<T: Resource>(&self, url: &str) -> ApiResult<Vec<Record>> {
        let items = self.send::<Vec<T>>(Method::GET, url, None).await?;
        Ok(items.into_iter().map(T::into_record).collect())
    }

    async fn send<T: DeserializeOwned>(
        &self,
        method: Method,
        url: &str,
        body: Option<&Payload>,
    ) -> ApiResult<T> {
        let mut request = self.client.request(method, url).timeout(self.timeout);
        if let Some(body) = body {
            request = request.json(body);
        }
        let response = request
            .send()
            .await
            .map_err(|e| ApiError::Network(e, url.to_owned()))?;

        match response.error_for_status() {
            Ok(res) => res
                .json::<T>()
                .await
                .map_err(|e| ApiError::Parsing(e, url.to_owned())),
            Err(e) => Err(classify_status(e, url.to_owned())),
        }
    }
}

fn classify_status(e: reqwest::Error, url: String) -> ApiError {
    if e.status() == Some(StatusCode::NOT_FOUND) {
        ApiError::NotFound(url)
    } else {
        ApiError::Api(e, url)
    }
}
