use crate::state::form::FieldId;
use crate::state::network::LoadingState;
use crossterm::event::KeyEvent;
use liga_api::payload::Payload;
use liga_api::{EntityKind, Record};

#[derive(Debug, Clone)]
pub enum NetworkRequest {
    LoadList { kind: EntityKind },
    /// Candidates for an open selector; `ticket` identifies the selector.
    LoadCandidates { ticket: u64, kind: EntityKind, url: String },
    /// Edit-mode foreign keys, fetched together.
    ResolveForm { ticket: u64, refs: Vec<(FieldId, EntityKind, String)> },
    Create { ticket: u64, kind: EntityKind, payload: Payload },
    Update { ticket: u64, kind: EntityKind, code: String, payload: Payload },
    DeleteBatch { kind: EntityKind, codes: Vec<String> },
}

#[derive(Debug)]
pub enum NetworkResponse {
    LoadingStateChanged { loading_state: LoadingState },
    ListLoaded { kind: EntityKind, records: Vec<Record> },
    ListFailed { kind: EntityKind, message: String },
    CandidatesLoaded { ticket: u64, records: Vec<Record> },
    CandidatesFailed { ticket: u64 },
    FormResolved { ticket: u64, resolved: Vec<(FieldId, Option<Record>)> },
    Created { ticket: u64, kind: EntityKind, record: Record },
    Updated { ticket: u64, kind: EntityKind, record: Record },
    SubmitFailed { ticket: u64, message: String },
    BatchDeleted { kind: EntityKind, deleted: Vec<String>, failed: Vec<(String, String)> },
}

#[derive(Debug, Clone)]
pub enum UiEvent {
    KeyPressed(KeyEvent),
    Resize,
    AppStarted,
    Tick,
}
