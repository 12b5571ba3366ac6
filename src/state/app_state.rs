use crate::app::MenuItem;
use crate::state::dashboard::Dashboard;
use crate::state::form::{FieldId, Form};
use crate::state::notifications::ToastState;
use crate::state::selector::EntitySelector;
use liga_api::{EntityKind, Record};
use std::collections::BTreeMap;

/// A selector opened from one of the form's relational fields.
#[derive(Debug)]
pub struct OpenSelector {
    pub field: FieldId,
    pub selector: EntitySelector<Record>,
}

#[derive(Debug)]
pub struct FormScreen {
    pub form: Form,
    pub selector: Option<OpenSelector>,
}

#[derive(Debug)]
pub enum Overlay {
    Form(Box<FormScreen>),
    ConfirmDelete { kind: EntityKind, codes: Vec<String> },
}

#[derive(Debug)]
pub struct AppState {
    pub active_tab: MenuItem,
    pub previous_tab: MenuItem,
    pub dashboards: BTreeMap<EntityKind, Dashboard>,
    pub overlay: Option<Overlay>,
    pub toast: ToastState,
    pub show_logs: bool,
}

impl AppState {
    pub fn new() -> Self {
        Self {
            active_tab: MenuItem::default(),
            previous_tab: MenuItem::default(),
            dashboards: EntityKind::ALL.into_iter().map(|k| (k, Dashboard::new(k))).collect(),
            overlay: None,
            toast: ToastState::default(),
            show_logs: false,
        }
    }

    pub fn form_screen(&self) -> Option<&FormScreen> {
        match &self.overlay {
            Some(Overlay::Form(screen)) => Some(screen),
            _ => None,
        }
    }

    pub fn form_screen_mut(&mut self) -> Option<&mut FormScreen> {
        match &mut self.overlay {
            Some(Overlay::Form(screen)) => Some(screen),
            _ => None,
        }
    }
}
