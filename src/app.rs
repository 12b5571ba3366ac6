use crate::state::app_settings::AppSettings;
use crate::state::app_state::{AppState, FormScreen, OpenSelector, Overlay};
use crate::state::consistency::{FormAction, reduce, settle};
use crate::state::dashboard::Dashboard;
use crate::state::form::{Blocked, FieldId, Form, FormMode, Input};
use crate::state::messages::NetworkRequest;
use crate::state::notifications::{Notification, Notifier};
use crate::state::schema::schema_for;
use liga_api::client::LigaApi;
use liga_api::{EntityKind, Record};
use log::{debug, info};

#[derive(Copy, Clone, Debug, PartialEq)]
pub enum MenuItem {
    Dashboard(EntityKind),
    Help,
}

impl Default for MenuItem {
    fn default() -> Self {
        MenuItem::Dashboard(EntityKind::ALL[0])
    }
}

pub struct App {
    pub settings: AppSettings,
    pub state: AppState,
    pub api: LigaApi,
    pub notifier: Notifier,
    next_ticket: u64,
}

impl App {
    pub fn new(settings: AppSettings, notifier: Notifier) -> Self {
        if let Some(level) = settings.log_level {
            log::set_max_level(level);
            tui_logger::set_default_level(level);
        }
        info!("using league API at {}", settings.api_url);

        Self {
            api: LigaApi::new(settings.api_url.clone()),
            state: AppState::new(),
            settings,
            notifier,
            next_ticket: 0,
        }
    }

    fn ticket(&mut self) -> u64 {
        self.next_ticket += 1;
        self.next_ticket
    }

    // -----------------------------------------------------------------------
    // Tab management
    // -----------------------------------------------------------------------

    /// Switch tabs. Returns the list load for a dashboard shown for the first time.
    pub fn update_tab(&mut self, next: MenuItem) -> Option<NetworkRequest> {
        if self.state.active_tab == next {
            return None;
        }
        self.state.previous_tab = self.state.active_tab;
        self.state.active_tab = next;
        match next {
            MenuItem::Dashboard(kind) if !self.dashboard(kind).loaded => {
                Some(NetworkRequest::LoadList { kind })
            }
            _ => None,
        }
    }

    pub fn exit_help(&mut self) {
        if self.state.active_tab == MenuItem::Help {
            self.state.active_tab = self.state.previous_tab;
        }
    }

    pub fn toggle_show_logs(&mut self) {
        self.state.show_logs = !self.state.show_logs;
    }

    pub fn toggle_full_screen(&mut self) {
        self.settings.full_screen = !self.settings.full_screen;
    }

    pub fn active_kind(&self) -> Option<EntityKind> {
        match self.state.active_tab {
            MenuItem::Dashboard(kind) => Some(kind),
            MenuItem::Help => None,
        }
    }

    pub fn dashboard(&self, kind: EntityKind) -> &Dashboard {
        &self.state.dashboards[&kind]
    }

    pub fn active_dashboard_mut(&mut self) -> Option<&mut Dashboard> {
        let kind = self.active_kind()?;
        self.state.dashboards.get_mut(&kind)
    }

    // -----------------------------------------------------------------------
    // Dashboard actions
    // -----------------------------------------------------------------------

    pub fn reload(&self) -> Option<NetworkRequest> {
        self.active_kind().map(|kind| NetworkRequest::LoadList { kind })
    }

    pub fn open_create_form(&mut self) {
        let Some(kind) = self.active_kind() else {
            return;
        };
        let ticket = self.ticket();
        let form = Form::create(schema_for(kind), ticket);
        self.state.overlay = Some(Overlay::Form(Box::new(FormScreen { form, selector: None })));
    }

    /// Edit the row under the cursor. Foreign keys are resolved before the
    /// relational fields show anything.
    pub fn open_edit_form(&mut self) -> Option<NetworkRequest> {
        let kind = self.active_kind()?;
        let record = self.dashboard(kind).selected()?.clone();
        let ticket = self.ticket();
        let (mut form, refs) = Form::edit(schema_for(kind), ticket, &record);
        settle(&mut form, &self.notifier);
        self.state.overlay = Some(Overlay::Form(Box::new(FormScreen { form, selector: None })));
        (!refs.is_empty()).then_some(NetworkRequest::ResolveForm { ticket, refs })
    }

    pub fn request_delete(&mut self) {
        let Some(kind) = self.active_kind() else {
            return;
        };
        let codes = self.dashboard(kind).marked_codes();
        if codes.is_empty() {
            self.notifier.warn("Selecciona al menos un elemento para eliminar");
            return;
        }
        self.state.overlay = Some(Overlay::ConfirmDelete { kind, codes });
    }

    pub fn confirm_delete(&mut self) -> Option<NetworkRequest> {
        match self.state.overlay.take() {
            Some(Overlay::ConfirmDelete { kind, codes }) => {
                debug!("deleting {} {}", codes.len(), kind.plural());
                Some(NetworkRequest::DeleteBatch { kind, codes })
            }
            other => {
                self.state.overlay = other;
                None
            }
        }
    }

    /// Esc on an overlay: close the selector first, then the form or popup.
    pub fn cancel_overlay(&mut self) {
        if let Some(screen) = self.state.form_screen_mut()
            && let Some(open) = screen.selector.take()
        {
            open.selector.cancel();
            return;
        }
        self.state.overlay = None;
    }

    // -----------------------------------------------------------------------
    // Form editing
    // -----------------------------------------------------------------------

    pub fn form_focus_next(&mut self) {
        if let Some(screen) = self.state.form_screen_mut() {
            screen.form.focus_next();
        }
    }

    pub fn form_focus_prev(&mut self) {
        if let Some(screen) = self.state.form_screen_mut() {
            screen.form.focus_prev();
        }
    }

    fn focused_text_field(&self) -> Option<FieldId> {
        let screen = self.state.form_screen()?;
        let spec = screen.form.focused()?;
        (!spec.is_relation()).then_some(spec.id)
    }

    pub fn form_type_char(&mut self, c: char) {
        let Some(id) = self.focused_text_field() else {
            return;
        };
        let notifier = self.notifier.clone();
        if let Some(screen) = self.state.form_screen_mut() {
            let mut text = screen.form.text(id).to_owned();
            text.push(c);
            reduce(&mut screen.form, FormAction::SetText(id, text), &notifier);
        }
    }

    pub fn form_backspace(&mut self) {
        let Some(id) = self.focused_text_field() else {
            return;
        };
        let notifier = self.notifier.clone();
        if let Some(screen) = self.state.form_screen_mut() {
            let mut text = screen.form.text(id).to_owned();
            text.pop();
            reduce(&mut screen.form, FormAction::SetText(id, text), &notifier);
        }
    }

    pub fn form_clear_relation(&mut self) {
        let notifier = self.notifier.clone();
        let Some(screen) = self.state.form_screen_mut() else {
            return;
        };
        if let Some(spec) = screen.form.focused()
            && spec.is_relation()
        {
            reduce(&mut screen.form, FormAction::ClearRelation(spec.id), &notifier);
        }
    }

    /// Enter on a form field: open the selector of a relational field,
    /// otherwise move on to the next field.
    pub fn form_activate(&mut self) -> Option<NetworkRequest> {
        let ticket = self.ticket();
        let notifier = self.notifier.clone();
        let api = self.api.clone();
        let screen = self.state.form_screen_mut()?;
        let spec = screen.form.focused()?;
        let Input::Relation(kind) = spec.input else {
            screen.form.focus_next();
            return None;
        };

        match screen.form.activate(spec.id, ticket, &api) {
            Ok((selector, url)) => {
                screen.selector = Some(OpenSelector { field: spec.id, selector });
                Some(NetworkRequest::LoadCandidates { ticket, kind, url })
            }
            Err(Blocked::MissingPrerequisite(reason)) => {
                notifier.warn(reason);
                None
            }
            Err(Blocked::Locked | Blocked::Busy) => None,
        }
    }

    pub fn form_submit(&mut self) -> Option<NetworkRequest> {
        let screen = self.state.form_screen_mut()?;
        let form = &mut screen.form;
        let payload = form.submit()?;
        let (ticket, kind) = (form.ticket, form.schema.kind);
        Some(match &form.mode {
            FormMode::Create => NetworkRequest::Create { ticket, kind, payload },
            FormMode::Edit { code } => {
                NetworkRequest::Update { ticket, kind, code: code.clone(), payload }
            }
        })
    }

    // -----------------------------------------------------------------------
    // Selector
    // -----------------------------------------------------------------------

    fn open_selector_mut(&mut self) -> Option<&mut OpenSelector> {
        self.state.form_screen_mut()?.selector.as_mut()
    }

    pub fn selector_down(&mut self) {
        if let Some(open) = self.open_selector_mut() {
            open.selector.cursor_down();
        }
    }

    pub fn selector_up(&mut self) {
        if let Some(open) = self.open_selector_mut() {
            open.selector.cursor_up();
        }
    }

    pub fn selector_toggle(&mut self) {
        if let Some(open) = self.open_selector_mut() {
            open.selector.toggle_at_cursor();
        }
    }

    /// Commit the selection into the form. Without a selection the selector stays open.
    pub fn selector_accept(&mut self) {
        let notifier = self.notifier.clone();
        let Some(screen) = self.state.form_screen_mut() else {
            return;
        };
        let Some(open) = &screen.selector else {
            return;
        };
        let Some(record) = open.selector.accept() else {
            return;
        };
        let field = open.field;
        screen.selector = None;
        reduce(&mut screen.form, FormAction::SetRelation(field, record), &notifier);
    }

    pub fn has_open_selector(&self) -> bool {
        self.state.form_screen().is_some_and(|s| s.selector.is_some())
    }

    // -----------------------------------------------------------------------
    // Network response handlers, called from main_ui_loop
    // -----------------------------------------------------------------------

    pub fn on_list_loaded(&mut self, kind: EntityKind, records: Vec<Record>) {
        if let Some(dashboard) = self.state.dashboards.get_mut(&kind) {
            dashboard.load(records);
        }
    }

    pub fn on_list_failed(&mut self, kind: EntityKind, message: String) {
        self.notifier.error(format!("No se pudieron cargar los {}", kind.plural().to_lowercase()));
        if let Some(dashboard) = self.state.dashboards.get_mut(&kind) {
            dashboard.load_failed(message);
        }
    }

    pub fn on_candidates_loaded(&mut self, ticket: u64, records: Vec<Record>) {
        match self.open_selector_mut() {
            Some(open) if open.selector.ticket == ticket => open.selector.load(records),
            _ => debug!("dropping candidates for closed selector {ticket}"),
        }
    }

    pub fn on_candidates_failed(&mut self, ticket: u64) {
        if let Some(open) = self.open_selector_mut()
            && open.selector.ticket == ticket
        {
            open.selector.fail();
        }
    }

    pub fn on_form_resolved(&mut self, ticket: u64, resolved: Vec<(FieldId, Option<Record>)>) {
        let notifier = self.notifier.clone();
        match self.state.form_screen_mut() {
            Some(screen) if screen.form.ticket == ticket => {
                screen.form.apply_resolved(resolved);
                settle(&mut screen.form, &notifier);
            }
            _ => debug!("dropping resolution for closed form {ticket}"),
        }
    }

    /// The dashboard always reflects a confirmed write; the form closes only
    /// if it is still the one that submitted.
    pub fn on_created(&mut self, ticket: u64, kind: EntityKind, record: Record) {
        self.close_form(ticket);
        let notifier = self.notifier.clone();
        if let Some(dashboard) = self.state.dashboards.get_mut(&kind) {
            dashboard.on_created(record, &notifier);
        }
    }

    pub fn on_updated(&mut self, ticket: u64, kind: EntityKind, record: Record) {
        self.close_form(ticket);
        let notifier = self.notifier.clone();
        if let Some(dashboard) = self.state.dashboards.get_mut(&kind) {
            dashboard.on_updated(record, &notifier);
        }
    }

    pub fn on_submit_failed(&mut self, ticket: u64, message: String) {
        debug!("submit {ticket} failed: {message}");
        self.notifier.error("Algo salio mal");
        if let Some(screen) = self.state.form_screen_mut()
            && screen.form.ticket == ticket
        {
            screen.form.submitting = false;
        }
    }

    pub fn on_batch_deleted(
        &mut self,
        kind: EntityKind,
        deleted: Vec<String>,
        failed: Vec<(String, String)>,
    ) {
        let notifier = self.notifier.clone();
        if let Some(dashboard) = self.state.dashboards.get_mut(&kind) {
            dashboard.apply_batch_delete(deleted, failed, &notifier);
        }
    }

    fn close_form(&mut self, ticket: u64) {
        if self.state.form_screen().is_some_and(|s| s.form.ticket == ticket) {
            self.state.overlay = None;
        }
    }

    pub fn on_notification(&mut self, note: Notification) {
        self.state.toast.show(note);
    }

    pub fn on_tick(&mut self) {
        self.state.toast.tick();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::notifications::Level;
    use liga_api::{Ciudad, Estadistica, EstadisticaJuego, Juego, Jugador, Resource};
    use serde_json::json;
    use tokio::sync::mpsc::UnboundedReceiver;

    fn app() -> (App, UnboundedReceiver<Notification>) {
        let (notifier, rx) = Notifier::channel();
        let settings = AppSettings { api_url: "http://api".into(), ..Default::default() };
        let mut app = App::new(settings, notifier);
        let _ = app.update_tab(MenuItem::Dashboard(EntityKind::Equipo));
        (app, rx)
    }

    fn ciudad(code: &str) -> Record {
        Ciudad { cod_ciudad: code.into(), nombre: format!("Ciudad {code}") }.into_record()
    }

    fn juego(code: &str, a: &str, b: &str) -> Record {
        Juego {
            cod_juego: code.into(),
            descripcion: format!("{a} vs {b}"),
            equipo1: a.into(),
            equipo2: b.into(),
            ..Default::default()
        }
        .into_record()
    }

    fn jugador(code: &str, name: &str, team: &str) -> Record {
        Jugador {
            cod_jugador: code.into(),
            nombre1: name.into(),
            apellido1: "Perez".into(),
            cod_equipo: Some(team.into()),
            ..Default::default()
        }
        .into_record()
    }

    fn estadistica(code: &str, valor: f64) -> Record {
        Estadistica { cod_estadistica: code.into(), descripcion: "Doble".into(), valor }
            .into_record()
    }

    /// Stat-lines tab holding one row G1/S1/P1 with quantity 4.
    fn stat_line_app() -> (App, UnboundedReceiver<Notification>) {
        let (mut app, rx) = app();
        let _ = app.update_tab(MenuItem::Dashboard(EntityKind::EstadisticaJuego));
        let line = EstadisticaJuego {
            cod_juego: "G1".into(),
            cod_estadistica: "S1".into(),
            cod_jugador: "P1".into(),
            cantidad: 4,
            ..Default::default()
        };
        app.on_list_loaded(EntityKind::EstadisticaJuego, vec![line.into_record()]);
        (app, rx)
    }

    fn open_stat_line_edit(app: &mut App) -> u64 {
        match app.open_edit_form() {
            Some(NetworkRequest::ResolveForm { ticket, refs }) => {
                assert_eq!(ticket, app.state.form_screen().unwrap().form.ticket);
                assert_eq!(refs.len(), 3);
                ticket
            }
            other => panic!("expected resolve request, got {other:?}"),
        }
    }

    fn open_city_selector(app: &mut App) -> u64 {
        app.open_create_form();
        app.form_focus_next();
        match app.form_activate() {
            Some(NetworkRequest::LoadCandidates { ticket, kind, url }) => {
                assert_eq!(kind, EntityKind::Ciudad);
                assert_eq!(url, "http://api/ciudad");
                ticket
            }
            other => panic!("expected candidates request, got {other:?}"),
        }
    }

    #[test]
    fn first_visit_to_a_tab_loads_its_list() {
        let (mut app, _rx) = app();
        assert!(matches!(
            app.update_tab(MenuItem::Dashboard(EntityKind::Juego)),
            Some(NetworkRequest::LoadList { kind: EntityKind::Juego })
        ));
        app.on_list_loaded(EntityKind::Juego, Vec::new());
        let _ = app.update_tab(MenuItem::Help);
        assert!(app.update_tab(MenuItem::Dashboard(EntityKind::Juego)).is_none());
    }

    #[test]
    fn accepted_selection_lands_in_the_form() {
        let (mut app, _rx) = app();
        let ticket = open_city_selector(&mut app);
        app.on_candidates_loaded(ticket, vec![ciudad("1"), ciudad("2")]);
        app.selector_down();
        app.selector_toggle();
        app.selector_accept();

        assert!(!app.has_open_selector());
        let form = &app.state.form_screen().unwrap().form;
        assert_eq!(form.code_of(FieldId::Ciudad), Some("2".into()));
    }

    #[test]
    fn accept_without_selection_keeps_selector_open() {
        let (mut app, _rx) = app();
        let ticket = open_city_selector(&mut app);
        app.on_candidates_loaded(ticket, vec![ciudad("1")]);
        app.selector_accept();
        assert!(app.has_open_selector());
        app.cancel_overlay();
        assert!(!app.has_open_selector());
        assert!(!app.state.form_screen().unwrap().form.is_set(FieldId::Ciudad));
    }

    #[test]
    fn stale_candidates_are_dropped() {
        let (mut app, _rx) = app();
        let first = open_city_selector(&mut app);
        app.cancel_overlay();
        app.form_activate();
        app.on_candidates_loaded(first, vec![ciudad("9")]);
        let open = app.state.form_screen().unwrap().selector.as_ref().unwrap();
        assert!(open.selector.is_loading());
        assert!(open.selector.items().is_empty());
    }

    #[test]
    fn create_success_closes_form_and_adds_row() {
        let (mut app, mut rx) = app();
        app.open_create_form();
        for c in "Tigres".chars() {
            app.form_type_char(c);
        }
        let Some(NetworkRequest::Create { ticket, kind, .. }) = app.form_submit() else {
            panic!("form should submit");
        };
        assert!(app.form_submit().is_none(), "second submit while in flight");

        let equipo = liga_api::Equipo { cod_equipo: "E1".into(), nombre: "Tigres".into(), ..Default::default() };
        app.on_created(ticket, kind, equipo.into_record());
        assert!(app.state.overlay.is_none());
        assert_eq!(app.dashboard(EntityKind::Equipo).len(), 1);
        assert_eq!(rx.try_recv().unwrap().message, "Equipo creado");
    }

    #[test]
    fn failed_submit_keeps_form_open() {
        let (mut app, mut rx) = app();
        app.open_create_form();
        app.form_type_char('X');
        let Some(NetworkRequest::Create { ticket, .. }) = app.form_submit() else {
            panic!("form should submit");
        };
        app.on_submit_failed(ticket, "500".into());
        let form = &app.state.form_screen().unwrap().form;
        assert!(!form.submitting);
        assert_eq!(rx.try_recv().unwrap().message, "Algo salio mal");
    }

    #[test]
    fn delete_needs_marked_rows() {
        let (mut app, mut rx) = app();
        app.request_delete();
        assert!(app.state.overlay.is_none());
        assert_eq!(rx.try_recv().unwrap().message, "Selecciona al menos un elemento para eliminar");

        let equipo = liga_api::Equipo { cod_equipo: "E1".into(), ..Default::default() };
        app.on_list_loaded(EntityKind::Equipo, vec![equipo.into_record()]);
        if let Some(dashboard) = app.active_dashboard_mut() {
            dashboard.toggle_mark();
        }
        app.request_delete();
        match app.confirm_delete() {
            Some(NetworkRequest::DeleteBatch { kind, codes }) => {
                assert_eq!(kind, EntityKind::Equipo);
                assert_eq!(codes, vec!["E1"]);
            }
            other => panic!("expected delete request, got {other:?}"),
        }
        assert!(app.state.overlay.is_none());
    }

    #[test]
    fn failed_candidate_fetch_keeps_dependent_fields() {
        let (mut app, _rx) = app();
        let _ = app.update_tab(MenuItem::Dashboard(EntityKind::EstadisticaJuego));
        app.open_create_form();
        let notifier = app.notifier.clone();
        let form = &mut app.state.form_screen_mut().unwrap().form;
        reduce(form, FormAction::SetRelation(FieldId::Juego, juego("G1", "A", "B")), &notifier);
        reduce(form, FormAction::SetRelation(FieldId::Jugador, jugador("P1", "Ana", "A")), &notifier);
        reduce(form, FormAction::SetRelation(FieldId::Estadistica, estadistica("S1", 2.0)), &notifier);

        app.form_focus_next();
        let Some(NetworkRequest::LoadCandidates { ticket, .. }) = app.form_activate() else {
            panic!("game field should open its selector");
        };
        app.on_candidates_failed(ticket);
        app.selector_accept();

        assert!(app.has_open_selector());
        let form = &app.state.form_screen().unwrap().form;
        assert!(form.is_set(FieldId::Juego));
        assert!(form.is_set(FieldId::Jugador));
        assert!(form.is_set(FieldId::Estadistica));
    }

    #[test]
    fn resolution_for_a_closed_form_is_dropped() {
        let (mut app, _rx) = stat_line_app();
        let first = open_stat_line_edit(&mut app);
        app.cancel_overlay();
        assert!(app.state.overlay.is_none());

        let second = open_stat_line_edit(&mut app);
        assert_ne!(first, second);
        app.on_form_resolved(first, vec![(FieldId::Juego, Some(juego("G1", "A", "B")))]);

        let form = &app.state.form_screen().unwrap().form;
        assert!(form.resolving);
        assert!(!form.is_set(FieldId::Juego));
    }

    #[test]
    fn resolved_stat_line_edit_patches_quantity_at_composite_key() {
        let (mut app, _rx) = stat_line_app();
        let ticket = open_stat_line_edit(&mut app);
        app.on_form_resolved(
            ticket,
            vec![
                (FieldId::Juego, Some(juego("G1", "A", "B"))),
                (FieldId::Estadistica, Some(estadistica("S1", 2.0))),
                (FieldId::Jugador, Some(jugador("P1", "Ana", "A"))),
            ],
        );
        {
            let form = &app.state.form_screen().unwrap().form;
            assert!(!form.resolving);
            assert!(form.is_set(FieldId::Jugador));
            assert_eq!(form.derived, 8.0);
        }

        app.form_backspace();
        app.form_type_char('5');
        match app.form_submit() {
            Some(NetworkRequest::Update { kind, code, payload, .. }) => {
                assert_eq!(kind, EntityKind::EstadisticaJuego);
                assert_eq!(code, "G1/S1/P1");
                assert_eq!(serde_json::to_value(&payload).unwrap(), json!({ "Cantidad": 5 }));
            }
            other => panic!("expected update request, got {other:?}"),
        }
    }

    #[test]
    fn resolved_player_from_another_team_is_rejected() {
        let (mut app, mut rx) = stat_line_app();
        let ticket = open_stat_line_edit(&mut app);
        app.on_form_resolved(
            ticket,
            vec![
                (FieldId::Juego, Some(juego("G1", "A", "B"))),
                (FieldId::Estadistica, Some(estadistica("S1", 2.0))),
                (FieldId::Jugador, Some(jugador("P1", "Luis", "C"))),
            ],
        );

        let form = &app.state.form_screen().unwrap().form;
        assert!(form.is_set(FieldId::Juego));
        assert!(!form.is_set(FieldId::Jugador));
        assert!(!form.is_set(FieldId::Estadistica));
        assert_eq!(form.derived, 0.0);

        let warning = rx.try_recv().unwrap();
        assert_eq!(warning.level, Level::Warning);
        assert_eq!(
            warning.message,
            "El jugador: Luis no pertenece a ninguno de los equipos del juego"
        );
    }
}
