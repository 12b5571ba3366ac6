use crate::state::notifications::Notifier;
use crate::state::schema::{EntitySchema, SearchMode, schema_for};
use liga_api::{Entity, EntityKind, Record};
use log::{debug, warn};
use std::collections::BTreeSet;

/// List screen for one entity kind: loaded rows, search, cursor and the set
/// of rows marked for batch deletion.
#[derive(Debug)]
pub struct Dashboard {
    pub schema: &'static EntitySchema,
    records: Vec<Record>,
    pub loaded: bool,
    pub last_error: Option<String>,
    pub cursor: usize,
    marked: BTreeSet<String>,
    pub query: String,
    pub searching: bool,
    search_mode: usize,
}

impl Dashboard {
    pub fn new(kind: EntityKind) -> Self {
        Self {
            schema: schema_for(kind),
            records: Vec::new(),
            loaded: false,
            last_error: None,
            cursor: 0,
            marked: BTreeSet::new(),
            query: String::new(),
            searching: false,
            search_mode: 0,
        }
    }

    pub fn kind(&self) -> EntityKind {
        self.schema.kind
    }

    pub fn load(&mut self, records: Vec<Record>) {
        debug!("{} {} loaded", records.len(), self.kind().plural());
        self.records = records;
        self.loaded = true;
        self.last_error = None;
        self.marked.retain(|code| self.records.iter().any(|r| r.code() == *code));
        self.clamp_cursor();
    }

    /// A failed reload keeps whatever was shown before.
    pub fn load_failed(&mut self, message: String) {
        self.last_error = Some(message);
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    // -----------------------------------------------------------------------
    // Search
    // -----------------------------------------------------------------------

    pub fn search_mode(&self) -> SearchMode {
        self.schema.search_modes.get(self.search_mode).copied().unwrap_or(SearchMode::Nombre)
    }

    pub fn cycle_search_mode(&mut self) {
        self.search_mode = (self.search_mode + 1) % self.schema.search_modes.len().max(1);
        self.cursor = 0;
    }

    pub fn push_query(&mut self, c: char) {
        self.query.push(c);
        self.cursor = 0;
    }

    pub fn pop_query(&mut self) {
        self.query.pop();
        self.cursor = 0;
    }

    pub fn clear_query(&mut self) {
        self.query.clear();
        self.searching = false;
        self.cursor = 0;
    }

    /// Rows matching the current query, in load order.
    pub fn visible(&self) -> Vec<&Record> {
        let needle = self.query.trim().to_lowercase();
        let mode = self.search_mode();
        self.records
            .iter()
            .filter(|r| needle.is_empty() || mode.haystack(r).contains(&needle))
            .collect()
    }

    // -----------------------------------------------------------------------
    // Cursor and marks
    // -----------------------------------------------------------------------

    pub fn selected(&self) -> Option<&Record> {
        self.visible().get(self.cursor).copied()
    }

    pub fn cursor_down(&mut self) {
        if self.cursor + 1 < self.visible().len() {
            self.cursor += 1;
        }
    }

    pub fn cursor_up(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    fn clamp_cursor(&mut self) {
        self.cursor = self.cursor.min(self.visible().len().saturating_sub(1));
    }

    pub fn toggle_mark(&mut self) {
        let Some(code) = self.selected().map(Entity::code) else {
            return;
        };
        if !self.marked.remove(&code) {
            self.marked.insert(code);
        }
    }

    pub fn is_marked(&self, record: &Record) -> bool {
        self.marked.contains(&record.code())
    }

    pub fn marked_codes(&self) -> Vec<String> {
        self.marked.iter().cloned().collect()
    }

    pub fn has_marks(&self) -> bool {
        !self.marked.is_empty()
    }

    pub fn marked_count(&self) -> usize {
        self.marked.len()
    }

    // -----------------------------------------------------------------------
    // Results of remote writes
    // -----------------------------------------------------------------------

    /// New rows go to the top of the list.
    pub fn on_created(&mut self, record: Record, notifier: &Notifier) {
        let kind = self.kind();
        notifier.info(format!("{} {}", kind.singular(), gendered(kind, "creada", "creado")));
        self.records.insert(0, record);
    }

    pub fn on_updated(&mut self, record: Record, notifier: &Notifier) {
        let kind = self.kind();
        let code = record.code();
        match self.records.iter_mut().find(|r| r.code() == code) {
            Some(slot) => *slot = record,
            None => self.records.push(record),
        }
        notifier.info(format!("{} {}", kind.singular(), gendered(kind, "actualizada", "actualizado")));
    }

    /// Drop confirmed deletions, report failures. The mark set is always
    /// cleared; failed rows stay in the list.
    pub fn apply_batch_delete(
        &mut self,
        deleted: Vec<String>,
        failed: Vec<(String, String)>,
        notifier: &Notifier,
    ) {
        let kind = self.kind();
        self.records.retain(|r| !deleted.contains(&r.code()));
        self.marked.clear();
        self.clamp_cursor();

        if !deleted.is_empty() {
            let message = if deleted.len() > 1 {
                format!("{} {}", kind.plural(), gendered(kind, "eliminadas", "eliminados"))
            } else {
                format!("{} {}", kind.singular(), gendered(kind, "eliminada", "eliminado"))
            };
            notifier.info(message);
        }
        for (code, reason) in failed {
            warn!("delete {} {code} failed: {reason}", kind.path());
            notifier.error(format!("No se pudo eliminar {code}: {reason}"));
        }
    }

    /// Extra text shown under the list for the row under the cursor.
    pub fn detail(&self) -> Vec<String> {
        let Some(record) = self.selected() else {
            return Vec::new();
        };
        match record {
            Record::Ciudad(c) => vec![format!("Codigo: {}", c.cod_ciudad)],
            Record::Equipo(e) => vec![
                format!("Codigo: {}", e.cod_equipo),
                format!(
                    "Ciudad: {}",
                    e.ciudad.as_ref().map(|c| c.nombre.as_str()).unwrap_or("-")
                ),
            ],
            Record::Jugador(j) => vec![
                format!("{} #{}", j.full_name(), j.numero),
                format!(
                    "Nacimiento: {}",
                    j.fecha_nacim.map(|d| d.to_string()).unwrap_or_else(|| "-".into())
                ),
                format!(
                    "Ciudad: {}",
                    j.ciudad.as_ref().map(|c| c.nombre.as_str()).unwrap_or("-")
                ),
            ],
            Record::Juego(j) => vec![
                format!("Fecha: {}", j.fecha.map(|d| d.to_string()).unwrap_or_else(|| "-".into())),
                format!(
                    "{} vs {}",
                    j.equipo1_entity.as_ref().map(|e| e.nombre.as_str()).unwrap_or(&j.equipo1),
                    j.equipo2_entity.as_ref().map(|e| e.nombre.as_str()).unwrap_or(&j.equipo2),
                ),
            ],
            Record::Estadistica(e) => vec![format!("Valor: {}", e.valor)],
            Record::EstadisticaJuego(l) => vec![
                format!(
                    "Juego: {}",
                    l.juego.as_ref().map(|j| j.descripcion.as_str()).unwrap_or(&l.cod_juego)
                ),
                format!("Puntos: {}", l.points()),
            ],
        }
    }
}

fn gendered(kind: EntityKind, feminine: &'static str, masculine: &'static str) -> &'static str {
    if kind.is_feminine() { feminine } else { masculine }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::notifications::Level;
    use liga_api::{Ciudad, Estadistica, EstadisticaJuego, Jugador, Resource};

    fn ciudad(code: &str, name: &str) -> Record {
        Ciudad { cod_ciudad: code.into(), nombre: name.into() }.into_record()
    }

    fn loaded() -> Dashboard {
        let mut dashboard = Dashboard::new(EntityKind::Ciudad);
        dashboard.load(vec![ciudad("1", "Bogotá"), ciudad("2", "Medellín"), ciudad("3", "Cali")]);
        dashboard
    }

    fn codes(dashboard: &Dashboard) -> Vec<String> {
        dashboard.visible().iter().map(|r| r.code()).collect()
    }

    #[test]
    fn partial_batch_delete_keeps_failed_rows() {
        let (notifier, mut rx) = Notifier::channel();
        let mut dashboard = loaded();
        dashboard.toggle_mark();
        dashboard.cursor_down();
        dashboard.toggle_mark();
        dashboard.cursor_down();
        dashboard.toggle_mark();
        assert_eq!(dashboard.marked_codes(), vec!["1", "2", "3"]);

        dashboard.apply_batch_delete(
            vec!["1".into(), "3".into()],
            vec![("2".into(), "API error".into())],
            &notifier,
        );

        assert_eq!(codes(&dashboard), vec!["2"]);
        assert!(!dashboard.has_marks());
        assert_eq!(rx.try_recv().unwrap().message, "Ciudades eliminadas");
        let failure = rx.try_recv().unwrap();
        assert_eq!(failure.level, Level::Error);
        assert!(failure.message.contains('2'));
    }

    #[test]
    fn search_filters_case_insensitively() {
        let mut dashboard = loaded();
        for c in "MED".chars() {
            dashboard.push_query(c);
        }
        assert_eq!(codes(&dashboard), vec!["2"]);
        dashboard.clear_query();
        assert_eq!(dashboard.visible().len(), 3);
    }

    #[test]
    fn stat_lines_search_by_each_mode() {
        let mut dashboard = Dashboard::new(EntityKind::EstadisticaJuego);
        let line = EstadisticaJuego {
            cod_juego: "G1".into(),
            cod_estadistica: "S1".into(),
            cod_jugador: "P1".into(),
            cantidad: 3,
            jugador: Some(Jugador { nombre1: "Ana".into(), apellido1: "Rios".into(), ..Default::default() }),
            estadistica: Some(Estadistica { descripcion: "Triple".into(), valor: 3.0, ..Default::default() }),
            ..Default::default()
        };
        dashboard.load(vec![line.into_record()]);
        dashboard.push_query('a');
        assert_eq!(dashboard.search_mode(), SearchMode::Jugador);
        assert_eq!(dashboard.visible().len(), 1);

        dashboard.cycle_search_mode();
        assert_eq!(dashboard.search_mode(), SearchMode::Juego);
        assert!(dashboard.visible().is_empty());

        dashboard.cycle_search_mode();
        assert_eq!(dashboard.search_mode(), SearchMode::Estadistica);
        dashboard.clear_query();
        assert_eq!(dashboard.detail().last().map(String::as_str), Some("Puntos: 9"));
    }

    #[test]
    fn update_replaces_row_in_place() {
        let (notifier, mut rx) = Notifier::channel();
        let mut dashboard = loaded();
        dashboard.on_updated(ciudad("2", "Envigado"), &notifier);
        assert_eq!(dashboard.len(), 3);
        assert_eq!(dashboard.visible()[1].label(), "Envigado");
        assert_eq!(rx.try_recv().unwrap().message, "Ciudad actualizada");

        dashboard.on_created(ciudad("4", "Pasto"), &notifier);
        assert_eq!(dashboard.len(), 4);
        assert_eq!(codes(&dashboard), vec!["4", "1", "2", "3"]);
        assert_eq!(rx.try_recv().unwrap().message, "Ciudad creada");
    }

    #[test]
    fn failed_reload_keeps_previous_rows() {
        let mut dashboard = loaded();
        dashboard.load_failed("timeout".into());
        assert_eq!(dashboard.len(), 3);
        assert_eq!(dashboard.last_error.as_deref(), Some("timeout"));
    }
}
