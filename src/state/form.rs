use crate::state::field::RelationalField;
use crate::state::schema::EntitySchema;
use crate::state::selector::EntitySelector;
use chrono::NaiveDate;
use liga_api::client::LigaApi;
use liga_api::payload::Payload;
use liga_api::{Entity, EntityKind, Juego, Jugador, Record, Resource};
use regex_lite::Regex;
use std::collections::BTreeMap;
use std::sync::OnceLock;

pub const REQUIRED_MESSAGE: &str = "Este campo es obligatorio";
pub const DATE_FORMAT: &str = "%Y-%m-%d";

// ---------------------------------------------------------------------------
// Field registry
// ---------------------------------------------------------------------------

/// Every field any form can hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FieldId {
    Nombre,
    Descripcion,
    Valor,
    PrimerNombre,
    SegundoNombre,
    PrimerApellido,
    SegundoApellido,
    Numero,
    FechaNacimiento,
    Fecha,
    Cantidad,
    Ciudad,
    Equipo,
    Equipo1,
    Equipo2,
    Juego,
    Jugador,
    Estadistica,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Input {
    Text,
    Integer,
    Decimal,
    Date,
    Relation(EntityKind),
}

/// Where a relational field's candidates come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Candidates {
    /// The whole collection of the field's kind.
    All,
    /// Players of either team of the chosen game.
    PlayersOfGame,
    /// Statistics the chosen player has not recorded in the chosen game.
    MissingStatistics,
}

/// Text shapes a field can be constrained to. Each compiles once.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pattern {
    /// One or two ASCII digits.
    JerseyNumber,
}

impl Pattern {
    fn regex(self) -> &'static Regex {
        static JERSEY_NUMBER: OnceLock<Regex> = OnceLock::new();
        match self {
            Pattern::JerseyNumber => JERSEY_NUMBER.get_or_init(|| {
                Regex::new(r"^[0-9]{1,2}$").expect("JERSEY_NUMBER pattern is invalid")
            }),
        }
    }

    pub fn is_match(self, text: &str) -> bool {
        self.regex().is_match(text)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rules {
    pub required: bool,
    pub min_value: Option<(f64, &'static str)>,
    pub min_len: Option<(usize, &'static str)>,
    pub pattern: Option<(Pattern, &'static str)>,
}

impl Rules {
    pub const NONE: Rules = Rules { required: false, min_value: None, min_len: None, pattern: None };
    pub const REQUIRED: Rules = Rules { required: true, ..Rules::NONE };
}

#[derive(Debug, Clone, Copy)]
pub struct FieldSpec {
    pub id: FieldId,
    pub label: &'static str,
    pub input: Input,
    pub rules: Rules,
    pub placeholder: &'static str,
    pub candidates: Candidates,
    pub selector_header: &'static str,
    pub selector_subtitle: &'static str,
}

impl FieldSpec {
    pub const fn text(id: FieldId, label: &'static str, rules: Rules) -> Self {
        Self {
            id,
            label,
            input: Input::Text,
            rules,
            placeholder: "",
            candidates: Candidates::All,
            selector_header: "",
            selector_subtitle: "",
        }
    }

    pub const fn with_input(mut self, input: Input) -> Self {
        self.input = input;
        self
    }

    pub const fn with_placeholder(mut self, placeholder: &'static str) -> Self {
        self.placeholder = placeholder;
        self
    }

    pub const fn relation(
        id: FieldId,
        label: &'static str,
        kind: EntityKind,
        rules: Rules,
        placeholder: &'static str,
        selector_header: &'static str,
        selector_subtitle: &'static str,
    ) -> Self {
        Self {
            id,
            label,
            input: Input::Relation(kind),
            rules,
            placeholder,
            candidates: Candidates::All,
            selector_header,
            selector_subtitle,
        }
    }

    pub const fn with_candidates(mut self, candidates: Candidates) -> Self {
        self.candidates = candidates;
        self
    }

    pub fn is_relation(&self) -> bool {
        matches!(self.input, Input::Relation(_))
    }
}

#[derive(Debug, Clone)]
pub enum FieldValue {
    Text(String),
    Relation(RelationalField<Record>),
}

#[derive(Debug, Clone)]
struct Slot {
    value: FieldValue,
    error: Option<String>,
}

// ---------------------------------------------------------------------------
// Form
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormMode {
    Create,
    Edit { code: String },
}

/// What an existing record contributes to an edit form: scalar values that
/// can be filled right away and foreign keys that must be fetched first.
#[derive(Debug, Default)]
pub struct Seed {
    pub texts: Vec<(FieldId, String)>,
    pub references: Vec<(FieldId, EntityKind, String)>,
}

/// Why a relational field cannot be opened.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Blocked {
    Locked,
    MissingPrerequisite(&'static str),
    Busy,
}

#[derive(Debug, Clone)]
pub struct Form {
    pub schema: &'static EntitySchema,
    pub mode: FormMode,
    pub ticket: u64,
    pub focus: usize,
    pub derived: f64,
    pub resolving: bool,
    pub submitting: bool,
    slots: BTreeMap<FieldId, Slot>,
}

impl Form {
    pub fn create(schema: &'static EntitySchema, ticket: u64) -> Self {
        let slots = schema
            .fields
            .iter()
            .map(|spec| {
                let value = if spec.is_relation() {
                    FieldValue::Relation(RelationalField::default())
                } else {
                    FieldValue::Text(String::new())
                };
                (spec.id, Slot { value, error: None })
            })
            .collect();
        Self {
            schema,
            mode: FormMode::Create,
            ticket,
            focus: 0,
            derived: 0.0,
            resolving: false,
            submitting: false,
            slots,
        }
    }

    /// An edit form with scalars filled in. The returned references still
    /// need resolving into records before the relational fields are set.
    pub fn edit(
        schema: &'static EntitySchema,
        ticket: u64,
        record: &Record,
    ) -> (Self, Vec<(FieldId, EntityKind, String)>) {
        let mut form = Self::create(schema, ticket);
        form.mode = FormMode::Edit { code: record.code() };

        let seed = (schema.seed)(record);
        for (id, text) in seed.texts {
            form.set_text(id, text);
        }
        for id in schema.locked_on_edit {
            if let Some(field) = form.relation_field_mut(*id) {
                field.lock();
            }
        }
        form.resolving = !seed.references.is_empty();
        (form, seed.references)
    }

    pub fn is_edit(&self) -> bool {
        matches!(self.mode, FormMode::Edit { .. })
    }

    pub fn title(&self) -> &'static str {
        if self.is_edit() { self.schema.title_edit } else { self.schema.title_create }
    }

    pub fn spec(&self, id: FieldId) -> Option<&'static FieldSpec> {
        self.schema.fields.iter().find(|s| s.id == id)
    }

    pub fn focused(&self) -> Option<&'static FieldSpec> {
        self.schema.fields.get(self.focus)
    }

    pub fn focus_next(&mut self) {
        self.focus = (self.focus + 1) % self.schema.fields.len().max(1);
    }

    pub fn focus_prev(&mut self) {
        let len = self.schema.fields.len().max(1);
        self.focus = (self.focus + len - 1) % len;
    }

    // -----------------------------------------------------------------------
    // Values
    // -----------------------------------------------------------------------

    pub fn text(&self, id: FieldId) -> &str {
        match self.slots.get(&id).map(|s| &s.value) {
            Some(FieldValue::Text(t)) => t,
            _ => "",
        }
    }

    pub fn set_text(&mut self, id: FieldId, text: String) {
        if let Some(slot) = self.slots.get_mut(&id)
            && let FieldValue::Text(t) = &mut slot.value
        {
            *t = text;
            slot.error = None;
        }
    }

    pub fn relation_field(&self, id: FieldId) -> Option<&RelationalField<Record>> {
        match self.slots.get(&id).map(|s| &s.value) {
            Some(FieldValue::Relation(f)) => Some(f),
            _ => None,
        }
    }

    fn relation_field_mut(&mut self, id: FieldId) -> Option<&mut RelationalField<Record>> {
        match self.slots.get_mut(&id).map(|s| &mut s.value) {
            Some(FieldValue::Relation(f)) => Some(f),
            _ => None,
        }
    }

    pub fn record(&self, id: FieldId) -> Option<&Record> {
        self.relation_field(id).and_then(RelationalField::value)
    }

    /// Typed view of a relational field.
    pub fn relation<T: Resource>(&self, id: FieldId) -> Option<&T> {
        self.record(id).and_then(T::from_record_ref)
    }

    pub fn is_set(&self, id: FieldId) -> bool {
        self.record(id).is_some()
    }

    pub fn is_locked(&self, id: FieldId) -> bool {
        self.relation_field(id).is_some_and(RelationalField::is_locked)
    }

    /// Store a record in a relational field. Records of the wrong kind are ignored.
    pub fn set_record(&mut self, id: FieldId, record: Option<Record>) -> bool {
        let expected = match self.spec(id).map(|s| s.input) {
            Some(Input::Relation(kind)) => kind,
            _ => return false,
        };
        if record.as_ref().is_some_and(|r| r.kind() != expected) {
            return false;
        }
        let Some(slot) = self.slots.get_mut(&id) else {
            return false;
        };
        if let FieldValue::Relation(field) = &mut slot.value {
            field.set(record);
            slot.error = None;
            return true;
        }
        false
    }

    pub fn error(&self, id: FieldId) -> Option<&str> {
        self.slots.get(&id).and_then(|s| s.error.as_deref())
    }

    fn set_error(&mut self, id: FieldId, message: String) {
        if let Some(slot) = self.slots.get_mut(&id) {
            slot.error = Some(message);
        }
    }

    /// Fill relational fields from edit-mode resolution. Unresolved ones stay empty.
    pub fn apply_resolved(&mut self, resolved: Vec<(FieldId, Option<Record>)>) {
        for (id, record) in resolved {
            self.set_record(id, record);
        }
        self.resolving = false;
    }

    // -----------------------------------------------------------------------
    // Relational field activation
    // -----------------------------------------------------------------------

    /// First missing prerequisite of `id` according to the rule table.
    pub fn blocked_reason(&self, id: FieldId) -> Option<&'static str> {
        self.schema
            .rules
            .iter()
            .find(|r| r.field == id && r.depends_on.iter().any(|d| !self.is_set(*d)))
            .map(|r| r.blocked)
    }

    /// URL listing the candidates for `id`, built from the sibling values.
    pub fn candidates_url(&self, id: FieldId, api: &LigaApi) -> Option<String> {
        let spec = self.spec(id)?;
        let Input::Relation(kind) = spec.input else {
            return None;
        };
        match spec.candidates {
            Candidates::All => Some(api.list_url(kind)),
            Candidates::PlayersOfGame => {
                let juego = self.relation::<Juego>(FieldId::Juego)?;
                Some(api.players_in_teams_url(&juego.equipo1, &juego.equipo2))
            }
            Candidates::MissingStatistics => {
                let juego = self.relation::<Juego>(FieldId::Juego)?;
                let jugador = self.relation::<Jugador>(FieldId::Jugador)?;
                Some(api.missing_statistics_url(&jugador.cod_jugador, &juego.cod_juego))
            }
        }
    }

    /// Open the selector for a relational field, or explain why it is inert.
    pub fn activate(
        &self,
        id: FieldId,
        ticket: u64,
        api: &LigaApi,
    ) -> Result<(EntitySelector<Record>, String), Blocked> {
        if self.resolving || self.submitting {
            return Err(Blocked::Busy);
        }
        let spec = self.spec(id).ok_or(Blocked::Locked)?;
        let field = self.relation_field(id).ok_or(Blocked::Locked)?;
        if field.is_locked() {
            return Err(Blocked::Locked);
        }
        if let Some(reason) = self.blocked_reason(id) {
            return Err(Blocked::MissingPrerequisite(reason));
        }
        let url = self.candidates_url(id, api).ok_or(Blocked::Locked)?;
        let selector = field.open(ticket, spec.selector_header, spec.selector_subtitle);
        Ok((selector, url))
    }

    // -----------------------------------------------------------------------
    // Validation and submission
    // -----------------------------------------------------------------------

    /// Check every field; errors are stored next to their field.
    pub fn validate(&mut self) -> bool {
        let mut ok = true;
        for spec in self.schema.fields {
            let result = match spec.input {
                Input::Relation(_) => {
                    if spec.rules.required && !self.is_set(spec.id) {
                        Err(REQUIRED_MESSAGE.to_owned())
                    } else {
                        Ok(())
                    }
                }
                _ => check_text(spec, self.text(spec.id)),
            };
            if let Err(message) = result {
                self.set_error(spec.id, message);
                ok = false;
            }
        }
        ok
    }

    /// Validate and flatten into the wire payload. `None` blocks submission.
    pub fn submit(&mut self) -> Option<Payload> {
        if self.resolving || self.submitting || !self.validate() {
            return None;
        }
        let payload = (self.schema.build)(self)?;
        self.submitting = true;
        Some(payload)
    }

    // -----------------------------------------------------------------------
    // Coercion helpers for payload builders
    // -----------------------------------------------------------------------

    /// Trimmed text, `None` when blank.
    pub fn optional_text(&self, id: FieldId) -> Option<String> {
        let text = self.text(id).trim();
        (!text.is_empty()).then(|| text.to_owned())
    }

    pub fn trimmed(&self, id: FieldId) -> String {
        self.text(id).trim().to_owned()
    }

    pub fn integer(&self, id: FieldId) -> Option<u32> {
        self.text(id).trim().parse().ok()
    }

    pub fn decimal(&self, id: FieldId) -> Option<f64> {
        self.text(id).trim().parse().ok()
    }

    pub fn date(&self, id: FieldId) -> Option<NaiveDate> {
        NaiveDate::parse_from_str(self.text(id).trim(), DATE_FORMAT).ok()
    }

    pub fn code_of(&self, id: FieldId) -> Option<String> {
        self.record(id).map(Entity::code)
    }
}

fn check_text(spec: &FieldSpec, raw: &str) -> Result<(), String> {
    let text = raw.trim();
    if text.is_empty() {
        return if spec.rules.required { Err(REQUIRED_MESSAGE.to_owned()) } else { Ok(()) };
    }

    let number = match spec.input {
        Input::Integer => Some(
            text.parse::<u32>()
                .map(f64::from)
                .map_err(|_| "Ingrese un número entero válido".to_owned())?,
        ),
        Input::Decimal => Some(
            text.parse::<f64>()
                .ok()
                .filter(|n| n.is_finite())
                .ok_or_else(|| "Ingrese un número válido".to_owned())?,
        ),
        Input::Date => {
            NaiveDate::parse_from_str(text, DATE_FORMAT)
                .map_err(|_| "Ingrese una fecha válida (AAAA-MM-DD)".to_owned())?;
            None
        }
        Input::Text | Input::Relation(_) => None,
    };

    if let (Some((min, message)), Some(n)) = (spec.rules.min_value, number)
        && n < min
    {
        return Err(message.to_owned());
    }
    if let Some((min, message)) = spec.rules.min_len
        && text.chars().count() < min
    {
        return Err(message.to_owned());
    }
    if let Some((pattern, message)) = spec.rules.pattern
        && !pattern.is_match(text)
    {
        return Err(message.to_owned());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::schema::schema_for;
    use liga_api::{Ciudad, Equipo, EstadisticaJuego};

    fn numero_spec() -> &'static FieldSpec {
        schema_for(EntityKind::Jugador)
            .fields
            .iter()
            .find(|s| s.id == FieldId::Numero)
            .unwrap()
    }

    #[test]
    fn required_fields_report_the_required_message() {
        let mut form = Form::create(schema_for(EntityKind::Ciudad), 1);
        assert!(!form.validate());
        assert_eq!(form.error(FieldId::Nombre), Some(REQUIRED_MESSAGE));
        form.set_text(FieldId::Nombre, "Cali".into());
        assert!(form.error(FieldId::Nombre).is_none());
        assert!(form.validate());
    }

    #[test]
    fn player_number_needs_two_digits() {
        let spec = numero_spec();
        assert_eq!(check_text(spec, "7"), Err("Debe ingresar 2 digitos".into()));
        assert_eq!(
            check_text(spec, "a1"),
            Err("Ingrese un número válido de hasta 2 dígitos".into())
        );
        assert_eq!(check_text(spec, "07"), Ok(()));
    }

    #[test]
    fn jersey_number_pattern_is_compiled_once() {
        assert!(Pattern::JerseyNumber.is_match("7"));
        assert!(Pattern::JerseyNumber.is_match("42"));
        assert!(!Pattern::JerseyNumber.is_match("123"));
        assert!(!Pattern::JerseyNumber.is_match("4a"));
        assert!(std::ptr::eq(Pattern::JerseyNumber.regex(), Pattern::JerseyNumber.regex()));
    }

    #[test]
    fn relational_field_rejects_records_of_another_kind() {
        let mut form = Form::create(schema_for(EntityKind::Equipo), 1);
        let wrong = Equipo::default().into_record();
        assert!(!form.set_record(FieldId::Ciudad, Some(wrong)));
        let right = Ciudad { cod_ciudad: "C1".into(), nombre: "Cali".into() }.into_record();
        assert!(form.set_record(FieldId::Ciudad, Some(right)));
        assert_eq!(form.code_of(FieldId::Ciudad), Some("C1".into()));
    }

    #[test]
    fn edit_form_seeds_scalars_and_returns_references() {
        let line = EstadisticaJuego {
            cod_estadistica: "S1".into(),
            cod_juego: "G1".into(),
            cod_jugador: "P1".into(),
            cantidad: 4,
            ..Default::default()
        }
        .into_record();
        let (form, refs) = Form::edit(schema_for(EntityKind::EstadisticaJuego), 9, &line);
        assert_eq!(form.text(FieldId::Cantidad), "4");
        assert!(form.resolving);
        assert!(form.is_locked(FieldId::Juego));
        assert_eq!(
            refs,
            vec![
                (FieldId::Juego, EntityKind::Juego, "G1".into()),
                (FieldId::Estadistica, EntityKind::Estadistica, "S1".into()),
                (FieldId::Jugador, EntityKind::Jugador, "P1".into()),
            ]
        );
    }

    #[test]
    fn blocked_fields_explain_the_missing_prerequisite() {
        let form = Form::create(schema_for(EntityKind::EstadisticaJuego), 1);
        let api = LigaApi::new("http://api");
        assert_eq!(
            form.activate(FieldId::Jugador, 2, &api).unwrap_err(),
            Blocked::MissingPrerequisite("Debes seleccionar el juego para poder elegir a un jugador")
        );
        let (selector, url) = form.activate(FieldId::Juego, 2, &api).unwrap();
        assert_eq!(url, "http://api/juego");
        assert!(selector.is_loading());
    }

    #[test]
    fn player_candidates_are_scoped_to_the_game_teams() {
        let mut form = Form::create(schema_for(EntityKind::EstadisticaJuego), 1);
        let juego = Juego {
            cod_juego: "G1".into(),
            equipo1: "A".into(),
            equipo2: "B".into(),
            ..Default::default()
        };
        form.set_record(FieldId::Juego, Some(juego.into_record()));
        let api = LigaApi::new("http://api");
        assert_eq!(
            form.candidates_url(FieldId::Jugador, &api).as_deref(),
            Some("http://api/jugador/buscar?equiposId=A&equiposId=B")
        );
        assert!(form.candidates_url(FieldId::Estadistica, &api).is_none());
    }
}
