//! Keeps interdependent form fields in a legal joint state.
//!
//! Each form carries a rule table. A rule names a relational field, the
//! fields it depends on, the message shown while a dependency is missing and
//! an optional domain check. `reduce` is the only way field values change
//! once a form is on screen, and it re-evaluates the whole table after every
//! action, in table order, before recomputing the derived value.
use crate::state::form::{FieldId, Form};
use crate::state::notifications::Notifier;
use liga_api::{Equipo, Estadistica, Juego, Jugador, Record};

pub type Check = fn(&Form) -> Result<(), String>;

#[derive(Debug, Clone, Copy)]
pub struct Rule {
    pub field: FieldId,
    pub depends_on: &'static [FieldId],
    /// Shown while any dependency is unset.
    pub blocked: &'static str,
    /// Other fields `validate` reads. When one of them is the value that just
    /// changed, a failed check rejects that value instead of `field`.
    pub peers: &'static [FieldId],
    pub validate: Option<Check>,
}

/// A value computed from other fields, never entered by the user.
#[derive(Debug, Clone, Copy)]
pub struct Derived {
    pub label: &'static str,
    pub compute: fn(&Form) -> f64,
}

#[derive(Debug, Clone)]
pub enum FormAction {
    SetText(FieldId, String),
    SetRelation(FieldId, Record),
    ClearRelation(FieldId),
}

// ---------------------------------------------------------------------------
// Rule tables
// ---------------------------------------------------------------------------

/// game → player → statistic.
pub const STAT_LINE_RULES: &[Rule] = &[
    Rule {
        field: FieldId::Jugador,
        depends_on: &[FieldId::Juego],
        blocked: "Debes seleccionar el juego para poder elegir a un jugador",
        peers: &[],
        validate: Some(player_plays_in_game),
    },
    Rule {
        field: FieldId::Estadistica,
        depends_on: &[FieldId::Juego, FieldId::Jugador],
        blocked: "Debes seleccionar el jugador para poder elegir su estadistica",
        peers: &[],
        validate: None,
    },
];

pub const STAT_LINE_POINTS: Derived = Derived { label: "Puntos del jugador", compute: stat_line_points };

pub const GAME_RULES: &[Rule] = &[Rule {
    field: FieldId::Equipo2,
    depends_on: &[],
    blocked: "",
    peers: &[FieldId::Equipo1],
    validate: Some(distinct_teams),
}];

fn player_plays_in_game(form: &Form) -> Result<(), String> {
    let (Some(juego), Some(jugador)) = (
        form.relation::<Juego>(FieldId::Juego),
        form.relation::<Jugador>(FieldId::Jugador),
    ) else {
        return Ok(());
    };
    match jugador.cod_equipo.as_deref() {
        Some(team) if juego.involves(team) => Ok(()),
        _ => Err(format!(
            "El jugador: {} no pertenece a ninguno de los equipos del juego",
            jugador.nombre1
        )),
    }
}

fn distinct_teams(form: &Form) -> Result<(), String> {
    match (
        form.relation::<Equipo>(FieldId::Equipo1),
        form.relation::<Equipo>(FieldId::Equipo2),
    ) {
        (Some(a), Some(b)) if a.cod_equipo == b.cod_equipo => {
            Err("El equipo 1 y el equipo 2 deben ser distintos".to_owned())
        }
        _ => Ok(()),
    }
}

fn stat_line_points(form: &Form) -> f64 {
    let Some(estadistica) = form.relation::<Estadistica>(FieldId::Estadistica) else {
        return 0.0;
    };
    let cantidad = form.text(FieldId::Cantidad).trim().parse::<f64>().unwrap_or(0.0);
    cantidad * estadistica.valor
}

// ---------------------------------------------------------------------------
// Reducer
// ---------------------------------------------------------------------------

/// Apply one user action and bring the form back to a legal state.
/// Violations are recovered here and reported through `notifier`; nothing is
/// returned to the caller as an error.
pub fn reduce(form: &mut Form, action: FormAction, notifier: &Notifier) {
    let changed = match action {
        FormAction::SetText(id, text) => {
            form.set_text(id, text);
            None
        }
        FormAction::SetRelation(id, record) => {
            if form.is_locked(id) {
                return;
            }
            if let Some(reason) = form.blocked_reason(id) {
                notifier.warn(reason);
                return;
            }
            if !form.set_record(id, Some(record)) {
                return;
            }
            Some(id)
        }
        FormAction::ClearRelation(id) => {
            if form.is_locked(id) || !form.set_record(id, None) {
                return;
            }
            Some(id)
        }
    };

    // A new upstream value invalidates whatever was chosen downstream of it.
    if let Some(id) = changed {
        clear_dependents(form, id);
    }
    evaluate(form, changed, notifier);
}

/// Evaluate the rule table and recompute the derived value without an action,
/// e.g. after edit-mode fields were filled in.
pub fn settle(form: &mut Form, notifier: &Notifier) {
    evaluate(form, None, notifier);
}

fn evaluate(form: &mut Form, changed: Option<FieldId>, notifier: &Notifier) {
    let rules = form.schema.rules;
    for rule in rules {
        if !form.is_set(rule.field) {
            continue;
        }
        if rule.depends_on.iter().any(|d| !form.is_set(*d)) {
            clear(form, rule.field);
            continue;
        }
        if let Some(check) = rule.validate
            && let Err(message) = check(form)
        {
            let rejected = match changed {
                Some(id) if rule.peers.contains(&id) => id,
                _ => rule.field,
            };
            log::debug!("rejected {rejected:?}: {message}");
            notifier.warn(message);
            clear(form, rejected);
        }
    }
    form.derived = form.schema.derived.map(|d| (d.compute)(form)).unwrap_or(0.0);
}

fn clear(form: &mut Form, id: FieldId) {
    if form.set_record(id, None) {
        clear_dependents(form, id);
    }
}

fn clear_dependents(form: &mut Form, id: FieldId) {
    let rules = form.schema.rules;
    for rule in rules.iter().filter(|r| r.depends_on.contains(&id)) {
        if form.is_set(rule.field) && !form.is_locked(rule.field) {
            clear(form, rule.field);
        }
    }
}
