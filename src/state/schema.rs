//! One descriptor per entity kind. Dashboards and forms are generic; every
//! per-entity difference (fields, rules, payload shape, search) lives here.
use crate::state::consistency::{Derived, GAME_RULES, Rule, STAT_LINE_POINTS, STAT_LINE_RULES};
use crate::state::form::{
    Candidates, DATE_FORMAT, FieldId, FieldSpec, Form, FormMode, Input, Pattern, Rules, Seed,
};
use liga_api::payload::{
    CantidadPayload, CiudadPayload, EquipoPayload, EstadisticaJuegoPayload, EstadisticaPayload,
    JuegoPayload, JugadorPayload, Payload,
};
use liga_api::{EntityKind, Record};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchMode {
    Nombre,
    Descripcion,
    Jugador,
    Juego,
    Estadistica,
}

impl SearchMode {
    pub fn placeholder(self) -> &'static str {
        match self {
            SearchMode::Nombre => "Buscar por nombre",
            SearchMode::Descripcion => "Buscar por descripcion",
            SearchMode::Jugador => "Buscar por el nombre del jugador",
            SearchMode::Juego => "Buscar por la descripcion del juego",
            SearchMode::Estadistica => "Buscar por la descripcion de la estadistica",
        }
    }

    /// Text the query is matched against, lowercased.
    pub fn haystack(self, record: &Record) -> String {
        let text = match (self, record) {
            (SearchMode::Nombre, Record::Jugador(j)) => {
                format!("{} {}", j.nombre1, j.apellido1)
            }
            (SearchMode::Nombre, Record::Ciudad(c)) => c.nombre.clone(),
            (SearchMode::Nombre, Record::Equipo(e)) => e.nombre.clone(),
            (SearchMode::Descripcion, Record::Juego(j)) => j.descripcion.clone(),
            (SearchMode::Descripcion, Record::Estadistica(e)) => e.descripcion.clone(),
            (SearchMode::Jugador, Record::EstadisticaJuego(l)) => l
                .jugador
                .as_ref()
                .map(|j| format!("{} {}", j.nombre1, j.apellido1))
                .unwrap_or_default(),
            (SearchMode::Juego, Record::EstadisticaJuego(l)) => {
                l.juego.as_ref().map(|j| j.descripcion.clone()).unwrap_or_default()
            }
            (SearchMode::Estadistica, Record::EstadisticaJuego(l)) => l
                .estadistica
                .as_ref()
                .map(|e| e.descripcion.clone())
                .unwrap_or_default(),
            _ => String::new(),
        };
        text.to_lowercase()
    }
}

#[derive(Debug)]
pub struct EntitySchema {
    pub kind: EntityKind,
    pub title_create: &'static str,
    pub title_edit: &'static str,
    pub fields: &'static [FieldSpec],
    pub rules: &'static [Rule],
    pub derived: Option<Derived>,
    /// Relational fields frozen when editing (they form the record's key).
    pub locked_on_edit: &'static [FieldId],
    pub search_modes: &'static [SearchMode],
    pub delete_prompt: &'static str,
    pub seed: fn(&Record) -> Seed,
    pub build: fn(&Form) -> Option<Payload>,
}

pub fn schema_for(kind: EntityKind) -> &'static EntitySchema {
    match kind {
        EntityKind::Ciudad => &CIUDAD,
        EntityKind::Equipo => &EQUIPO,
        EntityKind::Jugador => &JUGADOR,
        EntityKind::Juego => &JUEGO,
        EntityKind::Estadistica => &ESTADISTICA,
        EntityKind::EstadisticaJuego => &ESTADISTICA_JUEGO,
    }
}

const CIUDAD_FIELD: FieldSpec = FieldSpec::relation(
    FieldId::Ciudad,
    "Ciudad",
    EntityKind::Ciudad,
    Rules::NONE,
    "Selecciona la ciudad",
    "Ciudades disponibles",
    "Elige la ciudad",
);

const VALOR_MIN: Option<(f64, &str)> = Some((1.0, "El valor debe ser mayor que 0"));

// ---------------------------------------------------------------------------
// Ciudad
// ---------------------------------------------------------------------------

static CIUDAD: EntitySchema = EntitySchema {
    kind: EntityKind::Ciudad,
    title_create: "Crear nueva ciudad",
    title_edit: "Informacion de la ciudad",
    fields: &[FieldSpec::text(FieldId::Nombre, "Nombre", Rules::REQUIRED)],
    rules: &[],
    derived: None,
    locked_on_edit: &[],
    search_modes: &[SearchMode::Nombre],
    delete_prompt: "¿Estás seguro de eliminar estas ciudades?",
    seed: seed_ciudad,
    build: build_ciudad,
};

fn seed_ciudad(record: &Record) -> Seed {
    let Record::Ciudad(c) = record else {
        return Seed::default();
    };
    Seed { texts: vec![(FieldId::Nombre, c.nombre.clone())], references: vec![] }
}

fn build_ciudad(form: &Form) -> Option<Payload> {
    Some(Payload::Ciudad(CiudadPayload { nombre: form.trimmed(FieldId::Nombre) }))
}

// ---------------------------------------------------------------------------
// Equipo
// ---------------------------------------------------------------------------

static EQUIPO: EntitySchema = EntitySchema {
    kind: EntityKind::Equipo,
    title_create: "Crear nuevo equipo",
    title_edit: "Informacion del equipo",
    fields: &[
        FieldSpec::text(FieldId::Nombre, "Nombre", Rules::REQUIRED),
        CIUDAD_FIELD,
    ],
    rules: &[],
    derived: None,
    locked_on_edit: &[],
    search_modes: &[SearchMode::Nombre],
    delete_prompt: "¿Estás seguro de eliminar estos equipos?",
    seed: seed_equipo,
    build: build_equipo,
};

fn seed_equipo(record: &Record) -> Seed {
    let Record::Equipo(e) = record else {
        return Seed::default();
    };
    Seed {
        texts: vec![(FieldId::Nombre, e.nombre.clone())],
        references: e
            .cod_ciudad
            .iter()
            .map(|c| (FieldId::Ciudad, EntityKind::Ciudad, c.clone()))
            .collect(),
    }
}

fn build_equipo(form: &Form) -> Option<Payload> {
    Some(Payload::Equipo(EquipoPayload {
        nombre: form.trimmed(FieldId::Nombre),
        cod_ciudad: form.code_of(FieldId::Ciudad),
    }))
}

// ---------------------------------------------------------------------------
// Jugador
// ---------------------------------------------------------------------------

static JUGADOR: EntitySchema = EntitySchema {
    kind: EntityKind::Jugador,
    title_create: "Crear nuevo jugador",
    title_edit: "Informacion del jugador",
    fields: &[
        FieldSpec::text(FieldId::PrimerNombre, "Primer nombre", Rules::REQUIRED),
        FieldSpec::text(FieldId::SegundoNombre, "Segundo nombre", Rules::NONE),
        FieldSpec::text(FieldId::PrimerApellido, "Primer apellido", Rules::REQUIRED),
        FieldSpec::text(FieldId::SegundoApellido, "Segundo apellido", Rules::NONE),
        FieldSpec::text(
            FieldId::Numero,
            "Numero de jugador",
            Rules {
                required: true,
                min_value: None,
                min_len: Some((2, "Debe ingresar 2 digitos")),
                pattern: Some((Pattern::JerseyNumber, "Ingrese un número válido de hasta 2 dígitos")),
            },
        )
        .with_placeholder("00"),
        FieldSpec::text(FieldId::FechaNacimiento, "Fecha de nacimiento", Rules::REQUIRED)
            .with_input(Input::Date)
            .with_placeholder("AAAA-MM-DD"),
        FieldSpec::relation(
            FieldId::Ciudad,
            "Ciudad de nacimiento",
            EntityKind::Ciudad,
            Rules::NONE,
            "Selecciona la ciudad",
            "Ciudades disponibles",
            "Elige la ciudad de nacimiento",
        ),
        FieldSpec::relation(
            FieldId::Equipo,
            "Equipo",
            EntityKind::Equipo,
            Rules::NONE,
            "Selecciona el equipo",
            "Equipos disponibles",
            "Elige el equipo",
        ),
    ],
    rules: &[],
    derived: None,
    locked_on_edit: &[],
    search_modes: &[SearchMode::Nombre],
    delete_prompt: "¿Estás seguro de eliminar estos jugadores?",
    seed: seed_jugador,
    build: build_jugador,
};

fn seed_jugador(record: &Record) -> Seed {
    let Record::Jugador(j) = record else {
        return Seed::default();
    };
    let mut texts = vec![
        (FieldId::PrimerNombre, j.nombre1.clone()),
        (FieldId::SegundoNombre, j.nombre2.clone().unwrap_or_default()),
        (FieldId::PrimerApellido, j.apellido1.clone()),
        (FieldId::SegundoApellido, j.apellido2.clone().unwrap_or_default()),
        (FieldId::Numero, j.numero.clone()),
    ];
    if let Some(fecha) = j.fecha_nacim {
        texts.push((FieldId::FechaNacimiento, fecha.format(DATE_FORMAT).to_string()));
    }
    let mut references = Vec::new();
    if let Some(ciudad) = &j.ciudad_nacim {
        references.push((FieldId::Ciudad, EntityKind::Ciudad, ciudad.clone()));
    }
    if let Some(equipo) = &j.cod_equipo {
        references.push((FieldId::Equipo, EntityKind::Equipo, equipo.clone()));
    }
    Seed { texts, references }
}

fn build_jugador(form: &Form) -> Option<Payload> {
    Some(Payload::Jugador(JugadorPayload {
        nombre1: form.trimmed(FieldId::PrimerNombre),
        nombre2: form.optional_text(FieldId::SegundoNombre),
        apellido1: form.trimmed(FieldId::PrimerApellido),
        apellido2: form.optional_text(FieldId::SegundoApellido),
        ciudad_nacim: form.code_of(FieldId::Ciudad),
        cod_equipo: form.code_of(FieldId::Equipo),
        fecha_nacim: form.date(FieldId::FechaNacimiento)?,
        numero: form.trimmed(FieldId::Numero),
    }))
}

// ---------------------------------------------------------------------------
// Juego
// ---------------------------------------------------------------------------

static JUEGO: EntitySchema = EntitySchema {
    kind: EntityKind::Juego,
    title_create: "Crear nuevo juego",
    title_edit: "Informacion del juego",
    fields: &[
        FieldSpec::text(FieldId::Descripcion, "Descripcion", Rules::REQUIRED),
        FieldSpec::text(FieldId::Fecha, "Fecha", Rules::REQUIRED)
            .with_input(Input::Date)
            .with_placeholder("AAAA-MM-DD"),
        FieldSpec::relation(
            FieldId::Equipo1,
            "Equipo 1",
            EntityKind::Equipo,
            Rules::REQUIRED,
            "Selecciona el equipo",
            "Equipos disponibles",
            "Elige el primer equipo",
        ),
        FieldSpec::relation(
            FieldId::Equipo2,
            "Equipo 2",
            EntityKind::Equipo,
            Rules::REQUIRED,
            "Selecciona el equipo",
            "Equipos disponibles",
            "Elige el segundo equipo",
        ),
    ],
    rules: GAME_RULES,
    derived: None,
    locked_on_edit: &[],
    search_modes: &[SearchMode::Descripcion],
    delete_prompt: "¿Estás seguro de eliminar estos juegos?",
    seed: seed_juego,
    build: build_juego,
};

fn seed_juego(record: &Record) -> Seed {
    let Record::Juego(j) = record else {
        return Seed::default();
    };
    let mut texts = vec![(FieldId::Descripcion, j.descripcion.clone())];
    if let Some(fecha) = j.fecha {
        texts.push((FieldId::Fecha, fecha.format(DATE_FORMAT).to_string()));
    }
    Seed {
        texts,
        references: vec![
            (FieldId::Equipo1, EntityKind::Equipo, j.equipo1.clone()),
            (FieldId::Equipo2, EntityKind::Equipo, j.equipo2.clone()),
        ],
    }
}

fn build_juego(form: &Form) -> Option<Payload> {
    Some(Payload::Juego(JuegoPayload {
        descripcion: form.trimmed(FieldId::Descripcion),
        fecha: form.date(FieldId::Fecha)?,
        equipo1: form.code_of(FieldId::Equipo1)?,
        equipo2: form.code_of(FieldId::Equipo2)?,
    }))
}

// ---------------------------------------------------------------------------
// Estadistica
// ---------------------------------------------------------------------------

static ESTADISTICA: EntitySchema = EntitySchema {
    kind: EntityKind::Estadistica,
    title_create: "Crear nueva estadistica",
    title_edit: "Informacion de la estadistica",
    fields: &[
        FieldSpec::text(FieldId::Descripcion, "Descripcion", Rules::REQUIRED),
        FieldSpec::text(
            FieldId::Valor,
            "Valor",
            Rules { min_value: VALOR_MIN, ..Rules::REQUIRED },
        )
        .with_input(Input::Decimal),
    ],
    rules: &[],
    derived: None,
    locked_on_edit: &[],
    search_modes: &[SearchMode::Descripcion],
    delete_prompt: "¿Estás seguro de eliminar estas estadisticas?",
    seed: seed_estadistica,
    build: build_estadistica,
};

fn seed_estadistica(record: &Record) -> Seed {
    let Record::Estadistica(e) = record else {
        return Seed::default();
    };
    Seed {
        texts: vec![
            (FieldId::Descripcion, e.descripcion.clone()),
            (FieldId::Valor, e.valor.to_string()),
        ],
        references: vec![],
    }
}

fn build_estadistica(form: &Form) -> Option<Payload> {
    Some(Payload::Estadistica(EstadisticaPayload {
        descripcion: form.trimmed(FieldId::Descripcion),
        valor: form.decimal(FieldId::Valor)?,
    }))
}

// ---------------------------------------------------------------------------
// EstadisticaJuego
// ---------------------------------------------------------------------------

static ESTADISTICA_JUEGO: EntitySchema = EntitySchema {
    kind: EntityKind::EstadisticaJuego,
    title_create: "Crear nueva estadistica de juego",
    title_edit: "Informacion de la estadistica de juego",
    fields: &[
        FieldSpec::text(
            FieldId::Cantidad,
            "Cantidad",
            Rules { min_value: VALOR_MIN, ..Rules::REQUIRED },
        )
        .with_input(Input::Integer),
        FieldSpec::relation(
            FieldId::Juego,
            "Juego",
            EntityKind::Juego,
            Rules::REQUIRED,
            "Selecciona el juego",
            "Juegos disponibles",
            "Elige el juego",
        ),
        FieldSpec::relation(
            FieldId::Jugador,
            "Jugador",
            EntityKind::Jugador,
            Rules::REQUIRED,
            "Selecciona el jugador",
            "Jugadores disponibles",
            "Elige el jugador",
        )
        .with_candidates(Candidates::PlayersOfGame),
        FieldSpec::relation(
            FieldId::Estadistica,
            "Estadistica del jugador",
            EntityKind::Estadistica,
            Rules::REQUIRED,
            "Selecciona la estadistica",
            "Estadisticas disponibles",
            "Estas son las estadísticas que el jugador aun no posee en este juego",
        )
        .with_candidates(Candidates::MissingStatistics),
    ],
    rules: STAT_LINE_RULES,
    derived: Some(STAT_LINE_POINTS),
    locked_on_edit: &[FieldId::Juego, FieldId::Jugador, FieldId::Estadistica],
    search_modes: &[SearchMode::Jugador, SearchMode::Juego, SearchMode::Estadistica],
    delete_prompt: "¿Estás seguro de eliminar estas estadisticas de juegos?",
    seed: seed_estadistica_juego,
    build: build_estadistica_juego,
};

fn seed_estadistica_juego(record: &Record) -> Seed {
    let Record::EstadisticaJuego(l) = record else {
        return Seed::default();
    };
    Seed {
        texts: vec![(FieldId::Cantidad, l.cantidad.to_string())],
        references: vec![
            (FieldId::Juego, EntityKind::Juego, l.cod_juego.clone()),
            (FieldId::Estadistica, EntityKind::Estadistica, l.cod_estadistica.clone()),
            (FieldId::Jugador, EntityKind::Jugador, l.cod_jugador.clone()),
        ],
    }
}

fn build_estadistica_juego(form: &Form) -> Option<Payload> {
    let cantidad = form.integer(FieldId::Cantidad)?;
    if let FormMode::Edit { .. } = form.mode {
        return Some(Payload::Cantidad(CantidadPayload { cantidad }));
    }
    Some(Payload::EstadisticaJuego(EstadisticaJuegoPayload {
        cod_estadistica: form.code_of(FieldId::Estadistica)?,
        cod_juego: form.code_of(FieldId::Juego)?,
        cod_jugador: form.code_of(FieldId::Jugador)?,
        cantidad,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::consistency::{FormAction, reduce};
    use crate::state::notifications::Notifier;
    use liga_api::{Ciudad, Equipo, Estadistica, EstadisticaJuego, Juego, Jugador, Resource};
    use serde_json::{Value, json};

    fn payload_json(form: &mut Form) -> Value {
        serde_json::to_value(form.submit().expect("form should submit")).unwrap()
    }

    #[test]
    fn player_payload_carries_city_code_not_city() {
        let mut form = Form::create(schema_for(EntityKind::Jugador), 1);
        form.set_text(FieldId::PrimerNombre, "Ana".into());
        form.set_text(FieldId::PrimerApellido, "Rios".into());
        form.set_text(FieldId::Numero, "07".into());
        form.set_text(FieldId::FechaNacimiento, "2001-04-09".into());
        let ciudad = Ciudad { cod_ciudad: "C1".into(), nombre: "X".into() };
        form.set_record(FieldId::Ciudad, Some(ciudad.into_record()));

        let body = payload_json(&mut form);
        assert_eq!(body["CiudadNacim"], json!("C1"));
        assert_eq!(body["CodEquipo"], Value::Null);
        assert_eq!(body["FechaNacim"], json!("2001-04-09"));
        let object = body.as_object().unwrap();
        assert!(!object.contains_key("ciudad"));
        assert!(!object.contains_key("equipo"));
    }

    #[test]
    fn statistic_value_is_coerced_to_a_number() {
        let mut form = Form::create(schema_for(EntityKind::Estadistica), 1);
        form.set_text(FieldId::Descripcion, "Triple".into());
        form.set_text(FieldId::Valor, "3".into());
        assert_eq!(payload_json(&mut form), json!({ "Descripcion": "Triple", "Valor": 3.0 }));
    }

    #[test]
    fn statistic_value_below_one_is_rejected() {
        let mut form = Form::create(schema_for(EntityKind::Estadistica), 1);
        form.set_text(FieldId::Descripcion, "Nada".into());
        form.set_text(FieldId::Valor, "0".into());
        assert!(form.submit().is_none());
        assert_eq!(form.error(FieldId::Valor), Some("El valor debe ser mayor que 0"));
    }

    #[test]
    fn stat_line_payload_flattens_all_three_references() {
        let (notifier, _rx) = Notifier::channel();
        let mut form = Form::create(schema_for(EntityKind::EstadisticaJuego), 1);
        let juego = Juego {
            cod_juego: "G1".into(),
            equipo1: "A".into(),
            equipo2: "B".into(),
            ..Default::default()
        };
        let jugador = Jugador {
            cod_jugador: "P1".into(),
            cod_equipo: Some("A".into()),
            ..Default::default()
        };
        let estadistica = Estadistica { cod_estadistica: "S1".into(), valor: 2.0, ..Default::default() };
        reduce(&mut form, FormAction::SetText(FieldId::Cantidad, "3".into()), &notifier);
        reduce(&mut form, FormAction::SetRelation(FieldId::Juego, juego.into_record()), &notifier);
        reduce(&mut form, FormAction::SetRelation(FieldId::Jugador, jugador.into_record()), &notifier);
        reduce(&mut form, FormAction::SetRelation(FieldId::Estadistica, estadistica.into_record()), &notifier);

        assert_eq!(
            payload_json(&mut form),
            json!({ "CodEstadistica": "S1", "CodJuego": "G1", "CodJugador": "P1", "Cantidad": 3 })
        );
        assert!(form.submitting);
    }

    #[test]
    fn stat_line_edit_patches_quantity_only() {
        let line = EstadisticaJuego {
            cod_estadistica: "S1".into(),
            cod_juego: "G1".into(),
            cod_jugador: "P1".into(),
            cantidad: 2,
            ..Default::default()
        };
        let (mut form, _refs) =
            Form::edit(schema_for(EntityKind::EstadisticaJuego), 1, &line.into_record());
        form.apply_resolved(vec![
            (FieldId::Juego, Some(Juego { cod_juego: "G1".into(), ..Default::default() }.into_record())),
            (FieldId::Estadistica, Some(Estadistica { cod_estadistica: "S1".into(), ..Default::default() }.into_record())),
            (FieldId::Jugador, Some(Jugador { cod_jugador: "P1".into(), ..Default::default() }.into_record())),
        ]);
        form.set_text(FieldId::Cantidad, "6".into());
        assert_eq!(payload_json(&mut form), json!({ "Cantidad": 6 }));
    }

    #[test]
    fn game_requires_both_teams() {
        let mut form = Form::create(schema_for(EntityKind::Juego), 1);
        form.set_text(FieldId::Descripcion, "Final".into());
        form.set_text(FieldId::Fecha, "2024-06-01".into());
        let tigres = Equipo { cod_equipo: "E1".into(), ..Default::default() };
        form.set_record(FieldId::Equipo1, Some(tigres.into_record()));
        assert!(form.submit().is_none());
        assert_eq!(form.error(FieldId::Equipo2), Some("Este campo es obligatorio"));
        assert!(!form.submitting);
    }

    #[test]
    fn search_haystack_uses_the_mode_specific_text() {
        let line = EstadisticaJuego {
            juego: Some(Juego { descripcion: "Final Norte".into(), ..Default::default() }),
            ..Default::default()
        }
        .into_record();
        assert_eq!(SearchMode::Juego.haystack(&line), "final norte");
        assert_eq!(SearchMode::Jugador.haystack(&line), "");
    }
}
