pub mod client;
pub mod payload;
mod wire;

use chrono::NaiveDate;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::fmt;

// ---------------------------------------------------------------------------
// Entity kinds, one per REST resource
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EntityKind {
    Jugador,
    Ciudad,
    Estadistica,
    EstadisticaJuego,
    Juego,
    Equipo,
}

impl EntityKind {
    /// Tab order of the dashboards.
    pub const ALL: [EntityKind; 6] = [
        EntityKind::Jugador,
        EntityKind::Ciudad,
        EntityKind::Estadistica,
        EntityKind::EstadisticaJuego,
        EntityKind::Juego,
        EntityKind::Equipo,
    ];

    /// Path segment of the resource under the API base URL.
    pub fn path(self) -> &'static str {
        match self {
            EntityKind::Jugador => "jugador",
            EntityKind::Ciudad => "ciudad",
            EntityKind::Estadistica => "estadistica",
            EntityKind::EstadisticaJuego => "estadistica-juego",
            EntityKind::Juego => "juego",
            EntityKind::Equipo => "equipo",
        }
    }

    pub fn singular(self) -> &'static str {
        match self {
            EntityKind::Jugador => "Jugador",
            EntityKind::Ciudad => "Ciudad",
            EntityKind::Estadistica => "Estadistica",
            EntityKind::EstadisticaJuego => "Estadistica de juego",
            EntityKind::Juego => "Juego",
            EntityKind::Equipo => "Equipo",
        }
    }

    pub fn plural(self) -> &'static str {
        match self {
            EntityKind::Jugador => "Jugadores",
            EntityKind::Ciudad => "Ciudades",
            EntityKind::Estadistica => "Estadisticas",
            EntityKind::EstadisticaJuego => "Estadisticas de juegos",
            EntityKind::Juego => "Juegos",
            EntityKind::Equipo => "Equipos",
        }
    }

    /// Grammatical gender used by confirmation messages ("creada" vs "creado").
    pub fn is_feminine(self) -> bool {
        matches!(
            self,
            EntityKind::Ciudad | EntityKind::Estadistica | EntityKind::EstadisticaJuego
        )
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.singular())
    }
}

// ---------------------------------------------------------------------------
// Entity traits
// ---------------------------------------------------------------------------

/// Anything that can be listed and picked: it has a unique code and a label.
pub trait Entity: Clone + fmt::Debug {
    fn kind(&self) -> EntityKind;
    /// Unique key within its kind. Composite keys are joined with `/`.
    fn code(&self) -> String;
    fn label(&self) -> String;
}

/// A concrete record type bound to exactly one REST resource.
pub trait Resource: Entity + DeserializeOwned + Send + 'static {
    const KIND: EntityKind;

    fn into_record(self) -> Record;
    fn from_record(record: Record) -> Option<Self>;
    fn from_record_ref(record: &Record) -> Option<&Self>;
}

// ---------------------------------------------------------------------------
// Records mirroring the API JSON shapes
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Ciudad {
    #[serde(deserialize_with = "wire::code")]
    pub cod_ciudad: String,
    pub nombre: String,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Equipo {
    #[serde(deserialize_with = "wire::code")]
    pub cod_equipo: String,
    pub nombre: String,
    #[serde(default, deserialize_with = "wire::optional_code")]
    pub cod_ciudad: Option<String>,
    #[serde(default, rename = "ciudad")]
    pub ciudad: Option<Ciudad>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Jugador {
    #[serde(deserialize_with = "wire::code")]
    pub cod_jugador: String,
    pub nombre1: String,
    #[serde(default)]
    pub nombre2: Option<String>,
    pub apellido1: String,
    #[serde(default)]
    pub apellido2: Option<String>,
    #[serde(default, deserialize_with = "wire::optional_code")]
    pub ciudad_nacim: Option<String>,
    #[serde(default, deserialize_with = "wire::optional_date")]
    pub fecha_nacim: Option<NaiveDate>,
    #[serde(deserialize_with = "wire::code")]
    pub numero: String,
    #[serde(default, deserialize_with = "wire::optional_code")]
    pub cod_equipo: Option<String>,
    #[serde(default, rename = "ciudad")]
    pub ciudad: Option<Ciudad>,
    #[serde(default, rename = "equipo")]
    pub equipo: Option<Equipo>,
}

impl Jugador {
    /// "Nombre1 Apellido1", used by search and warnings.
    pub fn full_name(&self) -> String {
        format!("{} {}", self.nombre1, self.apellido1)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Juego {
    #[serde(deserialize_with = "wire::code")]
    pub cod_juego: String,
    pub descripcion: String,
    #[serde(deserialize_with = "wire::code")]
    pub equipo1: String,
    #[serde(deserialize_with = "wire::code")]
    pub equipo2: String,
    #[serde(default, deserialize_with = "wire::optional_date")]
    pub fecha: Option<NaiveDate>,
    #[serde(default, rename = "Equipo1Entity")]
    pub equipo1_entity: Option<Equipo>,
    #[serde(default, rename = "Equipo2Entity")]
    pub equipo2_entity: Option<Equipo>,
}

impl Juego {
    /// True when `team` is one of the two teams playing this game.
    pub fn involves(&self, team: &str) -> bool {
        self.equipo1 == team || self.equipo2 == team
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Estadistica {
    #[serde(deserialize_with = "wire::code")]
    pub cod_estadistica: String,
    pub descripcion: String,
    pub valor: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct EstadisticaJuego {
    #[serde(deserialize_with = "wire::code")]
    pub cod_estadistica: String,
    #[serde(deserialize_with = "wire::code")]
    pub cod_juego: String,
    #[serde(deserialize_with = "wire::code")]
    pub cod_jugador: String,
    pub cantidad: u32,
    #[serde(default, rename = "jugador")]
    pub jugador: Option<Jugador>,
    #[serde(default, rename = "juego")]
    pub juego: Option<Juego>,
    #[serde(default, rename = "estadistica")]
    pub estadistica: Option<Estadistica>,
}

impl EstadisticaJuego {
    /// Points this line is worth: quantity times the statistic's value.
    pub fn points(&self) -> f64 {
        self.estadistica
            .as_ref()
            .map(|e| f64::from(self.cantidad) * e.valor)
            .unwrap_or_default()
    }
}

// ---------------------------------------------------------------------------
// Entity impls
// ---------------------------------------------------------------------------

impl Entity for Ciudad {
    fn kind(&self) -> EntityKind {
        EntityKind::Ciudad
    }
    fn code(&self) -> String {
        self.cod_ciudad.clone()
    }
    fn label(&self) -> String {
        self.nombre.clone()
    }
}

impl Entity for Equipo {
    fn kind(&self) -> EntityKind {
        EntityKind::Equipo
    }
    fn code(&self) -> String {
        self.cod_equipo.clone()
    }
    fn label(&self) -> String {
        self.nombre.clone()
    }
}

impl Entity for Jugador {
    fn kind(&self) -> EntityKind {
        EntityKind::Jugador
    }
    fn code(&self) -> String {
        self.cod_jugador.clone()
    }
    fn label(&self) -> String {
        let team = self.equipo.as_ref().map(|e| e.nombre.as_str()).unwrap_or("-");
        format!("{} {}. Equipo: {team}", self.nombre1, self.apellido1)
    }
}

impl Entity for Juego {
    fn kind(&self) -> EntityKind {
        EntityKind::Juego
    }
    fn code(&self) -> String {
        self.cod_juego.clone()
    }
    fn label(&self) -> String {
        self.descripcion.clone()
    }
}

impl Entity for Estadistica {
    fn kind(&self) -> EntityKind {
        EntityKind::Estadistica
    }
    fn code(&self) -> String {
        self.cod_estadistica.clone()
    }
    fn label(&self) -> String {
        format!("{}. Valor: {}", self.descripcion, self.valor)
    }
}

impl Entity for EstadisticaJuego {
    fn kind(&self) -> EntityKind {
        EntityKind::EstadisticaJuego
    }
    fn code(&self) -> String {
        stat_line_code(&self.cod_juego, &self.cod_estadistica, &self.cod_jugador)
    }
    fn label(&self) -> String {
        let jugador = self.jugador.as_ref().map(Jugador::full_name).unwrap_or_default();
        let estadistica = self
            .estadistica
            .as_ref()
            .map(|e| e.descripcion.clone())
            .unwrap_or_else(|| self.cod_estadistica.clone());
        format!("{jugador}: {estadistica} x{}", self.cantidad)
    }
}

/// Composite key of a stat line, addressed path-wise as game/statistic/player.
pub fn stat_line_code(juego: &str, estadistica: &str, jugador: &str) -> String {
    format!("{juego}/{estadistica}/{jugador}")
}

// ---------------------------------------------------------------------------
// Record, the closed sum of every resource
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub enum Record {
    Ciudad(Ciudad),
    Equipo(Equipo),
    Jugador(Jugador),
    Juego(Juego),
    Estadistica(Estadistica),
    EstadisticaJuego(EstadisticaJuego),
}

impl Entity for Record {
    fn kind(&self) -> EntityKind {
        match self {
            Record::Ciudad(e) => e.kind(),
            Record::Equipo(e) => e.kind(),
            Record::Jugador(e) => e.kind(),
            Record::Juego(e) => e.kind(),
            Record::Estadistica(e) => e.kind(),
            Record::EstadisticaJuego(e) => e.kind(),
        }
    }

    fn code(&self) -> String {
        match self {
            Record::Ciudad(e) => e.code(),
            Record::Equipo(e) => e.code(),
            Record::Jugador(e) => e.code(),
            Record::Juego(e) => e.code(),
            Record::Estadistica(e) => e.code(),
            Record::EstadisticaJuego(e) => e.code(),
        }
    }

    fn label(&self) -> String {
        match self {
            Record::Ciudad(e) => e.label(),
            Record::Equipo(e) => e.label(),
            Record::Jugador(e) => e.label(),
            Record::Juego(e) => e.label(),
            Record::Estadistica(e) => e.label(),
            Record::EstadisticaJuego(e) => e.label(),
        }
    }
}

macro_rules! impl_resource {
    ($ty:ident) => {
        impl Resource for $ty {
            const KIND: EntityKind = EntityKind::$ty;

            fn into_record(self) -> Record {
                Record::$ty(self)
            }

            fn from_record(record: Record) -> Option<Self> {
                match record {
                    Record::$ty(e) => Some(e),
                    _ => None,
                }
            }

            fn from_record_ref(record: &Record) -> Option<&Self> {
                match record {
                    Record::$ty(e) => Some(e),
                    _ => None,
                }
            }
        }
    };
}

impl_resource!(Ciudad);
impl_resource!(Equipo);
impl_resource!(Jugador);
impl_resource!(Juego);
impl_resource!(Estadistica);
impl_resource!(EstadisticaJuego);

/// Run `$body` with `$T` bound to the concrete record type of `$kind`.
#[macro_export]
macro_rules! with_resource {
    ($kind:expr, $T:ident => $body:expr) => {
        match $kind {
            $crate::EntityKind::Ciudad => {
                type $T = $crate::Ciudad;
                $body
            }
            $crate::EntityKind::Equipo => {
                type $T = $crate::Equipo;
                $body
            }
            $crate::EntityKind::Jugador => {
                type $T = $crate::Jugador;
                $body
            }
            $crate::EntityKind::Juego => {
                type $T = $crate::Juego;
                $body
            }
            $crate::EntityKind::Estadistica => {
                type $T = $crate::Estadistica;
                $body
            }
            $crate::EntityKind::EstadisticaJuego => {
                type $T = $crate::EstadisticaJuego;
                $body
            }
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn jugador_decodes_api_shape() {
        let raw = r#"{
            "CodJugador": "J1",
            "Nombre1": "Ana",
            "Nombre2": null,
            "Apellido1": "Rios",
            "Apellido2": null,
            "CiudadNacim": "C1",
            "FechaNacim": "2001-04-09T00:00:00.000Z",
            "Numero": "07",
            "CodEquipo": "E1",
            "ciudad": { "CodCiudad": "C1", "Nombre": "Bogotá" },
            "equipo": { "CodEquipo": "E1", "Nombre": "Tigres", "CodCiudad": null, "ciudad": null },
            "estadisticasDeJuego": []
        }"#;
        let j: Jugador = serde_json::from_str(raw).unwrap();
        assert_eq!(j.cod_jugador, "J1");
        assert_eq!(j.fecha_nacim, NaiveDate::from_ymd_opt(2001, 4, 9));
        assert_eq!(j.ciudad.as_ref().map(|c| c.nombre.as_str()), Some("Bogotá"));
        assert_eq!(j.label(), "Ana Rios. Equipo: Tigres");
    }

    #[test]
    fn numeric_codes_are_read_as_strings() {
        let c: Ciudad = serde_json::from_str(r#"{"CodCiudad": 12, "Nombre": "Cali"}"#).unwrap();
        assert_eq!(c.code(), "12");
    }

    #[test]
    fn stat_line_code_is_game_statistic_player() {
        let line = EstadisticaJuego {
            cod_estadistica: "S".into(),
            cod_juego: "G".into(),
            cod_jugador: "P".into(),
            cantidad: 2,
            ..Default::default()
        };
        assert_eq!(line.code(), "G/S/P");
    }

    #[test]
    fn stat_line_points_multiply_quantity_by_value() {
        let line = EstadisticaJuego {
            cantidad: 3,
            estadistica: Some(Estadistica { valor: 2.0, ..Default::default() }),
            ..Default::default()
        };
        assert_eq!(line.points(), 6.0);
        assert_eq!(EstadisticaJuego::default().points(), 0.0);
    }

    #[test]
    fn record_round_trips_through_resource() {
        let record = Ciudad { cod_ciudad: "1".into(), nombre: "Bogotá".into() }.into_record();
        assert_eq!(record.kind(), EntityKind::Ciudad);
        assert!(Jugador::from_record_ref(&record).is_none());
        assert_eq!(Ciudad::from_record(record).map(|c| c.nombre), Some("Bogotá".into()));
    }
}
