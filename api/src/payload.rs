//! Request bodies for POST/PATCH. Only scalars and foreign-key codes travel
//! over the wire; nested records are never serialized.
use chrono::NaiveDate;
use serde::{Serialize, Serializer};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Payload {
    Ciudad(CiudadPayload),
    Equipo(EquipoPayload),
    Jugador(JugadorPayload),
    Juego(JuegoPayload),
    Estadistica(EstadisticaPayload),
    EstadisticaJuego(EstadisticaJuegoPayload),
    Cantidad(CantidadPayload),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct CiudadPayload {
    pub nombre: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct EquipoPayload {
    pub nombre: String,
    pub cod_ciudad: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct JugadorPayload {
    pub nombre1: String,
    pub nombre2: Option<String>,
    pub apellido1: String,
    pub apellido2: Option<String>,
    pub ciudad_nacim: Option<String>,
    pub cod_equipo: Option<String>,
    #[serde(serialize_with = "iso_date")]
    pub fecha_nacim: NaiveDate,
    pub numero: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct JuegoPayload {
    pub descripcion: String,
    #[serde(serialize_with = "iso_date")]
    pub fecha: NaiveDate,
    pub equipo1: String,
    pub equipo2: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct EstadisticaPayload {
    pub descripcion: String,
    pub valor: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct EstadisticaJuegoPayload {
    pub cod_estadistica: String,
    pub cod_juego: String,
    pub cod_jugador: String,
    pub cantidad: u32,
}

/// PATCH body for an existing stat line: its composite key is immutable.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct CantidadPayload {
    pub cantidad: u32,
}

fn iso_date<S: Serializer>(date: &NaiveDate, s: S) -> Result<S::Ok, S::Error> {
    s.collect_str(&date.format("%Y-%m-%d"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn jugador_payload_uses_wire_names_and_iso_dates() {
        let payload = Payload::Jugador(JugadorPayload {
            nombre1: "Ana".into(),
            nombre2: None,
            apellido1: "Rios".into(),
            apellido2: None,
            ciudad_nacim: Some("C1".into()),
            cod_equipo: None,
            fecha_nacim: NaiveDate::from_ymd_opt(2001, 4, 9).unwrap(),
            numero: "07".into(),
        });
        assert_eq!(
            serde_json::to_value(&payload).unwrap(),
            json!({
                "Nombre1": "Ana",
                "Nombre2": null,
                "Apellido1": "Rios",
                "Apellido2": null,
                "CiudadNacim": "C1",
                "CodEquipo": null,
                "FechaNacim": "2001-04-09",
                "Numero": "07"
            })
        );
    }

    #[test]
    fn untagged_payload_serializes_inner_body_only() {
        let payload = Payload::Cantidad(CantidadPayload { cantidad: 4 });
        assert_eq!(serde_json::to_value(&payload).unwrap(), json!({ "Cantidad": 4 }));
    }
}
