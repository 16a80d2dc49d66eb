//! Turns the service's loosely typed catalog into [`CatalogEntry`] values.
//!
//! Each text field resolves through an ordered chain of rules; the first
//! rule that yields a non-empty value wins. A malformed value is treated the
//! same as a missing one, so one bad field never drops the record.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde_json::{Map, Value};

use super::images::{reference_image, DEFAULT_IMAGE};
use super::CatalogEntry;
use crate::quiz::AnswerVector;

pub const UNSPECIFIED_HABITAT: &str = "No especificado";
pub const UNSPECIFIED_SIZE: &str = "N/A";

type Record = Map<String, Value>;

#[derive(Debug, Clone, Copy)]
enum Rule {
    /// Non-empty string under this key of the record.
    Field(&'static str),
    /// Curated image for the id.
    ReferenceImage,
    /// The id with underscores turned into spaces.
    KeyWithSpaces,
    /// Always applies.
    Fixed(&'static str),
}

impl Rule {
    fn apply(self, key: &str, record: Option<&Record>) -> Option<String> {
        match self {
            Rule::Field(name) => record
                .and_then(|r| r.get(name))
                .and_then(Value::as_str)
                .filter(|s| !s.is_empty())
                .map(str::to_string),
            Rule::ReferenceImage => reference_image(key).map(str::to_string),
            Rule::KeyWithSpaces => Some(key.replace('_', " ")),
            Rule::Fixed(value) => Some(value.to_string()),
        }
    }
}

const NOMBRE: &[Rule] = &[Rule::Field("nombre"), Rule::KeyWithSpaces];
const NOMBRE_CIENTIFICO: &[Rule] = &[Rule::Field("nombreCientifico"), Rule::KeyWithSpaces];
const HABITAT: &[Rule] = &[Rule::Field("habitat"), Rule::Fixed(UNSPECIFIED_HABITAT)];
const TAMANO: &[Rule] = &[Rule::Field("tamano"), Rule::Fixed(UNSPECIFIED_SIZE)];
const DESCRIPCION: &[Rule] = &[Rule::Field("descripcion"), Rule::Fixed("")];
const IMAGEN: &[Rule] = &[
    Rule::ReferenceImage,
    Rule::Field("imagen"),
    Rule::Fixed(DEFAULT_IMAGE),
];

fn resolve(rules: &[Rule], key: &str, record: Option<&Record>) -> Option<String> {
    rules.iter().find_map(|rule| rule.apply(key, record))
}

fn resolve_text(rules: &[Rule], key: &str, record: Option<&Record>) -> String {
    resolve(rules, key, record).unwrap_or_default()
}

/// Normalizes every record, stamping undated ones with the current time.
pub fn normalize_catalog(raw: &Map<String, Value>) -> Vec<CatalogEntry> {
    normalize_catalog_at(raw, Utc::now())
}

/// Normalizes every record; `now` stands in for missing or unreadable dates.
///
/// Produces exactly one entry per key, in key order, with the key as id.
pub fn normalize_catalog_at(raw: &Map<String, Value>, now: DateTime<Utc>) -> Vec<CatalogEntry> {
    raw.iter()
        .map(|(key, value)| normalize_record(key, value, now))
        .collect()
}

fn normalize_record(key: &str, value: &Value, now: DateTime<Utc>) -> CatalogEntry {
    let record = value.as_object();
    if record.is_none() {
        log::warn!("Catalog record {:?} is not an object, using defaults", key);
    }

    CatalogEntry {
        id: key.to_string(),
        nombre: resolve_text(NOMBRE, key, record),
        nombre_cientifico: resolve_text(NOMBRE_CIENTIFICO, key, record),
        habitat: resolve_text(HABITAT, key, record),
        tamano: resolve_text(TAMANO, key, record),
        descripcion: resolve_text(DESCRIPCION, key, record),
        imagen: resolve(IMAGEN, key, record),
        fecha_agregada: record
            .and_then(|r| r.get("fechaAgregada"))
            .and_then(parse_date)
            .unwrap_or(now),
        preguntas_identificacion: record
            .and_then(|r| r.get("preguntas_identificacion"))
            .and_then(|v| parse_vector(key, v))
            .unwrap_or_default(),
    }
}

const DATE_TIME_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];

/// Accepts RFC 3339, naive ISO date-times (read as UTC), bare dates and
/// epoch milliseconds.
fn parse_date(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::Number(n) => n.as_i64().and_then(DateTime::<Utc>::from_timestamp_millis),
        Value::String(s) => {
            let s = s.trim();
            if let Ok(date) = DateTime::parse_from_rfc3339(s) {
                return Some(date.with_timezone(&Utc));
            }
            if let Some(date) = DATE_TIME_FORMATS
                .iter()
                .find_map(|format| NaiveDateTime::parse_from_str(s, format).ok())
            {
                return Some(date.and_utc());
            }
            NaiveDate::parse_from_str(s, "%Y-%m-%d")
                .ok()
                .and_then(|date| date.and_hms_opt(0, 0, 0))
                .map(|date| date.and_utc())
        }
        _ => None,
    }
}

fn parse_vector(key: &str, value: &Value) -> Option<AnswerVector> {
    let slots = value
        .as_array()?
        .iter()
        .map(|slot| slot.as_u64().filter(|bit| *bit <= 1).map(|bit| bit as u8))
        .collect::<Option<Vec<u8>>>();

    match slots.map(AnswerVector::try_from) {
        Some(Ok(vector)) => Some(vector),
        Some(Err(e)) => {
            log::warn!("Ignoring identification vector of {:?}: {}", key, e);
            None
        }
        None => {
            log::warn!("Ignoring non-binary identification vector of {:?}", key);
            None
        }
    }
}
