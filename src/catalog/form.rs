use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::NewSpecimen;
use crate::quiz::AnswerVector;

/// Typed in place of a value to leave a field as it is.
pub const SKIP: &str = "-";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FormField {
    Nombre,
    NombreCientifico,
    Habitat,
    Tamano,
    Descripcion,
    Imagen,
}

impl FormField {
    pub fn prompt(self) -> &'static str {
        match self {
            FormField::Nombre => "Nombre común (ej. Cangrejo porcelana manchado)",
            FormField::NombreCientifico => "Nombre científico (ej. Petrolisthes galathinus)",
            FormField::Habitat => "Hábitat (ej. Arrecifes de coral, bajo rocas)",
            FormField::Tamano => "Tamaño (ej. 1-2 cm de caparazón)",
            FormField::Descripcion => "Descripción",
            FormField::Imagen => "URL de imagen (ej. https://ejemplo.com/imagen.jpg)",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            FormField::Nombre => "nombre común",
            FormField::NombreCientifico => "nombre científico",
            FormField::Habitat => "hábitat",
            FormField::Tamano => "tamaño",
            FormField::Descripcion => "descripción",
            FormField::Imagen => "imagen",
        }
    }

    pub fn is_required(self) -> bool {
        matches!(self, FormField::Nombre | FormField::NombreCientifico)
    }

    fn next(self) -> Option<FormField> {
        match self {
            FormField::Nombre => Some(FormField::NombreCientifico),
            FormField::NombreCientifico => Some(FormField::Habitat),
            FormField::Habitat => Some(FormField::Tamano),
            FormField::Tamano => Some(FormField::Descripcion),
            FormField::Descripcion => Some(FormField::Imagen),
            FormField::Imagen => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormError {
    #[error("el campo «{}» es obligatorio", .0.label())]
    Required(FormField),
}

/// A specimen being filled in one field at a time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpecimenDraft {
    specimen: NewSpecimen,
    field: Option<FormField>,
}

impl Default for SpecimenDraft {
    fn default() -> Self {
        Self::new()
    }
}

impl SpecimenDraft {
    pub fn new() -> Self {
        Self {
            specimen: NewSpecimen::default(),
            field: Some(FormField::Nombre),
        }
    }

    /// Draft seeded from a finished quiz: the answers become the specimen's
    /// identification vector and the classifier's label its scientific name.
    pub fn from_identification(vector: AnswerVector, species: &str) -> Self {
        let mut draft = Self::new();
        draft.specimen.nombre_cientifico = species.replace('_', " ");
        draft.specimen.preguntas_identificacion = vector;
        draft
    }

    /// Field awaiting input, `None` once the draft is complete.
    pub fn field(&self) -> Option<FormField> {
        self.field
    }

    pub fn value(&self, field: FormField) -> &str {
        let s = &self.specimen;
        match field {
            FormField::Nombre => s.nombre.as_str(),
            FormField::NombreCientifico => s.nombre_cientifico.as_str(),
            FormField::Habitat => s.habitat.as_str(),
            FormField::Tamano => s.tamano.as_str(),
            FormField::Descripcion => s.descripcion.as_str(),
            FormField::Imagen => s.imagen.as_str(),
        }
    }

    fn value_mut(&mut self, field: FormField) -> &mut String {
        let s = &mut self.specimen;
        match field {
            FormField::Nombre => &mut s.nombre,
            FormField::NombreCientifico => &mut s.nombre_cientifico,
            FormField::Habitat => &mut s.habitat,
            FormField::Tamano => &mut s.tamano,
            FormField::Descripcion => &mut s.descripcion,
            FormField::Imagen => &mut s.imagen,
        }
    }

    /// Stores `input` in the current field and advances. [`SKIP`] keeps the
    /// current value. Returns the next field, or `None` when done.
    pub fn fill(&mut self, input: &str) -> Result<Option<FormField>, FormError> {
        let Some(field) = self.field else {
            return Ok(None);
        };

        let input = input.trim();
        let value = if input == SKIP {
            self.value(field).to_string()
        } else {
            input.to_string()
        };
        if field.is_required() && value.is_empty() {
            return Err(FormError::Required(field));
        }

        *self.value_mut(field) = value;
        self.field = field.next();
        Ok(self.field)
    }

    pub fn is_complete(&self) -> bool {
        self.field.is_none()
    }

    pub fn into_specimen(self) -> NewSpecimen {
        self.specimen
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn walks_fields_in_form_order() {
        let mut draft = SpecimenDraft::new();
        assert_eq!(draft.fill("Cangrejo porcelana manchado"), Ok(Some(FormField::NombreCientifico)));
        assert_eq!(draft.fill("Petrolisthes galathinus"), Ok(Some(FormField::Habitat)));
        assert_eq!(draft.fill("Arrecifes de coral"), Ok(Some(FormField::Tamano)));
        assert_eq!(draft.fill(SKIP), Ok(Some(FormField::Descripcion)));
        assert_eq!(draft.fill(" Manchas rojizas "), Ok(Some(FormField::Imagen)));
        assert_eq!(draft.fill(SKIP), Ok(None));
        assert!(draft.is_complete());

        let specimen = draft.into_specimen();
        assert_eq!(specimen.nombre_cientifico, "Petrolisthes galathinus");
        assert_eq!(specimen.tamano, "");
        assert_eq!(specimen.descripcion, "Manchas rojizas");
        assert!(specimen.preguntas_identificacion.is_empty());
    }

    #[test]
    fn required_fields_cannot_be_skipped() {
        let mut draft = SpecimenDraft::new();
        assert_eq!(draft.fill(SKIP), Err(FormError::Required(FormField::Nombre)));
        assert_eq!(draft.fill("   "), Err(FormError::Required(FormField::Nombre)));
        assert_eq!(draft.field(), Some(FormField::Nombre));
    }

    #[test]
    fn identification_seeds_the_draft() {
        let vector = crate::quiz::encode(&[true, false]);
        let mut draft = SpecimenDraft::from_identification(vector.clone(), "Pachycheles_serratus");

        draft.fill("Cangrejo aserrado").unwrap();
        // the classifier's label is kept when skipped
        assert_eq!(draft.fill(SKIP), Ok(Some(FormField::Habitat)));
        while !draft.is_complete() {
            draft.fill(SKIP).unwrap();
        }

        let specimen = draft.into_specimen();
        assert_eq!(specimen.nombre_cientifico, "Pachycheles serratus");
        assert_eq!(specimen.preguntas_identificacion, vector);
    }
}
