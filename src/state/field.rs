use crate::state::selector::EntitySelector;
use liga_api::Entity;

/// A form field whose value is a whole record rather than a scalar.
///
/// The field owns the current value and a lock flag; whether it may be
/// opened right now depends on its siblings and is decided by the form's
/// rule table (see `consistency`).
#[derive(Debug, Clone)]
pub struct RelationalField<T> {
    value: Option<T>,
    locked: bool,
}

impl<T> Default for RelationalField<T> {
    fn default() -> Self {
        Self { value: None, locked: false }
    }
}

impl<T: Entity> RelationalField<T> {
    pub fn value(&self) -> Option<&T> {
        self.value.as_ref()
    }

    pub fn is_set(&self) -> bool {
        self.value.is_some()
    }

    pub fn set(&mut self, value: Option<T>) {
        self.value = value;
    }

    pub fn clear(&mut self) {
        self.value = None;
    }

    /// Locked fields keep their value and never open a selector.
    pub fn lock(&mut self) {
        self.locked = true;
    }

    pub fn is_locked(&self) -> bool {
        self.locked
    }

    /// Text for the trigger control: the chosen record's label or the placeholder.
    pub fn trigger_text(&self, placeholder: &str) -> String {
        self.value
            .as_ref()
            .map(Entity::label)
            .unwrap_or_else(|| placeholder.to_owned())
    }

    /// A selector seeded with the current value as pre-selection.
    pub fn open(&self, ticket: u64, header: &str, subtitle: &str) -> EntitySelector<T> {
        EntitySelector::open(ticket, header, subtitle, self.value.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use liga_api::Equipo;

    fn equipo() -> Equipo {
        Equipo { cod_equipo: "E1".into(), nombre: "Tigres".into(), ..Default::default() }
    }

    #[test]
    fn trigger_shows_placeholder_until_set() {
        let mut field = RelationalField::<Equipo>::default();
        assert_eq!(field.trigger_text("Selecciona el equipo"), "Selecciona el equipo");
        field.set(Some(equipo()));
        assert_eq!(field.trigger_text("Selecciona el equipo"), "Tigres");
    }

    #[test]
    fn opened_selector_is_preselected_with_current_value() {
        let mut field = RelationalField::default();
        field.set(Some(equipo()));
        let selector = field.open(3, "Equipos disponibles", "Elige el equipo");
        assert_eq!(selector.ticket, 3);
        assert_eq!(selector.selected().map(|e| e.code()), Some("E1".into()));
    }
}
