use liga_api::Entity;

/// Single-choice picker over a remote collection.
///
/// The collection is fetched fresh for every presentation; `ticket` ties the
/// fetch response to this presentation so a late answer for a selector that
/// was already closed is dropped instead of applied.
#[derive(Debug, Clone)]
pub struct EntitySelector<T> {
    pub ticket: u64,
    pub header: String,
    pub subtitle: String,
    items: Vec<T>,
    loading: bool,
    cursor: usize,
    selected: Option<T>,
}

impl<T: Entity> EntitySelector<T> {
    pub fn open(
        ticket: u64,
        header: impl Into<String>,
        subtitle: impl Into<String>,
        preselected: Option<T>,
    ) -> Self {
        Self {
            ticket,
            header: header.into(),
            subtitle: subtitle.into(),
            items: Vec::new(),
            loading: true,
            cursor: 0,
            selected: preselected,
        }
    }

    /// Store the fetched collection and put the cursor on the preselected item.
    /// A preselection missing from the collection is dropped.
    pub fn load(&mut self, items: Vec<T>) {
        self.loading = false;
        let position = self
            .selected
            .as_ref()
            .map(Entity::code)
            .and_then(|code| items.iter().position(|i| i.code() == code));
        if position.is_none() {
            self.selected = None;
        }
        self.cursor = position.unwrap_or(0);
        self.items = items;
    }

    /// A failed fetch leaves an empty collection; nothing further can be picked.
    pub fn fail(&mut self) {
        self.loading = false;
        self.items.clear();
        self.selected = None;
        self.cursor = 0;
    }

    pub fn items(&self) -> &[T] {
        &self.items
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn selected(&self) -> Option<&T> {
        self.selected.as_ref()
    }

    pub fn is_selected(&self, item: &T) -> bool {
        self.selected
            .as_ref()
            .is_some_and(|s| s.code() == item.code())
    }

    /// Tapping the selected item clears it; tapping another replaces it.
    pub fn toggle(&mut self, item: &T) {
        if self.is_selected(item) {
            self.selected = None;
        } else {
            self.selected = Some(item.clone());
        }
    }

    pub fn toggle_at_cursor(&mut self) {
        if let Some(item) = self.items.get(self.cursor).cloned() {
            self.toggle(&item);
        }
    }

    pub fn cursor_down(&mut self) {
        if self.cursor + 1 < self.items.len() {
            self.cursor += 1;
        }
    }

    pub fn cursor_up(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    pub fn can_accept(&self) -> bool {
        self.selected.is_some()
    }

    /// The chosen entity, or `None` while nothing is selected (the selector stays open).
    pub fn accept(&self) -> Option<T> {
        self.selected.clone()
    }

    /// Close without a choice; the pending selection is discarded.
    pub fn cancel(self) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use liga_api::Ciudad;

    fn ciudad(code: &str, name: &str) -> Ciudad {
        Ciudad { cod_ciudad: code.into(), nombre: name.into() }
    }

    fn loaded() -> EntitySelector<Ciudad> {
        let mut selector = EntitySelector::open(1, "Ciudades disponibles", "Elige la ciudad", None);
        selector.load(vec![ciudad("1", "Bogotá"), ciudad("2", "Medellín")]);
        selector
    }

    #[test]
    fn toggling_the_selected_item_clears_it() {
        let mut selector = loaded();
        let bogota = ciudad("1", "Bogotá");
        selector.toggle(&bogota);
        assert!(selector.is_selected(&bogota));
        selector.toggle(&bogota);
        assert!(selector.selected().is_none());
    }

    #[test]
    fn selecting_another_item_replaces_the_selection() {
        let mut selector = loaded();
        selector.toggle(&ciudad("1", "Bogotá"));
        selector.toggle(&ciudad("2", "Medellín"));
        let selected_count = selector.items().iter().filter(|c| selector.is_selected(c)).count();
        assert_eq!(selected_count, 1);
        assert_eq!(selector.selected().map(|c| c.code()), Some("2".into()));
    }

    #[test]
    fn accept_is_a_no_op_without_selection() {
        let selector = loaded();
        assert!(!selector.can_accept());
        assert!(selector.accept().is_none());
    }

    #[test]
    fn accept_returns_the_chosen_entity() {
        let mut selector = loaded();
        selector.cursor_down();
        selector.toggle_at_cursor();
        assert_eq!(selector.accept(), Some(ciudad("2", "Medellín")));
    }

    #[test]
    fn preselection_seeds_selection_and_cursor() {
        let mut selector =
            EntitySelector::open(7, "Ciudades", "", Some(ciudad("2", "Medellín")));
        assert!(selector.is_loading());
        selector.load(vec![ciudad("1", "Bogotá"), ciudad("2", "Medellín")]);
        assert_eq!(selector.cursor(), 1);
        assert!(selector.can_accept());
    }

    #[test]
    fn preselection_missing_from_the_collection_is_dropped() {
        let mut selector =
            EntitySelector::open(7, "Ciudades", "", Some(ciudad("9", "Pasto")));
        selector.load(vec![ciudad("1", "Bogotá"), ciudad("2", "Medellín")]);
        assert_eq!(selector.cursor(), 0);
        assert!(!selector.can_accept());
        assert!(selector.accept().is_none());
    }

    #[test]
    fn failed_fetch_discards_the_preselection() {
        let mut selector =
            EntitySelector::open(7, "Ciudades", "", Some(ciudad("2", "Medellín")));
        selector.fail();
        assert!(!selector.is_loading());
        assert!(!selector.can_accept());
        assert!(selector.accept().is_none());
    }

    #[test]
    fn failed_fetch_degrades_to_empty_list() {
        let mut selector = loaded();
        selector.fail();
        assert!(selector.items().is_empty());
        selector.toggle_at_cursor();
        assert!(selector.selected().is_none());
    }
}
