//! Checkbox selection over a displayed, filterable row set.

use std::collections::BTreeSet;
use std::fmt;

type KeyFn<T, K> = Box<dyn Fn(&T) -> K + Send + Sync>;
type Listener<K> = Box<dyn FnMut(&BTreeSet<K>) + Send>;

/// Row selection with per-row disablement.
///
/// Selected keys are always a subset of the keys of the displayed rows,
/// unless `persist_selections` is enabled. Every change to the selection is
/// reported to the registered listener so owner state stays in sync.
pub struct SelectionSet<T, K: Ord + Clone> {
    key_fn: KeyFn<T, K>,
    data: Vec<T>,
    selected: BTreeSet<K>,
    disabled: BTreeSet<K>,
    persist_selections: bool,
    listener: Option<Listener<K>>,
}

impl<T, K: Ord + Clone> SelectionSet<T, K> {
    pub fn new(key_fn: impl Fn(&T) -> K + Send + Sync + 'static) -> Self {
        Self {
            key_fn: Box::new(key_fn),
            data: Vec::new(),
            selected: BTreeSet::new(),
            disabled: BTreeSet::new(),
            persist_selections: false,
            listener: None,
        }
    }

    /// Keep selected keys across data changes instead of pruning them.
    pub fn persist_selections(mut self, persist: bool) -> Self {
        self.persist_selections = persist;
        self
    }

    /// Register the selection setter of the owning view.
    pub fn on_selection_change(mut self, listener: impl FnMut(&BTreeSet<K>) + Send + 'static) -> Self {
        self.listener = Some(Box::new(listener));
        self
    }

    pub fn with_data(mut self, data: Vec<T>) -> Self {
        self.set_data(data);
        self
    }

    pub fn data(&self) -> &[T] {
        &self.data
    }

    pub fn key_of(&self, item: &T) -> K {
        (self.key_fn)(item)
    }

    pub fn selected_keys(&self) -> &BTreeSet<K> {
        &self.selected
    }

    /// Selected rows in display order.
    pub fn selected_items(&self) -> Vec<&T> {
        self.data
            .iter()
            .filter(|item| self.selected.contains(&self.key_of(item)))
            .collect()
    }

    /// Replace the displayed rows. Disabled marks of rows that are no longer
    /// displayed are dropped. Without `persist_selections`, selected keys
    /// that are no longer displayed are dropped too.
    pub fn set_data(&mut self, data: Vec<T>) {
        self.data = data;
        let present = self.present_keys();
        self.disabled.retain(|k| present.contains(k));
        if self.persist_selections {
            return;
        }
        let before = self.selected.len();
        self.selected.retain(|k| present.contains(k));
        if self.selected.len() != before {
            tracing::debug!(
                pruned = before - self.selected.len(),
                "Pruned selections no longer displayed"
            );
            self.notify();
        }
    }

    pub fn is_selected(&self, item: &T) -> bool {
        self.selected.contains(&self.key_of(item))
    }

    pub fn toggle_selection(&mut self, item: &T) {
        let selected = self.is_selected(item);
        self.set_selected(item, !selected);
    }

    pub fn set_selected(&mut self, item: &T, selected: bool) {
        let key = self.key_of(item);
        let changed = if selected {
            if !self.persist_selections && !self.present_keys().contains(&key) {
                tracing::debug!("Ignoring selection of a row that is not displayed");
                return;
            }
            self.selected.insert(key)
        } else {
            self.selected.remove(&key)
        };
        if changed {
            self.notify();
        }
    }

    /// Replace the whole selection; keys not displayed are dropped unless
    /// selections persist.
    pub fn set_selections(&mut self, keys: impl IntoIterator<Item = K>) {
        let present = self.present_keys();
        let persist = self.persist_selections;
        let next: BTreeSet<K> = keys
            .into_iter()
            .filter(|k| persist || present.contains(k))
            .collect();
        if next != self.selected {
            self.selected = next;
            self.notify();
        }
    }

    pub fn clear_selection(&mut self) {
        if !self.selected.is_empty() {
            self.selected.clear();
            self.notify();
        }
    }

    pub fn disable_check(&mut self, item: &T, disabled: bool) {
        let key = self.key_of(item);
        if disabled {
            self.disabled.insert(key);
        } else {
            self.disabled.remove(&key);
        }
    }

    pub fn is_disabled(&self, item: &T) -> bool {
        self.disabled.contains(&self.key_of(item))
    }

    /// Keys of displayed rows that are not disabled.
    pub fn checkable_keys(&self) -> BTreeSet<K> {
        self.data
            .iter()
            .map(|item| self.key_of(item))
            .filter(|k| !self.disabled.contains(k))
            .collect()
    }

    /// Header checkbox state: every checkable row selected and nothing else.
    pub fn header_selected(&self) -> bool {
        let checkable = self.checkable_keys();
        !checkable.is_empty() && checkable == self.selected
    }

    /// Header checkbox click: select every checkable row, or none.
    pub fn toggle_header(&mut self) {
        if self.header_selected() {
            self.clear_selection();
        } else {
            let checkable = self.checkable_keys();
            self.set_selections(checkable);
        }
    }

    fn present_keys(&self) -> BTreeSet<K> {
        self.data.iter().map(|item| self.key_of(item)).collect()
    }

    fn notify(&mut self) {
        if let Some(listener) = self.listener.as_mut() {
            listener(&self.selected);
        }
    }
}

impl<T, K: Ord + Clone + fmt::Debug> fmt::Debug for SelectionSet<T, K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SelectionSet")
            .field("rows", &self.data.len())
            .field("selected", &self.selected)
            .field("disabled", &self.disabled)
            .field("persist_selections", &self.persist_selections)
            .finish()
    }
}
