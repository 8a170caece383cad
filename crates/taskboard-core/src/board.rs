use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use taskboard_shared::{BoardView, FilterMode, Intent, Priority, TaskDto};
use tracing::{debug, info, instrument, warn};

use crate::datastore::{DataStore, Storage};
use crate::drag::{self, DragState};
use crate::ops;
use crate::task::{Task, contains};
use crate::view;

/// Owns the canonical task list plus the transient UI state around it.
///
/// Every accepted mutation swaps in a whole new list and writes it through to
/// storage before returning. Rejected intents leave both untouched.
#[derive(Debug)]
pub struct Board<S> {
    store: DataStore<S>,
    tasks: Vec<Task>,
    filter: FilterMode,
    multi_select: bool,
    selection: BTreeSet<u64>,
    editing: Option<u64>,
    drag: DragState,
    warning: Option<String>,
}

impl<S: Storage> Board<S> {
    #[instrument(skip(store), fields(key = %store.key()))]
    pub fn open(store: DataStore<S>) -> Self {
        let tasks = store.load_tasks();
        info!(count = tasks.len(), "opened board");
        Self {
            store,
            tasks,
            filter: FilterMode::All,
            multi_select: false,
            selection: BTreeSet::new(),
            editing: None,
            drag: DragState::default(),
            warning: None,
        }
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn filter(&self) -> FilterMode {
        self.filter
    }

    pub fn multi_select(&self) -> bool {
        self.multi_select
    }

    pub fn selection(&self) -> &BTreeSet<u64> {
        &self.selection
    }

    pub fn editing(&self) -> Option<u64> {
        self.editing
    }

    pub fn drag_state(&self) -> DragState {
        self.drag
    }

    /// Error text from the last failed save, cleared by the next good one.
    pub fn warning(&self) -> Option<&str> {
        self.warning.as_deref()
    }

    pub fn projection(&self) -> Vec<&Task> {
        view::project(&self.tasks, self.filter)
    }

    pub fn view(&self) -> BoardView {
        BoardView {
            tasks: self.projection().into_iter().map(TaskDto::from).collect(),
            filter: self.filter,
            multi_select: self.multi_select,
            selected: self.selection.iter().copied().collect(),
            dragged: self.drag.dragged(),
            hovered: self.drag.hovered(),
            editing: self.editing,
            warning: self.warning.clone(),
        }
    }

    #[instrument(skip(self, now))]
    pub fn dispatch(&mut self, intent: Intent, now: DateTime<Utc>) {
        match intent {
            Intent::Add { text } => {
                self.add(&text, now);
            }
            Intent::Toggle { id } => self.toggle(id),
            Intent::Delete { id } => self.delete(id),
            Intent::SetPriority { id, priority } => self.set_priority(id, priority),
            Intent::Rename { id, text } => self.rename(id, &text),
            Intent::ToggleMultiSelect => self.toggle_multi_select(),
            Intent::Select { id } => self.toggle_select(id),
            Intent::BulkDelete => self.bulk_delete(),
            Intent::BulkComplete => self.bulk_set_completed(true),
            Intent::BulkUncomplete => self.bulk_set_completed(false),
            Intent::SetFilter { mode } => self.set_filter(mode),
            Intent::SetEditing { id } => self.set_editing(id),
            Intent::DragStart { id } => self.drag_start(id),
            Intent::DragEnter { id } => self.drag_enter(id),
            Intent::DragLeave { id } => self.drag_leave(id),
            Intent::Drop { id } => self.drop_on(id),
        }
    }

    /// Returns the new task's id, or `None` for blank text or when no id is
    /// left above the largest one.
    pub fn add(&mut self, text: &str, now: DateTime<Utc>) -> Option<u64> {
        let Some(id) = ops::next_id(&self.tasks, now.timestamp_millis()) else {
            warn!("no task id left above the largest existing id");
            return None;
        };
        let next = ops::add(&self.tasks, text, id);
        if self.commit("add", next) {
            Some(id)
        } else {
            None
        }
    }

    pub fn toggle(&mut self, id: u64) {
        let next = ops::toggle(&self.tasks, id);
        self.commit("toggle", next);
    }

    pub fn delete(&mut self, id: u64) {
        let next = ops::delete(&self.tasks, id);
        if self.commit("delete", next) {
            self.selection.remove(&id);
            if self.editing == Some(id) {
                self.editing = None;
            }
        }
    }

    pub fn set_priority(&mut self, id: u64, priority: Priority) {
        let next = ops::set_priority(&self.tasks, id, priority);
        self.commit("set_priority", next);
    }

    pub fn rename(&mut self, id: u64, text: &str) {
        let next = ops::rename(&self.tasks, id, text);
        if self.commit("rename", next) && self.editing == Some(id) {
            self.editing = None;
        }
    }

    /// Leaving multi-select mode drops the selection.
    pub fn toggle_multi_select(&mut self) {
        self.multi_select = !self.multi_select;
        if !self.multi_select {
            self.selection.clear();
        }
        debug!(multi_select = self.multi_select, "toggled multi-select");
    }

    pub fn toggle_select(&mut self, id: u64) {
        if !self.multi_select {
            debug!(id, "select ignored outside multi-select mode");
            return;
        }
        if !contains(&self.tasks, id) {
            debug!(id, "select ignored for unknown task");
            return;
        }
        if !self.selection.remove(&id) {
            self.selection.insert(id);
        }
    }

    pub fn bulk_delete(&mut self) {
        let next = ops::bulk_delete(&self.tasks, &self.selection);
        self.selection.clear();
        if self.commit("bulk_delete", next)
            && let Some(editing) = self.editing
            && !contains(&self.tasks, editing)
        {
            self.editing = None;
        }
    }

    pub fn bulk_set_completed(&mut self, completed: bool) {
        let next = ops::bulk_set_completed(&self.tasks, &self.selection, completed);
        self.selection.clear();
        self.commit("bulk_set_completed", next);
    }

    pub fn set_filter(&mut self, mode: FilterMode) {
        self.filter = mode;
    }

    pub fn set_editing(&mut self, id: Option<u64>) {
        match id {
            Some(id) if !contains(&self.tasks, id) => {
                debug!(id, "edit ignored for unknown task");
            }
            _ => self.editing = id,
        }
    }

    /// A task open in the inline editor cannot be picked up.
    pub fn drag_start(&mut self, id: u64) {
        if self.editing == Some(id) {
            debug!(id, "drag suppressed while editing");
            return;
        }
        self.drag.start(id);
    }

    pub fn drag_enter(&mut self, id: u64) {
        self.drag.enter(id);
    }

    pub fn drag_leave(&mut self, id: u64) {
        self.drag.leave(id);
    }

    pub fn drop_on(&mut self, target: u64) {
        let Some(source) = self.drag.finish() else {
            debug!(target, "drop without an active drag");
            return;
        };
        let next = drag::reorder(&self.tasks, source, target);
        self.commit("drop", next);
    }

    /// Replaces the snapshot and saves it. Returns whether anything changed.
    fn commit(&mut self, op: &'static str, next: Option<Vec<Task>>) -> bool {
        let Some(next) = next else {
            debug!(op, "intent left tasks unchanged");
            return false;
        };

        self.tasks = next;
        match self.store.save_tasks(&self.tasks) {
            Ok(()) => {
                self.warning = None;
            }
            Err(err) => {
                let message = format!("{err:#}");
                warn!(op, error = %message, "tasks were not saved");
                self.warning = Some(message);
            }
        }
        true
    }
}
