use itertools::Itertools;
use parking_lot::{Mutex, RwLock};
use serde::Serialize;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::logic::merge::{deep_merge, set_path, MergeError};
use crate::model::{generate_id, Id, SectionType};

#[derive(Debug, thiserror::Error)]
pub enum EditorError {
    #[error("editor session '{0}' not found")]
    SessionNotFound(Id),
    #[error("no live state for {section_type} '{instance_id}'")]
    ComponentNotSeeded {
        section_type: SectionType,
        instance_id: Id,
    },
    #[error(transparent)]
    Path(#[from] MergeError),
}

/// What `ensure_component_variant` did
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EnsureOutcome {
    /// No slice existed; it was seeded with the initial data
    Created,
    /// A slice existed and was left as is
    Existing,
    /// An untouched slice was replaced by newer initial data
    Reseeded,
    /// An edited slice was rebuilt on newer initial data; its edits were kept
    Rebased,
}

#[derive(Debug, Clone)]
struct Slice {
    /// Initial data with the edits applied
    data: Value,
    /// Only the fields the user wrote
    edits: Value,
    /// Set once the user edits the slice; touched slices are never reseeded
    touched: bool,
    /// Edited since the last save
    dirty: bool,
}

impl Slice {
    fn seeded(data: Value) -> Self {
        Self {
            data,
            edits: json!({}),
            touched: false,
            dirty: false,
        }
    }

    fn snapshot(&self, section_type: SectionType, instance_id: &str) -> SliceSnapshot {
        SliceSnapshot {
            section_type,
            instance_id: instance_id.to_string(),
            data: self.data.clone(),
            edits: self.edits.clone(),
            touched: self.touched,
            dirty: self.dirty,
        }
    }
}

/// Current state of one slice as seen by API callers
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SliceSnapshot {
    pub section_type: SectionType,
    pub instance_id: Id,
    pub data: Value,
    pub edits: Value,
    pub touched: bool,
    pub dirty: bool,
}

type SliceKey = (SectionType, Id);

/// Unsaved edits of one live-editor session, one slice per component instance
#[derive(Debug)]
pub struct EditorLiveStore {
    slices: RwLock<HashMap<SliceKey, Slice>>,
    last_accessed: Mutex<Instant>,
}

impl Default for EditorLiveStore {
    fn default() -> Self {
        Self::new()
    }
}

impl EditorLiveStore {
    pub fn new() -> Self {
        Self {
            slices: RwLock::new(HashMap::new()),
            last_accessed: Mutex::new(Instant::now()),
        }
    }

    fn touch_session(&self) {
        *self.last_accessed.lock() = Instant::now();
    }

    fn idle_for(&self) -> Duration {
        self.last_accessed.lock().elapsed()
    }

    /// Seed the slice for an instance if it has none.
    ///
    /// Runs as one write. An untouched slice is replaced when the initial data
    /// differs; an edited slice is rebuilt as the initial data with its edits
    /// on top, so edits are never lost.
    pub fn ensure_component_variant(
        &self,
        section_type: SectionType,
        instance_id: &str,
        initial_data: Value,
    ) -> EnsureOutcome {
        self.touch_session();
        let mut slices = self.slices.write();
        match slices.get_mut(&(section_type, instance_id.to_string())) {
            None => {
                slices.insert((section_type, instance_id.to_string()), Slice::seeded(initial_data));
                EnsureOutcome::Created
            }
            Some(slice) if !slice.touched => {
                if slice.data == initial_data {
                    EnsureOutcome::Existing
                } else {
                    slice.data = initial_data;
                    EnsureOutcome::Reseeded
                }
            }
            Some(slice) => {
                let mut rebased = initial_data;
                deep_merge(&mut rebased, &slice.edits);
                if slice.data == rebased {
                    EnsureOutcome::Existing
                } else {
                    slice.data = rebased;
                    EnsureOutcome::Rebased
                }
            }
        }
    }

    pub fn get_component_data(&self, section_type: SectionType, instance_id: &str) -> Option<Value> {
        self.touch_session();
        self.slices
            .read()
            .get(&(section_type, instance_id.to_string()))
            .map(|slice| slice.data.clone())
    }

    /// Fields the user wrote to the slice; `None` while it is untouched
    pub fn edited_fields(&self, section_type: SectionType, instance_id: &str) -> Option<Value> {
        self.touch_session();
        self.slices
            .read()
            .get(&(section_type, instance_id.to_string()))
            .filter(|slice| slice.touched)
            .map(|slice| slice.edits.clone())
    }

    pub fn snapshot(&self, section_type: SectionType, instance_id: &str) -> Option<SliceSnapshot> {
        self.touch_session();
        self.slices
            .read()
            .get(&(section_type, instance_id.to_string()))
            .map(|slice| slice.snapshot(section_type, instance_id))
    }

    /// Write one field of a seeded slice, e.g. `colors.title.value`
    pub fn update_field(
        &self,
        section_type: SectionType,
        instance_id: &str,
        path: &str,
        value: Value,
    ) -> Result<Value, EditorError> {
        self.touch_session();
        let mut slices = self.slices.write();
        let slice = slices
            .get_mut(&(section_type, instance_id.to_string()))
            .ok_or_else(|| EditorError::ComponentNotSeeded {
                section_type,
                instance_id: instance_id.to_string(),
            })?;

        set_path(&mut slice.data, path, value.clone())?;
        set_path(&mut slice.edits, path, value)?;
        slice.touched = true;
        slice.dirty = true;
        Ok(slice.data.clone())
    }

    /// Replace a slice wholesale; counts as a user edit
    pub fn replace_component_data(&self, section_type: SectionType, instance_id: &str, data: Value) {
        self.touch_session();
        self.slices.write().insert(
            (section_type, instance_id.to_string()),
            Slice {
                edits: data.clone(),
                data,
                touched: true,
                dirty: true,
            },
        );
    }

    pub fn remove_component(&self, section_type: SectionType, instance_id: &str) -> bool {
        self.touch_session();
        self.slices
            .write()
            .remove(&(section_type, instance_id.to_string()))
            .is_some()
    }

    /// True when the slice was never edited and still equals `defaults`
    pub fn is_pristine(&self, section_type: SectionType, instance_id: &str, defaults: &Value) -> bool {
        self.slices
            .read()
            .get(&(section_type, instance_id.to_string()))
            .map(|slice| !slice.touched && &slice.data == defaults)
            .unwrap_or(false)
    }

    /// Slices edited since they were last marked clean, ordered by type and id
    pub fn dirty_components(&self) -> Vec<SliceSnapshot> {
        self.slices
            .read()
            .iter()
            .filter(|(_, slice)| slice.dirty)
            .map(|((section_type, instance_id), slice)| slice.snapshot(*section_type, instance_id))
            .sorted_by(|a, b| {
                (a.section_type, &a.instance_id).cmp(&(b.section_type, &b.instance_id))
            })
            .collect()
    }

    pub fn mark_clean(&self, section_type: SectionType, instance_id: &str) {
        if let Some(slice) = self
            .slices
            .write()
            .get_mut(&(section_type, instance_id.to_string()))
        {
            slice.dirty = false;
        }
    }

    pub fn len(&self) -> usize {
        self.slices.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Live-editor sessions with idle expiry
#[derive(Debug)]
pub struct EditorSessions {
    sessions: RwLock<HashMap<Id, Arc<EditorLiveStore>>>,
    ttl: Duration,
}

impl EditorSessions {
    pub fn new(ttl: Duration) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            ttl,
        }
    }

    pub fn create(&self) -> (Id, Arc<EditorLiveStore>) {
        let id = generate_id();
        let store = Arc::new(EditorLiveStore::new());
        self.sessions.write().insert(id.clone(), store.clone());
        log::debug!("editor session '{}' created", id);
        (id, store)
    }

    /// Look up a session; an expired session is dropped and reported missing
    pub fn get(&self, id: &str) -> Option<Arc<EditorLiveStore>> {
        let store = self.sessions.read().get(id).cloned()?;
        if store.idle_for() > self.ttl {
            self.sessions.write().remove(id);
            log::debug!("editor session '{}' expired", id);
            return None;
        }
        Some(store)
    }

    pub fn require(&self, id: &str) -> Result<Arc<EditorLiveStore>, EditorError> {
        self.get(id)
            .ok_or_else(|| EditorError::SessionNotFound(id.to_string()))
    }

    pub fn teardown(&self, id: &str) -> bool {
        let removed = self.sessions.write().remove(id).is_some();
        if removed {
            log::debug!("editor session '{}' torn down", id);
        }
        removed
    }

    /// Drop every idle session; returns how many were removed
    pub fn clear_expired(&self) -> usize {
        let mut sessions = self.sessions.write();
        let before = sessions.len();
        sessions.retain(|_, store| store.idle_for() <= self.ttl);
        before - sessions.len()
    }

    pub fn len(&self) -> usize {
        self.sessions.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
