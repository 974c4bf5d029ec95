//! An in-memory task store, optionally mirrored to a local JSON file
//!
//! This is the store the test suite runs against. It can also back an offline or
//! demo build of the app, which is why it lives in the crate proper rather than
//! in the tests.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::mock_behaviour::MockBehaviour;
use crate::store::{sort_by_due_date, StoreError, TaskFilter, TaskStore};
use crate::task::{NewTask, Task, TaskId, TaskPatch};

/// How many times each store operation was invoked.
///
/// Tests use this to prove that purely local operations (e.g. changing the
/// selected calendar date) never reach for the store.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CallCounts {
    pub select: u32,
    pub select_by_id: u32,
    pub insert: u32,
    pub update: u32,
    pub delete: u32,
}

#[derive(Default, Debug, Serialize, Deserialize)]
struct StoredData {
    tasks: HashMap<TaskId, Task>,
}

struct Inner {
    data: StoredData,
    calls: CallCounts,
}

/// A task store that keeps its rows in memory
pub struct MemoryStore {
    inner: Mutex<Inner>,
    backing_file: Option<PathBuf>,
    owner: Option<Uuid>,
    mock_behaviour: Option<Arc<Mutex<MockBehaviour>>>,
}

impl MemoryStore {
    /// Create an empty store with no backing file
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner {
                data: StoredData::default(),
                calls: CallCounts::default(),
            }),
            backing_file: None,
            owner: None,
            mock_behaviour: None,
        }
    }

    /// Initialize a store from the content of a valid backing file if it exists.
    /// Returns an error otherwise
    pub fn from_file(path: &Path) -> Result<Self, std::io::Error> {
        let file = std::fs::File::open(path)?;
        let data: StoredData = serde_json::from_reader(file)
            .map_err(|err| std::io::Error::new(std::io::ErrorKind::InvalidData, err))?;

        Ok(Self {
            inner: Mutex::new(Inner {
                data,
                calls: CallCounts::default(),
            }),
            backing_file: Some(PathBuf::from(path)),
            owner: None,
            mock_behaviour: None,
        })
    }

    /// Mirror every change to this file from now on
    pub fn set_backing_file(&mut self, path: PathBuf) {
        self.backing_file = Some(path);
    }

    /// Stamp rows created through this store with this owner id
    pub fn set_owner(&mut self, owner: Uuid) {
        self.owner = Some(owner);
    }

    pub fn set_mock_behaviour(&mut self, behaviour: Option<Arc<Mutex<MockBehaviour>>>) {
        self.mock_behaviour = behaviour;
    }

    /// Put a row in the store directly, bypassing call counters and scripted
    /// failures. Meant for populating fixtures.
    pub fn put(&self, task: Task) {
        let mut inner = self.inner.lock().unwrap();
        inner.data.tasks.insert(*task.id(), task);
        drop(inner);
        self.save_to_file();
    }

    /// The per-operation call counters accumulated so far
    pub fn call_counts(&self) -> CallCounts {
        self.inner.lock().unwrap().calls
    }

    pub fn len(&self) -> usize {
        self.inner.lock().unwrap().data.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Store the current rows to the backing file, if one is set
    fn save_to_file(&self) {
        let path = match &self.backing_file {
            None => return,
            Some(p) => p,
        };

        let file = match std::fs::File::create(path) {
            Err(err) => {
                log::warn!("Unable to save file {:?}: {}", path, err);
                return;
            }
            Ok(f) => f,
        };

        let inner = self.inner.lock().unwrap();
        if let Err(err) = serde_json::to_writer(file, &inner.data) {
            log::warn!("Unable to serialize: {}", err);
        }
    }

    fn check(
        &self,
        check_op: impl FnOnce(&mut MockBehaviour) -> Result<(), StoreError>,
    ) -> Result<(), StoreError> {
        match &self.mock_behaviour {
            None => Ok(()),
            Some(behaviour) => check_op(&mut behaviour.lock().unwrap()),
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TaskStore for MemoryStore {
    async fn select(&self, filter: &TaskFilter) -> Result<Vec<Task>, StoreError> {
        self.inner.lock().unwrap().calls.select += 1;
        self.check(|b| b.can_select())?;

        let inner = self.inner.lock().unwrap();
        let mut tasks: Vec<Task> = inner
            .data
            .tasks
            .values()
            .filter(|task| filter.matches(task))
            .cloned()
            .collect();
        drop(inner);

        sort_by_due_date(&mut tasks, filter.order());
        Ok(tasks)
    }

    async fn select_by_id(&self, id: &TaskId) -> Result<Task, StoreError> {
        self.inner.lock().unwrap().calls.select_by_id += 1;
        self.check(|b| b.can_select_by_id())?;

        let inner = self.inner.lock().unwrap();
        inner
            .data
            .tasks
            .get(id)
            .cloned()
            .ok_or(StoreError::NotFound(*id))
    }

    async fn insert(&self, new: NewTask) -> Result<Task, StoreError> {
        self.inner.lock().unwrap().calls.insert += 1;
        self.check(|b| b.can_insert())?;

        let task = new.into_task(TaskId::random(), self.owner);
        let mut inner = self.inner.lock().unwrap();
        inner.data.tasks.insert(*task.id(), task.clone());
        drop(inner);

        self.save_to_file();
        Ok(task)
    }

    async fn update(&self, id: &TaskId, patch: TaskPatch) -> Result<(), StoreError> {
        self.inner.lock().unwrap().calls.update += 1;
        self.check(|b| b.can_update())?;

        let mut inner = self.inner.lock().unwrap();
        match inner.data.tasks.get_mut(id) {
            None => return Err(StoreError::NotFound(*id)),
            Some(task) => patch.apply_to(task),
        }
        drop(inner);

        self.save_to_file();
        Ok(())
    }

    async fn delete(&self, id: &TaskId) -> Result<(), StoreError> {
        self.inner.lock().unwrap().calls.delete += 1;
        self.check(|b| b.can_delete())?;

        let mut inner = self.inner.lock().unwrap();
        if inner.data.tasks.remove(id).is_none() {
            return Err(StoreError::NotFound(*id));
        }
        drop(inner);

        self.save_to_file();
        Ok(())
    }
}
