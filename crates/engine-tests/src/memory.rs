use async_trait::async_trait;
use engine_core::{
    connectors::{source::SourceStore, target::TargetStore},
    error::StoreError,
    shutdown::ShutdownHandle,
};
use model::{
    pagination::cursor::Cursor,
    records::{
        SourceRecord, TargetRecord,
        key::NaturalKey,
        target::{NewResume, NewUser},
    },
};
use std::{
    collections::{HashMap, HashSet},
    sync::Mutex,
};

/// In-memory legacy table that pages the same way the Postgres source does:
/// newest first, strictly below the cursor.
pub struct MemorySource<R: SourceRecord> {
    rows: Mutex<Vec<R>>,
    cursors: Mutex<Vec<Option<Cursor>>>,
    shutdown_after: Option<(usize, ShutdownHandle)>,
    fail_on_fetch: Option<usize>,
}

impl<R: SourceRecord> MemorySource<R> {
    pub fn new(rows: Vec<R>) -> Self {
        Self {
            rows: Mutex::new(rows),
            cursors: Mutex::new(Vec::new()),
            shutdown_after: None,
            fail_on_fetch: None,
        }
    }

    /// Requests shutdown while serving the `pages`-th fetch, so exactly that
    /// many batches are processed before the run pauses.
    pub fn shutdown_after(mut self, pages: usize, handle: ShutdownHandle) -> Self {
        self.shutdown_after = Some((pages, handle));
        self
    }

    /// Fails the `call`-th fetch (1-based).
    pub fn fail_on_fetch(mut self, call: usize) -> Self {
        self.fail_on_fetch = Some(call);
        self
    }

    pub fn push(&self, row: R) {
        self.rows.lock().unwrap().push(row);
    }

    /// Cursor argument of every fetch, in call order.
    pub fn cursors_seen(&self) -> Vec<Option<Cursor>> {
        self.cursors.lock().unwrap().clone()
    }

    pub fn fetches(&self) -> usize {
        self.cursors.lock().unwrap().len()
    }
}

#[async_trait]
impl<R: SourceRecord> SourceStore<R> for MemorySource<R> {
    async fn fetch_page(
        &self,
        cursor: Option<&Cursor>,
        limit: usize,
    ) -> Result<Vec<R>, StoreError> {
        let call = {
            let mut cursors = self.cursors.lock().unwrap();
            cursors.push(cursor.cloned());
            cursors.len()
        };
        if self.fail_on_fetch == Some(call) {
            return Err(StoreError::Query("source unavailable".into()));
        }

        let mut rows: Vec<R> = self
            .rows
            .lock()
            .unwrap()
            .iter()
            .filter(|row| cursor.is_none_or(|c| c.precedes(&row.cursor())))
            .cloned()
            .collect();
        rows.sort_by_key(|row| std::cmp::Reverse(row.cursor()));
        rows.truncate(limit);

        if let Some((pages, handle)) = &self.shutdown_after
            && *pages == call
        {
            handle.request();
        }
        Ok(rows)
    }
}

/// Natural keys a stored target row occupies.
pub trait Keyed {
    fn keys(&self) -> Vec<NaturalKey>;
}

impl Keyed for NewUser {
    fn keys(&self) -> Vec<NaturalKey> {
        vec![
            NaturalKey::Email(self.email.clone()),
            NaturalKey::Username(self.username.clone()),
            NaturalKey::DisplayUsername(self.display_username.clone()),
        ]
    }
}

impl Keyed for NewResume {
    fn keys(&self) -> Vec<NaturalKey> {
        vec![NaturalKey::Slug {
            slug: self.slug.clone(),
            user_id: self.user_id.clone(),
        }]
    }
}

struct TargetState<T> {
    rows: Vec<T>,
    seeded: HashMap<NaturalKey, String>,
    dependents: usize,
    insert_calls: usize,
    chunk_sizes: Vec<usize>,
    existence_calls: usize,
}

/// In-memory new store with unique natural keys and failure injection.
pub struct MemoryTarget<T: TargetRecord + Keyed> {
    state: Mutex<TargetState<T>>,
    fail_inserts: HashSet<usize>,
    fail_dependents: bool,
    fail_existence: bool,
}

impl<T: TargetRecord + Keyed> Default for MemoryTarget<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: TargetRecord + Keyed> MemoryTarget<T> {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(TargetState {
                rows: Vec::new(),
                seeded: HashMap::new(),
                dependents: 0,
                insert_calls: 0,
                chunk_sizes: Vec::new(),
                existence_calls: 0,
            }),
            fail_inserts: HashSet::new(),
            fail_dependents: false,
            fail_existence: false,
        }
    }

    /// Rejects the `call`-th insert (1-based) without storing anything.
    pub fn fail_insert(mut self, call: usize) -> Self {
        self.fail_inserts.insert(call);
        self
    }

    pub fn fail_dependents(mut self) -> Self {
        self.fail_dependents = true;
        self
    }

    pub fn fail_existence(mut self) -> Self {
        self.fail_existence = true;
        self
    }

    /// A record that was already in the new store before the migration.
    pub fn seed(&self, id: &str, keys: Vec<NaturalKey>) {
        let mut state = self.state.lock().unwrap();
        for key in keys {
            state.seeded.insert(key, id.to_string());
        }
    }

    pub fn rows(&self) -> Vec<T> {
        self.state.lock().unwrap().rows.clone()
    }

    pub fn len(&self) -> usize {
        self.state.lock().unwrap().rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn dependents(&self) -> usize {
        self.state.lock().unwrap().dependents
    }

    pub fn chunk_sizes(&self) -> Vec<usize> {
        self.state.lock().unwrap().chunk_sizes.clone()
    }

    pub fn existence_calls(&self) -> usize {
        self.state.lock().unwrap().existence_calls
    }
}

impl<T: TargetRecord + Keyed> TargetState<T> {
    fn owner_of(&self, key: &NaturalKey) -> Option<String> {
        if let Some(id) = self.seeded.get(key) {
            return Some(id.clone());
        }
        self.rows
            .iter()
            .find(|row| row.keys().contains(key))
            .map(|row| row.id().to_string())
    }
}

#[async_trait]
impl<T: TargetRecord + Keyed> TargetStore<T> for MemoryTarget<T> {
    async fn find_existing(
        &self,
        keys: &[NaturalKey],
    ) -> Result<HashMap<NaturalKey, String>, StoreError> {
        let mut state = self.state.lock().unwrap();
        state.existence_calls += 1;
        if self.fail_existence {
            return Err(StoreError::Query("existence lookup timed out".into()));
        }
        Ok(keys
            .iter()
            .filter_map(|key| state.owner_of(key).map(|id| (key.clone(), id)))
            .collect())
    }

    async fn insert(&self, rows: &[T]) -> Result<(), StoreError> {
        let mut state = self.state.lock().unwrap();
        state.insert_calls += 1;
        if self.fail_inserts.contains(&state.insert_calls) {
            return Err(StoreError::Write("constraint violation".into()));
        }
        for row in rows {
            if let Some(key) = row.keys().iter().find(|k| state.owner_of(k).is_some()) {
                return Err(StoreError::Write(format!("duplicate key {key}")));
            }
        }
        state.chunk_sizes.push(rows.len());
        state.rows.extend_from_slice(rows);
        Ok(())
    }

    async fn insert_dependents(&self, rows: &[T]) -> Result<usize, StoreError> {
        if self.fail_dependents {
            return Err(StoreError::Write("dependent table missing".into()));
        }
        self.state.lock().unwrap().dependents += rows.len();
        Ok(rows.len())
    }
}
