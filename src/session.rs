//! Session Store
//!
//! Uploaded files and the latest results of each client session. The store is
//! owned by the caller and shared by reference; sessions never see each other.
use crate::data::{ColumnSummary, Dataset, DatasetOptions};
use crate::errors::{CausalError, DatasetError};
use crate::graph::file::GraphFile;
use crate::result::ResultSet;
use hashbrown::HashMap;
use log::info;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Files and results of one session.
#[derive(Debug, Clone, Default)]
pub struct Session {
    pub data: Option<Vec<u8>>,
    pub options: DatasetOptions,
    pub graph: Option<Vec<u8>>,
    pub results: Option<ResultSet>,
}

/// Thread-safe map from session id to [`Session`].
#[derive(Debug, Default)]
pub struct SessionStore {
    sessions: RwLock<HashMap<String, Session>>,
}

impl SessionStore {
    pub fn new() -> Self {
        SessionStore::default()
    }

    fn read(&self) -> RwLockReadGuard<'_, HashMap<String, Session>> {
        self.sessions.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<String, Session>> {
        self.sessions.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Validate and store a data file, replacing any previous one.
    ///
    /// Previous results are dropped. Returns the column summaries of the file.
    pub fn save_data_file(
        &self,
        session: &str,
        bytes: Vec<u8>,
        options: DatasetOptions,
    ) -> Result<Vec<ColumnSummary>, CausalError> {
        let dataset = Dataset::from_bytes(&bytes, &options)?;
        info!(
            "Session {}: stored data file with {} rows and {} columns.",
            session,
            dataset.nrows(),
            dataset.ncols()
        );
        let mut sessions = self.write();
        let entry = sessions.entry(session.to_string()).or_default();
        entry.data = Some(bytes);
        entry.options = options;
        entry.results = None;
        Ok(dataset.summary())
    }

    /// Validate and store a graph file, replacing any previous one.
    pub fn save_graph_file(&self, session: &str, bytes: Vec<u8>) -> Result<(), CausalError> {
        let file = GraphFile::parse(&bytes)?;
        info!(
            "Session {}: stored graph file with {} nodes and {} edges.",
            session,
            file.nodes.len(),
            file.edges.len()
        );
        self.write().entry(session.to_string()).or_default().graph = Some(bytes);
        Ok(())
    }

    /// The session's data file and the options it was uploaded with.
    pub fn data_file(&self, session: &str) -> Result<(Vec<u8>, DatasetOptions), DatasetError> {
        self.read()
            .get(session)
            .and_then(|s| s.data.clone().map(|data| (data, s.options.clone())))
            .ok_or_else(|| DatasetError::SessionNotFound(session.to_string()))
    }

    pub fn graph_file(&self, session: &str) -> Option<Vec<u8>> {
        self.read().get(session).and_then(|s| s.graph.clone())
    }

    pub fn store_results(&self, session: &str, results: ResultSet) {
        self.write().entry(session.to_string()).or_default().results = Some(results);
    }

    pub fn results(&self, session: &str) -> Option<ResultSet> {
        self.read().get(session).and_then(|s| s.results.clone())
    }

    /// Drop a session, returning whether it existed.
    pub fn remove(&self, session: &str) -> bool {
        self.write().remove(session).is_some()
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }
}
