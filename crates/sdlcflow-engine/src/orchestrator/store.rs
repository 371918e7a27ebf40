//! In-memory session store
//!
//! Maps workflow ids to their last committed snapshot. Each session carries an async
//! operation lock; mutating operations hold it across read, run and commit so that
//! operations on one id are serialized while distinct ids never contend.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use tokio::sync::{Mutex, MutexGuard};

use sdlcflow_phase_api::WorkflowState;

#[derive(Debug)]
pub(crate) struct Session {
    op_lock: Mutex<()>,
    committed: RwLock<WorkflowState>,
}

impl Session {
    fn new(state: WorkflowState) -> Self {
        Self {
            op_lock: Mutex::new(()),
            committed: RwLock::new(state),
        }
    }

    /// Wait for exclusive use of this session.
    pub(crate) async fn lock(&self) -> MutexGuard<'_, ()> {
        self.op_lock.lock().await
    }

    /// Independent copy of the committed snapshot.
    pub(crate) fn snapshot(&self) -> WorkflowState {
        self.committed
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Replace the committed snapshot. Callers hold the operation lock.
    pub(crate) fn commit(&self, state: WorkflowState) {
        *self
            .committed
            .write()
            .unwrap_or_else(PoisonError::into_inner) = state;
    }
}

#[derive(Debug, Default)]
pub(crate) struct SessionStore {
    sessions: RwLock<HashMap<String, Arc<Session>>>,
}

impl SessionStore {
    pub(crate) fn insert(&self, state: WorkflowState) {
        let id = state.workflow_id.clone();
        self.sessions
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(id, Arc::new(Session::new(state)));
    }

    pub(crate) fn get(&self, workflow_id: &str) -> Option<Arc<Session>> {
        self.sessions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(workflow_id)
            .cloned()
    }

    pub(crate) fn len(&self) -> usize {
        self.sessions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}
