use std::collections::HashMap;
use std::fmt;

use axum::body::Bytes;
use parking_lot::RwLock;

// ─── Key ─────────────────────────────────────────────────────────

/// Identifies one scrape target: Prometheus `job` + `instance`.
///
/// Both parts are kept as separate fields, so `("a:b", "c")` and `("a", "b:c")`
/// are different keys.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SnapshotKey {
    pub job: String,
    pub instance: String,
}

impl SnapshotKey {
    pub fn new(job: impl Into<String>, instance: impl Into<String>) -> Self {
        Self {
            job: job.into(),
            instance: instance.into(),
        }
    }
}

impl fmt::Display for SnapshotKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.job, self.instance)
    }
}

// ─── Store ───────────────────────────────────────────────────────

/// Latest metrics payload per target, shared by the ingress and egress listeners.
///
/// Entries are overwritten on every push and never expire. Payloads are
/// immutable `Bytes`; a reader gets either nothing or a whole previous payload.
#[derive(Default)]
pub struct SnapshotStore {
    inner: RwLock<HashMap<SnapshotKey, Bytes>>,
}

impl SnapshotStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces whatever was stored for `key`.
    pub fn put(&self, key: SnapshotKey, payload: Bytes) {
        self.inner.write().insert(key, payload);
    }

    pub fn get(&self, key: &SnapshotKey) -> Option<Bytes> {
        self.inner.read().get(key).cloned()
    }

    pub fn len(&self) -> usize {
        self.inner.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.read().is_empty()
    }
}
