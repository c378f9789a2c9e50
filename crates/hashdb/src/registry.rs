//! The set of loaded databases and the uuid uniqueness rule across them.
//!
//! Admission is the only way to change a [`Registry`], and it takes
//! `&mut self`: the load phase is sequential by construction and has to
//! finish before the registry is shared (read-only) with evaluators.

use crate::column::Column;
use crate::error::{Error, ErrorKind, Result};
use crate::handle::Handle;
use futures::StreamExt;
use othd_probe::AlgorithmSet;
use serde::Serialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::instrument;
use uuid::Uuid;

/// One of the databases involved in a uuid conflict.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ConflictMember {
    pub path: PathBuf,
    pub name: String,
}
impl From<&Handle> for ConflictMember {
    fn from(handle: &Handle) -> Self {
        Self { path: handle.path().to_path_buf(), name: handle.name().to_string() }
    }
}

/// A uuid carried by two or more candidates. None of them is ever queried.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Conflict {
    pub uuid: Uuid,
    pub members: Vec<ConflictMember>,
}
impl Conflict {
    pub fn paths(&self) -> Vec<PathBuf> {
        self.members.iter().map(|m| m.path.clone()).collect()
    }
}

/// Union of the digest algorithms the given databases index.
///
/// This bounds the hashing work for any probe: no digest outside this set is
/// ever useful.
pub fn required_hashes<'a>(handles: impl IntoIterator<Item = &'a Handle>) -> AlgorithmSet {
    handles.into_iter().fold(AlgorithmSet::empty(), |acc, handle| acc.union(handle.algorithms()))
}

/// All admitted databases, keyed by uuid, plus the poisoned uuids.
#[derive(Debug, Default)]
pub struct Registry {
    handles: HashMap<Uuid, Handle>,
    conflicts: HashMap<Uuid, Conflict>,
    /// Live handles in evaluation order: databases with a size column first
    /// (they can reject a probe without hashing), then by uuid.
    order: Vec<Uuid>,
    required: AlgorithmSet,
    max_connections: Option<u32>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Size of each database's read-only connection pool.
    pub fn with_max_connections(mut self, max_connections: u32) -> Self {
        self.max_connections = Some(max_connections);
        self
    }

    /// Open, validate and admit the candidate database at `path`.
    ///
    /// On a uuid collision **both** databases become unusable: the new one is
    /// never admitted, the previously admitted one is withdrawn, and the uuid
    /// is poisoned for any later candidate too. The error names every path
    /// that carried the uuid.
    #[instrument(level = "debug", skip_all, fields(path = %path.as_ref().display()))]
    pub async fn admit(&mut self, path: impl AsRef<Path>) -> Result<Uuid> {
        let handle = Handle::open(path, self.max_connections).await?;
        self.insert(handle).await
    }

    /// Admit every candidate, opening up to `concurrency` of them at once.
    ///
    /// Returns the errors of the candidates that were excluded; the load
    /// never stops early. Which handle of a colliding pair reports the
    /// conflict depends on timing, but the resulting poisoned set does not.
    pub async fn admit_all(
        &mut self,
        paths: impl IntoIterator<Item = impl AsRef<Path>>,
        concurrency: usize,
    ) -> Vec<Error> {
        let max_connections = self.max_connections;
        let mut opened = futures::stream::iter(paths.into_iter().map(|p| p.as_ref().to_path_buf()))
            .map(|path| async move { Handle::open(path, max_connections).await })
            .buffer_unordered(concurrency.max(1));
        let mut failures = Vec::new();
        while let Some(result) = opened.next().await {
            let admitted = match result {
                Ok(handle) => self.insert(handle).await,
                Err(err) => Err(err),
            };
            if let Err(err) = admitted {
                if !matches!(&*err, ErrorKind::UuidConflict { .. }) {
                    tracing::warn!(error = %*err, "excluding candidate database");
                }
                failures.push(err);
            }
        }
        failures
    }

    /// Admit an already opened handle, applying the uuid uniqueness rule.
    pub async fn insert(&mut self, handle: Handle) -> Result<Uuid> {
        let uuid = handle.uuid();
        if self.contains_path(handle.path()) {
            let path = handle.path().to_path_buf();
            handle.close().await;
            exn::bail!(ErrorKind::AlreadyAdmitted(path));
        }

        if let Some(conflict) = self.conflicts.get_mut(&uuid) {
            conflict.members.push(ConflictMember::from(&handle));
            let paths = conflict.paths();
            handle.close().await;
            tracing::warn!(%uuid, path = %paths.last().map(|p| p.display().to_string()).unwrap_or_default(), "database reuses an already conflicting uuid");
            exn::bail!(ErrorKind::UuidConflict { uuid, paths });
        }

        if let Some(existing) = self.handles.remove(&uuid) {
            let conflict = Conflict {
                uuid,
                members: vec![ConflictMember::from(&existing), ConflictMember::from(&handle)],
            };
            let paths = conflict.paths();
            existing.close().await;
            handle.close().await;
            self.conflicts.insert(uuid, conflict);
            self.refresh();
            tracing::warn!(
                %uuid,
                first = %paths[0].display(),
                second = %paths[1].display(),
                "uuid conflict; excluding both databases"
            );
            exn::bail!(ErrorKind::UuidConflict { uuid, paths });
        }

        tracing::info!(
            %uuid,
            name = handle.name(),
            path = %handle.path().display(),
            columns = %handle.columns(),
            "admitted hash database"
        );
        self.handles.insert(uuid, handle);
        self.refresh();
        Ok(uuid)
    }

    fn contains_path(&self, path: &Path) -> bool {
        self.handles.values().any(|h| h.path() == path)
            || self.conflicts.values().flat_map(|c| &c.members).any(|m| m.path == path)
    }

    /// Recompute everything derived from the live handle set.
    fn refresh(&mut self) {
        self.required = required_hashes(self.handles.values());
        let mut order: Vec<&Handle> = self.handles.values().collect();
        order.sort_by_key(|h| (!h.columns().contains(Column::Size), h.uuid()));
        self.order = order.into_iter().map(|h| h.uuid()).collect();
    }

    /// Digest algorithms any probe evaluated against this registry may need.
    pub fn required_hashes(&self) -> AlgorithmSet {
        self.required
    }

    /// Live (admitted, not poisoned) handles in evaluation order.
    pub fn handles(&self) -> impl Iterator<Item = &Handle> + '_ {
        self.order.iter().filter_map(|uuid| self.handles.get(uuid))
    }

    pub fn get(&self, uuid: &Uuid) -> Option<&Handle> {
        self.handles.get(uuid)
    }

    pub fn is_poisoned(&self, uuid: &Uuid) -> bool {
        self.conflicts.contains_key(uuid)
    }

    /// Every poisoned uuid with the databases that carried it, by uuid.
    pub fn conflicts(&self) -> Vec<&Conflict> {
        let mut conflicts: Vec<&Conflict> = self.conflicts.values().collect();
        conflicts.sort_by_key(|c| c.uuid);
        conflicts
    }

    /// Number of live handles.
    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    /// Close every live handle's connection pool.
    pub async fn close(&self) {
        for handle in self.handles.values() {
            handle.close().await;
        }
    }
}
