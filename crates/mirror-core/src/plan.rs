//! Snapshot diffing
//!
//! Compares a source and a replica [`TreeSnapshot`] by relative path and
//! produces the operations that bring the replica in line.

use mirror_fs::{RelativePath, TreeSnapshot};
use serde::Serialize;

/// One change to apply to the replica.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(tag = "kind", content = "path", rename_all = "lowercase")]
pub enum Operation {
    /// Present in source, absent from replica
    Create(RelativePath),
    /// Present in both with different content
    Update(RelativePath),
    /// Present in replica, absent from source
    Delete(RelativePath),
}

impl Operation {
    pub fn path(&self) -> &RelativePath {
        match self {
            Self::Create(path) | Self::Update(path) | Self::Delete(path) => path,
        }
    }

    /// Infinitive verb for messages, e.g. "copy".
    pub fn verb(&self) -> &'static str {
        match self {
            Self::Create(_) => "copy",
            Self::Update(_) => "update",
            Self::Delete(_) => "delete",
        }
    }

    /// Preposition tying the path to the replica, e.g. "to" in "copy a to replica".
    pub(crate) fn preposition(&self) -> &'static str {
        match self {
            Self::Create(_) => "to",
            Self::Update(_) => "in",
            Self::Delete(_) => "from",
        }
    }
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let gerund = match self {
            Self::Create(_) => "Copying",
            Self::Update(_) => "Updating",
            Self::Delete(_) => "Deleting",
        };
        write!(f, "{} {} {} replica.", gerund, self.path(), self.preposition())
    }
}

/// The operations computed for one pass.
///
/// Deletes and copies act on disjoint paths. Deletes are listed first so a
/// directory in the replica can give way to a file of the same name, and the
/// other way round, within a single pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Plan {
    deletes: Vec<Operation>,
    copies: Vec<Operation>,
    unchanged: usize,
}

impl Plan {
    /// Diff two snapshots.
    ///
    /// A link recorded in the replica never matches a source file: it is
    /// overwritten when the source has a file at that path and deleted
    /// otherwise.
    pub fn between(source: &TreeSnapshot, replica: &TreeSnapshot) -> Self {
        let mut plan = Self::default();

        for (path, fingerprint) in source {
            match replica.get(path) {
                None if replica.is_link(path) => {
                    plan.copies.push(Operation::Update(path.clone()))
                }
                None => plan.copies.push(Operation::Create(path.clone())),
                Some(existing) if existing != fingerprint => {
                    plan.copies.push(Operation::Update(path.clone()))
                }
                Some(_) => plan.unchanged += 1,
            }
        }

        let mut deletes: Vec<_> = replica
            .paths()
            .chain(replica.links())
            .filter(|path| !source.contains(path))
            .map(|path| Operation::Delete(path.clone()))
            .collect();
        deletes.sort();
        plan.deletes = deletes;

        tracing::debug!(
            deletes = plan.deletes.len(),
            copies = plan.copies.len(),
            unchanged = plan.unchanged,
            "Planned pass"
        );
        plan
    }

    /// All operations in application order.
    pub fn operations(&self) -> impl Iterator<Item = &Operation> {
        self.deletes.iter().chain(self.copies.iter())
    }

    pub fn creates(&self) -> impl Iterator<Item = &RelativePath> {
        self.copies.iter().filter_map(|op| match op {
            Operation::Create(path) => Some(path),
            _ => None,
        })
    }

    pub fn updates(&self) -> impl Iterator<Item = &RelativePath> {
        self.copies.iter().filter_map(|op| match op {
            Operation::Update(path) => Some(path),
            _ => None,
        })
    }

    pub fn deletes(&self) -> impl Iterator<Item = &RelativePath> {
        self.deletes.iter().map(Operation::path)
    }

    /// Files identical in both trees.
    pub fn unchanged(&self) -> usize {
        self.unchanged
    }

    pub fn len(&self) -> usize {
        self.deletes.len() + self.copies.len()
    }

    /// True when the replica already matches the source.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Diff two snapshots. Shorthand for [`Plan::between`].
pub fn plan(source: &TreeSnapshot, replica: &TreeSnapshot) -> Plan {
    Plan::between(source, replica)
}
