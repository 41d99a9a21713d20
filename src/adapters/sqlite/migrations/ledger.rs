use std::collections::{HashMap, HashSet};
use thiserror::Error;

use super::Revision;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    #[error("duplicate revision id {0}")]
    DuplicateRevision(String),

    #[error("revision {revision} names unknown parent {parent}")]
    MissingParent { revision: String, parent: String },

    #[error("no root revision")]
    NoRoot,

    #[error("multiple root revisions: {0:?}")]
    MultipleRoots(Vec<String>),

    #[error("revision {parent} has several children: {children:?}")]
    Branch { parent: String, children: Vec<String> },

    #[error("revisions not reachable from the root (cycle?): {0:?}")]
    Unreachable(Vec<String>),
}

/// Revisions ordered root first, validated as one unbranched chain.
pub struct MigrationLedger {
    chain: Vec<Box<dyn Revision>>,
}

impl std::fmt::Debug for MigrationLedger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MigrationLedger")
            .field("chain", &self.ids())
            .finish()
    }
}

impl MigrationLedger {
    /// Validate and linearize `revisions`, given in any order.
    pub fn new(revisions: Vec<Box<dyn Revision>>) -> Result<Self, LedgerError> {
        if revisions.is_empty() {
            return Ok(Self { chain: Vec::new() });
        }

        let mut seen = HashSet::new();
        for revision in &revisions {
            if !seen.insert(revision.id()) {
                return Err(LedgerError::DuplicateRevision(revision.id().to_string()));
            }
        }

        for revision in &revisions {
            if let Some(parent) = revision.parent() {
                if !seen.contains(parent) {
                    return Err(LedgerError::MissingParent {
                        revision: revision.id().to_string(),
                        parent: parent.to_string(),
                    });
                }
            }
        }

        let roots: Vec<&str> = revisions
            .iter()
            .filter(|r| r.parent().is_none())
            .map(|r| r.id())
            .collect();
        match roots.len() {
            0 => return Err(LedgerError::NoRoot),
            1 => {}
            _ => {
                return Err(LedgerError::MultipleRoots(
                    roots.iter().map(|s| (*s).to_string()).collect(),
                ))
            }
        }

        let mut children: HashMap<&str, Vec<&str>> = HashMap::new();
        for revision in &revisions {
            if let Some(parent) = revision.parent() {
                children.entry(parent).or_default().push(revision.id());
            }
        }
        let mut branches: Vec<(&&str, &Vec<&str>)> =
            children.iter().filter(|(_, c)| c.len() > 1).collect();
        branches.sort_by_key(|(parent, _)| **parent);
        if let Some((parent, kids)) = branches.first() {
            let mut kids: Vec<String> = kids.iter().map(|s| (*s).to_string()).collect();
            kids.sort();
            return Err(LedgerError::Branch {
                parent: (**parent).to_string(),
                children: kids,
            });
        }

        let mut order: Vec<&'static str> = Vec::with_capacity(revisions.len());
        let mut cursor = Some(roots[0]);
        while let Some(id) = cursor {
            let Some(next) = revisions.iter().find(|r| r.id() == id) else {
                break;
            };
            order.push(next.id());
            cursor = children.get(id).and_then(|c| c.first().copied());
        }

        if order.len() != revisions.len() {
            let reached: HashSet<&str> = order.iter().copied().collect();
            let mut stray: Vec<String> = revisions
                .iter()
                .map(|r| r.id())
                .filter(|id| !reached.contains(id))
                .map(str::to_string)
                .collect();
            stray.sort();
            return Err(LedgerError::Unreachable(stray));
        }

        let mut by_id: HashMap<&'static str, Box<dyn Revision>> =
            revisions.into_iter().map(|r| (r.id(), r)).collect();
        let chain = order.iter().filter_map(|id| by_id.remove(id)).collect();

        Ok(Self { chain })
    }

    pub fn len(&self) -> usize {
        self.chain.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chain.is_empty()
    }

    pub fn head(&self) -> Option<&'static str> {
        self.chain.last().map(|r| r.id())
    }

    pub fn ids(&self) -> Vec<&'static str> {
        self.chain.iter().map(|r| r.id()).collect()
    }

    /// Index of `id` in chain order.
    pub fn position(&self, id: &str) -> Option<usize> {
        self.chain.iter().position(|r| r.id() == id)
    }

    pub fn get(&self, index: usize) -> Option<&dyn Revision> {
        self.chain.get(index).map(AsRef::as_ref)
    }

    pub fn iter(&self) -> impl Iterator<Item = &dyn Revision> {
        self.chain.iter().map(AsRef::as_ref)
    }
}
