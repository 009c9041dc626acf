//! Cut registry: the ordered set of named event predicates.
//!
//! Names are resolved to [`CutId`] handles once, when the registry is built.
//! Evaluation here is pure; counting happens in the
//! [`Selector`](crate::Selector), which is what keeps aggregate evaluation
//! from touching the counters of the cuts it is composed of.

use std::collections::HashMap;
use std::fmt;

use ns_core::{Error, Result};

/// Boxed event predicate.
pub type PredicateFn<E> = Box<dyn Fn(&E) -> bool + Send + Sync>;

/// Handle to a registered cut (its position in declaration order).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CutId(pub(crate) usize);

impl CutId {
    /// Position of the cut in registry order.
    pub fn index(self) -> usize {
        self.0
    }
}

/// What a cut computes.
pub enum CutKind<E> {
    /// A single predicate over the event.
    Atomic(PredicateFn<E>),
    /// Logical AND of every atomic cut in the registry.
    AllAtomic,
    /// Logical AND of the listed atomic cuts.
    AllOf(Vec<CutId>),
}

impl<E> CutKind<E> {
    /// True for the two aggregate kinds.
    pub fn is_aggregate(&self) -> bool {
        !matches!(self, CutKind::Atomic(_))
    }
}

impl<E> fmt::Debug for CutKind<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CutKind::Atomic(_) => f.write_str("Atomic(..)"),
            CutKind::AllAtomic => f.write_str("AllAtomic"),
            CutKind::AllOf(ids) => f.debug_tuple("AllOf").field(ids).finish(),
        }
    }
}

/// A named cut.
#[derive(Debug)]
pub struct Cut<E> {
    name: String,
    kind: CutKind<E>,
}

impl<E> Cut<E> {
    /// Cut name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Cut kind.
    pub fn kind(&self) -> &CutKind<E> {
        &self.kind
    }
}

/// Ordered collection of named cuts. Declaration order is cutflow order.
#[derive(Debug)]
pub struct CutRegistry<E> {
    cuts: Vec<Cut<E>>,
    by_name: HashMap<String, CutId>,
}

impl<E> CutRegistry<E> {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self { cuts: Vec::new(), by_name: HashMap::new() }
    }

    fn push(&mut self, name: &str, kind: CutKind<E>) -> Result<CutId> {
        if name.trim().is_empty() {
            return Err(Error::Validation("cut name must not be empty".into()));
        }
        if self.by_name.contains_key(name) {
            return Err(Error::Validation(format!("cut '{name}' is declared twice")));
        }
        let id = CutId(self.cuts.len());
        self.cuts.push(Cut { name: name.to_string(), kind });
        self.by_name.insert(name.to_string(), id);
        Ok(id)
    }

    /// Register a predicate cut.
    pub fn add_atomic<F>(&mut self, name: &str, predicate: F) -> Result<CutId>
    where
        F: Fn(&E) -> bool + Send + Sync + 'static,
    {
        self.push(name, CutKind::Atomic(Box::new(predicate)))
    }

    /// Register the "all cuts" aggregate: AND of every atomic cut, including
    /// atomic cuts declared after it.
    pub fn add_all_cuts(&mut self, name: &str) -> Result<CutId> {
        self.push(name, CutKind::AllAtomic)
    }

    /// Register an aggregate over a subset of already-declared atomic cuts.
    pub fn add_aggregate(&mut self, name: &str, members: &[&str]) -> Result<CutId> {
        if members.is_empty() {
            return Err(Error::Validation(format!("aggregate cut '{name}' has no members")));
        }
        let mut ids = Vec::with_capacity(members.len());
        for member in members {
            let id = self.id(member).ok_or_else(|| {
                Error::Validation(format!(
                    "aggregate cut '{name}' refers to undeclared cut '{member}'"
                ))
            })?;
            if self.cuts[id.0].kind.is_aggregate() {
                return Err(Error::Validation(format!(
                    "aggregate cut '{name}' cannot contain aggregate '{member}'"
                )));
            }
            if !ids.contains(&id) {
                ids.push(id);
            }
        }
        self.push(name, CutKind::AllOf(ids))
    }

    /// Resolve a name to its handle.
    pub fn id(&self, name: &str) -> Option<CutId> {
        self.by_name.get(name).copied()
    }

    /// True iff `name` is a registered cut.
    pub fn contains(&self, name: &str) -> bool {
        self.by_name.contains_key(name)
    }

    /// The cut behind a handle.
    pub fn get(&self, id: CutId) -> &Cut<E> {
        &self.cuts[id.0]
    }

    /// Number of registered cuts (atomic and aggregate).
    pub fn len(&self) -> usize {
        self.cuts.len()
    }

    /// True when no cut is registered.
    pub fn is_empty(&self) -> bool {
        self.cuts.is_empty()
    }

    /// Cuts in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (CutId, &Cut<E>)> {
        self.cuts.iter().enumerate().map(|(i, c)| (CutId(i), c))
    }

    /// Cut names in declaration order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.cuts.iter().map(|c| c.name.as_str())
    }

    /// Evaluate a cut against an event. No counters are involved.
    ///
    /// Aggregates only ever evaluate atomic cuts, so this never recurses
    /// more than one level.
    pub fn evaluate(&self, id: CutId, event: &E) -> bool {
        match &self.cuts[id.0].kind {
            CutKind::Atomic(predicate) => predicate(event),
            CutKind::AllAtomic => self.cuts.iter().all(|cut| match &cut.kind {
                CutKind::Atomic(predicate) => predicate(event),
                _ => true,
            }),
            CutKind::AllOf(members) => members.iter().all(|&m| self.evaluate(m, event)),
        }
    }
}

impl<E> Default for CutRegistry<E> {
    fn default() -> Self {
        Self::new()
    }
}
