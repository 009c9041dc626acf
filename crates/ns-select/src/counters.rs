//! Weighted and unweighted event counters for cuts and categories.

use std::collections::HashMap;

use serde::Serialize;

use crate::category::SchemeId;
use crate::cut::CutId;

/// Counters for one cut.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct CutCounts {
    /// Events tested.
    pub total: u64,
    /// Sum of weights of events tested.
    pub total_weighted: f64,
    /// Events passing.
    pub pass: u64,
    /// Sum of weights of events passing.
    pub pass_weighted: f64,
}

impl CutCounts {
    fn record(&mut self, passed: bool, weight: f64) {
        self.total += 1;
        self.total_weighted += weight;
        if passed {
            self.pass += 1;
            self.pass_weighted += weight;
        }
    }
}

/// Counters for one (scheme, category) pair.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct CategoryCounts {
    /// Events classified into the category.
    pub count: u64,
    /// Sum of their weights.
    pub weighted: f64,
}

/// All counters owned by one selector.
///
/// Every cut and every declared (scheme, category) pair has an entry from
/// construction on, so reports list categories no event ever reached.
#[derive(Debug, Clone, Default)]
pub struct CounterStore {
    cuts: Vec<CutCounts>,
    categories: HashMap<(SchemeId, usize), CategoryCounts>,
    scheme_sizes: Vec<usize>,
}

impl CounterStore {
    /// Zeroed counters for `n_cuts` cuts and schemes with the given sizes
    /// (indexed by [`SchemeId`]).
    pub fn new(n_cuts: usize, scheme_sizes: Vec<usize>) -> Self {
        let mut store = Self {
            cuts: vec![CutCounts::default(); n_cuts],
            categories: HashMap::new(),
            scheme_sizes,
        };
        store.reset();
        store
    }

    /// Zero every counter. The set of keys is unchanged.
    pub fn reset(&mut self) {
        self.cuts.iter_mut().for_each(|c| *c = CutCounts::default());
        self.categories.clear();
        for (scheme, &n) in self.scheme_sizes.iter().enumerate() {
            for index in 0..n {
                self.categories.insert((SchemeId(scheme), index), CategoryCounts::default());
            }
        }
    }

    pub(crate) fn record_cut(&mut self, cut: CutId, passed: bool, weight: f64) {
        self.cuts[cut.0].record(passed, weight);
    }

    /// Returns `false` (and records nothing) for an undeclared pair.
    pub(crate) fn record_category(&mut self, scheme: SchemeId, index: usize, weight: f64) -> bool {
        match self.categories.get_mut(&(scheme, index)) {
            Some(c) => {
                c.count += 1;
                c.weighted += weight;
                true
            }
            None => false,
        }
    }

    /// Counters for a cut.
    pub fn cut(&self, cut: CutId) -> CutCounts {
        self.cuts[cut.0]
    }

    /// Counters for a (scheme, category) pair, `None` if the pair was never
    /// declared.
    pub fn category(&self, scheme: SchemeId, index: usize) -> Option<CategoryCounts> {
        self.categories.get(&(scheme, index)).copied()
    }

    /// Declared category count of a scheme.
    pub fn scheme_size(&self, scheme: SchemeId) -> usize {
        self.scheme_sizes[scheme.0]
    }
}
