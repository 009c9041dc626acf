//! The [`Selector`]: cut evaluation, categorization and counting for one
//! event stream.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::path::Path;

use ns_core::Result;

use crate::category::{SchemeId, SchemeRegistry};
use crate::counters::{CategoryCounts, CounterStore, CutCounts};
use crate::cut::{CutId, CutRegistry};
use crate::report::{Categorization, CategorizationRow, Cutflow, CutflowRow};
use crate::warning::{self, SelectWarning};

/// Applies cuts and categorization schemes to the currently loaded event and
/// keeps cutflow and category counters.
///
/// The registries are fixed at construction. Callers load an event, then
/// query every cut and scheme of interest before loading the next one:
///
/// ```
/// use ns_select::{CutRegistry, SchemeRegistry, Selector};
///
/// let mut cuts = CutRegistry::<f64>::new();
/// cuts.add_atomic("positive", |x| *x > 0.0).unwrap();
/// cuts.add_all_cuts("allCuts").unwrap();
/// let mut schemes = SchemeRegistry::<f64>::new();
/// schemes.add_thresholds("split", &[10.0], |x| *x).unwrap();
///
/// let mut sel = Selector::new(cuts, schemes);
/// for x in [3.0, -1.0, 20.0] {
///     sel.load(x);
///     if sel.passes_cut_named("allCuts", 1.0) {
///         sel.classify_named("split", 1.0);
///     }
/// }
/// assert_eq!(sel.total_events("allCuts"), 3);
/// assert_eq!(sel.passing_events("allCuts"), 2);
/// assert_eq!(sel.category_events("split", 0), 1);
/// ```
///
/// A selector is single-threaded; parallel event processing uses one
/// selector per worker and sums the counters afterwards.
pub struct Selector<E> {
    cuts: CutRegistry<E>,
    schemes: SchemeRegistry<E>,
    counters: CounterStore,
    event: Option<E>,
    warnings: RefCell<VecDeque<SelectWarning>>,
}

impl<E> Selector<E> {
    /// Build a selector over fixed registries, with all counters at zero.
    pub fn new(cuts: CutRegistry<E>, schemes: SchemeRegistry<E>) -> Self {
        let sizes = schemes.iter().map(|(_, s)| s.n_categories()).collect();
        let counters = CounterStore::new(cuts.len(), sizes);
        log::debug!(
            "Selector: initialized with {} cuts and {} categorization schemes",
            cuts.len(),
            schemes.len()
        );
        Self { cuts, schemes, counters, event: None, warnings: RefCell::new(VecDeque::new()) }
    }

    fn warn(&self, w: SelectWarning) {
        warning::report(&mut self.warnings.borrow_mut(), w);
    }

    // ── Event binding ──────────────────────────────────────────

    /// Make `event` the current event. Returns the previous one.
    pub fn load(&mut self, event: E) -> Option<E> {
        self.event.replace(event)
    }

    /// The current event.
    pub fn event(&self) -> Option<&E> {
        self.event.as_ref()
    }

    /// Unbind the current event.
    pub fn unload(&mut self) -> Option<E> {
        self.event.take()
    }

    // ── Registry introspection ─────────────────────────────────

    /// The cut registry.
    pub fn cuts(&self) -> &CutRegistry<E> {
        &self.cuts
    }

    /// The scheme registry.
    pub fn schemes(&self) -> &SchemeRegistry<E> {
        &self.schemes
    }

    /// Raw counters.
    pub fn counters(&self) -> &CounterStore {
        &self.counters
    }

    /// True iff `name` is a registered cut.
    pub fn has_cut(&self, name: &str) -> bool {
        self.cuts.contains(name)
    }

    /// True iff `name` is a registered scheme.
    pub fn has_scheme(&self, name: &str) -> bool {
        self.schemes.contains(name)
    }

    /// Handle for a cut name.
    pub fn cut_id(&self, name: &str) -> Option<CutId> {
        self.cuts.id(name)
    }

    /// Handle for a scheme name.
    pub fn scheme_id(&self, name: &str) -> Option<SchemeId> {
        self.schemes.id(name)
    }

    /// Cut names in registry order.
    pub fn cut_names(&self) -> Vec<&str> {
        self.cuts.names().collect()
    }

    /// Scheme names in registry order.
    pub fn scheme_names(&self) -> Vec<&str> {
        self.schemes.iter().map(|(_, s)| s.name()).collect()
    }

    /// Declared category count of a scheme; 0 (with a warning) if unknown.
    pub fn n_categories(&self, scheme: &str) -> usize {
        match self.lookup_scheme(scheme) {
            Some(id) => self.schemes.get(id).n_categories(),
            None => 0,
        }
    }

    fn lookup_cut(&self, name: &str) -> Option<CutId> {
        let id = self.cuts.id(name);
        if id.is_none() {
            self.warn(SelectWarning::UnknownCut(name.to_string()));
        }
        id
    }

    fn lookup_scheme(&self, name: &str) -> Option<SchemeId> {
        let id = self.schemes.id(name);
        if id.is_none() {
            self.warn(SelectWarning::UnknownScheme(name.to_string()));
        }
        id
    }

    // ── Evaluation ─────────────────────────────────────────────

    /// Evaluate a cut on the current event and count the outcome.
    ///
    /// This is the only place cut counters change. Aggregate cuts evaluate
    /// their members through [`CutRegistry::evaluate`], which never counts,
    /// so only the aggregate's own counters move.
    ///
    /// A handle from another selector's registry is rejected with a warning.
    pub fn passes_cut(&mut self, cut: CutId, weight: f64) -> bool {
        if cut.index() >= self.cuts.len() {
            self.warn(SelectWarning::InvalidHandle { kind: "cut", index: cut.index() });
            return false;
        }
        let Some(event) = self.event.as_ref() else {
            self.warn(SelectWarning::NoEventLoaded);
            return false;
        };
        let passed = self.cuts.evaluate(cut, event);
        self.counters.record_cut(cut, passed, weight);
        passed
    }

    /// [`passes_cut`](Self::passes_cut) with weight 1.
    pub fn passes(&mut self, cut: CutId) -> bool {
        self.passes_cut(cut, 1.0)
    }

    /// Evaluate a cut by name; `false` (with a warning) if it is unknown.
    pub fn passes_cut_named(&mut self, name: &str, weight: f64) -> bool {
        match self.lookup_cut(name) {
            Some(id) => self.passes_cut(id, weight),
            None => false,
        }
    }

    /// Classify the current event and count it in its category.
    ///
    /// Returns `None` (with a warning, counters untouched) when the
    /// classifier matches no declared category, or when `scheme` came from
    /// another selector's registry.
    pub fn classify(&mut self, scheme: SchemeId, weight: f64) -> Option<usize> {
        if scheme.index() >= self.schemes.len() {
            self.warn(SelectWarning::InvalidHandle { kind: "scheme", index: scheme.index() });
            return None;
        }
        let Some(event) = self.event.as_ref() else {
            self.warn(SelectWarning::NoEventLoaded);
            return None;
        };
        let def = self.schemes.get(scheme);
        let Some(index) = def.classify(event) else {
            self.warn(SelectWarning::Unclassifiable { scheme: def.name().to_string() });
            return None;
        };
        if !self.counters.record_category(scheme, index, weight) {
            self.warn(SelectWarning::CategoryOutOfRange {
                scheme: def.name().to_string(),
                index,
                n_categories: def.n_categories(),
            });
            return None;
        }
        Some(index)
    }

    /// [`classify`](Self::classify) with weight 1.
    pub fn classify_default(&mut self, scheme: SchemeId) -> Option<usize> {
        self.classify(scheme, 1.0)
    }

    /// Classify by scheme name; `None` (with a warning) if it is unknown.
    pub fn classify_named(&mut self, name: &str, weight: f64) -> Option<usize> {
        let id = self.lookup_scheme(name)?;
        self.classify(id, weight)
    }

    // ── Counter queries ────────────────────────────────────────

    fn cut_counts(&self, name: &str) -> CutCounts {
        self.lookup_cut(name).map(|id| self.counters.cut(id)).unwrap_or_default()
    }

    fn category_counts(&self, scheme: &str, index: usize) -> CategoryCounts {
        let Some(id) = self.lookup_scheme(scheme) else {
            return CategoryCounts::default();
        };
        match self.counters.category(id, index) {
            Some(c) => c,
            None => {
                self.warn(SelectWarning::CategoryOutOfRange {
                    scheme: scheme.to_string(),
                    index,
                    n_categories: self.counters.scheme_size(id),
                });
                CategoryCounts::default()
            }
        }
    }

    /// Events passing a cut; 0 (with a warning) for an unknown cut.
    pub fn passing_events(&self, cut: &str) -> u64 {
        self.cut_counts(cut).pass
    }

    /// Sum of weights of events passing a cut.
    pub fn passing_events_weighted(&self, cut: &str) -> f64 {
        self.cut_counts(cut).pass_weighted
    }

    /// Events tested at a cut; 0 (with a warning) for an unknown cut.
    pub fn total_events(&self, cut: &str) -> u64 {
        self.cut_counts(cut).total
    }

    /// Sum of weights of events tested at a cut.
    pub fn total_events_weighted(&self, cut: &str) -> f64 {
        self.cut_counts(cut).total_weighted
    }

    /// Events in a category; 0 (with a warning) for an unknown scheme or an
    /// undeclared index.
    pub fn category_events(&self, scheme: &str, index: usize) -> u64 {
        self.category_counts(scheme, index).count
    }

    /// Sum of weights of events in a category.
    pub fn category_events_weighted(&self, scheme: &str, index: usize) -> f64 {
        self.category_counts(scheme, index).weighted
    }

    /// Zero every counter. Registries and the loaded event are kept.
    pub fn reset(&mut self) {
        self.counters.reset();
    }

    // ── Reports ────────────────────────────────────────────────

    /// Cutflow in registry order.
    pub fn cutflow(&self, weighted: bool) -> Cutflow {
        let rows = self
            .cuts
            .iter()
            .map(|(id, cut)| {
                let c = self.counters.cut(id);
                let (pass, total) = if weighted {
                    (c.pass_weighted, c.total_weighted)
                } else {
                    (c.pass as f64, c.total as f64)
                };
                CutflowRow { name: cut.name().to_string(), pass, total }
            })
            .collect();
        Cutflow { weighted, rows }
    }

    /// Category yields for every scheme, in registry order.
    pub fn categorization(&self, weighted: bool) -> Categorization {
        let rows = self
            .schemes
            .iter()
            .map(|(id, scheme)| {
                let counts = (0..scheme.n_categories())
                    .map(|i| {
                        let c = self.counters.category(id, i).unwrap_or_default();
                        if weighted { c.weighted } else { c.count as f64 }
                    })
                    .collect();
                CategorizationRow { name: scheme.name().to_string(), counts }
            })
            .collect();
        Categorization { weighted, rows }
    }

    /// Write the cutflow table to `path`.
    pub fn save_cutflow(&self, path: &Path, weighted: bool) -> Result<()> {
        self.cutflow(weighted).save(path)
    }

    /// Write the categorization table to `path`.
    pub fn save_categorization(&self, path: &Path, weighted: bool) -> Result<()> {
        self.categorization(weighted).save(path)
    }

    // ── Diagnostics ────────────────────────────────────────────

    /// Warnings recorded so far (most recent last).
    pub fn warnings(&self) -> Vec<SelectWarning> {
        self.warnings.borrow().iter().cloned().collect()
    }

    /// Drain the recorded warnings.
    pub fn take_warnings(&mut self) -> Vec<SelectWarning> {
        std::mem::take(self.warnings.get_mut()).into()
    }
}
