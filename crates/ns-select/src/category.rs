//! Categorization schemes: named partitions of kept events into a fixed
//! number of numbered, mutually exclusive categories.

use std::collections::HashMap;
use std::fmt;

use ns_core::{Error, Result};

/// Boxed classifier: category index, or `None` when no category matches.
pub type ClassifierFn<E> = Box<dyn Fn(&E) -> Option<usize> + Send + Sync>;

/// Handle to a registered scheme.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SchemeId(pub(crate) usize);

impl SchemeId {
    /// Position of the scheme in registry order.
    pub fn index(self) -> usize {
        self.0
    }
}

/// A named categorization scheme.
pub struct Scheme<E> {
    name: String,
    n_categories: usize,
    classifier: ClassifierFn<E>,
}

impl<E> Scheme<E> {
    /// Scheme name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declared number of categories.
    pub fn n_categories(&self) -> usize {
        self.n_categories
    }

    /// Run the classifier. The result is not range-checked.
    pub fn classify(&self, event: &E) -> Option<usize> {
        (self.classifier)(event)
    }
}

impl<E> fmt::Debug for Scheme<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scheme")
            .field("name", &self.name)
            .field("n_categories", &self.n_categories)
            .finish_non_exhaustive()
    }
}

/// Ordered collection of categorization schemes.
#[derive(Debug)]
pub struct SchemeRegistry<E> {
    schemes: Vec<Scheme<E>>,
    by_name: HashMap<String, SchemeId>,
}

impl<E> SchemeRegistry<E> {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self { schemes: Vec::new(), by_name: HashMap::new() }
    }

    /// Register a scheme with a fixed category count (at least 1).
    pub fn add<F>(&mut self, name: &str, n_categories: usize, classifier: F) -> Result<SchemeId>
    where
        F: Fn(&E) -> Option<usize> + Send + Sync + 'static,
    {
        if name.trim().is_empty() {
            return Err(Error::Validation("scheme name must not be empty".into()));
        }
        if n_categories == 0 {
            return Err(Error::Validation(format!("scheme '{name}' must declare at least one category")));
        }
        if self.by_name.contains_key(name) {
            return Err(Error::Validation(format!("scheme '{name}' is declared twice")));
        }
        let id = SchemeId(self.schemes.len());
        self.schemes.push(Scheme {
            name: name.to_string(),
            n_categories,
            classifier: Box::new(classifier),
        });
        self.by_name.insert(name.to_string(), id);
        Ok(id)
    }

    /// Register a scheme from descending thresholds on a value: category `i`
    /// is the first threshold the value exceeds, else the last category.
    /// NaN values are unclassifiable.
    pub fn add_thresholds<F>(&mut self, name: &str, thresholds: &[f64], value: F) -> Result<SchemeId>
    where
        F: Fn(&E) -> f64 + Send + Sync + 'static,
    {
        if thresholds.windows(2).any(|w| w[0] <= w[1]) || thresholds.iter().any(|t| t.is_nan()) {
            return Err(Error::Validation(format!(
                "scheme '{name}': thresholds must be strictly decreasing, got {thresholds:?}"
            )));
        }
        let cuts = thresholds.to_vec();
        self.add(name, cuts.len() + 1, move |event| {
            let v = value(event);
            if v.is_nan() {
                return None;
            }
            Some(cuts.iter().position(|&t| v > t).unwrap_or(cuts.len()))
        })
    }

    /// Resolve a name to its handle.
    pub fn id(&self, name: &str) -> Option<SchemeId> {
        self.by_name.get(name).copied()
    }

    /// True iff `name` is a registered scheme.
    pub fn contains(&self, name: &str) -> bool {
        self.by_name.contains_key(name)
    }

    /// The scheme behind a handle.
    pub fn get(&self, id: SchemeId) -> &Scheme<E> {
        &self.schemes[id.0]
    }

    /// Number of registered schemes.
    pub fn len(&self) -> usize {
        self.schemes.len()
    }

    /// True when no scheme is registered.
    pub fn is_empty(&self) -> bool {
        self.schemes.is_empty()
    }

    /// Schemes in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (SchemeId, &Scheme<E>)> {
        self.schemes.iter().enumerate().map(|(i, s)| (SchemeId(i), s))
    }
}

impl<E> Default for SchemeRegistry<E> {
    fn default() -> Self {
        Self::new()
    }
}
