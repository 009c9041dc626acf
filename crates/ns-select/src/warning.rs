//! Soft failures reported by the [`Selector`](crate::Selector).
//!
//! None of these abort the event loop. The selector logs each one, records
//! it, and returns a neutral value (`false`, `None` or zero).

use std::collections::VecDeque;

use thiserror::Error;

/// A recoverable problem noticed while evaluating or querying the selector.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SelectWarning {
    /// A cut name that is not in the registry.
    #[error("cut '{0}' is not defined")]
    UnknownCut(String),

    /// A categorization scheme name that is not in the registry.
    #[error("category scheme '{0}' is not defined")]
    UnknownScheme(String),

    /// The scheme's classifier matched no category for the current event.
    #[error("event matches no category of scheme '{scheme}'")]
    Unclassifiable {
        /// Scheme name.
        scheme: String,
    },

    /// A category index outside `[0, n_categories)` for a registered scheme.
    #[error("category {index} is out of range for scheme '{scheme}' ({n_categories} categories)")]
    CategoryOutOfRange {
        /// Scheme name.
        scheme: String,
        /// Offending index.
        index: usize,
        /// Declared category count.
        n_categories: usize,
    },

    /// A cut or scheme handle that this selector did not issue.
    #[error("{kind} handle #{index} does not belong to this selector")]
    InvalidHandle {
        /// `"cut"` or `"scheme"`.
        kind: &'static str,
        /// Index carried by the handle.
        index: usize,
    },

    /// `passes_cut`/`classify` was called before any event was loaded.
    #[error("no event loaded")]
    NoEventLoaded,
}

/// Upper bound on retained warnings; older entries are dropped first.
pub(crate) const MAX_RETAINED: usize = 1024;

/// Log a warning and keep it for later inspection.
pub(crate) fn report(log: &mut VecDeque<SelectWarning>, warning: SelectWarning) {
    log::warn!("Selector: {warning}");
    if log.len() == MAX_RETAINED {
        log.pop_front();
    }
    log.push_back(warning);
}
