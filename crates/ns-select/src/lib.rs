//! # ns-select
//!
//! Event selection for NextStat: ordered cuts with cutflow accounting,
//! categorization schemes with per-category yields, and the text reports
//! built from them.
//!
//! ## Example
//!
//! ```
//! use ns_select::diphoton::{self, DiphotonEvent};
//!
//! let mut sel = diphoton::selector(&diphoton::default_config()).unwrap();
//! sel.load(DiphotonEvent {
//!     y1_pt: 70.0,
//!     y2_pt: 45.0,
//!     m_yy: 125.0,
//!     pt_yy: 150.0,
//!     metref_final: 200.0,
//!     ..DiphotonEvent::default()
//! });
//! if sel.passes_cut_named("allCuts", 1.0) {
//!     assert_eq!(sel.classify_named("splitETMiss", 1.0), Some(0));
//! }
//! print!("{}", sel.cutflow(false));
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod category;
pub mod config;
pub mod counters;
pub mod cut;
pub mod diphoton;
pub mod expr;
pub mod report;
pub mod selector;
pub mod warning;

pub use category::{ClassifierFn, Scheme, SchemeId, SchemeRegistry};
pub use config::{ALL_CUTS, Catalog, SelectorConfig, ThresholdScheme};
pub use counters::{CategoryCounts, CounterStore, CutCounts};
pub use cut::{Cut, CutId, CutKind, CutRegistry, PredicateFn};
pub use expr::CompiledExpr;
pub use report::{Categorization, CategorizationRow, Cutflow, CutflowRow};
pub use selector::Selector;
pub use warning::SelectWarning;
