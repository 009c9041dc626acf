//! H→γγ + dark-matter selection: the diphoton event record, its cuts and
//! its categorization schemes.
//!
//! Adding a cut means adding a [`DiphotonCut`] variant and one arm in
//! [`DiphotonCut::predicate`]; schemes work the same way through
//! [`DiphotonScheme`]. Existing cuts are untouched.

use ns_core::{EventRecord, Result};
use serde::{Deserialize, Serialize};

use crate::config::{ALL_CUTS, Catalog, SelectorConfig};
use crate::selector::Selector;

/// Lower edge of the analysis m_γγ window (GeV).
pub const MYY_RANGE_LO: f64 = 105.0;
/// Upper edge of the analysis m_γγ window (GeV).
pub const MYY_RANGE_HI: f64 = 160.0;

/// E_T^miss boundary between the high and low categories of `splitETMiss`.
pub const ETMISS_SPLIT: f64 = 180.0;

/// Per-event quantities used by the selection (energies in GeV).
///
/// When deserialized, a missing kinematic field becomes NaN, so every cut on
/// it fails and every scheme splitting on it reports the event as
/// unclassifiable. A missing `pileup_weight` is 1.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DiphotonEvent {
    /// Leading photon transverse momentum.
    #[serde(default = "missing")]
    pub y1_pt: f64,
    /// Subleading photon transverse momentum.
    #[serde(default = "missing")]
    pub y2_pt: f64,
    /// Leading photon pseudorapidity.
    #[serde(default = "missing")]
    pub y1_eta: f64,
    /// Subleading photon pseudorapidity.
    #[serde(default = "missing")]
    pub y2_eta: f64,
    /// Diphoton invariant mass.
    #[serde(default = "missing")]
    pub m_yy: f64,
    /// Diphoton transverse momentum.
    #[serde(default = "missing")]
    pub pt_yy: f64,
    /// Missing transverse energy.
    #[serde(default = "missing")]
    pub metref_final: f64,
    /// Pileup reweighting factor (MC only).
    #[serde(default = "unit_weight")]
    pub pileup_weight: f64,
}

fn missing() -> f64 {
    f64::NAN
}

fn unit_weight() -> f64 {
    1.0
}

/// Zero kinematics and unit weight, for building events in code.
impl Default for DiphotonEvent {
    fn default() -> Self {
        Self {
            y1_pt: 0.0,
            y2_pt: 0.0,
            y1_eta: 0.0,
            y2_eta: 0.0,
            m_yy: 0.0,
            pt_yy: 0.0,
            metref_final: 0.0,
            pileup_weight: 1.0,
        }
    }
}

impl EventRecord for DiphotonEvent {
    fn field(&self, name: &str) -> Option<f64> {
        Some(match name {
            "y1_pt" => self.y1_pt,
            "y2_pt" => self.y2_pt,
            "y1_eta" => self.y1_eta,
            "y2_eta" => self.y2_eta,
            "m_yy" => self.m_yy,
            "pt_yy" => self.pt_yy,
            "metref_final" => self.metref_final,
            "pileup_weight" => self.pileup_weight,
            _ => return None,
        })
    }
}

/// Atomic cuts of the analysis, in cutflow order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DiphotonCut {
    /// Relative photon p_T: p_T(γ1)/m_γγ > 0.35 and p_T(γ2)/m_γγ > 0.25.
    PhotonPt,
    /// Both photons within |η| < 2.5.
    PhotonEta,
    /// m_γγ inside the analysis window.
    DiphotonMass,
    /// p_T(γγ) > 120 GeV.
    DiphotonPt,
    /// E_T^miss > 120 GeV.
    DiphotonETMiss,
}

impl DiphotonCut {
    /// Every cut, in cutflow order.
    pub const ALL: [DiphotonCut; 5] = [
        DiphotonCut::PhotonPt,
        DiphotonCut::PhotonEta,
        DiphotonCut::DiphotonMass,
        DiphotonCut::DiphotonPt,
        DiphotonCut::DiphotonETMiss,
    ];

    /// Registry name.
    pub fn name(self) -> &'static str {
        match self {
            DiphotonCut::PhotonPt => "photonPt",
            DiphotonCut::PhotonEta => "photonEta",
            DiphotonCut::DiphotonMass => "diphotonMass",
            DiphotonCut::DiphotonPt => "diphotonPt",
            DiphotonCut::DiphotonETMiss => "diphotonETMiss",
        }
    }

    /// Look up a cut by registry name.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.name() == name)
    }

    /// The cut's predicate.
    pub fn predicate(self) -> fn(&DiphotonEvent) -> bool {
        match self {
            DiphotonCut::PhotonPt => {
                |e: &DiphotonEvent| e.y1_pt / e.m_yy > 0.35 && e.y2_pt / e.m_yy > 0.25
            }
            DiphotonCut::PhotonEta => {
                |e: &DiphotonEvent| e.y1_eta.abs() < 2.5 && e.y2_eta.abs() < 2.5
            }
            DiphotonCut::DiphotonMass => {
                |e: &DiphotonEvent| e.m_yy > MYY_RANGE_LO && e.m_yy < MYY_RANGE_HI
            }
            DiphotonCut::DiphotonPt => |e: &DiphotonEvent| e.pt_yy > 120.0,
            DiphotonCut::DiphotonETMiss => |e: &DiphotonEvent| e.metref_final > 120.0,
        }
    }
}

/// Categorization schemes of the analysis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DiphotonScheme {
    /// A single category holding every kept event.
    Inclusive,
    /// High (0) and low (1) E_T^miss.
    SplitETMiss,
}

impl DiphotonScheme {
    /// Every scheme.
    pub const ALL: [DiphotonScheme; 2] = [DiphotonScheme::Inclusive, DiphotonScheme::SplitETMiss];

    /// Registry name.
    pub fn name(self) -> &'static str {
        match self {
            DiphotonScheme::Inclusive => "inclusive",
            DiphotonScheme::SplitETMiss => "splitETMiss",
        }
    }

    /// Number of categories.
    pub fn n_categories(self) -> usize {
        match self {
            DiphotonScheme::Inclusive => 1,
            DiphotonScheme::SplitETMiss => 2,
        }
    }

    /// The scheme's classifier.
    pub fn classifier(self) -> fn(&DiphotonEvent) -> Option<usize> {
        match self {
            DiphotonScheme::Inclusive => |_: &DiphotonEvent| Some(0),
            DiphotonScheme::SplitETMiss => |e: &DiphotonEvent| {
                if e.metref_final.is_nan() {
                    None
                } else if e.metref_final > ETMISS_SPLIT {
                    Some(0)
                } else {
                    Some(1)
                }
            },
        }
    }
}

/// Lookup table of every built-in cut and scheme.
pub fn catalog() -> Catalog<DiphotonEvent> {
    let cat = DiphotonCut::ALL
        .into_iter()
        .fold(Catalog::new(), |cat, c| cat.with_cut(c.name(), c.predicate()));
    DiphotonScheme::ALL
        .into_iter()
        .fold(cat, |cat, s| cat.with_scheme(s.name(), s.n_categories(), s.classifier()))
}

/// The analysis selection: every built-in cut followed by `allCuts`, and
/// every built-in scheme.
pub fn default_config() -> SelectorConfig {
    let mut cut_names: Vec<String> =
        DiphotonCut::ALL.iter().map(|c| c.name().to_string()).collect();
    cut_names.push(ALL_CUTS.to_string());
    SelectorConfig {
        cut_names,
        scheme_sizes: DiphotonScheme::ALL
            .iter()
            .map(|s| (s.name().to_string(), s.n_categories()))
            .collect(),
        ..SelectorConfig::default()
    }
}

/// Build a diphoton selector from a config.
pub fn selector(config: &SelectorConfig) -> Result<Selector<DiphotonEvent>> {
    config.build(&catalog())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn signal_like() -> DiphotonEvent {
        DiphotonEvent {
            y1_pt: 70.0,
            y2_pt: 45.0,
            y1_eta: 0.3,
            y2_eta: -1.1,
            m_yy: 125.0,
            pt_yy: 150.0,
            metref_final: 200.0,
            pileup_weight: 0.9,
        }
    }

    #[test]
    fn cut_names_round_trip() {
        for c in DiphotonCut::ALL {
            assert_eq!(DiphotonCut::from_name(c.name()), Some(c));
        }
        assert_eq!(DiphotonCut::from_name(ALL_CUTS), None);
    }

    #[test]
    fn signal_like_event_passes_everything() {
        let ev = signal_like();
        for c in DiphotonCut::ALL {
            assert!(c.predicate()(&ev), "{} should pass", c.name());
        }
    }

    #[test]
    fn individual_cut_boundaries() {
        let mut ev = signal_like();
        ev.y2_pt = 30.0; // 0.24 of m_yy
        assert!(!DiphotonCut::PhotonPt.predicate()(&ev));

        let mut ev = signal_like();
        ev.y2_eta = -2.6;
        assert!(!DiphotonCut::PhotonEta.predicate()(&ev));

        let mut ev = signal_like();
        ev.m_yy = MYY_RANGE_HI;
        assert!(!DiphotonCut::DiphotonMass.predicate()(&ev));

        let mut ev = signal_like();
        ev.pt_yy = 120.0;
        assert!(!DiphotonCut::DiphotonPt.predicate()(&ev));

        let mut ev = signal_like();
        ev.metref_final = 119.0;
        assert!(!DiphotonCut::DiphotonETMiss.predicate()(&ev));
    }

    #[test]
    fn split_etmiss_classifier() {
        let classify = DiphotonScheme::SplitETMiss.classifier();
        let mut ev = signal_like();
        assert_eq!(classify(&ev), Some(0));
        ev.metref_final = ETMISS_SPLIT;
        assert_eq!(classify(&ev), Some(1));
        ev.metref_final = f64::NAN;
        assert_eq!(classify(&ev), None);
        assert_eq!(DiphotonScheme::Inclusive.classifier()(&ev), Some(0));
    }

    #[test]
    fn default_config_matches_catalog() {
        let cfg = default_config();
        assert_eq!(
            cfg.cut_names,
            vec!["photonPt", "photonEta", "diphotonMass", "diphotonPt", "diphotonETMiss", "allCuts"]
        );
        assert_eq!(cfg.scheme_sizes.get("splitETMiss"), Some(&2));
        let sel = selector(&cfg).unwrap();
        assert_eq!(sel.scheme_names(), vec!["inclusive", "splitETMiss"]);
        assert_eq!(sel.n_categories("splitETMiss"), 2);
    }

    #[test]
    fn event_record_fields_and_defaults() {
        let ev: DiphotonEvent = serde_json::from_str(r#"{"m_yy": 125.0}"#).unwrap();
        assert_eq!(ev.field("m_yy"), Some(125.0));
        assert_eq!(ev.field("pileup_weight"), Some(1.0));
        assert!(ev.metref_final.is_nan());
        assert!(ev.y1_eta.is_nan());
        assert_eq!(ev.field("jet_pt"), None);
    }

    #[test]
    fn missing_etmiss_is_unclassifiable() {
        let ev: DiphotonEvent = serde_json::from_str(
            r#"{"y1_pt": 70.0, "y2_pt": 45.0, "y1_eta": 0.3, "y2_eta": -1.1, "m_yy": 125.0, "pt_yy": 150.0}"#,
        )
        .unwrap();
        let mut sel = selector(&default_config()).unwrap();
        sel.load(ev);
        assert!(!sel.passes_cut_named("diphotonETMiss", 1.0));
        assert!(!sel.passes_cut_named(ALL_CUTS, 1.0));
        assert!(sel.passes_cut_named("diphotonMass", 1.0));
        assert_eq!(sel.classify_named("splitETMiss", 1.0), None);
        assert_eq!(sel.classify_named("inclusive", 1.0), Some(0));
        assert_eq!(sel.category_events("splitETMiss", 1), 0);
        assert_eq!(
            sel.take_warnings(),
            vec![crate::SelectWarning::Unclassifiable { scheme: "splitETMiss".into() }]
        );
    }
}
