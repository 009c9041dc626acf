//! Cutflow and categorization tables.
//!
//! The text layout is tab/space delimited, one line per cut or scheme:
//!
//! ```text
//! photonPt	812/1000
//! splitETMiss	31 405
//! ```
//!
//! Weighted and unweighted tables share the layout. Whole numbers print
//! without a fractional part, so unweighted tables contain plain integers.

use std::fmt;
use std::path::Path;

use ns_core::Result;
use serde::Serialize;

/// One cutflow line.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CutflowRow {
    /// Cut name.
    pub name: String,
    /// Passing count (or sum of weights).
    pub pass: f64,
    /// Tested count (or sum of weights).
    pub total: f64,
}

impl CutflowRow {
    /// Fraction of tested events that passed; `None` when nothing was tested.
    pub fn efficiency(&self) -> Option<f64> {
        (self.total != 0.0).then(|| self.pass / self.total)
    }
}

/// The cutflow in registry order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Cutflow {
    /// Whether rows hold sums of weights.
    pub weighted: bool,
    /// One row per cut.
    pub rows: Vec<CutflowRow>,
}

/// One categorization line.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategorizationRow {
    /// Scheme name.
    pub name: String,
    /// Count (or sum of weights) per category index.
    pub counts: Vec<f64>,
}

/// Category yields for every scheme, in registry order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Categorization {
    /// Whether counts are sums of weights.
    pub weighted: bool,
    /// One row per scheme.
    pub rows: Vec<CategorizationRow>,
}

impl fmt::Display for Cutflow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in &self.rows {
            writeln!(f, "{}\t{}/{}", row.name, row.pass, row.total)?;
        }
        Ok(())
    }
}

impl fmt::Display for Categorization {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in &self.rows {
            write!(f, "{}\t", row.name)?;
            for (i, count) in row.counts.iter().enumerate() {
                if i > 0 {
                    f.write_str(" ")?;
                }
                write!(f, "{count}")?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

fn write_table(path: &Path, table: &impl fmt::Display) -> Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, table.to_string())?;
    Ok(())
}

impl Cutflow {
    /// Row for a cut, by name.
    pub fn row(&self, name: &str) -> Option<&CutflowRow> {
        self.rows.iter().find(|r| r.name == name)
    }

    /// Write the text table to `path`, creating parent directories.
    pub fn save(&self, path: &Path) -> Result<()> {
        write_table(path, self)
    }
}

impl Categorization {
    /// Row for a scheme, by name.
    pub fn row(&self, name: &str) -> Option<&CategorizationRow> {
        self.rows.iter().find(|r| r.name == name)
    }

    /// Write the text table to `path`, creating parent directories.
    pub fn save(&self, path: &Path) -> Result<()> {
        write_table(path, self)
    }
}
