//! `nextstat select`: run the diphoton selection over a JSONL event file.

use anyhow::{Context, Result};
use serde::Serialize;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use ns_select::diphoton::{self, DiphotonEvent};
use ns_select::{Categorization, CutId, Cutflow, SchemeId, SelectorConfig};

/// Options of one `select` invocation.
pub struct SelectArgs {
    pub events: PathBuf,
    pub config: Option<PathBuf>,
    pub schemes: Vec<String>,
    pub cut: String,
    pub sample: String,
    pub weighted: bool,
    pub norm: f64,
    pub out_dir: PathBuf,
    pub json: bool,
}

#[derive(Debug, Serialize)]
struct SelectionSummary<'a> {
    sample: &'a str,
    cut: &'a str,
    weighted: bool,
    events_read: u64,
    events_kept: u64,
    cutflow: Cutflow,
    categorization: Categorization,
    warnings: Vec<String>,
}

fn load_config(path: Option<&Path>) -> Result<SelectorConfig> {
    match path {
        Some(p) => SelectorConfig::from_path(p)
            .with_context(|| format!("failed to read selector config {}", p.display())),
        None => Ok(diphoton::default_config()),
    }
}

pub fn cmd_select(args: &SelectArgs) -> Result<()> {
    let config = load_config(args.config.as_deref())?;
    let mut sel = diphoton::selector(&config).context("invalid selector config")?;

    let Some(gate) = sel.cut_id(&args.cut) else {
        anyhow::bail!("unknown cut '{}' (available: {})", args.cut, sel.cut_names().join(", "));
    };
    let schemes: Vec<(String, SchemeId)> = if args.schemes.is_empty() {
        sel.schemes().iter().map(|(id, s)| (s.name().to_string(), id)).collect()
    } else {
        let mut out: Vec<(String, SchemeId)> = Vec::with_capacity(args.schemes.len());
        for name in &args.schemes {
            if out.iter().any(|(seen, _)| seen == name) {
                tracing::debug!(scheme = %name, "ignoring repeated --scheme");
                continue;
            }
            let Some(id) = sel.scheme_id(name) else {
                anyhow::bail!(
                    "unknown categorization scheme '{name}' (available: {})",
                    sel.scheme_names().join(", ")
                );
            };
            out.push((name.clone(), id));
        }
        out
    };
    let cut_ids: Vec<CutId> = sel.cuts().iter().map(|(id, _)| id).collect();
    if !args.norm.is_finite() {
        anyhow::bail!("--norm must be finite, got {}", args.norm);
    }

    tracing::info!("reading events from {}", args.events.display());
    let file = std::fs::File::open(&args.events)
        .with_context(|| format!("failed to open events file {}", args.events.display()))?;

    let (mut read, mut kept) = (0u64, 0u64);
    for (lineno, line) in BufReader::new(file).lines().enumerate() {
        let line = line.with_context(|| format!("failed to read {}", args.events.display()))?;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let event: DiphotonEvent = serde_json::from_str(line).with_context(|| {
            format!("{}:{}: invalid event record", args.events.display(), lineno + 1)
        })?;
        let weight = if args.weighted { event.pileup_weight * args.norm } else { 1.0 };
        read += 1;

        sel.load(event);
        let mut kept_here = false;
        for id in &cut_ids {
            let passed = sel.passes_cut(*id, weight);
            if *id == gate {
                kept_here = passed;
            }
        }
        if !kept_here {
            continue;
        }
        kept += 1;
        for (_, id) in &schemes {
            sel.classify(*id, weight);
        }
    }
    tracing::info!(events = read, kept, sample = %args.sample, "selection complete");

    let cutflow = sel.cutflow(args.weighted);
    let categorization = sel.categorization(args.weighted);
    print!("{cutflow}");
    print!("{categorization}");

    std::fs::create_dir_all(&args.out_dir)
        .with_context(|| format!("failed to create {}", args.out_dir.display()))?;
    let cutflow_path = args.out_dir.join(format!("cutflow_{}.txt", args.sample));
    cutflow.save(&cutflow_path)?;
    for (name, _) in &schemes {
        let single = Categorization {
            weighted: args.weighted,
            rows: categorization.row(name).cloned().into_iter().collect(),
        };
        let path = args.out_dir.join(format!("categorization_{name}_{}.txt", args.sample));
        single.save(&path)?;
        tracing::debug!(path = %path.display(), "wrote categorization");
    }

    let warnings = sel.take_warnings();
    if !warnings.is_empty() {
        tracing::warn!(count = warnings.len(), "selector reported warnings");
    }

    if args.json {
        let summary = SelectionSummary {
            sample: &args.sample,
            cut: &args.cut,
            weighted: args.weighted,
            events_read: read,
            events_kept: kept,
            cutflow,
            categorization,
            warnings: warnings.iter().map(ToString::to_string).collect(),
        };
        let path = args.out_dir.join(format!("selection_{}.json", args.sample));
        std::fs::write(&path, serde_json::to_string_pretty(&summary)?)
            .with_context(|| format!("failed to write {}", path.display()))?;
    }

    eprintln!("Selected {kept}/{read} events → {}", args.out_dir.display());
    Ok(())
}
