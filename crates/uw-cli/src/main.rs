//! upcweight CLI

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use uw_hist::{Accumulator, HistogramFile, Normalization, RatioTable, TableKeys};
use uw_reweight::{
    ClosureCurve, ClosureView, EventTable, ReweightedDistributions, Reweighter, check_pt_window,
    read_points, to_graph,
};
use uw_viz::{
    ArtifactMeta, ClosureArtifact, ClosureViewArtifact, CutflowArtifact, JsonFileSink,
    RatioGraphArtifact,
};

mod config;
mod cutflow;

#[derive(Parser)]
#[command(name = "upcweight")]
#[command(about = "upcweight - binned density-ratio reweighting and closure tests")]
#[command(version)]
struct Cli {
    /// Log verbosity level (trace, debug, info, warn, error)
    #[arg(long, global = true, default_value = "warn")]
    log_level: tracing::Level,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fill one histogram from an event table (leading candidate per event)
    Fill {
        /// Grid and selection config (YAML or JSON)
        #[arg(short, long)]
        config: PathBuf,

        /// Event table (JSON)
        #[arg(short, long)]
        events: PathBuf,

        /// Histogram name inside the output container
        #[arg(long)]
        name: String,

        /// Output container; an existing file is updated in place
        #[arg(short, long)]
        output: PathBuf,

        /// Events per parallel partition
        #[arg(long, default_value = "8192")]
        chunk_size: usize,
    },

    /// Build a weight table as numerator / denominator
    MakeWeights {
        /// Container holding the numerator histogram
        #[arg(long)]
        numerator: PathBuf,

        /// Numerator histogram name
        #[arg(long, default_value = "h_num")]
        num_key: String,

        /// Container holding the denominator histogram
        #[arg(long)]
        denominator: PathBuf,

        /// Denominator histogram name
        #[arg(long, default_value = "h_den")]
        den_key: String,

        /// Scale numerator and denominator to unit integral before dividing
        #[arg(long)]
        normalize: bool,

        /// Output weight file
        #[arg(short, long)]
        output: PathBuf,

        /// Stored numerator name
        #[arg(long, default_value = "h_num")]
        num_name: String,

        /// Stored denominator name
        #[arg(long, default_value = "h_den")]
        den_name: String,

        /// Stored ratio name
        #[arg(long, default_value = "h_ratio")]
        ratio_name: String,
    },

    /// Reweight an event table and compare with a target distribution
    ClosureTest {
        /// Selection and view config (YAML or JSON)
        #[arg(short, long)]
        config: PathBuf,

        /// Weight file written by `make-weights`
        #[arg(long)]
        weights: PathBuf,

        /// Event table to reweight (JSON)
        #[arg(short, long)]
        events: PathBuf,

        /// Container holding the target histogram
        #[arg(long)]
        target: PathBuf,

        /// Output directory for `closure.json` and `closure_hists.json`
        #[arg(long)]
        out_dir: PathBuf,

        /// Zero timestamps so repeated runs produce identical output
        #[arg(long)]
        deterministic: bool,
    },

    /// Ratio of two mirrored corrected-yield spectra
    CrossSectionRatio {
        /// Spectra config (YAML or JSON)
        #[arg(short, long)]
        config: PathBuf,

        /// Output file (pretty JSON). Defaults to stdout.
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Zero timestamps so repeated runs produce identical output
        #[arg(long)]
        deterministic: bool,
    },

    /// Count events through ordered selection tiers, per category
    Cutflow {
        /// Tier and category config (YAML or JSON)
        #[arg(short, long)]
        config: PathBuf,

        /// Event table (JSON)
        #[arg(short, long)]
        events: PathBuf,

        /// Summary output (pretty JSON). Defaults to stdout.
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Container for per-tier histograms
        #[arg(long)]
        hists: Option<PathBuf>,

        /// Zero timestamps so repeated runs produce identical output
        #[arg(long)]
        deterministic: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Logs go to stderr; stdout carries the JSON results.
    tracing_subscriber::fmt()
        .with_max_level(cli.log_level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Fill { config, events, name, output, chunk_size } => {
            cmd_fill(&config, &events, &name, &output, chunk_size)
        }
        Commands::MakeWeights {
            numerator,
            num_key,
            denominator,
            den_key,
            normalize,
            output,
            num_name,
            den_name,
            ratio_name,
        } => {
            let keys = TableKeys {
                numerator: num_name,
                denominator: den_name,
                ratio: ratio_name,
                rank: None,
            };
            cmd_make_weights(
                &numerator,
                &num_key,
                &denominator,
                &den_key,
                normalize,
                &output,
                &keys,
            )
        }
        Commands::ClosureTest { config, weights, events, target, out_dir, deterministic } => {
            cmd_closure_test(&config, &weights, &events, &target, &out_dir, deterministic)
        }
        Commands::CrossSectionRatio { config, output, deterministic } => {
            cmd_cross_section_ratio(&config, output.as_ref(), deterministic)
        }
        Commands::Cutflow { config, events, output, hists, deterministic } => {
            cmd_cutflow(&config, &events, output.as_ref(), hists.as_deref(), deterministic)
        }
    }
}

fn cmd_fill(
    config: &Path,
    events: &Path,
    name: &str,
    output: &Path,
    chunk_size: usize,
) -> Result<()> {
    let cfg: config::FillConfig = config::read_config(config)?;
    let grid = cfg.grid()?;
    let table = EventTable::read(events)?;
    let selection = cfg.selection.resolve(&table)?;

    let hist = Accumulator::fill_partitioned(name, &grid, &table.events, chunk_size, |ev| {
        selection.representative(&ev.candidates).map(|c| (c, 1.0))
    })?
    .with_title(cfg.title.clone());

    let mut file =
        if output.exists() { HistogramFile::read(output)? } else { HistogramFile::new() };
    file.insert(name, &hist);
    file.write(output)?;
    tracing::info!(name, grid = %grid, entries = hist.entries(), "histogram filled");

    write_json(
        None,
        serde_json::json!({
            "name": name,
            "output": output.display().to_string(),
            "entries": hist.entries(),
            "integral": hist.integral(),
            "underflow": hist.underflow(),
            "overflow": hist.overflow(),
        }),
    )
}

fn cmd_make_weights(
    numerator: &Path,
    num_key: &str,
    denominator: &Path,
    den_key: &str,
    normalize: bool,
    output: &Path,
    keys: &TableKeys,
) -> Result<()> {
    let num = HistogramFile::read(numerator)?.get(num_key, &numerator.display().to_string())?;
    let den =
        HistogramFile::read(denominator)?.get(den_key, &denominator.display().to_string())?;
    let norm = if normalize { Normalization::UnitIntegral } else { Normalization::AsIs };
    let table = RatioTable::build_with(num, den, norm)?;
    table.persist(output, keys)?;

    write_json(
        None,
        serde_json::json!({
            "output": output.display().to_string(),
            "grid": table.grid().to_string(),
            "cells": table.grid().n_cells(),
            "zero_denominator_cells": table.zero_denominator_cells(),
            "normalized": normalize,
        }),
    )
}

fn default_views(dist: &ReweightedDistributions) -> Vec<ClosureView> {
    let grid = dist.target.grid();
    if grid.rank() < 2 {
        return Vec::new();
    }
    grid.axes()
        .iter()
        .enumerate()
        .map(|(i, a)| {
            let name =
                if a.title().is_empty() { format!("axis{i}") } else { a.title().to_string() };
            ClosureView::onto(name, i)
        })
        .collect()
}

fn insert_closure(
    hists: &mut HistogramFile,
    suffix: &str,
    dist: &ReweightedDistributions,
) -> Result<()> {
    hists.insert(format!("h_unweighted_{suffix}"), &dist.unweighted);
    hists.insert(format!("h_weighted_{suffix}"), &dist.weighted);
    hists.insert(format!("h_target_{suffix}"), &dist.target);
    let curve = ClosureCurve::compare(&dist.weighted, &dist.target)?;
    let name = format!("h_closure_{suffix}");
    hists.insert(name.clone(), &curve.to_accumulator(&name)?);
    Ok(())
}

fn cmd_closure_test(
    config: &Path,
    weights: &Path,
    events: &Path,
    target: &Path,
    out_dir: &Path,
    deterministic: bool,
) -> Result<()> {
    let cfg: config::ClosureConfig = config::read_config(config)?;
    let table = RatioTable::load(weights, &cfg.keys)?;
    let population = EventTable::read(events)?;
    let selection = cfg.selection.resolve(&population)?;
    let reference =
        HistogramFile::read(target)?.get(&cfg.target_key, &target.display().to_string())?;

    let dist =
        Reweighter::new(&table, table.grid().clone(), selection).run(&population, reference)?;

    let meta = ArtifactMeta::new(deterministic)?
        .with_input("weights", weights)?
        .with_input("events", events)?
        .with_input("target", target)?;
    let mut artifact = ClosureArtifact::new(meta, dist.stats);
    let mut hists = HistogramFile::new();

    artifact.push_view(ClosureViewArtifact::from_distributions("full", &dist)?);
    insert_closure(&mut hists, "full", &dist)?;

    let views = if cfg.views.is_empty() { default_views(&dist) } else { cfg.views.clone() };
    for view in &views {
        let projected = dist.project(view)?;
        artifact.push_view(ClosureViewArtifact::from_distributions(view.name.clone(), &projected)?);
        insert_closure(&mut hists, &view.name, &projected)?;
    }

    let mut sink = JsonFileSink::new(out_dir);
    sink.write_artifact("closure", &artifact)?;
    hists.write(&out_dir.join("closure_hists.json"))?;

    let summary: Vec<_> = artifact
        .views
        .iter()
        .map(|v| {
            serde_json::json!({ "view": v.name, "chi2_vs_unity": v.chi2_vs_unity, "ndf": v.ndf })
        })
        .collect();
    write_json(None, serde_json::json!({ "stats": artifact.stats, "views": summary }))
}

fn cmd_cross_section_ratio(
    config: &Path,
    output: Option<&PathBuf>,
    deterministic: bool,
) -> Result<()> {
    let cfg: config::CrossSectionConfig = config::read_config(config)?;
    let base = config.parent().unwrap_or(Path::new("."));
    let num_paths = cfg.numerator.resolve(base);
    let den_paths = cfg.denominator.resolve(base);

    let num = read_points(&num_paths)?;
    let den = read_points(&den_paths)?;
    let mismatched =
        check_pt_window(&num, cfg.ptmin, cfg.ptmax) + check_pt_window(&den, cfg.ptmin, cfg.ptmax);
    if mismatched > 0 {
        tracing::warn!(mismatched, "some point tables were measured in a different pt window");
    }

    let mut meta = ArtifactMeta::new(deterministic)?;
    for (role, paths) in [("numerator", &num_paths), ("denominator", &den_paths)] {
        for (i, p) in paths.iter().enumerate() {
            meta = meta.with_input(format!("{role}_{i}"), p)?;
        }
    }

    let (num_graph, den_graph) = (to_graph(&num), to_graph(&den));
    let artifact = RatioGraphArtifact::build(
        meta,
        (cfg.numerator.label.as_str(), num_graph.as_slice()),
        (cfg.denominator.label.as_str(), den_graph.as_slice()),
    )?
    .with_pt_window(cfg.ptmin, cfg.ptmax);

    write_json(output, serde_json::to_value(&artifact)?)
}

fn cmd_cutflow(
    config: &Path,
    events: &Path,
    output: Option<&PathBuf>,
    hists: Option<&Path>,
    deterministic: bool,
) -> Result<()> {
    let cfg: config::CutflowConfig = config::read_config(config)?;
    let table = EventTable::read(events)?;
    let outcome = cutflow::run(&cfg, &table)?;

    if let Some(path) = hists {
        outcome.histograms.write(path)?;
    }
    if outcome.uncategorized > 0 {
        tracing::info!(uncategorized = outcome.uncategorized, "events outside every category");
    }

    let meta = ArtifactMeta::new(deterministic)?.with_input("events", events)?;
    let artifact = CutflowArtifact::build(meta, outcome.events, &outcome.cutflow, &cfg.ratios)?;
    write_json(output, serde_json::to_value(&artifact)?)
}

fn write_json(output: Option<&PathBuf>, value: serde_json::Value) -> Result<()> {
    if let Some(path) = output {
        std::fs::write(path, serde_json::to_string_pretty(&value)?)?;
    } else {
        println!("{}", serde_json::to_string_pretty(&value)?);
    }
    Ok(())
}
