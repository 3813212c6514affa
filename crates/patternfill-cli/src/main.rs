//! patternfill CLI
//!
//! Command-line driver for the pattern filler curation tooling:
//! - `fillers`: compute in-between filler tables for every pattern match
//!   table in a directory
//! - `stats`: export descriptive statistics about an ontology as CSV
//! - `taxon-restrict`: rewrite `'has part'` equivalence axioms with a taxon
//!   restriction and relabel phenotype classes

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use patternfill_core::{
    load_expand_flags, process_pattern, read_match_table, write_rows, BatchSummary, ExpandError,
    NamespaceWhitelist, PatternDefinition,
};
use patternfill_ontology::{
    parse_ontology_file, ClassIri, ClassificationError, SubsumptionIndex,
};
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

mod stats;
mod taxon;

#[derive(Parser)]
#[command(name = "patternfill")]
#[command(
    author,
    version,
    about = "Ontology design-pattern filler curation tooling"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute in-between filler tables for every `.tsv` match table in a directory.
    ///
    /// Each table is paired with the equally named `.yaml` pattern definition;
    /// the generalized, deduplicated table is written to the output directory
    /// under the input's file name, together with a `fillers_summary.json`.
    Fillers {
        /// Ontology file (.owl/.rdf/.ttl/.nt)
        #[arg(long)]
        ontology: PathBuf,
        /// Directory of pattern match tables (.tsv)
        #[arg(long)]
        matches_dir: PathBuf,
        /// Directory of pattern definitions (.yaml)
        #[arg(long)]
        patterns_dir: PathBuf,
        /// Output directory for filler tables
        #[arg(long)]
        out_dir: PathBuf,
        /// Accepted filler IRI prefixes, one per line
        #[arg(long)]
        legal_fillers: PathBuf,
        /// Slot names resolved to all ancestors up to the anchor, one per line
        #[arg(long)]
        expand_vars: PathBuf,
    },

    /// Export descriptive statistics about an ontology as CSV.
    Stats {
        /// Ontology file (.owl/.rdf/.ttl/.nt)
        #[arg(long)]
        ontology: PathBuf,
        /// Output directory for CSV files
        #[arg(long)]
        out_dir: PathBuf,
    },

    /// Rewrite `'has part'` equivalence axioms with a taxon restriction.
    TaxonRestrict {
        /// Ontology file (.owl/.rdf/.ttl/.nt)
        #[arg(long)]
        ontology: PathBuf,
        /// Output file (OWL functional syntax)
        #[arg(long)]
        out: PathBuf,
        /// Taxon class IRI or CURIE (e.g. NCBITaxon:9606)
        #[arg(long)]
        taxon: String,
        /// Human-readable taxon label appended to phenotype labels
        #[arg(long)]
        taxon_label: String,
        /// Root of the phenotype hierarchy to relabel
        #[arg(long)]
        phenotype_root: String,
        /// Classes whose equivalence axioms are dropped, one IRI per line
        #[arg(long)]
        preserve_eq: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Fillers {
            ontology,
            matches_dir,
            patterns_dir,
            out_dir,
            legal_fillers,
            expand_vars,
        } => run_fillers(
            &ontology,
            &matches_dir,
            &patterns_dir,
            &out_dir,
            &legal_fillers,
            &expand_vars,
        ),
        Commands::Stats { ontology, out_dir } => stats::run(&ontology, &out_dir),
        Commands::TaxonRestrict {
            ontology,
            out,
            taxon,
            taxon_label,
            phenotype_root,
            preserve_eq,
        } => {
            let preserve = match preserve_eq {
                Some(path) => taxon::load_preserve_list(&path)
                    .with_context(|| format!("reading {}", path.display()))?,
                None => BTreeSet::new(),
            };
            let config = taxon::TaxonRestriction {
                taxon: ClassIri::from_curie(&taxon),
                taxon_label,
                phenotype_root: ClassIri::from_curie(&phenotype_root),
                preserve,
            };
            taxon::run(&ontology, &out, &config)
        }
    }
}

fn run_fillers(
    ontology_path: &Path,
    matches_dir: &Path,
    patterns_dir: &Path,
    out_dir: &Path,
    legal_fillers: &Path,
    expand_vars: &Path,
) -> Result<()> {
    let whitelist = NamespaceWhitelist::from_file(legal_fillers)
        .with_context(|| format!("reading {}", legal_fillers.display()))?;
    let expand_flags = load_expand_flags(expand_vars)
        .with_context(|| format!("reading {}", expand_vars.display()))?;

    println!("Loading ontology: {}", ontology_path.display());
    let ontology = parse_ontology_file(ontology_path)
        .with_context(|| format!("loading {}", ontology_path.display()))?;
    let index = SubsumptionIndex::build(&ontology);
    println!(
        "Classified {} classes, {} whitelist prefixes, {} expanded slots",
        index.class_count(),
        whitelist.len(),
        expand_flags.len()
    );

    fs::create_dir_all(out_dir)
        .with_context(|| format!("creating {}", out_dir.display()))?;

    let mut tsv_files: Vec<PathBuf> = WalkDir::new(matches_dir)
        .max_depth(1)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| entry.into_path())
        .filter(|path| {
            path.extension()
                .and_then(|e| e.to_str())
                .is_some_and(|e| e.eq_ignore_ascii_case("tsv"))
        })
        .collect();
    tsv_files.sort();

    let mut summaries: BTreeMap<String, BatchSummary> = BTreeMap::new();
    let mut failed: Vec<String> = Vec::new();

    for tsv in &tsv_files {
        let name = tsv
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("<unnamed>")
            .to_string();

        match run_one_pattern(&index, tsv, patterns_dir, out_dir, &whitelist, &expand_flags) {
            Ok(Some(summary)) => {
                println!(
                    "{} {}: {} records in, {} discarded, {} distinct rows",
                    "ok".green().bold(),
                    name,
                    summary.records_in,
                    summary.records_discarded,
                    summary.distinct_rows
                );
                summaries.insert(name, summary);
            }
            Ok(None) => {
                println!("{} {}: empty match table", "skip".yellow(), name);
            }
            Err(e) => {
                // Oracle failures are fatal to the whole run; anything else
                // only fails this pattern.
                if e.downcast_ref::<ClassificationError>().is_some() {
                    return Err(e);
                }
                eprintln!("{} {}: {:#}", "failed".red().bold(), name, e);
                failed.push(name);
            }
        }
    }

    let summary_json = serde_json::to_string_pretty(&summaries)?;
    fs::write(out_dir.join("fillers_summary.json"), summary_json)?;

    println!(
        "Processed {} pattern table(s), {} failed",
        tsv_files.len(),
        failed.len()
    );
    if !failed.is_empty() {
        bail!("{} pattern(s) failed: {}", failed.len(), failed.join(", "));
    }
    Ok(())
}

fn run_one_pattern(
    index: &SubsumptionIndex,
    tsv: &Path,
    patterns_dir: &Path,
    out_dir: &Path,
    whitelist: &NamespaceWhitelist,
    expand_flags: &BTreeSet<String>,
) -> Result<Option<BatchSummary>> {
    let table = read_match_table(tsv).with_context(|| format!("reading {}", tsv.display()))?;
    if table.records.is_empty() {
        return Ok(None);
    }

    let stem = tsv
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or_default();
    let pattern_path = patterns_dir.join(format!("{stem}.yaml"));
    let definition = PatternDefinition::from_file(&pattern_path)
        .with_context(|| format!("reading pattern definition {}", pattern_path.display()))?;
    let pattern = definition.compile(&table.columns, expand_flags)?;

    let output = match process_pattern(index, &pattern, &table.records, whitelist) {
        Ok(output) => output,
        Err(ExpandError::Classification(e)) => return Err(e.into()),
        Err(other) => return Err(other.into()),
    };

    for discard in &output.discards {
        println!("  {} {}", "discarded".yellow(), discard);
    }

    let out_path = out_dir.join(tsv.file_name().unwrap_or_default());
    write_rows(&out_path, &table.columns, &output.rows)
        .with_context(|| format!("writing {}", out_path.display()))?;

    Ok(Some(output.summary))
}
