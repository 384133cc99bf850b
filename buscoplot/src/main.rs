use std::fs;
use std::path::Path;

use polars::prelude::*;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::data_handling::busco_fulltable::BuscoFullTable;
use crate::data_handling::busco_summary::{summaries_to_dataframe, BuscoSummary};
use crate::data_handling::karyotype::KaryotypeTable;
use crate::data_handling::metaeuk_gff::MetaeukGff;
use crate::graphics::barplot::organism_busco_barplot;
use crate::graphics::chromoplot::{chromoplot, export_density_csv};
use crate::graphics::karyoplot::karyoplot;
use crate::graphics::synteny::{horizontal_synteny_plot, vertical_synteny_plot};
use crate::helper_functions::project_root;
use crate::models::Dataset;
use crate::plot_config::PlotConfig;

mod data_handling;
mod density;
mod graphics;
mod helper_functions;
mod models;
mod plot_config;
mod smoothing;

const CONFIG_PATH: &str = "./plot_config.json";
const FIGURES_DIR: &str = "./figures";

fn main() -> PolarsResult<()> {
    // Setup logging and project configuration
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!("Starting the BUSCO plotting pipeline");

    let binding = project_root();
    info!("Project root: {}", binding.display());

    if !Path::new(CONFIG_PATH).exists() {
        PlotConfig::write_default(CONFIG_PATH)
            .map_err(|e| PolarsError::ComputeError(format!("{}", e).into()))?;
        info!("Default plot configuration written to: {}", CONFIG_PATH);
    }
    let cfg = PlotConfig::from_json(CONFIG_PATH)
        .map_err(|e| PolarsError::ComputeError(format!("{}", e).into()))?;
    fs::create_dir_all(FIGURES_DIR)?;

    // Primary assembly
    let karyotype = KaryotypeTable {
        path: "./data/organism_1/karyotype.tsv".to_string(),
        organism: "Organism 1".to_string(),
    }
    .load()?;
    let fulltable = BuscoFullTable {
        path: "./data/organism_1/full_table.tsv".to_string(),
        group: "eukaryota".to_string(),
        organism: "Organism 1".to_string(),
        genome_version: "v1".to_string(),
    }
    .load()?;

    karyoplot(
        &karyotype,
        &fulltable,
        "karyotype",
        &format!("{}/karyoplot.png", FIGURES_DIR),
        &cfg.karyoplot,
    )?;

    // Gene density panels, when a gene annotation is available
    let gff_path = "./data/organism_1/annotation.gff";
    if Path::new(gff_path).exists() {
        let features = MetaeukGff {
            path: gff_path.to_string(),
        }
        .load()?;
        chromoplot(
            &karyotype,
            &features,
            "Gene density",
            &format!("{}/chromoplot.png", FIGURES_DIR),
            &cfg.chromoplot,
        )?;
        export_density_csv(
            &karyotype,
            &features,
            cfg.chromoplot.bin_number,
            &format!("{}/density.csv", FIGURES_DIR),
        )?;
    } else {
        warn!("No gene annotation at {}; skipping the chromoplot", gff_path);
    }

    // Synteny against a second assembly, when one is present
    let karyotype_2_path = "./data/organism_2/karyotype.tsv";
    if Path::new(karyotype_2_path).exists() {
        let karyotype_2 = KaryotypeTable {
            path: karyotype_2_path.to_string(),
            organism: "Organism 2".to_string(),
        }
        .load()?;
        let fulltable_2 = BuscoFullTable {
            path: "./data/organism_2/full_table.tsv".to_string(),
            group: "eukaryota".to_string(),
            organism: "Organism 2".to_string(),
            genome_version: "v1".to_string(),
        }
        .load()?;

        vertical_synteny_plot(
            &karyotype,
            &fulltable,
            &karyotype_2,
            &fulltable_2,
            "Synteny",
            &format!("{}/synteny_vertical.png", FIGURES_DIR),
            &cfg.synteny,
        )?;
        horizontal_synteny_plot(
            &karyotype,
            &fulltable,
            &karyotype_2,
            &fulltable_2,
            "Synteny",
            &format!("{}/synteny_horizontal.png", FIGURES_DIR),
            &cfg.synteny,
        )?;
    } else {
        warn!("No second karyotype; skipping the synteny diagrams");
    }

    // Completeness comparison across every summary in the data directory
    let summaries = collect_summaries("./data/summaries")?;
    if summaries.is_empty() {
        warn!("No BUSCO summaries found; skipping the completeness barplot");
    } else {
        let frame = summaries_to_dataframe(&summaries)?;
        organism_busco_barplot(
            &frame,
            &format!("{}/completeness.png", FIGURES_DIR),
            &cfg.barplot,
        )?;
    }

    info!("Pipeline finished; figures in {}", FIGURES_DIR);
    Ok(())
}

/// One BUSCO summary per JSON file, the organism named after the file stem.
fn collect_summaries(dir: &str) -> PolarsResult<Vec<BuscoSummary>> {
    let mut summaries = Vec::new();
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(_) => return Ok(summaries),
    };
    for entry in entries {
        let path = entry?.path();
        if path.extension().and_then(|e| e.to_str()) != Some("json") {
            continue;
        }
        let organism = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("unknown")
            .replace('_', " ");
        let path = match path.to_str() {
            Some(p) => p.to_string(),
            None => continue,
        };
        summaries.push(BuscoSummary {
            path,
            organism,
            version: String::new(),
            group: "eukaryota".to_string(),
        });
    }
    summaries.sort_by(|a, b| a.organism.cmp(&b.organism));
    Ok(summaries)
}
