use std::fs;
use std::path::Path;

use plotters::style::RGBColor;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::models::BuscoStatus;

/// Color scheme for BUSCO status regions and synteny links.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Palette {
    Green,
    Azure,
}

impl Palette {
    pub fn status_color(&self, status: BuscoStatus) -> RGBColor {
        match (self, status) {
            (Palette::Green, BuscoStatus::Complete) => RGBColor(0, 128, 0),
            (Palette::Green, BuscoStatus::Duplicated) => RGBColor(128, 128, 128),
            (Palette::Azure, BuscoStatus::Complete) => RGBColor(89, 153, 255),
            (Palette::Azure, BuscoStatus::Duplicated) => RGBColor(255, 255, 5),
            // Fragmented and Missing share the dark fallback in both schemes.
            (Palette::Green, _) => RGBColor(0, 0, 0),
            (Palette::Azure, _) => RGBColor(33, 33, 29),
        }
    }
}

/// Every renderer takes its dimensions explicitly; nothing is keyed off
/// shared mutable state, so plot calls can run in any order.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct PlotConfig {
    pub karyoplot: KaryoplotConfig,
    pub chromoplot: ChromoplotConfig,
    pub synteny: SyntenyConfig,
    pub barplot: BarplotConfig,
}

impl PlotConfig {
    pub fn from_json(path: &str) -> anyhow::Result<Self> {
        let file = fs::File::open(path)?;
        let cfg = serde_json::from_reader(file)?;
        info!("Plot configuration loaded from: {}", path);
        Ok(cfg)
    }

    /// Write the default configuration next to the data so users have a
    /// template to edit.
    pub fn write_default(path: &str) -> anyhow::Result<()> {
        if let Some(parent) = Path::new(path).parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, serde_json::to_string_pretty(&PlotConfig::default())?)?;
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct KaryoplotConfig {
    pub px_width: u32,
    /// Pixels of image height per karyotype row.
    pub px_per_row: u32,
    /// Maximum number of chromosomes drawn; the most-hit ones win.
    pub chrs_limit: usize,
    /// Vertical plot units allotted to one chromosome row.
    pub dim: f64,
    pub palette: Palette,
    pub round_edges: bool,
}

impl Default for KaryoplotConfig {
    fn default() -> Self {
        KaryoplotConfig {
            px_width: 1600,
            px_per_row: 60,
            chrs_limit: 30,
            dim: 2.0,
            palette: Palette::Green,
            round_edges: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChromoplotConfig {
    pub px_width: u32,
    /// Pixels of image height per chromosome panel.
    pub px_per_panel: u32,
    /// Number of bins each chromosome is divided into.
    pub bin_number: usize,
    /// Points sampled along the smoothed curve per panel.
    pub spline_samples: usize,
}

impl Default for ChromoplotConfig {
    fn default() -> Self {
        ChromoplotConfig {
            px_width: 1400,
            px_per_panel: 160,
            bin_number: 100,
            spline_samples: 400,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SyntenyConfig {
    pub px_width: u32,
    pub px_height: u32,
    /// Thickness of a chromosome bar in plot units.
    pub dim: f64,
    /// Gap between consecutive chromosome bars in plot units.
    pub chr_distance: f64,
    pub straight_links: bool,
}

impl Default for SyntenyConfig {
    fn default() -> Self {
        SyntenyConfig {
            px_width: 1800,
            px_height: 1000,
            dim: 2.0,
            chr_distance: 2.0,
            straight_links: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BarplotConfig {
    pub px_width: u32,
    pub px_per_row: u32,
}

impl Default for BarplotConfig {
    fn default() -> Self {
        BarplotConfig {
            px_width: 1600,
            px_per_row: 80,
        }
    }
}
