use std::error::Error;
use std::fmt;
use std::str::FromStr;

use polars::prelude::*;

/// Adapter for foreign errors crossing into the polars-flavoured call chain.
pub fn polars_err(e: Box<dyn Error>) -> PolarsError {
    PolarsError::ComputeError(format!("{}", e).into())
}

/// Trait representing a loadable tabular dataset in the plotting pipeline.
pub trait Dataset {
    fn load(&self) -> PolarsResult<DataFrame>;
}

/// Annotation feature classes tracked by the chromoplot density panels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FeatureType {
    Gene,
    MRna,
    Cds,
    Exon,
}

impl FeatureType {
    pub const ALL: [FeatureType; 4] = [
        FeatureType::Gene,
        FeatureType::MRna,
        FeatureType::Cds,
        FeatureType::Exon,
    ];

    /// The spelling used in the GFF `type` column.
    pub fn as_str(&self) -> &'static str {
        match self {
            FeatureType::Gene => "gene",
            FeatureType::MRna => "mRNA",
            FeatureType::Cds => "CDS",
            FeatureType::Exon => "exon",
        }
    }
}

impl fmt::Display for FeatureType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FeatureType {
    type Err = PolarsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "gene" => Ok(FeatureType::Gene),
            "mRNA" => Ok(FeatureType::MRna),
            "CDS" => Ok(FeatureType::Cds),
            "exon" => Ok(FeatureType::Exon),
            other => Err(PolarsError::ComputeError(
                format!("unknown feature type: {}", other).into(),
            )),
        }
    }
}

/// BUSCO marker status as reported in the full table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BuscoStatus {
    Complete,
    Duplicated,
    Fragmented,
    Missing,
}

impl BuscoStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BuscoStatus::Complete => "Complete",
            BuscoStatus::Duplicated => "Duplicated",
            BuscoStatus::Fragmented => "Fragmented",
            BuscoStatus::Missing => "Missing",
        }
    }
}

impl fmt::Display for BuscoStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BuscoStatus {
    type Err = PolarsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Complete" => Ok(BuscoStatus::Complete),
            "Duplicated" => Ok(BuscoStatus::Duplicated),
            "Fragmented" => Ok(BuscoStatus::Fragmented),
            "Missing" => Ok(BuscoStatus::Missing),
            other => Err(PolarsError::ComputeError(
                format!("unknown BUSCO status: {}", other).into(),
            )),
        }
    }
}
