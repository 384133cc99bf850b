use polars::prelude::*;
use tracing::{debug, error, info, warn};

use crate::helper_functions::read_tsv;
use crate::models::Dataset;

/// BUSCO full table: two comment lines, then a header row starting with
/// `# Busco id`, then one row per marker.
pub struct BuscoFullTable {
    pub path: String,
    pub group: String,
    pub organism: String,
    pub genome_version: String,
}

/// Rename the BUSCO headers to the snake_case names the plot code expects.
fn rename_columns(mut df: DataFrame) -> PolarsResult<DataFrame> {
    let rename_map = [
        ("# Busco id", "busco_id"),
        ("Status", "status"),
        ("Sequence", "sequence"),
        ("Gene Start", "gene_start"),
        ("Gene End", "gene_end"),
        ("Strand", "strand"),
        ("Score", "score"),
        ("Length", "length"),
        ("OrthoDB url", "ortho_db_url"),
        ("Description", "description"),
    ];

    for &(old, new) in &rename_map {
        if df.get_column_names().iter().any(|c| c.as_str() == old) {
            df.rename(old, new.into())?;
        }
    }
    Ok(df)
}

/// BUSCO reports hits as `contig:start-end`; only the contig name matters
/// for matching against the karyotype.
fn trim_sequence_suffix(df: DataFrame) -> PolarsResult<DataFrame> {
    df.lazy()
        .with_column(
            col("sequence")
                .str()
                .replace_all(lit(":.*$"), lit(""), false)
                .alias("sequence"),
        )
        .collect()
}

impl Dataset for BuscoFullTable {
    fn load(&self) -> PolarsResult<DataFrame> {
        info!("Reading BUSCO full table from: {}", &self.path);

        let df_original = match read_tsv(&self.path, true, 2) {
            Ok(df) => df,
            Err(e) => {
                error!("Failed to read BUSCO full table: {}", e);
                return Err(e);
            }
        };
        debug!("Loaded {} marker rows", df_original.shape().0);

        let df_renamed = rename_columns(df_original)?;

        for required in ["busco_id", "status", "sequence", "gene_start", "gene_end"] {
            if df_renamed.column(required).is_err() {
                return Err(PolarsError::ComputeError(
                    format!("BUSCO full table misses required column '{}'", required).into(),
                ));
            }
        }

        let mut df = trim_sequence_suffix(df_renamed)?;
        df = df
            .lazy()
            .with_columns([
                col("gene_start").cast(DataType::Float64),
                col("gene_end").cast(DataType::Float64),
            ])
            .collect()?;

        let num_rows = df.height();
        for (name, value) in [
            ("group", &self.group),
            ("organism", &self.organism),
            ("genome_version", &self.genome_version),
        ] {
            df = df
                .with_column(Series::new(PlSmallStr::from(name), vec![value.clone(); num_rows]))?
                .clone();
        }

        let missing = df
            .column("status")?
            .str()?
            .into_iter()
            .filter(|s| matches!(s, Some("Missing")))
            .count();
        if missing == num_rows && num_rows > 0 {
            warn!("Every marker in {} is Missing; plots will be empty", self.path);
        }

        debug!("df after loading = {:?}", df.head(Some(5)));
        Ok(df)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_fulltable(dir: &std::path::Path) -> String {
        let path = dir.join("full_table.tsv");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "# BUSCO version is: 5.4.7").unwrap();
        writeln!(file, "# The lineage dataset is: eukaryota_odb10").unwrap();
        writeln!(
            file,
            "# Busco id\tStatus\tSequence\tGene Start\tGene End\tStrand\tScore\tLength"
        )
        .unwrap();
        writeln!(
            file,
            "100957at2759\tComplete\tchr1:5-900\t5\t900\t+\t1000.0\t800"
        )
        .unwrap();
        writeln!(
            file,
            "100973at2759\tMissing\t\t\t\t\t\t"
        )
        .unwrap();
        path.to_str().unwrap().to_string()
    }

    #[test]
    fn loads_renames_and_trims_sequences() {
        let dir = tempfile::tempdir().unwrap();
        let table = BuscoFullTable {
            path: write_fulltable(dir.path()),
            group: "fungi".to_string(),
            organism: "Testus exampli".to_string(),
            genome_version: "v1".to_string(),
        };

        let df = table.load().unwrap();
        assert_eq!(df.height(), 2);
        assert_eq!(
            df.column("sequence").unwrap().str().unwrap().get(0),
            Some("chr1")
        );
        assert_eq!(
            df.column("status").unwrap().str().unwrap().get(1),
            Some("Missing")
        );
        assert_eq!(
            df.column("gene_start").unwrap().f64().unwrap().get(0),
            Some(5.0)
        );
        assert_eq!(
            df.column("group").unwrap().str().unwrap().get(0),
            Some("fungi")
        );
    }
}
