use polars::prelude::*;
use tracing::{debug, error, info};

use crate::helper_functions::{lowercase_columns, read_tsv};
use crate::models::Dataset;

/// Karyotype table: one row per chromosome with at least a name (`chr`) and
/// a length (`end`).
pub struct KaryotypeTable {
    pub path: String,
    pub organism: String,
}

impl Dataset for KaryotypeTable {
    fn load(&self) -> PolarsResult<DataFrame> {
        info!("Reading karyotype from: {}", &self.path);

        let mut df = match read_tsv(&self.path, true, 0) {
            Ok(df) => df,
            Err(e) => {
                error!("Failed to read karyotype TSV: {}", e);
                return Err(e);
            }
        };

        lowercase_columns(&mut df)?;

        for required in ["chr", "end"] {
            if df.column(required).is_err() {
                return Err(PolarsError::ComputeError(
                    format!("karyotype table misses required column '{}'", required).into(),
                ));
            }
        }

        let num_rows = df.height();
        let mut df = df
            .lazy()
            .with_column(col("end").cast(DataType::Float64))
            .collect()?;
        df = df
            .with_column(Series::new(
                PlSmallStr::from("organism"),
                vec![self.organism.clone(); num_rows],
            ))?
            .clone();

        debug!("Karyotype loaded, {} chromosomes", df.height());
        Ok(df)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn loads_and_normalizes_karyotype() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("karyotype.tsv");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "Chr\tStart\tEnd").unwrap();
        writeln!(file, "chr1\t0\t150000").unwrap();
        writeln!(file, "chr2\t0\t90000").unwrap();
        drop(file);

        let karyotype = KaryotypeTable {
            path: path.to_str().unwrap().to_string(),
            organism: "Testus exampli".to_string(),
        };
        let df = karyotype.load().unwrap();

        assert_eq!(df.height(), 2);
        assert_eq!(df.column("end").unwrap().f64().unwrap().get(0), Some(150000.0));
        assert_eq!(
            df.column("organism").unwrap().str().unwrap().get(1),
            Some("Testus exampli")
        );
    }

    #[test]
    fn missing_length_column_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("karyotype.tsv");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "chr\tname").unwrap();
        writeln!(file, "chr1\tfoo").unwrap();
        drop(file);

        let karyotype = KaryotypeTable {
            path: path.to_str().unwrap().to_string(),
            organism: String::new(),
        };
        assert!(karyotype.load().is_err());
    }
}
