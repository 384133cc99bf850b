use polars::prelude::*;
use tracing::{debug, error, info};

use crate::helper_functions::read_tsv;
use crate::models::Dataset;

const GFF_COLUMNS: [&str; 9] = [
    "sequence",
    "source",
    "type",
    "start",
    "end",
    "score",
    "strand",
    "phase",
    "attributes",
];

/// MetaEuk coordinates in GFF form: nine tab-separated columns, no header.
pub struct MetaeukGff {
    pub path: String,
}

impl Dataset for MetaeukGff {
    fn load(&self) -> PolarsResult<DataFrame> {
        info!("Reading MetaEuk coordinates from: {}", &self.path);

        let mut df = match read_tsv(&self.path, false, 0) {
            Ok(df) => df,
            Err(e) => {
                error!("Failed to read GFF coordinates: {}", e);
                return Err(e);
            }
        };

        if df.width() != GFF_COLUMNS.len() {
            return Err(PolarsError::ComputeError(
                format!(
                    "expected {} GFF columns, found {}",
                    GFF_COLUMNS.len(),
                    df.width()
                )
                .into(),
            ));
        }
        df.set_column_names(GFF_COLUMNS)?;

        let df = df
            .lazy()
            .with_columns([
                col("start").cast(DataType::Float64),
                col("end").cast(DataType::Float64),
            ])
            .collect()?;

        debug!("GFF loaded, {} feature rows", df.height());
        Ok(df)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn loads_headerless_gff() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("coords.gff");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(
            file,
            "chr1\tMetaEuk\tgene\t100\t300\t250\t+\t.\tTarget_ID=100957at2759"
        )
        .unwrap();
        writeln!(
            file,
            "chr1\tMetaEuk\texon\t100\t200\t120\t+\t.\tTarget_ID=100957at2759"
        )
        .unwrap();
        drop(file);

        let gff = MetaeukGff {
            path: path.to_str().unwrap().to_string(),
        };
        let df = gff.load().unwrap();

        assert_eq!(df.shape(), (2, 9));
        assert_eq!(df.column("type").unwrap().str().unwrap().get(1), Some("exon"));
        assert_eq!(df.column("start").unwrap().f64().unwrap().get(0), Some(100.0));
    }

    #[test]
    fn wrong_column_count_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.gff");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "chr1\tgene\t100\t300").unwrap();
        drop(file);

        let gff = MetaeukGff {
            path: path.to_str().unwrap().to_string(),
        };
        assert!(gff.load().is_err());
    }
}
