use std::fs::File;

use polars::prelude::*;
use serde_json::Value;
use tracing::{error, info};

use crate::models::Dataset;

/// BUSCO short-summary JSON for one assembly run.
///
/// Only the completeness percentages and the one-line summary are pulled
/// out; the rest of the report (parameters, tool versions) is ignored.
pub struct BuscoSummary {
    pub path: String,
    pub organism: String,
    pub version: String,
    pub group: String,
}

fn percentage(results: &Value, key: &str) -> PolarsResult<f64> {
    results
        .get(key)
        .and_then(Value::as_f64)
        .ok_or_else(|| {
            PolarsError::ComputeError(
                format!("summary results miss numeric field '{}'", key).into(),
            )
        })
}

impl Dataset for BuscoSummary {
    fn load(&self) -> PolarsResult<DataFrame> {
        info!("Reading BUSCO summary from: {}", &self.path);

        let file = File::open(&self.path)?;
        let root: Value = match serde_json::from_reader(file) {
            Ok(v) => v,
            Err(e) => {
                error!("Failed to parse summary JSON: {}", e);
                return Err(PolarsError::ComputeError(format!("{}", e).into()));
            }
        };

        let results = root.get("results").ok_or_else(|| {
            PolarsError::ComputeError("summary JSON has no 'results' object".into())
        })?;

        let one_line = results
            .get("one_line_summary")
            .and_then(Value::as_str)
            .unwrap_or("")
            .to_string();

        let dataset_name = root
            .get("lineage_dataset")
            .and_then(|d| d.get("name"))
            .and_then(Value::as_str)
            .unwrap_or("unknown")
            .to_string();

        df![
            "organism" => &[self.organism.clone()],
            "version" => &[self.version.clone()],
            "group" => &[self.group.clone()],
            "dataset_name" => &[dataset_name],
            "one_line_summary" => &[one_line],
            "single_copy" => &[percentage(results, "Single copy percentage")?],
            "multi_copy" => &[percentage(results, "Multi copy percentage")?],
            "fragmented" => &[percentage(results, "Fragmented percentage")?],
            "missing" => &[percentage(results, "Missing percentage")?]
        ]
    }
}

/// Stack several one-row summary frames into the bar-plot input.
pub fn summaries_to_dataframe(summaries: &[BuscoSummary]) -> PolarsResult<DataFrame> {
    let mut frames = summaries.iter().map(|s| s.load());
    let mut df = frames.next().ok_or_else(|| {
        PolarsError::ComputeError("at least one BUSCO summary is required".into())
    })??;
    for frame in frames {
        df.vstack_mut(&frame?)?;
    }
    Ok(df)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_summary(dir: &std::path::Path, name: &str, single: f64) -> String {
        let path = dir.join(name);
        let mut file = std::fs::File::create(&path).unwrap();
        write!(
            file,
            r#"{{
  "parameters": {{"mode": "genome"}},
  "lineage_dataset": {{"name": "eukaryota_odb10", "number_of_buscos": "255"}},
  "results": {{
    "one_line_summary": "C:95.2%[S:{single}%,D:1.1%],F:2.0%,M:2.8%,n:255",
    "Single copy percentage": {single},
    "Multi copy percentage": 1.1,
    "Fragmented percentage": 2.0,
    "Missing percentage": 2.8
  }}
}}"#,
            single = single
        )
        .unwrap();
        path.to_str().unwrap().to_string()
    }

    #[test]
    fn extracts_percentages_and_summary_line() {
        let dir = tempfile::tempdir().unwrap();
        let summary = BuscoSummary {
            path: write_summary(dir.path(), "short_summary.json", 94.1),
            organism: "Testus exampli".to_string(),
            version: "v1".to_string(),
            group: "fungi".to_string(),
        };

        let df = summary.load().unwrap();
        assert_eq!(df.height(), 1);
        assert_eq!(
            df.column("single_copy").unwrap().f64().unwrap().get(0),
            Some(94.1)
        );
        assert_eq!(
            df.column("dataset_name").unwrap().str().unwrap().get(0),
            Some("eukaryota_odb10")
        );
        assert!(df
            .column("one_line_summary")
            .unwrap()
            .str()
            .unwrap()
            .get(0)
            .unwrap()
            .starts_with("C:95.2%"));
    }

    #[test]
    fn stacks_multiple_summaries() {
        let dir = tempfile::tempdir().unwrap();
        let summaries = vec![
            BuscoSummary {
                path: write_summary(dir.path(), "a.json", 90.0),
                organism: "A".to_string(),
                version: "v1".to_string(),
                group: "g".to_string(),
            },
            BuscoSummary {
                path: write_summary(dir.path(), "b.json", 80.0),
                organism: "B".to_string(),
                version: "v2".to_string(),
                group: "g".to_string(),
            },
        ];

        let df = summaries_to_dataframe(&summaries).unwrap();
        assert_eq!(df.height(), 2);
        assert!(summaries_to_dataframe(&[]).is_err());
    }
}
