use plotters::coord::Shift;
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};
use polars::prelude::*;
use tracing::info;

use crate::models::polars_err;
use crate::plot_config::BarplotConfig;

const SINGLE_COLOR: RGBColor = RGBColor(0x49, 0xa3, 0x4b);
const MULTI_COLOR: RGBColor = RGBColor(0x63, 0x66, 0x33);
const FRAGMENTED_COLOR: RGBColor = RGBColor(0x66, 0x4f, 0x33);
const MISSING_COLOR: RGBColor = RGBColor(0x4b, 0x56, 0x69);

/// One organism row of the stacked completeness barplot, percentages in
/// drawing order.
struct BarRow {
    label: String,
    one_line_summary: String,
    segments: [f64; 4],
}

/// Stacked horizontal barplot comparing assembly completeness across
/// organisms: one row per summary, segments for single-copy, multi-copy,
/// fragmented and missing percentages.
pub fn organism_busco_barplot(
    summaries: &DataFrame,
    output_file: &str,
    cfg: &BarplotConfig,
) -> PolarsResult<()> {
    let rows = bar_rows(summaries)?;
    if rows.is_empty() {
        return Err(PolarsError::ComputeError(
            "no summaries to plot".into(),
        ));
    }

    let caption = plot_caption(summaries)?;
    let px_height = (cfg.px_per_row * rows.len() as u32 + 160).max(320);

    if output_file.ends_with(".svg") {
        let root = SVGBackend::new(output_file, (cfg.px_width, px_height)).into_drawing_area();
        render_barplot(&root, &rows, &caption)?;
        root.present().map_err(|e| polars_err(Box::new(e)))?;
    } else {
        let root = BitMapBackend::new(output_file, (cfg.px_width, px_height)).into_drawing_area();
        render_barplot(&root, &rows, &caption)?;
        root.present().map_err(|e| polars_err(Box::new(e)))?;
    }

    info!("Completeness barplot saved to: {}", output_file);
    Ok(())
}

fn bar_rows(summaries: &DataFrame) -> PolarsResult<Vec<BarRow>> {
    let organisms = summaries.column("organism")?.str()?;
    let versions = summaries.column("version")?.str()?;
    let one_lines = summaries.column("one_line_summary")?.str()?;
    let single = summaries.column("single_copy")?.f64()?;
    let multi = summaries.column("multi_copy")?.f64()?;
    let fragmented = summaries.column("fragmented")?.f64()?;
    let missing = summaries.column("missing")?.f64()?;

    let mut rows = Vec::with_capacity(summaries.height());
    for i in 0..summaries.height() {
        let (Some(organism), Some(s), Some(m), Some(f), Some(mi)) = (
            organisms.get(i),
            single.get(i),
            multi.get(i),
            fragmented.get(i),
            missing.get(i),
        ) else {
            continue;
        };
        let label = match versions.get(i) {
            Some(v) if !v.is_empty() => format!("{} {}", organism, v),
            _ => organism.to_string(),
        };
        rows.push(BarRow {
            label,
            one_line_summary: one_lines.get(i).unwrap_or("").to_string(),
            segments: [s, m, f, mi],
        });
    }
    Ok(rows)
}

/// "<dataset> <group> - completeness of assembly", built from the first
/// summary row.
fn plot_caption(summaries: &DataFrame) -> PolarsResult<String> {
    let dataset = summaries
        .column("dataset_name")?
        .str()?
        .get(0)
        .unwrap_or("unknown");
    let group = summaries.column("group")?.str()?.get(0).unwrap_or("");
    Ok(format!("{} {} - completeness of assembly", dataset, group).trim().to_string())
}

fn render_barplot<DB: DrawingBackend>(
    root: &DrawingArea<DB, Shift>,
    rows: &[BarRow],
    caption: &str,
) -> PolarsResult<()>
where
    DB::ErrorType: 'static,
{
    root.fill(&WHITE).map_err(|e| polars_err(Box::new(e)))?;

    let labels: Vec<String> = rows.iter().map(|r| r.label.clone()).collect();
    let n = rows.len();

    let mut chart = ChartBuilder::on(root)
        .caption(caption, ("sans-serif", 26))
        .margin(16)
        .x_label_area_size(40)
        .y_label_area_size(220)
        .build_cartesian_2d(0.0..100.0f64, -0.5..(n as f64 - 0.5))
        .map_err(|e| polars_err(Box::new(e)))?;

    chart
        .configure_mesh()
        .disable_y_mesh()
        .x_desc("Percentage")
        .y_labels(n)
        .y_label_formatter(&|y| {
            let idx = y.round() as i64;
            if (y - idx as f64).abs() < 1e-6 && (0..n as i64).contains(&idx) {
                labels[idx as usize].clone()
            } else {
                String::new()
            }
        })
        .axis_desc_style(("sans-serif", 16))
        .label_style(("sans-serif", 14))
        .draw()
        .map_err(|e| polars_err(Box::new(e)))?;

    let series = [
        ("Complete - single", SINGLE_COLOR),
        ("Complete - multi", MULTI_COLOR),
        ("Fragmented", FRAGMENTED_COLOR),
        ("Missing", MISSING_COLOR),
    ];

    for (seg, (name, color)) in series.iter().enumerate() {
        let color = *color;
        let anno = chart
            .draw_series(rows.iter().enumerate().map(|(i, row)| {
                let x0: f64 = row.segments[..seg].iter().sum();
                let x1 = x0 + row.segments[seg];
                let y = i as f64;
                Rectangle::new([(x0, y - 0.35), (x1, y + 0.35)], color.filled())
            }))
            .map_err(|e| polars_err(Box::new(e)))?;
        anno.label(*name).legend(move |(x, y)| {
            Rectangle::new([(x, y - 5), (x + 12, y + 5)], color.filled())
        });
    }

    // The one-line summary is printed over each bar.
    chart
        .draw_series(rows.iter().enumerate().map(|(i, row)| {
            Text::new(
                row.one_line_summary.clone(),
                (50.0, i as f64),
                ("sans-serif", 13)
                    .into_font()
                    .color(&WHITE)
                    .pos(Pos::new(HPos::Center, VPos::Center)),
            )
        }))
        .map_err(|e| polars_err(Box::new(e)))?;

    chart
        .configure_series_labels()
        .background_style(WHITE.mix(0.8))
        .border_style(&BLACK)
        .position(SeriesLabelPosition::LowerRight)
        .draw()
        .map_err(|e| polars_err(Box::new(e)))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use polars::df;

    fn summary_frame() -> DataFrame {
        df![
            "organism" => &["Testus exampli", "Alius organismus"],
            "version" => &["v1", ""],
            "group" => &["fungi", "fungi"],
            "dataset_name" => &["eukaryota_odb10", "eukaryota_odb10"],
            "one_line_summary" => &["C:95.2%[S:94.1%,D:1.1%],F:2.0%,M:2.8%,n:255", ""],
            "single_copy" => &[94.1, 80.0],
            "multi_copy" => &[1.1, 5.0],
            "fragmented" => &[2.0, 5.0],
            "missing" => &[2.8, 10.0]
        ]
        .unwrap()
    }

    #[test]
    fn rows_stack_to_one_hundred_percent() {
        let rows = bar_rows(&summary_frame()).unwrap();
        assert_eq!(rows.len(), 2);
        for row in &rows {
            let total: f64 = row.segments.iter().sum();
            assert!((total - 100.0).abs() < 0.5);
        }
        assert_eq!(rows[0].label, "Testus exampli v1");
        assert_eq!(rows[1].label, "Alius organismus");
    }

    #[test]
    fn caption_names_the_dataset_and_group() {
        let caption = plot_caption(&summary_frame()).unwrap();
        assert_eq!(caption, "eukaryota_odb10 fungi - completeness of assembly");
    }

    #[test]
    fn empty_frame_is_an_error() {
        let empty = summary_frame().head(Some(0));
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("b.png");
        assert!(organism_busco_barplot(
            &empty,
            path.to_str().unwrap(),
            &BarplotConfig::default()
        )
        .is_err());
    }

    #[test]
    #[ignore = "renders through the bitmap backend; needs system fonts"]
    fn renders_png_smoke() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("barplot.png");
        organism_busco_barplot(
            &summary_frame(),
            path.to_str().unwrap(),
            &BarplotConfig::default(),
        )
        .unwrap();
        assert!(path.metadata().unwrap().len() > 0);
    }
}
