use plotters::coord::Shift;
use plotters::prelude::*;
use polars::prelude::*;
use tracing::{debug, info};

use crate::density::{density_from_features, DensitySeries};
use crate::helper_functions::lowercase_columns;
use crate::models::{polars_err, FeatureType};
use crate::plot_config::ChromoplotConfig;
use crate::smoothing::CubicSpline;

fn type_color(target: FeatureType) -> RGBColor {
    match target {
        FeatureType::Gene => RED,
        FeatureType::MRna => BLUE,
        FeatureType::Cds => BLACK,
        FeatureType::Exon => GREEN,
    }
}

/// Plot the gene density of each chromosome on stacked panels: per feature
/// type, the binned counts are spline-smoothed and drawn as a translucent
/// filled area. The raw series stays authoritative; the curve is display
/// only.
pub fn chromoplot(
    karyotype: &DataFrame,
    features: &DataFrame,
    title: &str,
    output_file: &str,
    cfg: &ChromoplotConfig,
) -> PolarsResult<()> {
    let mut karyotype = karyotype.clone();
    lowercase_columns(&mut karyotype)?;

    let n = karyotype.height();
    if n == 0 {
        return Err(PolarsError::ComputeError(
            "karyotype has no chromosomes to plot".into(),
        ));
    }

    let px_height = cfg.px_per_panel * n as u32 + 60;
    if output_file.ends_with(".svg") {
        let root = SVGBackend::new(output_file, (cfg.px_width, px_height)).into_drawing_area();
        render_chromoplot(&root, &karyotype, features, title, cfg)?;
        root.present().map_err(|e| polars_err(Box::new(e)))?;
    } else {
        let root = BitMapBackend::new(output_file, (cfg.px_width, px_height)).into_drawing_area();
        render_chromoplot(&root, &karyotype, features, title, cfg)?;
        root.present().map_err(|e| polars_err(Box::new(e)))?;
    }

    info!("Chromoplot saved to: {}", output_file);
    Ok(())
}

fn render_chromoplot<DB: DrawingBackend>(
    root: &DrawingArea<DB, Shift>,
    karyotype: &DataFrame,
    features: &DataFrame,
    title: &str,
    cfg: &ChromoplotConfig,
) -> PolarsResult<()>
where
    DB::ErrorType: 'static,
{
    root.fill(&WHITE).map_err(|e| polars_err(Box::new(e)))?;
    let root = root
        .titled(title, ("sans-serif", 24))
        .map_err(|e| polars_err(Box::new(e)))?;

    let chrs = karyotype.column("chr")?.str()?;
    let ends = karyotype.column("end")?.f64()?;

    let n = karyotype.height();
    let panels = root.split_evenly((n, 1));

    for (idx, panel) in panels.iter().enumerate() {
        let (name, length) = match (chrs.get(idx), ends.get(idx)) {
            (Some(name), Some(end)) => (name, end),
            _ => continue,
        };
        debug!("Binning chromosome {} ({} bp)", name, length);

        let mut series_by_type: Vec<(FeatureType, DensitySeries)> = Vec::new();
        for target in FeatureType::ALL {
            let series = density_from_features(features, name, target, length, cfg.bin_number)?;
            series_by_type.push((target, series));
        }
        let y_max = series_by_type
            .iter()
            .map(|(_, s)| s.max_count())
            .max()
            .unwrap_or(0)
            .max(1) as f64;

        let mut chart = ChartBuilder::on(panel)
            .caption(name, ("sans-serif", 18))
            .margin(8)
            .x_label_area_size(30)
            .y_label_area_size(45)
            .build_cartesian_2d(0.0..length, 0.0..y_max)
            .map_err(|e| polars_err(Box::new(e)))?;

        chart
            .configure_mesh()
            .disable_mesh()
            .x_desc("Chromosome position")
            .y_desc("Counts")
            .axis_desc_style(("sans-serif", 14))
            .label_style(("sans-serif", 12))
            .draw()
            .map_err(|e| polars_err(Box::new(e)))?;

        for (target, series) in &series_by_type {
            let band = smoothed_band(series, cfg.spline_samples, y_max)?;
            let color = type_color(*target);

            let anno = chart
                .draw_series(std::iter::once(Polygon::new(band, color.mix(0.2).filled())))
                .map_err(|e| polars_err(Box::new(e)))?;
            if idx == 0 {
                anno.label(target.as_str()).legend(move |(x, y)| {
                    Rectangle::new([(x, y - 5), (x + 12, y + 5)], color.mix(0.4).filled())
                });
            }
        }

        if idx == 0 {
            chart
                .configure_series_labels()
                .background_style(WHITE.mix(0.8))
                .border_style(&BLACK)
                .position(SeriesLabelPosition::UpperRight)
                .draw()
                .map_err(|e| polars_err(Box::new(e)))?;
        }
    }

    Ok(())
}

/// Sample the smoothed curve and close it down to the baseline so it can be
/// drawn as one filled polygon. Spline undershoot is clamped at zero.
fn smoothed_band(
    series: &DensitySeries,
    samples: usize,
    y_max: f64,
) -> PolarsResult<Vec<(f64, f64)>> {
    let ys: Vec<f64> = series.counts.iter().map(|&c| c as f64).collect();
    let spline = CubicSpline::fit(&series.edges, &ys)?;

    let mut band: Vec<(f64, f64)> = spline
        .sample(samples)
        .into_iter()
        .map(|(x, y)| (x, y.clamp(0.0, y_max)))
        .collect();
    let x_last = series.edges[series.edges.len() - 1];
    band.push((x_last, 0.0));
    band.push((series.edges[0], 0.0));
    Ok(band)
}

/// Dump the raw density series for every (chromosome, feature type) pair:
/// one row per edge with its count. The CSV is the authoritative companion
/// to the smoothed plot.
pub fn export_density_csv(
    karyotype: &DataFrame,
    features: &DataFrame,
    bin_number: usize,
    path: &str,
) -> PolarsResult<()> {
    let mut karyotype = karyotype.clone();
    lowercase_columns(&mut karyotype)?;

    let chrs = karyotype.column("chr")?.str()?;
    let ends = karyotype.column("end")?.f64()?;

    let mut writer = csv::Writer::from_path(path).map_err(|e| polars_err(Box::new(e)))?;
    writer
        .write_record(["sequence", "type", "edge", "count"])
        .map_err(|e| polars_err(Box::new(e)))?;

    for idx in 0..karyotype.height() {
        let (name, length) = match (chrs.get(idx), ends.get(idx)) {
            (Some(name), Some(end)) => (name, end),
            _ => continue,
        };
        for target in FeatureType::ALL {
            let series = density_from_features(features, name, target, length, bin_number)?;
            for (edge, count) in series.edges.iter().zip(series.counts.iter()) {
                writer
                    .write_record([
                        name,
                        target.as_str(),
                        &edge.to_string(),
                        &count.to_string(),
                    ])
                    .map_err(|e| polars_err(Box::new(e)))?;
            }
        }
    }

    writer.flush().map_err(|e| polars_err(Box::new(e)))?;
    info!("Density series written to: {}", path);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use polars::df;

    fn fixtures() -> (DataFrame, DataFrame) {
        let karyotype = df![
            "chr" => &["chr1"],
            "end" => &[1000.0]
        ]
        .unwrap();
        let features = df![
            "sequence" => &["chr1", "chr1", "chr1"],
            "type" => &["gene", "gene", "exon"],
            "start" => &[100.0, 600.0, 100.0],
            "end" => &[300.0, 700.0, 150.0]
        ]
        .unwrap();
        (karyotype, features)
    }

    #[test]
    fn band_is_closed_and_clamped() {
        let series = DensitySeries {
            edges: vec![0.0, 250.0, 500.0, 750.0, 1000.0],
            counts: vec![1, 1, 0, 0, 0],
        };
        let band = smoothed_band(&series, 50, 1.0).unwrap();
        assert_eq!(band.len(), 52);
        assert_eq!(band[band.len() - 2], (1000.0, 0.0));
        assert_eq!(band[band.len() - 1], (0.0, 0.0));
        for &(_, y) in &band {
            assert!((0.0..=1.0).contains(&y));
        }
    }

    #[test]
    fn density_export_lists_every_edge_for_every_type() {
        let (karyotype, features) = fixtures();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("density.csv");
        export_density_csv(&karyotype, &features, 4, path.to_str().unwrap()).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        // Header plus 4 feature types x 5 edges.
        assert_eq!(lines.len(), 1 + 4 * 5);
        assert_eq!(lines[0], "sequence,type,edge,count");
        assert!(lines.iter().any(|l| l.starts_with("chr1,gene,0,")));
        assert!(lines.iter().any(|l| l.starts_with("chr1,mRNA,")));
    }

    #[test]
    fn empty_karyotype_is_an_error() {
        let (_, features) = fixtures();
        let karyotype = df![
            "chr" => &[""; 0],
            "end" => &[0.0; 0]
        ]
        .unwrap();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("c.png");
        assert!(chromoplot(
            &karyotype,
            &features,
            "Chromoplot",
            path.to_str().unwrap(),
            &ChromoplotConfig::default()
        )
        .is_err());
    }

    #[test]
    #[ignore = "renders through the bitmap backend; needs system fonts"]
    fn renders_png_smoke() {
        let (karyotype, features) = fixtures();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("chromoplot.png");
        chromoplot(
            &karyotype,
            &features,
            "Chromoplot",
            path.to_str().unwrap(),
            &ChromoplotConfig::default(),
        )
        .unwrap();
        assert!(path.metadata().unwrap().len() > 0);
    }
}
