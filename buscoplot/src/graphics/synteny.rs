use std::collections::HashMap;

use plotters::coord::Shift;
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};
use polars::prelude::*;
use tracing::{debug, info, warn};

use crate::graphics::chromosome::Chromosome;
use crate::graphics::link::Link;
use crate::graphics::Canvas2d;
use crate::helper_functions::lowercase_columns;
use crate::models::{polars_err, BuscoStatus};
use crate::plot_config::SyntenyConfig;

const VERTICAL_X_LIM: f64 = 180.0;
const HORIZONTAL_X_LIM: f64 = 300.0;
const Y_LIM: f64 = 100.0;
// Plot units available for the chromosome bars of one karyotype.
const CHR_SPAN: f64 = 90.0;

const LINK_GRAY: RGBColor = RGBColor(209, 209, 209);

/// Synteny diagram with the two karyotypes as left and right columns and
/// shared markers drawn as curved links between them.
pub fn vertical_synteny_plot(
    karyotype_1: &DataFrame,
    fulltable_1: &DataFrame,
    karyotype_2: &DataFrame,
    fulltable_2: &DataFrame,
    title: &str,
    output_file: &str,
    cfg: &SyntenyConfig,
) -> PolarsResult<()> {
    synteny_plot(
        karyotype_1,
        fulltable_1,
        karyotype_2,
        fulltable_2,
        title,
        output_file,
        cfg,
        false,
    )
}

/// Synteny diagram with the two karyotypes as top and bottom rows.
pub fn horizontal_synteny_plot(
    karyotype_1: &DataFrame,
    fulltable_1: &DataFrame,
    karyotype_2: &DataFrame,
    fulltable_2: &DataFrame,
    title: &str,
    output_file: &str,
    cfg: &SyntenyConfig,
) -> PolarsResult<()> {
    synteny_plot(
        karyotype_1,
        fulltable_1,
        karyotype_2,
        fulltable_2,
        title,
        output_file,
        cfg,
        true,
    )
}

#[allow(clippy::too_many_arguments)]
fn synteny_plot(
    karyotype_1: &DataFrame,
    fulltable_1: &DataFrame,
    karyotype_2: &DataFrame,
    fulltable_2: &DataFrame,
    title: &str,
    output_file: &str,
    cfg: &SyntenyConfig,
    horizontal: bool,
) -> PolarsResult<()> {
    let mut karyotype_1 = karyotype_1.clone();
    let mut karyotype_2 = karyotype_2.clone();
    lowercase_columns(&mut karyotype_1)?;
    lowercase_columns(&mut karyotype_2)?;

    if karyotype_1.height() == 0 || karyotype_2.height() == 0 {
        return Err(PolarsError::ComputeError(
            "both karyotypes need at least one chromosome".into(),
        ));
    }

    let shared = shared_markers(fulltable_1, fulltable_2)?;
    debug!("{} markers shared between the two assemblies", shared.height());
    if shared.height() == 0 {
        warn!("No Complete markers shared; the diagram will have no links");
    }

    let size = (cfg.px_width, cfg.px_height);
    if output_file.ends_with(".svg") {
        let root = SVGBackend::new(output_file, size).into_drawing_area();
        render_synteny(
            &root, &karyotype_1, &karyotype_2, &shared, title, cfg, horizontal,
        )?;
        root.present().map_err(|e| polars_err(Box::new(e)))?;
    } else {
        let root = BitMapBackend::new(output_file, size).into_drawing_area();
        render_synteny(
            &root, &karyotype_1, &karyotype_2, &shared, title, cfg, horizontal,
        )?;
        root.present().map_err(|e| polars_err(Box::new(e)))?;
    }

    info!("Synteny plot saved to: {}", output_file);
    Ok(())
}

/// Markers Complete in both full tables, joined on their BUSCO id.
fn shared_markers(fulltable_1: &DataFrame, fulltable_2: &DataFrame) -> PolarsResult<DataFrame> {
    let complete = |df: &DataFrame, suffix: &str| {
        df.clone()
            .lazy()
            .filter(col("status").eq(lit(BuscoStatus::Complete.as_str())))
            .select([
                col("busco_id"),
                col("sequence").alias(format!("sequence_{}", suffix).as_str()),
                col("gene_start")
                    .cast(DataType::Float64)
                    .alias(format!("start_{}", suffix).as_str()),
            ])
    };

    complete(fulltable_1, "1")
        .join(
            complete(fulltable_2, "2"),
            [col("busco_id")],
            [col("busco_id")],
            JoinArgs::new(JoinType::Inner),
        )
        .collect()
}

/// Lay one karyotype out as a column (or row) of proportional bars and hand
/// back the glyphs keyed by chromosome name.
fn layout_karyotype(
    karyotype: &DataFrame,
    cfg: &SyntenyConfig,
    horizontal: bool,
    first_side: bool,
) -> PolarsResult<Vec<(String, Chromosome)>> {
    let chrs = karyotype.column("chr")?.str()?;
    let ends = karyotype.column("end")?.f64()?;
    let n = karyotype.height();

    let chr_len_sum: f64 = ends.iter().flatten().sum();
    if !(chr_len_sum > 0.0) {
        return Err(PolarsError::ComputeError(
            "karyotype lengths must be positive".into(),
        ));
    }
    let name_margin = chrs.iter().flatten().map(str::len).max().unwrap_or(1) as f64;
    // The top/bottom rows stretch over the wider x axis; the left/right
    // columns share the y axis.
    let span = if horizontal {
        CHR_SPAN * HORIZONTAL_X_LIM / Y_LIM
    } else {
        CHR_SPAN
    };
    let scale = (span - cfg.chr_distance * n as f64) / chr_len_sum;

    let mut glyphs = Vec::with_capacity(n);
    let mut step = 0.0;
    for idx in 0..n {
        let (name, chr_dim) = match (chrs.get(idx), ends.get(idx)) {
            (Some(name), Some(end)) => (name, end),
            _ => continue,
        };
        let extent = chr_dim * scale;

        let glyph = if horizontal {
            // Top and bottom rows; the inner edge faces the middle gap.
            let x_start = cfg.chr_distance + step + name_margin;
            let x_end = x_start + extent;
            step = x_end - name_margin;
            let (y_outer, y_inner, label_y) = if first_side {
                (Y_LIM - 18.0 + cfg.dim, Y_LIM - 18.0, Y_LIM - 12.0)
            } else {
                (18.0 - cfg.dim, 18.0, 10.0)
            };
            let mut g = Chromosome::new(x_start, x_end, y_outer, y_inner, chr_dim);
            g.add_label((x_start + x_end) / 2.0, label_y, name, 12);
            g
        } else {
            // Left and right columns.
            let y_start = cfg.chr_distance + step;
            let y_end = y_start + extent;
            step = y_end;
            let (x_outer, x_inner, label_x) = if first_side {
                (name_margin, name_margin + cfg.dim, 3.0)
            } else {
                (
                    VERTICAL_X_LIM - name_margin,
                    VERTICAL_X_LIM - name_margin - cfg.dim,
                    VERTICAL_X_LIM - 3.0,
                )
            };
            let mut g = Chromosome::new(x_outer, x_inner, y_start, y_end, chr_dim).vertical();
            g.add_label(label_x, (y_start + y_end) / 2.0, name, 12);
            g
        };
        glyphs.push((name.to_string(), glyph));
    }
    Ok(glyphs)
}

#[allow(clippy::too_many_arguments)]
fn render_synteny<DB: DrawingBackend>(
    root: &DrawingArea<DB, Shift>,
    karyotype_1: &DataFrame,
    karyotype_2: &DataFrame,
    shared: &DataFrame,
    title: &str,
    cfg: &SyntenyConfig,
    horizontal: bool,
) -> PolarsResult<()>
where
    DB::ErrorType: 'static,
{
    root.fill(&WHITE).map_err(|e| polars_err(Box::new(e)))?;

    let x_lim = if horizontal {
        HORIZONTAL_X_LIM
    } else {
        VERTICAL_X_LIM
    };
    let mut chart = ChartBuilder::on(root)
        .build_cartesian_2d(0.0..x_lim, 0.0..Y_LIM)
        .map_err(|e| polars_err(Box::new(e)))?;

    chart
        .draw_series(std::iter::once(Text::new(
            title.to_string(),
            (x_lim / 2.0, Y_LIM - 3.0),
            ("sans-serif", 26)
                .into_font()
                .color(&BLACK)
                .pos(Pos::new(HPos::Center, VPos::Center)),
        )))
        .map_err(|e| polars_err(Box::new(e)))?;

    let side_1 = layout_karyotype(karyotype_1, cfg, horizontal, true)?;
    let side_2 = layout_karyotype(karyotype_2, cfg, horizontal, false)?;

    draw_links(&mut chart, &side_1, &side_2, shared, cfg, horizontal)?;

    // Bars go on top of the links so their outlines stay crisp.
    for (_, glyph) in side_1.iter().chain(side_2.iter()) {
        glyph.draw(&mut chart)?;
    }
    Ok(())
}

fn draw_links<DB: DrawingBackend>(
    chart: &mut Canvas2d<DB>,
    side_1: &[(String, Chromosome)],
    side_2: &[(String, Chromosome)],
    shared: &DataFrame,
    cfg: &SyntenyConfig,
    horizontal: bool,
) -> PolarsResult<()>
where
    DB::ErrorType: 'static,
{
    let by_name_1: HashMap<&str, &Chromosome> = side_1
        .iter()
        .map(|(name, glyph)| (name.as_str(), glyph))
        .collect();
    let by_name_2: HashMap<&str, &Chromosome> = side_2
        .iter()
        .map(|(name, glyph)| (name.as_str(), glyph))
        .collect();

    let seq_1 = shared.column("sequence_1")?.str()?;
    let seq_2 = shared.column("sequence_2")?.str()?;
    let start_1 = shared.column("start_1")?.f64()?;
    let start_2 = shared.column("start_2")?.f64()?;

    let mut skipped = 0usize;
    for i in 0..shared.height() {
        let (s1, s2, p1, p2) = match (seq_1.get(i), seq_2.get(i), start_1.get(i), start_2.get(i)) {
            (Some(s1), Some(s2), Some(p1), Some(p2)) => (s1, s2, p1, p2),
            _ => continue,
        };
        let (Some(c1), Some(c2)) = (by_name_1.get(s1), by_name_2.get(s2)) else {
            // Marker sits on a contig the karyotype does not list.
            skipped += 1;
            continue;
        };

        let mut link = Link::new(c1, c2, p1, p2, LINK_GRAY.mix(0.8));
        if !horizontal {
            link = link.horizontal();
        }
        if cfg.straight_links {
            link = link.straight();
        }
        link.draw(chart)?;
    }
    if skipped > 0 {
        debug!("{} links skipped: sequence missing from a karyotype", skipped);
    }
    Ok(())
}
