use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};
use polars::prelude::*;

use crate::graphics::Canvas2d;
use crate::models::polars_err;

const ARC_SAMPLES: usize = 24;

struct GlyphLabel {
    x: f64,
    y: f64,
    text: String,
    font_px: u32,
}

struct Region {
    x0: f64,
    y0: f64,
    x1: f64,
    y1: f64,
    color: RGBColor,
}

/// A chromosome bar in plot coordinates.
///
/// `x_end` / `y_end` mark the edge facing the plot interior, so they may be
/// numerically smaller than the start coordinates (right-hand or top-row
/// bars in synteny diagrams). `size` is the genomic length the bar
/// represents; `relative_position` maps a genomic coordinate onto the
/// interior edge for link anchoring.
pub struct Chromosome {
    pub x_start: f64,
    pub x_end: f64,
    pub y_start: f64,
    pub y_end: f64,
    pub size: f64,
    pub horizontal: bool,
    round_edges: bool,
    labels: Vec<GlyphLabel>,
    regions: Vec<Region>,
}

impl Chromosome {
    pub fn new(x_start: f64, x_end: f64, y_start: f64, y_end: f64, size: f64) -> Self {
        Chromosome {
            x_start,
            x_end,
            y_start,
            y_end,
            size,
            horizontal: true,
            round_edges: false,
            labels: Vec::new(),
            regions: Vec::new(),
        }
    }

    pub fn vertical(mut self) -> Self {
        self.horizontal = false;
        self
    }

    pub fn with_round_edges(mut self) -> Self {
        self.round_edges = true;
        self
    }

    pub fn add_label(&mut self, x: f64, y: f64, text: &str, font_px: u32) {
        self.labels.push(GlyphLabel {
            x,
            y,
            text: text.to_string(),
            font_px,
        });
    }

    pub fn add_region(&mut self, x0: f64, y0: f64, x1: f64, y1: f64, color: RGBColor) {
        self.regions.push(Region { x0, y0, x1, y1, color });
    }

    /// Map a genomic position onto the bar's interior edge.
    pub fn relative_position(&self, position: f64) -> (f64, f64) {
        if self.horizontal {
            (
                position * (self.x_end - self.x_start) / self.size + self.x_start,
                self.y_end,
            )
        } else {
            (
                self.x_end,
                position * (self.y_end - self.y_start) / self.size + self.y_start,
            )
        }
    }

    pub fn draw<DB: DrawingBackend>(&self, chart: &mut Canvas2d<DB>) -> PolarsResult<()>
    where
        DB::ErrorType: 'static,
    {
        let (xa, xb) = ordered(self.x_start, self.x_end);
        let (ya, yb) = ordered(self.y_start, self.y_end);
        let outline = BLACK.stroke_width(1);

        // Long edges.
        if self.horizontal {
            for y in [ya, yb] {
                chart
                    .draw_series(std::iter::once(PathElement::new(
                        vec![(xa, y), (xb, y)],
                        outline,
                    )))
                    .map_err(|e| polars_err(Box::new(e)))?;
            }
        } else {
            for x in [xa, xb] {
                chart
                    .draw_series(std::iter::once(PathElement::new(
                        vec![(x, ya), (x, yb)],
                        outline,
                    )))
                    .map_err(|e| polars_err(Box::new(e)))?;
            }
        }

        // Short edges: straight caps or sampled semicircles.
        if self.round_edges {
            for arc in self.end_arcs() {
                chart
                    .draw_series(std::iter::once(PathElement::new(arc, outline)))
                    .map_err(|e| polars_err(Box::new(e)))?;
            }
        } else if self.horizontal {
            for x in [xa, xb] {
                chart
                    .draw_series(std::iter::once(PathElement::new(
                        vec![(x, ya), (x, yb)],
                        outline,
                    )))
                    .map_err(|e| polars_err(Box::new(e)))?;
            }
        } else {
            for y in [ya, yb] {
                chart
                    .draw_series(std::iter::once(PathElement::new(
                        vec![(xa, y), (xb, y)],
                        outline,
                    )))
                    .map_err(|e| polars_err(Box::new(e)))?;
            }
        }

        for region in &self.regions {
            let (rx0, rx1) = ordered(region.x0, region.x1);
            let (ry0, ry1) = ordered(region.y0, region.y1);
            chart
                .draw_series(std::iter::once(Rectangle::new(
                    [(rx0, ry0), (rx1, ry1)],
                    region.color.filled(),
                )))
                .map_err(|e| polars_err(Box::new(e)))?;
        }

        for label in &self.labels {
            let style = ("sans-serif", label.font_px)
                .into_font()
                .color(&BLACK)
                .pos(Pos::new(HPos::Center, VPos::Center));
            chart
                .draw_series(std::iter::once(Text::new(
                    label.text.clone(),
                    (label.x, label.y),
                    style,
                )))
                .map_err(|e| polars_err(Box::new(e)))?;
        }

        Ok(())
    }

    fn end_arcs(&self) -> Vec<Vec<(f64, f64)>> {
        let (xa, xb) = ordered(self.x_start, self.x_end);
        let (ya, yb) = ordered(self.y_start, self.y_end);
        if self.horizontal {
            let cy = (ya + yb) / 2.0;
            let r = (yb - ya) / 2.0;
            vec![
                sample_arc(xa, cy, r, 90.0, 270.0),
                sample_arc(xb, cy, r, -90.0, 90.0),
            ]
        } else {
            let cx = (xa + xb) / 2.0;
            let r = (xb - xa) / 2.0;
            vec![
                sample_arc(cx, ya, r, 180.0, 360.0),
                sample_arc(cx, yb, r, 0.0, 180.0),
            ]
        }
    }
}

fn ordered(a: f64, b: f64) -> (f64, f64) {
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}

fn sample_arc(cx: f64, cy: f64, r: f64, theta_start: f64, theta_end: f64) -> Vec<(f64, f64)> {
    (0..=ARC_SAMPLES)
        .map(|i| {
            let t = theta_start + (theta_end - theta_start) * i as f64 / ARC_SAMPLES as f64;
            let rad = t.to_radians();
            (cx + r * rad.cos(), cy + r * rad.sin())
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn horizontal_relative_position_scales_along_x() {
        let c = Chromosome::new(10.0, 110.0, 5.0, 7.0, 1000.0);
        assert_eq!(c.relative_position(0.0), (10.0, 7.0));
        assert_eq!(c.relative_position(500.0), (60.0, 7.0));
        assert_eq!(c.relative_position(1000.0), (110.0, 7.0));
    }

    #[test]
    fn vertical_relative_position_scales_along_y() {
        let c = Chromosome::new(10.0, 12.0, 20.0, 80.0, 600.0).vertical();
        assert_eq!(c.relative_position(0.0), (12.0, 20.0));
        assert_eq!(c.relative_position(300.0), (12.0, 50.0));
    }

    #[test]
    fn inverted_bars_anchor_on_the_interior_edge() {
        // Right-column synteny bar: x_end is the edge facing the middle.
        let c = Chromosome::new(170.0, 168.0, 20.0, 80.0, 600.0).vertical();
        assert_eq!(c.relative_position(300.0), (168.0, 50.0));
    }

    #[test]
    fn arcs_stay_on_the_circle() {
        let c = Chromosome::new(0.0, 100.0, 0.0, 2.0, 1.0).with_round_edges();
        for arc in c.end_arcs() {
            assert_eq!(arc.len(), ARC_SAMPLES + 1);
            for (x, y) in arc {
                let on_left = ((x - 0.0).powi(2) + (y - 1.0).powi(2)).sqrt();
                let on_right = ((x - 100.0).powi(2) + (y - 1.0).powi(2)).sqrt();
                assert!((on_left - 1.0).abs() < 1e-9 || (on_right - 1.0).abs() < 1e-9);
            }
        }
    }
}
