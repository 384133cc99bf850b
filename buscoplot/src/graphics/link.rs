use plotters::prelude::*;
use polars::prelude::*;

use crate::graphics::chromosome::Chromosome;
use crate::graphics::Canvas2d;
use crate::models::polars_err;

const CURVE_SAMPLES: usize = 100;

/// A ribbon between positions on two chromosome glyphs, drawn as a sampled
/// cubic Bézier (or a straight segment).
pub struct Link {
    start_point: (f64, f64),
    end_point: (f64, f64),
    color: RGBAColor,
    straight_line: bool,
    horizontal: bool,
    // Control anchors for the vertical mode: the facing edges of the two
    // glyphs pull the curve through the gap between them.
    c1_inner_y: f64,
    c2_inner_y: f64,
}

impl Link {
    pub fn new(c1: &Chromosome, c2: &Chromosome, p_1: f64, p_2: f64, color: RGBAColor) -> Self {
        Link {
            start_point: c1.relative_position(p_1),
            end_point: c2.relative_position(p_2),
            color,
            straight_line: false,
            horizontal: false,
            c1_inner_y: c1.y_end,
            c2_inner_y: c2.y_start,
        }
    }

    /// Curve between side-by-side glyphs (links run left to right).
    pub fn horizontal(mut self) -> Self {
        self.horizontal = true;
        self
    }

    pub fn straight(mut self) -> Self {
        self.straight_line = true;
        self
    }

    fn bezier(t: f64, p0: f64, p1: f64, p2: f64, p3: f64) -> f64 {
        let u = 1.0 - t;
        u * u * u * p0 + 3.0 * u * u * t * p1 + 3.0 * u * t * t * p2 + t * t * t * p3
    }

    fn curve_points(&self) -> Vec<(f64, f64)> {
        if self.straight_line {
            return vec![self.start_point, self.end_point];
        }

        let (sx, sy) = self.start_point;
        let (ex, ey) = self.end_point;
        (0..=CURVE_SAMPLES)
            .map(|i| {
                let t = i as f64 / CURVE_SAMPLES as f64;
                if self.horizontal {
                    let y_mid = (sy + ey) / 2.0;
                    (
                        Self::bezier(t, sx, sx, ex, ex),
                        Self::bezier(t, sy, y_mid, y_mid, ey),
                    )
                } else {
                    let x_mid = (sx + ex) / 2.0;
                    (
                        Self::bezier(t, sx, x_mid, x_mid, ex),
                        Self::bezier(t, sy, self.c1_inner_y, self.c2_inner_y, ey),
                    )
                }
            })
            .collect()
    }

    pub fn draw<DB: DrawingBackend>(&self, chart: &mut Canvas2d<DB>) -> PolarsResult<()>
    where
        DB::ErrorType: 'static,
    {
        chart
            .draw_series(std::iter::once(PathElement::new(
                self.curve_points(),
                self.color.stroke_width(1),
            )))
            .map_err(|e| polars_err(Box::new(e)))?;
        Ok(())
    }
}
