use ndarray::Array1;
use polars::prelude::*;

/// Natural cubic spline through a set of knots.
///
/// Used to turn the stepwise density series into a continuous curve for the
/// filled-area panels. Evaluation outside the knot range clamps to the
/// nearest endpoint value.
#[derive(Debug, Clone)]
pub struct CubicSpline {
    xs: Vec<f64>,
    ys: Vec<f64>,
    // Second derivative at each knot; zero at both ends (natural boundary).
    second_derivs: Vec<f64>,
}

impl CubicSpline {
    pub fn fit(xs: &[f64], ys: &[f64]) -> PolarsResult<Self> {
        if xs.len() != ys.len() {
            return Err(PolarsError::ComputeError(
                format!(
                    "spline knot mismatch: {} x values vs {} y values",
                    xs.len(),
                    ys.len()
                )
                .into(),
            ));
        }
        if xs.len() < 2 {
            return Err(PolarsError::ComputeError(
                "spline needs at least two knots".into(),
            ));
        }
        for pair in xs.windows(2) {
            if pair[1] <= pair[0] {
                return Err(PolarsError::ComputeError(
                    "spline knots must be strictly increasing".into(),
                ));
            }
        }

        let n = xs.len();
        let mut second_derivs = vec![0.0; n];

        if n > 2 {
            // Tridiagonal system for the interior second derivatives,
            // solved with the Thomas algorithm.
            let m = n - 2;
            let mut sub = Array1::<f64>::zeros(m);
            let mut diag = Array1::<f64>::zeros(m);
            let mut sup = Array1::<f64>::zeros(m);
            let mut rhs = Array1::<f64>::zeros(m);

            for i in 0..m {
                let h0 = xs[i + 1] - xs[i];
                let h1 = xs[i + 2] - xs[i + 1];
                sub[i] = h0;
                diag[i] = 2.0 * (h0 + h1);
                sup[i] = h1;
                rhs[i] = 6.0 * ((ys[i + 2] - ys[i + 1]) / h1 - (ys[i + 1] - ys[i]) / h0);
            }

            for i in 1..m {
                let w = sub[i] / diag[i - 1];
                diag[i] -= w * sup[i - 1];
                rhs[i] -= w * rhs[i - 1];
            }
            second_derivs[m] = rhs[m - 1] / diag[m - 1];
            for i in (0..m - 1).rev() {
                second_derivs[i + 1] = (rhs[i] - sup[i] * second_derivs[i + 2]) / diag[i];
            }
        }

        Ok(CubicSpline {
            xs: xs.to_vec(),
            ys: ys.to_vec(),
            second_derivs,
        })
    }

    pub fn eval(&self, x: f64) -> f64 {
        let n = self.xs.len();
        if x <= self.xs[0] {
            return self.ys[0];
        }
        if x >= self.xs[n - 1] {
            return self.ys[n - 1];
        }

        let k = match self
            .xs
            .partition_point(|&knot| knot <= x)
            .checked_sub(1)
        {
            Some(k) => k.min(n - 2),
            None => 0,
        };

        let h = self.xs[k + 1] - self.xs[k];
        let a = (self.xs[k + 1] - x) / h;
        let b = 1.0 - a;
        a * self.ys[k]
            + b * self.ys[k + 1]
            + ((a * a * a - a) * self.second_derivs[k]
                + (b * b * b - b) * self.second_derivs[k + 1])
                * h
                * h
                / 6.0
    }

    /// Sample the curve at `samples` evenly spaced positions across the knot
    /// range.
    pub fn sample(&self, samples: usize) -> Vec<(f64, f64)> {
        let n = samples.max(2);
        let x0 = self.xs[0];
        let x1 = self.xs[self.xs.len() - 1];
        let step = (x1 - x0) / (n - 1) as f64;
        (0..n)
            .map(|i| {
                let x = if i == n - 1 { x1 } else { x0 + i as f64 * step };
                (x, self.eval(x))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_bad_knots() {
        assert!(CubicSpline::fit(&[0.0], &[1.0]).is_err());
        assert!(CubicSpline::fit(&[0.0, 1.0], &[1.0]).is_err());
        assert!(CubicSpline::fit(&[0.0, 1.0, 1.0], &[1.0, 2.0, 3.0]).is_err());
        assert!(CubicSpline::fit(&[0.0, 2.0, 1.0], &[1.0, 2.0, 3.0]).is_err());
    }

    #[test]
    fn passes_through_its_knots() {
        let xs = [0.0, 1.0, 2.5, 4.0, 7.0];
        let ys = [0.0, 3.0, 1.0, 4.0, 2.0];
        let spline = CubicSpline::fit(&xs, &ys).unwrap();
        for (x, y) in xs.iter().zip(ys.iter()) {
            assert!((spline.eval(*x) - y).abs() < 1e-9);
        }
    }

    #[test]
    fn collinear_knots_reproduce_the_line() {
        let xs = [0.0, 1.0, 2.0, 3.0, 4.0];
        let ys: Vec<f64> = xs.iter().map(|x| 2.0 * x + 1.0).collect();
        let spline = CubicSpline::fit(&xs, &ys).unwrap();
        for i in 0..40 {
            let x = i as f64 * 0.1;
            assert!((spline.eval(x) - (2.0 * x + 1.0)).abs() < 1e-9);
        }
    }

    #[test]
    fn clamps_outside_the_knot_range() {
        let spline = CubicSpline::fit(&[0.0, 1.0, 2.0], &[5.0, 7.0, 3.0]).unwrap();
        assert_eq!(spline.eval(-10.0), 5.0);
        assert_eq!(spline.eval(10.0), 3.0);
    }

    #[test]
    fn two_knots_fall_back_to_linear() {
        let spline = CubicSpline::fit(&[0.0, 10.0], &[0.0, 5.0]).unwrap();
        assert!((spline.eval(4.0) - 2.0).abs() < 1e-9);
    }

    #[test]
    fn sample_covers_the_full_range() {
        let spline = CubicSpline::fit(&[0.0, 1.0, 2.0], &[0.0, 1.0, 0.0]).unwrap();
        let pts = spline.sample(11);
        assert_eq!(pts.len(), 11);
        assert_eq!(pts[0].0, 0.0);
        assert_eq!(pts[10].0, 2.0);
    }
}
