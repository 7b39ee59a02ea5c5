//! Sinc-squared curve fitting
//!
//! Detector curves (DQE, MTF) are modelled with
//! `f(x) = p1 * sinc²(p3 * (x - p2)) + p4` where `sinc(u) = sin(πu)/(πu)`.
//! The 4 parameters are estimated with the `tiny_solver` Levenberg-Marquardt
//! optimizer seeded with `(1, 1, 1, 1)`.
//!
//! The fit is local: the seed suits curves whose main lobe is centered close
//! to 1. A curve peaked far from the seed, e.g. at `x = 0`, may settle in a
//! local minimum (an inverted lobe for instance) and still be returned as
//! converged. The residual sum of squares of [SincSquareFit] is the
//! diagnostic to check in that case.

use nalgebra::Vector4;
use serde::{Deserialize, Serialize};
use std::{collections::HashMap, f64::consts::PI};
use tiny_solver::{factors::na as ts_na, Optimizer};

#[derive(thiserror::Error, Debug, PartialEq)]
pub enum FitError {
    #[error("sample length mismatch: {0} abscissae for {1} ordinates")]
    LengthMismatch(usize, usize),
    #[error("at least 4 samples are required to fit 4 parameters, found {0}")]
    TooFewSamples(usize),
    #[error("the samples contain non-finite values")]
    NonFinite,
    #[error(
        "sinc-squared fit did not converge within {max_iterations} iterations \
         (residual sum of squares: {residual_sum_of_squares:e})"
    )]
    NotConverged {
        max_iterations: usize,
        residual_sum_of_squares: f64,
    },
}
pub type Result<T> = std::result::Result<T, FitError>;

/// Normalized sinc function, `sinc(0) = 1`
pub fn sinc(u: f64) -> f64 {
    if u.abs() < 1e-8 {
        1. - (PI * u).powi(2) / 6.
    } else {
        (PI * u).sin() / (PI * u)
    }
}
/// Derivative of the normalized sinc function
fn sinc_derivative(u: f64) -> f64 {
    if u.abs() < 1e-8 {
        -PI * PI * u / 3.
    } else {
        ((PI * u).cos() - sinc(u)) / u
    }
}

/// Sinc-squared model parameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SincSquareParams {
    /// p1
    pub amplitude: f64,
    /// p2
    pub center: f64,
    /// p3
    pub width: f64,
    /// p4
    pub offset: f64,
}
impl Default for SincSquareParams {
    fn default() -> Self {
        Self::from([1f64; 4])
    }
}
impl From<[f64; 4]> for SincSquareParams {
    fn from(p: [f64; 4]) -> Self {
        Self {
            amplitude: p[0],
            center: p[1],
            width: p[2],
            offset: p[3],
        }
    }
}
impl From<SincSquareParams> for [f64; 4] {
    fn from(p: SincSquareParams) -> Self {
        [p.amplitude, p.center, p.width, p.offset]
    }
}
impl SincSquareParams {
    /// Evaluates the model at `x`
    pub fn evaluate(&self, x: f64) -> f64 {
        self.amplitude * sinc((x - self.center) * self.width).powi(2) + self.offset
    }
    /// Model value and gradient with respect to (p1,p2,p3,p4) at `x`
    fn value_and_gradient(&self, x: f64) -> (f64, Vector4<f64>) {
        let dx = x - self.center;
        let u = dx * self.width;
        let s = sinc(u);
        let df_du = 2. * self.amplitude * s * sinc_derivative(u);
        (
            self.amplitude * s * s + self.offset,
            Vector4::new(s * s, -self.width * df_du, dx * df_du, 1.),
        )
    }
}

/// Levenberg-Marquardt solver settings
#[derive(Debug, Clone, Copy)]
pub struct FitOptions {
    /// maximum number of optimizer iterations
    pub max_iterations: usize,
    /// relative reduction of the sum of squares below which the optimizer stops
    pub ftol: f64,
    /// largest cosine between the residuals and any Jacobian column of a converged fit
    pub gtol: f64,
}
impl Default for FitOptions {
    fn default() -> Self {
        Self {
            max_iterations: 200,
            ftol: 1.49012e-8,
            gtol: 1e-3,
        }
    }
}

/// Sinc-squared fit result
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SincSquareFit {
    pub params: SincSquareParams,
    pub residual_sum_of_squares: f64,
}

/// Residual of one `(x,y)` sample
#[derive(Debug, Clone)]
struct SincSquareResidual {
    x: f64,
    y: f64,
}

fn sinc_of<T: ts_na::RealField>(u: T) -> T {
    let pu = T::pi() * u.clone();
    if u.clone() * u < ts_na::convert::<f64, T>(1e-16) {
        ts_na::convert::<f64, T>(1.) - pu.clone() * pu / ts_na::convert::<f64, T>(6.)
    } else {
        pu.clone().sin() / pu
    }
}

impl<T: ts_na::RealField> tiny_solver::factors::Factor<T> for SincSquareResidual {
    fn residual_func(&self, params: &[ts_na::DVector<T>]) -> ts_na::DVector<T> {
        let p = &params[0];
        let s = sinc_of((ts_na::convert::<f64, T>(self.x) - p[1].clone()) * p[2].clone());
        let f = p[0].clone() * s.clone() * s + p[3].clone();
        ts_na::DVector::<T>::from_vec(vec![ts_na::convert::<f64, T>(self.y) - f])
    }
}

fn sum_of_squares(x: &[f64], y: &[f64], params: &SincSquareParams) -> f64 {
    x.iter()
        .zip(y)
        .map(|(&x, &y)| (y - params.evaluate(x)).powi(2))
        .sum()
}

/// First order optimality of a fit
///
/// Either the residuals are negligible compared to the data or they are
/// orthogonal, within `gtol`, to every column of the Jacobian.
fn is_stationary(
    x: &[f64],
    y: &[f64],
    params: &SincSquareParams,
    cost: f64,
    options: &FitOptions,
) -> bool {
    let data: f64 = y.iter().map(|y| y * y).sum();
    if cost <= options.ftol.powi(2) * data {
        return true;
    }
    let mut gradient = Vector4::<f64>::zeros();
    let mut column_norms = Vector4::<f64>::zeros();
    for (&x, &y) in x.iter().zip(y) {
        let (f, j) = params.value_and_gradient(x);
        gradient += j * (y - f);
        column_norms += j.component_mul(&j);
    }
    let residual_norm = cost.sqrt();
    gradient
        .iter()
        .zip(column_norms.iter())
        .all(|(g, c)| g.abs() <= options.gtol * c.sqrt() * residual_norm)
}

/// Fits the sinc-squared model to the `(x,y)` samples with the default [FitOptions]
pub fn fit_sinc_square(x: &[f64], y: &[f64]) -> Result<SincSquareFit> {
    fit_sinc_square_with(x, y, &FitOptions::default())
}

/// Fits the sinc-squared model to the `(x,y)` samples
pub fn fit_sinc_square_with(x: &[f64], y: &[f64], options: &FitOptions) -> Result<SincSquareFit> {
    if x.len() != y.len() {
        return Err(FitError::LengthMismatch(x.len(), y.len()));
    }
    if x.len() < 4 {
        return Err(FitError::TooFewSamples(x.len()));
    }
    if !x.iter().chain(y).all(|v| v.is_finite()) {
        return Err(FitError::NonFinite);
    }

    let mut problem = tiny_solver::Problem::new();
    for (&x, &y) in x.iter().zip(y) {
        problem.add_residual_block(1, &["p"], Box::new(SincSquareResidual { x, y }), None);
    }
    let seed = SincSquareParams::default();
    let initial_values = HashMap::from([(
        "p".to_string(),
        ts_na::DVector::<f64>::from_vec(<[f64; 4]>::from(seed).to_vec()),
    )]);

    let optimizer = tiny_solver::LevenbergMarquardtOptimizer::default();
    let solver_options = tiny_solver::OptimizerOptions {
        max_iteration: options.max_iterations.max(1),
        verbosity_level: 0,
        min_abs_error_decrease_threshold: 0.,
        min_rel_error_decrease_threshold: options.ftol,
        min_error_threshold: 0.,
        ..Default::default()
    };
    let fitted = optimizer
        .optimize(&problem, &initial_values, Some(solver_options))
        .and_then(|result| result.get("p").cloned())
        .filter(|p| p.len() == 4 && p.iter().all(|v| v.is_finite()))
        .map(|p| SincSquareParams::from([p[0], p[1], p[2], p[3]]));
    let Some(params) = fitted else {
        return Err(FitError::NotConverged {
            max_iterations: options.max_iterations,
            residual_sum_of_squares: sum_of_squares(x, y, &seed),
        });
    };

    let cost = sum_of_squares(x, y, &params);
    if !is_stationary(x, y, &params, cost, options) {
        return Err(FitError::NotConverged {
            max_iterations: options.max_iterations,
            residual_sum_of_squares: cost,
        });
    }
    log::info!("chi-square value for fitting sinc function is {cost:e}");
    Ok(SincSquareFit {
        params,
        residual_sum_of_squares: cost,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn samples(params: &SincSquareParams, n: usize) -> (Vec<f64>, Vec<f64>) {
        (0..n)
            .map(|i| {
                let x = i as f64 / (n - 1) as f64;
                (x, params.evaluate(x))
            })
            .unzip()
    }

    fn assert_recovered(fitted: &SincSquareParams, truth: &SincSquareParams) {
        let rel = |a: f64, b: f64| (a - b).abs() / b.abs();
        assert!(rel(fitted.amplitude, truth.amplitude) < 1e-3, "{fitted:?}");
        assert!(rel(fitted.center, truth.center) < 1e-3, "{fitted:?}");
        // sinc² is even: the width is defined up to its sign
        assert!(rel(fitted.width.abs(), truth.width) < 1e-3, "{fitted:?}");
        assert!(rel(fitted.offset, truth.offset) < 1e-3, "{fitted:?}");
    }

    #[test]
    fn sinc_is_finite_at_zero() {
        assert_eq!(sinc(0.), 1.);
        assert!((sinc(0.5) - 2. / PI).abs() < 1e-15);
        assert!(sinc(1.).abs() < 1e-15);
        let params = SincSquareParams::from([0.5, 0.25, 2., 0.1]);
        assert_eq!(params.evaluate(0.25), 0.6);
    }

    #[test]
    fn gradient_matches_finite_differences() {
        let params = SincSquareParams::from([0.9, 0.3, 1.7, 0.05]);
        let x = 0.8;
        let (_, grad) = params.value_and_gradient(x);
        let p: [f64; 4] = params.into();
        for i in 0..4 {
            let eps = 1e-6;
            let mut up = p;
            up[i] += eps;
            let mut down = p;
            down[i] -= eps;
            let fd = (SincSquareParams::from(up).evaluate(x)
                - SincSquareParams::from(down).evaluate(x))
                / (2. * eps);
            assert!((fd - grad[i]).abs() < 1e-6, "{i}: {fd} {}", grad[i]);
        }
    }

    #[test]
    fn recovers_synthetic_parameters() {
        for truth in [
            SincSquareParams::from([1.1, 1.2, 0.8, 0.05]),
            SincSquareParams::from([0.9, 0.9, 1.1, 0.02]),
            SincSquareParams::from([0.7, 1.05, 0.95, 0.1]),
        ] {
            let (x, y) = samples(&truth, 50);
            let fit = fit_sinc_square(&x, &y).unwrap();
            assert_recovered(&fit.params, &truth);
            assert!(fit.residual_sum_of_squares < 1e-12);
        }
    }

    #[test]
    fn sample_at_center_does_not_produce_nan() {
        let truth = SincSquareParams::from([0.9, 0.9, 1.1, 0.02]);
        let mut x: Vec<f64> = (0..20).map(|i| i as f64 / 19.).collect();
        x.push(0.9);
        let y: Vec<f64> = x.iter().map(|&x| truth.evaluate(x)).collect();
        assert!(y.iter().all(|y| y.is_finite()));
        let fit = fit_sinc_square(&x, &y).unwrap();
        assert!(fit.residual_sum_of_squares.is_finite());
        assert_recovered(&fit.params, &truth);
    }

    #[test]
    fn reports_non_convergence() {
        let truth = SincSquareParams::from([1.1, 1.2, 0.8, 0.05]);
        let (x, y) = samples(&truth, 50);
        let options = FitOptions {
            max_iterations: 1,
            ..Default::default()
        };
        match fit_sinc_square_with(&x, &y, &options) {
            Err(FitError::NotConverged {
                max_iterations,
                residual_sum_of_squares,
            }) => {
                assert_eq!(max_iterations, 1);
                assert!(residual_sum_of_squares > 0.);
            }
            other => panic!("expected a convergence failure, got {other:?}"),
        }
    }

    #[test]
    fn residual_reported_for_curve_peaked_at_origin() {
        // DQE-like curve, far from the seed
        let truth = SincSquareParams::from([0.8, 0., 1.2, 0.1]);
        let (x, y) = samples(&truth, 50);
        match fit_sinc_square(&x, &y) {
            Ok(fit) => {
                let rss = sum_of_squares(&x, &y, &fit.params);
                assert_eq!(fit.residual_sum_of_squares, rss);
                assert!(rss.is_finite());
            }
            Err(FitError::NotConverged {
                residual_sum_of_squares,
                ..
            }) => assert!(residual_sum_of_squares.is_finite()),
            Err(e) => panic!("unexpected fit error: {e}"),
        }
    }

    #[test]
    fn stationarity_of_exact_and_seed_parameters() {
        let truth = SincSquareParams::from([0.9, 0.9, 1.1, 0.02]);
        let (x, y) = samples(&truth, 30);
        let options = FitOptions::default();
        assert!(is_stationary(&x, &y, &truth, 0., &options));
        let seed = SincSquareParams::default();
        let cost = sum_of_squares(&x, &y, &seed);
        assert!(cost > 0.);
        assert!(!is_stationary(&x, &y, &seed, cost, &options));
    }

    #[test]
    fn generic_sinc_matches_sinc() {
        for u in [0., 1e-9, 0.3, -0.7, 1., 2.5] {
            assert!((sinc_of(u) - sinc(u)).abs() < 1e-15, "{u}");
        }
    }

    #[test]
    fn rejects_invalid_samples() {
        assert_eq!(
            fit_sinc_square(&[0., 1., 2.], &[0., 1.]).unwrap_err(),
            FitError::LengthMismatch(3, 2)
        );
        assert_eq!(
            fit_sinc_square(&[0., 1., 2.], &[0., 1., 2.]).unwrap_err(),
            FitError::TooFewSamples(3)
        );
        assert_eq!(
            fit_sinc_square(&[0., 1., 2., f64::NAN], &[0., 1., 2., 3.]).unwrap_err(),
            FitError::NonFinite
        );
    }
}
