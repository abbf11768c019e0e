//! Linear models
//!
//! Ordinary least squares and ridge-stabilised logistic regression on dense
//! design matrices.
use crate::constants::{CONDITION_LIMIT, LOGISTIC_MAX_ITER, LOGISTIC_RIDGE, LOGISTIC_TOLERANCE};
use crate::errors::EstimationFailure;
use nalgebra::{DMatrix, DVector};

/// Build a design matrix from columns, with a leading column of ones when `intercept` is set.
pub fn design_matrix(columns: &[&[f64]], intercept: bool) -> DMatrix<f64> {
    design_matrix_with_rows(columns.first().map_or(0, |c| c.len()), columns, intercept)
}

/// As [`design_matrix`], with the row count given so that an empty column
/// list still yields `nrows` rows of intercept.
pub fn design_matrix_with_rows(nrows: usize, columns: &[&[f64]], intercept: bool) -> DMatrix<f64> {
    let offset = usize::from(intercept);
    DMatrix::from_fn(nrows, columns.len() + offset, |i, j| {
        if intercept && j == 0 {
            1.0
        } else {
            columns[j - offset][i]
        }
    })
}

/// Fail with `Collinear` when the smallest singular value is negligible.
pub fn check_conditioning(x: &DMatrix<f64>) -> Result<(), EstimationFailure> {
    let singular_values = x.clone().svd(false, false).singular_values;
    let max = singular_values.max();
    let min = singular_values.min();
    if max.is_nan() || max <= 0.0 || min / max < CONDITION_LIMIT {
        Err(EstimationFailure::Collinear)
    } else {
        Ok(())
    }
}

/// Result of an ordinary least-squares fit.
#[derive(Debug, Clone)]
pub struct LinearFit {
    pub coefficients: DVector<f64>,
    pub standard_errors: DVector<f64>,
    pub residuals: DVector<f64>,
    /// `(X'X)^-1`
    pub xtx_inverse: DMatrix<f64>,
    /// Residual variance estimate.
    pub sigma2: f64,
    /// Residual degrees of freedom.
    pub df: usize,
}

impl LinearFit {
    pub fn coefficient(&self, j: usize) -> f64 {
        self.coefficients[j]
    }

    pub fn standard_error(&self, j: usize) -> f64 {
        self.standard_errors[j]
    }
}

/// Least-squares fit of `y` on `x` with classical standard errors.
pub fn ols(x: &DMatrix<f64>, y: &[f64]) -> Result<LinearFit, EstimationFailure> {
    let (n, p) = x.shape();
    if n <= p {
        return Err(EstimationFailure::InsufficientSamples {
            required: p + 1,
            found: n,
        });
    }
    check_conditioning(x)?;
    let xt = x.transpose();
    let cholesky = (&xt * x).cholesky().ok_or(EstimationFailure::Collinear)?;
    let y = DVector::from_column_slice(y);
    let coefficients = cholesky.solve(&(&xt * &y));
    let residuals = &y - x * &coefficients;
    let df = n - p;
    let sigma2 = residuals.norm_squared() / df as f64;
    let xtx_inverse = cholesky.inverse();
    let standard_errors = DVector::from_fn(p, |j, _| (sigma2 * xtx_inverse[(j, j)]).max(0.0).sqrt());
    if coefficients.iter().any(|c| !c.is_finite()) {
        return Err(EstimationFailure::NonFinite);
    }
    Ok(LinearFit {
        coefficients,
        standard_errors,
        residuals,
        xtx_inverse,
        sigma2,
        df,
    })
}

/// Fitted values `X b`.
pub fn fitted(x: &DMatrix<f64>, coefficients: &DVector<f64>) -> Vec<f64> {
    (x * coefficients).iter().copied().collect()
}

#[inline]
fn sigmoid(z: f64) -> f64 {
    1.0 / (1.0 + (-z.clamp(-35.0, 35.0)).exp())
}

/// Logistic regression of a 0/1 response by iteratively reweighted least squares.
///
/// A small ridge penalty keeps the Newton steps defined under separation.
pub fn logistic(x: &DMatrix<f64>, y: &[f64]) -> Result<DVector<f64>, EstimationFailure> {
    let (n, p) = x.shape();
    let y = DVector::from_column_slice(y);
    let xt = x.transpose();
    let mut beta = DVector::<f64>::zeros(p);
    for _ in 0..LOGISTIC_MAX_ITER {
        let prob = (x * &beta).map(sigmoid);
        let mut weighted = x.clone();
        for i in 0..n {
            weighted.row_mut(i).scale_mut((prob[i] * (1.0 - prob[i])).max(1e-10));
        }
        let mut hessian = &xt * weighted;
        for j in 0..p {
            hessian[(j, j)] += LOGISTIC_RIDGE;
        }
        let gradient = &xt * (&y - &prob) - &beta * LOGISTIC_RIDGE;
        let step = hessian.cholesky().ok_or(EstimationFailure::Collinear)?.solve(&gradient);
        beta += &step;
        if step.amax() < LOGISTIC_TOLERANCE {
            break;
        }
    }
    if beta.iter().all(|b| b.is_finite()) {
        Ok(beta)
    } else {
        Err(EstimationFailure::NonFinite)
    }
}

/// Predicted probabilities of a logistic fit.
pub fn predict_proba(x: &DMatrix<f64>, beta: &DVector<f64>) -> Vec<f64> {
    (x * beta).iter().map(|z| sigmoid(*z)).collect()
}

/// Propensity scores `P(T = 1 | covariates)` clipped to `[clip, 1 - clip]`.
///
/// Covariates are standardised first; constant covariates are dropped. With
/// nothing left the model is intercept-only and every score is the treated share.
pub fn propensity_scores(covariates: &[&[f64]], treatment: &[f64], clip: f64) -> Result<Vec<f64>, EstimationFailure> {
    let standardized: Vec<Vec<f64>> = covariates
        .iter()
        .filter_map(|c| super::stats::standardize(c))
        .collect();
    let columns: Vec<&[f64]> = standardized.iter().map(|c| c.as_slice()).collect();
    let x = design_matrix_with_rows(treatment.len(), &columns, true);
    let beta = logistic(&x, treatment)?;
    Ok(predict_proba(&x, &beta)
        .into_iter()
        .map(|p| p.clamp(clip, 1.0 - clip))
        .collect())
}
