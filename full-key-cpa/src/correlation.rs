/*
 *  File: correlation.rs
 *  Author: Prasanna Paithankar (21CS30065)
 *  Date: 19/10/2026
 *
 *  Course: Hardware Security (CS60004) Spring 2025
 *  full-key-cpa: full AES-128 key recovery by correlation power analysis
 *
 *  Refer to the README.md for other details.
 */

use ndarray::{Array1, ArrayView1, Zip};

use crate::error::{CpaError, Result};

/// Pearson product-moment correlation of two equal-length vectors.
///
/// Both inputs are mean-centred; the mean of the element-wise product is
/// divided by the product of the population standard deviations. A constant
/// input has no variance and yields [`CpaError::DegenerateInput`] instead of NaN.
pub fn pearson(x: ArrayView1<f64>, y: ArrayView1<f64>) -> Result<f64> {
    if x.len() != y.len() {
        return Err(CpaError::DimensionMismatch {
            expected: x.len(),
            got: y.len(),
        });
    }
    if x.len() < 2 {
        return Err(CpaError::DegenerateInput("fewer than two points"));
    }
    if is_constant(x) || is_constant(y) {
        return Err(CpaError::DegenerateInput("zero variance"));
    }

    let n = x.len() as f64;
    let xs = centred_unit(x, n);
    let ys = centred_unit(y, n);

    let covariance = Zip::from(&xs)
        .and(&ys)
        .fold(0.0, |acc, &xi, &yi| acc + xi * yi)
        / n;

    let x_std = (xs.fold(0.0, |acc, &xi| acc + xi * xi) / n).sqrt();
    let y_std = (ys.fold(0.0, |acc, &yi| acc + yi * yi) / n).sqrt();

    let denominator = x_std * y_std;
    if denominator == 0.0 || !denominator.is_finite() {
        return Err(CpaError::DegenerateInput("zero variance"));
    }

    Ok((covariance / denominator).clamp(-1.0, 1.0))
}

/// Mean-centres `v` and divides by its largest absolute deviation, so the
/// sums of squares stay finite whatever the sample magnitude.
fn centred_unit(v: ArrayView1<f64>, n: f64) -> Array1<f64> {
    let mean = v.fold(0.0, |acc, &e| acc + e / n);
    let centred = v.mapv(|e| e - mean);
    let scale = centred.fold(0.0_f64, |m, &e| m.max(e.abs()));
    if scale > 0.0 && scale.is_finite() {
        centred.mapv_into(|e| e / scale)
    } else {
        centred
    }
}

fn is_constant(v: ArrayView1<f64>) -> bool {
    let mut iter = v.iter();
    match iter.next() {
        Some(&first) => iter.all(|&e| e == first),
        None => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;
    use proptest::prelude::*;

    const TOL: f64 = 1e-9;

    #[test]
    fn perfectly_linear() {
        let x = array![1.0, 2.0, 3.0, 4.0, 5.0];
        let y = x.mapv(|v| 3.0 * v - 7.0);
        assert!((pearson(x.view(), y.view()).unwrap() - 1.0).abs() < TOL);
        let z = x.mapv(|v| -0.5 * v + 2.0);
        assert!((pearson(x.view(), z.view()).unwrap() + 1.0).abs() < TOL);
    }

    #[test]
    fn known_value() {
        let x = array![1.0, 2.0, 3.0, 4.0];
        let y = array![2.0, 1.0, 4.0, 3.0];
        // cov = 0.75, var_x = var_y = 1.25
        assert!((pearson(x.view(), y.view()).unwrap() - 0.6).abs() < TOL);
    }

    #[test]
    fn constant_input_is_degenerate() {
        let x = array![0.1, 0.1, 0.1];
        let y = array![1.0, 5.0, -2.0];
        assert!(matches!(
            pearson(x.view(), y.view()),
            Err(CpaError::DegenerateInput(_))
        ));
        assert!(matches!(
            pearson(y.view(), x.view()),
            Err(CpaError::DegenerateInput(_))
        ));
    }

    #[test]
    fn huge_magnitudes_stay_finite() {
        let x = array![1.0, 2.0, 3.0, 4.0];
        let y = x.mapv(|v| v * 1e200);
        assert!((pearson(x.view(), y.view()).unwrap() - 1.0).abs() < TOL);
        let z = x.mapv(|v| -v * 1e-200);
        assert!((pearson(y.view(), z.view()).unwrap() + 1.0).abs() < TOL);
    }

    #[test]
    fn single_point_is_degenerate() {
        let x = array![1.0];
        assert!(matches!(
            pearson(x.view(), x.view()),
            Err(CpaError::DegenerateInput(_))
        ));
    }

    #[test]
    fn length_mismatch() {
        let x = array![1.0, 2.0, 3.0];
        let y = array![1.0, 2.0];
        assert!(matches!(
            pearson(x.view(), y.view()),
            Err(CpaError::DimensionMismatch { expected: 3, got: 2 })
        ));
    }

    fn non_constant() -> impl Strategy<Value = Vec<f64>> {
        prop::collection::vec(-1.0e3..1.0e3f64, 2..64)
            .prop_filter("needs spread", |v| {
                let lo = v.iter().cloned().fold(f64::INFINITY, f64::min);
                let hi = v.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
                hi - lo > 1e-3
            })
    }

    proptest! {
        #[test]
        fn self_correlation_is_one(v in non_constant()) {
            let x = Array1::from(v);
            let neg = x.mapv(|e| -e);
            prop_assert!((pearson(x.view(), x.view()).unwrap() - 1.0).abs() < 1e-6);
            prop_assert!((pearson(x.view(), neg.view()).unwrap() + 1.0).abs() < 1e-6);
        }

        #[test]
        fn constant_always_degenerate(c in -1.0e3..1.0e3f64, v in non_constant()) {
            let y = Array1::from(v);
            let x = Array1::from_elem(y.len(), c);
            let degenerate = matches!(pearson(x.view(), y.view()), Err(CpaError::DegenerateInput(_)));
            prop_assert!(degenerate);
        }

        #[test]
        fn bounded(a in non_constant(), b in non_constant()) {
            let n = a.len().min(b.len());
            let x = Array1::from(a[..n].to_vec());
            let y = Array1::from(b[..n].to_vec());
            if let Ok(r) = pearson(x.view(), y.view()) {
                prop_assert!((-1.0..=1.0).contains(&r));
            }
        }
    }
}
