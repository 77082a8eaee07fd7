//! Flat-buffer numeric kernels.
//! 
//! Kernels know nothing about packing: callers pass raw buffers together
//! with the logical dimensions. Matrix buffers are column-major.

use derive_more::Display;
use log::debug;
use nalgebra::{DMatrix, DMatrixView, DMatrixViewMut};
use tripack::Real;
use crate::config;
use crate::error::{MatError, check_len};

cfg_if::cfg_if! { if #[cfg(feature = "multithread")] { 
    use rayon::prelude::*;
}}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Transpose { 
    No, Yes
}

impl Transpose { 
    pub fn is_yes(&self) -> bool { 
        matches!(self, Self::Yes)
    }

    fn apply(&self, dims: (usize, usize)) -> (usize, usize) { 
        if self.is_yes() { 
            (dims.1, dims.0)
        } else { 
            dims
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug, Display)]
pub enum NormKind { 
    /// Maximum absolute column sum.
    L1, 
    /// Maximum absolute row sum.
    Infinity, 
    Frobenius, 
    MaxAbs
}

pub trait Provider<R>: Send + Sync
where R: Real {
    fn add_arrays(&self, x: &[R], y: &[R], result: &mut [R]);
    fn subtract_arrays(&self, x: &[R], y: &[R], result: &mut [R]);
    fn pointwise_multiply_arrays(&self, x: &[R], y: &[R], result: &mut [R]);
    fn pointwise_divide_arrays(&self, x: &[R], y: &[R], result: &mut [R]);
    fn scale_array(&self, alpha: R, x: &[R], result: &mut [R]);
    fn negate_array(&self, x: &[R], result: &mut [R]);

    /// Remainder with the sign of `divisor`.
    fn modulus_array(&self, divisor: R, x: &[R], result: &mut [R]);

    /// `c = alpha * op(a) * op(b) + beta * c`. 
    /// `a_dims` and `b_dims` are the stored (untransposed) shapes.
    #[allow(clippy::too_many_arguments)]
    fn matrix_multiply_with_update(
        &self, 
        trans_a: Transpose, 
        trans_b: Transpose, 
        alpha: R, 
        a: &[R], 
        a_dims: (usize, usize), 
        b: &[R], 
        b_dims: (usize, usize), 
        beta: R, 
        c: &mut [R]
    ) -> Result<(), MatError>;

    fn matrix_norm(&self, kind: NormKind, rows: usize, cols: usize, a: &[R]) -> R;
}

#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum Execution { 
    /// Parallel above `config::parallel_threshold`.
    #[default]
    Auto, 
    Serial, 
    Parallel
}

/// Portable kernels, data-parallel on rayon when enabled.
#[derive(Clone, Copy, Debug, Default)]
pub struct NativeProvider { 
    exec: Execution
}

impl NativeProvider { 
    pub const fn new() -> Self { 
        Self { exec: Execution::Auto }
    }

    pub const fn with_execution(exec: Execution) -> Self { 
        Self { exec }
    }

    #[cfg_attr(not(feature = "multithread"), allow(unused))]
    fn is_parallel(&self, len: usize) -> bool { 
        let res = match self.exec { 
            Execution::Auto     => config::should_parallelize(len),
            Execution::Serial   => false,
            Execution::Parallel => cfg!(feature = "multithread"),
        };
        if res { 
            debug!("element kernel: len = {len} (multi-thread)");
        }
        res
    }

    fn zip_with<R, F>(&self, x: &[R], y: &[R], result: &mut [R], f: F)
    where R: Real, F: Fn(R, R) -> R + Send + Sync { 
        assert_eq!(x.len(), y.len());
        assert_eq!(x.len(), result.len());

        cfg_if::cfg_if! { if #[cfg(feature = "multithread")] { 
            if self.is_parallel(result.len()) { 
                result.par_iter_mut().zip(x.par_iter().zip(y.par_iter())).for_each(|(r, (&a, &b))| 
                    *r = f(a, b)
                );
                return
            }
        }}

        for (r, (&a, &b)) in result.iter_mut().zip(x.iter().zip(y.iter())) { 
            *r = f(a, b)
        }
    }

    fn map_with<R, F>(&self, x: &[R], result: &mut [R], f: F)
    where R: Real, F: Fn(R) -> R + Send + Sync { 
        assert_eq!(x.len(), result.len());

        cfg_if::cfg_if! { if #[cfg(feature = "multithread")] { 
            if self.is_parallel(result.len()) { 
                result.par_iter_mut().zip(x.par_iter()).for_each(|(r, &a)| 
                    *r = f(a)
                );
                return
            }
        }}

        for (r, &a) in result.iter_mut().zip(x.iter()) { 
            *r = f(a)
        }
    }
}

fn apply_transpose<R>(x: DMatrixView<'_, R>, t: Transpose) -> DMatrix<R>
where R: Real { 
    if t.is_yes() { 
        x.transpose()
    } else { 
        x.clone_owned()
    }
}

pub(crate) fn modulus<R>(x: R, d: R) -> R
where R: Real { 
    let r = x % d;
    if r.is_zero() || (r < R::zero()) == (d < R::zero()) { 
        return r
    }

    // r + d rounds onto d when |r| is below half an ulp of d.
    let m = r + d;
    if m == d { 
        R::zero()
    } else { 
        m
    }
}

impl<R> Provider<R> for NativeProvider
where R: Real { 
    fn add_arrays(&self, x: &[R], y: &[R], result: &mut [R]) {
        self.zip_with(x, y, result, |a, b| a + b)
    }

    fn subtract_arrays(&self, x: &[R], y: &[R], result: &mut [R]) {
        self.zip_with(x, y, result, |a, b| a - b)
    }

    fn pointwise_multiply_arrays(&self, x: &[R], y: &[R], result: &mut [R]) {
        self.zip_with(x, y, result, |a, b| a * b)
    }

    fn pointwise_divide_arrays(&self, x: &[R], y: &[R], result: &mut [R]) {
        self.zip_with(x, y, result, |a, b| a / b)
    }

    fn scale_array(&self, alpha: R, x: &[R], result: &mut [R]) {
        self.map_with(x, result, |a| alpha * a)
    }

    fn negate_array(&self, x: &[R], result: &mut [R]) {
        self.map_with(x, result, |a| -a)
    }

    fn modulus_array(&self, divisor: R, x: &[R], result: &mut [R]) {
        self.map_with(x, result, |a| modulus(a, divisor))
    }

    fn matrix_multiply_with_update(
        &self, 
        trans_a: Transpose, 
        trans_b: Transpose, 
        alpha: R, 
        a: &[R], 
        a_dims: (usize, usize), 
        b: &[R], 
        b_dims: (usize, usize), 
        beta: R, 
        c: &mut [R]
    ) -> Result<(), MatError> {
        check_len(a_dims.0 * a_dims.1, a.len())?;
        check_len(b_dims.0 * b_dims.1, b.len())?;

        let (m, k) = trans_a.apply(a_dims);
        let (l, n) = trans_b.apply(b_dims);

        if k != l { 
            return Err(MatError::DimensionMismatch { expected: (k, n), found: (l, n) })
        }
        check_len(m * n, c.len())?;

        let a = DMatrixView::from_slice(a, a_dims.0, a_dims.1);
        let b = DMatrixView::from_slice(b, b_dims.0, b_dims.1);
        let mut c = DMatrixViewMut::from_slice(c, m, n);

        let a = apply_transpose(a, trans_a);
        let b = apply_transpose(b, trans_b);

        c.gemm(alpha, &a, &b, beta);

        Ok(())
    }

    fn matrix_norm(&self, kind: NormKind, rows: usize, cols: usize, a: &[R]) -> R {
        assert_eq!(rows * cols, a.len());

        let zero = R::zero();
        let max = |acc: R, x: R| if x > acc { x } else { acc };

        match kind { 
            NormKind::L1 => (0..cols).map(|j| 
                a[j * rows .. (j + 1) * rows].iter().fold(zero, |s, x| s + x.abs_val())
            ).fold(zero, max),

            NormKind::Infinity => (0..rows).map(|i| 
                (0..cols).fold(zero, |s, j| s + a[i + j * rows].abs_val())
            ).fold(zero, max),

            NormKind::Frobenius => a.iter().fold(zero, |s, &x| s + x * x).sqrt(),

            NormKind::MaxAbs => a.iter().map(|x| x.abs_val()).fold(zero, max),
        }
    }
}

#[cfg(test)]
mod tests { 
    use super::*;

    const SERIAL: NativeProvider = NativeProvider::with_execution(Execution::Serial);
    const PARALLEL: NativeProvider = NativeProvider::with_execution(Execution::Parallel);

    #[test]
    fn elementwise() { 
        let x = [1.0, 2.0, 3.0];
        let y = [4.0, -2.0, 0.5];
        let mut r = [0.0; 3];

        SERIAL.add_arrays(&x, &y, &mut r);
        assert_eq!(r, [5.0, 0.0, 3.5]);

        SERIAL.subtract_arrays(&x, &y, &mut r);
        assert_eq!(r, [-3.0, 4.0, 2.5]);

        SERIAL.pointwise_multiply_arrays(&x, &y, &mut r);
        assert_eq!(r, [4.0, -4.0, 1.5]);

        SERIAL.pointwise_divide_arrays(&x, &y, &mut r);
        assert_eq!(r, [0.25, -1.0, 6.0]);

        SERIAL.scale_array(2.0, &x, &mut r);
        assert_eq!(r, [2.0, 4.0, 6.0]);

        SERIAL.negate_array(&x, &mut r);
        assert_eq!(r, [-1.0, -2.0, -3.0]);
    }

    #[test]
    fn modulus_sign() { 
        assert_eq!(modulus(5.0, 3.0), 2.0);
        assert_eq!(modulus(-5.0, 3.0), 1.0);
        assert_eq!(modulus(5.0, -3.0), -1.0);
        assert_eq!(modulus(-5.0, -3.0), -2.0);
        assert_eq!(modulus(6.0, 3.0), 0.0);
        assert!(modulus(1.0f64, 0.0).is_nan());

        // tiny dividends stay inside [0, d) or (d, 0].
        for (x, d) in [(-1e-20, 3.0), (1e-20, -3.0), (-f64::MIN_POSITIVE, 1.0), (-1e-300, 1e10)] { 
            let r = modulus(x, d);
            assert_ne!(r, d);
            if d > 0.0 { 
                assert!(r >= 0.0 && r < d, "{x} mod {d} = {r}");
            } else { 
                assert!(r <= 0.0 && r > d, "{x} mod {d} = {r}");
            }
        }
        assert_eq!(modulus(-1e-20f64, 3.0), 0.0);

        let mut r = [0.0; 2];
        SERIAL.modulus_array(4.0, &[-1.0, 9.0], &mut r);
        assert_eq!(r, [3.0, 1.0]);
    }

    #[test]
    fn parallel_matches_serial() { 
        let n = 10_000;
        let x: Vec<f64> = (0..n).map(|i| (i as f64).sin()).collect();
        let y: Vec<f64> = (0..n).map(|i| (i as f64).cos() + 2.0).collect();
        let mut r1 = vec![0.0; n];
        let mut r2 = vec![0.0; n];

        SERIAL.pointwise_divide_arrays(&x, &y, &mut r1);
        PARALLEL.pointwise_divide_arrays(&x, &y, &mut r2);
        assert_eq!(r1, r2);

        SERIAL.scale_array(0.3, &x, &mut r1);
        PARALLEL.scale_array(0.3, &x, &mut r2);
        assert_eq!(r1, r2);
    }

    #[test]
    fn gemm() { 
        // a = [1 2 3; 4 5 6], b = [1 0; 0 1; 1 1], column-major.
        let a = [1.0, 4.0, 2.0, 5.0, 3.0, 6.0];
        let b = [1.0, 0.0, 1.0, 0.0, 1.0, 1.0];
        let mut c = [1.0; 4];

        SERIAL.matrix_multiply_with_update(Transpose::No, Transpose::No, 1.0, &a, (2, 3), &b, (3, 2), 0.0, &mut c).unwrap();
        assert_eq!(c, [4.0, 10.0, 5.0, 11.0]);

        SERIAL.matrix_multiply_with_update(Transpose::No, Transpose::No, 2.0, &a, (2, 3), &b, (3, 2), 1.0, &mut c).unwrap();
        assert_eq!(c, [12.0, 30.0, 15.0, 33.0]);
    }

    #[test]
    fn gemm_transposed() { 
        // a^T a for a = [1 2; 3 4].
        let a = [1.0, 3.0, 2.0, 4.0];
        let mut c = [0.0; 4];

        SERIAL.matrix_multiply_with_update(Transpose::Yes, Transpose::No, 1.0, &a, (2, 2), &a, (2, 2), 0.0, &mut c).unwrap();
        assert_eq!(c, [10.0, 14.0, 14.0, 20.0]);
    }

    #[test]
    fn gemm_mismatch() { 
        let a = [0.0; 6];
        let mut c = [0.0; 4];
        let res = SERIAL.matrix_multiply_with_update(Transpose::No, Transpose::No, 1.0, &a, (2, 3), &a, (2, 3), 0.0, &mut c);
        assert!(matches!(res, Err(MatError::DimensionMismatch { .. })));

        let res = SERIAL.matrix_multiply_with_update(Transpose::No, Transpose::No, 1.0, &a, (2, 2), &a, (2, 3), 0.0, &mut c);
        assert_eq!(res, Err(MatError::LengthMismatch { expected: 4, found: 6 }));
    }

    #[test]
    fn norms() { 
        // [1 -2; -3 4]
        let a = [1.0, -3.0, -2.0, 4.0];
        assert_eq!(SERIAL.matrix_norm(NormKind::L1, 2, 2, &a), 6.0);
        assert_eq!(SERIAL.matrix_norm(NormKind::Infinity, 2, 2, &a), 7.0);
        assert_eq!(SERIAL.matrix_norm(NormKind::Frobenius, 2, 2, &a), 30f64.sqrt());
        assert_eq!(SERIAL.matrix_norm(NormKind::MaxAbs, 2, 2, &a), 4.0);
        assert_eq!(SERIAL.matrix_norm(NormKind::L1, 0, 0, &[] as &[f64]), 0.0);
    }
}
