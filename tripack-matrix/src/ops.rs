//! Arithmetic over any pair of storages.
//! 
//! Every operation first asks whether all operands, result included,
//! expose a packed buffer in the receiver's layout. If so, the provider
//! kernel runs over the `n(n+1)/2` stored cells only. Otherwise the
//! operands are expanded to dense form and the same kernel runs over
//! all `n²` cells, after which the result storage checks that it can
//! hold the outcome. Both paths evaluate identical scalar expressions,
//! so they agree exactly wherever both apply.

use log::trace;
use nalgebra::DVector;
use tripack::Real;
use crate::base::*;
use crate::dense::Mat;
use crate::matrix::Matrix;
use crate::error::{MatError, check_shape};
use crate::provider::{Provider, NativeProvider, NormKind, Transpose};
use crate::index::{index_of, index_of_upper, index_of_lower};
use crate::norm;

static NATIVE: NativeProvider = NativeProvider::new();

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
enum BinaryOp { 
    Add, Subtract, PointwiseMultiply, PointwiseDivide
}

impl BinaryOp { 
    fn preserves(&self, l: Layout) -> bool { 
        match l { 
            Layout::Dense | Layout::Symmetric => true,
            Layout::Upper | Layout::Lower => !matches!(self, Self::PointwiseDivide) // 0/0
        }
    }

    fn apply<R>(&self, p: &dyn Provider<R>, x: &[R], y: &[R], z: &mut [R])
    where R: Real { 
        match self { 
            Self::Add               => p.add_arrays(x, y, z),
            Self::Subtract          => p.subtract_arrays(x, y, z),
            Self::PointwiseMultiply => p.pointwise_multiply_arrays(x, y, z),
            Self::PointwiseDivide   => p.pointwise_divide_arrays(x, y, z),
        }
    }
}

#[derive(Clone, Copy, PartialEq, Debug)]
enum UnaryOp<R> { 
    Scale(R), Negate, Modulus(R)
}

impl<R> UnaryOp<R>
where R: Real { 
    fn preserves(&self, l: Layout) -> bool { 
        match (l, self) { 
            (Layout::Dense | Layout::Symmetric, _) => true,
            (_, Self::Negate)     => true,
            (_, Self::Scale(a))   => a.is_finite(),
            (_, Self::Modulus(d)) => !d.is_zero() && !d.is_nan_val(),
        }
    }

    fn apply(&self, p: &dyn Provider<R>, x: &[R], z: &mut [R]) { 
        match *self { 
            Self::Scale(a)   => p.scale_array(a, x, z),
            Self::Negate     => p.negate_array(x, z),
            Self::Modulus(d) => p.modulus_array(d, x, z),
        }
    }
}

/// Chooses between packed kernels and the dense fallback.
#[derive(Clone, Copy)]
pub struct Router<'p, R>
where R: Real { 
    provider: &'p dyn Provider<R>
}

impl<R> Default for Router<'static, R>
where R: Real { 
    fn default() -> Self {
        Self::new(&NATIVE)
    }
}

impl<'p, R> Router<'p, R>
where R: Real { 
    pub fn new(provider: &'p dyn Provider<R>) -> Self { 
        Self { provider }
    }

    pub fn provider(&self) -> &'p dyn Provider<R> { 
        self.provider
    }

    pub fn add(&self, a: &dyn MatStorage<R>, b: &dyn MatStorage<R>) -> Result<Matrix<R>, MatError> { 
        self.binary(BinaryOp::Add, a, b)
    }

    pub fn add_into(&self, a: &dyn MatStorage<R>, b: &dyn MatStorage<R>, res: &mut dyn MatStorage<R>) -> Result<(), MatError> { 
        self.binary_into(BinaryOp::Add, a, b, res)
    }

    pub fn subtract(&self, a: &dyn MatStorage<R>, b: &dyn MatStorage<R>) -> Result<Matrix<R>, MatError> { 
        self.binary(BinaryOp::Subtract, a, b)
    }

    pub fn subtract_into(&self, a: &dyn MatStorage<R>, b: &dyn MatStorage<R>, res: &mut dyn MatStorage<R>) -> Result<(), MatError> { 
        self.binary_into(BinaryOp::Subtract, a, b, res)
    }

    pub fn pointwise_multiply(&self, a: &dyn MatStorage<R>, b: &dyn MatStorage<R>) -> Result<Matrix<R>, MatError> { 
        self.binary(BinaryOp::PointwiseMultiply, a, b)
    }

    pub fn pointwise_multiply_into(&self, a: &dyn MatStorage<R>, b: &dyn MatStorage<R>, res: &mut dyn MatStorage<R>) -> Result<(), MatError> { 
        self.binary_into(BinaryOp::PointwiseMultiply, a, b, res)
    }

    pub fn pointwise_divide(&self, a: &dyn MatStorage<R>, b: &dyn MatStorage<R>) -> Result<Matrix<R>, MatError> { 
        self.binary(BinaryOp::PointwiseDivide, a, b)
    }

    pub fn pointwise_divide_into(&self, a: &dyn MatStorage<R>, b: &dyn MatStorage<R>, res: &mut dyn MatStorage<R>) -> Result<(), MatError> { 
        self.binary_into(BinaryOp::PointwiseDivide, a, b, res)
    }

    pub fn scale(&self, a: &dyn MatStorage<R>, alpha: R) -> Result<Matrix<R>, MatError> { 
        self.unary(UnaryOp::Scale(alpha), a)
    }

    pub fn scale_into(&self, a: &dyn MatStorage<R>, alpha: R, res: &mut dyn MatStorage<R>) -> Result<(), MatError> { 
        self.unary_into(UnaryOp::Scale(alpha), a, res)
    }

    pub fn negate(&self, a: &dyn MatStorage<R>) -> Result<Matrix<R>, MatError> { 
        self.unary(UnaryOp::Negate, a)
    }

    pub fn negate_into(&self, a: &dyn MatStorage<R>, res: &mut dyn MatStorage<R>) -> Result<(), MatError> { 
        self.unary_into(UnaryOp::Negate, a, res)
    }

    /// Remainder of every entry, with the sign of `divisor`.
    pub fn modulus(&self, a: &dyn MatStorage<R>, divisor: R) -> Result<Matrix<R>, MatError> { 
        self.unary(UnaryOp::Modulus(divisor), a)
    }

    pub fn modulus_into(&self, a: &dyn MatStorage<R>, divisor: R, res: &mut dyn MatStorage<R>) -> Result<(), MatError> { 
        self.unary_into(UnaryOp::Modulus(divisor), a, res)
    }

    /// Matrix product. The result is always dense.
    pub fn multiply(&self, a: &dyn MatStorage<R>, b: &dyn MatStorage<R>) -> Result<Mat<R>, MatError> { 
        if a.ncols() != b.nrows() { 
            return Err(MatError::DimensionMismatch { expected: (a.ncols(), b.ncols()), found: b.shape() })
        }

        trace!("multiply: {} x {} -> Dense", a.layout(), b.layout());

        let (x, y) = (a.densify(), b.densify());
        let mut c = Mat::zero((a.nrows(), b.ncols()));

        self.provider.matrix_multiply_with_update(
            Transpose::No, Transpose::No, 
            R::one(), 
            x.as_slice(), x.shape(), 
            y.as_slice(), y.shape(), 
            R::zero(), 
            c.as_mut_slice()
        )?;

        Ok(c)
    }

    /// Fails if `res` cannot hold the product, leaving `res` untouched.
    pub fn multiply_into(&self, a: &dyn MatStorage<R>, b: &dyn MatStorage<R>, res: &mut dyn MatStorage<R>) -> Result<(), MatError> { 
        check_shape((a.nrows(), b.ncols()), res.shape())?;
        let c = self.multiply(a, b)?;
        res.assign(&c)
    }

    pub fn multiply_vec(&self, a: &dyn MatStorage<R>, x: &DVector<R>) -> Result<DVector<R>, MatError> { 
        let mut y = DVector::zeros(a.nrows());
        self.multiply_vec_into(a, x, &mut y)?;
        Ok(y)
    }

    pub fn multiply_vec_into(&self, a: &dyn MatStorage<R>, x: &DVector<R>, y: &mut DVector<R>) -> Result<(), MatError> { 
        check_shape((a.ncols(), 1), (x.len(), 1))?;
        check_shape((a.nrows(), 1), (y.len(), 1))?;

        let (m, n) = a.shape();
        let zero = R::zero();

        if let Some(d) = a.packed_view(Layout::Symmetric) { 
            trace!("multiply_vec: packed path (Symmetric, n = {n})");
            for i in 0..m { 
                y[i] = (0..n).fold(zero, |s, j| s + d[index_of(i, j)] * x[j]);
            }
            return Ok(())
        }

        // terms 0 * x_j are skipped, which is exact only for finite x.
        if x.iter().all(|v| v.is_finite()) { 
            if let Some(d) = a.packed_view(Layout::Upper) { 
                trace!("multiply_vec: packed path (Upper, n = {n})");
                for i in 0..m { 
                    y[i] = (i..n).fold(zero, |s, j| s + d[index_of_upper(i, j)] * x[j]);
                }
                return Ok(())
            }
            if let Some(d) = a.packed_view(Layout::Lower) { 
                trace!("multiply_vec: packed path (Lower, n = {n})");
                for i in 0..m { 
                    y[i] = (0..=i).fold(zero, |s, j| s + d[index_of_lower(i, j)] * x[j]);
                }
                return Ok(())
            }
        }

        if let Some(d) = a.dense_view() { 
            for i in 0..m { 
                y[i] = (0..n).fold(zero, |s, j| s + d[(i, j)] * x[j]);
            }
            return Ok(())
        }

        trace!("multiply_vec: fallback ({})", a.layout());
        for i in 0..m { 
            y[i] = (0..n).fold(zero, |s, j| s + a.at(i, j) * x[j]);
        }
        Ok(())
    }

    pub fn norm(&self, a: &dyn MatStorage<R>, kind: NormKind) -> R { 
        norm::norm_with(self.provider, a, kind)
    }

    fn binary(&self, op: BinaryOp, a: &dyn MatStorage<R>, b: &dyn MatStorage<R>) -> Result<Matrix<R>, MatError> { 
        check_shape(a.shape(), b.shape())?;

        let l = a.layout();
        let layout = if l == b.layout() && op.preserves(l) { l } else { Layout::Dense };
        let mut res = Matrix::zero(layout, a.shape());

        self.binary_into(op, a, b, &mut res)?;
        Ok(res)
    }

    fn binary_into(&self, op: BinaryOp, a: &dyn MatStorage<R>, b: &dyn MatStorage<R>, res: &mut dyn MatStorage<R>) -> Result<(), MatError> { 
        check_shape(a.shape(), b.shape())?;
        check_shape(a.shape(), res.shape())?;

        let l = a.layout();
        if l.is_packed() && op.preserves(l) { 
            if let (Some(x), Some(y)) = (a.packed_view(l), b.packed_view(l)) { 
                if let Some(z) = res.packed_view_mut(l) { 
                    trace!("{op:?}: packed path ({l}, len = {})", z.len());
                    op.apply(self.provider, x, y, z);
                    return Ok(())
                }
            }
        }

        trace!("{op:?}: fallback ({}, {} -> {})", a.layout(), b.layout(), res.layout());

        let (x, y) = (a.densify(), b.densify());
        let mut z = Mat::zero(a.shape());
        op.apply(self.provider, x.as_slice(), y.as_slice(), z.as_mut_slice());

        res.assign(&z)
    }

    fn unary(&self, op: UnaryOp<R>, a: &dyn MatStorage<R>) -> Result<Matrix<R>, MatError> { 
        let l = a.layout();
        let layout = if op.preserves(l) { l } else { Layout::Dense };
        let mut res = Matrix::zero(layout, a.shape());

        self.unary_into(op, a, &mut res)?;
        Ok(res)
    }

    fn unary_into(&self, op: UnaryOp<R>, a: &dyn MatStorage<R>, res: &mut dyn MatStorage<R>) -> Result<(), MatError> { 
        check_shape(a.shape(), res.shape())?;

        let l = a.layout();
        if l.is_packed() && op.preserves(l) { 
            if let Some(x) = a.packed_view(l) { 
                if let Some(z) = res.packed_view_mut(l) { 
                    trace!("{op:?}: packed path ({l}, len = {})", z.len());
                    op.apply(self.provider, x, z);
                    return Ok(())
                }
            }
        }

        trace!("{op:?}: fallback ({} -> {})", a.layout(), res.layout());

        let x = a.densify();
        let mut z = Mat::zero(a.shape());
        op.apply(self.provider, x.as_slice(), z.as_mut_slice());

        res.assign(&z)
    }
}

pub fn add<R>(a: &dyn MatStorage<R>, b: &dyn MatStorage<R>) -> Result<Matrix<R>, MatError>
where R: Real { 
    Router::default().add(a, b)
}

pub fn subtract<R>(a: &dyn MatStorage<R>, b: &dyn MatStorage<R>) -> Result<Matrix<R>, MatError>
where R: Real { 
    Router::default().subtract(a, b)
}

pub fn pointwise_multiply<R>(a: &dyn MatStorage<R>, b: &dyn MatStorage<R>) -> Result<Matrix<R>, MatError>
where R: Real { 
    Router::default().pointwise_multiply(a, b)
}

pub fn pointwise_divide<R>(a: &dyn MatStorage<R>, b: &dyn MatStorage<R>) -> Result<Matrix<R>, MatError>
where R: Real { 
    Router::default().pointwise_divide(a, b)
}

pub fn scale<R>(a: &dyn MatStorage<R>, alpha: R) -> Result<Matrix<R>, MatError>
where R: Real { 
    Router::default().scale(a, alpha)
}

pub fn negate<R>(a: &dyn MatStorage<R>) -> Result<Matrix<R>, MatError>
where R: Real { 
    Router::default().negate(a)
}

pub fn modulus<R>(a: &dyn MatStorage<R>, divisor: R) -> Result<Matrix<R>, MatError>
where R: Real { 
    Router::default().modulus(a, divisor)
}

pub fn multiply<R>(a: &dyn MatStorage<R>, b: &dyn MatStorage<R>) -> Result<Mat<R>, MatError>
where R: Real { 
    Router::default().multiply(a, b)
}

pub fn multiply_vec<R>(a: &dyn MatStorage<R>, x: &DVector<R>) -> Result<DVector<R>, MatError>
where R: Real { 
    Router::default().multiply_vec(a, x)
}

/// Method syntax for the operations of this module.
pub trait MatOps<R>: MatStorage<R> + Sized
where R: Real { 
    fn add(&self, rhs: &dyn MatStorage<R>) -> Result<Matrix<R>, MatError> { 
        add(self, rhs)
    }

    fn subtract(&self, rhs: &dyn MatStorage<R>) -> Result<Matrix<R>, MatError> { 
        subtract(self, rhs)
    }

    fn pointwise_multiply(&self, rhs: &dyn MatStorage<R>) -> Result<Matrix<R>, MatError> { 
        pointwise_multiply(self, rhs)
    }

    fn pointwise_divide(&self, rhs: &dyn MatStorage<R>) -> Result<Matrix<R>, MatError> { 
        pointwise_divide(self, rhs)
    }

    fn scale(&self, alpha: R) -> Result<Matrix<R>, MatError> { 
        scale(self, alpha)
    }

    fn negate(&self) -> Result<Matrix<R>, MatError> { 
        negate(self)
    }

    fn modulus(&self, divisor: R) -> Result<Matrix<R>, MatError> { 
        modulus(self, divisor)
    }

    fn multiply(&self, rhs: &dyn MatStorage<R>) -> Result<Mat<R>, MatError> { 
        multiply(self, rhs)
    }

    fn multiply_vec(&self, x: &DVector<R>) -> Result<DVector<R>, MatError> { 
        multiply_vec(self, x)
    }

    fn trace(&self) -> Result<R, MatError> { 
        norm::trace(self)
    }

    fn norm(&self, kind: NormKind) -> R { 
        norm::norm(self, kind)
    }
}

impl<R, T> MatOps<R> for T
where R: Real, T: MatStorage<R> {}
