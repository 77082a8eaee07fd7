use std::ops::{Index, IndexMut};
use delegate::delegate;
use derive_more::Display;
use nalgebra::DMatrix;
use tripack::Real;
use crate::base::*;
use crate::error::{MatError, invalid, check_shape};

/// General dense matrix, stored column-major.
#[derive(Clone, Debug, Display, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Mat<R> 
where R: Real {
    inner: DMatrix<R>
}

impl<R> MatTrait for Mat<R>
where R: Real {
    fn shape(&self) -> (usize, usize) {
        (self.inner.nrows(), self.inner.ncols())
    }
}

impl<R> Mat<R>
where R: Real {
    pub fn inner(&self) -> &DMatrix<R> {
        &self.inner
    }

    pub fn inner_mut(&mut self) -> &mut DMatrix<R> {
        &mut self.inner
    }

    pub fn into_inner(self) -> DMatrix<R> {
        self.inner
    }

    /// Column-major buffer.
    pub fn as_slice(&self) -> &[R] { 
        self.inner.as_slice()
    }

    pub fn as_mut_slice(&mut self) -> &mut [R] { 
        self.inner.as_mut_slice()
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, usize, &R)> { 
        let m = self.nrows();
        self.inner.iter().enumerate().map(move |(k, a)| 
            (k % m, k / m, a)
        )
    }

    /// Builds from row-major `data`.
    pub fn from_data<I>(shape: (usize, usize), data: I) -> Self
    where I: IntoIterator<Item = R> { 
        DMatrix::from_row_iterator(shape.0, shape.1, data).into()
    }

    pub fn from_fn<F>(shape: (usize, usize), f: F) -> Self
    where F: FnMut(usize, usize) -> R { 
        DMatrix::from_fn(shape.0, shape.1, f).into()
    }

    /// Builds from rows, all of the same length.
    pub fn from_rows<J>(rows: &[J]) -> Result<Self, MatError>
    where J: AsRef<[R]> { 
        let m = rows.len();
        let n = rows.first().map(|r| r.as_ref().len()).unwrap_or(0);

        if let Some((i, r)) = rows.iter().enumerate().find(|(_, r)| r.as_ref().len() != n) { 
            return invalid!("row {i} has length {}, expected {n}", r.as_ref().len())
        }

        Ok(Self::from_fn((m, n), |i, j| rows[i].as_ref()[j]))
    }

    pub fn zero(shape: (usize, usize)) -> Self { 
        DMatrix::zeros(shape.0, shape.1).into()
    }

    pub fn is_zero(&self) -> bool { 
        self.inner.iter().all(|a| a.is_zero())
    }

    pub fn id(size: usize) -> Self { 
        DMatrix::identity(size, size).into()
    }

    pub fn is_id(&self) -> bool { 
        self.is_square() && self.iter().all(|(i, j, a)| 
            i == j && a.is_one() || 
            i != j && a.is_zero()
        )
    }

    pub fn transpose(&self) -> Self { 
        self.inner.transpose().into()
    }
}

impl<R> From<DMatrix<R>> for Mat<R>
where R: Real {
    fn from(inner: DMatrix<R>) -> Self {
        Self { inner }
    }
}

impl<R> Index<(usize, usize)> for Mat<R>
where R: Real {
    type Output = R;
    delegate! { 
        to self.inner { 
            fn index(&self, index: (usize, usize)) -> &R;
        }
    }
}

impl<R> IndexMut<(usize, usize)> for Mat<R>
where R: Real {
    delegate! { 
        to self.inner { 
            fn index_mut(&mut self, index: (usize, usize)) -> &mut Self::Output;
        }
    }
}

impl<R> Default for Mat<R>
where R: Real {
    fn default() -> Self {
        Self::zero((0, 0))
    }
}

impl<R> MatStorage<R> for Mat<R>
where R: Real { 
    fn at(&self, i: usize, j: usize) -> R {
        self.inner[(i, j)]
    }

    fn set_at(&mut self, i: usize, j: usize, value: R) -> Result<(), MatError> {
        self.inner[(i, j)] = value;
        Ok(())
    }

    fn layout(&self) -> Layout {
        Layout::Dense
    }

    fn dense_view(&self) -> Option<&Mat<R>> {
        Some(self)
    }

    fn to_dense(&self) -> Mat<R> {
        self.clone()
    }

    fn check_assign(&self, src: &Mat<R>) -> Result<(), MatError> {
        check_shape(self.shape(), src.shape())
    }

    fn assign(&mut self, src: &Mat<R>) -> Result<(), MatError> {
        self.check_assign(src)?;
        self.inner.copy_from(&src.inner);
        Ok(())
    }
}
