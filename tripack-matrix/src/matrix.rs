use derive_more::Display;
use tripack::Real;
use crate::base::*;
use crate::dense::Mat;
use crate::sym::SymMat;
use crate::triang::{TriMat, TriangularType};
use crate::error::MatError;

/// Owned result of the arithmetic operations.
#[derive(Clone, Debug, Display, PartialEq)]
pub enum Matrix<R> 
where R: Real { 
    Dense(Mat<R>),
    Sym(SymMat<R>),
    Tri(TriMat<R>),
}

macro_rules! dispatch {
    ($self:expr, $a:ident => $e:expr) => {
        match $self { 
            Matrix::Dense($a) => $e,
            Matrix::Sym($a)   => $e,
            Matrix::Tri($a)   => $e,
        }
    };
}

impl<R> Matrix<R>
where R: Real { 
    /// Zero matrix in the given layout. Packed layouts require a square shape.
    pub fn zero(layout: Layout, shape: (usize, usize)) -> Self { 
        if layout.is_packed() { 
            assert_eq!(shape.0, shape.1, "packed layout {layout} requires a square shape");
        }
        match layout { 
            Layout::Dense     => Matrix::Dense(Mat::zero(shape)),
            Layout::Symmetric => Matrix::Sym(SymMat::new(shape.0)),
            Layout::Upper     => Matrix::Tri(TriMat::new(TriangularType::Upper, shape.0)),
            Layout::Lower     => Matrix::Tri(TriMat::new(TriangularType::Lower, shape.0)),
        }
    }

    pub fn as_dense(&self) -> Option<&Mat<R>> { 
        match self { 
            Matrix::Dense(a) => Some(a),
            _ => None
        }
    }

    pub fn as_sym(&self) -> Option<&SymMat<R>> { 
        match self { 
            Matrix::Sym(a) => Some(a),
            _ => None
        }
    }

    pub fn as_tri(&self) -> Option<&TriMat<R>> { 
        match self { 
            Matrix::Tri(a) => Some(a),
            _ => None
        }
    }

    pub fn into_dense(self) -> Mat<R> { 
        match self { 
            Matrix::Dense(a) => a,
            other => other.to_dense()
        }
    }

    pub fn transpose(&self) -> Self { 
        match self { 
            Matrix::Dense(a) => Matrix::Dense(a.transpose()),
            Matrix::Sym(a)   => Matrix::Sym(a.transpose()),
            Matrix::Tri(a)   => Matrix::Tri(a.transpose()),
        }
    }

    pub fn conjugate_transpose(&self) -> Self { 
        self.transpose()
    }
}

impl<R> MatTrait for Matrix<R>
where R: Real { 
    fn shape(&self) -> (usize, usize) {
        dispatch!(self, a => a.shape())
    }
}

impl<R> MatStorage<R> for Matrix<R>
where R: Real { 
    fn at(&self, i: usize, j: usize) -> R {
        dispatch!(self, a => a.at(i, j))
    }

    fn set_at(&mut self, i: usize, j: usize, value: R) -> Result<(), MatError> {
        dispatch!(self, a => a.set_at(i, j, value))
    }

    fn layout(&self) -> Layout {
        dispatch!(self, a => a.layout())
    }

    fn order(&self) -> usize {
        dispatch!(self, a => a.order())
    }

    fn at_diagonal(&self, i: usize) -> R {
        dispatch!(self, a => a.at_diagonal(i))
    }

    fn is_symmetric(&self) -> bool {
        dispatch!(self, a => a.is_symmetric())
    }

    fn packed(&self) -> Option<&[R]> {
        dispatch!(self, a => a.packed())
    }

    fn packed_mut(&mut self) -> Option<&mut [R]> {
        dispatch!(self, a => a.packed_mut())
    }

    fn dense_view(&self) -> Option<&Mat<R>> {
        dispatch!(self, a => a.dense_view())
    }

    fn to_dense(&self) -> Mat<R> {
        dispatch!(self, a => a.to_dense())
    }

    fn check_assign(&self, src: &Mat<R>) -> Result<(), MatError> {
        dispatch!(self, a => a.check_assign(src))
    }

    fn assign(&mut self, src: &Mat<R>) -> Result<(), MatError> {
        dispatch!(self, a => a.assign(src))
    }
}

impl<R> From<Mat<R>> for Matrix<R>
where R: Real { 
    fn from(a: Mat<R>) -> Self {
        Matrix::Dense(a)
    }
}

impl<R> From<SymMat<R>> for Matrix<R>
where R: Real { 
    fn from(a: SymMat<R>) -> Self {
        Matrix::Sym(a)
    }
}

impl<R> From<TriMat<R>> for Matrix<R>
where R: Real { 
    fn from(a: TriMat<R>) -> Self {
        Matrix::Tri(a)
    }
}
