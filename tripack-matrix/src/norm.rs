use log::trace;
use tripack::Real;
use crate::base::*;
use crate::error::{MatError, check_shape};
use crate::provider::{Provider, NativeProvider, NormKind};

pub fn trace<R>(a: &dyn MatStorage<R>) -> Result<R, MatError>
where R: Real { 
    let n = a.nrows();
    check_shape((n, n), a.shape())?;
    Ok((0..n).fold(R::zero(), |s, i| s + a.at_diagonal(i)))
}

/// Packed storages are expanded to dense form before reaching the provider.
pub fn norm_with<R>(p: &dyn Provider<R>, a: &dyn MatStorage<R>, kind: NormKind) -> R
where R: Real { 
    if a.layout().is_packed() { 
        trace!("{kind} norm: densify {}", a.layout());
    }
    let d = a.densify();
    p.matrix_norm(kind, d.nrows(), d.ncols(), d.as_slice())
}

pub fn norm<R>(a: &dyn MatStorage<R>, kind: NormKind) -> R
where R: Real { 
    norm_with(&NativeProvider::new(), a, kind)
}

pub fn l1_norm<R>(a: &dyn MatStorage<R>) -> R
where R: Real { 
    norm(a, NormKind::L1)
}

pub fn infinity_norm<R>(a: &dyn MatStorage<R>) -> R
where R: Real { 
    norm(a, NormKind::Infinity)
}

pub fn frobenius_norm<R>(a: &dyn MatStorage<R>) -> R
where R: Real { 
    norm(a, NormKind::Frobenius)
}

pub fn max_abs<R>(a: &dyn MatStorage<R>) -> R
where R: Real { 
    norm(a, NormKind::MaxAbs)
}

#[cfg(test)]
mod tests { 
    use super::*;
    use crate::{Mat, SymMat, TriMat, TriangularType};

    #[test]
    fn trace_sym() { 
        let a = SymMat::from_rows(&[
            [1., 2., 3.],
            [2., 2., 0.],
            [3., 0., 3.],
        ]).unwrap();
        assert_eq!(trace(&a), Ok(6.));
    }

    #[test]
    fn trace_identity() { 
        for n in 0..6 { 
            assert_eq!(trace(&SymMat::<f64>::identity(n)), Ok(n as f64));
            assert_eq!(trace(&TriMat::<f64>::identity(TriangularType::Lower, n)), Ok(n as f64));
        }
    }

    #[test]
    fn trace_non_square() { 
        let a = Mat::<f64>::zero((2, 3));
        assert_eq!(trace(&a), Err(MatError::DimensionMismatch { expected: (2, 2), found: (2, 3) }));
    }

    #[test]
    fn sym_norms() { 
        // [1 -2; -2 4]
        let a = SymMat::from_packed(2, vec![1., -2., 4.]).unwrap();
        assert_eq!(l1_norm(&a), 6.);
        assert_eq!(infinity_norm(&a), 6.);
        assert_eq!(frobenius_norm(&a), 25f64.sqrt());
        assert_eq!(max_abs(&a), 4.);
    }

    #[test]
    fn tri_norms() { 
        // [1 -2; 0 4]
        let a = TriMat::from_packed(TriangularType::Upper, 2, vec![1., -2., 4.]).unwrap();
        assert_eq!(l1_norm(&a), 6.);
        assert_eq!(infinity_norm(&a), 4.);
        assert_eq!(frobenius_norm(&a), 21f64.sqrt());

        let b = a.transpose();
        assert_eq!(l1_norm(&b), 4.);
        assert_eq!(infinity_norm(&b), 6.);
    }

    #[test]
    fn packed_matches_dense() { 
        let a = SymMat::from_packed(3, vec![1., -2., 4., 0.5, 3., -7.]).unwrap();
        let d = a.to_dense();
        for kind in [NormKind::L1, NormKind::Infinity, NormKind::Frobenius, NormKind::MaxAbs] { 
            assert_eq!(norm(&a, kind), norm(&d, kind));
        }
    }
}
