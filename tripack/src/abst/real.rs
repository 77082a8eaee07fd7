use std::fmt::{Debug, Display};
use nalgebra::RealField;
use num_traits::Signed;

// Real scalars (f32, f64)

pub trait Real: 
    RealField + 
    Signed + 
    Copy + 
    Default + 
    Send + 
    Sync + 
    Display + 
    Debug + 
    'static
{
    fn abs_val(&self) -> Self { 
        Signed::abs(self)
    }

    fn is_nan_val(&self) -> bool { 
        self != self
    }

    // Exact comparison, +0.0 and -0.0 are equal.
    fn same_as(&self, other: &Self) -> bool { 
        self == other || (self.is_nan_val() && other.is_nan_val())
    }
}

impl<T> Real for T where T: 
    RealField + 
    Signed + 
    Copy + 
    Default + 
    Send + 
    Sync + 
    Display + 
    Debug + 
    'static
{}

#[cfg(test)]
mod tests {
    use crate::Real;
 
    #[test]
    fn abs_val() { 
        assert_eq!((-2.5f64).abs_val(), 2.5);
        assert_eq!(3.0f32.abs_val(), 3.0);
    }

    #[test]
    fn same_as() { 
        assert!(0.0f64.same_as(&-0.0));
        assert!(f64::NAN.same_as(&f64::NAN));
        assert!(!1.0f64.same_as(&f64::NAN));
        assert!(!1.0f64.same_as(&1.5));
    }
}
