use derive_more::Display;

#[derive(Clone, Debug, Display, PartialEq, Eq)]
pub enum MatError { 
    #[display("dimension mismatch: expected {expected:?}, found {found:?}")]
    DimensionMismatch { 
        expected: (usize, usize), 
        found: (usize, usize) 
    },

    #[display("structural violation: {_0}")]
    StructuralViolation(String),

    #[display("length mismatch: expected {expected}, found {found}")]
    LengthMismatch { 
        expected: usize, 
        found: usize 
    },

    #[display("invalid argument: {_0}")]
    InvalidArgument(String),
}

impl std::error::Error for MatError {}

impl MatError { 
    pub fn is_structural(&self) -> bool { 
        matches!(self, Self::StructuralViolation(_))
    }
}

macro_rules! violation {
    ($($arg:tt)*) => {{
        let msg = format!($($arg)*);
        Err( $crate::error::MatError::StructuralViolation(msg) )
    }}
}

macro_rules! invalid {
    ($($arg:tt)*) => {{
        let msg = format!($($arg)*);
        Err( $crate::error::MatError::InvalidArgument(msg) )
    }}
}

pub(crate) use {violation, invalid};

pub(crate) fn check_shape(expected: (usize, usize), found: (usize, usize)) -> Result<(), MatError> { 
    if expected == found { 
        Ok(())
    } else { 
        Err(MatError::DimensionMismatch { expected, found })
    }
}

pub(crate) fn check_len(expected: usize, found: usize) -> Result<(), MatError> { 
    if expected == found { 
        Ok(())
    } else { 
        Err(MatError::LengthMismatch { expected, found })
    }
}
