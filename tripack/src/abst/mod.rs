mod real;

pub use real::*;
