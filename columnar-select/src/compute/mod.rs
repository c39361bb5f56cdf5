//! Computation of the selected rows

pub mod gather;
pub mod non_null;
pub mod null;
pub mod pext;
