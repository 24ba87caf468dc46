//! `AttributeValue`: the closed set of value types a column may carry.
//!
//! Attribute columns come in three flavors: `f64` for geometry and
//! energies, `i64` for counters and ids, `u8` for tags and flags. The
//! trait routes a generic call to the matching typed column set inside the
//! [`AttributeManager`] and supplies the little arithmetic the transfer
//! strategies need. Sealed: the manager's storage layout is not open for
//! extension.
//!
//! [`AttributeManager`]: crate::attr::AttributeManager

use crate::attr::manager::{AttributeManager, TypedColumns};
use std::fmt::Debug;

mod sealed {
    pub trait Sealed {}
    impl Sealed for f64 {}
    impl Sealed for i64 {}
    impl Sealed for u8 {}
}

/// A type storable in attribute columns. Implemented for `f64`, `i64`, `u8`.
pub trait AttributeValue:
    sealed::Sealed + Clone + PartialEq + Debug + Send + Sync + 'static
{
    /// The typed column set of `manager` carrying `Self` values.
    fn columns(manager: &AttributeManager) -> &TypedColumns<Self>
    where
        Self: Sized;

    /// Mutable access to the typed column set carrying `Self` values.
    fn columns_mut(manager: &mut AttributeManager) -> &mut TypedColumns<Self>
    where
        Self: Sized;

    /// Arithmetic mean of `values`, used by the averaging transfer
    /// strategy. Integer types round toward zero.
    fn mean_of(values: &[Self]) -> Self
    where
        Self: Sized;
}

impl AttributeValue for f64 {
    fn columns(manager: &AttributeManager) -> &TypedColumns<Self> {
        manager.double_columns()
    }
    fn columns_mut(manager: &mut AttributeManager) -> &mut TypedColumns<Self> {
        manager.double_columns_mut()
    }
    fn mean_of(values: &[Self]) -> Self {
        values.iter().sum::<f64>() / values.len() as f64
    }
}

impl AttributeValue for i64 {
    fn columns(manager: &AttributeManager) -> &TypedColumns<Self> {
        manager.long_columns()
    }
    fn columns_mut(manager: &mut AttributeManager) -> &mut TypedColumns<Self> {
        manager.long_columns_mut()
    }
    fn mean_of(values: &[Self]) -> Self {
        values.iter().sum::<i64>() / values.len() as i64
    }
}

impl AttributeValue for u8 {
    fn columns(manager: &AttributeManager) -> &TypedColumns<Self> {
        manager.byte_columns()
    }
    fn columns_mut(manager: &mut AttributeManager) -> &mut TypedColumns<Self> {
        manager.byte_columns_mut()
    }
    fn mean_of(values: &[Self]) -> Self {
        (values.iter().map(|&v| v as u32).sum::<u32>() / values.len() as u32) as u8
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn means() {
        assert_eq!(f64::mean_of(&[1.0, 2.0, 6.0]), 3.0);
        assert_eq!(i64::mean_of(&[1, 2, 6]), 3);
        assert_eq!(u8::mean_of(&[10, 20]), 15);
    }
}
