//! Attribute transfer: deriving values for elements created by an edit.
//!
//! When an edit replaces elements (a split replaces one edge with two, a
//! collapse merges two vertices into one), the attribute values of the new
//! elements come from the values of the ones they replaced. A
//! [`TransferStrategy`] is the per-attribute rule: copy the first source,
//! average the sources, or run a caller-supplied pure function. Strategies
//! may be invoked multiple times speculatively; they must not observe
//! anything but their inputs.

use crate::attr::{AttributeHandle, AttributeManager, AttributeValue};
use crate::forge_error::MeshForgeError;
use crate::topology::{ElementHandle, MeshTopology};
use std::fmt;
use std::sync::Arc;

/// Caller-supplied transfer function: old value images in, one new value
/// image out.
pub type TransferFn<V> = Arc<dyn Fn(&[&[V]]) -> Vec<V> + Send + Sync>;

/// Per-attribute rule deriving a new element's values from the values of
/// the elements it replaced.
#[derive(Clone)]
pub enum TransferStrategy<V: AttributeValue> {
    /// Take the first source's image unchanged.
    CopyFirst,
    /// Component-wise mean across all sources.
    Mean,
    /// Arbitrary pure function of the source images.
    Custom(TransferFn<V>),
}

impl<V: AttributeValue> fmt::Debug for TransferStrategy<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransferStrategy::CopyFirst => f.write_str("CopyFirst"),
            TransferStrategy::Mean => f.write_str("Mean"),
            TransferStrategy::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

impl<V: AttributeValue> TransferStrategy<V> {
    /// Derive one `stride`-wide image from `sources`.
    ///
    /// # Errors
    /// `StrideMismatch` when `sources` is empty, a source has the wrong
    /// width, or a custom function returns the wrong width.
    pub fn derive(&self, sources: &[&[V]], stride: usize) -> Result<Vec<V>, MeshForgeError> {
        if sources.is_empty() {
            return Err(MeshForgeError::StrideMismatch {
                expected: stride,
                found: 0,
            });
        }
        if let Some(bad) = sources.iter().find(|s| s.len() != stride) {
            return Err(MeshForgeError::StrideMismatch {
                expected: stride,
                found: bad.len(),
            });
        }
        let out = match self {
            TransferStrategy::CopyFirst => sources[0].to_vec(),
            TransferStrategy::Mean => (0..stride)
                .map(|k| {
                    let column: Vec<V> = sources.iter().map(|s| s[k].clone()).collect();
                    V::mean_of(&column)
                })
                .collect(),
            TransferStrategy::Custom(f) => {
                let out = f(sources);
                if out.len() != stride {
                    return Err(MeshForgeError::StrideMismatch {
                        expected: stride,
                        found: out.len(),
                    });
                }
                out
            }
        };
        Ok(out)
    }
}

/// One attribute bound to its transfer strategy.
#[derive(Debug, Clone)]
pub struct AttributeTransfer<V: AttributeValue> {
    attribute: AttributeHandle<V>,
    strategy: TransferStrategy<V>,
}

impl<V: AttributeValue> AttributeTransfer<V> {
    /// Bind `strategy` to `attribute`.
    pub fn new(attribute: AttributeHandle<V>, strategy: TransferStrategy<V>) -> Self {
        Self {
            attribute,
            strategy,
        }
    }
}

/// Type-erased transfer rule, so an operation can carry rules over mixed
/// value types in one list.
pub trait TransferRule<M: MeshTopology + ?Sized>: Send + Sync {
    /// Derive and write `target`'s values from `sources` through the open
    /// scope.
    fn transfer(
        &self,
        mesh: &M,
        attrs: &mut AttributeManager,
        sources: &[ElementHandle],
        target: ElementHandle,
    ) -> Result<(), MeshForgeError>;
}

impl<M: MeshTopology + ?Sized, V: AttributeValue> TransferRule<M> for AttributeTransfer<V> {
    fn transfer(
        &self,
        mesh: &M,
        attrs: &mut AttributeManager,
        sources: &[ElementHandle],
        target: ElementHandle,
    ) -> Result<(), MeshForgeError> {
        let mut accessor = attrs.accessor(self.attribute);
        let images: Vec<Vec<V>> = sources
            .iter()
            .map(|&h| accessor.get(mesh, h).map(<[V]>::to_vec))
            .collect::<Result<_, _>>()?;
        let refs: Vec<&[V]> = images.iter().map(Vec::as_slice).collect();
        let out = self.strategy.derive(&refs, accessor.stride())?;
        accessor.set(mesh, target, &out)
    }
}
