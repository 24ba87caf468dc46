//! Attribute subsystem: typed columns, transaction scopes, the manager
//! that coordinates them, and the accessor façades.
#![warn(missing_docs)]

pub mod accessor;
pub mod manager;
pub mod scope;
pub mod store;
pub mod value;

pub use accessor::{Accessor, BufferedAccessor};
pub use manager::{AttributeHandle, AttributeManager, TypedColumns};
pub use scope::{ScopeLog, ScopeStack};
pub use store::{AttributeStore, SlotRemap};
pub use value::AttributeValue;
