//! The store facade.
//!
//! [`Store`] owns the state tree, the module tree and the flat registries,
//! and exposes `commit`, `dispatch`, `subscribe`, `replace_state` and
//! dynamic module registration.

mod builder;
mod dispatch;
mod registry;
mod store;

pub use builder::StoreBuilder;
pub use dispatch::Dispatch;
pub use store::{
    MutationRecord, Plugin, Store, StoreConfig, StrictModeViolation, SubscriptionId,
};
