//! Concrete [`crate::store::ObjectStore`] implementations.

pub mod kube_store;
pub mod memory_store;
