//! Core webhook receiver: authentication, resource resolution, filtering,
//! and reconcile-annotation writes. The HTTP surface and server runtime
//! live in `notif-receiver-service`; this crate only knows how to turn one
//! already-framed request into a set of annotated resources.

pub mod adapters;
pub mod error;
pub mod expression;
pub mod receiver;
pub mod store;
pub mod webhook;

pub use error::NotifierError;
pub use receiver::{ProviderType, Receiver, ResourceRef, Secret, SecretRef};
pub use store::{ObjectRef, ObjectStore, StoreError};
pub use webhook::notifier::{notify, NotifyOutcome, RECONCILE_ANNOTATION};
pub use webhook::router::resolve as resolve_receiver;
pub use webhook::{handle_request, IncomingRequest};
