//! Repository layer: one unit struct per table, functions taking a
//! connection so callers can run them inside a transaction.

pub mod client_repo;
pub mod subscription_repo;

pub use client_repo::ClientRepo;
pub use subscription_repo::SubscriptionRepo;
