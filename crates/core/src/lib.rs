//! Domain logic for the ERP BTP demo-signup backend.
//!
//! Everything in this crate is free of database access: credential
//! generation, plan pricing, client identifiers, signup validation and the
//! provisioning subsystem that stands up per-client deployments.

pub mod credentials;
pub mod error;
pub mod naming;
pub mod plans;
pub mod provisioning;
pub mod signup;
pub mod types;
