//! Domain types and logic for model take-off.
//!
//! Everything here is transport-agnostic: remote services are reached
//! through the seam traits in [`catalog`] and [`pricebook`], implemented
//! by `takeoff-forge` (cloud APIs), `takeoff-db` (price book storage)
//! and `takeoff-client` (server proxy).
//!
//! - [`correlator`]: waits on the single outstanding job of a session.
//! - [`reconcile`]: resolves asset labels to catalog ids and submits them.
//! - [`budget`]: prices element counts and syncs with the cost catalog.

pub mod batch;
pub mod budget;
pub mod catalog;
pub mod correlator;
pub mod error;
pub mod job;
pub mod pricebook;
pub mod reconcile;
pub mod records;
pub mod types;

#[cfg(test)]
mod test_support;
