//! HTTP API for the proofing and delivery platform.
//!
//! Photographers create events and upload proofs and finals; clients pick
//! their selection against a fixed budget and download the delivered
//! images. All domain rules live in `proofroom-core`; persistence in
//! `proofroom-db`; remote images in `proofroom-storage`.

pub mod auth;
pub mod config;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod notify;
pub mod response;
pub mod routes;
pub mod state;
