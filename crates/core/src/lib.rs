//! Pure domain logic for the proofing and delivery workflow.
//!
//! No database or network dependencies live here; persistence is done
//! through the repository layer in `proofroom-db`, remote images through
//! `proofroom-storage`. This crate provides:
//!
//! - The event lifecycle state machine and its transition rules
//! - The per-client selection session (tentative picks, atomic submit)
//! - The retention policy used by the cleanup sweeper
//! - Request validation and shared error/role/type definitions

pub mod error;
pub mod lifecycle;
pub mod retention;
pub mod roles;
pub mod selection;
pub mod types;
pub mod validation;
