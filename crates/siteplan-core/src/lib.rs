//! Siteplan Core Types and Definitions
//!
//! This crate provides the foundational types shared by the siteplan
//! placement optimizer. It includes:
//!
//! - **Geometry**: Points, sizes and rectangle queries ([`geometry`] module)
//! - **Identifiers**: String-interned space identifiers ([`identifier::SpaceId`])
//! - **Site model**: Site, spaces and fixed zones ([`site`] module)
//! - **Adjacency**: SLP closeness ratings between spaces ([`adjacency`] module)
//! - **Hazards**: Hazard tags and safety distances ([`hazard`] module)
//! - **Placement**: Rotations, attachments and placed layouts ([`placement`] module)

pub mod adjacency;
pub mod error;
pub mod geometry;
pub mod hazard;
pub mod identifier;
pub mod placement;
pub mod site;

pub use error::ModelError;
