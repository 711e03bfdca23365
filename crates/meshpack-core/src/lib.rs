//! Meshpack Core - Value types shared across the meshpack crates
//!
//! This crate provides the records that make up a packed mesh file:
//! - `Color` for per-mesh diffuse color
//! - `Vertex` for entries of the global vertex table
//! - `MeshRecord` for the per-mesh ranges into the global tables

pub mod types;

pub use glam::Vec3;
pub use types::{Color, MeshRecord, Vertex};
