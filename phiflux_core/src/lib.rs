//! Core rust implementation of phiflux, a crate for constraint based metabolic modeling with a
//! focus on proteome allocation (minimum protein cost) studies.

pub mod analysis;
pub mod bounds;
pub mod configuration;
pub mod io;
pub mod metabolic_model;
pub mod optimize;
pub mod report;
pub mod sampling;
pub mod scenario;
mod utils;
