// src/services/mod.rs
// DOCUMENTATION: Services module organization
// PURPOSE: Re-export service components

pub mod geocoding;
pub mod images;
pub mod place_service;

pub use geocoding::*;
pub use images::*;
pub use place_service::*;
