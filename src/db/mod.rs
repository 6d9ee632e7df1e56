// src/db/mod.rs
// DOCUMENTATION: Database module organization
// PURPOSE: Re-export database components

pub mod memory;
pub mod repository;
pub mod store;

pub use memory::*;
pub use repository::*;
pub use store::*;
