// src/lib.rs
// DOCUMENTATION: Library root shared by the server and the seed binary
// PURPOSE: Expose modules to src/main.rs and src/bin/

pub mod auth;
pub mod config;
pub mod db;
pub mod errors;
pub mod handlers;
pub mod models;
pub mod services;
