//! Duka server library.
//!
//! This crate provides the API server as a library, allowing the lifecycle
//! services to be tested and reused outside the binary.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod mpesa;
pub mod routes;
pub mod services;
pub mod state;
