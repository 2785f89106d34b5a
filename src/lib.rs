//! GOAT Memory server library.
//!
//! Provides the phone lookup page, the JSON lookup API and the streaming
//! download proxy, along with the user directory they read from.

pub mod api;
pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod services;
