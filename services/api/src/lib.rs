//! services/api/src/lib.rs
//!
//! The EduSync HTTP and WebSocket service: configuration, adapters for the
//! identity store and the prompt flows, and the axum web layer.

pub mod adapters;
pub mod config;
pub mod error;
pub mod web;
