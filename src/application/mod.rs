//! Application Layer
//!
//! Contains business logic services and data transfer objects (DTOs).
//! This layer orchestrates the flow of data between the presentation
//! and domain layers.

pub mod dto;
pub mod services;
