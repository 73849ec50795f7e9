//! REST API tests

mod auth_tests;
mod gate_tests;
mod health_tests;
mod user_tests;
