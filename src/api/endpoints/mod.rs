//! API endpoint handlers.
//!
//! Handlers are thin: extract, call `ModelService`, map errors.

pub mod health;
pub mod predict;
pub mod root;
