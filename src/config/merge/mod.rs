//! Settings layering.

pub mod service;
