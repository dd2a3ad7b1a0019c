//! Route Handlers

pub mod form;
pub mod metrics;
pub mod predictions;
