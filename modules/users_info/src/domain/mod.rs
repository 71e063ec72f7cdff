pub mod error;
pub mod patch;
pub mod range;
pub mod repo;
pub mod service;
pub mod validation;
