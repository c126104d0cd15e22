pub mod domain;
pub mod error;
pub mod osc;
pub mod protocol;
