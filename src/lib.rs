//! Credit Card Assistant
//!
//! A conversational credit-card advisor that:
//! - Recommends cards by benefit, CIBIL score and income
//! - Verifies the applicant by email OTP, Aadhaar OTP and identity records
//! - Lets a hosted model pick at most one backend tool per turn
//! - Keeps a bounded transcript per session
//!
//! SINGLE-PASS LOOP:
//! CONTEXT → REQUEST → INSPECT → VALIDATE → EXECUTE ONCE → FOLLOW-UP → PERSIST

pub mod api;
pub mod app;
pub mod assistant;
pub mod config;
pub mod error;
pub mod lookup;
pub mod mail;
pub mod memory;
pub mod model;
pub mod models;
pub mod otp;
pub mod tools;
pub mod upstream;
pub mod validation;

pub use error::Result;

// Re-export common types
pub use assistant::{Assistant, TurnOutcome, TurnReply};
pub use models::*;
