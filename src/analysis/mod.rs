//! Retrieval and result aggregation modules
//!
//! Turns features into answers:
//! - Result types
//! - Ranking by projection distance and melody score
//! - Named catalogs
//! - Persistence records

pub mod catalog;
pub mod ranking;
pub mod records;
pub mod result;
