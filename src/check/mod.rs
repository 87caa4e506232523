//! Configuration checks for sapconf and saptune
//!
//! Each tool has an engine: an ordered rule table evaluated against a
//! [`FactSnapshot`](crate::system::FactSnapshot). The engines share the
//! version classifier, the file-set table and auditor, and the report.

pub mod audit;
pub mod fileset;
mod finding;
mod report;
pub mod rules;
mod sapconf;
mod saptune;
pub mod version;

pub use finding::{Finding, Hint, Severity, Status};
pub use report::{Evaluation, Report};
pub use rules::TuningCheck;
pub use sapconf::SapconfCheck;
pub use saptune::{SaptuneCheck, OBSOLETE_SOLUTIONS};
pub use version::{SapconfTier, SaptuneTier, Version};
