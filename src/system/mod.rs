//! Host facts and their collection
//!
//! The checks only ever see a [`FactSnapshot`]; collecting it from a live
//! host (or a prefixed system tree) is the collector's job.

pub mod collect;
mod facts;
pub mod overview;

pub use collect::{CommandRunner, HostCollector, SystemCommands};
pub use facts::*;
pub use overview::{HostIdentity, Overview};
