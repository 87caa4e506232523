//! # sapcheck - sapconf / saptune setup checker
//!
//! sapcheck inspects a SUSE Linux Enterprise Server for SAP host and
//! reports whether the installed tuning tool, sapconf or saptune, is set
//! up the way its version expects: the competing tool stopped, the right
//! units running, tuned following along where it is used, and the package
//! files matching the installed generation.
//!
//! ## Checking a host
//!
//! ```no_run
//! use sapcheck::check::{SapconfCheck, TuningCheck};
//! use sapcheck::system::HostCollector;
//!
//! let facts = HostCollector::new("/").collect().unwrap();
//! let evaluation = SapconfCheck.evaluate(&facts).unwrap();
//! evaluation.print(true).unwrap();
//! std::process::exit(evaluation.status.exit_code().into());
//! ```
//!
//! ## Checking prepared facts
//!
//! ```
//! use sapcheck::check::{SaptuneCheck, Status, TuningCheck};
//! use sapcheck::system::{FactSnapshot, OsRelease, SAPTUNE};
//!
//! let facts = FactSnapshot::builder(OsRelease::sles(15, 4))
//!     .package(SAPTUNE, None)
//!     .build();
//! let evaluation = SaptuneCheck.evaluate(&facts).unwrap();
//! assert_eq!(evaluation.status, Status::NotInstalled);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod check;
pub mod config;
pub mod error;
pub mod system;

// Re-export commonly used types
pub use check::{Evaluation, Finding, Severity, Status, TuningCheck};
pub use error::{CheckError, Result};
pub use system::{FactSnapshot, HostCollector};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Prelude module for convenient imports
pub mod prelude {
    //! Convenient re-exports for common usage
    //!
    //! ```no_run
    //! use sapcheck::prelude::*;
    //! ```

    pub use crate::check::{
        Evaluation, Finding, Hint, Report, SapconfCheck, SaptuneCheck, Severity, Status,
        TuningCheck,
    };
    pub use crate::config::{CheckConfig, CliArgs, Commands, OutputFormat};
    pub use crate::error::{CheckError, Result};
    pub use crate::system::{FactSnapshot, HostCollector, OsRelease, Overview, ServiceState};
}
