// Patron Registry - Core Library
// Exposes all modules for use in the CLI and tests

pub mod config;
pub mod entities;
pub mod error;
pub mod importer;
pub mod session;
pub mod validation;

// Only compile the browser when the TUI feature is enabled
#[cfg(feature = "tui")]
pub mod ui;

// Re-export commonly used types
pub use config::{LoggingConfig, RegistryConfig};
pub use entities::{Patron, PatronRegistry};
pub use error::{RegistryError, Result};
pub use importer::{Diagnostic, ImportLine, ImportReport, LineFields, LineIssue, PatronImporter};
pub use session::{MenuChoice, Session};
pub use validation::{valid_address, valid_name, FieldRules, FineCheck};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
