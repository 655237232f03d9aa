//! # Override Indexer
//!
//! Incremental class-hierarchy index for a Python workspace.
//!
//! ## Pipeline
//!
//! ```text
//! Workspace root
//!     │
//!     ├──> File Scanner (.gitignore aware, bounded)
//!     │      └─> Python sources
//!     │
//!     ├──> Change Tracker (SHA-256 per file)
//!     │      └─> unchanged files reuse cached declarations
//!     │
//!     ├──> Extractor (tree-sitter)
//!     │      └─> Declarations
//!     │
//!     └──> Hierarchy Index (built fresh, swapped in)
//!            └─> classes by name, (class, method) table, find_method
//! ```
//!
//! ## Example
//!
//! ```no_run
//! use override_indexer::{RescanPolicy, Workspace};
//!
//! let mut workspace = Workspace::new("/path/to/project", RescanPolicy::default())?;
//! let stats = workspace.rescan()?;
//! println!("Indexed {} files, {} classes", stats.files, stats.classes);
//!
//! if let Some((owner, method)) = workspace.index().find_method("ElectricCar", "stop") {
//!     println!("{} defines {} at line {}", owner.name, method.name, method.line);
//! }
//! # Ok::<(), override_indexer::IndexerError>(())
//! ```

mod error;
mod fingerprint;
mod hierarchy;
mod scanner;
mod staleness;
mod stats;
mod workspace;

pub use error::{IndexerError, Result};
pub use fingerprint::{fingerprint, ChangeTracker, Fingerprint};
pub use hierarchy::{DuplicateClass, FileDeclarations, HierarchyIndex};
pub use scanner::{FileScanner, ScanOptions, ScanOutcome};
pub use staleness::{
    assess_staleness, StaleAssessment, StaleReason, StalenessInputs, WorkspaceState,
};
pub use stats::ScanStats;
pub use workspace::{RescanPolicy, Workspace, DEFAULT_RESCAN_INTERVAL};

pub use override_extractor::{Declaration, MethodDecl};
