//! # Override Resolver
//!
//! Turns a class-hierarchy snapshot into override hints for one file.
//!
//! ```text
//! target file declarations ──> forward pass  (child → nearest declaring ancestor)
//!                                  │            + dual record when both live in the target
//! snapshot declarations   ──> reverse pass  (target class → direct subclasses elsewhere)
//!                                  │
//!                                  └──> Vec<OverrideRecord>
//! ```
//!
//! Lookup is by declared base name, depth-first and left to right; it is not Python's C3
//! method resolution order.

mod resolver;

pub use resolver::OverrideResolver;

use override_indexer::Workspace;
use override_protocol::OverrideRecord;
use std::path::Path;

/// Override records for `target` against the workspace's current snapshot.
///
/// Does not rescan; call [`Workspace::ensure_fresh`] first.
pub fn analyze(workspace: &mut Workspace, target: &Path) -> Vec<OverrideRecord> {
    let (index, target_decls) = workspace.target_view(target);
    OverrideResolver::new(&index).resolve(target, &target_decls)
}
