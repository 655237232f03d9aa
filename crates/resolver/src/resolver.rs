use override_indexer::{Declaration, HierarchyIndex, MethodDecl};
use override_protocol::{ChildOverride, OverrideRecord, ParentOverridden};
use std::path::Path;

/// Computes override records for one target file against a hierarchy snapshot
pub struct OverrideResolver<'a> {
    index: &'a HierarchyIndex,
}

impl<'a> OverrideResolver<'a> {
    pub fn new(index: &'a HierarchyIndex) -> Self {
        Self { index }
    }

    /// Forward pass followed by the reverse pass.
    ///
    /// `target_decls` are the target file's declarations; they may come from the snapshot or
    /// from a fresh parse when the file is not part of it.
    pub fn resolve(&self, target: &Path, target_decls: &[Declaration]) -> Vec<OverrideRecord> {
        let mut records = self.forward(target, target_decls);
        records.extend(self.reverse(target, target_decls));
        log::debug!(
            "Resolved {} override records for {}",
            records.len(),
            target.display()
        );
        records
    }

    /// Child to parent: every method of a target-file class that an ancestor also declares.
    /// When the nearest declaring ancestor lives in the target file too, the pair is reported
    /// from both ends.
    pub fn forward(&self, target: &Path, target_decls: &[Declaration]) -> Vec<OverrideRecord> {
        let mut records = Vec::new();

        for decl in target_decls {
            for method in decl.methods.values() {
                let Some((owner, base_method)) = self.index.find_inherited(decl, &method.name)
                else {
                    continue;
                };

                records.push(child_override(decl, method, owner, base_method));
                if owner.file_path == target {
                    records.push(parent_overridden(owner, base_method, decl, method));
                }
            }
        }

        records
    }

    /// Parent to child: direct subclasses declared in other files that redefine a method of a
    /// target-file class.
    pub fn reverse(&self, target: &Path, target_decls: &[Declaration]) -> Vec<OverrideRecord> {
        let mut records = Vec::new();

        for child in self.index.declarations() {
            if child.file_path == target {
                continue;
            }

            for base in &child.declared_bases {
                // A name declared twice in the target refers to its last declaration.
                let Some(parent) = target_decls.iter().rev().find(|decl| &decl.name == base)
                else {
                    continue;
                };

                for child_method in child.methods.values() {
                    if let Some(parent_method) = parent.method(&child_method.name) {
                        records.push(parent_overridden(
                            parent,
                            parent_method,
                            child,
                            child_method,
                        ));
                    }
                }
            }
        }

        records
    }
}

fn child_override(
    class: &Declaration,
    method: &MethodDecl,
    base: &Declaration,
    base_method: &MethodDecl,
) -> OverrideRecord {
    OverrideRecord::ChildOverride(ChildOverride {
        class: class.name.clone(),
        method: method.name.clone(),
        line: method.line,
        signature: method.signature.clone(),
        base_class: base.name.clone(),
        base_file: file_name(&base_method.file_path),
        base_file_path: base_method.file_path.display().to_string(),
        base_line: base_method.line,
        base_signature: base_method.signature.clone(),
    })
}

fn parent_overridden(
    class: &Declaration,
    method: &MethodDecl,
    child: &Declaration,
    child_method: &MethodDecl,
) -> OverrideRecord {
    OverrideRecord::ParentOverridden(ParentOverridden {
        class: class.name.clone(),
        method: method.name.clone(),
        line: method.line,
        signature: method.signature.clone(),
        child_class: child.name.clone(),
        child_file: file_name(&child_method.file_path),
        child_file_path: child_method.file_path.display().to_string(),
        child_line: child_method.line,
        child_signature: child_method.signature.clone(),
    })
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
