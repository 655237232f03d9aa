use crate::fingerprint::Fingerprint;
use override_extractor::{Declaration, MethodDecl};
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::ops::Range;
use std::path::{Path, PathBuf};

/// Two files declare the same class name; only `kept` is reachable by name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DuplicateClass {
    pub name: String,
    pub kept: PathBuf,
    pub kept_line: usize,
    pub shadowed: PathBuf,
    pub shadowed_line: usize,
}

/// Extraction result of one file, as fed into [`HierarchyIndex::build`]
#[derive(Debug, Clone)]
pub struct FileDeclarations {
    pub path: PathBuf,
    pub fingerprint: Fingerprint,
    pub declarations: Vec<Declaration>,
}

#[derive(Debug, Clone)]
struct FileSlot {
    fingerprint: Fingerprint,
    range: Range<usize>,
}

/// Immutable snapshot of every class declared in a workspace.
///
/// Class names are resolved by simple name only; when several files declare the same name the
/// last one registered (in sorted path order, then source order) wins and the rest are reported
/// as [`DuplicateClass`] diagnostics.
#[derive(Debug, Clone, Default)]
pub struct HierarchyIndex {
    declarations: Vec<Declaration>,
    files: BTreeMap<PathBuf, FileSlot>,
    classes_by_name: HashMap<String, usize>,
    methods: HashMap<(String, String), usize>,
    unresolved_bases: BTreeSet<String>,
    duplicates: Vec<DuplicateClass>,
    generation: u64,
}

impl HierarchyIndex {
    /// Build a fresh snapshot. Files are registered in sorted path order regardless of the
    /// order they are passed in.
    pub fn build(files: impl IntoIterator<Item = FileDeclarations>, generation: u64) -> Self {
        Self::assemble(files, generation, true)
    }

    /// Copy of this snapshot with `extra` registered as if it had been scanned, replacing any
    /// indexed file at the same path. Keeps the generation; shadowing is not logged again.
    pub fn overlay(&self, extra: FileDeclarations) -> Self {
        let extra_path = extra.path.clone();
        let files: Vec<FileDeclarations> = self
            .files
            .iter()
            .filter(|(path, _)| **path != extra_path)
            .map(|(path, slot)| FileDeclarations {
                path: path.clone(),
                fingerprint: slot.fingerprint,
                declarations: self.declarations[slot.range.clone()].to_vec(),
            })
            .chain(std::iter::once(extra))
            .collect();
        Self::assemble(files, self.generation, false)
    }

    fn assemble(
        files: impl IntoIterator<Item = FileDeclarations>,
        generation: u64,
        warn_duplicates: bool,
    ) -> Self {
        let mut sorted: Vec<FileDeclarations> = files.into_iter().collect();
        sorted.sort_by(|a, b| a.path.cmp(&b.path));

        let mut index = Self {
            generation,
            ..Self::default()
        };

        for file in sorted {
            let start = index.declarations.len();
            index.declarations.extend(file.declarations);
            let range = start..index.declarations.len();

            for idx in range.clone() {
                index.register(idx, warn_duplicates);
            }

            index.files.insert(
                file.path,
                FileSlot {
                    fingerprint: file.fingerprint,
                    range,
                },
            );
        }

        for (name, &idx) in &index.classes_by_name {
            for method in index.declarations[idx].methods.keys() {
                index.methods.insert((name.clone(), method.clone()), idx);
            }
        }

        for decl in &index.declarations {
            for base in &decl.declared_bases {
                if !index.classes_by_name.contains_key(base) {
                    index.unresolved_bases.insert(base.clone());
                }
            }
        }

        index
    }

    fn register(&mut self, idx: usize, warn: bool) {
        let decl = &self.declarations[idx];
        if let Some(previous) = self.classes_by_name.insert(decl.name.clone(), idx) {
            let shadowed = &self.declarations[previous];
            if warn {
                log::warn!(
                    "Class {} declared in both {}:{} and {}:{}; using the latter",
                    decl.name,
                    shadowed.file_path.display(),
                    shadowed.line,
                    decl.file_path.display(),
                    decl.line
                );
            }
            self.duplicates.push(DuplicateClass {
                name: decl.name.clone(),
                kept: decl.file_path.clone(),
                kept_line: decl.line,
                shadowed: shadowed.file_path.clone(),
                shadowed_line: shadowed.line,
            });
        }
    }

    /// Nearest declaration of `method` starting at `class` itself
    pub fn find_method(&self, class: &str, method: &str) -> Option<(&Declaration, &MethodDecl)> {
        let mut visited = HashSet::new();
        self.search(class, method, &mut visited)
    }

    /// Nearest declaration of `method` among the ancestors of `decl`, excluding `decl` itself.
    ///
    /// `decl` need not be the declaration registered under its name; its own base list is what
    /// gets searched.
    pub fn find_inherited(
        &self,
        decl: &Declaration,
        method: &str,
    ) -> Option<(&Declaration, &MethodDecl)> {
        let mut visited = HashSet::new();
        if let Some(&idx) = self.classes_by_name.get(&decl.name) {
            visited.insert(idx);
        }
        decl.declared_bases
            .iter()
            .find_map(|base| self.search(base, method, &mut visited))
    }

    // Depth-first over declared bases, left to right; each class is entered at most once so
    // inheritance cycles terminate.
    fn search(
        &self,
        class: &str,
        method: &str,
        visited: &mut HashSet<usize>,
    ) -> Option<(&Declaration, &MethodDecl)> {
        let &idx = self.classes_by_name.get(class)?;
        if !visited.insert(idx) {
            return None;
        }

        let decl = &self.declarations[idx];

        if let Some(found) = decl.method(method) {
            return Some((decl, found));
        }

        decl.declared_bases
            .iter()
            .find_map(|base| self.search(base, method, visited))
    }

    pub fn class(&self, name: &str) -> Option<&Declaration> {
        self.classes_by_name
            .get(name)
            .map(|&idx| &self.declarations[idx])
    }

    /// Direct `(class, method)` lookup on the winning declaration, no inheritance
    pub fn lookup(&self, class: &str, method: &str) -> Option<&MethodDecl> {
        let &idx = self
            .methods
            .get(&(class.to_string(), method.to_string()))?;
        self.declarations[idx].method(method)
    }

    /// Every declaration, grouped by file in sorted path order
    pub fn declarations(&self) -> &[Declaration] {
        &self.declarations
    }

    pub fn declarations_in(&self, path: &Path) -> Option<&[Declaration]> {
        self.files
            .get(path)
            .map(|slot| &self.declarations[slot.range.clone()])
    }

    pub fn contains_file(&self, path: &Path) -> bool {
        self.files.contains_key(path)
    }

    pub fn file_fingerprint(&self, path: &Path) -> Option<Fingerprint> {
        self.files.get(path).map(|slot| slot.fingerprint)
    }

    pub fn files(&self) -> impl Iterator<Item = &Path> {
        self.files.keys().map(PathBuf::as_path)
    }

    pub fn class_count(&self) -> usize {
        self.declarations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn unresolved_bases(&self) -> &BTreeSet<String> {
        &self.unresolved_bases
    }

    pub fn duplicates(&self) -> &[DuplicateClass] {
        &self.duplicates
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn file(path: &str, declarations: Vec<Declaration>) -> FileDeclarations {
        FileDeclarations {
            path: PathBuf::from(path),
            fingerprint: Fingerprint::of_bytes(path.as_bytes()),
            declarations,
        }
    }

    fn vehicles() -> HierarchyIndex {
        HierarchyIndex::build(
            vec![
                file(
                    "/ws/child.py",
                    vec![
                        Declaration::new("Car", "/ws/child.py", 1)
                            .with_base("Vehicle")
                            .with_method("start", 2)
                            .with_method("honk", 4),
                        Declaration::new("ElectricCar", "/ws/child.py", 7)
                            .with_base("Car")
                            .with_method("start", 8)
                            .with_method("charge", 10),
                    ],
                ),
                file(
                    "/ws/base.py",
                    vec![Declaration::new("Vehicle", "/ws/base.py", 1)
                        .with_method("start", 2)
                        .with_method("stop", 4)],
                ),
            ],
            1,
        )
    }

    #[test]
    fn find_method_prefers_nearest_ancestor() {
        let index = vehicles();

        let (decl, method) = index.find_method("ElectricCar", "start").unwrap();
        assert_eq!(decl.name, "ElectricCar");
        assert_eq!(method.line, 8);

        let electric = index.class("ElectricCar").unwrap();
        let (decl, _) = index.find_inherited(electric, "start").unwrap();
        assert_eq!(decl.name, "Car");

        let (decl, method) = index.find_inherited(electric, "stop").unwrap();
        assert_eq!(decl.name, "Vehicle");
        assert_eq!(method.file_path, PathBuf::from("/ws/base.py"));

        assert!(index.find_inherited(electric, "charge").is_none());
    }

    #[test]
    fn files_are_ordered_by_path() {
        let index = vehicles();
        let names: Vec<_> = index.declarations().iter().map(|d| d.name.as_str()).collect();
        assert_eq!(names, vec!["Vehicle", "Car", "ElectricCar"]);
        let files: Vec<_> = index.files().collect();
        assert_eq!(files, vec![Path::new("/ws/base.py"), Path::new("/ws/child.py")]);
        assert_eq!(
            index.declarations_in(Path::new("/ws/child.py")).unwrap().len(),
            2
        );
        assert!(index.declarations_in(Path::new("/ws/other.py")).is_none());
        assert_eq!(index.generation(), 1);
    }

    #[test]
    fn unresolved_bases_are_recorded() {
        let index = HierarchyIndex::build(
            vec![file(
                "/ws/a.py",
                vec![Declaration::new("A", "/ws/a.py", 1)
                    .with_base("typing.Protocol")
                    .with_base("Missing")
                    .with_method("run", 2)],
            )],
            1,
        );

        let a = index.class("A").unwrap();
        assert!(index.find_inherited(a, "run").is_none());
        let unresolved: Vec<_> = index.unresolved_bases().iter().cloned().collect();
        assert_eq!(unresolved, vec!["Missing", "typing.Protocol"]);
    }

    #[test]
    fn every_base_is_known_or_unresolved() {
        let index = vehicles();
        for decl in index.declarations() {
            for base in &decl.declared_bases {
                assert!(index.class(base).is_some() || index.unresolved_bases().contains(base));
            }
        }
        assert!(index.unresolved_bases().is_empty());
    }

    #[test]
    fn duplicate_names_last_registered_wins() {
        let index = HierarchyIndex::build(
            vec![
                file(
                    "/ws/b.py",
                    vec![Declaration::new("Model", "/ws/b.py", 3).with_method("save", 4)],
                ),
                file(
                    "/ws/a.py",
                    vec![Declaration::new("Model", "/ws/a.py", 1).with_method("load", 2)],
                ),
            ],
            1,
        );

        assert_eq!(
            index.class("Model").unwrap().file_path,
            PathBuf::from("/ws/b.py")
        );
        assert!(index.lookup("Model", "save").is_some());
        assert!(index.lookup("Model", "load").is_none());
        assert_eq!(
            index.duplicates(),
            &[DuplicateClass {
                name: "Model".to_string(),
                kept: PathBuf::from("/ws/b.py"),
                kept_line: 3,
                shadowed: PathBuf::from("/ws/a.py"),
                shadowed_line: 1,
            }]
        );
    }

    #[test]
    fn diamond_uses_first_declared_base() {
        let index = HierarchyIndex::build(
            vec![file(
                "/ws/d.py",
                vec![
                    Declaration::new("Root", "/ws/d.py", 1).with_method("hook", 2),
                    Declaration::new("Left", "/ws/d.py", 4).with_base("Root"),
                    Declaration::new("Right", "/ws/d.py", 6)
                        .with_base("Root")
                        .with_method("hook", 7),
                    Declaration::new("Bottom", "/ws/d.py", 9)
                        .with_base("Left")
                        .with_base("Right")
                        .with_method("hook", 10),
                ],
            )],
            1,
        );

        // Depth-first through Left reaches Root before Right is considered.
        let bottom = index.class("Bottom").unwrap();
        let (decl, _) = index.find_inherited(bottom, "hook").unwrap();
        assert_eq!(decl.name, "Root");
    }

    #[test]
    fn inheritance_cycles_terminate() {
        let index = HierarchyIndex::build(
            vec![file(
                "/ws/cycle.py",
                vec![
                    Declaration::new("A", "/ws/cycle.py", 1)
                        .with_base("B")
                        .with_method("x", 2),
                    Declaration::new("B", "/ws/cycle.py", 4).with_base("A"),
                    Declaration::new("C", "/ws/cycle.py", 6).with_base("C"),
                ],
            )],
            1,
        );

        let a = index.class("A").unwrap();
        assert!(index.find_inherited(a, "x").is_none());
        assert!(index.find_method("B", "y").is_none());
        let c = index.class("C").unwrap();
        assert!(index.find_inherited(c, "x").is_none());
    }

    #[test]
    fn overlay_registers_an_unindexed_file() {
        let index = vehicles();
        let scratch = file(
            "/ws/scratch.py",
            vec![
                Declaration::new("Shape", "/ws/scratch.py", 1).with_method("area", 2),
                Declaration::new("Square", "/ws/scratch.py", 4)
                    .with_base("Shape")
                    .with_method("area", 5),
            ],
        );

        let overlay = index.overlay(scratch);
        let square = overlay.class("Square").unwrap();
        let (decl, _) = overlay.find_inherited(square, "area").unwrap();
        assert_eq!(decl.name, "Shape");
        assert!(overlay.class("ElectricCar").is_some());
        assert_eq!(overlay.generation(), index.generation());
        assert!(index.class("Square").is_none());
    }

    #[test]
    fn overlay_replaces_the_indexed_copy_of_a_file() {
        let index = vehicles();
        let edited = file(
            "/ws/base.py",
            vec![Declaration::new("Vehicle", "/ws/base.py", 1).with_method("park", 2)],
        );

        let overlay = index.overlay(edited);
        assert_eq!(overlay.declarations().len(), 3);
        assert!(overlay.lookup("Vehicle", "park").is_some());
        assert!(overlay.lookup("Vehicle", "stop").is_none());
    }
}
