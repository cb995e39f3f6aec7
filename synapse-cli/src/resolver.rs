//! Cross-file name resolution.
//!
//! Merges per-file parses into a project index, then resolves raw call
//! sites, base-class references, decorators, type annotations and import
//! names to canonical entity IDs. Unresolvable calls become edges to
//! synthetic external-reference nodes so out-of-graph targets stay visible
//! without introducing phantom resolved entities.
//!
//! Resolution is deterministic: candidate ties prefer the same module, then
//! the lexically nearest definition, then the alphabetically first ID.

use rustc_hash::FxHashMap;
use tracing::warn;

use crate::models::{Entity, EntityData, EntityKind, Relationship, RelationKind, SourceLocation};
use crate::parsers::{python, ParsedFile};

/// Fully resolved entities and relationships, ready for the graph builder.
#[derive(Debug, Default)]
pub struct ResolvedProject {
    /// Parsed entities plus synthetic external-reference nodes.
    pub entities: Vec<Entity>,
    pub relationships: Vec<Relationship>,
}

/// Per-file import bindings.
#[derive(Debug, Default)]
struct ImportTable {
    /// Local binding -> canonical dotted module (`np` -> `numpy`).
    module_aliases: FxHashMap<String, String>,
    /// Local binding -> (canonical module, original name).
    name_imports: FxHashMap<String, (String, String)>,
    /// Star-imported modules, in file order.
    star_imports: Vec<String>,
}

/// Immutable project index: file parses plus lookup tables. Built once,
/// read-only afterwards.
pub struct ProjectIndex<'a> {
    files: &'a [ParsedFile],
    /// Dotted module name -> file path.
    module_paths: FxHashMap<String, &'a str>,
    /// (file path, qualified name) -> entity indices into `entities`.
    by_qualified: FxHashMap<(String, String), Vec<usize>>,
    /// Flattened entities across all files.
    entities: Vec<&'a Entity>,
    import_tables: FxHashMap<&'a str, ImportTable>,
}

impl<'a> ProjectIndex<'a> {
    pub fn build(files: &'a [ParsedFile]) -> Self {
        let mut module_paths = FxHashMap::default();
        let mut by_qualified: FxHashMap<(String, String), Vec<usize>> = FxHashMap::default();
        let mut entities = Vec::new();
        let mut import_tables = FxHashMap::default();

        for file in files {
            module_paths.insert(python::module_dotted_name(&file.path), file.path.as_str());
            for entity in &file.entities {
                let idx = entities.len();
                entities.push(entity);
                by_qualified
                    .entry((file.path.clone(), entity.qualified_name.clone()))
                    .or_default()
                    .push(idx);
            }
            import_tables.insert(file.path.as_str(), build_import_table(file));
        }

        Self {
            files,
            module_paths,
            by_qualified,
            entities,
            import_tables,
        }
    }

    fn entity(&self, idx: usize) -> &'a Entity {
        self.entities[idx]
    }

    fn lookup(&self, file: &str, qualified: &str) -> &[usize] {
        self.by_qualified
            .get(&(file.to_string(), qualified.to_string()))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    fn module_path(&self, dotted: &str) -> Option<&'a str> {
        self.module_paths.get(dotted).copied()
    }
}

fn build_import_table(file: &ParsedFile) -> ImportTable {
    let mut table = ImportTable::default();
    for record in &file.imports {
        let canonical = if record.is_relative {
            resolve_relative_module(&record.module, &file.path)
        } else {
            record.module.clone()
        };

        if record.is_star {
            table.star_imports.push(canonical);
        } else if !record.imported_names.is_empty() {
            for imported in &record.imported_names {
                table.name_imports.insert(
                    imported.local().to_string(),
                    (canonical.clone(), imported.name.clone()),
                );
            }
        } else if let Some(ref alias) = record.alias {
            table.module_aliases.insert(alias.clone(), canonical);
        } else {
            // `import os.path` binds `os`.
            let head = canonical.split('.').next().unwrap_or(&canonical);
            table
                .module_aliases
                .insert(head.to_string(), head.to_string());
            // `import a.b` also makes the full dotted path addressable.
            if head != canonical {
                table.module_aliases.insert(canonical.clone(), canonical);
            }
        }
    }
    table
}

/// Turn `.utils` / `..base` into an absolute dotted module for a file.
/// One dot anchors at the file's package, each further dot walks up.
fn resolve_relative_module(module: &str, file_path: &str) -> String {
    let level = module.chars().take_while(|&c| c == '.').count();
    let suffix = &module[level..];

    let dotted = python::module_dotted_name(file_path);
    let segments: Vec<&str> = dotted.split('.').collect();
    let keep = segments.len().saturating_sub(level);
    let package: Vec<&str> = segments.into_iter().take(keep).collect();

    if suffix.is_empty() {
        package.join(".")
    } else if package.is_empty() {
        suffix.to_string()
    } else {
        format!("{}.{}", package.join("."), suffix)
    }
}

/// Outcome of resolving one textual reference.
#[derive(Debug, Clone, PartialEq)]
enum Resolution {
    /// Canonical entity ID inside the project.
    Entity(String),
    /// Best-known textual target outside the project.
    External(String),
    Unresolved,
}

pub struct Resolver<'a> {
    index: ProjectIndex<'a>,
}

impl<'a> Resolver<'a> {
    pub fn new(files: &'a [ParsedFile]) -> Self {
        Self {
            index: ProjectIndex::build(files),
        }
    }

    /// Resolve the whole project into entities and relationships.
    pub fn resolve(&self) -> ResolvedProject {
        let mut out = ResolvedProject::default();
        let mut external_nodes: FxHashMap<String, Entity> = FxHashMap::default();

        for file in self.index.files {
            out.entities.extend(file.entities.iter().cloned());
        }

        for file in self.index.files {
            self.containment_edges(file, &mut out);
            self.import_edges(file, &mut out, &mut external_nodes);
            self.call_edges(file, &mut out, &mut external_nodes);
            self.inheritance_edges(file, &mut out, &mut external_nodes);
            self.annotation_edges(file, &mut out);
            self.exception_edges(file, &mut out);
        }
        self.override_edges(&mut out);

        let mut externals: Vec<Entity> = external_nodes.into_values().collect();
        externals.sort_by(|a, b| a.id.cmp(&b.id));
        out.entities.extend(externals);

        // Sorted hand-off keeps downstream insertion order deterministic.
        out.entities.sort_by(|a, b| a.id.cmp(&b.id));
        out.relationships.sort_by(|a, b| {
            (&a.source, &a.target, a.kind, a.line).cmp(&(&b.source, &b.target, b.kind, b.line))
        });
        out
    }

    /// CONTAINS: module -> top-level entities, class -> members.
    fn containment_edges(&self, file: &ParsedFile, out: &mut ResolvedProject) {
        for entity in &file.entities {
            if entity.kind() == EntityKind::Module {
                continue;
            }
            let parent_id = match entity.qualified_name.rsplit_once('.') {
                Some((parent_qualified, _)) => {
                    if self.index.lookup(&file.path, parent_qualified).is_empty() {
                        file.path.clone()
                    } else {
                        crate::models::entity_id(&file.path, parent_qualified)
                    }
                }
                None => file.path.clone(),
            };
            out.relationships.push(
                Relationship::new(parent_id, entity.id.clone(), RelationKind::Contains)
                    .at_line(entity.location.start_line),
            );
        }
    }

    /// IMPORTS: module -> module; IMPORTS_FROM: module -> imported entity.
    fn import_edges(
        &self,
        file: &ParsedFile,
        out: &mut ResolvedProject,
        externals: &mut FxHashMap<String, Entity>,
    ) {
        for record in &file.imports {
            let canonical = if record.is_relative {
                resolve_relative_module(&record.module, &file.path)
            } else {
                record.module.clone()
            };
            if canonical.is_empty() {
                continue;
            }

            let target = match self.index.module_path(&canonical) {
                Some(path) => path.to_string(),
                None => external_node(externals, &canonical, &file.path),
            };
            out.relationships.push(
                Relationship::new(file.path.clone(), target.clone(), RelationKind::Imports)
                    .at_line(record.line),
            );

            // Known modules additionally get name-level edges.
            if let Some(module_file) = self.index.module_path(&canonical) {
                for imported in &record.imported_names {
                    let candidates = self.index.lookup(module_file, &imported.name);
                    if let Some(&idx) = candidates.first() {
                        out.relationships.push(
                            Relationship::new(
                                file.path.clone(),
                                self.index.entity(idx).id.clone(),
                                RelationKind::ImportsFrom,
                            )
                            .at_line(record.line),
                        );
                    }
                }
            }
        }
    }

    fn call_edges(
        &self,
        file: &ParsedFile,
        out: &mut ResolvedProject,
        externals: &mut FxHashMap<String, Entity>,
    ) {
        for call in &file.raw_calls {
            match self.resolve_reference(file, &call.caller, &call.callee, call.line) {
                Resolution::Entity(target) => {
                    let kind = if self.is_class(&target) {
                        RelationKind::Instantiates
                    } else {
                        RelationKind::Calls
                    };
                    out.relationships.push(
                        Relationship::new(call.caller.clone(), target, kind).at_line(call.line),
                    );
                }
                Resolution::External(name) => {
                    let target = external_node(externals, &name, &file.path);
                    out.relationships.push(
                        Relationship::new(call.caller.clone(), target, RelationKind::Calls)
                            .at_line(call.line),
                    );
                }
                Resolution::Unresolved => {}
            }
        }

        // Decorator edges: decorator -> decorated.
        for entity in &file.entities {
            let decorators: &[String] = match &entity.data {
                EntityData::Function { signature, .. } | EntityData::Method { signature, .. } => {
                    &signature.decorators
                }
                EntityData::Class { decorators, .. } => decorators,
                _ => continue,
            };
            for decorator in decorators {
                if let Resolution::Entity(source) =
                    self.resolve_reference(file, &entity.id, decorator, entity.location.start_line)
                {
                    out.relationships.push(
                        Relationship::new(source, entity.id.clone(), RelationKind::Decorates)
                            .at_line(entity.location.start_line),
                    );
                }
            }
        }
    }

    /// INHERITS / IMPLEMENTS from class base references, same rules as calls.
    fn inheritance_edges(
        &self,
        file: &ParsedFile,
        out: &mut ResolvedProject,
        externals: &mut FxHashMap<String, Entity>,
    ) {
        for entity in &file.entities {
            let EntityData::Class { bases, .. } = &entity.data else {
                continue;
            };
            for base in bases {
                match self.resolve_reference(file, &entity.id, base, entity.location.start_line) {
                    Resolution::Entity(target) => {
                        let kind = if self.is_protocol_like(&target) {
                            RelationKind::Implements
                        } else {
                            RelationKind::Inherits
                        };
                        out.relationships.push(
                            Relationship::new(entity.id.clone(), target, kind)
                                .at_line(entity.location.start_line),
                        );
                    }
                    Resolution::External(name) => {
                        let target = external_node(externals, &name, &file.path);
                        out.relationships.push(
                            Relationship::new(entity.id.clone(), target, RelationKind::Inherits)
                                .at_line(entity.location.start_line),
                        );
                    }
                    Resolution::Unresolved => {}
                }
            }
        }
    }

    /// RETURNS / USES edges from annotations, in-project targets only.
    fn annotation_edges(&self, file: &ParsedFile, out: &mut ResolvedProject) {
        for entity in &file.entities {
            let signature = match &entity.data {
                EntityData::Function { signature, .. } | EntityData::Method { signature, .. } => {
                    signature
                }
                _ => continue,
            };

            if let Some(return_type) = &signature.return_type {
                if let Some(name) = annotation_head(return_type) {
                    if let Resolution::Entity(target) =
                        self.resolve_reference(file, &entity.id, &name, entity.location.start_line)
                    {
                        out.relationships.push(
                            Relationship::new(entity.id.clone(), target, RelationKind::Returns)
                                .at_line(entity.location.start_line),
                        );
                    }
                }
            }
            for param in &signature.parameters {
                let Some(hint) = &param.type_hint else { continue };
                let Some(name) = annotation_head(hint) else { continue };
                if let Resolution::Entity(target) =
                    self.resolve_reference(file, &entity.id, &name, entity.location.start_line)
                {
                    out.relationships.push(
                        Relationship::new(entity.id.clone(), target, RelationKind::Uses)
                            .at_line(entity.location.start_line),
                    );
                }
            }
        }
    }

    /// RAISES / CATCHES edges, in-project exception types only.
    fn exception_edges(&self, file: &ParsedFile, out: &mut ResolvedProject) {
        for (sites, kind) in [
            (&file.raw_raises, RelationKind::Raises),
            (&file.raw_catches, RelationKind::Catches),
        ] {
            for site in sites {
                if let Resolution::Entity(target) =
                    self.resolve_reference(file, &site.caller, &site.callee, site.line)
                {
                    out.relationships.push(
                        Relationship::new(site.caller.clone(), target, kind).at_line(site.line),
                    );
                }
            }
        }
    }

    /// OVERRIDES: method shadowing a same-named method on a resolved base.
    fn override_edges(&self, out: &mut ResolvedProject) {
        let class_methods: FxHashMap<&str, Vec<&str>> = out
            .entities
            .iter()
            .filter_map(|e| match &e.data {
                EntityData::Class { methods, .. } => {
                    Some((e.id.as_str(), methods.iter().map(String::as_str).collect()))
                }
                _ => None,
            })
            .collect();

        let inherits: Vec<(String, String)> = out
            .relationships
            .iter()
            .filter(|r| r.kind == RelationKind::Inherits || r.kind == RelationKind::Implements)
            .filter(|r| class_methods.contains_key(r.target.as_str()))
            .map(|r| (r.source.clone(), r.target.clone()))
            .collect();

        for (class_id, base_id) in inherits {
            let (Some(subclass), Some(base)) = (
                class_methods.get(class_id.as_str()),
                class_methods.get(base_id.as_str()),
            ) else {
                continue;
            };
            for method in subclass {
                if base.contains(method) {
                    out.relationships.push(Relationship::new(
                        format!("{class_id}.{method}"),
                        format!("{base_id}.{method}"),
                        RelationKind::Overrides,
                    ));
                }
            }
        }
    }

    fn is_class(&self, id: &str) -> bool {
        self.index
            .entities
            .iter()
            .any(|e| e.id == id && e.kind() == EntityKind::Class)
    }

    fn is_protocol_like(&self, id: &str) -> bool {
        self.index.entities.iter().any(|e| {
            e.id == id
                && matches!(&e.data, EntityData::Class { bases, .. }
                    if bases.iter().any(|b| b == "Protocol" || b == "ABC" || b.ends_with(".Protocol")))
        })
    }

    /// Resolve one textual reference from a call site.
    fn resolve_reference(
        &self,
        file: &ParsedFile,
        caller: &str,
        name: &str,
        line: u32,
    ) -> Resolution {
        if name.is_empty() {
            return Resolution::Unresolved;
        }
        let table = match self.index.import_tables.get(file.path.as_str()) {
            Some(t) => t,
            None => return Resolution::Unresolved,
        };

        if let Some((head, rest)) = name.split_once('.') {
            return self.resolve_qualified(file, caller, head, rest, table);
        }
        self.resolve_unqualified(file, caller, name, line, table)
    }

    fn resolve_qualified(
        &self,
        file: &ParsedFile,
        caller: &str,
        head: &str,
        rest: &str,
        table: &ImportTable,
    ) -> Resolution {
        // self.method() / cls.method(): look inside the caller's class.
        if head == "self" || head == "cls" {
            if let Some(owner) = self.caller_owner_class(file, caller) {
                let qualified = format!("{owner}.{rest}");
                if let Some(&idx) = self.index.lookup(&file.path, &qualified).first() {
                    return Resolution::Entity(self.index.entity(idx).id.clone());
                }
            }
            return Resolution::Unresolved;
        }

        // Head is an imported module alias.
        if let Some(canonical) = table.module_aliases.get(head) {
            if let Some(module_file) = self.index.module_path(canonical) {
                if let Some(&idx) = self.index.lookup(module_file, rest).first() {
                    return Resolution::Entity(self.index.entity(idx).id.clone());
                }
            }
            return Resolution::External(format!("{canonical}.{rest}"));
        }

        // Head is a from-imported name (`from m import Cls; Cls.method()`).
        if let Some((module, original)) = table.name_imports.get(head) {
            if let Some(module_file) = self.index.module_path(module) {
                let qualified = format!("{original}.{rest}");
                if let Some(&idx) = self.index.lookup(module_file, &qualified).first() {
                    return Resolution::Entity(self.index.entity(idx).id.clone());
                }
            }
            return Resolution::External(format!("{module}.{original}.{rest}"));
        }

        // Local qualified reference (`Outer.helper`).
        let full = format!("{head}.{rest}");
        if let Some(&idx) = self.index.lookup(&file.path, &full).first() {
            return Resolution::Entity(self.index.entity(idx).id.clone());
        }

        Resolution::External(full)
    }

    fn resolve_unqualified(
        &self,
        file: &ParsedFile,
        caller: &str,
        name: &str,
        line: u32,
        table: &ImportTable,
    ) -> Resolution {
        // Lexical scopes: enclosing function/class, then module level.
        let caller_qualified = caller
            .strip_prefix(&format!("{}:", file.path))
            .unwrap_or("");
        let mut prefixes: Vec<String> = Vec::new();
        let mut current = caller_qualified.to_string();
        while !current.is_empty() {
            prefixes.push(current.clone());
            current = current
                .rsplit_once('.')
                .map(|(head, _)| head.to_string())
                .unwrap_or_default();
        }
        prefixes.push(String::new());

        for prefix in &prefixes {
            let qualified = if prefix.is_empty() {
                name.to_string()
            } else {
                format!("{prefix}.{name}")
            };
            let candidates = self.index.lookup(&file.path, &qualified);
            if !candidates.is_empty() {
                return Resolution::Entity(self.pick(candidates, line).id.clone());
            }
        }

        // Names brought in by `from m import name`.
        if let Some((module, original)) = table.name_imports.get(name) {
            if let Some(module_file) = self.index.module_path(module) {
                let candidates = self.index.lookup(module_file, original);
                if !candidates.is_empty() {
                    return Resolution::Entity(self.pick(candidates, line).id.clone());
                }
            }
            return Resolution::External(format!("{module}.{original}"));
        }

        // Star imports, in file order; collisions warn and keep the first.
        let mut star_hit: Option<&Entity> = None;
        for module in &table.star_imports {
            let Some(module_file) = self.index.module_path(module) else {
                continue;
            };
            let candidates = self.index.lookup(module_file, name);
            if candidates.is_empty() {
                continue;
            }
            let candidate = self.pick(candidates, line);
            match star_hit {
                None => star_hit = Some(candidate),
                Some(first) => {
                    warn!(
                        "star-import collision in {}: `{}` found in both {} and {}; keeping the first",
                        file.path, name, first.id, candidate.id
                    );
                }
            }
        }
        if let Some(hit) = star_hit {
            return Resolution::Entity(hit.id.clone());
        }

        Resolution::External(name.to_string())
    }

    /// Deterministic tie-break: same module is a given here, so lexically
    /// nearest to the call site, then alphabetically first ID.
    fn pick(&self, candidates: &[usize], line: u32) -> &'a Entity {
        let mut best: Option<&Entity> = None;
        let mut best_key = (u32::MAX, String::new());
        for &idx in candidates {
            let entity = self.index.entity(idx);
            let distance = entity.location.start_line.abs_diff(line);
            let key = (distance, entity.id.clone());
            if best.is_none() || key < best_key {
                best = Some(entity);
                best_key = key;
            }
        }
        best.expect("pick called with candidates")
    }

    fn caller_owner_class(&self, file: &ParsedFile, caller: &str) -> Option<String> {
        let qualified = caller.strip_prefix(&format!("{}:", file.path))?;
        self.index
            .lookup(&file.path, qualified)
            .iter()
            .find_map(|&idx| self.index.entity(idx).owner_class().map(str::to_string))
    }
}

/// Take the outermost name of a type annotation: `List[Widget]` -> `List`,
/// `"Quoted"` -> `Quoted`.
fn annotation_head(annotation: &str) -> Option<String> {
    let trimmed = annotation.trim().trim_matches('"').trim_matches('\'');
    let head: String = trimmed
        .chars()
        .take_while(|c| c.is_alphanumeric() || *c == '_' || *c == '.')
        .collect();
    if head.is_empty() {
        None
    } else {
        Some(head)
    }
}

/// Intern a synthetic node for an out-of-graph target.
fn external_node(
    externals: &mut FxHashMap<String, Entity>,
    name: &str,
    referenced_from: &str,
) -> String {
    let entity = externals.entry(name.to_string()).or_insert_with(|| Entity {
        id: name.to_string(),
        name: name.rsplit('.').next().unwrap_or(name).to_string(),
        qualified_name: name.to_string(),
        location: SourceLocation {
            file: String::new(),
            start_line: 0,
            end_line: 0,
        },
        data: EntityData::Import {
            module: referenced_from.to_string(),
        },
    });
    entity.id.clone()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parsers::python::parse_source;

    fn resolve_sources(sources: &[(&str, &str)]) -> ResolvedProject {
        let files: Vec<ParsedFile> = sources
            .iter()
            .map(|(path, src)| parse_source(src, path).unwrap())
            .collect();
        Resolver::new(&files).resolve()
    }

    fn has_edge(out: &ResolvedProject, source: &str, target: &str, kind: RelationKind) -> bool {
        out.relationships
            .iter()
            .any(|r| r.source == source && r.target == target && r.kind == kind)
    }

    #[test]
    fn test_from_import_call_resolves_across_files() {
        let out = resolve_sources(&[
            (
                "a.py",
                "from b import bar\n\ndef foo():\n    bar()\n",
            ),
            ("b.py", "def bar():\n    return 42\n"),
        ]);
        assert!(has_edge(&out, "a.py:foo", "b.py:bar", RelationKind::Calls));
        assert!(has_edge(&out, "a.py", "b.py", RelationKind::Imports));
        assert!(has_edge(&out, "a.py", "b.py:bar", RelationKind::ImportsFrom));
    }

    #[test]
    fn test_star_import_resolves_in_file_order() {
        let out = resolve_sources(&[
            ("a.py", "from b import *\n\ndef foo():\n    bar()\n"),
            ("b.py", "def bar():\n    pass\n"),
        ]);
        assert!(has_edge(&out, "a.py:foo", "b.py:bar", RelationKind::Calls));
    }

    #[test]
    fn test_star_import_collision_prefers_first() {
        let out = resolve_sources(&[
            (
                "a.py",
                "from b import *\nfrom c import *\n\ndef foo():\n    shared()\n",
            ),
            ("b.py", "def shared():\n    pass\n"),
            ("c.py", "def shared():\n    pass\n"),
        ]);
        assert!(has_edge(&out, "a.py:foo", "b.py:shared", RelationKind::Calls));
        assert!(!has_edge(&out, "a.py:foo", "c.py:shared", RelationKind::Calls));
    }

    #[test]
    fn test_alias_qualified_call() {
        let out = resolve_sources(&[
            (
                "a.py",
                "import utils.helper as h\n\ndef foo():\n    h.fetch()\n",
            ),
            ("utils/helper.py", "def fetch():\n    pass\n"),
        ]);
        assert!(has_edge(
            &out,
            "a.py:foo",
            "utils/helper.py:fetch",
            RelationKind::Calls
        ));
    }

    #[test]
    fn test_unresolved_call_becomes_external_node() {
        let out = resolve_sources(&[(
            "a.py",
            "import numpy as np\n\ndef foo():\n    np.array([1])\n",
        )]);
        assert!(has_edge(&out, "a.py:foo", "numpy.array", RelationKind::Calls));
        let external = out.entities.iter().find(|e| e.id == "numpy.array").unwrap();
        assert_eq!(external.kind(), EntityKind::Import);
    }

    #[test]
    fn test_local_definition_shadows_import() {
        let out = resolve_sources(&[
            (
                "a.py",
                "from b import bar\n\ndef bar():\n    pass\n\ndef foo():\n    bar()\n",
            ),
            ("b.py", "def bar():\n    pass\n"),
        ]);
        assert!(has_edge(&out, "a.py:foo", "a.py:bar", RelationKind::Calls));
    }

    #[test]
    fn test_self_call_resolves_to_method() {
        let out = resolve_sources(&[(
            "a.py",
            r#"
class Widget:
    def render(self):
        self.validate()

    def validate(self):
        pass
"#,
        )]);
        assert!(has_edge(
            &out,
            "a.py:Widget.render",
            "a.py:Widget.validate",
            RelationKind::Calls
        ));
    }

    #[test]
    fn test_inheritance_resolves_across_files() {
        let out = resolve_sources(&[
            (
                "derived.py",
                "from base import Base\n\nclass Child(Base):\n    def run(self):\n        pass\n",
            ),
            ("base.py", "class Base:\n    def run(self):\n        pass\n"),
        ]);
        assert!(has_edge(
            &out,
            "derived.py:Child",
            "base.py:Base",
            RelationKind::Inherits
        ));
        assert!(has_edge(
            &out,
            "derived.py:Child.run",
            "base.py:Base.run",
            RelationKind::Overrides
        ));
    }

    #[test]
    fn test_class_instantiation_kind() {
        let out = resolve_sources(&[(
            "a.py",
            "class Widget:\n    pass\n\ndef make():\n    return Widget()\n",
        )]);
        assert!(has_edge(
            &out,
            "a.py:make",
            "a.py:Widget",
            RelationKind::Instantiates
        ));
    }

    #[test]
    fn test_contains_edges() {
        let out = resolve_sources(&[(
            "a.py",
            "class Widget:\n    def render(self):\n        pass\n\ndef top():\n    pass\n",
        )]);
        assert!(has_edge(&out, "a.py", "a.py:Widget", RelationKind::Contains));
        assert!(has_edge(&out, "a.py", "a.py:top", RelationKind::Contains));
        assert!(has_edge(
            &out,
            "a.py:Widget",
            "a.py:Widget.render",
            RelationKind::Contains
        ));
    }

    #[test]
    fn test_relative_import_resolution() {
        let out = resolve_sources(&[
            (
                "pkg/mod.py",
                "from .sibling import helper\n\ndef run():\n    helper()\n",
            ),
            ("pkg/sibling.py", "def helper():\n    pass\n"),
        ]);
        assert!(has_edge(
            &out,
            "pkg/mod.py:run",
            "pkg/sibling.py:helper",
            RelationKind::Calls
        ));
        assert!(has_edge(&out, "pkg/mod.py", "pkg/sibling.py", RelationKind::Imports));
    }

    #[test]
    fn test_determinism_across_runs() {
        let sources = [
            ("a.py", "from b import *\n\ndef foo():\n    bar()\n    baz()\n"),
            ("b.py", "def bar():\n    pass\n\ndef baz():\n    pass\n"),
        ];
        let first = resolve_sources(&sources);
        let second = resolve_sources(&sources);
        assert_eq!(first.relationships, second.relationships);
        let first_ids: Vec<&String> = first.entities.iter().map(|e| &e.id).collect();
        let second_ids: Vec<&String> = second.entities.iter().map(|e| &e.id).collect();
        assert_eq!(first_ids, second_ids);
    }
}
