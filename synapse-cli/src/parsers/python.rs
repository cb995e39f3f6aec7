//! Python parser using tree-sitter.
//!
//! Extracts the module entity, functions, methods, classes, module-level
//! constants, the import table, and raw call/raise/except sites. Qualified
//! names are the nesting path inside the file (`Outer.Inner.method`); entity
//! IDs prepend the normalised file path.

use anyhow::{Context, Result};
use tree_sitter::{Node, Parser};

use crate::complexity;
use crate::models::{
    entity_id, Complexity, Entity, EntityData, Parameter, Signature, SourceLocation,
};
use crate::parsers::{ConstantRecord, ImportRecord, ImportedName, ParsedFile, RawCall};

/// Parse Python source into a [`ParsedFile`].
pub fn parse_source(source: &str, path: &str) -> Result<ParsedFile> {
    let mut parser = Parser::new();
    parser
        .set_language(&tree_sitter_python::LANGUAGE.into())
        .context("failed to load Python grammar")?;

    let tree = parser
        .parse(source, None)
        .context("failed to parse Python source")?;
    let root = tree.root_node();
    let bytes = source.as_bytes();

    let mut parsed = ParsedFile {
        path: path.to_string(),
        ..Default::default()
    };

    extract_imports(&root, bytes, &mut parsed);
    extract_constants(&root, bytes, &mut parsed);

    let mut extractor = Extractor {
        source: bytes,
        path,
        parsed: &mut parsed,
    };
    extractor.extract_definitions(&root, &[], false);

    // The module itself is an entity; IMPORTS edges hang off it.
    let import_count = parsed.imports.len();
    parsed.entities.push(Entity {
        id: path.to_string(),
        name: module_basename(path),
        qualified_name: module_dotted_name(path),
        location: SourceLocation {
            file: path.to_string(),
            start_line: 1,
            end_line: root.end_position().row as u32 + 1,
        },
        data: EntityData::Module { import_count },
    });

    extract_call_sites(&root, bytes, path, &mut parsed);

    Ok(parsed)
}

/// Dotted module name for a file path: `pkg/mod.py` -> `pkg.mod`,
/// `pkg/__init__.py` -> `pkg`.
pub fn module_dotted_name(path: &str) -> String {
    let stem = path
        .strip_suffix(".pyi")
        .or_else(|| path.strip_suffix(".py"))
        .unwrap_or(path);
    let stem = stem.strip_suffix("/__init__").unwrap_or(stem);
    stem.replace('/', ".")
}

fn module_basename(path: &str) -> String {
    module_dotted_name(path)
        .rsplit('.')
        .next()
        .unwrap_or(path)
        .to_string()
}

struct Extractor<'a> {
    source: &'a [u8],
    path: &'a str,
    parsed: &'a mut ParsedFile,
}

impl<'a> Extractor<'a> {
    /// Walk a block collecting function/method/class entities.
    ///
    /// `scope` is the qualified-name stack of enclosing definitions;
    /// `in_class` marks whether the immediate container is a class body.
    fn extract_definitions(&mut self, node: &Node, scope: &[String], in_class: bool) {
        let mut cursor = node.walk();
        for child in node.children(&mut cursor) {
            match child.kind() {
                "function_definition" | "async_function_definition" => {
                    self.extract_callable(&child, scope, in_class, vec![]);
                }
                "class_definition" => {
                    self.extract_class(&child, scope, vec![]);
                }
                "decorated_definition" => {
                    let decorators = decorator_names(&child, self.source);
                    let mut inner_cursor = child.walk();
                    for inner in child.children(&mut inner_cursor) {
                        match inner.kind() {
                            "function_definition" | "async_function_definition" => {
                                self.extract_callable(&inner, scope, in_class, decorators.clone());
                            }
                            "class_definition" => {
                                self.extract_class(&inner, scope, decorators.clone());
                            }
                            _ => {}
                        }
                    }
                }
                // Plain statements can still nest defs (if/try at module
                // level); recurse without extending the scope.
                "if_statement" | "try_statement" | "with_statement" | "block"
                | "else_clause" | "except_clause" => {
                    self.extract_definitions(&child, scope, in_class);
                }
                _ => {}
            }
        }
    }

    fn extract_callable(
        &mut self,
        node: &Node,
        scope: &[String],
        in_class: bool,
        decorators: Vec<String>,
    ) {
        let Some(name_node) = node.child_by_field_name("name") else {
            return;
        };
        let Ok(name) = name_node.utf8_text(self.source) else {
            return;
        };
        let name = name.to_string();

        let qualified_name = qualify(scope, &name);
        let signature = Signature {
            parameters: extract_parameters(node.child_by_field_name("parameters"), self.source),
            return_type: node
                .child_by_field_name("return_type")
                .and_then(|n| n.utf8_text(self.source).ok())
                .map(str::to_string),
            decorators,
            is_async: is_async_def(node),
        };

        let metrics = node
            .child_by_field_name("body")
            .map(|body| Complexity {
                cyclomatic: complexity::cyclomatic(&body),
                cognitive: complexity::cognitive(&body),
            })
            .unwrap_or_default();

        let data = if in_class {
            EntityData::Method {
                signature,
                complexity: metrics,
                owner_class: scope.join("."),
            }
        } else {
            EntityData::Function {
                signature,
                complexity: metrics,
            }
        };

        self.parsed.entities.push(Entity {
            id: entity_id(self.path, &qualified_name),
            name: name.clone(),
            qualified_name: qualified_name.clone(),
            location: location_of(node, self.path),
            data,
        });

        // Nested defs keep their nesting path.
        if let Some(body) = node.child_by_field_name("body") {
            let mut nested_scope = scope.to_vec();
            nested_scope.push(name);
            self.extract_definitions(&body, &nested_scope, false);
        }
    }

    fn extract_class(&mut self, node: &Node, scope: &[String], decorators: Vec<String>) {
        let Some(name_node) = node.child_by_field_name("name") else {
            return;
        };
        let Ok(name) = name_node.utf8_text(self.source) else {
            return;
        };
        let name = name.to_string();
        let qualified_name = qualify(scope, &name);

        let bases = extract_bases(node, self.source);
        let methods = class_method_names(node, self.source);

        self.parsed.entities.push(Entity {
            id: entity_id(self.path, &qualified_name),
            name: name.clone(),
            qualified_name: qualified_name.clone(),
            location: location_of(node, self.path),
            data: EntityData::Class {
                bases,
                methods,
                decorators,
            },
        });

        if let Some(body) = node.child_by_field_name("body") {
            let mut class_scope = scope.to_vec();
            class_scope.push(name);
            self.extract_definitions(&body, &class_scope, true);
        }
    }
}

fn qualify(scope: &[String], name: &str) -> String {
    if scope.is_empty() {
        name.to_string()
    } else {
        format!("{}.{}", scope.join("."), name)
    }
}

fn location_of(node: &Node, path: &str) -> SourceLocation {
    SourceLocation {
        file: path.to_string(),
        start_line: node.start_position().row as u32 + 1,
        end_line: node.end_position().row as u32 + 1,
    }
}

fn is_async_def(node: &Node) -> bool {
    if node.kind() == "async_function_definition" {
        return true;
    }
    let mut cursor = node.walk();
    let result = node.children(&mut cursor).any(|c| c.kind() == "async");
    result
}

fn decorator_names(decorated: &Node, source: &[u8]) -> Vec<String> {
    let mut names = Vec::new();
    let mut cursor = decorated.walk();
    for child in decorated.children(&mut cursor) {
        if child.kind() == "decorator" {
            if let Ok(text) = child.utf8_text(source) {
                let text = text.trim_start_matches('@').trim();
                // Keep the callable part only: `@retry(times=3)` -> `retry`.
                let name = text.split('(').next().unwrap_or(text).trim();
                if !name.is_empty() {
                    names.push(name.to_string());
                }
            }
        }
    }
    names
}

fn extract_parameters(params_node: Option<Node>, source: &[u8]) -> Vec<Parameter> {
    let Some(node) = params_node else {
        return vec![];
    };

    let mut params = Vec::new();
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        match child.kind() {
            "identifier" => {
                if let Ok(text) = child.utf8_text(source) {
                    params.push(Parameter {
                        name: text.to_string(),
                        ..Default::default()
                    });
                }
            }
            "typed_parameter" | "default_parameter" | "typed_default_parameter" => {
                let name = child
                    .child_by_field_name("name")
                    .or_else(|| {
                        let mut inner = child.walk();
                        let found = child.children(&mut inner).find(|c| c.kind() == "identifier");
                        found
                    })
                    .and_then(|n| n.utf8_text(source).ok())
                    .map(str::to_string);
                let type_hint = child
                    .child_by_field_name("type")
                    .and_then(|n| n.utf8_text(source).ok())
                    .map(str::to_string);
                let default_value = child
                    .child_by_field_name("value")
                    .and_then(|n| n.utf8_text(source).ok())
                    .map(str::to_string);
                if let Some(name) = name {
                    params.push(Parameter {
                        name,
                        type_hint,
                        default_value,
                    });
                }
            }
            "list_splat_pattern" | "dictionary_splat_pattern" => {
                let prefix = if child.kind() == "list_splat_pattern" {
                    "*"
                } else {
                    "**"
                };
                let mut inner = child.walk();
                for grandchild in child.children(&mut inner) {
                    if grandchild.kind() == "identifier" {
                        if let Ok(text) = grandchild.utf8_text(source) {
                            params.push(Parameter {
                                name: format!("{prefix}{text}"),
                                ..Default::default()
                            });
                        }
                        break;
                    }
                }
            }
            _ => {}
        }
    }
    params
}

fn extract_bases(class_node: &Node, source: &[u8]) -> Vec<String> {
    let mut bases = Vec::new();
    let mut cursor = class_node.walk();
    for child in class_node.children(&mut cursor) {
        if child.kind() == "argument_list" {
            let mut args = child.walk();
            for arg in child.children(&mut args) {
                if let Some(base) = base_name(&arg, source) {
                    bases.push(base);
                }
            }
        }
    }
    bases
}

fn base_name(node: &Node, source: &[u8]) -> Option<String> {
    match node.kind() {
        "identifier" | "attribute" => node.utf8_text(source).ok().map(str::to_string),
        // Generic[T] -> Generic
        "subscript" => node
            .child_by_field_name("value")
            .and_then(|n| base_name(&n, source)),
        // Skip metaclass=... and punctuation.
        _ => None,
    }
}

fn class_method_names(class_node: &Node, source: &[u8]) -> Vec<String> {
    let mut methods = Vec::new();
    let Some(body) = class_node.child_by_field_name("body") else {
        return methods;
    };

    let mut cursor = body.walk();
    for child in body.children(&mut cursor) {
        let func = match child.kind() {
            "function_definition" | "async_function_definition" => Some(child),
            "decorated_definition" => {
                let mut inner = child.walk();
                let found = child.children(&mut inner).find(|c| {
                    c.kind() == "function_definition" || c.kind() == "async_function_definition"
                });
                found
            }
            _ => None,
        };
        if let Some(func) = func {
            if let Some(name) = func
                .child_by_field_name("name")
                .and_then(|n| n.utf8_text(source).ok())
            {
                methods.push(name.to_string());
            }
        }
    }
    methods
}

fn extract_imports(root: &Node, source: &[u8], parsed: &mut ParsedFile) {
    let mut cursor = root.walk();
    for node in root.children(&mut cursor) {
        let line = node.start_position().row as u32 + 1;
        match node.kind() {
            "import_statement" => {
                let mut inner = node.walk();
                for child in node.children(&mut inner) {
                    match child.kind() {
                        "dotted_name" => {
                            if let Ok(text) = child.utf8_text(source) {
                                parsed.imports.push(ImportRecord {
                                    module: text.to_string(),
                                    line,
                                    ..Default::default()
                                });
                            }
                        }
                        "aliased_import" => {
                            let module = child
                                .child_by_field_name("name")
                                .and_then(|n| n.utf8_text(source).ok())
                                .map(str::to_string);
                            let alias = child
                                .child_by_field_name("alias")
                                .and_then(|n| n.utf8_text(source).ok())
                                .map(str::to_string);
                            if let Some(module) = module {
                                parsed.imports.push(ImportRecord {
                                    module,
                                    alias,
                                    line,
                                    ..Default::default()
                                });
                            }
                        }
                        _ => {}
                    }
                }
            }
            "import_from_statement" => {
                let module_node = node.child_by_field_name("module_name");
                let (module, is_relative) = match module_node {
                    Some(m) => {
                        let text = m.utf8_text(source).unwrap_or("").to_string();
                        (text, m.kind() == "relative_import")
                    }
                    None => (String::new(), false),
                };

                let mut record = ImportRecord {
                    module,
                    is_relative,
                    line,
                    ..Default::default()
                };

                let mut inner = node.walk();
                for child in node.children(&mut inner) {
                    if Some(child) == module_node {
                        continue;
                    }
                    match child.kind() {
                        "wildcard_import" => record.is_star = true,
                        "dotted_name" => {
                            if let Ok(text) = child.utf8_text(source) {
                                record.imported_names.push(ImportedName {
                                    name: text.to_string(),
                                    alias: None,
                                });
                            }
                        }
                        "aliased_import" => {
                            let name = child
                                .child_by_field_name("name")
                                .and_then(|n| n.utf8_text(source).ok())
                                .map(str::to_string);
                            let alias = child
                                .child_by_field_name("alias")
                                .and_then(|n| n.utf8_text(source).ok())
                                .map(str::to_string);
                            if let Some(name) = name {
                                record.imported_names.push(ImportedName { name, alias });
                            }
                        }
                        _ => {}
                    }
                }
                parsed.imports.push(record);
            }
            _ => {}
        }
    }
}

/// Module-level ALL_CAPS assignments are constants worth keeping for
/// resolution scope.
fn extract_constants(root: &Node, source: &[u8], parsed: &mut ParsedFile) {
    let mut cursor = root.walk();
    for node in root.children(&mut cursor) {
        if node.kind() != "expression_statement" {
            continue;
        }
        let mut inner = node.walk();
        for child in node.children(&mut inner) {
            if child.kind() != "assignment" {
                continue;
            }
            let Some(left) = child.child_by_field_name("left") else {
                continue;
            };
            if left.kind() != "identifier" {
                continue;
            }
            let Ok(name) = left.utf8_text(source) else {
                continue;
            };
            let is_constant = name.chars().any(|c| c.is_ascii_uppercase())
                && !name.chars().any(|c| c.is_ascii_lowercase());
            if is_constant {
                parsed.constants.push(ConstantRecord {
                    name: name.to_string(),
                    line: left.start_position().row as u32 + 1,
                });
            }
        }
    }
}

/// Line spans of every callable, innermost-first lookup for call sites.
fn collect_scopes(parsed: &ParsedFile) -> Vec<(u32, u32, String)> {
    parsed
        .entities
        .iter()
        .filter(|e| {
            matches!(
                e.data,
                EntityData::Function { .. } | EntityData::Method { .. }
            )
        })
        .map(|e| (e.location.start_line, e.location.end_line, e.id.clone()))
        .collect()
}

fn containing_scope(line: u32, scopes: &[(u32, u32, String)]) -> Option<String> {
    scopes
        .iter()
        .filter(|(start, end, _)| *start <= line && line <= *end)
        .min_by_key(|(start, end, _)| end - start)
        .map(|(_, _, id)| id.clone())
}

fn extract_call_sites(root: &Node, source: &[u8], path: &str, parsed: &mut ParsedFile) {
    let scopes = collect_scopes(parsed);
    walk_calls(root, source, path, &scopes, parsed);
}

fn walk_calls(
    node: &Node,
    source: &[u8],
    path: &str,
    scopes: &[(u32, u32, String)],
    parsed: &mut ParsedFile,
) {
    let line = node.start_position().row as u32 + 1;
    match node.kind() {
        "call" => {
            if let Some(func_node) = node.child_by_field_name("function") {
                if let Some(callee) = call_target(&func_node, source) {
                    let caller =
                        containing_scope(line, scopes).unwrap_or_else(|| path.to_string());
                    parsed.raw_calls.push(RawCall {
                        caller,
                        callee,
                        line,
                    });
                }
            }
        }
        "raise_statement" => {
            // `raise X(...)` or `raise X`.
            let mut cursor = node.walk();
            for child in node.children(&mut cursor) {
                let target = match child.kind() {
                    "call" => child
                        .child_by_field_name("function")
                        .and_then(|f| call_target(&f, source)),
                    "identifier" | "attribute" => {
                        child.utf8_text(source).ok().map(str::to_string)
                    }
                    _ => None,
                };
                if let Some(callee) = target {
                    let caller =
                        containing_scope(line, scopes).unwrap_or_else(|| path.to_string());
                    parsed.raw_raises.push(RawCall {
                        caller,
                        callee,
                        line,
                    });
                    break;
                }
            }
        }
        "except_clause" => {
            let mut cursor = node.walk();
            for child in node.children(&mut cursor) {
                match child.kind() {
                    "identifier" | "attribute" => {
                        if let Ok(text) = child.utf8_text(source) {
                            let caller =
                                containing_scope(line, scopes).unwrap_or_else(|| path.to_string());
                            parsed.raw_catches.push(RawCall {
                                caller,
                                callee: text.to_string(),
                                line,
                            });
                        }
                        break;
                    }
                    "tuple" => {
                        let mut elems = child.walk();
                        for elem in child.children(&mut elems) {
                            if matches!(elem.kind(), "identifier" | "attribute") {
                                if let Ok(text) = elem.utf8_text(source) {
                                    let caller = containing_scope(line, scopes)
                                        .unwrap_or_else(|| path.to_string());
                                    parsed.raw_catches.push(RawCall {
                                        caller,
                                        callee: text.to_string(),
                                        line,
                                    });
                                }
                            }
                        }
                        break;
                    }
                    _ => {}
                }
            }
        }
        _ => {}
    }

    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        walk_calls(&child, source, path, scopes, parsed);
    }
}

fn call_target(node: &Node, source: &[u8]) -> Option<String> {
    match node.kind() {
        "identifier" | "attribute" => node.utf8_text(source).ok().map(str::to_string),
        // func[T]() -> func
        "subscript" => node
            .child_by_field_name("value")
            .and_then(|n| call_target(&n, source)),
        // func()() -> func
        "call" => node
            .child_by_field_name("function")
            .and_then(|n| call_target(&n, source)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::EntityKind;

    fn parse(source: &str) -> ParsedFile {
        parse_source(source, "test.py").expect("parse")
    }

    fn find<'a>(parsed: &'a ParsedFile, qualified: &str) -> &'a Entity {
        parsed
            .entities
            .iter()
            .find(|e| e.qualified_name == qualified)
            .unwrap_or_else(|| panic!("entity {qualified} missing"))
    }

    #[test]
    fn test_parse_simple_function() {
        let parsed = parse(
            r#"
def hello(name: str) -> str:
    return f"Hello, {name}!"
"#,
        );
        let func = find(&parsed, "hello");
        assert_eq!(func.kind(), EntityKind::Function);
        assert_eq!(func.id, "test.py:hello");
        assert_eq!(func.location.start_line, 2);
        match &func.data {
            EntityData::Function { signature, .. } => {
                assert_eq!(signature.parameters.len(), 1);
                assert_eq!(signature.parameters[0].name, "name");
                assert_eq!(signature.parameters[0].type_hint.as_deref(), Some("str"));
                assert!(!signature.is_async);
            }
            other => panic!("unexpected data: {other:?}"),
        }
    }

    #[test]
    fn test_parse_async_function() {
        let parsed = parse(
            r#"
async def fetch(url):
    return await session.get(url)
"#,
        );
        let func = find(&parsed, "fetch");
        match &func.data {
            EntityData::Function { signature, .. } => assert!(signature.is_async),
            other => panic!("unexpected data: {other:?}"),
        }
    }

    #[test]
    fn test_methods_carry_owner_class() {
        let parsed = parse(
            r#"
class Outer:
    class Inner:
        def method(self):
            pass
"#,
        );
        let method = find(&parsed, "Outer.Inner.method");
        assert_eq!(method.kind(), EntityKind::Method);
        assert_eq!(method.owner_class(), Some("Outer.Inner"));
        assert_eq!(method.id, "test.py:Outer.Inner.method");
    }

    #[test]
    fn test_class_bases_and_methods() {
        let parsed = parse(
            r#"
class Handler(BaseHandler, mixins.Loggable):
    def handle(self):
        pass

    async def close(self):
        pass
"#,
        );
        let class = find(&parsed, "Handler");
        match &class.data {
            EntityData::Class { bases, methods, .. } => {
                assert_eq!(bases, &["BaseHandler", "mixins.Loggable"]);
                assert_eq!(methods, &["handle", "close"]);
            }
            other => panic!("unexpected data: {other:?}"),
        }
    }

    #[test]
    fn test_import_table() {
        let parsed = parse(
            r#"
import os
import numpy as np
from pathlib import Path
from utils import helper as h, fetch
from legacy import *
from . import sibling
"#,
        );
        let by_module: Vec<&ImportRecord> = parsed.imports.iter().collect();
        assert_eq!(by_module.len(), 6);

        let np = parsed.imports.iter().find(|i| i.module == "numpy").unwrap();
        assert_eq!(np.alias.as_deref(), Some("np"));

        let utils = parsed.imports.iter().find(|i| i.module == "utils").unwrap();
        assert_eq!(utils.imported_names.len(), 2);
        assert_eq!(utils.imported_names[0].name, "helper");
        assert_eq!(utils.imported_names[0].alias.as_deref(), Some("h"));
        assert_eq!(utils.imported_names[1].name, "fetch");

        let star = parsed.imports.iter().find(|i| i.module == "legacy").unwrap();
        assert!(star.is_star);

        let relative = parsed.imports.iter().find(|i| i.is_relative).unwrap();
        assert!(relative.module.starts_with('.'));
    }

    #[test]
    fn test_raw_calls_attribute_callers() {
        let parsed = parse(
            r#"
def caller():
    helper()
    util.process(1)

top_level()
"#,
        );
        let callees: Vec<(&str, &str)> = parsed
            .raw_calls
            .iter()
            .map(|c| (c.caller.as_str(), c.callee.as_str()))
            .collect();
        assert!(callees.contains(&("test.py:caller", "helper")));
        assert!(callees.contains(&("test.py:caller", "util.process")));
        // Top-level calls attribute to the module.
        assert!(callees.contains(&("test.py", "top_level")));
    }

    #[test]
    fn test_nested_function_scope_wins() {
        let parsed = parse(
            r#"
def outer():
    def inner():
        deep_call()
    inner()
"#,
        );
        let deep = parsed
            .raw_calls
            .iter()
            .find(|c| c.callee == "deep_call")
            .unwrap();
        assert_eq!(deep.caller, "test.py:outer.inner");
        let inner_call = parsed
            .raw_calls
            .iter()
            .find(|c| c.callee == "inner")
            .unwrap();
        assert_eq!(inner_call.caller, "test.py:outer");
    }

    #[test]
    fn test_raises_and_catches() {
        let parsed = parse(
            r#"
def risky():
    try:
        step()
    except (ValueError, KeyError):
        raise AnalysisError("bad")
"#,
        );
        assert_eq!(parsed.raw_raises.len(), 1);
        assert_eq!(parsed.raw_raises[0].callee, "AnalysisError");
        assert_eq!(parsed.raw_raises[0].caller, "test.py:risky");

        let caught: Vec<&str> = parsed.raw_catches.iter().map(|c| c.callee.as_str()).collect();
        assert_eq!(caught, vec!["ValueError", "KeyError"]);
    }

    #[test]
    fn test_module_entity_and_constants() {
        let parsed = parse_source(
            r#"
import os

MAX_RETRIES = 3
_private = 1
lowercase = 2
"#,
            "pkg/worker.py",
        )
        .unwrap();

        let module = parsed
            .entities
            .iter()
            .find(|e| e.kind() == EntityKind::Module)
            .unwrap();
        assert_eq!(module.id, "pkg/worker.py");
        assert_eq!(module.qualified_name, "pkg.worker");

        assert_eq!(parsed.constants.len(), 1);
        assert_eq!(parsed.constants[0].name, "MAX_RETRIES");
    }

    #[test]
    fn test_decorated_function_records_decorators() {
        let parsed = parse(
            r#"
@retry(times=3)
@cache
def fetch():
    pass
"#,
        );
        let func = find(&parsed, "fetch");
        match &func.data {
            EntityData::Function { signature, .. } => {
                assert_eq!(signature.decorators, vec!["retry", "cache"]);
            }
            other => panic!("unexpected data: {other:?}"),
        }
    }

    #[test]
    fn test_module_dotted_name() {
        assert_eq!(module_dotted_name("pkg/mod.py"), "pkg.mod");
        assert_eq!(module_dotted_name("pkg/__init__.py"), "pkg");
        assert_eq!(module_dotted_name("top.py"), "top");
    }

    #[test]
    fn test_star_args_parameters() {
        let parsed = parse(
            r#"
def varargs(*args, **kwargs):
    pass
"#,
        );
        let func = find(&parsed, "varargs");
        match &func.data {
            EntityData::Function { signature, .. } => {
                let names: Vec<&str> =
                    signature.parameters.iter().map(|p| p.name.as_str()).collect();
                assert_eq!(names, vec!["*args", "**kwargs"]);
            }
            other => panic!("unexpected data: {other:?}"),
        }
    }
}
