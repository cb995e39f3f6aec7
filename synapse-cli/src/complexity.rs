//! Cyclomatic and cognitive complexity over tree-sitter subtrees.
//!
//! Both metrics are pure functions of a function/method body node.
//! Cyclomatic counts decision points; cognitive additionally penalises
//! nesting, so a decision point at depth `d` contributes `1 + d`.

use tree_sitter::Node;

/// Decision points: conditionals, loops, boolean short-circuits, exception
/// handler branches, case arms, comprehension conditions.
fn is_decision_point(kind: &str) -> bool {
    matches!(
        kind,
        "if_statement"
            | "elif_clause"
            | "while_statement"
            | "for_statement"
            | "except_clause"
            | "boolean_operator"
            | "conditional_expression"
            | "case_clause"
            | "if_clause"
            | "assert_statement"
    )
}

/// Structures that deepen nesting for the cognitive metric.
fn is_nesting_structure(kind: &str) -> bool {
    matches!(
        kind,
        "if_statement"
            | "elif_clause"
            | "else_clause"
            | "while_statement"
            | "for_statement"
            | "except_clause"
            | "try_statement"
            | "with_statement"
            | "match_statement"
            | "lambda"
    )
}

fn is_nested_function(kind: &str) -> bool {
    kind == "function_definition" || kind == "async_function_definition"
}

/// McCabe cyclomatic complexity: 1 plus one per decision point.
pub fn cyclomatic(body: &Node) -> u32 {
    let mut complexity = 1;

    fn count(node: &Node, complexity: &mut u32) {
        if is_decision_point(node.kind()) {
            *complexity += 1;
        }
        let mut cursor = node.walk();
        for child in node.children(&mut cursor) {
            // Nested defs are scored on their own.
            if is_nested_function(child.kind()) {
                continue;
            }
            count(&child, complexity);
        }
    }

    count(body, &mut complexity);
    complexity
}

/// Cognitive complexity: each decision point adds `1 + nesting_depth`.
pub fn cognitive(body: &Node) -> u32 {
    let mut complexity = 0;

    fn walk(node: &Node, depth: u32, complexity: &mut u32) {
        if is_decision_point(node.kind()) {
            *complexity += 1 + depth;
        }
        // Breaks in linear flow read as one extra unit regardless of depth.
        if matches!(node.kind(), "break_statement" | "continue_statement") {
            *complexity += 1;
        }

        let child_depth = if is_nesting_structure(node.kind()) {
            depth + 1
        } else {
            depth
        };

        let mut cursor = node.walk();
        for child in node.children(&mut cursor) {
            if is_nested_function(child.kind()) {
                continue;
            }
            walk(&child, child_depth, complexity);
        }
    }

    walk(body, 0, &mut complexity);
    complexity
}
