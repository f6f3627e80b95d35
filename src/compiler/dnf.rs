//! Disjunctive normal form
//!
//! Flattens nested AND/AND and OR/OR, folds constants, checks the supported
//! nesting shape and distributes AND over OR. Output is a flat list of
//! conjunctions, not yet canonicalized.

use super::errors::{CompileError, CompileResult};
use super::lower::Node;
use crate::condition::FilterCondition;

/// Flattens and constant-folds a lowered tree
pub(crate) fn flatten(node: Node) -> Node {
    match node {
        Node::And(children) => {
            let mut flat = Vec::with_capacity(children.len());
            for child in children.into_iter().map(flatten) {
                match child {
                    Node::Const(true) => {}
                    Node::Const(false) => return Node::Const(false),
                    Node::And(grand) => flat.extend(grand),
                    other => flat.push(other),
                }
            }
            match flat.len() {
                0 => Node::Const(true),
                1 => flat.pop().unwrap_or(Node::Const(true)),
                _ => Node::And(flat),
            }
        }
        Node::Or(children) => {
            let mut flat = Vec::with_capacity(children.len());
            for child in children.into_iter().map(flatten) {
                match child {
                    Node::Const(false) => {}
                    Node::Const(true) => return Node::Const(true),
                    Node::Or(grand) => flat.extend(grand),
                    other => flat.push(other),
                }
            }
            match flat.len() {
                0 => Node::Const(false),
                1 => flat.pop().unwrap_or(Node::Const(false)),
                _ => Node::Or(flat),
            }
        }
        leaf => leaf,
    }
}

#[derive(Clone, Copy, PartialEq)]
enum Context {
    Root,
    InOr,
    InOrAnd,
}

/// Rejects an OR nested under an AND inside an OR branch
pub(crate) fn check_shape(node: &Node) -> CompileResult<()> {
    visit(node, Context::Root)
}

fn visit(node: &Node, context: Context) -> CompileResult<()> {
    match node {
        Node::Or(children) => {
            if context == Context::InOrAnd {
                return Err(CompileError::unsupported_shape(
                    "OR nested inside an AND within an OR branch",
                ));
            }
            children.iter().try_for_each(|c| visit(c, Context::InOr))
        }
        Node::And(children) => {
            let inner = match context {
                Context::Root => Context::Root,
                Context::InOr | Context::InOrAnd => Context::InOrAnd,
            };
            children.iter().try_for_each(|c| visit(c, inner))
        }
        Node::Const(_) | Node::Leaf(_) | Node::Membership(_) => Ok(()),
    }
}

/// Distributes AND over OR, failing once more than `max_groups` conjunctions
/// would be produced
pub(crate) fn distribute(node: Node, max_groups: usize) -> CompileResult<Vec<Vec<FilterCondition>>> {
    let too_many = || {
        CompileError::unsupported_shape(format!(
            "normal form exceeds {} AND-groups",
            max_groups
        ))
    };

    let groups = match node {
        Node::Const(true) => vec![Vec::new()],
        Node::Const(false) => Vec::new(),
        Node::Leaf(condition) => vec![vec![condition]],
        Node::Membership(members) => members.into_iter().map(|m| vec![m]).collect(),
        Node::Or(children) => {
            let mut groups = Vec::new();
            for child in children {
                groups.extend(distribute(child, max_groups)?);
                if groups.len() > max_groups {
                    return Err(too_many());
                }
            }
            groups
        }
        Node::And(children) => {
            let mut product: Vec<Vec<FilterCondition>> = vec![Vec::new()];
            for child in children {
                let alternatives = distribute(child, max_groups)?;
                if product.len().saturating_mul(alternatives.len()) > max_groups {
                    return Err(too_many());
                }
                product = product
                    .iter()
                    .flat_map(|prefix| {
                        alternatives.iter().map(move |alt| {
                            let mut group = prefix.clone();
                            group.extend(alt.iter().cloned());
                            group
                        })
                    })
                    .collect();
            }
            product
        }
    };

    if groups.len() > max_groups {
        return Err(too_many());
    }
    Ok(groups)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn leaf(field: &str, v: i64) -> Node {
        Node::Leaf(FilterCondition::eq(field, json!(v)))
    }

    #[test]
    fn test_flatten_folds_constants() {
        let node = Node::And(vec![
            Node::Const(true),
            Node::And(vec![leaf("a", 1), leaf("b", 2)]),
        ]);
        assert_eq!(flatten(node), Node::And(vec![leaf("a", 1), leaf("b", 2)]));

        let node = Node::Or(vec![leaf("a", 1), Node::Const(true)]);
        assert_eq!(flatten(node), Node::Const(true));

        let node = Node::And(vec![leaf("a", 1), Node::Or(vec![])]);
        assert_eq!(flatten(node), Node::Const(false));
    }

    #[test]
    fn test_and_over_or_distributes() {
        // (a || b) && (c || d)
        let node = Node::And(vec![
            Node::Or(vec![leaf("a", 1), leaf("b", 1)]),
            Node::Or(vec![leaf("c", 1), leaf("d", 1)]),
        ]);
        check_shape(&node).unwrap();
        let groups = distribute(node, 16).unwrap();
        assert_eq!(groups.len(), 4);
        assert!(groups.iter().all(|g| g.len() == 2));
    }

    #[test]
    fn test_nested_or_inside_or_branch_rejected() {
        // a || (b && (c || d))
        let node = flatten(Node::Or(vec![
            leaf("a", 1),
            Node::And(vec![leaf("b", 1), Node::Or(vec![leaf("c", 1), leaf("d", 1)])]),
        ]));
        assert!(matches!(
            check_shape(&node),
            Err(CompileError::UnsupportedPredicateShape { .. })
        ));
    }

    #[test]
    fn test_membership_exempt_from_shape_check() {
        let members = vec![
            FilterCondition::eq("c", json!(1)),
            FilterCondition::eq("c", json!(2)),
        ];
        let node = Node::Or(vec![
            leaf("a", 1),
            Node::And(vec![leaf("b", 1), Node::Membership(members)]),
        ]);
        check_shape(&node).unwrap();
        assert_eq!(distribute(node, 16).unwrap().len(), 3);
    }

    #[test]
    fn test_group_limit() {
        let wide = |f: &str| Node::Or((0..10).map(|v| leaf(f, v)).collect());
        let node = Node::And(vec![wide("a"), wide("b"), wide("c")]);
        assert!(distribute(node.clone(), 1000).is_ok());
        assert!(matches!(
            distribute(node, 999),
            Err(CompileError::UnsupportedPredicateShape { .. })
        ));
    }
}
