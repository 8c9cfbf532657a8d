use std::collections::{HashMap, HashSet};

use serde::Serialize;

use super::domain::{Position, PositionId};

/// One node of the reporting-line forest.
#[derive(Debug, Clone, Serialize)]
pub struct PositionNode {
    pub position: Position,
    pub children: Vec<PositionNode>,
}

impl PositionNode {
    fn leaf(position: Position) -> Self {
        Self {
            position,
            children: Vec::new(),
        }
    }
}

/// Build the parent/child forest for a flat position list.
///
/// A position whose `reports_to` is unset, or points outside the supplied
/// list, becomes a root (reparent-to-root, not an error). Sibling order
/// follows input order. `reports_to` chains that loop back on themselves
/// are broken by forcing the revisited node to root, so construction is
/// bounded even on malformed input.
pub fn build_tree(positions: &[Position]) -> Vec<PositionNode> {
    let ids: HashSet<&PositionId> = positions.iter().map(|p| &p.id).collect();

    // Child ids per parent, in input order.
    let mut children_of: HashMap<&PositionId, Vec<&PositionId>> = HashMap::new();
    let mut roots: Vec<&PositionId> = Vec::new();
    for position in positions {
        match position.reports_to.as_ref() {
            Some(parent) if ids.contains(parent) && *parent != position.id => {
                children_of.entry(parent).or_default().push(&position.id);
            }
            _ => roots.push(&position.id),
        }
    }

    let by_id: HashMap<&PositionId, &Position> =
        positions.iter().map(|p| (&p.id, p)).collect();

    let mut visited: HashSet<&PositionId> = HashSet::new();
    let mut forest: Vec<PositionNode> = roots
        .iter()
        .filter_map(|id| attach(id, &by_id, &children_of, &mut visited))
        .collect();

    // Members of a reports_to cycle are reachable from no root; surface
    // them as forced roots instead of dropping them.
    for position in positions {
        if !visited.contains(&position.id) {
            if let Some(node) = attach(&position.id, &by_id, &children_of, &mut visited) {
                forest.push(node);
            }
        }
    }

    forest
}

fn attach<'a>(
    id: &'a PositionId,
    by_id: &HashMap<&'a PositionId, &'a Position>,
    children_of: &HashMap<&'a PositionId, Vec<&'a PositionId>>,
    visited: &mut HashSet<&'a PositionId>,
) -> Option<PositionNode> {
    if !visited.insert(id) {
        return None;
    }
    let position = by_id.get(id)?;
    let mut node = PositionNode::leaf((*position).clone());
    if let Some(children) = children_of.get(id) {
        for child in children {
            if let Some(child_node) = attach(child, by_id, children_of, visited) {
                node.children.push(child_node);
            }
        }
    }
    Some(node)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflows::roster::domain::DepartmentId;

    fn position(id: &str, reports_to: Option<&str>) -> Position {
        let mut position = Position::new(
            PositionId(id.to_string()),
            DepartmentId("dept-ops".to_string()),
            format!("Role {id}"),
        );
        position.reports_to = reports_to.map(|parent| PositionId(parent.to_string()));
        position
    }

    fn shape(forest: &[PositionNode]) -> Vec<(String, Vec<String>)> {
        let mut out = Vec::new();
        fn walk(node: &PositionNode, out: &mut Vec<(String, Vec<String>)>) {
            out.push((
                node.position.id.0.clone(),
                node.children
                    .iter()
                    .map(|child| child.position.id.0.clone())
                    .collect(),
            ));
            for child in &node.children {
                walk(child, out);
            }
        }
        for root in forest {
            walk(root, &mut out);
        }
        out.sort();
        out
    }

    #[test]
    fn builds_a_forest_with_input_sibling_order() {
        let positions = vec![
            position("head", None),
            position("lead-a", Some("head")),
            position("lead-b", Some("head")),
            position("ic-1", Some("lead-a")),
        ];

        let forest = build_tree(&positions);

        assert_eq!(forest.len(), 1);
        let head = &forest[0];
        assert_eq!(head.position.id.0, "head");
        assert_eq!(head.children.len(), 2);
        assert_eq!(head.children[0].position.id.0, "lead-a");
        assert_eq!(head.children[1].position.id.0, "lead-b");
        assert_eq!(head.children[0].children[0].position.id.0, "ic-1");
    }

    #[test]
    fn foreign_manager_becomes_a_root() {
        let positions = vec![
            position("orphan", Some("someone-else")),
            position("head", None),
        ];

        let forest = build_tree(&positions);

        assert_eq!(forest.len(), 2);
        assert_eq!(forest[0].position.id.0, "orphan");
        assert!(forest[0].children.is_empty());
    }

    #[test]
    fn forest_shape_is_order_independent() {
        let positions = vec![
            position("head", None),
            position("lead-a", Some("head")),
            position("lead-b", Some("head")),
            position("ic-1", Some("lead-a")),
        ];
        let mut shuffled = positions.clone();
        shuffled.reverse();

        assert_eq!(shape(&build_tree(&positions)), shape(&build_tree(&shuffled)));
    }

    #[test]
    fn cycles_are_forced_to_root_instead_of_recursing() {
        let positions = vec![
            position("a", Some("b")),
            position("b", Some("a")),
            position("head", None),
        ];

        let forest = build_tree(&positions);

        let mut seen: Vec<String> = Vec::new();
        fn collect(node: &PositionNode, seen: &mut Vec<String>) {
            seen.push(node.position.id.0.clone());
            for child in &node.children {
                collect(child, seen);
            }
        }
        for root in &forest {
            collect(root, &mut seen);
        }
        seen.sort();
        assert_eq!(seen, vec!["a", "b", "head"]);
    }

    #[test]
    fn self_reference_is_treated_as_root() {
        let positions = vec![position("loop", Some("loop"))];

        let forest = build_tree(&positions);

        assert_eq!(forest.len(), 1);
        assert_eq!(forest[0].position.id.0, "loop");
        assert!(forest[0].children.is_empty());
    }
}
