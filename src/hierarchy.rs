use std::collections::{HashMap, HashSet, VecDeque};

use crate::api::User;

/// A user plus the ids of the users who report directly to them.
#[derive(Debug, Clone)]
pub struct HierarchyNode {
    pub user: User,
    pub children: Vec<String>,
}

/// Supervisor forest built from a flat user snapshot.
///
/// The snapshot comes from an external API and is not validated, so
/// construction never fails: users whose `supervisor_id` is missing,
/// points at an unknown id, or points at themselves become roots.
/// Traversals carry a visited set and stop at the first revisit, so a
/// supervisor cycle truncates results instead of looping.
#[derive(Debug, Clone, Default)]
pub struct Forest {
    nodes: HashMap<String, HierarchyNode>,
    /// Ids in first-seen input order.
    order: Vec<String>,
    roots: Vec<String>,
}

impl Forest {
    pub fn build(users: &[User]) -> Self {
        let mut nodes: HashMap<String, HierarchyNode> = HashMap::with_capacity(users.len());
        let mut order = Vec::with_capacity(users.len());

        for user in users {
            if nodes.contains_key(&user.id) {
                log::debug!("Duplicate user id {} in snapshot, keeping first", user.id);
                continue;
            }
            order.push(user.id.clone());
            nodes.insert(
                user.id.clone(),
                HierarchyNode {
                    user: user.clone(),
                    children: Vec::new(),
                },
            );
        }

        let mut roots = Vec::new();
        for id in &order {
            let supervisor = nodes
                .get(id)
                .and_then(|n| n.user.supervisor_id.clone());
            match supervisor {
                Some(sup) if sup != *id && nodes.contains_key(&sup) => {
                    if let Some(parent) = nodes.get_mut(&sup) {
                        parent.children.push(id.clone());
                    }
                }
                Some(sup) => {
                    log::debug!("User {id} has unresolvable supervisor {sup}, treating as root");
                    roots.push(id.clone());
                }
                None => roots.push(id.clone()),
            }
        }

        Self {
            nodes,
            order,
            roots,
        }
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn get(&self, user_id: &str) -> Option<&User> {
        self.nodes.get(user_id).map(|n| &n.user)
    }

    pub fn node(&self, user_id: &str) -> Option<&HierarchyNode> {
        self.nodes.get(user_id)
    }

    pub fn roots(&self) -> Vec<&User> {
        self.roots.iter().filter_map(|id| self.get(id)).collect()
    }

    pub fn direct_reports(&self, user_id: &str) -> Vec<&User> {
        self.nodes
            .get(user_id)
            .map(|n| n.children.iter().filter_map(|c| self.get(c)).collect())
            .unwrap_or_default()
    }

    /// Everyone reachable below `user_id`, breadth-first, excluding `user_id`.
    /// Unknown ids have no subordinates.
    pub fn subordinates(&self, user_id: &str) -> Vec<&User> {
        self.walk_below(user_id)
            .into_iter()
            .filter_map(|id| self.get(id))
            .collect()
    }

    pub fn subordinate_ids(&self, user_id: &str) -> HashSet<String> {
        self.walk_below(user_id)
            .into_iter()
            .map(str::to_string)
            .collect()
    }

    fn walk_below<'a>(&'a self, user_id: &'a str) -> Vec<&'a str> {
        let mut found = Vec::new();
        let mut visited: HashSet<&str> = HashSet::new();
        visited.insert(user_id);

        let mut queue: VecDeque<&str> = VecDeque::new();
        queue.push_back(user_id);

        while let Some(current) = queue.pop_front() {
            let Some(node) = self.nodes.get(current) else {
                continue;
            };
            for child in &node.children {
                if visited.insert(child.as_str()) {
                    found.push(child.as_str());
                    queue.push_back(child.as_str());
                } else {
                    log::debug!("Supervisor cycle detected at {child}, truncating");
                }
            }
        }
        found
    }

    /// Indented org chart, one line per user. Users that can only be reached
    /// through a supervisor cycle are listed at the end.
    pub fn render_tree(&self) -> Vec<String> {
        let mut lines = Vec::with_capacity(self.len());
        let mut visited: HashSet<&str> = HashSet::new();

        for root in &self.roots {
            self.render_node(root, 0, &mut visited, &mut lines);
        }

        let unreachable: Vec<&str> = self
            .order
            .iter()
            .map(String::as_str)
            .filter(|id| !visited.contains(id))
            .collect();
        if !unreachable.is_empty() {
            lines.push("(unreachable: supervisor cycle)".to_string());
            for id in unreachable {
                if let Some(user) = self.get(id) {
                    lines.push(format!("  {}", describe(user)));
                }
            }
        }
        lines
    }

    fn render_node<'a>(
        &'a self,
        id: &'a str,
        depth: usize,
        visited: &mut HashSet<&'a str>,
        lines: &mut Vec<String>,
    ) {
        if !visited.insert(id) {
            return;
        }
        let Some(node) = self.nodes.get(id) else {
            return;
        };
        lines.push(format!("{}{}", "  ".repeat(depth), describe(&node.user)));
        for child in &node.children {
            self.render_node(child, depth + 1, visited, lines);
        }
    }
}

fn describe(user: &User) -> String {
    format!("{} ({}) [{}]", user.name, user.role, user.id)
}
