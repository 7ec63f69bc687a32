//! Join relationships.

use serde::{Deserialize, Serialize};

/// A single join between two tables.
///
/// `join_type` is free text (`INNER`, `LEFT`, `CROSS`, `LEFT OUTER JOIN`...);
/// renderers normalise it so it always ends in `JOIN`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JoinRelationship {
    pub left_table: String,
    pub right_table: String,
    pub condition: Option<String>,
    pub join_type: String,
}

impl JoinRelationship {
    pub fn new(
        left_table: impl Into<String>,
        right_table: impl Into<String>,
        condition: Option<String>,
        join_type: impl Into<String>,
    ) -> Self {
        Self {
            left_table: left_table.into(),
            right_table: right_table.into(),
            condition,
            join_type: join_type.into(),
        }
    }
}

/// Ordered collection of join relationships, looked up by right table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JoinGraph {
    relationships: Vec<JoinRelationship>,
}

impl JoinGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, relationship: JoinRelationship) {
        self.relationships.push(relationship);
    }

    /// First relationship whose right table matches `table` (case-insensitive)
    pub fn find_by_right_table(&self, table: &str) -> Option<&JoinRelationship> {
        self.relationships
            .iter()
            .find(|r| r.right_table.eq_ignore_ascii_case(table))
    }

    pub fn iter(&self) -> impl Iterator<Item = &JoinRelationship> {
        self.relationships.iter()
    }

    pub fn len(&self) -> usize {
        self.relationships.len()
    }

    pub fn is_empty(&self) -> bool {
        self.relationships.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_by_right_table() {
        let mut graph = JoinGraph::new();
        graph.add(JoinRelationship::new(
            "users",
            "orders",
            Some("users.id = orders.user_id".to_string()),
            "INNER",
        ));
        graph.add(JoinRelationship::new("orders", "items", None, "CROSS"));

        assert_eq!(graph.len(), 2);
        assert_eq!(
            graph.find_by_right_table("ORDERS").map(|r| r.left_table.as_str()),
            Some("users")
        );
        assert!(graph.find_by_right_table("users").is_none());
    }
}
