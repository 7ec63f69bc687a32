//! Lowered pipeline representation.
//!
//! The syntax tree is lowered into [`Node`]s: either a bare table/variable
//! name or a [`Pipeline`] of [`Step`]s. Each step points back at the step
//! before it by index, so a pipeline is a flat, strictly linear arena.

mod builder;
mod expr;

pub use builder::lower_program;
pub use expr::function_name;

use crate::statement::{
    ColumnInfo, JoinRelationship, OrderByItem, ParameterInfo, TableInfo, WhereCondition,
};

/// Result of lowering one program: the last statement's node plus every
/// bind parameter seen along the way.
#[derive(Debug, Clone, PartialEq)]
pub struct AstNode {
    pub root: Node,
    pub parameters: Vec<ParameterInfo>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Identifier(String),
    Pipeline(Pipeline),
}

impl Node {
    /// The most recently introduced table: the last join target, else the base
    pub fn last_table(&self) -> Option<&str> {
        match self {
            Node::Identifier(name) => Some(name),
            Node::Pipeline(pipeline) => pipeline.last_table(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Pipeline {
    steps: Vec<Step>,
}

impl Pipeline {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a step that refers back to the current last step
    pub fn push(&mut self, kind: StepKind) {
        let base = self.steps.len().checked_sub(1);
        self.steps.push(Step { base, kind });
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Step that `step` was built on, if any
    pub fn base_of(&self, step: &Step) -> Option<&Step> {
        step.base.and_then(|i| self.steps.get(i))
    }

    fn last_table(&self) -> Option<&str> {
        self.steps.iter().rev().find_map(|step| match &step.kind {
            StepKind::Join { table, .. } => Some(table.name.as_str()),
            StepKind::Identity { source } => source.last_table(),
            _ => None,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Step {
    /// Index of the preceding step in the same pipeline
    pub base: Option<usize>,
    pub kind: StepKind,
}

#[derive(Debug, Clone, PartialEq)]
pub enum StepKind {
    /// Pipeline root: a table name, a bound variable or a nested pipeline
    Identity { source: Box<Node> },
    Join {
        table: TableInfo,
        relationship: JoinRelationship,
    },
    Filter { conditions: Vec<WhereCondition> },
    Select { columns: Vec<ColumnInfo> },
    SelectDistinct { columns: Vec<ColumnInfo> },
    GroupBy { columns: Vec<ColumnInfo> },
    OrderBy { items: Vec<OrderByItem> },
    Having { condition: String },
    Limit { count: String },
    Offset { count: String },
    /// Pre-rendered SQL of the other query
    Union { query: String },
    UnionAll { query: String },
    Insert { table: String, columns: Vec<String> },
}

impl StepKind {
    pub fn name(&self) -> &'static str {
        match self {
            StepKind::Identity { .. } => "identity",
            StepKind::Join { .. } => "join",
            StepKind::Filter { .. } => "filter",
            StepKind::Select { .. } => "select",
            StepKind::SelectDistinct { .. } => "select_distinct",
            StepKind::GroupBy { .. } => "group_by",
            StepKind::OrderBy { .. } => "order_by",
            StepKind::Having { .. } => "having",
            StepKind::Limit { .. } => "limit",
            StepKind::Offset { .. } => "offset",
            StepKind::Union { .. } => "union",
            StepKind::UnionAll { .. } => "union_all",
            StepKind::Insert { .. } => "insert",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_steps_link_to_previous() {
        let mut pipeline = Pipeline::new();
        pipeline.push(StepKind::Identity {
            source: Box::new(Node::Identifier("users".to_string())),
        });
        pipeline.push(StepKind::Limit {
            count: "5".to_string(),
        });

        let steps = pipeline.steps();
        assert_eq!(steps[0].base, None);
        assert_eq!(steps[1].base, Some(0));
        assert_eq!(
            pipeline.base_of(&steps[1]).map(|s| s.kind.name()),
            Some("identity")
        );
    }

    #[test]
    fn test_last_table_prefers_latest_join() {
        let mut pipeline = Pipeline::new();
        pipeline.push(StepKind::Identity {
            source: Box::new(Node::Identifier("a".to_string())),
        });
        assert_eq!(Node::Pipeline(pipeline.clone()).last_table(), Some("a"));

        pipeline.push(StepKind::Join {
            table: TableInfo::new("b"),
            relationship: JoinRelationship::new("a", "b", None, "CROSS"),
        });
        assert_eq!(Node::Pipeline(pipeline).last_table(), Some("b"));
    }
}
