//! Boundary towards schema introspection and code generation.
//!
//! The compiler only produces SQL text plus metadata. Looking up the result
//! shape against a live database and emitting typed accessors happen
//! elsewhere, behind these traits.

use crate::statement::ParameterInfo;
use serde::{Deserialize, Serialize};

/// One column of a query's result set
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnMetadata {
    pub name: String,
    pub sql_type: String,
    pub nullable: bool,
}

/// Describes the result shape of a query.
pub trait SchemaIntrospector {
    type Error: std::error::Error;

    fn describe(
        &self,
        sql: &str,
        parameters: &[ParameterInfo],
    ) -> Result<Vec<ColumnMetadata>, Self::Error>;
}

/// Everything a code emitter needs for one compiled query
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryManifest {
    pub name: String,
    pub sql: String,
    pub parameters: Vec<ParameterInfo>,
    pub columns: Vec<ColumnMetadata>,
}

impl QueryManifest {
    /// Compile-time manifest: run the introspector once over the SQL
    pub fn describe<I: SchemaIntrospector>(
        name: impl Into<String>,
        sql: impl Into<String>,
        parameters: Vec<ParameterInfo>,
        introspector: &I,
    ) -> Result<Self, I::Error> {
        let sql = sql.into();
        let columns = introspector.describe(&sql, &parameters)?;
        Ok(Self {
            name: name.into(),
            sql,
            parameters,
            columns,
        })
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }
}

/// Turns a manifest into source code in some host language.
pub trait CodeEmitter {
    fn emit(&self, manifest: &QueryManifest) -> String;
}
