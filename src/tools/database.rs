//! One query tool per bound database table.

use std::sync::Arc;

use async_trait::async_trait;

use super::arguments::ToolArguments;
use super::tool::{Tool, ToolExecutionContext};
use super::types::ToolParameters;
use crate::error::Result;
use crate::services::{DatabaseService, ExecuteSqlRequest};
use crate::types::DatabaseDecl;

pub struct DatabaseTool {
    table: DatabaseDecl,
    name: String,
    description: String,
    parameters: ToolParameters,
    service: Arc<dyn DatabaseService>,
}

impl DatabaseTool {
    pub fn new(table: DatabaseDecl, service: Arc<dyn DatabaseService>) -> Self {
        let name = format!("ts_{}_{}", table.table_name, table.table_id);
        let description = describe(&table);
        let parameters = ToolParameters::object()
            .string("sql", "SQL statement to run against the table", true)
            .build();
        Self {
            table,
            name,
            description,
            parameters,
            service,
        }
    }
}

fn describe(table: &DatabaseDecl) -> String {
    let mut description = format!("Query or modify the table `{}`.", table.table_name);
    if !table.description.is_empty() {
        description.push(' ');
        description.push_str(&table.description);
    }
    if !table.prompt_disabled && !table.fields.is_empty() {
        description.push_str("\nColumns:");
        for field in &table.fields {
            description.push_str(&format!("\n- {} ({})", field.name, field.kind));
            if !field.description.is_empty() {
                description.push_str(&format!(": {}", field.description));
            }
        }
    }
    description
}

#[async_trait]
impl Tool for DatabaseTool {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn parameters(&self) -> &ToolParameters {
        &self.parameters
    }

    async fn execute(&self, args: &ToolArguments, ctx: &ToolExecutionContext) -> Result<String> {
        let request = ExecuteSqlRequest {
            user_id: ctx.user_id.clone(),
            agent_id: ctx.identity.agent_id,
            table_id: self.table.table_id,
            is_draft: ctx.identity.is_draft,
            sql: args.get_str("sql")?.to_string(),
        };
        let result = self.service.execute_sql(request).await?;
        Ok(serde_json::to_string(&result)?)
    }
}
