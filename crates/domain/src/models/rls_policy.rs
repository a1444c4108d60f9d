//! Row-level-security policy management models.
//!
//! Policies themselves live in the managed database; these types describe the
//! requests the `manage-rls-policies` function accepts and the statements it
//! issues for them.

use serde::{Deserialize, Serialize};
use shared::validation::is_sql_identifier;
use thiserror::Error;

/// Tables whose policies may be managed through the function.
pub const MANAGED_TABLES: &[&str] = &[
    "profiles",
    "vehicles",
    "work_orders",
    "estimates",
    "invoices",
    "inventory",
    "part_sales",
    "core_returns",
    "appointments",
    "security_alerts",
    "webauthn_challenges",
];

/// Database roles a policy may target.
const POLICY_ROLES: &[&str] = &["authenticated", "anon", "service_role", "public"];

/// Errors raised while validating a policy request.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PolicyRequestError {
    #[error("Table '{0}' is not managed")]
    UnknownTable(String),

    #[error("Invalid policy name: {0}")]
    InvalidPolicyName(String),

    #[error("Invalid role: {0}")]
    InvalidRole(String),

    #[error("Missing field: {0}")]
    MissingField(&'static str),

    #[error("Expression contains a statement separator")]
    UnsafeExpression,
}

/// Requested operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PolicyAction {
    List,
    Create,
    Drop,
    Enable,
}

/// SQL command a policy applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PolicyCommand {
    #[default]
    All,
    Select,
    Insert,
    Update,
    Delete,
}

impl PolicyCommand {
    pub fn as_sql(&self) -> &'static str {
        match self {
            PolicyCommand::All => "ALL",
            PolicyCommand::Select => "SELECT",
            PolicyCommand::Insert => "INSERT",
            PolicyCommand::Update => "UPDATE",
            PolicyCommand::Delete => "DELETE",
        }
    }
}

/// Body of the `manage-rls-policies` function.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ManagePolicyRequest {
    pub action: PolicyAction,
    pub table: String,
    pub policy_name: Option<String>,
    #[serde(default)]
    pub command: PolicyCommand,
    #[serde(default)]
    pub roles: Vec<String>,
    pub using: Option<String>,
    pub with_check: Option<String>,
}

/// A policy as reported by `pg_policies`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct PolicyInfo {
    pub policy_name: String,
    pub table: String,
    pub command: String,
    pub roles: Vec<String>,
    pub using: Option<String>,
    pub with_check: Option<String>,
}

impl ManagePolicyRequest {
    /// Checks table and identifiers against the allow-lists.
    pub fn validate_table(&self) -> Result<(), PolicyRequestError> {
        if MANAGED_TABLES.contains(&self.table.as_str()) {
            Ok(())
        } else {
            Err(PolicyRequestError::UnknownTable(self.table.clone()))
        }
    }

    fn policy_name(&self) -> Result<&str, PolicyRequestError> {
        let name = self
            .policy_name
            .as_deref()
            .ok_or(PolicyRequestError::MissingField("policy_name"))?;
        if is_sql_identifier(name) {
            Ok(name)
        } else {
            Err(PolicyRequestError::InvalidPolicyName(name.to_string()))
        }
    }

    /// DDL statement for create/drop/enable; `None` for list.
    pub fn to_statement(&self) -> Result<Option<String>, PolicyRequestError> {
        self.validate_table()?;
        let table = format!("public.{}", self.table);

        match self.action {
            PolicyAction::List => Ok(None),
            PolicyAction::Enable => Ok(Some(format!(
                "ALTER TABLE {} ENABLE ROW LEVEL SECURITY",
                table
            ))),
            PolicyAction::Drop => Ok(Some(format!(
                "DROP POLICY IF EXISTS {} ON {}",
                self.policy_name()?,
                table
            ))),
            PolicyAction::Create => {
                let name = self.policy_name()?;
                for role in &self.roles {
                    if !POLICY_ROLES.contains(&role.as_str()) {
                        return Err(PolicyRequestError::InvalidRole(role.clone()));
                    }
                }
                if self.using.is_none() && self.with_check.is_none() {
                    return Err(PolicyRequestError::MissingField("using"));
                }
                for expr in [&self.using, &self.with_check].into_iter().flatten() {
                    if expr.contains(';') {
                        return Err(PolicyRequestError::UnsafeExpression);
                    }
                }

                let roles = if self.roles.is_empty() {
                    "authenticated".to_string()
                } else {
                    self.roles.join(", ")
                };
                let mut sql = format!(
                    "CREATE POLICY {} ON {} FOR {} TO {}",
                    name,
                    table,
                    self.command.as_sql(),
                    roles
                );
                if let Some(using) = &self.using {
                    sql.push_str(&format!(" USING ({})", using));
                }
                if let Some(check) = &self.with_check {
                    sql.push_str(&format!(" WITH CHECK ({})", check));
                }
                Ok(Some(sql))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(action: PolicyAction) -> ManagePolicyRequest {
        ManagePolicyRequest {
            action,
            table: "vehicles".to_string(),
            policy_name: Some("owners_read_vehicles".to_string()),
            command: PolicyCommand::Select,
            roles: vec!["authenticated".to_string()],
            using: Some("owner_id = auth.uid()".to_string()),
            with_check: None,
        }
    }

    #[test]
    fn test_create_statement() {
        let sql = request(PolicyAction::Create).to_statement().unwrap().unwrap();
        assert_eq!(
            sql,
            "CREATE POLICY owners_read_vehicles ON public.vehicles FOR SELECT TO authenticated USING (owner_id = auth.uid())"
        );
    }

    #[test]
    fn test_drop_and_enable_statements() {
        assert_eq!(
            request(PolicyAction::Drop).to_statement().unwrap().unwrap(),
            "DROP POLICY IF EXISTS owners_read_vehicles ON public.vehicles"
        );
        assert_eq!(
            request(PolicyAction::Enable).to_statement().unwrap().unwrap(),
            "ALTER TABLE public.vehicles ENABLE ROW LEVEL SECURITY"
        );
        assert_eq!(request(PolicyAction::List).to_statement().unwrap(), None);
    }

    #[test]
    fn test_rejects_unknown_table() {
        let mut req = request(PolicyAction::List);
        req.table = "pg_authid".to_string();
        assert_eq!(
            req.to_statement(),
            Err(PolicyRequestError::UnknownTable("pg_authid".to_string()))
        );
    }

    #[test]
    fn test_rejects_bad_identifiers_and_expressions() {
        let mut req = request(PolicyAction::Create);
        req.policy_name = Some("x; DROP TABLE profiles".to_string());
        assert!(matches!(
            req.to_statement(),
            Err(PolicyRequestError::InvalidPolicyName(_))
        ));

        let mut req = request(PolicyAction::Create);
        req.roles = vec!["postgres".to_string()];
        assert_eq!(
            req.to_statement(),
            Err(PolicyRequestError::InvalidRole("postgres".to_string()))
        );

        let mut req = request(PolicyAction::Create);
        req.using = Some("true); DROP TABLE profiles; --".to_string());
        assert_eq!(req.to_statement(), Err(PolicyRequestError::UnsafeExpression));

        let mut req = request(PolicyAction::Drop);
        req.policy_name = None;
        assert_eq!(
            req.to_statement(),
            Err(PolicyRequestError::MissingField("policy_name"))
        );
    }

    #[test]
    fn test_command_defaults_to_all() {
        let req: ManagePolicyRequest =
            serde_json::from_str(r#"{"action":"list","table":"inventory"}"#).unwrap();
        assert_eq!(req.command, PolicyCommand::All);
        assert!(req.roles.is_empty());
    }
}
