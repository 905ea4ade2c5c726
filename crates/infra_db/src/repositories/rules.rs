//! Pricing rule store
//!
//! Rules are soft-deleted: archived rows keep `deleted_at` and are never
//! returned. Rows flagged inactive are still returned so the engine can
//! explain why they did not apply.

use chrono::NaiveDate;
use sqlx::PgPool;
use tracing::debug;
use uuid::Uuid;

use crate::error::DatabaseError;

/// Stored rule type
#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::Type)]
#[sqlx(type_name = "pricing_rule_type", rename_all = "snake_case")]
pub enum RuleKind {
    Zone,
    Customer,
    Service,
    Volume,
}

impl RuleKind {
    /// The tag the domain condition enum is keyed by
    pub fn tag(&self) -> &'static str {
        match self {
            RuleKind::Zone => "zone",
            RuleKind::Customer => "customer",
            RuleKind::Service => "service",
            RuleKind::Volume => "volume",
        }
    }
}

/// A row of `pricing_rules`
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct PricingRuleRow {
    pub rule_id: Uuid,
    pub business_id: Uuid,
    pub name: String,
    pub rule_type: RuleKind,
    /// Type-specific condition payload, without its `type` tag
    pub conditions: serde_json::Value,
    pub adjustment: serde_json::Value,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub priority: i32,
    pub is_active: bool,
    pub applied_count: i64,
}

/// Data for inserting a rule
#[derive(Debug, Clone)]
pub struct NewPricingRule {
    pub rule_id: Uuid,
    pub business_id: Uuid,
    pub name: String,
    pub rule_type: RuleKind,
    pub conditions: serde_json::Value,
    pub adjustment: serde_json::Value,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub priority: i32,
    pub is_active: bool,
}

const RULE_COLUMNS: &str = r#"
    rule_id, business_id, name, rule_type, conditions, adjustment,
    start_date, end_date, priority, is_active, applied_count
"#;

/// Access to the `pricing_rules` table
#[derive(Debug, Clone)]
pub struct RuleStore {
    pool: PgPool,
}

impl RuleStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// All non-archived rules of a business, highest priority first
    pub async fn list_live(&self, business_id: Uuid) -> Result<Vec<PricingRuleRow>, DatabaseError> {
        let sql = format!(
            "SELECT {} FROM pricing_rules \
             WHERE business_id = $1 AND deleted_at IS NULL \
             ORDER BY priority DESC, rule_id ASC",
            RULE_COLUMNS
        );
        let rows = sqlx::query_as::<_, PricingRuleRow>(&sql)
            .bind(business_id)
            .fetch_all(&self.pool)
            .await?;

        debug!(%business_id, count = rows.len(), "Loaded pricing rules");
        Ok(rows)
    }

    /// Retrieves a single live rule
    pub async fn get(&self, rule_id: Uuid) -> Result<PricingRuleRow, DatabaseError> {
        let sql = format!(
            "SELECT {} FROM pricing_rules WHERE rule_id = $1 AND deleted_at IS NULL",
            RULE_COLUMNS
        );
        sqlx::query_as::<_, PricingRuleRow>(&sql)
            .bind(rule_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| DatabaseError::not_found("PricingRule", rule_id))
    }

    pub async fn insert(&self, rule: &NewPricingRule) -> Result<(), DatabaseError> {
        sqlx::query(
            r#"
            INSERT INTO pricing_rules (
                rule_id, business_id, name, rule_type, conditions, adjustment,
                start_date, end_date, priority, is_active
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            "#,
        )
        .bind(rule.rule_id)
        .bind(rule.business_id)
        .bind(&rule.name)
        .bind(rule.rule_type)
        .bind(&rule.conditions)
        .bind(&rule.adjustment)
        .bind(rule.start_date)
        .bind(rule.end_date)
        .bind(rule.priority)
        .bind(rule.is_active)
        .execute(&self.pool)
        .await
        .map_err(DatabaseError::classify)?;

        Ok(())
    }

    /// Soft-deletes a rule; returns false if it was already gone
    pub async fn archive(&self, rule_id: Uuid) -> Result<bool, DatabaseError> {
        let result = sqlx::query(
            "UPDATE pricing_rules SET deleted_at = now(), updated_at = now() \
             WHERE rule_id = $1 AND deleted_at IS NULL",
        )
        .bind(rule_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Adds one to `applied_count`
    ///
    /// # Errors
    ///
    /// `DatabaseError::NotFound` if the rule does not exist
    pub async fn increment_applied_count(&self, rule_id: Uuid) -> Result<(), DatabaseError> {
        let result = sqlx::query(
            "UPDATE pricing_rules SET applied_count = applied_count + 1 WHERE rule_id = $1",
        )
        .bind(rule_id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DatabaseError::not_found("PricingRule", rule_id));
        }
        Ok(())
    }
}
