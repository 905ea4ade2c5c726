//! PostgreSQL Rule Adapter
//!
//! Rows store the condition payload without its `type` tag; the tag comes
//! from the `rule_type` column. The adapter stitches the two back together
//! before deserializing into [`RuleCondition`].

use async_trait::async_trait;
use sqlx::PgPool;
use tracing::{debug, instrument};

use core_kernel::{BusinessId, DateRange, DomainPort, PortError, RuleId};
use domain_pricing::{PriceAdjustment, PricingRule, RuleCondition, RuleRepository, RuleType};

use crate::error::DatabaseError;
use crate::repositories::rules::{NewPricingRule, PricingRuleRow, RuleKind, RuleStore};

/// PostgreSQL-backed [`RuleRepository`]
#[derive(Debug, Clone)]
pub struct PostgresRuleAdapter {
    store: RuleStore,
}

impl PostgresRuleAdapter {
    pub fn new(pool: PgPool) -> Self {
        Self {
            store: RuleStore::new(pool),
        }
    }

    /// The underlying store, for seeding and maintenance
    pub fn store(&self) -> &RuleStore {
        &self.store
    }

    /// Persists a domain rule
    pub async fn save(&self, business_id: BusinessId, rule: &PricingRule) -> Result<(), PortError> {
        let row = rule_to_row(business_id, rule)?;
        self.store.insert(&row).await?;
        Ok(())
    }
}

impl DomainPort for PostgresRuleAdapter {}

#[async_trait]
impl RuleRepository for PostgresRuleAdapter {
    #[instrument(skip(self), fields(business_id = %business_id))]
    async fn list_active(&self, business_id: BusinessId) -> Result<Vec<PricingRule>, PortError> {
        let rows = self.store.list_live(*business_id.as_uuid()).await?;

        let rules = rows
            .into_iter()
            .map(row_to_rule)
            .collect::<Result<Vec<_>, _>>()?;

        debug!(count = rules.len(), "Converted pricing rules");
        Ok(rules)
    }
}

impl From<RuleType> for RuleKind {
    fn from(rule_type: RuleType) -> Self {
        match rule_type {
            RuleType::Zone => RuleKind::Zone,
            RuleType::Customer => RuleKind::Customer,
            RuleType::Service => RuleKind::Service,
            RuleType::Volume => RuleKind::Volume,
        }
    }
}

/// Converts a stored row into a validated domain rule
pub fn row_to_rule(row: PricingRuleRow) -> Result<PricingRule, DatabaseError> {
    let invalid = |message: String| DatabaseError::InvalidRecord(format!("rule {}: {}", row.rule_id, message));

    let mut payload = match row.conditions.clone() {
        serde_json::Value::Object(map) => map,
        serde_json::Value::Null => serde_json::Map::new(),
        other => return Err(invalid(format!("conditions must be an object, got {}", other))),
    };
    payload.insert("type".to_string(), serde_json::Value::from(row.rule_type.tag()));

    let condition: RuleCondition = serde_json::from_value(serde_json::Value::Object(payload))
        .map_err(|e| invalid(format!("bad conditions: {}", e)))?;
    let adjustment: PriceAdjustment = serde_json::from_value(row.adjustment.clone())
        .map_err(|e| invalid(format!("bad adjustment: {}", e)))?;

    let date_range = match (row.start_date, row.end_date) {
        (None, None) => None,
        (start, end) => Some(DateRange::new(start, end).map_err(|e| invalid(e.to_string()))?),
    };

    let rule = PricingRule {
        id: RuleId::from(row.rule_id),
        name: row.name,
        condition,
        date_range,
        adjustment,
        priority: row.priority,
        is_active: row.is_active,
        applied_count: u64::try_from(row.applied_count).unwrap_or(0),
    };
    rule.validate()?;
    Ok(rule)
}

/// Converts a domain rule into an insertable row
pub fn rule_to_row(business_id: BusinessId, rule: &PricingRule) -> Result<NewPricingRule, DatabaseError> {
    let encode = |e: serde_json::Error| DatabaseError::InvalidRecord(format!("rule {}: {}", rule.id, e));

    let mut conditions = serde_json::to_value(&rule.condition).map_err(encode)?;
    if let serde_json::Value::Object(map) = &mut conditions {
        map.remove("type");
    }
    let adjustment = serde_json::to_value(&rule.adjustment).map_err(encode)?;

    Ok(NewPricingRule {
        rule_id: *rule.id.as_uuid(),
        business_id: *business_id.as_uuid(),
        name: rule.name.clone(),
        rule_type: rule.rule_type().into(),
        conditions,
        adjustment,
        start_date: rule.date_range.as_ref().and_then(|r| r.start),
        end_date: rule.date_range.as_ref().and_then(|r| r.end),
        priority: rule.priority,
        is_active: rule.is_active,
    })
}
