use std::collections::HashSet;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use validator::Validate;

use crate::error::{Error, Result};
use crate::models::add_on::{AddOn, SelectedAddOn};
use crate::models::plan::{plan_applies, PlanType};

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct AddOnSelection {
    #[validate(length(min = 1))]
    pub code: String,
    #[serde(default = "default_quantity")]
    pub quantity: i32,
}

fn default_quantity() -> i32 {
    1
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidatedAddOns {
    pub items: Vec<SelectedAddOn>,
    pub total: Decimal,
}

impl ValidatedAddOns {
    pub fn codes(&self) -> Vec<String> {
        self.items.iter().map(|i| i.code.clone()).collect()
    }
}

/// Checks a client-side add-on selection against the server catalog.
pub fn validate_selection(
    catalog: &[AddOn],
    selections: &[AddOnSelection],
    plan: PlanType,
) -> Result<ValidatedAddOns> {
    let mut seen = HashSet::new();
    let mut items = Vec::with_capacity(selections.len());

    for selection in selections {
        let code = selection.code.trim();
        if !seen.insert(code.to_ascii_lowercase()) {
            return Err(Error::BadRequest(format!("Add-on '{}' selected more than once", code)));
        }
        let add_on = catalog
            .iter()
            .find(|a| a.code.eq_ignore_ascii_case(code))
            .ok_or_else(|| Error::BadRequest(format!("Unknown add-on '{}'", code)))?;
        if !add_on.is_active {
            return Err(Error::BadRequest(format!("Add-on '{}' is not available", add_on.name)));
        }
        if !plan_applies(&add_on.plan_types, plan) {
            return Err(Error::BadRequest(format!(
                "Add-on '{}' is not available on the {} plan",
                add_on.name, plan
            )));
        }
        if selection.quantity < 1 || selection.quantity > add_on.max_quantity {
            return Err(Error::BadRequest(format!(
                "Quantity for '{}' must be between 1 and {}",
                add_on.name, add_on.max_quantity
            )));
        }

        let quantity = Decimal::from(selection.quantity);
        items.push(SelectedAddOn {
            code: add_on.code.clone(),
            name: add_on.name.clone(),
            unit_price: add_on.price,
            quantity: selection.quantity,
            line_total: add_on.price * quantity,
        });
    }

    let total = items.iter().map(|i| i.line_total).sum();
    Ok(ValidatedAddOns { items, total })
}

#[derive(Clone)]
pub struct AddOnService {
    pool: PgPool,
}

impl AddOnService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn list_all(&self) -> Result<Vec<AddOn>> {
        let add_ons = sqlx::query_as::<_, AddOn>(
            r#"SELECT * FROM add_ons ORDER BY sort_order ASC, name ASC"#,
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(add_ons)
    }

    pub async fn list_for_plan(&self, plan: Option<PlanType>) -> Result<Vec<AddOn>> {
        let add_ons = self.list_all().await?;
        Ok(add_ons
            .into_iter()
            .filter(|a| a.is_active)
            .filter(|a| plan.map(|p| plan_applies(&a.plan_types, p)).unwrap_or(true))
            .collect())
    }

    pub async fn validate(&self, selections: &[AddOnSelection], plan: PlanType) -> Result<ValidatedAddOns> {
        if selections.is_empty() {
            return Ok(ValidatedAddOns {
                items: Vec::new(),
                total: Decimal::ZERO,
            });
        }
        let catalog = self.list_all().await?;
        validate_selection(&catalog, selections, plan)
    }
}
