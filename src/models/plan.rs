use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlanType {
    Basic,
    Pro,
    Premium,
}

impl PlanType {
    pub fn as_str(&self) -> &'static str {
        match self {
            PlanType::Basic => "basic",
            PlanType::Pro => "pro",
            PlanType::Premium => "premium",
        }
    }
}

impl fmt::Display for PlanType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PlanType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "basic" => Ok(PlanType::Basic),
            "pro" => Ok(PlanType::Pro),
            "premium" => Ok(PlanType::Premium),
            other => Err(format!("unknown plan type '{}'", other)),
        }
    }
}

/// Empty applicability lists mean "every plan".
pub fn plan_applies(applicable: &[String], plan: PlanType) -> bool {
    applicable.is_empty()
        || applicable
            .iter()
            .any(|p| p.trim().eq_ignore_ascii_case(plan.as_str()))
}
