// ABOUTME: Informational cost figures for a worker fleet.
// ABOUTME: Hourly/daily/monthly spend, savings against on-demand, and budget usage.

use serde::Serialize;

use crate::config::CostConfig;

const HOURS_PER_DAY: f64 = 24.0;
const DAYS_PER_MONTH: f64 = 30.0;

fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}

/// Running cost of a fleet at a given capacity.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CostReport {
    pub capacity: u32,
    pub unit_price: f64,
    pub on_demand_price: f64,
    pub hourly_cost: f64,
    pub daily_cost: f64,
    pub monthly_cost: f64,
    pub monthly_savings: f64,
    pub savings_percent: f64,
}

/// Cost change caused by a scaling decision. Reported, never fed back.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CostImpact {
    pub capacity_change: i64,
    pub hourly_change: f64,
    pub daily_change: f64,
    pub monthly_change: f64,
    pub action_taken: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl CostImpact {
    /// No capacity change was made.
    pub fn none(capacity_change: i64) -> Self {
        Self {
            capacity_change,
            hourly_change: 0.0,
            daily_change: 0.0,
            monthly_change: 0.0,
            action_taken: false,
            error: None,
        }
    }

    pub fn failed(capacity_change: i64, error: String) -> Self {
        Self {
            error: Some(error),
            ..Self::none(capacity_change)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BudgetStatus {
    pub monthly_cost: f64,
    pub budget: f64,
    pub usage_percent: f64,
    pub alert: bool,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CostModel {
    config: CostConfig,
}

impl CostModel {
    pub fn new(config: CostConfig) -> Self {
        Self { config }
    }

    pub fn report(&self, capacity: u32) -> CostReport {
        let workers = f64::from(capacity);
        let hourly = workers * self.config.unit_price;
        let monthly = hourly * HOURS_PER_DAY * DAYS_PER_MONTH;
        let on_demand_monthly = workers * self.config.on_demand_price * HOURS_PER_DAY * DAYS_PER_MONTH;
        let savings = on_demand_monthly - monthly;
        let savings_percent = if on_demand_monthly > 0.0 {
            savings / on_demand_monthly * 100.0
        } else {
            0.0
        };

        CostReport {
            capacity,
            unit_price: self.config.unit_price,
            on_demand_price: self.config.on_demand_price,
            hourly_cost: round_to(hourly, 4),
            daily_cost: round_to(hourly * HOURS_PER_DAY, 2),
            monthly_cost: round_to(monthly, 2),
            monthly_savings: round_to(savings, 2),
            savings_percent: round_to(savings_percent, 1),
        }
    }

    /// Cost of moving from `current` to `target` workers once the change was applied.
    pub fn impact(&self, current: u32, target: u32) -> CostImpact {
        let change = i64::from(target) - i64::from(current);
        let hourly = change as f64 * self.config.unit_price;
        let daily = hourly * HOURS_PER_DAY;
        CostImpact {
            capacity_change: change,
            hourly_change: round_to(hourly, 4),
            daily_change: round_to(daily, 2),
            monthly_change: round_to(daily * DAYS_PER_MONTH, 2),
            action_taken: true,
            error: None,
        }
    }

    pub fn budget_status(&self, report: &CostReport) -> BudgetStatus {
        let budget = self.config.monthly_budget;
        let usage_percent = if budget > 0.0 {
            report.monthly_cost / budget * 100.0
        } else {
            0.0
        };
        BudgetStatus {
            monthly_cost: report.monthly_cost,
            budget,
            usage_percent: round_to(usage_percent, 1),
            alert: usage_percent > self.config.budget_alert_percent,
        }
    }
}
