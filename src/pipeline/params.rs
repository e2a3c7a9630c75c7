//! Tunable parameters for the selection model
//!
//! All defaults reproduce the campaign the tool was built for: a cap of 6000
//! VIPs, a perk-value cutoff of 0.05, and the margin and incentive constants
//! below. A JSON file can override any subset of them.

use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Deserializer, Serialize};

use super::error::{SelectionError, SelectionResult};
use super::seasonal::SeasonalCalendar;

/// Fraction of spend counted as margin, per spend category
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MarginRates {
    /// General merchandise; applies to both `non_ob_spend` and `ob_spend`
    pub general_merchandise: f64,
    /// Convenience store spend (`cs_spend`)
    pub convenience: f64,
    /// Margin per fuel gallon
    pub fuel: f64,
    /// Grocery spend (`gc_spend`)
    pub grocery: f64,
    /// Pharmacy. No input column feeds this rate; it is carried in the config
    /// and report so the full rate card is visible.
    pub pharmacy: f64,
}

impl Default for MarginRates {
    fn default() -> Self {
        Self {
            general_merchandise: 0.35,
            convenience: 0.35,
            fuel: 0.22,
            grocery: 0.067,
            pharmacy: 0.20,
        }
    }
}

/// Per-category incentive weights, divided by `IncentiveCosts::divisor`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryWeights {
    pub non_ob: f64,
    pub ob: f64,
    pub fuel: f64,
    pub grocery: f64,
    pub convenience: f64,
}

/// A weight block as written in a config file; absent categories are `None`
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct PartialWeights {
    non_ob: Option<f64>,
    ob: Option<f64>,
    fuel: Option<f64>,
    grocery: Option<f64>,
    convenience: Option<f64>,
}

impl PartialWeights {
    fn or(self, defaults: CategoryWeights) -> CategoryWeights {
        CategoryWeights {
            non_ob: self.non_ob.unwrap_or(defaults.non_ob),
            ob: self.ob.unwrap_or(defaults.ob),
            fuel: self.fuel.unwrap_or(defaults.fuel),
            grocery: self.grocery.unwrap_or(defaults.grocery),
            convenience: self.convenience.unwrap_or(defaults.convenience),
        }
    }
}

fn vip_weights<'de, D: Deserializer<'de>>(deserializer: D) -> Result<CategoryWeights, D::Error> {
    Ok(PartialWeights::deserialize(deserializer)?.or(IncentiveCosts::default().vip))
}

fn baseline_weights<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<CategoryWeights, D::Error> {
    Ok(PartialWeights::deserialize(deserializer)?.or(IncentiveCosts::default().baseline))
}

impl CategoryWeights {
    fn entries(&self) -> [(&'static str, f64); 5] {
        [
            ("non_ob", self.non_ob),
            ("ob", self.ob),
            ("fuel", self.fuel),
            ("grocery", self.grocery),
            ("convenience", self.convenience),
        ]
    }
}

/// Cost side of the objective
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IncentiveCosts {
    /// Promotional discount on VIP `ob_spend`
    pub ob_discount_rate: f64,
    /// Normalization applied to every incentive weight
    pub divisor: f64,
    /// Incentive weights for VIP households (scaled by the seasonal multiplier)
    #[serde(deserialize_with = "vip_weights")]
    pub vip: CategoryWeights,
    /// Incentive weights for everyone else
    #[serde(deserialize_with = "baseline_weights")]
    pub baseline: CategoryWeights,
}

impl Default for IncentiveCosts {
    fn default() -> Self {
        Self {
            ob_discount_rate: 0.05,
            divisor: 50.0,
            vip: CategoryWeights {
                non_ob: 1.5,
                ob: 1.5,
                fuel: 3.0,
                grocery: 1.5,
                convenience: 1.5,
            },
            baseline: CategoryWeights {
                non_ob: 1.0,
                ob: 1.0,
                fuel: 2.0,
                grocery: 1.0,
                convenience: 1.0,
            },
        }
    }
}

/// Everything the model builder needs besides the data
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectionParams {
    /// Maximum number of VIP households
    pub vip_cap: usize,
    /// Households whose lowest perk value falls below this are never VIP
    pub eligibility_threshold: f64,
    pub margin_rates: MarginRates,
    pub incentive_costs: IncentiveCosts,
    pub calendar: SeasonalCalendar,
}

impl Default for SelectionParams {
    fn default() -> Self {
        Self {
            vip_cap: 6000,
            eligibility_threshold: 0.05,
            margin_rates: MarginRates::default(),
            incentive_costs: IncentiveCosts::default(),
            calendar: SeasonalCalendar::default(),
        }
    }
}

impl SelectionParams {
    /// Reject non-finite or negative constants before any model is built
    pub fn validate(&self) -> SelectionResult<()> {
        if !self.eligibility_threshold.is_finite() {
            return Err(invalid(
                "eligibility_threshold",
                self.eligibility_threshold,
                "must be finite",
            ));
        }

        let rates = &self.margin_rates;
        for (name, value) in [
            ("margin_rates.general_merchandise", rates.general_merchandise),
            ("margin_rates.convenience", rates.convenience),
            ("margin_rates.fuel", rates.fuel),
            ("margin_rates.grocery", rates.grocery),
            ("margin_rates.pharmacy", rates.pharmacy),
            ("incentive_costs.ob_discount_rate", self.incentive_costs.ob_discount_rate),
        ] {
            check_non_negative(name, value)?;
        }

        let divisor = self.incentive_costs.divisor;
        if !divisor.is_finite() || divisor <= 0.0 {
            return Err(invalid("incentive_costs.divisor", divisor, "must be positive"));
        }

        for (group, weights) in [
            ("vip", &self.incentive_costs.vip),
            ("baseline", &self.incentive_costs.baseline),
        ] {
            for (category, value) in weights.entries() {
                check_non_negative(&format!("incentive_costs.{}.{}", group, category), value)?;
            }
        }

        self.calendar.validate()
    }
}

fn check_non_negative(name: &str, value: f64) -> SelectionResult<()> {
    if !value.is_finite() || value < 0.0 {
        return Err(invalid(name, value, "must be a finite non-negative number"));
    }
    Ok(())
}

fn invalid(name: &str, value: f64, reason: &str) -> SelectionError {
    SelectionError::InvalidParameter {
        name: name.to_string(),
        reason: format!("{}, got {}", reason, value),
    }
}

/// Names of the input columns
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColumnMapping {
    pub household: String,
    pub week: String,
    pub non_ob_spend: String,
    pub ob_spend: String,
    pub fuel_gallons: String,
    pub gc_spend: String,
    pub cs_spend: String,
    pub perk_value: String,
}

impl Default for ColumnMapping {
    fn default() -> Self {
        Self {
            household: "hshld_no".to_string(),
            week: "week_id".to_string(),
            non_ob_spend: "non_ob_spend".to_string(),
            ob_spend: "ob_spend".to_string(),
            fuel_gallons: "fuel_gallons".to_string(),
            gc_spend: "gc_spend".to_string(),
            cs_spend: "cs_spend".to_string(),
            perk_value: "perk_value".to_string(),
        }
    }
}

impl ColumnMapping {
    /// Every column the feature table must contain
    pub fn required(&self) -> [&str; 8] {
        [
            self.household.as_str(),
            self.week.as_str(),
            self.non_ob_spend.as_str(),
            self.ob_spend.as_str(),
            self.fuel_gallons.as_str(),
            self.gc_spend.as_str(),
            self.cs_spend.as_str(),
            self.perk_value.as_str(),
        ]
    }
}

/// Contents of a `--config` file
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    pub columns: ColumnMapping,
    pub params: SelectionParams,
}

impl RunConfig {
    /// Load a config file. Keys that are absent keep their defaults.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config: RunConfig = serde_json::from_str(&text)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
        Ok(config)
    }

    /// Write this config as pretty-printed JSON
    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self).context("Failed to serialize config")?;
        std::fs::write(path, json)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;
        Ok(())
    }
}
