// src/services/quote.rs
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::config::SolarAssumptions;

/// Conversion factor from square feet to square metres.
pub const SQ_FT_TO_SQ_M: f64 = 0.092903;

/// Days per billing month assumed when deriving daily consumption.
const DAYS_PER_MONTH: f64 = 30.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AreaUnit {
    #[serde(rename = "sq. m")]
    SquareMetres,
    #[serde(rename = "sq. ft")]
    SquareFeet,
}

impl AreaUnit {
    /// Only the literal `"sq. ft"` selects feet; anything else, including
    /// an absent unit, is treated as square metres.
    pub fn parse(label: Option<&str>) -> Self {
        match label {
            Some("sq. ft") => AreaUnit::SquareFeet,
            _ => AreaUnit::SquareMetres,
        }
    }
}

/// Validated sizing inputs. Presence/truthiness checks happen at the HTTP
/// boundary; by the time an input reaches the calculator every field is
/// populated.
///
/// `connection_type`, `contract_load`, and `selected_city` are carried
/// through to the estimate unchanged and take no part in the arithmetic.
#[derive(Debug, Clone)]
pub struct QuoteInput {
    pub connection_type: String,
    pub contract_load: f64,
    pub monthly_units: f64,
    pub selected_city: String,
    pub roof_area: f64,
    pub area_unit: AreaUnit,
}

/// The computed sizing/financial bundle, plus the inputs echoed back so a
/// persisted estimate always carries its generating parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteEstimate {
    /// Nameplate array capacity in kW, 1 decimal.
    pub system_size: f64,
    pub number_of_panels: u32,
    /// Roof area needed for the array in square metres, 1 decimal.
    pub required_roof_area: f64,
    pub is_roof_area_sufficient: bool,
    pub estimated_cost: i64,
    pub annual_savings: i64,
    /// Years for cumulative savings to equal installed cost, 1 decimal.
    pub payback_period: f64,
    pub annual_carbon_offset: i64,
    pub selected_city: String,
    pub connection_type: String,
    pub contract_load: f64,
    pub monthly_units: f64,
    pub roof_area: f64,
    pub area_unit: AreaUnit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuoteError {
    /// `monthly_units <= 0` would make the payback period non-finite.
    NonPositiveConsumption,
}

impl fmt::Display for QuoteError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            QuoteError::NonPositiveConsumption => {
                write!(f, "monthlyUnits must be greater than zero")
            }
        }
    }
}

impl std::error::Error for QuoteError {}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Size a rooftop system and estimate its economics.
///
/// Pure and deterministic: no I/O, no hidden state, safe to call from any
/// number of tasks at once. Persisting the result is the caller's concern.
pub fn calculate_quote(
    input: &QuoteInput,
    assumptions: &SolarAssumptions,
) -> Result<QuoteEstimate, QuoteError> {
    if input.monthly_units <= 0.0 {
        return Err(QuoteError::NonPositiveConsumption);
    }

    let roof_area_sq_m = match input.area_unit {
        AreaUnit::SquareFeet => input.roof_area * SQ_FT_TO_SQ_M,
        AreaUnit::SquareMetres => input.roof_area,
    };

    let daily_units = input.monthly_units / DAYS_PER_MONTH;
    let system_size_watts =
        daily_units * 1000.0 / (assumptions.peak_sun_hours * assumptions.system_efficiency);

    let number_of_panels = (system_size_watts / assumptions.panel_wattage).ceil() as u32;

    // Sufficiency is checked against the unrounded requirement; only the
    // reported figure is rounded for display.
    let required_roof_area = f64::from(number_of_panels) * assumptions.panel_area_sq_m;
    let is_roof_area_sufficient = roof_area_sq_m >= required_roof_area;

    let estimated_cost = system_size_watts * assumptions.cost_per_watt;
    let annual_savings =
        input.monthly_units * 12.0 * assumptions.tariff_per_unit * assumptions.bill_offset_share;
    let payback_period = estimated_cost / annual_savings;
    let annual_carbon_offset = input.monthly_units * 12.0 * assumptions.carbon_offset_per_kwh;

    Ok(QuoteEstimate {
        system_size: round1(system_size_watts / 1000.0),
        number_of_panels,
        required_roof_area: round1(required_roof_area),
        is_roof_area_sufficient,
        estimated_cost: estimated_cost.round() as i64,
        annual_savings: annual_savings.round() as i64,
        payback_period: round1(payback_period),
        annual_carbon_offset: annual_carbon_offset.round() as i64,
        selected_city: input.selected_city.clone(),
        connection_type: input.connection_type.clone(),
        contract_load: input.contract_load,
        monthly_units: input.monthly_units,
        roof_area: input.roof_area,
        area_unit: input.area_unit,
    })
}
