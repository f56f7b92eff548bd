use napi::Result as NapiResult;
use napi_derive::napi;
use rust_decimal::Decimal;

use calcworks_core::bonds::{BondSpec, YieldInput};

/// Convert any Display error into a napi::Error.
fn to_napi_error(e: impl std::fmt::Display) -> napi::Error {
    napi::Error::from_reason(e.to_string())
}

// ---------------------------------------------------------------------------
// Loans & savings
// ---------------------------------------------------------------------------

#[napi]
pub fn compute_schedule(input_json: String) -> NapiResult<String> {
    let input: calcworks_core::loans::LoanTerms =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = calcworks_core::loans::compute_schedule(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[napi]
pub fn compute_projection(input_json: String) -> NapiResult<String> {
    let input: calcworks_core::savings::ProjectionInput =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = calcworks_core::savings::compute_projection(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Bonds
// ---------------------------------------------------------------------------

#[napi]
pub fn price_from_yield(input_json: String) -> NapiResult<String> {
    let input: BondSpec = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = calcworks_core::bonds::price_from_yield(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[napi]
pub fn yield_from_price(input_json: String) -> NapiResult<String> {
    let input: YieldInput = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = calcworks_core::bonds::yield_from_price(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

/// Yield for the bond calculator form: bond terms plus a price as a decimal string.
#[napi]
pub fn yield_from_bond_price(bond_json: String, price: String) -> NapiResult<String> {
    let bond: BondSpec = serde_json::from_str(&bond_json).map_err(to_napi_error)?;
    let price: Decimal = price.trim().parse().map_err(to_napi_error)?;
    let input = YieldInput::from_bond(&bond, price).map_err(to_napi_error)?;
    let output = calcworks_core::bonds::yield_from_price(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Debt payoff
// ---------------------------------------------------------------------------

#[napi]
pub fn simulate_payoff(input_json: String) -> NapiResult<String> {
    let input: calcworks_core::debt::PayoffInput =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = calcworks_core::debt::simulate_payoff(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[napi]
pub fn compare_strategies(input_json: String) -> NapiResult<String> {
    let input: calcworks_core::debt::PayoffInput =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = calcworks_core::debt::compare_strategies(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Combinatorics
// ---------------------------------------------------------------------------

#[napi]
pub fn count_arrangements(input_json: String) -> NapiResult<String> {
    let input: calcworks_core::combinatorics::CountingInput =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output =
        calcworks_core::combinatorics::count_arrangements(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Dispatch
// ---------------------------------------------------------------------------

/// Run any calculator from a request tagged with a `calculator` field.
#[napi]
pub fn run_calculation(request_json: String) -> NapiResult<String> {
    let output = calcworks_core::run_json(&request_json).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}
