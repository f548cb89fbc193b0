// Valuation and capital accounting over the interdependent ledger of
// stocks and commodities. Commodity aggregates are derived from stocks,
// unit magnitudes from aggregates, and stock valuations from unit
// magnitudes - always in that order.

use crate::state::SimState;
use crate::trace::report;
use crate::types::{OwnerRef, SimulationId, Value};

/// Commodity size / total value / total price = sums over its stocks.
pub fn recalculate_commodity_totals(state: &mut SimState, simulation: SimulationId) {
    report(state, simulation, 1, "RECALCULATING COMMODITY TOTALS");
    for commodity_id in state.commodities_in(simulation) {
        let mut size = 0.0;
        let mut total_value = 0.0;
        let mut total_price = 0.0;
        for stock_id in state.stocks_of_commodity(commodity_id) {
            if let Some(stock) = state.stocks.get(stock_id) {
                size += stock.size;
                total_value += stock.value;
                total_price += stock.price;
            }
        }
        if let Some(commodity) = state.commodities.get_mut(commodity_id) {
            commodity.size = size;
            commodity.total_value = total_value;
            commodity.total_price = total_price;
        }
    }
}

/// Unit value and unit price from aggregate totals.
///
/// A commodity with zero aggregate size has no defined unit magnitudes;
/// it keeps its prior ones rather than poisoning the ledger.
pub fn revalue_commodities(state: &mut SimState, simulation: SimulationId) {
    report(state, simulation, 1, "REVALUING COMMODITIES");
    for commodity_id in state.commodities_in(simulation) {
        let Some(commodity) = state.commodities.get(commodity_id) else {
            continue;
        };
        if commodity.size <= 0.0 {
            let name = commodity.name.clone();
            report(
                state,
                simulation,
                2,
                format!("{name} has zero size; unit value and price retained"),
            );
            continue;
        }
        if let Some(commodity) = state.commodities.get_mut(commodity_id) {
            commodity.unit_value = commodity.total_value / commodity.size;
            commodity.unit_price = commodity.total_price / commodity.size;
        }
    }
}

/// Restate every stock at its commodity's current unit magnitudes.
pub fn revalue_stocks(state: &mut SimState, simulation: SimulationId) {
    report(state, simulation, 1, "REVALUING STOCKS");
    for stock_id in state.stocks_in(simulation) {
        let Some(stock) = state.stocks.get(stock_id) else {
            continue;
        };
        let Some(commodity) = state.commodities.get(stock.commodity) else {
            continue;
        };
        let unit_value = commodity.unit_value;
        let unit_price = commodity.unit_price;
        if let Some(stock) = state.stocks.get_mut(stock_id) {
            stock.value = stock.size * unit_value;
            stock.price = stock.size * unit_price;
        }
    }
}

/// Industry capital = sum of the values of all its stocks; profit and
/// profit rate follow from initial capital.
pub fn calculate_current_capitals(state: &mut SimState, simulation: SimulationId) {
    report(state, simulation, 1, "CALCULATING CURRENT CAPITALS");
    for industry_id in state.industries_in(simulation) {
        let current: Value = state
            .stocks_of_owner(OwnerRef::Industry(industry_id))
            .into_iter()
            .filter_map(|id| state.stocks.get(id))
            .map(|s| s.value)
            .sum();
        let (name, profit, profit_rate) = {
            let Some(industry) = state.industries.get_mut(industry_id) else {
                continue;
            };
            industry.current_capital = current;
            industry.profit = current - industry.initial_capital;
            industry.profit_rate = if industry.initial_capital != 0.0 {
                industry.profit / industry.initial_capital
            } else {
                0.0
            };
            (industry.name.clone(), industry.profit, industry.profit_rate)
        };
        report(
            state,
            simulation,
            2,
            format!("{name} capital is {current} with profit {profit} (rate {profit_rate})"),
        );
    }
}
