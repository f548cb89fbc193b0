// Demand aggregation: stocks register what their owners need this period,
// commodities tot up the demand registered against them.

use crate::state::SimState;
use crate::trace::report;
use crate::types::{OwnerRef, SimulationId, StockUsage};

/// Zero demand on every commodity and stock of the simulation. Idempotent.
pub fn initialise_demand(state: &mut SimState, simulation: SimulationId) {
    report(
        state,
        simulation,
        1,
        "INITIALISING DEMAND FOR COMMODITIES AND STOCKS",
    );
    for commodity_id in state.commodities_in(simulation) {
        if let Some(commodity) = state.commodities.get_mut(commodity_id) {
            commodity.demand = 0.0;
        }
    }
    for stock_id in state.stocks_in(simulation) {
        if let Some(stock) = state.stocks.get_mut(stock_id) {
            stock.demand = 0.0;
        }
    }
}

/// Each industry adds to the demand of each of its productive stocks what
/// one period of production at the current output scale will use up.
pub fn industry_demand(state: &mut SimState, simulation: SimulationId) {
    report(state, simulation, 1, "CALCULATING DEMAND FROM INDUSTRIES");
    let Some(periods_per_year) = state
        .simulations
        .get(simulation)
        .map(|s| s.periods_per_year)
    else {
        return;
    };

    for industry_id in state.industries_in(simulation) {
        let Some(industry) = state.industries.get(industry_id) else {
            continue;
        };
        let output_scale = industry.output_scale;
        let industry_name = industry.name.clone();
        report(
            state,
            simulation,
            2,
            format!("{industry_name} sets demand for its productive stocks"),
        );

        let owner = OwnerRef::Industry(industry_id);
        for stock_id in state.stocks_of_owner_with_usage(owner, StockUsage::Production) {
            let Some(stock) = state.stocks.get(stock_id) else {
                continue;
            };
            let Some(commodity) = state.commodities.get(stock.commodity) else {
                continue;
            };
            let demand =
                output_scale * commodity.turnover_time * stock.requirement / periods_per_year;
            let stock_name = stock.name.clone();
            let total = {
                let Some(stock) = state.stocks.get_mut(stock_id) else {
                    continue;
                };
                stock.demand += demand;
                stock.demand
            };
            report(
                state,
                simulation,
                3,
                format!("Demand for {stock_name} raised by {demand} to {total}"),
            );
        }
    }
}

/// Each social class adds to the demand of each of its consumption stocks
/// what one period of consumption at current population will use up.
pub fn class_demand(state: &mut SimState, simulation: SimulationId) {
    report(state, simulation, 1, "CALCULATING DEMAND FROM SOCIAL CLASSES");
    let Some(periods_per_year) = state
        .simulations
        .get(simulation)
        .map(|s| s.periods_per_year)
    else {
        return;
    };

    for class_id in state.classes_in(simulation) {
        let Some(class) = state.classes.get(class_id) else {
            continue;
        };
        let population = class.population;
        let consumption_ratio = class.consumption_ratio;
        let class_name = class.name.clone();
        report(
            state,
            simulation,
            2,
            format!("{class_name} sets demand for its consumption stocks"),
        );

        let owner = OwnerRef::Class(class_id);
        for stock_id in state.stocks_of_owner_with_usage(owner, StockUsage::Consumption) {
            let Some(stock) = state.stocks.get(stock_id) else {
                continue;
            };
            let demand = population * consumption_ratio * stock.requirement / periods_per_year;
            let stock_name = stock.name.clone();
            let total = {
                let Some(stock) = state.stocks.get_mut(stock_id) else {
                    continue;
                };
                stock.demand += demand;
                stock.demand
            };
            report(
                state,
                simulation,
                3,
                format!("Demand for {stock_name} raised by {demand} to {total}"),
            );
        }
    }
}

/// Commodity demand = sum of demand over all stocks referencing it. Must
/// run after the industry and class passes; those two commute since both
/// only add to stock demand.
pub fn commodity_demand(state: &mut SimState, simulation: SimulationId) {
    report(state, simulation, 1, "ADDING UP DEMAND FOR COMMODITIES");
    for commodity_id in state.commodities_in(simulation) {
        let total: f64 = state
            .stocks_of_commodity(commodity_id)
            .into_iter()
            .filter_map(|id| state.stocks.get(id))
            .map(|s| s.demand)
            .sum();
        let name = match state.commodities.get_mut(commodity_id) {
            Some(commodity) => {
                commodity.demand = total;
                commodity.name.clone()
            }
            None => continue,
        };
        report(
            state,
            simulation,
            2,
            format!("Total demand for {name} is {total}"),
        );
    }
}
