// Consumption and reproduction: classes draw down their consumption
// stocks at the period flow rate, then put their full labour power or
// service supply back on offer.

use crate::error::CircuitError;
use crate::state::SimState;
use crate::trace::report;
use crate::types::{ClassId, KeyToU64, OwnerRef, SimulationId, StockUsage};

pub fn consume(state: &mut SimState, simulation: SimulationId) -> Result<(), CircuitError> {
    report(state, simulation, 1, "CONSUMPTION AND REPRODUCTION");
    for class_id in state.classes_in(simulation) {
        class_consume(state, simulation, class_id)?;
    }
    Ok(())
}

fn class_consume(
    state: &mut SimState,
    simulation: SimulationId,
    class_id: ClassId,
) -> Result<(), CircuitError> {
    let owner = OwnerRef::Class(class_id);
    let sales_id = state.sales_stock_of(owner)?;
    let (class_name, population, consumption_ratio) = {
        let class = state
            .classes
            .get(class_id)
            .ok_or(CircuitError::MissingEntity {
                kind: "class",
                id: class_id.to_u64(),
            })?;
        (class.name.clone(), class.population, class.consumption_ratio)
    };
    let Some(periods_per_year) = state
        .simulations
        .get(simulation)
        .map(|s| s.periods_per_year)
    else {
        return Ok(());
    };
    report(
        state,
        simulation,
        2,
        format!("{class_name} is reproducing itself"),
    );

    // Eat according to defined consumption standards, not all at once.
    let flow = population * consumption_ratio / periods_per_year;
    for stock_id in state.stocks_of_owner_with_usage(owner, StockUsage::Consumption) {
        let Some(stock) = state.stocks.get(stock_id) else {
            continue;
        };
        let (unit_value, unit_price) = state
            .commodities
            .get(stock.commodity)
            .map(|c| (c.unit_value, c.unit_price))
            .unwrap_or((0.0, 0.0));
        let stock_name = stock.name.clone();
        let remaining = {
            let Some(stock) = state.stocks.get_mut(stock_id) else {
                continue;
            };
            stock.size -= flow;
            stock.value -= flow * unit_value;
            stock.price -= flow * unit_price;
            stock.size
        };
        report(
            state,
            simulation,
            3,
            format!("{stock_name} consumed at flow {flow}, {remaining} remains"),
        );
    }

    // Labour power / service supply is replenished to full capacity each
    // period; population dynamics are deliberately absent in this version.
    let replenished = {
        let Some(sales) = state.stocks.get_mut(sales_id) else {
            return Ok(());
        };
        sales.size = population;
        sales.size
    };
    report(
        state,
        simulation,
        3,
        format!("Sales stock of {class_name} replenished to {replenished}"),
    );
    Ok(())
}
