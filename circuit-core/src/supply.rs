// Supply aggregation: each owner's sales stock tells its commodity how
// much is on offer this period.

use crate::error::CircuitError;
use crate::state::SimState;
use crate::trace::report;
use crate::types::{OwnerRef, SimulationId};

/// Zero supply on every commodity of the simulation. Idempotent.
pub fn initialise_supply(state: &mut SimState, simulation: SimulationId) {
    report(state, simulation, 1, "INITIALISING SUPPLY FOR COMMODITIES");
    for commodity_id in state.commodities_in(simulation) {
        if let Some(commodity) = state.commodities.get_mut(commodity_id) {
            commodity.supply = 0.0;
        }
    }
}

/// Each industry adds its sales stock size to its output commodity's supply.
pub fn industry_supply(state: &mut SimState, simulation: SimulationId) -> Result<(), CircuitError> {
    report(state, simulation, 1, "CALCULATING SUPPLY FROM INDUSTRIES");
    for industry_id in state.industries_in(simulation) {
        register_sales(state, simulation, OwnerRef::Industry(industry_id))?;
    }
    Ok(())
}

/// Each class adds its sales stock size to the supply of what it offers
/// (labour power or services).
pub fn class_supply(state: &mut SimState, simulation: SimulationId) -> Result<(), CircuitError> {
    report(state, simulation, 1, "CALCULATING SUPPLY FROM SOCIAL CLASSES");
    for class_id in state.classes_in(simulation) {
        register_sales(state, simulation, OwnerRef::Class(class_id))?;
    }
    Ok(())
}

fn register_sales(
    state: &mut SimState,
    simulation: SimulationId,
    owner: OwnerRef,
) -> Result<(), CircuitError> {
    let sales_id = state.sales_stock_of(owner)?;
    let Some(sales) = state.stocks.get(sales_id) else {
        return Ok(());
    };
    let on_offer = sales.size;
    let commodity_id = sales.commodity;
    let owner_name = state.owner_name(owner);

    let (name, total) = match state.commodities.get_mut(commodity_id) {
        Some(commodity) => {
            commodity.supply += on_offer;
            (commodity.name.clone(), commodity.supply)
        }
        None => return Ok(()),
    };
    report(
        state,
        simulation,
        2,
        format!("{owner_name} adds {on_offer} to the supply of {name}, now {total}"),
    );
    Ok(())
}
