// Production: industries absorb their productive stocks into this period's
// sales output. Labour power contributes its magnitude; every other input
// contributes its value and is used up entirely.

use crate::error::CircuitError;
use crate::state::SimState;
use crate::trace::report;
use crate::types::{CommodityId, IndustryId, KeyToU64, OwnerRef, SimulationId, StockUsage};

pub fn produce(state: &mut SimState, simulation: SimulationId) -> Result<(), CircuitError> {
    report(state, simulation, 1, "PRODUCTION");
    let labour_power = state.labour_power_commodity(simulation);
    for industry_id in state.industries_in(simulation) {
        industry_produce(state, simulation, industry_id, labour_power)?;
    }
    Ok(())
}

fn industry_produce(
    state: &mut SimState,
    simulation: SimulationId,
    industry_id: IndustryId,
    labour_power: Option<CommodityId>,
) -> Result<(), CircuitError> {
    let owner = OwnerRef::Industry(industry_id);
    let sales_id = state.sales_stock_of(owner)?;
    let (industry_name, output_scale) = {
        let industry = state
            .industries
            .get(industry_id)
            .ok_or(CircuitError::MissingEntity {
                kind: "industry",
                id: industry_id.to_u64(),
            })?;
        (industry.name.clone(), industry.output_scale)
    };
    report(state, simulation, 2, format!("{industry_name} is producing"));

    let mut absorbed = 0.0;
    for stock_id in state.stocks_of_owner_with_usage(owner, StockUsage::Production) {
        let Some(stock) = state.stocks.get(stock_id) else {
            continue;
        };
        let commodity_id = stock.commodity;
        let stock_name = stock.name.clone();

        let contribution = if Some(commodity_id) == labour_power {
            // Labour power adds its magnitude, not its value. Its stale
            // value is corrected by the consume-phase revaluation.
            let magnitude = {
                let Some(stock) = state.stocks.get_mut(stock_id) else {
                    continue;
                };
                let magnitude = stock.size;
                stock.size -= magnitude;
                magnitude
            };
            report(
                state,
                simulation,
                3,
                format!("{stock_name} adds its magnitude {magnitude}"),
            );
            magnitude
        } else {
            let unit_value = state
                .commodities
                .get(commodity_id)
                .map(|c| c.unit_value)
                .unwrap_or(0.0);
            let transferred = {
                let Some(stock) = state.stocks.get_mut(stock_id) else {
                    continue;
                };
                let transferred = stock.size * unit_value;
                // Fully consumed each period; no partial consumption.
                stock.value = 0.0;
                stock.size = 0.0;
                transferred
            };
            report(
                state,
                simulation,
                3,
                format!("{stock_name} transfers value {transferred} at unit value {unit_value}"),
            );
            transferred
        };
        absorbed += contribution;
    }

    // Output is scale-determined, not input-determined.
    let sales_value = {
        let Some(sales) = state.stocks.get_mut(sales_id) else {
            return Ok(());
        };
        sales.value += absorbed;
        sales.size = output_scale;
        sales.value
    };
    report(
        state,
        simulation,
        3,
        format!("{industry_name} sales output set to {output_scale} with value {sales_value}"),
    );
    Ok(())
}
