// Investment: each industry pays its owners their private consumption out
// of profit, then raises its output scale by whatever is smaller - its
// target growth rate or the growth its remaining money can finance.

use crate::error::CircuitError;
use crate::state::SimState;
use crate::trace::report;
use crate::types::{ClassId, IndustryId, KeyToU64, OwnerRef, SimulationId, StockUsage};

pub fn invest(state: &mut SimState, simulation: SimulationId) -> Result<(), CircuitError> {
    report(state, simulation, 1, "INVESTING");
    let capitalists = capitalist_class(state, simulation);
    for industry_id in state.industries_in(simulation) {
        industry_invest(state, simulation, industry_id, capitalists)?;
    }
    Ok(())
}

/// The owning class: the social class whose sales commodity is not labour
/// power. One such class per simulation is assumed; with none, the payout
/// leg is skipped and accumulation still runs.
fn capitalist_class(state: &SimState, simulation: SimulationId) -> Option<ClassId> {
    let labour_power = state.labour_power_commodity(simulation);
    state.classes_in(simulation).into_iter().find(|&class_id| {
        state
            .sales_stock_of(OwnerRef::Class(class_id))
            .ok()
            .and_then(|stock_id| state.stocks.get(stock_id))
            .map(|stock| Some(stock.commodity) != labour_power)
            .unwrap_or(false)
    })
}

fn industry_invest(
    state: &mut SimState,
    simulation: SimulationId,
    industry_id: IndustryId,
    capitalists: Option<ClassId>,
) -> Result<(), CircuitError> {
    let owner = OwnerRef::Industry(industry_id);
    let money_id = state.money_stock_of(owner)?;
    let (industry_name, output_scale, output_growth_rate, profit) = {
        let industry = state
            .industries
            .get(industry_id)
            .ok_or(CircuitError::MissingEntity {
                kind: "industry",
                id: industry_id.to_u64(),
            })?;
        (
            industry.name.clone(),
            industry.output_scale,
            industry.output_growth_rate,
            industry.profit,
        )
    };

    // 1. Owner payout.
    if let Some(class_id) = capitalists {
        let consumption_ratio = state
            .classes
            .get(class_id)
            .map(|c| c.consumption_ratio)
            .unwrap_or(0.0);
        let private_consumption = consumption_ratio * profit;
        let class_money_id = state.money_stock_of(OwnerRef::Class(class_id))?;
        if class_money_id != money_id {
            if let Some(money) = state.stocks.get_mut(money_id) {
                money.size -= private_consumption;
                money.value = money.size;
                money.price = money.size;
            }
            if let Some(money) = state.stocks.get_mut(class_money_id) {
                money.size += private_consumption;
                money.value = money.size;
                money.price = money.size;
            }
        }
        report(
            state,
            simulation,
            2,
            format!("{industry_name} pays out {private_consumption} of its profit {profit}"),
        );
    }

    // 2. Accumulation.
    let unit_cost = unit_cost(state, industry_id);
    if unit_cost <= 0.0 {
        report(
            state,
            simulation,
            2,
            format!("{industry_name} has no unit cost; scale unchanged"),
        );
        return Ok(());
    }
    let cost = unit_cost * output_scale;
    if cost <= 0.0 {
        return Ok(());
    }
    let money_size = state.stocks.get(money_id).map(|s| s.size).unwrap_or(0.0);
    let spare = money_size - cost;
    let possible_increase = spare / unit_cost;
    let monetary_growth = possible_increase / cost;
    let applied = output_growth_rate.min(monetary_growth);

    let new_scale = {
        let Some(industry) = state.industries.get_mut(industry_id) else {
            return Ok(());
        };
        industry.output_scale = output_scale * (1.0 + applied);
        industry.output_scale
    };
    report(
        state,
        simulation,
        2,
        format!(
            "{industry_name} grows by {applied} (target {output_growth_rate}, \
             affordable {monetary_growth}) to scale {new_scale}"
        ),
    );
    Ok(())
}

/// Money cost of one unit of output at current prices: the sum over
/// productive stocks of requirement x unit price.
fn unit_cost(state: &SimState, industry_id: IndustryId) -> f64 {
    state
        .stocks_of_owner_with_usage(OwnerRef::Industry(industry_id), StockUsage::Production)
        .into_iter()
        .filter_map(|stock_id| {
            let stock = state.stocks.get(stock_id)?;
            let commodity = state.commodities.get(stock.commodity)?;
            Some(stock.requirement * commodity.unit_price)
        })
        .sum()
}
