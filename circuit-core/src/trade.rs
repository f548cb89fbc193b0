// Rationing and settlement. Rationing scales demand down to what supply
// can cover; settlement walks the precomputed buyer/seller index and
// executes conservation-respecting transfers.

use crate::error::CircuitError;
use crate::state::SimState;
use crate::trace::report;
use crate::traders::{Buyer, Seller};
use crate::types::{CommodityUsage, KeyToU64, SimulationId};

/// Constrain demand to supply, commodity by commodity.
///
/// Proportional rationing: every buyer of a scarce commodity is cut back
/// by the identical fraction, never prioritized individually. Money and
/// sales commodities are exempt - only what is produced or consumed gets
/// rationed. A commodity with no supply at all rations everyone to zero,
/// so settlement has nothing to move for it this period.
pub fn constrain_demand(state: &mut SimState, simulation: SimulationId) {
    report(state, simulation, 1, "CONSTRAINING DEMAND TO SUPPLY");
    for commodity_id in state.commodities_in(simulation) {
        let Some(commodity) = state.commodities.get(commodity_id) else {
            continue;
        };
        if !matches!(
            commodity.usage,
            CommodityUsage::Productive | CommodityUsage::Consumption
        ) {
            continue;
        }
        let demand = commodity.demand;
        let supply = commodity.supply;
        let name = commodity.name.clone();
        report(
            state,
            simulation,
            2,
            format!("Demand for {name} is {demand} and supply is {supply}"),
        );

        let ratio = if supply == 0.0 {
            report(state, simulation, 3, format!("Zero supply of {name}"));
            0.0
        } else if demand <= supply {
            1.0
        } else {
            supply / demand
        };

        if let Some(commodity) = state.commodities.get_mut(commodity_id) {
            commodity.allocation_ratio = ratio;
        }
        if ratio >= 1.0 {
            continue;
        }

        if let Some(commodity) = state.commodities.get_mut(commodity_id) {
            commodity.demand *= ratio;
        }
        for stock_id in state.stocks_of_commodity(commodity_id) {
            if let Some(stock) = state.stocks.get_mut(stock_id) {
                stock.demand *= ratio;
            }
        }
        report(
            state,
            simulation,
            3,
            format!("Demand for {name} constrained by a factor of {ratio}"),
        );
    }
}

/// Pair every seller with the buyers of its commodity and settle.
///
/// A buyer clears its whole remaining (rationed) demand against each
/// seller in turn, so with several sellers of one commodity later sellers
/// see only what is left.
pub fn buy_and_sell(state: &mut SimState, simulation: SimulationId) -> Result<(), CircuitError> {
    report(state, simulation, 1, "TRADING");
    let Some(registry) = state.traders.get(&simulation).cloned() else {
        return Ok(());
    };

    for seller in &registry.sellers {
        let (seller_name, on_offer) = {
            let stock = state
                .stocks
                .get(seller.sales_stock)
                .ok_or(CircuitError::MissingEntity {
                    kind: "stock",
                    id: seller.sales_stock.to_u64(),
                })?;
            (stock.name.clone(), stock.size)
        };
        report(
            state,
            simulation,
            2,
            format!("{seller_name} offers {on_offer} for sale"),
        );

        for buyer in registry.buyers_of(seller.commodity) {
            buy(state, simulation, buyer, seller)?;
        }
    }
    Ok(())
}

/// Move the buyer's demanded quantity from the seller's sales stock to the
/// buyer's purchase stock and settle the money leg.
///
/// Quantity moved equals quantity received, and money paid equals
/// `amount x unit_price` - except when both parties draw on the same money
/// stock (a purchase internal to one owner), where no money moves at all.
fn buy(
    state: &mut SimState,
    simulation: SimulationId,
    buyer: &Buyer,
    seller: &Seller,
) -> Result<(), CircuitError> {
    let (unit_value, unit_price) = {
        let commodity =
            state
                .commodities
                .get(seller.commodity)
                .ok_or(CircuitError::MissingEntity {
                    kind: "commodity",
                    id: seller.commodity.to_u64(),
                })?;
        (commodity.unit_value, commodity.unit_price)
    };

    let amount = {
        let purchase =
            state
                .stocks
                .get_mut(buyer.purchase_stock)
                .ok_or(CircuitError::MissingEntity {
                    kind: "stock",
                    id: buyer.purchase_stock.to_u64(),
                })?;
        let amount = purchase.demand;
        purchase.size += amount;
        purchase.price = purchase.size * unit_price;
        purchase.value = purchase.size * unit_value;
        purchase.demand -= amount;
        amount
    };

    {
        let sales = state
            .stocks
            .get_mut(seller.sales_stock)
            .ok_or(CircuitError::MissingEntity {
                kind: "stock",
                id: seller.sales_stock.to_u64(),
            })?;
        sales.size -= amount;
        sales.value = sales.size * unit_value;
        sales.price = sales.size * unit_price;
    }

    if buyer.money_stock == seller.money_stock {
        report(
            state,
            simulation,
            4,
            "Money stocks are the same so no transfer effected",
        );
    } else {
        // Money keeps value == price == size while the MELT stays at 1.
        let payment = amount * unit_price;
        if let Some(money) = state.stocks.get_mut(seller.money_stock) {
            money.size += payment;
            money.value = money.size;
            money.price = money.size;
        }
        if let Some(money) = state.stocks.get_mut(buyer.money_stock) {
            money.size -= payment;
            money.value = money.size;
            money.price = money.size;
        }
    }

    let buyer_name = state.owner_name(buyer.owner);
    report(
        state,
        simulation,
        3,
        format!("{buyer_name} bought {amount} at unit price {unit_price}"),
    );
    Ok(())
}
