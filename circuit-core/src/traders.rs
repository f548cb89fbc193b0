use serde::{Deserialize, Serialize};

use crate::error::CircuitError;
use crate::state::SimState;
use crate::types::{CommodityId, KeyToU64, OwnerRef, SimulationId, StockId, StockUsage};

// ============================================================================
// Buyer / Seller - Derived cross-references consumed by the trade phase
// ============================================================================

/// One purchase position: the stock being filled, the money that pays for
/// it, and the commodity both refer to. Not owned data - an index entry.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Buyer {
    pub owner: OwnerRef,
    pub purchase_stock: StockId,
    pub money_stock: StockId,
    pub commodity: CommodityId,
}

/// One sale position: an owner's sales stock and the money that receives
/// its proceeds.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Seller {
    pub owner: OwnerRef,
    pub sales_stock: StockId,
    pub money_stock: StockId,
    pub commodity: CommodityId,
}

/// Per-simulation buyer/seller index. Rebuilt whenever the stock set
/// changes (fixture load, template clone); read-only during trade.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TradeRegistry {
    pub buyers: Vec<Buyer>,
    pub sellers: Vec<Seller>,
}

impl TradeRegistry {
    pub fn buyers_of(&self, commodity: CommodityId) -> impl Iterator<Item = &Buyer> {
        self.buyers.iter().filter(move |b| b.commodity == commodity)
    }
}

/// Derive the buyer and seller index for one simulation.
///
/// Sellers: every sales stock. Buyers: every stock that is neither sales
/// nor money. Both sides link to their owner's money stock, so an owner
/// without one is a data error.
pub fn build_registry(
    state: &SimState,
    simulation: SimulationId,
) -> Result<TradeRegistry, CircuitError> {
    let mut registry = TradeRegistry::default();

    for stock_id in state.stocks_in(simulation) {
        let stock = state
            .stocks
            .get(stock_id)
            .ok_or(CircuitError::MissingEntity {
                kind: "stock",
                id: stock_id.to_u64(),
            })?;
        match stock.usage {
            StockUsage::Sales => {
                registry.sellers.push(Seller {
                    owner: stock.owner,
                    sales_stock: stock_id,
                    money_stock: state.money_stock_of(stock.owner)?,
                    commodity: stock.commodity,
                });
            }
            StockUsage::Money => {}
            StockUsage::Production | StockUsage::Consumption => {
                registry.buyers.push(Buyer {
                    owner: stock.owner,
                    purchase_stock: stock_id,
                    money_stock: state.money_stock_of(stock.owner)?,
                    commodity: stock.commodity,
                });
            }
        }
    }

    Ok(registry)
}
