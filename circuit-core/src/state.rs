use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use slotmap::SlotMap;
use tsify_next::Tsify;

use crate::entities::{Commodity, Industry, Simulation, SocialClass, Stock, Trace};
use crate::error::CircuitError;
use crate::traders::TradeRegistry;
use crate::types::{
    CircuitState, ClassId, CommodityId, CommodityOrigin, CommodityUsage, IndustryId, KeyToU64,
    OwnerRef, SimulationId, StockId, StockUsage,
};

// ============================================================================
// SimState - The entity repository
// ============================================================================

/// Arena store for every entity of every simulation, plus the derived
/// per-simulation buyer/seller registries and the trace ledger.
///
/// Phases treat this as a queryable, bulk-mutable repository. The circuit
/// controller provides the commit semantics: a phase runs against a scratch
/// clone which replaces the live state only on success.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SimState {
    pub simulations: SlotMap<SimulationId, Simulation>,
    pub commodities: SlotMap<CommodityId, Commodity>,
    pub industries: SlotMap<IndustryId, Industry>,
    pub classes: SlotMap<ClassId, SocialClass>,
    pub stocks: SlotMap<StockId, Stock>,
    /// Rebuilt whenever a simulation's stock set changes; read-only in trade.
    pub traders: HashMap<SimulationId, TradeRegistry>,
    pub traces: Vec<Trace>,
}

impl SimState {
    pub fn new() -> Self {
        Self::default()
    }

    // === Filtered lookup ===

    pub fn commodities_in(&self, simulation: SimulationId) -> Vec<CommodityId> {
        self.commodities
            .iter()
            .filter(|(_, c)| c.simulation == simulation)
            .map(|(id, _)| id)
            .collect()
    }

    pub fn industries_in(&self, simulation: SimulationId) -> Vec<IndustryId> {
        self.industries
            .iter()
            .filter(|(_, i)| i.simulation == simulation)
            .map(|(id, _)| id)
            .collect()
    }

    pub fn classes_in(&self, simulation: SimulationId) -> Vec<ClassId> {
        self.classes
            .iter()
            .filter(|(_, c)| c.simulation == simulation)
            .map(|(id, _)| id)
            .collect()
    }

    pub fn stocks_in(&self, simulation: SimulationId) -> Vec<StockId> {
        self.stocks
            .iter()
            .filter(|(_, s)| s.simulation == simulation)
            .map(|(id, _)| id)
            .collect()
    }

    pub fn stocks_of_owner(&self, owner: OwnerRef) -> Vec<StockId> {
        self.stocks
            .iter()
            .filter(|(_, s)| s.owner == owner)
            .map(|(id, _)| id)
            .collect()
    }

    pub fn stocks_of_owner_with_usage(&self, owner: OwnerRef, usage: StockUsage) -> Vec<StockId> {
        self.stocks
            .iter()
            .filter(|(_, s)| s.owner == owner && s.usage == usage)
            .map(|(id, _)| id)
            .collect()
    }

    pub fn stocks_of_commodity(&self, commodity: CommodityId) -> Vec<StockId> {
        self.stocks
            .iter()
            .filter(|(_, s)| s.commodity == commodity)
            .map(|(id, _)| id)
            .collect()
    }

    // === Sales / money stock resolution ===

    /// Every owner holds at most one sales stock; an owner that is asked to
    /// supply or produce without one is a data error fatal to the phase.
    pub fn sales_stock_of(&self, owner: OwnerRef) -> Result<StockId, CircuitError> {
        self.stocks
            .iter()
            .find(|(_, s)| s.owner == owner && s.usage == StockUsage::Sales)
            .map(|(id, _)| id)
            .ok_or_else(|| CircuitError::MissingSalesStock {
                owner: self.owner_name(owner),
            })
    }

    pub fn money_stock_of(&self, owner: OwnerRef) -> Result<StockId, CircuitError> {
        self.stocks
            .iter()
            .find(|(_, s)| s.owner == owner && s.usage == StockUsage::Money)
            .map(|(id, _)| id)
            .ok_or_else(|| CircuitError::MissingMoneyStock {
                owner: self.owner_name(owner),
            })
    }

    pub fn owner_name(&self, owner: OwnerRef) -> String {
        match owner {
            OwnerRef::Industry(id) => self
                .industries
                .get(id)
                .map(|i| i.name.clone())
                .unwrap_or_else(|| format!("industry {:?}", id)),
            OwnerRef::Class(id) => self
                .classes
                .get(id)
                .map(|c| c.name.clone())
                .unwrap_or_else(|| format!("class {:?}", id)),
        }
    }

    /// The commodity a social-origin seller supplies that industries consume.
    pub fn labour_power_commodity(&self, simulation: SimulationId) -> Option<CommodityId> {
        self.commodities.iter().find_map(|(id, c)| {
            (c.simulation == simulation
                && c.origin == CommodityOrigin::Social
                && c.usage == CommodityUsage::Productive)
                .then_some(id)
        })
    }

    // === Cascading delete ===

    /// Remove a simulation and every dependent entity: commodities,
    /// industries, classes, stocks, the buyer/seller registry and traces.
    /// Cascade is explicit; nothing is left for a storage layer to clean up.
    pub fn delete_simulation(&mut self, simulation: SimulationId) -> bool {
        if self.simulations.remove(simulation).is_none() {
            return false;
        }
        self.commodities.retain(|_, c| c.simulation != simulation);
        self.industries.retain(|_, i| i.simulation != simulation);
        self.classes.retain(|_, c| c.simulation != simulation);
        self.stocks.retain(|_, s| s.simulation != simulation);
        self.traders.remove(&simulation);
        self.traces.retain(|t| t.simulation != simulation);
        true
    }

    // === Snapshot projection ===

    /// Project one simulation into a flat snapshot for rendering.
    pub fn snapshot(&self, simulation: SimulationId) -> Option<StateSnapshot> {
        let sim = self.simulations.get(simulation)?;

        let commodities = self
            .commodities_in(simulation)
            .into_iter()
            .filter_map(|id| {
                self.commodities.get(id).map(|c| CommoditySnapshot {
                    id: id.to_u64(),
                    name: c.name.clone(),
                    origin: c.origin,
                    usage: c.usage,
                    size: c.size,
                    total_value: c.total_value,
                    total_price: c.total_price,
                    unit_value: c.unit_value,
                    unit_price: c.unit_price,
                    demand: c.demand,
                    supply: c.supply,
                    allocation_ratio: c.allocation_ratio,
                })
            })
            .collect();

        let industries = self
            .industries_in(simulation)
            .into_iter()
            .filter_map(|id| {
                self.industries.get(id).map(|i| IndustrySnapshot {
                    id: id.to_u64(),
                    name: i.name.clone(),
                    output_scale: i.output_scale,
                    output_growth_rate: i.output_growth_rate,
                    initial_capital: i.initial_capital,
                    current_capital: i.current_capital,
                    profit: i.profit,
                    profit_rate: i.profit_rate,
                })
            })
            .collect();

        let classes = self
            .classes_in(simulation)
            .into_iter()
            .filter_map(|id| {
                self.classes.get(id).map(|c| ClassSnapshot {
                    id: id.to_u64(),
                    name: c.name.clone(),
                    population: c.population,
                    participation_ratio: c.participation_ratio,
                    consumption_ratio: c.consumption_ratio,
                    revenue: c.revenue,
                    assets: c.assets,
                })
            })
            .collect();

        let stocks = self
            .stocks_in(simulation)
            .into_iter()
            .filter_map(|id| {
                self.stocks.get(id).map(|s| {
                    let (owner_kind, owner_id) = match s.owner {
                        OwnerRef::Industry(i) => (OwnerKind::Industry, i.to_u64()),
                        OwnerRef::Class(c) => (OwnerKind::Class, c.to_u64()),
                    };
                    StockSnapshot {
                        id: id.to_u64(),
                        name: s.name.clone(),
                        owner_kind,
                        owner_id,
                        commodity_id: s.commodity.to_u64(),
                        usage: s.usage,
                        size: s.size,
                        value: s.value,
                        price: s.price,
                        requirement: s.requirement,
                        demand: s.demand,
                    }
                })
            })
            .collect();

        Some(StateSnapshot {
            id: simulation.to_u64(),
            name: sim.name.clone(),
            state: sim.state,
            period: sim.time_stamp,
            periods_per_year: sim.periods_per_year,
            melt: sim.melt,
            commodities,
            industries,
            classes,
            stocks,
        })
    }

    pub fn trace_log(&self, simulation: SimulationId) -> TraceLog {
        TraceLog {
            entries: self
                .traces
                .iter()
                .filter(|t| t.simulation == simulation)
                .map(|t| TraceSnapshot {
                    period: t.period,
                    level: t.level,
                    message: t.message.clone(),
                })
                .collect(),
        }
    }
}

// ============================================================================
// Serializable snapshots for JS
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Tsify)]
#[tsify(into_wasm_abi)]
pub enum OwnerKind {
    Industry,
    Class,
}

#[derive(Debug, Clone, Serialize, Deserialize, Tsify)]
#[tsify(into_wasm_abi)]
pub struct StateSnapshot {
    pub id: u64,
    pub name: String,
    pub state: CircuitState,
    pub period: u32,
    pub periods_per_year: f64,
    pub melt: f64,
    pub commodities: Vec<CommoditySnapshot>,
    pub industries: Vec<IndustrySnapshot>,
    pub classes: Vec<ClassSnapshot>,
    pub stocks: Vec<StockSnapshot>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Tsify)]
#[tsify(into_wasm_abi)]
pub struct CommoditySnapshot {
    pub id: u64,
    pub name: String,
    pub origin: CommodityOrigin,
    pub usage: CommodityUsage,
    pub size: f64,
    pub total_value: f64,
    pub total_price: f64,
    pub unit_value: f64,
    pub unit_price: f64,
    pub demand: f64,
    pub supply: f64,
    pub allocation_ratio: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, Tsify)]
#[tsify(into_wasm_abi)]
pub struct IndustrySnapshot {
    pub id: u64,
    pub name: String,
    pub output_scale: f64,
    pub output_growth_rate: f64,
    pub initial_capital: f64,
    pub current_capital: f64,
    pub profit: f64,
    pub profit_rate: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, Tsify)]
#[tsify(into_wasm_abi)]
pub struct ClassSnapshot {
    pub id: u64,
    pub name: String,
    pub population: f64,
    pub participation_ratio: f64,
    pub consumption_ratio: f64,
    pub revenue: f64,
    pub assets: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, Tsify)]
#[tsify(into_wasm_abi)]
pub struct StockSnapshot {
    pub id: u64,
    pub name: String,
    pub owner_kind: OwnerKind,
    pub owner_id: u64,
    pub commodity_id: u64,
    pub usage: StockUsage,
    pub size: f64,
    pub value: f64,
    pub price: f64,
    pub requirement: f64,
    pub demand: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, Tsify)]
#[tsify(into_wasm_abi)]
pub struct TraceSnapshot {
    pub period: u32,
    pub level: u8,
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Tsify)]
#[tsify(into_wasm_abi)]
pub struct TraceLog {
    pub entries: Vec<TraceSnapshot>,
}
