use serde::{Deserialize, Serialize};

use crate::types::{
    CircuitState, ClassId, CommodityId, CommodityOrigin, CommodityUsage, OwnerRef, Price, Quantity,
    SimulationId, StockUsage, Value,
};

// ============================================================================
// Simulation - One closed economy advancing through the circuit
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Simulation {
    pub name: String,
    pub state: CircuitState,
    /// Completed-period counter; bumped when a demand phase opens a period.
    pub time_stamp: u32,
    pub periods_per_year: f64,
    pub population_growth_rate: f64,
    pub investment_ratio: f64,
    /// Monetary expression of labour time. Placeholder constant for now:
    /// money stocks are kept at value == price == size.
    pub melt: f64,
}

// ============================================================================
// Commodity - Aggregate ledger over all stocks of one kind
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Commodity {
    pub simulation: SimulationId,
    pub name: String,
    pub origin: CommodityOrigin,
    pub usage: CommodityUsage,
    // Aggregates, derived from stocks; recomputed, not maintained live.
    pub size: Quantity,
    pub total_value: Value,
    pub total_price: Price,
    pub unit_value: Value,
    pub unit_price: Price,
    pub demand: Quantity,
    pub supply: Quantity,
    /// Fraction of demand satisfiable given supply; set by rationing.
    pub allocation_ratio: f64,
    pub turnover_time: f64,
}

// ============================================================================
// Industry - Produces one commodity from productive stocks
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Industry {
    pub simulation: SimulationId,
    pub name: String,
    pub output_scale: Quantity,
    pub output_growth_rate: f64,
    pub initial_capital: Value,
    pub current_capital: Value,
    pub profit: Value,
    pub profit_rate: f64,
}

// ============================================================================
// SocialClass - Reproduces itself from consumption stocks
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SocialClass {
    pub simulation: SimulationId,
    pub name: String,
    pub population: f64,
    pub participation_ratio: f64,
    pub consumption_ratio: f64,
    pub revenue: Value,
    pub assets: Value,
}

// ============================================================================
// Stock - A quantity of one commodity held by one owner for one purpose
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Stock {
    pub simulation: SimulationId,
    pub owner: OwnerRef,
    pub commodity: CommodityId,
    /// Owner.Name + Commodity.Name + usage, for traces and snapshots.
    pub name: String,
    pub usage: StockUsage,
    pub size: Quantity,
    pub value: Value,
    pub price: Price,
    /// Per-unit-of-output (production) or per-capita (consumption) need.
    pub requirement: f64,
    pub demand: Quantity,
}

// ============================================================================
// Trace - Narration of phase work, kept per simulation
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Trace {
    pub simulation: SimulationId,
    /// Period the entry was written in (simulation time_stamp).
    pub period: u32,
    /// Nesting depth: 1 = phase headline, deeper = per-entity detail.
    pub level: u8,
    pub message: String,
}
