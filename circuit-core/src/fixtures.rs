// Fixture loading and template cloning. Fixtures are flat records with
// small integer ids; loading resolves those ids to arena keys through
// successor maps, exactly as cloning resolves a template's keys to the
// clone's. Nothing else is remapped - records land verbatim.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::entities::{Commodity, Industry, Simulation, SocialClass, Stock};
use crate::error::CircuitError;
use crate::state::{OwnerKind, SimState};
use crate::traders::build_registry;
use crate::types::{
    CircuitState, ClassId, CommodityId, CommodityOrigin, CommodityUsage, IndustryId, KeyToU64,
    OwnerRef, SimulationId, StockUsage,
};

// ============================================================================
// Fixture records
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FixtureSet {
    pub simulations: Vec<SimulationRecord>,
    pub commodities: Vec<CommodityRecord>,
    pub industries: Vec<IndustryRecord>,
    pub social_classes: Vec<ClassRecord>,
    pub stocks: Vec<StockRecord>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationRecord {
    pub id: u32,
    pub name: String,
    pub state: CircuitState,
    #[serde(default)]
    pub time_stamp: u32,
    pub periods_per_year: f64,
    #[serde(default)]
    pub population_growth_rate: f64,
    #[serde(default)]
    pub investment_ratio: f64,
    #[serde(default = "default_melt")]
    pub melt: f64,
}

fn default_melt() -> f64 {
    1.0
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommodityRecord {
    pub id: u32,
    pub simulation_id: u32,
    pub name: String,
    pub origin: CommodityOrigin,
    pub usage: CommodityUsage,
    pub size: f64,
    pub total_value: f64,
    pub total_price: f64,
    pub unit_value: f64,
    pub unit_price: f64,
    pub turnover_time: f64,
    #[serde(default)]
    pub demand: f64,
    #[serde(default)]
    pub supply: f64,
    #[serde(default)]
    pub allocation_ratio: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndustryRecord {
    pub id: u32,
    pub simulation_id: u32,
    pub name: String,
    pub output_scale: f64,
    pub output_growth_rate: f64,
    pub initial_capital: f64,
    #[serde(default)]
    pub current_capital: f64,
    #[serde(default)]
    pub profit: f64,
    #[serde(default)]
    pub profit_rate: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassRecord {
    pub id: u32,
    pub simulation_id: u32,
    pub name: String,
    pub population: f64,
    pub participation_ratio: f64,
    pub consumption_ratio: f64,
    #[serde(default)]
    pub revenue: f64,
    #[serde(default)]
    pub assets: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StockRecord {
    pub id: u32,
    pub simulation_id: u32,
    pub owner_type: OwnerKind,
    pub owner_id: u32,
    pub commodity_id: u32,
    pub name: String,
    pub usage_type: StockUsage,
    pub size: f64,
    pub value: f64,
    pub price: f64,
    #[serde(default)]
    pub requirement: f64,
    #[serde(default)]
    pub demand: f64,
}

// ============================================================================
// Bulk reload
// ============================================================================

/// Reload every entity table from a fixture document and rebuild the
/// buyer/seller registries. All existing rows, of every simulation, are
/// dropped first - this is the administrative reset.
pub fn load_fixtures(state: &mut SimState, json: &str) -> Result<Vec<SimulationId>, CircuitError> {
    let set: FixtureSet = serde_json::from_str(json)?;

    *state = SimState::new();

    let mut simulations: HashMap<u32, SimulationId> = HashMap::new();
    let mut loaded = Vec::new();
    for record in &set.simulations {
        let key = state.simulations.insert(Simulation {
            name: record.name.clone(),
            state: record.state,
            time_stamp: record.time_stamp,
            periods_per_year: record.periods_per_year,
            population_growth_rate: record.population_growth_rate,
            investment_ratio: record.investment_ratio,
            melt: record.melt,
        });
        if simulations.insert(record.id, key).is_some() {
            return Err(CircuitError::Fixture(format!(
                "duplicate simulation id {}",
                record.id
            )));
        }
        loaded.push(key);
    }

    let mut commodities: HashMap<u32, CommodityId> = HashMap::new();
    for record in &set.commodities {
        let simulation = resolve(&simulations, record.simulation_id, "simulation")?;
        let key = state.commodities.insert(Commodity {
            simulation,
            name: record.name.clone(),
            origin: record.origin,
            usage: record.usage,
            size: record.size,
            total_value: record.total_value,
            total_price: record.total_price,
            unit_value: record.unit_value,
            unit_price: record.unit_price,
            demand: record.demand,
            supply: record.supply,
            allocation_ratio: record.allocation_ratio,
            turnover_time: record.turnover_time,
        });
        if commodities.insert(record.id, key).is_some() {
            return Err(CircuitError::Fixture(format!(
                "duplicate commodity id {}",
                record.id
            )));
        }
    }

    let mut industries: HashMap<u32, IndustryId> = HashMap::new();
    for record in &set.industries {
        let simulation = resolve(&simulations, record.simulation_id, "simulation")?;
        let key = state.industries.insert(Industry {
            simulation,
            name: record.name.clone(),
            output_scale: record.output_scale,
            output_growth_rate: record.output_growth_rate,
            initial_capital: record.initial_capital,
            current_capital: record.current_capital,
            profit: record.profit,
            profit_rate: record.profit_rate,
        });
        if industries.insert(record.id, key).is_some() {
            return Err(CircuitError::Fixture(format!(
                "duplicate industry id {}",
                record.id
            )));
        }
    }

    let mut classes: HashMap<u32, ClassId> = HashMap::new();
    for record in &set.social_classes {
        let simulation = resolve(&simulations, record.simulation_id, "simulation")?;
        let key = state.classes.insert(SocialClass {
            simulation,
            name: record.name.clone(),
            population: record.population,
            participation_ratio: record.participation_ratio,
            consumption_ratio: record.consumption_ratio,
            revenue: record.revenue,
            assets: record.assets,
        });
        if classes.insert(record.id, key).is_some() {
            return Err(CircuitError::Fixture(format!(
                "duplicate class id {}",
                record.id
            )));
        }
    }

    for record in &set.stocks {
        let simulation = resolve(&simulations, record.simulation_id, "simulation")?;
        let owner = match record.owner_type {
            OwnerKind::Industry => {
                OwnerRef::Industry(resolve(&industries, record.owner_id, "industry")?)
            }
            OwnerKind::Class => OwnerRef::Class(resolve(&classes, record.owner_id, "class")?),
        };
        let commodity = resolve(&commodities, record.commodity_id, "commodity")?;
        state.stocks.insert(Stock {
            simulation,
            owner,
            commodity,
            name: record.name.clone(),
            usage: record.usage_type,
            size: record.size,
            value: record.value,
            price: record.price,
            requirement: record.requirement,
            demand: record.demand,
        });
    }

    for &simulation in &loaded {
        let registry = build_registry(state, simulation)?;
        state.traders.insert(simulation, registry);
    }

    Ok(loaded)
}

fn resolve<K: Copy>(
    map: &HashMap<u32, K>,
    id: u32,
    kind: &'static str,
) -> Result<K, CircuitError> {
    map.get(&id)
        .copied()
        .ok_or_else(|| CircuitError::Fixture(format!("unresolved {kind} id {id}")))
}

// ============================================================================
// Template cloning
// ============================================================================

/// Create a live simulation from a template. Every dependent entity is
/// copied under a fresh key; cross-references resolve through the
/// successor maps built as the copies land. The clone starts the circuit
/// at DEMAND with its period counter reset.
pub fn clone_simulation(
    state: &mut SimState,
    template: SimulationId,
) -> Result<SimulationId, CircuitError> {
    let source = state
        .simulations
        .get(template)
        .ok_or(CircuitError::MissingEntity {
            kind: "simulation",
            id: template.to_u64(),
        })?;
    let mut copy = source.clone();
    copy.state = CircuitState::Demand;
    copy.time_stamp = 0;
    let clone_id = state.simulations.insert(copy);

    let mut commodity_successors: HashMap<CommodityId, CommodityId> = HashMap::new();
    for commodity_id in state.commodities_in(template) {
        let mut commodity = state.commodities[commodity_id].clone();
        commodity.simulation = clone_id;
        commodity_successors.insert(commodity_id, state.commodities.insert(commodity));
    }

    let mut industry_successors: HashMap<IndustryId, IndustryId> = HashMap::new();
    for industry_id in state.industries_in(template) {
        let mut industry = state.industries[industry_id].clone();
        industry.simulation = clone_id;
        industry_successors.insert(industry_id, state.industries.insert(industry));
    }

    let mut class_successors: HashMap<ClassId, ClassId> = HashMap::new();
    for class_id in state.classes_in(template) {
        let mut class = state.classes[class_id].clone();
        class.simulation = clone_id;
        class_successors.insert(class_id, state.classes.insert(class));
    }

    for stock_id in state.stocks_in(template) {
        let mut stock = state.stocks[stock_id].clone();
        stock.simulation = clone_id;
        stock.commodity = *commodity_successors.get(&stock.commodity).ok_or(
            CircuitError::MissingEntity {
                kind: "commodity",
                id: stock.commodity.to_u64(),
            },
        )?;
        stock.owner = match stock.owner {
            OwnerRef::Industry(id) => OwnerRef::Industry(*industry_successors.get(&id).ok_or(
                CircuitError::MissingEntity {
                    kind: "industry",
                    id: id.to_u64(),
                },
            )?),
            OwnerRef::Class(id) => {
                OwnerRef::Class(*class_successors.get(&id).ok_or(
                    CircuitError::MissingEntity {
                        kind: "class",
                        id: id.to_u64(),
                    },
                )?)
            }
        };
        state.stocks.insert(stock);
    }

    let registry = build_registry(state, clone_id)?;
    state.traders.insert(clone_id, registry);

    Ok(clone_id)
}
