use wasm_bindgen::prelude::*;

mod circuit;
mod consumption;
mod demand;
mod entities;
mod error;
mod fixtures;
mod invest;
mod production;
mod state;
mod supply;
mod trace;
mod traders;
mod trade;
mod types;
mod valuation;

pub use circuit::*;
pub use consumption::*;
pub use demand::*;
pub use entities::*;
pub use error::*;
pub use fixtures::*;
pub use invest::*;
pub use production::*;
pub use state::*;
pub use supply::*;
pub use trace::report;
pub use traders::*;
pub use trade::*;
pub use types::*;
pub use valuation::*;

use slotmap::KeyData;

// ============================================================================
// WASM API - Engine
// ============================================================================

/// Command surface over the repository: one method per phase command,
/// administrative reset, template cloning, and snapshot projection. A thin
/// frontend drives the circuit through this and nothing else.
#[wasm_bindgen]
pub struct Engine {
    state: SimState,
}

#[wasm_bindgen]
impl Engine {
    #[wasm_bindgen(constructor)]
    pub fn new() -> Self {
        // Better panic messages in browser console
        console_error_panic_hook::set_once();

        Self {
            state: SimState::new(),
        }
    }

    /// Create an engine preloaded with the built-in two-department
    /// simple-reproduction scenario.
    #[wasm_bindgen]
    pub fn with_test_scenario() -> Self {
        let mut engine = Self::new();
        let loaded = fixtures::load_fixtures(&mut engine.state, TEST_SCENARIO);
        debug_assert!(loaded.is_ok(), "built-in scenario must load");
        engine
    }

    // === Phase commands ===

    #[wasm_bindgen]
    pub fn demand(&mut self, simulation: u64) -> PhaseReport {
        self.command(simulation, Command::Demand)
    }

    #[wasm_bindgen]
    pub fn supply(&mut self, simulation: u64) -> PhaseReport {
        self.command(simulation, Command::Supply)
    }

    #[wasm_bindgen]
    pub fn trade(&mut self, simulation: u64) -> PhaseReport {
        self.command(simulation, Command::Trade)
    }

    #[wasm_bindgen]
    pub fn produce(&mut self, simulation: u64) -> PhaseReport {
        self.command(simulation, Command::Produce)
    }

    #[wasm_bindgen]
    pub fn consume(&mut self, simulation: u64) -> PhaseReport {
        self.command(simulation, Command::Consume)
    }

    #[wasm_bindgen]
    pub fn invest(&mut self, simulation: u64) -> PhaseReport {
        self.command(simulation, Command::Invest)
    }

    // === Administration ===

    /// Reload every table from a fixture document and rebuild the derived
    /// buyer/seller registries. Drops all existing simulations.
    #[wasm_bindgen]
    pub fn reset(&mut self, fixture_json: &str) -> PhaseReport {
        match fixtures::load_fixtures(&mut self.state, fixture_json) {
            Ok(loaded) => PhaseReport::complete(format!(
                "Database reloaded with {} simulation(s)",
                loaded.len()
            )),
            Err(err) => PhaseReport::failed(err.to_string()),
        }
    }

    /// Create a live simulation from a template. Returns the new id, or
    /// None when the id is unknown or does not name a template.
    #[wasm_bindgen]
    pub fn clone_template(&mut self, template: u64) -> Option<u64> {
        let template = self.lookup(template)?;
        if self.state.simulations.get(template)?.state != CircuitState::Template {
            return None;
        }
        fixtures::clone_simulation(&mut self.state, template)
            .ok()
            .map(KeyToU64::to_u64)
    }

    #[wasm_bindgen]
    pub fn delete_simulation(&mut self, simulation: u64) -> bool {
        match self.lookup(simulation) {
            Some(id) => self.state.delete_simulation(id),
            None => false,
        }
    }

    // === Projections ===

    #[wasm_bindgen]
    pub fn templates(&self) -> Vec<u64> {
        self.state
            .simulations
            .iter()
            .filter(|(_, s)| s.state == CircuitState::Template)
            .map(|(id, _)| id.to_u64())
            .collect()
    }

    #[wasm_bindgen]
    pub fn simulations(&self) -> Vec<u64> {
        self.state
            .simulations
            .iter()
            .filter(|(_, s)| s.state != CircuitState::Template)
            .map(|(id, _)| id.to_u64())
            .collect()
    }

    #[wasm_bindgen]
    pub fn get_state_snapshot(&self, simulation: u64) -> Option<StateSnapshot> {
        self.state.snapshot(self.lookup(simulation)?)
    }

    #[wasm_bindgen]
    pub fn get_traces(&self, simulation: u64) -> TraceLog {
        match self.lookup(simulation) {
            Some(id) => self.state.trace_log(id),
            None => TraceLog {
                entries: Vec::new(),
            },
        }
    }
}

impl Engine {
    fn command(&mut self, simulation: u64, command: Command) -> PhaseReport {
        match self.lookup(simulation) {
            Some(id) => circuit::advance(&mut self.state, id, command),
            None => PhaseReport::rejected(format!("unknown simulation {simulation}")),
        }
    }

    fn lookup(&self, simulation: u64) -> Option<SimulationId> {
        let key = SimulationId::from(KeyData::from_ffi(simulation));
        self.state.simulations.contains_key(key).then_some(key)
    }

    /// Direct repository access for embedding and tests.
    pub fn state(&self) -> &SimState {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut SimState {
        &mut self.state
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Built-in scenario - two-department simple reproduction
// ============================================================================

/// A closed two-department economy tuned for simple reproduction: at unit
/// values and prices of 1, one full circuit reproduces every stock and
/// leaves both departments with zero profit.
pub const TEST_SCENARIO: &str = r#"{
  "simulations": [
    {
      "id": 1,
      "name": "Simple Reproduction",
      "state": "Template",
      "periods_per_year": 1.0,
      "population_growth_rate": 0.04,
      "investment_ratio": 0.5,
      "melt": 1.0
    }
  ],
  "commodities": [
    {
      "id": 1, "simulation_id": 1, "name": "Means of Production",
      "origin": "Industrial", "usage": "Productive",
      "size": 50.0, "total_value": 50.0, "total_price": 50.0,
      "unit_value": 1.0, "unit_price": 1.0, "turnover_time": 1.0
    },
    {
      "id": 2, "simulation_id": 1, "name": "Necessities",
      "origin": "Industrial", "usage": "Consumption",
      "size": 50.0, "total_value": 50.0, "total_price": 50.0,
      "unit_value": 1.0, "unit_price": 1.0, "turnover_time": 1.0
    },
    {
      "id": 3, "simulation_id": 1, "name": "Labour Power",
      "origin": "Social", "usage": "Productive",
      "size": 50.0, "total_value": 50.0, "total_price": 50.0,
      "unit_value": 1.0, "unit_price": 1.0, "turnover_time": 1.0
    },
    {
      "id": 4, "simulation_id": 1, "name": "Services",
      "origin": "Social", "usage": "Consumption",
      "size": 10.0, "total_value": 10.0, "total_price": 10.0,
      "unit_value": 1.0, "unit_price": 1.0, "turnover_time": 1.0
    },
    {
      "id": 5, "simulation_id": 1, "name": "Money",
      "origin": "Money", "usage": "Money",
      "size": 350.0, "total_value": 350.0, "total_price": 350.0,
      "unit_value": 1.0, "unit_price": 1.0, "turnover_time": 1.0
    }
  ],
  "industries": [
    {
      "id": 1, "simulation_id": 1, "name": "Department I",
      "output_scale": 50.0, "output_growth_rate": 0.1, "initial_capital": 150.0
    },
    {
      "id": 2, "simulation_id": 1, "name": "Department II",
      "output_scale": 50.0, "output_growth_rate": 0.1, "initial_capital": 150.0
    }
  ],
  "social_classes": [
    {
      "id": 1, "simulation_id": 1, "name": "Workers",
      "population": 50.0, "participation_ratio": 1.0, "consumption_ratio": 1.0
    },
    {
      "id": 2, "simulation_id": 1, "name": "Capitalists",
      "population": 10.0, "participation_ratio": 1.0, "consumption_ratio": 0.5
    }
  ],
  "stocks": [
    { "id": 1, "simulation_id": 1, "owner_type": "Industry", "owner_id": 1, "commodity_id": 1,
      "name": "Department I.Means of Production.Sales", "usage_type": "Sales",
      "size": 50.0, "value": 50.0, "price": 50.0 },
    { "id": 2, "simulation_id": 1, "owner_type": "Industry", "owner_id": 1, "commodity_id": 5,
      "name": "Department I.Money", "usage_type": "Money",
      "size": 100.0, "value": 100.0, "price": 100.0 },
    { "id": 3, "simulation_id": 1, "owner_type": "Industry", "owner_id": 1, "commodity_id": 1,
      "name": "Department I.Means of Production.Production", "usage_type": "Production",
      "size": 0.0, "value": 0.0, "price": 0.0, "requirement": 0.5 },
    { "id": 4, "simulation_id": 1, "owner_type": "Industry", "owner_id": 1, "commodity_id": 3,
      "name": "Department I.Labour Power.Production", "usage_type": "Production",
      "size": 0.0, "value": 0.0, "price": 0.0, "requirement": 0.5 },
    { "id": 5, "simulation_id": 1, "owner_type": "Industry", "owner_id": 2, "commodity_id": 2,
      "name": "Department II.Necessities.Sales", "usage_type": "Sales",
      "size": 50.0, "value": 50.0, "price": 50.0 },
    { "id": 6, "simulation_id": 1, "owner_type": "Industry", "owner_id": 2, "commodity_id": 5,
      "name": "Department II.Money", "usage_type": "Money",
      "size": 100.0, "value": 100.0, "price": 100.0 },
    { "id": 7, "simulation_id": 1, "owner_type": "Industry", "owner_id": 2, "commodity_id": 1,
      "name": "Department II.Means of Production.Production", "usage_type": "Production",
      "size": 0.0, "value": 0.0, "price": 0.0, "requirement": 0.5 },
    { "id": 8, "simulation_id": 1, "owner_type": "Industry", "owner_id": 2, "commodity_id": 3,
      "name": "Department II.Labour Power.Production", "usage_type": "Production",
      "size": 0.0, "value": 0.0, "price": 0.0, "requirement": 0.5 },
    { "id": 9, "simulation_id": 1, "owner_type": "Class", "owner_id": 1, "commodity_id": 3,
      "name": "Workers.Labour Power.Sales", "usage_type": "Sales",
      "size": 50.0, "value": 50.0, "price": 50.0 },
    { "id": 10, "simulation_id": 1, "owner_type": "Class", "owner_id": 1, "commodity_id": 5,
      "name": "Workers.Money", "usage_type": "Money",
      "size": 50.0, "value": 50.0, "price": 50.0 },
    { "id": 11, "simulation_id": 1, "owner_type": "Class", "owner_id": 1, "commodity_id": 2,
      "name": "Workers.Necessities.Consumption", "usage_type": "Consumption",
      "size": 0.0, "value": 0.0, "price": 0.0, "requirement": 1.0 },
    { "id": 12, "simulation_id": 1, "owner_type": "Class", "owner_id": 2, "commodity_id": 4,
      "name": "Capitalists.Services.Sales", "usage_type": "Sales",
      "size": 10.0, "value": 10.0, "price": 10.0 },
    { "id": 13, "simulation_id": 1, "owner_type": "Class", "owner_id": 2, "commodity_id": 5,
      "name": "Capitalists.Money", "usage_type": "Money",
      "size": 100.0, "value": 100.0, "price": 100.0 }
  ]
}"#;

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    /// Helper to sum all money stock sizes in one simulation
    fn total_money(engine: &Engine, simulation: u64) -> f64 {
        engine
            .get_state_snapshot(simulation)
            .map(|snap| {
                snap.stocks
                    .iter()
                    .filter(|s| s.usage == StockUsage::Money)
                    .map(|s| s.size)
                    .sum()
            })
            .unwrap_or(0.0)
    }

    fn run_full_circuit(engine: &mut Engine, simulation: u64) {
        for (name, report) in [
            ("demand", engine.demand(simulation)),
            ("supply", engine.supply(simulation)),
            ("trade", engine.trade(simulation)),
            ("produce", engine.produce(simulation)),
            ("consume", engine.consume(simulation)),
            ("invest", engine.invest(simulation)),
        ] {
            assert_eq!(
                report.status,
                PhaseStatus::Complete,
                "{name} should complete: {}",
                report.message
            );
        }
    }

    #[test]
    fn test_scenario_loads() {
        let engine = Engine::with_test_scenario();
        let templates = engine.templates();
        assert_eq!(templates.len(), 1);

        let snap = engine.get_state_snapshot(templates[0]).unwrap();
        assert_eq!(snap.state, CircuitState::Template);
        assert_eq!(snap.commodities.len(), 5);
        assert_eq!(snap.industries.len(), 2);
        assert_eq!(snap.classes.len(), 2);
        assert_eq!(snap.stocks.len(), 13);
    }

    #[test]
    fn test_template_never_advances() {
        let mut engine = Engine::with_test_scenario();
        let template = engine.templates()[0];

        let report = engine.demand(template);
        assert_eq!(report.status, PhaseStatus::Rejected);

        let snap = engine.get_state_snapshot(template).unwrap();
        assert_eq!(snap.state, CircuitState::Template);
        assert_eq!(snap.period, 0);
    }

    #[test]
    fn test_clone_starts_at_demand() {
        let mut engine = Engine::with_test_scenario();
        let template = engine.templates()[0];
        let live = engine.clone_template(template).unwrap();

        assert_ne!(live, template);
        let snap = engine.get_state_snapshot(live).unwrap();
        assert_eq!(snap.state, CircuitState::Demand);
        assert_eq!(snap.stocks.len(), 13);
        assert_eq!(engine.simulations(), vec![live]);
    }

    #[test]
    fn test_out_of_turn_command_is_rejected_without_mutation() {
        let mut engine = Engine::with_test_scenario();
        let template = engine.templates()[0];
        let live = engine.clone_template(template).unwrap();

        let before = engine.get_state_snapshot(live).unwrap();
        let report = engine.trade(live);
        assert_eq!(report.status, PhaseStatus::Rejected);

        let after = engine.get_state_snapshot(live).unwrap();
        assert_eq!(after.state, CircuitState::Demand);
        for (b, a) in before.stocks.iter().zip(after.stocks.iter()) {
            assert_eq!(b.size, a.size, "stock {} changed on rejection", b.name);
            assert_eq!(b.demand, a.demand, "stock {} changed on rejection", b.name);
        }
    }

    #[test]
    fn test_full_circuit_returns_to_demand() {
        let mut engine = Engine::with_test_scenario();
        let template = engine.templates()[0];
        let live = engine.clone_template(template).unwrap();

        run_full_circuit(&mut engine, live);

        let snap = engine.get_state_snapshot(live).unwrap();
        assert_eq!(snap.state, CircuitState::Demand);
        assert_eq!(snap.period, 1);
    }

    #[test]
    fn test_money_conserved_over_circuit() {
        let mut engine = Engine::with_test_scenario();
        let template = engine.templates()[0];
        let live = engine.clone_template(template).unwrap();

        let before = total_money(&engine, live);
        run_full_circuit(&mut engine, live);
        let after = total_money(&engine, live);

        assert!(
            (before - after).abs() < 1e-9,
            "money should be conserved: before={before}, after={after}"
        );
    }

    #[test]
    fn test_reset_replaces_all_simulations() {
        let mut engine = Engine::with_test_scenario();
        let template = engine.templates()[0];
        engine.clone_template(template).unwrap();

        let report = engine.reset(TEST_SCENARIO);
        assert_eq!(report.status, PhaseStatus::Complete);
        assert_eq!(engine.templates().len(), 1);
        assert!(engine.simulations().is_empty());
    }

    #[test]
    fn test_reset_rejects_malformed_fixture() {
        let mut engine = Engine::with_test_scenario();
        let report = engine.reset("{ not json");
        assert_eq!(report.status, PhaseStatus::Failed);
        // The old state survives a failed reset attempt only if nothing
        // was parsed; a parse failure happens before any mutation.
        assert_eq!(engine.templates().len(), 1);
    }

    #[test]
    fn test_traces_accumulate_per_simulation() {
        let mut engine = Engine::with_test_scenario();
        let template = engine.templates()[0];
        let live = engine.clone_template(template).unwrap();

        assert!(engine.get_traces(live).entries.is_empty());
        engine.demand(live);
        let log = engine.get_traces(live);
        assert!(!log.entries.is_empty());
        assert!(log.entries.iter().all(|e| e.period == 1));
        assert!(engine.get_traces(template).entries.is_empty());
    }
}
