// The circuit controller. One external trigger executes exactly one
// phase, then advances the simulation to the next state in the circuit:
// DEMAND -> SUPPLY -> TRADE -> PRODUCE -> CONSUME -> INVEST -> DEMAND.
// There is no skip-ahead and no rollback.

use serde::{Deserialize, Serialize};
use tsify_next::Tsify;

use crate::consumption::consume;
use crate::demand::{class_demand, commodity_demand, industry_demand, initialise_demand};
use crate::error::CircuitError;
use crate::invest::invest;
use crate::production::produce;
use crate::state::SimState;
use crate::supply::{class_supply, industry_supply, initialise_supply};
use crate::trade::{buy_and_sell, constrain_demand};
use crate::types::{CircuitState, SimulationId};
use crate::valuation::{
    calculate_current_capitals, recalculate_commodity_totals, revalue_commodities, revalue_stocks,
};

// ============================================================================
// Commands and phase reports
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Command {
    Demand,
    Supply,
    Trade,
    Produce,
    Consume,
    Invest,
}

impl Command {
    /// The state a simulation must be in for this command to run.
    pub fn expects(self) -> CircuitState {
        match self {
            Command::Demand => CircuitState::Demand,
            Command::Supply => CircuitState::Supply,
            Command::Trade => CircuitState::Trade,
            Command::Produce => CircuitState::Produce,
            Command::Consume => CircuitState::Consume,
            Command::Invest => CircuitState::Invest,
        }
    }

    /// The state the simulation moves to once this command completes.
    pub fn next(self) -> CircuitState {
        match self {
            Command::Demand => CircuitState::Supply,
            Command::Supply => CircuitState::Trade,
            Command::Trade => CircuitState::Produce,
            Command::Produce => CircuitState::Consume,
            Command::Consume => CircuitState::Invest,
            Command::Invest => CircuitState::Demand,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Command::Demand => "demand",
            Command::Supply => "supply",
            Command::Trade => "trade",
            Command::Produce => "produce",
            Command::Consume => "consume",
            Command::Invest => "invest",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Tsify)]
#[tsify(into_wasm_abi)]
pub enum PhaseStatus {
    Complete,
    /// Out of turn, templates, unknown simulations. Nothing was mutated.
    Rejected,
    /// The phase aborted; none of its mutations were committed.
    Failed,
}

#[derive(Debug, Clone, Serialize, Deserialize, Tsify)]
#[tsify(into_wasm_abi)]
pub struct PhaseReport {
    pub status: PhaseStatus,
    pub message: String,
}

impl PhaseReport {
    pub fn complete(message: impl Into<String>) -> Self {
        Self {
            status: PhaseStatus::Complete,
            message: message.into(),
        }
    }

    pub fn rejected(message: impl Into<String>) -> Self {
        Self {
            status: PhaseStatus::Rejected,
            message: message.into(),
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            status: PhaseStatus::Failed,
            message: message.into(),
        }
    }
}

// ============================================================================
// Phase execution
// ============================================================================

/// Execute one phase command against one simulation.
///
/// A command received while the simulation is a template, or out of turn,
/// is rejected without mutating anything. A completed phase commits as a
/// whole; a failed one commits nothing - the phase runs against a scratch
/// copy of the repository that only replaces the live state on success.
pub fn advance(state: &mut SimState, simulation: SimulationId, command: Command) -> PhaseReport {
    let Some(sim) = state.simulations.get(simulation) else {
        return PhaseReport::rejected("unknown simulation");
    };
    if sim.state != command.expects() {
        return PhaseReport::rejected(format!(
            "'{}' is out of turn: simulation '{}' is at {:?}",
            command.name(),
            sim.name,
            sim.state
        ));
    }

    let mut tx = state.clone();
    match run_phase(&mut tx, simulation, command) {
        Ok(message) => {
            if let Some(sim) = tx.simulations.get_mut(simulation) {
                sim.state = command.next();
            }
            *state = tx;
            PhaseReport::complete(message)
        }
        Err(err) => PhaseReport::failed(err.to_string()),
    }
}

fn run_phase(
    state: &mut SimState,
    simulation: SimulationId,
    command: Command,
) -> Result<&'static str, CircuitError> {
    match command {
        Command::Demand => {
            // A demand trigger opens the next period.
            if let Some(sim) = state.simulations.get_mut(simulation) {
                sim.time_stamp += 1;
            }
            initialise_demand(state, simulation);
            industry_demand(state, simulation);
            class_demand(state, simulation);
            commodity_demand(state, simulation);
            Ok("Demand initialised")
        }
        Command::Supply => {
            initialise_supply(state, simulation);
            industry_supply(state, simulation)?;
            class_supply(state, simulation)?;
            Ok("Supply initialised")
        }
        Command::Trade => {
            constrain_demand(state, simulation);
            buy_and_sell(state, simulation)?;
            Ok("Trading complete")
        }
        Command::Produce => {
            produce(state, simulation)?;
            // Totals and capitals are restated to show the independent
            // effect of production; unit magnitudes wait for consumption,
            // when classes have restored their sales stocks.
            recalculate_commodity_totals(state, simulation);
            calculate_current_capitals(state, simulation);
            Ok("Production complete")
        }
        Command::Consume => {
            consume(state, simulation)?;
            recalculate_commodity_totals(state, simulation);
            revalue_commodities(state, simulation);
            revalue_stocks(state, simulation);
            calculate_current_capitals(state, simulation);
            Ok("Consumption complete")
        }
        Command::Invest => {
            invest(state, simulation)?;
            Ok("Investment decision-making complete")
        }
    }
}
