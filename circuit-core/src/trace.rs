// Phase narration. Entries land in the repository's trace ledger so the
// caller can show the user what a phase did; when the `instrument` feature
// is on they are mirrored as tracing events for offline analysis.

use crate::entities::Trace;
use crate::state::SimState;
use crate::types::SimulationId;

#[cfg(feature = "instrument")]
use crate::types::KeyToU64;

pub fn report(
    state: &mut SimState,
    simulation: SimulationId,
    level: u8,
    message: impl Into<String>,
) {
    let message = message.into();
    let period = state
        .simulations
        .get(simulation)
        .map(|s| s.time_stamp)
        .unwrap_or(0);

    #[cfg(feature = "instrument")]
    tracing::info!(
        target: "circuit",
        simulation_id = simulation.to_u64(),
        period = period,
        level = level,
        message = %message,
    );

    state.traces.push(Trace {
        simulation,
        period,
        level,
        message,
    });
}
