use circuit_core::{
    CircuitState, CommodityOrigin, CommodityUsage, Engine, KeyToU64, OwnerRef, PhaseStatus,
    SimState, Simulation, SimulationId, SocialClass, Stock, StockUsage, invest,
};

// === HELPERS ===

fn clone_scenario(engine: &mut Engine) -> u64 {
    let template = engine.templates()[0];
    engine.clone_template(template).unwrap()
}

fn run_full_circuit(engine: &mut Engine, simulation: u64) {
    for report in [
        engine.demand(simulation),
        engine.supply(simulation),
        engine.trade(simulation),
        engine.produce(simulation),
        engine.consume(simulation),
        engine.invest(simulation),
    ] {
        assert_eq!(
            report.status,
            PhaseStatus::Complete,
            "phase should complete: {}",
            report.message
        );
    }
}

/// The live (non-template) simulation key inside the engine's repository.
fn live_simulation(engine: &Engine) -> SimulationId {
    engine
        .state()
        .simulations
        .iter()
        .find(|(_, s)| s.state != CircuitState::Template)
        .map(|(id, _)| id)
        .unwrap()
}

// === FULL CIRCUIT ===

#[test]
fn simple_reproduction_circuit_reproduces_the_economy() {
    let mut engine = Engine::with_test_scenario();
    let live = clone_scenario(&mut engine);

    run_full_circuit(&mut engine, live);

    let snap = engine.get_state_snapshot(live).unwrap();

    // Unit magnitudes are stable at 1 under simple reproduction.
    for commodity in &snap.commodities {
        assert!(
            (commodity.unit_value - 1.0).abs() < 1e-9,
            "{} unit value drifted to {}",
            commodity.name,
            commodity.unit_value
        );
        assert!(
            (commodity.unit_price - 1.0).abs() < 1e-9,
            "{} unit price drifted to {}",
            commodity.name,
            commodity.unit_price
        );
    }

    // Neither department makes a profit.
    for industry in &snap.industries {
        assert!(
            industry.profit.abs() < 1e-9,
            "{} made profit {} under simple reproduction",
            industry.name,
            industry.profit
        );
        assert!(
            (industry.current_capital - industry.initial_capital).abs() < 1e-9,
            "{} capital changed",
            industry.name
        );
    }

    // Workers bought and ate exactly one period of necessities, and put
    // their full labour power back on offer.
    let workers_consumption = snap
        .stocks
        .iter()
        .find(|s| s.usage == StockUsage::Consumption)
        .unwrap();
    assert!(workers_consumption.size.abs() < 1e-9);
    let labour_sales = snap
        .stocks
        .iter()
        .find(|s| s.name == "Workers.Labour Power.Sales")
        .unwrap();
    assert_eq!(labour_sales.size, 50.0);

    // Money is conserved across the whole circuit.
    let total_money: f64 = snap
        .stocks
        .iter()
        .filter(|s| s.usage == StockUsage::Money)
        .map(|s| s.size)
        .sum();
    assert!((total_money - 350.0).abs() < 1e-9);

    // With zero profit, growth is financed from idle money up to the
    // target growth rate.
    for industry in &snap.industries {
        assert!(
            (industry.output_scale - 55.0).abs() < 1e-9,
            "{} should grow to 55, got {}",
            industry.name,
            industry.output_scale
        );
    }
}

#[test]
fn scarcity_in_the_second_period_rations_labour_power() {
    let mut engine = Engine::with_test_scenario();
    let live = clone_scenario(&mut engine);

    run_full_circuit(&mut engine, live);

    // Period 2: both departments now want 55 of labour power, but the
    // workers still only supply 50.
    assert_eq!(engine.demand(live).status, PhaseStatus::Complete);
    assert_eq!(engine.supply(live).status, PhaseStatus::Complete);
    assert_eq!(engine.trade(live).status, PhaseStatus::Complete);

    let snap = engine.get_state_snapshot(live).unwrap();
    let labour = snap
        .commodities
        .iter()
        .find(|c| c.name == "Labour Power")
        .unwrap();
    let expected = 50.0 / 55.0;
    assert!(
        (labour.allocation_ratio - expected).abs() < 1e-12,
        "labour power should be rationed to {expected}, got {}",
        labour.allocation_ratio
    );
    assert!(
        (labour.demand - 50.0).abs() < 1e-9,
        "constrained demand should equal supply"
    );
}

// === SEQUENCING ===

#[test]
fn each_command_runs_exactly_once_per_circuit() {
    let mut engine = Engine::with_test_scenario();
    let live = clone_scenario(&mut engine);

    assert_eq!(engine.demand(live).status, PhaseStatus::Complete);
    let repeat = engine.demand(live);
    assert_eq!(repeat.status, PhaseStatus::Rejected);
    assert!(
        repeat.message.contains("out of turn"),
        "rejection should say why: {}",
        repeat.message
    );

    let snap = engine.get_state_snapshot(live).unwrap();
    assert_eq!(snap.state, CircuitState::Supply);
    assert_eq!(snap.period, 1, "a rejected trigger must not open a period");
}

#[test]
fn unknown_simulation_is_rejected() {
    let mut engine = Engine::with_test_scenario();
    let report = engine.demand(0xdead_beef);
    assert_eq!(report.status, PhaseStatus::Rejected);
}

// === ATOMICITY ===

#[test]
fn failed_supply_phase_commits_nothing() {
    let mut engine = Engine::with_test_scenario();
    let live = clone_scenario(&mut engine);
    assert_eq!(engine.demand(live).status, PhaseStatus::Complete);

    // Strip the workers of their sales stock: class supply must now fail.
    let sim = live_simulation(&engine);
    let workers_sales = engine
        .state()
        .stocks
        .iter()
        .find(|(_, s)| {
            s.simulation == sim
                && s.usage == StockUsage::Sales
                && matches!(s.owner, OwnerRef::Class(_))
                && s.name.starts_with("Workers")
        })
        .map(|(id, _)| id)
        .unwrap();
    engine.state_mut().stocks.remove(workers_sales);

    let report = engine.supply(live);
    assert_eq!(report.status, PhaseStatus::Failed);
    assert!(
        report.message.contains("has no sales stock"),
        "failure should name the missing stock: {}",
        report.message
    );

    // Nothing from the half-run phase leaked out: industry supply had
    // already been registered in the scratch state, but the live one
    // still shows the pre-phase figures and has not advanced.
    let snap = engine.get_state_snapshot(live).unwrap();
    assert_eq!(snap.state, CircuitState::Supply);
    for commodity in &snap.commodities {
        assert_eq!(
            commodity.supply, 0.0,
            "{} supply leaked from a failed phase",
            commodity.name
        );
    }
}

// === DELETION ===

#[test]
fn deleting_a_simulation_cascades_to_every_dependent() {
    let mut engine = Engine::with_test_scenario();
    let first = clone_scenario(&mut engine);
    let second = clone_scenario(&mut engine);
    engine.demand(first);
    engine.demand(second);

    let first_key = engine
        .state()
        .simulations
        .iter()
        .find(|(id, _)| id.to_u64() == first)
        .map(|(id, _)| id)
        .unwrap();

    assert!(engine.delete_simulation(first));

    let state = engine.state();
    assert!(state.commodities_in(first_key).is_empty());
    assert!(state.industries_in(first_key).is_empty());
    assert!(state.classes_in(first_key).is_empty());
    assert!(state.stocks_in(first_key).is_empty());
    assert!(!state.traders.contains_key(&first_key));
    assert!(state.traces.iter().all(|t| t.simulation != first_key));

    // The sibling simulation and the template are untouched.
    let snap = engine.get_state_snapshot(second).unwrap();
    assert_eq!(snap.stocks.len(), 13);
    assert!(!engine.get_traces(second).entries.is_empty());
    assert_eq!(engine.templates().len(), 1);

    assert!(!engine.delete_simulation(first), "double delete is a no-op");
}

// === INVESTMENT ===

fn investment_world(money: f64, growth_rate: f64) -> (SimState, SimulationId, circuit_core::IndustryId) {
    let mut state = SimState::new();
    let sim = state.simulations.insert(Simulation {
        name: "invest".to_string(),
        state: CircuitState::Invest,
        time_stamp: 1,
        periods_per_year: 1.0,
        population_growth_rate: 0.0,
        investment_ratio: 0.0,
        melt: 1.0,
    });
    let input = state.commodities.insert(circuit_core::Commodity {
        simulation: sim,
        name: "Input".to_string(),
        origin: CommodityOrigin::Industrial,
        usage: CommodityUsage::Productive,
        size: 0.0,
        total_value: 0.0,
        total_price: 0.0,
        unit_value: 1.0,
        unit_price: 1.0,
        demand: 0.0,
        supply: 0.0,
        allocation_ratio: 0.0,
        turnover_time: 1.0,
    });
    let cash = state.commodities.insert(circuit_core::Commodity {
        simulation: sim,
        name: "Money".to_string(),
        origin: CommodityOrigin::Money,
        usage: CommodityUsage::Money,
        size: 0.0,
        total_value: 0.0,
        total_price: 0.0,
        unit_value: 1.0,
        unit_price: 1.0,
        demand: 0.0,
        supply: 0.0,
        allocation_ratio: 0.0,
        turnover_time: 1.0,
    });
    let industry = state.industries.insert(circuit_core::Industry {
        simulation: sim,
        name: "Factory".to_string(),
        output_scale: 10.0,
        output_growth_rate: growth_rate,
        initial_capital: 0.0,
        current_capital: 0.0,
        profit: 0.0,
        profit_rate: 0.0,
    });
    let owner = OwnerRef::Industry(industry);
    state.stocks.insert(Stock {
        simulation: sim,
        owner,
        commodity: input,
        name: "Factory.Input.Production".to_string(),
        usage: StockUsage::Production,
        size: 0.0,
        value: 0.0,
        price: 0.0,
        requirement: 1.0,
        demand: 0.0,
    });
    state.stocks.insert(Stock {
        simulation: sim,
        owner,
        commodity: cash,
        name: "Factory.Money".to_string(),
        usage: StockUsage::Money,
        size: money,
        value: money,
        price: money,
        requirement: 0.0,
        demand: 0.0,
    });
    (state, sim, industry)
}

#[test]
fn growth_is_capped_by_the_target_rate_when_money_is_plentiful() {
    // unit cost 1, cost 10, money 100: affordable growth far exceeds the
    // 10% target, so the target wins.
    let (mut state, sim, industry) = investment_world(100.0, 0.1);

    invest(&mut state, sim).unwrap();

    let scale = state.industries[industry].output_scale;
    assert!(
        (scale - 11.0).abs() < 1e-9,
        "expected scale 11, got {scale}"
    );
}

#[test]
fn growth_is_capped_by_spare_money_when_it_is_scarce() {
    // money 12 leaves spare 2 over the cost of 10: monetary growth 0.2
    // beats the 50% target.
    let (mut state, sim, industry) = investment_world(12.0, 0.5);

    invest(&mut state, sim).unwrap();

    let scale = state.industries[industry].output_scale;
    assert!(
        (scale - 12.0).abs() < 1e-9,
        "expected scale 12, got {scale}"
    );
}

#[test]
fn profit_payout_moves_money_to_the_owning_class() {
    let (mut state, sim, industry) = investment_world(100.0, 0.0);
    if let Some(record) = state.industries.get_mut(industry) {
        record.profit = 40.0;
    }
    // An owning class with its own sales and money stocks.
    let services = state.commodities.insert(circuit_core::Commodity {
        simulation: sim,
        name: "Services".to_string(),
        origin: CommodityOrigin::Social,
        usage: CommodityUsage::Consumption,
        size: 0.0,
        total_value: 0.0,
        total_price: 0.0,
        unit_value: 1.0,
        unit_price: 1.0,
        demand: 0.0,
        supply: 0.0,
        allocation_ratio: 0.0,
        turnover_time: 1.0,
    });
    let cash = state
        .commodities
        .iter()
        .find(|(_, c)| c.usage == CommodityUsage::Money)
        .map(|(id, _)| id)
        .unwrap();
    let owners = state.classes.insert(SocialClass {
        simulation: sim,
        name: "Capitalists".to_string(),
        population: 10.0,
        participation_ratio: 1.0,
        consumption_ratio: 0.25,
        revenue: 0.0,
        assets: 0.0,
    });
    state.stocks.insert(Stock {
        simulation: sim,
        owner: OwnerRef::Class(owners),
        commodity: services,
        name: "Capitalists.Services.Sales".to_string(),
        usage: StockUsage::Sales,
        size: 10.0,
        value: 10.0,
        price: 10.0,
        requirement: 0.0,
        demand: 0.0,
    });
    let owners_money = state.stocks.insert(Stock {
        simulation: sim,
        owner: OwnerRef::Class(owners),
        commodity: cash,
        name: "Capitalists.Money".to_string(),
        usage: StockUsage::Money,
        size: 10.0,
        value: 10.0,
        price: 10.0,
        requirement: 0.0,
        demand: 0.0,
    });

    invest(&mut state, sim).unwrap();

    // 0.25 of the 40 profit moves across.
    assert_eq!(state.stocks[owners_money].size, 20.0);
    let factory_money = state
        .stocks
        .iter()
        .find(|(_, s)| s.name == "Factory.Money")
        .map(|(_, s)| s.size)
        .unwrap();
    assert_eq!(factory_money, 90.0);
}
