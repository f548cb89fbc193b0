use serde::{Deserialize, Serialize};
use slotmap::new_key_type;
use tsify_next::Tsify;

// ============================================================================
// IDs - Using slotmap for generational indices
// ============================================================================

new_key_type! {
    pub struct SimulationId;
    pub struct CommodityId;
    pub struct IndustryId;
    pub struct ClassId;
    pub struct StockId;
}

/// Trait for converting SlotMap keys to u64 for the WASM boundary
pub trait KeyToU64 {
    fn to_u64(self) -> u64;
}

impl KeyToU64 for SimulationId {
    fn to_u64(self) -> u64 {
        self.0.as_ffi()
    }
}

impl KeyToU64 for CommodityId {
    fn to_u64(self) -> u64 {
        self.0.as_ffi()
    }
}

impl KeyToU64 for IndustryId {
    fn to_u64(self) -> u64 {
        self.0.as_ffi()
    }
}

impl KeyToU64 for ClassId {
    fn to_u64(self) -> u64 {
        self.0.as_ffi()
    }
}

impl KeyToU64 for StockId {
    fn to_u64(self) -> u64 {
        self.0.as_ffi()
    }
}

// === TYPE ALIASES ===

pub type Quantity = f64;
pub type Value = f64;
pub type Price = f64;

// ============================================================================
// Circuit State - Where a simulation stands in the circuit of capital
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Tsify)]
#[tsify(into_wasm_abi, from_wasm_abi)]
pub enum CircuitState {
    /// Inert master copy; cloned to create live simulations, never advanced.
    Template,
    Demand,
    Supply,
    Trade,
    Produce,
    Consume,
    Invest,
}

// ============================================================================
// Commodity Usage & Origin
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Tsify)]
#[tsify(into_wasm_abi, from_wasm_abi)]
pub enum CommodityUsage {
    /// Consumed by industries as an input to production.
    Productive,
    /// Consumed by social classes to reproduce themselves.
    Consumption,
    Money,
}

/// Who brings a commodity into existence.
///
/// The labour-power commodity is the Social-origin commodity with
/// Productive usage; production dispatches on this rather than on names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Tsify)]
#[tsify(into_wasm_abi, from_wasm_abi)]
pub enum CommodityOrigin {
    Industrial,
    Social,
    Money,
}

// ============================================================================
// Stock Usage
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Tsify)]
#[tsify(into_wasm_abi, from_wasm_abi)]
pub enum StockUsage {
    Production,
    Consumption,
    Sales,
    Money,
}

// ============================================================================
// Owner - Tagged reference to the Industry or SocialClass holding a stock
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OwnerRef {
    Industry(IndustryId),
    Class(ClassId),
}
