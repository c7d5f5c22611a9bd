//! Resource economy: passive generation, buildings, caps, random events.

use std::rc::Rc;

use crate::constants::{
    DEBUG_ENV_VAR, ENERGY_RESOURCE, GATHER_ENERGY_ACTION, GATHER_ENERGY_AMOUNT,
    RANDOM_EVENT_INTERVAL_TICKS,
};
use crate::data::GameData;
use crate::error::GameError;
use crate::rng::{RngBundle, weighted_index};
use crate::state::GameState;

#[cfg(debug_assertions)]
fn debug_log_enabled() -> bool {
    matches!(std::env::var(DEBUG_ENV_VAR), Ok(val) if val != "0")
}

#[cfg(not(debug_assertions))]
const fn debug_log_enabled() -> bool {
    false
}

/// Advances resources and buildings per elapsed time and sells upgrades.
#[derive(Debug, Clone)]
pub struct Economy {
    data: Rc<GameData>,
}

impl Economy {
    #[must_use]
    pub fn new(data: Rc<GameData>) -> Self {
        Self { data }
    }

    /// Seed zero-amount entries and caps for every defined resource.
    ///
    /// Called once per new session so the UI always has a full table.
    pub fn initialize_resources(&self, state: &mut GameState) {
        for id in self.data.resources.keys() {
            state.resources.entry(id.clone()).or_insert(0.0);
        }
        self.recompute_storage_caps(state);
    }

    /// Advance the economy by `delta` seconds.
    ///
    /// Order is fixed for save compatibility: passive generation, building
    /// output/upkeep, cap clamping, then (every 60th tick) random events.
    /// Returns the triggered event description key, if any.
    pub fn tick(&self, state: &mut GameState, rng: &RngBundle, delta: f64) -> Option<String> {
        state.tick_count += 1;

        for (id, def) in &self.data.resources {
            if let Some(rate) = def.auto_gen {
                let entry = state.resources.entry(id.clone()).or_insert(0.0);
                *entry += rate * delta;
            }
        }

        for (id, def) in &self.data.buildings {
            let level = state.building_level(id);
            if level == 0 {
                continue;
            }
            let scale = f64::from(level) * delta;
            for (res, rate) in &def.effects.auto_gen {
                let entry = state.resources.entry(res.clone()).or_insert(0.0);
                *entry += rate * scale;
            }
            for (res, rate) in &def.effects.consume {
                let entry = state.resources.entry(res.clone()).or_insert(0.0);
                *entry = (*entry - rate * scale).max(0.0);
            }
        }

        state.clamp_resources();

        if state.tick_count % RANDOM_EVENT_INTERVAL_TICKS == 0 {
            self.check_random_events(state, rng)
        } else {
            None
        }
    }

    /// Manual player action, currently the fixed energy gather.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for unrecognized action ids.
    pub fn perform_action(&self, state: &mut GameState, action_id: &str) -> Result<(), GameError> {
        if action_id == GATHER_ENERGY_ACTION {
            state.add_resource(ENERGY_RESOURCE, GATHER_ENERGY_AMOUNT);
            Ok(())
        } else {
            Err(GameError::NotFound {
                kind: "action",
                id: action_id.to_string(),
            })
        }
    }

    /// Cost of the next level of a building: `base * multiplier^level`.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for unknown building ids.
    pub fn building_cost(
        &self,
        state: &GameState,
        building_id: &str,
    ) -> Result<Vec<(String, f64)>, GameError> {
        let def = self
            .data
            .buildings
            .get(building_id)
            .ok_or(GameError::NotFound {
                kind: "building",
                id: building_id.to_string(),
            })?;
        let level = state.building_level(building_id);
        let factor = def.cost_multiplier.powi(i32::try_from(level).unwrap_or(i32::MAX));
        Ok(def
            .cost
            .iter()
            .map(|(res, base)| (res.clone(), base * factor))
            .collect())
    }

    /// Purchase the next level of a building.
    ///
    /// All-or-nothing: any short resource aborts without mutation. On
    /// success costs are deducted, the level bumps, and storage caps are
    /// recomputed. Returns the new level.
    ///
    /// # Errors
    ///
    /// `NotFound` for unknown ids, `InsufficientResources` when short.
    pub fn build(&self, state: &mut GameState, building_id: &str) -> Result<u32, GameError> {
        let costs = self.building_cost(state, building_id)?;
        for (res, amount) in &costs {
            if state.resource(res) < *amount {
                return Err(GameError::InsufficientResources {
                    resource: res.clone(),
                    need: *amount,
                });
            }
        }
        for (res, amount) in &costs {
            state.drain_resource(res, *amount);
        }
        let level = state
            .buildings
            .entry(building_id.to_string())
            .or_insert(0);
        *level += 1;
        let new_level = *level;
        self.recompute_storage_caps(state);
        if debug_log_enabled() {
            println!("Economy build | {building_id} -> level {new_level}");
        }
        Ok(new_level)
    }

    /// Recompute every cap from base caps plus building storage bonuses.
    pub fn recompute_storage_caps(&self, state: &mut GameState) {
        let mut caps: std::collections::BTreeMap<String, f64> = self
            .data
            .resources
            .iter()
            .map(|(id, def)| (id.clone(), def.base_cap))
            .collect();
        for (id, def) in &self.data.buildings {
            let level = state.building_level(id);
            if level == 0 {
                continue;
            }
            for (res, bonus) in &def.effects.storage {
                if let Some(cap) = caps.get_mut(res) {
                    *cap += bonus * f64::from(level);
                }
            }
        }
        state.storage_caps = caps;
        state.clamp_resources();
    }

    /// Weighted draw over events whose requirements are currently met.
    ///
    /// The chosen event's deltas are applied immediately (floored at zero,
    /// cap-clamped) and its description key returned for the UI log.
    pub fn check_random_events(&self, state: &mut GameState, rng: &RngBundle) -> Option<String> {
        let candidates: Vec<&crate::data::EventDef> = self
            .data
            .events
            .iter()
            .filter(|event| {
                event
                    .requirements
                    .iter()
                    .all(|(res, amount)| state.resource(res) >= *amount)
            })
            .collect();
        if candidates.is_empty() {
            return None;
        }

        let weights: Vec<u32> = candidates.iter().map(|e| e.weight).collect();
        let idx = weighted_index(&mut *rng.economy(), &weights)?;
        let event = candidates[idx];
        for (res, delta) in &event.effect {
            // Effects naming undeclared resources are ignored.
            if self.data.resources.contains_key(res) {
                state.add_resource(res, *delta);
            }
        }
        if debug_log_enabled() {
            println!("Economy event | {}", event.description);
        }
        Some(event.description.clone())
    }
}
