//! The simulation context.
//!
//! [`Simulation`] owns everything a frame touches: the grid, the action
//! queue, the recipe book, the economy and shop, the modifiers written by
//! upgrades, the raid state, the event journal and the seeded RNG. Every
//! operation receives it explicitly; there is no ambient state.
//!
//! # Frame order
//!
//! [`Simulation::update`] runs, in order:
//!
//! 1. per-object timers ([`behaviour::update`]) in cell order,
//! 2. the action queue (each completed action triggers a crafting sweep),
//! 3. the logic tick, when its own timer has run out,
//! 4. the raid end check.

use std::collections::{BTreeSet, HashSet};

use anvil_grid::direction::Direction;
use anvil_grid::entity::ObjectId;
use anvil_grid::grid::Grid;
use anvil_grid::material::MaterialRegistry;
use anvil_grid::object::{Blueprint, GameObject};
use anvil_journal::{EffectKind, EventJournal, SimEvent};
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg64;
use serde::Serialize;
use tracing::{debug, info, trace, warn};

use crate::action::{Action, ActionQueue};
use crate::behaviour;
use crate::config::SimConfig;
use crate::economy::{Economy, Shop, ShopItem};
use crate::events::{self, RaidState};
use crate::intent::Intent;
use crate::recipes::RecipeBook;
use crate::upgrades::{Modifiers, Upgrade};
use crate::EngineError;

pub struct Simulation {
    pub(crate) config: SimConfig,
    pub(crate) grid: Grid,
    pub(crate) actions: ActionQueue,
    pub(crate) recipes: RecipeBook,
    pub(crate) economy: Economy,
    pub(crate) shop: Shop,
    pub(crate) modifiers: Modifiers,
    pub(crate) upgrades: BTreeSet<Upgrade>,
    pub(crate) raid: RaidState,
    pub(crate) journal: EventJournal,
    pub(crate) rng: Pcg64,
    frame: u64,
    logic_timer_ms: f64,
}

impl Simulation {
    /// Build a simulation over the standard catalogue and recipe book.
    ///
    /// # Panics
    ///
    /// Panics if `config` fails [`SimConfig::validate`]; use
    /// [`try_new`](Self::try_new) to get the error instead.
    pub fn new(config: SimConfig) -> Self {
        match Self::try_new(config) {
            Ok(sim) => sim,
            Err(err) => panic!("Simulation::new: {err}"),
        }
    }

    pub fn try_new(config: SimConfig) -> Result<Self, EngineError> {
        config.validate()?;
        let grid = Grid::new(config.columns, config.rows, MaterialRegistry::standard());
        let rng = Pcg64::seed_from_u64(config.seed);
        debug!(
            columns = config.columns,
            rows = config.rows,
            seed = config.seed,
            "simulation created"
        );
        Ok(Self {
            grid,
            actions: ActionQueue::new(),
            recipes: RecipeBook::standard(),
            economy: Economy::new(config.starting_coins),
            shop: Shop::standard(),
            modifiers: Modifiers::default(),
            upgrades: BTreeSet::new(),
            raid: RaidState::new(config.raid_threshold),
            journal: EventJournal::new(),
            rng,
            frame: 0,
            logic_timer_ms: 0.0,
            config,
        })
    }

    /// Replace the recipe book. Recipes are tried in registration order.
    pub fn with_recipes(mut self, recipes: RecipeBook) -> Self {
        self.recipes = recipes;
        self
    }

    // -- accessors ----------------------------------------------------------

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    /// Direct grid access for setup and tests. Changes made here bypass the
    /// journal.
    pub fn grid_mut(&mut self) -> &mut Grid {
        &mut self.grid
    }

    pub fn actions(&self) -> &ActionQueue {
        &self.actions
    }

    pub fn recipes(&self) -> &RecipeBook {
        &self.recipes
    }

    pub fn economy(&self) -> &Economy {
        &self.economy
    }

    pub fn economy_mut(&mut self) -> &mut Economy {
        &mut self.economy
    }

    pub fn shop(&self) -> &Shop {
        &self.shop
    }

    pub fn modifiers(&self) -> &Modifiers {
        &self.modifiers
    }

    pub fn upgrades(&self) -> &BTreeSet<Upgrade> {
        &self.upgrades
    }

    pub fn raid(&self) -> &RaidState {
        &self.raid
    }

    pub fn journal(&self) -> &EventJournal {
        &self.journal
    }

    pub fn journal_mut(&mut self) -> &mut EventJournal {
        &mut self.journal
    }

    /// Number of completed [`update`](Self::update) calls.
    pub fn frame(&self) -> u64 {
        self.frame
    }

    // -- objects and actions ------------------------------------------------

    /// Place an object and journal its spawn.
    pub fn add_object(
        &mut self,
        blueprint: impl Into<Blueprint>,
        x: i32,
        y: i32,
    ) -> Result<ObjectId, EngineError> {
        let id = self.grid.add_object(blueprint, x, y)?;
        let name = self.grid.object(id).map_or("?", GameObject::name);
        debug!(%id, name, x, y, "spawned");
        self.journal.record(SimEvent::Spawned {
            object: id,
            name: name.to_owned(),
            x,
            y,
        });
        Ok(id)
    }

    /// Queue an action. It starts on the next frame.
    pub fn add_action(&mut self, action: Action) {
        trace!(action = action.name(), "queued");
        self.actions.push(action);
    }

    /// Start the repeating ore spawner.
    pub fn start_spawner(&mut self) {
        self.add_action(Action::spawn_ore());
    }

    /// Ask the renderer to snap `object` back to its logical position.
    pub fn sync(&mut self, object: ObjectId) {
        self.journal.record(SimEvent::Synced { object });
    }

    /// Roll against probability `p`. Certain outcomes do not touch the RNG.
    pub(crate) fn chance(&mut self, p: f64) -> bool {
        if p <= 0.0 {
            false
        } else if p >= 1.0 {
            true
        } else {
            self.rng.gen_bool(p)
        }
    }

    /// Remove an object and journal it. `None` for a stale id.
    pub(crate) fn remove(&mut self, id: ObjectId) -> Option<GameObject> {
        let object = self.grid.remove_object(id)?;
        let (x, y) = object.position();
        self.journal.record(SimEvent::Removed { object: id, x, y });
        Some(object)
    }

    pub(crate) fn effect(&mut self, kind: EffectKind, x: i32, y: i32) {
        self.journal.record(SimEvent::Effect { kind, x, y });
    }

    /// Place a new object on `(x, y)` and send it sliding along `direction`.
    pub(crate) fn emit(&mut self, blueprint: Blueprint, x: i32, y: i32, direction: Direction) {
        match self.add_object(blueprint, x, y) {
            Ok(id) => self.add_action(Action::slide(id, direction)),
            Err(err) => warn!(%err, x, y, "could not emit object"),
        }
    }

    // -- frame --------------------------------------------------------------

    /// Advance the simulation by `dt_ms` simulated milliseconds.
    pub fn update(&mut self, dt_ms: f64) {
        self.frame += 1;
        self.journal.begin_frame(self.frame);

        for id in self.grid.ids_in_cell_order() {
            behaviour::update(self, id, dt_ms);
        }

        self.advance_actions(dt_ms);

        self.logic_timer_ms += dt_ms;
        if self.logic_timer_ms >= self.config.logic_interval_ms {
            self.logic_timer_ms = 0.0;
            self.logic_tick();
        }

        events::check_raid_end(self);
    }

    /// Run every automaton's logic once, visiting cells in index order.
    fn logic_tick(&mut self) {
        let mut visited = HashSet::new();
        for id in self.grid.ids_in_cell_order() {
            let is_automaton = self.grid.object(id).is_some_and(|o| o.kind.is_automaton());
            if is_automaton && visited.insert(id) {
                behaviour::logic(self, id);
            }
        }
        trace!(automatons = visited.len(), "logic tick");
    }

    /// Try every recipe on each cell that was occupied when the sweep began,
    /// row by row. The first recipe that fires claims its cell for this
    /// sweep. Returns the number of crafts.
    pub fn crafting_sweep(&mut self) -> usize {
        let occupied: Vec<(i32, i32)> = self
            .grid
            .cells()
            .filter(|c| !c.is_empty())
            .map(|c| (c.x(), c.y()))
            .collect();

        let mut crafted = 0;
        for (x, y) in occupied {
            for index in 0..self.recipes.len() {
                let Some((recipe, handler)) = self.recipes.get(index) else {
                    break;
                };
                let Some(craft) = recipe.attempt_to_craft(&mut self.grid, x, y) else {
                    continue;
                };
                for (&object, &(cx, cy)) in craft.objects.iter().zip(&craft.cells) {
                    self.journal.record(SimEvent::Removed {
                        object,
                        x: cx,
                        y: cy,
                    });
                }
                handler(self, &craft);
                crafted += 1;
                break;
            }
        }
        crafted
    }

    // -- player input -------------------------------------------------------

    /// Validate and enqueue a player intent. A rejected intent asks the
    /// renderer to resync the object and returns `false`.
    pub fn apply_intent(&mut self, intent: Intent) -> bool {
        let object = intent.object();
        let allowed = self.grid.object(object).is_some_and(|o| match intent {
            Intent::Rotate { .. } => o.can_be_rotated(),
            Intent::Slide { .. } => o.can_be_moved(),
        });
        if !allowed {
            trace!(?intent, "intent rejected");
            self.sync(object);
            return false;
        }

        events::note_player_action(self);
        self.add_action(intent.into_action());
        true
    }

    // -- economy ------------------------------------------------------------

    /// Buy `item` and place it on `(x, y)`. Fails without side effects when
    /// the item is locked or unaffordable, or the cell is not an empty cell
    /// of the grid.
    pub fn purchase(&mut self, item: ShopItem, x: i32, y: i32) -> Option<ObjectId> {
        if !self.shop.is_unlocked(item) {
            trace!(item = item.name(), "item is locked");
            return None;
        }
        let cost = self.shop.price(item, self.modifiers.shop_discount)?;
        if !self.grid.in_bounds(x, y) || !self.grid.is_empty_at(x, y) {
            trace!(item = item.name(), x, y, "purchase target cell unavailable");
            return None;
        }
        if !self.economy.pay(cost) {
            trace!(item = item.name(), ?cost, "cannot afford");
            return None;
        }
        let id = match self.add_object(item.build(&self.modifiers), x, y) {
            Ok(id) => id,
            Err(err) => panic!("purchase placement on a checked cell failed: {err}"),
        };
        info!(item = item.name(), coins = cost.coins, swords = cost.swords, "purchased");
        self.journal.record(SimEvent::Purchased {
            item: item.name().to_owned(),
            object: id,
            coins: cost.coins,
            swords: cost.swords,
        });
        Some(id)
    }

    /// Upgrades that could be bought right now, ignoring price.
    pub fn available_upgrades(&self) -> Vec<Upgrade> {
        Upgrade::ALL
            .into_iter()
            .filter(|u| !self.upgrades.contains(u))
            .filter(|u| u.requires().map_or(true, |r| self.upgrades.contains(&r)))
            .collect()
    }

    /// Buy an upgrade with swords.
    pub fn buy_upgrade(&mut self, upgrade: Upgrade) -> bool {
        if !self.available_upgrades().contains(&upgrade) {
            trace!(upgrade = upgrade.name(), "upgrade unavailable");
            return false;
        }
        if self.economy.swords < upgrade.cost() {
            trace!(upgrade = upgrade.name(), "not enough swords");
            return false;
        }
        self.economy.swords -= upgrade.cost();
        upgrade.apply(&mut self.modifiers, &mut self.shop);
        self.upgrades.insert(upgrade);
        info!(upgrade = upgrade.name(), "upgrade applied");
        self.journal.record(SimEvent::UpgradeApplied {
            upgrade: upgrade.name().to_owned(),
        });
        true
    }

    // -- hashing ------------------------------------------------------------

    /// BLAKE3 hex digest of everything that determines future frames except
    /// the RNG stream and the action queue, which follow from the same
    /// seed and inputs.
    pub fn state_hash(&self) -> String {
        #[derive(Serialize)]
        struct HashableState<'a> {
            frame: u64,
            grid: &'a Grid,
            economy: &'a Economy,
            shop: &'a Shop,
            modifiers: &'a Modifiers,
            upgrades: &'a BTreeSet<Upgrade>,
            raid: &'a RaidState,
        }

        let hashable = HashableState {
            frame: self.frame,
            grid: &self.grid,
            economy: &self.economy,
            shop: &self.shop,
            modifiers: &self.modifiers,
            upgrades: &self.upgrades,
            raid: &self.raid,
        };

        let json_bytes = serde_json::to_vec(&hashable)
            .expect("simulation state should always be JSON-serializable");

        blake3::hash(&json_bytes).to_hex().to_string()
    }
}

impl std::fmt::Debug for Simulation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Simulation")
            .field("frame", &self.frame)
            .field("objects", &self.grid.object_count())
            .field("actions", &self.actions.len())
            .field("economy", &self.economy)
            .field("raid", &self.raid)
            .finish_non_exhaustive()
    }
}
