//! Currencies and the shop.
//!
//! The economy holds two counters: coins (earned by selling and crafting)
//! and swords (one per finished sword, spent on upgrades). The shop lists
//! placeable objects with a price and a lock flag; each item knows how to
//! build the blueprint of the object it places.

use anvil_grid::object::{Blueprint, HitPoints, ObjectKind};
use serde::{Deserialize, Serialize};

use crate::upgrades::Modifiers;

// ---------------------------------------------------------------------------
// Economy
// ---------------------------------------------------------------------------

/// A price in both currencies.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cost {
    pub coins: u64,
    pub swords: u64,
}

impl Cost {
    pub const fn coins(coins: u64) -> Self {
        Self { coins, swords: 0 }
    }

    pub const fn swords(swords: u64) -> Self {
        Self { coins: 0, swords }
    }

    /// This price with `discount` (a fraction) taken off, rounded down.
    pub fn discounted(self, discount: f64) -> Self {
        let keep = (1.0 - discount).clamp(0.0, 1.0);
        Self {
            coins: (self.coins as f64 * keep).floor() as u64,
            swords: (self.swords as f64 * keep).floor() as u64,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Economy {
    pub coins: u64,
    pub swords: u64,
}

impl Economy {
    pub fn new(coins: u64) -> Self {
        Self { coins, swords: 0 }
    }

    pub fn can_afford(&self, cost: Cost) -> bool {
        self.coins >= cost.coins && self.swords >= cost.swords
    }

    /// Deduct `cost` if affordable.
    pub fn pay(&mut self, cost: Cost) -> bool {
        if !self.can_afford(cost) {
            return false;
        }
        self.coins -= cost.coins;
        self.swords -= cost.swords;
        true
    }
}

// ---------------------------------------------------------------------------
// Shop
// ---------------------------------------------------------------------------

/// Everything the player can buy and place.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ShopItem {
    Furnace,
    Anvil,
    Mule,
    Warrior,
    Healer,
    Bucket,
    Bank,
    Whetstone,
    Assembler,
    Automaton,
    Redirector,
    Waiter,
    Emptier,
    Filter,
}

impl ShopItem {
    /// Build the object this item places. Warriors start with the health
    /// currently granted by upgrades.
    pub fn build(self, modifiers: &Modifiers) -> Blueprint {
        match self {
            ShopItem::Furnace => ObjectKind::Furnace.into(),
            ShopItem::Anvil => ObjectKind::Anvil.into(),
            ShopItem::Mule => ObjectKind::Mule.into(),
            ShopItem::Warrior => Blueprint::new(ObjectKind::Warrior)
                .with_hit_points(HitPoints::full(modifiers.warrior_base_health)),
            ShopItem::Healer => ObjectKind::healer().into(),
            ShopItem::Bucket => ObjectKind::Bucket.into(),
            ShopItem::Bank => ObjectKind::bank().into(),
            ShopItem::Whetstone => ObjectKind::Whetstone.into(),
            ShopItem::Assembler => ObjectKind::assembler().into(),
            ShopItem::Automaton => ObjectKind::automaton().into(),
            ShopItem::Redirector => ObjectKind::Redirector.into(),
            ShopItem::Waiter => ObjectKind::Waiter.into(),
            ShopItem::Emptier => ObjectKind::emptier().into(),
            ShopItem::Filter => ObjectKind::filter().into(),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            ShopItem::Furnace => "Furnace",
            ShopItem::Anvil => "Anvil",
            ShopItem::Mule => "Mule",
            ShopItem::Warrior => "Warrior",
            ShopItem::Healer => "Healer",
            ShopItem::Bucket => "Bucket",
            ShopItem::Bank => "Bank",
            ShopItem::Whetstone => "Whetstone",
            ShopItem::Assembler => "Assembler",
            ShopItem::Automaton => "Automaton",
            ShopItem::Redirector => "Redirector",
            ShopItem::Waiter => "Waiter",
            ShopItem::Emptier => "Emptier",
            ShopItem::Filter => "Filter",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShopEntry {
    pub item: ShopItem,
    pub cost: Cost,
    pub locked: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Shop {
    entries: Vec<ShopEntry>,
}

impl Shop {
    /// The standard price list. Basic tools start unlocked; the rest come
    /// with upgrades.
    pub fn standard() -> Self {
        use ShopItem::*;
        let listing = [
            (Furnace, 10, false),
            (Anvil, 20, false),
            (Mule, 15, false),
            (Warrior, 25, false),
            (Healer, 40, false),
            (Bucket, 5, false),
            (Bank, 100, true),
            (Whetstone, 30, true),
            (Assembler, 60, true),
            (Automaton, 30, true),
            (Redirector, 10, true),
            (Waiter, 10, true),
            (Emptier, 15, true),
            (Filter, 15, true),
        ];
        Self {
            entries: listing
                .into_iter()
                .map(|(item, coins, locked)| ShopEntry {
                    item,
                    cost: Cost::coins(coins),
                    locked,
                })
                .collect(),
        }
    }

    pub fn entries(&self) -> &[ShopEntry] {
        &self.entries
    }

    pub fn entry(&self, item: ShopItem) -> Option<&ShopEntry> {
        self.entries.iter().find(|e| e.item == item)
    }

    pub fn unlock(&mut self, item: ShopItem) {
        if let Some(entry) = self.entries.iter_mut().find(|e| e.item == item) {
            entry.locked = false;
        }
    }

    pub fn is_unlocked(&self, item: ShopItem) -> bool {
        self.entry(item).is_some_and(|e| !e.locked)
    }

    /// Price after `discount`, or `None` for an unlisted item.
    pub fn price(&self, item: ShopItem, discount: f64) -> Option<Cost> {
        self.entry(item).map(|e| e.cost.discounted(discount))
    }
}
