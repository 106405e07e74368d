//! Upgrades and the modifiers record they write.
//!
//! [`Modifiers`] is read opportunistically by behaviours (a warrior's
//! starting health, the chance an anvil skips straight to a sword, ...).
//! Upgrades are bought with swords; each one rewrites a modifier or unlocks
//! shop items.

use anvil_grid::material::catalog::{GOLD, IRON};
use anvil_grid::material::ElementId;
use serde::{Deserialize, Serialize};

use crate::economy::{Shop, ShopItem};

// ---------------------------------------------------------------------------
// Modifiers
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Modifiers {
    pub warrior_base_health: u32,
    /// Chance that damage dealt to a dwarf is ignored.
    pub damage_reduction_chance: f64,
    /// Elements the ore spawner may produce.
    pub unlocked_elements: Vec<ElementId>,
    /// Fractional bonus on coins from sales.
    pub trade_price_bonus: f64,
    /// Chance that an anvil credits a finished sword instead of a part.
    pub anvil_sword_chance: f64,
    pub set_bonus_multiplier: f64,
    /// Fraction taken off shop prices.
    pub shop_discount: f64,
    /// Chance a warrior heals after trading blows.
    pub bloodlust_chance: f64,
    /// Chance a furnace turns any ore into a gold bar.
    pub midas_chance: f64,
}

impl Default for Modifiers {
    fn default() -> Self {
        Self {
            warrior_base_health: 1,
            damage_reduction_chance: 0.0,
            unlocked_elements: vec![IRON],
            trade_price_bonus: 0.0,
            anvil_sword_chance: 0.0,
            set_bonus_multiplier: 1.0,
            shop_discount: 0.0,
            bloodlust_chance: 0.0,
            midas_chance: 0.0,
        }
    }
}

// ---------------------------------------------------------------------------
// Upgrade
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Upgrade {
    Sturdy,
    Nimble,
    Bloodlust,
    Prospector,
    Clockwork,
    Haggle,
    Investment,
    Shortcut,
    Flair,
    Renown,
    Midas,
    Discount,
}

impl Upgrade {
    pub const ALL: [Upgrade; 12] = [
        Upgrade::Sturdy,
        Upgrade::Nimble,
        Upgrade::Bloodlust,
        Upgrade::Prospector,
        Upgrade::Clockwork,
        Upgrade::Haggle,
        Upgrade::Investment,
        Upgrade::Shortcut,
        Upgrade::Flair,
        Upgrade::Renown,
        Upgrade::Midas,
        Upgrade::Discount,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Upgrade::Sturdy => "Sturdy",
            Upgrade::Nimble => "Nimble",
            Upgrade::Bloodlust => "Bloodlust",
            Upgrade::Prospector => "Prospector",
            Upgrade::Clockwork => "Clockwork",
            Upgrade::Haggle => "Haggle",
            Upgrade::Investment => "Investment",
            Upgrade::Shortcut => "Shortcut",
            Upgrade::Flair => "Flair",
            Upgrade::Renown => "Renown",
            Upgrade::Midas => "Midas",
            Upgrade::Discount => "Discount",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            Upgrade::Sturdy => "Warriors start with 3 health",
            Upgrade::Nimble => "Warriors have a 50% chance to dodge",
            Upgrade::Bloodlust => "Warriors have a 25% chance to heal after attacking",
            Upgrade::Prospector => "Gold ore starts to appear",
            Upgrade::Clockwork => "Unlocks automatons and their logic tiles",
            Upgrade::Haggle => "Materials sell for 20% more",
            Upgrade::Investment => "Unlocks the bank",
            Upgrade::Shortcut => "Anvils have a 20% chance to make a whole sword",
            Upgrade::Flair => "Unlocks the whetstone",
            Upgrade::Renown => "Set bonuses are worth three times as much",
            Upgrade::Midas => "Furnaces have a 10% chance to produce gold",
            Upgrade::Discount => "Everything in the shop is 20% cheaper",
        }
    }

    /// Price in swords.
    pub fn cost(self) -> u64 {
        match self {
            Upgrade::Sturdy | Upgrade::Prospector => 1,
            Upgrade::Nimble | Upgrade::Bloodlust | Upgrade::Haggle | Upgrade::Flair => 2,
            Upgrade::Investment | Upgrade::Shortcut | Upgrade::Discount => 3,
            Upgrade::Midas => 4,
            Upgrade::Clockwork | Upgrade::Renown => 5,
        }
    }

    /// The upgrade that must be owned first, if any.
    pub fn requires(self) -> Option<Upgrade> {
        match self {
            Upgrade::Clockwork | Upgrade::Investment | Upgrade::Midas => Some(Upgrade::Prospector),
            Upgrade::Renown => Some(Upgrade::Flair),
            _ => None,
        }
    }

    pub fn apply(self, modifiers: &mut Modifiers, shop: &mut Shop) {
        match self {
            Upgrade::Sturdy => modifiers.warrior_base_health = 3,
            Upgrade::Nimble => modifiers.damage_reduction_chance = 0.5,
            Upgrade::Bloodlust => modifiers.bloodlust_chance = 0.25,
            Upgrade::Prospector => {
                if !modifiers.unlocked_elements.contains(&GOLD) {
                    modifiers.unlocked_elements.push(GOLD);
                }
            }
            Upgrade::Clockwork => {
                for item in [
                    ShopItem::Assembler,
                    ShopItem::Automaton,
                    ShopItem::Waiter,
                    ShopItem::Redirector,
                    ShopItem::Emptier,
                    ShopItem::Filter,
                ] {
                    shop.unlock(item);
                }
            }
            Upgrade::Haggle => modifiers.trade_price_bonus += 0.2,
            Upgrade::Investment => shop.unlock(ShopItem::Bank),
            Upgrade::Shortcut => modifiers.anvil_sword_chance = 0.2,
            Upgrade::Flair => shop.unlock(ShopItem::Whetstone),
            Upgrade::Renown => modifiers.set_bonus_multiplier = 3.0,
            Upgrade::Midas => modifiers.midas_chance = 0.1,
            Upgrade::Discount => modifiers.shop_discount = 0.2,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prospector_unlocks_gold_once() {
        let mut modifiers = Modifiers::default();
        let mut shop = Shop::standard();
        Upgrade::Prospector.apply(&mut modifiers, &mut shop);
        Upgrade::Prospector.apply(&mut modifiers, &mut shop);
        assert_eq!(modifiers.unlocked_elements, vec![IRON, GOLD]);
    }

    #[test]
    fn clockwork_unlocks_the_logic_tiles() {
        let mut modifiers = Modifiers::default();
        let mut shop = Shop::standard();
        Upgrade::Clockwork.apply(&mut modifiers, &mut shop);
        for item in [ShopItem::Automaton, ShopItem::Redirector, ShopItem::Filter] {
            assert!(shop.is_unlocked(item));
        }
        assert!(!shop.is_unlocked(ShopItem::Bank));
    }

    #[test]
    fn prerequisites() {
        assert_eq!(Upgrade::Clockwork.requires(), Some(Upgrade::Prospector));
        assert_eq!(Upgrade::Renown.requires(), Some(Upgrade::Flair));
        assert_eq!(Upgrade::Sturdy.requires(), None);
        for upgrade in Upgrade::ALL {
            if let Some(first) = upgrade.requires() {
                assert!(first.requires().is_none(), "{upgrade:?} chains too deep");
            }
        }
    }

    #[test]
    fn modifier_upgrades() {
        let mut modifiers = Modifiers::default();
        let mut shop = Shop::standard();
        for upgrade in [Upgrade::Sturdy, Upgrade::Renown, Upgrade::Discount, Upgrade::Haggle] {
            upgrade.apply(&mut modifiers, &mut shop);
        }
        assert_eq!(modifiers.warrior_base_health, 3);
        assert_eq!(modifiers.set_bonus_multiplier, 3.0);
        assert_eq!(modifiers.shop_discount, 0.2);
        assert!((modifiers.trade_price_bonus - 0.2).abs() < 1e-12);
    }
}
