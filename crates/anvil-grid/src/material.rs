//! Material taxonomy: elements × components × optional set bonuses.
//!
//! A [`Variant`] is one registered `(element, component, set?)` combination
//! with its own sprite. Its rarity weight is the product of the three
//! rarities (a missing set counts as 1); higher weights are sampled more
//! often by [`MaterialRegistry::create_by_rarity`].
//!
//! The registry is built once and then only read. Handles
//! ([`ElementId`], [`ComponentId`], [`SetBonusId`], [`VariantId`]) are plain
//! indices into it; [`catalog`] names the handles of the standard registry.

use rand::distributions::{Distribution, WeightedIndex};
use rand::Rng;
use serde::{Deserialize, Serialize};
use smallvec::{smallvec, SmallVec};
use std::hash::{Hash, Hasher};
use tracing::trace;

use crate::direction::Direction;

// ---------------------------------------------------------------------------
// Handles
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ElementId(pub u16);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ComponentId(pub u16);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SetBonusId(pub u16);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct VariantId(pub u16);

// ---------------------------------------------------------------------------
// Symmetry
// ---------------------------------------------------------------------------

/// How many facings of a placed material count as the same for recipes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Symmetry {
    /// Only the exact facing matches.
    None,
    /// The facing and its opposite match.
    TwoWay,
    /// Any facing matches.
    FourWay,
}

impl Symmetry {
    /// Whether a material facing `facing` can be read by a stream running
    /// in `stream`.
    pub fn is_compatible(self, facing: Direction, stream: Direction) -> bool {
        match self {
            Symmetry::None => facing == stream,
            Symmetry::TwoWay => facing == stream || facing.opposite() == stream,
            Symmetry::FourWay => true,
        }
    }

    /// Stream directions worth trying from a material facing `facing`, in
    /// the order they are attempted.
    pub fn candidate_directions(self, facing: Direction) -> SmallVec<[Direction; 4]> {
        match self {
            Symmetry::None => smallvec![facing],
            Symmetry::TwoWay => smallvec![facing, facing.opposite()],
            Symmetry::FourWay => SmallVec::from_slice(&Direction::ALL),
        }
    }
}

// ---------------------------------------------------------------------------
// Registry entries
// ---------------------------------------------------------------------------

/// The substance of a material (Iron, Gold).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Element {
    pub name: String,
    pub rarity: u32,
}

/// The shape of a material (Ore, Bar, Tip...) with its behavioural flags.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Component {
    pub name: String,
    /// Materials of this shape can be slid.
    pub moves: bool,
    /// Materials of this shape can be rotated in place.
    pub rotates: bool,
    pub symmetry: Symmetry,
    pub rarity: u32,
}

impl Component {
    pub fn new(name: &str, moves: bool, rotates: bool, symmetry: Symmetry, rarity: u32) -> Self {
        Self {
            name: name.to_owned(),
            moves,
            rotates,
            symmetry,
            rarity,
        }
    }
}

/// A tag shared by parts that score a bonus together.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetBonus {
    pub name: String,
    pub rarity: u32,
}

/// One registered `(element, component, set?)` combination.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Variant {
    pub element: ElementId,
    pub component: ComponentId,
    pub set: Option<SetBonusId>,
    /// Sprite name handed to the renderer.
    pub sprite: String,
}

// ---------------------------------------------------------------------------
// Material
// ---------------------------------------------------------------------------

/// An instance of a variant, as carried by a grid object or a container.
///
/// The component's flags are copied in so rules can be evaluated without a
/// registry lookup. Equality (and hashing) only looks at the
/// `(element, component, set)` triple: two handles of different sprites but
/// the same triple are the same material.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Material {
    pub variant: VariantId,
    pub element: ElementId,
    pub component: ComponentId,
    pub set: Option<SetBonusId>,
    pub symmetry: Symmetry,
    pub moves: bool,
    pub rotates: bool,
}

impl Material {
    /// Whether this material is `component` made of `element`.
    pub fn is(&self, element: ElementId, component: ComponentId) -> bool {
        self.element == element && self.component == component
    }
}

impl PartialEq for Material {
    fn eq(&self, other: &Self) -> bool {
        self.element == other.element && self.component == other.component && self.set == other.set
    }
}

impl Eq for Material {}

impl Hash for Material {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.element.hash(state);
        self.component.hash(state);
        self.set.hash(state);
    }
}

// ---------------------------------------------------------------------------
// MaterialQuery
// ---------------------------------------------------------------------------

/// Filter over registered variants. An unset field matches everything; a set
/// field matches any of the listed handles.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MaterialQuery {
    elements: Option<Vec<ElementId>>,
    components: Option<Vec<ComponentId>>,
    sets: Option<Vec<SetBonusId>>,
}

impl MaterialQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn element(mut self, element: ElementId) -> Self {
        self.elements.get_or_insert_with(Vec::new).push(element);
        self
    }

    pub fn elements(mut self, elements: &[ElementId]) -> Self {
        self.elements
            .get_or_insert_with(Vec::new)
            .extend_from_slice(elements);
        self
    }

    pub fn component(mut self, component: ComponentId) -> Self {
        self.components.get_or_insert_with(Vec::new).push(component);
        self
    }

    pub fn components(mut self, components: &[ComponentId]) -> Self {
        self.components
            .get_or_insert_with(Vec::new)
            .extend_from_slice(components);
        self
    }

    /// Restrict to variants carrying `set`. Variants without a set never
    /// match once any set is requested.
    pub fn set_bonus(mut self, set: SetBonusId) -> Self {
        self.sets.get_or_insert_with(Vec::new).push(set);
        self
    }

    pub fn matches(&self, variant: &Variant) -> bool {
        let element_ok = self
            .elements
            .as_ref()
            .map_or(true, |list| list.contains(&variant.element));
        let component_ok = self
            .components
            .as_ref()
            .map_or(true, |list| list.contains(&variant.component));
        let set_ok = match (&self.sets, variant.set) {
            (None, _) => true,
            (Some(list), Some(set)) => list.contains(&set),
            (Some(_), None) => false,
        };
        element_ok && component_ok && set_ok
    }
}

// ---------------------------------------------------------------------------
// MaterialRegistry
// ---------------------------------------------------------------------------

/// All elements, components, set bonuses and variants known to a game.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MaterialRegistry {
    elements: Vec<Element>,
    components: Vec<Component>,
    set_bonuses: Vec<SetBonus>,
    variants: Vec<Variant>,
}

impl MaterialRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    // -- registration -------------------------------------------------------

    pub fn register_element(&mut self, name: &str, rarity: u32) -> ElementId {
        self.elements.push(Element {
            name: name.to_owned(),
            rarity,
        });
        ElementId(self.elements.len() as u16 - 1)
    }

    pub fn register_component(&mut self, component: Component) -> ComponentId {
        self.components.push(component);
        ComponentId(self.components.len() as u16 - 1)
    }

    pub fn register_set_bonus(&mut self, name: &str, rarity: u32) -> SetBonusId {
        self.set_bonuses.push(SetBonus {
            name: name.to_owned(),
            rarity,
        });
        SetBonusId(self.set_bonuses.len() as u16 - 1)
    }

    /// Register a variant.
    ///
    /// # Panics
    ///
    /// Panics if any of the handles was not issued by this registry.
    pub fn register_variant(
        &mut self,
        element: ElementId,
        component: ComponentId,
        sprite: &str,
        set: Option<SetBonusId>,
    ) -> VariantId {
        assert!(
            (element.0 as usize) < self.elements.len(),
            "variant '{sprite}' references unknown element {element:?}"
        );
        assert!(
            (component.0 as usize) < self.components.len(),
            "variant '{sprite}' references unknown component {component:?}"
        );
        if let Some(set) = set {
            assert!(
                (set.0 as usize) < self.set_bonuses.len(),
                "variant '{sprite}' references unknown set bonus {set:?}"
            );
        }
        self.variants.push(Variant {
            element,
            component,
            set,
            sprite: sprite.to_owned(),
        });
        VariantId(self.variants.len() as u16 - 1)
    }

    // -- lookups ------------------------------------------------------------

    pub fn element(&self, id: ElementId) -> &Element {
        &self.elements[id.0 as usize]
    }

    pub fn component(&self, id: ComponentId) -> &Component {
        &self.components[id.0 as usize]
    }

    pub fn set_bonus(&self, id: SetBonusId) -> &SetBonus {
        &self.set_bonuses[id.0 as usize]
    }

    pub fn variant(&self, id: VariantId) -> &Variant {
        &self.variants[id.0 as usize]
    }

    pub fn variant_count(&self) -> usize {
        self.variants.len()
    }

    pub fn find_element(&self, name: &str) -> Option<ElementId> {
        self.elements
            .iter()
            .position(|e| e.name == name)
            .map(|i| ElementId(i as u16))
    }

    pub fn find_component(&self, name: &str) -> Option<ComponentId> {
        self.components
            .iter()
            .position(|c| c.name == name)
            .map(|i| ComponentId(i as u16))
    }

    pub fn find_set_bonus(&self, name: &str) -> Option<SetBonusId> {
        self.set_bonuses
            .iter()
            .position(|s| s.name == name)
            .map(|i| SetBonusId(i as u16))
    }

    /// Rarity weight: element × component × set (1 without a set).
    pub fn rarity(&self, id: VariantId) -> u32 {
        let variant = self.variant(id);
        let set = variant.set.map_or(1, |s| self.set_bonus(s).rarity);
        self.element(variant.element).rarity * self.component(variant.component).rarity * set
    }

    /// Instantiate a variant.
    pub fn material(&self, id: VariantId) -> Material {
        let variant = self.variant(id);
        let component = self.component(variant.component);
        Material {
            variant: id,
            element: variant.element,
            component: variant.component,
            set: variant.set,
            symmetry: component.symmetry,
            moves: component.moves,
            rotates: component.rotates,
        }
    }

    /// Variants matching `query`, in registration order.
    pub fn query<'a>(&'a self, query: &'a MaterialQuery) -> impl Iterator<Item = VariantId> + 'a {
        self.variants
            .iter()
            .enumerate()
            .filter(move |(_, v)| query.matches(v))
            .map(|(i, _)| VariantId(i as u16))
    }

    /// The first matching variant in registration order. Used where a rule
    /// needs a representative output without rolling the dice.
    pub fn first_match(&self, query: &MaterialQuery) -> Option<Material> {
        self.query(query).next().map(|id| self.material(id))
    }

    /// Sample a matching variant weighted by rarity.
    ///
    /// Returns `None` when nothing matches (or every match weighs zero);
    /// callers skip whatever depended on the material.
    pub fn create_by_rarity<R: Rng + ?Sized>(
        &self,
        query: &MaterialQuery,
        rng: &mut R,
    ) -> Option<Material> {
        let candidates: Vec<VariantId> = self.query(query).collect();
        let weights: Vec<u32> = candidates.iter().map(|&id| self.rarity(id)).collect();
        match WeightedIndex::new(&weights) {
            Ok(dist) => Some(self.material(candidates[dist.sample(rng)])),
            Err(_) => {
                trace!(?query, "no variant available for query");
                None
            }
        }
    }

    // -- standard catalogue -------------------------------------------------

    /// The forge catalogue: iron and gold ores, bars and sword parts.
    pub fn standard() -> Self {
        use catalog::*;

        let mut r = Self::new();
        let iron = r.register_element("Iron", 3);
        let gold = r.register_element("Gold", 1);
        debug_assert_eq!((iron, gold), (IRON, GOLD));

        r.register_component(Component::new("Ore", true, false, Symmetry::FourWay, 1));
        r.register_component(Component::new("Bar", true, false, Symmetry::FourWay, 1));
        r.register_component(Component::new("Tip", true, true, Symmetry::None, 1));
        r.register_component(Component::new("Handle", true, true, Symmetry::None, 1));
        let blade = r.register_component(Component::new("Blade", true, true, Symmetry::TwoWay, 2));
        debug_assert_eq!(blade, BLADE);

        let sets: Vec<SetBonusId> = SET_BONUSES
            .iter()
            .map(|(name, rarity)| r.register_set_bonus(name, *rarity))
            .collect();

        r.register_variant(IRON, ORE, "ore_iron", None);
        r.register_variant(GOLD, ORE, "ore_gold", None);
        r.register_variant(IRON, BAR, "bar_iron", None);
        r.register_variant(GOLD, BAR, "bar_gold", None);

        for (n, &set) in sets.iter().enumerate() {
            r.register_variant(IRON, TIP, &format!("tip_{}", n + 1), Some(set));
        }
        for (n, &set) in sets.iter().enumerate() {
            r.register_variant(IRON, BLADE, &format!("blade_{}", n + 1), Some(set));
        }
        for n in 1..=5 {
            r.register_variant(IRON, HANDLE, &format!("handle_iron_{n}"), None);
        }
        for n in 1..=5 {
            r.register_variant(GOLD, HANDLE, &format!("handle_gold_{n}"), None);
        }
        r
    }
}

/// Handles issued by [`MaterialRegistry::standard`].
pub mod catalog {
    use super::{ComponentId, ElementId, SetBonusId};

    pub const IRON: ElementId = ElementId(0);
    pub const GOLD: ElementId = ElementId(1);

    pub const ORE: ComponentId = ComponentId(0);
    pub const BAR: ComponentId = ComponentId(1);
    pub const TIP: ComponentId = ComponentId(2);
    pub const HANDLE: ComponentId = ComponentId(3);
    pub const BLADE: ComponentId = ComponentId(4);

    pub const STRAIGHT: SetBonusId = SetBonusId(0);
    pub const BROAD: SetBonusId = SetBonusId(1);
    pub const CHIPPED: SetBonusId = SetBonusId(2);
    pub const EXECUTIONER: SetBonusId = SetBonusId(3);
    pub const SPIKED: SetBonusId = SetBonusId(4);
    pub const FLAMBERGE: SetBonusId = SetBonusId(5);
    pub const ENGRAVED: SetBonusId = SetBonusId(6);
    pub const SERRATED: SetBonusId = SetBonusId(7);
    pub const CEREMONIAL: SetBonusId = SetBonusId(8);
    pub const WAVED: SetBonusId = SetBonusId(9);

    pub(super) const SET_BONUSES: [(&str, u32); 10] = [
        ("Straight", 5),
        ("Broad", 5),
        ("Chipped", 5),
        ("Executioner", 3),
        ("Spiked", 3),
        ("Flamberge", 2),
        ("Engraved", 2),
        ("Serrated", 1),
        ("Ceremonial", 1),
        ("Waved", 1),
    ];
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::catalog::*;
    use super::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg64;

    #[test]
    fn standard_catalogue_layout() {
        let r = MaterialRegistry::standard();
        assert_eq!(r.variant_count(), 4 + 10 + 10 + 10);
        assert_eq!(r.find_element("Gold"), Some(GOLD));
        assert_eq!(r.find_component("Blade"), Some(BLADE));
        assert_eq!(r.find_set_bonus("Waved"), Some(WAVED));
        assert_eq!(r.component(BLADE).symmetry, Symmetry::TwoWay);
        assert_eq!(r.component(TIP).symmetry, Symmetry::None);
    }

    #[test]
    fn rarity_is_product_of_parts() {
        let r = MaterialRegistry::standard();
        let q = MaterialQuery::new().element(IRON).component(BLADE).set_bonus(STRAIGHT);
        let blade = r.query(&q).next().unwrap();
        // iron 3 × blade 2 × straight 5
        assert_eq!(r.rarity(blade), 30);

        let q = MaterialQuery::new().element(GOLD).component(ORE);
        let ore = r.query(&q).next().unwrap();
        assert_eq!(r.rarity(ore), 1);
    }

    #[test]
    fn set_filter_excludes_setless_variants() {
        let r = MaterialRegistry::standard();
        let q = MaterialQuery::new().component(HANDLE).set_bonus(STRAIGHT);
        assert_eq!(r.query(&q).count(), 0);
        let q = MaterialQuery::new().component(HANDLE);
        assert_eq!(r.query(&q).count(), 10);
    }

    #[test]
    fn create_by_rarity_respects_query() {
        let r = MaterialRegistry::standard();
        let mut rng = Pcg64::seed_from_u64(7);
        let q = MaterialQuery::new()
            .components(&[TIP, BLADE, HANDLE])
            .element(GOLD);
        for _ in 0..50 {
            let m = r.create_by_rarity(&q, &mut rng).unwrap();
            // Gold only exists as handles among the sword parts.
            assert!(m.is(GOLD, HANDLE));
        }
    }

    #[test]
    fn create_by_rarity_on_empty_pool_is_none() {
        let r = MaterialRegistry::standard();
        let mut rng = Pcg64::seed_from_u64(7);
        let q = MaterialQuery::new().element(GOLD).component(TIP);
        assert!(r.create_by_rarity(&q, &mut rng).is_none());
    }

    #[test]
    fn create_by_rarity_favours_heavier_variants() {
        let r = MaterialRegistry::standard();
        let mut rng = Pcg64::seed_from_u64(42);
        let q = MaterialQuery::new().component(ORE);
        let iron = (0..4000)
            .filter(|_| r.create_by_rarity(&q, &mut rng).unwrap().element == IRON)
            .count();
        // Expected share is 3/4.
        assert!((2700..3300).contains(&iron), "iron share was {iron}/4000");
    }

    #[test]
    fn equality_ignores_sprite_variant() {
        let r = MaterialRegistry::standard();
        let q = MaterialQuery::new().element(IRON).component(HANDLE);
        let ids: Vec<VariantId> = r.query(&q).collect();
        let a = r.material(ids[0]);
        let b = r.material(ids[1]);
        assert_ne!(a.variant, b.variant);
        assert_eq!(a, b);
    }

    #[test]
    fn symmetry_compatibility() {
        use Direction::*;
        assert!(Symmetry::TwoWay.is_compatible(South, North));
        assert!(!Symmetry::None.is_compatible(South, North));
        assert!(Symmetry::None.is_compatible(East, East));
        assert!(Symmetry::FourWay.is_compatible(West, North));
        assert_eq!(
            Symmetry::TwoWay.candidate_directions(East).as_slice(),
            &[East, West]
        );
        assert_eq!(
            Symmetry::FourWay.candidate_directions(West).as_slice(),
            &Direction::ALL
        );
    }
}
