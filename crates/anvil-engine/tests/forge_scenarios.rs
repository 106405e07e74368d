//! End-to-end forge scenarios driven through player intents and frames.

use anvil_engine::prelude::*;

fn sim(columns: i32, rows: i32) -> Simulation {
    Simulation::new(SimConfig {
        columns,
        rows,
        ..Default::default()
    })
}

fn material(sim: &Simulation, element: ElementId, component: ComponentId) -> Material {
    sim.grid()
        .materials()
        .first_match(&MaterialQuery::new().element(element).component(component))
        .unwrap()
}

fn run(sim: &mut Simulation, frames: usize) {
    for _ in 0..frames {
        sim.update(16.0);
    }
}

fn slide(sim: &mut Simulation, object: ObjectId, direction: Direction) {
    assert!(sim.apply_intent(Intent::Slide { object, direction }));
}

// -- hit points ---------------------------------------------------------------

#[test]
fn damage_clamps_kills_and_later_heals_do_nothing() {
    let mut sim = sim(3, 3);
    let goblin = sim
        .add_object(
            Blueprint::from(ObjectKind::Goblin).with_hit_points(HitPoints::new(1, 3)),
            1,
            1,
        )
        .unwrap();

    sim.add_action(Action::change_hp(goblin, -2));
    run(&mut sim, 3);

    assert!(!sim.grid().is_alive(goblin));
    assert!(sim.grid().is_empty_at(1, 1));
    let events: Vec<&SimEvent> = sim.journal().events_for_object(goblin).map(|e| &e.event).collect();
    assert!(events.contains(&&SimEvent::HitPointsChanged {
        object: goblin,
        current: 0,
        max: 3
    }));
    assert!(events.contains(&&SimEvent::Removed {
        object: goblin,
        x: 1,
        y: 1
    }));

    sim.add_action(Action::heal(goblin, 1));
    run(&mut sim, 30);
    assert_eq!(sim.grid().object_count(), 0);
    assert!(sim.actions().is_empty());
}

// -- production chain ---------------------------------------------------------

#[test]
fn ore_becomes_a_bar_then_a_sword_part() {
    let mut sim = sim(8, 1);
    let ore = material(&sim, catalog::IRON, catalog::ORE);
    let ore = sim.add_object(ore, 0, 0).unwrap();
    let furnace = sim.add_object(ObjectKind::Furnace, 3, 0).unwrap();
    let anvil = sim.add_object(ObjectKind::Anvil, 5, 0).unwrap();

    slide(&mut sim, ore, Direction::East);
    run(&mut sim, 60);

    assert!(!sim.grid().is_alive(ore));
    assert_eq!(sim.grid().object(furnace).unwrap().position(), (3, 0));
    assert_eq!(sim.grid().object(anvil).unwrap().position(), (5, 0));

    let (_, object, part) = sim.grid().material_at(7, 0).unwrap();
    assert_eq!(part.element, catalog::IRON);
    assert!(part.component == catalog::TIP || part.component == catalog::BLADE);
    assert_eq!(object.facing(), Direction::East);
    assert_eq!(sim.grid().object_count(), 3);

    let effects: Vec<EffectKind> = sim
        .journal()
        .entries()
        .filter_map(|e| match e.event {
            SimEvent::Effect { kind, .. } => Some(kind),
            _ => None,
        })
        .collect();
    assert_eq!(effects, vec![EffectKind::Smoke, EffectKind::Sparks]);
}

#[test]
fn sliding_the_tip_home_forges_a_sword() {
    let mut sim = sim(5, 1);
    let handle = material(&sim, catalog::GOLD, catalog::HANDLE);
    let blade = material(&sim, catalog::IRON, catalog::BLADE);
    let tip = material(&sim, catalog::IRON, catalog::TIP);
    sim.add_object(Blueprint::from(handle).facing(Direction::East), 0, 0)
        .unwrap();
    sim.add_object(Blueprint::from(blade).facing(Direction::East), 1, 0)
        .unwrap();
    let tip = sim
        .add_object(Blueprint::from(tip).facing(Direction::East), 4, 0)
        .unwrap();

    slide(&mut sim, tip, Direction::West);
    run(&mut sim, 20);

    assert_eq!(sim.grid().object_count(), 0);
    assert_eq!(sim.economy().swords, 1);
    // Three straight-set parts: 15 base, doubled by the set.
    assert_eq!(sim.economy().coins, 30);

    let craft = sim.journal().crafts().next().unwrap();
    match &craft.event {
        SimEvent::Crafted {
            recipe,
            cells,
            reward,
            notes,
        } => {
            assert_eq!(recipe, "Sword");
            assert_eq!(cells, &vec![(0, 0), (1, 0), (2, 0)]);
            assert_eq!(*reward, 30);
            assert_eq!(notes, &vec!["Size 3 sword".to_owned(), "Set: Straight".to_owned()]);
        }
        other => panic!("unexpected event {other:?}"),
    }
}

#[test]
fn a_tip_facing_the_wrong_way_is_not_forged() {
    let mut sim = sim(5, 1);
    let handle = material(&sim, catalog::GOLD, catalog::HANDLE);
    let tip = material(&sim, catalog::IRON, catalog::TIP);
    sim.add_object(Blueprint::from(handle).facing(Direction::East), 0, 0)
        .unwrap();
    let tip = sim
        .add_object(Blueprint::from(tip).facing(Direction::West), 4, 0)
        .unwrap();

    slide(&mut sim, tip, Direction::West);
    run(&mut sim, 20);

    assert_eq!(sim.grid().object(tip).unwrap().position(), (1, 0));
    assert_eq!(sim.economy().swords, 0);
}

// -- economy ------------------------------------------------------------------

#[test]
fn discount_applies_to_later_purchases() {
    let mut sim = Simulation::new(SimConfig {
        columns: 4,
        rows: 4,
        starting_coins: 20,
        ..Default::default()
    });
    sim.economy_mut().swords = 3;
    assert!(sim.buy_upgrade(Upgrade::Discount));
    assert_eq!(sim.economy().swords, 0);

    sim.purchase(ShopItem::Furnace, 0, 0).unwrap();
    assert_eq!(sim.economy().coins, 12);
    sim.purchase(ShopItem::Bucket, 1, 0).unwrap();
    assert_eq!(sim.economy().coins, 8);

    assert!(sim.journal().entries().any(|e| matches!(
        &e.event,
        SimEvent::Purchased { item, coins: 8, .. } if item == "Furnace"
    )));
}

#[test]
fn sturdy_warriors_come_out_of_the_shop_with_three_health() {
    let mut sim = Simulation::new(SimConfig {
        columns: 4,
        rows: 4,
        starting_coins: 100,
        ..Default::default()
    });
    let weak = sim.purchase(ShopItem::Warrior, 0, 0).unwrap();
    sim.economy_mut().swords = 1;
    assert!(sim.buy_upgrade(Upgrade::Sturdy));
    let strong = sim.purchase(ShopItem::Warrior, 1, 0).unwrap();

    assert_eq!(sim.grid().object(weak).unwrap().hp, Some(HitPoints::full(1)));
    assert_eq!(sim.grid().object(strong).unwrap().hp, Some(HitPoints::full(3)));
}

#[test]
fn mule_sales_feed_the_purse() {
    let mut sim = sim(6, 1);
    let bar = material(&sim, catalog::IRON, catalog::BAR);
    sim.add_object(bar, 1, 0).unwrap();
    sim.add_object(bar, 3, 0).unwrap();
    let mule = sim.add_object(ObjectKind::Mule, 0, 0).unwrap();

    slide(&mut sim, mule, Direction::East);
    run(&mut sim, 60);

    assert_eq!(sim.economy().coins, 10);
    assert_eq!(sim.grid().object(mule).unwrap().position(), (5, 0));
    assert_eq!(sim.grid().object_count(), 1);
}

// -- combat -------------------------------------------------------------------

#[test]
fn a_sturdy_warrior_survives_a_goblin() {
    let mut sim = Simulation::new(SimConfig {
        columns: 3,
        rows: 1,
        ..Default::default()
    });
    let warrior = sim
        .add_object(
            Blueprint::from(ObjectKind::Warrior).with_hit_points(HitPoints::full(3)),
            0,
            0,
        )
        .unwrap();
    let goblin = sim.add_object(ObjectKind::Goblin, 2, 0).unwrap();

    slide(&mut sim, warrior, Direction::East);
    run(&mut sim, 20);

    assert!(!sim.grid().is_alive(goblin));
    assert_eq!(sim.grid().object(warrior).unwrap().hp, Some(HitPoints::new(2, 3)));
    assert_eq!(sim.grid().object(warrior).unwrap().position(), (1, 0));
}

#[test]
fn a_warrior_bumps_every_goblin_in_the_next_cell() {
    let mut sim = sim(3, 1);
    let warrior = sim
        .add_object(
            Blueprint::from(ObjectKind::Warrior).with_hit_points(HitPoints::full(5)),
            0,
            0,
        )
        .unwrap();
    let brutes: Vec<ObjectId> = (0..2)
        .map(|_| {
            sim.add_object(
                Blueprint::from(ObjectKind::GoblinBrute).with_hit_points(HitPoints::full(3)),
                2,
                0,
            )
            .unwrap()
        })
        .collect();

    slide(&mut sim, warrior, Direction::East);
    run(&mut sim, 60);

    for brute in brutes {
        assert_eq!(sim.grid().object(brute).unwrap().hp, Some(HitPoints::new(2, 3)));
    }
    let warrior = sim.grid().object(warrior).unwrap();
    assert_eq!(warrior.position(), (1, 0));
    assert_eq!(warrior.hp, Some(HitPoints::new(3, 5)));
}
