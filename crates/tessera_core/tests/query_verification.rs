//! # Query Verification Tests
//!
//! Checks the query engine against a brute-force reference:
//!
//! 1. **Predicate**: required/excluded/liveness combine as documented
//! 2. **Order**: indices are strictly ascending
//! 3. **Freshness**: every evaluation sees the storages as they are now
//!
//! Run with: cargo test --test query_verification

use tessera_core::{Entities, MapStorage, MarkerStorage, Query, Storage, VecStorage};

#[derive(Clone, Copy, Debug, Default, PartialEq)]
struct Position {
    x: i32,
    y: i32,
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
struct Velocity {
    dx: i32,
    dy: i32,
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
struct Frozen;

/// Deterministic population: every slot has a position, every third a
/// velocity, every fifth is frozen, every seventh is killed.
///
/// Kills happen after all creations, so no slot is reused and slot `i`
/// belongs to the `i`-th entity.
fn populate(
    count: usize,
) -> (
    Entities,
    VecStorage<Position>,
    MapStorage<Velocity>,
    MarkerStorage<Frozen>,
) {
    let mut entities = Entities::new();
    let mut positions = VecStorage::new();
    let mut velocities = MapStorage::new();
    let mut frozen = MarkerStorage::new();

    let handles: Vec<_> = (0..count).map(|_| entities.create(true)).collect();
    for (i, e) in handles.iter().enumerate() {
        let slot = e.slot();
        assert_eq!(slot, i);
        positions.insert(slot, Position { x: i as i32, y: 0 });
        if i % 3 == 0 {
            velocities.insert(slot, Velocity { dx: 1, dy: 2 });
        }
        if i % 5 == 0 {
            frozen.insert(slot, Frozen);
        }
    }
    for e in handles.iter().step_by(7) {
        assert!(entities.kill(*e));
    }
    (entities, positions, velocities, frozen)
}

#[test]
fn verify_population_layout() {
    let (entities, positions, velocities, frozen) = populate(50);

    assert_eq!(entities.len(), 50);
    assert_eq!(positions.len(), 50);
    assert_eq!(entities.alive_count(), 50 - 8);
    assert!(velocities.contains(21) && frozen.contains(20));
    assert!(entities.get(21).is_some_and(|e| !entities.is_alive(e)));
    assert_eq!(positions[49], Position { x: 49, y: 0 });
}

// ============================================================================
// PREDICATE
// ============================================================================

#[test]
fn verify_matches_brute_force_reference() {
    let (entities, positions, velocities, frozen) = populate(500);

    let query = Query::new((&positions, &velocities))
        .without(&frozen)
        .alive(&entities);
    let got: Vec<usize> = query.indices().collect();

    let expected: Vec<usize> = (0..entities.len())
        .filter(|&i| positions.contains(i) && velocities.contains(i))
        .filter(|&i| !frozen.contains(i))
        .filter(|&i| entities.get(i).is_some_and(|e| entities.is_alive(e)))
        .collect();

    assert_eq!(got, expected);
    assert_eq!(query.count(), expected.len());
    assert!(!got.is_empty());
}

#[test]
fn verify_without_alive_filter_includes_dead_slots() {
    let (entities, positions, velocities, _) = populate(50);

    let with_dead = Query::new((&positions, &velocities)).count();
    let alive_only = Query::new((&positions, &velocities))
        .alive(&entities)
        .count();

    // Slots 0, 21 and 42 carry a velocity but were killed.
    assert_eq!(with_dead, alive_only + 3);
}

#[test]
fn verify_empty_required_storage_yields_nothing() {
    let (entities, positions, _, _) = populate(20);
    let empty: MapStorage<Velocity> = MapStorage::new();

    let query = Query::new((&positions, &empty)).alive(&entities);
    assert_eq!(query.count(), 0);
    assert_eq!(query.iter().count(), 0);
}

#[test]
fn verify_multiple_exclusions() {
    let (_, positions, velocities, frozen) = populate(30);

    let query = Query::new(&positions).without(&velocities).without(&frozen);
    let got: Vec<usize> = query.indices().collect();
    assert!(got.iter().all(|&i| i % 3 != 0 && i % 5 != 0));
    assert_eq!(got.len(), 30 - 10 - 6 + 2);
}

// ============================================================================
// ORDER
// ============================================================================

#[test]
fn verify_indices_strictly_ascending() {
    let mut sparse: MapStorage<u8> = MapStorage::new();
    for index in [900, 3, 77, 64, 63, 65, 1_000] {
        sparse.insert(index, 0);
    }

    let got: Vec<usize> = Query::new(&sparse).indices().collect();
    assert_eq!(got, vec![3, 63, 64, 65, 77, 900, 1_000]);
    assert!(got.windows(2).all(|pair| pair[0] < pair[1]));
}

// ============================================================================
// FRESHNESS
// ============================================================================

#[test]
fn verify_fresh_evaluation_sees_new_components() {
    let (entities, positions, mut velocities, _) = populate(10);

    let before = Query::new((&positions, &velocities))
        .alive(&entities)
        .count();

    velocities.insert(1, Velocity { dx: 0, dy: 0 });

    let after = Query::new((&positions, &velocities))
        .alive(&entities)
        .count();
    assert_eq!(after, before + 1);
}

#[test]
fn verify_reusing_a_query_recomputes() {
    let (_, positions, _, _) = populate(10);
    let query = Query::new(&positions);

    let first: Vec<usize> = query.indices().collect();
    let second: Vec<usize> = query.indices().collect();
    assert_eq!(first, second);
    assert_eq!(query.iter().count(), 10);
}

// ============================================================================
// MUTATION
// ============================================================================

#[test]
fn verify_integration_step() {
    let (entities, mut positions, velocities, frozen) = populate(100);

    let mut query = Query::new((&mut positions, &velocities))
        .without(&frozen)
        .alive(&entities);
    let mut moved = 0;
    let mut walk = query.iter_mut();
    while let Some((_, (position, velocity))) = walk.next() {
        position.x += velocity.dx;
        position.y += velocity.dy;
        moved += 1;
    }

    assert!(moved > 0);
    // Slot 3: velocity, not frozen, alive.
    assert_eq!(positions[3], Position { x: 4, y: 2 });
    // Slot 15: velocity but frozen.
    assert_eq!(positions[15], Position { x: 15, y: 0 });
    // Slot 21: velocity but killed.
    assert_eq!(positions[21], Position { x: 21, y: 0 });
}

#[test]
fn verify_every_alive_entity() {
    let (entities, _, _, _) = populate(14);
    let everyone: Vec<usize> = Query::new(()).alive(&entities).indices().collect();
    let expected: Vec<usize> = entities.iter().map(|e| e.slot()).collect();
    assert_eq!(everyone, expected);
    assert_eq!(everyone.len(), 12);
}
