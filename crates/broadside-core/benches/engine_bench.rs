use std::sync::Arc;

use broadside_core::{
    AttackModifiers, Coordinate, DamageCalculator, GameConfiguration, GameState, ManualClock,
    MatchId, MatchRegistry, Orientation, PlayerId, SeededRolls, Ship, ShipClass, ShipSpec,
};
use criterion::{black_box, criterion_group, criterion_main, Criterion};

const A: PlayerId = PlayerId::new(1);
const B: PlayerId = PlayerId::new(2);

fn fleet() -> Vec<ShipSpec> {
    vec![
        ShipSpec::new(1, "Carrier", ShipClass::Carrier, 5),
        ShipSpec::new(2, "Battleship", ShipClass::Battleship, 4),
        ShipSpec::new(3, "Cruiser", ShipClass::Cruiser, 3),
        ShipSpec::new(4, "Submarine", ShipClass::Submarine, 3),
        ShipSpec::new(5, "Destroyer", ShipClass::Destroyer, 2),
    ]
}

fn battle(id: u64, clock: &Arc<ManualClock>) -> GameState {
    let config = GameConfiguration {
        max_turns: None,
        stalemate_turns: 1_000,
        ..GameConfiguration::with_seed(id)
    };
    let mut game = GameState::with_sources(
        MatchId::new(id),
        config,
        Box::new(SeededRolls::new(id)),
        clock.clone(),
    )
    .unwrap();
    let specs = fleet();
    game.add_player(A, "a", &specs).unwrap();
    game.add_player(B, "b", &specs).unwrap();
    game.mark_ready(A).unwrap();
    game.mark_ready(B).unwrap();
    for player in [A, B] {
        for (row, spec) in specs.iter().enumerate() {
            let origin = Coordinate::new(0, 2 * row as i32);
            game.place_ship(player, spec.id, origin, Orientation::Horizontal)
                .unwrap();
        }
        game.mark_ready(player).unwrap();
    }
    game
}

fn bench_full_match(c: &mut Criterion) {
    let clock = Arc::new(ManualClock::new(0));

    c.bench_function("full_match_200_shots", |b| {
        b.iter(|| {
            let mut game = battle(1, &clock);
            'outer: for y in 0..10 {
                for x in 0..10 {
                    for player in [A, B] {
                        if game.outcome().is_some() {
                            break 'outer;
                        }
                        let _ = game.make_move(player, Coordinate::new(x, y)).unwrap();
                    }
                }
            }
            black_box(game.outcome().cloned())
        })
    });
}

fn bench_damage(c: &mut Criterion) {
    let ship = Ship::from_spec(&ShipSpec::new(1, "Battleship", ShipClass::Battleship, 4)).unwrap();
    let mut rolls = SeededRolls::new(9);
    let modifiers = AttackModifiers::default();

    c.bench_function("damage_calculate", |b| {
        b.iter(|| {
            DamageCalculator::calculate(
                black_box(&ship),
                Coordinate::new(0, 0),
                black_box(3),
                &modifiers,
                &mut rolls,
            )
        })
    });
}

fn bench_sweep(c: &mut Criterion) {
    let clock = Arc::new(ManualClock::new(0));
    let registry = MatchRegistry::new();
    for id in 0..256 {
        registry.insert(battle(id, &clock)).unwrap();
    }

    c.bench_function("sweep_256_matches", |b| {
        b.iter(|| black_box(registry.sweep_turn_timeouts()))
    });
}

fn bench_view(c: &mut Criterion) {
    let clock = Arc::new(ManualClock::new(0));
    let mut game = battle(3, &clock);
    for x in 0..5 {
        game.make_move(A, Coordinate::new(x, 1)).unwrap();
        game.make_move(B, Coordinate::new(x, 1)).unwrap();
    }

    c.bench_function("view_for", |b| b.iter(|| black_box(game.view_for(A))));
}

criterion_group!(benches, bench_full_match, bench_damage, bench_sweep, bench_view);
criterion_main!(benches);
