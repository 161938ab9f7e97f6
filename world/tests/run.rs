use std::{cell::RefCell, rc::Rc, time::Duration};

use hive_defence_core::{
    CellCoord, Command, DifficultyPreset, Event, GameConfig, Hostile, Presets, RejectReason,
    RunState, Snapshot, StructureKind, UpgradeTrack, Vec2,
};
use hive_defence_world::{apply, query, Session, World};

const TICK: Duration = Duration::from_millis(50);

fn build(config: GameConfig, presets: Presets) -> World {
    World::new(config, presets).expect("presets carry the defaults")
}

fn world() -> World {
    build(GameConfig::default(), Presets::default())
}

/// Presets whose default difficulty spawns three weak agents per wave.
fn small_waves(base_hp: u32, max_waves: Option<u32>) -> Presets {
    let mut presets = Presets::default();
    let _ = presets.difficulties.insert(
        "easy".to_owned(),
        DifficultyPreset {
            enemy_hp_multiplier: 1.0,
            enemy_speed_multiplier: 1.0,
            wave_multiplier: 0.34,
            starting_scrap: 10_000,
            base_hp,
        },
    );
    if let Some(mission) = presets.missions.get_mut("1") {
        mission.max_waves = max_waves;
    }
    presets
}

fn point(world: &World, column: i32, row: i32) -> Vec2 {
    query::grid(world).point_from_cell(CellCoord::new(column, row))
}

fn run(world: &mut World, command: Command) -> Result<Vec<Event>, RejectReason> {
    let mut events = Vec::new();
    apply(world, command, &mut events)?;
    Ok(events)
}

fn tick(world: &mut World) -> Vec<Event> {
    run(world, Command::Tick { dt: TICK }).expect("ticks never fail")
}

fn place(world: &mut World, kind: StructureKind, column: i32, row: i32) -> Result<Vec<Event>, RejectReason> {
    let point = point(world, column, row);
    run(world, Command::PlaceStructure { kind, point })
}

/// Ticks until `done` holds, returning every event produced on the way.
fn tick_until(world: &mut World, limit: usize, done: impl Fn(&World) -> bool) -> Vec<Event> {
    let mut events = Vec::new();
    for _ in 0..limit {
        events.extend(tick(world));
        if done(world) {
            return events;
        }
    }
    panic!("condition not reached within {limit} ticks");
}

#[test]
fn placing_a_turret_spends_scrap_and_blocks_the_cell() {
    let mut world = world();

    let events = place(&mut world, StructureKind::Turret, 15, 10).expect("open cell");

    assert_eq!(query::scrap(&world), 100);
    assert!(query::blocked(&world).contains(CellCoord::new(15, 10)));
    assert!(!query::is_buildable(&world, CellCoord::new(15, 10)));
    assert_eq!(query::towers(&world).len(), 1);
    assert!(matches!(
        events.as_slice(),
        [Event::StructurePlaced {
            kind: StructureKind::Turret,
            tower: Some(_),
            cost: 50,
            ..
        }]
    ));
}

#[test]
fn rejected_placements_leave_the_world_untouched() {
    let mut world = world();
    let blocked = query::blocked(&world).clone();
    let start = query::config(&world).start;

    assert_eq!(
        place(&mut world, StructureKind::Wall, 0, 5),
        Err(RejectReason::CellBlocked)
    );
    assert_eq!(
        run(
            &mut world,
            Command::PlaceStructure {
                kind: StructureKind::Wall,
                point: start,
            }
        ),
        Err(RejectReason::StartOrGoal)
    );
    assert_eq!(
        run(
            &mut world,
            Command::PlaceStructure {
                kind: StructureKind::Turret,
                point: Vec2::new(-30.0, 40.0),
            }
        ),
        Err(RejectReason::OutOfBounds)
    );

    place(&mut world, StructureKind::Sniper, 20, 10).expect("open cell");
    assert_eq!(
        place(&mut world, StructureKind::Sniper, 20, 12),
        Err(RejectReason::InsufficientScrap)
    );
    assert_eq!(
        place(&mut world, StructureKind::Wall, 20, 10),
        Err(RejectReason::Occupied)
    );

    assert_eq!(query::blocked(&world), &blocked.with(CellCoord::new(20, 10)));
    assert_eq!(query::scrap(&world), 70);
}

#[test]
fn sealing_the_only_corridor_is_refused() {
    let config = GameConfig {
        width: 264.0,
        height: 264.0,
        start: Vec2::new(36.0, 36.0),
        goal: Vec2::new(228.0, 228.0),
        interior_walls: (1..10)
            .filter(|column| *column != 5)
            .map(|column| CellCoord::new(column, 5))
            .collect(),
        ..GameConfig::default()
    };
    let mut world = build(config, Presets::default());
    let blocked = query::blocked(&world).clone();

    assert_eq!(
        place(&mut world, StructureKind::Wall, 5, 5),
        Err(RejectReason::PathBlocked)
    );
    assert_eq!(RejectReason::PathBlocked.to_string(), "Path blocked");
    assert_eq!(query::blocked(&world), &blocked);
    assert!(!query::blocked(&world).contains(CellCoord::new(5, 5)));
    assert_eq!(query::scrap(&world), 150);

    place(&mut world, StructureKind::Wall, 5, 7).expect("off the corridor");
}

#[test]
fn every_accepted_placement_keeps_the_base_reachable() {
    let mut world = build(GameConfig::default(), small_waves(20, None));

    let mut accepted = 0;
    for row in 1..21 {
        match place(&mut world, StructureKind::Wall, 20, row) {
            Ok(_) => accepted += 1,
            Err(reason) => assert_eq!(reason, RejectReason::PathBlocked),
        }
        let routes = query::routes(&world).expect("start stays connected to the goal");
        let grid = query::grid(&world);
        for route in routes.routes() {
            assert!(route
                .points()
                .iter()
                .all(|point| !query::blocked(&world).contains(grid.cell_from_point(*point))));
        }
    }

    assert_eq!(accepted, 19, "exactly one gap must remain in the column");
}

#[test]
fn selling_refunds_the_cumulative_investment() {
    let mut world = world();
    let turret = point(&world, 12, 12);

    place(&mut world, StructureKind::Turret, 12, 12).expect("open cell");
    run(
        &mut world,
        Command::Upgrade {
            point: turret,
            track: UpgradeTrack::Damage,
        },
    )
    .expect("affordable upgrade");
    assert_eq!(query::scrap(&world), 30);

    let events = run(&mut world, Command::Sell { point: turret }).expect("tower present");

    assert_eq!(
        events,
        vec![Event::StructureSold {
            kind: StructureKind::Turret,
            cell: CellCoord::new(12, 12),
            refund: 72,
        }]
    );
    assert_eq!(query::scrap(&world), 102);
    assert!(query::is_buildable(&world, CellCoord::new(12, 12)));
    assert_eq!(
        run(&mut world, Command::Sell { point: turret }),
        Err(RejectReason::NothingToSell)
    );
}

#[test]
fn walls_sell_but_the_layout_does_not() {
    let mut world = world();

    place(&mut world, StructureKind::Wall, 14, 3).expect("open cell");
    assert_eq!(query::player_walls(&world), vec![CellCoord::new(14, 3)]);
    let wall = point(&world, 14, 3);
    let events = run(&mut world, Command::Sell { point: wall }).expect("player wall");
    assert!(matches!(
        events.as_slice(),
        [Event::StructureSold {
            kind: StructureKind::Wall,
            refund: 12,
            ..
        }]
    ));
    assert_eq!(query::scrap(&world), 142);

    let border = point(&world, 0, 3);
    let layout = point(&world, 8, 4);
    assert_eq!(
        run(&mut world, Command::Sell { point: border }),
        Err(RejectReason::NothingToSell)
    );
    assert_eq!(
        run(&mut world, Command::Sell { point: layout }),
        Err(RejectReason::NothingToSell)
    );
}

#[test]
fn upgrade_tracks_cap_independently() {
    let mut world = build(GameConfig::default(), small_waves(20, None));
    let turret = point(&world, 12, 12);
    place(&mut world, StructureKind::Turret, 12, 12).expect("open cell");

    let upgrade = |track| Command::Upgrade {
        point: turret,
        track,
    };
    let events = run(&mut world, upgrade(UpgradeTrack::Damage)).expect("tier 2");
    assert!(matches!(
        events.as_slice(),
        [Event::TowerUpgraded { tier: 2, cost: 70, .. }]
    ));
    run(&mut world, upgrade(UpgradeTrack::Damage)).expect("tier 3");
    assert_eq!(
        run(&mut world, upgrade(UpgradeTrack::Damage)),
        Err(RejectReason::MaxTier)
    );
    run(&mut world, upgrade(UpgradeTrack::FireRate)).expect("other track untouched");

    let tower = &query::towers(&world)[0];
    assert!((tower.damage() - 34.0).abs() < 1e-4);
    assert!((tower.fire_interval() - 0.55 * 0.88).abs() < 1e-4);
    assert_eq!(tower.invested(), 50 + 3 * 70);

    let empty = point(&world, 13, 12);
    assert_eq!(
        run(
            &mut world,
            Command::Upgrade {
                point: empty,
                track: UpgradeTrack::Damage,
            }
        ),
        Err(RejectReason::NoTower)
    );
}

#[test]
fn run_state_machine_guards_transitions() {
    let mut world = world();

    assert_eq!(
        run(&mut world, Command::TogglePause),
        Err(RejectReason::NotRunning)
    );
    run(&mut world, Command::Start).expect("idle run starts");
    assert_eq!(
        run(&mut world, Command::Start),
        Err(RejectReason::AlreadyRunning)
    );

    let events = run(&mut world, Command::TogglePause).expect("running run pauses");
    assert_eq!(
        events,
        vec![Event::RunStateChanged {
            from: RunState::Running,
            to: RunState::Paused,
        }]
    );
    assert!(query::snapshot(&world).paused);
    assert_eq!(
        place(&mut world, StructureKind::Wall, 14, 3),
        Err(RejectReason::Paused)
    );

    run(&mut world, Command::TogglePause).expect("paused run resumes");
    assert_eq!(query::run_state(&world), RunState::Running);
}

#[test]
fn pausing_freezes_the_simulation() {
    let mut world = world();
    run(&mut world, Command::Start).expect("idle run starts");
    let _ = tick_until(&mut world, 100, |world| !query::agents(world).is_empty());
    let _ = tick(&mut world);
    run(&mut world, Command::TogglePause).expect("running run pauses");

    let before = query::snapshot(&world);
    let position = query::agents(&world)[0].position();
    for _ in 0..20 {
        assert!(tick(&mut world).is_empty());
    }

    assert_eq!(query::snapshot(&world), before);
    assert_eq!(query::agents(&world)[0].position(), position);
}

#[test]
fn long_ticks_are_clamped() {
    let mut world = world();
    run(&mut world, Command::Start).expect("idle run starts");

    let events = run(
        &mut world,
        Command::Tick {
            dt: Duration::from_secs(3),
        },
    )
    .expect("ticks never fail");

    assert_eq!(events[0], Event::TimeAdvanced { dt: TICK });
    assert!(query::agents(&world).is_empty(), "one clamped tick is too short to spawn");
}

#[test]
fn spawns_follow_the_configured_interval() {
    let mut world = world();
    run(&mut world, Command::Start).expect("idle run starts");

    for _ in 0..14 {
        let _ = tick(&mut world);
    }
    assert!(query::agents(&world).is_empty());

    let events = tick(&mut world);
    assert!(events.iter().any(|event| matches!(
        event,
        Event::AgentSpawned { class, .. } if class == "ant"
    )));
    assert_eq!(query::agents(&world).len(), 1);
    assert_eq!(query::spawn_queue(&world), 6);
    let route = query::agents(&world)[0].route().expect("crawlers spawn with a route");
    assert!(!route.is_empty());
}

#[test]
fn wave_advances_once_after_every_agent_resolves() {
    let mut world = build(GameConfig::default(), small_waves(20, None));
    let started = run(&mut world, Command::Start).expect("idle run starts");
    assert!(started.contains(&Event::WaveStarted { wave: 1, quota: 3 }));

    let events = tick_until(&mut world, 4_000, |world| query::wave(world) == 2);

    let arrivals = events
        .iter()
        .filter(|event| matches!(event, Event::AgentReachedBase { .. }))
        .count();
    let wave_starts: Vec<_> = events
        .iter()
        .filter(|event| matches!(event, Event::WaveStarted { .. }))
        .collect();
    assert_eq!(arrivals, 3);
    assert_eq!(wave_starts, vec![&Event::WaveStarted { wave: 2, quota: 4 }]);
    assert!(query::agents(&world).is_empty());
    assert_eq!(query::spawn_queue(&world), 4);
    assert_eq!(query::base_hp(&world), 17);
    assert_eq!(query::scrap(&world), 10_000, "arrivals pay no bounty");
}

#[test]
fn clearing_the_final_wave_wins() {
    let mut world = build(GameConfig::default(), small_waves(20, Some(1)));
    run(&mut world, Command::Start).expect("idle run starts");

    let events = tick_until(&mut world, 4_000, |world| {
        query::run_state(world) != RunState::Running
    });

    assert_eq!(query::run_state(&world), RunState::Victory);
    assert_eq!(query::wave(&world), 1);
    assert!(events.contains(&Event::RunStateChanged {
        from: RunState::Running,
        to: RunState::Victory,
    }));
    assert_eq!(
        run(&mut world, Command::Start),
        Err(RejectReason::RunFinished)
    );

    run(&mut world, Command::Restart).expect("restart starts a fresh run");
    assert_eq!(query::run_state(&world), RunState::Running);
    assert_eq!(query::base_hp(&world), 20);
}

#[test]
fn losing_the_base_ends_the_run() {
    let mut world = build(GameConfig::default(), small_waves(2, None));
    run(&mut world, Command::Start).expect("idle run starts");

    let _ = tick_until(&mut world, 4_000, |world| {
        query::run_state(world) != RunState::Running
    });

    assert_eq!(query::run_state(&world), RunState::Over);
    assert_eq!(query::base_hp(&world), 0);
    assert_eq!(
        place(&mut world, StructureKind::Wall, 14, 3),
        Err(RejectReason::GameOver)
    );
    assert_eq!(
        run(&mut world, Command::TogglePause),
        Err(RejectReason::NotRunning)
    );
    assert!(tick(&mut world).is_empty());
}

#[test]
fn traps_fire_once_and_credit_kills() {
    let mut world = world();
    let start = query::config(&world).start;
    let events = run(&mut world, Command::PlaceTrap { point: start }).expect("start cell is open");
    assert_eq!(
        events,
        vec![Event::TrapPlaced {
            cell: CellCoord::new(3, 5),
            cost: 30,
        }]
    );
    assert_eq!(
        run(&mut world, Command::PlaceTrap { point: start }),
        Err(RejectReason::TrapPresent)
    );
    assert_eq!(query::scrap(&world), 120);

    run(&mut world, Command::Start).expect("idle run starts");
    let events = tick_until(&mut world, 100, |world| query::traps(world).is_empty());

    let triggered: Vec<_> = events
        .iter()
        .filter_map(|event| match event {
            Event::TrapTriggered { agent, .. } => Some(*agent),
            _ => None,
        })
        .collect();
    assert_eq!(triggered.len(), 1);
    assert!(events.contains(&Event::AgentKilled {
        agent: triggered[0],
        bounty: 15,
    }));
    assert_eq!(query::scrap(&world), 135);
}

#[test]
fn economy_balances_costs_bounties_and_refunds() {
    let mut world = build(GameConfig::default(), small_waves(20, None));
    let initial = query::scrap(&world);

    let mut events = Vec::new();
    for (kind, column, row) in [
        (StructureKind::Turret, 5, 3),
        (StructureKind::Turret, 5, 7),
        (StructureKind::Sniper, 10, 9),
        (StructureKind::Wall, 12, 4),
    ] {
        events.extend(place(&mut world, kind, column, row).expect("open cell"));
    }
    let sniper = point(&world, 10, 9);
    events.extend(
        run(
            &mut world,
            Command::Upgrade {
                point: sniper,
                track: UpgradeTrack::FireRate,
            },
        )
        .expect("affordable upgrade"),
    );
    events.extend(run(&mut world, Command::Start).expect("idle run starts"));
    events.extend(tick_until(&mut world, 4_000, |world| query::wave(world) == 2));
    let wall = point(&world, 12, 4);
    events.extend(run(&mut world, Command::Sell { point: wall }).expect("player wall"));

    let mut expected = i64::from(initial);
    for event in &events {
        match event {
            Event::StructurePlaced { cost, .. }
            | Event::TrapPlaced { cost, .. }
            | Event::TowerUpgraded { cost, .. } => expected -= i64::from(*cost),
            Event::AgentKilled { bounty, .. } => expected += i64::from(*bounty),
            Event::StructureSold { refund, .. } => expected += i64::from(*refund),
            _ => {}
        }
    }
    assert_eq!(i64::from(query::scrap(&world)), expected);
    assert!(events
        .iter()
        .any(|event| matches!(event, Event::ProjectileFired { .. })));
}

#[test]
fn building_mid_wave_reroutes_crawling_agents() {
    let mut world = build(GameConfig::default(), small_waves(20, None));
    run(&mut world, Command::Start).expect("idle run starts");
    let _ = tick_until(&mut world, 100, |world| !query::agents(world).is_empty());
    for _ in 0..10 {
        let _ = tick(&mut world);
    }

    let grid = query::grid(&world);
    let agent = &query::agents(&world)[0];
    let waypoint = agent.waypoint().expect("crawler follows a route");
    let route = agent.route().expect("crawler follows a route").clone();
    let ahead = route
        .points()
        .iter()
        .skip(waypoint + 4)
        .map(|point| grid.cell_from_point(*point))
        .find(|cell| query::is_buildable(&world, *cell))
        .expect("open cells lie ahead of the agent");

    place(&mut world, StructureKind::Wall, ahead.column(), ahead.row()).expect("single wall");

    let agent = &query::agents(&world)[0];
    let fresh = agent.route().expect("a detour exists");
    assert_ne!(fresh, &route);
    assert_eq!(agent.waypoint(), Some(0));
    assert!(fresh
        .points()
        .iter()
        .all(|point| grid.cell_from_point(*point) != ahead));
}

#[test]
fn presets_reset_the_run() {
    let mut world = world();
    place(&mut world, StructureKind::Wall, 14, 3).expect("open cell");
    run(&mut world, Command::Start).expect("idle run starts");

    let events = run(
        &mut world,
        Command::SetDifficulty {
            id: "hard".to_owned(),
        },
    )
    .expect("known difficulty");

    assert_eq!(
        events,
        vec![
            Event::RunReset,
            Event::RunStateChanged {
                from: RunState::Running,
                to: RunState::Idle,
            },
        ]
    );
    assert_eq!(query::difficulty(&world).0, "hard");
    assert_eq!(query::scrap(&world), 75);
    assert_eq!(query::base_hp(&world), 15);
    assert!(query::player_walls(&world).is_empty());
    assert!(!query::blocked(&world).contains(CellCoord::new(14, 3)));

    run(
        &mut world,
        Command::SetMission {
            id: "3".to_owned(),
        },
    )
    .expect("known mission");
    assert_eq!(query::mission(&world).1.max_waves, None);

    assert_eq!(
        run(
            &mut world,
            Command::SetDifficulty {
                id: "nightmare".to_owned(),
            }
        ),
        Err(RejectReason::UnknownDifficulty("nightmare".to_owned()))
    );
    assert_eq!(
        run(
            &mut world,
            Command::SetMission {
                id: "9".to_owned(),
            }
        ),
        Err(RejectReason::UnknownMission("9".to_owned()))
    );
    assert_eq!(query::difficulty(&world).0, "hard");
    assert_eq!(query::mission(&world).0, "3");
}

#[test]
fn seeded_runs_replay_identically() {
    fn record() -> Vec<Event> {
        let mut world = build(GameConfig::default(), Presets::default());
        let mut events = Vec::new();
        events.extend(place(&mut world, StructureKind::Turret, 6, 4).expect("open cell"));
        events.extend(place(&mut world, StructureKind::Wall, 12, 9).expect("open cell"));
        events.extend(run(&mut world, Command::Start).expect("idle run starts"));
        for _ in 0..600 {
            events.extend(tick(&mut world));
        }
        events
    }

    let first = record();
    assert_eq!(first, record());
    assert!(first
        .iter()
        .any(|event| matches!(event, Event::AgentSpawned { .. })));
}

#[test]
fn session_reports_every_change_and_resets_timing_on_resume() {
    let snapshots = Rc::new(RefCell::new(Vec::<Snapshot>::new()));
    let sink = Rc::clone(&snapshots);
    let mut session = Session::new(world(), move |snapshot: &Snapshot| {
        sink.borrow_mut().push(*snapshot);
    });
    assert_eq!(snapshots.borrow().len(), 1);

    session.frame(Duration::from_millis(100));
    assert_eq!(snapshots.borrow().len(), 1, "idle frames change nothing");

    assert_eq!(
        session.perform(Command::TogglePause),
        Err(RejectReason::NotRunning)
    );
    assert_eq!(snapshots.borrow().len(), 1, "rejections are not reported");

    session.perform(Command::Start).expect("idle run starts");
    assert_eq!(snapshots.borrow().len(), 2);

    session.frame(Duration::from_millis(1_000));
    assert_eq!(session.events()[0], Event::TimeAdvanced { dt: Duration::ZERO });
    session.frame(Duration::from_millis(1_016));
    assert_eq!(
        session.events()[0],
        Event::TimeAdvanced {
            dt: Duration::from_millis(16),
        }
    );
    session.frame(Duration::from_millis(2_000));
    assert_eq!(session.events()[0], Event::TimeAdvanced { dt: TICK });
    assert_eq!(snapshots.borrow().len(), 5);

    session.perform(Command::TogglePause).expect("pauses");
    session.frame(Duration::from_millis(9_000));
    assert!(session.events().is_empty());
    session.perform(Command::TogglePause).expect("resumes");
    session.frame(Duration::from_millis(9_016));
    assert_eq!(
        session.events()[0],
        Event::TimeAdvanced { dt: Duration::ZERO },
        "resume starts from a fresh baseline"
    );

    let last = *snapshots.borrow().last().expect("snapshots recorded");
    assert_eq!(last.run_state, RunState::Running);
    assert!(!last.paused);
    assert_eq!(query::run_state(session.world()), RunState::Running);
}

#[test]
fn resuming_or_restarting_without_paused_frames_starts_a_fresh_baseline() {
    let mut session = Session::new(world(), |_: &Snapshot| {});
    session.perform(Command::Start).expect("idle run starts");
    session.frame(Duration::from_millis(1_000));
    session.frame(Duration::from_millis(1_016));

    session.perform(Command::TogglePause).expect("pauses");
    session.perform(Command::TogglePause).expect("resumes");
    session.frame(Duration::from_millis(11_016));
    assert_eq!(session.events()[0], Event::TimeAdvanced { dt: Duration::ZERO });

    session.frame(Duration::from_millis(11_032));
    session.perform(Command::Restart).expect("running run restarts");
    session.frame(Duration::from_millis(20_000));
    assert_eq!(session.events()[0], Event::TimeAdvanced { dt: Duration::ZERO });
    assert_eq!(query::wave(session.world()), 1);
    assert_eq!(query::run_state(session.world()), RunState::Running);
}
