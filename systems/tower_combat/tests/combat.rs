use hive_defence_core::{
    AgentId, CellCoord, GameConfig, Hostile, StructureKind, TowerId, UpgradeTrack, Vec2,
};
use hive_defence_system_tower_combat::{Ballistics, Impact, Projectile, Tower, Trap, TrapHit};

#[derive(Debug)]
struct Target {
    id: AgentId,
    position: Vec2,
    hp: f32,
    destroyed: bool,
    slow: Option<(f32, f32)>,
}

impl Target {
    fn at(id: u32, x: f32, y: f32, hp: f32) -> Self {
        Self {
            id: AgentId::new(id),
            position: Vec2::new(x, y),
            hp,
            destroyed: false,
            slow: None,
        }
    }
}

impl Hostile for Target {
    fn id(&self) -> AgentId {
        self.id
    }

    fn position(&self) -> Vec2 {
        self.position
    }

    fn radius(&self) -> f32 {
        12.0
    }

    fn is_destroyed(&self) -> bool {
        self.destroyed
    }

    fn apply_damage(&mut self, amount: f32) -> bool {
        if self.destroyed {
            return false;
        }
        self.hp -= amount;
        self.destroyed = self.hp <= 0.0;
        self.destroyed
    }

    fn apply_slow(&mut self, factor: f32, duration: f32) {
        self.slow = Some((factor, duration));
    }
}

fn ballistics() -> Ballistics {
    Ballistics {
        muzzle_offset: 16.0,
        projectile_radius: 5.0,
    }
}

fn turret_at(position: Vec2) -> Tower {
    let config = GameConfig::default();
    Tower::new(
        TowerId::new(1),
        StructureKind::Turret,
        CellCoord::new(0, 0),
        position,
        &config.turret,
        config.costs.turret,
    )
}

#[test]
fn tower_fires_on_nearest_agent_then_waits_for_cooldown() {
    let mut tower = turret_at(Vec2::ZERO);
    let agents = [
        Target::at(1, 120.0, 0.0, 50.0),
        Target::at(2, 60.0, 0.0, 50.0),
        Target::at(3, 400.0, 0.0, 50.0),
    ];
    let mut projectiles = Vec::new();

    assert_eq!(
        tower.update(0.016, &agents, ballistics(), &mut projectiles),
        Some(AgentId::new(2))
    );
    assert_eq!(projectiles.len(), 1);
    assert_eq!(projectiles[0].target(), AgentId::new(2));
    assert_eq!(projectiles[0].source(), TowerId::new(1));
    assert!((tower.cooldown() - 0.55).abs() < 1e-6);

    assert_eq!(tower.update(0.5, &agents, ballistics(), &mut projectiles), None);
    assert_eq!(projectiles.len(), 1);
    assert_eq!(
        tower.update(0.06, &agents, ballistics(), &mut projectiles),
        Some(AgentId::new(2))
    );
    assert_eq!(projectiles.len(), 2);
}

#[test]
fn first_shot_leaves_from_current_facing() {
    let mut tower = turret_at(Vec2::ZERO);
    let agents = [Target::at(1, 100.0, 0.0, 50.0)];
    let mut projectiles = Vec::new();

    let _ = tower.update(0.01, &agents, ballistics(), &mut projectiles);

    let muzzle = projectiles[0].position();
    assert!((muzzle.length() - 16.0).abs() < 1e-4);
    assert!(muzzle.y < -15.0, "turret had barely turned away from straight up");
    assert!(tower.angle() > -std::f32::consts::FRAC_PI_2);
}

#[test]
fn tower_without_targets_keeps_cooling_down() {
    let mut tower = turret_at(Vec2::ZERO);
    let far = [Target::at(1, 500.0, 0.0, 50.0)];
    let mut projectiles = Vec::new();
    assert_eq!(tower.update(0.1, &far, ballistics(), &mut projectiles), None);
    assert!(projectiles.is_empty());
    assert_eq!(tower.cooldown(), 0.0);
}

#[test]
fn projectile_damages_exactly_once() {
    let mut agents = [Target::at(7, 10.0, 0.0, 18.0)];
    let mut first = Projectile::new(TowerId::new(1), AgentId::new(7), Vec2::ZERO, 460.0, 18.0, 5.0);
    let mut second = Projectile::new(
        TowerId::new(1),
        AgentId::new(7),
        Vec2::new(-200.0, 0.0),
        460.0,
        18.0,
        5.0,
    );

    assert_eq!(
        first.update(0.016, &mut agents),
        Impact::Hit {
            agent: AgentId::new(7),
            killed: true,
        }
    );
    assert!(first.is_spent());
    assert!(agents[0].is_destroyed());

    assert_eq!(second.update(0.016, &mut agents), Impact::Missed);
    assert!(second.is_spent());
    assert_eq!(agents[0].hp, 0.0, "no damage after the target died");
    assert_eq!(first.update(0.016, &mut agents), Impact::Spent);
}

#[test]
fn projectile_homes_until_contact() {
    let mut agents = [Target::at(3, 100.0, 0.0, 100.0)];
    let mut projectile =
        Projectile::new(TowerId::new(1), AgentId::new(3), Vec2::ZERO, 460.0, 18.0, 5.0);

    assert_eq!(projectile.update(0.1, &mut agents), Impact::InFlight);
    assert!((projectile.position().x - 46.0).abs() < 1e-3);

    agents[0].position = Vec2::new(46.0, 10.0);
    assert_eq!(
        projectile.update(0.1, &mut agents),
        Impact::Hit {
            agent: AgentId::new(3),
            killed: false,
        }
    );
    assert!((agents[0].hp - 82.0).abs() < 1e-4);
}

#[test]
fn projectile_misses_when_target_left_the_collection() {
    let mut agents: [Target; 0] = [];
    let mut projectile =
        Projectile::new(TowerId::new(1), AgentId::new(9), Vec2::ZERO, 460.0, 18.0, 5.0);
    assert_eq!(projectile.update(0.1, &mut agents), Impact::Missed);
}

#[test]
fn upgrade_tracks_buff_independently() {
    let config = GameConfig::default();
    let mut tower = turret_at(Vec2::ZERO);

    assert_eq!(tower.upgrade(UpgradeTrack::Damage, &config.upgrades, 70), 2);
    assert!((tower.damage() - 26.0).abs() < 1e-4);
    assert_eq!(tower.tier(UpgradeTrack::FireRate), 1);

    assert_eq!(tower.upgrade(UpgradeTrack::FireRate, &config.upgrades, 70), 2);
    assert!((tower.fire_interval() - 0.55 * 0.88).abs() < 1e-5);
    assert_eq!(tower.invested(), 50 + 70 + 70);

    let mut fast = tower.clone();
    for _ in 0..20 {
        let _ = fast.upgrade(UpgradeTrack::FireRate, &config.upgrades, 0);
    }
    assert!((fast.fire_interval() - 0.22).abs() < 1e-6, "interval floors");
}

#[test]
fn trap_fires_once_on_first_agent_in_radius() {
    let config = GameConfig::default();
    let mut trap = Trap::new(CellCoord::new(4, 4), Vec2::new(108.0, 108.0), &config.trap);
    let mut agents = [
        Target::at(1, 300.0, 300.0, 100.0),
        Target::at(2, 120.0, 108.0, 100.0),
        Target::at(3, 108.0, 108.0, 100.0),
    ];

    assert_eq!(
        trap.resolve(&mut agents),
        Some(TrapHit {
            agent: AgentId::new(2),
            killed: false,
        })
    );
    assert!(trap.is_used());
    assert!((agents[1].hp - 62.0).abs() < 1e-4);
    assert_eq!(agents[1].slow, Some((0.55, 2.5)));
    assert_eq!(agents[2].hp, 100.0);

    assert_eq!(trap.resolve(&mut agents), None, "traps never fire twice");
}

#[test]
fn trap_damage_can_kill() {
    let config = GameConfig::default();
    let mut trap = Trap::new(CellCoord::new(1, 1), Vec2::new(36.0, 36.0), &config.trap);
    let mut agents = [Target::at(5, 40.0, 40.0, 30.0)];

    let hit = trap.resolve(&mut agents).expect("agent stands on the trap");
    assert!(hit.killed);
    assert!(agents[0].is_destroyed());
}
