//! Registry of player-built structures.

use std::collections::BTreeMap;

use hive_defence_core::{CellCoord, StructureKind, TowerId, TowerSpec, UpgradeTrack, Vec2};
use hive_defence_system_tower_combat::Tower;

/// Structure removed from the registry by a sale.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Removed {
    /// Kind of structure that stood on the cell.
    pub(crate) kind: StructureKind,
    /// Scrap spent on it over its lifetime.
    pub(crate) invested: u32,
}

/// Stores towers and player walls and manages tower identifier allocation.
///
/// Border and layout walls never enter the registry, which is what keeps them
/// from being sold.
#[derive(Debug)]
pub(crate) struct TowerRegistry {
    towers: Vec<Tower>,
    walls: BTreeMap<CellCoord, u32>,
    next_tower_id: TowerId,
}

impl TowerRegistry {
    /// Creates an empty registry with a reset identifier counter.
    pub(crate) fn new() -> Self {
        Self {
            towers: Vec::new(),
            walls: BTreeMap::new(),
            next_tower_id: TowerId::new(0),
        }
    }

    pub(crate) fn towers(&self) -> &[Tower] {
        &self.towers
    }

    pub(crate) fn towers_mut(&mut self) -> &mut [Tower] {
        &mut self.towers
    }

    pub(crate) fn tower_at(&self, cell: CellCoord) -> Option<&Tower> {
        self.towers.iter().find(|tower| tower.cell() == cell)
    }

    pub(crate) fn tower_at_mut(&mut self, cell: CellCoord) -> Option<&mut Tower> {
        self.towers.iter_mut().find(|tower| tower.cell() == cell)
    }

    pub(crate) fn has_tower(&self, cell: CellCoord) -> bool {
        self.tower_at(cell).is_some()
    }

    /// Reports whether a sale at `cell` would succeed.
    pub(crate) fn is_sellable(&self, cell: CellCoord) -> bool {
        self.has_tower(cell) || self.walls.contains_key(&cell)
    }

    /// Builds a tower and returns its identifier.
    pub(crate) fn insert_tower(
        &mut self,
        kind: StructureKind,
        cell: CellCoord,
        position: Vec2,
        spec: &TowerSpec,
        cost: u32,
    ) -> TowerId {
        let id = self.next_tower_id;
        self.next_tower_id = TowerId::new(id.get().wrapping_add(1));
        self.towers.push(Tower::new(id, kind, cell, position, spec, cost));
        id
    }

    pub(crate) fn insert_wall(&mut self, cell: CellCoord, cost: u32) {
        let _ = self.walls.insert(cell, cost);
    }

    /// Current tier of the tower at `cell` on `track`.
    pub(crate) fn tier_at(&self, cell: CellCoord, track: UpgradeTrack) -> Option<u32> {
        self.tower_at(cell).map(|tower| tower.tier(track))
    }

    /// Removes whatever sellable structure stands on `cell`.
    pub(crate) fn remove(&mut self, cell: CellCoord) -> Option<Removed> {
        if let Some(index) = self.towers.iter().position(|tower| tower.cell() == cell) {
            let tower = self.towers.remove(index);
            return Some(Removed {
                kind: tower.kind(),
                invested: tower.invested(),
            });
        }
        self.walls.remove(&cell).map(|invested| Removed {
            kind: StructureKind::Wall,
            invested,
        })
    }

    pub(crate) fn walls(&self) -> impl Iterator<Item = CellCoord> + '_ {
        self.walls.keys().copied()
    }
}
