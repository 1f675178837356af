//! Neighbor lookup for the school.
//!
//! Steering only depends on the [`SpatialIndex`] contract: entries are
//! upserted with their current position and queried by radius. The default
//! [`UniformGrid`] buckets entries by their x/z cell; [`BruteForceIndex`]
//! scans everything and serves as a reference.

use glam::{Vec2, Vec3};

use crate::error::SchoolError;

/// Stable identity of an agent within one school.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AgentId(pub u32);

impl AgentId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

pub trait SpatialIndex {
    /// Token returned by [`SpatialIndex::upsert`] and handed back on the next call.
    type Handle: Copy;

    /// Insert `id` at `position`, or move it there from `previous`.
    fn upsert(&mut self, id: AgentId, position: Vec3, previous: Option<Self::Handle>)
        -> Self::Handle;

    /// Visit every entry within `radius` of `point`. The querying agent is
    /// not filtered out.
    fn query_radius<F>(&self, point: Vec3, radius: f32, visit: F)
    where
        F: FnMut(AgentId);

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CellHandle(usize);

#[derive(Clone, Copy, Debug)]
struct Entry {
    position: Vec3,
    cell: usize,
}

/// Bucket grid over the x/z plane. Positions outside the bounds are clamped
/// into the border cells, so every position is indexable.
pub struct UniformGrid {
    min: Vec2,
    cell_size: Vec2,
    cols: usize,
    rows: usize,
    cells: Vec<Vec<AgentId>>,
    entries: Vec<Option<Entry>>,
    count: usize,
}

impl UniformGrid {
    pub fn new(min: Vec2, max: Vec2, cols: usize, rows: usize) -> Result<Self, SchoolError> {
        if cols == 0 || rows == 0 {
            return Err(SchoolError::InvalidGrid("cell counts must be non-zero"));
        }
        if !min.is_finite() || !max.is_finite() || max.x <= min.x || max.y <= min.y {
            return Err(SchoolError::InvalidGrid("bounds must be finite and non-empty"));
        }

        let extent = max - min;
        Ok(Self {
            min,
            cell_size: Vec2::new(extent.x / cols as f32, extent.y / rows as f32),
            cols,
            rows,
            cells: vec![Vec::new(); cols * rows],
            entries: Vec::new(),
            count: 0,
        })
    }

    fn cell_x(&self, x: f32) -> isize {
        (((x - self.min.x) / self.cell_size.x).floor() as isize).clamp(0, self.cols as isize - 1)
    }

    fn cell_z(&self, z: f32) -> isize {
        (((z - self.min.y) / self.cell_size.y).floor() as isize).clamp(0, self.rows as isize - 1)
    }

    fn cell_index_for_position(&self, p: Vec3) -> usize {
        self.cell_z(p.z) as usize * self.cols + self.cell_x(p.x) as usize
    }

    fn detach(&mut self, id: AgentId, cell: usize) {
        let bucket = &mut self.cells[cell];
        if let Some(slot) = bucket.iter().position(|&e| e == id) {
            bucket.swap_remove(slot);
        }
    }
}

impl Default for UniformGrid {
    /// 1000×1000 area centred on the origin split into 100×100 cells.
    fn default() -> Self {
        let extent = 500.0;
        let cells = 100;
        let extent_v = Vec2::splat(extent);
        Self {
            min: -extent_v,
            cell_size: Vec2::splat(2.0 * extent / cells as f32),
            cols: cells,
            rows: cells,
            cells: vec![Vec::new(); cells * cells],
            entries: Vec::new(),
            count: 0,
        }
    }
}

impl SpatialIndex for UniformGrid {
    type Handle = CellHandle;

    fn upsert(&mut self, id: AgentId, position: Vec3, previous: Option<CellHandle>) -> CellHandle {
        let cell = self.cell_index_for_position(position);
        let slot = id.index();
        if self.entries.len() <= slot {
            self.entries.resize(slot + 1, None);
        }

        // The stored entry is authoritative; a stale handle only costs a lookup.
        let known_cell = self.entries[slot].map(|e| e.cell);
        match known_cell {
            Some(old) if old != cell => {
                self.detach(id, old);
                self.cells[cell].push(id);
            }
            Some(_) => {}
            None => {
                if let Some(CellHandle(old)) = previous {
                    self.detach(id, old.min(self.cells.len() - 1));
                }
                self.cells[cell].push(id);
                self.count += 1;
            }
        }

        self.entries[slot] = Some(Entry { position, cell });
        CellHandle(cell)
    }

    fn query_radius<F>(&self, point: Vec3, radius: f32, mut visit: F)
    where
        F: FnMut(AgentId),
    {
        if self.count == 0 || !radius.is_finite() || radius < 0.0 || !point.is_finite() {
            return;
        }

        let radius_sq = radius * radius;
        let min_x = self.cell_x(point.x - radius);
        let max_x = self.cell_x(point.x + radius);
        let min_z = self.cell_z(point.z - radius);
        let max_z = self.cell_z(point.z + radius);

        for cz in min_z..=max_z {
            for cx in min_x..=max_x {
                let cell = cz as usize * self.cols + cx as usize;
                for &id in &self.cells[cell] {
                    let Some(entry) = self.entries[id.index()] else {
                        continue;
                    };
                    if entry.position.distance_squared(point) <= radius_sq {
                        visit(id);
                    }
                }
            }
        }
    }

    fn len(&self) -> usize {
        self.count
    }
}

/// Linear scan over every entry.
#[derive(Default)]
pub struct BruteForceIndex {
    positions: Vec<Option<Vec3>>,
}

impl SpatialIndex for BruteForceIndex {
    type Handle = ();

    fn upsert(&mut self, id: AgentId, position: Vec3, _previous: Option<()>) {
        let slot = id.index();
        if self.positions.len() <= slot {
            self.positions.resize(slot + 1, None);
        }
        self.positions[slot] = Some(position);
    }

    fn query_radius<F>(&self, point: Vec3, radius: f32, mut visit: F)
    where
        F: FnMut(AgentId),
    {
        let radius_sq = radius * radius;
        for (i, p) in self.positions.iter().enumerate() {
            if let Some(p) = p {
                if p.distance_squared(point) <= radius_sq {
                    visit(AgentId(i as u32));
                }
            }
        }
    }

    fn len(&self) -> usize {
        self.positions.iter().filter(|p| p.is_some()).count()
    }
}
