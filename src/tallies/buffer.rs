// Copyright @yucwang 2026

use std::collections::BTreeMap;

use crate::core::statistics::Welford;
use crate::math::constants::Float;
use crate::tallies::quantity::QuantityContainer;
use crate::tallies::surface_tally::SurfaceTally;
use crate::tallies::volume_tally::VolumeTally;

#[derive(Debug, Clone, PartialEq)]
pub struct TallyAccumulators {
    volume: Vec<QuantityContainer>,
    surface: Vec<QuantityContainer>,
    voxels: BTreeMap<usize, Welford>,
    histories: u64,
}

impl TallyAccumulators {
    pub fn new(volume: &[VolumeTally], surface: &[SurfaceTally]) -> Self {
        let fresh = |c: &QuantityContainer| {
            let mut c = c.clone();
            c.reset();
            c
        };
        Self {
            volume: volume.iter().map(|t| fresh(t.container())).collect(),
            surface: surface.iter().map(|t| fresh(t.container())).collect(),
            voxels: BTreeMap::new(),
            histories: 0,
        }
    }

    pub fn histories(&self) -> u64 {
        self.histories
    }

    pub fn volume(&self) -> &[QuantityContainer] {
        &self.volume
    }

    pub fn surface(&self) -> &[QuantityContainer] {
        &self.surface
    }

    pub fn voxels(&self) -> &BTreeMap<usize, Welford> {
        &self.voxels
    }

    pub fn merge(&mut self, other: &TallyAccumulators) {
        for (mine, theirs) in self.volume.iter_mut().zip(other.volume.iter()) {
            mine.merge(theirs);
        }
        for (mine, theirs) in self.surface.iter_mut().zip(other.surface.iter()) {
            mine.merge(theirs);
        }
        for (index, acc) in other.voxels.iter() {
            self.voxels.entry(*index).or_insert_with(Welford::new).merge(acc);
        }
        self.histories += other.histories;
    }
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct TallyBuffer {
    volume: BTreeMap<(usize, usize), Float>,
    surface: BTreeMap<(usize, usize), Float>,
    voxels: BTreeMap<usize, Float>,
}

impl TallyBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_volume(&mut self, tally: usize, cell: usize, value: Float) {
        *self.volume.entry((tally, cell)).or_insert(0.0) += value;
    }

    pub fn add_surface(&mut self, tally: usize, cell: usize, value: Float) {
        *self.surface.entry((tally, cell)).or_insert(0.0) += value;
    }

    pub fn add_voxel(&mut self, index: usize, value: Float) {
        *self.voxels.entry(index).or_insert(0.0) += value;
    }

    pub fn is_empty(&self) -> bool {
        self.volume.is_empty() && self.surface.is_empty() && self.voxels.is_empty()
    }

    fn commit_into(&mut self, target: &mut TallyAccumulators) {
        for ((tally, cell), sum) in std::mem::take(&mut self.volume) {
            target.volume[tally].update_welford(cell, sum);
        }
        for ((tally, cell), sum) in std::mem::take(&mut self.surface) {
            target.surface[tally].update_welford(cell, sum);
        }
        for (index, sum) in std::mem::take(&mut self.voxels) {
            target.voxels.entry(index).or_insert_with(Welford::new).update(sum);
        }
        target.histories += 1;
    }
}

/// Buffer of a single photon history. Dropping the scope commits the buffer,
/// so every history is counted exactly once whichever way transport returns.
pub struct HistoryScope<'a> {
    buffer: TallyBuffer,
    target: &'a mut TallyAccumulators,
}

impl<'a> HistoryScope<'a> {
    pub fn open(target: &'a mut TallyAccumulators) -> Self {
        Self { buffer: TallyBuffer::new(), target }
    }

    pub fn buffer(&self) -> &TallyBuffer {
        &self.buffer
    }

    pub fn add_volume(&mut self, tally: usize, cell: usize, value: Float) {
        self.buffer.add_volume(tally, cell, value);
    }

    pub fn add_surface(&mut self, tally: usize, cell: usize, value: Float) {
        self.buffer.add_surface(tally, cell, value);
    }

    pub fn add_voxel(&mut self, index: usize, value: Float) {
        self.buffer.add_voxel(index, value);
    }
}

impl<'a> Drop for HistoryScope<'a> {
    fn drop(&mut self) {
        self.buffer.commit_into(self.target);
    }
}
