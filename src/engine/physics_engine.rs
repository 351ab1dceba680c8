// Copyright @yucwang 2026

use rand::RngCore;

use crate::core::domain::ComputationalDomain;
use crate::core::error::{DataError, TransportError};
use crate::core::photon::{InteractionType, Photon, PhotonState};
use crate::core::probability_dist::{select_cumulative, Uniform};
use crate::data::interaction_data::InteractionData;
use crate::grid::VoxelGrid;
use crate::interactions::{InteractionOutcome, ParticleInteractionBehavior};
use crate::math::constants::{Float, Vector3f};
use crate::math::ray::Ray3f;
use crate::tallies::{HistoryScope, SurfaceTally, TallyAccumulators, TrackSegment, VolumeTally};

pub struct WorkerContext<R: RngCore> {
    pub rng: R,
    pub tallies: TallyAccumulators,
    pub absorbed: u64,
    pub escaped: u64,
}

impl<R: RngCore> WorkerContext<R> {
    pub fn histories(&self) -> u64 {
        self.tallies.histories()
    }
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub enum FreePath {
    Collision { distance: Float, block: [usize; 3], majorant: Float },
    Escape { distance: Float },
}

pub struct PhysicsEngine {
    domain: Box<dyn ComputationalDomain>,
    volume_tallies: Vec<VolumeTally>,
    surface_tallies: Vec<SurfaceTally>,
    energy_cutoff: Float,
    histories: u64,
}

impl PhysicsEngine {
    pub fn new(domain: Box<dyn ComputationalDomain>) -> Self {
        let energy_cutoff = domain.interaction_data().energy_range().0;
        Self { domain, volume_tallies: Vec::new(), surface_tallies: Vec::new(), energy_cutoff, histories: 0 }
    }

    // Photons scattered below `cutoff` are absorbed on the spot. The cutoff
    // may not lie below the tabulated energy window.
    pub fn with_energy_cutoff(mut self, cutoff: Float) -> Result<Self, DataError> {
        let (min, max) = self.domain.interaction_data().energy_range();
        if !(cutoff >= min) || cutoff > max {
            return Err(DataError::EnergyOutOfRange { energy: cutoff, min, max });
        }
        self.energy_cutoff = cutoff;
        Ok(self)
    }

    pub fn add_volume_tally(&mut self, tally: VolumeTally) {
        self.volume_tallies.push(tally);
    }

    pub fn add_surface_tally(&mut self, tally: SurfaceTally) {
        self.surface_tallies.push(tally);
    }

    pub fn domain(&self) -> &dyn ComputationalDomain {
        self.domain.as_ref()
    }

    pub fn voxel_grid(&self) -> &VoxelGrid {
        self.domain.voxel_grid()
    }

    pub fn interaction_data(&self) -> &InteractionData {
        self.domain.interaction_data()
    }

    pub fn energy_cutoff(&self) -> Float {
        self.energy_cutoff
    }

    pub fn histories(&self) -> u64 {
        self.histories
    }

    pub fn get_volume_tallies(&self) -> &[VolumeTally] {
        &self.volume_tallies
    }

    pub fn get_surface_tallies(&self) -> &[SurfaceTally] {
        &self.surface_tallies
    }

    pub fn worker_context<R: RngCore>(&self, rng: R) -> WorkerContext<R> {
        WorkerContext { rng, tallies: self.new_accumulators(), absorbed: 0, escaped: 0 }
    }

    pub fn new_accumulators(&self) -> TallyAccumulators {
        TallyAccumulators::new(&self.volume_tallies, &self.surface_tallies)
    }

    pub fn merge_accumulators(&mut self, accumulators: &TallyAccumulators) {
        for (tally, acc) in self.volume_tallies.iter_mut().zip(accumulators.volume().iter()) {
            tally.container_mut().merge(acc);
        }
        for (tally, acc) in self.surface_tallies.iter_mut().zip(accumulators.surface().iter()) {
            tally.container_mut().merge(acc);
        }
        self.domain.voxel_grid_mut().merge_accumulators(accumulators.voxels());
        self.histories += accumulators.histories();
    }

    pub fn reset_tallies(&mut self) {
        for tally in self.volume_tallies.iter_mut() {
            tally.container_mut().reset();
        }
        for tally in self.surface_tallies.iter_mut() {
            tally.container_mut().reset();
        }
        self.domain.voxel_grid_mut().reset_accumulators();
        self.histories = 0;
    }

    /// Simulates one history to completion. Its tally contributions are
    /// committed to `ctx` exactly once, also when transport fails.
    pub fn transport_photon<R: RngCore>(
        &self,
        photon: &mut Photon,
        ctx: &mut WorkerContext<R>,
    ) -> Result<PhotonState, TransportError> {
        {
            let mut scope = HistoryScope::open(&mut ctx.tallies);
            self.interaction_data().check_energy(photon.energy())?;
            while photon.is_active() {
                self.transport_photon_one_step(photon, &mut scope, &mut ctx.rng)?;
            }
        }
        match photon.state() {
            PhotonState::Absorbed => ctx.absorbed += 1,
            PhotonState::Escaped => ctx.escaped += 1,
            PhotonState::Active => {}
        }
        Ok(photon.state())
    }

    pub fn transport_photon_one_step<R: RngCore + ?Sized>(
        &self,
        photon: &mut Photon,
        scope: &mut HistoryScope<'_>,
        rng: &mut R,
    ) -> Result<(), TransportError> {
        let grid = self.voxel_grid();
        if !grid.contains(&photon.position()) {
            self.process_photon_outside_voxel_grid(photon, scope);
            if !photon.is_active() {
                return Ok(());
            }
        }

        let segment = TrackSegment::flight(
            photon.position(),
            photon.direction(),
            0.0,
            photon.energy(),
            photon.weight(),
            photon.scatter_order(),
        );
        let (distance, block, majorant) = match self.get_free_path(photon, rng)? {
            FreePath::Escape { .. } => {
                self.process_tallies(&segment.escaping(), scope);
                photon.escape();
                return Ok(());
            }
            FreePath::Collision { distance, block, majorant } => (distance, block, majorant),
        };

        photon.advance(distance);
        let segment = segment.ending_at(photon.position());
        let voxel = grid.voxel_index_in_block(&photon.position(), block);
        let material = grid.voxel(voxel).material();
        if self.is_delta_scatter(material, photon.energy(), majorant, rng)? {
            self.process_tallies(&segment, scope);
            return Ok(());
        }

        let (interaction, outcome) = self.set_interaction_type(photon, material, rng)?;
        let mut deposit = outcome.energy_deposited;
        if photon.is_active() && photon.energy() < self.energy_cutoff {
            deposit += photon.energy();
            photon.absorb();
        }
        self.process_tallies(&segment.with_interaction(interaction, deposit), scope);
        self.update_temp_tally_per_photon(scope, grid.linear_index(voxel), deposit * photon.weight());
        Ok(())
    }

    pub fn process_photon_outside_voxel_grid(&self, photon: &mut Photon, scope: &mut HistoryScope<'_>) {
        let bounds = self.voxel_grid().bounds();
        let start = photon.position();
        let dir = photon.direction();
        let ray = Ray3f::new(start, dir, Some(0.0), None);
        let segment = TrackSegment::flight(start, dir, 0.0, photon.energy(), photon.weight(), photon.scatter_order());
        match bounds.ray_intersect_range(&ray) {
            Some((t0, _)) => {
                let mut entry: Vector3f = ray.at(t0);
                for a in 0..3 {
                    entry[a] = entry[a].max(bounds.p_min[a]).min(bounds.p_max[a]);
                }
                // The vacuum flight ends exactly where the next one starts.
                self.process_tallies(&segment.ending_at(entry), scope);
                photon.set_position(entry);
            }
            None => {
                self.process_tallies(&segment.escaping(), scope);
                photon.escape();
            }
        }
    }

    // Samples a flight length against the block majorants. Optical depth is
    // consumed block by block until it runs out or the photon leaves the grid.
    pub fn get_free_path<R: RngCore + ?Sized>(&self, photon: &Photon, rng: &mut R) -> Result<FreePath, DataError> {
        let grid = self.voxel_grid();
        let data = self.interaction_data();
        let p = photon.position();
        let d = photon.direction();
        let energy = photon.energy();

        let mut tau = -Uniform::sample_open(rng).ln();
        let grid_exit = grid.distance_to_grid_boundary(&p, &d);
        let mut walk = grid.block_traversal(&p, &d);
        let mut t: Float = 0.0;
        while t < grid_exit {
            let block = match walk.current() {
                Some(block) => block,
                None => break,
            };
            let chord_end = walk.exit_t().min(grid_exit);
            let chord = (chord_end - t).max(0.0);
            let majorant = grid.block_majorant(block, energy, data)?;
            if majorant > 0.0 && tau < majorant * chord {
                return Ok(FreePath::Collision { distance: t + tau / majorant, block, majorant });
            }
            tau -= majorant * chord;
            t = t.max(chord_end);
            walk.advance();
        }
        Ok(FreePath::Escape { distance: grid_exit })
    }

    pub fn is_delta_scatter<R: RngCore + ?Sized>(
        &self,
        material: u8,
        energy: Float,
        majorant: Float,
        rng: &mut R,
    ) -> Result<bool, DataError> {
        let sigma = self.interaction_data().total_cross_section(material, energy)?;
        Ok(Uniform::sample(rng) * majorant >= sigma)
    }

    pub fn set_interaction_type<R: RngCore + ?Sized>(
        &self,
        photon: &mut Photon,
        material: u8,
        rng: &mut R,
    ) -> Result<(InteractionType, InteractionOutcome), DataError> {
        let data = self.interaction_data();
        let sigmas = data.channel_cross_sections(material, photon.energy())?;
        let cumulative = [sigmas[0], sigmas[0] + sigmas[1], sigmas[0] + sigmas[1] + sigmas[2]];
        if !(cumulative[2] > 0.0) {
            return Err(DataError::NonPositiveCrossSection { material, energy: photon.energy() });
        }
        let interaction = InteractionType::ALL[select_cumulative(&cumulative, Uniform::sample(rng))];
        let outcome = ParticleInteractionBehavior::for_type(interaction).interact(photon, data.material(material)?, rng)?;
        Ok((interaction, outcome))
    }

    pub fn process_tallies(&self, segment: &TrackSegment, scope: &mut HistoryScope<'_>) {
        for (index, tally) in self.volume_tallies.iter().enumerate() {
            tally.score(segment, |cell, value| scope.add_volume(index, cell, value));
        }
        for (index, tally) in self.surface_tallies.iter().enumerate() {
            tally.score(segment, |cell, value| scope.add_surface(index, cell, value));
        }
    }

    pub fn update_temp_tally_per_photon(&self, scope: &mut HistoryScope<'_>, voxel: usize, deposit: Float) {
        if deposit > 0.0 {
            scope.add_voxel(voxel, deposit);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::domain::VoxelDomain;
    use crate::core::photon::ScatterOrder;
    use crate::core::rng::PcgRng;
    use crate::data::dao::MaterialRecord;
    use crate::data::material_data::test_tables::{photoelectric_only, scatterer};
    use crate::data::material_data::{MaterialData, DEFAULT_RITA_ERROR};
    use crate::tallies::{EnergyBins, Quantity};

    fn engine(grid: VoxelGrid, records: &[MaterialRecord]) -> PhysicsEngine {
        let materials = records
            .iter()
            .map(|r| MaterialData::from_record(r, DEFAULT_RITA_ERROR).unwrap())
            .collect();
        let data = InteractionData::new(materials).unwrap();
        PhysicsEngine::new(Box::new(VoxelDomain::new(grid, data).unwrap()))
    }

    // 2 cm slab along x, 1 cm square cross section centred on the x axis.
    fn slab(materials: Vec<u8>, block_size: usize) -> VoxelGrid {
        VoxelGrid::new([4, 1, 1], Vector3f::new(0.5, 1.0, 1.0), Vector3f::new(0.0, -0.5, -0.5), materials)
            .unwrap()
            .with_block_size(block_size)
    }

    fn transmission(engine: &PhysicsEngine, histories: usize, seed: u64) -> (Float, WorkerContext<PcgRng>) {
        let mut ctx = engine.worker_context(PcgRng::new(seed));
        for _ in 0..histories {
            let mut photon = Photon::new(Vector3f::new(-1.0, 0.0, 0.0), Vector3f::new(1.0, 0.0, 0.0), 5e4);
            engine.transport_photon(&mut photon, &mut ctx).unwrap();
        }
        (ctx.escaped as Float / histories as Float, ctx)
    }

    fn assert_binomial(observed: Float, expected: Float, n: usize) {
        let sigma = (expected * (1.0 - expected) / n as Float).sqrt();
        assert!(
            (observed - expected).abs() < 5.0 * sigma,
            "observed {} expected {} (sigma {})", observed, expected, sigma
        );
    }

    #[test]
    fn channel_sampling_matches_cross_sections() {
        let grid = VoxelGrid::uniform([1, 1, 1], Vector3f::new(1.0, 1.0, 1.0), Vector3f::zeros(), 1).unwrap();
        let engine = engine(grid, &[scatterer(1, 1.0)]);
        let energy = 3e4;
        let sigmas = engine.interaction_data().channel_cross_sections(1, energy).unwrap();
        let total: Float = sigmas.iter().sum();
        let mut rng = PcgRng::new(2024);
        let n = 100_000;
        let mut counts = [0usize; 3];
        for _ in 0..n {
            let mut photon = Photon::new(Vector3f::new(0.5, 0.5, 0.5), Vector3f::new(0.0, 0.0, 1.0), energy);
            let (interaction, _) = engine.set_interaction_type(&mut photon, 1, &mut rng).unwrap();
            let slot = InteractionType::ALL.iter().position(|t| *t == interaction).unwrap();
            counts[slot] += 1;
            assert_eq!(photon.history().len(), 1);
        }
        let chi2: Float = (0..3)
            .map(|i| {
                let expected = n as Float * sigmas[i] / total;
                (counts[i] as Float - expected).powi(2) / expected
            })
            .sum();
        // chi-square, 2 degrees of freedom, p = 0.001
        assert!(chi2 < 13.8, "chi2 = {}, counts {:?}", chi2, counts);
    }

    #[test]
    fn homogeneous_slab_attenuates_exponentially() {
        let mut engine = engine(slab(vec![1; 4], 8), &[photoelectric_only(1, 0.5)]);
        engine.add_surface_tally(
            SurfaceTally::disc(Vector3f::new(5.0, 0.0, 0.0), Vector3f::new(1.0, 0.0, 0.0), 1.0, &[Quantity::NumberOfPhotons], EnergyBins::default()).unwrap(),
        );
        engine.add_volume_tally(
            VolumeTally::cuboid(Vector3f::new(0.0, -0.5, -0.5), Vector3f::new(2.0, 0.5, 0.5), &[Quantity::NumberOfInteractions], EnergyBins::default()).unwrap(),
        );
        let n = 100_000;
        let (transmitted, ctx) = transmission(&engine, n, 17);
        let expected = (-1.0 as Float).exp();
        assert_binomial(transmitted, expected, n);
        assert_eq!(ctx.absorbed + ctx.escaped, n as u64);

        engine.merge_accumulators(&ctx.tallies);
        assert_eq!(engine.histories(), n as u64);
        let crossing = engine.get_surface_tallies()[0].container().total_mean(Quantity::NumberOfPhotons, engine.histories());
        assert!((crossing - transmitted).abs() < 1e-12);
        let interactions = engine.get_volume_tallies()[0].container().total_mean(Quantity::NumberOfInteractions, engine.histories());
        assert!((interactions - (1.0 - transmitted)).abs() < 1e-12);
    }

    #[test]
    fn heterogeneous_slab_with_virtual_collisions() {
        let expected = (-(0.5 * (0.2 + 1.0 + 0.2 + 1.0)) as Float).exp();
        for block_size in [8, 1] {
            let engine = engine(slab(vec![1, 2, 1, 2], block_size), &[photoelectric_only(1, 0.2), photoelectric_only(2, 1.0)]);
            let n = 100_000;
            let (transmitted, _) = transmission(&engine, n, 99 + block_size as u64);
            assert_binomial(transmitted, expected, n);
        }
    }

    #[test]
    fn void_grid_lets_photons_escape_untouched() {
        let grid = VoxelGrid::uniform([2, 2, 2], Vector3f::new(1.0, 1.0, 1.0), Vector3f::zeros(), 0).unwrap();
        let mut engine = engine(grid, &[MaterialRecord::void(0, "vacuum")]);
        engine.add_volume_tally(
            VolumeTally::cuboid(Vector3f::zeros(), Vector3f::new(2.0, 2.0, 2.0), &[Quantity::EnergyDeposition, Quantity::NumberOfInteractions], EnergyBins::default()).unwrap(),
        );
        let mut ctx = engine.worker_context(PcgRng::new(5));
        let starts = [
            (Vector3f::new(1.0, 1.0, 1.0), Vector3f::new(0.3, -0.2, 0.9)),
            (Vector3f::new(-3.0, 1.0, 1.0), Vector3f::new(1.0, 0.0, 0.0)),
            (Vector3f::new(-3.0, 5.0, 1.0), Vector3f::new(1.0, 0.0, 0.0)),
        ];
        for (p, d) in starts.iter() {
            let mut photon = Photon::new(*p, *d, 2e4);
            let state = engine.transport_photon(&mut photon, &mut ctx).unwrap();
            assert_eq!(state, PhotonState::Escaped);
            assert_eq!(photon.energy(), 2e4);
            assert!(photon.history().is_empty());
        }
        assert!(ctx.tallies.voxels().is_empty());
        engine.merge_accumulators(&ctx.tallies);
        let tally = &engine.get_volume_tallies()[0];
        assert_eq!(tally.container().total_mean(Quantity::EnergyDeposition, engine.histories()), 0.0);
        assert_eq!(tally.container().total_mean(Quantity::NumberOfInteractions, engine.histories()), 0.0);
    }

    fn axis(a: usize) -> Vector3f {
        let mut v = Vector3f::zeros();
        v[a] = 1.0;
        v
    }

    #[test]
    fn oblique_entries_through_every_face_are_counted_once() {
        let grid = VoxelGrid::uniform([2, 2, 2], Vector3f::new(1.0, 1.0, 1.0), Vector3f::zeros(), 0).unwrap();
        let mut engine = engine(grid, &[MaterialRecord::void(0, "vacuum")]);
        engine.add_volume_tally(
            VolumeTally::cuboid(Vector3f::zeros(), Vector3f::new(2.0, 2.0, 2.0), &[Quantity::NumberOfPhotons, Quantity::IncidentEnergy], EnergyBins::default()).unwrap(),
        );
        // One rectangle per face, facing into the grid: min faces first, then max faces.
        for side in 0..2 {
            for a in 0..3 {
                let (u, v) = (axis((a + 1) % 3) * 2.0, axis((a + 2) % 3) * 2.0);
                let (corner, edge1, edge2) = if side == 0 { (Vector3f::zeros(), u, v) } else { (axis(a) * 2.0, v, u) };
                engine.add_surface_tally(
                    SurfaceTally::rectangle(corner, edge1, edge2, &[Quantity::NumberOfPhotons], EnergyBins::default()).unwrap(),
                );
            }
        }
        let disc_center = Vector3f::new(0.0, 1.0, 1.0);
        engine.add_surface_tally(
            SurfaceTally::disc(disc_center, Vector3f::new(1.0, 0.0, 0.0), 0.8, &[Quantity::NumberOfPhotons], EnergyBins::default()).unwrap(),
        );

        let mut ctx = engine.worker_context(PcgRng::new(31));
        let mut rng = PcgRng::new(32);
        let per_face = 2_000;
        let mut on_disc = 0;
        for face in 0..6 {
            let (a, side) = (face % 3, face / 3);
            let inward = if side == 0 { axis(a) } else { -axis(a) };
            for _ in 0..per_face {
                let mut hit = Vector3f::zeros();
                hit[a] = 2.0 * side as Float;
                hit[(a + 1) % 3] = 0.2 + 1.6 * Uniform::sample(&mut rng);
                hit[(a + 2) % 3] = 0.2 + 1.6 * Uniform::sample(&mut rng);
                let tilt = axis((a + 1) % 3) * (1.2 * Uniform::sample(&mut rng) - 0.6)
                    + axis((a + 2) % 3) * (1.2 * Uniform::sample(&mut rng) - 0.6);
                let dir = (inward + tilt).normalize();
                if face == 0 && (hit - disc_center).norm() < 0.8 {
                    on_disc += 1;
                }
                let mut photon = Photon::new(hit - dir * 3.0, dir, 2e4);
                assert_eq!(engine.transport_photon(&mut photon, &mut ctx).unwrap(), PhotonState::Escaped);
            }
        }
        engine.merge_accumulators(&ctx.tallies);
        let n = engine.histories();
        assert_eq!(n, 6 * per_face as u64);

        let volume = engine.get_volume_tallies()[0].container();
        assert!((volume.total_mean(Quantity::NumberOfPhotons, n) - 1.0).abs() < 1e-12);
        assert!((volume.total_mean(Quantity::IncidentEnergy, n) - 2e4).abs() < 1e-6);
        for face in engine.get_surface_tallies()[..6].iter() {
            assert!((face.container().total_mean(Quantity::NumberOfPhotons, n) - 1.0 / 6.0).abs() < 1e-12);
        }
        let disc = engine.get_surface_tallies()[6].container();
        assert!(on_disc > 0);
        assert!((disc.total_mean(Quantity::NumberOfPhotons, n) - on_disc as Float / n as Float).abs() < 1e-12);
    }

    #[test]
    fn photoelectric_voxel_absorbs_everything() {
        let grid = VoxelGrid::uniform([1, 1, 1], Vector3f::new(1.0, 1.0, 1.0), Vector3f::zeros(), 1).unwrap();
        let mut engine = engine(grid, &[photoelectric_only(1, 1e3)]);
        let mut ctx = engine.worker_context(PcgRng::new(8));
        let mut photon = Photon::new(Vector3f::new(0.5, 0.5, 0.5), Vector3f::new(0.0, 1.0, 0.0), 2e4);
        let state = engine.transport_photon(&mut photon, &mut ctx).unwrap();
        assert_eq!(state, PhotonState::Absorbed);
        assert_eq!(photon.history().len(), 1);
        assert_eq!(photon.history().scatter_count(), 0);
        assert_eq!(photon.history().records()[0].interaction, InteractionType::Photoelectric);
        assert!((ctx.tallies.voxels()[&0].sum() - 2e4).abs() < 1e-9);
        engine.merge_accumulators(&ctx.tallies);
        assert!((engine.voxel_grid().voxel([0, 0, 0]).energy_deposition().mean() - 2e4).abs() < 1e-9);

        engine.reset_tallies();
        assert_eq!(engine.histories(), 0);
        assert_eq!(engine.voxel_grid().voxel([0, 0, 0]).energy_deposition().count(), 0);
    }

    #[test]
    fn scattering_conserves_energy_and_direction_norm() {
        let grid = VoxelGrid::uniform([5, 5, 5], Vector3f::new(1.0, 1.0, 1.0), Vector3f::zeros(), 1).unwrap();
        for cutoff in [1e3, 5.5e4] {
            let engine = engine(grid.clone(), &[scatterer(1, 5.0)]).with_energy_cutoff(cutoff).unwrap();
            let mut rng_seed = 40;
            let mut scatters = 0;
            for _ in 0..2000 {
                rng_seed += 1;
                let mut ctx = engine.worker_context(PcgRng::new(rng_seed));
                let mut photon = Photon::new(Vector3f::new(2.5, 2.5, 2.5), Vector3f::new(0.0, 0.0, 1.0), 6e4);
                let state = engine.transport_photon(&mut photon, &mut ctx).unwrap();
                let deposited: Float = ctx.tallies.voxels().values().map(|w| w.sum()).sum();
                let carried = if state == PhotonState::Escaped { photon.energy() } else { 0.0 };
                assert!((deposited + carried - 6e4).abs() < 1e-6 * 6e4);
                assert!((photon.direction().norm() - 1.0).abs() < 1e-9);
                if state == PhotonState::Escaped {
                    assert!(photon.energy() >= cutoff);
                }
                scatters += photon.history().scatter_count();
            }
            assert!(scatters > 1000);
        }
    }

    #[test]
    fn scatter_order_follows_history() {
        let grid = VoxelGrid::uniform([5, 5, 5], Vector3f::new(1.0, 1.0, 1.0), Vector3f::zeros(), 1).unwrap();
        let engine = engine(grid, &[scatterer(1, 5.0)]);
        let mut ctx = engine.worker_context(PcgRng::new(3));
        for _ in 0..200 {
            let mut photon = Photon::new(Vector3f::new(2.5, 2.5, 2.5), Vector3f::new(0.0, 0.0, 1.0), 6e4);
            engine.transport_photon(&mut photon, &mut ctx).unwrap();
            let history = photon.history();
            let expected = match (history.coherent_count(), history.incoherent_count()) {
                (0, 0) => ScatterOrder::Primary,
                (1, 0) => ScatterOrder::SingleCoherent,
                (0, 1) => ScatterOrder::SingleIncoherent,
                _ => ScatterOrder::Multiple,
            };
            assert_eq!(photon.scatter_order(), expected);
        }
    }

    #[test]
    fn failed_history_is_still_committed() {
        let grid = VoxelGrid::uniform([1, 1, 1], Vector3f::new(1.0, 1.0, 1.0), Vector3f::zeros(), 1).unwrap();
        let engine = engine(grid, &[photoelectric_only(1, 1.0)]);
        let mut ctx = engine.worker_context(PcgRng::new(1));
        let mut photon = Photon::new(Vector3f::new(0.5, 0.5, 0.5), Vector3f::new(0.0, 0.0, 1.0), 5e7);
        let result = engine.transport_photon(&mut photon, &mut ctx);
        assert!(matches!(result, Err(TransportError::Data(DataError::EnergyOutOfRange { .. }))));
        assert_eq!(ctx.histories(), 1);
        assert!(engine.with_energy_cutoff(10.0).is_err());
    }

    #[test]
    fn free_path_escapes_from_boundary() {
        let engine = engine(slab(vec![1; 4], 8), &[photoelectric_only(1, 0.5)]);
        let photon = Photon::new(Vector3f::new(2.0, 0.0, 0.0), Vector3f::new(1.0, 0.0, 0.0), 5e4);
        let mut rng = PcgRng::new(4);
        assert_eq!(engine.get_free_path(&photon, &mut rng).unwrap(), FreePath::Escape { distance: 0.0 });
    }
}
