// Copyright @yucwang 2026

use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::path::Path;

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use crate::core::computation_node::ComputationNode;
use crate::core::domain::VoxelDomain;
use crate::core::error::{DataError, GridError, TransportError};
use crate::core::source::PhotonSource;
use crate::data::dao::{DataAccessObject, InMemoryDao, MaterialRecord, TableRecord};
use crate::data::interaction_data::InteractionData;
use crate::data::material_data::DEFAULT_RITA_ERROR;
use crate::engine::PhysicsEngine;
use crate::grid::VoxelGrid;
use crate::math::constants::{Float, Vector3f};
use crate::runners::runner::SimulationSettings;
use crate::sources::{Directionality, EnergySpectrum, PointSource};
use crate::tallies::{EnergyBins, Quantity, SurfaceTally, VolumeTally};

#[derive(Debug)]
pub enum LoadError {
    Io(std::io::Error),
    Parse(String),
    MissingField(&'static str),
    Data(DataError),
    Grid(GridError),
}

impl From<std::io::Error> for LoadError {
    fn from(err: std::io::Error) -> Self {
        LoadError::Io(err)
    }
}

impl From<DataError> for LoadError {
    fn from(err: DataError) -> Self {
        LoadError::Data(err)
    }
}

impl From<GridError> for LoadError {
    fn from(err: GridError) -> Self {
        LoadError::Grid(err)
    }
}

impl From<TransportError> for LoadError {
    fn from(err: TransportError) -> Self {
        match err {
            TransportError::Data(err) => LoadError::Data(err),
            TransportError::Grid(err) => LoadError::Grid(err),
        }
    }
}

impl fmt::Display for LoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoadError::Io(err) => write!(f, "cannot read run description: {}", err),
            LoadError::Parse(msg) => write!(f, "malformed run description: {}", msg),
            LoadError::MissingField(field) => write!(f, "run description lacks {}", field),
            LoadError::Data(err) => write!(f, "{}", err),
            LoadError::Grid(err) => write!(f, "{}", err),
        }
    }
}

impl std::error::Error for LoadError {}

pub struct RunDescription {
    pub engine: PhysicsEngine,
    pub source: Box<dyn PhotonSource>,
    pub settings: SimulationSettings,
}

pub fn load_run<P: AsRef<Path>>(path: P) -> Result<RunDescription, LoadError> {
    let xml = fs::read_to_string(path.as_ref())?;
    log::info!("Loading run description {}.", path.as_ref().display());
    parse_run(&xml)
}

pub fn parse_run(xml: &str) -> Result<RunDescription, LoadError> {
    let mut reader = Reader::from_str(xml);
    reader.trim_text(true);
    let mut buf = Vec::new();
    let mut builder = RunBuilder::default();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Eof) => break,
            Ok(Event::Start(e)) => builder.open(&e)?,
            Ok(Event::Empty(e)) => {
                builder.open(&e)?;
                builder.close(e.name().as_ref())?;
            }
            Ok(Event::End(e)) => builder.close(e.name().as_ref())?,
            Err(e) => return Err(LoadError::Parse(e.to_string())),
            _ => {}
        }
        buf.clear();
    }

    builder.finish()
}

struct GridLayout {
    dims: [usize; 3],
    spacing: Vector3f,
    origin: Vector3f,
    fill: u8,
    regions: Vec<([usize; 3], [usize; 3], u8)>,
}

struct SourceElement {
    attributes: HashMap<String, String>,
    lines: Vec<(Float, Float)>,
}

#[derive(Default)]
struct RunBuilder {
    settings: SimulationSettings,
    dao: InMemoryDao,
    material: Option<MaterialRecord>,
    grid: Option<GridLayout>,
    in_grid: bool,
    source: Option<SourceElement>,
    in_source: bool,
    tallies: Vec<HashMap<String, String>>,
}

impl RunBuilder {
    fn open(&mut self, e: &BytesStart) -> Result<(), LoadError> {
        let attrs = attributes(e);
        match e.name().as_ref() {
            b"integer" => {
                let name = required(&attrs, "name", "integer.name")?;
                let value = required(&attrs, "value", "integer.value")?;
                match name {
                    "photons" => self.settings.photons = parse_u64(value)?,
                    "seed" => self.settings.seed = parse_u64(value)?,
                    "threads" => self.settings.threads = parse_usize(value)?,
                    "chunk" => self.settings.histories_per_chunk = parse_u64(value)?,
                    "block_size" => self.settings.block_size = parse_usize(value)?,
                    other => log::warn!("Ignoring unknown integer setting {}.", other),
                }
            }
            b"float" => {
                let name = required(&attrs, "name", "float.name")?;
                let value = required(&attrs, "value", "float.value")?;
                match name {
                    "energy_cutoff" => self.settings.energy_cutoff = Some(parse_float(value)?),
                    other => log::warn!("Ignoring unknown float setting {}.", other),
                }
            }
            b"material" => {
                let id = parse_u8(required(&attrs, "id", "material.id")?)?;
                let name = attrs.get("name").cloned().unwrap_or_else(|| format!("material{}", id));
                let mut record = MaterialRecord::void(id, &name);
                if let Some(density) = attrs.get("density") {
                    record.density = parse_float(density)?;
                }
                self.material = Some(record);
            }
            b"table" => {
                let record = self
                    .material
                    .as_mut()
                    .ok_or_else(|| LoadError::Parse("table outside material".to_string()))?;
                let kind = required(&attrs, "type", "table.type")?;
                let table = TableRecord::new(
                    parse_list(required(&attrs, "x", "table.x")?)?,
                    parse_list(required(&attrs, "y", "table.y")?)?,
                );
                match kind {
                    "coherent" => record.coherent = Some(table),
                    "incoherent" => record.incoherent = Some(table),
                    "photoelectric" => record.photoelectric = Some(table),
                    "form_factor" => record.form_factor = Some(table),
                    "scattering_function" => record.scattering_function = Some(table),
                    other => return Err(LoadError::Parse(format!("unknown table type: {}", other))),
                }
            }
            b"grid" => {
                self.grid = Some(GridLayout {
                    dims: parse_index3(required(&attrs, "dims", "grid.dims")?)?,
                    spacing: parse_vec3(required(&attrs, "spacing", "grid.spacing")?)?,
                    origin: attrs.get("origin").map(|v| parse_vec3(v)).transpose()?.unwrap_or_else(Vector3f::zeros),
                    fill: parse_u8(required(&attrs, "material", "grid.material")?)?,
                    regions: Vec::new(),
                });
                self.in_grid = true;
            }
            b"region" => {
                let grid = match (self.in_grid, self.grid.as_mut()) {
                    (true, Some(grid)) => grid,
                    _ => return Err(LoadError::Parse("region outside grid".to_string())),
                };
                grid.regions.push((
                    parse_index3(required(&attrs, "min", "region.min")?)?,
                    parse_index3(required(&attrs, "max", "region.max")?)?,
                    parse_u8(required(&attrs, "material", "region.material")?)?,
                ));
            }
            b"source" => {
                self.source = Some(SourceElement { attributes: attrs, lines: Vec::new() });
                self.in_source = true;
            }
            b"spectrum" => {
                let source = match (self.in_source, self.source.as_mut()) {
                    (true, Some(source)) => source,
                    _ => return Err(LoadError::Parse("spectrum outside source".to_string())),
                };
                let energy = parse_float(required(&attrs, "energy", "spectrum.energy")?)?;
                let weight = attrs.get("weight").map(|v| parse_float(v)).transpose()?.unwrap_or(1.0);
                source.lines.push((energy, weight));
            }
            b"tally" => self.tallies.push(attrs),
            _ => {}
        }
        Ok(())
    }

    fn close(&mut self, name: &[u8]) -> Result<(), LoadError> {
        match name {
            b"material" => {
                if let Some(record) = self.material.take() {
                    self.dao.insert(record);
                }
            }
            b"grid" => self.in_grid = false,
            b"source" => self.in_source = false,
            _ => {}
        }
        Ok(())
    }

    fn finish(self) -> Result<RunDescription, LoadError> {
        let layout = self.grid.ok_or(LoadError::MissingField("grid"))?;
        let count = layout.dims.iter().product();
        let mut materials = vec![layout.fill; count];
        for (min, max, material) in layout.regions.iter() {
            if (0..3).any(|a| min[a] > max[a] || max[a] >= layout.dims[a]) {
                return Err(GridError::InvalidDimensions(format!("region {:?}..={:?} outside grid", min, max)).into());
            }
            for k in min[2]..=max[2] {
                for j in min[1]..=max[1] {
                    for i in min[0]..=max[0] {
                        materials[i + j * layout.dims[0] + k * layout.dims[0] * layout.dims[1]] = *material;
                    }
                }
            }
        }
        let grid = VoxelGrid::new(layout.dims, layout.spacing, layout.origin, materials)?.with_block_size(self.settings.block_size);

        let data = InteractionData::from_dao_with_error(&self.dao, &self.dao.material_ids(), DEFAULT_RITA_ERROR)?;
        let domain = VoxelDomain::new(grid, data)?;
        let mut engine = PhysicsEngine::new(Box::new(domain));
        if let Some(cutoff) = self.settings.energy_cutoff {
            engine = engine.with_energy_cutoff(cutoff)?;
        }

        for attrs in self.tallies.iter() {
            build_tally(&mut engine, attrs)?;
        }

        let source = build_source(self.source.ok_or(LoadError::MissingField("source"))?)?;
        log::info!("Source: {}", source.to_string());

        Ok(RunDescription { engine, source: Box::new(source), settings: self.settings })
    }
}

fn build_tally(engine: &mut PhysicsEngine, attrs: &HashMap<String, String>) -> Result<(), LoadError> {
    let kind = required(attrs, "type", "tally.type")?;
    let quantities = required(attrs, "quantities", "tally.quantities")?
        .split(',')
        .map(|s| Quantity::from_name(s).ok_or_else(|| LoadError::Parse(format!("unknown quantity: {}", s.trim()))))
        .collect::<Result<Vec<_>, _>>()?;
    let bins = match attrs.get("bins") {
        Some(v) => {
            let parts = parse_list(v)?;
            if parts.len() != 3 {
                return Err(LoadError::Parse(format!("bins expects min, max, count: {}", v)));
            }
            EnergyBins::uniform(parts[0], parts[1], parts[2] as usize)
                .ok_or_else(|| LoadError::Parse(format!("invalid bins: {}", v)))?
        }
        None => EnergyBins::default(),
    };
    let vec3 = |key: &str, field: &'static str| -> Result<Vector3f, LoadError> { parse_vec3(required(attrs, key, field)?) };

    match kind {
        "cuboid" => {
            let tally = VolumeTally::cuboid(vec3("min", "tally.min")?, vec3("max", "tally.max")?, &quantities, bins)?;
            engine.add_volume_tally(named(tally, attrs, VolumeTally::with_id));
        }
        "voxel_box" => {
            let min = parse_index3(required(attrs, "min", "tally.min")?)?;
            let max = parse_index3(required(attrs, "max", "tally.max")?)?;
            let tally = VolumeTally::voxel_box(engine.voxel_grid(), min, max, &quantities, bins)?;
            engine.add_volume_tally(named(tally, attrs, VolumeTally::with_id));
        }
        "disc" => {
            let radius = parse_float(required(attrs, "radius", "tally.radius")?)?;
            let tally = SurfaceTally::disc(vec3("center", "tally.center")?, vec3("normal", "tally.normal")?, radius, &quantities, bins)?;
            engine.add_surface_tally(named(tally, attrs, SurfaceTally::with_id));
        }
        "rectangle" => {
            let tally = SurfaceTally::rectangle(
                vec3("corner", "tally.corner")?,
                vec3("edge1", "tally.edge1")?,
                vec3("edge2", "tally.edge2")?,
                &quantities,
                bins,
            )?;
            engine.add_surface_tally(named(tally, attrs, SurfaceTally::with_id));
        }
        other => return Err(LoadError::Parse(format!("unsupported tally: {}", other))),
    }
    Ok(())
}

fn named<T>(tally: T, attrs: &HashMap<String, String>, with_id: fn(T, &str) -> T) -> T {
    match attrs.get("id") {
        Some(id) => with_id(tally, id),
        None => tally,
    }
}

fn build_source(element: SourceElement) -> Result<PointSource, LoadError> {
    let attrs = &element.attributes;
    let kind = attrs.get("type").map(|s| s.as_str()).unwrap_or("point");
    if kind != "point" {
        return Err(LoadError::Parse(format!("unsupported source: {}", kind)));
    }
    let position = parse_vec3(required(attrs, "position", "source.position")?)?;
    let directionality = match attrs.get("directionality").map(|s| s.as_str()).unwrap_or("beam") {
        "beam" => Directionality::Beam(parse_vec3(required(attrs, "direction", "source.direction")?)?),
        "isotropic" => Directionality::Isotropic,
        "cone" => Directionality::Cone {
            axis: parse_vec3(required(attrs, "direction", "source.direction")?)?,
            cos_theta_max: parse_float(required(attrs, "cos_theta_max", "source.cos_theta_max")?)?,
        },
        other => return Err(LoadError::Parse(format!("unknown directionality: {}", other))),
    };
    let spectrum = match attrs.get("energy") {
        Some(energy) => EnergySpectrum::Mono(parse_float(energy)?),
        None if !element.lines.is_empty() => EnergySpectrum::lines(&element.lines)?,
        None => return Err(LoadError::MissingField("source.energy")),
    };
    let mut source = PointSource::new(position, directionality, spectrum)?;
    if let Some(id) = attrs.get("id") {
        source = source.with_id(id);
    }
    if let Some(weight) = attrs.get("weight") {
        source = source.with_weight(parse_float(weight)?);
    }
    Ok(source)
}

fn attributes(e: &BytesStart) -> HashMap<String, String> {
    let mut out = HashMap::new();
    for attr in e.attributes().flatten() {
        let key = String::from_utf8_lossy(attr.key.as_ref()).to_string();
        out.insert(key, attr.unescape_value().unwrap_or_default().to_string());
    }
    out
}

fn required<'a>(attrs: &'a HashMap<String, String>, key: &str, field: &'static str) -> Result<&'a str, LoadError> {
    attrs.get(key).map(|s| s.as_str()).ok_or(LoadError::MissingField(field))
}

fn parse_float(value: &str) -> Result<Float, LoadError> {
    value.trim().parse::<Float>().map_err(|_| LoadError::Parse(format!("invalid float: {}", value)))
}

fn parse_u8(value: &str) -> Result<u8, LoadError> {
    value.trim().parse::<u8>().map_err(|_| LoadError::Parse(format!("invalid material id: {}", value)))
}

fn parse_u64(value: &str) -> Result<u64, LoadError> {
    value.trim().parse::<u64>().map_err(|_| LoadError::Parse(format!("invalid integer: {}", value)))
}

fn parse_usize(value: &str) -> Result<usize, LoadError> {
    value.trim().parse::<usize>().map_err(|_| LoadError::Parse(format!("invalid integer: {}", value)))
}

fn parse_list(value: &str) -> Result<Vec<Float>, LoadError> {
    value
        .split(|c: char| c == ',' || c.is_whitespace())
        .filter(|s| !s.is_empty())
        .map(parse_float)
        .collect()
}

fn parse_vec3(value: &str) -> Result<Vector3f, LoadError> {
    let v = parse_list(value)?;
    if v.len() != 3 {
        return Err(LoadError::Parse(format!("invalid vec3: {}", value)));
    }
    Ok(Vector3f::new(v[0], v[1], v[2]))
}

fn parse_index3(value: &str) -> Result<[usize; 3], LoadError> {
    let parts: Vec<usize> = value
        .split(',')
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(parse_usize)
        .collect::<Result<_, _>>()?;
    if parts.len() != 3 {
        return Err(LoadError::Parse(format!("invalid index triple: {}", value)));
    }
    Ok([parts[0], parts[1], parts[2]])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::material_data::test_tables;

    fn list(values: &[Float]) -> String {
        values.iter().map(|v| format!("{:e}", v)).collect::<Vec<_>>().join(", ")
    }

    fn table(kind: &str, record: &TableRecord) -> String {
        format!(r#"<table type="{}" x="{}" y="{}"/>"#, kind, list(&record.x), list(&record.y))
    }

    fn water() -> String {
        let r = test_tables::scatterer(1, 1.0);
        let (coherent, incoherent, photoelectric, ff, sf) = match (&r.coherent, &r.incoherent, &r.photoelectric, &r.form_factor, &r.scattering_function) {
            (Some(a), Some(b), Some(c), Some(d), Some(e)) => (a, b, c, d, e),
            _ => panic!("scatterer lacks tables"),
        };
        format!(
            r#"<material id="1" name="water" density="1.0">{}{}{}{}{}</material>"#,
            table("coherent", coherent),
            table("incoherent", incoherent),
            table("photoelectric", photoelectric),
            table("form_factor", ff),
            table("scattering_function", sf)
        )
    }

    fn run_xml(tallies: &str, source: &str) -> String {
        format!(
            r#"<run>
                <integer name="photons" value="2500"/>
                <integer name="seed" value="9"/>
                <integer name="chunk" value="500"/>
                <integer name="block_size" value="2"/>
                <float name="energy_cutoff" value="5000"/>
                <material id="0" name="air"/>
                {}
                <grid dims="4, 4, 2" spacing="0.5, 0.5, 1.0" origin="-1, -1, 0" material="1">
                    <region min="0, 0, 1" max="3, 3, 1" material="0"/>
                </grid>
                {}
                {}
            </run>"#,
            water(),
            source,
            tallies
        )
    }

    const BEAM: &str = r#"<source type="point" id="tube" position="0, 0, -5" direction="0, 0, 1" energy="6e4"/>"#;

    #[test]
    fn parses_a_complete_run() {
        let tallies = r#"
            <tally type="cuboid" id="core" min="-1, -1, 0" max="1, 1, 1" quantities="energy_deposition, number_of_photons" bins="0, 1e5, 5"/>
            <tally type="voxel_box" min="1, 1, 0" max="2, 2, 0" quantities="number_of_interactions"/>
            <tally type="disc" center="0, 0, 4" normal="0, 0, 1" radius="2" quantities="incident_energy, entrance_cosine"/>
            <tally type="rectangle" corner="-1, -1, 3" edge1="2, 0, 0" edge2="0, 2, 0" quantities="number_of_photons"/>"#;
        let run = parse_run(&run_xml(tallies, BEAM)).unwrap();
        assert_eq!(run.settings.photons, 2500);
        assert_eq!(run.settings.seed, 9);
        assert_eq!(run.settings.histories_per_chunk, 500);
        assert_eq!(run.settings.energy_cutoff, Some(5000.0));
        assert_eq!(run.engine.energy_cutoff(), 5000.0);

        let grid = run.engine.voxel_grid();
        assert_eq!(grid.dims(), [4, 4, 2]);
        assert_eq!(grid.block_size(), 2);
        assert_eq!(grid.voxel([0, 0, 0]).material(), 1);
        assert_eq!(grid.voxel([3, 3, 1]).material(), 0);
        assert!(run.engine.interaction_data().material(0).unwrap().is_void());

        assert_eq!(run.engine.get_volume_tallies().len(), 2);
        assert_eq!(run.engine.get_surface_tallies().len(), 2);
        assert_eq!(run.engine.get_volume_tallies()[0].id(), "core");
        assert_eq!(run.engine.get_volume_tallies()[0].container().bins().count(), 5);
        assert_eq!(run.source.id(), "tube");
        assert_eq!(run.source.energy_range(), (6e4, 6e4));
    }

    #[test]
    fn parses_line_spectrum() {
        let source = r#"<source position="0, 0, -5" directionality="cone" direction="0, 0, 1" cos_theta_max="0.95">
                <spectrum energy="3e4" weight="2"/>
                <spectrum energy="7e4"/>
            </source>"#;
        let run = parse_run(&run_xml("", source)).unwrap();
        assert_eq!(run.source.energy_range(), (3e4, 7e4));
    }

    #[test]
    fn reports_configuration_errors() {
        let no_grid = format!("<run>{}{}</run>", water(), BEAM);
        assert!(matches!(parse_run(&no_grid), Err(LoadError::MissingField("grid"))));

        let skew = r#"<tally type="rectangle" corner="0, 0, 3" edge1="1, 0, 0" edge2="1, 1, 0" quantities="number_of_photons"/>"#;
        assert!(matches!(parse_run(&run_xml(skew, BEAM)), Err(LoadError::Grid(GridError::InvalidShape(_)))));

        let unknown = r#"<tally type="sphere" quantities="number_of_photons"/>"#;
        assert!(matches!(parse_run(&run_xml(unknown, BEAM)), Err(LoadError::Parse(_))));

        let bad_quantity = r#"<tally type="disc" center="0, 0, 4" normal="0, 0, 1" radius="2" quantities="dose"/>"#;
        assert!(matches!(parse_run(&run_xml(bad_quantity, BEAM)), Err(LoadError::Parse(_))));

        assert!(matches!(parse_run(&run_xml("", "")), Err(LoadError::MissingField("source"))));

        let stray = r#"<run><region min="0, 0, 0" max="0, 0, 0" material="1"/></run>"#;
        assert!(matches!(parse_run(stray), Err(LoadError::Parse(_))));

        let cutoff = run_xml("", BEAM).replace(r#"value="5000""#, r#"value="10""#);
        assert!(matches!(parse_run(&cutoff), Err(LoadError::Data(DataError::EnergyOutOfRange { .. }))));
    }
}
