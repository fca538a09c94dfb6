//! Run driver: footprints in, WPS tile out
//!
//! Each intermediate table is a [`Node`] with declared inputs. A run orders
//! the nodes topologically, evaluates them once and caches the results in
//! memory. Only the final tile and its index touch the filesystem.

use crate::geometry::Directional;
use crate::neighborhood::{NeighborhoodIndex, Neighborhoods};
use crate::rasterize::{RasterizedLayers, Rasterizer};
use crate::urban::{
    frontal_length_table, height_statistics_table, mean_distance_table, parameter_table,
    plan_area_table, wall_length_table, zip_aggregates, HeightStatistics, ParameterRecord,
};
use naturf_core::io::{write_wps_output, WpsOutput};
use naturf_core::settings::LAYER_COUNT;
use naturf_core::{
    BuildingId, BuildingRecord, Error, FootprintTable, LayerStack, Raster, Result, Settings,
    TileConfig,
};
use naturf_parallel::{CancellationToken, ProcessingMode};
use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::path::Path;
use tracing::{debug, info};

/// Working stages of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Stage {
    Ingest,
    Index,
    Decompose,
    Aggregate,
    Compute,
    Rasterize,
    Serialize,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Ingest => "ingest",
            Stage::Index => "index",
            Stage::Decompose => "decompose",
            Stage::Aggregate => "aggregate",
            Stage::Compute => "compute",
            Stage::Rasterize => "rasterize",
            Stage::Serialize => "serialize",
        };
        f.write_str(name)
    }
}

/// State of a [`Pipeline`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Init,
    Running(Stage),
    Done,
    /// Terminal; records the stage that failed
    Failed(Stage),
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunState::Init => f.write_str("init"),
            RunState::Running(stage) => write!(f, "{stage}"),
            RunState::Done => f.write_str("done"),
            RunState::Failed(stage) => write!(f, "failed ({stage})"),
        }
    }
}

/// A run failure with the stage it happened in
#[derive(Debug, thiserror::Error)]
#[error("{stage} failed: {source}")]
pub struct PipelineError {
    pub stage: Stage,
    pub source: Error,
}

impl PipelineError {
    pub fn is_cancelled(&self) -> bool {
        matches!(self.source, Error::Cancelled)
    }
}

/// Materialized tables of a run, declared in stage order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Node {
    Footprints,
    Neighborhoods,
    WallLengths,
    FrontalLengths,
    PlanAreas,
    Heights,
    MeanDistances,
    Parameters,
    Layers,
    Stack,
    Output,
}

impl Node {
    pub const ALL: [Node; 11] = [
        Node::Footprints,
        Node::Neighborhoods,
        Node::WallLengths,
        Node::FrontalLengths,
        Node::PlanAreas,
        Node::Heights,
        Node::MeanDistances,
        Node::Parameters,
        Node::Layers,
        Node::Stack,
        Node::Output,
    ];

    pub fn stage(self) -> Stage {
        match self {
            Node::Footprints => Stage::Ingest,
            Node::Neighborhoods => Stage::Index,
            Node::WallLengths => Stage::Decompose,
            Node::FrontalLengths
            | Node::PlanAreas
            | Node::Heights
            | Node::MeanDistances => Stage::Aggregate,
            Node::Parameters => Stage::Compute,
            Node::Layers | Node::Stack => Stage::Rasterize,
            Node::Output => Stage::Serialize,
        }
    }

    pub fn inputs(self) -> Vec<Node> {
        match self {
            Node::Footprints => vec![],
            Node::Neighborhoods | Node::WallLengths => vec![Node::Footprints],
            Node::FrontalLengths => vec![Node::Footprints, Node::Neighborhoods, Node::WallLengths],
            Node::PlanAreas | Node::Heights | Node::MeanDistances => {
                vec![Node::Footprints, Node::Neighborhoods]
            }
            Node::Parameters => vec![
                Node::Footprints,
                Node::FrontalLengths,
                Node::PlanAreas,
                Node::Heights,
                Node::MeanDistances,
            ],
            Node::Layers => vec![Node::Footprints, Node::Parameters],
            Node::Stack => vec![Node::Layers],
            Node::Output => vec![Node::Stack],
        }
    }
}

/// Kahn's algorithm; among ready nodes the smallest goes first.
///
/// Fails if an input is not among `nodes` or the graph has a cycle.
pub fn topological_order<N, F>(nodes: &[N], inputs: F) -> Result<Vec<N>>
where
    N: Copy + Ord + fmt::Debug + std::hash::Hash,
    F: Fn(N) -> Vec<N>,
{
    let mut pending: HashMap<N, usize> = HashMap::new();
    let mut dependents: HashMap<N, Vec<N>> = HashMap::new();
    for &node in nodes {
        let deps = inputs(node);
        for dep in &deps {
            if !nodes.contains(dep) {
                return Err(Error::Other(format!("{node:?} depends on undeclared {dep:?}")));
            }
            dependents.entry(*dep).or_default().push(node);
        }
        pending.insert(node, deps.len());
    }

    let mut ready: BTreeSet<N> = pending
        .iter()
        .filter(|(_, n)| **n == 0)
        .map(|(node, _)| *node)
        .collect();
    let mut order = Vec::with_capacity(nodes.len());

    while let Some(node) = ready.pop_first() {
        order.push(node);
        for dependent in dependents.get(&node).into_iter().flatten() {
            if let Some(n) = pending.get_mut(dependent) {
                *n -= 1;
                if *n == 0 {
                    ready.insert(*dependent);
                }
            }
        }
    }

    if order.len() != pending.len() {
        return Err(Error::Other("dependency cycle between pipeline nodes".into()));
    }
    Ok(order)
}

/// Everything a run produces
#[derive(Debug, Clone)]
pub struct RunOutput {
    /// Per-building parameters in filtered input order
    pub parameters: Vec<(BuildingId, ParameterRecord)>,
    pub neighbor_pairs: usize,
    pub stack: LayerStack,
    pub building_count: Raster<u32>,
    /// Paths of the written tile and index; `None` without output
    pub output: Option<WpsOutput>,
}

#[derive(Default)]
struct Cache {
    records: Option<Vec<BuildingRecord>>,
    footprints: Option<FootprintTable>,
    neighborhoods: Option<Neighborhoods>,
    wall_lengths: Option<Vec<Directional<f64>>>,
    frontal_lengths: Option<Vec<Directional<f64>>>,
    plan_areas: Option<Vec<f64>>,
    heights: Option<Vec<HeightStatistics>>,
    mean_distances: Option<Vec<f64>>,
    parameters: Option<Vec<ParameterRecord>>,
    layers: Option<RasterizedLayers>,
    stack: Option<LayerStack>,
    output: Option<WpsOutput>,
}

fn need<'a, T>(slot: &'a Option<T>, node: Node) -> Result<&'a T> {
    slot.as_ref()
        .ok_or_else(|| Error::Other(format!("{node:?} was not computed")))
}

/// The urban morphology pipeline for one tile
#[derive(Debug, Clone)]
pub struct Pipeline {
    settings: Settings,
    tile: TileConfig,
    mode: ProcessingMode,
    cancel: CancellationToken,
    state: RunState,
}

impl Pipeline {
    /// Create a pipeline; fails if `settings` are invalid.
    pub fn new(settings: Settings, tile: TileConfig) -> Result<Self> {
        settings.validate()?;
        Ok(Self {
            settings,
            tile,
            mode: ProcessingMode::default(),
            cancel: CancellationToken::new(),
            state: RunState::Init,
        })
    }

    pub fn with_mode(mut self, mode: ProcessingMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Token that cancels this pipeline's runs
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn tile(&self) -> &TileConfig {
        &self.tile
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    /// Run every stage and write the tile and index into `output_dir`.
    pub fn run<I, P>(&mut self, records: I, output_dir: P) -> std::result::Result<RunOutput, PipelineError>
    where
        I: IntoIterator<Item = BuildingRecord>,
        P: AsRef<Path>,
    {
        self.execute(records, Some(output_dir.as_ref()))
    }

    /// Run up to the layer stack without touching the filesystem.
    pub fn run_without_output<I>(&mut self, records: I) -> std::result::Result<RunOutput, PipelineError>
    where
        I: IntoIterator<Item = BuildingRecord>,
    {
        self.execute(records, None)
    }

    fn transition(&mut self, next: RunState) {
        debug!("Run state: {} -> {}", self.state, next);
        self.state = next;
    }

    fn execute<I>(
        &mut self,
        records: I,
        output_dir: Option<&Path>,
    ) -> std::result::Result<RunOutput, PipelineError>
    where
        I: IntoIterator<Item = BuildingRecord>,
    {
        self.transition(RunState::Init);

        let nodes: Vec<Node> = Node::ALL
            .into_iter()
            .filter(|n| output_dir.is_some() || *n != Node::Output)
            .collect();
        let order = topological_order(&nodes, Node::inputs).map_err(|source| PipelineError {
            stage: Stage::Ingest,
            source,
        })?;

        let mut cache = Cache {
            records: Some(records.into_iter().collect()),
            ..Cache::default()
        };

        for node in order {
            let stage = node.stage();
            if self.state != RunState::Running(stage) {
                self.transition(RunState::Running(stage));
            }
            let result = self
                .cancel
                .check()
                .and_then(|_| self.evaluate(node, &mut cache, output_dir));
            if let Err(source) = result {
                self.transition(RunState::Failed(stage));
                return Err(PipelineError { stage, source });
            }
        }

        let output = self.assemble(cache).map_err(|source| PipelineError {
            stage: Stage::Serialize,
            source,
        })?;
        self.transition(RunState::Done);
        Ok(output)
    }

    fn evaluate(&self, node: Node, cache: &mut Cache, output_dir: Option<&Path>) -> Result<()> {
        let (mode, cancel, settings) = (&self.mode, &self.cancel, &self.settings);
        match node {
            Node::Footprints => {
                let records = cache.records.take().unwrap_or_default();
                let table = FootprintTable::from_records(records, settings)?;
                if table.is_empty() {
                    return Err(Error::Other("no buildings with height > 0".into()));
                }
                cache.footprints = Some(table);
            }
            Node::Neighborhoods => {
                let table = need(&cache.footprints, Node::Footprints)?;
                let index = NeighborhoodIndex::build(table)?;
                let neighborhoods = Neighborhoods::resolve(&index, mode, cancel)?;
                info!(
                    "Neighborhoods: {} pairs for {} buildings",
                    neighborhoods.pair_count(),
                    neighborhoods.len()
                );
                cache.neighborhoods = Some(neighborhoods);
            }
            Node::WallLengths => {
                let table = need(&cache.footprints, Node::Footprints)?;
                cache.wall_lengths = Some(wall_length_table(table, mode, cancel)?);
            }
            Node::FrontalLengths => {
                let table = need(&cache.footprints, Node::Footprints)?;
                let neighborhoods = need(&cache.neighborhoods, Node::Neighborhoods)?;
                let walls = need(&cache.wall_lengths, Node::WallLengths)?;
                cache.frontal_lengths =
                    Some(frontal_length_table(table, neighborhoods, walls, mode, cancel)?);
            }
            Node::PlanAreas => {
                let table = need(&cache.footprints, Node::Footprints)?;
                let neighborhoods = need(&cache.neighborhoods, Node::Neighborhoods)?;
                cache.plan_areas = Some(plan_area_table(table, neighborhoods, mode, cancel)?);
            }
            Node::Heights => {
                let table = need(&cache.footprints, Node::Footprints)?;
                let neighborhoods = need(&cache.neighborhoods, Node::Neighborhoods)?;
                cache.heights = Some(height_statistics_table(table, neighborhoods, mode, cancel)?);
            }
            Node::MeanDistances => {
                let table = need(&cache.footprints, Node::Footprints)?;
                let neighborhoods = need(&cache.neighborhoods, Node::Neighborhoods)?;
                cache.mean_distances = Some(mean_distance_table(
                    table,
                    neighborhoods,
                    settings.default_street_width,
                    mode,
                    cancel,
                )?);
            }
            Node::Parameters => {
                let table = need(&cache.footprints, Node::Footprints)?;
                let aggregates = zip_aggregates(
                    need(&cache.frontal_lengths, Node::FrontalLengths)?,
                    need(&cache.plan_areas, Node::PlanAreas)?,
                    need(&cache.heights, Node::Heights)?,
                    need(&cache.mean_distances, Node::MeanDistances)?,
                );
                let parameters = parameter_table(table, &aggregates, settings, mode, cancel)?;
                info!("Computed parameters for {} buildings", parameters.len());
                cache.parameters = Some(parameters);
            }
            Node::Layers => {
                let table = need(&cache.footprints, Node::Footprints)?;
                let parameters = need(&cache.parameters, Node::Parameters)?;
                let extent = table
                    .extent()
                    .ok_or_else(|| Error::Other("empty footprint table".into()))?;
                let rasterizer = Rasterizer::covering(&extent, self.tile.resolution(settings))?;
                let values: Vec<_> = parameters.iter().map(ParameterRecord::to_layers).collect();
                let (rows, cols) = rasterizer.shape();
                info!("Rasterizing {} layers on a {} x {} grid", LAYER_COUNT, rows, cols);
                cache.layers = Some(rasterizer.burn(table, &values, Some(self.tile.projection), cancel)?);
            }
            Node::Stack => {
                let layers = need(&cache.layers, Node::Layers)?;
                cache.stack = Some(LayerStack::from_layers(&layers.layers)?);
            }
            Node::Output => {
                let stack = need(&cache.stack, Node::Stack)?;
                let dir = output_dir.ok_or_else(|| Error::Other("no output directory".into()))?;
                cache.output = Some(write_wps_output(stack, self.tile.projection, settings, dir)?);
            }
        }
        Ok(())
    }

    fn assemble(&self, cache: Cache) -> Result<RunOutput> {
        let Cache {
            footprints,
            neighborhoods,
            parameters,
            layers,
            stack,
            output,
            ..
        } = cache;

        let table = footprints.ok_or_else(|| Error::Other("Footprints was not computed".into()))?;
        let parameters = parameters.ok_or_else(|| Error::Other("Parameters was not computed".into()))?;
        let layers = layers.ok_or_else(|| Error::Other("Layers was not computed".into()))?;
        let stack = stack.ok_or_else(|| Error::Other("Stack was not computed".into()))?;

        Ok(RunOutput {
            parameters: table
                .iter()
                .map(|b| b.id.clone())
                .zip(parameters)
                .collect(),
            neighbor_pairs: neighborhoods.map_or(0, |n| n.pair_count()),
            stack,
            building_count: layers.building_count,
            output,
        })
    }
}
