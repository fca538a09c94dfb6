use super::{buffer_round, buffer_square, BoundingBox, BuildingId, BuildingRecord};
use crate::error::{Error, Result};
use crate::settings::{CapStyle, Settings};
use geo::line_intersection::line_intersection;
use geo::{Area, Centroid, Coord, Geometry, Line, Point, Polygon};
use std::collections::HashSet;
use std::ops::Index;
use tracing::{debug, info};

/// A validated building with its derived geometry cached.
///
/// Buildings are created once at ingest and never mutated.
#[derive(Debug, Clone)]
pub struct Building {
    pub id: BuildingId,
    /// Height in metres, always > 0
    pub height: f64,
    pub footprint: Polygon<f64>,
    /// Footprint area (holes subtracted)
    pub area: f64,
    pub centroid: Point<f64>,
    /// Envelope of the footprint
    pub bbox: BoundingBox,
    /// Neighborhood buffer around the centroid
    pub buffer: Polygon<f64>,
    /// Envelope of `buffer`
    pub buffer_bbox: BoundingBox,
}

/// The in-memory record set of all buildings of a tile, indexed `0..N`.
#[derive(Debug, Clone, Default)]
pub struct FootprintTable {
    buildings: Vec<Building>,
    /// Area of one neighborhood buffer (constant for a radius and cap style)
    total_plan_area: f64,
}

impl FootprintTable {
    /// Validate records, drop buildings with height <= 0 and reindex the rest
    /// contiguously in input order.
    pub fn from_records<I>(records: I, settings: &Settings) -> Result<Self>
    where
        I: IntoIterator<Item = BuildingRecord>,
    {
        let mut buildings = Vec::new();
        let mut seen = HashSet::new();
        let mut filtered = 0usize;

        for (position, record) in records.into_iter().enumerate() {
            let id = record
                .id
                .ok_or_else(|| Error::input(format!("#{position}"), "missing id"))?;
            let height = record
                .height
                .ok_or_else(|| Error::input(&id, "missing height"))?;
            if !height.is_finite() {
                return Err(Error::input(&id, format!("non-finite height {height}")));
            }
            let geometry = record
                .geometry
                .ok_or_else(|| Error::input(&id, "missing geometry"))?;

            if !seen.insert(id.clone()) {
                return Err(Error::input(&id, "duplicate id"));
            }

            if height <= 0.0 {
                filtered += 1;
                continue;
            }

            let footprint = single_polygon(&id, geometry)?;
            buildings.push(Building::new(id, height, footprint, settings)?);
        }

        if filtered > 0 {
            debug!("Dropped {} buildings with height <= 0", filtered);
        }
        info!("Footprint table: {} buildings", buildings.len());

        let total_plan_area = match settings.cap_style {
            CapStyle::Square => (2.0 * settings.radius).powi(2),
            CapStyle::Round => buffer_round(&Point::new(0.0, 0.0), settings.radius, settings.round_segments)
                .unsigned_area(),
        };

        Ok(Self {
            buildings,
            total_plan_area,
        })
    }

    pub fn len(&self) -> usize {
        self.buildings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buildings.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Building> {
        self.buildings.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Building> {
        self.buildings.iter()
    }

    pub fn buildings(&self) -> &[Building] {
        &self.buildings
    }

    /// Area of the neighborhood buffer, `A_t`
    pub fn total_plan_area(&self) -> f64 {
        self.total_plan_area
    }

    /// Union of all footprint envelopes, `None` for an empty table
    pub fn extent(&self) -> Option<BoundingBox> {
        self.buildings
            .iter()
            .map(|b| b.bbox)
            .reduce(|acc, bb| acc.union(&bb))
    }
}

impl Index<usize> for FootprintTable {
    type Output = Building;

    fn index(&self, index: usize) -> &Building {
        &self.buildings[index]
    }
}

impl Building {
    fn new(id: BuildingId, height: f64, footprint: Polygon<f64>, settings: &Settings) -> Result<Self> {
        validate_footprint(&id, &footprint)?;

        let area = footprint.unsigned_area();
        if area <= 0.0 || !area.is_finite() {
            return Err(Error::geometry(&id, "zero-area footprint"));
        }
        let centroid = footprint
            .centroid()
            .ok_or_else(|| Error::geometry(&id, "footprint has no centroid"))?;
        let bbox = BoundingBox::of_polygon(&footprint)
            .ok_or_else(|| Error::geometry(&id, "empty footprint"))?;

        let buffer = match settings.cap_style {
            CapStyle::Square => buffer_square(&centroid, settings.radius),
            CapStyle::Round => buffer_round(&centroid, settings.radius, settings.round_segments),
        };
        let buffer_bbox = BoundingBox::of_polygon(&buffer)
            .ok_or_else(|| Error::geometry(&id, "empty neighborhood buffer"))?;

        Ok(Self {
            id,
            height,
            footprint,
            area,
            centroid,
            bbox,
            buffer,
            buffer_bbox,
        })
    }

    /// Neighborhood buffer (the buffered square for the default cap style)
    pub fn buffered_square(&self) -> &Polygon<f64> {
        &self.buffer
    }
}

fn single_polygon(id: &BuildingId, geometry: Geometry<f64>) -> Result<Polygon<f64>> {
    match geometry {
        Geometry::Polygon(p) => Ok(p),
        Geometry::MultiPolygon(mut mp) if mp.0.len() == 1 => Ok(mp.0.remove(0)),
        Geometry::MultiPolygon(mp) if mp.0.is_empty() => {
            Err(Error::geometry(id, "empty multipolygon"))
        }
        Geometry::MultiPolygon(mp) => Err(Error::geometry(
            id,
            format!("multi-part footprint with {} parts", mp.0.len()),
        )),
        other => Err(Error::geometry(
            id,
            format!("expected a polygon, got {}", geometry_kind(&other)),
        )),
    }
}

fn geometry_kind(geom: &Geometry<f64>) -> &'static str {
    match geom {
        Geometry::Point(_) => "Point",
        Geometry::Line(_) => "Line",
        Geometry::LineString(_) => "LineString",
        Geometry::Polygon(_) => "Polygon",
        Geometry::MultiPoint(_) => "MultiPoint",
        Geometry::MultiLineString(_) => "MultiLineString",
        Geometry::MultiPolygon(_) => "MultiPolygon",
        Geometry::GeometryCollection(_) => "GeometryCollection",
        Geometry::Rect(_) => "Rect",
        Geometry::Triangle(_) => "Triangle",
    }
}

/// Exterior ring with consecutive duplicates and the closing vertex removed
fn distinct_ring(poly: &Polygon<f64>) -> Vec<Coord<f64>> {
    let mut ring: Vec<Coord<f64>> = Vec::with_capacity(poly.exterior().0.len());
    for &c in &poly.exterior().0 {
        if ring.last() != Some(&c) {
            ring.push(c);
        }
    }
    if ring.len() > 1 && ring.first() == ring.last() {
        ring.pop();
    }
    ring
}

fn validate_footprint(id: &BuildingId, poly: &Polygon<f64>) -> Result<()> {
    let ring = distinct_ring(poly);
    if ring.len() < 3 {
        return Err(Error::geometry(
            id,
            format!("exterior ring has {} distinct vertices", ring.len()),
        ));
    }
    if ring.iter().any(|c| !c.x.is_finite() || !c.y.is_finite()) {
        return Err(Error::geometry(id, "non-finite coordinate"));
    }

    // Non-adjacent edges of a simple ring never meet
    let n = ring.len();
    let edges: Vec<Line<f64>> = (0..n).map(|i| Line::new(ring[i], ring[(i + 1) % n])).collect();
    for i in 0..n {
        for j in (i + 2)..n {
            if i == 0 && j == n - 1 {
                continue;
            }
            if line_intersection(edges[i], edges[j]).is_some() {
                return Err(Error::geometry(
                    id,
                    format!("self-intersecting exterior (edges {i} and {j})"),
                ));
            }
        }
    }
    Ok(())
}
