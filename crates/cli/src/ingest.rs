//! GeoJSON footprints to building records

use anyhow::{bail, Context, Result};
use geojson::{feature::Id, Feature, GeoJson, JsonValue};
use naturf_core::{BuildingId, BuildingRecord};
use std::path::Path;

/// Property names holding the building id and height
#[derive(Debug, Clone)]
pub struct FieldNames {
    pub id: String,
    pub height: String,
}

/// Read a `FeatureCollection` into building records.
///
/// Missing or null properties are passed through as `None` so the footprint
/// table reports them with the offending building.
pub fn read_geojson(path: &Path, fields: &FieldNames) -> Result<Vec<BuildingRecord>> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    parse_geojson(&text, fields).with_context(|| format!("Invalid GeoJSON in {}", path.display()))
}

pub fn parse_geojson(text: &str, fields: &FieldNames) -> Result<Vec<BuildingRecord>> {
    let geojson: GeoJson = text.parse()?;
    let GeoJson::FeatureCollection(collection) = geojson else {
        bail!("expected a FeatureCollection");
    };
    collection
        .features
        .into_iter()
        .enumerate()
        .map(|(i, feature)| to_record(feature, fields).with_context(|| format!("feature #{i}")))
        .collect()
}

fn to_record(feature: Feature, fields: &FieldNames) -> Result<BuildingRecord> {
    let id = match feature.property(&fields.id) {
        Some(value) => json_id(value),
        None => feature.id.clone().map(|id| match id {
            Id::String(s) => BuildingId::Text(s),
            Id::Number(n) => number_id(&n),
        }),
    };

    let height = match feature.property(&fields.height) {
        None | Some(JsonValue::Null) => None,
        Some(JsonValue::Number(n)) => n.as_f64(),
        Some(JsonValue::String(s)) => Some(
            s.trim()
                .parse::<f64>()
                .with_context(|| format!("height {s:?} is not a number"))?,
        ),
        Some(other) => bail!("height {other} is not a number"),
    };

    let geometry = match feature.geometry {
        Some(g) => Some(geo::Geometry::<f64>::try_from(g).context("unsupported geometry")?),
        None => None,
    };

    Ok(BuildingRecord {
        id,
        height,
        geometry,
    })
}

fn json_id(value: &JsonValue) -> Option<BuildingId> {
    match value {
        JsonValue::String(s) => Some(BuildingId::Text(s.clone())),
        JsonValue::Number(n) => Some(number_id(n)),
        _ => None,
    }
}

fn number_id(n: &serde_json::Number) -> BuildingId {
    match n.as_i64() {
        Some(i) => BuildingId::Int(i),
        None => BuildingId::Text(n.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fields() -> FieldNames {
        FieldNames {
            id: "ID".into(),
            height: "height".into(),
        }
    }

    const COLLECTION: &str = r#"{
        "type": "FeatureCollection",
        "features": [
            {
                "type": "Feature",
                "properties": {"ID": 17, "height": 12.5},
                "geometry": {"type": "Polygon", "coordinates": [[[0,0],[0,1],[1,1],[1,0],[0,0]]]}
            },
            {
                "type": "Feature",
                "id": "fallback",
                "properties": {"height": "7"},
                "geometry": {"type": "Polygon", "coordinates": [[[5,0],[5,1],[6,1],[6,0],[5,0]]]}
            },
            {
                "type": "Feature",
                "properties": {"ID": "b-3", "height": null},
                "geometry": null
            }
        ]
    }"#;

    #[test]
    fn test_parse_features() {
        let records = parse_geojson(COLLECTION, &fields()).unwrap();
        assert_eq!(records.len(), 3);

        assert_eq!(records[0].id, Some(BuildingId::Int(17)));
        assert_eq!(records[0].height, Some(12.5));
        assert!(matches!(records[0].geometry, Some(geo::Geometry::Polygon(_))));

        assert_eq!(records[1].id, Some(BuildingId::Text("fallback".into())));
        assert_eq!(records[1].height, Some(7.0));

        assert_eq!(records[2].id, Some(BuildingId::Text("b-3".into())));
        assert_eq!(records[2].height, None);
        assert!(records[2].geometry.is_none());
    }

    #[test]
    fn test_rejects_bare_geometry() {
        let text = r#"{"type": "Point", "coordinates": [0, 0]}"#;
        assert!(parse_geojson(text, &fields()).is_err());
    }

    #[test]
    fn test_rejects_non_numeric_height() {
        let text = r#"{"type": "FeatureCollection", "features": [
            {"type": "Feature", "properties": {"ID": 1, "height": "tall"}, "geometry": null}
        ]}"#;
        let err = parse_geojson(text, &fields()).unwrap_err();
        assert!(format!("{err:#}").contains("feature #0"));
    }
}
