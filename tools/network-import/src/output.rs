use anyhow::{Context, Result};
use geo::{LineString, Point};
use geojson::{Feature, FeatureCollection, GeoJson, Geometry, Value};
use std::path::Path;
use tissea_network::{LineDetail, OrderedStop};

/// Convert a geo LineString to GeoJSON Value
fn linestring_to_geojson(path: &LineString<f64>) -> Value {
    Value::LineString(path.0.iter().map(|c| vec![c.x, c.y]).collect())
}

fn point_to_geojson(point: Point<f64>) -> Value {
    Value::Point(vec![point.x(), point.y()])
}

/// The route itself, one vertex per stop in order
fn route_feature(detail: &LineDetail, length_km: f64) -> Feature {
    let path: LineString<f64> = detail.stops.iter().map(|s| s.stop.location).collect();

    let mut properties = serde_json::Map::new();
    properties.insert("feature_type".to_string(), serde_json::json!("route"));
    properties.insert("line_id".to_string(), serde_json::json!(detail.line.id.get()));
    properties.insert("number".to_string(), serde_json::json!(detail.line.number.as_ref()));
    properties.insert("name".to_string(), serde_json::json!(detail.line.name.as_ref()));
    properties.insert("category".to_string(), serde_json::json!(detail.category.as_ref()));
    properties.insert("length_km".to_string(), serde_json::json!(length_km));
    if let Some(color) = &detail.line.color {
        properties.insert("color".to_string(), serde_json::json!(color.as_ref()));
    }

    Feature {
        bbox: None,
        geometry: Some(Geometry::new(linestring_to_geojson(&path))),
        id: None,
        properties: Some(properties),
        foreign_members: None,
    }
}

fn stop_feature(ordered: &OrderedStop) -> Feature {
    let mut properties = serde_json::Map::new();
    properties.insert("feature_type".to_string(), serde_json::json!("stop"));
    properties.insert("stop_id".to_string(), serde_json::json!(ordered.stop.id.get()));
    properties.insert("name".to_string(), serde_json::json!(ordered.stop.name.as_ref()));
    properties.insert("order".to_string(), serde_json::json!(ordered.order));

    Feature {
        bbox: None,
        geometry: Some(Geometry::new(point_to_geojson(ordered.stop.location))),
        id: None,
        properties: Some(properties),
        foreign_members: None,
    }
}

/// Route LineString first, then one Point per stop in order.
pub fn line_feature_collection(detail: &LineDetail, length_km: f64) -> FeatureCollection {
    let mut features = Vec::with_capacity(detail.stops.len() + 1);
    features.push(route_feature(detail, length_km));
    features.extend(detail.stops.iter().map(stop_feature));

    FeatureCollection {
        bbox: None,
        features,
        foreign_members: None,
    }
}

/// Write a line's route and stops to a GeoJSON file
pub fn write_line_geojson(detail: &LineDetail, length_km: f64, output_path: &Path) -> Result<()> {
    log::info!(
        "Writing line {} ({} stops) to {}",
        detail.line.number,
        detail.stops.len(),
        output_path.display()
    );

    let geojson = GeoJson::from(line_feature_collection(detail, length_km));
    let json_string = serde_json::to_string_pretty(&geojson)
        .context("Failed to serialize GeoJSON")?;

    std::fs::write(output_path, json_string)
        .with_context(|| format!("Failed to write GeoJSON to {}", output_path.display()))?;

    Ok(())
}
