#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Neighborhood boundaries for the choropleth map.
//!
//! Loads the neighborhood `GeoJSON` feature collection, annotates each
//! feature with its report count for the map tooltip, and resolves a map
//! click (longitude/latitude) back to a neighborhood name through an
//! R-tree of the boundary polygons. Features are keyed by their `name`
//! property, which must match the report `Neighborhood` text exactly.

use std::collections::BTreeSet;
use std::path::Path;

use geo::{BoundingRect as _, Contains as _, MultiPolygon};
use geojson::{FeatureCollection, GeoJson};
use pdx_crime_analytics_models::NeighborhoodCounts;
use rstar::{AABB, RTree, RTreeObject};
use thiserror::Error;

/// Feature property holding the neighborhood name.
pub const NAME_PROPERTY: &str = "name";

/// Feature property holding the tooltip text.
pub const RECORDS_PROPERTY: &str = "records";

/// Feature property holding the numeric report count.
pub const COUNT_PROPERTY: &str = "count";

/// Errors that can occur while loading boundaries.
#[derive(Debug, Error)]
pub enum GeographyError {
    /// The boundary file could not be read.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The file is not valid `GeoJSON`.
    #[error("GeoJSON error: {0}")]
    GeoJson(#[from] geojson::Error),

    /// The `GeoJSON` is valid but not usable as boundaries.
    #[error("Conversion error: {message}")]
    Conversion {
        /// Description of what went wrong.
        message: String,
    },
}

/// A boundary polygon stored in the R-tree with its neighborhood name.
struct BoundaryEntry {
    name: String,
    envelope: AABB<[f64; 2]>,
    polygon: MultiPolygon<f64>,
}

impl RTreeObject for BoundaryEntry {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        self.envelope
    }
}

/// Neighborhood boundaries loaded once and shared read-only.
pub struct Boundaries {
    collection: FeatureCollection,
    names: BTreeSet<String>,
    index: RTree<BoundaryEntry>,
}

impl Boundaries {
    /// Loads a boundary file from disk.
    ///
    /// # Errors
    ///
    /// Returns [`GeographyError`] if the file cannot be read or is not a
    /// `GeoJSON` feature collection.
    pub fn from_path(path: &Path) -> Result<Self, GeographyError> {
        log::info!("Loading neighborhood boundaries from {}", path.display());
        let text = std::fs::read_to_string(path)?;
        Self::from_geojson_str(&text)
    }

    /// Parses boundaries from `GeoJSON` text.
    ///
    /// # Errors
    ///
    /// Returns [`GeographyError`] if the text is not a `GeoJSON` feature
    /// collection.
    pub fn from_geojson_str(text: &str) -> Result<Self, GeographyError> {
        match text.parse::<GeoJson>()? {
            GeoJson::FeatureCollection(collection) => Ok(Self::from_collection(collection)),
            other => Err(GeographyError::Conversion {
                message: format!("expected a FeatureCollection, found {}", kind_of(&other)),
            }),
        }
    }

    /// Indexes an already-parsed feature collection.
    ///
    /// Features without a `name` are kept in the collection but cannot be
    /// looked up; features without polygon geometry are named but not
    /// indexed.
    #[must_use]
    pub fn from_collection(collection: FeatureCollection) -> Self {
        let mut names = BTreeSet::new();
        let mut entries = Vec::new();

        for (i, feature) in collection.features.iter().enumerate() {
            let Some(name) = feature_name(feature) else {
                log::warn!("Boundary feature {i} has no '{NAME_PROPERTY}' property; skipping");
                continue;
            };
            names.insert(name.to_string());

            let Some(polygon) = feature.geometry.clone().and_then(to_multipolygon) else {
                log::warn!("Boundary '{name}' has no polygon geometry; it cannot be clicked");
                continue;
            };

            entries.push(BoundaryEntry {
                name: name.to_string(),
                envelope: compute_envelope(&polygon),
                polygon,
            });
        }

        log::info!(
            "Indexed {} of {} neighborhood boundaries",
            entries.len(),
            collection.features.len()
        );

        Self {
            collection,
            names,
            index: RTree::bulk_load(entries),
        }
    }

    /// Names of every boundary feature, sorted.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }

    /// Number of named boundaries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Whether no named boundaries were loaded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Returns a copy of the collection with tooltip properties set.
    ///
    /// Each named feature gets `records` = `"Records: <count>"` (or
    /// `"N/A"` when the neighborhood has no reports) and a numeric
    /// `count`.
    #[must_use]
    pub fn annotate(&self, counts: &NeighborhoodCounts) -> FeatureCollection {
        let mut collection = self.collection.clone();

        for feature in &mut collection.features {
            let Some(name) = feature_name(feature).map(str::to_string) else {
                continue;
            };
            let count = counts.get(&name).copied();

            let records = count.map_or_else(|| "N/A".to_string(), |c| format!("Records: {c}"));
            feature.set_property(RECORDS_PROPERTY, records);
            feature.set_property(COUNT_PROPERTY, count.unwrap_or(0));
        }

        collection
    }

    /// Resolves a point to the neighborhood containing it.
    ///
    /// Neighborhoods do not overlap, so the first match wins.
    #[must_use]
    pub fn lookup(&self, lng: f64, lat: f64) -> Option<&str> {
        let point = geo::Point::new(lng, lat);
        let query_env = AABB::from_point([lng, lat]);

        self.index
            .locate_in_envelope_intersecting(&query_env)
            .find(|entry| entry.polygon.contains(&point))
            .map(|entry| entry.name.as_str())
    }

    /// Neighborhoods present in `counts` that have no boundary feature.
    ///
    /// These reports are counted but can never be drawn on the map.
    #[must_use]
    pub fn unmatched(&self, counts: &NeighborhoodCounts) -> Vec<String> {
        counts
            .keys()
            .filter(|name| !self.names.contains(*name))
            .cloned()
            .collect()
    }
}

fn feature_name(feature: &geojson::Feature) -> Option<&str> {
    feature
        .property(NAME_PROPERTY)
        .and_then(serde_json::Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

/// Converts a `GeoJSON` geometry into a [`MultiPolygon`].
/// Handles both `Polygon` and `MultiPolygon` geometry types.
fn to_multipolygon(geometry: geojson::Geometry) -> Option<MultiPolygon<f64>> {
    let geo_geom: geo::Geometry<f64> = geometry.try_into().ok()?;
    match geo_geom {
        geo::Geometry::MultiPolygon(mp) => Some(mp),
        geo::Geometry::Polygon(p) => Some(MultiPolygon(vec![p])),
        _ => None,
    }
}

/// Compute the bounding box envelope for a [`MultiPolygon`].
fn compute_envelope(mp: &MultiPolygon<f64>) -> AABB<[f64; 2]> {
    mp.bounding_rect().map_or_else(
        || AABB::from_point([0.0, 0.0]),
        |rect| AABB::from_corners([rect.min().x, rect.min().y], [rect.max().x, rect.max().y]),
    )
}

const fn kind_of(geojson: &GeoJson) -> &'static str {
    match geojson {
        GeoJson::Geometry(_) => "Geometry",
        GeoJson::Feature(_) => "Feature",
        GeoJson::FeatureCollection(_) => "FeatureCollection",
    }
}
