//! JSON documents consumed by the map front end.
//!
//! `frames.json` groups metrics by year; `heat_<year>.geojson` is a GeoJSON
//! `FeatureCollection` of points whose `v` property is the heat value.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::Serialize;

use super::{ExportError, StagedWrites};
use crate::heat::HeatSample;
use crate::pipeline::FrameRecord;

/// All years with their metrics.
#[derive(Debug, Serialize)]
pub struct FramesDocument {
    pub years: Vec<i32>,
    pub frames: Vec<YearFrame>,
}

/// Metrics of a single year keyed by metric name.
#[derive(Debug, Serialize)]
pub struct YearFrame {
    pub year: i32,
    pub metrics: BTreeMap<&'static str, f64>,
}

#[derive(Debug, Serialize)]
pub struct FeatureCollection {
    #[serde(rename = "type")]
    kind: &'static str,
    pub features: Vec<Feature>,
}

#[derive(Debug, Serialize)]
pub struct Feature {
    #[serde(rename = "type")]
    kind: &'static str,
    pub geometry: Geometry,
    pub properties: Properties,
}

#[derive(Debug, Serialize)]
pub struct Geometry {
    #[serde(rename = "type")]
    kind: &'static str,
    pub coordinates: [f64; 2],
}

#[derive(Debug, Serialize)]
pub struct Properties {
    pub v: f64,
}

/// Groups the frame stream by year, years ascending.
pub fn frames_document(frames: &[FrameRecord]) -> FramesDocument {
    let mut by_year: BTreeMap<i32, BTreeMap<&'static str, f64>> = BTreeMap::new();
    for f in frames {
        by_year
            .entry(f.year)
            .or_default()
            .insert(f.metric.as_str(), f.value);
    }
    FramesDocument {
        years: by_year.keys().copied().collect(),
        frames: by_year
            .into_iter()
            .map(|(year, metrics)| YearFrame { year, metrics })
            .collect(),
    }
}

/// Point features for the samples of one year, in sample order.
pub fn heat_feature_collection(samples: &[HeatSample], year: i32) -> FeatureCollection {
    let features = samples
        .iter()
        .filter(|s| s.year == year)
        .map(|s| Feature {
            kind: "Feature",
            geometry: Geometry {
                kind: "Point",
                coordinates: [s.lon, s.lat],
            },
            properties: Properties { v: s.value },
        })
        .collect();
    FeatureCollection {
        kind: "FeatureCollection",
        features,
    }
}

/// Writes `frames.json` and one `heat_<year>.geojson` per year into `dir`,
/// removing heat layers of years this run did not produce.
///
/// # Errors
///
/// Returns an `ExportError` if the directory cannot be created or a file
/// cannot be written.
pub fn export_geojson_dir(
    frames: &[FrameRecord],
    samples: &[HeatSample],
    dir: &Path,
) -> Result<(), ExportError> {
    let mut batch = StagedWrites::new();
    stage_geojson_dir(frames, samples, dir, &mut batch)?;
    batch.commit()
}

/// Stages the GeoJSON layer set into `batch` without touching existing files.
pub(crate) fn stage_geojson_dir(
    frames: &[FrameRecord],
    samples: &[HeatSample],
    dir: &Path,
    batch: &mut StagedWrites,
) -> Result<(), ExportError> {
    fs::create_dir_all(dir)?;
    let doc = frames_document(frames);
    batch.stage(&dir.join("frames.json"), |w| {
        Ok(serde_json::to_writer(w, &doc)?)
    })?;
    for &year in &doc.years {
        let collection = heat_feature_collection(samples, year);
        batch.stage(&dir.join(heat_layer_name(year)), |w| {
            Ok(serde_json::to_writer(w, &collection)?)
        })?;
    }

    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        let file_year = path
            .file_name()
            .and_then(|name| name.to_str())
            .and_then(layer_year);
        if file_year.is_some_and(|year| doc.years.binary_search(&year).is_err()) {
            batch.remove_on_commit(path);
        }
    }
    Ok(())
}

fn heat_layer_name(year: i32) -> String {
    format!("heat_{year}.geojson")
}

/// Year of a `heat_<year>.geojson` file name.
fn layer_year(name: &str) -> Option<i32> {
    name.strip_prefix("heat_")?
        .strip_suffix(".geojson")?
        .parse()
        .ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adequacy::Metric;

    fn frames() -> Vec<FrameRecord> {
        [2021, 2020]
            .into_iter()
            .flat_map(|year| {
                Metric::ALL.into_iter().map(move |metric| FrameRecord {
                    year,
                    metric,
                    value: f64::from(year - 2000),
                })
            })
            .collect()
    }

    fn samples() -> Vec<HeatSample> {
        vec![
            HeatSample {
                year: 2020,
                lon: 88.0,
                lat: 20.5,
                value: 0.1,
            },
            HeatSample {
                year: 2021,
                lon: 88.12,
                lat: 20.5,
                value: -0.2,
            },
        ]
    }

    #[test]
    fn frames_document_groups_by_year() {
        let doc = frames_document(&frames());
        assert_eq!(doc.years, vec![2020, 2021]);
        assert_eq!(doc.frames[0].metrics.len(), 4);
        assert_eq!(doc.frames[1].metrics["peak_demand"], 21.0);
    }

    #[test]
    fn feature_collection_shape() {
        let fc = heat_feature_collection(&samples(), 2021);
        let json = serde_json::to_value(&fc).expect("serialize");
        assert_eq!(json["type"], "FeatureCollection");
        let features = json["features"].as_array().expect("features array");
        assert_eq!(features.len(), 1);
        assert_eq!(features[0]["type"], "Feature");
        assert_eq!(features[0]["geometry"]["type"], "Point");
        assert_eq!(features[0]["geometry"]["coordinates"][0], 88.12);
        assert_eq!(features[0]["properties"]["v"], -0.2);
    }

    #[test]
    fn export_writes_one_file_per_year() {
        let dir = tempfile::tempdir().expect("tempdir");
        export_geojson_dir(&frames(), &samples(), dir.path()).expect("export");
        assert!(dir.path().join("frames.json").exists());
        assert!(dir.path().join("heat_2020.geojson").exists());
        assert!(dir.path().join("heat_2021.geojson").exists());

        let raw = fs::read_to_string(dir.path().join("frames.json")).expect("read");
        let json: serde_json::Value = serde_json::from_str(&raw).expect("valid json");
        assert_eq!(json["years"][1], 2021);
    }

    #[test]
    fn shorter_rerun_drops_stale_layers() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut later = samples();
        later.push(HeatSample {
            year: 2022,
            lon: 88.0,
            lat: 20.5,
            value: 0.0,
        });
        let mut later_frames = frames();
        later_frames.push(FrameRecord {
            year: 2022,
            metric: Metric::AdequacyIndex,
            value: 0.0,
        });
        export_geojson_dir(&later_frames, &later, dir.path()).expect("first export");
        assert!(dir.path().join("heat_2022.geojson").exists());

        let unrelated = dir.path().join("heat_notes.geojson");
        fs::write(&unrelated, "{}").expect("seed unrelated file");

        export_geojson_dir(&frames(), &samples(), dir.path()).expect("second export");
        assert!(!dir.path().join("heat_2022.geojson").exists());
        assert!(dir.path().join("heat_2020.geojson").exists());
        assert!(dir.path().join("heat_2021.geojson").exists());
        assert!(unrelated.exists());
    }

    #[test]
    fn layer_year_parses_heat_file_names() {
        assert_eq!(layer_year("heat_2031.geojson"), Some(2031));
        assert_eq!(layer_year("heat_2031.geojson.partial"), None);
        assert_eq!(layer_year("frames.json"), None);
    }
}
