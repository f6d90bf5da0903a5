//! World map of stargazer countries.
//!
//! Writes a self-contained HTML page (Leaflet from a CDN) with one circle
//! per country, placed at the country's average latitude/longitude and sized
//! by its share of matched stars.
//!
//! Centroids come from `average-latitude-longitude-countries.csv`
//! (`ISO 3166 Country Code,Country,Latitude,Longitude`). Its country names
//! do not always agree with the reference dataset's keys, so a few are
//! renamed on load.

use anyhow::{Context, Result};
use serde::Serialize;
use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use stargazer_geo_core::aggregate::{percentage, GeoSummary};

use crate::config::Config;
use crate::geo::summarize;

/// Centroid-file names that differ from the reference keys.
const RENAMES: &[(&str, &str)] = &[
    ("korea, democratic people's republic of", "korea"),
    ("russian federation", "russia"),
    ("moldova, republic of", "moldova"),
    ("iran, islamic republic of", "iran"),
];

/// The dataset's Canada centroid sits too far north to be useful.
const CANADA_SHIFT: (f64, f64) = (-4.0, -2.0);

pub type Centroids = HashMap<String, (f64, f64)>;

/// One circle on the map.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MapMarker {
    pub country: String,
    pub lat: f64,
    pub lon: f64,
    /// Circle radius in meters.
    pub radius: f64,
    pub popup: String,
}

pub fn load_centroids(path: &Path) -> Result<Centroids> {
    let file = File::open(path)
        .with_context(|| format!("Failed to open centroid file: {}", path.display()))?;
    load_centroids_from(file).with_context(|| format!("Invalid centroid file: {}", path.display()))
}

pub fn load_centroids_from<R: Read>(source: R) -> Result<Centroids> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_reader(source);

    let mut centroids = Centroids::new();
    for (row, record) in reader.records().enumerate() {
        let record = record?;
        if record.len() < 4 {
            anyhow::bail!("row {}: expected 4 columns, found {}", row + 1, record.len());
        }
        let mut country = record[1].trim().to_lowercase();
        if let Some((_, renamed)) = RENAMES.iter().find(|(from, _)| *from == country) {
            country = renamed.to_string();
        }
        let lat: f64 = record[2]
            .trim()
            .parse()
            .with_context(|| format!("row {}: bad latitude '{}'", row + 1, &record[2]))?;
        let lon: f64 = record[3]
            .trim()
            .parse()
            .with_context(|| format!("row {}: bad longitude '{}'", row + 1, &record[3]))?;

        let position = if country == "canada" {
            (lat + CANADA_SHIFT.0, lon + CANADA_SHIFT.1)
        } else {
            (lat, lon)
        };
        centroids.insert(country, position);
    }

    centroids.insert("ivory coast".to_string(), (8.0, 6.0));
    Ok(centroids)
}

/// Markers for every matched country that has a centroid.
///
/// Returns the markers and the countries that had to be skipped.
pub fn build_markers(
    summary: &GeoSummary,
    centroids: &Centroids,
    max_radius: f64,
) -> (Vec<MapMarker>, Vec<String>) {
    let mut markers = Vec::new();
    let mut missing = Vec::new();

    for (country, stats) in &summary.countries {
        let Some(&(lat, lon)) = centroids.get(country) else {
            missing.push(country.clone());
            continue;
        };
        let share = percentage(stats.count, summary.total_matches);
        markers.push(MapMarker {
            country: country.clone(),
            lat,
            lon,
            radius: max_radius * share / 100.0,
            popup: format!("{}: {:.2}%", country, share),
        });
    }

    (markers, missing)
}

pub fn render_html(markers: &[MapMarker]) -> Result<String> {
    // Keep the JSON from closing the script element early.
    let data = serde_json::to_string(markers)?.replace("</", "<\\/");
    Ok(format!(
        r#"<!DOCTYPE html>
<html>
<head>
<meta charset="utf-8">
<title>Stargazers by country</title>
<link rel="stylesheet" href="https://unpkg.com/leaflet@1.9.4/dist/leaflet.css">
<script src="https://unpkg.com/leaflet@1.9.4/dist/leaflet.js"></script>
<style>html, body, #map {{ height: 100%; margin: 0; }}</style>
</head>
<body>
<div id="map"></div>
<script>
const markers = {data};
const map = L.map('map').setView([20, 0], 2);
L.tileLayer('https://{{s}}.tile.openstreetmap.org/{{z}}/{{x}}/{{y}}.png', {{
  attribution: '&copy; OpenStreetMap contributors'
}}).addTo(map);
for (const m of markers) {{
  L.circle([m.lat, m.lon], {{
    radius: m.radius,
    color: 'crimson',
    fillColor: 'crimson',
    fill: true
  }}).bindPopup(m.popup).addTo(map);
}}
</script>
</body>
</html>
"#
    ))
}

pub fn run_geo_map(
    config: &Config,
    cache_path: &Path,
    output: &Path,
    trace_country: Option<&str>,
) -> Result<()> {
    let centroids = load_centroids(&config.reference.centroids)?;
    let summary = summarize(config, cache_path, trace_country)?;
    let (markers, missing) = build_markers(&summary, &centroids, config.report.map_max_radius);

    for country in &missing {
        tracing::warn!(country = %country, "no centroid for country; left off the map");
    }

    if let Some(parent) = output.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    std::fs::write(output, render_html(&markers)?)
        .with_context(|| format!("Failed to write map: {}", output.display()))?;

    println!("Created HTML file {}", output.display());
    println!("  countries on map: {}", markers.len());
    if !missing.is_empty() {
        println!("  without centroid: {}", missing.join(", "));
    }
    Ok(())
}
