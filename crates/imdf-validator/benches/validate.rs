// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Benchmarks for loading and validating a synthetic venue.
//!
//! Run with: cargo bench -p imdf-validator

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use imdf_loader::{ArchiveLoader, LoadedArchive};
use imdf_validator::{Validator, ValidatorConfig};
use serde_json::{json, Value};

fn square(x: f64, y: f64, size: f64) -> Value {
    json!({
        "type": "Polygon",
        "coordinates": [[
            [x, y], [x + size, y], [x + size, y + size], [x, y + size], [x, y]
        ]]
    })
}

fn collection(features: Vec<Value>) -> Value {
    json!({"type": "FeatureCollection", "features": features})
}

/// Build collections for `levels` levels with `units_per_level` units each,
/// one anchor and one occupant per unit.
fn build_collections(levels: usize, units_per_level: usize) -> Vec<(&'static str, Value)> {
    let mut level_features = Vec::new();
    let mut unit_features = Vec::new();
    let mut anchor_features = Vec::new();
    let mut occupant_features = Vec::new();

    for l in 0..levels {
        let level_id = format!("L{l}");
        level_features.push(json!({
            "id": level_id,
            "type": "Feature",
            "feature_type": "level",
            "geometry": square(0.0, 0.0, units_per_level as f64 * 10.0),
            "properties": {
                "category": "unspecified",
                "outdoor": false,
                "ordinal": l,
                "name": {"en": format!("Level {l}")},
                "short_name": {"en": format!("{l}")}
            }
        }));

        for u in 0..units_per_level {
            let unit_id = format!("U{l}-{u}");
            let anchor_id = format!("AN{l}-{u}");
            let x = u as f64 * 10.0;
            unit_features.push(json!({
                "id": unit_id,
                "type": "Feature",
                "feature_type": "unit",
                "geometry": square(x, 0.0, 10.0),
                "properties": {
                    "category": "room",
                    "level_id": level_id,
                    "display_point": {"type": "Point", "coordinates": [x + 5.0, 5.0]}
                }
            }));
            anchor_features.push(json!({
                "id": anchor_id,
                "type": "Feature",
                "feature_type": "anchor",
                "geometry": {"type": "Point", "coordinates": [x + 5.0, 5.0]},
                "properties": {"unit_id": unit_id}
            }));
            occupant_features.push(json!({
                "id": format!("O{l}-{u}"),
                "type": "Feature",
                "feature_type": "occupant",
                "geometry": null,
                "properties": {
                    "name": {"en": format!("Shop {l}-{u}")},
                    "category": "restaurant",
                    "anchor_id": anchor_id
                }
            }));
        }
    }

    vec![
        ("level", collection(level_features)),
        ("unit", collection(unit_features)),
        ("anchor", collection(anchor_features)),
        ("occupant", collection(occupant_features)),
    ]
}

fn build_archive(levels: usize, units_per_level: usize) -> LoadedArchive {
    match ArchiveLoader::new().load(build_collections(levels, units_per_level)) {
        Ok(archive) => archive,
        Err(e) => panic!("synthetic archive failed to load: {e}"),
    }
}

fn bench_load(c: &mut Criterion) {
    let mut group = c.benchmark_group("load");

    for units in [100, 1_000] {
        let collections = build_collections(10, units / 10);
        group.bench_with_input(BenchmarkId::new("units", units), &units, |b, _| {
            b.iter(|| {
                let archive = ArchiveLoader::new().load(black_box(collections.clone()));
                black_box(archive.is_ok())
            });
        });
    }

    group.finish();
}

fn bench_validate(c: &mut Criterion) {
    let mut group = c.benchmark_group("validate");

    for units in [100, 1_000, 10_000] {
        let archive = build_archive(10, units / 10);

        for (mode, parallel) in [("parallel", true), ("sequential", false)] {
            let validator = match Validator::new() {
                Ok(v) => v.with_config(ValidatorConfig::new().with_parallel(parallel)),
                Err(e) => panic!("vocabulary failed to load: {e}"),
            };
            group.bench_with_input(BenchmarkId::new(mode, units), &units, |b, _| {
                b.iter(|| {
                    let report = validator.validate(black_box(&archive));
                    black_box(report.map(|r| r.len()))
                });
            });
        }
    }

    group.finish();
}

criterion_group!(benches, bench_load, bench_validate);
criterion_main!(benches);
