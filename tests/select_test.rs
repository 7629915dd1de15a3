use gshhs_binned::prelude::*;
use gshhs_binned::source::{ArchiveFile, ArchiveWriter, ArrayData, LayoutBuilder, MemoryArrays, vars};
use gshhs_binned::{Backend, DecodeError, Diagnostic, LocalBackend, RemoteBackend, decode};
use std::sync::Arc;
use std::thread;

/// One-degree database with features on both sides of the antimeridian
/// and a run of adjacent bins off the Oregon coast.
fn layout() -> LayoutBuilder {
    LayoutBuilder::global(60)
        // 46N..45N row, 125W..122W
        .segment(16075, 1, &[(0, 0), (20000, 30000), (20000, 30000), (40000, 65535)])
        .segment(16075, 2, &[(100, 100), (200, 200)])
        .segment(16076, 1, &[(0, 65535), (65535, 0)])
        .segment(16077, 3, &[(1000, 1000), (2000, 2000)])
        // 45N..44N row, either side of the antimeridian
        .segment(16379, 1, &[(65535, 0), (60000, 100)])
        .segment(16380, 1, &[(0, 0), (500, 500)])
}

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn write_database(dir: &tempfile::TempDir, name: &str) {
    layout().write_archive(dir.path().join(name)).unwrap();
}

fn oregon() -> EarthArea {
    EarthArea::from_rect(&Rect::new(
        geo::coord! { x: -125.0, y: 45.0 },
        geo::coord! { x: -122.0, y: 46.0 },
    ))
}

#[test]
fn test_local_select_over_archive() {
    init_logging();
    let dir = tempfile::tempdir().unwrap();
    write_database(&dir, "binned_GSHHS_l.hdf");

    let mut reader = ReaderBuilder::new()
        .data_dir(dir.path())
        .open_local("binned_GSHHS_l.hdf")
        .unwrap();
    assert_eq!(reader.bin_count(), 360 * 180);

    reader.select(&oregon()).unwrap();
    let features: Vec<&LineFeature> = reader.iter().collect();
    assert_eq!(features.len(), 4);
    assert_eq!(
        features.iter().map(|f| f.level).collect::<Vec<_>>(),
        vec![1, 2, 1, 3]
    );

    // The repeated (20000, 30000) point collapses.
    assert_eq!(features[0].len(), 3);
    let corner = reader.globals().grid.corner_of(16075);
    assert_eq!(corner, EarthLocation::new(45.0, 235.0));
    assert_eq!(features[0].points[0], corner);
}

#[test]
fn test_local_and_remote_agree() {
    let dir = tempfile::tempdir().unwrap();
    write_database(&dir, "db");

    let mut local = ReaderBuilder::new()
        .data_dir(dir.path())
        .open_local("db")
        .unwrap();
    let mut remote = ReaderBuilder::new()
        .server("http://server.com/data")
        .fetch_threads(3)
        .open_remote(layout().to_memory(), "db")
        .unwrap();

    let mut area = oregon();
    area.add_square(44, 179);
    area.add_square(44, -180);

    local.select(&area).unwrap();
    remote.select(&area).unwrap();

    let local: Vec<LineFeature> = local.iter().cloned().collect();
    let remote: Vec<LineFeature> = remote.iter().cloned().collect();
    assert_eq!(local.len(), 6);
    assert_eq!(local, remote);
}

#[test]
fn test_batched_reads_match_single_reads() {
    let arrays = layout().to_memory();
    let local = LocalBackend::open(layout().to_memory(), "db").unwrap();
    let remote = RemoteBackend::open(arrays, "mem://data", "db", 2).unwrap();

    let bins = [16075, 16076, 16077];
    remote.transport().reset_stats();
    remote.prefetch(&bins).unwrap();
    assert_eq!(remote.transport().stats().fetches, 1);

    for bin in bins {
        assert_eq!(remote.read_bin(bin).unwrap(), local.read_bin(bin).unwrap());
    }
}

#[test]
fn test_antimeridian_bins_wrap() {
    let mut reader = Reader::open_remote(layout().to_memory(), "mem://data", "db", Config::default()).unwrap();

    let mut area = EarthArea::new();
    area.add(EarthLocation::new(44.5, 179.5));
    area.add(EarthLocation::new(44.5, -179.5));

    let bins = reader.candidate_bins(&area);
    assert_eq!(bins, vec![16379, 16380]);
    let lon_bins = reader.globals().grid.lon_bins;
    assert_eq!((bins[0] % lon_bins, bins[1] % lon_bins), (179, 180));

    reader.select(&area).unwrap();
    assert_eq!(reader.feature_count(), 2);
    let features: Vec<&LineFeature> = reader.iter().collect();
    assert!(features[0].points.iter().all(|p| (179.0..=180.0).contains(&p.lon)));
    assert!(features[1].points.iter().all(|p| (180.0..=181.0).contains(&p.lon)));
}

#[test]
fn test_scenario_bin_index() {
    let reader = Reader::open_remote(layout().to_memory(), "mem://data", "db", Config::default()).unwrap();
    let grid = reader.globals().grid;
    assert_eq!(grid.bin_index_of(46.0, -125.0), 16075);
    assert_eq!(grid.bin_index_of_location(grid.center_of(16075)), 16075);
}

#[test]
fn test_region_outside_data_is_empty() {
    let mut reader = Reader::open_remote(layout().to_memory(), "mem://data", "db", Config::default()).unwrap();
    let area = EarthArea::from_rect(&Rect::new(
        geo::coord! { x: 10.0, y: -60.0 },
        geo::coord! { x: 20.0, y: -50.0 },
    ));
    reader.select(&area).unwrap();
    assert_eq!(reader.feature_count(), 0);
    assert!(reader.diagnostics().is_empty());
}

#[test]
fn test_level_filter_is_idempotent() {
    let mut reader = Reader::open_remote(layout().to_memory(), "mem://data", "db", Config::default()).unwrap();
    reader.select(&oregon()).unwrap();

    reader.set_level_range(1, 1);
    let first: Vec<LineFeature> = reader.iter().cloned().collect();
    let second: Vec<LineFeature> = reader.iter().cloned().collect();
    assert_eq!(first, second);
    assert_eq!(first.len(), 2);

    reader.set_level_range(2, 3);
    assert_eq!(reader.iter().count(), 2);
    assert_eq!(reader.feature_count(), 4);
}

#[test]
fn test_missing_database_is_open_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = ReaderBuilder::new()
        .data_dir(dir.path())
        .open_local("binned_GSHHS_f.hdf")
        .unwrap_err();
    assert!(matches!(err, GshhsError::Open { .. }));
}

#[test]
fn test_archive_file_direct_decode() {
    let dir = tempfile::tempdir().unwrap();
    write_database(&dir, "db");
    let backend = LocalBackend::open(ArchiveFile::open(dir.path().join("db")).unwrap(), "db").unwrap();

    let globals = backend.globals();
    let data = backend.read_bin(16076).unwrap();
    let corner = globals.grid.corner_of(16076);
    let last = decode(corner, data.dx[1], data.dy[1], globals.multiplier);
    assert!((last.lat - 45.0).abs() < 1e-12);
    assert!((last.lon - 237.0).abs() < 1e-9);
}

#[test]
fn test_registry_shares_reader_across_threads() {
    let registry = Arc::new(ReaderRegistry::new());
    let open = || Reader::open_remote(layout().to_memory(), "mem://data", "db", Config::default());

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let registry = Arc::clone(&registry);
            thread::spawn(move || {
                let reader = registry.get_or_open("mem://data", "db", open).unwrap();
                let mut reader = reader.write();
                reader.select(&oregon()).unwrap();
                reader.feature_count()
            })
        })
        .collect();

    for handle in handles {
        assert_eq!(handle.join().unwrap(), 4);
    }
    assert_eq!(registry.len(), 1);
}

#[test]
fn test_geojson_export() {
    let mut reader = Reader::open_remote(layout().to_memory(), "mem://data", "db", Config::default()).unwrap();
    reader.select(&oregon()).unwrap();
    reader.set_level_range(3, 3);

    let json = serde_json::to_value(reader.to_feature_collection()).unwrap();
    assert_eq!(json["type"], "FeatureCollection");
    assert_eq!(json["features"].as_array().unwrap().len(), 1);
    assert_eq!(json["features"][0]["properties"]["level"], 3);
}

/// Two adjacent one-segment bins with the first point count replaced.
fn inflated_counts(count: i16) -> Vec<(&'static str, ArrayData)> {
    LayoutBuilder::global(60)
        .segment(16075, 1, &[(0, 0), (100, 100)])
        .segment(16076, 1, &[(0, 0), (200, 200)])
        .arrays()
        .into_iter()
        .map(|(name, data)| match name {
            vars::SEGMENT_POINTS => (name, ArrayData::Short(vec![count, 2])),
            _ => (name, data),
        })
        .collect()
}

#[test]
fn test_inflated_point_count_is_skipped_by_both_backends() {
    for count in [4, 50] {
        let dir = tempfile::tempdir().unwrap();
        inflated_counts(count)
            .into_iter()
            .fold(ArchiveWriter::new(), |writer, (name, data)| writer.array(name, data))
            .save(dir.path().join("db"))
            .unwrap();
        let arrays = inflated_counts(count)
            .into_iter()
            .fold(MemoryArrays::new(), |arrays, (name, data)| arrays.with(name, data));

        let mut local = ReaderBuilder::new().data_dir(dir.path()).open_local("db").unwrap();
        let mut remote = ReaderBuilder::new()
            .server("mem://data")
            .open_remote(arrays, "db")
            .unwrap();

        let expected = vec![Diagnostic {
            bin: 16075,
            error: DecodeError::PointCount {
                segment: 0,
                count: count as usize,
                indexed: 2,
            },
        }];
        for reader in [&mut local, &mut remote] {
            reader.select(&oregon()).unwrap();
            assert_eq!(reader.diagnostics(), expected.as_slice());
            assert_eq!(reader.feature_count(), 1);
            assert_eq!(reader.iter().next().unwrap().len(), 2);
        }
    }
}
