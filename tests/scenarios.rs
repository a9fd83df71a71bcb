mod common;

use std::sync::Arc;
use std::time::{Duration, Instant};

use common::synthetic_raster::{raster_from_fn, t_junction, two_bands, voronoi_with_hole};
use region_borders::adjacency::{scan_parallel, scan_sequential};
use region_borders::build_curve_cache;
use region_borders::border::{bridge_gaps, extract_border_pixels, trace_chains};
use region_borders::kurbo::Point;
use region_borders::{
    BorderConfig, BorderKind, BorderSystem, Connectivity, GroupId, JunctionSet, NoOwners,
    OwnerTable, RegionId, RegionPair, RegionPixelIndex, RegionRaster, TileKernel,
};

fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn system_for(raster: RegionRaster, owners: &dyn region_borders::OwnerLookup) -> BorderSystem {
    let index = RegionPixelIndex::build(&raster);
    BorderSystem::initialize(
        BorderConfig::default(),
        raster,
        index,
        owners,
        Some(Arc::new(TileKernel)),
    )
    .expect("system builds")
}

fn pair(a: u16, b: u16) -> RegionPair {
    RegionPair::new(RegionId(a), RegionId(b)).unwrap()
}

#[test]
fn two_columns_share_one_border() {
    init_logger();
    let raster = two_bands(4, 4, 2, 1, 2);
    let graph = scan_sequential(&raster, Connectivity::Eight);
    assert_eq!(graph.neighbors(RegionId(1)).collect::<Vec<_>>(), vec![RegionId(2)]);
    assert_eq!(graph.neighbors(RegionId(2)).collect::<Vec<_>>(), vec![RegionId(1)]);

    let index = RegionPixelIndex::build(&raster);
    let junctions = JunctionSet::detect(&raster);
    let border = extract_border_pixels(&raster, &index, pair(1, 2), &junctions);
    assert_eq!(border.len(), 4);
    assert!(border.pixels.iter().all(|p| p.x == 1));

    let chains = trace_chains(&border);
    assert_eq!(chains.len(), 1);
    assert_eq!(chains[0].len(), 4);

    let system = system_for(raster, &NoOwners);
    let segments = system.curves().get(pair(1, 2));
    assert!(!segments.is_empty());
    assert!(segments.iter().all(|s| s.pair == pair(1, 2)));
}

#[test]
fn three_regions_meet_at_one_point() {
    init_logger();
    let raster = t_junction(40);
    let junctions = JunctionSet::detect(&raster);
    let clusters = junctions.clusters();
    assert_eq!(clusters.len(), 1);
    assert_eq!(clusters[0].regions, vec![RegionId(1), RegionId(2), RegionId(3)]);
    let meeting = clusters[0].centroid;

    let system = system_for(raster, &NoOwners);
    let cache = system.curves();
    assert_eq!(cache.len(), 3);

    // Chain ends near the meeting point, one per border.
    let mut near = Vec::new();
    for p in [pair(1, 2), pair(1, 3), pair(2, 3)] {
        let segs = cache.get(p);
        assert!(!segs.is_empty(), "border {p} missing");
        let ends = [segs[0].curve.p0, segs[segs.len() - 1].curve.p3];
        let close: Vec<Point> = ends.into_iter().filter(|e| e.distance(meeting) < 3.0).collect();
        assert_eq!(close.len(), 1, "border {p} ends {ends:?}");
        near.push(close[0]);
    }
    assert_eq!(near[0], near[1]);
    assert_eq!(near[1], near[2]);
}

#[test]
fn single_region_has_nothing() {
    init_logger();
    let raster = raster_from_fn(12, 9, |_, _| 5);
    let system = system_for(raster, &NoOwners);
    assert!(system.adjacency().is_empty());
    assert!(system.curves().is_empty());
    assert_eq!(system.distance_field().dimensions(), (12, 9));
    assert!(system.distance_field().is_no_borders());
}

#[test]
fn adjacency_is_symmetric_and_background_free() {
    let raster = voronoi_with_hole(96, 64, 24, 7);
    let graph = scan_sequential(&raster, Connectivity::Eight);
    assert!(!graph.is_empty());
    assert!(graph.is_consistent());
    for region in graph.regions() {
        assert!(!region.is_background());
        for other in graph.neighbors(region) {
            assert_ne!(region, other);
            assert!(graph.are_adjacent(other, region));
        }
    }
}

#[test]
fn parallel_scan_matches_sequential() {
    let raster = voronoi_with_hole(128, 80, 40, 11);
    for connectivity in [Connectivity::Four, Connectivity::Eight] {
        let sequential = scan_sequential(&raster, connectivity);
        let parallel = scan_parallel(&raster, connectivity, 4096);
        assert_eq!(parallel.dropped, 0);
        assert_eq!(parallel.graph, sequential);
    }
}

#[test]
fn every_chain_is_valid() {
    let raster = voronoi_with_hole(96, 64, 24, 3);
    let index = RegionPixelIndex::build(&raster);
    let graph = scan_sequential(&raster, Connectivity::Eight);
    let junctions = JunctionSet::detect(&raster);
    for p in graph.pairs() {
        let mut border = extract_border_pixels(&raster, &index, p, &junctions);
        bridge_gaps(&raster, &junctions, &mut border, 10);
        for chain in trace_chains(&border) {
            assert!(chain.is_valid(), "border {p}: {:?}", chain.pixels);
            assert!(chain.pixels.iter().all(|px| border.pixels.contains(px)));
        }
    }
}

#[test]
fn cached_segments_match_their_pair() {
    let raster = voronoi_with_hole(96, 64, 24, 5);
    let system = system_for(raster, &NoOwners);
    let cache = system.curves();
    assert!(cache.is_consistent());
    for p in cache.pairs() {
        assert!(system.adjacency().are_adjacent(p.a(), p.b()));
    }
}

#[test]
fn snapping_twice_changes_nothing() {
    let raster = voronoi_with_hole(96, 64, 24, 9);
    let system = system_for(raster, &NoOwners);
    let mut cache = system.curves().clone();
    let config = system.config();
    let report = region_borders::snap_endpoints(
        &mut cache,
        system.junctions(),
        config.snap_distance,
        config.snap_interior_joints,
    );
    assert_eq!(report.moved, 0);
    assert_eq!(&cache, system.curves());
}

#[test]
fn snapping_leaves_frame_ends_alone() {
    init_logger();
    for size in [16, 20] {
        let raster = t_junction(size);
        let index = RegionPixelIndex::build(&raster);
        let graph = scan_sequential(&raster, Connectivity::Eight);
        let junctions = JunctionSet::detect(&raster);
        let config = BorderConfig::default();
        let unsnapped = BorderConfig {
            snap_distance: 0.0,
            ..config.clone()
        };
        let (raw, _) =
            build_curve_cache(&raster, &index, &graph, &junctions, &NoOwners, &unsnapped).unwrap();
        let (snapped, _) =
            build_curve_cache(&raster, &index, &graph, &junctions, &NoOwners, &config).unwrap();

        let edge = f64::from(size) - 0.5;
        let on_frame = |p: Point| p.x <= 0.5 || p.y <= 0.5 || p.x >= edge || p.y >= edge;
        assert_eq!(raw.segment_count(), snapped.segment_count());
        for (before, after) in raw.segments().zip(snapped.segments()) {
            for (b, a) in [(before.curve.p0, after.curve.p0), (before.curve.p3, after.curve.p3)] {
                assert!(
                    b.distance(a) <= config.snap_distance,
                    "size {size}: {b:?} moved to {a:?}"
                );
                if on_frame(b) {
                    assert_eq!(a, b, "size {size}: frame end moved");
                }
            }
        }
    }
}

#[test]
fn generated_maps_build_and_stay_valid() {
    init_logger();
    let maps = [
        (64, 48, 12, 1),
        (80, 60, 30, 2),
        (96, 64, 24, 5),
        (120, 90, 40, 13),
        (50, 50, 8, 17),
        (72, 40, 20, 29),
    ];
    for (width, height, sites, seed) in maps {
        let started = Instant::now();
        let system = system_for(voronoi_with_hole(width, height, sites, seed), &NoOwners);
        let elapsed = started.elapsed();
        assert!(
            elapsed < Duration::from_secs(60),
            "map {width}x{height}/{sites}/{seed} took {elapsed:?}"
        );

        let raster = system.raster();
        let index = RegionPixelIndex::build(raster);
        for p in system.adjacency().pairs() {
            let mut border = extract_border_pixels(raster, &index, p, system.junctions());
            bridge_gaps(raster, system.junctions(), &mut border, 10);
            assert!(trace_chains(&border).iter().all(|c| c.is_valid()), "seed {seed} border {p}");
        }

        let cache = system.curves();
        assert!(cache.is_consistent());
        for (p, segs) in cache.iter() {
            for w in segs.windows(2).filter(|w| w[0].chain == w[1].chain) {
                assert!(w[0].curve.p3.distance(w[1].curve.p0) < 1e-9, "seed {seed} border {p}");
            }
        }

        let mut again = cache.clone();
        let config = system.config();
        let report = region_borders::snap_endpoints(
            &mut again,
            system.junctions(),
            config.snap_distance,
            config.snap_interior_joints,
        );
        assert_eq!(report.moved, 0, "seed {seed}");
        assert_eq!(&again, cache);
    }
}

#[test]
fn owners_change_classes_not_shapes() {
    let raster = voronoi_with_hole(96, 64, 12, 21);
    let mut system = system_for(raster, &NoOwners);
    let before = system.curves().clone();

    let mut owners = OwnerTable::new();
    for id in 1..=12u16 {
        owners.assign(RegionId(id), GroupId(u32::from(id % 2)));
    }
    system.regenerate(&owners).unwrap();
    let after = system.curves();

    assert_eq!(before.len(), after.len());
    for ((p, old), (q, new)) in before.iter().zip(after.iter()) {
        assert_eq!(p, q);
        assert_eq!(old.len(), new.len());
        let expected = if (p.a().0 % 2) == (p.b().0 % 2) {
            BorderKind::SameGroup
        } else {
            BorderKind::DifferentGroup
        };
        for (o, n) in old.iter().zip(new.iter()) {
            assert_eq!(o.curve, n.curve);
            assert_eq!(n.kind, expected);
        }
    }
}

#[test]
fn distance_rises_away_from_the_border() {
    let raster = two_bands(48, 6, 24, 1, 2);
    let mut owners = OwnerTable::new();
    owners.assign(RegionId(1), GroupId(1));
    owners.assign(RegionId(2), GroupId(2));
    let system = system_for(raster, &owners);
    let field = system.distance_field();

    let right: Vec<f32> = (24..48).map(|x| field.get(x, 2).unwrap()[1]).collect();
    assert_eq!(right[0], 0.0);
    assert!(right.windows(2).all(|w| w[0] <= w[1]));
    let left: Vec<f32> = (0..24).rev().map(|x| field.get(x, 2).unwrap()[1]).collect();
    assert_eq!(left[0], 0.0);
    assert!(left.windows(2).all(|w| w[0] <= w[1]));
    assert!((0..48).all(|x| field.get(x, 2).unwrap()[0] == 1.0));
}
