//! Cross-thread admission and scoring behavior through the Park facade

use park_admission::domain::types::{AttractionId, CapacityStatus, VisitorId};
use park_admission::infra::{AttractionConfig, Config, Metrics, VisitorConfig};
use park_admission::io::StaticDirectory;
use park_admission::services::Park;
use std::sync::{Arc, Barrier};
use std::thread;

const COASTER: AttractionId = AttractionId(1);
const WHEEL: AttractionId = AttractionId(2);

fn create_park(visitors: u64, coaster_capacity: u32) -> Arc<Park> {
    let config = Config::default()
        .with_attractions(vec![
            AttractionConfig {
                id: COASTER,
                name: "Coaster".to_string(),
                max_capacity: coaster_capacity,
            },
            AttractionConfig { id: WHEEL, name: "Wheel".to_string(), max_capacity: 100 },
        ])
        .with_visitors(
            (1..=visitors)
                .map(|i| VisitorConfig {
                    id: VisitorId(i),
                    name: format!("V{i}"),
                    surname: "Test".to_string(),
                    email: format!("v{i}@park.test"),
                })
                .collect(),
        );
    let directory = Arc::new(StaticDirectory::from_configs(config.visitors()));
    Arc::new(Park::new(&config, directory, Arc::new(Metrics::new())).unwrap())
}

#[test]
fn test_concurrent_check_ins_never_exceed_capacity() {
    let park = create_park(64, 10);
    let barrier = Arc::new(Barrier::new(64));

    let handles: Vec<_> = (1..=64u64)
        .map(|i| {
            let park = park.clone();
            let barrier = barrier.clone();
            thread::spawn(move || {
                barrier.wait();
                park.check_in(COASTER, VisitorId(i)).unwrap()
            })
        })
        .collect();

    let outcomes: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    let admitted = outcomes.iter().filter(|o| o.admitted).count();

    assert_eq!(admitted, 10);
    assert!(outcomes
        .iter()
        .filter(|o| !o.admitted)
        .all(|o| o.status == CapacityStatus::Full));

    let status = park.get_status(COASTER).unwrap();
    assert_eq!(status.occupancy, 10);
    assert_eq!(status.status, CapacityStatus::Full);
}

#[test]
fn test_mixed_check_in_out_stays_in_bounds() {
    let park = create_park(32, 5);
    let barrier = Arc::new(Barrier::new(32));

    let handles: Vec<_> = (1..=32u64)
        .map(|i| {
            let park = park.clone();
            let barrier = barrier.clone();
            thread::spawn(move || {
                barrier.wait();
                let mut admitted = 0u32;
                for _ in 0..200 {
                    if park.check_in(COASTER, VisitorId(i)).unwrap().admitted {
                        admitted += 1;
                        let occupancy = park.get_status(COASTER).unwrap().occupancy;
                        assert!(occupancy >= 1 && occupancy <= 5, "occupancy {occupancy}");
                        park.check_out(COASTER, VisitorId(i)).unwrap();
                    }
                }
                admitted
            })
        })
        .collect();

    let total: u32 = handles.into_iter().map(|h| h.join().unwrap()).sum();
    assert!(total > 0);
    assert_eq!(park.get_status(COASTER).unwrap().occupancy, 0);
}

#[test]
fn test_incident_blocks_admissions_until_resolved() {
    let park = create_park(4, 10);

    park.check_in(COASTER, VisitorId(1)).unwrap();
    park.declare_incident(COASTER).unwrap();

    let outcome = park.check_in(COASTER, VisitorId(2)).unwrap();
    assert!(!outcome.admitted);
    assert_eq!(outcome.status, CapacityStatus::ClosedIncident);
    assert_eq!(park.get_status(COASTER).unwrap().occupancy, 1);

    // Other attractions keep admitting
    assert!(park.check_in(WHEEL, VisitorId(2)).unwrap().admitted);

    // Check-out still works during an incident
    let out = park.check_out(COASTER, VisitorId(1)).unwrap();
    assert_eq!(out.status, CapacityStatus::ClosedIncident);

    park.resolve_incident(COASTER).unwrap();
    let outcome = park.check_in(COASTER, VisitorId(2)).unwrap();
    assert!(outcome.admitted);
    assert_eq!(outcome.status, CapacityStatus::Available);
}

#[test]
fn test_concurrent_points_sum_exactly() {
    let park = create_park(8, 10);
    let barrier = Arc::new(Barrier::new(8));

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let park = park.clone();
            let barrier = barrier.clone();
            thread::spawn(move || {
                barrier.wait();
                for i in 1..=8u64 {
                    for _ in 0..100 {
                        park.add_points(VisitorId(i), i as i64).unwrap();
                    }
                }
            })
        })
        .collect();
    for h in handles {
        h.join().unwrap();
    }

    let ranking = park.get_ranking(None);
    assert_eq!(ranking.len(), 8);
    for (n, entry) in ranking.iter().enumerate() {
        let expected_visitor = 8 - n as u64;
        assert_eq!(entry.position, n + 1);
        assert_eq!(entry.visitor_id, VisitorId(expected_visitor));
        assert_eq!(entry.points, 8 * 100 * expected_visitor);
        assert!(entry.visitor.is_some());
    }
}

#[test]
fn test_ranking_ties_ordered_by_visitor_id() {
    let park = create_park(4, 10);
    park.add_points(VisitorId(3), 50).unwrap();
    park.add_points(VisitorId(1), 50).unwrap();
    park.add_points(VisitorId(2), 80).unwrap();

    let ranking = park.get_ranking(Some(10));
    let rows: Vec<(usize, u64, u64)> =
        ranking.iter().map(|e| (e.position, e.visitor_id.0, e.points)).collect();
    assert_eq!(rows, vec![(1, 2, 80), (2, 1, 50), (3, 3, 50)]);
}

#[test]
fn test_ranking_during_concurrent_writes_is_consistent() {
    let park = create_park(4, 10);
    let writer = {
        let park = park.clone();
        thread::spawn(move || {
            for _ in 0..1000 {
                park.add_points(VisitorId(1), 2).unwrap();
            }
        })
    };

    for _ in 0..200 {
        for entry in park.get_ranking(None) {
            // Every observed total is a whole number of increments
            assert_eq!(entry.points % 2, 0);
        }
    }
    writer.join().unwrap();
    assert_eq!(park.get_ranking(None)[0].points, 2000);
}

#[test]
fn test_slot_released_after_visitor_dropped_by_reload() {
    let config = Config::default()
        .with_attractions(vec![AttractionConfig {
            id: COASTER,
            name: "Coaster".to_string(),
            max_capacity: 1,
        }])
        .with_visitors(vec![VisitorConfig {
            id: VisitorId(1),
            name: "V1".to_string(),
            surname: "Test".to_string(),
            email: "v1@park.test".to_string(),
        }]);
    let directory = Arc::new(StaticDirectory::from_configs(config.visitors()));
    let park = Park::new(&config, directory.clone(), Arc::new(Metrics::new())).unwrap();

    assert!(park.check_in(COASTER, VisitorId(1)).unwrap().admitted);

    // Reload drops visitor 1 and adds visitor 2
    directory.replace(&[VisitorConfig {
        id: VisitorId(2),
        name: "V2".to_string(),
        surname: "Test".to_string(),
        email: "v2@park.test".to_string(),
    }]);

    park.check_out(COASTER, VisitorId(1)).unwrap();
    assert_eq!(park.get_status(COASTER).unwrap().occupancy, 0);

    let outcome = park.check_in(COASTER, VisitorId(2)).unwrap();
    assert!(outcome.admitted);
    assert_eq!(outcome.status, CapacityStatus::Full);
}

#[test]
fn test_open_incidents_follow_declare_and_resolve() {
    let park = create_park(2, 10);
    park.declare_incident(WHEEL).unwrap();
    park.declare_incident(COASTER).unwrap();
    assert_eq!(park.open_incidents(), vec![COASTER, WHEEL]);

    park.resolve_incident(COASTER).unwrap();
    assert_eq!(park.open_incidents(), vec![WHEEL]);
}
