// Integration tests for the station orchestrator and the actor worker loop

use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use turnstile::logging;
use turnstile::{
    ActorExit, ActorFault, ActorId, ResourceId, ScaledClock, ServiceEvent, Station,
    StationConfig, StationError, StationReport, StationState, WaitStrategy,
};

fn small_config(actors: usize, resources: usize) -> StationConfig {
    StationConfig {
        actor_count: actors,
        resource_count: resources,
        run_duration: Duration::from_millis(200),
        service_duration: Duration::from_millis(5),
        ..Default::default()
    }
}

/// Runs a station through every phase and hands back the report and journal.
fn run_station(station: &mut Station) -> (StationReport, Vec<ServiceEvent>) {
    let run_duration = station.config().run_duration;
    station.start().unwrap();
    station.run_for(run_duration).unwrap();
    station.stop_and_join().unwrap();
    let report = station.report().unwrap();
    let journal = station.journal().unwrap().to_vec();
    (report, journal)
}

fn acquired_actors(journal: &[ServiceEvent]) -> Vec<ActorId> {
    journal
        .iter()
        .filter(|event| matches!(event, ServiceEvent::Acquired { .. }))
        .map(ServiceEvent::actor)
        .collect()
}

/// Actors in the order they joined the line, by ticket.
fn join_order(journal: &[ServiceEvent]) -> Vec<ActorId> {
    let mut joins: Vec<(u64, ActorId)> = journal
        .iter()
        .filter_map(|event| match event {
            ServiceEvent::Joined { actor, ticket, .. } => Some((*ticket, *actor)),
            _ => None,
        })
        .collect();
    joins.sort();
    joins.into_iter().map(|(_, actor)| actor).collect()
}

#[test]
fn test_counts_are_conserved() {
    logging::init_test();

    let mut station = Station::configure(small_config(5, 2)).unwrap();
    let (report, _) = run_station(&mut station);

    assert!(report.resource_total() > 0);
    assert!(report.is_conserved());
    assert_eq!(report.actors.len(), 5);
    assert_eq!(report.resources.len(), 2);
    assert_eq!(report.outcomes.len(), 5);
    assert!(report.outcomes.iter().all(|outcome| outcome.exit == ActorExit::Stopped));

    station.teardown().unwrap();
}

#[test]
fn test_resource_use_never_overlaps() {
    logging::init_test();

    let mut station = Station::configure(small_config(6, 2).with_journal()).unwrap();
    let (report, journal) = run_station(&mut station);

    let mut holder: BTreeMap<ResourceId, ActorId> = BTreeMap::new();
    for event in &journal {
        match event {
            ServiceEvent::Acquired {
                actor, resource, ..
            } => {
                assert!(
                    holder.insert(*resource, *actor).is_none(),
                    "resource {} acquired while held",
                    resource
                );
            }
            ServiceEvent::Released {
                actor, resource, ..
            } => {
                assert_eq!(holder.remove(resource), Some(*actor));
            }
            _ => {}
        }
    }
    assert!(holder.is_empty(), "resources still held after join: {:?}", holder);

    let served = journal
        .iter()
        .filter(|event| matches!(event, ServiceEvent::Released { .. }))
        .count() as u64;
    assert_eq!(served, report.resource_total());

    station.teardown().unwrap();
}

#[test]
fn test_service_order_follows_join_order() {
    logging::init_test();

    let mut station = Station::configure(small_config(8, 3).with_journal()).unwrap();
    let (_, journal) = run_station(&mut station);

    let acquired = acquired_actors(&journal);
    let joined = join_order(&journal);
    assert!(!acquired.is_empty());
    assert!(acquired.len() <= joined.len());
    assert_eq!(acquired, joined[..acquired.len()].to_vec());

    station.teardown().unwrap();
}

#[test]
fn test_single_resource_rotates_round_robin() {
    logging::init_test();

    let mut station = Station::configure(small_config(3, 1).with_journal()).unwrap();
    let (report, journal) = run_station(&mut station);

    let acquired = acquired_actors(&journal);
    assert!(acquired.len() >= 15, "only {} services", acquired.len());

    let cycle: HashSet<_> = acquired[..3].iter().collect();
    assert_eq!(cycle.len(), 3);
    for (index, actor) in acquired.iter().enumerate() {
        assert_eq!(*actor, acquired[index % 3], "rotation broken at service {}", index);
    }

    let counts: Vec<u64> = report.actors.iter().map(|line| line.count).collect();
    let spread = counts.iter().max().unwrap() - counts.iter().min().unwrap();
    assert!(spread <= 1, "uneven counts {:?}", counts);

    station.teardown().unwrap();
}

#[test]
fn test_default_layout_on_scaled_clock() {
    logging::init_test();

    let config = StationConfig {
        run_duration: Duration::from_millis(1000),
        ..Default::default()
    };
    let mut station = Station::with_clock(config, Arc::new(ScaledClock::new(2))).unwrap();
    let (report, _) = run_station(&mut station);

    // Two resources, 30ms holds: about 33 services each per second.
    let total = report.resource_total();
    assert!((40..=75).contains(&total), "unexpected total {}", total);
    assert_eq!(report.actor_total(), total);
    assert_eq!(report.actors.len(), 10);

    let rendered = report.to_string();
    assert!(rendered.starts_with("Car 1 filled up "));
    assert!(rendered.contains("Pump 2 filled up "));

    station.teardown().unwrap();
}

#[test]
fn test_polling_strategy_serves_in_order() {
    logging::init_test();

    let config = StationConfig {
        wait_strategy: WaitStrategy::polling(),
        ..small_config(4, 2).with_journal()
    };
    let mut station = Station::configure(config).unwrap();
    let (report, journal) = run_station(&mut station);

    assert!(report.resource_total() > 0);
    assert!(report.is_conserved());

    let acquired = acquired_actors(&journal);
    let joined = join_order(&journal);
    assert_eq!(acquired, joined[..acquired.len()].to_vec());

    station.teardown().unwrap();
}

#[test]
fn test_journal_records_every_exit() {
    logging::init_test();

    let mut station = Station::configure(small_config(4, 2).with_journal()).unwrap();
    let (_, journal) = run_station(&mut station);

    let exited: HashSet<ActorId> = journal
        .iter()
        .filter(|event| matches!(event, ServiceEvent::Exited { .. }))
        .map(ServiceEvent::actor)
        .collect();
    assert_eq!(exited, station.actor_ids().collect());

    station.teardown().unwrap();
}

#[test]
fn test_journal_empty_unless_recording() {
    logging::init_test();

    let mut station = Station::configure(small_config(2, 1)).unwrap();
    let (_, journal) = run_station(&mut station);
    assert!(journal.is_empty());
    station.teardown().unwrap();
}

#[test]
fn test_pool_whole_after_join() {
    logging::init_test();

    let mut station = Station::configure(small_config(6, 3)).unwrap();
    assert_eq!(station.context().pool().idle_count(), 3);

    station.start().unwrap();
    let started = Instant::now();
    while started.elapsed() < Duration::from_millis(100) {
        let (idle, leased) = station.context().pool().occupancy();
        assert_eq!(idle + leased, 3, "idle {} + leased {}", idle, leased);
        assert!(leased <= 3);
        thread::yield_now();
    }
    station.stop_and_join().unwrap();

    let pool = station.context().pool();
    assert_eq!(pool.idle_count(), pool.capacity());
    assert_eq!(pool.leased_count(), 0);

    station.report().unwrap();
    station.teardown().unwrap();
}

#[test]
fn test_stop_and_report_are_idempotent() {
    logging::init_test();

    let mut station = Station::configure(small_config(3, 2)).unwrap();
    let (first, _) = run_station(&mut station);

    station.stop_and_join().unwrap();
    let second = station.report().unwrap();

    assert_eq!(station.state(), StationState::Reported);
    assert_eq!(first.actors, second.actors);
    assert_eq!(first.resources, second.resources);
    assert_eq!(first.run_id, station.run_id());

    station.teardown().unwrap();
}

#[test]
fn test_phase_errors() {
    logging::init_test();

    let mut station = Station::configure(small_config(2, 1)).unwrap();
    assert_eq!(station.state(), StationState::Configured);

    assert!(matches!(
        station.report(),
        Err(StationError::InvalidState {
            operation: "report",
            state: "configured"
        })
    ));
    assert!(matches!(
        station.run_for(Duration::from_millis(1)),
        Err(StationError::InvalidState { .. })
    ));

    station.start().unwrap();
    assert_eq!(station.state(), StationState::Running);
    assert!(matches!(
        station.start(),
        Err(StationError::InvalidState {
            operation: "start",
            state: "running"
        })
    ));
    assert!(station.journal().is_err());

    station.stop_and_join().unwrap();
    assert_eq!(station.state(), StationState::Stopped);
    assert!(station.run_for(Duration::from_millis(1)).is_err());

    let err = station.teardown().unwrap_err();
    assert!(matches!(
        err,
        StationError::InvalidState {
            operation: "tear down",
            state: "stopped"
        }
    ));
}

#[test]
fn test_invalid_config_rejected() {
    let config = StationConfig {
        resource_count: 0,
        ..Default::default()
    };
    assert!(matches!(
        Station::configure(config),
        Err(StationError::InvalidConfig(_))
    ));
}

#[test]
fn test_invalid_handle_faults_one_actor() {
    logging::init_test();

    let mut station = Station::configure(small_config(3, 2).with_journal()).unwrap();
    let bogus = ResourceId::new(99);
    station.context().pool().inject_handle(bogus).unwrap();

    let (report, journal) = run_station(&mut station);

    let faulted: Vec<_> = report.faulted().collect();
    assert_eq!(faulted.len(), 1);
    assert_eq!(
        faulted[0].exit,
        ActorExit::Faulted(ActorFault::InvalidHandle(bogus))
    );
    assert!(report.is_conserved());
    assert!(journal.iter().all(|event| event.resource() != Some(bogus)));

    // The bogus handle was consumed; every real resource came back.
    station.teardown().unwrap();
}

#[test]
fn test_stop_handle_ends_run_early() {
    logging::init_test();

    let mut station = Station::configure(small_config(4, 2)).unwrap();
    station.start().unwrap();

    let stop = station.stop_handle();
    let started = Instant::now();
    thread::scope(|scope| {
        scope.spawn(|| {
            thread::sleep(Duration::from_millis(50));
            assert!(stop.raise());
        });
        station.run_for(Duration::from_secs(60)).unwrap();
    });
    assert!(started.elapsed() < Duration::from_secs(10));
    assert!(!stop.raise());

    station.stop_and_join().unwrap();
    let report = station.report().unwrap();
    assert!(report.is_conserved());
    station.teardown().unwrap();
}

#[test]
fn test_stop_handle_outlives_station() {
    let station = Station::configure(small_config(1, 1)).unwrap();
    let stop = station.stop_handle();
    drop(station);
    assert!(!stop.raise());
}

#[test]
fn test_dropping_running_station_stops_actors() {
    logging::init_test();

    let mut station = Station::configure(small_config(4, 2)).unwrap();
    station.start().unwrap();
    let stop = station.stop_handle();
    thread::sleep(Duration::from_millis(20));

    drop(station);
    // Every actor thread was joined, so nothing keeps the shared state alive.
    assert!(!stop.raise());
}

#[test]
fn test_run_to_completion() {
    logging::init_test();

    let report = Station::run_to_completion(small_config(4, 2)).unwrap();
    assert!(report.is_conserved());
    assert_eq!(report.faulted().count(), 0);
    assert!(report.elapsed >= Duration::from_millis(200));
}
