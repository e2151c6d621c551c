#![cfg(test)]

use std::time::Duration;

use rand::seq::SliceRandom;
use rand::Rng;

use crate::component::ComponentState;
use crate::config::ConfigData;
use crate::kernel::error::Error;
use crate::registry::RegistryError;
use crate::tests::integration::common::{test_registry, EventLog, MockComponent, RunBehavior};

#[tokio::test]
async fn test_db_cache_api_start_in_dependency_order() {
    let log = EventLog::new();
    let registry = test_registry();
    // Registration order is deliberately reversed
    registry
        .register(MockComponent::new("api", &log).requires(&["db", "cache"]).boxed(), &ConfigData::new())
        .unwrap();
    registry
        .register(MockComponent::new("cache", &log).requires(&["db"]).delay_ms(10).boxed(), &ConfigData::new())
        .unwrap();
    registry
        .register(MockComponent::new("db", &log).delay_ms(10).boxed(), &ConfigData::new())
        .unwrap();

    registry.initialize().await.expect("startup should succeed");

    for name in ["db", "cache", "api"] {
        assert_eq!(registry.get(name).unwrap().state(), ComponentState::Running);
    }
    log.assert_before("end:db", "start:cache");
    log.assert_before("end:db", "start:api");
    log.assert_before("end:cache", "start:api");
}

#[tokio::test]
async fn test_two_node_cycle_fails_before_anything_runs() {
    let log = EventLog::new();
    let registry = test_registry();
    let a = MockComponent::new("a", &log).requires(&["b"]);
    let b = MockComponent::new("b", &log).requires(&["a"]);
    let (a_stats, b_stats) = (a.stats(), b.stats());
    registry.register(a.boxed(), &ConfigData::new()).unwrap();
    registry.register(b.boxed(), &ConfigData::new()).unwrap();

    let err = registry.initialize().await.unwrap_err();

    match &err {
        Error::Registry(RegistryError::CyclicDependency { cycle }) => {
            assert!(cycle.contains(&"a".to_string()));
            assert!(cycle.contains(&"b".to_string()));
        }
        other => panic!("expected a cycle error, got {:?}", other),
    }
    assert!(err.to_string().contains("a -> b -> a"), "got: {}", err);
    assert_eq!(a_stats.runs() + b_stats.runs(), 0);
    assert_eq!(a_stats.inits() + b_stats.inits(), 0);
    assert_ne!(registry.get("a").unwrap().state(), ComponentState::Initialized);
    assert_ne!(registry.get("b").unwrap().state(), ComponentState::Initialized);
}

#[tokio::test]
async fn test_longer_cycle_is_reported_with_its_members() {
    let log = EventLog::new();
    let registry = test_registry();
    registry.register(MockComponent::new("root", &log).boxed(), &ConfigData::new()).unwrap();
    registry
        .register(MockComponent::new("x", &log).requires(&["root", "z"]).boxed(), &ConfigData::new())
        .unwrap();
    registry.register(MockComponent::new("y", &log).requires(&["x"]).boxed(), &ConfigData::new()).unwrap();
    registry.register(MockComponent::new("z", &log).requires(&["y"]).boxed(), &ConfigData::new()).unwrap();

    let err = registry.initialize().await.unwrap_err();

    assert!(err.is_cycle());
    if let Error::Registry(RegistryError::CyclicDependency { cycle }) = err {
        assert_eq!(cycle.first(), cycle.last());
        for member in ["x", "y", "z"] {
            assert!(cycle.iter().any(|n| n == member), "{} missing from {:?}", member, cycle);
        }
        assert!(!cycle.iter().any(|n| n == "root"));
    }
    assert!(log.events().is_empty(), "no hook may run: {:?}", log.events());
}

#[tokio::test]
async fn test_missing_dependency_names_both_components() {
    let log = EventLog::new();
    let registry = test_registry();
    let other = MockComponent::new("other", &log);
    let other_stats = other.stats();
    registry.register(other.boxed(), &ConfigData::new()).unwrap();
    registry
        .register(MockComponent::new("a", &log).requires(&["ghost"]).boxed(), &ConfigData::new())
        .unwrap();

    let err = registry.initialize().await.unwrap_err();

    match &err {
        Error::Registry(RegistryError::MissingDependency { component, dependency }) => {
            assert_eq!(component, "a");
            assert_eq!(dependency, "ghost");
        }
        other => panic!("expected missing dependency, got {:?}", other),
    }
    let message = err.to_string();
    assert!(message.contains("'a'") && message.contains("'ghost'"), "got: {}", message);
    // Nothing ran anywhere, including the unrelated component
    assert_eq!(other_stats.runs(), 0);
    assert!(log.events().is_empty());
}

#[tokio::test]
async fn test_independent_components_all_run_regardless_of_order() {
    for _ in 0..5 {
        let log = EventLog::new();
        let registry = test_registry();
        let mut names = vec!["alpha", "beta", "gamma"];
        names.shuffle(&mut rand::thread_rng());
        for name in &names {
            registry.register(MockComponent::new(name, &log).boxed(), &ConfigData::new()).unwrap();
        }

        registry.initialize().await.unwrap();

        for name in &names {
            assert_eq!(registry.get(name).unwrap().state(), ComponentState::Running);
        }
    }
}

#[tokio::test]
async fn test_independent_branches_run_concurrently() {
    let log = EventLog::new();
    let registry = test_registry();
    registry.register(MockComponent::new("left", &log).delay_ms(50).boxed(), &ConfigData::new()).unwrap();
    registry.register(MockComponent::new("right", &log).delay_ms(50).boxed(), &ConfigData::new()).unwrap();

    registry.initialize().await.unwrap();

    // Both started before either finished
    log.assert_before("start:left", "end:right");
    log.assert_before("start:right", "end:left");
}

#[tokio::test]
async fn test_failure_abandons_unstarted_and_keeps_succeeded() {
    let log = EventLog::new();
    let registry = test_registry();
    registry.register(MockComponent::new("base", &log).boxed(), &ConfigData::new()).unwrap();
    registry
        .register(
            MockComponent::new("broken", &log)
                .requires(&["base"])
                .behavior(RunBehavior::Fail("port in use".to_string()))
                .boxed(),
            &ConfigData::new(),
        )
        .unwrap();
    let downstream = MockComponent::new("downstream", &log).requires(&["broken"]);
    let downstream_stats = downstream.stats();
    registry.register(downstream.boxed(), &ConfigData::new()).unwrap();

    let err = registry.initialize().await.unwrap_err();

    match &err {
        Error::Registry(RegistryError::StartupFailed { component, source, also_failed }) => {
            assert_eq!(component, "broken");
            assert!(source.to_string().contains("port in use"));
            assert!(also_failed.is_empty());
        }
        other => panic!("expected startup failure, got {:?}", other),
    }
    assert_eq!(registry.get("base").unwrap().state(), ComponentState::Running);
    assert_eq!(registry.get("broken").unwrap().state(), ComponentState::Failed);
    assert_eq!(registry.get("downstream").unwrap().state(), ComponentState::Configured);
    assert_eq!(downstream_stats.inits(), 0);
    assert_eq!(downstream_stats.runs(), 0);
}

#[tokio::test]
async fn test_in_flight_sibling_finishes_and_later_failures_are_secondary() {
    let log = EventLog::new();
    let registry = test_registry();
    registry
        .register(
            MockComponent::new("fast-fail", &log)
                .behavior(RunBehavior::Fail("first".to_string()))
                .boxed(),
            &ConfigData::new(),
        )
        .unwrap();
    registry
        .register(
            MockComponent::new("slow-fail", &log)
                .delay_ms(40)
                .behavior(RunBehavior::Fail("second".to_string()))
                .boxed(),
            &ConfigData::new(),
        )
        .unwrap();
    registry.register(MockComponent::new("slow-ok", &log).delay_ms(40).boxed(), &ConfigData::new()).unwrap();

    let err = registry.initialize().await.unwrap_err();

    match err {
        Error::Registry(RegistryError::StartupFailed { component, also_failed, .. }) => {
            assert_eq!(component, "fast-fail");
            assert_eq!(also_failed, vec!["slow-fail".to_string()]);
        }
        other => panic!("expected startup failure, got {:?}", other),
    }
    // Already-started sibling was allowed to complete
    assert!(log.contains("end:slow-ok"));
    assert_eq!(registry.get("slow-ok").unwrap().state(), ComponentState::Running);
}

#[tokio::test]
async fn test_init_failure_is_a_startup_failure() {
    let log = EventLog::new();
    let registry = test_registry();
    let bad = MockComponent::new("bad-init", &log).behavior(RunBehavior::FailInit("no state".to_string()));
    let bad_stats = bad.stats();
    registry.register(bad.boxed(), &ConfigData::new()).unwrap();

    let err = registry.initialize().await.unwrap_err();

    assert_eq!(
        match &err {
            Error::Registry(e) => e.failed_component(),
            _ => None,
        },
        Some("bad-init")
    );
    assert_eq!(bad_stats.runs(), 0);
    assert_eq!(registry.get("bad-init").unwrap().state(), ComponentState::Failed);
}

#[tokio::test]
async fn test_panicking_run_is_attributed_to_its_component() {
    let log = EventLog::new();
    let registry = test_registry();
    registry
        .register(MockComponent::new("explodes", &log).behavior(RunBehavior::Panic).boxed(), &ConfigData::new())
        .unwrap();

    let err = registry.initialize().await.unwrap_err();

    match err {
        Error::Registry(RegistryError::StartupFailed { component, .. }) => assert_eq!(component, "explodes"),
        other => panic!("expected startup failure, got {:?}", other),
    }
    assert_eq!(registry.get("explodes").unwrap().state(), ComponentState::Failed);
}

#[tokio::test]
async fn test_hanging_run_hits_the_watchdog() {
    let log = EventLog::new();
    let registry = test_registry();
    registry.set_run_timeout(Some(Duration::from_millis(30)));
    registry
        .register(MockComponent::new("stuck", &log).behavior(RunBehavior::Hang).boxed(), &ConfigData::new())
        .unwrap();

    let err = registry.initialize().await.unwrap_err();

    match err {
        Error::Registry(RegistryError::StartupFailed { component, source, .. }) => {
            assert_eq!(component, "stuck");
            assert!(matches!(
                *source,
                Error::Component(crate::component::ComponentError::RunTimedOut { .. })
            ));
        }
        other => panic!("expected a timeout failure, got {:?}", other),
    }
}

#[tokio::test]
async fn test_initialize_twice_is_rejected() {
    let log = EventLog::new();
    let registry = test_registry();
    registry.register(MockComponent::new("only", &log).boxed(), &ConfigData::new()).unwrap();

    registry.initialize().await.unwrap();
    let err = registry.initialize().await.unwrap_err();

    assert!(matches!(err, Error::Registry(RegistryError::AlreadyInitialized)));
}

#[tokio::test]
async fn test_empty_registry_initializes() {
    let registry = test_registry();
    registry.initialize().await.unwrap();
    assert!(registry.is_frozen());
}

#[tokio::test]
async fn test_random_dags_respect_dependency_order() {
    let mut rng = rand::thread_rng();
    for _ in 0..10 {
        let log = EventLog::new();
        let registry = test_registry();
        let count = rng.gen_range(3..9);
        let names: Vec<String> = (0..count).map(|i| format!("n{}", i)).collect();
        let mut edges: Vec<(String, Vec<String>)> = Vec::new();

        // Edges only point to lower indices, so the graph is acyclic.
        for i in 0..count {
            let requires: Vec<String> = (0..i).filter(|_| rng.gen_bool(0.4)).map(|j| names[j].clone()).collect();
            edges.push((names[i].clone(), requires));
        }
        let mut order: Vec<usize> = (0..count).collect();
        order.shuffle(&mut rng);
        for index in order {
            let (name, requires) = &edges[index];
            let requires: Vec<&str> = requires.iter().map(String::as_str).collect();
            let delay = rng.gen_range(0..5);
            registry
                .register(
                    MockComponent::new(name, &log).requires(&requires).delay_ms(delay).boxed(),
                    &ConfigData::new(),
                )
                .unwrap();
        }

        registry.initialize().await.unwrap();

        for (name, requires) in &edges {
            for dependency in requires {
                log.assert_before(&format!("end:{}", dependency), &format!("start:{}", name));
            }
        }
    }
}

#[tokio::test]
async fn test_shutdown_stops_in_reverse_start_order() {
    let log = EventLog::new();
    let registry = test_registry();
    registry.register(MockComponent::new("db", &log).boxed(), &ConfigData::new()).unwrap();
    registry.register(MockComponent::new("cache", &log).requires(&["db"]).boxed(), &ConfigData::new()).unwrap();
    registry.register(MockComponent::new("api", &log).requires(&["cache"]).boxed(), &ConfigData::new()).unwrap();
    registry.initialize().await.unwrap();

    registry.shutdown().await.unwrap();

    log.assert_before("stop:api", "stop:cache");
    log.assert_before("stop:cache", "stop:db");
    for name in ["db", "cache", "api"] {
        assert_eq!(registry.get(name).unwrap().state(), ComponentState::Stopped);
    }
}
