//! Integration tests for the PlacementOptimizer API
//!
//! These tests run complete searches through the public API and check the
//! properties every result must have.

use std::{
    collections::HashSet,
    sync::{Arc, Mutex},
};

use float_cmp::approx_eq;

use siteplan::{
    ConfigError, PlacementOptimizer, Problem, SiteplanError,
    config::{AppConfig, EngineKind, GeneratorConfig, PerformanceMode, SearchConfig},
    constraints::ConstraintHandler,
    definition::{FixedZoneDefinition, SiteDefinition, SpaceDefinition},
    search::{CancellationToken, ProgressEvent, SearchOutcome},
};

fn baseline(search: SearchConfig) -> AppConfig {
    AppConfig::default().with_search(
        search
            .with_engine(EngineKind::Baseline)
            .with_sampling(false),
    )
}

fn three_mains() -> SiteDefinition {
    SiteDefinition::new(30.0, 20.0)
        .with_space("A", SpaceDefinition::main(4.0, 3.0, 1))
        .with_space("B", SpaceDefinition::main(4.0, 3.0, 2))
        .with_space("C", SpaceDefinition::main(4.0, 3.0, 3))
        .with_adjacency("A", "B", 10, 0.0)
        .with_adjacency("B", "C", 10, 0.0)
}

fn workshop() -> SiteDefinition {
    SiteDefinition::new(40.0, 30.0)
        .with_space("cut", SpaceDefinition::main(6.0, 4.0, 1).with_name("Cutting"))
        .with_space("weld", SpaceDefinition::main(5.0, 4.0, 2).with_hazards(&["fire"]))
        .with_space("paint", SpaceDefinition::main(5.0, 5.0, 3))
        .with_space("store", SpaceDefinition::sub(3.0, 3.0))
        .with_space("office", SpaceDefinition::sub(4.0, 2.0))
        .with_space("gate", SpaceDefinition::fixed(2.0, 2.0, 0.0, 0.0))
        .with_adjacency("cut", "weld", 10, 0.0)
        .with_adjacency("weld", "paint", 8, 1.0)
        .with_adjacency("store", "cut", 6, 2.0)
        .with_fixed_zone(FixedZoneDefinition::new("road", 0.0, 27.0, 40.0, 3.0).with_name("Main road"))
}

fn solve(config: AppConfig, definition: &SiteDefinition) -> (Problem, SearchOutcome) {
    let optimizer = PlacementOptimizer::new(config);
    let problem = optimizer.classify(definition).expect("Failed to classify");
    let outcome = optimizer.optimize(&problem).expect("Search failed");
    (problem, outcome)
}

fn summary(outcome: &SearchOutcome) -> Vec<(String, f32)> {
    outcome
        .solutions
        .iter()
        .map(|solution| (solution.code().to_string(), solution.fitness().total))
        .collect()
}

#[test]
fn test_sequence_gap_is_rejected() {
    let definition = SiteDefinition::new(30.0, 20.0)
        .with_space("A", SpaceDefinition::main(4.0, 3.0, 1))
        .with_space("B", SpaceDefinition::main(4.0, 3.0, 3));

    let err = PlacementOptimizer::default()
        .classify(&definition)
        .unwrap_err();
    assert!(matches!(
        err,
        SiteplanError::Config(ConfigError::NonContiguousSequence { .. })
    ));
}

#[test]
fn test_solutions_pass_validation() {
    let config = AppConfig::default();
    let (problem, outcome) = solve(config.clone(), &workshop());
    assert!(!outcome.is_empty());

    let handler = ConstraintHandler::new(
        *problem.site(),
        problem.fixed_zones(),
        problem.hazards(),
        config.constraints(),
    );
    for solution in &outcome.solutions {
        assert!(
            handler.validate(solution.state()).is_ok(),
            "Solution {} fails validation",
            solution.code()
        );
        assert!(handler.verify_chain(solution.state()).is_ok());
        assert!(solution.fitness().is_feasible());
    }
}

#[test]
fn test_baseline_is_deterministic() {
    let config = baseline(SearchConfig::default());
    let (_, first) = solve(config.clone(), &workshop());
    let (_, second) = solve(config, &workshop());

    assert!(!first.is_empty());
    assert_eq!(summary(&first), summary(&second));
}

#[test]
fn test_pruning_preserves_best_fitness() {
    let pruned = baseline(SearchConfig::default().with_prefix_pruning(true));
    let unpruned = baseline(SearchConfig::default().with_prefix_pruning(false));

    let (_, with_pruning) = solve(pruned, &workshop());
    let (_, without_pruning) = solve(unpruned, &workshop());

    let best = with_pruning.best().expect("No solution with pruning");
    let reference = without_pruning.best().expect("No solution without pruning");
    assert!(approx_eq!(
        f32,
        best.fitness().total,
        reference.fitness().total,
        epsilon = 1e-3
    ));
    assert!(with_pruning.stats.prefixes_pruned > 0);
    assert!(without_pruning.stats.candidates_generated > with_pruning.stats.candidates_generated);
}

#[test]
fn test_exact_fit_unit() {
    let definition = SiteDefinition::new(10.0, 8.0).with_space("A", SpaceDefinition::main(10.0, 8.0, 1));
    let (_, outcome) = solve(AppConfig::default(), &definition);

    let best = outcome.best().expect("Exact fit must be feasible");
    assert!(approx_eq!(f32, best.fitness().utilization_ratio, 1.0, epsilon = 1e-4));
    // 0.3 above the band with a 0.5 falloff keeps 40% of the 200 peak.
    assert!(approx_eq!(f32, best.fitness().utilization, 80.0, epsilon = 1e-3));
    assert_eq!(best.code().as_str(), "AO");
}

#[test]
fn test_oversized_unit_has_no_solution() {
    let definition = SiteDefinition::new(10.0, 8.0).with_space("A", SpaceDefinition::main(12.0, 12.0, 1));
    let (_, outcome) = solve(AppConfig::default(), &definition);

    assert!(outcome.is_empty());
    assert_eq!(outcome.stats.feasible, 0);
    assert_eq!(outcome.stats.diversity, 0.0);
}

#[test]
fn test_adjacent_chain_scores_peak() {
    let config = baseline(SearchConfig::default())
        .with_generator(GeneratorConfig::default().with_gap_options(vec![0.0, 2.0]));
    let (_, outcome) = solve(config, &three_mains());

    let best = outcome.best().expect("No solution");
    assert!(approx_eq!(f32, best.fitness().adjacency, 600.0, epsilon = 1e-3));
    for placement in best.state().chain().skip(1) {
        let attachment = placement.attachment().expect("Chain unit without attachment");
        assert!(approx_eq!(f32, attachment.gap(), 0.0, epsilon = 1e-4));
    }
}

#[test]
fn test_large_site_coordinates() {
    let definition = SiteDefinition::new(100_000.0, 80_000.0)
        .with_space("A", SpaceDefinition::main(4_000.0, 3_000.0, 1))
        .with_space("B", SpaceDefinition::main(4_000.0, 3_000.0, 2))
        .with_adjacency("A", "B", 10, 100.0);
    let config = baseline(SearchConfig::default())
        .with_generator(GeneratorConfig::default().with_gap_options(vec![0.1]));

    let (problem, outcome) = solve(config.clone(), &definition);
    assert!(!outcome.is_empty());

    let handler = ConstraintHandler::new(
        *problem.site(),
        problem.fixed_zones(),
        problem.hazards(),
        config.constraints(),
    );
    for solution in &outcome.solutions {
        assert!(handler.verify_chain(solution.state()).is_ok());
    }
}

#[test]
fn test_top_k_capacity() {
    let config = AppConfig::default().with_search(SearchConfig::default().with_max_solutions(3));
    let (_, outcome) = solve(config, &three_mains());

    assert_eq!(outcome.solutions.len(), 3);
    let codes: HashSet<String> = outcome
        .solutions
        .iter()
        .map(|solution| solution.code().to_string())
        .collect();
    assert_eq!(codes.len(), 3);
    assert!(
        outcome
            .solutions
            .windows(2)
            .all(|pair| pair[0].fitness().total >= pair[1].fitness().total)
    );
    assert_eq!(outcome.stats.diversity, 1.0);
}

#[test]
fn test_cancellation_returns_partial_result() {
    let token = CancellationToken::new();
    let trigger = token.clone();
    let config = baseline(SearchConfig::default().with_progress_interval(1));

    let optimizer = PlacementOptimizer::new(config)
        .with_cancellation(token)
        .with_observer(Arc::new(move |_: &ProgressEvent| trigger.cancel()));
    let problem = optimizer.classify(&workshop()).unwrap();
    let outcome = optimizer.optimize(&problem).unwrap();

    assert!(outcome.stats.cancelled);
    assert_eq!(outcome.stats.candidates_generated, 1);
    assert!(outcome.solutions.len() <= 1);
    assert_eq!(outcome.stats.seeds_explored, 0);
}

#[test]
fn test_parallel_matches_sequential() {
    let search = SearchConfig::default()
        .with_mode(PerformanceMode::Balanced)
        .with_max_solutions(5);
    let sequential = AppConfig::default().with_search(search.clone().with_parallel(false));
    let parallel = AppConfig::default().with_search(search.with_parallel(true));

    let (_, first) = solve(sequential, &workshop());
    let (_, second) = solve(parallel, &workshop());

    assert_eq!(summary(&first), summary(&second));
    assert_eq!(first.stats.candidates_generated, second.stats.candidates_generated);
    assert_eq!(first.stats.fitness_history, second.stats.fitness_history);
}

#[test]
fn test_sampled_search_is_reproducible() {
    let mut definition = SiteDefinition::new(80.0, 80.0);
    for idx in 1..=6u32 {
        definition = definition.with_space(&format!("M{idx}"), SpaceDefinition::main(4.0, 3.0, idx));
    }
    let config = AppConfig::default().with_search(
        SearchConfig::default()
            .with_mode(PerformanceMode::Fast)
            .with_rng_seed(7),
    );

    let (_, first) = solve(config.clone(), &definition);
    let (_, second) = solve(config, &definition);

    assert!(first.stats.sampled_seeds > 0);
    assert!(first.stats.candidates_generated < first.stats.search_space);
    assert_eq!(summary(&first), summary(&second));
}

#[test]
fn test_progress_events_are_reported() {
    let events = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&events);
    let config = AppConfig::default().with_search(SearchConfig::default().with_progress_interval(10));

    let optimizer = PlacementOptimizer::new(config).with_observer(Arc::new(move |event: &ProgressEvent| {
        sink.lock().unwrap().push(event.clone());
    }));
    let problem = optimizer.classify(&three_mains()).unwrap();
    let outcome = optimizer.optimize(&problem).unwrap();

    let events = events.lock().unwrap();
    let last = events.last().expect("No progress events");
    assert_eq!(last.seeds_done, last.seed_count);
    assert_eq!(last.processed, outcome.stats.candidates_generated);
    assert_eq!(last.estimated_remaining, Some(std::time::Duration::ZERO));
}
