use std::collections::HashMap;
use std::io::Write;
use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use repairkit::algorithms::RepairDriverBuilder;
use repairkit::candidate::Candidate;
use repairkit::crossover::OnePointCrossover;
use repairkit::fitness::{EngineConfig, Materializer, SequentialEngine};
use repairkit::lang::mini::MiniParser;
use repairkit::localization::WeightedSid;
use repairkit::oracle::{Oracle, Report, TestId, TestOutcome};
use repairkit::random::RepairRandomGenerator;
use repairkit::search::EvolutionaryStrategy;
use repairkit::selection::RandomSelection;
use repairkit::stmt::StatementIndex;
use repairkit::{GenProgFitness, IterationData, OpKind};

/// An oracle that never succeeds, so a repair run only ever stops because
/// it ran out of generations or because it was cancelled.
struct NeverSucceedsOracle;

impl Oracle for NeverSucceedsOracle {
    fn run_tests(
        &self,
        _working_dir: &Path,
        _env: &HashMap<String, String>,
        _selectors: &[TestId],
        _timeout: Duration,
    ) -> repairkit::error::Result<Report> {
        Ok(Report::ok(vec!["t1".to_string()], vec!["t2".to_string()]))
    }

    fn run_tests_streaming<'a>(
        &'a self,
        _working_dir: &'a Path,
        _env: &'a HashMap<String, String>,
        _selectors: &'a [TestId],
        _timeout: Duration,
    ) -> Box<dyn Iterator<Item = (TestId, TestOutcome)> + 'a> {
        Box::new(std::iter::once(("t1".to_string(), TestOutcome::Passed)))
    }
}

fn write_program() -> tempfile::NamedTempFile {
    let mut f = tempfile::Builder::new().suffix(".mini").tempfile().unwrap();
    f.write_all(b"x = 1\nif x > 0 {\n    y = 2\n}\nreturn x\n").unwrap();
    f
}

#[test]
fn cancellation_stops_the_run_before_num_generations() {
    let _ = env_logger::try_init();
    let program = write_program();
    let index = StatementIndex::index(program.path(), &MiniParser, &[], false).unwrap();
    let initial = Candidate::initial(index.source_root.clone(), index.statements.clone());

    let suggestions: Vec<WeightedSid> =
        index.all_sids().map(|sid| WeightedSid { sid, weight: 1.0 }).collect();
    let universe: Vec<_> = index.all_sids().collect();

    let oracle = NeverSucceedsOracle;
    let fitness = GenProgFitness { w_pos: 1.0, w_neg: 10.0, total_pos: 1, total_neg: 1 };
    let sids_by_file = HashMap::new();
    let work_dir = tempfile::tempdir().unwrap();
    let materializer =
        Materializer { source_root: &index.source_root, sids_by_file: &sids_by_file, unparser: &MiniParser };
    let engine = SequentialEngine {
        materializer,
        oracle: &oracle,
        fitness: &fitness,
        memo: repairkit::fitness::new_memo(),
        config: EngineConfig { selectors: vec![], timeout: Duration::from_secs(5), raise_on_failure: false },
        working_dir: work_dir.path().to_path_buf(),
    };

    let selection = RandomSelection;
    let crossover = OnePointCrossover;
    let names = index.statements.all_names();
    let operator_weights = HashMap::new();
    let strategy = EvolutionaryStrategy {
        selection: &selection,
        crossover: &crossover,
        suggestions: &suggestions,
        operator_kinds: repairkit::operators::ALL_KINDS,
        operator_weights: &operator_weights,
        universe: &universe,
        names: &names,
        statements: &index.statements,
        cardumen: None,
        mutation_rate: 0.5,
    };

    let mut driver = RepairDriverBuilder::default()
        .initial_candidate(initial)
        .engine(engine)
        .strategy(strategy)
        .rng(RepairRandomGenerator::new(42))
        .population_size(6)
        .num_generations(100)
        .build()
        .expect("failed to build repair driver");

    let token = Arc::new(AtomicBool::new(false));
    let token_clone = token.clone();
    let iterations_run = Arc::new(AtomicUsize::new(0));
    let iterations_run_clone = iterations_run.clone();

    let callback = move |data: IterationData| {
        iterations_run_clone.store(data.iteration, Ordering::Relaxed);
        if data.iteration >= 3 {
            token_clone.store(true, Ordering::Relaxed);
        }
    };

    driver.run_cancellable(token, Some(callback)).expect("repair run failed");

    let iterations = iterations_run.load(Ordering::Relaxed);
    assert!(iterations >= 3 && iterations < 100, "iterations: {iterations}");
}

#[test]
fn run_cancellable_accepts_no_callback() {
    let _ = env_logger::try_init();
    let program = write_program();
    let index = StatementIndex::index(program.path(), &MiniParser, &[], false).unwrap();
    let initial = Candidate::initial(index.source_root.clone(), index.statements.clone());
    let suggestions: Vec<WeightedSid> =
        index.all_sids().map(|sid| WeightedSid { sid, weight: 1.0 }).collect();
    let universe: Vec<_> = index.all_sids().collect();

    let oracle = NeverSucceedsOracle;
    let fitness = GenProgFitness { w_pos: 1.0, w_neg: 10.0, total_pos: 1, total_neg: 1 };
    let sids_by_file = HashMap::new();
    let work_dir = tempfile::tempdir().unwrap();
    let materializer =
        Materializer { source_root: &index.source_root, sids_by_file: &sids_by_file, unparser: &MiniParser };
    let engine = SequentialEngine {
        materializer,
        oracle: &oracle,
        fitness: &fitness,
        memo: repairkit::fitness::new_memo(),
        config: EngineConfig { selectors: vec![], timeout: Duration::from_secs(5), raise_on_failure: false },
        working_dir: work_dir.path().to_path_buf(),
    };
    let selection = RandomSelection;
    let crossover = OnePointCrossover;
    let names = index.statements.all_names();
    let operator_weights = HashMap::new();
    let strategy = EvolutionaryStrategy {
        selection: &selection,
        crossover: &crossover,
        suggestions: &suggestions,
        operator_kinds: repairkit::operators::ALL_KINDS,
        operator_weights: &operator_weights,
        universe: &universe,
        names: &names,
        statements: &index.statements,
        cardumen: None,
        mutation_rate: 0.5,
    };

    let mut driver = RepairDriverBuilder::default()
        .initial_candidate(initial)
        .engine(engine)
        .strategy(strategy)
        .rng(RepairRandomGenerator::new(7))
        .population_size(4)
        .num_generations(5)
        .build()
        .expect("failed to build repair driver");

    let token = Arc::new(AtomicBool::new(false));
    let callback: Option<fn(IterationData)> = None;
    driver.run_cancellable(token, callback).expect("repair run failed");
}
