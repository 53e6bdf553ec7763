//! # repairkit
//!
//! <div align="center">
//! <strong>Generate-and-Validate Automated Program Repair, in pure Rust</strong><br>
//! Statement-level mutation search over a pluggable AST, with
//! first-class support for evolutionary, exhaustive, and adaptive
//! repair strategies.
//! </div>
//!
//! ---
//!
//! ## Overview
//!
//! `repairkit` searches for a patch that makes a failing test suite pass
//! by mutating statements in a program's AST and re-running its tests
//! against each candidate. The core goals are:
//!
//! * **Extensibility** — every operator (selection, crossover, search
//!   strategy, fitness, minimization) is pluggable via a pure Rust trait.
//! * **Determinism** — a single injectable [`random::RandomGenerator`]
//!   means a whole run can be replayed bit-for-bit from a seed.
//! * **Language independence** — the statement index, mutation algebra,
//!   and search strategies are generic over any [`lang::Parser`]; this
//!   crate ships one concrete language ([`lang::mini`]) to exercise them.
//!
//! Currently implemented repair strategies:
//!
//! | Family | Strategy |
//! |--------|----------|
//! | GenProg | [`search::EvolutionaryStrategy`] |
//! | Kali / MutRepair | [`search::ExhaustiveStrategy`] |
//! | AE (adaptive) | [`search::AdaptiveEnumerator`] |
//! | Cardumen (templates) | [`templates`] |
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use repairkit::{
//!     algorithms::RepairDriverBuilder,
//!     candidate::Candidate,
//!     crossover::OnePointCrossover,
//!     fitness::{EngineConfig, GenProgFitness, SequentialEngine, Materializer, new_memo},
//!     lang::mini::MiniParser,
//!     localization::WeightedSid,
//!     minimize::DeltaDebugMinimizer,
//!     operators::ALL_KINDS,
//!     oracle::Oracle,
//!     random::RepairRandomGenerator,
//!     search::EvolutionaryStrategy,
//!     selection::UniversalSelection,
//!     stmt::StatementIndex,
//! };
//!
//! # fn example(oracle: &dyn Oracle) -> repairkit::error::Result<()> {
//! let index = StatementIndex::index(
//!     std::path::Path::new("program.mini"),
//!     &MiniParser,
//!     &[],
//!     false,
//! )?;
//! let initial = Candidate::initial(index.source_root.clone(), index.statements.clone());
//! let suggestions: Vec<WeightedSid> = index.all_sids().map(|sid| WeightedSid { sid, weight: 1.0 }).collect();
//! let universe: Vec<_> = index.all_sids().collect();
//! let fitness = GenProgFitness::default();
//! let sids_by_file = std::collections::HashMap::new();
//! let materializer = Materializer { source_root: &index.source_root, sids_by_file: &sids_by_file, unparser: &MiniParser };
//! let memo = new_memo();
//! let engine = SequentialEngine {
//!     materializer,
//!     oracle,
//!     fitness: &fitness,
//!     memo,
//!     config: EngineConfig { selectors: vec![], timeout: std::time::Duration::from_secs(30), raise_on_failure: false },
//!     working_dir: std::env::temp_dir().join("repairkit-rep"),
//! };
//! let selection = UniversalSelection;
//! let crossover = OnePointCrossover;
//! let names = index.statements.all_names();
//! let operator_weights: std::collections::HashMap<repairkit::OpKind, f64> = std::collections::HashMap::new();
//! let strategy = EvolutionaryStrategy {
//!     selection: &selection,
//!     crossover: &crossover,
//!     suggestions: &suggestions,
//!     operator_kinds: ALL_KINDS,
//!     operator_weights: &operator_weights,
//!     universe: &universe,
//!     names: &names,
//!     statements: &index.statements,
//!     cardumen: None,
//!     mutation_rate: 0.06,
//! };
//! let mut driver = RepairDriverBuilder::default()
//!     .initial_candidate(initial)
//!     .engine(engine)
//!     .strategy(strategy)
//!     .minimizer(DeltaDebugMinimizer)
//!     .rng(RepairRandomGenerator::new(1))
//!     .population_size(40)
//!     .num_generations(10)
//!     .build()
//!     .expect("failed to build repair driver");
//!
//! driver.run()?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Module layout
//!
//! * [`algorithms`] – the repair driver and its builder
//! * [`search`] – evolutionary, exhaustive, and adaptive strategies
//! * [`operators`] / [`apply`] – the mutation algebra and its applier
//! * [`stmt`] / [`candidate`] – statement indexing and candidates
//! * [`fitness`] / [`oracle`] – scoring and the test-running boundary
//! * [`selection`] / [`crossover`] / [`minimize`] / [`templates`] – the
//!   remaining pluggable operators
//! * [`lang`] – the AST plugin boundary and the default `mini` language
//! * [`random`] – the pluggable RNG abstraction
//! * [`config`] / [`error`] – configuration and the error taxonomy
//! * [`diff`] – unified-diff rendering for a repaired candidate's edit
//!
//! ---

pub mod algorithms;
pub mod apply;
pub mod candidate;
pub mod config;
pub mod crossover;
pub mod diff;
pub mod error;
pub mod fitness;
pub mod lang;
pub mod localization;
pub mod minimize;
pub mod operators;
pub mod oracle;
pub mod random;
pub mod search;
pub mod selection;
pub mod stmt;
pub mod templates;

pub use algorithms::{GeneticRepairDriver, IterationData, RepairDriverBuilder, RepairDriverBuilderError};
pub use candidate::Candidate;
pub use config::{Config, ConfigBuilder};
pub use diff::render_unified_diff;
pub use error::{RepairError, RepairOutcome, Result};
pub use fitness::{AbsoluteFitness, Engine, EngineConfig, Fitness, GenProgFitness, Materializer, ParallelEngine, SequentialEngine};
pub use localization::{normalize, WeightedSid, WeightedSuggestion};
pub use operators::{Op, OpKind};
pub use oracle::{Oracle, Report, TestId, TestOutcome};
pub use random::{NoopRandomGenerator, RandomGenerator, RepairRandomGenerator, TestDummyRng};
pub use stmt::{Sid, StatementIndex, StatementTable};
