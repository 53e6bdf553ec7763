//! The closed mutation operator algebra (spec §3/§4.3).
//!
//! Every operator is a plain data variant carrying exactly the parameters
//! chosen at construction time (the target `Sid`s, and any random
//! sub-choice such as which replacement operator symbol to use). Because
//! all randomness is resolved up front, `Op` derives structural
//! `PartialEq`/`Eq`/`Hash` — two operators compare equal iff they would
//! make the same edit, which is exactly what the candidate memoization
//! and equivalence-pruning logic (C8) needs.

use crate::lang::AstNode;
use crate::random::RandomGenerator;
use crate::stmt::{Sid, StatementTable};
use crate::templates::CardumenEngine;

/// A single mutation, fully resolved (no further randomness needed to
/// apply it).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Op {
    Delete { target: Sid },
    InsertBefore { target: Sid, source: Sid },
    InsertAfter { target: Sid, source: Sid },
    InsertBoth { target: Sid, source: Sid },
    Replace { target: Sid, source: Sid },
    MoveBefore { target: Sid, source: Sid },
    MoveAfter { target: Sid, source: Sid },
    MoveBoth { target: Sid, source: Sid },
    Swap { left: Sid, right: Sid },
    Copy { target: Sid, source: Sid },
    ReplaceBinaryOp { target: Sid, new_op: String },
    ReplaceCompareOp { target: Sid, new_op: String },
    ReplaceUnaryOp { target: Sid, new_op: String },
    ReplaceBoolOp { target: Sid, new_op: String },
    ModifyIfToTrue { target: Sid },
    ModifyIfToFalse { target: Sid },
    InsertReturn0 { target: Sid },
    InsertReturnNone { target: Sid },
    InsertReturnString { target: Sid },
    InsertReturnList { target: Sid },
    InsertReturnTuple { target: Sid },
    Rename { target: Sid, new_name: String },
    /// A Cardumen template instance (C10). Unlike every other variant,
    /// its payload is produced by [`crate::templates`], not drawn from a
    /// small fixed alphabet at construction time: `replacement` is the
    /// fully instantiated statement the template engine chose.
    ReplaceCardumen { target: Sid, replacement: AstNode },
}

/// The alphabet each replace-operator kind draws from, mirroring
/// `ReplaceBinaryOperator`/`ReplaceComparisonOperator`/`ReplaceUnaryOperator`/
/// `ReplaceBooleanOperator` in the original operator catalogue.
pub const BINARY_OPS: &[&str] = &["+", "-", "*", "/"];
pub const COMPARE_OPS: &[&str] = &["==", "!=", "<", ">", "<=", ">="];
pub const UNARY_OPS: &[&str] = &["-", "not"];
pub const BOOL_OPS: &[&str] = &["and", "or"];

/// The operator kind an [`Op`] belongs to, used by search strategies that
/// need to enumerate "one of each kind" (exhaustive search, C7) without
/// caring about the resolved parameters yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OpKind {
    Delete,
    InsertBefore,
    InsertAfter,
    InsertBoth,
    Replace,
    MoveBefore,
    MoveAfter,
    MoveBoth,
    Swap,
    Copy,
    ReplaceBinaryOp,
    ReplaceCompareOp,
    ReplaceUnaryOp,
    ReplaceBoolOp,
    ModifyIfToTrue,
    ModifyIfToFalse,
    InsertReturn0,
    InsertReturnNone,
    InsertReturnString,
    InsertReturnList,
    InsertReturnTuple,
    Rename,
    ReplaceCardumen,
}

/// The default operator universe used by the evolutionary and exhaustive
/// strategies when the caller doesn't restrict it further. `Rename` and
/// `ReplaceCardumen` are included: an embedder who wants `Rename` left out
/// gates it via `Config::operator_kinds` (which drops it when
/// `rename_single_variable` is off), and `ReplaceCardumen` degrades to a
/// harmless identity edit when no [`CardumenEngine`] is supplied to
/// [`Op::build`] rather than needing to be excluded outright.
pub const ALL_KINDS: &[OpKind] = &[
    OpKind::Delete,
    OpKind::InsertBefore,
    OpKind::InsertAfter,
    OpKind::InsertBoth,
    OpKind::Replace,
    OpKind::MoveBefore,
    OpKind::MoveAfter,
    OpKind::MoveBoth,
    OpKind::Swap,
    OpKind::Copy,
    OpKind::ReplaceBinaryOp,
    OpKind::ReplaceCompareOp,
    OpKind::ReplaceUnaryOp,
    OpKind::ReplaceBoolOp,
    OpKind::ModifyIfToTrue,
    OpKind::ModifyIfToFalse,
    OpKind::InsertReturn0,
    OpKind::InsertReturnNone,
    OpKind::InsertReturnString,
    OpKind::InsertReturnList,
    OpKind::InsertReturnTuple,
    OpKind::Rename,
    OpKind::ReplaceCardumen,
];

/// The reduced universe `AbstractAE` (C8) restricts itself to.
pub const AE_KINDS: &[OpKind] = &[OpKind::Delete, OpKind::InsertBefore, OpKind::InsertAfter];

impl OpKind {
    /// Stable string form, used as `Config.operator_weights`'s map key so
    /// weights survive a TOML/JSON round trip without `OpKind` itself
    /// needing to be a serde map key (JSON map keys must be strings).
    pub fn name(&self) -> &'static str {
        match self {
            OpKind::Delete => "Delete",
            OpKind::InsertBefore => "InsertBefore",
            OpKind::InsertAfter => "InsertAfter",
            OpKind::InsertBoth => "InsertBoth",
            OpKind::Replace => "Replace",
            OpKind::MoveBefore => "MoveBefore",
            OpKind::MoveAfter => "MoveAfter",
            OpKind::MoveBoth => "MoveBoth",
            OpKind::Swap => "Swap",
            OpKind::Copy => "Copy",
            OpKind::ReplaceBinaryOp => "ReplaceBinaryOp",
            OpKind::ReplaceCompareOp => "ReplaceCompareOp",
            OpKind::ReplaceUnaryOp => "ReplaceUnaryOp",
            OpKind::ReplaceBoolOp => "ReplaceBoolOp",
            OpKind::ModifyIfToTrue => "ModifyIfToTrue",
            OpKind::ModifyIfToFalse => "ModifyIfToFalse",
            OpKind::InsertReturn0 => "InsertReturn0",
            OpKind::InsertReturnNone => "InsertReturnNone",
            OpKind::InsertReturnString => "InsertReturnString",
            OpKind::InsertReturnList => "InsertReturnList",
            OpKind::InsertReturnTuple => "InsertReturnTuple",
            OpKind::Rename => "Rename",
            OpKind::ReplaceCardumen => "ReplaceCardumen",
        }
    }

    pub fn from_name(name: &str) -> Option<OpKind> {
        ALL_KINDS.iter().copied().find(|k| k.name() == name)
    }
}

/// Everything [`Op::build`] may need beyond the kind/target being built:
/// the source universe, the program-wide name universe (`Rename`), the
/// original statement table (`ReplaceCardumen`'s identity fallback), and
/// an optional precomputed Cardumen engine. Gathered once per generation
/// by the caller rather than recomputed per mutation.
pub struct BuildContext<'a> {
    pub universe: &'a [Sid],
    pub names: &'a [String],
    pub statements: &'a StatementTable,
    pub cardumen: Option<&'a CardumenEngine>,
}

impl Op {
    pub fn kind(&self) -> OpKind {
        match self {
            Op::Delete { .. } => OpKind::Delete,
            Op::InsertBefore { .. } => OpKind::InsertBefore,
            Op::InsertAfter { .. } => OpKind::InsertAfter,
            Op::InsertBoth { .. } => OpKind::InsertBoth,
            Op::Replace { .. } => OpKind::Replace,
            Op::MoveBefore { .. } => OpKind::MoveBefore,
            Op::MoveAfter { .. } => OpKind::MoveAfter,
            Op::MoveBoth { .. } => OpKind::MoveBoth,
            Op::Swap { .. } => OpKind::Swap,
            Op::Copy { .. } => OpKind::Copy,
            Op::ReplaceBinaryOp { .. } => OpKind::ReplaceBinaryOp,
            Op::ReplaceCompareOp { .. } => OpKind::ReplaceCompareOp,
            Op::ReplaceUnaryOp { .. } => OpKind::ReplaceUnaryOp,
            Op::ReplaceBoolOp { .. } => OpKind::ReplaceBoolOp,
            Op::ModifyIfToTrue { .. } => OpKind::ModifyIfToTrue,
            Op::ModifyIfToFalse { .. } => OpKind::ModifyIfToFalse,
            Op::InsertReturn0 { .. } => OpKind::InsertReturn0,
            Op::InsertReturnNone { .. } => OpKind::InsertReturnNone,
            Op::InsertReturnString { .. } => OpKind::InsertReturnString,
            Op::InsertReturnList { .. } => OpKind::InsertReturnList,
            Op::InsertReturnTuple { .. } => OpKind::InsertReturnTuple,
            Op::Rename { .. } => OpKind::Rename,
            Op::ReplaceCardumen { .. } => OpKind::ReplaceCardumen,
        }
    }

    /// Every `Sid` this operator reads from or writes to, used by C8's
    /// identity/order equivalence predicates.
    pub fn touches(&self) -> Vec<Sid> {
        match *self {
            Op::Delete { target }
            | Op::ModifyIfToTrue { target }
            | Op::ModifyIfToFalse { target }
            | Op::InsertReturn0 { target }
            | Op::InsertReturnNone { target }
            | Op::InsertReturnString { target }
            | Op::InsertReturnList { target }
            | Op::InsertReturnTuple { target }
            | Op::ReplaceBinaryOp { target, .. }
            | Op::ReplaceCompareOp { target, .. }
            | Op::ReplaceUnaryOp { target, .. }
            | Op::ReplaceBoolOp { target, .. }
            | Op::Rename { target, .. }
            | Op::ReplaceCardumen { target, .. } => vec![target],
            Op::InsertBefore { target, source }
            | Op::InsertAfter { target, source }
            | Op::InsertBoth { target, source }
            | Op::Replace { target, source }
            | Op::MoveBefore { target, source }
            | Op::MoveAfter { target, source }
            | Op::MoveBoth { target, source }
            | Op::Copy { target, source } => vec![target, source],
            Op::Swap { left, right } => vec![left, right],
        }
    }

    /// Constructs a single resolved operator of `kind` targeting `target`,
    /// drawing any needed extra parameter (source sid, operator symbol,
    /// new name, Cardumen instance) from `ctx`/`rng`. Mirrors each
    /// `*MutationOperator` subclass's constructor in the original
    /// catalogue, which always resolves its randomness once, at
    /// construction time.
    pub fn build(kind: OpKind, target: Sid, ctx: &BuildContext, rng: &mut dyn RandomGenerator) -> Op {
        let pick_other = |rng: &mut dyn RandomGenerator| -> Sid {
            let candidates: Vec<Sid> = ctx.universe.iter().copied().filter(|s| *s != target).collect();
            if candidates.is_empty() {
                target
            } else {
                *rng.choose(&candidates)
            }
        };
        match kind {
            OpKind::Delete => Op::Delete { target },
            OpKind::InsertBefore => Op::InsertBefore { target, source: pick_other(rng) },
            OpKind::InsertAfter => Op::InsertAfter { target, source: pick_other(rng) },
            OpKind::InsertBoth => Op::InsertBoth { target, source: pick_other(rng) },
            OpKind::Replace => Op::Replace { target, source: pick_other(rng) },
            OpKind::MoveBefore => Op::MoveBefore { target, source: pick_other(rng) },
            OpKind::MoveAfter => Op::MoveAfter { target, source: pick_other(rng) },
            OpKind::MoveBoth => Op::MoveBoth { target, source: pick_other(rng) },
            OpKind::Swap => Op::Swap { left: target, right: pick_other(rng) },
            OpKind::Copy => Op::Copy { target, source: pick_other(rng) },
            OpKind::ReplaceBinaryOp => {
                Op::ReplaceBinaryOp { target, new_op: (*rng.choose(BINARY_OPS)).to_string() }
            }
            OpKind::ReplaceCompareOp => {
                Op::ReplaceCompareOp { target, new_op: (*rng.choose(COMPARE_OPS)).to_string() }
            }
            OpKind::ReplaceUnaryOp => {
                Op::ReplaceUnaryOp { target, new_op: (*rng.choose(UNARY_OPS)).to_string() }
            }
            OpKind::ReplaceBoolOp => {
                Op::ReplaceBoolOp { target, new_op: (*rng.choose(BOOL_OPS)).to_string() }
            }
            OpKind::ModifyIfToTrue => Op::ModifyIfToTrue { target },
            OpKind::ModifyIfToFalse => Op::ModifyIfToFalse { target },
            OpKind::InsertReturn0 => Op::InsertReturn0 { target },
            OpKind::InsertReturnNone => Op::InsertReturnNone { target },
            OpKind::InsertReturnString => Op::InsertReturnString { target },
            OpKind::InsertReturnList => Op::InsertReturnList { target },
            OpKind::InsertReturnTuple => Op::InsertReturnTuple { target },
            OpKind::Rename => {
                let new_name = if ctx.names.is_empty() {
                    "_var0".to_string()
                } else {
                    rng.choose(ctx.names).clone()
                };
                Op::Rename { target, new_name }
            }
            OpKind::ReplaceCardumen => {
                let replacement = match ctx.cardumen {
                    Some(engine) => engine.propose(target, ctx.statements, rng),
                    None => ctx.statements.get(target).cloned().unwrap_or_else(|| {
                        crate::lang::AstNode::new(crate::lang::NodeKind::Literal("0".into()), 0, vec![])
                    }),
                };
                Op::ReplaceCardumen { target, replacement }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::random::RepairRandomGenerator;

    fn ctx(statements: &StatementTable, universe: &[Sid], names: &[String]) -> BuildContext<'_> {
        BuildContext { universe, names, statements, cardumen: None }
    }

    #[test]
    fn construction_resolves_randomness_so_equality_is_structural() {
        let mut rng = RepairRandomGenerator::new(7);
        let statements = StatementTable::default();
        let c = ctx(&statements, &[1, 2, 3, 4], &[]);
        let a = Op::build(OpKind::ReplaceCompareOp, 3, &c, &mut rng);
        let b = a.clone();
        assert_eq!(a, b);
        assert_eq!(a.kind(), OpKind::ReplaceCompareOp);
    }

    #[test]
    fn delete_touches_only_its_target() {
        assert_eq!(Op::Delete { target: 5 }.touches(), vec![5]);
    }

    #[test]
    fn rename_draws_from_the_program_wide_name_universe() {
        let mut rng = RepairRandomGenerator::new(3);
        let statements = StatementTable::default();
        let names = vec!["a".to_string(), "b".to_string()];
        let c = ctx(&statements, &[], &names);
        let op = Op::build(OpKind::Rename, 0, &c, &mut rng);
        match op {
            Op::Rename { new_name, .. } => assert!(names.contains(&new_name)),
            _ => panic!("expected Op::Rename"),
        }
    }

    #[test]
    fn op_kind_name_round_trips_through_from_name() {
        for kind in ALL_KINDS {
            assert_eq!(OpKind::from_name(kind.name()), Some(*kind));
        }
    }
}
