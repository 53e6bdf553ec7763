//! The mutation applier: folds an ordered list of [`Op`]s into an overlay
//! map `M: Sid -> Option<AstNode>` over the immutable statement table `S`.
//!
//! Reads always resolve as `M.get(sid).or(S[sid])` (an op that reads a
//! statement another, earlier op already touched sees that op's result).
//! Writes always go into `M`, never into `S`. Application order is
//! therefore observable: later operators in the list see earlier
//! operators' edits. `None` in `M` means "this statement is gone".

use std::collections::HashMap;

use crate::lang::{AstNode, NodeKind};
use crate::operators::Op;
use crate::stmt::{Sid, StatementTable};

/// The result of folding a candidate's operator list: which statements
/// were touched and what they now render as (or `None` if deleted).
pub type Overlay = HashMap<Sid, Option<AstNode>>;

pub struct Applier;

impl Applier {
    /// Applies `ops` to `statements` in order and returns the resulting
    /// overlay. Never touches `statements` itself.
    pub fn apply(statements: &StatementTable, ops: &[Op]) -> Overlay {
        let mut overlay: Overlay = HashMap::new();
        for op in ops {
            apply_one(statements, &mut overlay, op);
        }
        overlay
    }

    /// Renders a whole file by applying `overlay` to every statement sid
    /// known to belong to it, in the order given by `sids_in_order`,
    /// dropping deleted ones, via the supplied unparser.
    pub fn render_file(
        statements: &StatementTable,
        overlay: &Overlay,
        sids_in_order: &[Sid],
        unparser: &dyn crate::lang::Unparser,
    ) -> String {
        sids_in_order
            .iter()
            .filter_map(|sid| resolve(statements, overlay, *sid))
            .map(|node| unparser.unparse(&node))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

fn resolve(statements: &StatementTable, overlay: &Overlay, sid: Sid) -> Option<AstNode> {
    match overlay.get(&sid) {
        Some(entry) => entry.clone(),
        None => statements.get(sid).cloned(),
    }
}

fn seq(nodes: Vec<AstNode>) -> AstNode {
    let line = nodes.first().map(|n| n.line()).unwrap_or(0);
    AstNode::new(NodeKind::Seq, line, nodes)
}

fn literal(line: u32, text: &str) -> AstNode {
    AstNode::new(NodeKind::Literal(text.to_string()), line, vec![])
}

fn apply_one(statements: &StatementTable, overlay: &mut Overlay, op: &Op) {
    match op {
        Op::Delete { target } => {
            overlay.insert(*target, None);
        }
        Op::InsertBefore { target, source } => {
            if let (Some(t), Some(s)) =
                (resolve(statements, overlay, *target), resolve(statements, overlay, *source))
            {
                overlay.insert(*target, Some(seq(vec![s, t])));
            }
        }
        Op::InsertAfter { target, source } => {
            if let (Some(t), Some(s)) =
                (resolve(statements, overlay, *target), resolve(statements, overlay, *source))
            {
                overlay.insert(*target, Some(seq(vec![t, s])));
            }
        }
        Op::InsertBoth { target, source } => {
            if let (Some(t), Some(s)) =
                (resolve(statements, overlay, *target), resolve(statements, overlay, *source))
            {
                overlay.insert(*target, Some(seq(vec![s.clone(), t, s])));
            }
        }
        Op::Replace { target, source } => {
            if let Some(s) = resolve(statements, overlay, *source) {
                overlay.insert(*target, Some(s));
            }
        }
        Op::MoveBefore { target, source } => {
            if let (Some(t), Some(s)) =
                (resolve(statements, overlay, *target), resolve(statements, overlay, *source))
            {
                overlay.insert(*target, Some(seq(vec![s, t])));
                if source != target {
                    overlay.insert(*source, None);
                }
            }
        }
        Op::MoveAfter { target, source } => {
            if let (Some(t), Some(s)) =
                (resolve(statements, overlay, *target), resolve(statements, overlay, *source))
            {
                overlay.insert(*target, Some(seq(vec![t, s])));
                if source != target {
                    overlay.insert(*source, None);
                }
            }
        }
        Op::MoveBoth { target, source } => {
            if let (Some(t), Some(s)) =
                (resolve(statements, overlay, *target), resolve(statements, overlay, *source))
            {
                overlay.insert(*target, Some(seq(vec![s.clone(), t, s])));
                if source != target {
                    overlay.insert(*source, None);
                }
            }
        }
        Op::Swap { left, right } => {
            let left_val = resolve(statements, overlay, *left);
            let right_val = resolve(statements, overlay, *right);
            if let (Some(l), Some(r)) = (left_val, right_val) {
                overlay.insert(*left, Some(r));
                overlay.insert(*right, Some(l));
            }
        }
        Op::Copy { target, source } => {
            if let (Some(t), Some(s)) =
                (resolve(statements, overlay, *target), resolve(statements, overlay, *source))
            {
                overlay.insert(*target, Some(seq(vec![t, s])));
            }
        }
        Op::ReplaceBinaryOp { target, new_op } => {
            rewrite_target(statements, overlay, *target, |node| {
                replace_first(node, &|k| matches!(k, NodeKind::BinaryExpr { .. }), |_| {
                    NodeKind::BinaryExpr { op: new_op.clone() }
                })
            });
        }
        Op::ReplaceCompareOp { target, new_op } => {
            rewrite_target(statements, overlay, *target, |node| {
                replace_first(node, &|k| matches!(k, NodeKind::CompareExpr { .. }), |_| {
                    NodeKind::CompareExpr { op: new_op.clone() }
                })
            });
        }
        Op::ReplaceUnaryOp { target, new_op } => {
            rewrite_target(statements, overlay, *target, |node| {
                replace_first(node, &|k| matches!(k, NodeKind::UnaryExpr { .. }), |_| {
                    NodeKind::UnaryExpr { op: new_op.clone() }
                })
            });
        }
        Op::ReplaceBoolOp { target, new_op } => {
            rewrite_target(statements, overlay, *target, |node| {
                replace_first(node, &|k| matches!(k, NodeKind::BoolExpr { .. }), |_| {
                    NodeKind::BoolExpr { op: new_op.clone() }
                })
            });
        }
        Op::ModifyIfToTrue { target } => {
            rewrite_target(statements, overlay, *target, |node| set_if_condition(node, "1"));
        }
        Op::ModifyIfToFalse { target } => {
            rewrite_target(statements, overlay, *target, |node| set_if_condition(node, "0"));
        }
        Op::InsertReturn0 { target } => append_return(statements, overlay, *target, "0"),
        Op::InsertReturnNone { target } => append_return(statements, overlay, *target, "None"),
        Op::InsertReturnString { target } => append_return(statements, overlay, *target, "\"\""),
        Op::InsertReturnList { target } => append_return(statements, overlay, *target, "[]"),
        Op::InsertReturnTuple { target } => append_return(statements, overlay, *target, "()"),
        Op::Rename { target, new_name } => {
            rewrite_target(statements, overlay, *target, |node| rename_all(node, new_name));
        }
        Op::ReplaceCardumen { target, replacement } => {
            overlay.insert(*target, Some(replacement.clone()));
        }
    }
}

fn rewrite_target(
    statements: &StatementTable,
    overlay: &mut Overlay,
    target: Sid,
    f: impl FnOnce(&AstNode) -> AstNode,
) {
    if let Some(node) = resolve(statements, overlay, target) {
        overlay.insert(target, Some(f(&node)));
    }
}

fn append_return(statements: &StatementTable, overlay: &mut Overlay, target: Sid, sentinel: &str) {
    if let Some(node) = resolve(statements, overlay, target) {
        let ret = AstNode::new(NodeKind::Return, node.line(), vec![literal(node.line(), sentinel)]);
        overlay.insert(target, Some(seq(vec![node, ret])));
    }
}

/// Depth-first search for the first node whose kind matches `pred`,
/// rewriting its kind via `make_kind` and leaving every other node (and
/// the rest of the tree) untouched. Returns a new tree sharing structure
/// with the original except along the path to the match.
fn replace_first(
    node: &AstNode,
    pred: &dyn Fn(&NodeKind) -> bool,
    make_kind: impl Fn(&NodeKind) -> NodeKind + Copy,
) -> AstNode {
    replace_first_inner(node, pred, make_kind).0
}

fn replace_first_inner(
    node: &AstNode,
    pred: &dyn Fn(&NodeKind) -> bool,
    make_kind: impl Fn(&NodeKind) -> NodeKind + Copy,
) -> (AstNode, bool) {
    if pred(node.kind()) {
        return (node.with_kind(make_kind(node.kind())), true);
    }
    let mut any_replaced = false;
    let children: Vec<AstNode> = node
        .children()
        .iter()
        .map(|child| {
            if any_replaced {
                child.clone()
            } else {
                let (new_child, replaced) = replace_first_inner(child, pred, make_kind);
                any_replaced |= replaced;
                new_child
            }
        })
        .collect();
    if any_replaced {
        (node.with_children(children), true)
    } else {
        (node.clone(), false)
    }
}

fn set_if_condition(node: &AstNode, sentinel: &str) -> AstNode {
    if !matches!(node.kind(), NodeKind::If) {
        return node.clone();
    }
    let mut children = node.children().to_vec();
    if !children.is_empty() {
        children[0] = literal(node.line(), sentinel);
    }
    node.with_children(children)
}

fn rename_all(node: &AstNode, new_name: &str) -> AstNode {
    match node.kind() {
        NodeKind::Name(_) => node.with_kind(NodeKind::Name(new_name.to_string())),
        NodeKind::Assign { .. } => {
            let renamed_children: Vec<AstNode> =
                node.children().iter().map(|c| rename_all(c, new_name)).collect();
            AstNode::new(NodeKind::Assign { target: new_name.to_string() }, node.line(), renamed_children)
        }
        _ => {
            let children: Vec<AstNode> = node.children().iter().map(|c| rename_all(c, new_name)).collect();
            node.with_children(children)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lang::mini::MiniParser;
    use crate::lang::Parser;
    use crate::stmt::StatementIndex;
    use std::io::Write;

    fn index(contents: &str) -> StatementIndex {
        let mut f = tempfile::Builder::new().suffix(".mini").tempfile().unwrap();
        f.write_all(contents.as_bytes()).unwrap();
        StatementIndex::index(f.path(), &MiniParser, &[], false).unwrap()
    }

    #[test]
    fn delete_then_insert_before_same_target_uses_overlay_not_original() {
        let idx = index("x = 1\ny = 2\n");
        let ops = vec![Op::Delete { target: 0 }, Op::InsertBefore { target: 0, source: 1 }];
        let overlay = Applier::apply(&idx.statements, &ops);
        // the InsertBefore op reads the post-delete value of target (None),
        // so it must have no effect: overlay stays None for sid 0.
        assert_eq!(overlay.get(&0).unwrap(), &None);
    }

    #[test]
    fn replace_compare_op_rewrites_only_the_operator_symbol() {
        let idx = index("if x < 1 {\n    y = 2\n}\n");
        let if_sid = 0u32;
        let ops = vec![Op::ReplaceCompareOp { target: if_sid, new_op: ">=".to_string() }];
        let overlay = Applier::apply(&idx.statements, &ops);
        let rendered = overlay.get(&if_sid).unwrap().clone().unwrap();
        let rendered_text = MiniParser.unparse(&rendered);
        assert!(rendered_text.contains(">="));
    }

    #[test]
    fn swap_uses_pre_swap_snapshots_for_both_writes() {
        let idx = index("x = 1\ny = 2\n");
        let ops = vec![Op::Swap { left: 0, right: 1 }];
        let overlay = Applier::apply(&idx.statements, &ops);
        let left_text = MiniParser.unparse(&overlay[&0].clone().unwrap());
        let right_text = MiniParser.unparse(&overlay[&1].clone().unwrap());
        assert_eq!(left_text, "y = 2");
        assert_eq!(right_text, "x = 1");
    }
}
