//! The AST plugin boundary. The core of this crate (statement indexing,
//! the mutation algebra, fitness, search) is generic over any language that
//! implements [`Parser`]/[`Unparser`] and exposes statements as [`AstNode`].
//!
//! [`mini`] is the one concrete language shipped with the crate: a small
//! statement-structured scripting language, just expressive enough to
//! exercise every mutation operator and to run the crate's own tests
//! without depending on an external, unavailable parser for a real
//! language.

pub mod mini;

use std::path::Path;
use std::sync::Arc;

/// A node in a target-language AST. Cheap to clone (`Arc`-backed, not
/// `Rc`) since candidates and operators pass nodes around by value and
/// the parallel fitness engine shares them across worker threads.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AstNode(pub Arc<AstNodeData>);

#[derive(Debug, PartialEq, Eq, Hash)]
pub struct AstNodeData {
    pub kind: NodeKind,
    pub line: u32,
    pub children: Vec<AstNode>,
}

/// The tag used by the mutation operators to decide which operations are
/// applicable (e.g. `ReplaceBinaryOp` only targets `BinaryExpr`).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Assign { target: String },
    If,
    While,
    Return,
    ExprStmt,
    Call { callee: String },
    BinaryExpr { op: String },
    UnaryExpr { op: String },
    CompareExpr { op: String },
    BoolExpr { op: String },
    Name(String),
    Literal(String),
    Block,
    /// Synthetic wrapper used by the mutation applier to splice more than
    /// one statement where a single `Sid` used to be (insertion, move,
    /// copy). Never produced by a [`Parser`]; only by [`crate::apply`].
    Seq,
}

impl AstNode {
    pub fn new(kind: NodeKind, line: u32, children: Vec<AstNode>) -> Self {
        AstNode(Arc::new(AstNodeData { kind, line, children }))
    }

    pub fn line(&self) -> u32 {
        self.0.line
    }

    pub fn children(&self) -> &[AstNode] {
        &self.0.children
    }

    pub fn kind(&self) -> &NodeKind {
        &self.0.kind
    }

    /// Whether this node counts as a statement eligible for a `Sid`.
    pub fn is_statement(&self) -> bool {
        matches!(
            self.0.kind,
            NodeKind::Assign { .. }
                | NodeKind::If
                | NodeKind::While
                | NodeKind::Return
                | NodeKind::ExprStmt
        )
    }

    /// Whether this statement carries a nested body (used by `line_mode`).
    pub fn has_body(&self) -> bool {
        matches!(self.0.kind, NodeKind::If | NodeKind::While)
    }

    /// Collects every name referenced anywhere under this node, used by
    /// `Rename` and by the Cardumen template engine.
    pub fn collect_names(&self, out: &mut std::collections::BTreeSet<String>) {
        if let NodeKind::Name(n) = &self.0.kind {
            out.insert(n.clone());
        }
        if let NodeKind::Assign { target } = &self.0.kind {
            out.insert(target.clone());
        }
        for child in self.children() {
            child.collect_names(out);
        }
    }

    pub fn with_kind(&self, kind: NodeKind) -> AstNode {
        AstNode::new(kind, self.0.line, self.0.children.clone())
    }

    pub fn with_children(&self, children: Vec<AstNode>) -> AstNode {
        AstNode::new(self.0.kind.clone(), self.0.line, children)
    }
}

/// Parses source text into a tree of [`AstNode`]s.
pub trait Parser {
    /// Returns `true` if `path` looks like a file this parser should index
    /// (typically an extension check).
    fn recognizes(&self, path: &Path) -> bool;

    /// Parses `source` into a single root node (conventionally a `Block`
    /// whose children are the top-level statements).
    fn parse(&self, source: &str) -> Result<AstNode, String>;
}

/// Renders an [`AstNode`] back to source text. `Send + Sync` so a single
/// unparser can be shared across the parallel engine's worker threads.
pub trait Unparser: Send + Sync {
    fn unparse(&self, node: &AstNode) -> String;
}
