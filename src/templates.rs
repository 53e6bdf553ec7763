//! Cardumen-style template-based repair (C10): extracts a statement as a
//! reusable template parameterized over the variable names it mentions,
//! then re-instantiates it with other names in scope, weighted by how
//! often that combination of names co-occurs elsewhere in the program.

use std::collections::{BTreeMap, BTreeSet};

use crate::lang::{AstNode, NodeKind};
use crate::random::RandomGenerator;
use crate::stmt::{Sid, StatementTable};

/// Which statements a template is allowed to be drawn from relative to
/// the repair site, mirroring Cardumen's locality classes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Locality {
    /// Same function.
    Local,
    /// Same file.
    Folder,
    /// Anywhere in the indexed source.
    Global,
}

/// A statement captured as a template: its variable names are
/// placeholders that [`TemplateInstanceGenerator`] fills back in.
#[derive(Debug, Clone)]
pub struct Template {
    pub source_sid: Sid,
    pub statement: AstNode,
    pub vars: BTreeSet<String>,
}

impl Template {
    pub fn extract(sid: Sid, statement: &AstNode) -> Template {
        let mut vars = BTreeSet::new();
        statement.collect_names(&mut vars);
        Template { source_sid: sid, statement: statement.clone(), vars }
    }
}

/// A multiset of names a template instance would be parameterized with.
/// Two instances built from the same bag of names (regardless of which
/// placeholder got which name) share one probability entry.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct NameMultiset(pub Vec<String>);

impl NameMultiset {
    fn from_iter(names: impl IntoIterator<Item = String>) -> Self {
        let mut v: Vec<String> = names.into_iter().collect();
        v.sort();
        NameMultiset(v)
    }
}

/// An instantiated template: the original placeholders mapped to a
/// concrete choice of names, plus the resulting statement.
#[derive(Debug, Clone)]
pub struct TemplateInstance {
    pub mapping: BTreeMap<String, String>,
    pub rendered: AstNode,
    pub combination: NameMultiset,
}

/// Enumerates every way of filling a template's placeholders from a pool
/// of visible names (the Cartesian product of `vars` choices).
pub struct TemplateInstanceGenerator<'a> {
    pub template: &'a Template,
}

impl<'a> TemplateInstanceGenerator<'a> {
    pub fn construct_all_combinations(&self, visible_names: &[String]) -> Vec<TemplateInstance> {
        let placeholders: Vec<String> = self.template.vars.iter().cloned().collect();
        if placeholders.is_empty() || visible_names.is_empty() {
            return Vec::new();
        }
        let mut combos: Vec<Vec<String>> = vec![Vec::new()];
        for _ in 0..placeholders.len() {
            let mut next = Vec::with_capacity(combos.len() * visible_names.len());
            for combo in &combos {
                for name in visible_names {
                    let mut extended = combo.clone();
                    extended.push(name.clone());
                    next.push(extended);
                }
            }
            combos = next;
        }

        combos
            .into_iter()
            .map(|choice| {
                let mapping: BTreeMap<String, String> =
                    placeholders.iter().cloned().zip(choice.iter().cloned()).collect();
                let rendered = substitute_names(&self.template.statement, &mapping);
                let combination = NameMultiset::from_iter(choice);
                TemplateInstance { mapping, rendered, combination }
            })
            .collect()
    }
}

fn substitute_names(node: &AstNode, mapping: &BTreeMap<String, String>) -> AstNode {
    match node.kind() {
        NodeKind::Name(n) => {
            let new_name = mapping.get(n).cloned().unwrap_or_else(|| n.clone());
            node.with_kind(NodeKind::Name(new_name))
        }
        NodeKind::Assign { target } => {
            let new_target = mapping.get(target).cloned().unwrap_or_else(|| target.clone());
            let children: Vec<AstNode> =
                node.children().iter().map(|c| substitute_names(c, mapping)).collect();
            AstNode::new(NodeKind::Assign { target: new_target }, node.line(), children)
        }
        _ => {
            let children: Vec<AstNode> =
                node.children().iter().map(|c| substitute_names(c, mapping)).collect();
            node.with_children(children)
        }
    }
}

/// `p(names) = (# statements whose exact variable set equals `names`) /
/// (# statements with the same arity as `names`)`.
///
/// Scope is not yet taken into account: every statement in the index
/// contributes to the denominator regardless of whether its variables
/// would actually be visible at the instantiation site. Narrowing the
/// model to in-scope statements only is follow-up work.
pub struct ProbabilisticModel {
    probabilities: BTreeMap<NameMultiset, f64>,
}

impl ProbabilisticModel {
    pub fn build(statements: &StatementTable) -> ProbabilisticModel {
        let mut per_statement_vars: Vec<BTreeSet<String>> = Vec::new();
        for (_, node) in statements.iter() {
            let mut vars = BTreeSet::new();
            node.collect_names(&mut vars);
            per_statement_vars.push(vars);
        }

        let mut probabilities = BTreeMap::new();
        for vars in &per_statement_vars {
            for arity in 1..=vars.len() {
                for combo in combinations_with_replacement(vars, arity) {
                    let key = NameMultiset::from_iter(combo.clone());
                    if probabilities.contains_key(&key) {
                        continue;
                    }
                    let same_combination = per_statement_vars
                        .iter()
                        .filter(|v| v.len() == key.0.len() && v.iter().cloned().collect::<BTreeSet<_>>() == combo.iter().cloned().collect::<BTreeSet<_>>())
                        .count();
                    let same_arity = per_statement_vars.iter().filter(|v| v.len() == key.0.len()).count();
                    let probability = if same_arity == 0 { 0.0 } else { same_combination as f64 / same_arity as f64 };
                    probabilities.insert(key, probability);
                }
            }
        }
        ProbabilisticModel { probabilities }
    }

    pub fn probability(&self, combination: &NameMultiset) -> f64 {
        self.probabilities.get(combination).copied().unwrap_or(0.0)
    }

    /// Picks one instance weighted by its combination's probability,
    /// falling back to a uniform draw if every candidate scored zero.
    pub fn select<'a>(
        &self,
        instances: &'a [TemplateInstance],
        rng: &mut dyn RandomGenerator,
    ) -> Option<&'a TemplateInstance> {
        if instances.is_empty() {
            return None;
        }
        let weights: Vec<f64> = instances.iter().map(|i| self.probability(&i.combination)).collect();
        let total: f64 = weights.iter().sum();
        if total <= 0.0 {
            return Some(rng.choose(instances));
        }
        let mut target = rng.gen_float() * total;
        for (instance, weight) in instances.iter().zip(weights.iter()) {
            target -= weight;
            if target <= 0.0 {
                return Some(instance);
            }
        }
        instances.last()
    }
}

fn combinations_with_replacement(items: &BTreeSet<String>, k: usize) -> Vec<Vec<String>> {
    let items: Vec<String> = items.iter().cloned().collect();
    if k == 0 || items.is_empty() {
        return vec![Vec::new()];
    }
    let mut out = Vec::new();
    fn rec(items: &[String], k: usize, start: usize, current: &mut Vec<String>, out: &mut Vec<Vec<String>>) {
        if current.len() == k {
            out.push(current.clone());
            return;
        }
        for i in start..items.len() {
            current.push(items[i].clone());
            rec(items, k, i, current, out);
            current.pop();
        }
    }
    rec(&items, k, 0, &mut Vec::new(), &mut out);
    out
}

/// Ties the template corpus and its probability model together into the
/// single entry point `Op::build` calls for `OpKind::ReplaceCardumen`.
/// Built once per repair run (extraction and the probability model are
/// both whole-program passes) and then consulted per mutation.
pub struct CardumenEngine {
    templates: Vec<Template>,
    model: ProbabilisticModel,
    names: Vec<String>,
}

impl CardumenEngine {
    pub fn build(statements: &StatementTable) -> CardumenEngine {
        let templates = statements.iter().map(|(sid, node)| Template::extract(sid, node)).collect();
        let model = ProbabilisticModel::build(statements);
        let names = statements.all_names();
        CardumenEngine { templates, model, names }
    }

    /// Proposes a replacement for `target`: picks a template other than
    /// `target`'s own statement, instantiates it against the program's
    /// visible names (scope is not yet taken into account, see
    /// `ProbabilisticModel`'s doc comment), and selects an instance
    /// weighted by the probability model. Falls back to `target`'s own
    /// unmodified statement if no template yields any instance.
    pub fn propose(&self, target: Sid, statements: &StatementTable, rng: &mut dyn RandomGenerator) -> AstNode {
        let mut order: Vec<usize> = (0..self.templates.len()).collect();
        rng.shuffle(&mut order);
        for idx in order {
            let template = &self.templates[idx];
            if template.source_sid == target {
                continue;
            }
            let generator = TemplateInstanceGenerator { template };
            let instances = generator.construct_all_combinations(&self.names);
            if let Some(instance) = self.model.select(&instances, rng) {
                return instance.rendered.clone();
            }
        }
        statements.get(target).cloned().unwrap_or_else(|| AstNode::new(NodeKind::Literal("0".into()), 0, vec![]))
    }
}

/// Scope-stack construction: opens a new scope at function/class
/// boundaries, records the stack of currently-open scopes for every
/// statement beneath it.
#[derive(Debug, Default, Clone)]
pub struct Scope {
    pub vars: BTreeSet<String>,
}

pub struct ScopeStack;

impl ScopeStack {
    /// Returns, for every statement `sid`, every name visible to it (the
    /// union of all open scopes' names at that point in the traversal).
    pub fn build(root: &AstNode, statements: &StatementTable) -> BTreeMap<Sid, BTreeSet<String>> {
        let mut result = BTreeMap::new();
        let mut stack: Vec<Scope> = vec![Scope::default()];
        visit(root, statements, &mut stack, &mut result);
        result
    }
}

fn opens_scope(node: &AstNode) -> bool {
    // In `mini`, functions aren't modeled yet, so only the program root
    // opens a scope; this still gives every statement a well-defined
    // "names visible here" set.
    matches!(node.kind(), NodeKind::Block)
}

fn visit(
    node: &AstNode,
    statements: &StatementTable,
    stack: &mut Vec<Scope>,
    result: &mut BTreeMap<Sid, BTreeSet<String>>,
) {
    if opens_scope(node) {
        stack.push(Scope::default());
    }
    if let NodeKind::Name(n) | NodeKind::Assign { target: n } = node.kind() {
        stack.last_mut().unwrap().vars.insert(n.clone());
    }
    if node.is_statement() {
        for (sid, candidate) in statements.iter() {
            if std::ptr::eq(candidate.0.as_ref(), node.0.as_ref()) {
                let visible: BTreeSet<String> = stack.iter().flat_map(|s| s.vars.iter().cloned()).collect();
                result.insert(sid, visible);
            }
        }
    }
    for child in node.children() {
        visit(child, statements, stack, result);
    }
    if opens_scope(node) {
        stack.pop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lang::mini::MiniParser;
    use crate::lang::Parser;

    #[test]
    fn template_extraction_collects_referenced_names() {
        let parser = MiniParser;
        let tree = parser.parse("z = x + y\n").unwrap();
        let stmt = &tree.children()[0];
        let template = Template::extract(0, stmt);
        assert_eq!(template.vars, ["x", "y", "z"].iter().map(|s| s.to_string()).collect());
    }

    #[test]
    fn instantiation_produces_cartesian_product_over_visible_names() {
        let parser = MiniParser;
        let tree = parser.parse("z = x + y\n").unwrap();
        let stmt = &tree.children()[0];
        let template = Template::extract(0, stmt);
        let generator = TemplateInstanceGenerator { template: &template };
        let names = vec!["a".to_string(), "b".to_string()];
        let instances = generator.construct_all_combinations(&names);
        // 3 placeholders (x, y, z), 2 candidate names -> 2^3 instances
        assert_eq!(instances.len(), 8);
    }

    #[test]
    fn engine_proposes_a_real_instantiation_drawn_from_other_statements() {
        use crate::random::RepairRandomGenerator;
        use crate::stmt::StatementIndex;
        use std::io::Write;

        let mut f = tempfile::Builder::new().suffix(".mini").tempfile().unwrap();
        f.write_all(b"z = x + y\na = b - c\n").unwrap();
        let index = StatementIndex::index(f.path(), &MiniParser, &[], false).unwrap();
        let engine = CardumenEngine::build(&index.statements);
        let mut rng = RepairRandomGenerator::new(1);
        let replacement = engine.propose(0, &index.statements, &mut rng);
        // the proposal is a real statement shape, not the hardcoded literal stub
        assert!(!matches!(replacement.kind(), NodeKind::Literal(_)));
    }
}
