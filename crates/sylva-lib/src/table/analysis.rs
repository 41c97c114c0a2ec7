//! Structural analysis of the lowered grammar.
//!
//! Computes FIRST sets and nullability by fixpoint, finds left-recursion
//! groups as strongly connected components of the left-corner graph, and
//! rewrites left-recursive alternatives into head/tail continuations for
//! precedence climbing. Grammars the engine cannot execute are rejected
//! here.

use super::token_set::TokenSet;
use super::{
    Assoc, BaseAlt, BaseShape, Continuation, Expr, ExprId, FieldId, GrammarError, GrammarTable,
    Group, RuleId,
};

pub(crate) fn analyze(table: &mut GrammarTable) -> Result<(), GrammarError> {
    compute_first(table);
    build_groups(table);
    build_alternatives(table)?;
    validate_groups(table)?;
    check_competing_alternatives(table)?;
    build_sync_set(table);
    Ok(())
}

/// FIRST and nullability, iterated to fixpoint. Left recursion makes a
/// single bottom-up pass insufficient; the sets only grow, so iteration
/// terminates.
fn compute_first(table: &mut GrammarTable) {
    loop {
        let mut changed = false;
        for index in 0..table.exprs.len() {
            let id = ExprId(index as u32);
            let (first, nullable) = eval_first(table, id);
            if nullable != table.nullable[index] {
                table.nullable[index] = nullable;
                changed = true;
            }
            if first != table.first[index] {
                table.first[index] = first;
                changed = true;
            }
        }
        if !changed {
            break;
        }
    }
}

fn eval_first(table: &GrammarTable, id: ExprId) -> (TokenSet, bool) {
    let n = table.terminals.len();
    match table.expr(id) {
        Expr::Empty => (TokenSet::empty(n), true),
        Expr::Terminal { terminal, .. } => {
            let mut set = TokenSet::empty(n);
            set.insert(*terminal);
            (set, false)
        }
        Expr::Rule(rule) => {
            let body = table.rule(*rule).body;
            (table.first(body).clone(), table.is_nullable(body))
        }
        Expr::Seq(items) => {
            let mut set = TokenSet::empty(n);
            let mut nullable = true;
            for &item in items {
                set.union_with(table.first(item));
                if !table.is_nullable(item) {
                    nullable = false;
                    break;
                }
            }
            (set, nullable)
        }
        Expr::Choice(items) => {
            let mut set = TokenSet::empty(n);
            let mut nullable = false;
            for &item in items {
                set.union_with(table.first(item));
                nullable |= table.is_nullable(item);
            }
            (set, nullable)
        }
        Expr::Repeat { content, min_once } => (
            table.first(*content).clone(),
            !min_once || table.is_nullable(*content),
        ),
        Expr::Field { content, .. }
        | Expr::Prec { content, .. }
        | Expr::Alias { content, .. } => {
            (table.first(*content).clone(), table.is_nullable(*content))
        }
    }
}

/// Rules reachable at the left edge of an expression, through nullable
/// prefixes.
fn left_corner_rules(table: &GrammarTable, id: ExprId, out: &mut Vec<RuleId>) {
    match table.expr(id) {
        Expr::Empty | Expr::Terminal { .. } => {}
        Expr::Rule(rule) => out.push(*rule),
        Expr::Seq(items) => {
            for &item in items {
                left_corner_rules(table, item, out);
                if !table.is_nullable(item) {
                    break;
                }
            }
        }
        Expr::Choice(items) => {
            for &item in items {
                left_corner_rules(table, item, out);
            }
        }
        Expr::Repeat { content, .. }
        | Expr::Field { content, .. }
        | Expr::Prec { content, .. }
        | Expr::Alias { content, .. } => left_corner_rules(table, *content, out),
    }
}

/// Tarjan's strongly connected components over the left-corner graph.
/// A component is a left-recursion group when it has more than one member
/// or a self edge.
fn build_groups(table: &mut GrammarTable) {
    let rule_count = table.rules.len();
    let mut edges: Vec<Vec<usize>> = Vec::with_capacity(rule_count);
    for rule in &table.rules {
        let mut corners = Vec::new();
        left_corner_rules(table, rule.body, &mut corners);
        corners.sort();
        corners.dedup();
        edges.push(corners.iter().map(|r| r.index()).collect());
    }

    let mut scc = Tarjan {
        edges: &edges,
        index: vec![None; rule_count],
        low: vec![0; rule_count],
        on_stack: vec![false; rule_count],
        stack: Vec::new(),
        next: 0,
        components: Vec::new(),
    };
    for node in 0..rule_count {
        if scc.index[node].is_none() {
            scc.visit(node);
        }
    }

    let mut groups = Vec::new();
    for mut component in scc.components {
        let recursive = component.len() > 1
            || edges[component[0]].contains(&component[0]);
        if !recursive {
            continue;
        }
        component.sort();
        let group_index = groups.len() as u16;
        for &member in &component {
            table.rules[member].group = Some(group_index);
        }
        groups.push(Group {
            members: component.iter().map(|&m| RuleId(m as u16)).collect(),
            continuations: Vec::new(),
        });
    }
    table.groups = groups;
}

struct Tarjan<'e> {
    edges: &'e [Vec<usize>],
    index: Vec<Option<u32>>,
    low: Vec<u32>,
    on_stack: Vec<bool>,
    stack: Vec<usize>,
    next: u32,
    components: Vec<Vec<usize>>,
}

impl Tarjan<'_> {
    fn visit(&mut self, node: usize) {
        self.index[node] = Some(self.next);
        self.low[node] = self.next;
        self.next += 1;
        self.stack.push(node);
        self.on_stack[node] = true;

        for i in 0..self.edges[node].len() {
            let succ = self.edges[node][i];
            match self.index[succ] {
                None => {
                    self.visit(succ);
                    self.low[node] = self.low[node].min(self.low[succ]);
                }
                Some(succ_index) if self.on_stack[succ] => {
                    self.low[node] = self.low[node].min(succ_index);
                }
                Some(_) => {}
            }
        }

        if self.low[node] == self.index[node].expect("visited") {
            let mut component = Vec::new();
            loop {
                let member = self.stack.pop().expect("stack underflow");
                self.on_stack[member] = false;
                component.push(member);
                if member == node {
                    break;
                }
            }
            self.components.push(component);
        }
    }
}

/// Splits every rule body into top-level alternatives and classifies each
/// as a base alternative or, for group members with a leading same-group
/// reference, a climbing continuation.
fn build_alternatives(table: &mut GrammarTable) -> Result<(), GrammarError> {
    let rule_count = table.rules.len();
    let mut all_alts: Vec<Vec<BaseAlt>> = Vec::with_capacity(rule_count);
    let mut all_conts: Vec<Vec<Continuation>> =
        (0..table.groups.len()).map(|_| Vec::new()).collect();

    for index in 0..rule_count {
        let rule_id = RuleId(index as u16);
        let info = &table.rules[index];
        if info.token.is_some() {
            all_alts.push(vec![BaseAlt {
                expr: info.body,
                prec: None,
                shape: BaseShape::Normal { bp_target: None },
            }]);
            continue;
        }

        let mut raw = Vec::new();
        collect_alternatives(table, info.body, None, &mut raw);

        let group = info.group;
        let mut alts = Vec::new();
        for (expr, prec) in raw {
            match classify(table, rule_id, group, expr, prec) {
                Classified::Base(alt) => alts.push(alt),
                Classified::Continuation(cont) => {
                    all_conts[group.expect("continuation implies group") as usize].push(cont);
                }
            }
        }
        all_alts.push(alts);
    }

    for (index, alts) in all_alts.into_iter().enumerate() {
        table.rules[index].alts = alts;
    }
    // Climb candidates are tried tightest level first; declaration order
    // breaks ties.
    for (index, mut conts) in all_conts.into_iter().enumerate() {
        conts.sort_by(|a, b| b.level.cmp(&a.level));
        table.groups[index].continuations = conts;
    }
    Ok(())
}

fn collect_alternatives(
    table: &GrammarTable,
    id: ExprId,
    inherited: Option<(i32, Assoc)>,
    out: &mut Vec<(ExprId, Option<(i32, Assoc)>)>,
) {
    match table.expr(id) {
        Expr::Prec {
            level,
            assoc,
            content,
        } => collect_alternatives(table, *content, Some((*level, *assoc)), out),
        Expr::Choice(items) => {
            for &item in items {
                collect_alternatives(table, item, inherited, out);
            }
        }
        _ => out.push((id, inherited)),
    }
}

enum Classified {
    Base(BaseAlt),
    Continuation(Continuation),
}

fn classify(
    table: &GrammarTable,
    owner: RuleId,
    group: Option<u16>,
    expr: ExprId,
    prec: Option<(i32, Assoc)>,
) -> Classified {
    let in_group = |rule: RuleId| group.is_some() && table.rule(rule).group == group;

    let mut current = expr;
    loop {
        match table.expr(current) {
            // A bare reference to a same-group rule delegates, threading
            // the caller's binding power through.
            Expr::Rule(rule) if in_group(*rule) => {
                return Classified::Base(BaseAlt {
                    expr,
                    prec,
                    shape: BaseShape::Unit(*rule),
                });
            }
            Expr::Seq(items) if items.len() == 1 => current = items[0],
            Expr::Seq(items) => {
                if let Some(head_field) = group_head(table, items[0], &in_group) {
                    let tail: Vec<ExprId> = items[1..].to_vec();
                    let first = seq_first(table, &tail);
                    let explicit_prec = prec.is_some();
                    let (level, assoc) = prec.unwrap_or((0, Assoc::None));
                    let bp_target = tail
                        .last()
                        .and_then(|&last| trailing_group_ref(table, last));
                    return Classified::Continuation(Continuation {
                        owner,
                        level,
                        assoc,
                        explicit_prec,
                        head_field,
                        tail,
                        bp_target,
                        first,
                    });
                }
                break;
            }
            _ => break,
        }
    }

    let bp_target = if prec.is_some() {
        trailing_group_ref(table, expr)
    } else {
        None
    };
    Classified::Base(BaseAlt {
        expr,
        prec,
        shape: BaseShape::Normal { bp_target },
    })
}

/// The head of a continuation: a same-group reference, optionally wrapped
/// in a field. Returns the field, if any.
fn group_head(
    table: &GrammarTable,
    id: ExprId,
    in_group: &dyn Fn(RuleId) -> bool,
) -> Option<Option<FieldId>> {
    match table.expr(id) {
        Expr::Rule(rule) if in_group(*rule) => Some(None),
        Expr::Field { field, content } => match table.expr(*content) {
            Expr::Rule(rule) if in_group(*rule) => Some(Some(*field)),
            _ => None,
        },
        _ => None,
    }
}

/// The final consuming position of an expression, when it is a reference
/// into some left-recursion group.
fn trailing_group_ref(table: &GrammarTable, id: ExprId) -> Option<ExprId> {
    match table.expr(id) {
        Expr::Rule(rule) if table.rule(*rule).group.is_some() => Some(id),
        Expr::Seq(items) => items.last().and_then(|&last| trailing_group_ref(table, last)),
        Expr::Field { content, .. }
        | Expr::Prec { content, .. }
        | Expr::Alias { content, .. } => trailing_group_ref(table, *content),
        _ => None,
    }
}

fn seq_first(table: &GrammarTable, items: &[ExprId]) -> TokenSet {
    let mut set = TokenSet::empty(table.terminals.len());
    for &item in items {
        set.union_with(table.first(item));
        if !table.is_nullable(item) {
            break;
        }
    }
    set
}

fn validate_groups(table: &GrammarTable) -> Result<(), GrammarError> {
    for group in &table.groups {
        let in_group = |rule: RuleId| table.rule(rule).group == table.rule(group.members[0]).group;

        // Continuations must consume something after the head, or climbing
        // would loop forever.
        for cont in &group.continuations {
            let consumes = cont.tail.iter().any(|&item| !table.is_nullable(item));
            if !consumes {
                return Err(GrammarError::InvalidLeftRecursion {
                    rule: table.rule(cont.owner).name.clone(),
                });
            }
        }

        let mut any_base = false;
        let mut unit_edges: Vec<(usize, usize)> = Vec::new();
        for (member_index, &member) in group.members.iter().enumerate() {
            let info = table.rule(member);
            for alt in &info.alts {
                match &alt.shape {
                    BaseShape::Unit(target) => {
                        if let Some(pos) = group.members.iter().position(|m| m == target) {
                            unit_edges.push((member_index, pos));
                        }
                    }
                    BaseShape::Normal { .. } => {
                        any_base = true;
                        // Left recursion hidden behind a nullable prefix is
                        // not executable as a climb.
                        let mut corners = Vec::new();
                        left_corner_rules(table, alt.expr, &mut corners);
                        if corners.iter().any(|&corner| in_group(corner)) {
                            return Err(GrammarError::InvalidLeftRecursion {
                                rule: info.name.clone(),
                            });
                        }
                    }
                }
            }
        }

        if !any_base && unit_edges.is_empty() {
            return Err(GrammarError::InvalidLeftRecursion {
                rule: table.rule(group.members[0]).name.clone(),
            });
        }

        if let Some(cycle_member) = unit_cycle(group.members.len(), &unit_edges) {
            return Err(GrammarError::InvalidLeftRecursion {
                rule: table.rule(group.members[cycle_member]).name.clone(),
            });
        }
    }
    Ok(())
}

/// Detects a cycle among unit delegation edges; such a cycle would recurse
/// without consuming input.
fn unit_cycle(node_count: usize, edges: &[(usize, usize)]) -> Option<usize> {
    #[derive(Clone, Copy, PartialEq)]
    enum Color {
        White,
        Gray,
        Black,
    }

    fn dfs(node: usize, edges: &[(usize, usize)], colors: &mut [Color]) -> Option<usize> {
        colors[node] = Color::Gray;
        for &(from, to) in edges {
            if from != node {
                continue;
            }
            match colors[to] {
                Color::Gray => return Some(to),
                Color::White => {
                    if let Some(found) = dfs(to, edges, colors) {
                        return Some(found);
                    }
                }
                Color::Black => {}
            }
        }
        colors[node] = Color::Black;
        None
    }

    let mut colors = vec![Color::White; node_count];
    for node in 0..node_count {
        if colors[node] == Color::White {
            if let Some(found) = dfs(node, edges, &mut colors) {
                return Some(found);
            }
        }
    }
    None
}

/// Flags alternatives that can never be told apart: two plain rule
/// references with identical FIRST sets, no precedence, and no declared
/// conflict. Declaration order would silently shadow the second one.
fn check_competing_alternatives(table: &GrammarTable) -> Result<(), GrammarError> {
    for info in &table.rules {
        if info.alts.len() < 2 {
            continue;
        }
        for (i, a) in info.alts.iter().enumerate() {
            for b in &info.alts[i + 1..] {
                let (Some(rule_a), Some(rule_b)) =
                    (plain_rule_ref(table, a.expr), plain_rule_ref(table, b.expr))
                else {
                    continue;
                };
                if rule_a == rule_b || a.prec.is_some() || b.prec.is_some() {
                    continue;
                }
                // Same-group members compete through precedence climbing.
                if table.rule(rule_a).group.is_some()
                    && table.rule(rule_a).group == table.rule(rule_b).group
                {
                    continue;
                }
                let pair = (rule_a.0.min(rule_b.0), rule_a.0.max(rule_b.0));
                if table.conflicts.contains(&pair) {
                    continue;
                }
                let first_a = table.first(a.expr);
                if !first_a.is_empty() && first_a == table.first(b.expr) {
                    return Err(GrammarError::UnresolvedConflict {
                        left: table.rule(rule_a).name.clone(),
                        right: table.rule(rule_b).name.clone(),
                    });
                }
            }
        }
    }
    Ok(())
}

fn plain_rule_ref(table: &GrammarTable, id: ExprId) -> Option<RuleId> {
    match table.expr(id) {
        Expr::Rule(rule) => Some(*rule),
        Expr::Field { content, .. } | Expr::Alias { content, .. } => {
            plain_rule_ref(table, *content)
        }
        _ => None,
    }
}

/// Tokens error recovery may skip to: statement-ish closers plus whatever
/// starts an item of the entry rule's repetitions.
fn build_sync_set(table: &mut GrammarTable) {
    let mut set = TokenSet::empty(table.terminals.len());

    for (index, terminal) in table.terminals.iter().enumerate() {
        if let super::TerminalDef::Literal { text, .. } = &terminal.def {
            if text == ";" || text == "}" {
                set.insert(super::TerminalId(index as u16));
            }
        }
    }

    let mut stack = vec![table.rule(table.entry).body];
    while let Some(id) = stack.pop() {
        match table.expr(id) {
            Expr::Repeat { content, .. } => {
                set.union_with(table.first(*content));
                stack.push(*content);
            }
            Expr::Seq(items) | Expr::Choice(items) => stack.extend(items.iter().copied()),
            Expr::Field { content, .. }
            | Expr::Prec { content, .. }
            | Expr::Alias { content, .. } => stack.push(*content),
            Expr::Empty | Expr::Terminal { .. } | Expr::Rule(_) => {}
        }
    }

    table.sync_set = set;
}
