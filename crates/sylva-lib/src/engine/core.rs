//! The parser proper: expression matching, speculation, and recovery.
//!
//! Matching is committed by default; inside speculation (`speculation > 0`)
//! failures propagate as [`Matched::No`] and the caller rolls the event
//! buffer, offset, and diagnostics back to a savepoint. On committed paths
//! a failure never unwinds: it becomes a diagnostic plus, where input has
//! to be skipped, an error node.

use text_size::{TextRange, TextSize};

use crate::diagnostics::{DiagnosticKind, Diagnostics};
use crate::lexer::{ExternalScanner, Lexer};
use crate::table::{AliasId, Expr, ExprId, GrammarTable, TerminalId, TokenSet};
use crate::Error;

use super::event::{Event, OpenKind};
use super::ParseOptions;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Matched {
    Yes,
    No,
}

#[derive(Debug, Clone, Copy)]
pub(crate) struct Savepoint {
    pub(crate) events: usize,
    pub(crate) offset: usize,
    diags: usize,
}

pub(crate) struct Parser<'a> {
    pub(crate) table: &'a GrammarTable,
    pub(crate) lexer: Lexer<'a>,
    source: &'a str,
    pub(crate) offset: usize,
    pub(crate) events: Vec<Event>,
    pub(crate) diagnostics: Diagnostics,
    pub(crate) speculation: u32,
    exec_fuel: Option<u32>,
    recursion_left: u32,
    fatal: Option<Error>,
    /// Offset of the last committed diagnostic, to avoid error cascades
    /// at one position.
    last_report: Option<usize>,
    /// Furthest offset any rolled-back attempt reached. Alternative races
    /// reset this per attempt and use it to rank total failures.
    high_water: usize,
    /// Binding-power overrides for specific trailing operand expressions,
    /// pushed while the alternative that owns them is being matched.
    pub(crate) bp_overrides: Vec<(ExprId, i32)>,
}

impl<'a> Parser<'a> {
    pub(crate) fn new(
        source: &'a str,
        table: &'a GrammarTable,
        scanner: &'a dyn ExternalScanner,
        options: &ParseOptions,
    ) -> Self {
        Self {
            table,
            lexer: Lexer::new(source, table, scanner),
            source,
            offset: 0,
            events: Vec::new(),
            diagnostics: Diagnostics::new(),
            speculation: 0,
            exec_fuel: options.exec_fuel,
            recursion_left: options.recursion_fuel,
            fatal: None,
            last_report: None,
            high_water: 0,
            bp_overrides: Vec::new(),
        }
    }

    /// Parses the whole input against the entry rule, then sweeps any
    /// trailing input into an error node so the tree stays lossless.
    pub(crate) fn run(&mut self) -> crate::Result<()> {
        let entry = self.table.entry;
        let matched = self.parse_rule(entry, i32::MIN, None);

        if matched == Matched::No && self.fatal.is_none() {
            // The entry rule could not start at all. Emit its node anyway,
            // with everything inside an error child.
            let entry_name = self.table.rule(entry).name.clone();
            self.events.push(Event::Open {
                kind: OpenKind::Rule {
                    rule: entry,
                    alias: None,
                    lhs_field: None,
                },
            });
            if !self.lexer.at_end(self.offset) {
                if let Some(builder) = self.report(DiagnosticKind::ExpectedRule, self.here()) {
                    builder.message(format!("expected {entry_name}")).emit();
                }
                self.events.push(Event::Open {
                    kind: OpenKind::Error,
                });
                self.consume_to_end();
                self.events.push(Event::Close);
            }
            self.events.push(Event::Close);
        }

        self.collect_trivia();
        if !self.lexer.at_end(self.offset) && self.fatal.is_none() {
            let range = TextRange::new(
                TextSize::from(self.offset as u32),
                TextSize::from(self.source.len() as u32),
            );
            if let Some(builder) = self.report(DiagnosticKind::TrailingInput, range) {
                builder.emit();
            }
            self.events.push(Event::Open {
                kind: OpenKind::Error,
            });
            self.consume_to_end();
            self.events.push(Event::Close);
        }

        match self.fatal.clone() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    pub(crate) fn finish(self) -> (Vec<Event>, Diagnostics) {
        (self.events, self.diagnostics)
    }

    // --- control -------------------------------------------------------

    pub(crate) fn should_stop(&self) -> bool {
        self.fatal.is_some()
    }

    pub(crate) fn charge(&mut self) {
        if let Some(fuel) = &mut self.exec_fuel {
            if *fuel == 0 {
                self.fatal = Some(Error::ExecFuelExhausted);
            } else {
                *fuel -= 1;
            }
        }
    }

    pub(crate) fn enter(&mut self) -> bool {
        if self.recursion_left == 0 {
            self.fatal = Some(Error::RecursionLimitExceeded);
            return false;
        }
        self.recursion_left -= 1;
        true
    }

    pub(crate) fn leave(&mut self) {
        self.recursion_left += 1;
    }

    pub(crate) fn speculating(&self) -> bool {
        self.speculation > 0
    }

    pub(crate) fn savepoint(&self) -> Savepoint {
        Savepoint {
            events: self.events.len(),
            offset: self.offset,
            diags: self.diagnostics.mark(),
        }
    }

    pub(crate) fn rollback(&mut self, save: Savepoint) {
        self.high_water = self.high_water.max(self.offset);
        self.events.truncate(save.events);
        self.offset = save.offset;
        self.diagnostics.truncate(save.diags);
    }

    /// Arms the high-water mark for one speculative attempt; the matching
    /// [`Parser::attempt_progress`] reads how far it got.
    pub(crate) fn begin_attempt(&mut self, save: &Savepoint) {
        self.high_water = save.offset;
    }

    pub(crate) fn attempt_progress(&self) -> usize {
        self.high_water.max(self.offset)
    }

    // --- lexing --------------------------------------------------------

    /// Buffers any extras at the cursor into the event stream.
    pub(crate) fn collect_trivia(&mut self) {
        loop {
            if self.should_stop() {
                return;
            }
            match self.lexer.trivia_at(self.offset) {
                Some(token) if !token.is_empty() => {
                    self.charge();
                    self.events.push(Event::Token {
                        terminal: Some(token.terminal),
                        alias: None,
                        range: token.range(),
                        trivia: true,
                    });
                    self.offset = token.range().end().into();
                }
                _ => return,
            }
        }
    }

    /// Whether a token drawn from `first` starts at the cursor, after
    /// skipping trivia.
    pub(crate) fn lookahead_in(&mut self, first: &TokenSet) -> bool {
        self.collect_trivia();
        self.lexer.token_at(self.offset, first).is_some()
    }

    pub(crate) fn lookahead_starts(&mut self, expr: ExprId) -> bool {
        let table = self.table;
        self.lookahead_in(table.first(expr))
    }

    // --- matching ------------------------------------------------------

    pub(crate) fn match_expr(
        &mut self,
        id: ExprId,
        alias: Option<(AliasId, bool)>,
    ) -> Matched {
        if self.should_stop() {
            return Matched::No;
        }
        let table = self.table;
        match table.expr(id) {
            Expr::Empty => Matched::Yes,
            Expr::Terminal {
                terminal,
                immediate,
            } => self.match_terminal(*terminal, *immediate, alias),
            Expr::Rule(rule) => {
                let min_bp = self.bp_override_for(id).unwrap_or(i32::MIN);
                self.parse_rule(*rule, min_bp, alias)
            }
            Expr::Seq(items) => self.match_seq(items),
            Expr::Choice(items) => self.match_choice(items, alias),
            Expr::Repeat { content, min_once } => self.match_repeat(*content, *min_once),
            Expr::Field { field, content } => {
                self.events.push(Event::FieldStart { field: *field });
                let matched = self.match_expr(*content, alias);
                self.events.push(Event::FieldEnd);
                matched
            }
            Expr::Prec { content, .. } => self.match_expr(*content, alias),
            Expr::Alias {
                alias: name,
                named,
                content,
            } => self.match_expr(*content, Some((*name, *named))),
        }
    }

    pub(crate) fn match_terminal(
        &mut self,
        terminal: TerminalId,
        immediate: bool,
        alias: Option<(AliasId, bool)>,
    ) -> Matched {
        if !immediate {
            self.collect_trivia();
        }
        if self.should_stop() {
            return Matched::No;
        }

        let mut expected = TokenSet::empty(self.table.terminals.len());
        expected.insert(terminal);
        match self.lexer.token_at(self.offset, &expected) {
            Some(token) => {
                self.charge();
                self.events.push(Event::Token {
                    terminal: Some(token.terminal),
                    alias: alias.map(|(a, _)| a),
                    range: token.range(),
                    trivia: false,
                });
                self.offset = token.range().end().into();
                Matched::Yes
            }
            None => Matched::No,
        }
    }

    pub(crate) fn match_seq(&mut self, items: &[ExprId]) -> Matched {
        for (index, &item) in items.iter().enumerate() {
            if self.should_stop() {
                return Matched::No;
            }
            if self.match_expr(item, None) == Matched::Yes {
                continue;
            }
            if self.speculating() {
                return Matched::No;
            }

            // Committed failure: report, resynchronize, and try the
            // element once more if the sync point can start it.
            let advanced = self.recover(item, &items[index + 1..]);
            if advanced
                && !self.should_stop()
                && self.lookahead_starts(item)
                && self.match_expr(item, None) == Matched::Yes
            {
                continue;
            }
        }
        Matched::Yes
    }

    fn match_choice(&mut self, items: &[ExprId], alias: Option<(AliasId, bool)>) -> Matched {
        let table = self.table;
        let mut viable = Vec::new();
        let mut nullable_fallback = None;
        for &item in items {
            if table.is_nullable(item) && nullable_fallback.is_none() {
                nullable_fallback = Some(item);
            }
            if !table.first(item).is_empty() && self.lookahead_starts(item) {
                viable.push(item);
            }
        }

        match viable.len() {
            0 => match nullable_fallback {
                Some(item) => self.match_expr(item, alias),
                None => Matched::No,
            },
            1 => self.match_expr(viable[0], alias),
            _ => self.speculate_choice(&viable, nullable_fallback, alias),
        }
    }

    /// More than one branch can start here: try each in declaration order
    /// against a savepoint, then commit the winner's events verbatim.
    fn speculate_choice(
        &mut self,
        viable: &[ExprId],
        nullable_fallback: Option<ExprId>,
        alias: Option<(AliasId, bool)>,
    ) -> Matched {
        let table = self.table;
        let save = self.savepoint();
        let mut candidates: Vec<(usize, Vec<Event>, i32)> = Vec::new();
        let mut best_failed: Option<(usize, ExprId)> = None;

        for &item in viable {
            if self.should_stop() {
                break;
            }
            self.speculation += 1;
            self.begin_attempt(&save);
            let matched = self.match_expr(item, alias);
            self.speculation -= 1;
            if matched == Matched::Yes {
                candidates.push((
                    self.offset,
                    self.events[save.events..].to_vec(),
                    member_level(table, item),
                ));
            } else {
                let progress = self.attempt_progress();
                if best_failed.is_none_or(|(best, _)| progress > best) {
                    best_failed = Some((progress, item));
                }
            }
            self.rollback(save);
        }

        if candidates.is_empty() {
            if let Some(item) = nullable_fallback {
                return self.match_expr(item, alias);
            }
            // Every branch failed. Commit to the one that got furthest so
            // recovery runs inside it instead of failing the whole choice.
            if !self.speculating() && !self.should_stop() {
                if let Some((progress, item)) = best_failed {
                    if progress > save.offset {
                        return self.match_expr(item, alias);
                    }
                }
            }
            return Matched::No;
        }

        let winner = resolve_candidate(&candidates);
        let (end, events, _) = candidates.swap_remove(winner);
        self.events.extend(events);
        self.offset = end;
        Matched::Yes
    }

    pub(crate) fn match_repeat(&mut self, content: ExprId, min_once: bool) -> Matched {
        let mut count = 0usize;
        loop {
            if self.should_stop() {
                break;
            }
            if !self.lookahead_starts(content) {
                break;
            }
            let before = self.offset;
            if self.match_expr(content, None) == Matched::No {
                break;
            }
            if self.offset == before {
                break;
            }
            count += 1;
        }
        if min_once && count == 0 {
            Matched::No
        } else {
            Matched::Yes
        }
    }

    // --- recovery ------------------------------------------------------

    /// Handles a committed match failure of one sequence element. Reports
    /// a diagnostic, and if the element was not a lone terminal, skips
    /// input into an error node until something in the follow-up set (or
    /// the sync set) lexes. Returns whether input was consumed.
    fn recover(&mut self, failed: ExprId, rest: &[ExprId]) -> bool {
        let table = self.table;

        if let Some(terminal) = sole_terminal(table, failed) {
            let name = table.terminal_name(terminal);
            if let Some(builder) = self.report(DiagnosticKind::MissingToken, self.here()) {
                builder
                    .message(format!("missing {name}"))
                    .expected(name)
                    .emit();
            }
            return false;
        }

        let mut targets = table.first(failed).clone();
        for &item in rest {
            targets.union_with(table.first(item));
            if !table.is_nullable(item) {
                break;
            }
        }
        targets.union_with(&table.sync_set);

        // Point the diagnostic at the next real token, not at trivia.
        self.collect_trivia();
        let found = self
            .lexer
            .any_token_at(self.offset)
            .map(|t| table.terminal_name(t.terminal));
        let kind = if found.is_some() {
            DiagnosticKind::UnexpectedToken
        } else {
            DiagnosticKind::ExpectedRule
        };
        if let Some(builder) = self.report(kind, self.here()) {
            let mut builder = builder;
            for name in expected_names(table, failed) {
                builder = builder.expected(name);
            }
            if let Some(found) = found {
                builder = builder.found(found);
            }
            builder.emit();
        }

        let start = self.offset;
        self.events.push(Event::Open {
            kind: OpenKind::Error,
        });
        loop {
            if self.should_stop() {
                break;
            }
            self.collect_trivia();
            if self.lexer.at_end(self.offset) {
                break;
            }
            if self.lexer.token_at(self.offset, &targets).is_some() {
                break;
            }
            match self.lexer.any_token_at(self.offset) {
                Some(token) => {
                    self.charge();
                    self.events.push(Event::Token {
                        terminal: Some(token.terminal),
                        alias: None,
                        range: token.range(),
                        trivia: false,
                    });
                    self.offset = token.range().end().into();
                }
                None => self.skip_garbage_char(),
            }
        }
        self.events.push(Event::Close);
        self.offset > start
    }

    /// Consumes everything up to end of input; caller brackets this in an
    /// error node.
    pub(crate) fn consume_to_end(&mut self) {
        loop {
            if self.should_stop() {
                break;
            }
            self.collect_trivia();
            if self.lexer.at_end(self.offset) {
                break;
            }
            match self.lexer.any_token_at(self.offset) {
                Some(token) => {
                    self.charge();
                    self.events.push(Event::Token {
                        terminal: Some(token.terminal),
                        alias: None,
                        range: token.range(),
                        trivia: false,
                    });
                    self.offset = token.range().end().into();
                }
                None => self.skip_garbage_char(),
            }
        }
    }

    /// Advances over one char no terminal matches, recording it as an
    /// anonymous leaf so the tree still covers it.
    fn skip_garbage_char(&mut self) {
        let start = self.offset;
        let mut end = start + 1;
        while end < self.source.len() && !self.source.is_char_boundary(end) {
            end += 1;
        }
        self.charge();
        self.events.push(Event::Token {
            terminal: None,
            alias: None,
            range: TextRange::new(TextSize::from(start as u32), TextSize::from(end as u32)),
            trivia: false,
        });
        self.offset = end;
    }

    // --- diagnostics ---------------------------------------------------

    /// Starts a diagnostic unless one was already committed at this
    /// offset. Speculative paths never report.
    pub(crate) fn report(
        &mut self,
        kind: DiagnosticKind,
        range: TextRange,
    ) -> Option<crate::diagnostics::DiagnosticBuilder<'_>> {
        if self.speculating() {
            return None;
        }
        let at = range.start().into();
        if self.last_report == Some(at) {
            return None;
        }
        self.last_report = Some(at);
        Some(self.diagnostics.report(kind, range))
    }

    pub(crate) fn here(&self) -> TextRange {
        let at = TextSize::from(self.offset as u32);
        TextRange::new(at, at)
    }

    fn bp_override_for(&self, expr: ExprId) -> Option<i32> {
        self.bp_overrides
            .iter()
            .rev()
            .find(|(id, _)| *id == expr)
            .map(|&(_, bp)| bp)
    }
}

/// Precedence level of a choice branch, for resolving same-length
/// speculative matches.
fn member_level(table: &GrammarTable, id: ExprId) -> i32 {
    match table.expr(id) {
        Expr::Prec { level, .. } => *level,
        Expr::Field { content, .. } | Expr::Alias { content, .. } => member_level(table, *content),
        _ => 0,
    }
}

/// Longest match wins; same-span candidates are ranked by precedence
/// level, then by declaration order (the earliest stays).
pub(crate) fn resolve_candidate(candidates: &[(usize, Vec<Event>, i32)]) -> usize {
    let mut winner = 0;
    for (index, candidate) in candidates.iter().enumerate().skip(1) {
        let best = &candidates[winner];
        if candidate.0 > best.0 || (candidate.0 == best.0 && candidate.2 > best.2) {
            winner = index;
        }
    }
    winner
}

/// If the expression is just one terminal behind wrappers, that terminal.
fn sole_terminal(table: &GrammarTable, id: ExprId) -> Option<TerminalId> {
    match table.expr(id) {
        Expr::Terminal { terminal, .. } => Some(*terminal),
        Expr::Field { content, .. }
        | Expr::Prec { content, .. }
        | Expr::Alias { content, .. } => sole_terminal(table, *content),
        _ => None,
    }
}

/// Display names for what could begin an expression, capped to keep
/// diagnostics readable.
fn expected_names(table: &GrammarTable, id: ExprId) -> Vec<String> {
    const MAX_NAMES: usize = 6;
    let mut names: Vec<String> = table
        .first(id)
        .iter()
        .take(MAX_NAMES)
        .map(|terminal| table.terminal_name(terminal))
        .collect();
    if table.first(id).iter().count() > MAX_NAMES {
        names.push("...".to_string());
    }
    names
}
