//! Rule-level parsing: node wrapping, alternative selection, and
//! precedence climbing over left-recursion groups.
//!
//! Left-recursive alternatives were rewritten at compile time into
//! continuations (head reference stripped, tail kept). A group rule parses
//! a base alternative first, then repeatedly applies the
//! strongest-binding continuation the lookahead admits, wrapping the
//! accumulated left operand each time. Binding powers double the declared
//! level so that associativity fits between adjacent levels: a
//! left-associative continuation refuses to climb into its own right
//! operand, a right-associative one accepts itself.

use crate::diagnostics::DiagnosticKind;
use crate::table::{AliasId, Assoc, BaseAlt, BaseShape, Continuation, RuleId};

use super::core::{resolve_candidate, Matched, Parser};
use super::event::{Event, OpenKind};

impl Parser<'_> {
    pub(crate) fn parse_rule(
        &mut self,
        rule: RuleId,
        min_bp: i32,
        alias: Option<(AliasId, bool)>,
    ) -> Matched {
        let table = self.table;
        let info = table.rule(rule);

        // Token rules are leaves; the terminal carries the rule's name.
        if info.token.is_some() {
            return self.match_expr(info.body, alias);
        }

        self.charge();
        if !self.enter() {
            return Matched::No;
        }
        let matched = match info.group {
            Some(group) => self.parse_in_group(rule, group as usize, min_bp, alias),
            None => self.parse_plain(rule, alias),
        };
        self.leave();
        matched
    }

    fn parse_plain(&mut self, rule: RuleId, alias: Option<(AliasId, bool)>) -> Matched {
        let save = self.savepoint();
        self.events.push(Event::Open {
            kind: OpenKind::Rule {
                rule,
                alias,
                lhs_field: None,
            },
        });
        if self.parse_alternatives(rule, i32::MIN) == Matched::No {
            self.rollback(save);
            return Matched::No;
        }
        self.events.push(Event::Close);
        Matched::Yes
    }

    fn parse_in_group(
        &mut self,
        rule: RuleId,
        group_index: usize,
        min_bp: i32,
        alias: Option<(AliasId, bool)>,
    ) -> Matched {
        let table = self.table;
        let save = self.savepoint();
        let checkpoint = self.events.len();

        self.events.push(Event::Open {
            kind: OpenKind::Rule {
                rule,
                alias,
                lhs_field: None,
            },
        });
        if self.parse_alternatives(rule, min_bp) == Matched::No {
            self.rollback(save);
            return Matched::No;
        }
        self.events.push(Event::Close);

        // Climb: continuations are ordered tightest level first, so the
        // first one that fits the lookahead and the binding power floor is
        // the one to apply.
        let mut last_applied: Option<(i32, Assoc)> = None;
        'climb: loop {
            if self.should_stop() {
                break;
            }
            let before = self.offset;
            let group = &table.groups[group_index];
            for cont in &group.continuations {
                if left_bp(cont.level) < min_bp {
                    continue;
                }
                if !self.lookahead_in(&cont.first) {
                    continue;
                }
                if self.try_continuation(cont, checkpoint) == Matched::No {
                    continue;
                }
                if self.offset == before {
                    // A continuation that consumed nothing cannot make
                    // progress; stop climbing.
                    break 'climb;
                }

                if cont.explicit_prec
                    && cont.assoc == Assoc::None
                    && last_applied == Some((cont.level, Assoc::None))
                {
                    if let Some(builder) =
                        self.report(DiagnosticKind::NonAssociativeChain, self.here())
                    {
                        builder.emit();
                    }
                }
                last_applied = Some((cont.level, cont.assoc));
                continue 'climb;
            }
            break;
        }
        Matched::Yes
    }

    /// Matches one continuation tail, wrapping the left operand on
    /// success. The first tail element (usually the operator) is matched
    /// speculatively; once it lands, the rest is committed and recovers
    /// like any sequence.
    fn try_continuation(&mut self, cont: &Continuation, checkpoint: usize) -> Matched {
        let save = self.savepoint();
        if let Some(target) = cont.bp_target {
            self.bp_overrides
                .push((target, right_bp(cont.level, cont.assoc)));
        }

        self.speculation += 1;
        let head = self.match_expr(cont.tail[0], None);
        self.speculation -= 1;

        let matched = if head == Matched::No {
            Matched::No
        } else {
            self.match_seq(&cont.tail[1..])
        };

        if cont.bp_target.is_some() {
            self.bp_overrides.pop();
        }
        if matched == Matched::No {
            self.rollback(save);
            return Matched::No;
        }

        self.events.insert(
            checkpoint,
            Event::Open {
                kind: OpenKind::Rule {
                    rule: cont.owner,
                    alias: None,
                    lhs_field: cont.head_field,
                },
            },
        );
        self.events.push(Event::Close);
        Matched::Yes
    }

    /// Picks among the rule's base alternatives. One viable alternative is
    /// matched committed; several are raced speculatively and resolved by
    /// span length, precedence, then declaration order.
    fn parse_alternatives(&mut self, rule: RuleId, min_bp: i32) -> Matched {
        let table = self.table;
        let info = table.rule(rule);

        let mut viable: Vec<&BaseAlt> = Vec::new();
        let mut fallback: Option<&BaseAlt> = None;
        for alt in &info.alts {
            if fallback.is_none() && table.is_nullable(alt.expr) {
                fallback = Some(alt);
            }
            if !table.first(alt.expr).is_empty() && self.lookahead_in(table.first(alt.expr)) {
                viable.push(alt);
            }
        }

        match viable.len() {
            0 => match fallback {
                Some(alt) => self.match_base_alt(alt, min_bp),
                None => Matched::No,
            },
            1 => self.match_base_alt(viable[0], min_bp),
            _ => {
                let save = self.savepoint();
                let mut candidates: Vec<(usize, Vec<Event>, i32)> = Vec::new();
                let mut best_failed: Option<(usize, usize)> = None;
                for (index, alt) in viable.iter().enumerate() {
                    if self.should_stop() {
                        break;
                    }
                    self.speculation += 1;
                    self.begin_attempt(&save);
                    let matched = self.match_base_alt(alt, min_bp);
                    self.speculation -= 1;
                    if matched == Matched::Yes {
                        candidates.push((
                            self.offset,
                            self.events[save.events..].to_vec(),
                            alt.level(),
                        ));
                    } else {
                        let progress = self.attempt_progress();
                        if best_failed.is_none_or(|(best, _)| progress > best) {
                            best_failed = Some((progress, index));
                        }
                    }
                    self.rollback(save);
                }

                if candidates.is_empty() {
                    if let Some(alt) = fallback {
                        return self.match_base_alt(alt, min_bp);
                    }
                    // Every alternative failed. Commit to the one that got
                    // furthest so recovery runs inside it instead of
                    // abandoning the rule.
                    if !self.speculating() && !self.should_stop() {
                        if let Some((progress, index)) = best_failed {
                            if progress > save.offset {
                                return self.match_base_alt(viable[index], min_bp);
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
        }
    }

    fn match_base_alt(&mut self, alt: &BaseAlt, min_bp: i32) -> Matched {
        match alt.shape {
            BaseShape::Unit(target) => self.parse_rule(target, min_bp, None),
            BaseShape::Normal { bp_target } => {
                if let (Some(target), Some((level, assoc))) = (bp_target, alt.prec) {
                    // Prefix operator: its operand must bind at least as
                    // tightly as the operator itself.
                    self.bp_overrides.push((target, right_bp(level, assoc)));
                    let matched = self.match_expr(alt.expr, None);
                    self.bp_overrides.pop();
                    matched
                } else {
                    self.match_expr(alt.expr, None)
                }
            }
        }
    }
}

fn left_bp(level: i32) -> i32 {
    level.saturating_mul(2)
}

/// Right operand floor: a right-associative operator admits itself, the
/// others require strictly tighter binding.
fn right_bp(level: i32, assoc: Assoc) -> i32 {
    match assoc {
        Assoc::Right => level.saturating_mul(2),
        Assoc::Left | Assoc::None => level.saturating_mul(2).saturating_add(1),
    }
}
