//! Lowering from the declarative grammar to the executable table.
//!
//! The compiler interns terminals (deduplicated by text or rendered
//! pattern), lowers rule bodies into the expression arena, resolves named
//! precedences, and wires up externals, extras, the word token, and
//! declared conflicts. Structural analysis runs afterwards in
//! [`super::analysis`].

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use indexmap::IndexMap;
use sylva_core::{Grammar, Precedence, PrecedenceEntry, Rule};

use super::regex::{build_dfa, rule_to_regex};
use super::token_set::TokenSet;
use super::{
    analysis, Assoc, Expr, ExprId, FieldId, GrammarError, GrammarTable, NameTable, RuleId,
    RuleInfo, Terminal, TerminalDef, TerminalId,
};
use crate::lexer::dfa::longest_match;

/// External scanners communicate through a fixed-width bitset.
const MAX_EXTERNALS: usize = 64;

pub(crate) fn compile(grammar: &Grammar) -> Result<GrammarTable, GrammarError> {
    if grammar.rules.is_empty() {
        return Err(GrammarError::EmptyGrammar);
    }

    let mut compiler = Compiler::new(grammar);
    compiler.resolve_precedence_names();
    compiler.intern_externals()?;
    compiler.detect_token_rules()?;
    compiler.lower_rules()?;
    compiler.resolve_extras()?;
    compiler.resolve_word()?;
    compiler.resolve_conflicts()?;
    compiler.finish()
}

struct Compiler<'g> {
    grammar: &'g Grammar,
    rule_ids: HashMap<&'g str, RuleId>,
    prec_levels: HashMap<&'g str, i32>,
    exprs: Vec<Expr>,
    terminals: Vec<Terminal>,
    /// Interned in first-seen order so terminal ids track grammar order.
    literal_ids: IndexMap<String, TerminalId>,
    pattern_ids: IndexMap<String, TerminalId>,
    fields: Vec<String>,
    field_ids: HashMap<String, FieldId>,
    aliases: Vec<String>,
    alias_ids: HashMap<String, super::AliasId>,
    externals: Vec<TerminalId>,
    external_ids: HashMap<String, TerminalId>,
    /// Terminal backing each rule that lowers to a single token.
    rule_tokens: Vec<Option<TerminalId>>,
    /// Lowered body per rule, filled by `lower_rules`.
    rule_bodies: Vec<Option<ExprId>>,
    extras: Vec<TerminalId>,
    word: Option<TerminalId>,
    conflicts: HashSet<(u16, u16)>,
}

impl<'g> Compiler<'g> {
    fn new(grammar: &'g Grammar) -> Self {
        let rule_ids = grammar
            .rules
            .iter()
            .enumerate()
            .map(|(i, (name, _))| (name.as_str(), RuleId(i as u16)))
            .collect();

        Self {
            grammar,
            rule_ids,
            prec_levels: HashMap::new(),
            exprs: Vec::new(),
            terminals: Vec::new(),
            literal_ids: IndexMap::new(),
            pattern_ids: IndexMap::new(),
            fields: Vec::new(),
            field_ids: HashMap::new(),
            aliases: Vec::new(),
            alias_ids: HashMap::new(),
            externals: Vec::new(),
            external_ids: HashMap::new(),
            rule_tokens: vec![None; grammar.rules.len()],
            rule_bodies: vec![None; grammar.rules.len()],
            extras: Vec::new(),
            word: None,
            conflicts: HashSet::new(),
        }
    }

    /// Within one ordering, earlier entries bind tighter.
    fn resolve_precedence_names(&mut self) {
        let grammar = self.grammar;
        for ordering in &grammar.precedences {
            let len = ordering.len() as i32;
            for (i, entry) in ordering.iter().enumerate() {
                if let PrecedenceEntry::Name(name) = entry {
                    self.prec_levels.insert(name.as_str(), len - i as i32);
                }
            }
        }
    }

    fn intern_externals(&mut self) -> Result<(), GrammarError> {
        let grammar = self.grammar;
        if grammar.externals.len() > MAX_EXTERNALS {
            return Err(GrammarError::TooManyExternals {
                count: grammar.externals.len(),
            });
        }

        for (index, external) in grammar.externals.iter().enumerate() {
            let name = match external {
                Rule::Symbol(name) => name.clone(),
                Rule::String(text) => text.clone(),
                other => {
                    return Err(GrammarError::UndefinedRule {
                        rule: "externals".to_string(),
                        reference: format!("{other:?}"),
                    });
                }
            };

            let id = TerminalId(self.terminals.len() as u16);
            self.terminals.push(Terminal {
                name: name.clone(),
                def: TerminalDef::External {
                    index: index as u16,
                },
            });
            self.externals.push(id);
            self.external_ids.insert(name, id);
        }
        Ok(())
    }

    /// Rules whose whole body is a single token become named terminals.
    /// A rule sharing its name with an external is backed by the scanner.
    fn detect_token_rules(&mut self) -> Result<(), GrammarError> {
        let grammar = self.grammar;
        for (index, (name, body)) in grammar.rules.iter().enumerate() {
            if let Some(&external) = self.external_ids.get(name.as_str()) {
                self.rule_tokens[index] = Some(external);
                continue;
            }

            let Some(core) = token_core(body) else {
                continue;
            };
            self.check_prec_names(name, body)?;

            let id = match core {
                Rule::String(text) => self.intern_literal(text),
                Rule::Pattern { value, flags } => {
                    self.intern_pattern_source(value, flags.as_deref(), Some(name))?
                }
                complex => {
                    let source = self.render_token(name, complex)?;
                    self.intern_pattern(&source, Some(name))?
                }
            };
            self.rule_tokens[index] = Some(id);
        }
        Ok(())
    }

    fn lower_rules(&mut self) -> Result<(), GrammarError> {
        let grammar = self.grammar;
        for (index, (name, body)) in grammar.rules.iter().enumerate() {
            let expr = match self.rule_tokens[index] {
                Some(terminal) => self.push(Expr::Terminal {
                    terminal,
                    immediate: false,
                }),
                None => self.lower(name, body)?,
            };
            self.rule_bodies[index] = Some(expr);
        }
        Ok(())
    }

    fn lower(&mut self, owner: &str, rule: &Rule) -> Result<ExprId, GrammarError> {
        let expr = match rule {
            Rule::Blank => Expr::Empty,
            Rule::String(text) => Expr::Terminal {
                terminal: self.intern_literal(text),
                immediate: false,
            },
            Rule::Pattern { value, flags } => Expr::Terminal {
                terminal: self.intern_pattern_source(value, flags.as_deref(), None)?,
                immediate: false,
            },
            Rule::Symbol(name) => self.lower_symbol(owner, name)?,
            Rule::Seq(items) => {
                let ids = items
                    .iter()
                    .map(|item| self.lower(owner, item))
                    .collect::<Result<Vec<_>, _>>()?;
                Expr::Seq(ids)
            }
            Rule::Choice(items) => {
                let ids = items
                    .iter()
                    .map(|item| self.lower(owner, item))
                    .collect::<Result<Vec<_>, _>>()?;
                Expr::Choice(ids)
            }
            Rule::Repeat(content) => Expr::Repeat {
                content: self.lower(owner, content)?,
                min_once: false,
            },
            Rule::Repeat1(content) => Expr::Repeat {
                content: self.lower(owner, content)?,
                min_once: true,
            },
            Rule::Field { name, content } => Expr::Field {
                field: self.intern_field(name),
                content: self.lower(owner, content)?,
            },
            Rule::Alias {
                content,
                value,
                named,
            } => Expr::Alias {
                alias: self.intern_alias(value),
                named: *named,
                content: self.lower(owner, content)?,
            },
            Rule::Token(content) | Rule::ImmediateToken(content) => {
                let immediate = matches!(rule, Rule::ImmediateToken(_));
                let terminal = match content.as_ref() {
                    Rule::String(text) => self.intern_literal(text),
                    _ => {
                        let source = self.render_token(owner, content)?;
                        self.intern_pattern(&source, None)?
                    }
                };
                Expr::Terminal { terminal, immediate }
            }
            Rule::Prec { value, content } => Expr::Prec {
                level: self.resolve_prec(owner, value)?,
                assoc: Assoc::None,
                content: self.lower(owner, content)?,
            },
            Rule::PrecLeft { value, content } => Expr::Prec {
                level: self.resolve_prec(owner, value)?,
                assoc: Assoc::Left,
                content: self.lower(owner, content)?,
            },
            Rule::PrecRight { value, content } => Expr::Prec {
                level: self.resolve_prec(owner, value)?,
                assoc: Assoc::Right,
                content: self.lower(owner, content)?,
            },
        };
        Ok(self.push(expr))
    }

    fn lower_symbol(&mut self, owner: &str, name: &str) -> Result<Expr, GrammarError> {
        if let Some(&rule) = self.rule_ids.get(name) {
            if let Some(terminal) = self.rule_tokens[rule.index()] {
                return Ok(Expr::Terminal {
                    terminal,
                    immediate: false,
                });
            }
            return Ok(Expr::Rule(rule));
        }
        if let Some(&terminal) = self.external_ids.get(name) {
            return Ok(Expr::Terminal {
                terminal,
                immediate: false,
            });
        }
        Err(GrammarError::UndefinedRule {
            rule: owner.to_string(),
            reference: name.to_string(),
        })
    }

    /// Precedence wrappers inside a token body have no lexical effect, but
    /// a named level must still resolve somewhere in the orderings.
    fn check_prec_names(&self, owner: &str, body: &Rule) -> Result<(), GrammarError> {
        let mut missing = None;
        body.walk(&mut |node| {
            let (Rule::Prec { value, .. }
            | Rule::PrecLeft { value, .. }
            | Rule::PrecRight { value, .. }) = node
            else {
                return;
            };
            if let Precedence::Name(name) = value {
                if missing.is_none() && !self.prec_levels.contains_key(name.as_str()) {
                    missing = Some(name.clone());
                }
            }
        });
        match missing {
            Some(name) => Err(GrammarError::UndefinedPrecedence {
                rule: owner.to_string(),
                name,
            }),
            None => Ok(()),
        }
    }

    fn resolve_prec(&self, owner: &str, value: &Precedence) -> Result<i32, GrammarError> {
        match value {
            Precedence::Integer(level) => Ok(*level),
            Precedence::Name(name) => {
                self.prec_levels
                    .get(name.as_str())
                    .copied()
                    .ok_or_else(|| GrammarError::UndefinedPrecedence {
                        rule: owner.to_string(),
                        name: name.clone(),
                    })
            }
        }
    }

    fn resolve_extras(&mut self) -> Result<(), GrammarError> {
        let grammar = self.grammar;
        for extra in &grammar.extras {
            let id = match extra {
                Rule::Symbol(name) => {
                    if let Some(&rule) = self.rule_ids.get(name.as_str()) {
                        self.rule_tokens[rule.index()].ok_or_else(|| {
                            GrammarError::UndefinedRule {
                                rule: "extras".to_string(),
                                reference: name.clone(),
                            }
                        })?
                    } else if let Some(&terminal) = self.external_ids.get(name.as_str()) {
                        terminal
                    } else {
                        return Err(GrammarError::UndefinedRule {
                            rule: "extras".to_string(),
                            reference: name.clone(),
                        });
                    }
                }
                Rule::String(text) => self.intern_literal(text),
                Rule::Pattern { value, flags } => {
                    self.intern_pattern_source(value, flags.as_deref(), None)?
                }
                other => {
                    return Err(GrammarError::InvalidPattern {
                        pattern: "extras".to_string(),
                        message: format!("extras must be tokens, got {other:?}"),
                    });
                }
            };
            self.extras.push(id);
        }
        Ok(())
    }

    fn resolve_word(&mut self) -> Result<(), GrammarError> {
        let grammar = self.grammar;
        let Some(word_name) = &grammar.word else {
            return Ok(());
        };

        let terminal = self
            .rule_ids
            .get(word_name.as_str())
            .and_then(|rule| self.rule_tokens[rule.index()])
            .ok_or_else(|| GrammarError::InvalidWordRule {
                name: word_name.clone(),
            })?;

        let TerminalDef::Pattern { dfa } = &self.terminals[terminal.index()].def else {
            return Err(GrammarError::InvalidWordRule {
                name: word_name.clone(),
            });
        };

        // Literals the word rule fully matches lex only at word boundaries.
        let mut keywords = Vec::new();
        for (index, candidate) in self.terminals.iter().enumerate() {
            if let TerminalDef::Literal { text, .. } = &candidate.def {
                if longest_match(dfa, text.as_bytes()) == Some(text.len()) {
                    keywords.push(index);
                }
            }
        }
        for index in keywords {
            if let TerminalDef::Literal { keyword, .. } = &mut self.terminals[index].def {
                *keyword = true;
            }
        }

        self.word = Some(terminal);
        Ok(())
    }

    fn resolve_conflicts(&mut self) -> Result<(), GrammarError> {
        let grammar = self.grammar;
        for tuple in &grammar.conflicts {
            let mut ids = Vec::with_capacity(tuple.len());
            for name in tuple {
                let &rule = self.rule_ids.get(name.as_str()).ok_or_else(|| {
                    GrammarError::InvalidConflict { name: name.clone() }
                })?;
                ids.push(rule.0);
            }
            for (i, &a) in ids.iter().enumerate() {
                for &b in &ids[i + 1..] {
                    self.conflicts.insert((a.min(b), a.max(b)));
                }
            }
        }
        Ok(())
    }

    fn finish(mut self) -> Result<GrammarTable, GrammarError> {
        let inline: HashSet<&str> = self.grammar.inline.iter().map(String::as_str).collect();

        let rules = self
            .grammar
            .rules
            .iter()
            .enumerate()
            .map(|(index, (name, _))| RuleInfo {
                name: name.clone(),
                body: self.rule_bodies[index].expect("all rule bodies lowered"),
                hidden: name.starts_with('_'),
                inline: inline.contains(name.as_str()),
                token: self.rule_tokens[index],
                alts: Vec::new(),
                group: None,
            })
            .collect();

        let expr_count = self.exprs.len();
        let terminal_count = self.terminals.len();
        let names = NameTable {
            rules: self.grammar.rules.iter().map(|(n, _)| n.clone()).collect(),
            aliases: self.aliases.clone(),
            terminals: self.terminals.iter().map(|t| t.name.clone()).collect(),
            fields: self.fields.clone(),
            literal_terminals: self
                .terminals
                .iter()
                .map(|t| matches!(t.def, TerminalDef::Literal { .. }))
                .collect(),
        };

        let mut table = GrammarTable {
            name: self.grammar.name.clone(),
            rules,
            exprs: std::mem::take(&mut self.exprs),
            terminals: std::mem::take(&mut self.terminals),
            fields: std::mem::take(&mut self.fields),
            aliases: std::mem::take(&mut self.aliases),
            externals: std::mem::take(&mut self.externals),
            extras: std::mem::take(&mut self.extras),
            entry: RuleId(0),
            conflicts: std::mem::take(&mut self.conflicts),
            sync_set: TokenSet::empty(terminal_count),
            word: self.word,
            first: vec![TokenSet::empty(terminal_count); expr_count],
            nullable: vec![false; expr_count],
            groups: Vec::new(),
            names: Arc::new(names),
        };

        analysis::analyze(&mut table)?;
        Ok(table)
    }

    fn push(&mut self, expr: Expr) -> ExprId {
        let id = ExprId(self.exprs.len() as u32);
        self.exprs.push(expr);
        id
    }

    /// Literals are interned by text wherever they appear, so a rule whose
    /// whole body is one string shares its terminal with inline uses.
    fn intern_literal(&mut self, text: &str) -> TerminalId {
        if let Some(&id) = self.literal_ids.get(text) {
            return id;
        }
        let id = TerminalId(self.terminals.len() as u16);
        self.terminals.push(Terminal {
            name: text.to_string(),
            def: TerminalDef::Literal {
                text: text.to_string(),
                keyword: false,
            },
        });
        self.literal_ids.insert(text.to_string(), id);
        id
    }

    fn intern_pattern_source(
        &mut self,
        value: &str,
        flags: Option<&str>,
        rule_name: Option<&str>,
    ) -> Result<TerminalId, GrammarError> {
        let source = match flags {
            Some(f) if f.contains('i') => format!("(?i:{value})"),
            _ => format!("(?:{value})"),
        };
        self.intern_pattern_named(&source, rule_name.unwrap_or(value))
    }

    fn intern_pattern(
        &mut self,
        source: &str,
        rule_name: Option<&str>,
    ) -> Result<TerminalId, GrammarError> {
        self.intern_pattern_named(source, rule_name.unwrap_or(source))
    }

    fn intern_pattern_named(
        &mut self,
        source: &str,
        name: &str,
    ) -> Result<TerminalId, GrammarError> {
        if let Some(&id) = self.pattern_ids.get(source) {
            return Ok(id);
        }
        let dfa = build_dfa(source, None)?;
        let id = TerminalId(self.terminals.len() as u16);
        self.terminals.push(Terminal {
            name: name.to_string(),
            def: TerminalDef::Pattern { dfa },
        });
        self.pattern_ids.insert(source.to_string(), id);
        Ok(id)
    }

    fn intern_field(&mut self, name: &str) -> FieldId {
        if let Some(&id) = self.field_ids.get(name) {
            return id;
        }
        let id = FieldId(self.fields.len() as u16);
        self.fields.push(name.to_string());
        self.field_ids.insert(name.to_string(), id);
        id
    }

    fn intern_alias(&mut self, name: &str) -> super::AliasId {
        if let Some(&id) = self.alias_ids.get(name) {
            return id;
        }
        let id = super::AliasId(self.aliases.len() as u16);
        self.aliases.push(name.to_string());
        self.alias_ids.insert(name.to_string(), id);
        id
    }

    fn render_token(&self, owner: &str, content: &Rule) -> Result<String, GrammarError> {
        let grammar = self.grammar;
        rule_to_regex(owner, content, &|name| grammar.rule(name).cloned())
    }
}

/// The single token a rule body boils down to, if it does.
fn token_core(rule: &Rule) -> Option<&Rule> {
    match rule {
        Rule::String(_) | Rule::Pattern { .. } => Some(rule),
        Rule::Token(content) | Rule::ImmediateToken(content) => Some(content),
        Rule::Prec { content, .. }
        | Rule::PrecLeft { content, .. }
        | Rule::PrecRight { content, .. } => token_core(content),
        _ => None,
    }
}
