//! Rendering of token-rule bodies to regex patterns.
//!
//! `token(...)` and friends may combine literals, patterns, sequences,
//! choices, and repetitions; the whole body is rendered to one pattern and
//! compiled to an anchored DFA so the lexer can run it byte by byte.

use regex_automata::dfa::dense;
use regex_automata::dfa::StartKind;
use regex_automata::MatchKind;
use sylva_core::Rule;

use super::GrammarError;

/// Rules nested deeper than this inside one token body are assumed cyclic.
const MAX_TOKEN_DEPTH: usize = 64;

/// Renders a token-rule body to a regex pattern string.
///
/// `lookup` resolves symbol references to other rule bodies, so token rules
/// may be built from named sub-tokens.
pub(crate) fn rule_to_regex(
    owner: &str,
    rule: &Rule,
    lookup: &dyn Fn(&str) -> Option<Rule>,
) -> Result<String, GrammarError> {
    let mut out = String::new();
    render(owner, rule, lookup, 0, &mut out)?;
    Ok(out)
}

fn render(
    owner: &str,
    rule: &Rule,
    lookup: &dyn Fn(&str) -> Option<Rule>,
    depth: usize,
    out: &mut String,
) -> Result<(), GrammarError> {
    if depth > MAX_TOKEN_DEPTH {
        return Err(GrammarError::InvalidPattern {
            pattern: owner.to_string(),
            message: "token rule references itself".to_string(),
        });
    }

    match rule {
        Rule::Blank => {}
        Rule::String(text) => out.push_str(&regex_syntax::escape(text)),
        Rule::Pattern { value, flags } => {
            if flags.as_deref().is_some_and(|f| f.contains('i')) {
                out.push_str("(?i:");
                out.push_str(value);
                out.push(')');
            } else {
                out.push_str("(?:");
                out.push_str(value);
                out.push(')');
            }
        }
        Rule::Seq(items) => {
            for item in items {
                render(owner, item, lookup, depth + 1, out)?;
            }
        }
        Rule::Choice(items) => {
            out.push_str("(?:");
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push('|');
                }
                render(owner, item, lookup, depth + 1, out)?;
            }
            out.push(')');
        }
        Rule::Repeat(content) => {
            out.push_str("(?:");
            render(owner, content, lookup, depth + 1, out)?;
            out.push_str(")*");
        }
        Rule::Repeat1(content) => {
            out.push_str("(?:");
            render(owner, content, lookup, depth + 1, out)?;
            out.push_str(")+");
        }
        Rule::Symbol(name) => {
            let target = lookup(name).ok_or_else(|| GrammarError::UndefinedRule {
                rule: owner.to_string(),
                reference: name.clone(),
            })?;
            render(owner, &target, lookup, depth + 1, out)?;
        }
        Rule::Token(content)
        | Rule::ImmediateToken(content)
        | Rule::Prec { content, .. }
        | Rule::PrecLeft { content, .. }
        | Rule::PrecRight { content, .. }
        | Rule::Field { content, .. }
        | Rule::Alias { content, .. } => {
            render(owner, content, lookup, depth + 1, out)?;
        }
    }
    Ok(())
}

/// Compiles a pattern to an anchored dense DFA.
pub(crate) fn build_dfa(
    pattern: &str,
    flags: Option<&str>,
) -> Result<dense::DFA<Vec<u32>>, GrammarError> {
    let effective = match flags {
        Some(f) if f.contains('i') => format!("(?i:{pattern})"),
        _ => pattern.to_string(),
    };

    dense::Builder::new()
        .configure(
            dense::Config::new()
                .start_kind(StartKind::Anchored)
                // Leftmost-first stops at the first accepting alternative;
                // the lexer wants every match state so it can keep the
                // longest (`a|ab|abc` must match all three bytes).
                .match_kind(MatchKind::All),
        )
        .build(&effective)
        .map_err(|err| GrammarError::InvalidPattern {
            pattern: pattern.to_string(),
            message: err.to_string(),
        })
}
