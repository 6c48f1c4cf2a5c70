//! Generic combinators that compose token readers into bigger readers.
//! All of them are backtracking-free: alternation probes alternatives against
//! the same starting residual, and everything else only ever moves forward.

use crate::readers::Reader;
use crate::token::{ReadResult, Token, TokenTag, TokenValue};
use std::rc::Rc;

/// Applies each reader left to right over the shrinking residual. Fails if
/// any step fails; on success the composite token's value is the ordered list
/// of per-step tokens, not yet flattened.
pub fn sequence(tag: TokenTag, readers: Vec<Reader>) -> Reader {
    Rc::new(move |input: &str| {
        let mut residual = input;
        let mut tokens = Vec::with_capacity(readers.len());
        for reader in &readers {
            let step = reader(residual)?;
            residual = step.residual;
            tokens.push(step.token);
        }
        Some(ReadResult {
            token: Token::seq(tag, tokens),
            residual,
        })
    })
}

/// Tries each reader in order against the same starting input and
/// short-circuits on the first success. Fails only if all readers fail.
/// The matched token is wrapped as the composite's single sub-token;
/// callers use [`unwrapped`] when they want it without the extra nesting.
pub fn first_match(tag: TokenTag, readers: Vec<Reader>) -> Reader {
    Rc::new(move |input: &str| {
        for reader in &readers {
            if let Some(matched) = reader(input) {
                let residual = matched.residual;
                return Some(ReadResult {
                    token: Token::seq(tag, vec![matched.token]),
                    residual,
                });
            }
        }
        None
    })
}

/// Like [`sequence`] but a failing reader simply contributes nothing while
/// parsing continues with the next reader in the list. The composite is a
/// match whenever at least one reader applied, so "zero or more of these
/// optional slots, in this fixed relative order" parses totally as long as
/// the list ends in a `nothing` reader.
pub fn all_that_occur(tag: TokenTag, readers: Vec<Reader>) -> Reader {
    Rc::new(move |input: &str| {
        let mut residual = input;
        let mut tokens = Vec::new();
        for reader in &readers {
            if let Some(step) = reader(residual) {
                residual = step.residual;
                tokens.push(step.token);
            }
        }
        if tokens.is_empty() {
            return None;
        }
        Some(ReadResult {
            token: Token::seq(tag, tokens),
            residual,
        })
    })
}

/// Applies `reader` to its own residual in a loop, merging each success into
/// the accumulator, until the first failure. Fails outright if the very first
/// attempt fails; "repeat zero times" is expressed at the call site via an
/// enclosing optional slot.
pub fn repetition(tag: TokenTag, reader: Reader) -> Reader {
    Rc::new(move |input: &str| {
        let first = reader(input)?;
        let mut acc = ReadResult {
            token: Token::seq(tag, vec![first.token]),
            residual: first.residual,
        };
        while let Some(next) = reader(acc.residual) {
            // A zero-width match would loop forever.
            if next.residual.len() == acc.residual.len() {
                break;
            }
            acc = acc.merge_result(next, None);
        }
        Some(acc)
    })
}

/// Replaces a composite token with its first sub-token, so that alternation
/// does not add nesting to the AST.
pub fn unwrapped(reader: Reader) -> Reader {
    Rc::new(move |input: &str| {
        let result = reader(input)?;
        let residual = result.residual;
        let token = match result.token.value {
            TokenValue::Seq(subs) if !subs.is_empty() => {
                subs.into_iter().next().unwrap_or_else(Token::nothing)
            }
            other => Token {
                tag: result.token.tag,
                value: other,
            },
        };
        Some(ReadResult { token, residual })
    })
}

/// Flattens a composite's per-step tokens into one semantic sequence,
/// dropping null placeholders.
pub fn aggregated(reader: Reader) -> Reader {
    Rc::new(move |input: &str| {
        let mut result = reader(input)?;
        result.aggregate_sub_token_values(false);
        Some(result)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::readers::{literal, nothing, selector_with_parameter};

    #[test]
    fn test_sequence_applies_readers_over_shrinking_residual() {
        let reader = sequence(
            TokenTag::Group,
            vec![
                literal(TokenTag::Nodes, "nodes"),
                selector_with_parameter(TokenTag::View, "view"),
            ],
        );
        let result = reader("nodes.view(\"X\").rest").unwrap();
        assert_eq!(result.residual, ".rest");
        assert_eq!(result.token.sub_tokens().len(), 2);
    }

    #[test]
    fn test_sequence_fails_when_any_step_fails() {
        let reader = sequence(
            TokenTag::Group,
            vec![
                literal(TokenTag::Nodes, "nodes"),
                selector_with_parameter(TokenTag::View, "view"),
            ],
        );
        assert!(reader("nodes.folder(\"X\")").is_none());
    }

    #[test]
    fn test_first_match_short_circuits_in_order() {
        let reader = first_match(
            TokenTag::Group,
            vec![
                literal(TokenTag::View, ".view"),
                literal(TokenTag::Folder, ".v"),
            ],
        );
        let result = reader(".view").unwrap();
        assert_eq!(result.token.sub_tokens()[0].tag, TokenTag::View);
    }

    #[test]
    fn test_first_match_fails_only_when_all_fail() {
        let reader = first_match(
            TokenTag::Group,
            vec![
                literal(TokenTag::View, ".view"),
                literal(TokenTag::Folder, ".folder"),
            ],
        );
        assert!(reader(".name").is_none());
    }

    #[test]
    fn test_all_that_occur_skips_failing_readers() {
        let reader = all_that_occur(
            TokenTag::Group,
            vec![
                selector_with_parameter(TokenTag::Folder, "folder"),
                selector_with_parameter(TokenTag::View, "view"),
                nothing(),
            ],
        );
        // No folder present: the folder reader contributes nothing, the view
        // reader and the nothing reader both apply.
        let result = reader(".view(\"X\")").unwrap();
        assert_eq!(result.residual, "");
        let tags: Vec<_> = result.token.sub_tokens().iter().map(|t| t.tag).collect();
        assert_eq!(tags, vec![TokenTag::View, TokenTag::Nothing]);
    }

    #[test]
    fn test_repetition_merges_successive_matches() {
        let reader = repetition(
            TokenTag::Folders,
            selector_with_parameter(TokenTag::Folder, "folder"),
        );
        let result = reader(".folder(\"A\").folder(\"B\").view(\"C\")").unwrap();
        assert_eq!(result.residual, ".view(\"C\")");
        let names: Vec<_> = result
            .token
            .sub_tokens()
            .iter()
            .filter_map(|t| t.as_text())
            .collect();
        assert_eq!(names, vec!["A", "B"]);
    }

    #[test]
    fn test_repetition_fails_on_zero_matches() {
        let reader = repetition(
            TokenTag::Folders,
            selector_with_parameter(TokenTag::Folder, "folder"),
        );
        assert!(reader(".view(\"C\")").is_none());
    }

    #[test]
    fn test_unwrapped_removes_alternation_nesting() {
        let reader = unwrapped(first_match(
            TokenTag::Group,
            vec![literal(TokenTag::Nodes, "nodes"), nothing()],
        ));
        let result = reader("other").unwrap();
        assert!(result.token.is_null());
        let result = reader("nodes").unwrap();
        assert_eq!(result.token.tag, TokenTag::Nodes);
    }
}
