//! The fixed grammar for the template-variable query language, built from the
//! generic combinators according to the EBNF:
//!
//! ```text
//! query              ::= nodes [ networkMapOrPack ] [ deviceType ] [ nothing ]
//! networkMapOrPack   ::= networkMap | monitoringPack | nothing
//! networkMap         ::= networkAtlas [ networkFoldersView ]
//! networkFoldersView ::= [ folder+ ] [ view ] [ nothing ]
//! monitoringPack     ::= monitoringPacks folder+ name
//! ```
//!
//! `nodes` is a hard requirement; everything after it is optional and made
//! total with the `nothing` reader, so the only outright parse failure is a
//! query that does not start with `nodes`.

use crate::combinators::{aggregated, all_that_occur, first_match, repetition, sequence, unwrapped};
use crate::device_type::DEVICE_FAMILIES;
use crate::error::TrailingText;
use crate::readers::{literal, nothing, selector_with_parameter, Reader};
use crate::token::{ReadResult, Token, TokenTag, TokenValue};
use miette::NamedSource;
use std::rc::Rc;

/// The top-level result of parsing one query string.
#[derive(Debug, PartialEq, Clone)]
pub struct ParseOutcome {
    /// True iff the grammar matched and consumed the entire input.
    pub complete_parsed: bool,
    /// The unconsumed tail of the input; empty on a complete parse.
    pub residual: String,
    /// The query token's sub-token sequence, in resolution order. Empty when
    /// the mandatory `nodes` keyword was absent.
    pub tokens: Vec<Token>,
}

impl ParseOutcome {
    fn failure(input: &str) -> ParseOutcome {
        ParseOutcome {
            complete_parsed: false,
            residual: input.to_string(),
            tokens: Vec::new(),
        }
    }

    /// A diagnostic over the unrecognized trailing text of a partial parse,
    /// suitable for rendering in the query editor. `None` when the query
    /// parsed completely or did not parse at all.
    pub fn trailing_diagnostic(&self, query: &str) -> Option<TrailingText> {
        if self.complete_parsed || self.tokens.is_empty() || self.residual.is_empty() {
            return None;
        }
        let offset = query.len().saturating_sub(self.residual.len());
        Some(TrailingText {
            src: NamedSource::new("query", query.to_string()),
            span: (offset, self.residual.len()).into(),
        })
    }
}

///    networkFoldersView ::= [ folder+ ] [ view ] [ nothing ]
fn network_folders_view() -> Reader {
    aggregated(all_that_occur(
        TokenTag::FoldersView,
        vec![
            repetition(
                TokenTag::Folders,
                selector_with_parameter(TokenTag::Folder, "folder"),
            ),
            selector_with_parameter(TokenTag::View, "view"),
            nothing(),
        ],
    ))
}

///    networkMap ::= networkAtlas [ networkFoldersView ]
fn network_map() -> Reader {
    aggregated(sequence(
        TokenTag::NetworkMap,
        vec![
            selector_with_parameter(TokenTag::NetworkAtlas, "networkAtlas"),
            network_folders_view(),
        ],
    ))
}

///    monitoringPack ::= monitoringPacks folder+ name
fn monitoring_pack() -> Reader {
    let rule = aggregated(sequence(
        TokenTag::MonitoringPack,
        vec![
            literal(TokenTag::MonitoringPacks, ".monitoringPacks"),
            repetition(
                TokenTag::Folders,
                selector_with_parameter(TokenTag::Folder, "folder"),
            ),
            selector_with_parameter(TokenTag::Name, "name"),
        ],
    ));
    // The keyword token carries no resolution data; only the folder path and
    // the pack name survive into the AST.
    Rc::new(move |input: &str| {
        let mut result = rule(input)?;
        if let TokenValue::Seq(subs) = &mut result.token.value {
            subs.retain(|token| token.tag != TokenTag::MonitoringPacks);
        }
        Some(result)
    })
}

///    networkMapOrPack ::= networkMap | monitoringPack | nothing
fn network_map_or_pack() -> Reader {
    unwrapped(first_match(
        TokenTag::Group,
        vec![network_map(), monitoring_pack(), nothing()],
    ))
}

///    deviceType ::= one of the fixed device-family keywords, e.g. `.windows`
fn device_type() -> Reader {
    let readers = DEVICE_FAMILIES
        .iter()
        .map(|family| literal(TokenTag::DeviceType, &format!(".{}", family.keyword)))
        .collect();
    unwrapped(first_match(TokenTag::Group, readers))
}

/// Parses a template-variable query string into its token sequence.
///
/// A query that does not start with `nodes` fails outright (empty token
/// sequence). Otherwise the optional clauses are parsed over the remaining
/// residual, null placeholders are removed from the root, and a non-empty
/// final residual is surfaced as `complete_parsed: false` with the parsed
/// prefix still available for callers that accept partial matches.
pub fn parse(query: &str) -> ParseOutcome {
    let Some(first) = literal(TokenTag::Nodes, "nodes")(query) else {
        return ParseOutcome::failure(query);
    };

    let mut result = ReadResult {
        token: Token::seq(TokenTag::Query, vec![first.token]),
        residual: first.residual,
    };
    let optional_clauses = all_that_occur(
        TokenTag::Query,
        vec![network_map_or_pack(), device_type(), nothing()],
    );
    if let Some(rest) = optional_clauses(result.residual) {
        result = result.merge_result(rest, None);
    }
    result.token.remove_nulls();

    let complete_parsed = result.residual.is_empty();
    let residual = result.residual.to_string();
    ParseOutcome {
        complete_parsed,
        residual,
        tokens: result.token.into_sub_tokens(),
    }
}
