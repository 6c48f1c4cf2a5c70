/// Tags for the tokens produced by the query readers and combinators.
/// The set is closed: grammar rules and the resolver match on it exhaustively.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum TokenTag {
    // == Composite tokens ==
    /// The root token wrapping one whole parsed query.
    Query,
    /// A `.networkAtlas("…")` clause together with its folder path and view.
    NetworkMap,
    /// A `.monitoringPacks` clause together with its folder path and pack name.
    MonitoringPack,
    /// One or more consecutive `.folder("…")` selectors.
    Folders,
    /// The optional folder-path/view block inside a network-map clause.
    FoldersView,
    /// Transient wrapper produced by alternation; callers unwrap it.
    Group,

    // == Leaf tokens ==
    /// The mandatory leading `nodes` keyword.
    Nodes,
    /// The `.monitoringPacks` keyword.
    MonitoringPacks,
    /// The quoted parameter of `.networkAtlas("…")`.
    NetworkAtlas,
    /// The quoted parameter of one `.folder("…")` selector.
    Folder,
    /// The quoted parameter of `.view("…")`.
    View,
    /// The quoted parameter of `.name("…")`.
    Name,
    /// A device-family keyword such as `windows` or `linux`.
    DeviceType,
    /// The opening part of a selector, e.g. `.folder(`. Discarded after use.
    Selector,
    /// The null sentinel: a rule that successfully matched zero occurrences.
    Nothing,
}

/// The payload of a token: leaf text, an ordered sub-token sequence, or
/// nothing at all (the null sentinel's payload).
#[derive(Debug, PartialEq, Clone)]
pub enum TokenValue {
    Text(String),
    Seq(Vec<Token>),
    Empty,
}

/// A tagged parse-result fragment. The AST is a tree of tokens.
#[derive(Debug, PartialEq, Clone)]
pub struct Token {
    pub tag: TokenTag,
    pub value: TokenValue,
}

impl Token {
    pub fn text(tag: TokenTag, value: impl Into<String>) -> Token {
        Token {
            tag,
            value: TokenValue::Text(value.into()),
        }
    }

    pub fn seq(tag: TokenTag, tokens: Vec<Token>) -> Token {
        Token {
            tag,
            value: TokenValue::Seq(tokens),
        }
    }

    /// The null token: a successful zero-match, distinct from a parse failure.
    pub fn nothing() -> Token {
        Token {
            tag: TokenTag::Nothing,
            value: TokenValue::Empty,
        }
    }

    pub fn is_null(&self) -> bool {
        self.tag == TokenTag::Nothing
    }

    pub fn as_text(&self) -> Option<&str> {
        match &self.value {
            TokenValue::Text(text) => Some(text),
            _ => None,
        }
    }

    pub fn sub_tokens(&self) -> &[Token] {
        match &self.value {
            TokenValue::Seq(tokens) => tokens,
            _ => &[],
        }
    }

    /// Coerces this token's value to a sequence: a sequence value yields its
    /// elements, an empty value yields nothing, and a leaf token yields itself.
    pub fn into_sub_tokens(self) -> Vec<Token> {
        match self.value {
            TokenValue::Seq(tokens) => tokens,
            TokenValue::Empty => Vec::new(),
            TokenValue::Text(_) => vec![self],
        }
    }

    /// Drops null sub-tokens from a sequence value in place. Leaf and empty
    /// values are left untouched.
    pub fn remove_nulls(&mut self) {
        if let TokenValue::Seq(tokens) = &mut self.value {
            tokens.retain(|token| !token.is_null());
        }
    }
}

/// The outcome of one successful reader application: the produced token and
/// the unconsumed tail of the input. Total parse failure for a rule is
/// expressed as `None` at the reader boundary, never as an error value.
#[derive(Debug, PartialEq, Clone)]
pub struct ReadResult<'a> {
    pub token: Token,
    pub residual: &'a str,
}

impl<'a> ReadResult<'a> {
    /// Flattens one level of sub-token values into a single sequence,
    /// dropping null-tagged sub-tokens unless `keep_nulls` is set. Each
    /// sub-token's value is coerced to a sequence before concatenation.
    pub fn aggregate_sub_token_values(&mut self, keep_nulls: bool) {
        match std::mem::replace(&mut self.token.value, TokenValue::Empty) {
            TokenValue::Seq(subs) => {
                let mut flat = Vec::with_capacity(subs.len());
                for sub in subs {
                    if sub.is_null() && !keep_nulls {
                        continue;
                    }
                    flat.extend(sub.into_sub_tokens());
                }
                self.token.value = TokenValue::Seq(flat);
            }
            other => self.token.value = other,
        }
    }

    /// Concatenates this result's token-value sequence with `other`'s and
    /// adopts `other`'s residual unless an override is given.
    pub fn merge_result(
        self,
        other: ReadResult<'a>,
        residual_override: Option<&'a str>,
    ) -> ReadResult<'a> {
        let tag = self.token.tag;
        let residual = residual_override.unwrap_or(other.residual);
        let mut values = self.token.into_sub_tokens();
        values.extend(other.token.into_sub_tokens());
        ReadResult {
            token: Token::seq(tag, values),
            residual,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_null_token_detection() {
        assert!(Token::nothing().is_null());
        assert!(!Token::text(TokenTag::Nodes, "nodes").is_null());
    }

    #[test]
    fn test_remove_nulls_drops_placeholders() {
        let mut token = Token::seq(
            TokenTag::Query,
            vec![
                Token::text(TokenTag::Nodes, "nodes"),
                Token::nothing(),
                Token::text(TokenTag::DeviceType, "linux"),
                Token::nothing(),
            ],
        );
        token.remove_nulls();
        assert_eq!(
            token.sub_tokens().iter().map(|t| t.tag).collect::<Vec<_>>(),
            vec![TokenTag::Nodes, TokenTag::DeviceType]
        );
    }

    #[test]
    fn test_aggregate_flattens_one_level() {
        let inner = Token::seq(
            TokenTag::Folders,
            vec![
                Token::text(TokenTag::Folder, "A"),
                Token::text(TokenTag::Folder, "B"),
            ],
        );
        let mut result = ReadResult {
            token: Token::seq(
                TokenTag::NetworkMap,
                vec![
                    Token::text(TokenTag::NetworkAtlas, "Root"),
                    inner,
                    Token::nothing(),
                ],
            ),
            residual: "",
        };
        result.aggregate_sub_token_values(false);
        assert_eq!(
            result
                .token
                .sub_tokens()
                .iter()
                .map(|t| t.tag)
                .collect::<Vec<_>>(),
            vec![TokenTag::NetworkAtlas, TokenTag::Folder, TokenTag::Folder]
        );
    }

    #[test]
    fn test_aggregate_can_keep_nulls() {
        let mut result = ReadResult {
            token: Token::seq(
                TokenTag::Query,
                vec![Token::text(TokenTag::Nodes, "nodes"), Token::nothing()],
            ),
            residual: "",
        };
        result.aggregate_sub_token_values(true);
        assert_eq!(result.token.sub_tokens().len(), 2);
        assert!(result.token.sub_tokens()[1].is_null());
    }

    #[test]
    fn test_merge_adopts_other_residual() {
        let left = ReadResult {
            token: Token::seq(TokenTag::Query, vec![Token::text(TokenTag::Nodes, "nodes")]),
            residual: ".windows",
        };
        let right = ReadResult {
            token: Token::seq(
                TokenTag::Query,
                vec![Token::text(TokenTag::DeviceType, "windows")],
            ),
            residual: "",
        };
        let merged = left.merge_result(right, None);
        assert_eq!(merged.residual, "");
        assert_eq!(merged.token.sub_tokens().len(), 2);
    }

    #[test]
    fn test_merge_residual_override() {
        let left = ReadResult {
            token: Token::seq(TokenTag::Query, vec![]),
            residual: "abc",
        };
        let right = ReadResult {
            token: Token::seq(TokenTag::Query, vec![]),
            residual: "bc",
        };
        let merged = left.merge_result(right, Some("c"));
        assert_eq!(merged.residual, "c");
    }
}
