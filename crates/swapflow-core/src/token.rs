//! Token categories a swap can belong to.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::SwapError;

/// The fixed set of token symbols.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Token {
    /// Bitcoin.
    #[serde(rename = "BTC")]
    Btc,
    /// Ether.
    #[serde(rename = "ETH")]
    Eth,
    /// KOL.
    #[serde(rename = "KOL")]
    Kol,
}

impl Token {
    /// Every supported token, in display order.
    pub const ALL: [Token; 3] = [Token::Btc, Token::Eth, Token::Kol];

    /// The symbol used in storage and as the sink label value.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Token::Btc => "BTC",
            Token::Eth => "ETH",
            Token::Kol => "KOL",
        }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Token {
    type Err = SwapError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Token::ALL
            .into_iter()
            .find(|token| token.as_str() == s)
            .ok_or_else(|| SwapError::UnknownToken(s.to_owned()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_accepts_every_symbol() {
        for token in Token::ALL {
            assert_eq!(token.as_str().parse::<Token>().unwrap(), token);
        }
    }

    #[test]
    fn test_parse_is_case_sensitive() {
        match "btc".parse::<Token>() {
            Err(SwapError::UnknownToken(symbol)) => assert_eq!(symbol, "btc"),
            other => panic!("expected UnknownToken, got {other:?}"),
        }
    }

    #[test]
    fn test_serde_uses_symbol() {
        assert_eq!(serde_json::to_value(Token::Kol).unwrap(), "KOL");
        let parsed: Token = serde_json::from_value(serde_json::json!("ETH")).unwrap();
        assert_eq!(parsed, Token::Eth);
    }
}
