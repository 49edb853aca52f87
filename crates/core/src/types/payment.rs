//! Settlement currencies and payment instructions.
//!
//! Orders settle in exactly one of two tokens. The token is picked by the
//! buyer at order creation and decides which item price field is copied
//! into the order amount.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Settlement currency selected when placing an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
    /// The SLH token.
    #[default]
    Slh,
    /// Native BNB.
    Bnb,
}

impl PaymentMethod {
    /// Ticker shown in payment instructions.
    #[must_use]
    pub const fn symbol(self) -> &'static str {
        match self {
            Self::Slh => "SLH",
            Self::Bnb => "BNB",
        }
    }
}

impl std::fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Slh => write!(f, "slh"),
            Self::Bnb => write!(f, "bnb"),
        }
    }
}

/// Where and how much to pay for an order.
///
/// Computed from static configuration; every shop shares the same
/// destination address per currency.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentInstructions {
    /// Destination wallet address.
    pub to_address: String,
    /// Amount to transfer, in `symbol` units.
    pub amount: Decimal,
    /// Currency ticker (`SLH` or `BNB`).
    pub symbol: String,
    /// EVM chain ID of the settlement network.
    pub chain_id: u64,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_payment_method_wire_format() {
        assert_eq!(serde_json::to_string(&PaymentMethod::Bnb).unwrap(), "\"bnb\"");
        assert_eq!(
            serde_json::from_str::<PaymentMethod>("\"slh\"").unwrap(),
            PaymentMethod::Slh
        );
        assert!(serde_json::from_str::<PaymentMethod>("\"ton\"").is_err());
    }

    #[test]
    fn test_payment_method_symbols() {
        assert_eq!(PaymentMethod::Slh.symbol(), "SLH");
        assert_eq!(PaymentMethod::Bnb.symbol(), "BNB");
        assert_eq!(PaymentMethod::default(), PaymentMethod::Slh);
    }

    #[test]
    fn test_instructions_keep_amount_scale() {
        let instructions = PaymentInstructions {
            to_address: "0xabc".to_string(),
            amount: "39.0".parse().unwrap(),
            symbol: "SLH".to_string(),
            chain_id: 56,
        };
        let json = serde_json::to_value(&instructions).unwrap();
        assert_eq!(json["amount"], "39.0");
        assert_eq!(json["chain_id"], 56);
    }
}
