//! Card fields and their built-in transformation classes.

use crate::TransformClass;
use serde::{Deserialize, Serialize};

/// One of the six fields of a card record.
///
/// Serialized with the document's field names so a policy file and a card
/// document agree on spelling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum CardField {
    /// Holder first name
    Name,
    /// Holder last name
    Family,
    /// Verification code
    #[serde(rename = "CVC")]
    Cvc,
    /// Expiry month, two digits
    Month,
    /// Expiry year
    Year,
    /// Card number
    Number,
}

impl CardField {
    /// Every field of the record shape, in document order.
    pub const ALL: [CardField; 6] = [
        CardField::Name,
        CardField::Family,
        CardField::Cvc,
        CardField::Month,
        CardField::Year,
        CardField::Number,
    ];

    /// Returns the built-in class for this field.
    pub fn default_class(&self) -> TransformClass {
        match self {
            CardField::Name => TransformClass::Encrypt,
            CardField::Family => TransformClass::Encrypt,
            CardField::Cvc => TransformClass::Digest,
            CardField::Month => TransformClass::Encrypt,
            CardField::Year => TransformClass::Encrypt,
            CardField::Number => TransformClass::Digest,
        }
    }

    /// Field name as it appears in a card document.
    pub fn json_name(&self) -> &'static str {
        match self {
            CardField::Name => "Name",
            CardField::Family => "Family",
            CardField::Cvc => "CVC",
            CardField::Month => "Month",
            CardField::Year => "Year",
            CardField::Number => "Number",
        }
    }

    /// Parse a field from its document name or a common alias.
    pub fn parse_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "name" | "first_name" => Some(CardField::Name),
            "family" | "last_name" => Some(CardField::Family),
            "cvc" | "cvv" => Some(CardField::Cvc),
            "month" | "expiry_month" => Some(CardField::Month),
            "year" | "expiry_year" => Some(CardField::Year),
            "number" | "card_number" => Some(CardField::Number),
            _ => None,
        }
    }
}

impl std::fmt::Display for CardField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.json_name())
    }
}

impl std::str::FromStr for CardField {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CardField::parse_str(s).ok_or_else(|| format!("unknown card field: {}", s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_classes() {
        let digests: Vec<_> = CardField::ALL
            .iter()
            .filter(|f| f.default_class() == TransformClass::Digest)
            .collect();
        assert_eq!(digests, vec![&CardField::Cvc, &CardField::Number]);
    }

    #[test]
    fn test_parse_roundtrip() {
        for field in CardField::ALL {
            assert_eq!(CardField::parse_str(field.json_name()), Some(field));
        }
        assert_eq!(CardField::parse_str("card_number"), Some(CardField::Number));
        assert_eq!(CardField::parse_str("pin"), None);
    }

    #[test]
    fn test_serde_uses_document_names() {
        assert_eq!(serde_json::to_string(&CardField::Cvc).unwrap(), "\"CVC\"");
        assert_eq!(serde_json::to_string(&CardField::Family).unwrap(), "\"Family\"");
    }
}
