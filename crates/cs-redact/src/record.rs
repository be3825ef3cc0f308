//! Card record shape.

use crate::CardField;
use serde::{Deserialize, Serialize};

/// An ordered batch of card records. Position is identity.
pub type RecordBatch = Vec<CardRecord>;

/// One payment card.
///
/// All fields are text so numeric values keep their leading zeros (`"03"`).
/// `Debug` prints field lengths only.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardRecord {
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "Family")]
    pub family: String,
    #[serde(rename = "CVC")]
    pub cvc: String,
    #[serde(rename = "Month")]
    pub month: String,
    #[serde(rename = "Year")]
    pub year: String,
    #[serde(rename = "Number")]
    pub number: String,
}

impl CardRecord {
    /// Create a record from its six values.
    pub fn new(
        name: impl Into<String>,
        family: impl Into<String>,
        cvc: impl Into<String>,
        month: impl Into<String>,
        year: impl Into<String>,
        number: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            family: family.into(),
            cvc: cvc.into(),
            month: month.into(),
            year: year.into(),
            number: number.into(),
        }
    }

    /// Borrow the value of a field.
    pub fn get(&self, field: CardField) -> &str {
        match field {
            CardField::Name => &self.name,
            CardField::Family => &self.family,
            CardField::Cvc => &self.cvc,
            CardField::Month => &self.month,
            CardField::Year => &self.year,
            CardField::Number => &self.number,
        }
    }

    /// Replace the value of a field.
    pub fn set(&mut self, field: CardField, value: String) {
        let slot = match field {
            CardField::Name => &mut self.name,
            CardField::Family => &mut self.family,
            CardField::Cvc => &mut self.cvc,
            CardField::Month => &mut self.month,
            CardField::Year => &mut self.year,
            CardField::Number => &mut self.number,
        };
        *slot = value;
    }
}

impl std::fmt::Debug for CardRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut s = f.debug_struct("CardRecord");
        for field in CardField::ALL {
            s.field(field.json_name(), &format_args!("<{} chars>", self.get(field).chars().count()));
        }
        s.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> CardRecord {
        CardRecord::new("Ann", "Lee", "123", "07", "2026", "4111111111111111")
    }

    #[test]
    fn test_get_set() {
        let mut record = sample();
        assert_eq!(record.get(CardField::Month), "07");

        record.set(CardField::Month, "08".to_string());
        assert_eq!(record.month, "08");
        assert_eq!(record.get(CardField::Year), "2026");
    }

    #[test]
    fn test_debug_hides_values() {
        let rendered = format!("{:?}", sample());
        assert!(!rendered.contains("4111111111111111"));
        assert!(!rendered.contains("Ann"));
        assert!(rendered.contains("Number: <16 chars>"));
    }

    #[test]
    fn test_json_field_names() {
        let json = serde_json::to_value(sample()).unwrap();
        assert_eq!(json["CVC"], "123");
        assert_eq!(json["Month"], "07");
        assert_eq!(json["Number"], "4111111111111111");
    }

    #[test]
    fn test_leading_zero_preserved() {
        let json = r#"{"Name":"A","Family":"B","CVC":"007","Month":"03","Year":"2030","Number":"0001"}"#;
        let record: CardRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.cvc, "007");
        assert_eq!(record.month, "03");
    }
}
