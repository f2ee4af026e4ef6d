use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use thiserror::Error;

macro_rules! id_newtype {
    ($name:ident) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub struct $name(pub i64);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl FromStr for $name {
            type Err = std::num::ParseIntError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                s.trim().parse::<i64>().map($name)
            }
        }
    };
}

id_newtype!(TierId);

/// The fixed set of tier fields shown as columns by the editor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TierField {
    Level,
    Name,
    Label,
    CountFloor,
}

impl TierField {
    pub const ALL: [TierField; 4] = [
        TierField::Level,
        TierField::Name,
        TierField::Label,
        TierField::CountFloor,
    ];

    pub fn api_name(self) -> &'static str {
        match self {
            TierField::Level => "level",
            TierField::Name => "name",
            TierField::Label => "label",
            TierField::CountFloor => "count_floor",
        }
    }

    pub fn default_label(self) -> &'static str {
        match self {
            TierField::Level => "Level",
            TierField::Name => "Name",
            TierField::Label => "Label",
            TierField::CountFloor => "Count Floor",
        }
    }

    /// Level is assigned once when the record is created.
    pub fn is_read_only(self) -> bool {
        matches!(self, TierField::Level)
    }

    pub fn from_api_name(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|field| field.api_name().eq_ignore_ascii_case(name.trim()))
    }
}

impl fmt::Display for TierField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.api_name())
    }
}

impl FromStr for TierField {
    type Err = FieldEditError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_api_name(s).ok_or_else(|| FieldEditError::UnknownField(s.to_string()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FieldEditError {
    #[error("unknown tier field '{0}'")]
    UnknownField(String),
    #[error("field '{0}' is read-only")]
    ReadOnly(TierField),
    #[error("field '{field}' expects a number, got '{value}'")]
    InvalidNumber { field: TierField, value: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TierRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<TierId>,
    pub level: u32,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub count_floor: Option<f64>,
}

impl TierRecord {
    /// Unsaved record with every editable field empty.
    pub fn blank(level: u32) -> Self {
        Self {
            id: None,
            level,
            name: String::new(),
            label: String::new(),
            count_floor: None,
        }
    }

    pub fn is_new(&self) -> bool {
        self.id.is_none()
    }

    /// Applies a raw input value to an editable field. An empty count
    /// floor clears it.
    pub fn set_field(&mut self, field: TierField, value: &str) -> Result<(), FieldEditError> {
        match field {
            TierField::Level => return Err(FieldEditError::ReadOnly(field)),
            TierField::Name => self.name = value.to_string(),
            TierField::Label => self.label = value.to_string(),
            TierField::CountFloor => {
                let trimmed = value.trim();
                self.count_floor = if trimmed.is_empty() {
                    None
                } else {
                    let number = trimmed
                        .parse::<f64>()
                        .ok()
                        .filter(|number| number.is_finite())
                        .ok_or_else(|| FieldEditError::InvalidNumber {
                            field,
                            value: value.to_string(),
                        })?;
                    Some(number)
                };
            }
        }
        Ok(())
    }

    /// Display text of a field, as an input widget would hold it.
    pub fn field_text(&self, field: TierField) -> String {
        match field {
            TierField::Level => self.level.to_string(),
            TierField::Name => self.name.clone(),
            TierField::Label => self.label.clone(),
            TierField::CountFloor => self
                .count_floor
                .map(|value| value.to_string())
                .unwrap_or_default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_record_has_only_level() {
        let record = TierRecord::blank(3);
        assert!(record.is_new());
        assert_eq!(record.level, 3);
        assert!(record.name.is_empty());
        assert!(record.label.is_empty());
        assert_eq!(record.count_floor, None);
    }

    #[test]
    fn level_cannot_be_edited() {
        let mut record = TierRecord::blank(1);
        let err = record.set_field(TierField::Level, "7").expect_err("read-only");
        assert_eq!(err, FieldEditError::ReadOnly(TierField::Level));
        assert_eq!(record.level, 1);
    }

    #[test]
    fn count_floor_parses_and_clears() {
        let mut record = TierRecord::blank(1);
        record.set_field(TierField::CountFloor, " 25 ").expect("number");
        assert_eq!(record.count_floor, Some(25.0));
        assert_eq!(record.field_text(TierField::CountFloor), "25");
        record.set_field(TierField::CountFloor, "2.5").expect("decimal");
        assert_eq!(record.count_floor, Some(2.5));
        assert_eq!(record.field_text(TierField::CountFloor), "2.5");
        record.set_field(TierField::CountFloor, "").expect("clear");
        assert_eq!(record.count_floor, None);

        let err = record
            .set_field(TierField::CountFloor, "lots")
            .expect_err("not a number");
        assert!(matches!(err, FieldEditError::InvalidNumber { .. }));
        record
            .set_field(TierField::CountFloor, "NaN")
            .expect_err("not finite");
    }

    #[test]
    fn field_names_round_trip_through_api_names() {
        for field in TierField::ALL {
            assert_eq!(field.api_name().parse::<TierField>().expect("known"), field);
        }
        assert!("Count_Floor".parse::<TierField>().is_ok());
        assert!("colour".parse::<TierField>().is_err());
    }

    #[test]
    fn unsaved_record_omits_id_on_the_wire() {
        let json = serde_json::to_value(TierRecord::blank(2)).expect("json");
        assert!(json.get("id").is_none());
        assert_eq!(json["level"], 2);
        assert!(json["count_floor"].is_null());
    }
}
