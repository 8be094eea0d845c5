//! Parsing of the ingredient and tag reference data files.
//!
//! `ingredients.csv` has the columns `name,measurement_unit` and `tags.csv`
//! has `name,color,slug`. Both start with a header row.

use std::io::Read;

use serde::Deserialize;

use crate::error::ReferenceDataError;

pub const DEFAULT_TAG_COLOR: &str = "#2A6CAA";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct IngredientRecord {
    pub name: String,
    pub measurement_unit: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TagRecord {
    pub name: String,
    #[serde(default)]
    pub color: String,
    pub slug: String,
}

pub fn parse_ingredients<R: Read>(reader: R) -> Result<Vec<IngredientRecord>, ReferenceDataError> {
    let mut csv_reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
    let mut records = Vec::new();

    for (index, result) in csv_reader.deserialize::<IngredientRecord>().enumerate() {
        let record = result?;
        // Data rows start on line 2, after the header
        let row = index + 2;
        if record.name.is_empty() {
            return Err(invalid(row, "ingredient name is empty"));
        }
        if record.measurement_unit.is_empty() {
            return Err(invalid(row, "measurement unit is empty"));
        }
        records.push(record);
    }

    Ok(records)
}

pub fn parse_tags<R: Read>(reader: R) -> Result<Vec<TagRecord>, ReferenceDataError> {
    let mut csv_reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
    let mut records = Vec::new();

    for (index, result) in csv_reader.deserialize::<TagRecord>().enumerate() {
        let mut record = result?;
        let row = index + 2;
        if record.name.is_empty() {
            return Err(invalid(row, "tag name is empty"));
        }
        if record.color.is_empty() {
            record.color = DEFAULT_TAG_COLOR.to_string();
        }
        if !is_hex_color(&record.color) {
            return Err(invalid(row, &format!("invalid color {:?}", record.color)));
        }
        if !is_slug(&record.slug) {
            return Err(invalid(row, &format!("invalid slug {:?}", record.slug)));
        }
        records.push(record);
    }

    Ok(records)
}

fn invalid(row: usize, message: &str) -> ReferenceDataError {
    ReferenceDataError::InvalidRow {
        row,
        message: message.to_string(),
    }
}

/// `#RRGGBB`
pub fn is_hex_color(value: &str) -> bool {
    value.len() == 7
        && value.starts_with('#')
        && value[1..].chars().all(|c| c.is_ascii_hexdigit())
}

pub fn is_slug(value: &str) -> bool {
    !value.is_empty()
        && value
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_ingredients() {
        let data = "name,measurement_unit\nабрикосовое варенье,г\n\"salt, sea\", g \n";
        let records = parse_ingredients(data.as_bytes()).unwrap();
        assert_eq!(
            records,
            vec![
                IngredientRecord {
                    name: "абрикосовое варенье".to_string(),
                    measurement_unit: "г".to_string(),
                },
                IngredientRecord {
                    name: "salt, sea".to_string(),
                    measurement_unit: "g".to_string(),
                },
            ]
        );
    }

    #[test]
    fn test_parse_ingredients_rejects_empty_unit() {
        let data = "name,measurement_unit\nflour,g\nsugar,\n";
        match parse_ingredients(data.as_bytes()) {
            Err(ReferenceDataError::InvalidRow { row, .. }) => assert_eq!(row, 3),
            other => panic!("expected invalid row, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_tags_defaults_color() {
        let data = "name,color,slug\nBreakfast,,breakfast\nDinner,#ff0000,dinner\n";
        let records = parse_tags(data.as_bytes()).unwrap();
        assert_eq!(records[0].color, DEFAULT_TAG_COLOR);
        assert_eq!(records[1].color, "#ff0000");
    }

    #[test]
    fn test_parse_tags_rejects_bad_slug() {
        let data = "name,color,slug\nLunch,#00ff00,lunch time\n";
        assert!(matches!(
            parse_tags(data.as_bytes()),
            Err(ReferenceDataError::InvalidRow { row: 2, .. })
        ));
    }

    #[test]
    fn test_hex_color() {
        assert!(is_hex_color("#2A6CAA"));
        assert!(!is_hex_color("2A6CAA"));
        assert!(!is_hex_color("#2A6CAZ"));
        assert!(!is_hex_color("#fff"));
    }
}
