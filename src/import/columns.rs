use csv::StringRecord;

use crate::models::guest::GuestFields;

use super::RowError;

/// Values of the `attend` column that mean "confirmed".
pub const TRUTHY_TOKENS: [&str; 6] = ["true", "1", "yes", "si", "y", "s"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Column {
    Name,
    Invitations,
    Cellphone,
    Attend,
    ExtraGuests,
    TableNumber,
}

impl Column {
    const ALL: [Column; 6] = [
        Column::Name,
        Column::Invitations,
        Column::Cellphone,
        Column::Attend,
        Column::ExtraGuests,
        Column::TableNumber,
    ];

    pub fn from_header(header: &str) -> Option<Self> {
        let key = header.trim_start_matches('\u{feff}').trim().to_lowercase();
        match key.as_str() {
            "name" => Some(Self::Name),
            "invitations" => Some(Self::Invitations),
            "cellphone" => Some(Self::Cellphone),
            "attend" => Some(Self::Attend),
            "extraguests" => Some(Self::ExtraGuests),
            "tablenumber" => Some(Self::TableNumber),
            _ => None,
        }
    }

    fn slot(self) -> usize {
        self as usize
    }
}

/// Position of each recognized column in the uploaded header.
#[derive(Debug, Clone, Default)]
pub struct ColumnMap {
    positions: [Option<usize>; Column::ALL.len()],
    width: usize,
}

impl ColumnMap {
    pub fn from_headers(headers: &StringRecord) -> Self {
        let mut map = Self {
            width: headers.len(),
            ..Default::default()
        };

        for (idx, header) in headers.iter().enumerate() {
            match Column::from_header(header) {
                Some(column) => map.positions[column.slot()] = Some(idx),
                None => tracing::debug!(column = header, "ignoring unrecognized CSV column"),
            }
        }
        map
    }

    pub fn has(&self, column: Column) -> bool {
        self.positions[column.slot()].is_some()
    }

    /// Raw cell for `column`, or "" when the header has no such column.
    pub fn cell<'r>(&self, record: &'r StringRecord, column: Column) -> &'r str {
        self.positions[column.slot()]
            .and_then(|idx| record.get(idx))
            .unwrap_or("")
    }

    /// Normalizes one data row into guest fields.
    pub fn read_row(&self, record: &StringRecord) -> Result<GuestFields, RowError> {
        if record.len() != self.width {
            return Err(RowError::Processing(format!(
                "Expected {} fields, found {}",
                self.width,
                record.len()
            )));
        }

        let name = self.cell(record, Column::Name).trim();
        if name.is_empty() {
            return Err(RowError::MissingRequiredField("Name"));
        }

        Ok(GuestFields {
            name: name.to_string(),
            invitations: parse_count(self.cell(record, Column::Invitations))?,
            cellphone: self.cell(record, Column::Cellphone).trim().to_string(),
            assists: parse_attend(self.cell(record, Column::Attend)),
            extra_guests: self.cell(record, Column::ExtraGuests).trim().to_string(),
            table_number: parse_count(self.cell(record, Column::TableNumber))?,
        })
    }
}

pub fn parse_attend(raw: &str) -> bool {
    let value = raw.trim().to_lowercase();
    TRUTHY_TOKENS.contains(&value.as_str())
}

/// Digit-only values parse to their integer; anything else (signs, decimals,
/// blanks) is 0. Digit-only values beyond `i32` fail the row.
pub fn parse_count(raw: &str) -> Result<i32, RowError> {
    let value = raw.trim();
    if value.is_empty() || !value.bytes().all(|b| b.is_ascii_digit()) {
        return Ok(0);
    }
    value
        .parse()
        .map_err(|_| RowError::Processing(format!("Number out of range: {value}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(cells: &[&str]) -> StringRecord {
        StringRecord::from(cells.to_vec())
    }

    #[test]
    fn truthy_tokens_are_case_and_whitespace_insensitive() {
        for raw in ["true", "TRUE", " 1 ", "Yes", "SI", "y", "S"] {
            assert!(parse_attend(raw), "{raw:?} should be truthy");
        }
        for raw in ["", "no", "false", "0", "sí", "yes please", "t"] {
            assert!(!parse_attend(raw), "{raw:?} should be falsy");
        }
    }

    #[test]
    fn counts_parse_only_digit_strings() {
        assert_eq!(parse_count("2").unwrap(), 2);
        assert_eq!(parse_count(" 007 ").unwrap(), 7);
        assert_eq!(parse_count("0").unwrap(), 0);
        for raw in ["", "  ", "-3", "2.5", "+4", "abc", "1e3", "٣"] {
            assert_eq!(parse_count(raw).unwrap(), 0, "{raw:?} should degrade to 0");
        }
    }

    #[test]
    fn oversized_counts_fail_the_row() {
        let err = parse_count("99999999999").unwrap_err();
        assert_eq!(err.to_string(), "Number out of range: 99999999999");
    }

    #[test]
    fn headers_match_case_insensitively_and_ignore_unknown_columns() {
        let map = ColumnMap::from_headers(&record(&[
            "\u{feff}NAME",
            "Notes",
            " ExtraGuests ",
            "tableNumber",
        ]));
        assert!(map.has(Column::Name));
        assert!(map.has(Column::ExtraGuests));
        assert!(map.has(Column::TableNumber));
        assert!(!map.has(Column::Attend));

        let row = record(&["Ana", "vegetarian", " Luis ", "4"]);
        assert_eq!(map.cell(&row, Column::Name), "Ana");
        assert_eq!(map.cell(&row, Column::Attend), "");
    }

    #[test]
    fn read_row_applies_defaults_for_missing_columns() {
        let map = ColumnMap::from_headers(&record(&["name"]));
        let fields = map.read_row(&record(&["  Ana  "])).unwrap();
        assert_eq!(
            fields,
            GuestFields {
                name: "Ana".into(),
                ..Default::default()
            }
        );
    }

    #[test]
    fn blank_name_is_rejected_regardless_of_other_fields() {
        let map = ColumnMap::from_headers(&record(&["name", "invitations", "attend"]));
        let err = map.read_row(&record(&["   ", "3", "yes"])).unwrap_err();
        assert_eq!(err.to_string(), "Name is required");
    }

    #[test]
    fn ragged_rows_are_row_errors() {
        let map = ColumnMap::from_headers(&record(&["name", "invitations"]));
        let err = map.read_row(&record(&["Ana"])).unwrap_err();
        assert!(matches!(err, RowError::Processing(_)));
    }
}
