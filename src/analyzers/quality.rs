//! Per-column data-quality counts.

use serde::Serialize;

/// Missing and unique value counts for one input column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ColumnQuality {
    pub column: String,
    pub missing: usize,
    pub unique: usize,
}

/// Counts missing (blank) and unique non-blank values per column.
///
/// Works on untyped rows so it reports whatever columns the file actually
/// has; a short row counts as missing for its absent trailing columns.
pub fn column_quality(headers: &[String], rows: &[csv::StringRecord]) -> Vec<ColumnQuality> {
    headers
        .iter()
        .enumerate()
        .map(|(index, column)| {
            let mut missing = 0usize;
            let mut seen = std::collections::HashSet::new();

            for row in rows {
                match row.get(index).map(str::trim) {
                    Some(value) if !value.is_empty() => {
                        seen.insert(value);
                    }
                    _ => missing += 1,
                }
            }

            ColumnQuality {
                column: column.clone(),
                missing,
                unique: seen.len(),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(fields: &[&str]) -> csv::StringRecord {
        csv::StringRecord::from(fields.to_vec())
    }

    #[test]
    fn test_counts_missing_and_unique() {
        let headers = vec!["Vehicle".to_string(), "End Location".to_string()];
        let rows = vec![
            row(&["14A", "Main St"]),
            row(&["14A", ""]),
            row(&["46", "Main St"]),
        ];

        let quality = column_quality(&headers, &rows);
        assert_eq!(
            quality,
            vec![
                ColumnQuality {
                    column: "Vehicle".to_string(),
                    missing: 0,
                    unique: 2
                },
                ColumnQuality {
                    column: "End Location".to_string(),
                    missing: 1,
                    unique: 1
                },
            ]
        );
    }

    #[test]
    fn test_short_rows_count_as_missing() {
        let headers = vec!["Vehicle".to_string(), "End Location".to_string()];
        let rows = vec![row(&["14A"])];

        let quality = column_quality(&headers, &rows);
        assert_eq!(quality[1].missing, 1);
        assert_eq!(quality[1].unique, 0);
    }
}
