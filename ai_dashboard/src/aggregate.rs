//! Group-by aggregations producing ranked TOP-3 lists.
//!
//! Rows with an empty group key or an empty target cell are left out of the
//! aggregation, so every group that appears has at least one contributing
//! row. Ranking is descending by the statistic; equal statistics fall back
//! to the group name, ascending.

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

use crate::error::{ReportError, Result};
use crate::table::{cell, parse_flag, parse_number, Table};

/// Maximum number of groups kept in a ranked result.
pub const TOP_N: usize = 3;

/// Share of flagged rows within one group.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProportionResult {
    pub name: String,
    /// Percentage, rounded to 2 decimals.
    pub proportion: f64,
    pub count: u64,
    pub total: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MedianResult {
    pub name: String,
    /// Rounded to 4 decimals.
    pub median: f64,
}

impl fmt::Display for ProportionResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {:.2}% ({}/{})",
            self.name, self.proportion, self.count, self.total
        )
    }
}

impl fmt::Display for MedianResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {:.4}", self.name, self.median)
    }
}

#[derive(Debug, Default, PartialEq, Clone)]
struct FlagStats {
    total: u64,
    flagged: u64,
}

/// Round half-to-even at `decimals` places.
pub fn round_to(value: f64, decimals: i32) -> f64 {
    let scale = 10f64.powi(decimals);
    (value * scale).round_ties_even() / scale
}

fn flag_rate(stats: &FlagStats) -> f64 {
    stats.flagged as f64 / stats.total as f64 * 100.0
}

/// Median of a non-empty slice.
fn median(values: &mut [f64]) -> f64 {
    values.sort_by(|a, b| a.total_cmp(b));
    let mid = values.len() / 2;
    if values.len() % 2 == 0 {
        (values[mid - 1] + values[mid]) / 2.0
    } else {
        values[mid]
    }
}

fn rank_desc(a: f64, b: f64, a_name: &str, b_name: &str) -> Ordering {
    b.partial_cmp(&a)
        .unwrap_or(Ordering::Equal)
        .then_with(|| a_name.cmp(b_name))
}

/// Percentage of rows per `group_column` group whose `flag_column` is true.
pub fn proportion_by_group(
    table: &Table,
    group_column: &str,
    flag_column: &str,
) -> Result<Vec<ProportionResult>> {
    let group_idx = table.column_index(group_column)?;
    let flag_idx = table.column_index(flag_column)?;

    let mut groups: BTreeMap<&str, FlagStats> = BTreeMap::new();
    for (row_no, record) in table.rows().enumerate() {
        let (Some(key), Some(raw)) = (cell(record, group_idx), cell(record, flag_idx)) else {
            continue;
        };
        let flag = parse_flag(raw).ok_or_else(|| ReportError::InvalidValue {
            column: flag_column.to_string(),
            row: row_no + 1,
            value: raw.to_string(),
        })?;

        let entry = groups.entry(key).or_default();
        entry.total += 1;
        if flag {
            entry.flagged += 1;
        }
    }

    let mut results: Vec<ProportionResult> = groups
        .into_iter()
        .map(|(name, stats)| ProportionResult {
            name: name.to_string(),
            proportion: round_to(flag_rate(&stats), 2),
            count: stats.flagged,
            total: stats.total,
        })
        .collect();

    results.sort_by(|a, b| rank_desc(a.proportion, b.proportion, &a.name, &b.name));
    results.truncate(TOP_N);
    Ok(results)
}

/// Median of `value_column` per `group_column` group.
pub fn median_by_group(
    table: &Table,
    group_column: &str,
    value_column: &str,
) -> Result<Vec<MedianResult>> {
    let group_idx = table.column_index(group_column)?;
    let value_idx = table.column_index(value_column)?;

    let mut groups: BTreeMap<&str, Vec<f64>> = BTreeMap::new();
    for (row_no, record) in table.rows().enumerate() {
        let (Some(key), Some(raw)) = (cell(record, group_idx), cell(record, value_idx)) else {
            continue;
        };
        let value = parse_number(raw).ok_or_else(|| ReportError::InvalidValue {
            column: value_column.to_string(),
            row: row_no + 1,
            value: raw.to_string(),
        })?;
        groups.entry(key).or_default().push(value);
    }

    let mut results: Vec<MedianResult> = groups
        .into_iter()
        .map(|(name, mut values)| MedianResult {
            name: name.to_string(),
            median: round_to(median(&mut values), 4),
        })
        .collect();

    results.sort_by(|a, b| rank_desc(a.median, b.median, &a.name, &b.name));
    results.truncate(TOP_N);
    Ok(results)
}

#[cfg(test)]
mod tests {
    use super::*;
    use csv::StringRecord;

    fn make_table(headers: &[&str], rows: &[&[&str]]) -> Table {
        Table::new(
            headers.iter().map(|h| h.to_string()).collect(),
            rows.iter().map(|r| StringRecord::from(r.to_vec())).collect(),
        )
    }

    fn flag_table(rows: &[(&str, bool)]) -> Table {
        let rows: Vec<Vec<&str>> = rows
            .iter()
            .map(|(g, f)| vec![*g, if *f { "True" } else { "False" }])
            .collect();
        let refs: Vec<&[&str]> = rows.iter().map(|r| r.as_slice()).collect();
        make_table(&["agent_type", "multimodal_capability"], &refs)
    }

    fn score_table(rows: &[(&str, &str)]) -> Table {
        let rows: Vec<Vec<&str>> = rows.iter().map(|(g, v)| vec![*g, *v]).collect();
        let refs: Vec<&[&str]> = rows.iter().map(|r| r.as_slice()).collect();
        make_table(&["task_category", "bias_detection_score"], &refs)
    }

    #[test]
    fn test_equal_proportions_break_ties_by_name() {
        let mut rows = vec![];
        // B first in input order, A must still rank first
        rows.extend([("B", true), ("B", true), ("B", true)]);
        rows.extend([("B", false), ("B", false), ("B", false)]);
        rows.extend([("A", true), ("A", true), ("A", false), ("A", false)]);
        let table = flag_table(&rows);

        let result = proportion_by_group(&table, "agent_type", "multimodal_capability").unwrap();

        assert_eq!(
            result,
            vec![
                ProportionResult {
                    name: "A".to_string(),
                    proportion: 50.0,
                    count: 2,
                    total: 4
                },
                ProportionResult {
                    name: "B".to_string(),
                    proportion: 50.0,
                    count: 3,
                    total: 6
                },
            ]
        );
    }

    #[test]
    fn test_proportion_keeps_top_three() {
        let table = flag_table(&[
            ("Low", false),
            ("Low", true),
            ("Low", false),
            ("High", true),
            ("Mid", true),
            ("Mid", false),
            ("None", false),
            ("Third", true),
            ("Third", true),
            ("Third", false),
        ]);

        let result = proportion_by_group(&table, "agent_type", "multimodal_capability").unwrap();
        let names: Vec<&str> = result.iter().map(|r| r.name.as_str()).collect();

        assert_eq!(names, vec!["High", "Third", "Mid"]);
        assert_eq!(result[1].proportion, 66.67);
        assert_eq!(result[2].proportion, 50.0);
    }

    #[test]
    fn test_proportion_skips_missing_cells() {
        let table = make_table(
            &["agent_type", "multimodal_capability"],
            &[&["Chatbot", "True"], &["", "True"], &["Chatbot", ""], &["Chatbot", "False"]],
        );

        let result = proportion_by_group(&table, "agent_type", "multimodal_capability").unwrap();

        assert_eq!(result.len(), 1);
        assert_eq!(result[0].count, 1);
        assert_eq!(result[0].total, 2);
    }

    #[test]
    fn test_proportion_grouping_is_case_sensitive() {
        let table = flag_table(&[("chatbot", true), ("Chatbot", false)]);
        let result = proportion_by_group(&table, "agent_type", "multimodal_capability").unwrap();
        assert_eq!(result.len(), 2);
    }

    #[test]
    fn test_proportion_rejects_unparseable_flag() {
        let table = make_table(
            &["agent_type", "multimodal_capability"],
            &[&["Chatbot", "True"], &["Chatbot", "sometimes"]],
        );

        let err = proportion_by_group(&table, "agent_type", "multimodal_capability").unwrap_err();
        assert_eq!(
            err.to_string(),
            r#"invalid value "sometimes" in column 'multimodal_capability' at data row 2"#
        );
        match err {
            ReportError::InvalidValue { column, row, value } => {
                assert_eq!(column, "multimodal_capability");
                assert_eq!(row, 2);
                assert_eq!(value, "sometimes");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_proportion_missing_column() {
        let table = flag_table(&[("A", true)]);
        let err = proportion_by_group(&table, "model_architecture", "multimodal_capability")
            .unwrap_err();
        assert!(matches!(err, ReportError::MissingColumn { column, .. } if column == "model_architecture"));
    }

    #[test]
    fn test_median_odd_group() {
        let table = score_table(&[("Research", "0.9"), ("Research", "0.1"), ("Research", "0.5")]);
        let result = median_by_group(&table, "task_category", "bias_detection_score").unwrap();

        assert_eq!(
            result,
            vec![MedianResult {
                name: "Research".to_string(),
                median: 0.5
            }]
        );
    }

    #[test]
    fn test_median_even_group_averages_middle() {
        let table = score_table(&[
            ("Coding", "0.8"),
            ("Coding", "0.2"),
            ("Coding", "0.6"),
            ("Coding", "0.4"),
        ]);
        let result = median_by_group(&table, "task_category", "bias_detection_score").unwrap();

        assert!((result[0].median - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_median_ranks_descending_and_rounds() {
        let table = score_table(&[
            ("A", "0.12344"),
            ("B", "0.9"),
            ("C", "0.3"),
            ("D", "0.6"),
            ("D", ""),
        ]);
        let result = median_by_group(&table, "task_category", "bias_detection_score").unwrap();
        let names: Vec<&str> = result.iter().map(|r| r.name.as_str()).collect();

        assert_eq!(names, vec!["B", "D", "C"]);
        assert_eq!(result[1].median, 0.6);

        let only_a = score_table(&[("A", "0.12344")]);
        let result = median_by_group(&only_a, "task_category", "bias_detection_score").unwrap();
        assert_eq!(result[0].median, 0.1234);
    }

    #[test]
    fn test_median_rejects_non_numeric() {
        let table = score_table(&[("A", "0.4"), ("A", "high")]);
        let err = median_by_group(&table, "task_category", "bias_detection_score").unwrap_err();
        assert!(matches!(err, ReportError::InvalidValue { row: 2, .. }));
    }

    #[test]
    fn test_empty_table_yields_empty_results() {
        let table = flag_table(&[]);
        assert!(proportion_by_group(&table, "agent_type", "multimodal_capability")
            .unwrap()
            .is_empty());

        let table = score_table(&[]);
        assert!(median_by_group(&table, "task_category", "bias_detection_score")
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_round_to_is_half_even() {
        assert_eq!(round_to(0.125, 2), 0.12);
        assert_eq!(round_to(0.375, 2), 0.38);
        assert_eq!(round_to(100.0 / 3.0, 2), 33.33);
        assert_eq!(round_to(0.5, 4), 0.5);
    }

    #[test]
    fn test_display() {
        let p = ProportionResult {
            name: "Chatbot".to_string(),
            proportion: 50.0,
            count: 2,
            total: 4,
        };
        assert_eq!(p.to_string(), "Chatbot: 50.00% (2/4)");

        let m = MedianResult {
            name: "Coding".to_string(),
            median: 0.5,
        };
        assert_eq!(m.to_string(), "Coding: 0.5000");
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        fn groups() -> impl Strategy<Value = Vec<(u8, bool, u16)>> {
            prop::collection::vec((0u8..6, any::<bool>(), 0u16..=1000), 0..60)
        }

        fn build(rows: &[(u8, bool, u16)]) -> Table {
            let records = rows
                .iter()
                .map(|(g, f, s)| {
                    StringRecord::from(vec![
                        format!("group-{g}"),
                        f.to_string(),
                        format!("{}", *s as f64 / 1000.0),
                    ])
                })
                .collect();
            Table::new(
                vec![
                    "agent_type".to_string(),
                    "multimodal_capability".to_string(),
                    "bias_detection_score".to_string(),
                ],
                records,
            )
        }

        proptest! {
            #![proptest_config(ProptestConfig::with_cases(64))]

            #[test]
            fn proportion_results_are_bounded_and_consistent(rows in groups()) {
                let table = build(&rows);
                let distinct: std::collections::BTreeSet<u8> = rows.iter().map(|r| r.0).collect();
                let result = proportion_by_group(&table, "agent_type", "multimodal_capability").unwrap();

                prop_assert!(result.len() <= TOP_N);
                prop_assert!(result.len() <= distinct.len());
                for r in &result {
                    prop_assert!(r.count <= r.total);
                    prop_assert!(r.total > 0);
                    prop_assert!((0.0..=100.0).contains(&r.proportion));
                    prop_assert_eq!(r.proportion, round_to(r.count as f64 / r.total as f64 * 100.0, 2));
                }
                for pair in result.windows(2) {
                    prop_assert!(pair[0].proportion >= pair[1].proportion);
                }
            }

            #[test]
            fn median_results_are_non_increasing(rows in groups()) {
                let table = build(&rows);
                let result = median_by_group(&table, "agent_type", "bias_detection_score").unwrap();

                prop_assert!(result.len() <= TOP_N);
                for pair in result.windows(2) {
                    prop_assert!(pair[0].median >= pair[1].median);
                    if pair[0].median == pair[1].median {
                        prop_assert!(pair[0].name < pair[1].name);
                    }
                }
            }
        }
    }
}
