//! Maps raw result rows onto [`Finding`]s by column position.
//!
//! Column order follows the detection query's SELECT list:
//!
//! | position | column            | field           |
//! |----------|-------------------|-----------------|
//! | 0        | `eventtime`       | `event_time`    |
//! | 1        | `eventname`       | `event_name`    |
//! | 2        | `username`        | `user_identity` |
//! | 3        | `user_arn`        | not surfaced    |
//! | 4        | `sourceipaddress` | `source_ip`     |
//! | 5        | `awsregion`       | `region`        |

use crate::catalogue::ActionCatalogue;
use crate::types::{Finding, RawRow};

const EVENT_TIME: usize = 0;
const EVENT_NAME: usize = 1;
const USER_IDENTITY: usize = 2;
const SOURCE_IP: usize = 4;
const REGION: usize = 5;

/// Build a finding from one row. Never fails: cells past the end of a short
/// row become empty strings, and the row is still reported.
pub fn parse_row(row: &RawRow, catalogue: &ActionCatalogue) -> Finding {
    let event_name = row.cell(EVENT_NAME).to_string();
    Finding {
        event_time: row.cell(EVENT_TIME).to_string(),
        category: catalogue.category_of(&event_name),
        event_name,
        user_identity: row.cell(USER_IDENTITY).to_string(),
        source_ip: row.cell(SOURCE_IP).to_string(),
        region: row.cell(REGION).to_string(),
    }
}

/// One finding per row, in row order.
pub fn parse_rows(rows: &[RawRow], catalogue: &ActionCatalogue) -> Vec<Finding> {
    rows.iter().map(|row| parse_row(row, catalogue)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalogue::ThreatCategory;

    fn row(cells: &[&str]) -> RawRow {
        cells.iter().copied().collect()
    }

    #[test]
    fn full_row_skips_the_arn_column() {
        let finding = parse_row(
            &row(&[
                "2024-05-01T10:00:00Z",
                "AttachUserPolicy",
                "mallory",
                "arn:aws:iam::123456789012:user/mallory",
                "203.0.113.7",
                "eu-west-1",
            ]),
            &ActionCatalogue::default(),
        );
        assert_eq!(finding.event_time, "2024-05-01T10:00:00Z");
        assert_eq!(finding.event_name, "AttachUserPolicy");
        assert_eq!(finding.user_identity, "mallory");
        assert_eq!(finding.source_ip, "203.0.113.7");
        assert_eq!(finding.region, "eu-west-1");
        assert_eq!(finding.category, Some(ThreatCategory::PrivilegeEscalation));
    }

    #[test]
    fn short_row_degrades_to_empty_fields() {
        let finding = parse_row(
            &row(&["2024-05-01T10:00:00Z", "DeleteTrail"]),
            &ActionCatalogue::default(),
        );
        assert_eq!(finding.event_time, "2024-05-01T10:00:00Z");
        assert_eq!(finding.event_name, "DeleteTrail");
        assert_eq!(finding.user_identity, "");
        assert_eq!(finding.source_ip, "");
        assert_eq!(finding.region, "");
        assert_eq!(finding.category, Some(ThreatCategory::DefenseEvasion));
    }

    #[test]
    fn empty_row_still_yields_a_finding() {
        let findings = parse_rows(&[row(&[]), row(&["t", "GetObject"])], &ActionCatalogue::default());
        assert_eq!(findings.len(), 2);
        assert_eq!(findings[0].event_name, "");
        assert_eq!(findings[0].category, None);
    }

    #[test]
    fn timestamps_are_not_reparsed() {
        let finding = parse_row(&row(&["not-a-date", "GetObject"]), &ActionCatalogue::default());
        assert_eq!(finding.event_time, "not-a-date");
    }
}
