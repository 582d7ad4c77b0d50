//! SQL for the detection query.

use std::num::NonZeroU32;

use crate::catalogue::ActionCatalogue;

/// Default Athena table holding the CloudTrail logs.
pub const DEFAULT_TABLE: &str = "cloudtrail_logs";

/// Build the detection query for the trailing `lookback_minutes` window.
///
/// Selects event time, event name, actor username and ARN, source IP and
/// region for every event whose name is in `catalogue`, newest first. The
/// window is evaluated by the engine against its own `current_timestamp`, so
/// the same inputs always produce the same text.
///
/// `table` is interpolated as-is and must already be a validated identifier
/// (see [`is_valid_table_name`]).
pub fn build_detection_query(
    lookback_minutes: NonZeroU32,
    catalogue: &ActionCatalogue,
    table: &str,
) -> String {
    let action_list = catalogue
        .actions()
        .map(quote_literal)
        .collect::<Vec<_>>()
        .join(",");

    format!(
        "SELECT
  eventtime,
  eventname,
  useridentity.userName AS username,
  useridentity.arn AS user_arn,
  sourceipaddress,
  awsregion
FROM {table}
WHERE eventname IN ({action_list})
  AND from_iso8601_timestamp(eventtime)
        > current_timestamp - interval '{lookback_minutes}' minute
ORDER BY eventtime DESC"
    )
}

/// Quote `value` as a SQL string literal, doubling embedded single quotes.
pub fn quote_literal(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

/// Table references may be `table` or `database.table`, built from ASCII
/// alphanumerics and underscores.
pub fn is_valid_table_name(name: &str) -> bool {
    !name.is_empty()
        && name.split('.').count() <= 2
        && name.split('.').all(|part| {
            !part.is_empty() && part.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
        })
}
