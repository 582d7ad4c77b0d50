use tracing::{info, warn};

use crate::athena::QueryService;
use crate::error::Result;
use crate::types::RawRow;

/// Fetch the data rows of a finished execution.
///
/// Reads a single result page and drops its first row, which Athena always
/// fills with the column names. A header-only or empty result is the normal
/// "nothing found" outcome and yields an empty vec.
pub fn fetch_result_rows(service: &dyn QueryService, execution_id: &str) -> Result<Vec<RawRow>> {
    let page = service.result_page(execution_id)?;
    if page.next_token.is_some() {
        warn!(execution_id, "result set spans several pages; only the first is read");
    }

    let data_rows: Vec<RawRow> = page.rows.into_iter().skip(1).collect();
    info!(execution_id, rows = data_rows.len(), "retrieved data rows from Athena");
    Ok(data_rows)
}
