use crate::output::{print_json, print_table, TableRow};
use crate::settings;
use serde::Serialize;
use std::path::Path;

#[derive(Serialize)]
struct CatalogueRow<'a> {
    action: &'a str,
    category: &'static str,
    techniques: &'static str,
}

impl TableRow for CatalogueRow<'_> {
    const HEADERS: &'static [&'static str] = &["ACTION", "CATEGORY", "TECHNIQUES"];

    fn cells(&self) -> Vec<String> {
        vec![
            self.action.to_string(),
            self.category.to_string(),
            self.techniques.to_string(),
        ]
    }
}

pub fn run(config_path: Option<&Path>, json: bool) -> anyhow::Result<()> {
    let cfg = settings::load(config_path, None)?;
    let catalogue = cfg.catalogue()?;

    let rows: Vec<CatalogueRow> = catalogue
        .entries()
        .iter()
        .map(|e| CatalogueRow {
            action: &e.action,
            category: e.category.label(),
            techniques: e.category.techniques(),
        })
        .collect();

    if json {
        return print_json(&rows);
    }

    print_table(&rows);
    Ok(())
}
