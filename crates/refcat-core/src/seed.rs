//! Demo dataset for local runs and tests.

use serde_json::json;
use tracing::info;

use crate::error::Error;
use crate::schema::derive_schema;
use crate::service::CatalogService;

/// Load two sections, two indicator types and three indicators.
///
/// Does nothing if any section already exists. Returns whether data was
/// loaded.
pub fn seed_demo(service: &CatalogService) -> Result<bool, Error> {
    let section = service.resolve("section")?;
    let mut session = service.store().session()?;
    if session.count(section)? > 0 {
        info!("demo data already present");
        return Ok(false);
    }

    let fixtures = [
        (
            "section",
            json!([
                {"id": 1, "title": "Section 1", "description": ""},
                {"id": 2, "title": "Section 2", "description": ""},
            ]),
        ),
        (
            "indicator_types",
            json!([
                {"id": 1, "title": "Type 1", "description": "Type 1 description", "section_id": 1},
                {"id": 2, "title": "Type 2", "description": "Type 2 description", "section_id": 2},
            ]),
        ),
        (
            "indicators",
            json!([
                {"id": 1, "title": "Indicator 1", "value_type_id": 1, "is_used": true},
                {"id": 2, "title": "Indicator 2", "value_type_id": 2, "is_used": false},
                {"id": 3, "title": "Indicator 3", "value_type_id": 1, "is_used": true},
            ]),
        ),
    ];

    for (catalog, rows) in fixtures {
        let model = service.resolve(catalog)?;
        // Fixtures carry their own keys, so nothing is excluded.
        let batch = derive_schema(model, &[], false)?.validate_payload(&rows)?;
        let inserted = session.insert_batch(model, &batch)?;
        info!(catalog, inserted, "demo rows loaded");
    }

    Ok(true)
}
