use std::sync::Arc;

use ect_core::{FieldMetadata, Formatter, MetadataResolver, Registry, Tracker};
use ect_delta::Node;

#[test]
fn top_level_readme_quickstart() -> Result<(), Box<dyn std::error::Error>> {
    let registry = Registry::new().with_field("Order", "count", FieldMetadata::named("Count"));
    let resolver = Arc::new(MetadataResolver::new(registry));
    let base = Node::from_json_str("{\"count\":1}")?.with_class("Order");
    let target = Node::from_json_str("{\"count\":2}")?.with_class("Order");

    let records = Tracker::new(Arc::clone(&resolver)).track(&base, &target)?;
    assert_eq!(records.len(), 1);

    let lines = Formatter::new(resolver).format_all(&records);
    assert_eq!(lines, ["Edited field [Count]: [1 => 2]"]);
    Ok(())
}
