//! The sample script's full flow against `ExampleContainer`

use crate::common::*;

#[test]
fn sample_script_flow() {
    let container = example_container();

    // Create
    let created = container.create_item(sample_document("Item1")).unwrap();
    assert_eq!(created.id(), "Item1");

    // Read
    let partition = pk("2024-01-01");
    let read = container.read_item("Item1", &partition).unwrap();
    assert_eq!(read, created);

    // Query without an explicit partition; the filter pins it
    let query = QueryDefinition::new(
        "SELECT * FROM c WHERE c.myPartitionKey = @myPartitionKey AND c.name = @nameFilter",
    )
    .with_parameter("@myPartitionKey", "2024-01-01")
    .with_parameter("@nameFilter", "John Smith");
    let mut feed = container.query_items(&query, &QueryOptions::new()).unwrap();
    let mut results = Vec::new();
    while feed.has_more_results() {
        results.extend(feed.next_page());
    }
    assert_eq!(results, vec![read.clone()]);

    // Upsert using the token pulled from the rendered document
    let mut rendered = read.to_json();
    let etag = rendered["_etag"].as_str().unwrap().to_string();
    rendered["name"] = json!("Alex Turner");
    let upserted = container
        .upsert_item(rendered, &ItemOptions::if_match(etag.as_str()))
        .unwrap();
    assert_ne!(upserted.etag().as_str(), etag);
    assert_eq!(upserted.get("name"), Some(&json!("Alex Turner")));

    // Patch
    let ops = [
        PatchOperation::add("/color", "silver"),
        PatchOperation::remove("/bool"),
        PatchOperation::increment("/number", 50.0),
        PatchOperation::add("/childArray/-", "strawberry"),
    ];
    let patched = container
        .patch_item("Item1", &partition, &ops, &ItemOptions::new())
        .unwrap();
    assert_eq!(
        patched.body().as_inner(),
        &json!({
            "id": "Item1",
            "myPartitionKey": "2024-01-01",
            "name": "Alex Turner",
            "number": 51.0,
            "color": "silver",
            "childObject": {"someProperty": "someValue"},
            "childArray": ["apple", "orange", "strawberry"]
        })
    );

    // Delete
    container
        .delete_item("Item1", &partition, &ItemOptions::new())
        .unwrap();
    let err = container.read_item("Item1", &partition).unwrap_err();
    assert!(err.is_not_found());
    assert_eq!(err.status_code(), 404);
    assert_eq!(container.partition_count(), 0);
}
