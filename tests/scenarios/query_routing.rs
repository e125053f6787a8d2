//! Query scopes, routing and paging

use crate::common::*;

fn populated() -> Container {
    let container = example_container();
    for (id, partition, name) in [
        ("1", "2024-01-02", "Alex Turner"),
        ("2", "2024-01-01", "Alex Turner"),
        ("3", "2024-01-01", "John Smith"),
        ("4", "2024-01-03", "Alex Turner"),
        ("5", "2024-01-01", "Alex Turner"),
    ] {
        container
            .create_item(json!({"id": id, "myPartitionKey": partition, "name": name}))
            .unwrap();
    }
    container
}

fn ids(docs: impl IntoIterator<Item = Document>) -> Vec<String> {
    docs.into_iter().map(|d| d.id().to_string()).collect()
}

#[test]
fn scoped_query_yields_insertion_order() {
    let container = populated();
    let feed = container
        .query(&pk("2024-01-01"), "name = @n", [("@n", "Alex Turner")])
        .unwrap();
    assert_eq!(ids(feed), vec!["2", "5"]);
}

#[test]
fn upsert_keeps_position() {
    let container = populated();
    container
        .upsert_item(
            json!({"id": "2", "myPartitionKey": "2024-01-01", "name": "Alex Turner", "v": 2}),
            &ItemOptions::new(),
        )
        .unwrap();
    let feed = container.query(&pk("2024-01-01"), "", Vec::<(&str, &str)>::new()).unwrap();
    assert_eq!(ids(feed), vec!["2", "3", "5"]);
}

#[test]
fn pinned_partition_key_routes() {
    let container = populated();
    let query = QueryDefinition::new(
        "SELECT * FROM c WHERE c.myPartitionKey = @pk AND c.name = @name",
    )
    .with_parameter("@pk", "2024-01-03")
    .with_parameter("@name", "Alex Turner");
    let feed = container.query_items(&query, &QueryOptions::new()).unwrap();
    assert_eq!(ids(feed), vec!["4"]);
}

#[test]
fn explicit_partition_overrides_routing() {
    let container = populated();
    let query = QueryDefinition::new("myPartitionKey = @pk").with_parameter("pk", "2024-01-03");
    let feed = container
        .query_items(&query, &QueryOptions::new().with_partition_key("2024-01-01"))
        .unwrap();
    assert!(ids(feed).is_empty());
}

#[test]
fn cross_partition_fan_out() {
    let container = populated();
    let query = QueryDefinition::new("SELECT * FROM c WHERE c.name = @name")
        .with_parameter("name", "Alex Turner");
    let mut feed = container
        .query_items(&query, &QueryOptions::new().with_max_item_count(2))
        .unwrap();
    let mut pages = Vec::new();
    while feed.has_more_results() {
        pages.push(ids(feed.next_page()));
    }
    assert_eq!(
        pages,
        vec![vec!["2".to_string(), "5".to_string()], vec!["1".to_string(), "4".to_string()]]
    );
}

#[test]
fn feed_is_lazy() {
    let container = populated();
    let mut feed = container
        .query(&pk("2024-01-01"), "", Vec::<(&str, &str)>::new())
        .unwrap();
    assert_eq!(feed.next().map(|d| d.id().to_string()), Some("2".to_string()));

    // Changes after the feed started are seen per document
    container.delete_item("3", &pk("2024-01-01"), &ItemOptions::new()).unwrap();
    container
        .upsert_item(
            json!({"id": "5", "myPartitionKey": "2024-01-01", "name": "Changed"}),
            &ItemOptions::new(),
        )
        .unwrap();
    let rest: Vec<_> = feed.collect();
    assert_eq!(rest.len(), 1);
    assert_eq!(rest[0].get("name"), Some(&json!("Changed")));
}

#[test]
fn numeric_and_nested_fields() {
    let container = example_container();
    container
        .create_item(json!({"id": "a", "myPartitionKey": "p", "stats": {"score": 10}}))
        .unwrap();
    container
        .create_item(json!({"id": "b", "myPartitionKey": "p", "stats": {"score": 10.5}}))
        .unwrap();
    let feed = container
        .query(&pk("p"), "stats.score = @s", [("s", 10.0)])
        .unwrap();
    assert_eq!(ids(feed), vec!["a"]);
}

#[test]
fn invalid_queries() {
    let container = populated();
    let cases = [
        ("name = @missing", QueryDefinition::new("name = @missing")),
        ("name != @n", QueryDefinition::new("name != @n").with_parameter("n", 1)),
        (
            "unqualified",
            QueryDefinition::new("SELECT * FROM c WHERE name = @n").with_parameter("n", 1),
        ),
    ];
    for (label, query) in cases {
        let err = container.query_items(&query, &QueryOptions::new()).unwrap_err();
        assert!(err.is_invalid_query(), "{}", label);
    }
}
