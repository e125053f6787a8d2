//! Create / read / upsert / delete lifecycle

use crate::common::*;

#[test]
fn create_read_upsert_query_patch_delete() {
    let container = example_container();
    let partition = pk("2024-01-01");

    let created = container
        .create_item(json!({"id": "A", "myPartitionKey": "2024-01-01", "name": "John Smith"}))
        .unwrap();
    let read = container.read_item("A", &partition).unwrap();
    assert_eq!(read, created);
    assert_eq!(read.get("name"), Some(&json!("John Smith")));
    let t1 = read.etag().clone();

    let updated = container
        .upsert_item(
            json!({"id": "A", "myPartitionKey": "2024-01-01", "name": "Alex Turner"}),
            &ItemOptions::if_match(t1.clone()),
        )
        .unwrap();
    let t2 = updated.etag().clone();
    assert_ne!(t1, t2);

    // The first token is now stale
    let err = container
        .upsert_item(
            json!({"id": "A", "myPartitionKey": "2024-01-01", "name": "Someone Else"}),
            &ItemOptions::if_match(t1),
        )
        .unwrap_err();
    assert!(err.is_precondition_failed());
    assert_eq!(container.read_item("A", &partition).unwrap(), updated);

    let found: Vec<_> = container
        .query(&partition, "name = @n", [("n", "Alex Turner")])
        .unwrap()
        .collect();
    assert_eq!(found, vec![updated.clone()]);

    let err = container
        .patch_item("A", &partition, &[PatchOperation::remove("/bool")], &ItemOptions::new())
        .unwrap_err();
    assert!(err.is_invalid_patch());
    assert_eq!(container.read_item("A", &partition).unwrap(), updated);

    container.delete_item("A", &partition, &ItemOptions::new()).unwrap();
    assert!(container.read_item("A", &partition).unwrap_err().is_not_found());
    assert_eq!(container.item_count(), 0);
}

#[test]
fn read_is_side_effect_free() {
    let container = example_container();
    let created = container.create_item(doc("A", "p")).unwrap();
    for _ in 0..3 {
        assert_eq!(container.read_item("A", &pk("p")).unwrap(), created);
    }
}

#[test]
fn every_write_changes_the_token() {
    let container = example_container();
    let mut seen = vec![container.create_item(doc("A", "p")).unwrap().etag().clone()];
    for _ in 0..5 {
        // Identical content still gets a fresh token
        let token = container
            .upsert_item(doc("A", "p"), &ItemOptions::new())
            .unwrap()
            .etag()
            .clone();
        assert!(!seen.contains(&token));
        seen.push(token);
    }
}

#[test]
fn delete_invalidates_token() {
    let container = example_container();
    let t1 = container.create_item(doc("A", "p")).unwrap().etag().clone();
    container.delete_item("A", &pk("p"), &ItemOptions::new()).unwrap();

    // Upsert with the dead token on an absent document creates it
    let recreated = container.upsert_item(doc("A", "p"), &ItemOptions::if_match(t1.clone())).unwrap();
    assert_ne!(recreated.etag(), &t1);

    let err = container
        .delete_item("A", &pk("p"), &ItemOptions::if_match(t1))
        .unwrap_err();
    assert!(err.is_precondition_failed());
}

#[test]
fn partition_key_types() {
    let container = example_container();
    container.create_item(json!({"id": "s", "myPartitionKey": "x"})).unwrap();
    container.create_item(json!({"id": "n", "myPartitionKey": 42})).unwrap();
    container.create_item(json!({"id": "b", "myPartitionKey": true})).unwrap();
    container.create_item(json!({"id": "z", "myPartitionKey": null})).unwrap();

    assert!(container.read_item("n", &PartitionKey::from(42i64)).is_ok());
    assert!(container.read_item("n", &PartitionKey::from(42.0)).is_ok());
    assert!(container.read_item("b", &PartitionKey::from(true)).is_ok());
    assert!(container.read_item("z", &PartitionKey::Null).is_ok());
    assert!(container.read_item("s", &PartitionKey::from(42i64)).unwrap_err().is_not_found());

    container.create_item(json!({"id": "f", "myPartitionKey": 1.0})).unwrap();
    let err = container
        .create_item(json!({"id": "f", "myPartitionKey": 1}))
        .unwrap_err();
    assert!(err.is_conflict());
    assert!(container.read_item("f", &PartitionKey::from(1i64)).is_ok());
    container.delete_item("f", &PartitionKey::from(1u64), &ItemOptions::new()).unwrap();

    assert_eq!(
        container.partition_keys(),
        vec![
            PartitionKey::Null,
            PartitionKey::from(true),
            PartitionKey::from(42i64),
            PartitionKey::from("x"),
        ]
    );
}

#[test]
fn large_integer_partition_keys_stay_distinct() {
    let container = example_container();
    let ticks: i64 = 638_400_000_000_000_001;
    container.create_item(json!({"id": "A", "myPartitionKey": 9_007_199_254_740_993i64})).unwrap();
    container.create_item(json!({"id": "A", "myPartitionKey": 9_007_199_254_740_992i64})).unwrap();
    container.create_item(json!({"id": "A", "myPartitionKey": ticks})).unwrap();
    container.create_item(json!({"id": "A", "myPartitionKey": ticks + 1})).unwrap();
    assert_eq!(container.partition_count(), 4);

    let read = container
        .read_item("A", &PartitionKey::from(9_007_199_254_740_992i64))
        .unwrap();
    assert_eq!(read.get("myPartitionKey"), Some(&json!(9_007_199_254_740_992i64)));
    let read = container.read_item("A", &PartitionKey::from(ticks + 1)).unwrap();
    assert_eq!(read.get("myPartitionKey"), Some(&json!(ticks + 1)));

    container
        .delete_item("A", &PartitionKey::from(ticks), &ItemOptions::new())
        .unwrap();
    assert!(container.read_item("A", &PartitionKey::from(ticks)).unwrap_err().is_not_found());
    assert!(container.read_item("A", &PartitionKey::from(ticks + 1)).is_ok());
}

#[test]
fn nested_partition_key_path() {
    let container =
        Container::new(ContainerConfig::new("orders", "/customer/region")).unwrap();
    let created = container
        .create_item(json!({"id": "o1", "customer": {"region": "eu", "name": "Kim"}}))
        .unwrap();
    assert_eq!(created.partition_key(), &pk("eu"));

    // The key and its ancestors are immutable through patches
    for path in ["/customer", "/customer/region", "/id"] {
        let err = container
            .patch_item("o1", &pk("eu"), &[PatchOperation::set(path, "x")], &ItemOptions::new())
            .unwrap_err();
        assert!(err.is_invalid_patch(), "{}", path);
    }
    let patched = container
        .patch_item("o1", &pk("eu"), &[PatchOperation::set("/customer/name", "Lee")], &ItemOptions::new())
        .unwrap();
    assert_eq!(patched.get_path(&"/customer/name".parse::<JsonPath>().unwrap()), Some(&json!("Lee")));
}

#[test]
fn custom_id_field() {
    let config = ContainerConfig::new("orders", "/region").with_id_field("orderId");
    let container = Container::new(config).unwrap();
    let created = container.create_item(json!({"region": "eu", "total": 3})).unwrap();
    assert_eq!(created.get("orderId"), Some(&json!(created.id())));
    assert!(created.get("id").is_none());
}

#[test]
fn config_file_drives_container() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("quire.toml");
    std::fs::write(
        &path,
        "name = \"ExampleContainer\"\npartition_key_path = \"/myPartitionKey\"\ndefault_page_size = 2\n",
    )
    .unwrap();
    let container = Container::from_file(&path).unwrap();
    assert_eq!(container.name(), "ExampleContainer");
    for i in 0..5 {
        container.create_item(doc(&format!("d{}", i), "p")).unwrap();
    }
    let mut feed = container
        .query_items(&QueryDefinition::new(""), &QueryOptions::new().with_partition_key("p"))
        .unwrap();
    assert_eq!(feed.page_size(), 2);
    assert_eq!(feed.next_page().len(), 2);
}
