use super::*;
use crate::{
    error::HydrationError,
    obs::{MetricsEvent, MetricsSink, metrics_report, metrics_reset_all, with_metrics_sink},
    test_support::{Brand, Product},
};
use serde_json::json;
use std::cell::RefCell;

fn populated(record: &impl Record) -> Vec<String> {
    record
        .populated_fields()
        .map(|set| set.iter().cloned().collect())
        .unwrap_or_default()
}

#[derive(Default)]
struct CaptureSink {
    events: RefCell<Vec<MetricsEvent>>,
}

impl MetricsSink for CaptureSink {
    fn record(&self, event: MetricsEvent) {
        self.events.borrow_mut().push(event);
    }
}

//
// path sources
//

#[test]
fn default_mapping_populates_found_fields_only() {
    let data = json!({ "id": 7, "label": "Widget", "unrelated": true });

    let product = Product::hydrate(&data).expect("hydrate");

    assert_eq!(product.id, 7);
    assert_eq!(product.label, "Widget");
    assert_eq!(populated(&product), vec!["id", "label"]);
    assert!(!product.is_populated("count"));
    assert_eq!(Value::Object(product.to_map()), json!({ "id": 7, "label": "Widget" }));
}

#[test]
fn falsy_found_values_are_populated() {
    let data = json!({ "count": 0, "active": false, "label": "" });

    let product = Product::hydrate(&data).expect("hydrate");

    assert_eq!(populated(&product), vec!["count", "active", "label"]);
    assert_eq!(
        Value::Object(product.to_map()),
        json!({ "count": 0, "active": false, "label": "" })
    );
}

#[test]
fn missing_fields_keep_their_blank_value() {
    let product = Product::hydrate(&json!({})).expect("hydrate");

    assert_eq!(product.id, 0);
    assert_eq!(product.parent_id, None);
    assert!(product.tracking.is_tracked());
    assert!(populated(&product).is_empty());
    assert!(product.to_map().is_empty());
}

#[test]
fn non_object_input_populates_nothing() {
    let product = Product::hydrate(&json!([1, 2, 3])).expect("hydrate");

    assert!(populated(&product).is_empty());
}

#[test]
fn snake_case_paths_fall_back_to_camel_case_keys() {
    let mapping = FieldMapping::new().path("parent", "parent_id");

    let product: Product = Hydrator::new(mapping)
        .hydrate(&json!({ "parentId": 5 }))
        .expect("hydrate");

    assert_eq!(product.parent_id, Some(5));
    assert_eq!(populated(&product), vec!["parent"]);
}

#[test]
fn camel_case_fallback_can_be_disabled() {
    let mapping = FieldMapping::new().path("parent", "parent_id");
    let hydrator = Hydrator::new(mapping).with_options(HydratorOptions {
        camel_case_fallback: false,
    });

    let product: Product = hydrator.hydrate(&json!({ "parentId": 5 })).expect("hydrate");

    assert_eq!(product.parent_id, None);
    assert!(populated(&product).is_empty());
}

#[test]
fn raw_path_wins_over_camel_case() {
    let mapping = FieldMapping::new().path("parent", "parent_id");

    let product: Product = Hydrator::new(mapping)
        .hydrate(&json!({ "parent_id": 1, "parentId": 2 }))
        .expect("hydrate");

    assert_eq!(product.parent_id, Some(1));
}

#[test]
fn explicit_null_is_a_value_and_skips_the_fallback() {
    let mapping = FieldMapping::new().path("parent", "parent_id");

    let product: Product = Hydrator::new(mapping)
        .hydrate(&json!({ "parent_id": null, "parentId": 2 }))
        .expect("hydrate");

    assert_eq!(product.parent_id, None);
    assert_eq!(populated(&product), vec!["parent"]);
}

#[test]
fn nested_and_verbatim_dotted_paths() {
    let mapping = FieldMapping::new()
        .path("label", "meta.labels.0")
        .path("brand", "brand.name");
    let data = json!({
        "meta": { "labels": ["first", "second"] },
        "brand.name": "Acme",
        "brand": { "name": "Shadowed" },
    });

    let product: Product = Hydrator::new(mapping).hydrate(&data).expect("hydrate");

    assert_eq!(product.label, "first");
    assert_eq!(product.brand.as_deref(), Some("Acme"));
}

#[test]
fn populated_order_follows_the_mapping() {
    let mapping = FieldMapping::new().path("label", "l").path("id", "i");

    let product: Product = Hydrator::new(mapping)
        .hydrate(&json!({ "i": 3, "l": "x" }))
        .expect("hydrate");

    assert_eq!(
        product.to_map().keys().map(String::as_str).collect::<Vec<_>>(),
        vec!["label", "id"]
    );
}

//
// compute sources
//

#[test]
fn computed_values_are_assigned_unless_they_are_no_value() {
    let mapping = FieldMapping::new()
        .compute("label", |data| {
            let first = data["first"].as_str().unwrap_or_default();
            let last = data["last"].as_str().unwrap_or_default();
            json!(format!("{first} {last}"))
        })
        .compute("count", |_| json!(0))
        .compute("brand", |_| Value::Null);

    let product: Product = Hydrator::new(mapping)
        .hydrate(&json!({ "first": "Ada", "last": "Lovelace" }))
        .expect("hydrate");

    assert_eq!(product.label, "Ada Lovelace");
    assert_eq!(populated(&product), vec!["label"]);
}

#[test]
fn compute_sees_the_whole_input() {
    let mapping = FieldMapping::new().compute("count", |data| {
        json!(data["items"].as_array().map_or(0, Vec::len))
    });

    let product: Product = Hydrator::new(mapping)
        .hydrate(&json!({ "items": [1, 2, 3] }))
        .expect("hydrate");

    assert_eq!(product.count, 3);
}

#[test]
fn no_value_rule() {
    for value in [json!(null), json!(false), json!(0), json!(0.0), json!(""), json!([]), json!({})] {
        assert!(is_no_value(&value), "{value} should be no value");
    }
    for value in [json!(true), json!(1), json!(-0.5), json!(" "), json!([0]), json!({ "a": null })] {
        assert!(!is_no_value(&value), "{value} should be a value");
    }
}

//
// assignment routing
//

#[test]
fn setters_receive_targets_without_a_field() {
    let mapping = FieldMapping::new().path("title", "name");

    let product: Product = Hydrator::new(mapping)
        .hydrate(&json!({ "name": "widget" }))
        .expect("hydrate");

    assert_eq!(product.title_upper, "WIDGET");
    assert_eq!(populated(&product), vec!["title"]);
    assert_eq!(Value::Object(product.to_map()), json!({ "title": "WIDGET" }));
}

#[test]
fn unknown_and_skipped_targets_are_ignored() {
    let mapping = FieldMapping::new()
        .path("nope", "id")
        .path("title_upper", "id")
        .path("tracking", "id")
        .path("id", "id");

    let product: Product = Hydrator::new(mapping)
        .hydrate(&json!({ "id": 9 }))
        .expect("hydrate");

    assert_eq!(product.id, 9);
    assert!(product.title_upper.is_empty());
    assert_eq!(populated(&product), vec!["id"]);
}

#[test]
fn renamed_fields_answer_to_their_record_name() {
    assert_eq!(
        Product::FIELDS,
        &["id", "parent", "count", "active", "label", "brand"]
    );

    let product = Product::hydrate(&json!({ "parent": 2, "parent_id": 3 })).expect("hydrate");
    assert_eq!(product.parent_id, Some(2));
}

#[test]
fn conversion_failure_fails_the_record() {
    let err = Product::hydrate(&json!({ "id": 1, "count": "many" })).expect_err("bad count");

    assert_eq!(err.field_name(), Some("count"));
    assert!(matches!(err, HydrationError::Field { record: "ListProduct", .. }));
}

#[test]
fn null_into_a_non_optional_field_is_a_conversion_failure() {
    let err = Brand::hydrate(&json!({ "id": null })).expect_err("null id");

    assert_eq!(err.field_name(), Some("id"));
}

//
// batches
//

#[test]
fn hydrate_many_skips_failed_items() {
    let data = json!([
        { "id": 1, "count": 2 },
        { "id": 2, "count": "many" },
        { "id": 3 },
    ]);
    let items = data.as_array().expect("array");

    let collection: TypedCollection<Product> = Hydrator::for_record::<Product>().hydrate_many(items);

    assert_eq!(
        collection.iter().map(|p| p.id).collect::<Vec<_>>(),
        vec![1, 3]
    );
}

#[test]
fn hydrate_or_log_discards_failures() {
    let hydrator = Hydrator::for_record::<Product>();

    assert!(hydrator.hydrate_or_log::<Product>(&json!({ "id": "x" })).is_none());
    assert!(hydrator.hydrate_or_log::<Product>(&json!({ "id": 1 })).is_some());
}

//
// registry
//

fn registry() -> RecordRegistry {
    let mut registry = RecordRegistry::new();
    registry.register::<Brand>().register::<Product>();

    registry
}

#[test]
fn registry_hydrates_by_type_name() {
    let registry = registry();
    assert_eq!(registry.names().collect::<Vec<_>>(), vec!["Brand", "ListProduct"]);
    assert!(registry.contains("ListProduct"));
    assert!(!registry.contains("Product"));

    let record = registry
        .hydrate("ListProduct", &json!({ "id": 4, "label": "x" }), None)
        .expect("hydrate");

    assert_eq!(record.record_name(), "ListProduct");
    assert_eq!(Value::Object(record.serialize_map()), json!({ "id": 4, "label": "x" }));

    let product = record.as_any().downcast_ref::<Product>().expect("product");
    assert_eq!(product.id, 4);
}

#[test]
fn registry_accepts_an_explicit_mapping() {
    let registry = registry();
    let mapping = FieldMapping::new().path("name", "title");

    let record = registry
        .hydrate("Brand", &json!({ "title": "Acme", "id": 1 }), Some(&mapping))
        .expect("hydrate");

    assert_eq!(Value::Object(record.serialize_map()), json!({ "name": "Acme" }));
}

#[test]
fn registry_rejects_unknown_types() {
    let registry = registry();

    let err = registry
        .hydrate("Missing", &json!({}), None)
        .map(|_| ())
        .expect_err("unknown");

    assert!(matches!(err, HydrationError::UnknownType { ref type_name } if type_name == "Missing"));
    assert!(registry.hydrate_or_log("Missing", &json!({}), None).is_none());
}

//
// metrics
//

#[test]
fn hydration_reports_populated_and_skipped_counts() {
    let sink = CaptureSink::default();

    with_metrics_sink(&sink, || {
        Product::hydrate(&json!({ "id": 1, "label": "x" })).expect("hydrate");
        Product::hydrate(&json!({ "id": "bad" })).expect_err("bad id");
    });

    assert_eq!(
        sink.events.borrow().as_slice(),
        &[
            MetricsEvent::HydrateFinish {
                record: "ListProduct",
                populated: 2,
                skipped: 4,
            },
            MetricsEvent::HydrateFailed {
                record: "ListProduct",
            },
        ]
    );
}

#[test]
fn global_counters_track_hydration_per_record() {
    metrics_reset_all();

    Brand::hydrate(&json!({ "id": 1 })).expect("hydrate");
    Brand::hydrate(&json!({ "id": 2, "name": "b" })).expect("hydrate");
    registry()
        .hydrate("Nope", &json!({}), None)
        .map(|_| ())
        .expect_err("unknown");

    let counters = metrics_report().counters;
    assert_eq!(counters.ops.hydrate_calls, 3);
    assert_eq!(counters.ops.hydrate_failures, 1);
    assert_eq!(counters.ops.fields_populated, 3);

    let brand = &counters.records["Brand"];
    assert_eq!((brand.hydrated, brand.fields_populated, brand.fields_skipped), (2, 3, 5));
    assert_eq!(counters.records["unknown"].failed, 1);
}
