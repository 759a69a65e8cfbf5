//! Column-type behavior across the public surface: inference, date
//! flooring, and display formatting.

use reltab_core::config::{DEFAULT_DATETIME_FORMAT, DEFAULT_DATE_FORMAT};
use reltab_core::value::Value;
use reltab_fields::{infer_descriptor, FieldDescriptor};
use reltab_table::{FilterSpec, Predicate, SortSpec, Table};

fn texts(xs: &[&str]) -> Vec<Value> {
    xs.iter().map(|&x| Value::Text(x.into())).collect()
}

fn date() -> FieldDescriptor {
    FieldDescriptor::date(DEFAULT_DATE_FORMAT)
}

fn datetime() -> FieldDescriptor {
    FieldDescriptor::datetime(DEFAULT_DATETIME_FORMAT)
}

#[test]
fn inference_types_mixed_string_columns() {
    assert_eq!(
        infer_descriptor(&texts(&["1.5", "2", "-3e2"])),
        FieldDescriptor::Scalar
    );
    assert_eq!(
        infer_descriptor(&texts(&["2020-01-01", "2020-01-02"])),
        date()
    );
    assert_eq!(
        infer_descriptor(&texts(&["2020-01-01 12:00:00"])),
        datetime()
    );
    assert_eq!(
        infer_descriptor(&texts(&["hello", "1"])),
        FieldDescriptor::Text
    );
}

#[test]
fn date_floors_sub_day_but_datetime_does_not() {
    let noon = Value::Text("2020-01-01 12:00:00".into());
    let midnight = Value::Text("2020-01-01".into());

    let date_col = date().convert(&[noon.clone()]).unwrap();
    let eq = date()
        .equal_to(&date_col, &midnight)
        .unwrap();
    assert_eq!(eq, vec![true]);

    let dt_col = datetime().convert(&[noon]).unwrap();
    let eq = datetime()
        .equal_to(&dt_col, &midnight)
        .unwrap();
    assert_eq!(eq, vec![false]);
}

#[test]
fn date_column_filters_and_sorts_through_a_table() {
    let t = Table::from_columns(vec![
        (
            "day".into(),
            texts(&["2020-03-01", "2020-01-15", "2020-02-01"]),
        ),
        ("x".into(), texts(&["c", "a", "b"])),
    ])
    .unwrap();
    assert_eq!(t.descriptor("day").unwrap(), &date());

    let t = t
        .filter(FilterSpec::keep(
            "day",
            Predicate::NotEquals(Value::Text("2020-02-01".into())),
        ))
        .unwrap()
        .sort(SortSpec::ascending("day"))
        .unwrap();
    assert_eq!(t.value_at(0, "x").unwrap(), Value::Text("a".into()));
    assert_eq!(t.value_at(1, "x").unwrap(), Value::Text("c".into()));
}

#[test]
fn missing_values_sort_last_in_both_directions() {
    let t = Table::from_columns(vec![(
        "x".into(),
        vec![Value::Empty, Value::Number(2.0), Value::Number(1.0)],
    )])
    .unwrap();

    let asc = t.clone().sort(SortSpec::ascending("x")).unwrap();
    assert_eq!(asc.value_at(0, "x").unwrap(), Value::Number(1.0));
    assert!(asc.value_at(2, "x").unwrap().is_empty());

    let desc = t.sort(SortSpec::descending("x")).unwrap();
    assert_eq!(desc.value_at(0, "x").unwrap(), Value::Number(2.0));
    assert!(desc.value_at(2, "x").unwrap().is_empty());
}

#[test]
fn p_value_display_buckets_small_values() {
    let d = FieldDescriptor::PValue;
    let col = d
        .convert(&[
            Value::Number(0.0005),
            Value::Number(0.004),
            Value::Number(0.03),
            Value::Number(0.5),
        ])
        .unwrap();
    assert_eq!(
        d.display_strings(&col),
        vec!["<0.001", "<0.01", "<0.05", "0.50"]
    );
}
