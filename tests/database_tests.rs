//! Registry, lookup dispatch, and referential cascade tests.

use reltab_core::value::Value;
use reltab_db::Database;
use reltab_rel::{MatchOptions, RelatedIdx, RelationshipDef};
use reltab_table::{FilterSpec, Predicate, Table};

fn nums(xs: &[f64]) -> Vec<Value> {
    xs.iter().map(|&x| Value::Number(x)).collect()
}

fn texts(xs: &[&str]) -> Vec<Value> {
    xs.iter().map(|&x| Value::Text(x.into())).collect()
}

fn keyed(columns: Vec<(String, Vec<Value>)>, keys: &[&str]) -> Table {
    Table::from_columns(columns)
        .unwrap()
        .with_key_fields(keys)
        .unwrap()
}

fn parent_child_db() -> Database {
    let mut db = Database::new();
    db.add_table(
        "parent",
        "parents",
        keyed(vec![("id".into(), nums(&[1.0, 2.0]))], &["id"]),
    )
    .unwrap();
    db.add_table(
        "child",
        "children",
        keyed(
            vec![
                ("parentId".into(), nums(&[1.0, 1.0, 2.0])),
                ("name".into(), texts(&["p", "q", "r"])),
                ("cid".into(), nums(&[10.0, 11.0, 12.0])),
            ],
            &["cid"],
        ),
    )
    .unwrap();
    db.add_relationship(RelationshipDef::one_to_many("parent", "child"))
        .unwrap();
    db
}

#[test]
fn related_idx_traverses_forward_and_backward() {
    let db = parent_child_db();

    let forward = db
        .get_related_idx("parent", "child", MatchOptions::default())
        .unwrap();
    assert_eq!(forward, RelatedIdx::PerRow(vec![vec![0, 1], vec![2]]));

    let backward = db
        .get_related_idx(
            "child",
            "parent",
            MatchOptions {
                fill_missing_with_nan: true,
                ..Default::default()
            },
        )
        .unwrap();
    assert_eq!(
        backward,
        RelatedIdx::Aligned(vec![Some(0), Some(0), Some(1)])
    );
}

#[test]
fn match_related_materializes_target_rows() {
    let db = parent_child_db();
    let t = db
        .match_related(
            "parent",
            "child",
            MatchOptions {
                combine: true,
                ..Default::default()
            },
        )
        .unwrap();
    assert_eq!(t.row_count().unwrap(), 3);
    assert_eq!(t.value_at(0, "name").unwrap(), Value::Text("p".into()));
}

#[test]
fn aligned_match_fills_unmatched_rows_with_empties() {
    let mut db = Database::new();
    db.add_table(
        "parent",
        "parents",
        keyed(
            vec![
                ("id".into(), nums(&[1.0])),
                ("label".into(), texts(&["only"])),
            ],
            &["id"],
        ),
    )
    .unwrap();
    db.add_table(
        "child",
        "children",
        keyed(
            vec![
                ("parentId".into(), nums(&[7.0, 1.0])),
                ("cid".into(), nums(&[10.0, 11.0])),
            ],
            &["cid"],
        ),
    )
    .unwrap();
    db.add_relationship(RelationshipDef::one_to_many("parent", "child"))
        .unwrap();

    let t = db
        .match_related(
            "child",
            "parent",
            MatchOptions {
                fill_missing_with_nan: true,
                ..Default::default()
            },
        )
        .unwrap();
    assert_eq!(t.row_count().unwrap(), 2);
    // First child references no surviving parent: placeholder row.
    assert!(t.value_at(0, "id").unwrap().is_empty());
    assert_eq!(t.value_at(0, "label").unwrap(), Value::Text("".into()));
    assert_eq!(t.value_at(1, "label").unwrap(), Value::Text("only".into()));
}

#[test]
fn update_cascades_to_one_bound_tables() {
    let mut db = parent_child_db();

    // Drop parent id=1; its two children must go with it.
    let shrunk = db
        .table("parent")
        .unwrap()
        .clone()
        .filter(FilterSpec::keep("id", Predicate::Equals(Value::Number(2.0))))
        .unwrap();
    db.update_table("parent", shrunk).unwrap();

    let children = db.table("children").unwrap();
    assert_eq!(children.row_count().unwrap(), 1);
    assert_eq!(children.value_at(0, "name").unwrap(), Value::Text("r".into()));
}

#[test]
fn update_with_unshrunk_rows_leaves_neighbors_alone() {
    let mut db = parent_child_db();
    let same = db.table("parent").unwrap().clone();
    db.update_table("parent", same).unwrap();
    assert_eq!(db.table("children").unwrap().row_count().unwrap(), 3);
}

#[test]
fn removing_a_table_drops_its_relationships() {
    let mut db = parent_child_db();
    db.remove_table("parent").unwrap();
    assert!(db.relationships().is_empty());
    assert!(db.table("parent").is_err());
    assert!(db.table("children").is_ok());
}

#[test]
fn remove_relationship_by_traversal_name() {
    let mut db = parent_child_db();
    db.remove_relationship("parent", "child").unwrap();
    assert!(db
        .get_related_idx("parent", "child", MatchOptions::default())
        .is_err());
    assert!(db.remove_relationship("parent", "child").is_err());
}

#[test]
fn self_referential_lookup_merges_both_directions() {
    let mut db = Database::new();
    db.add_table(
        "person",
        "people",
        keyed(
            vec![
                ("id".into(), nums(&[1.0, 2.0, 3.0])),
                (
                    "personId".into(),
                    vec![Value::Empty, Value::Number(1.0), Value::Number(1.0)],
                ),
            ],
            &["id"],
        ),
    )
    .unwrap();
    db.add_relationship(RelationshipDef::one_to_many("person", "person"))
        .unwrap();

    // Rows 1 and 2 point at row 0; the lookup sees the link from both
    // ends.
    let related = db
        .get_related_idx("person", "person", MatchOptions::default())
        .unwrap();
    assert_eq!(
        related,
        RelatedIdx::PerRow(vec![vec![1, 2], vec![0], vec![0]])
    );
}

#[test]
fn union_of_relationships_ors_their_matches() {
    let mut db = Database::new();
    db.add_table(
        "parent",
        "parents",
        keyed(vec![("id".into(), nums(&[1.0, 2.0]))], &["id"]),
    )
    .unwrap();
    db.add_table(
        "child",
        "children",
        keyed(
            vec![
                ("parentId".into(), nums(&[1.0, 2.0])),
                ("guardianId".into(), nums(&[2.0, 2.0])),
                ("cid".into(), nums(&[10.0, 11.0])),
            ],
            &["cid"],
        ),
    )
    .unwrap();
    let mut by_parent = RelationshipDef::one_to_many("parent", "child");
    by_parent.key_fields_left_in_right = Some(vec!["parentId".into()]);
    let mut by_guardian = RelationshipDef::one_to_many("parent", "child");
    by_guardian.key_fields_left_in_right = Some(vec!["guardianId".into()]);
    db.add_relationship(by_parent).unwrap();
    db.add_relationship(by_guardian).unwrap();

    let related = db
        .get_related_idx("parent", "child", MatchOptions::default())
        .unwrap();
    assert_eq!(related, RelatedIdx::PerRow(vec![vec![0], vec![0, 1]]));
}

#[test]
fn junction_lookup_through_the_registry() {
    let mut db = Database::new();
    db.add_table(
        "student",
        "students",
        keyed(vec![("id".into(), nums(&[1.0, 2.0]))], &["id"]),
    )
    .unwrap();
    db.add_table(
        "course",
        "courses",
        keyed(vec![("id".into(), nums(&[10.0]))], &["id"]),
    )
    .unwrap();
    db.add_table(
        "enrollment",
        "enrollments",
        keyed(
            vec![
                ("studentId".into(), nums(&[1.0])),
                ("courseId".into(), nums(&[10.0])),
            ],
            &["studentId", "courseId"],
        ),
    )
    .unwrap();
    db.add_relationship(RelationshipDef::many_to_many(
        "student",
        "course",
        "enrollment",
    ))
    .unwrap();

    let related = db
        .get_related_idx("student", "course", MatchOptions::default())
        .unwrap();
    assert_eq!(related, RelatedIdx::PerRow(vec![vec![0], vec![]]));
}
