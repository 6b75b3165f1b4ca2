//! End-to-end statement behavior through the Database facade.

use minisql::{Database, Error, ExecutionResult, Value};

fn student_db() -> Database {
    let mut db = Database::in_memory();
    db.execute("CREATE TABLE student(id INT, name VARCHAR, age INT, grade VARCHAR);")
        .unwrap();
    for stmt in [
        "INSERT INTO student(id, name, age, grade) VALUES (1, 'Alice', 20, 'A');",
        "INSERT INTO student(id, name, age, grade) VALUES (2, 'Bob', 22, 'B');",
        "INSERT INTO student(id, name, age, grade) VALUES (3, 'Carol', 19, 'C');",
        "INSERT INTO student(id, name, age, grade) VALUES (4, 'Dave', 23, 'A');",
        "INSERT INTO student(id, name, age, grade) VALUES (5, 'Eve', 20, 'B');",
    ] {
        db.execute(stmt).unwrap();
    }
    db
}

fn ids(result: &ExecutionResult) -> Vec<i64> {
    let ExecutionResult::Rows { rows, .. } = result else {
        panic!("expected rows, got {:?}", result);
    };
    rows.iter()
        .map(|row| match row.get("id") {
            Some(Value::Integer(n)) => *n,
            other => panic!("unexpected id value {:?}", other),
        })
        .collect()
}

#[test]
fn scenario_a_select_and_filter() {
    let mut db = student_db();
    let all = db.execute("SELECT * FROM student;").unwrap();
    assert_eq!(all.row_count(), 5);
    assert_eq!(ids(&all), vec![1, 2, 3, 4, 5]);

    let filtered = db
        .execute("SELECT id, name, age FROM student WHERE age > 20;")
        .unwrap();
    assert_eq!(ids(&filtered), vec![2, 4]);
    let ExecutionResult::Rows { columns, rows } = filtered else {
        unreachable!();
    };
    assert_eq!(columns, vec!["id", "name", "age"]);
    // projection drops unrequested columns
    assert!(rows[0].get("grade").is_none());
    assert_eq!(rows[0].get("name"), Some(&Value::Text("Bob".to_string())));
}

#[test]
fn scenario_b_delete_by_predicate() {
    let mut db = student_db();
    let deleted = db.execute("DELETE FROM student WHERE age < 20;").unwrap();
    assert_eq!(deleted, ExecutionResult::Affected { count: 1 });
    let remaining = db.execute("SELECT * FROM student;").unwrap();
    assert_eq!(remaining.row_count(), 4);
    assert_eq!(ids(&remaining), vec![1, 2, 4, 5]);
}

#[test]
fn scenario_c_type_mismatch() {
    let mut db = student_db();
    let err = db
        .execute("INSERT INTO student(id, name, age) VALUES ('x', 'Alice', 20);")
        .unwrap_err();
    assert!(matches!(err, Error::TypeMismatch { column, .. } if column == "id"));
    // the failed insert left the table untouched
    assert_eq!(db.execute("SELECT * FROM student;").unwrap().row_count(), 5);
}

#[test]
fn scenario_d_duplicate_column() {
    let mut db = Database::in_memory();
    let err = db
        .execute("CREATE TABLE test(id INT, id VARCHAR);")
        .unwrap_err();
    assert!(matches!(err, Error::DuplicateColumn { column, .. } if column == "id"));
    assert!(db.table_names().is_empty());
}

#[test]
fn scenario_e_cache_counters() {
    let mut db = Database::in_memory();
    db.execute("CREATE TABLE t(id INT);").unwrap();
    db.execute("INSERT INTO t VALUES (1);").unwrap();
    let before = db.stats();
    assert_eq!(before.misses, 1);
    db.execute("SELECT * FROM t;").unwrap();
    db.execute("SELECT * FROM t;").unwrap();
    let after = db.stats();
    // the single page misses once ever; repeated reads only add hits
    assert_eq!(after.misses, 1);
    assert!(after.hits >= before.hits + 2);
    assert!(after.hit_rate() > 0.5);
}

#[test]
fn duplicate_create_table_fails() {
    let mut db = Database::in_memory();
    db.execute("CREATE TABLE t(id INT);").unwrap();
    let err = db.execute("CREATE TABLE t(id INT);").unwrap_err();
    assert!(matches!(err, Error::TableExists(name) if name == "t"));
    // the first table is still usable
    db.execute("INSERT INTO t VALUES (1);").unwrap();
}

#[test]
fn column_count_mismatch_leaves_rows_unchanged() {
    let mut db = student_db();
    let err = db
        .execute("INSERT INTO student(id, name) VALUES (9, 'Zoe', 30);")
        .unwrap_err();
    assert!(matches!(err, Error::ColumnCountMismatch { .. }));
    assert_eq!(db.execute("SELECT * FROM student;").unwrap().row_count(), 5);
}

#[test]
fn round_trip_preserves_types() {
    let mut db = Database::in_memory();
    db.execute("CREATE TABLE t(id INT, name VARCHAR);").unwrap();
    db.execute("INSERT INTO t VALUES (42, 'hello');").unwrap();
    let ExecutionResult::Rows { rows, .. } = db.execute("SELECT * FROM t;").unwrap() else {
        panic!("expected rows");
    };
    assert_eq!(rows[0].get("id"), Some(&Value::Integer(42)));
    assert_eq!(rows[0].get("name"), Some(&Value::Text("hello".to_string())));
}

#[test]
fn delete_is_idempotent() {
    let mut db = student_db();
    let first = db.execute("DELETE FROM student WHERE age < 20;").unwrap();
    assert_eq!(first, ExecutionResult::Affected { count: 1 });
    let second = db.execute("DELETE FROM student WHERE age < 20;").unwrap();
    assert_eq!(second, ExecutionResult::Affected { count: 0 });
}

#[test]
fn insertion_order_survives_multiple_pages() {
    let mut db = Database::in_memory();
    db.execute("CREATE TABLE seq(n INT);").unwrap();
    for n in 0..40 {
        db.execute(&format!("INSERT INTO seq VALUES ({});", n)).unwrap();
    }
    let result = db.execute("SELECT * FROM seq;").unwrap();
    let ExecutionResult::Rows { rows, .. } = result else {
        panic!("expected rows");
    };
    let values: Vec<i64> = rows
        .iter()
        .map(|r| match r.get("n") {
            Some(Value::Integer(v)) => *v,
            _ => panic!("bad value"),
        })
        .collect();
    assert_eq!(values, (0..40).collect::<Vec<_>>());
    assert!(db.stats().total_pages >= 3);
}

#[test]
fn update_with_and_connective() {
    let mut db = student_db();
    let updated = db
        .execute("UPDATE student SET grade = 'F' WHERE age >= 20 AND age <= 22;")
        .unwrap();
    assert_eq!(updated, ExecutionResult::Affected { count: 3 });
    let ExecutionResult::Rows { rows, .. } = db
        .execute("SELECT grade FROM student WHERE id = 4;")
        .unwrap()
    else {
        panic!("expected rows");
    };
    // id 4 (age 23) is outside the range and keeps its grade
    assert_eq!(rows[0].get("grade"), Some(&Value::Text("A".to_string())));
}

#[test]
fn mixed_and_or_is_rejected() {
    let mut db = student_db();
    let err = db
        .execute("SELECT * FROM student WHERE age > 18 AND age < 25 OR id = 1;")
        .unwrap_err();
    assert!(matches!(err, Error::Unsupported { .. }));
}

#[test]
fn nested_select_is_rejected() {
    let mut db = student_db();
    let err = db
        .execute("SELECT * FROM (SELECT * FROM student);")
        .unwrap_err();
    assert!(matches!(err, Error::Unsupported { .. }));
}

#[test]
fn lexical_errors_are_reported() {
    let mut db = Database::in_memory();
    let err = db.execute("SELECT # FROM t;").unwrap_err();
    assert!(matches!(err, Error::IllegalCharacter { ch: '#', .. }));
    let err = db.execute("SELECT * FROM t WHERE name = 'oops;").unwrap_err();
    assert!(matches!(err, Error::UnterminatedString { .. }));
}

#[test]
fn batch_continues_after_bad_statement() {
    let mut db = Database::in_memory();
    let results = db
        .execute_script(
            "CREATE TABLE t(id INT);\n\
             INSERT INTO t VALUES;\n\
             -- comment between statements\n\
             INSERT INTO t VALUES (1);\n\
             SELECT * FROM t;",
        )
        .unwrap();
    assert_eq!(results.len(), 4);
    assert!(results[0].is_ok());
    assert!(matches!(results[1], Err(Error::ExpectedLeftParen { .. })));
    assert!(results[2].is_ok());
    assert_eq!(results[3].as_ref().unwrap().row_count(), 1);
}

#[test]
fn batch_reports_semantic_errors_in_place() {
    let mut db = Database::in_memory();
    let results = db
        .execute_script("CREATE TABLE t(id INT); INSERT INTO missing VALUES (1);")
        .unwrap();
    assert_eq!(results.len(), 2);
    assert!(matches!(
        results[1],
        Err(Error::TableNotExists(ref name)) if name == "missing"
    ));
}

#[test]
fn engine_survives_every_error_stage() {
    let mut db = student_db();
    let _ = db.execute("SELECT @ FROM student;");
    let _ = db.execute("SELECT FROM student;");
    let _ = db.execute("SELECT nope FROM student;");
    let _ = db.execute("INSERT INTO student(id) VALUES ('x');");
    // still fully functional afterwards
    assert_eq!(db.execute("SELECT * FROM student;").unwrap().row_count(), 5);
}
