use std::sync::Arc;

use rand::rngs::StdRng;
use rand::Rng;
use rand::SeedableRng;
use sboxudf::catalog::value::Value;
use sboxudf::config::Config;
use sboxudf::driver::Database;
use sboxudf::error::Error;
use sboxudf::error::Result;
use sboxudf::types::StructEntry;
use sboxudf::types::Type;
use sboxudf::types::TypeInfo;
use sboxudf::udf::register_scalar_udf;
use uuid::Uuid;

use super::funcs::integer;
use super::funcs::CountNulls;
use super::funcs::Identity;
use super::funcs::Panicking;
use super::funcs::Sum;
use super::funcs::VariadicSum;

#[test]
fn test_simple_sum() -> Result<()> {
    setup!(db, conn);
    let sum = Arc::new(Sum::default());
    register_scalar_udf(&conn, "my_sum", sum.clone())?;

    assert_eq!(vec![Value::Integer(52)], db.query_row("SELECT my_sum(10, 42) AS msg")?);
    assert_eq!(vec![Value::Null], db.query_row("SELECT my_sum(NULL, 42) AS msg")?);
    assert_eq!(vec![Value::Null], db.query_row("SELECT my_sum(42, NULL) AS msg")?);
    Ok(())
}

#[test]
fn test_null_rows_skip_the_call() -> Result<()> {
    setup!(_db, conn);
    let sum = Arc::new(Sum::default());
    register_scalar_udf(&conn, "my_sum", sum.clone())?;

    let mut rng = StdRng::seed_from_u64(42);
    let mut rows = Vec::new();
    let mut expected = Vec::new();
    for i in 0..200 {
        let a = rng.gen_bool(0.7).then_some(i);
        let b = rng.gen_bool(0.7).then_some(i * 2);
        let sql = |v: Option<i32>| v.map(|v| v.to_string()).unwrap_or("NULL".to_string());
        rows.push(format!("({}, {})", sql(a), sql(b)));
        expected.push(match (a, b) {
            (Some(a), Some(b)) => Value::Integer(a + b),
            _ => Value::Null,
        });
    }
    let calls = expected.iter().filter(|v| !v.is_null()).count();

    let result = conn.query(&format!("SELECT my_sum(a, b) FROM (VALUES {}) t(a, b)", rows.join(", ")))?;
    assert_eq!(Some(expected), result.column(0));
    assert_eq!(calls, sum.calls());
    Ok(())
}

#[test]
fn test_batches() -> Result<()> {
    setup!(db, conn, Config { threads: 1, ..Default::default() });
    let sum = Arc::new(Sum::default());
    register_scalar_udf(&conn, "my_sum", sum.clone())?;

    // several engine batches, every third row NULL
    let rows = db.query(
        "SELECT my_sum(CASE WHEN i % 3 = 0 THEN NULL ELSE i::INTEGER END, 1) AS s FROM range(5000) t(i)",
    )?;
    let expected =
        (0..5000).map(|i| if i % 3 == 0 { Value::Null } else { Value::Integer(i + 1) }).collect::<Vec<_>>();
    assert_eq!(Some(expected), rows.column(0));
    assert_eq!(5000 - 1667, sum.calls());

    let rows = conn.query("SELECT a FROM (VALUES (1, 2), (3, 4), (5, 6)) t(a, b) WHERE my_sum(a, b) > 5")?;
    assert_eq!(Some(vec![Value::Integer(3), Value::Integer(5)]), rows.column(0));
    Ok(())
}

#[test]
fn test_volatility() -> Result<()> {
    setup!(db, conn);
    let stable = Arc::new(Sum::default());
    let volatile = Arc::new(Sum::volatile());
    register_scalar_udf(&conn, "stable_sum", stable.clone())?;
    register_scalar_udf(&conn, "volatile_sum", volatile.clone())?;

    let rows = db.query("SELECT stable_sum(1, 2), volatile_sum(1, 2) FROM (VALUES (1), (2), (3)) t(a)")?;
    assert_eq!(3, rows.len());
    for row in &rows {
        assert_eq!(&vec![Value::Integer(3), Value::Integer(3)], row);
    }
    // constant arguments let the engine fold the stable call
    assert!(stable.calls() < 3, "stable calls {}", stable.calls());
    assert_eq!(3, volatile.calls());

    // a column argument is evaluated per row either way
    let before = stable.calls();
    db.query("SELECT stable_sum(a, 1) FROM (VALUES (1), (2), (3)) t(a)")?;
    assert_eq!(before + 3, stable.calls());
    Ok(())
}

#[test]
fn test_variadic_sum() -> Result<()> {
    setup!(db, conn);
    register_scalar_udf(&conn, "my_variadic_sum", Arc::new(VariadicSum))?;

    assert_eq!(vec![Value::Null], db.query_row("SELECT my_variadic_sum(10, NULL, NULL)")?);
    assert_eq!(vec![Value::Integer(58)], db.query_row("SELECT my_variadic_sum(10, 42, 2, 2, 2)")?);
    assert_eq!(vec![Value::Integer(10)], db.query_row("SELECT my_variadic_sum(10)")?);
    assert_eq!(vec![Value::Null], db.query_row("SELECT my_variadic_sum(NULL)")?);
    assert_eq!(vec![Value::Integer(0)], db.query_row("SELECT my_variadic_sum()")?);
    Ok(())
}

#[test]
fn test_any_arguments() -> Result<()> {
    setup!(db, conn);
    register_scalar_udf(&conn, "my_null_count", Arc::new(CountNulls))?;

    let count = |sql: &str| -> Result<Vec<Value>> { db.query_row(sql) };
    assert_eq!(vec![Value::Integer(0)], count("SELECT my_null_count(10, 'hello', 2, [2], 2)")?);
    assert_eq!(
        vec![Value::Integer(2)],
        count("SELECT my_null_count(10, NULL, NULL, [NULL], {'hello': NULL})")?
    );
    assert_eq!(vec![Value::Integer(0)], count("SELECT my_null_count(10, TRUE)")?);
    assert_eq!(vec![Value::Integer(1)], count("SELECT my_null_count(NULL)")?);
    assert_eq!(vec![Value::Integer(0)], count("SELECT my_null_count()")?);

    let rows = db.query("SELECT my_null_count(a, b) FROM (VALUES (1, 'x'), (NULL, 'y'), (NULL, NULL)) t(a, b)")?;
    assert_eq!(Some(vec![Value::Integer(0), Value::Integer(1), Value::Integer(2)]), rows.column(0));
    Ok(())
}

#[test]
fn test_all_types_identity() -> Result<()> {
    let int = integer();
    let varchar = TypeInfo::new(Type::Varchar)?;
    let uuid = Uuid::new_v4().to_string();
    let uuid_input = format!("'{}'::UUID", uuid);
    let cases: Vec<(TypeInfo, &str, &str)> = vec![
        (TypeInfo::new(Type::Boolean)?, "TRUE", "true"),
        (TypeInfo::new(Type::TinyInt)?, "42::TINYINT", "42"),
        (TypeInfo::new(Type::SmallInt)?, "-42::SMALLINT", "-42"),
        (int.clone(), "42", "42"),
        (TypeInfo::new(Type::BigInt)?, "9223372036854775807", "9223372036854775807"),
        (TypeInfo::new(Type::UTinyInt)?, "200::UTINYINT", "200"),
        (TypeInfo::new(Type::USmallInt)?, "60000::USMALLINT", "60000"),
        (TypeInfo::new(Type::UInteger)?, "4000000000::UINTEGER", "4000000000"),
        (TypeInfo::new(Type::UBigInt)?, "18446744073709551615::UBIGINT", "18446744073709551615"),
        (TypeInfo::new(Type::Float)?, "4.5::FLOAT", "4.5"),
        (TypeInfo::new(Type::Double)?, "4.25", "4.25"),
        (varchar.clone(), "'hello world'", "hello world"),
        (TypeInfo::new(Type::Blob)?, "'\\xAA\\x00abc'::BLOB", "\\xAA\\x00abc"),
        (TypeInfo::new(Type::Date)?, "'2024-01-31'::DATE", "2024-01-31"),
        (TypeInfo::new(Type::Timestamp)?, "'2024-01-31 12:30:05'::TIMESTAMP", "2024-01-31 12:30:05"),
        (TypeInfo::new(Type::Uuid)?, &uuid_input, &uuid),
        (TypeInfo::decimal(10, 2)?, "'1234.5'::DECIMAL(10, 2)", "1234.50"),
        (TypeInfo::enumeration(&["hello", "world"])?, "'world'", "world"),
        (TypeInfo::list(int.clone())?, "[1, 2, NULL]", "[1, 2, NULL]"),
        (TypeInfo::array(int.clone(), 3)?, "[1, 2, 3]::INTEGER[3]", "[1, 2, 3]"),
        (
            TypeInfo::structure(vec![StructEntry::new(int.clone(), "a")?, StructEntry::new(varchar.clone(), "b")?])?,
            "{'a': 1, 'b': 'x'}",
            "{'a': 1, 'b': x}",
        ),
        (TypeInfo::map(varchar, int)?, "MAP {'k': 1, 'v': 2}", "{k=1, v=2}"),
    ];

    for (info, input, output) in cases {
        setup!(db, conn);
        register_scalar_udf(&conn, "my_identity", Arc::new(Identity(info.clone())))?;

        let row = db.query_row(&format!("SELECT my_identity({})::VARCHAR AS msg", input))?;
        assert_eq!(vec![Value::Varchar(output.to_string())], row, "type {}, input {}", info, input);
    }
    Ok(())
}

#[test]
fn test_panic_keeps_database_usable() -> Result<()> {
    setup!(db, conn);
    register_scalar_udf(&conn, "fragile", Arc::new(Panicking))?;

    let err = conn.query("SELECT fragile(a) FROM (VALUES (1), (-1), (2)) t(a)").unwrap_err();
    assert!(matches!(err, Error::Api(_)), "{:?}", err);
    assert!(err.to_string().contains("panic: negative input -1"), "{}", err);

    assert_eq!(vec![Value::Integer(7)], conn.query_row("SELECT fragile(7)")?);
    let rows = db.query("SELECT fragile(a) FROM (VALUES (1), (2)) t(a)")?;
    assert_eq!(Some(vec![Value::Integer(1), Value::Integer(2)]), rows.column(0));
    Ok(())
}

#[test]
fn test_concurrent_queries() -> Result<()> {
    let db = Database::open(&Config { threads: 4, ..Default::default() })?;
    let sum = Arc::new(Sum::default());
    register_scalar_udf(&db.connect()?, "my_sum", sum.clone())?;

    let db = &db;
    std::thread::scope(|s| -> Result<()> {
        let workers = (0..4)
            .map(|i| {
                s.spawn(move || -> Result<()> {
                    let conn = db.connect()?;
                    for j in 0..25 {
                        let rows =
                            conn.query(&format!("SELECT my_sum(a, {}) FROM (VALUES (1), (2), ({})) t(a)", j, i))?;
                        let expected = vec![Value::Integer(1 + j), Value::Integer(2 + j), Value::Integer(i + j)];
                        assert_eq!(Some(expected), rows.column(0));
                    }
                    Ok(())
                })
            })
            .collect::<Vec<_>>();
        for worker in workers {
            worker.join().expect("worker panicked")?;
        }
        Ok(())
    })?;
    assert_eq!(4 * 25 * 3, sum.calls());
    Ok(())
}
