use std::sync::Arc;

use sboxudf::catalog::value::Value;
use sboxudf::error::Error;
use sboxudf::error::Result;
use sboxudf::error::UdfCause;
use sboxudf::udf::register_scalar_udf;
use sboxudf::udf::ScalarFunc;
use sboxudf::udf::ScalarFuncConfig;
use sboxudf::udf::ScalarUdf;

use super::funcs::any;
use super::funcs::integer;
use super::funcs::Configured;
use super::funcs::Failing;
use super::funcs::Sum;

fn configured(config: ScalarFuncConfig) -> Arc<Configured> {
    Arc::new(Configured(config))
}

#[test]
fn test_structural_errors() -> Result<()> {
    setup!(db, conn);
    let cases: Vec<(&str, ScalarUdf, UdfCause)> = vec![
        ("", ScalarUdf::from(Arc::new(Sum::default())), UdfCause::NoName),
        (
            "err_input",
            ScalarUdf::from(configured(ScalarFuncConfig { result_type_info: Some(integer()), ..Default::default() })),
            UdfCause::NilInputTypes,
        ),
        (
            "err_empty_input",
            ScalarUdf::from(configured(ScalarFuncConfig::new(vec![], integer()))),
            UdfCause::EmptyInputTypes,
        ),
        (
            "err_input_type_is_nil",
            ScalarUdf::from(configured(ScalarFuncConfig {
                input_type_infos: Some(vec![None]),
                result_type_info: Some(integer()),
                ..Default::default()
            })),
            UdfCause::InputTypeIsNil,
        ),
        (
            "err_result_type_is_nil",
            ScalarUdf::from(configured(ScalarFuncConfig {
                result_type_info: None,
                ..ScalarFuncConfig::new(vec![integer()], integer())
            })),
            UdfCause::ResultTypeIsNil,
        ),
        (
            "err_result_type_is_any",
            ScalarUdf::from(configured(ScalarFuncConfig::new(vec![integer()], any()))),
            UdfCause::ResultTypeIsAny,
        ),
        ("err_nil", ScalarUdf::default(), UdfCause::IsNil),
        ("err_nil_option", ScalarUdf::from(None::<Arc<dyn ScalarFunc>>), UdfCause::IsNil),
    ];
    for (name, udf, cause) in cases {
        let err = register_scalar_udf(&conn, name, udf).unwrap_err();
        let chain = err.chain().cloned().collect::<Vec<_>>();
        assert_eq!(3, chain.len(), "{}", err);
        assert!(matches!(chain[0], Error::Api(_)));
        assert!(matches!(chain[1], Error::ScalarUdfCreate(_)));
        assert_eq!(&Error::ScalarUdf(cause), err.root_cause());
    }

    // nothing was registered and the connection still registers valid functions
    register_scalar_udf(&conn, "err_input", Arc::new(Sum::default()))?;
    assert_eq!(vec![Value::Integer(3)], db.query_row("SELECT err_input(1, 2)")?);
    Ok(())
}

#[test]
fn test_duplicate_name() -> Result<()> {
    setup!(db, conn);
    register_scalar_udf(&conn, "my_sum", Arc::new(Sum::default()))?;
    let err = register_scalar_udf(&conn, "my_sum", Arc::new(Sum::default())).unwrap_err();
    assert_eq!(Error::udf_create(UdfCause::DuplicateName("my_sum".into())), err);
    // names are case-insensitive
    let err = register_scalar_udf(&conn, "MY_SUM", Arc::new(Sum::default())).unwrap_err();
    assert_eq!(Error::udf_create(UdfCause::DuplicateName("MY_SUM".into())), err);

    // a second connection sees the same catalog
    let other = db.connect()?;
    let err = register_scalar_udf(&other, "my_sum", Arc::new(Sum::default())).unwrap_err();
    assert!(matches!(err.root_cause(), Error::ScalarUdf(UdfCause::DuplicateName(_))));

    // builtins occupy their names too
    let err = register_scalar_udf(&conn, "abs", Arc::new(Sum::default())).unwrap_err();
    assert_eq!(Error::udf_create(UdfCause::DuplicateName("abs".into())), err);
    Ok(())
}

#[test]
fn test_execution_error() -> Result<()> {
    setup!(db, conn);
    register_scalar_udf(&conn, "err_exec", Arc::new(Failing))?;
    register_scalar_udf(&conn, "my_sum", Arc::new(Sum::default()))?;

    let err = db.query("SELECT err_exec(10, 10) AS msg").unwrap_err();
    assert!(matches!(err, Error::Api(_)), "{:?}", err);
    assert!(err.to_string().contains("test invalid execution"), "{}", err);
    let err = conn.query("SELECT err_exec(a, 1) FROM (VALUES (1), (2)) t(a)").unwrap_err();
    assert_eq!(Error::api(Error::execution("test invalid execution")), err);
    // rows that skip the call do not fail
    assert_eq!(vec![Value::Null], conn.query_row("SELECT err_exec(NULL, 1)")?);

    assert_eq!(vec![Value::Integer(20)], conn.query_row("SELECT my_sum(10, 10)")?);
    let err = conn.query("SELECT err_exec(10, 10)").unwrap_err();
    assert!(matches!(err, Error::Api(_)), "{}", err);
    Ok(())
}

#[test]
fn test_closed_connection() -> Result<()> {
    setup!(_db, conn);
    let mut conn = conn;
    conn.close()?;
    let err = register_scalar_udf(&conn, "my_sum", Arc::new(Sum::default())).unwrap_err();
    assert_eq!(Error::ConnectionClosed, err);

    // structural errors are still reported first
    let err = register_scalar_udf(&conn, "", Arc::new(Sum::default())).unwrap_err();
    assert_eq!(Error::udf_create(UdfCause::NoName), err);
    Ok(())
}

#[test]
fn test_handle_release() -> Result<()> {
    setup!(db, conn);
    let sum = Arc::new(Sum::default());
    register_scalar_udf(&conn, "my_sum", sum.clone())?;

    let err = register_scalar_udf(&conn, "other_sum", sum.clone()).unwrap_err();
    assert_eq!(Error::udf_create(UdfCause::HandleInUse), err);
    // cloning the handle does not make a new instance
    let err = register_scalar_udf(&conn, "other_sum", ScalarUdf::from(sum.clone())).unwrap_err();
    assert_eq!(Error::udf_create(UdfCause::HandleInUse), err);

    // a rejected registration leaves no function behind
    assert!(matches!(db.query("SELECT other_sum(1, 2)"), Err(Error::Engine(_))));
    let rows = db.query("SELECT my_sum(a, 1) FROM (VALUES (1), (2)) t(a)")?;
    assert_eq!(Some(vec![Value::Integer(2), Value::Integer(3)]), rows.column(0));
    assert_eq!(2, sum.calls());

    // claims are per database
    setup!(other_db, other_conn);
    register_scalar_udf(&other_conn, "my_sum", sum.clone())?;
    assert_eq!(vec![Value::Integer(5)], other_db.query_row("SELECT my_sum(2, 3)")?);
    Ok(())
}
