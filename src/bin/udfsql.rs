use std::io::BufRead;
use std::sync::Arc;

use sboxudf::catalog::value::Value;
use sboxudf::config::Config;
use sboxudf::driver::Connection;
use sboxudf::driver::Database;
use sboxudf::error::Result;
use sboxudf::types::Type;
use sboxudf::types::TypeInfo;
use sboxudf::udf::register_scalar_udf;
use sboxudf::udf::register_scalar_udf_set;
use sboxudf::udf::ScalarFunc;
use sboxudf::udf::ScalarFuncConfig;
use sboxudf::udf::ScalarUdf;
use sboxudf::value_err;

fn main() -> Result<()> {
    let args = clap::command!()
        .name("udfsql")
        .about("Runs SQL against an embedded DuckDB database with demo scalar UDFs")
        .arg(
            clap::Arg::new("config")
                .short('c')
                .long("config")
                .help("Configuration file path")
                .default_value(""),
        )
        .arg(
            clap::Arg::new("execute")
                .short('e')
                .long("execute")
                .help("Statements to run, read from stdin when absent"),
        )
        .get_matches();
    let file = args.get_one::<String>("config").map(|s| s.as_str()).unwrap_or_default();
    let cfg = Config::new(file)?;
    env_logger::Builder::new().parse_filters(&cfg.log_level).init();

    let db = Database::open(&cfg)?;
    let conn = db.connect()?;
    register_demo_functions(&conn)?;

    if let Some(sql) = args.get_one::<String>("execute") {
        return run(&conn, sql);
    }
    // Statements end with a semicolon and may span lines.
    let mut statement = String::new();
    for line in std::io::stdin().lock().lines() {
        let line = line?;
        statement.push_str(line.trim());
        statement.push(' ');
        if statement.trim_end().ends_with(';') {
            run(&conn, &statement)?;
            statement.clear();
        }
    }
    if !statement.trim().is_empty() {
        run(&conn, &statement)?;
    }
    Ok(())
}

fn run(conn: &Connection, sql: &str) -> Result<()> {
    match conn.query(sql) {
        Ok(rows) if rows.columns().is_empty() => println!("done"),
        Ok(rows) => println!("{}", rows),
        Err(err) => println!("Error: {}", err),
    }
    Ok(())
}

fn register_demo_functions(conn: &Connection) -> Result<()> {
    register_scalar_udf(conn, "add_checked", Arc::new(Add))?;
    register_scalar_udf(conn, "count_nulls", Arc::new(CountNulls))?;
    register_scalar_udf_set(
        conn,
        "describe_value",
        [ScalarUdf::from(Arc::new(Describe(Type::BigInt))), ScalarUdf::from(Arc::new(Describe(Type::Varchar)))],
    )
}

/// `add_checked(BIGINT, BIGINT) -> BIGINT`, fails on overflow.
struct Add;

impl ScalarFunc for Add {
    fn config(&self) -> ScalarFuncConfig {
        let big = TypeInfo::new(Type::BigInt).ok();
        ScalarFuncConfig {
            input_type_infos: Some(vec![big.clone(), big.clone()]),
            result_type_info: big,
            ..Default::default()
        }
    }

    fn execute_row(&self, args: &[Value]) -> Result<Value> {
        match args {
            [Value::BigInt(a), Value::BigInt(b)] => {
                a.checked_add(*b).map(Value::BigInt).ok_or_else(|| value_err!("{} + {} overflows", a, b))
            }
            _ => Err(value_err!("add_checked expects two BIGINT arguments, got {:?}", args)),
        }
    }
}

/// `count_nulls(ANY...) -> INTEGER`, counts the NULL arguments.
struct CountNulls;

impl ScalarFunc for CountNulls {
    fn config(&self) -> ScalarFuncConfig {
        ScalarFuncConfig {
            variadic_type_info: TypeInfo::new(Type::Any).ok(),
            result_type_info: TypeInfo::new(Type::Integer).ok(),
            ..Default::default()
        }
        .special_null_handling()
    }

    fn execute_row(&self, args: &[Value]) -> Result<Value> {
        Ok(Value::Integer(args.iter().filter(|v| v.is_null()).count() as i32))
    }
}

/// `describe_value(T) -> VARCHAR`, one overload per type.
struct Describe(Type);

impl ScalarFunc for Describe {
    fn config(&self) -> ScalarFuncConfig {
        ScalarFuncConfig {
            input_type_infos: Some(vec![TypeInfo::new(self.0).ok()]),
            result_type_info: TypeInfo::new(Type::Varchar).ok(),
            ..Default::default()
        }
    }

    fn execute_row(&self, args: &[Value]) -> Result<Value> {
        let arg = args.first().map(|v| v.to_string()).unwrap_or_default();
        Ok(Value::Varchar(format!("{} {}", self.0, arg)))
    }
}
