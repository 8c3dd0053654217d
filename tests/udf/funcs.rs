use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering;

use sboxudf::catalog::value::Value;
use sboxudf::error::Error;
use sboxudf::error::Result;
use sboxudf::types::Type;
use sboxudf::types::TypeInfo;
use sboxudf::udf::ScalarFunc;
use sboxudf::udf::ScalarFuncConfig;

pub fn integer() -> TypeInfo {
    TypeInfo::new(Type::Integer).expect("INTEGER is a primitive type")
}

pub fn any() -> TypeInfo {
    TypeInfo::new(Type::Any).expect("ANY is a primitive type")
}

/// `(INTEGER, INTEGER) -> INTEGER`, counts its calls.
#[derive(Default)]
pub struct Sum {
    pub calls: AtomicUsize,
    pub volatile: bool,
}

impl Sum {
    pub fn volatile() -> Sum {
        Sum { volatile: true, ..Default::default() }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl ScalarFunc for Sum {
    fn config(&self) -> ScalarFuncConfig {
        let config = ScalarFuncConfig::new(vec![integer(), integer()], integer());
        if self.volatile {
            config.volatile()
        } else {
            config
        }
    }

    fn execute_row(&self, args: &[Value]) -> Result<Value> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match args {
            [Value::Integer(a), Value::Integer(b)] => Ok(Value::Integer(a + b)),
            _ => Err(Error::execution(format!("unexpected arguments {:?}", args))),
        }
    }
}

/// `(T) -> T`
pub struct Identity(pub TypeInfo);

impl ScalarFunc for Identity {
    fn config(&self) -> ScalarFuncConfig {
        ScalarFuncConfig::new(vec![self.0.clone()], self.0.clone())
    }

    fn execute_row(&self, args: &[Value]) -> Result<Value> {
        Ok(args[0].clone())
    }
}

/// `(INTEGER...) -> INTEGER`, NULL if any argument is NULL.
pub struct VariadicSum;

impl ScalarFunc for VariadicSum {
    fn config(&self) -> ScalarFuncConfig {
        ScalarFuncConfig::variadic(integer(), integer()).volatile().special_null_handling()
    }

    fn execute_row(&self, args: &[Value]) -> Result<Value> {
        let mut sum = 0;
        for arg in args {
            match arg {
                Value::Integer(v) => sum += v,
                _ => return Ok(Value::Null),
            }
        }
        Ok(Value::Integer(sum))
    }
}

/// `(ANY...) -> INTEGER`, counts the NULL arguments.
pub struct CountNulls;

impl ScalarFunc for CountNulls {
    fn config(&self) -> ScalarFuncConfig {
        ScalarFuncConfig::variadic(any(), integer()).special_null_handling()
    }

    fn execute_row(&self, args: &[Value]) -> Result<Value> {
        Ok(Value::Integer(args.iter().filter(|v| v.is_null()).count() as i32))
    }
}

/// `(INTEGER, INTEGER) -> INTEGER` that always fails.
pub struct Failing;

impl ScalarFunc for Failing {
    fn config(&self) -> ScalarFuncConfig {
        ScalarFuncConfig::new(vec![integer(), integer()], integer())
    }

    fn execute_row(&self, _: &[Value]) -> Result<Value> {
        Err(Error::execution("test invalid execution"))
    }
}

/// `(INTEGER) -> INTEGER` that panics on negative input.
pub struct Panicking;

impl ScalarFunc for Panicking {
    fn config(&self) -> ScalarFuncConfig {
        ScalarFuncConfig::new(vec![integer()], integer())
    }

    fn execute_row(&self, args: &[Value]) -> Result<Value> {
        match args {
            [Value::Integer(v)] if *v < 0 => panic!("negative input {}", v),
            [v] => Ok(v.clone()),
            _ => Ok(Value::Null),
        }
    }
}

/// Returns whatever configuration it was built with.
pub struct Configured(pub ScalarFuncConfig);

impl ScalarFunc for Configured {
    fn config(&self) -> ScalarFuncConfig {
        self.0.clone()
    }

    fn execute_row(&self, _: &[Value]) -> Result<Value> {
        Ok(Value::Null)
    }
}
