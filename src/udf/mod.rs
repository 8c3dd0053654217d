//! Scalar user defined functions: host functions registered into the
//! engine through its native function interface and called once per row.

use std::sync::Arc;

use log::debug;

use crate::catalog::value::Value;
use crate::driver::Connection;
use crate::error::Error;
use crate::error::Result;
use crate::error::UdfCause;
use crate::types::TypeInfo;

use bridge::NativeScalarFunctionSet;
pub use registry::HandleRegistry;
pub use validate::validate;
pub use validate::ResolvedConfig;

mod bridge;
mod registry;
mod validate;

/// A host function callable from SQL.
///
/// The engine may call [`ScalarFunc::execute_row`] from several threads at
/// once, so implementations keep any state behind their own locks.
pub trait ScalarFunc: Send + Sync {
    /// Declares the parameter and result types and the calling flags.
    fn config(&self) -> ScalarFuncConfig;

    /// Computes the result for one row. `args` holds the fixed arguments
    /// followed by the variadic ones, NULL as [`Value::Null`].
    fn execute_row(&self, args: &[Value]) -> Result<Value>;
}

/// Calling contract of a scalar function. `None` marks an unset list or
/// element, which registration rejects.
#[derive(Debug, Clone, Default)]
pub struct ScalarFuncConfig {
    pub input_type_infos: Option<Vec<Option<TypeInfo>>>,
    /// Type of every argument after the fixed ones.
    pub variadic_type_info: Option<TypeInfo>,
    pub result_type_info: Option<TypeInfo>,
    /// Evaluate for every row even when all arguments are constant.
    pub volatile: bool,
    /// Pass NULL arguments to the function instead of returning NULL.
    pub special_null_handling: bool,
}

impl ScalarFuncConfig {
    /// A fixed-arity configuration.
    pub fn new(inputs: Vec<TypeInfo>, result: TypeInfo) -> ScalarFuncConfig {
        ScalarFuncConfig {
            input_type_infos: Some(inputs.into_iter().map(Some).collect()),
            result_type_info: Some(result),
            ..Default::default()
        }
    }

    /// Any number of arguments, all of type `varargs`.
    pub fn variadic(varargs: TypeInfo, result: TypeInfo) -> ScalarFuncConfig {
        ScalarFuncConfig {
            variadic_type_info: Some(varargs),
            result_type_info: Some(result),
            ..Default::default()
        }
    }

    pub fn volatile(mut self) -> ScalarFuncConfig {
        self.volatile = true;
        self
    }

    pub fn special_null_handling(mut self) -> ScalarFuncConfig {
        self.special_null_handling = true;
        self
    }
}

/// A nullable shared handle to a [`ScalarFunc`], the unit of registration.
#[derive(Clone, Default)]
pub struct ScalarUdf(pub Option<Arc<dyn ScalarFunc>>);

impl ScalarUdf {
    pub fn is_nil(&self) -> bool {
        self.0.is_none()
    }
}

impl<F: ScalarFunc + 'static> From<Arc<F>> for ScalarUdf {
    fn from(func: Arc<F>) -> Self {
        ScalarUdf(Some(func))
    }
}

impl From<Arc<dyn ScalarFunc>> for ScalarUdf {
    fn from(func: Arc<dyn ScalarFunc>) -> Self {
        ScalarUdf(Some(func))
    }
}

impl From<Option<Arc<dyn ScalarFunc>>> for ScalarUdf {
    fn from(func: Option<Arc<dyn ScalarFunc>>) -> Self {
        ScalarUdf(func)
    }
}

fn create_failure(err: Error) -> Error {
    Error::api(Error::ScalarUdfCreate(Box::new(err)))
}

fn create_set_failure(err: Error) -> Error {
    Error::api(Error::ScalarUdfCreateSet(Box::new(err)))
}

/// Registers `udf` as the scalar function `name` on the connection's
/// database, visible to every connection of it. The engine keeps the
/// function until the database is closed.
pub fn register_scalar_udf(conn: &Connection, name: &str, udf: impl Into<ScalarUdf>) -> Result<()> {
    let (func, config) = validate(name, &udf.into()).map_err(Error::udf_create)?;
    let raw = conn.raw()?;
    if conn.function_exists(name)? {
        return Err(Error::udf_create(UdfCause::DuplicateName(name.to_string())));
    }

    let function = bridge::scalar_function(name, func, config, conn.handles()).map_err(create_failure)?;
    function.register(raw).map_err(create_failure)?;
    debug!("registered scalar UDF {}", name);
    Ok(())
}

/// Registers the overloads in `udfs` together under `name`. Either every
/// overload is registered or none is.
pub fn register_scalar_udf_set(
    conn: &Connection,
    name: &str,
    udfs: impl IntoIterator<Item = ScalarUdf>,
) -> Result<()> {
    let udfs = udfs.into_iter().collect::<Vec<_>>();
    if udfs.len() < 2 {
        return Err(Error::udf_create_set(UdfCause::SetTooSmall(udfs.len())));
    }
    let validated = udfs
        .iter()
        .map(|udf| validate(name, udf))
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(Error::udf_create)?;

    let raw = conn.raw()?;
    if conn.function_exists(name)? {
        return Err(Error::udf_create_set(UdfCause::DuplicateName(name.to_string())));
    }

    // Dropping a partially built set releases the handles it claimed.
    let mut set = NativeScalarFunctionSet::new(name).map_err(create_set_failure)?;
    for (func, config) in validated {
        let function =
            bridge::scalar_function(name, func, config, conn.handles()).map_err(create_set_failure)?;
        set.add(&function).map_err(|err| Error::api(Error::ScalarUdfAddToSet(Box::new(err))))?;
    }
    set.register(raw).map_err(create_set_failure)?;
    debug!("registered scalar UDF set {} with {} overloads", name, udfs.len());
    Ok(())
}
