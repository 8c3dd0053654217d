//! Glue between a [`ScalarFunc`] and the engine's C function interface:
//! builds the native function on registration and drives the descriptor
//! row by row on every batch.

use std::any::Any;
use std::ffi::c_void;
use std::ffi::CString;
use std::panic;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use libduckdb_sys as ffi;
use log::debug;
use log::warn;

use crate::catalog::value::Value;
use crate::error::Error;
use crate::error::Result;
use crate::error::UdfCause;
use crate::udf::registry::handle_key;
use crate::udf::HandleRegistry;
use crate::udf::ResolvedConfig;
use crate::udf::ScalarFunc;
use crate::vector::logical::NativeType;
use crate::vector::DataChunk;
use crate::vector::FlatVector;
use crate::vector::Validity;

/// Carried by the native function and handed back on every batch.
struct UdfExtraInfo {
    udf: Arc<dyn ScalarFunc>,
    name: String,
    key: usize,
    handles: Arc<HandleRegistry>,
    special_null_handling: bool,
}

/// A native scalar function not yet owned by the catalog. Dropping it
/// destroys the function, which releases its descriptor claim.
pub(crate) struct NativeScalarFunction(ffi::duckdb_scalar_function);

impl NativeScalarFunction {
    /// Registers the function on the connection's database.
    pub fn register(&self, con: ffi::duckdb_connection) -> Result<()> {
        let state = unsafe { ffi::duckdb_register_scalar_function(con, self.0) };
        if state != ffi::duckdb_state_DuckDBSuccess {
            return Err(Error::Engine("the engine rejected the scalar function".to_string()));
        }
        Ok(())
    }
}

impl Drop for NativeScalarFunction {
    fn drop(&mut self) {
        unsafe { ffi::duckdb_destroy_scalar_function(&mut self.0) }
    }
}

/// Overloads sharing one name, registered in one step.
pub(crate) struct NativeScalarFunctionSet(ffi::duckdb_scalar_function_set);

impl NativeScalarFunctionSet {
    pub fn new(name: &str) -> Result<NativeScalarFunctionSet> {
        let name = CString::new(name)?;
        Ok(NativeScalarFunctionSet(unsafe { ffi::duckdb_create_scalar_function_set(name.as_ptr()) }))
    }

    /// Copies `function` into the set; the set shares its extra info.
    pub fn add(&mut self, function: &NativeScalarFunction) -> Result<()> {
        let state = unsafe { ffi::duckdb_add_scalar_function_to_set(self.0, function.0) };
        if state != ffi::duckdb_state_DuckDBSuccess {
            return Err(Error::Engine("the engine rejected the overload".to_string()));
        }
        Ok(())
    }

    pub fn register(&self, con: ffi::duckdb_connection) -> Result<()> {
        let state = unsafe { ffi::duckdb_register_scalar_function_set(con, self.0) };
        if state != ffi::duckdb_state_DuckDBSuccess {
            return Err(Error::Engine("the engine rejected the scalar function set".to_string()));
        }
        Ok(())
    }
}

impl Drop for NativeScalarFunctionSet {
    fn drop(&mut self) {
        unsafe { ffi::duckdb_destroy_scalar_function_set(&mut self.0) }
    }
}

/// Claims the descriptor instance and builds its native function. The
/// claim is released when the native function is destroyed, either by a
/// failed registration or by the engine on shutdown.
pub(crate) fn scalar_function(
    name: &str,
    udf: Arc<dyn ScalarFunc>,
    config: ResolvedConfig,
    handles: &Arc<HandleRegistry>,
) -> Result<NativeScalarFunction> {
    let c_name = CString::new(name)?;
    let inputs = config.inputs.iter().map(NativeType::new).collect::<Result<Vec<_>>>()?;
    let varargs = config.varargs.as_ref().map(NativeType::new).transpose()?;
    let result = NativeType::new(&config.result)?;

    let key = handle_key(&udf);
    if !handles.acquire(key) {
        return Err(Error::ScalarUdf(UdfCause::HandleInUse));
    }
    let extra = Box::new(UdfExtraInfo {
        udf,
        name: name.to_string(),
        key,
        handles: Arc::clone(handles),
        special_null_handling: config.special_null_handling,
    });

    let function = NativeScalarFunction(unsafe { ffi::duckdb_create_scalar_function() });
    unsafe {
        ffi::duckdb_scalar_function_set_name(function.0, c_name.as_ptr());
        for ty in &inputs {
            ffi::duckdb_scalar_function_add_parameter(function.0, ty.as_raw());
        }
        if let Some(ty) = &varargs {
            ffi::duckdb_scalar_function_set_varargs(function.0, ty.as_raw());
        }
        ffi::duckdb_scalar_function_set_return_type(function.0, result.as_raw());
        if config.volatile {
            ffi::duckdb_scalar_function_set_volatile(function.0);
        }
        if config.special_null_handling {
            ffi::duckdb_scalar_function_set_special_handling(function.0);
        }
        ffi::duckdb_scalar_function_set_function(function.0, Some(scalar_udf_callback));
        ffi::duckdb_scalar_function_set_extra_info(
            function.0,
            Box::into_raw(extra) as *mut c_void,
            Some(delete_callback),
        );
    }
    debug!(
        "built native function {}({}{}) -> {}",
        name,
        config.inputs.iter().map(|t| t.to_string()).collect::<Vec<_>>().join(", "),
        config.varargs.map(|t| format!("{}...", t)).unwrap_or_default(),
        config.result
    );
    Ok(function)
}

unsafe extern "C" fn scalar_udf_callback(
    info: ffi::duckdb_function_info,
    input: ffi::duckdb_data_chunk,
    output: ffi::duckdb_vector,
) {
    let extra = ffi::duckdb_scalar_function_get_extra_info(info) as *const UdfExtraInfo;
    let Some(extra) = extra.as_ref() else {
        set_error(info, &Error::internal("scalar UDF invoked without its extra info"));
        return;
    };
    let input = DataChunk::borrowed(input);
    // Unwinding into the engine is undefined, so nothing may escape.
    let outcome = panic::catch_unwind(AssertUnwindSafe(|| -> Result<()> {
        let mut output = FlatVector::from_raw(output)?;
        execute_batch(extra, &input, &mut output)
    }));
    let err = match outcome {
        Ok(Ok(())) => return,
        Ok(Err(err)) => err,
        Err(payload) => panic_failure(payload.as_ref()),
    };
    warn!("scalar UDF {} aborted a batch of {} rows: {}", extra.name, input.size(), err);
    set_error(info, &err);
}

unsafe fn set_error(info: ffi::duckdb_function_info, err: &Error) {
    let msg = CString::new(err.to_string().replace('\0', " ")).unwrap_or_default();
    ffi::duckdb_scalar_function_set_error(info, msg.as_ptr());
}

unsafe extern "C" fn delete_callback(data: *mut c_void) {
    if data.is_null() {
        return;
    }
    let extra = Box::from_raw(data as *mut UdfExtraInfo);
    extra.handles.release(extra.key);
    debug!("released scalar UDF {}", extra.name);
}

fn execute_batch(extra: &UdfExtraInfo, input: &DataChunk, output: &mut FlatVector<'_>) -> Result<()> {
    let size = input.size();
    let columns = input.columns().map_err(execution_failure)?;
    let mask = row_mask(&columns, size, extra.special_null_handling);
    let mut args = Vec::with_capacity(columns.len());
    for row in 0..size {
        if !mask.is_valid(row) {
            output.set_null(row);
            continue;
        }
        args.clear();
        for column in &columns {
            args.push(column.get(row).map_err(execution_failure)?);
        }
        let value = call_row(extra.udf.as_ref(), &args)?;
        output.set(row, &value).map_err(|err| {
            execution_failure(Error::execution(format!(
                "{} returned a value not matching its result type {}: {}",
                extra.name,
                output.logical_type(),
                err
            )))
        })?;
    }
    Ok(())
}

/// Rows the descriptor is called for. Without special null handling a row
/// with a NULL in any column is skipped.
fn row_mask(columns: &[FlatVector<'_>], size: usize, special_null_handling: bool) -> Validity {
    let mut mask = Validity::all_valid(size);
    if !special_null_handling {
        for column in columns {
            mask.and_assign(&column.validity(size));
        }
    }
    mask
}

fn call_row(udf: &dyn ScalarFunc, args: &[Value]) -> Result<Value> {
    match panic::catch_unwind(AssertUnwindSafe(|| udf.execute_row(args))) {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(err)) => Err(execution_failure(err)),
        Err(payload) => Err(panic_failure(payload.as_ref())),
    }
}

fn execution_failure(err: Error) -> Error {
    match err {
        Error::Execution(msg) => Error::api(Error::Execution(msg)),
        Error::Api(_) => err,
        err => Error::api(Error::execution(err.to_string())),
    }
}

fn panic_failure(payload: &(dyn Any + Send)) -> Error {
    let msg = if let Some(msg) = payload.downcast_ref::<&str>() {
        msg.to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic payload".to_string()
    };
    Error::api(Error::execution(format!("panic: {}", msg)))
}
