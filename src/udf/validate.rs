use std::sync::Arc;

use crate::catalog::r#type::LogicalType;
use crate::error::UdfCause;
use crate::udf::ScalarFunc;
use crate::udf::ScalarUdf;

/// A configuration that passed validation, in engine types.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedConfig {
    pub inputs: Vec<LogicalType>,
    pub varargs: Option<LogicalType>,
    pub result: LogicalType,
    pub volatile: bool,
    pub special_null_handling: bool,
}

/// Checks a descriptor before anything is handed to the engine. The
/// first failing check wins, in the order below.
pub fn validate(
    name: &str,
    udf: &ScalarUdf,
) -> std::result::Result<(Arc<dyn ScalarFunc>, ResolvedConfig), UdfCause> {
    let func = udf.0.as_ref().ok_or(UdfCause::IsNil)?;
    if name.is_empty() {
        return Err(UdfCause::NoName);
    }

    let config = func.config();
    let varargs = config.variadic_type_info.map(|info| info.logical_type().clone());
    let inputs = match (config.input_type_infos, &varargs) {
        (None, None) => return Err(UdfCause::NilInputTypes),
        (None, Some(_)) => vec![],
        (Some(infos), None) if infos.is_empty() => return Err(UdfCause::EmptyInputTypes),
        (Some(infos), _) => infos
            .into_iter()
            .map(|info| info.map(|it| it.logical_type().clone()).ok_or(UdfCause::InputTypeIsNil))
            .collect::<std::result::Result<Vec<_>, _>>()?,
    };
    let result = config.result_type_info.ok_or(UdfCause::ResultTypeIsNil)?.logical_type().clone();
    if result.contains_any() {
        return Err(UdfCause::ResultTypeIsAny);
    }

    let resolved = ResolvedConfig {
        inputs,
        varargs,
        result,
        volatile: config.volatile,
        special_null_handling: config.special_null_handling,
    };
    Ok((func.clone(), resolved))
}
