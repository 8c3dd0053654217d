macro_rules! setup {
    ($db:ident, $conn:ident) => {
        let _ = env_logger::builder().is_test(true).try_init();
        let $db = sboxudf::driver::Database::open_in_memory()?;
        let $conn = $db.connect()?;
    };
    ($db:ident, $conn:ident, $cfg:expr) => {
        let _ = env_logger::builder().is_test(true).try_init();
        let $db = sboxudf::driver::Database::open(&$cfg)?;
        let $conn = $db.connect()?;
    };
}

mod errors;
mod funcs;
mod scalar;
