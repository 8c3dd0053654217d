use serde::Deserialize;

use crate::error::Result;

#[derive(Debug, PartialEq, Deserialize)]
pub struct Config {
    pub log_level: String,

    /// Database file, in memory when empty.
    pub path: String,

    /// Engine worker threads, the engine picks when zero.
    pub threads: usize,
}

impl Config {
    pub fn new(file: &str) -> Result<Config> {
        let mut cfg = config::Config::builder()
            .set_default("log_level", "info")?
            .set_default("path", "")?
            .set_default("threads", 0)?;
        if !file.is_empty() {
            cfg = cfg.add_source(config::File::with_name(file))
        }
        cfg = cfg.add_source(config::Environment::with_prefix("SBOXUDF"));
        Ok(cfg.build()?.try_deserialize()?)
    }
}

impl Default for Config {
    fn default() -> Self {
        Config { log_level: "info".to_string(), path: String::new(), threads: 0 }
    }
}
