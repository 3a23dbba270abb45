pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;
pub use config::{cli::LocalStorage, Settings};

pub use core::{
    etl::{EtlEngine, EtlSummary},
    pipeline::{InputSource, ResponsesPipeline},
};
pub use utils::error::{EtlError, Result};
