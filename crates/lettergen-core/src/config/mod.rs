pub mod consts;
pub mod model;

pub use model::{BatchConfig, ConfigLayer, ExistingFilePolicy, PdfSettings, default_worker_count};
