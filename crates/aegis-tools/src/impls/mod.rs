pub mod list_directory;
pub mod read_file;
pub mod search_web;
pub mod system_metrics;

pub use list_directory::ListDirectoryTool;
pub use read_file::ReadFileTool;
pub use search_web::SearchWebTool;
pub use system_metrics::{LatestMetricsProvider, SystemMetricsTool};
