pub mod frame_cleaner;
pub mod infrastructure;
pub mod pipeline_config;
pub mod pipeline_executor;
pub mod pipeline_logger;
pub mod remove_watermark_use_case;
