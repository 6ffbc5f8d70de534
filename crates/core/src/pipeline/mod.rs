pub mod assemble_video_use_case;
pub mod output_dirs;
pub mod pipeline_logger;
pub mod session_config;
pub mod session_error;
pub mod video_session_use_case;
