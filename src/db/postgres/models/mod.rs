pub mod api_log;
pub mod long_short_ratio;
