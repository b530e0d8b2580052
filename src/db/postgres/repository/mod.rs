pub mod api_log_repository;
pub mod long_short_ratio_repository;
