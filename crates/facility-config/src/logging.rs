use crate::paths::Paths;

/// Install the process-wide subscriber: compact stderr output plus the JSONL
/// dev log under `paths`.
///
/// `RUST_LOG`, when set, takes precedence over `level`.
pub fn init_logging(level: &str, paths: &Paths) {
    observability::init_with_config(observability::LogConfig {
        service_name: "highpoint".into(),
        default_level: level.into(),
        log_path: Some(paths.log_file()),
        also_stderr: true,
    });
}
