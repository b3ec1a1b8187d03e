/// Initializes `env_logger` with `info` as the default filter (`RUST_LOG` overrides).
pub fn init() {
    env_logger::Builder::from_env(env_logger::Env::new().default_filter_or("info"))
        .format_target(false)
        .init();
}
