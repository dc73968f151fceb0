use once_cell::sync::OnceCell;

static INIT: OnceCell<()> = OnceCell::new();

/// Sets up env_logger once per test binary. `RUST_LOG` still applies.
pub fn init_test_logging() {
    INIT.get_or_init(|| {
        let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("debug"))
            .is_test(true)
            .try_init();
    });
}
