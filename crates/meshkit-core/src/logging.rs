//! `tracing` subscriber setup.

const DEFAULT_FILTER: &str = "info,meshkit_geometry=debug,meshkit_render=debug";

/// Install a formatting subscriber with the default filter.
///
/// `RUST_LOG` style directives can be passed with [`init_with_filter`].
pub fn init() {
    init_with_filter(DEFAULT_FILTER);
}

/// Install a formatting subscriber using the given `EnvFilter` directives.
///
/// Calling this more than once is harmless; later calls are ignored.
pub fn init_with_filter(filter: &str) {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new(filter))
        .try_init();
}
