use tracing::Level;
use tracing_subscriber::FmtSubscriber;

/// Installs a stderr subscriber. `verbosity` counts `-v` flags: warnings
/// only by default, then info, debug and trace.
pub fn init(verbosity: u8) -> Result<(), tracing::subscriber::SetGlobalDefaultError> {
    let level = match verbosity {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
}
