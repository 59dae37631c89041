//! Bridge daemon: watches for NSO N64 controllers and mirrors each one to
//! a virtual Xbox 360 pad until interrupted.

use std::time::Duration;

/// Hot-plug poll interval.
const POLL_INTERVAL: Duration = Duration::from_millis(500);

#[cfg(target_os = "windows")]
fn main() -> color_eyre::Result<()> {
    use std::collections::HashMap;
    use std::sync::Arc;

    use color_eyre::eyre::WrapErr;
    use tracing::{error, info};
    use tracing_subscriber::EnvFilter;

    use padbridge::backends::hid::HidSource;
    use padbridge::backends::windows::VigemBus;
    use padbridge::{DeviceSession, Guid, HotplugDetector, HotplugEvent};

    color_eyre::install()?;
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let bus = VigemBus::connect().wrap_err("is the ViGEmBus driver installed?")?;
    let source = HidSource::new().wrap_err("failed to initialize the HID layer")?;

    let detector = Arc::new(HotplugDetector::new());
    let handler = Arc::clone(&detector);
    ctrlc::set_handler(move || handler.stop())
        .wrap_err("failed to install the interrupt handler")?;

    info!("watching for controllers, press Ctrl-C to exit");
    let mut sessions: HashMap<Guid, DeviceSession> = HashMap::new();
    detector.run(&source, POLL_INTERVAL, |event| match event {
        HotplugEvent::Added(id) => {
            info!(%id, "controller attached");
            match DeviceSession::create(&source, &bus, id) {
                Ok(session) => {
                    sessions.insert(id, session);
                }
                Err(err) => error!(%id, %err, "failed to bridge controller"),
            }
        }
        HotplugEvent::Removed(id) => {
            info!(%id, "controller detached");
            // Drop tears the session down: listener join, then device and
            // virtual pad release.
            sessions.remove(&id);
        }
    });

    info!("all sessions closed");
    Ok(())
}

#[cfg(not(target_os = "windows"))]
fn main() {
    eprintln!("padbridge requires Windows (ViGEmBus)");
    std::process::exit(1);
}
