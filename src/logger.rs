//! Logging for the scaffold library and the Stencil binary.
//!
//! The library never logs on its own; a [`Logger`] must be handed to the
//! scaffold for it to emit anything. [`StandardLogger`] bridges to the `log`
//! facade so the binary gets library output through `env_logger`.

/// Receives debug and informational messages from a scaffold render.
pub trait Logger: Send + Sync {
    fn debug(&self, message: &str);
    fn info(&self, message: &str);
}

/// A logger that forwards to the `log` crate macros.
pub struct StandardLogger;

impl Logger for StandardLogger {
    fn debug(&self, message: &str) {
        log::debug!("{}", message);
    }

    fn info(&self, message: &str) {
        log::info!("{}", message);
    }
}

pub fn init_logger(verbose: bool) {
    env_logger::Builder::new()
        .filter_level(if verbose {
            log::LevelFilter::Debug
        } else {
            log::LevelFilter::Info
        })
        .init();
}
