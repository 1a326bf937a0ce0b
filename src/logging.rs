use once_cell::sync::OnceCell;
use tracing_subscriber::EnvFilter;

static INSTALLED: OnceCell<()> = OnceCell::new();

/// Installs the global fmt subscriber once; later calls are no-ops.
/// Timestamps are off because `wasm32-unknown-unknown` has no system clock.
/// Natively events go to stdout; on wasm32 each event is one `console.log`.
pub fn init(filter: &str) {
    INSTALLED.get_or_init(|| {
        let filter = EnvFilter::try_new(filter).unwrap_or_else(|_| EnvFilter::new("info"));
        let builder = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .without_time()
            .with_target(false);
        #[cfg(target_arch = "wasm32")]
        let builder = builder
            .with_ansi(false)
            .with_writer(console::ConsoleWriter::default);
        let _ = builder.try_init();
    });
}

#[cfg(target_arch = "wasm32")]
mod console {
    use std::io;

    use wasm_bindgen::prelude::*;

    #[wasm_bindgen]
    extern "C" {
        #[wasm_bindgen(js_namespace = console, js_name = log)]
        fn console_log(line: &str);
    }

    /// Collects one formatted event and hands it to the console when dropped.
    #[derive(Default)]
    pub struct ConsoleWriter(Vec<u8>);

    impl io::Write for ConsoleWriter {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl Drop for ConsoleWriter {
        fn drop(&mut self) {
            let text = String::from_utf8_lossy(&self.0);
            let line = text.trim_end();
            if !line.is_empty() {
                console_log(line);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_twice_is_harmless() {
        init("ytbg=debug");
        init("not a [valid filter");
        tracing::debug!("logging installed");

        assert!(INSTALLED.get().is_some());
    }
}
