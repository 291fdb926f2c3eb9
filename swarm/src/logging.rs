use std::io::Write;

use indicatif::MultiProgress;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

const CRATES: &[&str] = &["swarm", "swarm_core", "swarm_http", "swarm_metrics"];

fn default_directives(verbose: bool) -> String {
    let level = if verbose { "debug" } else { "info" };
    CRATES
        .iter()
        .map(|c| format!("{c}={level}"))
        .collect::<Vec<_>>()
        .join(",")
}

/// Writes each log event to stderr with the progress bars hidden, so bars and log lines never
/// interleave mid-draw.
#[derive(Clone)]
pub(crate) struct BarAwareStderr {
    bars: MultiProgress,
}

impl<'a> MakeWriter<'a> for BarAwareStderr {
    type Writer = EventWriter;

    fn make_writer(&'a self) -> Self::Writer {
        EventWriter {
            bars: self.bars.clone(),
            buf: Vec::with_capacity(256),
        }
    }
}

/// Buffers one formatted event; emitted when dropped.
pub(crate) struct EventWriter {
    bars: MultiProgress,
    buf: Vec<u8>,
}

impl EventWriter {
    fn emit_to(&mut self, out: &mut impl Write) {
        if self.buf.is_empty() {
            return;
        }
        let buf = std::mem::take(&mut self.buf);
        self.bars.suspend(|| {
            let _ = out.write_all(&buf);
            let _ = out.flush();
        });
    }
}

impl Write for EventWriter {
    fn write(&mut self, data: &[u8]) -> std::io::Result<usize> {
        self.buf.extend_from_slice(data);
        Ok(data.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

impl Drop for EventWriter {
    fn drop(&mut self) {
        self.emit_to(&mut std::io::stderr().lock());
    }
}

/// Logs go to stderr so stdout stays clean for `--output json`. `RUST_LOG` wins over `--verbose`.
pub(crate) fn init(verbose: bool, bars: MultiProgress) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directives(verbose)));

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_writer(BarAwareStderr { bars })
                .with_target(true)
                .with_thread_ids(false)
                .with_file(false),
        )
        .try_init();
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;
    use indicatif::{ProgressBar, ProgressDrawTarget};

    #[test]
    fn directives_cover_every_crate() {
        assert_eq!(
            default_directives(false),
            "swarm=info,swarm_core=info,swarm_http=info,swarm_metrics=info"
        );
        assert!(default_directives(true).contains("swarm_core=debug"));
    }

    #[test]
    fn events_are_emitted_whole_with_bars_suspended() {
        let bars = MultiProgress::with_draw_target(ProgressDrawTarget::hidden());
        let bar = bars.add(ProgressBar::new(10));
        let make = BarAwareStderr { bars };

        let mut writer = make.make_writer();
        writer.write_all(b"WARN virtual user failed ").unwrap();
        writer.write_all(b"user=beginner-1\n").unwrap();

        let mut out = Vec::new();
        writer.emit_to(&mut out);
        assert_eq!(out, b"WARN virtual user failed user=beginner-1\n");

        // Nothing left to emit on drop.
        let mut again = Vec::new();
        writer.emit_to(&mut again);
        assert!(again.is_empty());
        assert!(!bar.is_finished());
    }
}
