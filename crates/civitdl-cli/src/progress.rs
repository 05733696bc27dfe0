//! Terminal rendering of transfer events.
//!
//! On a terminal every active transfer gets its own `indicatif` bar. When
//! stdout is redirected, events become plain log-style lines, with progress
//! lines throttled per item.

use std::collections::HashMap;
use std::io::{self, IsTerminal};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use indicatif::{HumanBytes, MultiProgress, ProgressBar, ProgressDrawTarget, ProgressStyle};

use civitdl_core::{TransferEvent, TransferEventSink};
use civitdl_download::ProgressThrottle;

const MAX_LABEL: usize = 48;
const PLAIN_PROGRESS_INTERVAL: Duration = Duration::from_secs(2);

// ============================================================================
// Sink
// ============================================================================

/// Progress display that picks terminal or plain output.
pub struct ProgressSink {
    inner: ProgressRender,
}

enum ProgressRender {
    Fancy(FancyProgress),
    Plain(PlainProgress),
}

impl ProgressSink {
    /// Create a sink, auto-detecting terminal capability.
    pub fn new() -> Self {
        if io::stdout().is_terminal() {
            Self {
                inner: ProgressRender::Fancy(FancyProgress::new()),
            }
        } else {
            Self::plain()
        }
    }

    /// Create a sink that prints plain lines.
    pub fn plain() -> Self {
        Self {
            inner: ProgressRender::Plain(PlainProgress::default()),
        }
    }

    /// Clear any bars still on screen.
    pub fn finish(&self) {
        if let ProgressRender::Fancy(fancy) = &self.inner {
            fancy.finish();
        }
    }
}

impl Default for ProgressSink {
    fn default() -> Self {
        Self::new()
    }
}

impl TransferEventSink for ProgressSink {
    fn emit(&self, event: TransferEvent) {
        match &self.inner {
            ProgressRender::Fancy(fancy) => fancy.handle(&event),
            ProgressRender::Plain(plain) => plain.handle(&event),
        }
    }
}

// ============================================================================
// Fancy Terminal Progress (indicatif)
// ============================================================================

struct FancyProgress {
    multi: MultiProgress,
    bars: Mutex<HashMap<String, ProgressBar>>,
}

impl FancyProgress {
    fn new() -> Self {
        Self {
            multi: MultiProgress::with_draw_target(ProgressDrawTarget::stdout()),
            bars: Mutex::new(HashMap::new()),
        }
    }

    fn handle(&self, event: &TransferEvent) {
        let mut bars = self.bars.lock().unwrap_or_else(PoisonError::into_inner);
        match event {
            TransferEvent::Started {
                id,
                file_name,
                resume_from,
            } => {
                let bar = self.multi.add(ProgressBar::new_spinner());
                bar.set_style(spinner_style());
                bar.set_message(format_label(&format!("{id} {file_name}")));
                bar.set_position(*resume_from);
                bar.enable_steady_tick(Duration::from_millis(120));
                bars.insert(id.clone(), bar);
            }
            TransferEvent::Progress {
                id,
                bytes_transferred,
                bytes_total,
            } => {
                let Some(bar) = bars.get(id) else { return };
                if let Some(total) = *bytes_total {
                    if bar.length() != Some(total) {
                        bar.set_style(bar_style());
                        bar.set_length(total);
                    }
                }
                bar.set_position(*bytes_transferred);
            }
            TransferEvent::Restarted { id, reason } => {
                if let Some(bar) = bars.get(id) {
                    bar.set_position(0);
                }
                self.println(&format!("↻ {id}: {reason}"));
            }
            TransferEvent::Completed { id, .. } | TransferEvent::Failed { id, .. } => {
                if let Some(bar) = bars.remove(id) {
                    bar.finish_and_clear();
                }
                self.println(&describe_event(event));
            }
        }
    }

    fn println(&self, line: &str) {
        // Falls back to stdout when the bars are hidden
        if self.multi.println(line).is_err() || self.multi.is_hidden() {
            println!("{line}");
        }
    }

    fn finish(&self) {
        let mut bars = self.bars.lock().unwrap_or_else(PoisonError::into_inner);
        for (_, bar) in bars.drain() {
            bar.finish_and_clear();
        }
    }
}

fn spinner_style() -> ProgressStyle {
    ProgressStyle::with_template("{spinner} {msg} {human_pos:>10}")
        .unwrap_or_else(|_| ProgressStyle::default_spinner())
}

fn bar_style() -> ProgressStyle {
    ProgressStyle::with_template(
        "{msg} {bar:28.cyan/blue} {bytes:>10} / {total_bytes:>10} ({percent:>3}%) @ {binary_bytes_per_sec} ETA {eta}",
    )
    .unwrap_or_else(|_| ProgressStyle::default_bar())
}

fn format_label(raw: &str) -> String {
    if raw.chars().count() <= MAX_LABEL {
        return raw.to_string();
    }
    let mut buf: String = raw.chars().take(MAX_LABEL - 1).collect();
    buf.push('…');
    buf
}

// ============================================================================
// Plain Progress (non-terminal)
// ============================================================================

#[derive(Default)]
struct PlainProgress {
    throttles: Mutex<HashMap<String, ProgressThrottle>>,
}

impl PlainProgress {
    fn handle(&self, event: &TransferEvent) {
        if let TransferEvent::Progress { id, .. } = event {
            let mut throttles = self
                .throttles
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            let throttle = throttles
                .entry(id.clone())
                .or_insert_with(|| ProgressThrottle::new(PLAIN_PROGRESS_INTERVAL));
            if !throttle.should_emit() {
                return;
            }
        }
        if event.is_terminal() {
            self.throttles
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .remove(event.id());
        }
        println!("{}", describe_event(event));
    }
}

/// One human-readable line for an event.
pub fn describe_event(event: &TransferEvent) -> String {
    match event {
        TransferEvent::Started {
            id,
            file_name,
            resume_from: 0,
        } => format!("→ {id}: downloading {file_name}"),
        TransferEvent::Started {
            id,
            file_name,
            resume_from,
        } => format!(
            "→ {id}: resuming {file_name} from {}",
            HumanBytes(*resume_from)
        ),
        TransferEvent::Progress {
            id,
            bytes_transferred,
            bytes_total: Some(total),
        } if *total > 0 => format!(
            "  {id}: {} / {} ({}%)",
            HumanBytes(*bytes_transferred),
            HumanBytes(*total),
            bytes_transferred.saturating_mul(100) / total
        ),
        TransferEvent::Progress {
            id,
            bytes_transferred,
            ..
        } => format!("  {id}: {}", HumanBytes(*bytes_transferred)),
        TransferEvent::Restarted { id, reason } => format!("↻ {id}: {reason}"),
        TransferEvent::Completed {
            id,
            bytes_written,
            final_size,
        } if bytes_written == final_size => format!("✓ {id}: {}", HumanBytes(*final_size)),
        TransferEvent::Completed {
            id,
            bytes_written,
            final_size,
        } => format!(
            "✓ {id}: {} ({} new)",
            HumanBytes(*final_size),
            HumanBytes(*bytes_written)
        ),
        TransferEvent::Failed { id, error } => format!("✗ {id}: {error}"),
    }
}
