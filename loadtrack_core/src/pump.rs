//! Operator input pump.
//!
//! Spawns a thread that owns a line reader (stdin in the CLI), parses each
//! line into discrete `InputEvent`s, and queues them on a bounded channel.
//! The consumer drains at most one event per loop iteration, which preserves
//! the loop-interval debounce guarantee.
//!
//! Safety: each `InputPump` spawns exactly one thread. The thread exits on
//! EOF, on a read error, or when the consumer is dropped. Drop does not join
//! the thread because a blocking stdin read cannot be interrupted; the
//! shutdown flag makes it exit at the next line boundary instead.

use crossbeam_channel as xch;
use std::io::BufRead;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use loadtrack_traits::InputEvent;

/// Parse one whitespace-separated token into an event.
///
/// Tokens: `t`/`tare`, `s`/`store`, `r`/`reset`, `c`/`cal`/`calibrate`,
/// single digits, `.`, `x`/`clear`, `e`/`enter`.
pub fn parse_event(token: &str) -> Option<InputEvent> {
    let t = token.trim().to_ascii_lowercase();
    match t.as_str() {
        "t" | "tare" => Some(InputEvent::Tare),
        "s" | "store" => Some(InputEvent::Store),
        "r" | "reset" => Some(InputEvent::Reset),
        "c" | "cal" | "calibrate" => Some(InputEvent::BeginCalibration),
        "." => Some(InputEvent::DecimalPoint),
        "x" | "clear" => Some(InputEvent::Clear),
        "e" | "enter" => Some(InputEvent::Enter),
        _ => {
            let mut chars = t.chars();
            match (chars.next(), chars.next()) {
                (Some(c), None) if c.is_ascii_digit() => Some(InputEvent::Digit(c)),
                _ => None,
            }
        }
    }
}

/// Parse a whole line. Numeric tokens like `25.5` expand into the key
/// presses an operator would make on the keypad.
pub fn parse_line(line: &str) -> Vec<InputEvent> {
    let mut out = Vec::new();
    for tok in line.split_whitespace() {
        if let Some(ev) = parse_event(tok) {
            out.push(ev);
        } else if !tok.is_empty() && tok.chars().all(|c| c.is_ascii_digit() || c == '.') {
            for c in tok.chars() {
                out.push(if c == '.' {
                    InputEvent::DecimalPoint
                } else {
                    InputEvent::Digit(c)
                });
            }
        } else {
            tracing::warn!(token = tok, "ignoring unrecognized input token");
        }
    }
    out
}

pub struct InputPump {
    rx: xch::Receiver<InputEvent>,
    shutdown: Arc<AtomicBool>,
}

impl InputPump {
    pub fn spawn<R: BufRead + Send + 'static>(reader: R) -> Self {
        let (tx, rx) = xch::bounded(64);
        let shutdown = Arc::new(AtomicBool::new(false));
        let shutdown_clone = shutdown.clone();

        std::thread::spawn(move || {
            for line in reader.lines() {
                if shutdown_clone.load(Ordering::Relaxed) {
                    break;
                }
                let line = match line {
                    Ok(l) => l,
                    Err(e) => {
                        tracing::debug!(error = %e, "input reader error, stopping pump");
                        break;
                    }
                };
                for ev in parse_line(&line) {
                    // If send fails, the consumer is gone; exit gracefully.
                    if tx.send(ev).is_err() {
                        return;
                    }
                }
            }
            tracing::trace!("input pump thread exiting");
        });

        Self { rx, shutdown }
    }

    /// Next queued event, if any. Non-blocking.
    pub fn try_next(&self) -> Option<InputEvent> {
        self.rx.try_recv().ok()
    }
}

impl Drop for InputPump {
    fn drop(&mut self) {
        self.shutdown.store(true, Ordering::Relaxed);
    }
}
