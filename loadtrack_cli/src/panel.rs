//! Console implementation of the operator panel.
//!
//! Rendering mirrors the two-line character display of the field unit:
//! current weight on one line, lifetime count and tonnage on the other,
//! collapsed here into a single status line that is rewritten in place.
//! Input comes from the line-oriented pump on stdin.

use std::io::Write;

use loadtrack_core::pump::InputPump;
use loadtrack_traits::{CalibrationView, IdleView, InputEvent, Notice, Panel};

pub struct ConsolePanel {
    pump: InputPump,
    last_line: String,
}

impl ConsolePanel {
    pub fn new(pump: InputPump) -> Self {
        Self {
            pump,
            last_line: String::new(),
        }
    }

    fn rewrite(&mut self, line: String) {
        if line == self.last_line {
            return;
        }
        let mut out = std::io::stdout().lock();
        // Pad over the previous line before rewriting it.
        let pad = self.last_line.len().saturating_sub(line.len());
        let _ = write!(out, "\r{}{}", line, " ".repeat(pad));
        let _ = out.flush();
        self.last_line = line;
    }

    fn announce(&mut self, msg: &str) {
        let mut out = std::io::stdout().lock();
        let _ = writeln!(out, "\r{}", msg);
        let _ = out.flush();
        self.last_line.clear();
    }
}

impl Panel for ConsolePanel {
    fn render_idle(&mut self, view: &IdleView) {
        self.rewrite(format!(
            "{:>8.1} kg | loads: {} | total: {:.3} t",
            view.current_kg,
            view.load_count,
            view.total_kg / 1000.0
        ));
    }

    fn render_calibration(&mut self, view: &CalibrationView<'_>) {
        self.rewrite(format!("known weight (kg): {}_", view.entry));
    }

    fn notify(&mut self, notice: Notice) {
        match notice {
            Notice::Stored => self.announce("Values Stored"),
            Notice::Reset => self.announce("All Values Reset"),
            Notice::Calibrated { known_kg, factor } => self.announce(&format!(
                "Calibrated: {known_kg} kg -> factor {factor:.2}"
            )),
        }
    }

    fn poll(&mut self) -> Option<InputEvent> {
        self.pump.try_next()
    }
}
