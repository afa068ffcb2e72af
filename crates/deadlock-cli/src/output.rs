//! Human text and JSON rendering for scenario reports.
//!
//! JSON goes to stdout as one pretty-printed object. Text output mirrors what
//! an operator console would show: the graph, then the verdict, per phase.

use crate::scenario::{Phase, Report};
use serde::Serialize;
use std::io::{self, Write};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    Text,
    Json,
}

impl OutputMode {
    pub const fn from_json_flag(json: bool) -> Self {
        if json { Self::Json } else { Self::Text }
    }
}

pub fn render_report(w: &mut dyn Write, report: &Report, mode: OutputMode) -> io::Result<()> {
    match mode {
        OutputMode::Json => render_json(w, report),
        OutputMode::Text => {
            for (i, phase) in report.phases.iter().enumerate() {
                if i > 0 {
                    writeln!(w)?;
                    writeln!(w, "{}:", capitalize(&phase.label))?;
                }
                render_phase(w, phase)?;
            }
            Ok(())
        }
    }
}

fn render_phase(w: &mut dyn Write, phase: &Phase) -> io::Result<()> {
    write!(w, "{}", phase.text)?;
    if phase.deadlocked {
        writeln!(w, "Deadlock detected in the system!")?;
        if let Some(cycle) = &phase.cycle {
            writeln!(w, "  {cycle}")?;
        }
        for set in &phase.deadlocked_sets {
            writeln!(w, "  deadlocked set: [{}]", set.join(", "))?;
        }
    } else {
        writeln!(w, "No deadlock detected in the system.")?;
    }
    Ok(())
}

fn render_json<T: Serialize>(w: &mut dyn Write, value: &T) -> io::Result<()> {
    serde_json::to_writer_pretty(&mut *w, value)?;
    writeln!(w)
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    chars.next().map_or_else(String::new, |first| {
        first.to_uppercase().chain(chars).collect()
    })
}
