use std::io::{self, Write};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use crossterm::{
    cursor::MoveToColumn,
    style::{Color, ResetColor, SetForegroundColor},
    terminal::{Clear, ClearType},
    ExecutableCommand,
};

use crate::throttle::Throttle;

/// Spinner animation frames
const SPINNER_FRAMES: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];

/// Progress bar characters
const PROGRESS_FULL: &str = "█";
const PROGRESS_EMPTY: &str = "░";
const PROGRESS_WIDTH: usize = 10;

/// Sparkline levels for multiplexed fractional progress
const SPARK_LEVELS: &[char] = &['▁', '▂', '▃', '▄', '▅', '▆', '▇', '█'];

/// Per-slot progress state.
///
/// Transitions: `Pending -> Running(0..1)* -> Success | Error`.
/// Terminal states are irreversible; later updates are ignored.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TaskState {
    Pending,
    Running(f64),
    Success,
    Error,
}

impl TaskState {
    pub fn is_terminal(self) -> bool {
        matches!(self, TaskState::Success | TaskState::Error)
    }
}

/// Aggregate slot counts for the multiplexed summary line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Counts {
    pub pending: usize,
    pub running: usize,
    pub success: usize,
    pub error: usize,
}

struct Slot {
    state: TaskState,
    label: Option<String>,
}

/// Renders live aggregate state for one or many concurrently tracked tasks
/// as a single, continuously rewritten stderr line.
///
/// Updates mutate state and return immediately; drawing is throttled so
/// rapid updates coalesce, and is skipped entirely when stderr is not a
/// terminal. Rendering is fire-and-forget relative to task execution.
pub struct Reporter {
    slots: Mutex<Vec<Slot>>,
    throttle: Throttle,
    frame: AtomicUsize,
    draw: bool,
}

impl Reporter {
    pub fn new(count: usize) -> Self {
        Self::with_draw(count, atty::is(atty::Stream::Stderr))
    }

    /// Construct with drawing explicitly enabled or disabled (tests).
    pub fn with_draw(count: usize, draw: bool) -> Self {
        let slots = (0..count)
            .map(|_| Slot {
                state: TaskState::Pending,
                label: None,
            })
            .collect();
        Self {
            slots: Mutex::new(slots),
            throttle: Throttle::new(),
            frame: AtomicUsize::new(0),
            draw,
        }
    }

    /// Update one slot's state. Terminal slots ignore further updates;
    /// transitions *into* a terminal state always force a draw.
    pub fn update(&self, index: usize, state: TaskState) {
        let terminal = {
            let mut slots = self.slots.lock().expect("progress lock poisoned");
            let Some(slot) = slots.get_mut(index) else {
                return;
            };
            if slot.state.is_terminal() {
                return;
            }
            slot.state = state;
            state.is_terminal()
        };
        if terminal {
            self.throttle.force_update();
            self.render();
        } else if self.throttle.should_update() {
            self.render();
        }
    }

    /// Attach a human-readable label to a slot (shown in single-slot mode).
    pub fn set_label(&self, index: usize, label: impl Into<String>) {
        let mut slots = self.slots.lock().expect("progress lock poisoned");
        if let Some(slot) = slots.get_mut(index) {
            slot.label = Some(label.into());
        }
    }

    /// Force a final draw and move to the next line.
    pub fn finish(&self) {
        self.throttle.force_update();
        self.render();
        if self.draw {
            let mut stderr = io::stderr();
            let _ = writeln!(stderr);
        }
    }

    pub fn state(&self, index: usize) -> Option<TaskState> {
        let slots = self.slots.lock().expect("progress lock poisoned");
        slots.get(index).map(|slot| slot.state)
    }

    pub fn label(&self, index: usize) -> Option<String> {
        let slots = self.slots.lock().expect("progress lock poisoned");
        slots.get(index).and_then(|slot| slot.label.clone())
    }

    pub fn counts(&self) -> Counts {
        let slots = self.slots.lock().expect("progress lock poisoned");
        let mut counts = Counts::default();
        for slot in slots.iter() {
            match slot.state {
                TaskState::Pending => counts.pending += 1,
                TaskState::Running(_) => counts.running += 1,
                TaskState::Success => counts.success += 1,
                TaskState::Error => counts.error += 1,
            }
        }
        counts
    }

    /// Compose the current line (also used directly by render tests).
    pub fn line(&self) -> String {
        let frame = self.frame.fetch_add(1, Ordering::Relaxed);
        let slots = self.slots.lock().expect("progress lock poisoned");
        if slots.len() == 1 {
            format_single(&slots[0], frame)
        } else {
            format_multi(&slots, frame)
        }
    }

    fn render(&self) {
        if !self.draw {
            return;
        }
        let line = self.line();
        let mut stderr = io::stderr();
        let _ = stderr.execute(MoveToColumn(0));
        let _ = stderr.execute(Clear(ClearType::CurrentLine));
        let _ = stderr.execute(SetForegroundColor(line_color(&self.counts())));
        let _ = write!(stderr, "{line}");
        let _ = stderr.execute(ResetColor);
        let _ = stderr.flush();
    }
}

fn line_color(counts: &Counts) -> Color {
    if counts.error > 0 {
        Color::Red
    } else if counts.pending + counts.running == 0 {
        Color::Green
    } else {
        Color::Blue
    }
}

fn format_single(slot: &Slot, frame: usize) -> String {
    let label = slot.label.as_deref().unwrap_or("working");
    match slot.state {
        TaskState::Pending => format!("◌ {label}"),
        TaskState::Running(fraction) if fraction > 0.0 => {
            format!(
                "{} {label} {} {:3.0}%",
                spinner(frame),
                bar(fraction),
                fraction.clamp(0.0, 1.0) * 100.0
            )
        }
        TaskState::Running(_) => format!("{} {label}", spinner(frame)),
        TaskState::Success => format!("✔ {label}"),
        TaskState::Error => format!("✖ {label}"),
    }
}

fn format_multi(slots: &[Slot], frame: usize) -> String {
    let mut counts = Counts::default();
    let mut spark = String::new();
    for slot in slots {
        match slot.state {
            TaskState::Pending => counts.pending += 1,
            TaskState::Running(fraction) => {
                counts.running += 1;
                spark.push(spark_char(fraction));
            }
            TaskState::Success => counts.success += 1,
            TaskState::Error => counts.error += 1,
        }
    }

    let done = counts.success + counts.error;
    let mut line = format!(
        "{} {done}/{} done · {} ok · {} failed · {} pending",
        spinner(frame),
        slots.len(),
        counts.success,
        counts.error,
        counts.pending
    );
    if !spark.is_empty() {
        line.push(' ');
        line.push_str(&spark);
    }
    line
}

fn spinner(frame: usize) -> &'static str {
    SPINNER_FRAMES[frame % SPINNER_FRAMES.len()]
}

fn bar(fraction: f64) -> String {
    let fraction = fraction.clamp(0.0, 1.0);
    let filled = (fraction * PROGRESS_WIDTH as f64) as usize;
    let empty = PROGRESS_WIDTH.saturating_sub(filled);
    format!(
        "[{}{}]",
        PROGRESS_FULL.repeat(filled),
        PROGRESS_EMPTY.repeat(empty)
    )
}

fn spark_char(fraction: f64) -> char {
    let fraction = fraction.clamp(0.0, 1.0);
    let index = (fraction * (SPARK_LEVELS.len() - 1) as f64).round() as usize;
    SPARK_LEVELS[index]
}
