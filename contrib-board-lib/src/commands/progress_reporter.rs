use crate::facts::Progress;
use core::fmt::{Debug, Formatter};
use core::sync::atomic::{AtomicBool, Ordering};
use core::time::Duration;
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use std::sync::{Arc, Mutex};
use std::time::Instant;
use tokio::task::JoinHandle;

type StatusCallback = Box<dyn Fn() -> (u64, u64, String) + Send + Sync>;

const REFRESH_INTERVAL: Duration = Duration::from_millis(100);

const BAR_TEMPLATE: &str = "{prefix:>12.bold.cyan} [{bar:25}] {pos}/{len} {msg}";
const BAR_TEMPLATE_NO_COLOR: &str = "{prefix:>12} [{bar:25}] {pos}/{len} {msg}";
const SPINNER_TEMPLATE: &str = "{prefix:>12.bold.cyan} {spinner} {msg}";
const SPINNER_TEMPLATE_NO_COLOR: &str = "{prefix:>12} {spinner} {msg}";

struct Shared {
    visible_after: Instant,
    visible: AtomicBool,
    indeterminate: AtomicBool,
    phase_started: Mutex<Instant>,
    status: Mutex<StatusCallback>,
}

/// Terminal progress display for the fetch pipeline.
///
/// Nothing is drawn until `delay` has elapsed, so short runs and runs with logging enabled
/// stay quiet.
#[derive(Clone)]
pub struct ProgressReporter {
    bar: ProgressBar,
    shared: Arc<Shared>,
    refresh_task: Arc<JoinHandle<()>>,
    use_colors: bool,
}

impl ProgressReporter {
    /// Create a reporter; must be called from within a tokio runtime.
    #[must_use]
    pub fn new(delay: Duration, use_colors: bool) -> Self {
        let bar = ProgressBar::with_draw_target(None, ProgressDrawTarget::hidden());

        let shared = Arc::new(Shared {
            visible_after: Instant::now() + delay,
            visible: AtomicBool::new(false),
            indeterminate: AtomicBool::new(true),
            phase_started: Mutex::new(Instant::now()),
            status: Mutex::new(Box::new(|| (0, 0, String::new()))),
        });

        let refresh_task = Arc::new(tokio::spawn(refresh(bar.clone(), Arc::clone(&shared))));

        Self {
            bar,
            shared,
            refresh_task,
            use_colors,
        }
    }

    fn style(&self, colored: &'static str, plain: &'static str) -> ProgressStyle {
        let template = if self.use_colors { colored } else { plain };
        ProgressStyle::with_template(template).expect("progress templates are valid")
    }
}

impl Progress for ProgressReporter {
    fn set_phase(&self, phase: &str) {
        self.bar.set_prefix(phase.to_string());
        *self.shared.phase_started.lock().expect("lock not poisoned") = Instant::now();
    }

    fn set_determinate(&self, callback: Box<dyn Fn() -> (u64, u64, String) + Send + Sync + 'static>) {
        *self.shared.status.lock().expect("lock not poisoned") = callback;
        self.shared.indeterminate.store(false, Ordering::Relaxed);

        self.bar.disable_steady_tick();
        self.bar.set_length(0);
        self.bar.set_position(0);
        self.bar
            .set_style(self.style(BAR_TEMPLATE, BAR_TEMPLATE_NO_COLOR).progress_chars("=> "));
    }

    fn set_indeterminate(&self, callback: Box<dyn Fn() -> String + Send + Sync + 'static>) {
        *self.shared.status.lock().expect("lock not poisoned") = Box::new(move || (0, 0, callback()));
        self.shared.indeterminate.store(true, Ordering::Relaxed);

        self.bar.set_style(self.style(SPINNER_TEMPLATE, SPINNER_TEMPLATE_NO_COLOR));
        self.bar.enable_steady_tick(REFRESH_INTERVAL);
    }

    fn println(&self, msg: &str) {
        self.bar.suspend(|| eprintln!("{msg}"));
    }

    fn done(&self) {
        self.refresh_task.abort();
        if self.shared.visible.load(Ordering::Relaxed) {
            self.bar.finish_and_clear();
        }
    }
}

impl Debug for ProgressReporter {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ProgressReporter")
            .field("bar", &self.bar)
            .field("visible", &self.shared.visible)
            .field("use_colors", &self.use_colors)
            .finish_non_exhaustive()
    }
}

/// Periodically pull the status callback into the bar until aborted.
async fn refresh(bar: ProgressBar, shared: Arc<Shared>) {
    let mut interval = tokio::time::interval(REFRESH_INTERVAL);
    #[expect(clippy::infinite_loop, reason = "task runs until aborted")]
    loop {
        let _ = interval.tick().await;

        if !shared.visible.load(Ordering::Relaxed) {
            if Instant::now() < shared.visible_after {
                continue;
            }
            shared.visible.store(true, Ordering::Relaxed);
            bar.set_draw_target(ProgressDrawTarget::stderr_with_hz(10));
        }

        let (length, position, mut message) = {
            let status = shared.status.lock().expect("lock not poisoned");
            status()
        };

        if shared.indeterminate.load(Ordering::Relaxed) {
            let elapsed = shared.phase_started.lock().expect("lock not poisoned").elapsed().as_secs();
            message = format!("{elapsed}s: {message}");
        }

        if length > 0 {
            bar.set_length(length);
            bar.set_position(position);
        }
        bar.set_message(message);
    }
}
