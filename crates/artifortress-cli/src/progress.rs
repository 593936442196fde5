//! Step progress reporting with TTY detection, adapted from a per-package
//! progress bar into a per-step one: the demo scenario walks through a
//! fixed number of named steps rather than a variable-length package list.

use std::io::IsTerminal;
use std::time::Instant;

use indicatif::{ProgressBar, ProgressStyle};

pub struct StepProgress {
    total_steps: usize,
    current_step: usize,
    bar: Option<ProgressBar>,
    start_time: Instant,
}

impl StepProgress {
    pub fn new(total_steps: usize) -> Self {
        let bar = if std::io::stderr().is_terminal() {
            let pb = ProgressBar::new(total_steps as u64);
            pb.set_style(
                ProgressStyle::default_bar()
                    .template("{msg}")
                    .unwrap_or_else(|_| ProgressStyle::default_bar())
                    .progress_chars("#>-"),
            );
            Some(pb)
        } else {
            None
        };

        Self { total_steps, current_step: 0, bar, start_time: Instant::now() }
    }

    pub fn step(&mut self, description: &str) {
        self.current_step += 1;
        let msg = format!("[{}/{}] {description}... ({:?})", self.current_step, self.total_steps, self.start_time.elapsed());
        match &self.bar {
            Some(pb) => {
                pb.set_message(msg);
                pb.set_position((self.current_step - 1) as u64);
            }
            None => eprintln!("{msg}"),
        }
    }

    pub fn finish(self) {
        let elapsed = self.start_time.elapsed();
        match self.bar {
            Some(pb) => {
                pb.set_message(format!("completed {} steps in {elapsed:?}", self.total_steps));
                pb.finish();
            }
            None => eprintln!("completed {}/{} steps in {elapsed:?}", self.total_steps, self.total_steps),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn non_tty_progress_does_not_panic() {
        let mut progress = StepProgress::new(2);
        progress.step("first");
        progress.step("second");
        progress.finish();
    }
}
