//! Deterministic progress rendering for wizard steps
//!
//! Pure functions only; the transport layer decides whether to show the
//! result at all (see `FlowConfig::show_progress`).

/// Number of tick characters in a rendered progress bar
const BAR_TICKS: u32 = 10;

/// Progress through a flow's numbered steps
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgressReport {
    /// Rounded percentage in `[0, 100]`
    pub percentage: u32,

    /// Ticks filled out of ten
    pub filled_ticks: u32,

    /// Ticks left empty out of ten
    pub empty_ticks: u32,
}

impl ProgressReport {
    /// Render the ten-tick text bar used in chat replies
    pub fn bar(&self) -> String {
        let mut bar = String::with_capacity(BAR_TICKS as usize * 3);
        for _ in 0..self.filled_ticks {
            bar.push('▓');
        }
        for _ in 0..self.empty_ticks {
            bar.push('░');
        }
        bar
    }
}

/// Compute the progress report for `step` of `total` steps
///
/// `percentage = round(step / total * 100)` and `filled_ticks =
/// round(step / total * 10)`; a zero `total` is treated as no progress.
pub fn render_progress(step: u32, total: u32) -> ProgressReport {
    if total == 0 {
        return ProgressReport {
            percentage: 0,
            filled_ticks: 0,
            empty_ticks: BAR_TICKS,
        };
    }

    let ratio = step as f64 / total as f64;
    let percentage = (ratio * 100.0).round() as u32;
    let filled_ticks = ((ratio * BAR_TICKS as f64).round() as u32).min(BAR_TICKS);

    ProgressReport {
        percentage,
        filled_ticks,
        empty_ticks: BAR_TICKS - filled_ticks,
    }
}
