use std::{error::Error, str::FromStr, thread, time::Duration};

use chrono::Utc;
use cron::Schedule;
use log::info;

/// Run `job` at every fire time of the cron `expression` (seconds first,
/// e.g. `"0 0 13 * * *"` for 13:00 UTC daily).  Blocking: a slow job delays
/// the next fire, it never overlaps it.  Returns once the schedule has no
/// upcoming fire times.
pub fn run_on_schedule<F>(expression: &str, mut job: F) -> Result<(), Box<dyn Error>>
where
    F: FnMut(),
{
    let schedule = Schedule::from_str(expression)?;
    loop {
        let next = match schedule.upcoming(Utc).next() {
            Some(next) => next,
            None => return Ok(()),
        };
        info!("next run scheduled for {}", next);
        let wait = (next - Utc::now()).to_std().unwrap_or(Duration::ZERO);
        thread::sleep(wait);
        job();
    }
}
