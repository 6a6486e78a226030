use crate::{
    reminder::send_reminders::SendRemindersUseCase,
    shared::usecase::execute,
};
use actix_web::rt::time::{interval, sleep_until, Instant};
use class_reminders_infra::ReminderContext;
use std::time::Duration;
use tracing::info;

pub fn get_start_delay(now_ts: usize, secs_before_min: usize) -> usize {
    let secs_to_next_minute = 60 - (now_ts / 1000) % 60;
    if secs_to_next_minute > secs_before_min {
        secs_to_next_minute - secs_before_min
    } else {
        secs_to_next_minute + (60 - secs_before_min)
    }
}

/// Runs the reminder dispatch on a fixed interval, starting at the next full
/// minute. Does nothing unless an interval is configured.
pub fn start_send_reminders_job(ctx: ReminderContext) {
    let interval_secs = match ctx.config.job_interval_secs {
        Some(secs) => secs,
        None => return,
    };

    actix_web::rt::spawn(async move {
        let now = ctx.sys.get_timestamp_millis();
        let secs_to_next_run = get_start_delay(now as usize, 0);
        let start = Instant::now() + Duration::from_secs(secs_to_next_run as u64);
        info!(
            "Reminder job starts in {} seconds and runs every {} seconds",
            secs_to_next_run, interval_secs
        );

        sleep_until(start).await;
        let mut job_interval = interval(Duration::from_secs(interval_secs));
        loop {
            job_interval.tick().await;
            let context = ctx.clone();
            actix_web::rt::spawn(async move {
                let usecase = SendRemindersUseCase {
                    triggered_by: "job_scheduler",
                };
                // Errors are logged by the usecase runner
                let _ = execute(usecase, &context).await;
            });
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn start_delay_works() {
        assert_eq!(get_start_delay(50 * 1000, 5), 5);
        assert_eq!(get_start_delay(50 * 1000, 10), 60);
        assert_eq!(get_start_delay(50 * 1000, 15), 55);
        assert_eq!(get_start_delay(60 * 1000, 60), 60);
        assert_eq!(get_start_delay(60 * 1000, 10), 50);
        assert_eq!(get_start_delay(59 * 1000, 0), 1);
        assert_eq!(get_start_delay(59 * 1000, 1), 60);
    }
}
