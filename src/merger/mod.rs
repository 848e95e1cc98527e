//! The run engine, which funnels every eligible source calendar into the destination
//!
//! A run enumerates the calendars the account subscribes to, keeps the read-only ones,
//! and reconciles each of their events into the single destination calendar. Runs are
//! idempotent and unordered: re-running over an unchanged world issues zero writes,
//! and whatever a run could not process is simply picked up by the next one.

use std::error::Error;
use std::time::Instant;

use chrono::Utc;

use crate::calendar::{CalendarId, CalendarRef, TimeWindow};
use crate::config::MergeConfig;
use crate::mapping::MappingStore;
use crate::reconcile::Reconciler;
use crate::service::CalendarService;
use crate::store::PropertyStore;

pub mod run_progress;
use run_progress::{FeedbackSender, RunEvent, RunProgress, RunSummary};

/// Mirrors every eligible read-only calendar into one destination calendar.
///
/// This is strictly one-way: source calendars are never written to, and changes made
/// directly on the destination calendar are never pushed back (the next run simply
/// does not see them, since decisions only look at the mapping store).
///
/// At most one run per account may be in flight at a time. The mapping store does no
/// locking, so this is a precondition on whatever schedules the runs, not something
/// this crate enforces.
pub struct Merger<S, P>
where
    S: CalendarService,
    P: PropertyStore,
{
    service: S,
    mappings: MappingStore<P>,
    config: MergeConfig,
}

impl<S, P> Merger<S, P>
where
    S: CalendarService,
    P: PropertyStore,
{
    pub fn new(service: S, store: P, config: MergeConfig) -> Self {
        let mappings = MappingStore::new(store, &config.mapping_key_prefix);
        Self { service, mappings, config }
    }

    pub fn config(&self) -> &MergeConfig {
        &self.config
    }

    /// Returns the underlying calendar service.
    ///
    /// Apart from tests, there are very few (if any) reasons to access it directly.
    pub fn service(&self) -> &S {
        &self.service
    }
    /// See [`Self::service`]
    pub fn service_mut(&mut self) -> &mut S {
        &mut self.service
    }

    /// Performs a full run, and provides feedback about the progress.
    ///
    /// See [`Self::run`]. Details about errors are logged using the `log::*` macros;
    /// coarser-grained progress is sent over the feedback channel.
    pub async fn run_with_feedback(&mut self, feedback_sender: FeedbackSender) -> RunSummary {
        let mut progress = RunProgress::new_with_feedback_channel(feedback_sender);
        self.execute(&mut progress).await
    }

    /// Performs a full run: resolves the destination calendar, then reconciles every
    /// event of every eligible source calendar into it.
    ///
    /// A failed event or calendar never aborts the run; it is reported in the returned
    /// summary and retried by the next run. In case errors happened, the run has been
    /// partially executed, but the mapping store is never left lying about the
    /// destination: simply run again to pick up where it failed.
    pub async fn run(&mut self) -> RunSummary {
        let mut progress = RunProgress::new();
        self.execute(&mut progress).await
    }

    async fn execute(&mut self, progress: &mut RunProgress) -> RunSummary {
        if let Err(err) = self.execute_inner(progress).await {
            progress.error(&format!("Run terminated because of an error: {}", err));
        }
        progress.feedback(RunEvent::Finished { success: progress.is_success() });
        progress.summary()
    }

    async fn execute_inner(&mut self, progress: &mut RunProgress) -> Result<(), Box<dyn Error>> {
        progress.info("Starting a run.");
        progress.feedback(RunEvent::Started);
        let started = Instant::now();

        // Without a destination there is nowhere to write: failing here is fatal to the
        // run (but harmless: nothing has been touched yet)
        let destination_id = self.service.find_or_create_calendar(&self.config.destination_calendar_name).await?;
        progress.debug(&format!("Destination calendar is {}", destination_id));

        let window = self.config.window_from(Utc::now());

        // Enumerate the account's calendars, page after page, and keep the eligible ones
        let mut eligible: Vec<CalendarRef> = Vec::new();
        let mut page_token: Option<String> = None;
        loop {
            let page = self.service.list_calendars(page_token.as_deref()).await?;
            for calendar in page.items {
                if calendar.id == destination_id {
                    // Never mirror the merged calendar into itself
                    continue;
                }
                if calendar.access_role.is_read_only() == false {
                    progress.trace(&format!("Skipping calendar {}: not a read-only subscription", calendar.id));
                    continue;
                }
                eligible.push(calendar);
            }
            page_token = page.next_page_token;
            if page_token.is_none() {
                break;
            }
        }
        progress.info(&format!("{} calendars to sync", eligible.len()));

        for calendar in eligible {
            if let Some(deadline) = self.config.run_deadline {
                if started.elapsed() >= deadline {
                    // A clean early stop, not an error: calendars already processed are
                    // committed, the remaining ones will be handled by the next run
                    progress.info("Run deadline reached. Leaving the remaining calendars to the next run");
                    break;
                }
            }

            if let Err(err) = self.sync_calendar(&calendar, &destination_id, &window, progress).await {
                progress.warn(&format!("Unable to sync calendar {}: {}, skipping this time.", calendar.id, err));
                continue;
            }
        }

        progress.info("Run ended");
        Ok(())
    }

    /// Feeds every event of one source calendar through the reconciler, page after page
    async fn sync_calendar(
        &mut self,
        calendar: &CalendarRef,
        destination_id: &CalendarId,
        window: &TimeWindow,
        progress: &mut RunProgress,
    ) -> Result<(), Box<dyn Error>> {
        progress.info(&format!("Syncing calendar {}", calendar.id));
        progress.reset_counter();
        progress.feedback(RunEvent::InProgress {
            calendar: calendar.name.clone(),
            items_done_already: 0,
            details: "started".to_string(),
        });

        let mut page_token: Option<String> = None;
        loop {
            let page = self.service.list_events(&calendar.id, window, true, page_token.as_deref()).await?;

            let mut reconciler = Reconciler::new(&mut self.service, &mut self.mappings, destination_id);
            for event in &page.items {
                match reconciler.reconcile(&calendar.id, event).await {
                    Ok(outcome) => {
                        progress.record(outcome);
                        progress.trace(&format!("Event {} from {}: {:?}", event.id, calendar.id, outcome));
                    },
                    Err(err) => {
                        // One failed event must not keep the rest of the page from being processed
                        progress.warn(&format!("Unable to reconcile event {} from {}: {}. Skipping this time", event.id, calendar.id, err));
                    },
                }
                progress.increment_counter(1);
            }
            progress.feedback(RunEvent::InProgress {
                calendar: calendar.name.clone(),
                items_done_already: progress.counter(),
                details: format!("{} events handled", progress.counter()),
            });

            page_token = page.next_page_token;
            if page_token.is_none() {
                break;
            }
        }

        Ok(())
    }
}
