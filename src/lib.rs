//! This crate mirrors events from many read-only calendars into a single writable
//! "merged" calendar, so that a third party can subscribe to one feed instead of many.
//!
//! The mirroring is strictly one-way and pull-based: a [`Merger`](merger::Merger) run
//! fetches the source events within a bounded time window and decides, per event,
//! whether the destination needs an insert, a patch, a delete, or nothing at all. \
//! Decisions are driven solely by a durable [mapping store](mapping::MappingStore)
//! (never by reading the destination back), which is what keeps repeated runs cheap,
//! idempotent and safe to re-run after partial failures.
//!
//! The remote calendar is consumed through the [`CalendarService`](service::CalendarService)
//! trait. A REST implementation is provided in the [`client`] module; an in-memory one,
//! used to mock the remote service in integration tests, lives in [`mock_service`].

pub mod calendar;
pub mod config;
pub use config::MergeConfig;
pub mod event;
pub mod translate;
pub mod store;
pub mod mapping;
pub mod service;
pub mod client;
pub mod reconcile;
pub mod merger;
pub use merger::Merger;

pub mod mock_behaviour;
pub mod mock_service;
