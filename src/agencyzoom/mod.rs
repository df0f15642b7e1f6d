//! AgencyZoom text-thread API
//!
//! Thin typed layer over [`crate::pagination::PaginatedFetcher`]: builds the
//! list requests for threads and messages and turns the raw items into
//! [`crate::types::Thread`] and [`crate::types::Message`] values.

mod client;

pub use client::{
    AgencyZoomClient, ThreadQuery, LOGIN_PATH, PRODUCER_PATH, THREAD_DETAIL_PATH, THREAD_LIST_PATH,
    UNREAD_THREAD_PATH,
};

#[cfg(test)]
mod tests;
