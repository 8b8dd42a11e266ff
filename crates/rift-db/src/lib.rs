pub mod repository;
pub mod timeline_store;

pub use repository::{
    EventQuery, HeatmapEventKind, MatchRepository, PlayerEvent, PlayerEvents,
    SqliteMatchRepository,
};
pub use timeline_store::{ImportSummary, MatchSummary, StoredEvent, TimelineStore};
