//! App statistics: the cancellable time-series fetch and chart shaping.

mod chart;
mod fetcher;

pub use chart::*;
pub use fetcher::*;
