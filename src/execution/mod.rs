// Bar retrieval and order reconciliation
pub mod bar_feed;
pub mod reconciler;

pub use bar_feed::{BarFeed, BarWindow};
pub use reconciler::{reconcile, ReconcileDecision};
