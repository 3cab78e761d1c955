pub mod presence;
pub mod recap;

pub use presence::PresenceReconciler;
pub use recap::RecapAggregator;
