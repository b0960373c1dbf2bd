//! Campaign lifecycle store and the append-only suspicious-activity log.

pub mod store;
pub mod suspicious;

pub use store::{CampaignStore, NewCampaign};
pub use suspicious::{SuspiciousActivityLog, SuspiciousObservation};
