// Domain models: staged raw samples, consolidated history rows, device registry, bridge payloads.

mod bridge;
mod device;
mod record;
mod sample;

pub use bridge::BridgeMessage;
pub use device::Device;
pub use record::ConsolidatedRecord;
pub use sample::{RawSample, StagedSample, StagingCursor};
