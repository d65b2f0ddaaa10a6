pub mod data;
pub mod node;

pub use data::{NodeConfig, TelemetrySample, now_epoch_ms};
pub use node::{ComponentDescriptor, NodeId, ValueTypeDescriptor};
