//! Metadata module.
//!
//! Embeds and recovers JSON text records in PNG containers without touching
//! the image data.

pub mod crc;
pub mod png;
pub mod pose;
pub mod settings;

pub use png::{
    chunks, inspect, read_text_record, read_text_records, write_text_record, Chunk,
    ContainerReport, TextRecord,
};
pub use pose::{read_pose, write_pose, KeypointFormat, PosePayload, Skeleton, ViewOptions, POSE_KEY};
pub use settings::{read_settings, write_settings, DepthSettings, SETTINGS_KEY};
