//! Chunk streaming: distance ordering, per-frame build budget, eviction and batched draws.
#![forbid(unsafe_code)]

mod chunk;
mod config;
mod draw;
mod scheduler;
mod sorter;

pub use chunk::ChunkInfo;
pub use config::StreamConfig;
pub use draw::PartDraw;
pub use scheduler::{CameraView, ChunkStreamScheduler, FrameStats};
pub use sorter::{ChunkDistanceSorter, camera_cell, quicksort};
