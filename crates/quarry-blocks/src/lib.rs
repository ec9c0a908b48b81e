//! Block definitions, face culling tables and texture atlas slicing.
#![forbid(unsafe_code)]

pub mod atlas;
pub mod config;
pub mod face;
pub mod registry;
pub mod types;

pub use atlas::{Atlas1D, TextureAtlas, UvRect};
pub use face::Face;
pub use registry::{BlockRegistry, BlockType};
pub use types::{BlockId, CollideType, DrawType, PackedCol};
