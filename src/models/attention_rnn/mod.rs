pub mod attention;
pub mod decoder;
pub mod encoder;
pub mod model;
pub mod projection;

pub use model::{AttentionRnn, AttentionRnnConfig};
