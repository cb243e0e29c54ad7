pub mod mask;

pub use mask::{generate_skin_mask, SkinMask};
