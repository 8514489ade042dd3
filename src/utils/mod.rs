// Utility functions

pub mod image;

pub use self::image::{compress_image, compress_image_async, decode_image_payload, prepare_image, prepare_images};
