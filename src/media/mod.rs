//! Media classification: resolution, extension filtering, categories.

mod category;
mod item;
mod resolve;

pub use category::{
    AUDIO_EXTENSIONS, IMAGE_EXTENSIONS, MediaCategory, VIDEO_EXTENSIONS,
    extension_for_content_type, known_extensions,
};
pub use item::MediaItem;
pub use resolve::{extension_of, filter_by_extension, resolve_references};
