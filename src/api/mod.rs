pub mod upload;

pub use upload::{handle_upload, UploadForm, IMAGE_FIELD, __path_handle_upload};
