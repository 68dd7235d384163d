pub mod avatar;
pub mod events;
pub mod upload;

pub use avatar::Outfit;
pub use events::*;
pub use upload::{PendingFile, UploadDraft, UploadRequest, Uploader};
