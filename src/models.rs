mod ids;
mod tag;
mod tag_type;

pub use ids::{DocumentId, TagId};
pub use tag::{TagMetadata, TagRecord, TagRecordBuilder};
pub use tag_type::{ParseTagTypeError, TagType};
