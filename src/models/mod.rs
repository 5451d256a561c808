mod item;
mod record;

pub use item::{AiMode, CanonicalItem, EnrichedFields, ItemStatus};
pub use record::{ArticleDetail, RawRecord};
