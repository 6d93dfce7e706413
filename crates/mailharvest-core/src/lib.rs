pub mod breaker;
pub mod date;
pub mod error;
pub mod extract;
pub mod harvester;
pub mod parser;
pub mod settings;
pub mod source;
pub mod store;
pub mod types;

pub use breaker::FailureBreaker;
pub use date::{
    repair_cut_zone, truncate_date_value, DateParserChain, DateStrategy, FormatListStrategy,
    LenientMailDateStrategy, Rfc2822Strategy,
};
pub use error::{Error, FetchError, Result};
pub use extract::{HeaderExtractor, MboxArchiveExtractor};
pub use harvester::{BatchOutcome, Harvester};
pub use parser::{split_message, MessageParser};
pub use settings::{archive_url, parse_base_url, ArchiveSettings, HarvestPolicy, DEFAULT_BASE_URL};
pub use source::ArchiveSource;
pub use store::{MemoryStore, MessageStore};
pub use types::{HarvestStats, MessageRecord, ParsedMessage};
