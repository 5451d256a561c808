pub mod canonicalize;
pub mod cards;
pub mod collector;
pub mod hashtags;
pub mod processor;

pub use cards::{CardRenderer, SvgCardRenderer};
pub use collector::{Collector, IngestReport};
pub use processor::{ProcessReport, Processor};
