//! Backend module - candidate ordering, request shapes and the dispatcher

pub mod dispatcher;
pub mod envelope;
pub mod params;
pub mod progress;
pub mod request;

pub use dispatcher::{GenerationRequest, MediaDispatcher};
pub use params::{ChatMessage, Extras, MessageContent};
pub use progress::{collect_outcome, GenerationEvent, ProgressStatus};
pub use request::{augment_mapping, ModelSelector, RequestShape};
