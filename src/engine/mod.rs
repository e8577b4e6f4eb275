//! Audio Engine Module
//!
//! Core audio plumbing:
//! - Audio block management
//! - Streaming WAV file I/O
//! - Offline block renderer
//! - Transport state machine

pub mod buffer;
pub mod io;
pub mod render;
pub mod transport;

pub use buffer::{db_to_linear, linear_to_db, AudioBlock};
pub use io::{file_duration, file_sample_rate, probe, OutputWriter, SourceFormat, SourceReader};
pub use render::{
    BlockSink, ChainGraph, OfflineRenderer, RenderReport, RenderState, RenderStatus, RenderStep,
    TransientReason,
};
pub use transport::{Transport, TransportState};
