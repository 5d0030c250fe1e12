mod encode;
mod handlers;
mod server;
mod sink;
mod stats;

pub use encode::encode_jpeg;
pub use server::{build_router, ServerState, VideoServer};
pub use sink::{EncodedFrame, FrameFeed, MjpegBroadcaster, OutputSink, VideoStream};
pub use stats::{StreamCounters, StreamStats};
