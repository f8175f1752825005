pub mod compose;
pub mod gate;
pub mod logging;
pub mod render;
pub mod runtime;
pub mod session;
pub mod status;
pub mod storage;
pub mod store;
pub mod sync;
pub mod tracker;
