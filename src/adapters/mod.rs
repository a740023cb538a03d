// Adapters layer: concrete implementations of the domain ports (camera, recognition engine, storage).

pub mod camera;
pub mod http;
pub mod storage;
