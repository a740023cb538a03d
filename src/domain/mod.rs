// Domain layer: core models and ports (interfaces) for the scan pipeline.

pub mod model;
pub mod ports;
