/// Backend and device selection
pub mod backend;

/// Dataset names and corpus locations
pub mod datasets;

/// Pipeline names and artifact locations
pub mod pipelines;
