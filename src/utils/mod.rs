/// Padding and masking helpers
pub mod tensors;

/// Training progress sinks
pub mod renderer;

/// Label map and argmax helpers
pub mod classes;
