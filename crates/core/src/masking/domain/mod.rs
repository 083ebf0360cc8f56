pub mod mask;
pub mod mask_builder;
