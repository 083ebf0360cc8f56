pub mod bounding_box;
pub mod constants;
pub mod error;
pub mod frame;
pub mod gray_frame;
pub mod video_metadata;

#[cfg(test)]
pub mod test_fixtures;
