pub mod bbox_stabilizer;
pub mod localizer;
