pub mod inpainter;
