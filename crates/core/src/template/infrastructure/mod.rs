pub mod image_template_loader;
