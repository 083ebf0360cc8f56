pub mod correlation;
pub mod fft_ncc_localizer;
pub mod localizer_factory;
pub mod ncc_localizer;
