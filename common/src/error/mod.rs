pub mod error_location;
pub mod exposure_error;
