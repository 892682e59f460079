pub mod slit;

pub use slit::{SlitError, convolve_triangular, slit_width_on_axis};
