pub mod email;
pub mod model;
pub mod payload;
