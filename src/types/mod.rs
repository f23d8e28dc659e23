pub mod dataset;
pub mod forecast;
pub mod location;
