pub mod kind;
pub mod params;
