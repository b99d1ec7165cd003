pub mod coercion;
pub mod value;
