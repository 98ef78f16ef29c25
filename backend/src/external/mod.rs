//! External data sources

pub mod usgs;
pub mod weather;

pub use usgs::{HazardSource, UsgsClient};
pub use weather::{OpenWeatherClient, SimulatedWeather, WeatherSource};
