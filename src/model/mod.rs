pub mod adapters;
pub mod currency;
pub mod seats;
