pub mod icecream;

pub use icecream::IceCream;
