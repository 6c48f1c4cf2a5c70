pub mod api;
pub mod combinators;
pub mod device_type;
pub mod error;
pub mod grammar;
pub mod readers;
pub mod resolver;
pub mod token;
pub mod topology;

pub use api::{process, VariableOption};
pub use grammar::{parse, ParseOutcome};
pub use resolver::{resolve, Resolution};
pub use topology::NetworkAtlas;
