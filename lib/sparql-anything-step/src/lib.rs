#![doc = include_str!("../README.md")]
#![doc(test(attr(deny(warnings))))]

pub mod adapter;
pub mod engine;
pub mod error;
pub mod params;
pub mod platform;
pub mod policy;
pub mod query;
pub mod staging;

pub mod model {
    pub use oxrdf::{Graph, Literal, NamedNode, NamedNodeRef, Triple, TripleRef};
}
