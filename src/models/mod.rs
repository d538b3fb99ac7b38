//! Data types shared across the service: request bodies decoded at the HTTP
//! boundary and the synthetic directory-tree nodes returned by listings.

pub mod requests;
pub mod tree;
