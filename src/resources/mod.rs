/// Resources Module
///
/// URI-addressable read operations. Each module exports a `register` function
/// that adds its resource template to the registry.

pub mod greeting;
