/// Tools Module
///
/// This module contains all MCP tool implementations. Each tool is implemented
/// as a separate module that exports a `register` function to add the tool to
/// the registry during server initialization.

pub mod steps_to_miles;
