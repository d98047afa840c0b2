// Copyright (c) ZeroC, Inc.

//! This module defines the data model of the script engine: parsed directives and statements,
//! the result of initializing a directive, and the compiled form stored in the script cache.

mod compiled;
mod directive;
mod initialization;
mod statement;

pub use compiled::*;
pub use directive::*;
pub use initialization::*;
pub use statement::*;
