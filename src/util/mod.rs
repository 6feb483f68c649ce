//! Small helpers shared by command modules: option validation, OData
//! encoding and SharePoint URL arithmetic.

pub mod formatting;
pub mod url;
pub mod validation;
