pub mod countries;
pub mod logging;
pub mod path_resolver;
pub mod validation;
