pub mod driver;
pub mod dynlib;
pub mod framework;
pub mod redirect;
