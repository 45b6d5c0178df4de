pub mod request;

pub use request::InterfaceRequest;
