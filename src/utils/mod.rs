pub mod phone;
pub mod xml;

pub use phone::{normalize_phone_number, validate_phone_number};
pub use xml::xml_escape;
