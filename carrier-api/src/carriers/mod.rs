//! Concrete carrier types satisfying the [`crate::Carrier`] contract.

mod csv;
mod json;
mod parcel;
mod string;
mod xml;

pub use csv::CsvRecordCarrier;
pub use json::JsonCarrier;
pub use parcel::{Fragment, Parcel};
pub use string::StringCarrier;
pub use xml::XmlFragmentCarrier;
