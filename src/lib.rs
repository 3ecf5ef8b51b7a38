//! Contact list grouped into alphabetical sections.
//!
//! Raw records from a [`source::ContactSource`] are normalized into
//! [`Contact`] values, then indexed by [`SectionedIndex`] for section/row
//! lookup.

pub mod avatar;
pub mod config;
pub mod contact;
pub mod details;
pub mod error;
pub mod index;
pub mod normalize;
pub mod source;
pub mod translit;

pub use contact::{Contact, ContactImage, ImageOrigin, PhoneNumber};
pub use details::ContactDetails;
pub use error::{Error, Result};
pub use index::{Section, SectionKey, SectionedIndex, Selection};
pub use normalize::{Normalizer, RawContact, RawPhone};
