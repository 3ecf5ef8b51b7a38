use image::GenericImageView;
use serde::Serialize;

use crate::contact::{Contact, ImageOrigin};

pub const NO_NAME_TITLE: &str = "No name";

/// What the detail view shows for one contact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContactDetails {
    pub title: String,
    pub initials: Option<String>,
    pub phones: Vec<PhoneRow>,
    pub image: Option<ImageSummary>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PhoneRow {
    pub number_type: String,
    pub number: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ImageSummary {
    pub width: u32,
    pub height: u32,
    pub generated: bool,
}

impl From<&Contact> for ContactDetails {
    fn from(contact: &Contact) -> Self {
        Self {
            title: contact.full_name().unwrap_or(NO_NAME_TITLE).to_string(),
            initials: contact.initials(),
            phones: contact
                .phone_numbers()
                .iter()
                .map(|phone| PhoneRow {
                    number_type: phone.number_type.clone(),
                    number: phone.number.clone(),
                })
                .collect(),
            image: contact.image().map(|image| ImageSummary {
                width: image.image().width(),
                height: image.image().height(),
                generated: image.origin() == ImageOrigin::Initials,
            }),
        }
    }
}
