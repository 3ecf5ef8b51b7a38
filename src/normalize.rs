use image::DynamicImage;
use rand::Rng;
use rlibphonenumber::{
    region_code::RegionCode, PhoneNumber as ParsedNumber, PhoneNumberFormat, PHONE_NUMBER_UTIL,
};
use tracing::debug;

use crate::avatar::{self, AvatarStyle};
use crate::contact::{initials_of, Contact, ContactImage, ImageOrigin, PhoneNumber};

/// A contact record as handed over by a contact source, before any
/// normalization.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawContact {
    pub display_name: Option<String>,
    pub phones: Vec<RawPhone>,
    pub image_data: Option<Vec<u8>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawPhone {
    pub label: Option<String>,
    pub value: String,
}

impl RawPhone {
    pub fn new(label: Option<&str>, value: impl Into<String>) -> Self {
        Self {
            label: label.map(str::to_string),
            value: value.into(),
        }
    }
}

/// Converts raw records into [`Contact`] values.
#[derive(Debug, Clone, Default)]
pub struct Normalizer {
    avatar: AvatarStyle,
    phone_region: Option<String>,
}

impl Normalizer {
    pub fn new(avatar: AvatarStyle, phone_region: Option<String>) -> Self {
        Self {
            avatar,
            phone_region,
        }
    }

    /// Normalize a single record. Never fails: undecodable photos and
    /// missing names degrade to an absent image.
    pub fn normalize<R: Rng + ?Sized>(&self, raw: RawContact, rng: &mut R) -> Contact {
        let full_name = raw
            .display_name
            .map(|name| name.trim().to_string())
            .filter(|name| !name.is_empty());

        let phone_numbers = self.phone_numbers(&raw.phones);

        let image = match raw.image_data {
            Some(data) => {
                decode_image(&data).map(|image| ContactImage::new(image, ImageOrigin::Record))
            }
            None => full_name
                .as_deref()
                .and_then(initials_of)
                .and_then(|initials| avatar::render_with_rng(&initials, &self.avatar, rng))
                .map(|image| {
                    ContactImage::new(DynamicImage::ImageRgba8(image), ImageOrigin::Initials)
                }),
        };

        Contact::new(full_name, phone_numbers, image)
    }

    pub fn normalize_all<R: Rng + ?Sized>(
        &self,
        records: Vec<RawContact>,
        rng: &mut R,
    ) -> Vec<Contact> {
        records
            .into_iter()
            .map(|raw| self.normalize(raw, &mut *rng))
            .collect()
    }

    fn phone_numbers(&self, phones: &[RawPhone]) -> Vec<PhoneNumber> {
        if phones.is_empty() {
            return vec![PhoneNumber::unknown()];
        }

        phones
            .iter()
            .map(|phone| {
                let number_type = phone
                    .label
                    .as_deref()
                    .map(localized_label)
                    .unwrap_or_default();
                let number = phone_display_value(&phone.value, self.phone_region.as_deref());
                PhoneNumber::new(number_type, number)
            })
            .collect()
    }
}

fn decode_image(data: &[u8]) -> Option<DynamicImage> {
    if data.is_empty() {
        return None;
    }
    match image::load_from_memory(data) {
        Ok(image) => Some(image),
        Err(err) => {
            debug!("ignoring undecodable contact photo: {err}");
            None
        }
    }
}

/// Human-readable form of a phone label.
///
/// Accepts vCard TYPE values (`cell`, `work`, ...) as well as the
/// `_$!<Mobile>!$_` style labels written by Apple address books. Labels
/// that are not recognised are returned as given.
pub fn localized_label(label: &str) -> String {
    let trimmed = label.trim();
    let bare = trimmed
        .strip_prefix("_$!<")
        .and_then(|rest| rest.strip_suffix(">!$_"))
        .unwrap_or(trimmed);

    let known = match bare.to_ascii_lowercase().as_str() {
        "cell" | "mobile" => "mobile",
        "home" => "home",
        "work" => "work",
        "main" => "main",
        "iphone" => "iPhone",
        "voice" => "phone",
        "fax" => "fax",
        "homefax" => "home fax",
        "workfax" => "work fax",
        "otherfax" => "other fax",
        "pager" => "pager",
        "text" => "text",
        "textphone" => "textphone",
        "video" => "video",
        "other" => "other",
        _ => return bare.to_string(),
    };
    known.to_string()
}

/// Display form of a phone value: parsed and rendered in E.164 when
/// possible, otherwise trimmed with any `tel:` scheme removed.
pub fn phone_display_value(raw: &str, default_region: Option<&str>) -> String {
    let trimmed = raw.trim();
    let remainder = strip_tel_scheme(trimmed);
    if remainder.is_empty() {
        return String::new();
    }
    parse_with_regions(remainder, default_region).unwrap_or_else(|| remainder.to_string())
}

fn strip_tel_scheme(value: &str) -> &str {
    match value.get(..4) {
        Some(scheme) if scheme.eq_ignore_ascii_case("tel:") => value[4..].trim(),
        _ => value,
    }
}

fn parse_with_regions(input: &str, default_region: Option<&str>) -> Option<String> {
    let util = &*PHONE_NUMBER_UTIL;
    let mut candidates: Vec<&str> = Vec::new();

    if let Some(region) = default_region {
        if !region.is_empty() {
            candidates.push(region);
        }
    }

    let unknown = RegionCode::get_unknown();
    if candidates
        .iter()
        .all(|candidate| !candidate.eq_ignore_ascii_case(unknown))
    {
        candidates.push(unknown);
    }

    candidates
        .into_iter()
        .find_map(|region| util.parse(input, region).ok())
        .map(|parsed| format_parsed_number(&parsed))
}

fn format_parsed_number(number: &ParsedNumber) -> String {
    let mut formatted = PHONE_NUMBER_UTIL
        .format(number, PhoneNumberFormat::E164)
        .into_owned();

    if number.has_extension() {
        let ext = number.extension();
        if !ext.is_empty() {
            formatted.push_str(";ext=");
            formatted.push_str(ext);
        }
    }

    formatted
}
