use image::DynamicImage;

pub const UNKNOWN_NUMBER_TYPE: &str = "Unknown type";
pub const UNKNOWN_NUMBER: &str = "Unable to get contact number";

const NAME_SEPARATOR: char = ' ';

/// A normalized contact as shown in the list and detail views.
///
/// Built once by the normalizer and never mutated afterwards.
#[derive(Debug, Clone)]
pub struct Contact {
    full_name: Option<String>,
    phone_numbers: Vec<PhoneNumber>,
    image: Option<ContactImage>,
}

impl Contact {
    pub fn new(
        full_name: Option<String>,
        phone_numbers: Vec<PhoneNumber>,
        image: Option<ContactImage>,
    ) -> Self {
        Self {
            full_name,
            phone_numbers,
            image,
        }
    }

    pub fn full_name(&self) -> Option<&str> {
        self.full_name.as_deref()
    }

    pub fn phone_numbers(&self) -> &[PhoneNumber] {
        &self.phone_numbers
    }

    pub fn image(&self) -> Option<&ContactImage> {
        self.image.as_ref()
    }

    /// Short label derived from the name, e.g. "John Smith" -> "J S".
    pub fn initials(&self) -> Option<String> {
        initials_of(self.full_name.as_deref()?)
    }

    /// True when there is nothing to show for this contact.
    pub fn is_empty(&self) -> bool {
        self.full_name.is_none() && self.phone_numbers.is_empty() && self.image.is_none()
    }
}

/// Initials of a display name: first letter of the first word, plus the
/// first letter of the last word when there is more than one.
pub fn initials_of(name: &str) -> Option<String> {
    let words: Vec<&str> = name
        .split(NAME_SEPARATOR)
        .filter(|word| !word.is_empty())
        .collect();

    let first = words.first()?.chars().next()?;
    if words.len() < 2 {
        return Some(first.to_string());
    }

    match words.last().and_then(|word| word.chars().next()) {
        Some(last) => Some(format!("{first} {last}")),
        None => Some(first.to_string()),
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhoneNumber {
    pub number_type: String,
    pub number: String,
}

impl PhoneNumber {
    pub fn new(number_type: impl Into<String>, number: impl Into<String>) -> Self {
        Self {
            number_type: number_type.into(),
            number: number.into(),
        }
    }

    /// Entry used when the source record carries no numbers at all.
    pub fn unknown() -> Self {
        Self::new(UNKNOWN_NUMBER_TYPE, UNKNOWN_NUMBER)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageOrigin {
    /// Decoded from the record's own photo data.
    Record,
    /// Synthesized from the contact's initials.
    Initials,
}

#[derive(Debug, Clone)]
pub struct ContactImage {
    image: DynamicImage,
    origin: ImageOrigin,
}

impl ContactImage {
    pub fn new(image: DynamicImage, origin: ImageOrigin) -> Self {
        Self { image, origin }
    }

    pub fn image(&self) -> &DynamicImage {
        &self.image
    }

    pub fn origin(&self) -> ImageOrigin {
        self.origin
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initials_two_words() {
        assert_eq!(initials_of("John Smith").as_deref(), Some("J S"));
    }

    #[test]
    fn test_initials_single_word() {
        assert_eq!(initials_of("Madonna").as_deref(), Some("M"));
    }

    #[test]
    fn test_initials_uses_last_word() {
        assert_eq!(initials_of("Mary Jane Watson").as_deref(), Some("M W"));
        // Repeated separators do not produce empty words
        assert_eq!(initials_of("  Ann   Lee ").as_deref(), Some("A L"));
    }

    #[test]
    fn test_initials_blank_name() {
        assert_eq!(initials_of(""), None);
        assert_eq!(initials_of("   "), None);
    }

    #[test]
    fn test_initials_non_latin() {
        assert_eq!(initials_of("Иван Петров").as_deref(), Some("И П"));
    }

    #[test]
    fn test_contact_without_name_has_no_initials() {
        let contact = Contact::new(None, vec![PhoneNumber::unknown()], None);
        assert_eq!(contact.initials(), None);
        assert!(!contact.is_empty());
    }

    #[test]
    fn test_is_empty() {
        assert!(Contact::new(None, Vec::new(), None).is_empty());
        assert!(!Contact::new(Some("Amy".into()), Vec::new(), None).is_empty());
    }

    #[test]
    fn test_unknown_phone_number() {
        let phone = PhoneNumber::unknown();
        assert_eq!(phone.number_type, "Unknown type");
        assert_eq!(phone.number, "Unable to get contact number");
    }
}
