//! Alphabetical grouping of contacts into sections.
//!
//! The index is an owned value: it is built in one go from a contact list
//! and replaced wholesale on the next fetch.

use std::collections::BTreeMap;
use std::fmt;

use crate::contact::Contact;

pub const UNKNOWN_TITLE: &str = "*";

/// Grouping key of a section.
///
/// `Unknown` holds contacts without a usable name and always sorts after
/// every letter, so it cannot collide with a name that starts with `*`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SectionKey {
    Letter(char),
    Unknown,
}

impl SectionKey {
    /// Key on the first `char` of the name. A decomposed accent keys under
    /// its base letter.
    pub fn for_contact(contact: &Contact) -> Self {
        contact
            .full_name()
            .and_then(|name| name.chars().next())
            .map(SectionKey::Letter)
            .unwrap_or(SectionKey::Unknown)
    }

    pub fn title(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for SectionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SectionKey::Letter(letter) => write!(f, "{letter}"),
            SectionKey::Unknown => f.write_str(UNKNOWN_TITLE),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Section {
    key: SectionKey,
    contacts: Vec<Contact>,
}

impl Section {
    pub fn key(&self) -> SectionKey {
        self.key
    }

    pub fn title(&self) -> String {
        self.key.title()
    }

    /// Contacts in the order they arrived from the source.
    pub fn contacts(&self) -> &[Contact] {
        &self.contacts
    }

    pub fn len(&self) -> usize {
        self.contacts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.contacts.is_empty()
    }
}

/// Outcome of selecting a row in the contact list.
#[derive(Debug, Clone, Copy)]
pub enum Selection<'a> {
    Contact(&'a Contact),
    /// Nothing at that position, or the contact has nothing to show.
    NoInformation,
}

#[derive(Debug, Clone, Default)]
pub struct SectionedIndex {
    sections: Vec<Section>,
}

impl SectionedIndex {
    /// Group contacts by the first character of their name.
    ///
    /// Sections come out sorted by key with the unnamed bucket last;
    /// contacts inside a section keep their input order.
    pub fn build(contacts: Vec<Contact>) -> Self {
        let mut groups: BTreeMap<SectionKey, Vec<Contact>> = BTreeMap::new();
        for contact in contacts {
            groups
                .entry(SectionKey::for_contact(&contact))
                .or_default()
                .push(contact);
        }

        let sections = groups
            .into_iter()
            .map(|(key, contacts)| Section { key, contacts })
            .collect();
        Self { sections }
    }

    /// Replace the whole index with one built from `contacts`.
    pub fn rebuild(&mut self, contacts: Vec<Contact>) {
        *self = Self::build(contacts);
    }

    pub fn sections(&self) -> &[Section] {
        &self.sections
    }

    pub fn section(&self, section: usize) -> Option<&Section> {
        self.sections.get(section)
    }

    /// Number of sections.
    pub fn len(&self) -> usize {
        self.sections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    pub fn contact_count(&self) -> usize {
        self.sections.iter().map(Section::len).sum()
    }

    /// Titles in section order, for a quick-jump index.
    pub fn section_titles(&self) -> Vec<String> {
        self.sections.iter().map(Section::title).collect()
    }

    pub fn title_for_section(&self, section: usize) -> Option<String> {
        self.section(section).map(Section::title)
    }

    pub fn rows_in_section(&self, section: usize) -> usize {
        self.section(section).map_or(0, Section::len)
    }

    pub fn lookup(&self, section: usize, row: usize) -> Option<&Contact> {
        self.sections.get(section)?.contacts.get(row)
    }

    pub fn select(&self, section: usize, row: usize) -> Selection<'_> {
        match self.lookup(section, row) {
            Some(contact) if !contact.is_empty() => Selection::Contact(contact),
            _ => Selection::NoInformation,
        }
    }
}
