//! Permission-gated contact sources.
//!
//! A source hands out raw records; turning them into [`Contact`] values is
//! the normalizer's job. The bundled [`VdirSource`] reads vCard 4.0 files
//! from a directory tree (or a single `.vcf` file).

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use base64::prelude::*;
use rand::Rng;
use tracing::{debug, warn};
use vcard4::parameter::Parameters;
use vcard4::property::TextOrUriProperty;
use vcard4::Vcard;

use crate::contact::Contact;
use crate::error::{Error, Result};
use crate::normalize::{Normalizer, RawContact, RawPhone};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Authorization {
    Authorized,
    Denied,
    /// The user has not been asked yet.
    NotDetermined,
    /// Access is blocked and cannot be requested.
    Restricted,
}

pub trait ContactSource {
    fn authorization(&self) -> Authorization;

    /// Ask for access. Returns whether access is now granted.
    fn request_access(&mut self) -> bool;

    /// Feed every record to `sink`. Records delivered before an error
    /// are still valid.
    fn enumerate(&self, sink: &mut dyn FnMut(RawContact)) -> Result<()>;
}

/// Check access, asking for it when that is still possible.
pub fn request_permission<S: ContactSource + ?Sized>(source: &mut S) -> bool {
    match source.authorization() {
        Authorization::Authorized => true,
        Authorization::Denied | Authorization::NotDetermined => source.request_access(),
        Authorization::Restricted => false,
    }
}

/// Like [`request_permission`], but reports a refusal as
/// [`Error::AccessDenied`].
pub fn ensure_access<S: ContactSource + ?Sized>(source: &mut S) -> Result<()> {
    if request_permission(source) {
        Ok(())
    } else {
        Err(Error::AccessDenied)
    }
}

/// Contacts read from a source together with the error that stopped the
/// enumeration, if any.
#[derive(Debug, Default)]
pub struct FetchResult {
    pub contacts: Vec<Contact>,
    pub error: Option<Error>,
}

pub fn fetch_contacts<S, R>(source: &S, normalizer: &Normalizer, rng: &mut R) -> FetchResult
where
    S: ContactSource + ?Sized,
    R: Rng + ?Sized,
{
    let mut contacts = Vec::new();
    let outcome = source.enumerate(&mut |raw: RawContact| {
        contacts.push(normalizer.normalize(raw, &mut *rng))
    });
    FetchResult {
        contacts,
        error: outcome.err(),
    }
}

// =============================================================================
// vdir source
// =============================================================================

#[derive(Debug, Clone)]
pub struct VdirSource {
    path: PathBuf,
    create_missing: bool,
}

impl VdirSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            create_missing: false,
        }
    }

    /// Allow `request_access` to create a missing vdir directory. Paths
    /// ending in `.vcf` are never created.
    pub fn create_missing(mut self, create: bool) -> Self {
        self.create_missing = create;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Open the source, asking for access when needed.
    ///
    /// A path that does not exist and may not be created is
    /// [`Error::SourceNotFound`]; any other refusal is [`Error::AccessDenied`].
    pub fn open(&mut self) -> Result<()> {
        match ensure_access(self) {
            Err(Error::AccessDenied) if !self.path.exists() => {
                Err(Error::SourceNotFound(self.path.clone()))
            }
            other => other,
        }
    }

    fn is_card_file(&self) -> bool {
        is_vcf(&self.path)
    }

    fn files(&self) -> Result<Vec<PathBuf>> {
        if self.path.is_file() {
            return Ok(vec![self.path.clone()]);
        }
        let mut files = list_vcf_files(&self.path)?;
        files.sort();
        Ok(files)
    }
}

impl ContactSource for VdirSource {
    fn authorization(&self) -> Authorization {
        let probe = if self.path.is_dir() {
            fs::read_dir(&self.path).map(|_| ())
        } else {
            fs::File::open(&self.path).map(|_| ())
        };
        match probe {
            Ok(()) => Authorization::Authorized,
            Err(err) if err.kind() == ErrorKind::NotFound => Authorization::NotDetermined,
            Err(err) if err.kind() == ErrorKind::PermissionDenied => Authorization::Denied,
            Err(err) => {
                debug!("contact source {} is unusable: {err}", self.path.display());
                Authorization::Restricted
            }
        }
    }

    fn request_access(&mut self) -> bool {
        match self.authorization() {
            Authorization::Authorized => true,
            Authorization::NotDetermined if self.create_missing && !self.is_card_file() => {
                match fs::create_dir_all(&self.path) {
                    Ok(()) => true,
                    Err(err) => {
                        warn!("failed to create {}: {err}", self.path.display());
                        false
                    }
                }
            }
            Authorization::NotDetermined => false,
            Authorization::Denied | Authorization::Restricted => false,
        }
    }

    fn enumerate(&self, sink: &mut dyn FnMut(RawContact)) -> Result<()> {
        for path in self.files()? {
            let cards = match read_cards(&path) {
                Ok(cards) => cards,
                Err(err @ Error::Parse { .. }) => {
                    warn!("skipping vCard file: {err}");
                    continue;
                }
                Err(err) => return Err(err),
            };
            for card in &cards {
                sink(raw_contact_from_card(card));
            }
        }
        Ok(())
    }
}

/// Parse every card in a file. Undecodable or malformed content is
/// [`Error::Parse`]; failing to read the file at all is [`Error::Read`].
fn read_cards(path: &Path) -> Result<Vec<Vcard>> {
    let bytes = fs::read(path).map_err(|err| Error::read(path, err))?;
    let parse_error = |message: String| Error::Parse {
        path: path.to_path_buf(),
        message,
    };
    let content = String::from_utf8(bytes).map_err(|err| parse_error(err.to_string()))?;
    vcard4::parse(&content).map_err(|err| parse_error(err.to_string()))
}

pub fn list_vcf_files(root: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    collect_vcf(root, &mut files)?;
    Ok(files)
}

fn collect_vcf(dir: &Path, files: &mut Vec<PathBuf>) -> Result<()> {
    let entries = fs::read_dir(dir).map_err(|err| Error::read(dir, err))?;
    for entry in entries {
        let path = entry.map_err(|err| Error::read(dir, err))?.path();
        if path.is_dir() {
            collect_vcf(&path, files)?;
        } else if is_vcf(&path) {
            files.push(path);
        }
    }
    Ok(())
}

fn is_vcf(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.eq_ignore_ascii_case("vcf"))
        .unwrap_or(false)
}

// =============================================================================
// vCard -> RawContact
// =============================================================================

pub fn raw_contact_from_card(card: &Vcard) -> RawContact {
    RawContact {
        display_name: display_name(card),
        phones: card.tel.iter().filter_map(raw_phone).collect(),
        image_data: card.photo.iter().find_map(|prop| decode_photo_value(&property_value(prop))),
    }
}

/// FN when present, otherwise "given family" from N.
fn display_name(card: &Vcard) -> Option<String> {
    let formatted = card
        .formatted_name
        .iter()
        .map(|prop| prop.value.trim())
        .find(|value| !value.is_empty());
    if let Some(name) = formatted {
        return Some(name.to_string());
    }

    let parts = &card.name.as_ref()?.value;
    let family = parts.first().map(|s| s.trim()).unwrap_or_default();
    let given = parts.get(1).map(|s| s.trim()).unwrap_or_default();
    let joined = [given, family]
        .into_iter()
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ");
    (!joined.is_empty()).then_some(joined)
}

fn property_value(prop: &TextOrUriProperty) -> String {
    match prop {
        TextOrUriProperty::Text(text) => text.value.clone(),
        TextOrUriProperty::Uri(uri) => uri.value.to_string(),
    }
}

fn property_parameters(prop: &TextOrUriProperty) -> Option<&Parameters> {
    match prop {
        TextOrUriProperty::Text(text) => text.parameters.as_ref(),
        TextOrUriProperty::Uri(uri) => uri.parameters.as_ref(),
    }
}

fn raw_phone(prop: &TextOrUriProperty) -> Option<RawPhone> {
    let value = property_value(prop);
    if value.trim().is_empty() {
        return None;
    }
    let types: Vec<String> = property_parameters(prop)
        .and_then(|params| params.types.as_ref())
        .map(|types| types.iter().map(|t| t.to_string().to_ascii_lowercase()).collect())
        .unwrap_or_default();
    Some(RawPhone {
        label: phone_label(&types),
        value,
    })
}

/// Collapse vCard TEL types into a single label.
///
/// `home` + `fax` becomes `homefax` (likewise for work); otherwise the first
/// type other than the implied `voice` wins.
pub fn phone_label(types: &[String]) -> Option<String> {
    let has = |name: &str| types.iter().any(|t| t == name);
    if has("fax") {
        if has("home") {
            return Some("homefax".into());
        }
        if has("work") {
            return Some("workfax".into());
        }
    }
    types
        .iter()
        .find(|t| t.as_str() != "voice")
        .or_else(|| types.first())
        .cloned()
}

/// Bytes of an embedded photo. Remote URLs and undecodable payloads give
/// `None`.
pub fn decode_photo_value(value: &str) -> Option<Vec<u8>> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }
    let lower = trimmed.to_ascii_lowercase();
    if lower.starts_with("http://") || lower.starts_with("https://") {
        return None;
    }

    let decoded = match trimmed.strip_prefix("data:") {
        Some(data_uri) => parse_data_uri(data_uri),
        None => decode_base64_blob(trimmed),
    };
    match decoded {
        Some(data) if !data.is_empty() => Some(data),
        _ => {
            debug!("ignoring PHOTO value that is not embedded base64 data");
            None
        }
    }
}

fn parse_data_uri(input: &str) -> Option<Vec<u8>> {
    let (meta, data) = input.split_once(',')?;
    let is_base64 = meta
        .split(';')
        .any(|segment| segment.eq_ignore_ascii_case("base64"));
    if !is_base64 {
        return None;
    }
    BASE64_STANDARD.decode(data.trim()).ok()
}

fn decode_base64_blob(value: &str) -> Option<Vec<u8>> {
    let filtered: String = value.chars().filter(|c| !c.is_whitespace()).collect();
    BASE64_STANDARD.decode(filtered).ok()
}
