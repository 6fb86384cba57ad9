//! Reads the project data file out of an ETS `.knxproj` archive.

use crate::knx::model::ProjectDocuments;
use crate::knx::namespace::NamespaceContext;
use crate::knx::parsers::project::{extract_project_name, DEFAULT_PROJECT_NAME};
use crate::knx::xml_tags;
use crate::knx::xml_utils::strip_bom;
use anyhow::{anyhow, Context, Result};
use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use base64::Engine;
use pbkdf2::pbkdf2_hmac;
use roxmltree::Document;
use sha2::Sha256;
use std::io::{Cursor, Read, Seek};
use zip::result::{InvalidPassword, ZipError};
use zip::ZipArchive;

#[derive(Debug)]
pub struct PasswordRequiredError;

impl std::fmt::Display for PasswordRequiredError {
    fn fmt(&self, fmt: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(fmt, "Encrypted KNX project: password required")
    }
}

impl std::error::Error for PasswordRequiredError {}

#[derive(Debug)]
pub struct InvalidPasswordError;

impl std::fmt::Display for InvalidPasswordError {
    fn fmt(&self, fmt: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(fmt, "Invalid password for KNX project")
    }
}

impl std::error::Error for InvalidPasswordError {}

const ZIP_PASSWORD_SALT: &str = "21.project.ets.knx.org";
const ZIP_PASSWORD_ITERATIONS: u32 = 65_536;
const ZIP_PASSWORD_KEY_LEN: usize = 32;

pub fn load_project_data_bytes(data: &[u8], password: Option<&str>) -> Result<ProjectDocuments> {
    log::info!("Loading KNX project from bytes ({} bytes)", data.len());
    load_project_data_reader(Cursor::new(data), password)
}

/// Whether an error chain ends in one of the password errors.
fn is_password_error(err: &anyhow::Error) -> bool {
    err.downcast_ref::<PasswordRequiredError>().is_some()
        || err.downcast_ref::<InvalidPasswordError>().is_some()
}

fn load_project_data_reader<R: Read + Seek>(
    reader: R,
    password: Option<&str>,
) -> Result<ProjectDocuments> {
    let mut zip = ZipArchive::new(reader).context("Failed to read .knxproj archive")?;

    let zip_password = password.map(derive_zip_password);
    if zip_password.is_some() {
        log::info!("Derived zip password for encrypted project");
    }

    let (project_xml, data_xml) = read_project_docs_any(&mut zip, zip_password.as_deref())?;
    let project_name = match project_xml {
        Some(xml) => {
            let doc = Document::parse(strip_bom(&xml)).context("Failed to parse project.xml")?;
            extract_project_name(&doc, &NamespaceContext::resolve(&doc))
        }
        None => DEFAULT_PROJECT_NAME.to_string(),
    };

    Ok(ProjectDocuments {
        project_name,
        data_xml,
    })
}

fn derive_zip_password(project_password: &str) -> String {
    let mut password_bytes = Vec::with_capacity(project_password.len() * 2);
    for unit in project_password.encode_utf16() {
        password_bytes.extend_from_slice(&unit.to_le_bytes());
    }

    let mut derived = [0u8; ZIP_PASSWORD_KEY_LEN];
    pbkdf2_hmac::<Sha256>(
        &password_bytes,
        ZIP_PASSWORD_SALT.as_bytes(),
        ZIP_PASSWORD_ITERATIONS,
        &mut derived,
    );
    BASE64_STANDARD.encode(derived)
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum ProjectDocKind {
    Project,
    Data,
}

fn classify_project_doc(doc: &Document) -> Option<ProjectDocKind> {
    let mut has_project_info = false;
    for node in doc.descendants() {
        match node.tag_name().name() {
            xml_tags::INSTALLATIONS | xml_tags::TOPOLOGY | xml_tags::GROUP_ADDRESSES => {
                return Some(ProjectDocKind::Data);
            }
            xml_tags::PROJECT_INFORMATION => has_project_info = true,
            _ => {}
        }
    }
    has_project_info.then_some(ProjectDocKind::Project)
}

struct ProjectPaths {
    project_xml: Option<String>,
    data_xml: String,
}

/// Locates `project.xml` and `0.xml` from entry names alone.
fn find_project_paths<R: Read + Seek>(zip: &ZipArchive<R>) -> Option<ProjectPaths> {
    let names: Vec<&str> = zip.file_names().collect();
    let project_xml = names
        .iter()
        .find(|name| name.starts_with("P-") && name.ends_with("/project.xml"))
        .or_else(|| names.iter().find(|name| name.ends_with("project.xml")))
        .map(|name| name.to_string());
    let data_xml = names
        .iter()
        .find(|name| name.starts_with("P-") && name.ends_with("/0.xml"))
        .or_else(|| names.iter().find(|name| name.ends_with("/0.xml") || **name == "0.xml"))
        .map(|name| name.to_string())?;
    Some(ProjectPaths {
        project_xml,
        data_xml,
    })
}

/// Falls back to opening every XML entry and looking at its elements.
fn find_project_paths_by_content<R: Read + Seek>(
    zip: &mut ZipArchive<R>,
    password: Option<&str>,
) -> Result<ProjectPaths> {
    let names: Vec<String> = zip.file_names().map(|name| name.to_string()).collect();
    let mut project_xml = None;
    let mut data_xml = None;

    for name in names {
        if !name.ends_with(".xml") || name.ends_with("knx_master.xml") || name.starts_with("M-") {
            continue;
        }
        let xml = match read_zip_text(zip, &name, password) {
            Ok(xml) => xml,
            Err(err) if is_password_error(&err) => return Err(err),
            Err(err) => {
                log::warn!("Unable to read xml {} ({})", name, err);
                continue;
            }
        };
        let doc = match Document::parse(strip_bom(&xml)) {
            Ok(doc) => doc,
            Err(err) => {
                log::warn!("Skipping xml {} ({})", name, err);
                continue;
            }
        };
        match classify_project_doc(&doc) {
            Some(ProjectDocKind::Project) if project_xml.is_none() => project_xml = Some(name),
            Some(ProjectDocKind::Data) if data_xml.is_none() => data_xml = Some(name),
            _ => {}
        }
        if project_xml.is_some() && data_xml.is_some() {
            break;
        }
    }

    let data_xml = data_xml.context("Unable to locate project data in .knxproj")?;
    Ok(ProjectPaths {
        project_xml,
        data_xml,
    })
}

fn read_zip_bytes<R: Read + Seek>(
    zip: &mut ZipArchive<R>,
    path: &str,
    password: Option<&str>,
) -> Result<Vec<u8>> {
    log::debug!(
        "Reading entry {} (password: {})",
        path,
        if password.is_some() { "yes" } else { "no" }
    );
    let opened = match password {
        Some(password) => match zip.by_name_decrypt(path, password.as_bytes()) {
            Ok(Ok(file)) => Ok(file),
            Ok(Err(InvalidPassword)) => {
                log::warn!("Invalid password for {}", path);
                return Err(InvalidPasswordError.into());
            }
            Err(err) => Err(err),
        },
        None => zip.by_name(path),
    };
    let mut file = match opened {
        Ok(file) => file,
        Err(ZipError::UnsupportedArchive(msg)) if msg == ZipError::PASSWORD_REQUIRED => {
            log::warn!("Password required for {}", path);
            return Err(PasswordRequiredError.into());
        }
        Err(err) => return Err(err.into()),
    };

    let mut contents = Vec::new();
    file.read_to_end(&mut contents)
        .with_context(|| format!("Failed to read {}", path))?;
    Ok(contents)
}

fn read_zip_text<R: Read + Seek>(
    zip: &mut ZipArchive<R>,
    path: &str,
    password: Option<&str>,
) -> Result<String> {
    let bytes = read_zip_bytes(zip, path, password)?;
    String::from_utf8(bytes).with_context(|| format!("{} is not valid UTF-8", path))
}

fn read_project_docs<R: Read + Seek>(
    zip: &mut ZipArchive<R>,
    password: Option<&str>,
) -> Result<(Option<String>, String)> {
    let paths = match find_project_paths(zip) {
        Some(paths) => paths,
        None => find_project_paths_by_content(zip, password)?,
    };
    log::info!(
        "Project docs: project={}, data={}",
        paths.project_xml.as_deref().unwrap_or("-"),
        paths.data_xml
    );
    let project_xml = match paths.project_xml.as_deref() {
        Some(path) => Some(read_zip_text(zip, path, password)?),
        None => None,
    };
    let data_xml = read_zip_text(zip, &paths.data_xml, password)?;
    Ok((project_xml, data_xml))
}

/// Like `read_project_docs`, also searching archives nested one level deep.
fn read_project_docs_any<R: Read + Seek>(
    zip: &mut ZipArchive<R>,
    password: Option<&str>,
) -> Result<(Option<String>, String)> {
    match read_project_docs(zip, password) {
        Ok(docs) => return Ok(docs),
        Err(err) if is_password_error(&err) => return Err(err),
        Err(err) => log::debug!("No project data at archive top level ({})", err),
    }

    let names: Vec<String> = zip
        .file_names()
        .filter(|name| name.ends_with(".zip"))
        .map(|name| name.to_string())
        .collect();
    for name in names {
        log::debug!("Scanning nested archive {}", name);
        let nested_bytes = match read_zip_bytes(zip, &name, password) {
            Ok(bytes) => bytes,
            Err(err) if is_password_error(&err) => return Err(err),
            Err(err) => {
                log::warn!("Unable to read nested zip {} ({})", name, err);
                continue;
            }
        };
        let mut nested_zip = match ZipArchive::new(Cursor::new(nested_bytes)) {
            Ok(zip) => zip,
            Err(err) => {
                log::warn!("Unable to open nested zip {} ({})", name, err);
                continue;
            }
        };
        match read_project_docs(&mut nested_zip, password) {
            Ok(docs) => {
                log::info!("Project docs found in nested archive {}", name);
                return Ok(docs);
            }
            Err(err) if is_password_error(&err) => return Err(err),
            Err(_) => {}
        }
    }

    Err(anyhow!("Unable to locate project data in .knxproj"))
}
