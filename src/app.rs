//! Request flow from admin upload to the downloadable PDF.
//!
//! Every request re-reads the active template. Nothing is carried between
//! requests, so a form shown before an admin replaced the template is checked
//! against the new template when it is submitted.

use crate::config::{Config, UnfilledPolicy};
use crate::docx::extract_text;
use crate::error::{DocfillError, Result};
use crate::form::{Form, Submission, complete_values, validate_output_name};
use crate::pdf_generator::{PageLayout, render_text};
use crate::placeholder::{scan, substitute};
use crate::store::{FsTemplateStore, TemplateStore};
use std::collections::BTreeMap;
use std::io::{Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::{info, warn};

pub const PDF_MIME: &str = "application/pdf";

/// Whether an admin has uploaded a template yet
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TemplateState {
    NoTemplate,
    TemplateActive,
}

/// Shared-secret check guarding template changes
#[derive(Clone)]
pub struct AdminGate {
    secret: Option<String>,
}

impl AdminGate {
    pub fn new(secret: Option<String>) -> Self {
        AdminGate { secret }
    }

    pub fn check(&self, password: &str) -> bool {
        match &self.secret {
            Some(secret) if !secret.is_empty() => secret == password,
            _ => false,
        }
    }
}

impl std::fmt::Debug for AdminGate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdminGate")
            .field("configured", &self.secret.is_some())
            .finish()
    }
}

/// A PDF ready to be offered for download
#[derive(Debug, Clone)]
pub struct RenderedDocument {
    pub file_name: String,
    pub bytes: Vec<u8>,
    pub page_count: usize,
}

impl RenderedDocument {
    pub fn mime_type(&self) -> &'static str {
        PDF_MIME
    }

    /// Stage the PDF in a temporary file and copy it into `out`.
    ///
    /// The staged copy is removed when this returns, whether or not the copy
    /// succeeded.
    pub fn deliver<W: Write>(&self, out: &mut W) -> Result<u64> {
        let mut staged = tempfile::Builder::new()
            .prefix("docfill-")
            .suffix(".pdf")
            .tempfile()?;
        staged.write_all(&self.bytes)?;
        staged.flush()?;
        staged.seek(SeekFrom::Start(0))?;
        let copied = std::io::copy(&mut staged, out)?;
        out.flush()?;
        Ok(copied)
    }

    /// Deliver into `<dir>/<file_name>`, returning the written path.
    ///
    /// `<file_name>` only appears once the whole PDF has been written.
    pub fn deliver_to_dir(&self, dir: &Path) -> Result<PathBuf> {
        std::fs::create_dir_all(dir)?;
        let path = dir.join(&self.file_name);
        let mut partial = NamedTempFile::new_in(dir)?;
        self.deliver(partial.as_file_mut())?;
        partial
            .persist(&path)
            .map_err(|e| DocfillError::Io(e.error))?;
        Ok(path)
    }
}

/// Application wiring: one template slot, one admin gate, rendering settings
#[derive(Debug)]
pub struct App<S: TemplateStore> {
    store: S,
    gate: AdminGate,
    output_name_label: String,
    unfilled: UnfilledPolicy,
    layout: PageLayout,
}

impl App<FsTemplateStore> {
    /// App backed by the template file named in `config`
    pub fn from_config(config: &Config) -> Self {
        App::new(FsTemplateStore::new(config.template_path()), config)
    }
}

impl<S: TemplateStore> App<S> {
    pub fn new(store: S, config: &Config) -> Self {
        App {
            store,
            gate: AdminGate::new(config.admin_secret.clone()),
            output_name_label: config.output_name_label.clone(),
            unfilled: config.unfilled,
            layout: config.layout.clone(),
        }
    }

    pub fn state(&self) -> TemplateState {
        if self.store.exists() {
            TemplateState::TemplateActive
        } else {
            TemplateState::NoTemplate
        }
    }

    /// Check the admin password; the returned handle is the only way to change the template
    pub fn admin(&self, password: &str) -> Result<Admin<'_, S>> {
        if self.gate.check(password) {
            Ok(Admin { app: self })
        } else {
            warn!("admin access denied");
            Err(DocfillError::InvalidCredential)
        }
    }

    fn template_text(&self) -> Result<String> {
        let bytes = self.store.get()?;
        extract_text(&bytes)
    }

    /// Form for the template active right now
    pub fn form(&self) -> Result<Form> {
        let fields = scan(&self.template_text()?);
        Ok(Form::new(fields, self.output_name_label.clone()))
    }

    /// Template text with the submitted values filled in
    pub fn preview(&self, values: &BTreeMap<String, String>) -> Result<String> {
        let text = self.template_text()?;
        let form = Form::new(scan(&text), self.output_name_label.clone());
        Ok(substitute(&text, &complete_values(&form, values, self.unfilled)))
    }

    /// Fill the active template and render it to PDF
    pub fn generate(&self, submission: &Submission) -> Result<RenderedDocument> {
        let text = self.template_text()?;
        let output_name =
            validate_output_name(submission.output_name.as_deref(), &self.output_name_label)?;

        let form = Form::new(scan(&text), self.output_name_label.clone());
        let values = complete_values(&form, &submission.values, self.unfilled);
        let filled = substitute(&text, &values);
        let pdf = render_text(&filled, &self.layout)?;

        info!(
            file = %output_name,
            fields = form.fields.len(),
            pages = pdf.page_count,
            "generated PDF"
        );
        Ok(RenderedDocument {
            file_name: format!("{}.pdf", output_name),
            bytes: pdf.bytes,
            page_count: pdf.page_count,
        })
    }
}

/// Admin capabilities, obtainable only through [`App::admin`]
pub struct Admin<'a, S: TemplateStore> {
    app: &'a App<S>,
}

impl<S: TemplateStore> Admin<'_, S> {
    /// Replace the active template and report the fields it defines.
    ///
    /// The upload is read before it is stored; an unreadable file leaves the
    /// current template untouched.
    pub fn upload(&self, bytes: &[u8]) -> Result<Vec<String>> {
        let fields = scan(&extract_text(bytes)?);
        self.app.store.put(bytes)?;
        info!(fields = fields.len(), "template replaced");
        Ok(fields)
    }

    /// Raw bytes of the active template, unchanged
    pub fn template_bytes(&self) -> Result<Vec<u8>> {
        self.app.store.get()
    }
}
