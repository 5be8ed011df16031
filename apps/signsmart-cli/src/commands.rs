use anyhow::{bail, Context};
use chrono::Utc;
use signsmart_core::capture::Stroke;
use signsmart_core::notify::{notifier_from_name, notify_completion};
use signsmart_core::reminders::sweep;
use signsmart_core::route::resolve;
use signsmart_core::{
    Channel, CompletionNotice, CompletionNotifier, Contact, ContactStore, DashboardView,
    DirDriver, Document, DocumentStore, Editor, FallbackText, InputKind, Invitation,
    LopdfRenderer, PageView, Position, Route, ShareLinks, SignaturePad, SignerUpdate,
    SignerWizard, StatusCounts, TextGenerator, View, WizardError,
};
use std::path::Path;
use tracing::{info, warn};

use crate::config::Config;
use crate::{Command, ContactsCommand, FieldCommand, ShareChannel, SignerCommand};

pub struct App {
    config: Config,
    docs: DocumentStore<DirDriver>,
    contacts: ContactStore<DirDriver>,
    text: FallbackText<Box<dyn TextGenerator>>,
    renderer: LopdfRenderer,
    notifier: Option<Box<dyn CompletionNotifier>>,
}

impl App {
    pub fn open(config: Config) -> anyhow::Result<Self> {
        let driver = DirDriver::new(&config.data_dir);
        let docs = DocumentStore::load(driver.clone()).context("Failed to load documents")?;
        let contacts = ContactStore::load(driver).context("Failed to load contacts")?;
        let text = FallbackText::from_name(&config.text_generation);
        let notifier = notifier_from_name(&config.notifier, &config.data_dir);
        Ok(Self {
            config,
            docs,
            contacts,
            text,
            renderer: LopdfRenderer::default(),
            notifier,
        })
    }

    pub async fn run(&mut self, command: Command) -> anyhow::Result<()> {
        match command {
            Command::Upload { file } => {
                let doc = self.upload(&file)?;
                println!("{}", doc.id);
                Ok(())
            }
            Command::List { query, archived } => {
                self.list(&query, archived);
                Ok(())
            }
            Command::Show { document } => self.show(&document),
            Command::Settings {
                document,
                title,
                order,
                reminders,
            } => self.edit(&document, |editor| {
                if let Some(title) = &title {
                    editor.set_title(title);
                }
                if let Some(order) = order {
                    editor.set_signing_order(order);
                }
                if let Some(enabled) = reminders {
                    editor.set_reminders(enabled);
                }
                Ok(())
            }),
            Command::Signer(cmd) => self.signer(cmd),
            Command::Field(cmd) => self.field(cmd),
            Command::Send { document } => self.send(&document),
            Command::Share {
                document,
                signer,
                channel,
                remind,
            } => self.share(&document, &signer, channel, remind).await,
            Command::Open { url } => self.open_url(&url),
            Command::Sign {
                document,
                signer,
                values,
                signatures,
            } => {
                self.sign(&document, signer.as_deref(), &values, &signatures)
                    .await
            }
            Command::Summary { document } => {
                let doc = self.document(&document)?;
                let summary = self.text.summary_or_default(&doc.title, &doc.file_name).await;
                println!("{}", summary);
                Ok(())
            }
            Command::Suggest {
                document,
                text_file,
            } => self.suggest(&document, &text_file).await,
            Command::Contacts(cmd) => self.contacts(cmd),
            Command::Stats => {
                let counts = StatusCounts::tally(self.docs.list());
                println!("{}", serde_json::to_string_pretty(&counts)?);
                Ok(())
            }
            Command::Sweep => {
                let report = sweep(&mut self.docs, &self.config.reminders, Utc::now())?;
                for (id, hours) in &report.reminders_due {
                    println!("reminder due  {}  ({}h)", id, hours);
                }
                for id in &report.escalated {
                    println!("escalated     {}", id);
                }
                for id in &report.expired {
                    println!("expired       {}", id);
                }
                Ok(())
            }
            Command::Delete { document } => {
                if !self.docs.delete(&document)? {
                    bail!("Document not found: {}", document);
                }
                Ok(())
            }
        }
    }

    fn document(&self, id: &str) -> anyhow::Result<Document> {
        self.docs
            .get(id)
            .cloned()
            .with_context(|| format!("Document not found: {}", id))
    }

    /// Open a document in the editor with its first page rendered, so the
    /// page count is known. Unrenderable files count as one page.
    fn editor_for(&self, id: &str) -> anyhow::Result<Editor> {
        let mut editor = Editor::new(self.document(id)?);
        if let Some(PageView::Failed { message }) = editor.render_current(&self.renderer) {
            warn!(document = %id, error = %message, "Page count unavailable, assuming one page");
        }
        Ok(editor)
    }

    /// Run edits on a document and store the result without changing status
    fn edit<F>(&mut self, id: &str, f: F) -> anyhow::Result<()>
    where
        F: FnOnce(&mut Editor) -> anyhow::Result<()>,
    {
        let mut editor = self.editor_for(id)?;
        f(&mut editor)?;
        self.docs.upsert(editor.into_draft())?;
        Ok(())
    }

    fn contact(&self, id: &str) -> anyhow::Result<Contact> {
        self.contacts
            .get(id)
            .cloned()
            .with_context(|| format!("Contact not found: {}", id))
    }

    /// Register a file as a new draft document
    fn upload(&mut self, file: &Path) -> anyhow::Result<Document> {
        let file_name = file
            .file_name()
            .and_then(|n| n.to_str())
            .with_context(|| format!("Not a file path: {}", file.display()))?;
        let url = std::fs::canonicalize(file)
            .with_context(|| format!("Cannot read {}", file.display()))?;
        let doc = self
            .docs
            .create_from_upload(file_name, Some(url.to_string_lossy().into_owned()))?;
        let pages = self.editor_for(&doc.id)?.total_pages();
        info!(document = %doc.id, pages, "Upload registered");
        Ok(doc)
    }

    fn list(&self, query: &str, archived: bool) {
        let view = DashboardView::build(self.docs.list(), query);
        let rows = if archived { view.archived } else { view.active };
        for doc in rows {
            let signed = doc.signers.iter().filter(|s| s.has_signed).count();
            println!(
                "{}  {:<20}  {:<18}  {}/{} signed  {}",
                doc.id,
                doc.title,
                doc.status.label(),
                signed,
                doc.signers.len(),
                doc.updated_at.format("%Y-%m-%d %H:%M")
            );
        }
    }

    fn show(&self, id: &str) -> anyhow::Result<()> {
        let doc = self.document(id)?;
        println!("{}", serde_json::to_string_pretty(&doc)?);
        if let Some(at) = self.config.reminders.next_reminder_at(&doc, Utc::now()) {
            println!("next reminder: {}", at.to_rfc3339());
        }
        Ok(())
    }

    fn signer(&mut self, cmd: SignerCommand) -> anyhow::Result<()> {
        match cmd {
            SignerCommand::Add {
                document,
                name,
                email,
                phone,
                contact,
            } => {
                let contact = match contact {
                    Some(id) => Some(self.contact(&id)?),
                    None => None,
                };
                let mut added = String::new();
                self.edit(&document, |editor| {
                    added = match &contact {
                        Some(c) => editor.add_signer_from_contact(c),
                        None => editor.add_named_signer(&name, &email, &phone),
                    };
                    Ok(())
                })?;
                println!("{}", added);
                Ok(())
            }
            SignerCommand::Update {
                document,
                signer,
                name,
                email,
                phone,
                order,
            } => self.edit(&document, |editor| {
                let update = SignerUpdate {
                    name,
                    email,
                    phone,
                    order,
                };
                Ok(editor.update_signer(&signer, update)?)
            }),
            SignerCommand::Remove { document, signer } => self.edit(&document, |editor| {
                let removed = editor.remove_signer(&signer)?;
                if removed > 0 {
                    println!("removed {} field(s) assigned to {}", removed, signer);
                }
                Ok(())
            }),
        }
    }

    fn field(&mut self, cmd: FieldCommand) -> anyhow::Result<()> {
        match cmd {
            FieldCommand::Add {
                document,
                field_type,
                x,
                y,
                page,
                signer,
                label,
            } => {
                let mut added = String::new();
                self.edit(&document, |editor| {
                    editor.go_to_page(page)?;
                    let id = editor.add_field(field_type, Position { x, y })?;
                    if let Some(signer) = &signer {
                        editor.assign_field(&id, signer)?;
                    }
                    if let Some(label) = &label {
                        editor.set_field_label(&id, label)?;
                    }
                    added = id;
                    Ok(())
                })?;
                println!("{}", added);
                Ok(())
            }
            FieldCommand::Move { document, field, x, y } => self.edit(&document, |editor| {
                let at = editor.move_field(&field, Position { x, y })?;
                println!("{:.1},{:.1}", at.x, at.y);
                Ok(())
            }),
            FieldCommand::Assign {
                document,
                field,
                signer,
            } => self.edit(&document, |editor| Ok(editor.assign_field(&field, &signer)?)),
            FieldCommand::Remove { document, field } => {
                self.edit(&document, |editor| Ok(editor.remove_field(&field)?))
            }
        }
    }

    fn send(&mut self, id: &str) -> anyhow::Result<()> {
        let doc = self.document(id)?;
        if doc.signers.is_empty() {
            bail!("Add at least one signer before sending");
        }
        let sent = Editor::new(doc).save();
        info!(document = %sent.id, signers = sent.signers.len(), "Document sent");
        self.contacts.import_signers(&sent.signers)?;
        self.docs.upsert(sent)?;
        Ok(())
    }

    async fn share(
        &self,
        document: &str,
        signer_id: &str,
        channel: ShareChannel,
        remind: bool,
    ) -> anyhow::Result<()> {
        let doc = self.document(document)?;
        let links = ShareLinks::new(&self.config.base_url)?;
        let reminder = if remind {
            let name = doc
                .signer(signer_id)
                .map(|s| s.display_name().to_string())
                .unwrap_or_default();
            Some(self.text.reminder_or_default(&doc.title, &name).await)
        } else {
            None
        };

        let invite = Invitation::for_signer(&links, &doc, signer_id, reminder.as_deref())?;
        let out = match channel {
            ShareChannel::Link => invite.link.clone(),
            ShareChannel::Whatsapp => invite.url_for(Channel::WhatsApp)?,
            ShareChannel::Email => invite.url_for(Channel::Email)?,
        };
        println!("{}", out);
        Ok(())
    }

    fn open_url(&self, url: &str) -> anyhow::Result<()> {
        match resolve(&Route::from_url(url), &self.docs) {
            View::Dashboard => {
                let counts = StatusCounts::tally(self.docs.list());
                println!("dashboard: {} document(s)", counts.total());
            }
            View::Wizard { document, signer_id } => {
                let wizard = SignerWizard::new(&document, signer_id.as_deref());
                println!(
                    "sign \"{}\": {} field(s), {}% filled",
                    document.title,
                    wizard.total(),
                    wizard.progress_percent()
                );
                for field in wizard.fields() {
                    println!(
                        "  {}  {:<10}  page {}  {}",
                        field.id,
                        field.field_type.to_string(),
                        field.page,
                        field.label
                    );
                }
            }
            View::NotFound(id) => bail!("Document not found: {}", id),
        }
        Ok(())
    }

    async fn sign(
        &mut self,
        document: &str,
        signer: Option<&str>,
        values: &[(String, String)],
        signatures: &[(String, String)],
    ) -> anyhow::Result<()> {
        let doc = self.document(document)?;
        let mut wizard = match signer {
            Some(id) if self.config.enforce_sequential_order => SignerWizard::for_signer(&doc, id)?,
            Some(id) if doc.signer(id).is_none() => {
                return Err(WizardError::UnknownSigner(id.to_string()).into());
            }
            _ => SignerWizard::new(&doc, signer),
        };

        for index in 0..wizard.total() {
            wizard.select(index)?;
            let field = wizard.fields()[index].clone();
            match field.field_type.input_kind() {
                InputKind::Stroke => {
                    let Some((_, path)) = signatures.iter().find(|(id, _)| *id == field.id) else {
                        continue;
                    };
                    let pad = pad_from_file(Path::new(path))?;
                    wizard.confirm_signature(&pad)?;
                }
                InputKind::Checkbox | InputKind::Text => {
                    if let Some((_, value)) = values.iter().find(|(id, _)| *id == field.id) {
                        wizard.enter_text(value)?;
                    }
                }
            }
        }

        let completion = wizard.finish()?;
        let stored = self.docs.apply_completion(&completion)?;
        let notice = CompletionNotice::new(
            stored,
            completion.signer_id.as_deref(),
            completion.completed_at,
        );
        println!("signed {}", doc.id);

        if let Some(notifier) = &self.notifier {
            notify_completion(notifier.as_ref(), &notice).await;
        }
        Ok(())
    }

    async fn suggest(&mut self, document: &str, text_file: &Path) -> anyhow::Result<()> {
        self.document(document)?;
        let text = std::fs::read_to_string(text_file)
            .with_context(|| format!("Failed to read document text: {}", text_file.display()))?;
        let suggestions = self.text.suggestions_or_empty(&text).await;
        if suggestions.is_empty() {
            println!("no fields suggested");
            return Ok(());
        }

        let mut placed = Vec::new();
        self.edit(document, |editor| {
            placed = editor.place_suggestions(&suggestions)?;
            Ok(())
        })?;
        for (id, suggestion) in placed.iter().zip(&suggestions) {
            println!(
                "{}  {:<10}  {}",
                id,
                suggestion.field_type.to_string(),
                suggestion.label
            );
        }
        Ok(())
    }

    fn contacts(&mut self, cmd: ContactsCommand) -> anyhow::Result<()> {
        match cmd {
            ContactsCommand::List => {
                for c in self.contacts.list() {
                    println!("{}  {:<20}  {:<24}  {}", c.id, c.name, c.email, c.phone);
                }
            }
            ContactsCommand::Add { name, email, phone } => {
                let contact = self.contacts.add(Contact::new(&name, &email, &phone))?;
                println!("{}", contact.id);
            }
            ContactsCommand::Delete { contact } => self.contacts.delete(&contact)?,
            ContactsCommand::Import { document } => {
                let doc = self.document(&document)?;
                let added = self.contacts.import_signers(&doc.signers)?;
                println!("imported {} contact(s)", added);
            }
            ContactsCommand::Send { contact, document } => {
                let contact = self.contact(&contact)?;
                let links = ShareLinks::new(&self.config.base_url)?;
                let mut editor = self.editor_for(&document)?;
                let signer_id = editor.add_signer_from_contact(&contact);
                let sent = editor.save();
                let invite = Invitation::for_signer(&links, &sent, &signer_id, None)?;
                info!(document = %sent.id, contact = %contact.id, "Document sent to contact");
                self.docs.upsert(sent)?;
                println!("{}", invite.link);
            }
            ContactsCommand::Upload { contact, file } => {
                let contact = self.contact(&contact)?;
                let doc = self.upload(&file)?;
                self.edit(&doc.id, |editor| {
                    editor.add_signer_from_contact(&contact);
                    Ok(())
                })?;
                println!("{}", doc.id);
            }
        }
        Ok(())
    }
}

/// Load strokes recorded as JSON (`[[{"x":..,"y":..}, ..], ..]`) onto a pad
fn pad_from_file(path: &Path) -> anyhow::Result<SignaturePad> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read signature strokes: {}", path.display()))?;
    let strokes: Vec<Stroke> = serde_json::from_str(&raw)
        .with_context(|| format!("Invalid signature strokes: {}", path.display()))?;
    let mut pad = SignaturePad::default();
    pad.replay(&strokes);
    Ok(pad)
}
