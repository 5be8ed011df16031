//! End-to-end flows: upload, prepare, send, open the link, sign

use pretty_assertions::assert_eq;
use signsmart_core::route::resolve;
use signsmart_core::store::{CONTACTS_KEY, DOCUMENTS_KEY};
use signsmart_core::{
    Advance, ContactStore, DirDriver, Document, DocumentStatus, DocumentStore, Editor, FieldType, Invitation,
    MemoryDriver, Position, Route, ShareLinks, SignaturePad, SignerWizard, View, WizardState,
};

const APP_URL: &str = "https://sign.example.com/";

fn signed_pad() -> SignaturePad {
    let mut pad = SignaturePad::default();
    pad.pointer_down(20.0, 120.0);
    pad.pointer_move(80.0, 90.0);
    pad.pointer_move(140.0, 130.0);
    pad.pointer_up();
    pad
}

/// Upload contract.pdf, add Dana with a phone, place a signature, send
fn prepare_contract(store: &mut DocumentStore<impl signsmart_core::StorageDriver>) -> Document {
    let uploaded = store.create_from_upload("contract.pdf", None).unwrap();
    let mut editor = Editor::new(uploaded);
    editor.add_named_signer("Dana", "", "0501112222");
    editor
        .add_field(FieldType::Signature, Position { x: 50.0, y: 50.0 })
        .unwrap();
    let sent = editor.save();
    store.upsert(sent.clone()).unwrap();
    sent
}

#[test]
fn upload_edit_save() {
    let mut store = DocumentStore::load(MemoryDriver::new()).unwrap();
    let doc = prepare_contract(&mut store);

    let stored = store.get(&doc.id).unwrap();
    assert_eq!(stored.status, DocumentStatus::InProgress);
    assert_eq!(stored.title, "contract");
    assert_eq!(stored.signers.len(), 1);
    assert_eq!(stored.fields.len(), 1);

    let field = &stored.fields[0];
    assert_eq!(field.field_type, FieldType::Signature);
    assert_eq!((field.page, field.x, field.y), (1, 50.0, 50.0));
    assert_eq!(field.signer_id, stored.signers[0].id);
}

#[test]
fn signing_link_routes_to_wizard() {
    let mut store = DocumentStore::load(MemoryDriver::new()).unwrap();
    let mut doc = prepare_contract(&mut store);
    doc.id = "doc123".into();
    store.upsert(doc.clone()).unwrap();

    let route = Route::from_url(&format!("{}?sign=doc123", APP_URL));
    match resolve(&route, &store) {
        View::Wizard {
            document,
            signer_id,
        } => {
            assert_eq!(document.id, "doc123");
            assert_eq!(signer_id, None);
        }
        other => panic!("expected wizard, got {:?}", other),
    }
}

#[test]
fn unknown_link_is_not_found() {
    let store = DocumentStore::load(MemoryDriver::new()).unwrap();
    let route = Route::from_url(&format!("{}?sign=unknown-id", APP_URL));
    assert_eq!(resolve(&route, &store), View::NotFound("unknown-id".into()));
    assert_eq!(resolve(&Route::from_url(APP_URL), &store), View::Dashboard);
}

#[test]
fn invitation_link_round_trips_through_router() {
    let mut store = DocumentStore::load(MemoryDriver::new()).unwrap();
    let doc = prepare_contract(&mut store);
    let signer = &doc.signers[0];

    let invite = Invitation::new(&ShareLinks::new(APP_URL).unwrap(), &doc, signer, None);
    assert!(invite
        .whatsapp_url()
        .unwrap()
        .starts_with("https://wa.me/0501112222?text="));

    assert_eq!(
        Route::from_url(&invite.link),
        Route::Sign {
            document_id: doc.id.clone(),
            signer_id: Some(signer.id.clone()),
        }
    );
}

#[test]
fn signature_last_field_finishes() {
    let mut store = DocumentStore::load(MemoryDriver::new()).unwrap();
    let uploaded = store.create_from_upload("lease.pdf", None).unwrap();
    let mut editor = Editor::new(uploaded);
    editor.add_named_signer("Dana", "dana@example.com", "");
    editor.add_field(FieldType::Text, Position::center()).unwrap();
    editor.add_field(FieldType::Signature, Position::center()).unwrap();
    let doc = editor.save();
    store.upsert(doc.clone()).unwrap();

    let mut wizard = SignerWizard::new(&doc, None);
    wizard.enter_text("Dana Levi").unwrap();
    assert_eq!(wizard.next().unwrap(), Advance::Moved(1));
    assert!(!wizard.can_finish());

    // Confirming on the last field stays put but opens the gate
    assert_eq!(
        wizard.confirm_signature(&signed_pad()).unwrap(),
        WizardState::Field(1)
    );
    assert!(wizard.can_finish());

    let completion = match wizard.next().unwrap() {
        Advance::Finished(c) => c,
        other => panic!("expected finish, got {:?}", other),
    };
    let stored = store.apply_completion(&completion).unwrap();
    assert_eq!(stored.status, DocumentStatus::Completed);
    assert!(stored.signers.iter().all(|s| s.has_signed));
    assert!(stored.fields[1]
        .value
        .as_deref()
        .unwrap()
        .starts_with("data:image/svg+xml;base64,"));
}

#[test]
fn documents_survive_reload_with_dates() {
    let tmp = tempfile::tempdir().unwrap();
    let driver = DirDriver::new(tmp.path());

    let mut store = DocumentStore::load(driver.clone()).unwrap();
    let doc = prepare_contract(&mut store);

    let reloaded = DocumentStore::load(driver).unwrap();
    let back = reloaded.get(&doc.id).unwrap();
    assert_eq!(back, &doc);
    assert_eq!(back.created_at, doc.created_at);
    assert_eq!(back.updated_at, doc.updated_at);
}

#[test]
fn corrupt_storage_starts_empty_and_recovers() {
    let tmp = tempfile::tempdir().unwrap();
    std::fs::write(tmp.path().join(format!("{}.json", DOCUMENTS_KEY)), "[{oops").unwrap();

    let driver = DirDriver::new(tmp.path());
    let mut store = DocumentStore::load(driver.clone()).unwrap();
    assert!(store.is_empty());

    store.create_from_upload("fresh.pdf", None).unwrap();
    assert_eq!(DocumentStore::load(driver).unwrap().len(), 1);
}

#[test]
fn non_utf8_storage_starts_empty_and_recovers() {
    let tmp = tempfile::tempdir().unwrap();
    let garbage = [0xff, 0xfe, b'[', b']'];
    std::fs::write(tmp.path().join(format!("{}.json", DOCUMENTS_KEY)), garbage).unwrap();
    std::fs::write(tmp.path().join(format!("{}.json", CONTACTS_KEY)), garbage).unwrap();

    let driver = DirDriver::new(tmp.path());
    let mut store = DocumentStore::load(driver.clone()).unwrap();
    assert!(store.is_empty());
    assert!(ContactStore::load(driver.clone()).unwrap().list().is_empty());

    store.create_from_upload("fresh.pdf", None).unwrap();
    assert_eq!(DocumentStore::load(driver).unwrap().len(), 1);
}
